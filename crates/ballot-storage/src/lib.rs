//! # ballot-storage
//!
//! why: provide durable persistence for the vote chain using standard rust fs apis
//! relations: used by ballot-ledger as its only persistence mechanism
//! what: Storage trait, FileStorage implementation, InMemoryStorage for testing

use ballot_core::Entry;
use serde_json::error::Category;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// errors raised while loading or saving the chain
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),

    /// not json at all: truncated, garbled, or not utf-8
    #[error("malformed chain data: {0}")]
    Malformed(#[source] serde_json::Error),

    /// valid json that is not a chain
    #[error("unrecognized chain data: {0}")]
    Unrecognized(#[source] serde_json::Error),

    #[error("chain could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// sort a decode failure by whether the bytes were json at all
    pub fn from_decode(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Syntax | Category::Eof => Self::Malformed(err),
            Category::Data => Self::Unrecognized(err),
            Category::Io => Self::Io(err.into()),
        }
    }

    /// true when the store was readable but did not hold json
    ///
    /// an unrecognized store is not malformed: it may be someone's data
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// trait for durable storage of the vote chain
///
/// the chain is always loaded and saved whole. `save` replaces whatever was
/// stored before; implementations decide how atomic that replacement is.
pub trait Storage {
    /// load the stored chain, or an empty one if nothing has been stored
    fn load(&self) -> Result<Vec<Entry>, StorageError>;

    /// replace the stored chain
    fn save(&mut self, entries: &[Entry]) -> Result<(), StorageError>;
}

// -- file storage implementation --

/// file-based storage implementation using std::fs
///
/// stores the chain as a pretty-printed json array in `chain.json`
/// inside the given directory
pub struct FileStorage {
    /// directory path for storing the chain file
    dir: PathBuf,
}

impl FileStorage {
    /// create a new filestorage at the given directory
    /// creates the directory if it doesn't exist
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// get the path to the chain file
    pub fn chain_path(&self) -> PathBuf {
        self.dir.join("chain.json")
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join("chain.tmp")
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Vec<Entry>, StorageError> {
        let path = self.chain_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let bytes = fs::read(&path)?;

        // a zero-length file is what an interrupted first write leaves behind
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(StorageError::from_decode)
    }

    fn save(&mut self, entries: &[Entry]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries).map_err(StorageError::Encode)?;

        // atomic write: write to temp file then rename
        let temp_path = self.temp_path();
        let written = write_synced(&temp_path, json.as_bytes())
            .and_then(|()| fs::rename(&temp_path, self.chain_path()));
        if let Err(err) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }

        sync_dir(&self.dir)?;
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// make the rename itself durable
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

// -- in-memory storage implementation --

/// in-memory storage for testing
///
/// stores the chain in memory, no persistence across restarts.
/// writes can be made to fail on demand to exercise error paths.
#[derive(Default)]
pub struct InMemoryStorage {
    entries: Vec<Entry>,
    fail_writes: bool,
    saves: usize,
}

impl InMemoryStorage {
    /// create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// create an in-memory storage that already holds a chain
    pub fn with_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// make every following save fail (or succeed again)
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// the chain as last saved
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

impl Storage for InMemoryStorage {
    fn load(&self) -> Result<Vec<Entry>, StorageError> {
        Ok(self.entries.clone())
    }

    fn save(&mut self, entries: &[Entry]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("writes disabled".into()));
        }
        self.entries = entries.to_vec();
        self.saves += 1;
        Ok(())
    }
}
