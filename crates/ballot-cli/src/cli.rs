use std::path::PathBuf;

use ballot_ledger::CorruptStorePolicy;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ballotiq",
    about = "BallotIQ tamper-evident vote ledger",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding chain.json (overrides BALLOTIQ_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// What to do with an unreadable chain file (overrides BALLOTIQ_CORRUPT_STORE)
    #[arg(long, global = true)]
    pub corrupt_store: Option<PolicyArg>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum PolicyArg {
    Recreate,
    Refuse,
}

impl From<PolicyArg> for CorruptStorePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Recreate => Self::Recreate,
            PolicyArg::Refuse => Self::Refuse,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the chain if needed and show its tip
    Init,
    /// Check every digest and link in the chain
    Verify,
    /// Show whether a voter has already voted
    Status(StatusArgs),
    /// Record a vote
    Vote(VoteArgs),
    /// Count votes per candidate
    Tally(TallyArgs),
    /// Print the whole chain as JSON
    Export,
}

#[derive(Args)]
pub struct StatusArgs {
    pub voter_id: String,
}

#[derive(Args)]
pub struct VoteArgs {
    pub voter_id: String,
    pub candidate_id: String,
    /// Candidate display name to record with the vote
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct TallyArgs {
    /// Only report these candidates, in this order
    #[arg(long = "candidate")]
    pub candidates: Vec<String>,
}
