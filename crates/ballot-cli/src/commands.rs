use anyhow::Context;
use ballot_core::{tally, tally_for, Entry, VoteRecord};
use ballot_ledger::{Ledger, LedgerConfig, LedgerError};
use ballot_storage::FileStorage;
use colored::Colorize;
use serde_json::json;
use tracing::info;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ledger = open_ledger(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Init => cmd_init(&ledger, format),
        Command::Verify => cmd_verify(&ledger, format),
        Command::Status(args) => cmd_status(&ledger, args, format),
        Command::Vote(args) => cmd_vote(&ledger, args, format),
        Command::Tally(args) => cmd_tally(&ledger, args, format),
        Command::Export => {
            println!("{}", serde_json::to_string_pretty(&ledger.snapshot())?);
            Ok(())
        }
    }
}

fn open_ledger(cli: &Cli) -> anyhow::Result<Ledger<FileStorage>> {
    let mut config = LedgerConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(policy) = cli.corrupt_store {
        config.corrupt_store = policy.into();
    }

    info!(data_dir = %config.data_dir.display(), "opening vote chain");
    let storage = FileStorage::new(config.data_dir.clone())
        .with_context(|| format!("cannot open data directory {}", config.data_dir.display()))?;
    let ledger = Ledger::initialize(storage, &config)
        .with_context(|| format!("cannot load vote chain from {}", config.data_dir.display()))?;
    Ok(ledger)
}

fn print_entry(entry: &Entry) {
    println!("  Index:    {}", entry.sequence_index.to_string().bold());
    println!("  Digest:   {}", entry.digest.cyan());
    println!("  Previous: {}", entry.previous_digest.dimmed());
}

fn cmd_init(ledger: &Ledger<FileStorage>, format: OutputFormat) -> anyhow::Result<()> {
    let tip = ledger.tip();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tip)?),
        OutputFormat::Text => {
            println!("{} Vote chain ready ({} entries)", "✓".green().bold(), ledger.len());
            print_entry(&tip);
        }
    }
    Ok(())
}

fn cmd_verify(ledger: &Ledger<FileStorage>, format: OutputFormat) -> anyhow::Result<()> {
    let result = ledger.verify();
    if let OutputFormat::Json = format {
        let report = match &result {
            Ok(()) => json!({ "valid": true, "entries": ledger.len() }),
            Err(err) => json!({ "valid": false, "entries": ledger.len(), "error": err.to_string() }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match result {
        Ok(()) => {
            if let OutputFormat::Text = format {
                println!(
                    "{} Chain intact: {} entries verified",
                    "✓".green().bold(),
                    ledger.len()
                );
            }
            Ok(())
        }
        Err(err) => {
            if let OutputFormat::Text = format {
                println!("{} {}", "✗".red().bold(), err);
            }
            Err(err.into())
        }
    }
}

fn cmd_status(ledger: &Ledger<FileStorage>, args: StatusArgs, format: OutputFormat) -> anyhow::Result<()> {
    let has_voted = ledger.has_voter(&args.voter_id);
    match format {
        OutputFormat::Json => {
            println!("{}", json!({ "voterId": args.voter_id, "hasVoted": has_voted }));
        }
        OutputFormat::Text if has_voted => {
            println!("Voter {} {}", args.voter_id.yellow(), "has voted".green());
        }
        OutputFormat::Text => {
            println!("Voter {} {}", args.voter_id.yellow(), "has not voted".dimmed());
        }
    }
    Ok(())
}

fn cmd_vote(ledger: &Ledger<FileStorage>, args: VoteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut vote = VoteRecord::new(args.voter_id, args.candidate_id);
    if let Some(name) = args.name {
        vote = vote.with_candidate_name(name);
    }

    let entry = match ledger.cast_vote(vote) {
        Ok(entry) => entry,
        Err(err @ LedgerError::DuplicateVote { .. }) => {
            if let OutputFormat::Text = format {
                println!("{} {}", "✗".red().bold(), err);
            }
            return Err(err.into());
        }
        Err(err) => return Err(err).context("vote was not recorded"),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entry)?),
        OutputFormat::Text => {
            println!("{} Vote recorded", "✓".green().bold());
            print_entry(&entry);
        }
    }
    Ok(())
}

fn cmd_tally(ledger: &Ledger<FileStorage>, args: TallyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let entries = ledger.snapshot();
    let results: Vec<(String, u64)> = if args.candidates.is_empty() {
        tally(&entries).into_iter().collect()
    } else {
        tally_for(&entries, args.candidates)
    };

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = results
                .iter()
                .map(|(id, votes)| json!({ "candidateId": id, "votes": votes }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text if results.is_empty() => println!("No votes recorded."),
        OutputFormat::Text => {
            for (id, votes) in &results {
                println!("  {:<20} {}", id.yellow(), votes.to_string().bold());
            }
        }
    }
    Ok(())
}
