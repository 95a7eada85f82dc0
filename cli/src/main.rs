//! BALLOTBOX CLI - Command Line Interface

use ballotbox_cli::{build_create_request, build_vote_request, ApiClient, ProposalInfo};
use ballotbox_core::Timestamp;
use clap::{Parser, Subcommand};
use colored::Colorize;

#[derive(Parser)]
#[command(name = "ballot")]
#[command(about = "BALLOTBOX - Voting CLI")]
#[command(version)]
struct Cli {
    /// Node URL
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Node status
    Status,

    /// List all proposals
    List,

    /// Show one proposal
    Show {
        /// Proposal ID
        id: u64,
    },

    /// Create a proposal
    Create {
        /// Creator voter id (hex)
        #[arg(short, long)]
        caller: String,

        /// Deadline in milliseconds since Unix epoch
        #[arg(long)]
        deadline: Option<u64>,

        /// Deadline as seconds from now
        #[arg(long)]
        in_secs: Option<u64>,
    },

    /// Vote on a proposal
    Vote {
        /// Proposal ID
        id: u64,

        /// Voter id (hex)
        #[arg(short, long)]
        voter: String,

        /// Vote yes
        #[arg(long, conflicts_with = "no", required_unless_present = "no")]
        yes: bool,

        /// Vote no
        #[arg(long)]
        no: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api_client = ApiClient::new(&cli.node)?;

    match cli.command {
        Commands::Status => match api_client.status().await {
            Ok(status) => {
                println!("🗳️ BALLOTBOX Node Status");
                println!("========================");
                println!("Name:             {}", status.name);
                println!("Proposals:        {}", status.proposal_count);
                println!("Next Proposal ID: {}", status.next_proposal_id);
                println!("Max Votes:        {}", status.max_votes);
                println!(
                    "Owner:            {}",
                    status.owner.as_deref().map(|o| truncate(o, 16)).unwrap_or_else(|| "anyone".into())
                );
                println!("Node Time:        {}", status.now);
            }
            Err(e) => fail(e),
        },

        Commands::List => match api_client.list_proposals().await {
            Ok(proposals) if proposals.is_empty() => println!("No proposals."),
            Ok(proposals) => {
                println!("{:<6} {:<8} {:>6} {:>6} {:>15}", "ID", "Status", "Yes", "No", "Deadline");
                println!("{:-<6} {:-<8} {:->6} {:->6} {:->15}", "", "", "", "", "");
                for p in proposals {
                    println!(
                        "{:<6} {:<8} {:>6} {:>6} {:>15}",
                        p.id,
                        p.status,
                        p.yes_count,
                        p.no_count,
                        p.deadline
                    );
                }
            }
            Err(e) => fail(e),
        },

        Commands::Show { id } => match api_client.get_proposal(id).await {
            Ok(p) => print_proposal(&p),
            Err(e) => fail(e),
        },

        Commands::Create {
            caller,
            deadline,
            in_secs,
        } => {
            let req = build_create_request(&caller, deadline, in_secs, Timestamp::now())?;
            match api_client.create_proposal(&req).await {
                Ok(created) => {
                    println!("{} Proposal created!", "✅".green());
                    println!("ID:       {}", created.id);
                    println!("Deadline: {}", req.deadline);
                }
                Err(e) => fail(e),
            }
        }

        Commands::Vote { id, voter, yes, no } => {
            let choice = yes && !no;
            let req = build_vote_request(&voter, choice)?;
            match api_client.vote(id, &req).await {
                Ok(tally) => {
                    println!("{} Vote counted!", "✅".green());
                    println!("Proposal: {}", tally.proposal_id);
                    println!("Yes:      {}", tally.yes_count);
                    println!("No:       {}", tally.no_count);
                }
                Err(e) => fail(e),
            }
        }
    }

    Ok(())
}

fn print_proposal(p: &ProposalInfo) {
    let status = match p.status.as_str() {
        "open" => p.status.green(),
        _ => p.status.red(),
    };
    println!("Proposal {}", p.id);
    println!("Status:   {}", status);
    println!("Creator:  {}", truncate(&p.creator, 16));
    println!("Deadline: {}", p.deadline);
    println!("Yes:      {}", p.yes_count);
    println!("No:       {}", p.no_count);
    println!("Capacity: {}/{}", p.yes_count + p.no_count, p.max_votes);
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("{} Error: {}", "❌".red(), e);
    std::process::exit(1);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len])
    }
}
