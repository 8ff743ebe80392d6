use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use structopt::StructOpt;

use token_ledger::{logger, report, ScenarioConfig, Simulation, TokenKind};

#[derive(StructOpt, Debug)]
#[structopt(name = "token-ledger", about = "Replay closed-economy ledger scenarios")]
enum Command {
    /// Run a scenario file day by day and print a summary
    Run {
        #[structopt(parse(from_os_str))]
        scenario: PathBuf,

        /// Also write one snapshot row per account per day to this CSV file
        #[structopt(long, parse(from_os_str))]
        csv: Option<PathBuf>,

        /// Print the final snapshots and audit as JSON instead of text
        #[structopt(long)]
        json: bool,
    },

    /// Show the identity encoded in a token's text form
    Decode { token: String },
}

fn main() -> Result<()> {
    logger::init();

    match Command::from_args() {
        Command::Run {
            scenario,
            csv,
            json,
        } => run(&scenario, csv.as_deref(), json),
        Command::Decode { token } => decode(&token),
    }
}

fn run(scenario: &Path, csv: Option<&Path>, json: bool) -> Result<()> {
    let config = ScenarioConfig::from_file(scenario)?;
    let simulation = Simulation::run(&config).context("Scenario could not be set up")?;
    let audit = simulation.audit();

    if let Some(path) = csv {
        report::write_csv(path, simulation.snapshots())?;
    }

    let last_day = simulation.current_date();
    let final_rows: Vec<_> = simulation
        .snapshots()
        .iter()
        .filter(|row| Some(row.date) == last_day)
        .collect();

    if json {
        let output = serde_json::json!({
            "days": simulation.days(),
            "accounts": final_rows,
            "audit": audit,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let applied: usize = simulation.days().iter().map(|d| d.actions_applied).sum();
        let rejected: usize = simulation.days().iter().map(|d| d.actions_rejected).sum();

        println!("📅 Simulated {} day(s) from {}", config.days, config.start_date);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("✓ Actions applied: {}, rejected: {}", applied, rejected);
        for row in &final_rows {
            println!(
                "  {:<12} {:<10} currency {:>4}  investment {:>4}  accumulated {:>5}  expired {:>4}",
                row.account, row.kind, row.currency, row.investment, row.accumulated, row.expired
            );
        }
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("{}", audit.summary());
        if let Some(path) = csv {
            println!("✓ Snapshots written to {:?}", path);
        }
    }

    if !audit.is_balanced() {
        bail!("conservation audit failed: {}", audit.summary());
    }
    Ok(())
}

fn decode(text: &str) -> Result<()> {
    let token = token_ledger::parse(text)?;
    let kind = match token.kind() {
        TokenKind::Currency => "currency",
        TokenKind::Investment => "investment",
    };

    println!("owner:    {}", token.owner());
    println!("created:  {}", token.created_on());
    println!("kind:     {}", kind);
    println!("sequence: {}", token.sequence());
    Ok(())
}
