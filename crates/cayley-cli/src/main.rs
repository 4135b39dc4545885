//! Cayley CLI
//!
//! Build Gremlin queries from the command line, print them, or run them
//! against the endpoint configured by `CAYLEY_*` environment variables.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::Level;

use cayley_gremlin::{Graph, Settings};

mod steps;

use steps::{QueryOptions, StepArg};

#[derive(Parser)]
#[command(name = "cayley")]
#[command(author, version, about = "Gremlin query builder for the Cayley graph database")]
struct Cli {
    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the serialized query without sending it.
    Render(ChainArgs),

    /// Execute the query and print one JSON object per record.
    Query {
        #[command(flatten)]
        chain: ChainArgs,
        /// Drop repeated records.
        #[arg(long)]
        distinct: bool,
        /// Strip the Freebase URI prefix and unwrap literals in `--lang`.
        #[arg(long)]
        clean: bool,
        /// Keep only records whose literals are in this language.
        #[arg(long)]
        lang: Option<String>,
        /// End with `GetLimit(N)` instead of `All()`.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print the resolved endpoint.
    Settings,
}

#[derive(Args)]
struct ChainArgs {
    /// Steps, root first: `V='["id"]' Out='["pred"]' All`.
    #[arg(required = true, value_parser = StepArg::parse)]
    steps: Vec<StepArg>,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Render(chain) => cmd_render(&chain),
        Commands::Query {
            chain,
            distinct,
            clean,
            lang,
            limit,
        } => cmd_query(
            &chain,
            &QueryOptions {
                distinct,
                clean,
                lang,
                limit,
            },
        ),
        Commands::Settings => cmd_settings(),
    }
}

fn cmd_render(chain: &ChainArgs) -> Result<()> {
    // Never contacts the endpoint.
    let graph = Graph::from_settings(&Settings::default())?;
    let query = steps::build(&graph, &chain.steps)?;
    println!("{query}");
    Ok(())
}

fn cmd_query(chain: &ChainArgs, opts: &QueryOptions) -> Result<()> {
    let settings = Settings::from_env()?;
    let graph = Graph::from_settings(&settings)?;
    let query = steps::finish(steps::build(&graph, &chain.steps)?, opts)?;

    eprintln!(
        "{} {} {}",
        "Querying".green().bold(),
        settings.query_url(),
        query.to_query_string().dimmed()
    );

    let results = query.results()?;
    for record in results.iter() {
        println!("{}", serde_json::to_string(record)?);
    }
    eprintln!("{} {} records", "ok".green().bold(), results.len());
    Ok(())
}

fn cmd_settings() -> Result<()> {
    let settings = Settings::from_env()?;
    println!("{}", settings.query_url());
    if let Some(timeout) = settings.timeout {
        println!("timeout: {}s", timeout.as_secs());
    }
    Ok(())
}
