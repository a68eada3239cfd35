use std::path::PathBuf;

use clap::Parser;

use varelim_cli::config::QueryConfig;
use varelim_cli::input::{parse_heuristic, split_assignment};
use varelim_cli::logging::init_logging;
use varelim_cli::runner::QueryRunner;
use varelim_core::AppInfo;

/// Exact posterior queries on a discrete Bayesian network.
#[derive(Debug, Parser)]
#[command(
    name = "varelim",
    author,
    version,
    about = "Variable elimination on discrete Bayesian networks"
)]
struct Cli {
    /// Path to a YAML run file; flags below override its fields.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Network definition file.
    #[arg(short, long, value_name = "FILE")]
    network: Option<String>,

    /// Query variable by name.
    #[arg(short, long, value_name = "NAME", conflicts_with = "query_index")]
    query: Option<String>,

    /// Query variable by declaration position, counting from 0.
    #[arg(long, value_name = "INDEX")]
    query_index: Option<usize>,

    /// Observation as NAME=VALUE; repeat for several.
    #[arg(short, long, value_name = "NAME=VALUE")]
    evidence: Vec<String>,

    /// Observations as index,value pairs separated by ';' (e.g. "2,True;3,False").
    #[arg(long, value_name = "PAIRS")]
    evidence_indexed: Option<String>,

    /// Elimination order: 1 or least-incoming, 2 or fewest-factors, random or "" for random.
    #[arg(long, value_name = "HEURISTIC")]
    heuristic: Option<String>,

    /// Seed for the random order.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Write a JSON report to this path ({run_id} is substituted).
    #[arg(long, value_name = "FILE")]
    json: Option<String>,

    /// Print the formulas, the elimination order and every merge.
    #[arg(long)]
    steps: bool,

    /// Print the network before answering.
    #[arg(long)]
    show_network: bool,

    /// Exit after loading the configuration and the network (no query is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match cli.config.as_ref() {
        Some(path) => QueryConfig::from_path(path)?,
        None => QueryConfig::default(),
    };

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(network) = cli.network {
        config.network = network;
    }

    if let Some(query) = cli.query {
        config.query = Some(query);
        config.query_index = None;
    }

    if let Some(index) = cli.query_index {
        config.query_index = Some(index);
        config.query = None;
    }

    for raw in &cli.evidence {
        let (name, value) = split_assignment(raw)?;
        config
            .evidence
            .insert(name.to_string(), serde_yaml::Value::String(value.to_string()));
    }

    if let Some(indexed) = cli.evidence_indexed {
        config.evidence_indexed = Some(indexed);
    }

    if let Some(heuristic) = cli.heuristic.as_deref() {
        config.heuristic.kind = parse_heuristic(heuristic)?;
    }

    if let Some(seed) = cli.seed {
        config.heuristic.seed = Some(seed);
    }

    if let Some(json) = cli.json {
        config.output.json = Some(json);
    }

    if cli.steps {
        config.output.show_steps = true;
    }

    if cli.show_network {
        config.output.show_network = true;
    }

    config.validate()?;

    let run_id = config.run_id.clone();
    let logging_guard = init_logging(&config.logging, &run_id)?;
    let runner = QueryRunner::new(config)?;

    if cli.validate_only {
        println!(
            "{} {}: network with {} variable{} is valid; query skipped.",
            AppInfo::name(),
            AppInfo::version(),
            runner.network().len(),
            if runner.network().len() == 1 { "" } else { "s" }
        );
        return Ok(());
    }

    let summary = runner.run()?;
    print!("{}", summary.text);
    if let Some(seed) = runner.seed() {
        println!("Random order seed: {seed}");
    }
    if let Some(path) = summary.json_path.as_ref() {
        println!("JSON report: {}", path.display());
    }
    if let Some(guard) = logging_guard.as_ref() {
        println!("Log: {}", guard.log_path.display());
    }

    Ok(())
}
