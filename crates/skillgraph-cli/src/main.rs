//! SkillGraph CLI - evidence-fused skill profiling

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use skillgraph_core::confidence::{ConfidenceCalculator, SkillConfidence, SkillProfile};
use skillgraph_core::config::Config;
use skillgraph_core::graph::{ActivityGraph, NodeKey};
use skillgraph_core::llm::LlmClient;
use skillgraph_core::metapath::{MetaPath, MetaPathWalker};
use skillgraph_core::oracle::{LlmOracle, OracleGate, ReliableOracle};
use skillgraph_core::pipeline::{self, SkillProfiler};
use skillgraph_core::source::{GraphSource, JsonFileSource};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "skillgraph")]
#[command(author, version, about = "Evidence-fused skill profiling over activity graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Explore a graph with the LLM oracle and build a person's skill profile
    Profile {
        /// Graph document (JSON)
        #[arg(short, long)]
        graph: PathBuf,
        /// Person key (`person:<login>`) or bare login
        #[arg(short, long)]
        person: String,
        /// Search iterations (defaults to exploration.iterations)
        #[arg(short, long)]
        iterations: Option<usize>,
        /// Directory for the profile and evolved graph
        #[arg(short, long, default_value = "output")]
        out: PathBuf,
        /// Minimum belief for a skill to be listed
        #[arg(long)]
        min_belief: Option<f64>,
    },

    /// Compute the confidence that a person holds one skill
    Confidence {
        #[arg(short, long)]
        graph: PathBuf,
        #[arg(short, long)]
        person: String,
        /// Skill display name
        #[arg(short, long)]
        skill: String,
    },

    /// Enumerate typed paths from a start node
    Paths {
        #[arg(short, long)]
        graph: PathBuf,
        /// Start node key, e.g. `person:octocat`
        #[arg(long)]
        start: String,
        /// `expertise`, `collaboration` or a compact `kind-relation-kind` schema
        #[arg(long, default_value = "expertise")]
        schema: String,
        /// Stop after this many matches
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show node and edge counts of a graph
    Inspect {
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("skillgraph=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profile {
            graph,
            person,
            iterations,
            out,
            min_belief,
        } => {
            cmd_profile(
                &graph,
                &person,
                iterations,
                &out,
                min_belief,
                cli.format,
                cli.quiet,
            )
            .await
        }

        Commands::Confidence {
            graph,
            person,
            skill,
        } => cmd_confidence(&graph, &person, &skill, cli.format).await,

        Commands::Paths {
            graph,
            start,
            schema,
            limit,
        } => cmd_paths(&graph, &start, &schema, limit, cli.format, cli.quiet).await,

        Commands::Inspect { graph } => cmd_inspect(&graph, cli.format).await,

        Commands::Config { action } => cmd_config(action, cli.quiet),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn load_graph(path: &Path) -> anyhow::Result<ActivityGraph> {
    JsonFileSource::new(path)
        .load()
        .await
        .with_context(|| format!("Failed to load graph from {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_profile(
    graph_path: &Path,
    person: &str,
    iterations: Option<usize>,
    out: &Path,
    min_belief: Option<f64>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(min_belief) = min_belief {
        config
            .set("confidence.min_belief", &min_belief.to_string())
            .context("Invalid --min-belief")?;
    }

    // Fail before any graph work if the oracle cannot be reached
    let api_key = config.llm.resolved_api_key()?.ok_or_else(|| {
        anyhow::anyhow!(
            "Configuration error: no API key. Set SKILLGRAPH_API_KEY or OPENROUTER_API_KEY."
        )
    })?;
    let person = pipeline::parse_person(person)?;

    let client = LlmClient::new(config.llm.clone(), api_key)?;
    let gate = OracleGate::new(config.oracle.max_concurrent_calls);
    let oracle = ReliableOracle::from_config(Arc::new(LlmOracle::new(client)), gate, &config.oracle);

    let iterations = iterations.unwrap_or(config.exploration.iterations);
    let profiler = SkillProfiler::new(Arc::new(JsonFileSource::new(graph_path)), oracle, config);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current iteration");
            on_signal.cancel();
        }
    });

    if !quiet && format == OutputFormat::Text {
        println!("Profiling {} ({} iterations)...", person, iterations);
    }
    let outcome = profiler.profile_with(&person, iterations, &cancel).await?;
    let (profile_path, graph_path) = outcome.write_to(out)?;
    info!(skills = outcome.profile.len(), "Profile complete");

    match format {
        OutputFormat::Json => print_json(&outcome.profile)?,
        OutputFormat::Text => {
            if outcome.exploration.cancelled && !quiet {
                println!(
                    "Exploration cancelled after {} iterations.",
                    outcome.exploration.iterations_completed
                );
            }
            print_profile(&outcome.profile);
            if !quiet {
                println!();
                println!(
                    "Skills discovered: {}",
                    outcome.exploration.skills_discovered.len()
                );
                println!("Implies edges written: {}", outcome.exploration.implies_written);
                println!("Profile: {}", profile_path.display());
                println!("Graph:   {}", graph_path.display());
            }
        }
    }
    Ok(())
}

fn print_profile(profile: &SkillProfile) {
    println!("Skill profile for {}", profile.person);
    if profile.is_empty() {
        println!("  (no skills above the belief threshold)");
        return;
    }
    println!(
        "  {:<30} {:>8} {:>8} {:>8} {:>6}",
        "SKILL", "BELIEF", "PLAUS", "UNCERT", "PATHS"
    );
    for skill in &profile.skills {
        println!(
            "  {:<30} {:>8.4} {:>8.4} {:>8.4} {:>6}",
            skill.skill_name, skill.belief, skill.plausibility, skill.uncertainty, skill.path_count
        );
    }
}

async fn cmd_confidence(
    graph_path: &Path,
    person: &str,
    skill: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let person = pipeline::parse_person(person)?;
    let graph = load_graph(graph_path).await?;

    let result = ConfidenceCalculator::with_config(&graph, &config.confidence)
        .compute_skill_confidence(&person, &NodeKey::skill(skill))?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => print_confidence(&person, &result),
    }
    Ok(())
}

fn print_confidence(person: &NodeKey, result: &SkillConfidence) {
    println!("{} -> {}", person, result.skill_name);
    println!("  Belief:       {:.4}", result.belief);
    println!("  Plausibility: {:.4}", result.plausibility);
    println!("  Uncertainty:  {:.4}", result.uncertainty);
    println!("  Paths:        {}", result.path_count);
    if result.truncated {
        println!("  (path enumeration capped)");
    }
    println!("  Model:        {}", result.model_tag);
}

async fn cmd_paths(
    graph_path: &Path,
    start: &str,
    schema: &str,
    limit: Option<usize>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let start: NodeKey = start.parse()?;
    let schema = MetaPath::parse(schema)?;
    let graph = load_graph(graph_path).await?;
    if !graph.contains(&start) {
        anyhow::bail!("Node '{}' not found in the graph", start);
    }

    let mut walker = MetaPathWalker::new(&graph);
    if let Some(limit) = limit {
        walker = walker.with_max_matches(limit);
    }
    let matches = walker.find_matches(&start, &schema);

    match format {
        OutputFormat::Json => {
            let paths: Vec<serde_json::Value> = matches
                .paths
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "path": p,
                        "similarity": walker.compute_path_sim(p),
                    })
                })
                .collect();
            print_json(&serde_json::json!({
                "schema": schema.to_string(),
                "start": start,
                "truncated": matches.truncated,
                "paths": paths,
                "targets": walker.rank_targets(&start, &schema),
            }))?;
        }
        OutputFormat::Text => {
            if !quiet {
                println!("{}", schema);
            }
            for path in &matches.paths {
                let rendered: Vec<String> = path.iter().map(ToString::to_string).collect();
                println!(
                    "  {:.4}  {}",
                    walker.compute_path_sim(path),
                    rendered.join(" -> ")
                );
            }
            if !quiet {
                println!();
                println!("{} paths", matches.paths.len());
                if matches.truncated {
                    println!("(stopped at --limit)");
                }
            }
        }
    }
    Ok(())
}

async fn cmd_inspect(graph_path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let graph = load_graph(graph_path).await?;
    let nodes = graph.count_by_kind();
    let edges = graph.count_by_relation();

    match format {
        OutputFormat::Json => {
            let nodes: serde_json::Map<String, serde_json::Value> = nodes
                .iter()
                .map(|(kind, n)| (kind.to_string(), (*n).into()))
                .collect();
            print_json(&serde_json::json!({
                "node_count": graph.node_count(),
                "edge_count": graph.edge_count(),
                "nodes": nodes,
                "edges": edges,
            }))?;
        }
        OutputFormat::Text => {
            println!("Nodes: {}", graph.node_count());
            for (kind, n) in &nodes {
                println!("  {:<12} {}", kind, n);
            }
            println!("Edges: {}", graph.edge_count());
            for (relation, n) in &edges {
                println!("  {:<12} {}", relation, n);
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
