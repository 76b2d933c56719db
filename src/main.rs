//! reefer-twin CLI: question shell and structural queries over the plant graph.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use reefer_twin::config::TwinConfig;
use reefer_twin::export::{GraphExport, GraphSummary};
use reefer_twin::graph::{PlantGraph, QueryEngine, QueryKind};
use reefer_twin::llm::ChatClient;
use reefer_twin::router::IntentRouter;
use reefer_twin::session::Session;

#[derive(Parser)]
#[command(
    name = "reefer-twin",
    version,
    about = "Knowledge-graph digital twin of a ship refrigeration plant"
)]
struct Cli {
    /// TOML config file (default: ./reefer-twin.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Extracted fact file; overrides `facts_path` from the config.
    #[arg(long, global = true)]
    facts: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask free-text questions, one per line (default).
    Ask,

    /// Run one structural query.
    Query {
        /// Query to run.
        #[arg(value_enum)]
        kind: QueryArg,

        /// Component name (case-insensitive, underscores allowed).
        component: String,
    },

    /// Show graph statistics grouped by plant side.
    Info,

    /// Print the built graph as JSON.
    Export,
}

#[derive(Clone, Copy, ValueEnum)]
enum QueryArg {
    /// Components that directly influence the component.
    WhoAffects,
    /// Components the component directly influences.
    WhatItAffects,
    /// Every component with a path to the component.
    Upstream,
    /// Every component reachable from the component.
    Downstream,
}

impl From<QueryArg> for QueryKind {
    fn from(arg: QueryArg) -> Self {
        match arg {
            QueryArg::WhoAffects => QueryKind::WhoAffects,
            QueryArg::WhatItAffects => QueryKind::WhatItAffects,
            QueryArg::Upstream => QueryKind::UpstreamDependencies,
            QueryArg::Downstream => QueryKind::DownstreamImpact,
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = TwinConfig::discover(cli.config.as_deref())?;
    if let Some(facts) = cli.facts {
        config.facts_path = facts;
    }

    let graph = PlantGraph::load(&config.facts_path)?;

    match cli.command.unwrap_or(Commands::Ask) {
        Commands::Ask => {
            let client = ChatClient::from_env(config.collaborator.clone())?;
            tracing::info!(model = client.model(), "collaborator ready");
            let session = Session::new(IntentRouter::new(&graph, &client), config.session);
            session.run(io::stdin().lock(), io::stdout())?;
        }

        Commands::Query { kind, component } => {
            let kind = QueryKind::from(kind);
            let result = QueryEngine::new(&graph).run(kind, &component)?;
            println!("{} '{component}':", heading(kind));
            if result.is_empty() {
                println!(" - {}", kind.none_found());
            }
            for line in result.lines() {
                println!(" - {line}");
            }
        }

        Commands::Info => {
            print!("{}", GraphSummary::from_graph(&graph));
        }

        Commands::Export => {
            let json =
                serde_json::to_string_pretty(&GraphExport::from_graph(&graph)).into_diagnostic()?;
            println!("{json}");
        }
    }

    Ok(())
}

fn heading(kind: QueryKind) -> &'static str {
    match kind {
        QueryKind::WhoAffects => "Components affecting",
        QueryKind::WhatItAffects => "Components affected by",
        QueryKind::UpstreamDependencies => "Upstream dependencies of",
        QueryKind::DownstreamImpact => "Downstream impact of",
    }
}
