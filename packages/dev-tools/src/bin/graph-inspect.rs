//! Graph Inspection Binary
//!
//! Opens a link database and prints one owner's graph as JSON: the summary
//! panel data (degree totals, most connected notes, orphans) and the laid-out
//! visual subgraph.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin graph-inspect -- ./data/notelink.db owner-1
//!
//! # Only the summary, with a custom engine config
//! NOTELINK_CONFIG=./notelink.json cargo run --bin graph-inspect -- ./data/notelink.db owner-1 summary
//! ```
//!
//! # Environment Variables
//!
//! - `NOTELINK_DB`: Database path when no positional path is given
//! - `NOTELINK_OWNER`: Owner id when no positional owner is given
//! - `NOTELINK_CONFIG`: Optional JSON engine config file
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use notelink_core::db::LibsqlStore;
use notelink_core::{EngineConfig, LinkEngine, StaticSession};

/// Which sections to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Subgraph,
    All,
}

impl Section {
    fn parse(raw: Option<&str>) -> anyhow::Result<Self> {
        match raw {
            None | Some("all") => Ok(Section::All),
            Some("summary") => Ok(Section::Summary),
            Some("subgraph") => Ok(Section::Subgraph),
            Some(other) => anyhow::bail!(
                "Unknown section '{}' (expected summary, subgraph or all)",
                other
            ),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let db_path: PathBuf = args
        .first()
        .cloned()
        .or_else(|| env::var("NOTELINK_DB").ok())
        .map(PathBuf::from)
        .context("Missing database path (argument 1 or NOTELINK_DB)")?;
    let owner_id = args
        .get(1)
        .cloned()
        .or_else(|| env::var("NOTELINK_OWNER").ok())
        .context("Missing owner id (argument 2 or NOTELINK_OWNER)")?;
    let section = Section::parse(args.get(2).map(String::as_str))?;

    let config = match env::var("NOTELINK_CONFIG") {
        Ok(path) => EngineConfig::load(PathBuf::from(path).as_path())?,
        Err(_) => EngineConfig::default(),
    };

    tracing::info!("Database: {}", db_path.display());
    tracing::info!("Owner: {}", owner_id);

    let store = Arc::new(
        LibsqlStore::open(db_path.clone())
            .await
            .with_context(|| format!("Failed to open {}", db_path.display()))?,
    );
    let engine = LinkEngine::new(
        store.clone(),
        store,
        Arc::new(StaticSession::new(owner_id.clone())),
        config,
    );

    let mut output = serde_json::Map::new();
    if matches!(section, Section::Summary | Section::All) {
        let summary = engine.get_graph_summary(&owner_id).await?;
        output.insert("summary".to_string(), serde_json::to_value(summary)?);
    }
    if matches!(section, Section::Subgraph | Section::All) {
        let visual = engine.get_visual_subgraph(&owner_id, None).await?;
        output.insert("subgraph".to_string(), serde_json::to_value(visual)?);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
