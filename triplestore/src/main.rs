#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code to prevent panics from corrupt data.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

use triplestore::connection::Load;
use triplestore::content::Content;
use triplestore::logging::init_tracing;
use triplestore::store::DEFAULT_GRAPH;
use triplestore::{ConnectionFactory, EngineConfig};

/// URI of the database the command line loads into.
const DATABASE_URI: &str = "local:default";

fn main() {
    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_filter);

    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        eprintln!("usage: triplestore <file.nt>...");
        std::process::exit(2);
    }

    let factory = ConnectionFactory::new(&config);
    let connection = match factory.connect(DATABASE_URI) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::error!("Failed to open {DATABASE_URI}: {e}");
            std::process::exit(1);
        }
    };

    let mut total = 0;
    for file in &files {
        let load = Load::new(DEFAULT_GRAPH, Content::from_path(file));
        match connection.execute(&load) {
            Ok(inserted) => {
                tracing::info!("{file}: {inserted} new statements");
                total += inserted;
            }
            Err(e) => {
                tracing::error!("Failed to load {file}: {e}");
                std::process::exit(1);
            }
        }
    }
    tracing::info!("Loaded {total} statements from {} files", files.len());

    if let Err(e) = factory.close_all() {
        tracing::warn!("Failed to close connections: {e}");
    }
}
