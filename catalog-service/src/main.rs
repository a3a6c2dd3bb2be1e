use std::path::PathBuf;

use clap::Parser;

use catalog_service::prelude::*;

/// catalog-service - REST backend for an e-commerce catalog
#[derive(Parser)]
#[command(name = "catalog-service")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the search path
    #[arg(long, short, env = "CATALOG_CONFIG")]
    config: Option<PathBuf>,

    /// Load this JSON array of products before serving
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    init_tracing(&config);

    let state = AppState::new(config.clone());

    if let Some(file) = cli.seed.or_else(|| config.seed.products_file.clone()) {
        Seeder::new(state.catalog().products().collection().clone())
            .import_file(file)
            .await?;
    }

    Server::new(config).serve(build_router(state)).await
}
