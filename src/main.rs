use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use pgsage::catalog::Catalog;
use pgsage::config::Config;
use pgsage::llm::LlmClient;
use pgsage::{cli, metadata};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let cfg = Config::from_env();
    info!(
        target: "pgsage",
        "pgsage starting: db={}:{}/{}, model={}",
        cfg.db.host, cfg.db.port, cfg.db.dbname, cfg.llm.model
    );

    // A database session is required; connection failure is fatal here.
    let catalog = Catalog::connect(&cfg.db).await?;

    // Build the aggregated metadata once; read-only for the session lifetime.
    let columns = catalog.fetch_columns().await?;
    let indexes = catalog.fetch_indexes().await?;
    let constraints = catalog.fetch_constraints().await?;
    let md = metadata::build(&columns, &indexes, &constraints);

    let llm = LlmClient::new(cfg.llm.clone());

    cli::run(&catalog, &md, &llm).await
}
