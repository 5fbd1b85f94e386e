use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storewatch::{run, Sources};
use storewatch_common::Config;
use storewatch_resolve::{MemorySink, PgResultSink, ResultSink};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("storewatch=info".parse()?))
        .init();

    info!("Storewatch starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let sink: Arc<dyn ResultSink> = match &config.database_url {
        Some(url) => {
            let pg = PgResultSink::connect(url).await?;
            pg.migrate().await?;
            Arc::new(pg)
        }
        None => {
            info!("DATABASE_URL not set, verdicts go to CSV only");
            Arc::new(MemorySink::new())
        }
    };

    let sources = Sources::from_config(&config)?;
    let summary = run(&config, &sources, sink).await?;
    info!("Run complete. {summary}");

    Ok(())
}
