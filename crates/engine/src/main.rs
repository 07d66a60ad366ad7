//! Charforge - replays a scripted character-creation session.
//!
//! Usage: `charforge <script.json>`

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use charforge_engine::config::{self, EngineConfig, DEFAULT_LOG_FILTER};
use charforge_engine::infrastructure::notifications::TracingNotifier;
use charforge_engine::infrastructure::reference_data::StaticSpellData;
use charforge_engine::script;
use charforge_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root
    config::load_dotenv_from_repo_root();
    let config = EngineConfig::from_env();

    // Initialize logging
    let fallback = config
        .log_filter
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let script_path = std::env::args()
        .nth(1)
        .context("usage: charforge <script.json>")?;

    let spell_data = match &config.reference_data {
        Some(path) => StaticSpellData::load(path)
            .await
            .with_context(|| format!("loading reference data from {}", path.display()))?,
        None => {
            tracing::info!("No reference data configured, spell tables are empty");
            StaticSpellData::empty()
        }
    };

    let app = App::new(&config, Arc::new(spell_data), Arc::new(TracingNotifier::new()));
    app.initialize();

    let steps = script::load_script(&script_path).await?;
    tracing::info!(steps = steps.len(), script = %script_path, "Replaying session");
    let outputs = script::replay(&app, steps).await;
    app.shutdown().await;

    for output in outputs? {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
