// Dynasty draft assistant entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Load the ranking table (fatal if missing or malformed)
// 4. Build the engine and the Sleeper feed client
// 5. Create mpsc channels
// 6. Spawn app logic task
// 7. Run the console front end until the user quits
// 8. Cleanup on exit

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dynasty_draft::app;
use dynasty_draft::config;
use dynasty_draft::console;
use dynasty_draft::draft::tracker::DraftStateTracker;
use dynasty_draft::feed::sleeper::SleeperClient;
use dynasty_draft::valuation::rankings::PlayerPool;
use dynasty_draft::valuation::Engine;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Dynasty draft assistant starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={} ({}), user={}",
        config.league.name, config.league.league_id, config.league.user_id
    );

    // 3. Load the ranking table
    let rankings_path = Path::new(&config.data_paths.rankings);
    let pool = PlayerPool::load(rankings_path)
        .with_context(|| format!("failed to load rankings from {}", rankings_path.display()))?;
    let ranked_positions = pool.positions();
    info!(
        "Loaded {} ranked players at {} positions",
        pool.len(),
        ranked_positions.len()
    );

    // 4. Engine and feed
    let engine = Engine::new(
        Arc::new(pool),
        config.roster_requirements(),
        config.recommendation_params(),
    );
    let client = SleeperClient::from_config(&config).context("failed to build Sleeper client")?;
    let tracker = DraftStateTracker::new(
        Arc::new(client),
        &config.league.user_id,
        Duration::from_secs(config.feed.timeout_secs),
    );
    let app_state = app::AppState::new(engine, &config.strategy.refresh);

    // 5. Channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state, tracker).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Console blocks until the user quits or stdin closes
    info!("Application ready");
    if let Err(e) = console::run(ui_rx, cmd_tx, ranked_positions).await {
        error!("Console error: {}", e);
    }

    // 8. Cleanup: wait for app task to finish (with timeout)
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Dynasty draft assistant shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (the terminal belongs to the console).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("dynasty-draft.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dynasty_draft=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
