use dotenvy::dotenv;
use std::{env, sync::Arc, time::Duration};
use subtrack::{
    bot,
    config::{categories, database, settings::Settings},
    core::category,
    errors::{Error, Result},
    reminders::ReminderScheduler,
    state::AppState,
    store::{self, Store},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// How often billing dates are rolled forward and the views refreshed.
const MAINTENANCE_PERIOD: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Runtime settings
    let settings = Settings::from_env()
        .inspect_err(|e| error!("Failed to read settings: {e}"))?;

    // 4. Database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Default categories, first run only
    let defaults = categories::load_default_categories()?;
    let seeded = category::seed_default_categories(&db, &defaults).await?;
    if seeded > 0 {
        info!("Seeded {seeded} default categories");
    }

    // 6. Store, reminders and state
    let (scheduler, reminders) = ReminderScheduler::new(settings.reminders.clone());
    let store = Arc::new(Store::open(db, scheduler).await?);
    let advanced = store
        .refresh_billing_dates(chrono::Utc::now().date_naive())
        .await?;
    info!(
        "Scheduled {} reminders ({advanced} billing dates advanced)",
        store.reminders().pending_count()
    );
    let state = AppState::start(Arc::clone(&store)).await?;
    store::spawn_maintenance(Arc::clone(&store), MAINTENANCE_PERIOD);

    // 7. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, settings, store, state, reminders).await
}
