use anyhow::Context;
use lenslink_notifications::{
    bootstrap,
    domain::events::{next_event, SyncEvent},
    infrastructure::{env::get_env_opt, AppConfig},
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Failed to read configuration")?;
    let facade = bootstrap(&config)
        .await
        .context("Failed to start notification sync")?;

    let Some(raw_user) = get_env_opt("LENSLINK_USER_ID") else {
        info!("LENSLINK_USER_ID not set, nothing to sync");
        return Ok(());
    };
    let user_id: i64 = raw_user
        .parse()
        .with_context(|| format!("Invalid LENSLINK_USER_ID {:?}", raw_user))?;

    let mut events = facade.subscribe();
    tokio::spawn(async move {
        while let Some(event) = next_event(&mut events).await {
            if event.is_alert() {
                warn!("{:?}", event);
            } else if let SyncEvent::StatsUpdated { unread_count, .. } = event {
                info!("Unread notifications: {}", unread_count);
            }
        }
    });

    let outcome = facade.on_auth_changed(Some(user_id)).await;
    if outcome.registration_failed {
        error!("Could not register this device for push delivery");
    }

    let snapshot = facade.snapshot();
    info!(
        "Loaded {} notifications ({} unread, more pages: {})",
        snapshot.notifications.len(),
        snapshot.unread_count,
        snapshot.has_more
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    facade.on_auth_changed(None).await;
    info!("Shut down");
    Ok(())
}
