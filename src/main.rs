use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::info;

use billing_engine::infra::{
    billing_worker::run_billing_loop,
    config::AppConfig,
    setup::{init_app_state, init_tracing},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config)?;

    let app_state = init_app_state(config).await?;
    let cancel = CancellationToken::new();

    // Spawn billing background task (after tracing is initialized)
    let worker = tokio::spawn(run_billing_loop(
        app_state.services.generator.clone(),
        app_state.services.payments.clone(),
        app_state.config.generation_poll_secs,
        app_state.config.payment_retry_interval_secs,
        cancel.clone(),
    ));

    info!("Billing engine running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown requested");
    cancel.cancel();
    worker.await?;

    Ok(())
}
