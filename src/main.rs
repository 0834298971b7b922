use crate::app_config::AppConfig;
use crate::controller::LampController;
use crate::device::HttpTransport;
use crate::domain::DeviceEndpoint;
use crate::domain::color::ColorCatalog;
use crate::domain::events::Event;
use crate::store::Store;
use crate::store_listener::store_listener;
use std::sync::Arc;
use tokio::io::{self, BufReader};
use tokio::sync::mpsc;
use tokio::task;
use tracing::info;

mod app_config;
mod console;
mod controller;
mod device;
mod domain;
mod store;
mod store_listener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).with_writer(std::io::stderr).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!("✅  Loaded configuration");

    let endpoint = DeviceEndpoint::parse(config.device().url())?;
    let client = device::new_client(&config)?;
    let transport = Arc::new(HttpTransport::new(client, endpoint.clone()));
    info!(%endpoint, "✅  Using lamp at {}", endpoint);

    let (tx, rx) = mpsc::channel::<Event>(config.core().store_buffer_size());
    let mut store = Store::new(rx, transport.clone(), ColorCatalog::presets().default_choice().clone());
    let controller = LampController::new(tx, store.notifier());

    let store_task = task::spawn(async move {
        store.listen().await;
    });
    info!("✅  Initialized store");

    let listener_task = task::spawn(store_listener(controller.subscribe(), io::stdout()));
    info!("✅  Initialized store listener");

    info!("🔥 {} is up and running, type 'help' for a list of commands", env!("CARGO_PKG_NAME"));
    console::run(BufReader::new(io::stdin()), io::stdout(), &controller, &transport).await?;

    info!(status = controller.state().status_message(), "Console closed, stopping...");
    drop(controller);
    store_task.await?;
    listener_task.await??;

    info!("👋 {} stopped", env!("CARGO_PKG_NAME"));
    Ok(())
}
