use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use time::UtcOffset;
use tokio::time::sleep;

use sensorbox_relay::bluetooth::scan_for_sensorboxes;
use sensorbox_relay::config::SensorboxConfig;
use sensorbox_relay::devices::DeviceNames;
use sensorbox_relay::display::{display_items, header};
use sensorbox_relay::push::parse_push_message;
use sensorbox_relay::reconciler::{Reconciler, Reconciliation};
use sensorbox_relay::store::{JsonFileStore, ReadingStore};

type SharedReconciler = Arc<Reconciler<Arc<JsonFileStore>>>;

/// Log the widget for every cached device
fn render_widget(store: &JsonFileStore, altitude_m: f32, offset: UtcOffset) {
    let readings = match store.snapshot() {
        Ok(readings) => readings,
        Err(e) => {
            error!("Failed to read cache: {}", e);
            return;
        }
    };

    let mut devices: Vec<_> = readings.iter().collect();
    devices.sort_by(|a, b| a.0.cmp(b.0));

    for (device, reading) in devices {
        info!("{}", header(device, reading, offset));
        for item in display_items(reading, altitude_m) {
            info!("  {}", item.render());
        }
    }
}

/// Redraw whenever the reconciler accepts an update
async fn display_loop(
    store: Arc<JsonFileStore>,
    mut refresh: watch::Receiver<u64>,
    altitude_m: f32,
    offset: UtcOffset,
) {
    render_widget(&store, altitude_m, offset);

    while refresh.changed().await.is_ok() {
        let generation = *refresh.borrow_and_update();
        debug!("Widget refresh #{}", generation);
        render_widget(&store, altitude_m, offset);
    }
}

fn log_outcome(device: &str, source: &str, outcome: Reconciliation) {
    match outcome {
        Reconciliation::Accepted(_) => debug!("Accepted {} update for {}", source, device),
        Reconciliation::Stale { cached, received } => debug!(
            "Dropped stale {} update for {}: {} <= {}",
            source, device, received, cached
        ),
    }
}

/// Read newline-delimited push messages from stdin
async fn push_loop(reconciler: SharedReconciler, devices: DeviceNames) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Push input closed");
                return;
            }
            Err(e) => {
                error!("Failed to read push input: {}", e);
                return;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let update = match parse_push_message(&line) {
            Ok(update) => update,
            Err(e) => {
                warn!("Ignoring push message: {}", e);
                continue;
            }
        };

        let Some(device) = devices.by_topic(&update.topic) else {
            debug!("Unknown device for topic {}", update.topic);
            continue;
        };

        match reconciler.reconcile(device, update.reading, false) {
            Ok(outcome) => log_outcome(device, "push", outcome),
            Err(e) => error!("Failed to store push update for {}: {}", device, e),
        }
    }
}

async fn main_loop(
    config: SensorboxConfig,
    offset: UtcOffset,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting sensorbox relay");

    let store = Arc::new(JsonFileStore::open(&config.cache_file)?);
    info!("Using cache file {}", store.path().display());

    let reconciler: SharedReconciler = Arc::new(Reconciler::new(Arc::clone(&store)));

    tokio::spawn(display_loop(
        Arc::clone(&store),
        reconciler.subscribe(),
        config.altitude_m,
        offset,
    ));
    tokio::spawn(push_loop(Arc::clone(&reconciler), config.devices.clone()));

    loop {
        match scan_for_sensorboxes(&config.devices, config.scan_duration).await {
            Ok(readings) => {
                if readings.is_empty() {
                    debug!("No sensorbox advertisements found");
                }

                // Our own observation: show it even without a newer timestamp
                for (device, reading) in readings {
                    match reconciler.reconcile(&device, reading, true) {
                        Ok(outcome) => log_outcome(&device, "scan", outcome),
                        Err(e) => error!("Failed to store scan result for {}: {}", device, e),
                    }
                }
            }
            Err(e) => error!("Scan failed: {}", e),
        }

        sleep(config.scan_interval).await;
    }
}

async fn run(config: SensorboxConfig, offset: UtcOffset) {
    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            // Keep the sender alive so the service is not shut down
            futures_util::future::pending::<()>().await;
        }
        let _ = tx.send(());
    });

    tokio::select! {
        result = main_loop(config, offset) => {
            if let Err(e) = result {
                error!("Fatal error: {}", e);
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Only readable while the process is single-threaded
    let offset = UtcOffset::current_local_offset().unwrap_or_else(|e| {
        warn!("Local UTC offset unavailable, showing UTC: {}", e);
        UtcOffset::UTC
    });

    // Load configuration
    let config = match SensorboxConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config, offset));

    Ok(())
}
