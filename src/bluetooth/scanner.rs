//! Bluetooth Low Energy scanning for sensorbox advertisements

use futures_util::StreamExt;
use log::{debug, error, warn};
use std::collections::HashMap;
use tokio::time::{sleep, Duration};

use crate::bluetooth::decoder::decode_advertisement;
use crate::devices::DeviceNames;
use crate::models::Reading;

/// Pick the sensorbox payload out of an advertisement's manufacturer data
///
/// Sensorboxes advertise exactly one manufacturer data entry. Returns the
/// configured device name and the payload, or None for foreign traffic.
pub fn match_advertisement<'a>(
    devices: &'a DeviceNames,
    manufacturer_data: &'a HashMap<u16, Vec<u8>>,
) -> Option<(&'a str, &'a [u8])> {
    if manufacturer_data.len() != 1 {
        return None;
    }

    let (&manufacturer_id, payload) = manufacturer_data.iter().next()?;
    let device_name = devices.by_manufacturer_id(manufacturer_id)?;

    Some((device_name, payload.as_slice()))
}

/// Scan for configured sensorboxes and decode their advertisements
///
/// Runs LE discovery for `duration`, then looks at the manufacturer data of
/// every device seen. The scan ends exactly once, after `duration`.
///
/// # Arguments
/// * `devices` - Configured device names used to attribute advertisements
/// * `duration` - How long to keep discovery running
///
/// # Returns
/// Result containing HashMap of device name -> decoded Reading, or error if
/// the Bluetooth session could not be set up
pub async fn scan_for_sensorboxes(
    devices: &DeviceNames,
    duration: Duration,
) -> Result<HashMap<String, Reading>, Box<dyn std::error::Error>> {
    let mut data = HashMap::new();

    let session = match bluer::Session::new().await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create Bluetooth session: {}", e);
            return Err(e.into());
        }
    };

    let adapter = match session.default_adapter().await {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to get default Bluetooth adapter: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = adapter.set_powered(true).await {
        error!("Failed to power on adapter: {}", e);
        return Err(e.into());
    }

    // Sensorboxes re-advertise fresh readings, so keep duplicates
    let filter = bluer::DiscoveryFilter {
        transport: bluer::DiscoveryTransport::Le,
        duplicate_data: true,
        ..Default::default()
    };

    if let Err(e) = adapter.set_discovery_filter(filter).await {
        warn!("Failed to set discovery filter: {}", e);
    }

    let discovery_handle = match adapter.discover_devices().await {
        Ok(discovery_stream) => tokio::spawn(async move {
            let mut stream = discovery_stream;
            while let Some(event) = stream.next().await {
                debug!("Discovery event: {:?}", event);
            }
        }),
        Err(e) => {
            error!("Failed to start device discovery: {}", e);
            return Err(e.into());
        }
    };

    sleep(duration).await;

    discovery_handle.abort();

    let addresses = match adapter.device_addresses().await {
        Ok(addresses) => addresses,
        Err(e) => {
            error!("Failed to get device addresses: {}", e);
            return Err(e.into());
        }
    };

    for addr in addresses {
        let device = match adapter.device(addr) {
            Ok(device) => device,
            Err(_) => continue,
        };

        let manufacturer_data = match device.manufacturer_data().await {
            Ok(Some(manufacturer_data)) => manufacturer_data,
            Ok(None) => continue,
            Err(e) => {
                debug!("Failed to get manufacturer data for {}: {}", addr, e);
                continue;
            }
        };

        let Some((device_name, payload)) = match_advertisement(devices, &manufacturer_data)
        else {
            continue;
        };

        let reading = decode_advertisement(payload);
        debug!(
            "Found {} | {}: temp={:.2}°C, humidity={:.2}%, timestamp={}",
            device_name, addr, reading.temperature, reading.humidity, reading.timestamp
        );

        // Several addresses may carry the same device (address rotation);
        // keep the freshest advertisement.
        match data.get(device_name) {
            Some(Reading { timestamp, .. }) if *timestamp >= reading.timestamp => {}
            _ => {
                data.insert(device_name.to_string(), reading);
            }
        }
    }

    Ok(data)
}
