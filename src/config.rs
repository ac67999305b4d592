use log::{debug, info};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::time::Duration;

use crate::devices::DeviceNames;

const DEFAULT_CACHE_FILE: &str = "sensorbox-cache.json";
const DEFAULT_SCAN_DURATION_SECS: u64 = 10;
const DEFAULT_SCAN_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct SensorboxConfig {
    pub devices: DeviceNames,
    pub altitude_m: f32,
    pub cache_file: PathBuf,
    pub scan_duration: Duration,
    pub scan_interval: Duration,
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("Invalid {}='{}': {}", key, raw, e).into()),
        None => Ok(default),
    }
}

impl SensorboxConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key -> value source
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let raw_devices = lookup("SENSORBOX_DEVICES")
            .ok_or("SENSORBOX_DEVICES environment variable not set")?;
        debug!("Found SENSORBOX_DEVICES: '{}'", raw_devices);

        let devices = DeviceNames::new(raw_devices.split(','));
        if devices.is_empty() {
            return Err("No devices configured. Please set SENSORBOX_DEVICES to a comma-separated list of device names".into());
        }

        let altitude_m: f32 = parse_or(&lookup, "SENSORBOX_ALTITUDE_M", 0.0)?;
        if !altitude_m.is_finite() {
            return Err(format!("Invalid SENSORBOX_ALTITUDE_M: {}", altitude_m).into());
        }

        let cache_file = lookup("SENSORBOX_CACHE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));

        let scan_duration = Duration::from_secs(parse_or(
            &lookup,
            "SENSORBOX_SCAN_DURATION_SECS",
            DEFAULT_SCAN_DURATION_SECS,
        )?);
        let scan_interval = Duration::from_secs(parse_or(
            &lookup,
            "SENSORBOX_SCAN_INTERVAL_SECS",
            DEFAULT_SCAN_INTERVAL_SECS,
        )?);

        info!("Total devices loaded: {}", devices.len());
        for (index, name) in devices.iter().enumerate() {
            let role = if index == 0 { "primary" } else { "secondary" };
            info!("Device: {} ({})", name, role);
        }

        Ok(SensorboxConfig {
            devices,
            altitude_m,
            cache_file,
            scan_duration,
            scan_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(
        vars: &[(&str, &str)],
    ) -> Result<SensorboxConfig, Box<dyn std::error::Error>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SensorboxConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("SENSORBOX_DEVICES", "balcony,room")]).unwrap();

        assert_eq!(config.devices.primary(), Some("balcony"));
        assert!(config.devices.contains("room"));
        assert_eq!(config.altitude_m, 0.0);
        assert_eq!(config.cache_file, PathBuf::from(DEFAULT_CACHE_FILE));
        assert_eq!(config.scan_duration, Duration::from_secs(10));
        assert_eq!(config.scan_interval, Duration::from_secs(300));
    }

    #[test]
    fn reads_all_settings() {
        let config = config_from(&[
            ("SENSORBOX_DEVICES", " balcony , room "),
            ("SENSORBOX_ALTITUDE_M", "245.5"),
            ("SENSORBOX_CACHE_FILE", "/var/lib/sensorbox/cache.json"),
            ("SENSORBOX_SCAN_DURATION_SECS", "20"),
            ("SENSORBOX_SCAN_INTERVAL_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(config.devices.iter().collect::<Vec<_>>(), vec!["balcony", "room"]);
        assert_eq!(config.altitude_m, 245.5);
        assert_eq!(
            config.cache_file,
            PathBuf::from("/var/lib/sensorbox/cache.json")
        );
        assert_eq!(config.scan_duration, Duration::from_secs(20));
        assert_eq!(config.scan_interval, Duration::from_secs(60));
    }

    #[test]
    fn devices_are_required() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("SENSORBOX_DEVICES", " , ")]).is_err());
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(config_from(&[
            ("SENSORBOX_DEVICES", "room"),
            ("SENSORBOX_ALTITUDE_M", "high"),
        ])
        .is_err());
        assert!(config_from(&[
            ("SENSORBOX_DEVICES", "room"),
            ("SENSORBOX_SCAN_INTERVAL_SECS", "-5"),
        ])
        .is_err());
    }
}
