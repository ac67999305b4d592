use serde::{Deserialize, Serialize};

/// Where a reading came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Relayed through the push channel
    #[default]
    Push,
    /// Observed directly in a BLE advertisement
    Scan,
}

/// One timestamped snapshot of a device's measurements.
///
/// A value of exactly zero means "not present in this update". A genuine
/// zero reading (e.g. 0°C) cannot be told apart from a missing field; this
/// is how the sensors encode absence on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Reading {
    pub temperature: f32,
    pub humidity: f32,
    pub pressure: f32,
    pub luminosity: f32,
    pub visible: f32,
    pub ir: f32,
    pub sound_db_a: f32,
    pub sound_db_z: f32,
    pub pm25: f32,
    pub pm10: f32,
    pub co2: f32,
    pub voltage_avg: f32,
    pub voltage_avg_s: f32,
    /// Seconds, from the device's own clock
    pub timestamp: i64,
    pub origin: Origin,
}

impl Reading {
    /// Merge `newer` on top of `self`.
    ///
    /// Non-zero fields of `newer` win, zero fields keep the value from
    /// `self`. Timestamp and origin are always taken from `newer`.
    pub fn merged_with(&self, newer: &Reading) -> Reading {
        fn with_fallback(new_value: f32, old_value: f32) -> f32 {
            if new_value != 0.0 {
                new_value
            } else {
                old_value
            }
        }

        Reading {
            temperature: with_fallback(newer.temperature, self.temperature),
            humidity: with_fallback(newer.humidity, self.humidity),
            pressure: with_fallback(newer.pressure, self.pressure),
            luminosity: with_fallback(newer.luminosity, self.luminosity),
            visible: with_fallback(newer.visible, self.visible),
            ir: with_fallback(newer.ir, self.ir),
            sound_db_a: with_fallback(newer.sound_db_a, self.sound_db_a),
            sound_db_z: with_fallback(newer.sound_db_z, self.sound_db_z),
            pm25: with_fallback(newer.pm25, self.pm25),
            pm10: with_fallback(newer.pm10, self.pm10),
            co2: with_fallback(newer.co2, self.co2),
            voltage_avg: with_fallback(newer.voltage_avg, self.voltage_avg),
            voltage_avg_s: with_fallback(newer.voltage_avg_s, self.voltage_avg_s),
            timestamp: newer.timestamp,
            origin: newer.origin,
        }
    }
}
