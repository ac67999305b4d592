//! Widget rendering: turns cached readings into labelled display items

use time::{macros::format_description, OffsetDateTime, UtcOffset};

use crate::metrics::{heat_index, sea_level_pressure, AqiStandard, INVALID_AQI};
use crate::models::{Origin, Reading};

/// One line of the widget
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub emoji: &'static str,
    pub label: &'static str,
    /// None for an index that could not be computed
    pub value: Option<f32>,
    pub unit: &'static str,
    /// Severity annotation for indices
    pub note: Option<&'static str>,
}

impl DisplayItem {
    fn new(emoji: &'static str, label: &'static str, value: f32, unit: &'static str) -> Self {
        Self {
            emoji,
            label,
            value: Some(value),
            unit,
            note: None,
        }
    }

    pub fn render(&self) -> String {
        let Some(value) = self.value else {
            return format!("{} {}: {}", self.emoji, self.label, self.note.unwrap_or("-"));
        };

        let mut line = format!("{} {}: {:.2} {}", self.emoji, self.label, value, self.unit);
        let trimmed = line.trim_end().len();
        line.truncate(trimmed);
        if let Some(note) = self.note {
            line.push_str(&format!(" ({})", note));
        }
        line
    }
}

/// Format a reading timestamp (unix seconds) for the widget header
///
/// `offset` is the local UTC offset, which has to be read before any
/// threads are spawned. Falls back to the raw number for timestamps out
/// of range.
pub fn format_timestamp(timestamp: i64, offset: UtcOffset) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");

    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|dt| dt.to_offset(offset).format(&format).ok())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Widget header line for one device
pub fn header(device: &str, reading: &Reading, offset: UtcOffset) -> String {
    let origin = match reading.origin {
        Origin::Scan => "scan",
        Origin::Push => "push",
    };
    format!(
        "{} @ {} [{}]",
        device,
        format_timestamp(reading.timestamp, offset),
        origin
    )
}

/// Display items for every field present in `reading`, plus derived metrics
///
/// Zero-valued fields are absent and skipped. An out-of-range US AQI is
/// reported as invalid instead of as a number.
pub fn display_items(reading: &Reading, altitude_m: f32) -> Vec<DisplayItem> {
    let mut items = Vec::new();

    if reading.temperature != 0.0 {
        items.push(DisplayItem::new("🌡️", "temperature", reading.temperature, "°C"));
        if reading.humidity != 0.0 {
            items.push(DisplayItem::new(
                "🌡️f",
                "heat index",
                heat_index(reading.temperature, reading.humidity),
                "°C",
            ));
        }
    }
    if reading.humidity != 0.0 {
        items.push(DisplayItem::new("💧", "humidity", reading.humidity, "%"));
    }
    if reading.pressure != 0.0 {
        items.push(DisplayItem::new(
            "⛅s",
            "sea-level pressure",
            sea_level_pressure(reading.pressure, reading.temperature, altitude_m),
            "hPa",
        ));
    }

    let plain_fields = [
        ("☀", "luminosity", reading.luminosity, "lux"),
        ("🔆", "visible", reading.visible, ""),
        ("🔴", "infrared", reading.ir, ""),
        ("📢", "sound dB(A)", reading.sound_db_a, "dB"),
        ("🔊", "sound dB(Z)", reading.sound_db_z, "dB"),
        ("🌫️₂.₅", "PM2.5", reading.pm25, "μg/m³"),
        ("🌫️₁₀", "PM10", reading.pm10, "μg/m³"),
    ];
    for (emoji, label, value, unit) in plain_fields {
        if value != 0.0 {
            items.push(DisplayItem::new(emoji, label, value, unit));
        }
    }

    if reading.pm25 != 0.0 || reading.pm10 != 0.0 {
        for standard in [AqiStandard::Us, AqiStandard::In] {
            let index = standard.index(reading.pm25, reading.pm10);
            let item = if index == INVALID_AQI {
                DisplayItem {
                    value: None,
                    note: Some("invalid"),
                    ..DisplayItem::new("⚠️", standard.as_str(), index, "")
                }
            } else {
                let severity = standard.category(index);
                DisplayItem {
                    note: Some(severity.label(standard)),
                    ..DisplayItem::new(severity.emoji(standard), standard.as_str(), index, "")
                }
            };
            items.push(item);
        }
    }

    let trailing_fields = [
        ("💨", "CO2", reading.co2, "ppm"),
        ("🔋", "voltage", reading.voltage_avg, "V"),
        ("🔋s", "secondary voltage", reading.voltage_avg_s, "V"),
    ];
    for (emoji, label, value, unit) in trailing_fields {
        if value != 0.0 {
            items.push(DisplayItem::new(emoji, label, value, unit));
        }
    }

    items
}
