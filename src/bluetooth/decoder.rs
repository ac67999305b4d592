//! Decoding of the sensorbox BLE manufacturer data payload

use log::debug;

use crate::models::{Origin, Reading};

/// Size of a payload carrying every field
pub const FULL_PAYLOAD_LEN: usize = 24;

/// Sequential little-endian reader over an advertisement payload.
///
/// Reading past the end of the buffer yields zero instead of failing, so a
/// truncated advertisement decodes into a reading with the trailing fields
/// absent.
struct PayloadCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> PayloadCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let start = self.offset;
        let end = start.checked_add(N)?;
        self.offset = end;
        self.data.get(start..end)?.try_into().ok()
    }

    fn next_u32(&mut self) -> i64 {
        self.take::<4>()
            .map(|bytes| u32::from_le_bytes(bytes) as i64)
            .unwrap_or(0)
    }

    fn next_scaled_u16(&mut self, factor: u16) -> f32 {
        self.take::<2>()
            .map(|bytes| u16::from_le_bytes(bytes) as f32 / factor as f32)
            .unwrap_or(0.0)
    }
}

/// Reinterpret four little-endian bytes at `start` as an IEEE-754 float
///
/// Returns 0 when the buffer is too short or the bit pattern is NaN.
pub fn read_f32_bits(data: &[u8], start: usize) -> f32 {
    let Some(bytes) = start
        .checked_add(4)
        .and_then(|end| data.get(start..end))
        .and_then(|b| <[u8; 4]>::try_from(b).ok())
    else {
        return 0.0;
    };

    let value = f32::from_bits(u32::from_le_bytes(bytes));
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

/// Decode sensorbox manufacturer data into a reading
///
/// The payload (company ID already stripped) is a packed little-endian
/// sequence:
/// - Bytes 0-3: Timestamp (unsigned 32-bit, seconds)
/// - Bytes 4-5: Average supply voltage (x100)
/// - Bytes 6-7: Temperature (x100, °C)
/// - Bytes 8-9: Humidity (x100, %RH)
/// - Bytes 10-11: Pressure (x10, hPa)
/// - Bytes 12-13: Luminosity (lux)
/// - Bytes 14-15: Sound level dB(A) (x100)
/// - Bytes 16-17: Sound level dB(Z) (x100)
/// - Bytes 18-19: PM2.5 (x10, µg/m³)
/// - Bytes 20-21: PM10 (x10, µg/m³)
/// - Bytes 22-23: CO2 (ppm)
///
/// Small devices only send the first 10 bytes. Any field that does not fit
/// in `data` decodes as 0; this never fails.
pub fn decode_advertisement(data: &[u8]) -> Reading {
    let mut cursor = PayloadCursor::new(data);

    let reading = Reading {
        timestamp: cursor.next_u32(),
        voltage_avg: cursor.next_scaled_u16(100),
        temperature: cursor.next_scaled_u16(100),
        humidity: cursor.next_scaled_u16(100),
        pressure: cursor.next_scaled_u16(10),
        luminosity: cursor.next_scaled_u16(1),
        sound_db_a: cursor.next_scaled_u16(100),
        sound_db_z: cursor.next_scaled_u16(100),
        pm25: cursor.next_scaled_u16(10),
        pm10: cursor.next_scaled_u16(10),
        co2: cursor.next_scaled_u16(1),
        origin: Origin::Scan,
        ..Default::default()
    };

    debug!("Decoded {} byte advertisement: {:?}", data.len(), reading);

    reading
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_payload() -> Vec<u8> {
        let mut data = Vec::with_capacity(FULL_PAYLOAD_LEN);
        data.extend_from_slice(&1_700_000_000u32.to_le_bytes());
        data.extend_from_slice(&330u16.to_le_bytes()); // 3.30 V
        data.extend_from_slice(&2150u16.to_le_bytes()); // 21.50 °C
        data.extend_from_slice(&4525u16.to_le_bytes()); // 45.25 %
        data.extend_from_slice(&10132u16.to_le_bytes()); // 1013.2 hPa
        data.extend_from_slice(&420u16.to_le_bytes()); // 420 lux
        data.extend_from_slice(&3850u16.to_le_bytes()); // 38.50 dB(A)
        data.extend_from_slice(&5200u16.to_le_bytes()); // 52.00 dB(Z)
        data.extend_from_slice(&125u16.to_le_bytes()); // 12.5 µg/m³
        data.extend_from_slice(&310u16.to_le_bytes()); // 31.0 µg/m³
        data.extend_from_slice(&812u16.to_le_bytes()); // 812 ppm
        data
    }

    #[test]
    fn decodes_full_payload() {
        let reading = decode_advertisement(&full_payload());

        assert_eq!(reading.timestamp, 1_700_000_000);
        assert_eq!(reading.voltage_avg, 3.3);
        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.humidity, 45.25);
        assert_eq!(reading.pressure, 1013.2);
        assert_eq!(reading.luminosity, 420.0);
        assert_eq!(reading.sound_db_a, 38.5);
        assert_eq!(reading.sound_db_z, 52.0);
        assert_eq!(reading.pm25, 12.5);
        assert_eq!(reading.pm10, 31.0);
        assert_eq!(reading.co2, 812.0);
        assert_eq!(reading.origin, Origin::Scan);
        assert_eq!(reading.visible, 0.0);
        assert_eq!(reading.voltage_avg_s, 0.0);
    }

    #[test]
    fn decoding_is_deterministic() {
        let data = full_payload();
        assert_eq!(decode_advertisement(&data), decode_advertisement(&data));
    }

    #[test]
    fn truncated_payload_zeroes_only_missing_fields() {
        let data = full_payload();
        let full = decode_advertisement(&data);

        // Cuts through the humidity field
        let reading = decode_advertisement(&data[..9]);
        assert_eq!(reading.timestamp, full.timestamp);
        assert_eq!(reading.voltage_avg, full.voltage_avg);
        assert_eq!(reading.temperature, full.temperature);
        assert_eq!(reading.humidity, 0.0);
        assert_eq!(reading.pressure, 0.0);
        assert_eq!(reading.co2, 0.0);

        // Small device layout: timestamp, voltage, temperature, humidity
        let reading = decode_advertisement(&data[..10]);
        assert_eq!(reading.humidity, full.humidity);
        assert_eq!(reading.pressure, 0.0);
    }

    #[test]
    fn every_prefix_keeps_complete_fields() {
        let data = full_payload();
        let full = decode_advertisement(&data);
        let field_ends = [4usize, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24];

        for len in 0..=data.len() {
            let reading = decode_advertisement(&data[..len]);
            let values = [
                reading.timestamp as f32,
                reading.voltage_avg,
                reading.temperature,
                reading.humidity,
                reading.pressure,
                reading.luminosity,
                reading.sound_db_a,
                reading.sound_db_z,
                reading.pm25,
                reading.pm10,
                reading.co2,
            ];
            let expected = [
                full.timestamp as f32,
                full.voltage_avg,
                full.temperature,
                full.humidity,
                full.pressure,
                full.luminosity,
                full.sound_db_a,
                full.sound_db_z,
                full.pm25,
                full.pm10,
                full.co2,
            ];

            for ((value, expected), end) in values.iter().zip(expected).zip(field_ends) {
                if end <= len {
                    assert_eq!(*value, expected, "prefix {len}, field ending at {end}");
                } else {
                    assert_eq!(*value, 0.0, "prefix {len}, field ending at {end}");
                }
            }
        }
    }

    #[test]
    fn empty_payload_decodes_to_zeroes() {
        let reading = decode_advertisement(&[]);
        assert_eq!(
            reading,
            Reading {
                origin: Origin::Scan,
                ..Default::default()
            }
        );
    }

    #[test]
    fn timestamp_above_i32_range_stays_positive() {
        let data = u32::MAX.to_le_bytes();
        assert_eq!(decode_advertisement(&data).timestamp, u32::MAX as i64);
    }

    #[test]
    fn float_bits_are_reinterpreted() {
        let mut data = vec![0xAA];
        data.extend_from_slice(&23.75f32.to_le_bytes());

        assert_eq!(read_f32_bits(&data, 1), 23.75);
        assert_eq!(read_f32_bits(&data, 2), 0.0);
        assert_eq!(read_f32_bits(&f32::NAN.to_le_bytes(), 0), 0.0);
    }

    #[test]
    fn float_bits_at_offset_past_end_are_zero() {
        let data = 1.5f32.to_le_bytes();
        assert_eq!(read_f32_bits(&data, data.len()), 0.0);
        assert_eq!(read_f32_bits(&data, usize::MAX - 2), 0.0);
        assert_eq!(read_f32_bits(&data, usize::MAX), 0.0);
    }
}
