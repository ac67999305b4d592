//! Derived environmental indices computed from raw readings

pub mod aqi;

pub use aqi::{in_aqi, us_aqi, AqiStandard, Severity, INVALID_AQI};

const GRAVITY: f64 = 9.80665; // m/s²
const MOLAR_MASS_AIR: f64 = 0.0289644; // kg/mol
const GAS_CONSTANT: f64 = 8.31447; // J/(mol·K)
const KELVIN_OFFSET: f64 = 273.15;

fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    1.8 * celsius + 32.0
}

fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Apparent temperature in °C (NWS heat index)
///
/// Uses the simple Steadman approximation, switching to the Rothfusz
/// regression with its low/high humidity adjustments once the simple value
/// reaches 80°F.
pub fn heat_index(temperature_c: f32, humidity: f32) -> f32 {
    let t = celsius_to_fahrenheit(temperature_c as f64);
    let rh = humidity as f64;

    let mut f = 0.5 * (t + 61.0 + (t - 68.0) * 1.2 + rh * 0.094);

    if f >= 80.0 {
        f = -42.379 + 2.04901523 * t + 10.14333127 * rh
            - 0.22475541 * t * rh
            - 0.00683783 * t * t
            - 0.05481717 * rh * rh
            + 0.00122874 * t * t * rh
            + 0.00085282 * t * rh * rh
            - 0.00000199 * t * t * rh * rh;

        if rh < 13.0 && t > 80.0 && t < 112.0 {
            f -= (13.0 - rh) / 4.0 * ((17.0 - (t - 95.0).abs()) / 17.0).sqrt();
        } else if rh > 85.0 && t > 80.0 && t < 87.0 {
            f += (rh - 85.0) / 10.0 * ((87.0 - t) / 5.0);
        }
    }

    fahrenheit_to_celsius(f) as f32
}

/// Station pressure corrected to sea level with the barometric formula
pub fn sea_level_pressure(pressure_hpa: f32, temperature_c: f32, altitude_m: f32) -> f32 {
    let exponent = GRAVITY * MOLAR_MASS_AIR * altitude_m as f64
        / (GAS_CONSTANT * (temperature_c as f64 + KELVIN_OFFSET));
    (pressure_hpa as f64 * exponent.exp()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn heat_index_mild_uses_simple_formula() {
        // 68°F at 50% stays well below the regression threshold
        assert_close(heat_index(20.0, 50.0), 19.361);
    }

    #[test]
    fn heat_index_at_threshold_switches_to_regression() {
        // Simple value is 80.24°F, just over the threshold
        assert_close(heat_index(27.0, 40.0), 26.863);
    }

    #[test]
    fn heat_index_hot_and_humid() {
        assert_close(heat_index(35.0, 60.0), 45.050);
    }

    #[test]
    fn heat_index_applies_low_humidity_adjustment() {
        assert_close(heat_index(40.0, 10.0), 36.705);
    }

    #[test]
    fn heat_index_applies_high_humidity_adjustment() {
        assert_close(heat_index(29.0, 90.0), 37.231);
    }

    #[test]
    fn sea_level_pressure_at_zero_altitude_is_identity() {
        assert_eq!(sea_level_pressure(1000.0, 25.0, 0.0), 1000.0);
    }

    #[test]
    fn sea_level_pressure_increases_with_altitude() {
        assert_close(sea_level_pressure(1000.0, 15.0, 100.0), 1011.926);
    }
}
