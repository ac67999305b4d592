//! Air quality index calculation for the US EPA and Indian NAQI standards.
//!
//! The US index is table driven: every pollutant has an ascending list of
//! [`Breakpoint`]s and the index is linearly interpolated inside the first
//! segment whose upper concentration bound covers the input. The Indian
//! index uses fixed segment formulas instead.

/// Returned by [`us_aqi`] when a concentration is above every breakpoint
pub const INVALID_AQI: f32 = -1.0;

/// One linear segment of a piecewise AQI scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub c_low: f64,
    pub c_high: f64,
    pub i_low: f64,
    pub i_high: f64,
}

impl Breakpoint {
    const fn new(c_low: f64, c_high: f64, i_low: f64, i_high: f64) -> Self {
        Self {
            c_low,
            c_high,
            i_low,
            i_high,
        }
    }

    fn interpolate(&self, concentration: f64) -> f64 {
        (self.i_high - self.i_low) / (self.c_high - self.c_low) * (concentration - self.c_low)
            + self.i_low
    }
}

pub const PM25_US_BREAKPOINTS: [Breakpoint; 7] = [
    Breakpoint::new(0.0, 12.0, 0.0, 50.0),
    Breakpoint::new(12.1, 35.4, 51.0, 100.0),
    Breakpoint::new(35.5, 55.4, 101.0, 150.0),
    Breakpoint::new(55.5, 150.4, 151.0, 200.0),
    Breakpoint::new(150.5, 250.4, 201.0, 300.0),
    Breakpoint::new(250.5, 350.4, 301.0, 400.0),
    Breakpoint::new(350.5, 500.4, 401.0, 500.0),
];

pub const PM10_US_BREAKPOINTS: [Breakpoint; 7] = [
    Breakpoint::new(0.0, 54.0, 0.0, 50.0),
    Breakpoint::new(55.0, 154.0, 51.0, 100.0),
    Breakpoint::new(155.0, 254.0, 101.0, 150.0),
    Breakpoint::new(255.0, 354.0, 151.0, 200.0),
    Breakpoint::new(355.0, 424.0, 201.0, 300.0),
    Breakpoint::new(425.0, 504.0, 301.0, 400.0),
    Breakpoint::new(505.0, 604.0, 401.0, 500.0),
];

/// Interpolate `concentration` on an ascending breakpoint table
///
/// None when the concentration is above the last segment.
pub fn index_from_breakpoints(concentration: f64, breakpoints: &[Breakpoint]) -> Option<f64> {
    breakpoints
        .iter()
        .find(|bp| concentration <= bp.c_high)
        .map(|bp| bp.interpolate(concentration))
}

fn round_to(value: f32, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value as f64 * factor).round() / factor
}

/// US EPA AQI: the larger of the PM2.5 and PM10 sub-indices
///
/// PM2.5 is rounded to one decimal and PM10 to an integer before lookup,
/// as the EPA tables expect. Returns [`INVALID_AQI`] when either
/// concentration is beyond its table.
pub fn us_aqi(pm25: f32, pm10: f32) -> f32 {
    let pm25_index = index_from_breakpoints(round_to(pm25, 1), &PM25_US_BREAKPOINTS);
    let pm10_index = index_from_breakpoints(round_to(pm10, 0), &PM10_US_BREAKPOINTS);

    match (pm25_index, pm10_index) {
        (Some(a), Some(b)) => a.max(b) as f32,
        _ => INVALID_AQI,
    }
}

fn in_pm25_index(c: f64) -> f64 {
    if c <= 30.0 {
        c * 50.0 / 30.0
    } else if c <= 60.0 {
        50.0 + (c - 30.0) * 50.0 / 30.0
    } else if c <= 90.0 {
        100.0 + (c - 60.0) * 100.0 / 30.0
    } else if c <= 120.0 {
        200.0 + (c - 90.0) * 100.0 / 30.0
    } else if c <= 250.0 {
        300.0 + (c - 120.0) * 100.0 / 130.0
    } else {
        400.0 + (c - 250.0) * 100.0 / 130.0
    }
}

fn in_pm10_index(c: f64) -> f64 {
    if c <= 100.0 {
        c
    } else if c <= 250.0 {
        100.0 + (c - 100.0) * 100.0 / 150.0
    } else if c <= 350.0 {
        200.0 + (c - 250.0)
    } else if c <= 430.0 {
        300.0 + (c - 350.0) * 100.0 / 80.0
    } else {
        400.0 + (c - 430.0) * 100.0 / 80.0
    }
}

/// Indian National AQI: the larger of the PM2.5 and PM10 sub-indices
///
/// Defined for every concentration; the top segment is open ended.
pub fn in_aqi(pm25: f32, pm10: f32) -> f32 {
    in_pm25_index(pm25 as f64).max(in_pm10_index(pm10 as f64)) as f32
}

/// Six ordered severity buckets shared by both standards
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Good,
    Moderate,
    Elevated,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AqiStandard {
    Us,
    In,
}

impl AqiStandard {
    /// Upper index bound of the first five buckets
    const fn thresholds(self) -> [f32; 5] {
        match self {
            AqiStandard::Us => [50.0, 100.0, 150.0, 200.0, 300.0],
            AqiStandard::In => [50.0, 100.0, 200.0, 300.0, 400.0],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AqiStandard::Us => "US AQI",
            AqiStandard::In => "IN AQI",
        }
    }

    pub fn index(self, pm25: f32, pm10: f32) -> f32 {
        match self {
            AqiStandard::Us => us_aqi(pm25, pm10),
            AqiStandard::In => in_aqi(pm25, pm10),
        }
    }

    /// Bucket an index. Callers must filter out [`INVALID_AQI`] first.
    pub fn category(self, index: f32) -> Severity {
        const LEVELS: [Severity; 5] = [
            Severity::Good,
            Severity::Moderate,
            Severity::Elevated,
            Severity::Unhealthy,
            Severity::VeryUnhealthy,
        ];

        self.thresholds()
            .iter()
            .zip(LEVELS)
            .find(|(threshold, _)| index <= **threshold)
            .map(|(_, level)| level)
            .unwrap_or(Severity::Hazardous)
    }
}

impl Severity {
    /// Color marker used by the widget
    pub fn emoji(self, standard: AqiStandard) -> &'static str {
        match (standard, self) {
            (_, Severity::Good) => "🟢",
            (AqiStandard::Us, Severity::Moderate) => "🟡",
            (AqiStandard::Us, Severity::Elevated) => "🟠",
            (AqiStandard::Us, Severity::Unhealthy) => "🔴",
            (AqiStandard::Us, Severity::VeryUnhealthy) => "🟣",
            (AqiStandard::In, Severity::Moderate) => "🍏",
            (AqiStandard::In, Severity::Elevated) => "🟡",
            (AqiStandard::In, Severity::Unhealthy) => "🟠",
            (AqiStandard::In, Severity::VeryUnhealthy) => "🔴",
            (_, Severity::Hazardous) => "🟤",
        }
    }

    pub fn label(self, standard: AqiStandard) -> &'static str {
        match (standard, self) {
            (_, Severity::Good) => "Good",
            (AqiStandard::Us, Severity::Moderate) => "Moderate",
            (AqiStandard::Us, Severity::Elevated) => "Unhealthy for Sensitive Groups",
            (AqiStandard::Us, Severity::Unhealthy) => "Unhealthy",
            (AqiStandard::Us, Severity::VeryUnhealthy) => "Very Unhealthy",
            (AqiStandard::Us, Severity::Hazardous) => "Hazardous",
            (AqiStandard::In, Severity::Moderate) => "Satisfactory",
            (AqiStandard::In, Severity::Elevated) => "Moderate",
            (AqiStandard::In, Severity::Unhealthy) => "Poor",
            (AqiStandard::In, Severity::VeryUnhealthy) => "Very Poor",
            (AqiStandard::In, Severity::Hazardous) => "Severe",
        }
    }
}
