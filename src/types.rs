//! Shared primitive IDs, band/mode enums, and UTC day buckets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonic QSO identifier.
pub type QsoId = u64;
/// Timestamp in milliseconds since the Unix epoch.
pub type TimestampMs = u64;

/// Length of one UTC day in milliseconds.
pub const DAY_MS: u64 = 86_400_000;

/// Returns the start of the UTC day containing `ts_ms`.
pub fn day_start(ts_ms: TimestampMs) -> TimestampMs {
    ts_ms - ts_ms % DAY_MS
}

/// Amateur band bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    /// 160 meters.
    #[serde(rename = "160m")]
    B160m,
    /// 80 meters.
    #[serde(rename = "80m")]
    B80m,
    /// 60 meters.
    #[serde(rename = "60m")]
    B60m,
    /// 40 meters.
    #[serde(rename = "40m")]
    B40m,
    /// 30 meters.
    #[serde(rename = "30m")]
    B30m,
    /// 20 meters.
    #[serde(rename = "20m")]
    B20m,
    /// 17 meters.
    #[serde(rename = "17m")]
    B17m,
    /// 15 meters.
    #[serde(rename = "15m")]
    B15m,
    /// 12 meters.
    #[serde(rename = "12m")]
    B12m,
    /// 10 meters.
    #[serde(rename = "10m")]
    B10m,
    /// 6 meters.
    #[serde(rename = "6m")]
    B6m,
    /// 2 meters.
    #[serde(rename = "2m")]
    B2m,
    /// 70 centimeters.
    #[serde(rename = "70cm")]
    B70cm,
    /// Any non-standard band.
    #[serde(rename = "other")]
    Other,
}

impl Band {
    /// Short display label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B160m => "160m",
            Self::B80m => "80m",
            Self::B60m => "60m",
            Self::B40m => "40m",
            Self::B30m => "30m",
            Self::B20m => "20m",
            Self::B17m => "17m",
            Self::B15m => "15m",
            Self::B12m => "12m",
            Self::B10m => "10m",
            Self::B6m => "6m",
            Self::B2m => "2m",
            Self::B70cm => "70cm",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emission mode bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    /// Continuous Wave.
    CW,
    /// Single side-band phone.
    SSB,
    /// Frequency modulation phone.
    FM,
    /// Any digital mode.
    Digital,
    /// Any non-standard mode.
    Other,
}

impl Mode {
    /// Short display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CW => "CW",
            Self::SSB => "SSB",
            Self::FM => "FM",
            Self::Digital => "DATA",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
