// ── Device status and controller health ──

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sensor::{SensorReading, Zone};

/// Why the ESP32 last restarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootReason {
    PowerOn,
    Software,
    Watchdog,
    Brownout,
    Panic,
    DeepSleep,
    Other(String),
}

impl BootReason {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "power_on" | "poweron" | "power-on" => Self::PowerOn,
            "software" | "sw_reset" | "sw" => Self::Software,
            "watchdog" | "wdt" | "task_wdt" | "int_wdt" => Self::Watchdog,
            "brownout" => Self::Brownout,
            "panic" => Self::Panic,
            "deep_sleep" | "deepsleep" => Self::DeepSleep,
            _ => Self::Other(raw.trim().to_owned()),
        }
    }

    /// Resets that point at a firmware or power problem.
    pub fn is_abnormal(&self) -> bool {
        matches!(self, Self::Watchdog | Self::Brownout | Self::Panic)
    }
}

impl std::fmt::Display for BootReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PowerOn => f.write_str("power on"),
            Self::Software => f.write_str("software reset"),
            Self::Watchdog => f.write_str("watchdog"),
            Self::Brownout => f.write_str("brownout"),
            Self::Panic => f.write_str("panic"),
            Self::DeepSleep => f.write_str("deep sleep wake"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Wi-Fi link quality bucket derived from RSSI.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
pub enum WifiSignal {
    Weak,
    Fair,
    Good,
    Excellent,
}

impl WifiSignal {
    pub fn from_rssi(dbm: i32) -> Self {
        match dbm {
            d if d >= -50 => Self::Excellent,
            d if d >= -60 => Self::Good,
            d if d >= -70 => Self::Fair,
            _ => Self::Weak,
        }
    }

    /// 1-4 bars for compact display.
    pub fn bars(self) -> u8 {
        match self {
            Self::Weak => 1,
            Self::Fair => 2,
            Self::Good => 3,
            Self::Excellent => 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub fan_on: Option<bool>,
    #[serde(with = "opt_secs")]
    pub uptime: Option<Duration>,
    pub free_heap_bytes: Option<u64>,
    pub boot_reason: Option<BootReason>,
    pub wifi_rssi_dbm: Option<i32>,
}

impl SystemHealth {
    pub fn wifi_signal(&self) -> Option<WifiSignal> {
        self.wifi_rssi_dbm.map(WifiSignal::from_rssi)
    }
}

/// Latest snapshot of the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: Option<String>,
    /// `None` when the device clock reported something implausible.
    pub reported_at: Option<DateTime<Utc>>,
    pub readings: BTreeMap<Zone, SensorReading>,
    pub system: SystemHealth,
}

impl DeviceStatus {
    /// Reading for `zone`, or an all-empty one.
    pub fn reading(&self, zone: Zone) -> SensorReading {
        self.readings.get(&zone).copied().unwrap_or_default()
    }
}

mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}
