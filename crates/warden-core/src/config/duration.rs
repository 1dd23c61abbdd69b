//! Human-friendly durations ("30s", "15m", "24h", "7d").

use super::ConfigError;
use chrono::Duration;

/// Parse a duration string. A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim().to_lowercase();
    let invalid = || ConfigError::Config(format!("invalid duration: {s:?}"));

    let (digits, unit): (&str, fn(i64) -> Option<Duration>) =
        if let Some(days) = s.strip_suffix('d') {
            (days, Duration::try_days)
        } else if let Some(hours) = s.strip_suffix('h') {
            (hours, Duration::try_hours)
        } else if let Some(minutes) = s.strip_suffix('m') {
            (minutes, Duration::try_minutes)
        } else if let Some(seconds) = s.strip_suffix('s') {
            (seconds, Duration::try_seconds)
        } else {
            (s.as_str(), Duration::try_seconds)
        };

    let value: i64 = digits.trim().parse().map_err(|_| invalid())?;
    unit(value).ok_or_else(invalid)
}

/// Serde adapter for optional duration strings in YAML.
pub(crate) mod serde_opt {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_str(&format!("{}s", d.num_seconds())),
            None => serializer.serialize_none(),
        }
    }
}
