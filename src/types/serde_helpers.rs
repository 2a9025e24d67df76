//! Custom serde helpers for configuration values.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Serialize/deserialize a [`Duration`] as an integer number of milliseconds.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use serde::{Serialize, Deserialize};
/// use telegram_api_client::types::serde_helpers::duration_ms;
///
/// #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// struct Settings {
///     #[serde(with = "duration_ms")]
///     window_ms: Duration,
/// }
///
/// let settings: Settings = serde_json::from_str(r#"{"window_ms":1500}"#).unwrap();
/// assert_eq!(settings.window_ms, Duration::from_millis(1500));
///
/// let json = serde_json::to_string(&settings).unwrap();
/// assert_eq!(json, r#"{"window_ms":1500}"#);
/// ```
pub mod duration_ms {
    use super::*;

    /// Whole milliseconds in `duration`, saturating at `u64::MAX`.
    pub fn as_millis(duration: Duration) -> u64 {
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }

    /// Serialize a duration as milliseconds.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(as_millis(*duration))
    }

    /// Deserialize milliseconds into a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Delays {
        #[serde(with = "duration_ms")]
        initial: Duration,
    }

    #[test]
    fn test_as_millis_saturates() {
        assert_eq!(duration_ms::as_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms::as_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_duration_ms_rejects_negative() {
        let result: Result<Delays, _> = serde_json::from_str(r#"{"initial":-5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_duration_ms_truncates_sub_millisecond() {
        let delays = Delays {
            initial: Duration::from_micros(2500),
        };
        assert_eq!(serde_json::to_string(&delays).unwrap(), r#"{"initial":2}"#);
    }
}
