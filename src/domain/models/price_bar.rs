use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::DomainError;

const TIMESTAMP_KEYS: [&str; 3] = ["t", "timestamp", "time"];

/// One OHLCV observation as supplied by the caller.
///
/// Every field is optional: a bar with missing or non-numeric values is still
/// accepted and rendered with a placeholder, never rejected. Unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceBar {
    #[serde(rename = "t")]
    pub timestamp: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            ..Self::default()
        }
    }

    pub fn with_ohlc(mut self, open: f64, high: f64, low: f64, close: f64) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self.close = Some(close);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Parse the `ohlc_json` form field: a JSON array of bar objects.
    ///
    /// `null` means no bars.
    pub fn parse_series(raw: &str) -> Result<Vec<PriceBar>, DomainError> {
        serde_json::from_str::<Option<Vec<PriceBar>>>(raw)
            .map(Option::unwrap_or_default)
            .map_err(|e| DomainError::invalid_input(format!("Invalid ohlc_json: {e}")))
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            timestamp: TIMESTAMP_KEYS
                .iter()
                .find_map(|key| fields.get(*key).and_then(text)),
            open: fields.get("open").and_then(number),
            high: fields.get("high").and_then(number),
            low: fields.get("low").and_then(number),
            close: fields.get("close").and_then(number),
            volume: fields.get("volume").and_then(number),
        }
    }
}

impl<'de> Deserialize<'de> for PriceBar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_fields(&fields))
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_regular_bar() {
        let raw = r#"[{"t":"2025-01-01T00:00:00Z","open":100,"high":105,"low":99,"close":104,"volume":1000}]"#;
        let bars = PriceBar::parse_series(raw).unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(
            bars[0],
            PriceBar::new("2025-01-01T00:00:00Z")
                .with_ohlc(100.0, 105.0, 99.0, 104.0)
                .with_volume(1000.0)
        );
    }

    #[test]
    fn tolerates_missing_and_garbage_fields() {
        let raw = r#"[{"open":"101.5","high":null,"low":"n/a","close":[1],"timestamp":1735689600}]"#;
        let bars = PriceBar::parse_series(raw).unwrap();

        let bar = &bars[0];
        assert_eq!(bar.timestamp.as_deref(), Some("1735689600"));
        assert_eq!(bar.open, Some(101.5));
        assert_eq!(bar.high, None);
        assert_eq!(bar.low, None);
        assert_eq!(bar.close, None);
        assert_eq!(bar.volume, None);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = PriceBar::parse_series("[{").unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("Invalid ohlc_json"));
    }

    #[test]
    fn rejects_non_array_payload() {
        let err = PriceBar::parse_series(r#"{"t":"x"}"#).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(PriceBar::parse_series("[]").unwrap().is_empty());
    }

    #[test]
    fn prefers_t_when_several_timestamp_keys_are_present() {
        let raw = r#"[{"t":"2025-01-01","timestamp":"x","time":"y","open":1}]"#;
        let bars = PriceBar::parse_series(raw).unwrap();

        assert_eq!(bars[0].timestamp.as_deref(), Some("2025-01-01"));
        assert_eq!(bars[0].open, Some(1.0));
    }

    #[test]
    fn falls_back_to_later_timestamp_keys() {
        let raw = r#"[{"t":null,"timestamp":"x","time":"y"},{"time":"z","extra":[1,2]}]"#;
        let bars = PriceBar::parse_series(raw).unwrap();

        assert_eq!(bars[0].timestamp.as_deref(), Some("x"));
        assert_eq!(bars[1].timestamp.as_deref(), Some("z"));
    }

    #[test]
    fn null_series_means_no_bars() {
        assert!(PriceBar::parse_series("null").unwrap().is_empty());
    }

    #[test]
    fn non_object_bar_is_rejected() {
        let err = PriceBar::parse_series("[1, 2]").unwrap_err();
        assert!(err.is_client_error());
    }
}
