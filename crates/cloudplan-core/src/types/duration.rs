//! Wait timeouts as planners write them: integer seconds or `1m30s` strings.

use std::time::Duration;

use serde::{de, Deserialize, Deserializer, Serializer};

/// Parse a duration made of `<number><unit>` groups (`ms`, `s`, `m`, `h`).
///
/// A bare number is read as seconds.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).ok();
    }

    let mut total = Duration::ZERO;
    let mut rest = raw;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let number = &rest[..number_len];
        rest = &rest[number_len..];
        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_ms: u64 = match &rest[..unit_len] {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            _ => return None,
        };
        rest = &rest[unit_len..];
        let part = match number.parse::<u64>() {
            Ok(whole) => Duration::from_millis(whole.checked_mul(unit_ms)?),
            Err(_) => {
                let value: f64 = number.parse().ok()?;
                Duration::try_from_secs_f64(value * unit_ms as f64 / 1_000.0).ok()?
            }
        };
        total = total.checked_add(part)?;
    }
    Some(total)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Fractional(f64),
    Text(String),
}

pub(crate) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawDuration>::deserialize(deserializer)? {
        None => Ok(Duration::ZERO),
        Some(RawDuration::Seconds(secs)) => Ok(Duration::from_secs(secs)),
        Some(RawDuration::Fractional(secs)) => Duration::try_from_secs_f64(secs)
            .map_err(|_| de::Error::custom(format!("invalid timeout seconds: {}", secs))),
        Some(RawDuration::Text(text)) => parse_duration(&text)
            .ok_or_else(|| de::Error::custom(format!("invalid timeout duration: {:?}", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("90"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("1h0m0s"), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("5 minutes"), None);
    }

    #[test]
    fn test_parse_duration_rejects_out_of_range_values() {
        assert_eq!(parse_duration("1e30"), None);
        assert_eq!(parse_duration("-5"), None);
        assert_eq!(parse_duration("1e30h"), None);
        assert_eq!(parse_duration("18446744073709551615s"), None);
        let summed = "9000000000000000000.0s".repeat(3);
        assert_eq!(parse_duration(&summed), None);
    }

    #[test]
    fn test_oversized_timeouts_are_errors_not_panics() {
        use crate::types::WaitFor;

        let text = serde_json::from_str::<WaitFor>(r#"{"Timeout": "1e30"}"#);
        assert!(text.is_err());
        let number = serde_json::from_str::<WaitFor>(r#"{"Timeout": 1e30}"#);
        assert!(number.is_err());

        let max = serde_json::from_str::<WaitFor>(r#"{"Timeout": 18446744073709551615}"#)
            .expect("u64 seconds");
        assert_eq!(max.timeout, Duration::from_secs(u64::MAX));
    }
}
