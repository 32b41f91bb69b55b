//! Parsing of action magnitudes and configured limits.
//!
//! Magnitudes arrive either as JSON numbers or as human-formatted strings such
//! as `"$90M"`, `"1.5B"`, `"USD 250K"`, `"-$120M"`, or `"90,000,000"`.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Parameter keys inspected, in order, for the primary magnitude.
pub const MAGNITUDE_KEYS: [&str; 4] = ["quantity", "amount", "size", "value"];

static MAGNITUDE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<lead>[+-])?\s*(?:[a-z]{2,3}\s*)?[$€£]?\s*(?P<sign>[+-])?\s*(?P<number>\d[\d,_]*(?:\.\d+)?|\.\d+)\s*(?P<unit>thousand|million|billion|trillion|mn|bn|k|m|b|t)?\s*[$€£]?\s*(?:[a-z]{2,3})?\s*$",
    )
    .ok()
});

/// Magnitude read from action parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Magnitude {
    /// No magnitude key is present (non-trading action).
    Absent,
    /// Absolute size read from the first present key.
    Known(f64),
    /// A magnitude key is present but its value could not be read.
    Unreadable {
        /// Parameter key holding the value.
        key: &'static str,
        /// Value as it appeared in the parameters.
        raw: String,
    },
}

impl Magnitude {
    /// Returns the size when it was read successfully.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Known(size) => Some(*size),
            Self::Absent | Self::Unreadable { .. } => None,
        }
    }
}

/// Parses a human-formatted magnitude string, keeping its sign.
///
/// Accepts a leading or trailing sign, currency symbol, or currency code,
/// thousands separators, and a case-insensitive `K`/`M`/`B`/`T` suffix or
/// its spelled-out word. Returns `None` for anything else.
#[must_use]
pub fn parse_magnitude(text: &str) -> Option<f64> {
    let captures = MAGNITUDE_RE.as_ref()?.captures(text)?;
    let digits: String = captures["number"]
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    let multiplier = match captures
        .name("unit")
        .map(|unit| unit.as_str().to_ascii_lowercase())
        .as_deref()
    {
        Some("k" | "thousand") => 1e3,
        Some("m" | "mn" | "million") => 1e6,
        Some("b" | "bn" | "billion") => 1e9,
        Some("t" | "trillion") => 1e12,
        _ => 1.0,
    };
    let negative = [captures.name("lead"), captures.name("sign")]
        .into_iter()
        .flatten()
        .filter(|sign| sign.as_str() == "-")
        .count()
        % 2
        == 1;

    let value = digits.parse::<f64>().ok()? * multiplier;
    let value = if negative { -value } else { value };
    value.is_finite().then_some(value)
}

/// Extracts the primary magnitude from action parameters.
///
/// The first key of [`MAGNITUDE_KEYS`] present in `parameters` decides the
/// result; later keys are not consulted even when the first is unreadable.
/// Sell-side and short sizes are compared by absolute value.
#[must_use]
pub fn action_magnitude(parameters: &Map<String, Value>) -> Magnitude {
    let Some((key, value)) = MAGNITUDE_KEYS
        .iter()
        .find_map(|key| parameters.get(*key).map(|value| (*key, value)))
    else {
        return Magnitude::Absent;
    };
    let size = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_magnitude(text),
        _ => None,
    };
    match size.filter(|size| size.is_finite()) {
        Some(size) => Magnitude::Known(size.abs()),
        None => Magnitude::Unreadable {
            key,
            raw: match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            },
        },
    }
}

/// Formats a magnitude as whole currency units with thousands separators.
#[must_use]
pub fn format_amount(value: f64) -> String {
    let rendered = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rendered.len() + rendered.len() / 3 + 2);
    for (index, digit) in rendered.chars().enumerate() {
        if index > 0 && (rendered.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Deserialises a limit given either as a number or a magnitude string.
pub(crate) fn deserialize_limit<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawLimit {
        Number(f64),
        Text(String),
    }

    match RawLimit::deserialize(deserializer)? {
        RawLimit::Number(number) => Ok(number),
        RawLimit::Text(text) => parse_magnitude(&text)
            .ok_or_else(|| D::Error::custom(format!("unparseable limit `{text}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_human_formats() {
        assert_eq!(parse_magnitude("$90M"), Some(90_000_000.0));
        assert_eq!(parse_magnitude("1.5B"), Some(1_500_000_000.0));
        assert_eq!(parse_magnitude("250k"), Some(250_000.0));
        assert_eq!(parse_magnitude("90,000,000"), Some(90_000_000.0));
        assert_eq!(parse_magnitude("€ 12"), Some(12.0));
        assert_eq!(parse_magnitude("lots"), None);
        assert_eq!(parse_magnitude(""), None);
    }

    #[test]
    fn parses_codes_signs_and_unit_words() {
        assert_eq!(parse_magnitude("USD 120M"), Some(120_000_000.0));
        assert_eq!(parse_magnitude("120M USD"), Some(120_000_000.0));
        assert_eq!(parse_magnitude("$120 million"), Some(120_000_000.0));
        assert_eq!(parse_magnitude("2 bn"), Some(2_000_000_000.0));
        assert_eq!(parse_magnitude("-$120M"), Some(-120_000_000.0));
        assert_eq!(parse_magnitude("$-5K"), Some(-5_000.0));
        assert_eq!(parse_magnitude("+30m"), Some(30_000_000.0));
        assert_eq!(parse_magnitude("about 120M shares worth"), None);
    }

    #[test]
    fn first_present_key_wins() {
        let params = json!({"amount": "$60M", "value": 5});
        assert_eq!(
            action_magnitude(params.as_object().unwrap()),
            Magnitude::Known(60_000_000.0)
        );

        let params = json!({"quantity": "many", "amount": 10});
        assert_eq!(
            action_magnitude(params.as_object().unwrap()),
            Magnitude::Unreadable {
                key: "quantity",
                raw: "many".to_owned()
            }
        );

        let params = json!({"symbol": "AAPL"});
        assert_eq!(action_magnitude(params.as_object().unwrap()), Magnitude::Absent);
    }

    #[test]
    fn action_sizes_are_absolute() {
        let params = json!({"amount": -120_000_000});
        assert_eq!(
            action_magnitude(params.as_object().unwrap()).value(),
            Some(120_000_000.0)
        );

        let params = json!({"size": "-$120M"});
        assert_eq!(
            action_magnitude(params.as_object().unwrap()).value(),
            Some(120_000_000.0)
        );
    }

    #[test]
    fn non_scalar_values_are_unreadable() {
        let params = json!({"amount": null});
        assert_eq!(
            action_magnitude(params.as_object().unwrap()),
            Magnitude::Unreadable {
                key: "amount",
                raw: "null".to_owned()
            }
        );
    }

    #[test]
    fn negative_limits_keep_their_sign() {
        #[derive(Deserialize)]
        struct Limit {
            #[serde(deserialize_with = "deserialize_limit")]
            max: f64,
        }
        let limit: Limit = serde_json::from_str(r#"{"max": "-$5M"}"#).unwrap();
        assert!((limit.max + 5_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_amount(120_000_000.0), "$120,000,000");
        assert_eq!(format_amount(999.4), "$999");
        assert_eq!(format_amount(1000.0), "$1,000");
    }
}
