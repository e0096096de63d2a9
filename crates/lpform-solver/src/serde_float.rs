//! Field adapter for `f64` values that may be infinite.
//!
//! JSON has no literal for infinity and `serde_json` writes it as `null`, which
//! then fails to read back. Finite values stay plain numbers; `+inf` and `-inf`
//! are written as the strings `"inf"` and `"-inf"`.
//!
//! ```ignore
//! #[serde(with = "lpform_solver::serde_float")]
//! pub upper: f64,
//! ```

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if *value == f64::INFINITY {
        serializer.serialize_str("inf")
    } else if *value == f64::NEG_INFINITY {
        serializer.serialize_str("-inf")
    } else {
        serializer.serialize_f64(*value)
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(v) => Ok(v),
        Repr::Text(s) => parse(&s).map_err(serde::de::Error::custom),
    }
}

fn parse(text: &str) -> Result<f64, String> {
    match text.trim().to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" | "+infinity" => Ok(f64::INFINITY),
        "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
        other => other
            .parse()
            .map_err(|_| format!("expected a number, \"inf\" or \"-inf\", found {:?}", text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        value: f64,
    }

    #[test]
    fn test_infinities_are_strings() {
        let json = serde_json::to_string(&Wrapper { value: f64::INFINITY }).unwrap();
        assert_eq!(json, r#"{"value":"inf"}"#);
        let json = serde_json::to_string(&Wrapper { value: f64::NEG_INFINITY }).unwrap();
        assert_eq!(json, r#"{"value":"-inf"}"#);
        let json = serde_json::to_string(&Wrapper { value: 2.5 }).unwrap();
        assert_eq!(json, r#"{"value":2.5}"#);
    }

    #[test]
    fn test_reads_numbers_and_infinities() {
        let w: Wrapper = serde_json::from_str(r#"{"value": 3}"#).unwrap();
        assert_eq!(w.value, 3.0);
        let w: Wrapper = serde_json::from_str(r#"{"value": "-inf"}"#).unwrap();
        assert_eq!(w.value, f64::NEG_INFINITY);
        let w: Wrapper = serde_json::from_str(r#"{"value": "Infinity"}"#).unwrap();
        assert_eq!(w.value, f64::INFINITY);

        assert!(serde_json::from_str::<Wrapper>(r#"{"value": "lots"}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"value": null}"#).is_err());
    }
}
