use std::{fmt::Display, str::FromStr};

use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

/// Fallback shown for a missing value in list rows.
pub const UNSPECIFIED: &str = "ไม่ระบุ";
/// Fallback shown for a missing value in detail views.
pub const DASH: &str = "-";

/// `""` and `null` both become `None`.
pub fn deser_empty_to_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Deserialize::deserialize(de)?;
    Ok(value.and_then(|v| op::ternary!(v.trim().is_empty() => None; Some(v))))
}

/// Like [`deser_empty_to_none`] for selector values parsed through `FromStr`.
pub fn deser_empty_to_none_of<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match deser_empty_to_none(de)? {
        Some(v) => v.trim().parse().map(Some).map_err(D::Error::custom),
        None => Ok(None),
    }
}

pub fn serialize_null_to_default<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(value) => serializer.serialize_str(value),
        _ => serializer.serialize_str(""),
    }
}

pub fn serialize_null_to_dash<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(or_dash(value.as_deref()))
}

pub fn or_unspecified(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => UNSPECIFIED,
    }
}

pub fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => DASH,
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Deserialize, Serialize)]
    struct Row {
        #[serde(default, deserialize_with = "deser_empty_to_none")]
        #[serde(serialize_with = "serialize_null_to_dash")]
        tax_id: Option<String>,
    }

    #[test]
    fn blank_strings_read_as_none_and_render_as_dash() {
        let row: Row = serde_json::from_str(r#"{"tax_id": "  "}"#).unwrap();
        assert!(row.tax_id.is_none());
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"tax_id":"-"}"#);
        let row: Row = serde_json::from_str("{}").unwrap();
        assert!(row.tax_id.is_none());
    }

    #[test]
    fn fallbacks() {
        assert_eq!(or_unspecified(None), UNSPECIFIED);
        assert_eq!(or_unspecified(Some("")), UNSPECIFIED);
        assert_eq!(or_dash(Some("องค์กร")), "องค์กร");
    }
}
