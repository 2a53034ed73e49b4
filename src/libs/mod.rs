pub mod cache;
pub mod dser;
pub mod time;

use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::Result;

/// Record id: a prefix, the current time and a short random suffix.
pub fn gen_id(prefix: &str) -> String {
    let time = time::now().format("%Y%m%d%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{prefix}{time}{suffix:04}")
}

/// Applies a JSON object on top of `target`. Keys missing from the patch keep
/// their current value, `null` clears an optional field.
pub fn merge_patch<T>(target: &T, patch: Value) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut base = serde_json::to_value(target)?;
    if let (Value::Object(base), Value::Object(patch)) = (&mut base, patch) {
        for (key, value) in patch {
            base.insert(key, value);
        }
    }
    Ok(serde_json::from_value(base)?)
}

/// Drops blank entries from a list of user supplied strings.
pub fn non_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        name: String,
        note: Option<String>,
        count: i32,
    }

    #[test]
    fn patch_overrides_only_given_keys() {
        let base = Sample {
            name: "a".into(),
            note: Some("keep?".into()),
            count: 3,
        };
        let out = merge_patch(&base, json!({"name": "b", "note": null})).unwrap();
        assert_eq!(
            out,
            Sample {
                name: "b".into(),
                note: None,
                count: 3
            }
        );
    }

    #[test]
    fn ids_carry_prefix_and_blank_entries_are_dropped() {
        assert!(gen_id("CUS").starts_with("CUS"));
        assert_eq!(
            non_empty(vec!["081".into(), " ".into(), String::new()]),
            vec!["081".to_owned()]
        );
    }
}
