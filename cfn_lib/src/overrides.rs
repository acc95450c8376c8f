//! raw property overrides, ie: patching a resource's properties at a dotted path
//! like `DistributionConfig.Origins.0.OriginAccessControlId` after a higher level
//! module has already declared the resource.
//!
//! Object segments are created when missing. Numeric segments index into an
//! existing array and must be in bounds: an override never grows an array.

use serde_json::{Map, Value};

use crate::error::{CfnError, Result};

pub fn apply_override(properties: &mut Value, path: &str, value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(path_err(path, "empty path segment"));
    }
    let Some((last, parents)) = segments.split_last() else {
        return Err(path_err(path, "empty path"));
    };

    let mut current = properties;
    for segment in parents {
        current = step(current, segment, path)?;
    }

    match current {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let slot = index_into(items, last, path)?;
            *slot = value;
            Ok(())
        }
        _ => Err(path_err(path, format!("cannot set '{last}' on a scalar value"))),
    }
}

fn step<'a>(current: &'a mut Value, segment: &str, path: &str) -> Result<&'a mut Value> {
    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => index_into(items, segment, path),
        _ => Err(path_err(path, format!("cannot descend into '{segment}' of a scalar value"))),
    }
}

fn index_into<'a>(items: &'a mut [Value], segment: &str, path: &str) -> Result<&'a mut Value> {
    let len = items.len();
    let index: usize = segment
        .parse()
        .map_err(|_| path_err(path, format!("'{segment}' is not an array index")))?;
    items
        .get_mut(index)
        .ok_or_else(|| path_err(path, format!("index {index} out of bounds for array of length {len}")))
}

fn path_err<S: Into<String>>(path: &str, reason: S) -> CfnError {
    CfnError::OverridePath { path: path.to_string(), reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn distribution_props() -> Value {
        json!({
            "DistributionConfig": {
                "Origins": [{ "Id": "origin1", "S3OriginConfig": {} }],
            }
        })
    }

    #[test]
    fn patches_first_origin() {
        let mut props = distribution_props();
        apply_override(
            &mut props,
            "DistributionConfig.Origins.0.OriginAccessControlId",
            json!({ "Fn::GetAtt": ["AOC", "Id"] }),
        )
        .unwrap();
        assert_eq!(
            props["DistributionConfig"]["Origins"][0]["OriginAccessControlId"],
            json!({ "Fn::GetAtt": ["AOC", "Id"] })
        );
        assert_eq!(props["DistributionConfig"]["Origins"][0]["Id"], json!("origin1"));
    }

    #[test]
    fn never_grows_an_array() {
        let mut props = distribution_props();
        let err = apply_override(&mut props, "DistributionConfig.Origins.1.OriginAccessControlId", json!("x"))
            .unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
        assert_eq!(props["DistributionConfig"]["Origins"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn creates_missing_objects() {
        let mut props = json!({});
        apply_override(&mut props, "A.B.C", json!(1)).unwrap();
        assert_eq!(props, json!({ "A": { "B": { "C": 1 } } }));
    }

    #[test]
    fn rejects_bad_paths() {
        let mut props = distribution_props();
        assert!(apply_override(&mut props, "", json!(1)).is_err());
        assert!(apply_override(&mut props, "DistributionConfig..Origins", json!(1)).is_err());
        assert!(apply_override(&mut props, "DistributionConfig.Origins.first.Id", json!(1)).is_err());
        assert!(apply_override(&mut props, "DistributionConfig.Origins.0.Id.Nested", json!(1)).is_err());
    }
}
