//! helpers for building cloudformation intrinsic functions as json values.

use serde_json::{json, Value};

pub const PSEUDO_PREFIX: &str = "AWS::";

/// `{ "Ref": logical_id }`
pub fn get_ref(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{ "Fn::GetAtt": [logical_id, attribute] }`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{ "Fn::Sub": template }`. Variables are written as `${LogicalId}` or
/// `${LogicalId.Attribute}`.
pub fn sub<S: Into<String>>(template: S) -> Value {
    json!({ "Fn::Sub": template.into() })
}

/// `{ "Fn::Join": [delimiter, parts] }`
pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

/// the arn of objects in a bucket matching `key_pattern`, as a Fn::Join over
/// the bucket's Arn attribute. eg: `arn:aws:s3:::bucket/*` for pattern `*`
pub fn objects_arn(bucket_logical_id: &str, key_pattern: &str) -> Value {
    join("", vec![get_att(bucket_logical_id, "Arn"), Value::String(format!("/{key_pattern}"))])
}

/// collects every logical id referenced by a `Ref`, `Fn::GetAtt` or `Fn::Sub`
/// anywhere inside the value. Pseudo parameters (`AWS::Region`, ...) are skipped.
pub fn referenced_ids(value: &Value) -> Vec<String> {
    let mut out = vec![];
    collect_refs(value, &mut out);
    out
}

fn collect_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_refs(item, out);
            }
        }
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(id)) = map.get("Ref") {
                    push_id(id, out);
                    return;
                }
                if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(id)) = args.first() {
                        push_id(id, out);
                    }
                    return;
                }
                if let Some(Value::String(template)) = map.get("Fn::Sub") {
                    for var in sub_variables(template) {
                        push_id(var, out);
                    }
                    return;
                }
            }
            for v in map.values() {
                collect_refs(v, out);
            }
        }
        _ => {}
    }
}

fn push_id(id: &str, out: &mut Vec<String>) {
    if id.starts_with(PSEUDO_PREFIX) {
        return;
    }
    if !out.iter().any(|x| x == id) {
        out.push(id.to_string());
    }
}

/// the logical ids mentioned in a Fn::Sub template string.
/// `${!Literal}` is an escape and is not a variable.
fn sub_variables(template: &str) -> Vec<&str> {
    let mut out = vec![];
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else { break };
        let var = &after[..end];
        if !var.starts_with('!') {
            let id = var.split_once('.').map(|(id, _)| id).unwrap_or(var);
            out.push(id);
        }
        rest = &after[end + 1..];
    }
    out
}
