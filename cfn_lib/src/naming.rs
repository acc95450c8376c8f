//! naming rules for logical ids, stack names and output keys.

use crate::error::{CfnError, Result};

pub const LOGICAL_ID_MAX_LEN: usize = 255;
pub const STACK_NAME_MAX_LEN: usize = 128;
const HASH_LEN: usize = 8;

/// path components that only exist to nest a raw resource under a higher level
/// construct. They are hashed but don't show up in the readable part of a logical id.
const HIDDEN_COMPONENTS: &[&str] = &["Resource", "Default"];

/// strips everything that is not an ascii alphanumeric character.
pub fn sanitize(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// 8 uppercase hex digits of the adler32 checksum of the path joined by `/`.
pub fn path_hash(path: &[&str]) -> String {
    let joined = path.join("/");
    format!("{:08X}", adler::adler32_slice(joined.as_bytes()))
}

/// creates a logical id for a construct at `path` (relative to the stack).
/// A construct that sits directly under the stack keeps its sanitized id as is.
/// Anything nested gets the sanitized readable components plus a hash of the
/// full path, so two paths that sanitize to the same text still differ.
pub fn logical_id(path: &[&str]) -> Result<String> {
    let id = match path {
        [] => String::new(),
        [single] => sanitize(single),
        _ => {
            let mut readable: String = path
                .iter()
                .filter(|c| !HIDDEN_COMPONENTS.contains(c))
                .map(|c| sanitize(c))
                .collect();
            readable.truncate(LOGICAL_ID_MAX_LEN - HASH_LEN);
            format!("{readable}{}", path_hash(path))
        }
    };
    verify_resource_name(&id)?;
    Ok(id)
}

pub fn verify_resource_name(resource_name: &str) -> Result<()> {
    let reason = if resource_name.len() > LOGICAL_ID_MAX_LEN {
        "must be less than 255 characters"
    } else if resource_name.is_empty() {
        "Must contain at least 1 character"
    } else if !resource_name.chars().all(|c| c.is_ascii_alphanumeric()) {
        "Must contain only alphanumeric characters [A-Za-z0-9]"
    } else {
        return Ok(());
    };
    Err(CfnError::InvalidLogicalId { name: resource_name.to_string(), reason })
}

/// A stack name can contain only alphanumeric characters (case sensitive) and hyphens.
/// It must start with an alphabetical character and can't be longer than 128 characters.
pub fn validate_stack_name(stack_name: &str) -> Result<()> {
    let reason = "Must only consist of alphanumeric characters and hyphens, Must start with an alphabetical character, and cannot be longer than 128 characters.";
    let err = || CfnError::InvalidStackName { name: stack_name.to_string(), reason };
    match stack_name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(err()),
    }
    if stack_name.chars().any(|c| !c.is_ascii_alphanumeric() && c != '-') {
        return Err(err());
    }
    if stack_name.len() > STACK_NAME_MAX_LEN {
        return Err(err());
    }
    Ok(())
}
