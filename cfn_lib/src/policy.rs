use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const POLICY_VERSION: &str = "2012-10-17";
pub const CLOUDFRONT_SERVICE_PRINCIPAL: &str = "cloudfront.amazonaws.com";
pub const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Principal {
    #[serde(rename = "Service")]
    Service(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStatement {
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Principal", skip_serializing_if = "Option::is_none", default)]
    pub principal: Option<Principal>,
    #[serde(rename = "Action")]
    pub action: Vec<String>,
    #[serde(rename = "Resource", skip_serializing_if = "Vec::is_empty", default)]
    pub resource: Vec<Value>,
}

impl PolicyStatement {
    pub fn allow() -> Self {
        Self {
            effect: Effect::Allow,
            principal: None,
            action: vec![],
            resource: vec![],
        }
    }

    pub fn action<S: Into<String>>(mut self, action: S) -> Self {
        self.action.push(action.into());
        self
    }

    pub fn service_principal<S: Into<String>>(mut self, service: S) -> Self {
        self.principal = Some(Principal::Service(service.into()));
        self
    }

    pub fn resource(mut self, resource: Value) -> Self {
        self.resource.push(resource);
        self
    }

    /// true if any of this statement's actions covers `action`.
    /// patterns may use `*` as a wildcard, eg: `s3:Get*`
    pub fn covers_action(&self, action: &str) -> bool {
        self.action.iter().any(|pattern| wildcard_match(pattern, action))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<PolicyStatement>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![],
        }
    }
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self { statement, ..Default::default() }
    }

    pub fn add_statement(&mut self, statement: PolicyStatement) {
        self.statement.push(statement);
    }

    /// every principal that an Allow statement grants `action` to.
    pub fn principals_allowed(&self, action: &str) -> Vec<Option<&Principal>> {
        self.statement
            .iter()
            .filter(|s| s.effect == Effect::Allow && s.covers_action(action))
            .map(|s| s.principal.as_ref())
            .collect()
    }
}

/// the trust policy that lets `service` (eg: `lambda.amazonaws.com`) assume a role.
pub fn assume_role_policy_doc(service: &str) -> PolicyDocument {
    PolicyDocument::new(vec![PolicyStatement::allow()
        .action("sts:AssumeRole")
        .service_principal(service)])
}

fn wildcard_match(pattern: &str, value: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern.eq_ignore_ascii_case(value),
        Some((prefix, rest)) => {
            if !value.is_char_boundary(prefix.len()) || !value[..prefix.len()].eq_ignore_ascii_case(prefix) {
                return false;
            }
            let remaining = &value[prefix.len()..];
            (0..=remaining.len())
                .filter(|i| remaining.is_char_boundary(*i))
                .any(|i| wildcard_match(rest, &remaining[i..]))
        }
    }
}
