use cfn_lib::serde_json::Value;
use cfn_lib::{serialize_properties, CfnResource, PolicyDocument};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AccessControl {
    #[default]
    Private,
    PublicRead,
    AuthenticatedRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
    LogDeliveryWrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicAccessBlockConfiguration {
    #[serde(rename = "BlockPublicAcls")]
    pub block_public_acls: bool,
    #[serde(rename = "BlockPublicPolicy")]
    pub block_public_policy: bool,
    #[serde(rename = "IgnorePublicAcls")]
    pub ignore_public_acls: bool,
    #[serde(rename = "RestrictPublicBuckets")]
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlockConfiguration {
    pub fn block_all() -> Self {
        Self {
            block_public_acls: true,
            block_public_policy: true,
            ignore_public_acls: true,
            restrict_public_buckets: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VersioningStatus {
    Enabled,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersioningConfiguration {
    #[serde(rename = "Status")]
    pub status: VersioningStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CfnBucket {
    #[serde(rename = "AccessControl", skip_serializing_if = "Option::is_none")]
    pub access_control: Option<AccessControl>,
    /// left empty, cloudformation generates a unique name from the stack name + logical id.
    #[serde(rename = "BucketName", skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(rename = "PublicAccessBlockConfiguration", skip_serializing_if = "Option::is_none")]
    pub public_access_block_configuration: Option<PublicAccessBlockConfiguration>,
    #[serde(rename = "VersioningConfiguration", skip_serializing_if = "Option::is_none")]
    pub versioning_configuration: Option<VersioningConfiguration>,
}

impl CfnResource for CfnBucket {
    fn type_string(&self) -> &'static str {
        "AWS::S3::Bucket"
    }
    fn properties(&self) -> cfn_lib::Result<Value> {
        serialize_properties(self)
    }
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.bucket_name {
            validate_bucket_name(name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfnBucketPolicy {
    #[serde(rename = "Bucket")]
    pub bucket: Value,
    #[serde(rename = "PolicyDocument")]
    pub policy_document: PolicyDocument,
}

impl CfnResource for CfnBucketPolicy {
    fn type_string(&self) -> &'static str {
        "AWS::S3::BucketPolicy"
    }
    fn properties(&self) -> cfn_lib::Result<Value> {
        serialize_properties(self)
    }
    fn validate(&self) -> Result<(), String> {
        if self.policy_document.statement.is_empty() {
            return Err("A bucket policy must contain at least one statement".into());
        }
        Ok(())
    }
}

/// see https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html
pub fn validate_bucket_name(name: &str) -> Result<(), String> {
    if name.len() < 3 || name.len() > 63 {
        return Err(format!("Invalid bucket name '{name}'. Must be between 3 and 63 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(format!(
            "Invalid bucket name '{name}'. Can consist only of lowercase letters, numbers, dots (.), and hyphens (-)"
        ));
    }
    let first_last_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !first_last_ok(name.chars().next()) || !first_last_ok(name.chars().last()) {
        return Err(format!("Invalid bucket name '{name}'. Must begin and end with a letter or number"));
    }
    if name.contains("..") {
        return Err(format!("Invalid bucket name '{name}'. May not contain two consecutive dots"));
    }
    if name.starts_with("xn--") {
        return Err(format!("Invalid bucket name '{name}'. Must not start with the prefix xn--"));
    }
    if name.ends_with("-s3alias") {
        return Err(format!("Invalid bucket name '{name}'. Must not end with the suffix -s3alias"));
    }
    let looks_like_ip = name.split('.').count() == 4 && name.split('.').all(|p| p.parse::<u8>().is_ok());
    if looks_like_ip {
        return Err(format!("Invalid bucket name '{name}'. Must not be formatted as an IP address"));
    }
    Ok(())
}
