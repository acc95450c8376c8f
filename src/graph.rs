//! the result of a synthesis run: the rendered stack, plus handles to the
//! resources declared in it so callers don't have to search the template.

use aws_acm_cert::CertificateReference;
use aws_cfn_stack::SavedStack;
use aws_cloudfront_distribution::origin_access_control;
use cfn_lib::naming::sanitize;
use cfn_lib::serde_json::Value;
use cfn_lib::{CfnError, SavedTemplate};

/// output keys for one stage, eg: `QuantumBrosFrontBucketNamedev`.
/// The stage is sanitized along with the rest of the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputKeys {
    pub bucket_name: String,
    pub distribution_id: String,
    pub distribution_domain_name: String,
}

impl OutputKeys {
    pub fn for_stage(stage: &str) -> Self {
        let key = |name: &str| sanitize(&format!("QuantumBrosFront{name}-{stage}"));
        Self {
            bucket_name: key("BucketName"),
            distribution_id: key("DistributionId"),
            distribution_domain_name: key("DistributionDomainName"),
        }
    }
}

/// the output values of a synthesized stack, read back from its template.
#[derive(Debug, Clone, PartialEq)]
pub struct StackOutputs {
    pub bucket_name: Value,
    pub distribution_id: Value,
    pub distribution_domain_name: Value,
}

#[derive(Debug, Clone)]
pub struct ResourceGraph {
    pub stack: SavedStack,
    pub bucket: aws_s3::Output,
    pub origin_access_control: origin_access_control::Output,
    pub certificate: CertificateReference,
    pub distribution: aws_cloudfront_distribution::Output,
    pub logical_bucket_policy_name: String,
    pub output_keys: OutputKeys,
}

impl ResourceGraph {
    pub fn template(&self) -> &SavedTemplate {
        &self.stack.template
    }

    pub fn outputs(&self) -> Result<StackOutputs, CfnError> {
        let read = |key: &str| {
            self.stack
                .template
                .outputs
                .get(key)
                .map(|o| o.value.clone())
                .ok_or_else(|| CfnError::MissingResource(key.to_string()))
        };
        Ok(StackOutputs {
            bucket_name: read(&self.output_keys.bucket_name)?,
            distribution_id: read(&self.output_keys.distribution_id)?,
            distribution_domain_name: read(&self.output_keys.distribution_domain_name)?,
        })
    }

    /// the origins declared on the distribution, after overrides were applied.
    pub fn origins(&self) -> Result<&Vec<Value>, CfnError> {
        let distribution = self
            .template()
            .resource(&self.distribution.logical_distr_name)
            .ok_or_else(|| CfnError::MissingResource(self.distribution.logical_distr_name.clone()))?;
        distribution.properties["DistributionConfig"]["Origins"]
            .as_array()
            .ok_or_else(|| CfnError::Validation {
                name: self.distribution.logical_distr_name.clone(),
                reason: "Distribution has no origins".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_keys_are_sanitized() {
        let keys = OutputKeys::for_stage("dev");
        assert_eq!(keys.bucket_name, "QuantumBrosFrontBucketNamedev");
        assert_eq!(keys.distribution_id, "QuantumBrosFrontDistributionIddev");
        assert_eq!(keys.distribution_domain_name, "QuantumBrosFrontDistributionDomainNamedev");
    }

    #[test]
    fn hyphenated_stage_loses_its_hyphen() {
        assert_eq!(OutputKeys::for_stage("pr-42").bucket_name, "QuantumBrosFrontBucketNamepr42");
    }
}
