//! This module references an existing AWS ACM certificate by its ARN. Nothing is
//! created: the certificate must already be issued. This module only works if the following is true:
//! - The certificate lives in us-east-1, the only region cloudfront reads viewer certificates from.
//!   This is independent of the region the rest of the stack is deployed to.
//! - The ARN is well formed. Whether the certificate actually exists is only checked
//!   by cloudformation at deploy time.

use std::fmt;
use std::str::FromStr;

use aws_regions::{is_valid_region, partition_for_region, CLOUDFRONT_CERTIFICATE_REGION};
use thiserror::Error;

/// used when no certificate arn is configured. It is well formed, so synthesis
/// succeeds, but no such certificate exists: deploying with it fails.
pub const PLACEHOLDER_CERTIFICATE_ARN: &str = "arn:aws:acm:us-east-1:123456789012:certificate/your-certificate-id";

const KNOWN_PARTITIONS: &[&str] = &["aws", "aws-cn", "aws-us-gov"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CertificateError {
    #[error("Invalid certificate arn {arn:?}\n{reason}")]
    Malformed { arn: String, reason: String },

    #[error("Certificate {arn} was issued in {region}, but cloudfront only accepts certificates issued in {required}")]
    WrongRegion { arn: String, region: String, required: &'static str },
}

/// the pieces of `arn:<partition>:acm:<region>:<account>:certificate/<id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateArn {
    pub partition: String,
    pub region: String,
    pub account: String,
    pub certificate_id: String,
}

impl fmt::Display for CertificateArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:acm:{}:{}:certificate/{}",
            self.partition, self.region, self.account, self.certificate_id
        )
    }
}

impl FromStr for CertificateArn {
    type Err = CertificateError;

    fn from_str(arn: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| CertificateError::Malformed { arn: arn.to_string(), reason: reason.to_string() };
        let parts: Vec<&str> = arn.splitn(6, ':').collect();
        let [prefix, partition, service, region, account, resource] = parts.as_slice() else {
            return Err(malformed("Expected arn:<partition>:acm:<region>:<account>:certificate/<id>"));
        };
        if *prefix != "arn" {
            return Err(malformed("Must start with 'arn:'"));
        }
        if !KNOWN_PARTITIONS.contains(partition) {
            return Err(malformed(&format!("Unknown partition '{partition}'. Must be one of {KNOWN_PARTITIONS:?}")));
        }
        if *service != "acm" {
            return Err(malformed(&format!("Expected an acm arn, found service '{service}'")));
        }
        if !is_valid_region(region) {
            return Err(malformed(&format!("Unknown region '{region}'")));
        }
        if partition_for_region(region) != *partition {
            return Err(malformed(&format!("Region '{region}' is not in partition '{partition}'")));
        }
        if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed("Account id must be exactly 12 digits"));
        }
        let Some(certificate_id) = resource.strip_prefix("certificate/") else {
            return Err(malformed("Resource must be of the form certificate/<id>"));
        };
        if certificate_id.is_empty() || !certificate_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(malformed("Certificate id must be non-empty and only contain alphanumerics and hyphens"));
        }
        Ok(CertificateArn {
            partition: partition.to_string(),
            region: region.to_string(),
            account: account.to_string(),
            certificate_id: certificate_id.to_string(),
        })
    }
}

/// an imported certificate. It contributes no resource to the template,
/// only its arn to whatever references it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateReference {
    pub id: String,
    pub arn: CertificateArn,
}

impl CertificateReference {
    pub fn certificate_arn(&self) -> String {
        self.arn.to_string()
    }

    pub fn is_placeholder(&self) -> bool {
        self.certificate_arn() == PLACEHOLDER_CERTIFICATE_ARN
    }
}

#[derive(Default)]
pub struct Input {
    /// construct id of the reference, eg: `QuantumBrosFrontCertificate-dev`
    pub id: String,
    pub certificate_arn: String,
}

pub fn config(self_input: &Input) -> Result<CertificateReference, CertificateError> {
    let arn: CertificateArn = self_input.certificate_arn.parse()?;
    if arn.region != CLOUDFRONT_CERTIFICATE_REGION {
        return Err(CertificateError::WrongRegion {
            arn: self_input.certificate_arn.clone(),
            region: arn.region,
            required: CLOUDFRONT_CERTIFICATE_REGION,
        });
    }
    let reference = CertificateReference { id: self_input.id.clone(), arn };
    if reference.is_placeholder() {
        tracing::warn!(
            id = %reference.id,
            arn = %reference.certificate_arn(),
            "using the placeholder certificate arn, deploying this stack will fail until ACM_CERTIFICATE_ARN is set"
        );
    }
    Ok(reference)
}
