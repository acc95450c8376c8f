//! a distribution in front of a single private s3 bucket.
//! The bucket is addressed by its regional domain name, and cloudfront reads from it
//! with signed requests. Use `bucket_read_statement` to let the cloudfront service
//! principal read the bucket's objects.

use aws_acm_cert::CertificateReference;
use cfn_lib::{PolicyStatement, CLOUDFRONT_SERVICE_PRINCIPAL};

use crate::{Origin, SecurityPolicyProtocol, ViewerCertificate};

pub const DEFAULT_ORIGIN_ID: &str = "origin1";

pub struct Input {
    pub bucket: aws_s3::Output,
    pub origin_id: String,

    /// optionally serve a custom domain with an imported acm certificate.
    pub certificate: Option<CertificateReference>,
    pub security_policy: SecurityPolicyProtocol,
}

impl Input {
    pub fn new(bucket: aws_s3::Output) -> Self {
        Self {
            bucket,
            origin_id: DEFAULT_ORIGIN_ID.to_string(),
            certificate: None,
            security_policy: SecurityPolicyProtocol::TlsV1_2_2021,
        }
    }
}

pub fn config(inp: &Input, distrinput: &mut crate::Input) {
    distrinput.origins = vec![Origin::s3(&inp.origin_id, inp.bucket.regional_domain_name())];
    distrinput.viewer_certificate = inp
        .certificate
        .as_ref()
        .map(|cert| ViewerCertificate::from_acm_certificate(cert, inp.security_policy));
}

/// grants `s3:GetObject` on every object of the bucket to the cloudfront service principal.
pub fn bucket_read_statement(bucket: &aws_s3::Output) -> PolicyStatement {
    PolicyStatement::allow()
        .action("s3:GetObject")
        .service_principal(CLOUDFRONT_SERVICE_PRINCIPAL)
        .resource(bucket.arn_for_objects("*"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_lib::serde_json::json;

    fn bucket() -> aws_s3::Output {
        aws_s3::Output { id: "Site".into(), logical_bucket_name: "SiteBucket".into(), cleanup: None }
    }

    #[test]
    fn single_origin_on_regional_domain_name() {
        let mut distrinput = crate::Input::default();
        config(&Input::new(bucket()), &mut distrinput);
        assert_eq!(distrinput.origins.len(), 1);
        assert_eq!(distrinput.origins[0].id, "origin1");
        assert_eq!(distrinput.origins[0].domain_name, json!({ "Fn::GetAtt": ["SiteBucket", "RegionalDomainName"] }));
        assert!(distrinput.viewer_certificate.is_none());
    }

    #[test]
    fn certificate_becomes_sni_viewer_certificate() {
        let arn = aws_acm_cert::PLACEHOLDER_CERTIFICATE_ARN;
        let cert = aws_acm_cert::config(&aws_acm_cert::Input { id: "Cert".into(), certificate_arn: arn.into() }).unwrap();
        let mut inp = Input::new(bucket());
        inp.certificate = Some(cert);
        let mut distrinput = crate::Input::default();
        config(&inp, &mut distrinput);
        let viewer = cfn_lib::serialize_properties(&distrinput.viewer_certificate).unwrap();
        assert_eq!(
            viewer,
            json!({
                "AcmCertificateArn": arn,
                "MinimumProtocolVersion": "TLSv1.2_2021",
                "SslSupportMethod": "sni-only",
            })
        );
    }

    #[test]
    fn read_statement_is_scoped_to_cloudfront() {
        let statement = bucket_read_statement(&bucket());
        let doc = cfn_lib::PolicyDocument::new(vec![statement]);
        let principals = doc.principals_allowed("s3:GetObject");
        assert_eq!(principals, vec![Some(&cfn_lib::Principal::Service("cloudfront.amazonaws.com".into()))]);
        assert!(doc.principals_allowed("s3:PutObject").is_empty());
    }
}
