//! a higher level module for declaring a cloudfront distribution.
//! The first origin in `Input::origins` is the default origin: the default cache
//! behavior always targets it.
//!
//! See `s3_origin_distribution` for a distribution in front of a private s3 bucket.

use aws_cfn_stack::{Input as StackInput, PropertyOverride};
use cfn_lib::naming::logical_id;
use cfn_lib::serde_json::Value;
use cfn_lib::{get_att, get_ref, CfnError, Resource};

pub mod origin_access_control;
pub mod s3_origin_distribution;
mod types;

pub use types::*;

/// the origin access control id can only be set on an origin that already exists,
/// so it is patched in after the distribution is declared.
pub const ORIGIN_ACCESS_CONTROL_PATH: &str = "OriginAccessControlId";

pub struct Input {
    /// the construct id of the distribution. The logical id is derived from it.
    pub id: String,

    /// by default we create the distribution enabled and ready to use.
    /// optionally set this field to true to create the distribution
    /// but have it be disabled at first.
    pub disabled: bool,

    /// must contain at least one origin. The first is the default origin.
    pub origins: Vec<Origin>,

    /// By default set to redirect-to-https.
    pub viewer_protocol_policy: ViewerProtocolPolicy,

    pub allowed_methods: AllowedMethods,
    pub cached_methods: CachedMethods,
    pub compress: bool,
    pub forwarded_values: ForwardedValues,
    pub min_ttl: u64,
    pub default_ttl: u64,
    pub max_ttl: u64,

    /// the object returned when a viewer requests the root url.
    pub default_root_object: Option<String>,
    pub custom_error_responses: Vec<CustomErrorResponse>,
    pub aliases: Vec<String>,
    pub comment: Option<String>,
    pub http_version: HttpVersion,
    pub ipv6_enabled: bool,
    pub price_class: PriceClass,

    /// without a viewer certificate cloudfront serves its default *.cloudfront.net certificate.
    pub viewer_certificate: Option<ViewerCertificate>,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            id: String::new(),
            disabled: false,
            origins: vec![],
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            allowed_methods: AllowedMethods::GetHead,
            cached_methods: CachedMethods::GetHead,
            compress: true,
            forwarded_values: ForwardedValues::default(),
            min_ttl: 0,
            default_ttl: 86400,
            max_ttl: 31536000,
            default_root_object: Some("index.html".to_string()),
            custom_error_responses: vec![],
            aliases: vec![],
            comment: None,
            http_version: HttpVersion::Http2,
            ipv6_enabled: true,
            price_class: PriceClass::PriceClass100,
            viewer_certificate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub id: String,
    /// the logical name of the distribution in cloudformation.
    pub logical_distr_name: String,
}

impl Output {
    /// resolves to the distribution id, eg: `E2QWRUHAPOMQZL`
    pub fn distribution_id(&self) -> Value {
        get_ref(&self.logical_distr_name)
    }

    /// resolves to the cloudfront domain, eg: `d111111abcdef8.cloudfront.net`
    pub fn domain_name(&self) -> Value {
        get_att(&self.logical_distr_name, "DomainName")
    }
}

pub fn config(myinput: &Input, stackinp: &mut StackInput) -> Result<Output, CfnError> {
    let Some(default_origin) = myinput.origins.first() else {
        return Err(CfnError::Validation {
            name: myinput.id.clone(),
            reason: "A distribution must have at least one origin".into(),
        });
    };
    let default_cache_behavior = DefaultCacheBehavior {
        allowed_methods: myinput.allowed_methods.methods(),
        cached_methods: myinput.cached_methods.methods(),
        compress: myinput.compress,
        default_ttl: myinput.default_ttl,
        forwarded_values: myinput.forwarded_values.clone(),
        max_ttl: myinput.max_ttl,
        min_ttl: myinput.min_ttl,
        target_origin_id: default_origin.id.clone(),
        viewer_protocol_policy: myinput.viewer_protocol_policy,
    };
    let distribution = CfnDistribution {
        distribution_config: DistributionConfig {
            aliases: myinput.aliases.clone(),
            comment: myinput.comment.clone(),
            custom_error_responses: myinput.custom_error_responses.clone(),
            default_cache_behavior,
            default_root_object: myinput.default_root_object.clone(),
            enabled: !myinput.disabled,
            http_version: myinput.http_version,
            ipv6_enabled: myinput.ipv6_enabled,
            origins: myinput.origins.clone(),
            price_class: myinput.price_class,
            viewer_certificate: myinput.viewer_certificate.clone(),
        },
    };

    let logical_distr_name = logical_id(&[&myinput.id, "CFDistribution"])?;
    stackinp.resources.push(Resource::new(logical_distr_name.clone(), distribution));
    tracing::debug!(
        id = %myinput.id,
        logical_id = %logical_distr_name,
        origins = myinput.origins.len(),
        "added cloudfront distribution"
    );
    Ok(Output {
        id: myinput.id.clone(),
        logical_distr_name,
    })
}

/// a patch that points origin `origin_index` of the distribution at an origin access control.
pub fn origin_access_control_override(
    distribution: &Output,
    oac: &origin_access_control::Output,
    origin_index: usize,
) -> PropertyOverride {
    PropertyOverride {
        logical_id: distribution.logical_distr_name.clone(),
        path: format!("DistributionConfig.Origins.{origin_index}.{ORIGIN_ACCESS_CONTROL_PATH}"),
        value: oac.oac_id(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_lib::serde_json::json;

    fn input() -> Input {
        Input {
            id: "CDN".into(),
            origins: vec![Origin::s3("origin1", json!("bucket.s3.us-east-1.amazonaws.com"))],
            ..Default::default()
        }
    }

    #[test]
    fn default_behavior_targets_first_origin() {
        let mut stackinp = StackInput::default();
        let out = config(&input(), &mut stackinp).unwrap();
        let distr = &stackinp.resources[0];
        assert_eq!(distr.name, out.logical_distr_name);
        assert_eq!(distr.properties.type_string(), "AWS::CloudFront::Distribution");
        let props = distr.properties.properties().unwrap();
        let config = &props["DistributionConfig"];
        assert_eq!(config["DefaultCacheBehavior"]["TargetOriginId"], json!("origin1"));
        assert_eq!(config["Enabled"], json!(true));
        assert_eq!(config["DefaultRootObject"], json!("index.html"));
        assert!(config.get("ViewerCertificate").is_none());
    }

    #[test]
    fn logical_id_is_nested_under_construct_id() {
        let mut stackinp = StackInput::default();
        let out = config(&input(), &mut stackinp).unwrap();
        assert!(out.logical_distr_name.starts_with("CDNCFDistribution"));
        assert_eq!(out.logical_distr_name.len(), "CDNCFDistribution".len() + 8);
        assert_eq!(out.domain_name(), json!({ "Fn::GetAtt": [out.logical_distr_name, "DomainName"] }));
    }

    #[test]
    fn no_origins_is_an_error() {
        let mut stackinp = StackInput::default();
        let inp = Input { origins: vec![], ..input() };
        assert!(matches!(config(&inp, &mut stackinp), Err(CfnError::Validation { .. })));
        assert!(stackinp.resources.is_empty());
    }

    #[test]
    fn override_targets_requested_origin() {
        let distr = Output { id: "CDN".into(), logical_distr_name: "CDNCFDistributionABCD1234".into() };
        let oac = origin_access_control::Output { logical_oac_name: "AOC".into() };
        let patch = origin_access_control_override(&distr, &oac, 0);
        assert_eq!(patch.logical_id, "CDNCFDistributionABCD1234");
        assert_eq!(patch.path, "DistributionConfig.Origins.0.OriginAccessControlId");
        assert_eq!(patch.value, json!({ "Fn::GetAtt": ["AOC", "Id"] }));
    }
}
