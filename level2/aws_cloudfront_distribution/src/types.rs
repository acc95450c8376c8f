//! the subset of `AWS::CloudFront::Distribution` properties this crate renders.

use aws_acm_cert::CertificateReference;
use cfn_lib::serde_json::Value;
use cfn_lib::{serialize_properties, CfnResource};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HttpMethod {
    GET,
    HEAD,
    OPTIONS,
    PUT,
    PATCH,
    POST,
    DELETE,
}

/// cloudfront only accepts these three sets of allowed methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AllowedMethods {
    #[default]
    GetHead,
    GetHeadOptions,
    All,
}

impl AllowedMethods {
    pub fn methods(&self) -> Vec<HttpMethod> {
        use HttpMethod::*;
        match self {
            AllowedMethods::GetHead => vec![GET, HEAD],
            AllowedMethods::GetHeadOptions => vec![GET, HEAD, OPTIONS],
            AllowedMethods::All => vec![DELETE, GET, HEAD, OPTIONS, PATCH, POST, PUT],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachedMethods {
    #[default]
    GetHead,
    GetHeadOptions,
}

impl CachedMethods {
    pub fn methods(&self) -> Vec<HttpMethod> {
        use HttpMethod::*;
        match self {
            CachedMethods::GetHead => vec![GET, HEAD],
            CachedMethods::GetHeadOptions => vec![GET, HEAD, OPTIONS],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ViewerProtocolPolicy {
    #[serde(rename = "allow-all")]
    AllowAll,
    #[default]
    #[serde(rename = "redirect-to-https")]
    RedirectToHttps,
    #[serde(rename = "https-only")]
    HttpsOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SecurityPolicyProtocol {
    #[serde(rename = "SSLv3")]
    SslV3,
    #[serde(rename = "TLSv1")]
    TlsV1,
    #[serde(rename = "TLSv1_2016")]
    TlsV1_2016,
    #[serde(rename = "TLSv1.1_2016")]
    TlsV1_1_2016,
    #[serde(rename = "TLSv1.2_2018")]
    TlsV1_2_2018,
    #[serde(rename = "TLSv1.2_2019")]
    TlsV1_2_2019,
    #[default]
    #[serde(rename = "TLSv1.2_2021")]
    TlsV1_2_2021,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SslMethod {
    #[default]
    #[serde(rename = "sni-only")]
    SniOnly,
    #[serde(rename = "vip")]
    Vip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PriceClass {
    #[default]
    #[serde(rename = "PriceClass_100")]
    PriceClass100,
    #[serde(rename = "PriceClass_200")]
    PriceClass200,
    #[serde(rename = "PriceClass_All")]
    PriceClassAll,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum HttpVersion {
    #[serde(rename = "http1.1")]
    Http1_1,
    #[default]
    #[serde(rename = "http2")]
    Http2,
    #[serde(rename = "http2and3")]
    Http2And3,
    #[serde(rename = "http3")]
    Http3,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerCertificate {
    #[serde(rename = "AcmCertificateArn")]
    pub acm_certificate_arn: String,
    #[serde(rename = "MinimumProtocolVersion")]
    pub minimum_protocol_version: SecurityPolicyProtocol,
    #[serde(rename = "SslSupportMethod")]
    pub ssl_support_method: SslMethod,
}

impl ViewerCertificate {
    pub fn from_acm_certificate(certificate: &CertificateReference, security_policy: SecurityPolicyProtocol) -> Self {
        Self {
            acm_certificate_arn: certificate.certificate_arn(),
            minimum_protocol_version: security_policy,
            ssl_support_method: SslMethod::SniOnly,
        }
    }
}

/// maps an origin error status to another status + page, eg: 403 -> 200 /index.html
/// for single page apps that route on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomErrorResponse {
    #[serde(rename = "ErrorCode")]
    pub error_code: u16,
    #[serde(rename = "ResponseCode", skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    #[serde(rename = "ResponsePagePath", skip_serializing_if = "Option::is_none")]
    pub response_page_path: Option<String>,
    #[serde(rename = "ErrorCachingMinTTL", skip_serializing_if = "Option::is_none")]
    pub error_caching_min_ttl: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cookies {
    #[serde(rename = "Forward")]
    pub forward: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardedValues {
    #[serde(rename = "QueryString")]
    pub query_string: bool,
    #[serde(rename = "Cookies")]
    pub cookies: Cookies,
}

impl Default for ForwardedValues {
    fn default() -> Self {
        Self {
            query_string: false,
            cookies: Cookies { forward: "none".to_string() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultCacheBehavior {
    #[serde(rename = "AllowedMethods")]
    pub allowed_methods: Vec<HttpMethod>,
    #[serde(rename = "CachedMethods")]
    pub cached_methods: Vec<HttpMethod>,
    #[serde(rename = "Compress")]
    pub compress: bool,
    #[serde(rename = "DefaultTTL")]
    pub default_ttl: u64,
    #[serde(rename = "ForwardedValues")]
    pub forwarded_values: ForwardedValues,
    #[serde(rename = "MaxTTL")]
    pub max_ttl: u64,
    #[serde(rename = "MinTTL")]
    pub min_ttl: u64,
    #[serde(rename = "TargetOriginId")]
    pub target_origin_id: String,
    #[serde(rename = "ViewerProtocolPolicy")]
    pub viewer_protocol_policy: ViewerProtocolPolicy,
}

/// an s3 origin accessed with signed requests has an empty S3OriginConfig.
/// the access control id is set on the origin itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct S3OriginConfig {
    #[serde(rename = "OriginAccessIdentity", skip_serializing_if = "Option::is_none")]
    pub origin_access_identity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Origin {
    #[serde(rename = "ConnectionAttempts")]
    pub connection_attempts: u8,
    #[serde(rename = "ConnectionTimeout")]
    pub connection_timeout: u8,
    #[serde(rename = "DomainName")]
    pub domain_name: Value,
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "OriginAccessControlId", skip_serializing_if = "Option::is_none")]
    pub origin_access_control_id: Option<Value>,
    #[serde(rename = "S3OriginConfig", skip_serializing_if = "Option::is_none")]
    pub s3_origin_config: Option<S3OriginConfig>,
}

impl Origin {
    pub fn s3(id: impl Into<String>, domain_name: Value) -> Self {
        Self {
            connection_attempts: 3,
            connection_timeout: 10,
            domain_name,
            id: id.into(),
            origin_access_control_id: None,
            s3_origin_config: Some(S3OriginConfig::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionConfig {
    #[serde(rename = "Aliases", skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(rename = "Comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "CustomErrorResponses", skip_serializing_if = "Vec::is_empty")]
    pub custom_error_responses: Vec<CustomErrorResponse>,
    #[serde(rename = "DefaultCacheBehavior")]
    pub default_cache_behavior: DefaultCacheBehavior,
    #[serde(rename = "DefaultRootObject", skip_serializing_if = "Option::is_none")]
    pub default_root_object: Option<String>,
    #[serde(rename = "Enabled")]
    pub enabled: bool,
    #[serde(rename = "HttpVersion")]
    pub http_version: HttpVersion,
    #[serde(rename = "IPV6Enabled")]
    pub ipv6_enabled: bool,
    #[serde(rename = "Origins")]
    pub origins: Vec<Origin>,
    #[serde(rename = "PriceClass")]
    pub price_class: PriceClass,
    #[serde(rename = "ViewerCertificate", skip_serializing_if = "Option::is_none")]
    pub viewer_certificate: Option<ViewerCertificate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfnDistribution {
    #[serde(rename = "DistributionConfig")]
    pub distribution_config: DistributionConfig,
}

impl CfnResource for CfnDistribution {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::Distribution"
    }
    fn properties(&self) -> cfn_lib::Result<Value> {
        serialize_properties(self)
    }
    fn validate(&self) -> Result<(), String> {
        validate_distribution_config(&self.distribution_config)
    }
}

fn validate_distribution_config(config: &DistributionConfig) -> Result<(), String> {
    if config.origins.is_empty() {
        return Err("A distribution must have at least one origin".into());
    }
    for (i, origin) in config.origins.iter().enumerate() {
        if config.origins[..i].iter().any(|o| o.id == origin.id) {
            return Err(format!("Duplicate origin id '{}'. All origin ids in a distribution must be unique", origin.id));
        }
    }
    let behavior = &config.default_cache_behavior;
    if !config.origins.iter().any(|o| o.id == behavior.target_origin_id) {
        return Err(format!("Default cache behavior targets unknown origin '{}'", behavior.target_origin_id));
    }
    if !(behavior.min_ttl <= behavior.default_ttl && behavior.default_ttl <= behavior.max_ttl) {
        return Err(format!(
            "Cache TTLs must satisfy min <= default <= max, got {}/{}/{}",
            behavior.min_ttl, behavior.default_ttl, behavior.max_ttl
        ));
    }
    if behavior.cached_methods.iter().any(|m| !behavior.allowed_methods.contains(m)) {
        return Err("Cached methods must be a subset of allowed methods".into());
    }
    for (i, response) in config.custom_error_responses.iter().enumerate() {
        if !(400..=599).contains(&response.error_code) {
            return Err(format!("Error code {} is not a 4xx or 5xx status", response.error_code));
        }
        if config.custom_error_responses[..i].iter().any(|r| r.error_code == response.error_code) {
            return Err(format!("Duplicate custom error response for {}", response.error_code));
        }
        if let Some(path) = &response.response_page_path {
            if !path.starts_with('/') {
                return Err(format!("Response page path '{path}' must begin with '/'"));
            }
            if response.response_code.is_none() {
                return Err(format!("Custom error response for {} has a page path but no response code", response.error_code));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OriginAccessControlConfig {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "OriginAccessControlOriginType")]
    pub origin_type: String,
    #[serde(rename = "SigningBehavior")]
    pub signing_behavior: String,
    #[serde(rename = "SigningProtocol")]
    pub signing_protocol: String,
}

pub const OAC_NAME_MAX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CfnOriginAccessControl {
    #[serde(rename = "OriginAccessControlConfig")]
    pub origin_access_control_config: OriginAccessControlConfig,
}

impl CfnResource for CfnOriginAccessControl {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::OriginAccessControl"
    }
    fn properties(&self) -> cfn_lib::Result<Value> {
        serialize_properties(self)
    }
    fn validate(&self) -> Result<(), String> {
        let config = &self.origin_access_control_config;
        if config.name.is_empty() || config.name.len() > OAC_NAME_MAX_LEN {
            return Err(format!(
                "Origin access control name '{}' must be between 1 and {OAC_NAME_MAX_LEN} characters",
                config.name
            ));
        }
        let allowed_origin_types = ["s3", "mediastore", "lambda", "mediapackagev2"];
        if !allowed_origin_types.contains(&config.origin_type.as_str()) {
            return Err(format!("Unknown origin access control origin type '{}'", config.origin_type));
        }
        if !["always", "never", "no-override"].contains(&config.signing_behavior.as_str()) {
            return Err(format!("Unknown signing behavior '{}'", config.signing_behavior));
        }
        if config.signing_protocol != "sigv4" {
            return Err(format!("Unknown signing protocol '{}'", config.signing_protocol));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_lib::serde_json::json;
    use yare::parameterized;

    fn behavior() -> DefaultCacheBehavior {
        DefaultCacheBehavior {
            allowed_methods: AllowedMethods::GetHead.methods(),
            cached_methods: CachedMethods::GetHead.methods(),
            compress: true,
            default_ttl: 3600,
            forwarded_values: ForwardedValues::default(),
            max_ttl: 86400,
            min_ttl: 0,
            target_origin_id: "origin1".into(),
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
        }
    }

    fn config() -> DistributionConfig {
        DistributionConfig {
            aliases: vec![],
            comment: None,
            custom_error_responses: vec![],
            default_cache_behavior: behavior(),
            default_root_object: Some("index.html".into()),
            enabled: true,
            http_version: HttpVersion::Http2,
            ipv6_enabled: true,
            origins: vec![Origin::s3("origin1", json!("bucket.s3.amazonaws.com"))],
            price_class: PriceClass::PriceClass100,
            viewer_certificate: None,
        }
    }

    #[test]
    fn s3_origin_renders_an_empty_s3_origin_config() {
        let value = cfn_lib::serialize_properties(&Origin::s3("origin1", json!("d"))).unwrap();
        assert_eq!(value["S3OriginConfig"], json!({}));
        assert!(value.get("OriginAccessControlId").is_none());
    }

    #[test]
    fn enums_render_cloudfront_strings() {
        let value = cfn_lib::serialize_properties(&behavior()).unwrap();
        assert_eq!(value["AllowedMethods"], json!(["GET", "HEAD"]));
        assert_eq!(value["ViewerProtocolPolicy"], json!("redirect-to-https"));
        assert_eq!(value["ForwardedValues"], json!({ "QueryString": false, "Cookies": { "Forward": "none" } }));
        assert_eq!(cfn_lib::serialize_properties(&SecurityPolicyProtocol::TlsV1_2_2021).unwrap(), json!("TLSv1.2_2021"));
        assert_eq!(cfn_lib::serialize_properties(&PriceClass::PriceClass100).unwrap(), json!("PriceClass_100"));
    }

    #[test]
    fn valid_config_passes() {
        assert_eq!(validate_distribution_config(&config()), Ok(()));
    }

    #[test]
    fn rejects_ttl_out_of_order() {
        let mut c = config();
        c.default_cache_behavior.default_ttl = 100_000;
        assert!(validate_distribution_config(&c).unwrap_err().contains("min <= default <= max"));
    }

    #[test]
    fn rejects_unknown_target_origin_and_duplicate_origins() {
        let mut c = config();
        c.default_cache_behavior.target_origin_id = "origin2".into();
        assert!(validate_distribution_config(&c).is_err());

        let mut c = config();
        c.origins.push(Origin::s3("origin1", json!("other")));
        assert!(validate_distribution_config(&c).unwrap_err().contains("Duplicate origin id"));
    }

    fn error_response(code: u16, path: Option<&str>, response_code: Option<u16>) -> CustomErrorResponse {
        CustomErrorResponse {
            error_code: code,
            response_code,
            response_page_path: path.map(String::from),
            error_caching_min_ttl: Some(0),
        }
    }

    #[parameterized(
        spa_rewrite = { vec![error_response(403, Some("/index.html"), Some(200))], true },
        cache_only = { vec![error_response(404, None, None)], true },
        not_an_error_status = { vec![error_response(200, Some("/index.html"), Some(200))], false },
        relative_page_path = { vec![error_response(403, Some("index.html"), Some(200))], false },
        page_without_response_code = { vec![error_response(403, Some("/index.html"), None)], false },
        duplicate_code = { vec![error_response(403, None, None), error_response(403, None, None)], false },
    )]
    fn custom_error_responses(responses: Vec<CustomErrorResponse>, valid: bool) {
        let mut c = config();
        c.custom_error_responses = responses;
        assert_eq!(validate_distribution_config(&c).is_ok(), valid);
    }

    #[test]
    fn cached_methods_must_be_allowed() {
        let mut c = config();
        c.default_cache_behavior.cached_methods = CachedMethods::GetHeadOptions.methods();
        assert!(validate_distribution_config(&c).is_err());
    }
}
