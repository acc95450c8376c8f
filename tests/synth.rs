use aws_cfn_stack::{write_artifacts, Manifest, TemplateFormat};
use cfn_lib::policy::PolicyDocument;
use cfn_lib::serde_json::{self, json, Value};
use cfn_lib::{get_att, get_ref, Principal};
use aws_cloudfront_distribution::OAC_NAME_MAX_LEN;
use quantum_bros_front::config::STAGE_MAX_LEN;
use quantum_bros_front::{synthesize, ConfigError, ResourceGraph, StackConfig, SynthError};
use yare::parameterized;

fn graph_for_stage(stage: &str) -> ResourceGraph {
    let config = StackConfig { stage: stage.to_string(), ..Default::default() };
    synthesize(&config).unwrap()
}

fn distribution_config(graph: &ResourceGraph) -> &Value {
    let distribution = graph.template().resource(&graph.distribution.logical_distr_name).unwrap();
    &distribution.properties["DistributionConfig"]
}

fn bucket_policy(graph: &ResourceGraph) -> PolicyDocument {
    let policy = graph.template().resource(&graph.logical_bucket_policy_name).unwrap();
    serde_json::from_value(policy.properties["PolicyDocument"].clone()).unwrap()
}

#[parameterized(
    dev = { "dev", "prod" },
    hyphenated = { "dev-1", "dev1" },
    pull_request = { "pr-42", "pr-43" },
    casing = { "Staging", "staging" },
)]
fn bucket_id_and_comment_differ_per_stage(a: &str, b: &str) {
    let (ga, gb) = (graph_for_stage(a), graph_for_stage(b));
    assert_ne!(ga.bucket.logical_bucket_name, gb.bucket.logical_bucket_name);
    assert_ne!(distribution_config(&ga)["Comment"], distribution_config(&gb)["Comment"]);
    assert_eq!(distribution_config(&ga)["Comment"], json!(format!("QuantumBros Front Distribution {a}")));
}

#[test]
fn synthesis_is_deterministic() {
    let a = graph_for_stage("dev").template().to_json_pretty().unwrap();
    let b = graph_for_stage("dev").template().to_json_pretty().unwrap();
    assert_eq!(a, b);
}

#[test]
fn bucket_is_private_versioned_and_torn_down() {
    let graph = graph_for_stage("dev");
    let bucket = graph.template().resource(&graph.bucket.logical_bucket_name).unwrap();
    assert_eq!(bucket.ty, "AWS::S3::Bucket");
    assert_eq!(bucket.properties["AccessControl"], json!("Private"));
    assert_eq!(bucket.properties["VersioningConfiguration"]["Status"], json!("Enabled"));
    for flag in ["BlockPublicAcls", "BlockPublicPolicy", "IgnorePublicAcls", "RestrictPublicBuckets"] {
        assert_eq!(bucket.properties["PublicAccessBlockConfiguration"][flag], json!(true), "{flag}");
    }
    assert!(bucket.properties.get("BucketName").is_none());
    let template = serde_json::to_value(graph.template()).unwrap();
    let raw = &template["Resources"][&graph.bucket.logical_bucket_name];
    assert_eq!(raw["DeletionPolicy"], json!("Delete"));
    assert_eq!(raw["UpdateReplacePolicy"], json!("Delete"));
    assert_eq!(graph.template().resources_of_type("Custom::S3AutoDeleteObjects").count(), 1);
}

#[test]
fn only_cloudfront_can_read_objects() {
    let graph = graph_for_stage("dev");
    let policy = bucket_policy(&graph);
    assert_eq!(
        policy.principals_allowed("s3:GetObject"),
        vec![Some(&Principal::Service("cloudfront.amazonaws.com".into()))]
    );
    let statement = &policy.statement[0];
    assert_eq!(statement.resource.len(), 1);
    assert_eq!(
        statement.resource[0],
        json!({ "Fn::Join": ["", [get_att(&graph.bucket.logical_bucket_name, "Arn"), "/*"]] })
    );

    // no other resource policy in the stack grants reads either
    assert_eq!(graph.template().resources_of_type("AWS::S3::BucketPolicy").count(), 1);
}

#[test]
fn error_rewrite_is_403_to_index_with_zero_ttl() {
    let graph = graph_for_stage("dev");
    assert_eq!(
        distribution_config(&graph)["CustomErrorResponses"],
        json!([{
            "ErrorCode": 403,
            "ResponseCode": 200,
            "ResponsePagePath": "/index.html",
            "ErrorCachingMinTTL": 0,
        }])
    );
}

#[parameterized(
    bad_request = { 400 },
    not_found = { 404 },
    internal = { 500 },
    bad_gateway = { 502 },
    unavailable = { 503 },
)]
fn other_status_codes_are_not_rewritten(code: u16) {
    let graph = graph_for_stage("dev");
    let responses = distribution_config(&graph)["CustomErrorResponses"].as_array().unwrap();
    assert!(responses.iter().all(|r| r["ErrorCode"] != json!(code)));
}

#[test]
fn single_origin_patched_with_access_control() {
    let graph = graph_for_stage("dev");
    let origins = graph.origins().unwrap();
    assert_eq!(origins.len(), 1);
    assert_eq!(origins[0]["Id"], json!("origin1"));
    assert_eq!(origins[0]["DomainName"], get_att(&graph.bucket.logical_bucket_name, "RegionalDomainName"));
    assert_eq!(
        origins[0]["OriginAccessControlId"],
        get_att(&graph.origin_access_control.logical_oac_name, "Id")
    );
    let oac = graph.template().resource(&graph.origin_access_control.logical_oac_name).unwrap();
    assert_eq!(oac.ty, "AWS::CloudFront::OriginAccessControl");
    assert_eq!(oac.properties["OriginAccessControlConfig"]["Name"], json!("QuantumBros Front Bucket OAC dev"));
}

#[test]
fn longest_stage_keeps_access_control_name_in_bounds() {
    let graph = graph_for_stage(&"a".repeat(STAGE_MAX_LEN));
    let oac = graph.template().resource(&graph.origin_access_control.logical_oac_name).unwrap();
    let name = oac.properties["OriginAccessControlConfig"]["Name"].as_str().unwrap();
    assert_eq!(name.len(), OAC_NAME_MAX_LEN);

    let config = StackConfig { stage: "a".repeat(STAGE_MAX_LEN + 1), ..Default::default() };
    assert!(matches!(
        synthesize(&config),
        Err(SynthError::Config(ConfigError::InvalidStage { .. }))
    ));
}

#[test]
fn viewers_are_redirected_to_tls() {
    let graph = graph_for_stage("dev");
    let config = distribution_config(&graph);
    let behavior = &config["DefaultCacheBehavior"];
    assert_eq!(behavior["ViewerProtocolPolicy"], json!("redirect-to-https"));
    assert_eq!(behavior["AllowedMethods"], json!(["GET", "HEAD"]));
    assert_eq!(behavior["CachedMethods"], json!(["GET", "HEAD"]));
    assert_eq!(behavior["Compress"], json!(true));
    assert_eq!(
        (behavior["MinTTL"].clone(), behavior["DefaultTTL"].clone(), behavior["MaxTTL"].clone()),
        (json!(0), json!(3600), json!(86400))
    );
    assert_eq!(config["ViewerCertificate"]["MinimumProtocolVersion"], json!("TLSv1.2_2021"));
    assert_eq!(config["ViewerCertificate"]["SslSupportMethod"], json!("sni-only"));
}

#[test]
fn unset_certificate_uses_flagged_placeholder() {
    let config = StackConfig::from_vars(vec![("ACM_CERTIFICATE_ARN".to_string(), String::new())]).unwrap();
    let graph = synthesize(&config).unwrap();
    assert!(graph.certificate.is_placeholder());
    assert_eq!(
        distribution_config(&graph)["ViewerCertificate"]["AcmCertificateArn"],
        json!(aws_acm_cert::PLACEHOLDER_CERTIFICATE_ARN)
    );
}

#[test]
fn configured_certificate_is_bound() {
    let arn = "arn:aws:acm:us-east-1:210987654321:certificate/0a1b2c3d-1111-2222-3333-444455556666";
    let config = StackConfig { certificate_arn: arn.into(), region: Some("eu-central-1".into()), ..Default::default() };
    let graph = synthesize(&config).unwrap();
    assert!(!graph.certificate.is_placeholder());
    assert_eq!(distribution_config(&graph)["ViewerCertificate"]["AcmCertificateArn"], json!(arn));
}

#[parameterized(
    wrong_region = { "arn:aws:acm:eu-west-1:210987654321:certificate/abc" },
    malformed = { "aws:arn:...your-acm-arn-here" },
)]
fn bad_certificate_fails_synthesis(arn: &str) {
    let config = StackConfig { certificate_arn: arn.into(), ..Default::default() };
    assert!(synthesize(&config).is_err());
}

#[test]
fn outputs_read_back_reference_declared_resources() {
    let graph = graph_for_stage("dev");
    let outputs = graph.outputs().unwrap();
    assert_eq!(outputs.bucket_name, get_ref(&graph.bucket.logical_bucket_name));
    assert_eq!(outputs.distribution_id, get_ref(&graph.distribution.logical_distr_name));
    assert_eq!(outputs.distribution_domain_name, get_att(&graph.distribution.logical_distr_name, "DomainName"));
    for value in [&outputs.bucket_name, &outputs.distribution_id, &outputs.distribution_domain_name] {
        assert!(!value.is_null());
    }
    let keys: Vec<&str> = graph.template().outputs.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "QuantumBrosFrontBucketNamedev",
            "QuantumBrosFrontDistributionIddev",
            "QuantumBrosFrontDistributionDomainNamedev",
        ]
    );
}

#[test]
fn writes_artifacts_for_the_stack() {
    let dir = tempfile::tempdir().unwrap();
    let graph = graph_for_stage("dev");
    let artifacts = write_artifacts(&graph.stack, dir.path(), TemplateFormat::Yaml).unwrap();
    assert_eq!(artifacts.template_path, dir.path().join("QuantumBrosStack.template.yaml"));
    let manifest: Manifest = serde_json::from_str(&std::fs::read_to_string(artifacts.manifest_path).unwrap()).unwrap();
    let entry = &manifest.stacks["QuantumBrosStack"];
    assert_eq!(entry.environment, "aws://unknown-account/unknown-region");
    assert_eq!(entry.outputs.len(), 3);
}
