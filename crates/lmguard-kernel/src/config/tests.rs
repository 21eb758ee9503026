//! Settings loading across formats.

use super::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn create_test_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let path = dir.path().join(filename);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_detect_format() {
    assert_eq!(detect_format("settings.yaml").unwrap(), FileFormat::Yaml);
    assert_eq!(detect_format("settings.yml").unwrap(), FileFormat::Yaml);
    assert_eq!(detect_format("settings.toml").unwrap(), FileFormat::Toml);
    assert_eq!(detect_format("settings.json").unwrap(), FileFormat::Json);
    assert_eq!(detect_format("settings.json5").unwrap(), FileFormat::Json5);
    assert!(detect_format("settings.txt").is_err());
    assert!(detect_format("settings").is_err());
}

#[test]
fn empty_document_yields_documented_defaults() {
    let settings: GuardSettings = from_str("{}", FileFormat::Json).unwrap();
    assert!(!settings.security.enable_strict_validation);
    assert!(!settings.security.allow_remote_servers);
    assert_eq!(settings.security.trusted_hosts, "");
    assert!(!settings.server.require_auth);
    assert_eq!(settings.server.api_key, "");
    assert_eq!(settings.server.port, 23121);
    assert_eq!(settings.advanced.timeout, 30_000);
    assert_eq!(settings.advanced.retry_count, 3);
    assert_eq!(settings.lmstudio.url, "http://localhost:1234");
    assert_eq!(settings.lmstudio.flavor(), ApiFlavor::OpenAi);
    assert_eq!(settings.features.max_tokens, 4096);
}

#[test]
fn yaml_file_maps_camel_case_keys() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(
        &dir,
        "lmguard.yaml",
        r#"
security:
  enableStrictValidation: true
  allowRemoteServers: true
  trustedHosts: "llm.example.com, lab.internal"
server:
  requireAuth: true
  apiKey: abc
advanced:
  timeout: 5000
  retryCount: 1
lmstudio:
  apiVersion: lmstudio-v1
"#,
    );

    let settings: GuardSettings = load_config(path.to_str().unwrap()).unwrap();
    let policy = settings.trust_policy();
    assert!(policy.strict_validation);
    assert!(policy.allow_remote_servers);
    assert!(policy.trusted_hosts.contains("llm.example.com"));
    assert!(policy.trusted_hosts.contains("lab.internal"));
    assert!(settings.server.require_auth);
    assert_eq!(settings.server.api_key, "abc");
    assert_eq!(settings.retry_policy(), crate::RetryPolicy::new(5000, 1));
    assert_eq!(settings.lmstudio.flavor(), ApiFlavor::LmStudioV1);
}

#[test]
fn toml_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(
        &dir,
        "lmguard.toml",
        r#"
[security]
enableStrictValidation = true

[server]
port = 9000
"#,
    );

    let settings: GuardSettings = load_config(path.to_str().unwrap()).unwrap();
    assert!(settings.security.enable_strict_validation);
    assert_eq!(settings.server.port, 9000);
    assert_eq!(settings.server.host, "localhost");
}

#[test]
fn later_sources_override_earlier_ones() {
    let base = r#"{ "advanced": { "timeout": 1000, "retryCount": 5 } }"#;
    let overlay = r#"{ "advanced": { "retryCount": 2 } }"#;
    let settings: GuardSettings =
        merge_configs(&[(base, FileFormat::Json), (overlay, FileFormat::Json)]).unwrap();
    assert_eq!(settings.retry_policy(), crate::RetryPolicy::new(1000, 2));
}

#[test]
fn zero_retry_count_falls_back_to_default() {
    let json = r#"{ "advanced": { "timeout": 1000, "retryCount": 0 } }"#;
    let settings: GuardSettings = from_str(json, FileFormat::Json).unwrap();
    assert_eq!(
        settings.retry_policy(),
        crate::RetryPolicy::new(1000, crate::RetryPolicy::DEFAULT_MAX_RETRIES)
    );
    assert_eq!(settings.retry_policy().max_attempts(), 4);
}

#[test]
fn nonsensical_numbers_fall_back_to_defaults() {
    let json = r#"{ "advanced": { "timeout": -5, "retryCount": -1 } }"#;
    let settings: GuardSettings = from_str(json, FileFormat::Json).unwrap();
    assert_eq!(settings.retry_policy(), crate::RetryPolicy::default());
}

#[test]
fn unknown_api_version_means_openai() {
    assert_eq!(ApiFlavor::parse("something-else"), ApiFlavor::OpenAi);
    assert_eq!(ApiFlavor::parse("Anthropic"), ApiFlavor::Anthropic);
    assert_eq!(ApiFlavor::parse("custom"), ApiFlavor::Custom);
}

#[test]
fn env_substitution_leaves_unset_vars_alone() {
    let out = substitute_env_vars("url: ${LMGUARD_TEST_SURELY_UNSET_VAR}/v1");
    assert_eq!(out, "url: ${LMGUARD_TEST_SURELY_UNSET_VAR}/v1");
}

#[test]
fn shared_settings_writes_are_visible_to_later_snapshots() {
    let store = SharedSettings::default();
    let before = store.snapshot();
    store.set_api_key("k1");
    store.update(|s| s.security.enable_strict_validation = true);
    let after = store.snapshot();
    assert_eq!(before.server.api_key, "");
    assert_eq!(after.server.api_key, "k1");
    assert!(after.trust_policy().strict_validation);
}
