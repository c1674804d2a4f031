/*!
 * Tests for application configuration loading and validation
 */

use honyaku::app_config::{
    Config, MessagePairingMode, ReviewMode, SentenceFragmenterMode,
};
use tempfile::TempDir;

use crate::common::test_config;

#[test]
fn test_default_config_withNoInput_shouldApplyDocumentedDefaults() {
    let config = Config::default();

    assert_eq!(config.translation.model, "gpt-4");
    assert_eq!(config.translation.message_pairing, MessagePairingMode::System);
    assert_eq!(config.translation.lines_per_batch, 13);
    assert_eq!(config.translation.sentence_fragmenter, SentenceFragmenterMode::Regex);
    assert_eq!(config.translation.review_mode, ReviewMode::Interleaved);
    assert_eq!(config.translation.malformed_retries, 1);
    assert_eq!(config.translation.batch_timeout_secs, 300);
    assert_eq!(config.translation.concurrent_batches, 30);
    assert!(config.provider.api_key.is_empty());
}

#[test]
fn test_parse_config_withPartialJson_shouldFillMissingFieldsWithDefaults() {
    let json = r#"{
        "translation": { "model": "gpt-4-turbo", "lines_per_batch": 8 },
        "provider": { "api_key": "sk-test" }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.translation.model, "gpt-4-turbo");
    assert_eq!(config.translation.lines_per_batch, 8);
    assert_eq!(config.translation.concurrent_batches, 30);
    assert_eq!(config.translation.batch_timeout_secs, 300);
    assert_eq!(config.provider.api_key, "sk-test");
    assert_eq!(config.provider.endpoint, "https://api.openai.com/v1");
}

#[test]
fn test_parse_config_withModeStrings_shouldMapOntoEnums() {
    let json = r#"{
        "translation": {
            "message_pairing": "user",
            "sentence_fragmenter": "preformatted",
            "review_mode": "paired"
        }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.translation.message_pairing, MessagePairingMode::User);
    assert_eq!(
        config.translation.sentence_fragmenter,
        SentenceFragmenterMode::Preformatted
    );
    assert_eq!(config.translation.review_mode, ReviewMode::Paired);
}

#[test]
fn test_validate_withMissingApiKey_shouldFail() {
    let mut config = test_config();
    config.provider.api_key = String::new();

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroLinesPerBatch_shouldFail() {
    let mut config = test_config();
    config.translation.lines_per_batch = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withOutOfRangeTemperature_shouldFail() {
    let mut config = test_config();
    config.translation.temperature = 3.5;

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withTestConfig_shouldSucceed() {
    assert!(test_config().validate().is_ok());
}

#[test]
fn test_expects_line_parity_withGpt4Family_shouldBeTrue() {
    let mut config = test_config();
    assert!(config.translation.expects_line_parity());

    config.translation.model = "gpt-4-turbo".to_string();
    assert!(config.translation.expects_line_parity());

    config.translation.model = "gpt-3.5-turbo".to_string();
    assert!(!config.translation.expects_line_parity());
}

#[test]
fn test_file_round_trip_withConfigFile_shouldPreserveSettings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = test_config();
    config.translation.review_mode = ReviewMode::Paired;
    config.to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.translation.model, config.translation.model);
    assert_eq!(loaded.translation.review_mode, ReviewMode::Paired);
    assert_eq!(loaded.provider.api_key, config.provider.api_key);
}

#[test]
fn test_from_file_withMissingFile_shouldFail() {
    let dir = TempDir::new().unwrap();
    let result = Config::from_file(dir.path().join("nope.json"));

    assert!(result.is_err());
}
