use lucid_common::{LogFormatSetting, StealthLevel};
use lucid_config::LucidConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
server:
  bind: "127.0.0.1:8080"
  debug: false
  allow_origins: ["https://app.example.com"]
acquisition:
  static_timeout_secs: 5
  rendered:
    enabled: false
    stealth_level: lightweight
extraction:
  default_language: "en"
refinement:
  model: "gpt-4o-mini"
  auth_token: "${LUCID_TEST_OPENAI_KEY}"
logging:
  format: json
"#;

#[test]
#[serial]
fn file_values_override_defaults() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "lucid.yaml", FILE_YAML);

    temp_env::with_var("LUCID_TEST_OPENAI_KEY", Some("sk-from-env"), || {
        let config = LucidConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config");

        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.allow_origins, vec!["https://app.example.com"]);
        assert_eq!(config.acquisition.static_timeout_secs, 5);
        assert!(!config.acquisition.rendered.enabled);
        assert_eq!(
            config.acquisition.rendered.stealth_level,
            StealthLevel::Lightweight
        );
        // untouched sections keep their defaults
        assert_eq!(config.acquisition.rendered_timeout_secs, 20);
        assert_eq!(config.acquisition.blocking.statuses, vec![403, 429, 503]);
        assert_eq!(config.extraction.default_language, "en");
        assert_eq!(config.refinement.usable_token(), Some("sk-from-env"));
        assert!(matches!(config.logging.format, LogFormatSetting::Json));
    });
}

#[test]
#[serial]
fn unresolved_token_disables_refinement() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "lucid.yaml", FILE_YAML);

    temp_env::with_var_unset("LUCID_TEST_OPENAI_KEY", || {
        let config = LucidConfigLoader::new().with_file(&p).load().unwrap();
        assert!(config.refinement.usable_token().is_none());
    });
}

#[test]
#[serial]
fn env_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "lucid.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("LUCID__SERVER__DEBUG", Some("true")),
            (
                "LUCID__SERVER__ALLOW_ORIGINS",
                Some("http://localhost:3000,https://a.example"),
            ),
            ("LUCID__ACQUISITION__STATIC_SUCCESS_LENGTH", Some("2000")),
            ("LUCID__SERVER__MAX_CONTENT_LENGTH", Some("8000")),
        ],
        || {
            let config = LucidConfigLoader::new().with_file(&p).load().unwrap();
            assert!(config.server.debug);
            assert_eq!(
                config.server.allow_origins,
                vec!["http://localhost:3000", "https://a.example"]
            );
            assert_eq!(config.acquisition.static_success_length, 2000);
            assert_eq!(config.server.max_content_length, Some(8000));
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = LucidConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults");

    assert_eq!(config.server.bind, "127.0.0.1:8000");
    assert!(config.server.allow_origins.is_empty());
    assert_eq!(config.extraction.min_content_length, 100);
    assert_eq!(config.refinement.max_tokens, 8000);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = LucidConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}
