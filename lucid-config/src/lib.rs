//! Loader for service configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, YAML files / inline YAML in
//! the order they were added, then `LUCID__`-prefixed environment variables
//! (`LUCID__SERVER__DEBUG=true`, `LUCID__SERVER__ALLOW_ORIGINS=a,b`).
//! `${VAR}` placeholders in any string are expanded afterwards, so a file can
//! carry `auth_token: "${OPENAI_API_KEY}"`.
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File, FileFormat, Source};
use lucid_common::LucidConfig;
use serde_json::Value;
use std::path::Path;

const ENV_PREFIX: &str = "LUCID";
const LIST_KEYS: &[&str] = &["server.allow_origins", "acquisition.blocking.keywords"];
/// Passes allowed for placeholders whose values hold further placeholders.
const EXPANSION_PASSES: usize = 8;

/// Expand `$VAR`/`${VAR}` in every string of `value`, in place.
///
/// Strings naming an unset variable stay untouched. Self-referencing
/// variables stop after [`EXPANSION_PASSES`].
fn expand_placeholders(value: &mut Value) {
    match value {
        Value::String(text) if text.contains('$') => {
            for _ in 0..EXPANSION_PASSES {
                let next = match shellexpand::env(text.as_str()) {
                    Ok(expanded) if expanded != text.as_str() => expanded.into_owned(),
                    _ => break,
                };
                *text = next;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(expand_placeholders),
        Value::Object(fields) => fields.values_mut().for_each(expand_placeholders),
        _ => {}
    }
}

fn env_source() -> Environment {
    LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .try_parsing(true),
        |env, key| env.with_list_parse_key(key),
    )
}

/// Layers YAML sources and `LUCID__*` variables into a [`LucidConfig`].
pub struct LucidConfigLoader {
    builder: ConfigBuilder<DefaultState>,
}

impl Default for LucidConfigLoader {
    fn default() -> Self {
        Self {
            builder: Config::builder(),
        }
    }
}

impl LucidConfigLoader {
    /// Start from built-in defaults; env overrides are applied at `load`.
    ///
    /// ```
    /// use lucid_config::LucidConfigLoader;
    ///
    /// let config = LucidConfigLoader::new()
    ///     .with_yaml_str("server:\n  bind: '0.0.0.0:9000'")
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.bind, "0.0.0.0:9000");
    /// assert_eq!(config.extraction.default_language, "ko");
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    fn layer<S>(self, source: S) -> Self
    where
        S: Source + Send + Sync + 'static,
    {
        Self {
            builder: self.builder.add_source(source),
        }
    }

    /// A file that must exist. Format follows the extension.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.layer(File::from(path.as_ref()).required(true))
    }

    /// A file that may be absent; env-only deployments skip it.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.layer(File::from(path.as_ref()).required(false))
    }

    /// Inline YAML, layered like a file.
    ///
    /// ```
    /// use lucid_common::StealthLevel;
    /// use lucid_config::LucidConfigLoader;
    ///
    /// let cfg = LucidConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// acquisition:
    ///   rendered:
    ///     stealth_level: maximum
    ///   evasion:
    ///     seed: 7
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.acquisition.rendered.stealth_level, StealthLevel::Maximum);
    /// assert_eq!(cfg.acquisition.evasion.seed, Some(7));
    /// assert_eq!(cfg.acquisition.static_success_length, 1000);
    /// ```
    pub fn with_yaml_str(self, yaml: &str) -> Self {
        self.layer(File::from_str(yaml, FileFormat::Yaml))
    }

    /// Merge every layer plus the environment, expand placeholders and
    /// deserialize.
    ///
    /// ```
    /// use lucid_config::LucidConfigLoader;
    ///
    /// unsafe { std::env::set_var("LUCID_DOC_TOKEN", "injected-from-env"); }
    ///
    /// let config = LucidConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// refinement:
    ///   model: "gpt-4o-mini"
    ///   auth_token: "${LUCID_DOC_TOKEN}"
    /// "#)
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.refinement.usable_token(), Some("injected-from-env"));
    /// assert_eq!(config.refinement.max_input_chars, 6000);
    ///
    /// unsafe { std::env::remove_var("LUCID_DOC_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<LucidConfig, ConfigError> {
        let merged = self.layer(env_source()).builder.build()?;
        let mut tree: Value = merged.try_deserialize()?;
        expand_placeholders(&mut tree);
        serde_json::from_value(tree).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
