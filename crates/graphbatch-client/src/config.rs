//! Client configuration.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. built-in defaults (authority, scope, run sizes)
//! 2. environment variables named like the settings keys (`ClientId`, ...)
//! 3. `local.settings.json` in the working directory (PascalCase keys)
//! 4. `config.toml` (`~/.config/graphbatch/config.toml` or `--config`)
//! 5. command-line flags and `GRAPHBATCH_*` environment variables
//!
//! Credential values support secret references:
//! - `pass::path/in/store`: resolved via `pass show`
//! - `env::VAR_NAME`: resolved from the environment
//! - plain text: used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use graphbatch_core::MAX_BATCH_SIZE;
use graphbatch_providers::graph::{ClientCredentials, GraphConfig};

use crate::secret::SecretRef;

/// Name of the JSON settings file looked up in the working directory.
pub const LOCAL_SETTINGS_FILE: &str = "local.settings.json";

/// Number of events created when nothing else is configured.
pub const DEFAULT_EVENT_COUNT: usize = 40;

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the graphbatch client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Microsoft Graph settings.
    pub graph: GraphSettings,

    /// Debug mode.
    pub debug: bool,

    /// Run settings.
    pub run: RunSettings,
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("graphbatch")
    }

    /// Returns a copy safe to print: secrets are replaced by a marker unless
    /// they are references (`env::`, `pass::`).
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(ref secret) = config.graph.client_secret {
            if !SecretRef::parse(secret).is_reference() {
                config.graph.client_secret = Some("<redacted>".to_string());
            }
        }
        config
    }
}

// ---------------------------------------------------------------------------
// GraphSettings
// ---------------------------------------------------------------------------

/// Identity and calendar settings, every field optional until resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Application (client) ID (supports `pass::` and `env::` prefixes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Client secret (supports `pass::` and `env::` prefixes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Directory (tenant) ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Authority base URL; defaults to the public cloud.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,

    /// Token scope; defaults to `https://graph.microsoft.com/.default`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Mailbox whose calendar receives the events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_email: Option<String>,

    /// Graph API root; defaults to `https://graph.microsoft.com/v1.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Fully resolved provider settings.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Token endpoint credentials.
    pub credentials: ClientCredentials,
    /// Graph client settings.
    pub graph: GraphConfig,
}

impl GraphSettings {
    /// Returns `self` with every field set in `higher` replaced.
    #[must_use]
    pub fn merge(self, higher: GraphSettings) -> Self {
        Self {
            client_id: higher.client_id.or(self.client_id),
            client_secret: higher.client_secret.or(self.client_secret),
            tenant_id: higher.tenant_id.or(self.tenant_id),
            authority: higher.authority.or(self.authority),
            scope: higher.scope.or(self.scope),
            calendar_email: higher.calendar_email.or(self.calendar_email),
            base_url: higher.base_url.or(self.base_url),
            timeout: higher.timeout.or(self.timeout),
        }
    }

    /// Returns the names of required settings that are unset or empty.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let required = [
            ("ClientId", &self.client_id),
            ("ClientSecret", &self.client_secret),
            ("TenantId", &self.tenant_id),
            ("CalendarEmail", &self.calendar_email),
        ];

        required
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }

    /// Resolves secret references and builds the provider configuration.
    ///
    /// Every missing required key is reported at once.
    pub fn to_provider_settings(&self) -> Result<ProviderSettings, String> {
        let missing = self.missing_keys();
        if !missing.is_empty() {
            return Err(format!(
                "missing required settings: {}. Set them in {}, {} or as environment variables of the same name",
                missing.join(", "),
                LOCAL_SETTINGS_FILE,
                ClientConfig::default_path().display()
            ));
        }

        let client_id = resolve_field("ClientId", &self.client_id)?;
        let client_secret = resolve_field("ClientSecret", &self.client_secret)?;
        let tenant_id = resolve_field("TenantId", &self.tenant_id)?;
        let calendar_email = resolve_field("CalendarEmail", &self.calendar_email)?;

        let mut credentials = ClientCredentials::new(client_id, client_secret, tenant_id);
        if let Some(authority) = self.authority.as_deref().filter(|s| !s.is_empty()) {
            credentials = credentials.with_authority(authority);
        }
        if let Some(scope) = self.scope.as_deref().filter(|s| !s.is_empty()) {
            credentials = credentials.with_scope(scope);
        }
        credentials.validate()?;

        let mut graph = GraphConfig::new(calendar_email);
        if let Some(ref base_url) = self.base_url {
            graph = graph.with_base_url(base_url);
        }
        if let Some(secs) = self.timeout {
            graph = graph.with_timeout(Duration::from_secs(secs));
        }
        graph.validate()?;

        Ok(ProviderSettings { credentials, graph })
    }
}

fn resolve_field(name: &str, value: &Option<String>) -> Result<String, String> {
    let raw = value.as_deref().unwrap_or_default();
    crate::secret::resolve(raw).map_err(|e| format!("failed to resolve {}: {}", name, e))
}

// ---------------------------------------------------------------------------
// LocalSettings (local.settings.json)
// ---------------------------------------------------------------------------

/// Flat PascalCase settings file (`local.settings.json`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LocalSettings {
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub authority: Option<String>,
    pub scope: Option<String>,
    pub calendar_email: Option<String>,
}

impl LocalSettings {
    /// Parses a settings file from JSON text.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("failed to parse {}: {}", LOCAL_SETTINGS_FILE, e))
    }

    /// Reads the same PascalCase keys from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the PascalCase keys through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            client_secret: get("ClientSecret"),
            tenant_id: get("TenantId"),
            client_id: get("ClientId"),
            authority: get("Authority"),
            scope: get("Scope"),
            calendar_email: get("CalendarEmail"),
        }
    }

    /// Loads `local.settings.json` from `dir` if it exists.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>, String> {
        let path = dir.join(LOCAL_SETTINGS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        Self::from_json(&content).map(Some)
    }
}

impl From<LocalSettings> for GraphSettings {
    fn from(local: LocalSettings) -> Self {
        Self {
            client_id: local.client_id,
            client_secret: local.client_secret,
            tenant_id: local.tenant_id,
            authority: local.authority,
            scope: local.scope,
            calendar_email: local.calendar_email,
            base_url: None,
            timeout: None,
        }
    }
}

// ---------------------------------------------------------------------------
// RunSettings
// ---------------------------------------------------------------------------

/// How many events to create and how to group them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Number of events to create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// Events per `$batch` call (1 to 20).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl RunSettings {
    /// Returns `self` with every field set in `higher` replaced.
    #[must_use]
    pub fn merge(self, higher: RunSettings) -> Self {
        Self {
            count: higher.count.or(self.count),
            batch_size: higher.batch_size.or(self.batch_size),
        }
    }

    /// Number of events, defaulting to [`DEFAULT_EVENT_COUNT`].
    pub fn count(&self) -> usize {
        self.count.unwrap_or(DEFAULT_EVENT_COUNT)
    }

    /// Batch size, defaulting to [`MAX_BATCH_SIZE`].
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(MAX_BATCH_SIZE)
    }

    /// Validates the batch size against the `$batch` limit.
    pub fn validate(&self) -> Result<(), String> {
        validate_batch_size(self.batch_size()).map(|_| ())
    }
}

/// Checks that `size` is within `1..=MAX_BATCH_SIZE`.
pub fn validate_batch_size(size: usize) -> Result<usize, String> {
    if (1..=MAX_BATCH_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(format!(
            "batch size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, size
        ))
    }
}

// ---------------------------------------------------------------------------
// Layering
// ---------------------------------------------------------------------------

/// Settings after every layer has been applied.
#[derive(Debug, Clone, Default)]
pub struct EffectiveConfig {
    /// Merged identity and calendar settings.
    pub graph: GraphSettings,
    /// Merged run settings.
    pub run: RunSettings,
    /// Debug flag from the config file.
    pub debug: bool,
    /// Files that contributed, lowest precedence first.
    pub sources: Vec<PathBuf>,
}

impl EffectiveConfig {
    /// Applies defaults, the process environment, `local.settings.json` in
    /// `cwd`, the TOML file and finally the command-line layer.
    ///
    /// An explicit `config_path` must exist; the default path is optional.
    pub fn load(
        config_path: Option<&Path>,
        cwd: &Path,
        graph_overrides: GraphSettings,
        run_overrides: RunSettings,
    ) -> Result<Self, String> {
        Self::load_with_env(
            config_path,
            cwd,
            LocalSettings::from_env(),
            graph_overrides,
            run_overrides,
        )
    }

    /// Same as [`EffectiveConfig::load`] with an explicit environment layer.
    pub fn load_with_env(
        config_path: Option<&Path>,
        cwd: &Path,
        environment: LocalSettings,
        graph_overrides: GraphSettings,
        run_overrides: RunSettings,
    ) -> Result<Self, String> {
        let mut effective = Self {
            graph: environment.into(),
            ..Self::default()
        };

        if let Some(local) = LocalSettings::load_from_dir(cwd)? {
            effective.sources.push(cwd.join(LOCAL_SETTINGS_FILE));
            effective.graph = effective.graph.merge(local.into());
        }

        let file = match config_path {
            Some(path) => {
                effective.sources.push(path.to_path_buf());
                ClientConfig::load_from(path)?
            }
            None => {
                let path = ClientConfig::default_path();
                if path.exists() {
                    effective.sources.push(path);
                }
                ClientConfig::load()?
            }
        };

        effective.debug = file.debug;
        effective.graph = effective.graph.merge(file.graph).merge(graph_overrides);
        effective.run = file.run.merge(run_overrides);
        effective.run.validate()?;

        Ok(effective)
    }

    /// Returns the merged settings in config-file shape, secrets redacted.
    pub fn to_redacted_file(&self) -> ClientConfig {
        ClientConfig {
            graph: self.graph.clone(),
            debug: self.debug,
            run: self.run.clone(),
        }
        .redacted()
    }
}
