//! Configuration for the operations layer.
//!
//! Values are resolved in layers, later layers overriding earlier ones key
//! by key:
//!
//! 1. Built-in defaults
//! 2. `<config dir>/base.toml`
//! 3. `<config dir>/<env>.toml` (env from `KG_ENV`, default `dev`)
//! 4. The per-user `config.toml` in the platform config directory
//! 5. `KG_*` environment variables
//!
//! The config dir is `KG_CONFIG_DIR` or `./config`. Missing files are
//! skipped; malformed files are an error.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use kerasgen_codegen::LiteralPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OpsError, OpsResult};

/// Service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub broker: BrokerConfig,
}

/// HTTP service and generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the service listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding one sub-directory per user.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    /// How layer parameter literals are formatted.
    #[serde(default)]
    pub literal_policy: LiteralPolicy,
}

fn default_port() -> u16 {
    80
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            workspace_root: default_workspace_root(),
            literal_policy: LiteralPolicy::default(),
        }
    }
}

/// RabbitMQ connection settings, reached through its management HTTP API.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Management API base URL, e.g. `http://localhost:15672`.
    #[serde(default = "default_broker_host")]
    pub host: String,

    #[serde(default)]
    pub account: String,

    #[serde(default, skip_serializing)]
    pub password: String,

    #[serde(default = "default_vhost")]
    pub vhost: String,

    /// Queue training jobs are routed to.
    #[serde(default = "default_queue")]
    pub queue: String,
}

fn default_broker_host() -> String {
    "http://localhost:15672".to_string()
}

fn default_vhost() -> String {
    "/".to_string()
}

fn default_queue() -> String {
    "train".to_string()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            account: String::new(),
            password: String::new(),
            vhost: default_vhost(),
            queue: default_queue(),
        }
    }
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("host", &self.host)
            .field("account", &self.account)
            .field("password", &"***")
            .field("vhost", &self.vhost)
            .field("queue", &self.queue)
            .finish()
    }
}

impl Config {
    /// Load configuration from all layers.
    pub fn load() -> OpsResult<Self> {
        let dir = std::env::var("KG_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));
        let env = std::env::var("KG_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut layers = Vec::new();
        for path in [
            Some(dir.join("base.toml")),
            Some(dir.join(format!("{}.toml", env))),
            Self::user_config_path(),
        ]
        .into_iter()
        .flatten()
        {
            if let Some(layer) = read_layer(&path)? {
                layers.push(layer);
            }
        }

        Self::from_layers(layers)?.with_env(|key| std::env::var(key).ok())
    }

    /// Merge TOML layers over the defaults, later layers winning.
    pub fn from_layers(layers: impl IntoIterator<Item = toml::Value>) -> OpsResult<Self> {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        for layer in layers {
            merge_values(&mut merged, layer);
        }
        merged
            .try_into::<Config>()
            .map_err(|e| OpsError::Config(e.to_string()))
    }

    /// Apply `KG_*` overrides using the given variable lookup.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> OpsResult<Self> {
        if let Some(host) = lookup("KG_BROKER_HOST") {
            self.broker.host = host;
        }
        if let Some(account) = lookup("KG_BROKER_ACCOUNT") {
            self.broker.account = account;
        }
        if let Some(password) = lookup("KG_BROKER_PASSWORD") {
            self.broker.password = password;
        }
        if let Some(vhost) = lookup("KG_BROKER_VHOST") {
            self.broker.vhost = vhost;
        }
        if let Some(queue) = lookup("KG_BROKER_QUEUE") {
            self.broker.queue = queue;
        }
        if let Some(root) = lookup("KG_WORKSPACE_ROOT") {
            self.server.workspace_root = PathBuf::from(root);
        }
        if let Some(port) = lookup("KG_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| OpsError::Config(format!("Invalid port: {}", port)))?;
        }
        if let Some(policy) = lookup("KG_LITERAL_POLICY") {
            self.server.literal_policy = policy.parse().map_err(OpsError::Config)?;
        }
        Ok(self)
    }

    /// Path of the per-user config file.
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "kerasgen", "kg").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check that broker credentials are present.
    pub fn validate_broker(&self) -> OpsResult<()> {
        if self.broker.account.is_empty() {
            return Err(OpsError::Config(
                "Broker account not configured. Set KG_BROKER_ACCOUNT or [broker] account".into(),
            ));
        }
        Ok(())
    }

    /// All settings as display pairs, with the password masked.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let password = if self.broker.password.is_empty() {
            "(unset)".to_string()
        } else {
            "***".to_string()
        };
        vec![
            ("server.port", self.server.port.to_string()),
            (
                "server.workspace_root",
                self.server.workspace_root.display().to_string(),
            ),
            ("server.literal_policy", self.server.literal_policy.to_string()),
            ("broker.host", self.broker.host.clone()),
            ("broker.account", self.broker.account.clone()),
            ("broker.password", password),
            ("broker.vhost", self.broker.vhost.clone()),
            ("broker.queue", self.broker.queue.clone()),
        ]
    }
}

fn read_layer(path: &Path) -> OpsResult<Option<toml::Value>> {
    if !path.exists() {
        debug!(path = %path.display(), "Config layer not present");
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let table = toml::from_str::<toml::Table>(&contents)
        .map_err(|e| OpsError::Config(format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), "Loaded config layer");
    Ok(Some(toml::Value::Table(table)))
}

/// Deep-merge `overlay` into `base`: tables merge key by key, anything else
/// is replaced.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match overlay {
        toml::Value::Table(overlay) => {
            if let toml::Value::Table(base) = base {
                for (key, value) in overlay {
                    match base.get_mut(&key) {
                        Some(existing) => merge_values(existing, value),
                        None => {
                            base.insert(key, value);
                        }
                    }
                }
            } else {
                *base = toml::Value::Table(overlay);
            }
        }
        overlay => *base = overlay,
    }
}
