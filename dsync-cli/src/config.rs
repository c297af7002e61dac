//! CLI configuration handling.
//!
//! The config document is JSON by default (`dsync-config.json`); a file with a
//! `.toml` extension is read and written as TOML instead.

use std::path::{Path, PathBuf};

use dsync_migrate::endpoint::DEFAULT_COMPOSE_SERVICE;
use dsync_migrate::{
    Endpoint, Endpoints, MigrationError, ReplacementRule, RsyncTarget, RuleSet, SyncPath,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CliError, CliResult};

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "dsync-config.json";

/// Environment variable overriding the local compose file
pub const COMPOSE_FILE_ENV: &str = "DSYNC_COMPOSE_FILE";

/// Compose file location relative to the home directory
pub const DEFAULT_COMPOSE_FILE: &str = "www/dev/docker-compose.yml";

/// Default SSH port
pub const DEFAULT_SSH_PORT: &str = "22";

/// dsync configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// SSH destination of the remote host (`user@host`)
    #[serde(default)]
    pub ssh_host: String,

    /// SSH port, kept as text to accept both `"22"` and `22`
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: String,

    /// Remote database settings
    #[serde(default)]
    pub remote: HostSettings,

    /// Local database settings
    #[serde(default)]
    pub local: HostSettings,

    /// Directory for persisted dumps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dump_dir: Option<PathBuf>,

    /// Replacement rules, in forward order
    #[serde(default)]
    pub db_replace: Vec<ReplacementRule>,

    /// Directories to mirror
    #[serde(default)]
    pub sync: Vec<SyncPath>,
}

/// Per-side database settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostSettings {
    /// Descriptive host name
    pub host: String,

    /// Database name
    pub db: String,

    /// Admin user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Admin password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Password of the database-scoped principal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_password: Option<String>,

    /// Directory backups are written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<String>,

    /// Compose service running the database (local side)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl HostSettings {
    fn named(db: &str) -> Self {
        Self {
            db: db.to_string(),
            ..Self::default()
        }
    }

    fn apply_to(&self, mut endpoint: Endpoint) -> Endpoint {
        if let Some(user) = &self.user {
            endpoint = endpoint.with_user(user.clone());
        }
        if self.password.is_some() {
            endpoint = endpoint.with_password(self.password.clone());
        }
        if let Some(password) = &self.principal_password {
            endpoint = endpoint.with_principal_password(password.clone());
        }
        endpoint.with_backup_dir(self.backup_dir.clone())
    }
}

fn default_port() -> String {
    DEFAULT_SSH_PORT.to_string()
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Text(String),
        Number(i64),
    }

    Ok(match RawPort::deserialize(deserializer)? {
        RawPort::Text(text) => text,
        RawPort::Number(number) => number.to_string(),
    })
}

/// Default compose file, `~/www/dev/docker-compose.yml`.
pub fn default_compose_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(DEFAULT_COMPOSE_FILE)
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content, is_toml(path))
    }

    /// Parse a config document
    pub fn parse(content: &str, toml: bool) -> CliResult<Self> {
        let config = if toml {
            toml::from_str(content)?
        } else {
            serde_json::from_str(content)?
        };
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let content = if is_toml(path) {
            toml::to_string_pretty(self)?
        } else {
            let mut json = serde_json::to_string_pretty(self)?;
            json.push('\n');
            json
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The example written by `dsync init`
    pub fn example() -> Self {
        Self {
            ssh_host: "user@host.com".to_string(),
            port: DEFAULT_SSH_PORT.to_string(),
            remote: HostSettings {
                // Empty until filled in; validation reports it.
                principal_password: Some(String::new()),
                ..HostSettings::named("db")
            },
            local: HostSettings::named("db"),
            dump_dir: None,
            db_replace: vec![
                ReplacementRule::new("host.com", "host.test"),
                ReplacementRule::new("/home/host/public_html", "/home/user/www/project"),
            ],
            sync: vec![
                SyncPath::new(
                    "/home/user/public_html/wp-content/plugins",
                    "/home/user/www/host.test/wp-content/plugins",
                )
                .exclude("some-plugins"),
                SyncPath::new(
                    "/home/user/public_html/wp-content/uploads",
                    "/home/user/www/host.test/wp-content/uploads",
                ),
            ],
        }
    }

    /// The SSH port as a number
    pub fn port_number(&self) -> CliResult<u16> {
        match self.port.trim().parse::<u16>() {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(CliError::Validation(format!(
                "port '{}' is not a valid port (1-65535)",
                self.port
            ))),
        }
    }

    /// Directory persisted dumps are written to
    pub fn dump_dir(&self) -> PathBuf {
        self.dump_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// The replacement rules
    pub fn rule_set(&self) -> CliResult<RuleSet> {
        Ok(RuleSet::new(self.db_replace.iter().cloned())?)
    }

    /// Build and validate both endpoints
    pub fn endpoints(&self, compose_file: &Path) -> CliResult<Endpoints> {
        let port = self.port_number()?;
        Ok(Endpoints::new(
            self.remote_endpoint(port),
            self.local_endpoint(compose_file),
        )?)
    }

    /// Where `rsync` connects to
    pub fn rsync_target(&self) -> CliResult<RsyncTarget> {
        if self.ssh_host.trim().is_empty() {
            return Err(CliError::Validation("sshHost is empty".to_string()));
        }
        Ok(RsyncTarget::new(self.ssh_host.clone(), self.port_number()?))
    }

    fn remote_endpoint(&self, port: u16) -> Endpoint {
        self.remote.apply_to(Endpoint::ssh(
            self.remote.db.clone(),
            self.ssh_host.clone(),
            port,
        ))
    }

    fn local_endpoint(&self, compose_file: &Path) -> Endpoint {
        let service = self
            .local
            .service
            .clone()
            .unwrap_or_else(|| DEFAULT_COMPOSE_SERVICE.to_string());
        self.local
            .apply_to(Endpoint::compose(self.local.db.clone(), compose_file, service))
    }

    /// Every problem that would stop a run
    pub fn problems(&self, compose_file: &Path) -> Vec<String> {
        let mut problems = Vec::new();

        let port = match self.port_number() {
            Ok(port) => port,
            Err(err) => {
                problems.push(message(err));
                // Placeholder so the endpoints can still be checked.
                22
            }
        };

        if let Err(err) = self.remote_endpoint(port).validate() {
            problems.push(message(err.into()));
        }
        if let Err(err) = self.local_endpoint(compose_file).validate() {
            problems.push(message(err.into()));
        }
        if let Err(err) = self.rule_set() {
            problems.push(message(err));
        }

        for (index, path) in self.sync.iter().enumerate() {
            if path.remote.trim().is_empty() || path.local.trim().is_empty() {
                problems.push(format!("sync path #{} has an empty remote or local path", index + 1));
            }
        }

        problems
    }

    /// Fail unless [`Config::problems`] is empty
    pub fn validate(&self, compose_file: &Path) -> CliResult<()> {
        let problems = self.problems(compose_file);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(CliError::Validation(problems.join("; ")))
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

fn message(err: CliError) -> String {
    match err {
        CliError::Validation(msg) | CliError::Config(msg) => msg,
        CliError::Migration(MigrationError::Configuration(msg)) => msg,
        other => other.to_string(),
    }
}
