//! Endpoint descriptors: where a database lives and how to reach it.

use std::fmt;
use std::path::PathBuf;

use crate::direction::{MigrationDirection, Side};
use crate::error::{MigrateResult, MigrationError};

/// Default admin user for both sides.
pub const DEFAULT_ADMIN_USER: &str = "root";

/// Default admin password of the local database container.
pub const DEFAULT_LOCAL_PASSWORD: &str = "secret";

/// Default password of the database-scoped principal in the local container.
pub const DEFAULT_PRINCIPAL_PASSWORD: &str = "secret";

/// Default compose service running the local database.
pub const DEFAULT_COMPOSE_SERVICE: &str = "mariadb";

/// Characters never accepted in a database name.
const FORBIDDEN_NAME_CHARS: &[char] = &['`', '\'', '"', '\\', '\0'];

/// How commands reach an endpoint's database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Commands run on a remote host through `ssh`.
    Ssh {
        /// SSH destination (`user@host`).
        host: String,
        /// SSH port.
        port: u16,
    },
    /// Commands run inside a `docker compose` service.
    Compose {
        /// Path to the compose descriptor.
        file: PathBuf,
        /// Service running the database server.
        service: String,
    },
}

impl Transport {
    /// Dump programs to try, in order.
    pub fn dump_programs(&self) -> &'static [&'static str] {
        match self {
            Transport::Ssh { .. } => &["mysqldump"],
            Transport::Compose { .. } => &["mariadb-dump", "mysqldump"],
        }
    }

    /// The SQL client program.
    pub fn client_program(&self) -> &'static str {
        match self {
            Transport::Ssh { .. } => "mysql",
            Transport::Compose { .. } => "mariadb",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Ssh { host, port } => write!(f, "ssh {}:{}", host, port),
            Transport::Compose { file, service } => {
                write!(f, "compose {} ({})", file.display(), service)
            }
        }
    }
}

/// One side of a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Which side this is.
    pub side: Side,
    /// Database name.
    pub database: String,
    /// Admin user used by the dump and client programs.
    pub user: String,
    /// Admin password; `None` relies on the host's client configuration.
    pub password: Option<String>,
    /// Password of the principal created by target preparation.
    ///
    /// Remote endpoints start without one and fail validation until it is set.
    pub principal_password: String,
    /// Directory backups are written to, relative to the login directory if not absolute.
    pub backup_dir: Option<String>,
    /// How to reach the database.
    pub transport: Transport,
}

impl Endpoint {
    /// A remote endpoint reached over SSH.
    ///
    /// No principal password is assumed; set one with
    /// [`Endpoint::with_principal_password`].
    pub fn ssh(database: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            side: Side::Remote,
            database: database.into(),
            user: DEFAULT_ADMIN_USER.to_string(),
            password: None,
            principal_password: String::new(),
            backup_dir: None,
            transport: Transport::Ssh {
                host: host.into(),
                port,
            },
        }
    }

    /// A local endpoint running in a compose service.
    pub fn compose(
        database: impl Into<String>,
        file: impl Into<PathBuf>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            side: Side::Local,
            database: database.into(),
            user: DEFAULT_ADMIN_USER.to_string(),
            password: Some(DEFAULT_LOCAL_PASSWORD.to_string()),
            principal_password: DEFAULT_PRINCIPAL_PASSWORD.to_string(),
            backup_dir: None,
            transport: Transport::Compose {
                file: file.into(),
                service: service.into(),
            },
        }
    }

    /// Set the admin user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set or clear the admin password.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Set the principal password.
    pub fn with_principal_password(mut self, password: impl Into<String>) -> Self {
        self.principal_password = password.into();
        self
    }

    /// Set the backup directory.
    pub fn with_backup_dir(mut self, dir: Option<String>) -> Self {
        self.backup_dir = dir;
        self
    }

    /// Short human-readable label, e.g. `remote 'shop'`.
    pub fn label(&self) -> String {
        format!("{} '{}'", self.side, self.database)
    }

    /// Credential arguments for the dump and client programs.
    pub fn credential_args(&self) -> Vec<String> {
        let mut args = vec![format!("-u{}", self.user)];
        if let Some(password) = &self.password {
            args.push(format!("-p{}", password));
        }
        args
    }

    /// Check the descriptor before any command is run.
    pub fn validate(&self) -> MigrateResult<()> {
        validate_database_name(&self.database)
            .map_err(|msg| MigrationError::configuration(format!("{} database {}", self.side, msg)))?;

        if self.user.is_empty() {
            return Err(MigrationError::configuration(format!(
                "{} admin user is empty",
                self.side
            )));
        }

        if self.side == Side::Remote && self.principal_password.is_empty() {
            return Err(MigrationError::configuration(
                "remote principal password is not set",
            ));
        }

        if self.principal_password.contains('\0') {
            return Err(MigrationError::configuration(format!(
                "{} principal password contains a NUL byte",
                self.side
            )));
        }

        match &self.transport {
            Transport::Ssh { host, port } => {
                if host.trim().is_empty() {
                    return Err(MigrationError::configuration("SSH host is empty"));
                }
                if *port == 0 {
                    return Err(MigrationError::configuration("SSH port must not be 0"));
                }
            }
            Transport::Compose { service, .. } => {
                if service.trim().is_empty() {
                    return Err(MigrationError::configuration("compose service is empty"));
                }
            }
        }

        Ok(())
    }
}

fn validate_database_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name is empty".to_string());
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(format!("name '{}' contains forbidden character {:?}", name, c));
    }
    Ok(())
}

/// The two endpoints of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    remote: Endpoint,
    local: Endpoint,
}

impl Endpoints {
    /// Pair up and validate both endpoints.
    pub fn new(remote: Endpoint, local: Endpoint) -> MigrateResult<Self> {
        if remote.side != Side::Remote || local.side != Side::Local {
            return Err(MigrationError::configuration(
                "endpoints must be one remote and one local side",
            ));
        }
        remote.validate()?;
        local.validate()?;
        Ok(Self { remote, local })
    }

    /// The endpoint for `side`.
    pub fn get(&self, side: Side) -> &Endpoint {
        match side {
            Side::Remote => &self.remote,
            Side::Local => &self.local,
        }
    }

    /// The remote endpoint.
    pub fn remote(&self) -> &Endpoint {
        &self.remote
    }

    /// The local endpoint.
    pub fn local(&self) -> &Endpoint {
        &self.local
    }

    /// The endpoint read from in `direction`.
    pub fn source(&self, direction: MigrationDirection) -> &Endpoint {
        self.get(direction.source())
    }

    /// The endpoint written to in `direction`.
    pub fn destination(&self, direction: MigrationDirection) -> &Endpoint {
        self.get(direction.destination())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> Endpoint {
        Endpoint::ssh("shop", "deploy@example.com", 22).with_principal_password("s3cr3t-remote")
    }

    fn local() -> Endpoint {
        Endpoint::compose("shop_dev", "/tmp/docker-compose.yml", DEFAULT_COMPOSE_SERVICE)
    }

    #[test]
    fn test_defaults() {
        let remote = remote();
        assert_eq!(remote.side, Side::Remote);
        assert_eq!(remote.credential_args(), vec!["-uroot"]);
        assert_eq!(remote.label(), "remote 'shop'");

        let local = local();
        assert_eq!(local.side, Side::Local);
        assert_eq!(local.credential_args(), vec!["-uroot", "-psecret"]);
    }

    #[test]
    fn test_programs_per_transport() {
        assert_eq!(remote().transport.dump_programs(), &["mysqldump"]);
        assert_eq!(remote().transport.client_program(), "mysql");
        assert_eq!(local().transport.dump_programs(), &["mariadb-dump", "mysqldump"]);
        assert_eq!(local().transport.client_program(), "mariadb");
    }

    #[test]
    fn test_validate_database_name() {
        assert!(remote().validate().is_ok());

        let mut endpoint = remote();
        endpoint.database = String::new();
        assert!(endpoint.validate().is_err());

        endpoint.database = "shop`; DROP".to_string();
        let err = endpoint.validate().unwrap_err();
        assert!(err.to_string().contains("forbidden character"));
    }

    #[test]
    fn test_remote_requires_principal_password() {
        let endpoint = Endpoint::ssh("shop", "deploy@example.com", 22);
        assert_eq!(endpoint.principal_password, "");

        let err = endpoint.validate().unwrap_err();
        assert!(err.to_string().contains("remote principal password is not set"));
        assert!(Endpoints::new(endpoint, local()).is_err());

        assert!(remote().validate().is_ok());
    }

    #[test]
    fn test_local_keeps_default_principal_password() {
        assert_eq!(local().principal_password, DEFAULT_PRINCIPAL_PASSWORD);
        assert!(local().validate().is_ok());
    }

    #[test]
    fn test_validate_transport() {
        let endpoint = Endpoint::ssh("shop", " ", 22).with_principal_password("pw");
        assert!(endpoint.validate().unwrap_err().to_string().contains("SSH host"));

        let endpoint = Endpoint::ssh("shop", "host", 0).with_principal_password("pw");
        assert!(endpoint.validate().is_err());

        let endpoint = Endpoint::compose("shop", "compose.yml", "");
        assert!(endpoint.validate().is_err());
    }

    #[test]
    fn test_endpoints_by_direction() {
        let endpoints = Endpoints::new(remote(), local()).unwrap();

        assert_eq!(endpoints.source(MigrationDirection::Forward).database, "shop");
        assert_eq!(endpoints.destination(MigrationDirection::Forward).database, "shop_dev");
        assert_eq!(endpoints.source(MigrationDirection::Reverse).database, "shop_dev");
        assert_eq!(endpoints.destination(MigrationDirection::Reverse).database, "shop");
    }

    #[test]
    fn test_endpoints_reject_swapped_sides() {
        assert!(Endpoints::new(local(), remote()).is_err());
    }
}
