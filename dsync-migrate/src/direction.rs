//! Which side is the source and which is the destination.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two sides of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The production-like host, reached over SSH.
    Remote,
    /// The development environment.
    Local,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Remote => write!(f, "remote"),
            Side::Local => write!(f, "local"),
        }
    }
}

/// Direction of a migration or file sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationDirection {
    /// Remote to local.
    #[default]
    Forward,
    /// Local to remote. The remote database is backed up before it is overwritten.
    Reverse,
}

impl MigrationDirection {
    /// Build a direction from a `--reverse` style flag.
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse { Self::Reverse } else { Self::Forward }
    }

    /// The side data is read from.
    pub fn source(self) -> Side {
        match self {
            Self::Forward => Side::Remote,
            Self::Reverse => Side::Local,
        }
    }

    /// The side data is written to.
    pub fn destination(self) -> Side {
        match self {
            Self::Forward => Side::Local,
            Self::Reverse => Side::Remote,
        }
    }

    /// Whether the destination must be backed up before loading.
    pub fn requires_backup(self) -> bool {
        matches!(self, Self::Reverse)
    }

    /// File name used when the transformed dump is saved locally.
    pub fn dump_file_name(self) -> &'static str {
        match self {
            Self::Forward => "db.sql",
            Self::Reverse => "db_reverse.sql",
        }
    }
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.source(), self.destination())
    }
}
