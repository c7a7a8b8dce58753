//! Scan dialogs: CDM conversion form and the data quality console

pub mod cdm;
pub mod dqd;

pub use cdm::*;
pub use dqd::*;

use serde::{Deserialize, Serialize};

/// Connection settings for one database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DbSettings {
    /// Layered config sources lowercase their keys.
    #[serde(alias = "dbtype")]
    pub db_type: String,
    pub server: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    pub database: String,
    pub schema: String,
}

impl DbSettings {
    /// Every field needed to open a connection is filled. Password and
    /// schema may be empty.
    pub fn is_valid(&self) -> bool {
        [&self.db_type, &self.server, &self.user, &self.database]
            .iter()
            .all(|field| !field.trim().is_empty())
            && self.port.is_some()
    }
}
