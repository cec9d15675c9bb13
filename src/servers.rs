//! Endpoint list assembly.
//!
//! Endpoints come either from a comma-separated `--instances` value or from a
//! JSON server file. Both paths fill missing credentials from the option file
//! and validate every DSN before anything connects.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::{fill_dsn, MyCnf, DEFAULT_HOST, DEFAULT_PORT};
use crate::dsn::{Address, DriverDsn, Dsn, Endpoint};
use crate::error::{Result, SqlfanError};

/// One entry of a JSON server file.
///
/// `dsn` wins when present; otherwise the DSN is built from the fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dsn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "port_serde")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl Server {
    /// Builds the DSN for this entry.
    pub fn to_dsn(&self) -> Result<Dsn> {
        if let Some(dsn) = self.dsn.as_deref().filter(|d| !d.trim().is_empty()) {
            return Dsn::parse(dsn);
        }

        Ok(Dsn::Driver(DriverDsn {
            user: self.user.clone().filter(|u| !u.is_empty()),
            password: self.password.clone().filter(|p| !p.is_empty()),
            address: Address::Tcp {
                host: self
                    .host
                    .clone()
                    .filter(|h| !h.is_empty())
                    .unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: Some(self.port.unwrap_or(DEFAULT_PORT)),
            },
            database: self.database.clone().filter(|d| !d.is_empty()),
            params: Vec::new(),
        }))
    }
}

/// Ports show up both as numbers and as strings in hand-written files.
mod port_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    pub fn serialize<S>(port: &Option<u16>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        port.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Port>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Port::Number(n)) => Ok(Some(n)),
            Some(Port::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(Port::Text(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid port '{s}'"))),
        }
    }
}

/// Where the endpoint list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSource {
    /// Comma-separated DSNs.
    Inline(String),
    /// Path to a JSON server file.
    JsonFile(PathBuf),
}

/// Expands a leading `~/` to the home directory.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    match path.to_str().and_then(|p| p.strip_prefix("~/")) {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .ok_or_else(|| SqlfanError::input("Cannot expand '~': home directory unknown")),
        None => Ok(path.to_path_buf()),
    }
}

/// True if a line carries characters that only appear in JSON content.
fn contains_json_syntax(line: &str) -> bool {
    line.contains(['"', '\'', '{', '}', '[', ']', ':', ','])
}

/// Removes whole-line `#` comments that can't be JSON content.
pub fn strip_json_comments(content: &str) -> String {
    content
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !(trimmed.starts_with('#') && !contains_json_syntax(trimmed))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses JSON server file content.
pub fn parse_servers(content: &str) -> Result<Vec<Server>> {
    serde_json::from_str(&strip_json_comments(content))
        .map_err(|e| SqlfanError::input(format!("Failed to parse server file: {e}")))
}

/// Loads a JSON server file.
pub fn load_servers(path: &Path) -> Result<Vec<Server>> {
    let path = expand_path(path)?;
    let content = std::fs::read_to_string(&path).map_err(|e| {
        SqlfanError::input(format!("Failed to read server file {}: {e}", path.display()))
    })?;
    parse_servers(&content)
}

/// Resolves the final, validated endpoint list.
///
/// Each DSN is filled from `my_cnf` when one is available. The first DSN that
/// fails validation aborts with its position in the list.
pub fn load_endpoints(source: &EndpointSource, my_cnf: Option<&MyCnf>) -> Result<Vec<Endpoint>> {
    let dsns: Vec<Result<Dsn>> = match source {
        EndpointSource::Inline(list) => list
            .split(',')
            .map(str::trim)
            .filter(|dsn| !dsn.is_empty())
            .map(Dsn::parse)
            .collect(),
        EndpointSource::JsonFile(path) => load_servers(path)?
            .iter()
            .map(Server::to_dsn)
            .collect(),
    };

    let mut endpoints = Vec::with_capacity(dsns.len());
    for (index, dsn) in dsns.into_iter().enumerate() {
        let dsn = dsn.map_err(|e| {
            SqlfanError::config(format!("invalid DSN at index {index}: {e}"))
        })?;
        let dsn = match my_cnf {
            Some(cnf) => fill_dsn(dsn, cnf),
            None => dsn,
        };
        let endpoint = Endpoint::from(dsn);
        debug!(index, endpoint = %endpoint.masked(), "resolved endpoint");
        endpoints.push(endpoint);
    }

    if endpoints.is_empty() {
        return Err(SqlfanError::config("no instances provided"));
    }

    Ok(endpoints)
}
