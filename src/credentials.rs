//! Credential defaults from a MySQL option file (`~/.my.cnf`).
//!
//! Only flat `key = value` lines are read. Section headers are ignored, so a
//! key in any section applies; the last occurrence wins.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::dsn::{Address, Dsn};
use crate::error::{Result, SqlfanError};

/// Host used when neither the DSN nor the option file names one.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when neither the DSN nor the option file names one.
pub const DEFAULT_PORT: u16 = 3306;

/// Credentials read from a MySQL option file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MyCnf {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
}

fn key_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([a-zA-Z_-]+)\s*=\s*(.*?)\s*$").expect("static regex is valid")
    })
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

impl MyCnf {
    /// Returns `~/.my.cnf`, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".my.cnf"))
    }

    /// Loads the option file at `path`.
    ///
    /// A missing file yields `Ok(None)`; an unreadable one is an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!(path = %path.display(), "no option file");
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            SqlfanError::input(format!("Failed to read {}: {e}", path.display()))
        })?;

        Ok(Some(Self::parse(&content)))
    }

    /// Parses option file content.
    pub fn parse(content: &str) -> Self {
        let mut cnf = Self::default();

        for line in content.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let Some(caps) = key_value_pattern().captures(line) else {
                continue;
            };
            let value = unquote(&caps[2]).to_string();

            match caps[1].to_lowercase().as_str() {
                "user" => cnf.user = Some(value),
                "password" => cnf.password = Some(value),
                "host" => cnf.host = Some(value),
                "port" => match value.parse() {
                    Ok(port) => cnf.port = Some(port),
                    Err(_) => debug!(%value, "ignoring non-numeric port in option file"),
                },
                "database" => cnf.database = Some(value),
                _ => {}
            }
        }

        cnf
    }
}

/// Fills the parts of `dsn` that are missing from `cnf`.
///
/// User, password and database are filled when absent. An address is only
/// supplied when the DSN has none (or a `tcp()` section with an empty host);
/// a host already present is never overridden. URL endpoints get the same
/// treatment through their URL components.
pub fn fill_dsn(dsn: Dsn, cnf: &MyCnf) -> Dsn {
    match dsn {
        Dsn::Driver(mut dsn) => {
            if dsn.user.is_none() {
                dsn.user = cnf.user.clone();
            }
            if dsn.password.is_none() {
                dsn.password = cnf.password.clone();
            }

            let default_host = || cnf.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string());
            dsn.address = match dsn.address {
                Address::Default => Address::Tcp {
                    host: default_host(),
                    port: Some(cnf.port.unwrap_or(DEFAULT_PORT)),
                },
                Address::Tcp { host, port } if host.trim().is_empty() => Address::Tcp {
                    host: default_host(),
                    port: port.or(Some(cnf.port.unwrap_or(DEFAULT_PORT))),
                },
                address => address,
            };

            if dsn.database.is_none() {
                dsn.database = cnf.database.clone();
            }
            Dsn::Driver(dsn)
        }
        Dsn::Url(mut url) => {
            if url.username().is_empty() {
                if let Some(user) = &cnf.user {
                    let _ = url.set_username(user);
                }
            }
            if url.password().is_none() {
                if let Some(password) = &cnf.password {
                    let _ = url.set_password(Some(password));
                }
            }
            if url.host_str().map_or(true, str::is_empty) {
                if let Some(host) = &cnf.host {
                    let _ = url.set_host(Some(host));
                }
                if url.port().is_none() {
                    let _ = url.set_port(cnf.port);
                }
            }
            if url.path().trim_start_matches('/').is_empty() {
                if let Some(database) = &cnf.database {
                    url.set_path(database);
                }
            }
            Dsn::Url(url)
        }
    }
}
