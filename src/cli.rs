//! Command-line argument parsing for sqlfan.
//!
//! Uses clap derive. Flags override the config file, which overrides the
//! built-in defaults.

use crate::config::{Config, Settings, Verbosity};
use crate::error::{Result, SqlfanError};
use crate::servers::{expand_path, EndpointSource};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;

/// Run SQL statements against many MySQL instances at once.
#[derive(Parser, Debug)]
#[command(name = "sqlfan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Comma-separated MySQL DSNs (user:password@tcp(host:port)/dbname)
    #[arg(long, value_name = "DSNS", env = "SQLFAN_INSTANCES")]
    pub instances: Option<String>,

    /// JSON file listing the servers (overrides --instances)
    #[arg(long = "json", value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Semicolon-separated SQL statements
    #[arg(long, value_name = "SQL")]
    pub statements: Option<String>,

    /// File containing SQL statements (overrides --statements)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Text file with SQL statements (overrides --statements and --file)
    #[arg(long, value_name = "PATH")]
    pub sqlfile: Option<PathBuf>,

    /// Read SQL statements from standard input (overrides every other source)
    #[arg(long)]
    pub stdin: bool,

    /// Run against all instances in parallel
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub concurrent: Option<bool>,

    /// Draw bordered tables
    #[arg(long)]
    pub table: bool,

    /// Increase verbosity (-v separators, -vv row counts, -vvv timings)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// MySQL option file used to fill missing credentials
    #[arg(long = "my-cnf", value_name = "PATH")]
    pub my_cnf: Option<PathBuf>,
}

/// Where the SQL text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementSource {
    Stdin,
    File(PathBuf),
    Inline(String),
}

impl StatementSource {
    /// Reads the SQL text. `stdin` is only touched for `Stdin`.
    pub fn load(&self, mut stdin: impl Read) -> Result<String> {
        match self {
            Self::Stdin => {
                let mut content = String::new();
                stdin
                    .read_to_string(&mut content)
                    .map_err(|e| SqlfanError::input(format!("error reading from stdin: {e}")))?;
                Ok(content)
            }
            Self::File(path) => {
                let path = expand_path(path)?;
                std::fs::read_to_string(&path).map_err(|e| {
                    SqlfanError::input(format!("failed to read file {}: {e}", path.display()))
                })
            }
            Self::Inline(sql) => Ok(sql.clone()),
        }
    }
}

/// Rewrites `-v=N` (N from 1 to 3) into the equivalent `-v`, `-vv` or `-vvv`.
///
/// Anything else is passed through untouched for clap to judge.
pub fn expand_verbosity_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some("-v=1") => OsString::from("-v"),
            Some("-v=2") => OsString::from("-vv"),
            Some("-v=3") => OsString::from("-vvv"),
            _ => arg,
        })
        .collect()
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse_from(expand_verbosity_args(std::env::args_os()))
    }

    /// Checks that an endpoint source and a SQL source were given.
    pub fn validate(&self) -> Result<()> {
        if self.instances.as_deref().map_or(true, str::is_empty) && self.json.is_none() {
            return Err(SqlfanError::input("--instances or --json is required"));
        }
        if self.statement_source().is_none() {
            return Err(SqlfanError::input(
                "must provide --stdin, --sqlfile, --file, or --statements",
            ));
        }
        Ok(())
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns the endpoint source. A JSON file wins over `--instances`.
    pub fn endpoint_source(&self) -> Result<EndpointSource> {
        if let Some(path) = &self.json {
            return Ok(EndpointSource::JsonFile(path.clone()));
        }
        match &self.instances {
            Some(list) if !list.is_empty() => Ok(EndpointSource::Inline(list.clone())),
            _ => Err(SqlfanError::input("--instances or --json is required")),
        }
    }

    /// Returns the SQL source, by precedence: stdin, sqlfile, file, statements.
    pub fn statement_source(&self) -> Option<StatementSource> {
        if self.stdin {
            return Some(StatementSource::Stdin);
        }
        if let Some(path) = self.sqlfile.as_ref().or(self.file.as_ref()) {
            return Some(StatementSource::File(path.clone()));
        }
        self.statements
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(|s| StatementSource::Inline(s.clone()))
    }

    /// Combines flags with the config file into the effective settings.
    pub fn settings(&self, config: &Config) -> Settings {
        let mut settings = Settings::from_config(config);

        if let Some(concurrent) = self.concurrent {
            settings.concurrent = concurrent;
        }
        if self.table {
            settings.table = true;
        }
        if self.verbose > 0 {
            settings.verbosity = Verbosity::new(self.verbose);
        }
        if self.no_color {
            settings.color = false;
        }
        if let Some(path) = &self.my_cnf {
            settings.my_cnf = Some(path.clone());
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Defaults;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["sqlfan"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_basic() {
        let cli = parse(&["--instances", "u:p@tcp(h:3306)/db", "--statements", "SELECT 1"]);
        assert_eq!(cli.instances.as_deref(), Some("u:p@tcp(h:3306)/db"));
        assert_eq!(cli.statements.as_deref(), Some("SELECT 1"));
        assert_eq!(cli.concurrent, None);
        assert!(!cli.table);
        assert_eq!(cli.verbose, 0);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_concurrent_flag_forms() {
        assert_eq!(parse(&["--concurrent"]).concurrent, Some(true));
        assert_eq!(parse(&["--concurrent=false"]).concurrent, Some(false));
        assert_eq!(parse(&["--concurrent=0"]).concurrent, Some(false));
        assert_eq!(parse(&["--concurrent=yes"]).concurrent, Some(true));
    }

    #[test]
    fn test_verbosity_count() {
        assert_eq!(parse(&["-v"]).verbose, 1);
        assert_eq!(parse(&["-vv"]).verbose, 2);
        assert_eq!(parse(&["-vvv"]).verbose, 3);
        assert_eq!(parse(&["-v", "-v"]).verbose, 2);
    }

    #[test]
    fn test_verbosity_equals_form() {
        let parse_expanded = |args: &[&str]| {
            let mut argv = vec!["sqlfan"];
            argv.extend_from_slice(args);
            Cli::try_parse_from(expand_verbosity_args(argv))
        };

        assert_eq!(parse_expanded(&["-v=1"]).unwrap().verbose, 1);
        assert_eq!(parse_expanded(&["-v=2", "--table"]).unwrap().verbose, 2);
        assert_eq!(parse_expanded(&["-v=3"]).unwrap().verbose, 3);
        assert!(parse_expanded(&["-v=9"]).is_err());
        assert_eq!(
            expand_verbosity_args(["sqlfan", "-v=2", "--table"]),
            vec![
                OsString::from("sqlfan"),
                OsString::from("-vv"),
                OsString::from("--table")
            ]
        );
    }

    #[test]
    fn test_missing_sources_are_input_errors() {
        let cli = parse(&["--json", "servers.json"]);
        assert!(matches!(cli.validate(), Err(SqlfanError::Input(_))));
    }

    #[test]
    fn test_validate_requires_instances() {
        let cli = parse(&["--statements", "SELECT 1"]);
        if cli.instances.is_some() {
            // SQLFAN_INSTANCES is set in the environment
            return;
        }
        let err = cli.validate().unwrap_err();
        assert!(err.to_string().contains("--instances or --json"));
    }

    #[test]
    fn test_validate_requires_sql_source() {
        let cli = parse(&["--json", "servers.json"]);
        let err = cli.validate().unwrap_err();
        assert!(err.to_string().contains("--statements"));
    }

    #[test]
    fn test_statement_source_precedence() {
        let all = parse(&[
            "--stdin",
            "--sqlfile",
            "a.txt",
            "--file",
            "b.sql",
            "--statements",
            "SELECT 1",
        ]);
        assert_eq!(all.statement_source(), Some(StatementSource::Stdin));

        let files = parse(&["--sqlfile", "a.txt", "--file", "b.sql", "--statements", "SELECT 1"]);
        assert_eq!(
            files.statement_source(),
            Some(StatementSource::File(PathBuf::from("a.txt")))
        );

        let file = parse(&["--file", "b.sql", "--statements", "SELECT 1"]);
        assert_eq!(
            file.statement_source(),
            Some(StatementSource::File(PathBuf::from("b.sql")))
        );

        let inline = parse(&["--statements", "SELECT 1"]);
        assert_eq!(
            inline.statement_source(),
            Some(StatementSource::Inline("SELECT 1".to_string()))
        );
    }

    #[test]
    fn test_json_overrides_instances() {
        let cli = parse(&["--instances", "u:p@tcp(h:1)/db", "--json", "servers.json"]);
        assert_eq!(
            cli.endpoint_source().unwrap(),
            EndpointSource::JsonFile(PathBuf::from("servers.json"))
        );
    }

    #[test]
    fn test_load_statements_from_sources() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "SELECT 1;\nSELECT 2;").unwrap();

        let from_file = StatementSource::File(file.path().to_path_buf())
            .load(std::io::empty())
            .unwrap();
        assert_eq!(from_file, "SELECT 1;\nSELECT 2;");

        let from_stdin = StatementSource::Stdin
            .load("SHOW DATABASES;\n".as_bytes())
            .unwrap();
        assert_eq!(from_stdin, "SHOW DATABASES;\n");

        let missing =
            StatementSource::File(PathBuf::from("/nonexistent/q.sql")).load(std::io::empty());
        assert!(matches!(missing, Err(SqlfanError::Input(_))));
    }

    #[test]
    fn test_settings_precedence() {
        let config = Config {
            defaults: Defaults {
                concurrent: false,
                table: false,
                verbose: 2,
                color: true,
            },
            ..Config::default()
        };

        let from_file = parse(&[]).settings(&config);
        assert!(!from_file.concurrent);
        assert_eq!(from_file.verbosity, Verbosity::new(2));
        assert!(from_file.color);

        let overridden = parse(&[
            "--concurrent",
            "--table",
            "-vvv",
            "--no-color",
            "--my-cnf",
            "/tmp/x.cnf",
        ])
        .settings(&config);
        assert!(overridden.concurrent);
        assert!(overridden.table);
        assert_eq!(overridden.verbosity, Verbosity::new(3));
        assert!(!overridden.color);
        assert_eq!(overridden.my_cnf, Some(PathBuf::from("/tmp/x.cnf")));
    }

    #[test]
    fn test_config_path() {
        let cli = parse(&["--config", "/etc/sqlfan.toml"]);
        assert_eq!(cli.config_path(), PathBuf::from("/etc/sqlfan.toml"));
        assert_eq!(parse(&[]).config_path(), Config::default_path());
    }
}
