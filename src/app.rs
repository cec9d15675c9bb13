//! Run orchestration for sqlfan.
//!
//! Turns parsed arguments into a `RunPlan` (settings, endpoints, statements),
//! then fans the plan out through the coordinator and streams reports to the
//! presenter.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::config::{Config, Settings};
use crate::credentials::MyCnf;
use crate::db::Connector;
use crate::dsn::Endpoint;
use crate::error::{Result, SqlfanError};
use crate::output::{Palette, Presenter, RenderMode};
use crate::query::{split_statements, Coordinator, RunSession, StatementUnit};
use crate::servers::{expand_path, load_endpoints};

/// Everything needed to start a run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub endpoints: Vec<Endpoint>,
    pub statements: Vec<StatementUnit>,
    pub settings: Settings,
}

impl RunPlan {
    /// Builds a plan from command-line arguments.
    ///
    /// Loads the config file, the option file and the endpoint list, and
    /// reads the SQL from whichever source has precedence.
    pub fn from_cli(cli: &Cli, stdin: impl Read) -> Result<Self> {
        cli.validate()?;

        let config_path = cli.config_path();
        info!("Loading config from: {}", config_path.display());
        let config = Config::load_from_file(&config_path)?;
        let settings = cli.settings(&config);

        let my_cnf = load_my_cnf(settings.my_cnf.as_deref())?;
        let endpoints = load_endpoints(&cli.endpoint_source()?, my_cnf.as_ref())?;

        let source = cli
            .statement_source()
            .ok_or_else(|| SqlfanError::input("no SQL statements provided"))?;
        let statements = split_statements(&source.load(stdin)?);
        if statements.is_empty() {
            warn!("no statements found in the SQL input");
        }
        debug!(
            endpoints = endpoints.len(),
            statements = statements.len(),
            "run planned"
        );

        Ok(Self {
            endpoints,
            statements,
            settings,
        })
    }
}

/// Loads the option file at `path`, or `~/.my.cnf` when no path is set.
fn load_my_cnf(path: Option<&Path>) -> Result<Option<MyCnf>> {
    let path = match path {
        Some(path) => expand_path(path)?,
        None => match MyCnf::default_path() {
            Some(path) => path,
            None => return Ok(None),
        },
    };
    MyCnf::load(&path)
}

/// Executes `plan` and writes everything to `out`.
pub async fn execute<W: Write>(
    plan: RunPlan,
    connector: Arc<dyn Connector>,
    out: W,
) -> Result<W> {
    let settings = plan.settings;
    let mut presenter = Presenter::new(
        out,
        RenderMode::for_run(settings.table),
        Palette::new(settings.color),
        settings.verbosity,
    );

    let session = RunSession::new(plan.endpoints, plan.statements, settings.concurrent);
    presenter.begin(session.endpoints.len(), session.concurrent)?;

    let coordinator = Coordinator::new(connector, settings.verbosity);
    let mut written: Result<()> = Ok(());
    coordinator
        .run(&session, |report| {
            if written.is_ok() {
                written = presenter.report(&report);
            }
        })
        .await;
    written?;

    presenter.finish()?;
    Ok(presenter.into_inner())
}
