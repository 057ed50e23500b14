//! Subcommand implementations.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use curator_core::config::DEFAULT_SEARCH_RADIUS_ARCSEC;
use curator_core::units::angular_separation_arcsec;
use curator_core::{
    default_matcher_registry, default_solver_registry, CIResult, CatalogObject, CatalogView,
    CrossmatchTask, CurationConfig, CursorRange, Layer2Object, OutcomeCounts, StopSignal,
    TaskOutcome,
};
use curator_lang::{parse, parse_postfix, Expr, QueryFunction};

use crate::error::{CliError, Result};
use crate::fixture::Fixture;

/// Options of the `run` subcommand.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<std::path::PathBuf>,
    pub strict: bool,
    pub start_after: Option<String>,
    pub end_at: Option<String>,
}

/// Summary printed after a curation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub table_id: i64,
    pub status: &'static str,
    pub batches: usize,
    pub counts: OutcomeCounts,
    pub cursor: Option<String>,
    pub results: BTreeMap<String, CIResult>,
}

fn load_config(path: Option<&Path>) -> Result<CurationConfig> {
    let Some(path) = path else {
        return Ok(CurationConfig::default());
    };
    let source = fs::read_to_string(path)?;
    CurationConfig::from_json(&source).map_err(|source| CliError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Homogenize and crossmatch the fixture's table against its reference
/// catalog.
pub fn run_fixture(fixture_path: &Path, options: &RunOptions) -> Result<RunReport> {
    let mut config = load_config(options.config.as_deref())?;
    if options.strict {
        config = config.strict();
    }

    let fixture = Fixture::load(fixture_path)?;
    let table_id = fixture.table_id();
    info!(
        table_id,
        rows = fixture.rows.len(),
        reference = fixture.reference.len(),
        "fixture loaded"
    );
    let repos = fixture.into_repositories()?;

    let task = CrossmatchTask::from_config(
        repos.layer0.clone(),
        repos.layer2,
        &config,
        &default_matcher_registry(),
        &default_solver_registry(),
    )?;

    let mut range = match &options.start_after {
        Some(cursor) => CursorRange::resume_after(cursor.clone()),
        None => CursorRange::full(),
    };
    if let Some(end) = &options.end_at {
        range = range.with_end(end.clone());
    }

    let outcome = task.run(table_id, &range, &StopSignal::new(), |progress| {
        debug!(batch = progress.batch, cursor = %progress.cursor, "batch committed");
    })?;

    let results = repos.layer0.crossmatch_results();
    let report = match outcome {
        TaskOutcome::Completed {
            batches,
            counts,
            cursor,
        } => RunReport {
            table_id,
            status: "completed",
            batches,
            counts,
            cursor,
            results,
        },
        TaskOutcome::Stopped {
            batches,
            counts,
            cursor,
        } => RunReport {
            table_id,
            status: "stopped",
            batches,
            counts,
            cursor,
            results,
        },
        TaskOutcome::Skipped => RunReport {
            table_id,
            status: "skipped",
            batches: 0,
            counts: OutcomeCounts::default(),
            cursor: None,
            results,
        },
    };
    Ok(report)
}

/// Reference objects selected by a search expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMatch {
    pub pgc: i64,
    pub designations: Vec<String>,
}

/// Parse `expression` and render it as a tree or a postfix stream.
pub fn render_query(expression: &str, postfix: bool) -> Result<String> {
    if postfix {
        let tokens = parse_postfix(expression)?;
        return Ok(tokens
            .iter()
            .map(|t| t.token.to_string())
            .collect::<Vec<_>>()
            .join(" "));
    }
    Ok(parse(expression)?.to_string())
}

/// Evaluate `expression` against every reference object of a fixture.
pub fn search_fixture(expression: &str, fixture_path: &Path) -> Result<Vec<QueryMatch>> {
    let expr = parse(expression)?;
    let fixture = Fixture::load(fixture_path)?;
    Ok(fixture
        .reference
        .iter()
        .filter(|object| matches_object(&expr, object))
        .map(|object| QueryMatch {
            pgc: object.pgc,
            designations: designations(object),
        })
        .collect())
}

fn designations(object: &Layer2Object) -> Vec<String> {
    object
        .data
        .iter()
        .filter_map(|o| match o {
            CatalogObject::Designation(d) => Some(d.design.clone()),
            _ => None,
        })
        .collect()
}

/// `name` matches any designation ignoring case, `pgc` the identifier and
/// `pos` a decimal-degree `"ra dec"` pair within the default search radius.
fn matches_object(expr: &Expr, object: &Layer2Object) -> bool {
    expr.evaluate(&|function: QueryFunction, value: &str| match function {
        QueryFunction::Name => designations(object)
            .iter()
            .any(|design| design.eq_ignore_ascii_case(value.trim())),
        QueryFunction::Pgc => value.trim().parse::<i64>().is_ok_and(|pgc| pgc == object.pgc),
        QueryFunction::Pos => decimal_position(value).is_some_and(|(ra, dec)| {
            object.positions().iter().any(|p| {
                angular_separation_arcsec(ra, dec, p.ra, p.dec) <= DEFAULT_SEARCH_RADIUS_ARCSEC
            })
        }),
    })
}

fn decimal_position(value: &str) -> Option<(f64, f64)> {
    let mut parts = value.split_whitespace();
    let ra = parts.next()?.parse().ok()?;
    let dec = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((ra, dec))
}
