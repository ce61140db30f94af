use std::fs;
use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use s2series::{Diagnostic, RunReport, SelectionParams, run_files_to_dir};

use super::args::CliArgs;
use super::errors::AppError;

fn load_params(path: Option<&Path>) -> Result<SelectionParams, AppError> {
    let Some(path) = path else {
        return Ok(SelectionParams::default());
    };
    if !path.exists() {
        return Err(AppError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| AppError::InvalidConfig {
        path: path.to_path_buf(),
        source,
    })
}

/// Flags win over the preset; unset flags leave the preset value alone.
fn apply_overrides(mut params: SelectionParams, args: &CliArgs) -> SelectionParams {
    if let Some(v) = args.cloud_cover_max {
        params.cloud_cover_max = v;
    }
    if let Some(v) = args.max_items {
        params.max_items = v;
    }
    if let Some(v) = args.full_cover_threshold {
        params.full_cover_threshold = v;
    }
    if args.no_union {
        params.allow_union = false;
    }
    if let Some(v) = args.max_union_tiles {
        params.max_union_tiles = v;
    }
    if let Some(v) = args.n_anchors {
        params.n_anchors = v;
    }
    if let Some(v) = args.window_days {
        params.window_days = v;
    }
    if args.date_start.is_some() {
        params.date_start = args.date_start;
    }
    if args.date_end.is_some() {
        params.date_end = args.date_end;
    }
    if args.anchor_timeout_ms.is_some() {
        params.anchor_timeout_ms = args.anchor_timeout_ms;
    }
    params
}

fn log_report(report: &RunReport) {
    info!("Scenes ingested: {}", report.scenes);
    info!(
        "Timestamps: {} ({} with full cover)",
        report.timestamps, report.full_cover_timestamps
    );
    info!(
        "Anchors with a selection: {} / {}",
        report.anchors_selected, report.anchors_requested
    );
    for row in &report.output.time_series {
        info!(
            "  anchor {} -> {} [{}] cloud={:.2} cov={:.4}",
            row.anchor_date,
            row.acq_datetime.format("%Y-%m-%dT%H:%M:%SZ"),
            row.tile_ids,
            row.cloud_score,
            row.coverage_frac
        );
    }
    for diagnostic in &report.output.diagnostics {
        match diagnostic {
            Diagnostic::GeometryFailure { .. } | Diagnostic::AnchorBeyondPeriod { .. } => {
                info!("{diagnostic}")
            }
            _ => warn!("{diagnostic}"),
        }
    }
    info!("Tables written to {:?}", report.paths.time_series.parent());
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    let aoi = args.aoi.as_deref().ok_or(AppError::MissingArgument {
        arg: "--aoi".to_string(),
    })?;
    if args.catalog.is_empty() {
        return Err(AppError::MissingArgument {
            arg: "--catalog".to_string(),
        }
        .into());
    }
    let output_dir = args.output_dir.as_deref().ok_or(AppError::MissingArgument {
        arg: "--output-dir".to_string(),
    })?;

    let params = apply_overrides(load_params(args.config.as_deref())?, &args);
    info!("Parameters: {:?}", params);
    info!("Catalog pages: {}", args.catalog.len());
    info!("Output directory: {:?}", output_dir);

    let report = run_files_to_dir(aoi, &args.catalog, output_dir, &params)
        .map_err(AppError::Selection)?;
    log_report(&report);
    info!("Selection complete!");
    Ok(())
}
