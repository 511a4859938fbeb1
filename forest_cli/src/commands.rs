//! Command execution

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use forest_core::calculations::{calculate_with, plot_geometry, round_to, MetricsInput, StandParameters};
use forest_core::equations::{
    generate_equations_markdown, try_dominant_height_from_site_index, try_site_index_from_dominant_height,
};
use forest_core::file_io::{load_or_create_store, load_store_with_lock_check, save_store, FileLock};
use forest_core::records::{MeasurementStore, NewRecord, RecordUpdate};

use crate::args::{Cli, Commands, RecordCommands, SiteCommands};
use crate::config::CliConfig;

/// Resolved runtime context: config merged with global flags.
pub struct RunContext {
    pub config: CliConfig,
    pub store_path: PathBuf,
    pub user: String,
}

impl RunContext {
    pub fn new(cli: &Cli, config: CliConfig) -> Self {
        let store_path = cli.store.clone().unwrap_or_else(|| config.resolved_store_path());
        let user = cli.user.clone().unwrap_or_else(|| config.resolved_user());
        RunContext { config, store_path, user }
    }
}

pub fn execute_command(cli: &Cli, ctx: &RunContext) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&cli.command, ctx, &mut out)
}

fn run(command: &Commands, ctx: &RunContext, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Compute { input } => {
            let input = read_input(input.as_deref())?;
            let output = calculate_with(&input, &ctx.config.defaults)?;
            print_json(out, &output)
        }
        Commands::Site { command } => run_site(command, out),
        Commands::Plot { row, between, min_trees, area } => {
            let stand = StandParameters {
                plot_area_m2: *area,
                min_trees_for_plot: Some(min_trees.unwrap_or(ctx.config.defaults.min_trees_for_plot)),
                ..StandParameters::from_spacing(*row, *between)
            };
            print_json(out, &plot_geometry(&stand)?)
        }
        Commands::Equations => {
            write!(out, "{}", generate_equations_markdown())?;
            Ok(())
        }
        Commands::Records { command } => run_records(command, ctx, out),
    }
}

fn run_site(command: &SiteCommands, out: &mut dyn Write) -> Result<()> {
    match command {
        SiteCommands::DominantHeight { site_index, age } => {
            let height = try_dominant_height_from_site_index(*site_index, *age)?;
            print_json(
                out,
                &json!({
                    "site_index_m": site_index,
                    "age_years": age,
                    "dominant_height_m": round_to(height, 2),
                }),
            )
        }
        SiteCommands::Index { dominant_height, age } => {
            let index = try_site_index_from_dominant_height(*dominant_height, *age)?;
            print_json(
                out,
                &json!({
                    "dominant_height_m": dominant_height,
                    "age_years": age,
                    "site_index_m": round_to(index, 2),
                }),
            )
        }
    }
}

fn run_records(command: &RecordCommands, ctx: &RunContext, out: &mut dyn Write) -> Result<()> {
    match command {
        RecordCommands::List { plot } => {
            let store = read_store(ctx)?;
            let records = match plot {
                Some(plot) => store.list_for_plot(plot),
                None => store.list(),
            };
            print_json(out, &records)
        }
        RecordCommands::Show { id } => {
            let store = read_store(ctx)?;
            print_json(out, store.get(id)?)
        }
        RecordCommands::Create { input, plot } => {
            let input = read_input(Some(input))?;
            let new = NewRecord {
                plot_reference: plot.clone(),
                input_data: Some(input),
                metrics: None,
            };
            let record = modify_store(ctx, |store| Ok(store.create(new)?))?;
            print_json(out, &record)
        }
        RecordCommands::Update { id, input, plot } => {
            let update = RecordUpdate {
                plot_reference: plot.clone(),
                input_data: input.as_deref().map(|p| read_input(Some(p))).transpose()?,
                metrics: None,
            };
            let record = modify_store(ctx, |store| Ok(store.update(id, update)?))?;
            print_json(out, &record)
        }
        RecordCommands::Delete { id } => {
            let record = modify_store(ctx, |store| Ok(store.delete(id)?))?;
            print_json(out, &json!({ "deleted": record.id }))
        }
    }
}

/// Load the store for reading, starting from the configured defaults when absent.
fn open_store(ctx: &RunContext) -> Result<MeasurementStore> {
    let exists = ctx.store_path.exists();
    let mut store = load_or_create_store(&ctx.store_path)
        .with_context(|| format!("Failed to open store {}", ctx.store_path.display()))?;
    if !exists {
        store.settings = ctx.config.defaults;
    }
    Ok(store)
}

/// Load the store for a read-only command, warning when another user is
/// editing it.
fn read_store(ctx: &RunContext) -> Result<MeasurementStore> {
    if !ctx.store_path.exists() {
        return open_store(ctx);
    }
    let (store, lock) = load_store_with_lock_check(&ctx.store_path)
        .with_context(|| format!("Failed to open store {}", ctx.store_path.display()))?;
    if let Some(info) = lock {
        tracing::warn!(
            holder = %info.user_id,
            machine = %info.machine,
            since = %info.locked_at,
            "store is being edited; listed records may be out of date"
        );
    }
    Ok(store)
}

/// Run `f` against the store under the file lock, then save.
fn modify_store<T>(ctx: &RunContext, f: impl FnOnce(&mut MeasurementStore) -> Result<T>) -> Result<T> {
    if let Some(parent) = ctx.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let _lock = FileLock::acquire(&ctx.store_path, ctx.user.clone())?;
    let mut store = open_store(ctx)?;
    let result = f(&mut store)?;
    save_store(&store, &ctx.store_path)?;
    Ok(result)
}

/// Read a measurement request from a file, or stdin for `-`/`None`.
fn read_input(path: Option<&Path>) -> Result<MetricsInput> {
    let contents = match path {
        Some(p) if p != Path::new("-") => {
            fs::read_to_string(p).with_context(|| format!("Failed to read input {}", p.display()))?
        }
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&contents).context("Invalid measurement request JSON")
}

fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use forest_core::MetricsError;
    use serde_json::Value;
    use tempfile::TempDir;

    const REQUEST: &str = r#"{
        "trees": [{"dap_cm": 30.0, "height_m": 20.0}, {"dap_cm": 25.0, "height_m": 18.0}],
        "distance_in_row_m": 5.0,
        "distance_between_rows_m": 5.0,
        "age_years": 10.0
    }"#;

    fn context(dir: &TempDir) -> RunContext {
        RunContext {
            config: CliConfig::default(),
            store_path: dir.path().join("store").join("measurements.json"),
            user: "tester".to_string(),
        }
    }

    fn run_json(command: Commands, ctx: &RunContext) -> Value {
        let mut out = Vec::new();
        run(&command, ctx, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    fn write_request(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("request.json");
        fs::write(&path, REQUEST).unwrap();
        path
    }

    #[test]
    fn test_compute_from_file() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let input = write_request(&dir);

        let output = run_json(Commands::Compute { input: Some(input) }, &ctx);
        assert_eq!(output["per_tree"].as_array().unwrap().len(), 2);
        assert_eq!(output["aggregates"]["trees_per_ha"], 400);
        assert_eq!(output["aggregates"]["density_source"], "BY_SPACING");
        assert!(output["site"].is_object());
    }

    #[test]
    fn test_site_index_at_reference_age() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let command = Commands::Site {
            command: SiteCommands::Index { dominant_height: 18.0, age: 10.0 },
        };
        let output = run_json(command, &ctx);
        assert_eq!(output["site_index_m"], 18.0);
    }

    #[test]
    fn test_site_index_undefined_at_age_zero() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let command = Commands::Site {
            command: SiteCommands::Index { dominant_height: 18.0, age: 0.0 },
        };
        let err = run(&command, &ctx, &mut Vec::new()).unwrap_err();
        let metrics_err = err.downcast_ref::<MetricsError>().unwrap();
        assert_eq!(metrics_err.error_code(), "UNDEFINED_DOMAIN");
    }

    #[test]
    fn test_plot_uses_configured_min_trees() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        ctx.config.defaults.min_trees_for_plot = 10;
        let command = Commands::Plot { row: 5.0, between: 4.0, min_trees: None, area: Some(0.0) };

        let output = run_json(command, &ctx);
        assert_eq!(output["recommended_area_m2_for_min_trees"], 200.0);
        assert_eq!(output["min_trees_for_plot"], 10);
        assert!(output["provided_area_m2"].is_null());
    }

    #[test]
    fn test_plot_echoes_provided_area() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let command = Commands::Plot { row: 5.0, between: 5.0, min_trees: None, area: Some(123.456) };

        let output = run_json(command, &ctx);
        assert_eq!(output["provided_area_m2"], 123.456);
        assert_eq!(output["radius_from_provided_area_m"], 6.27);
    }

    #[test]
    fn test_plot_rejects_negative_spacing() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let command = Commands::Plot { row: -5.0, between: 5.0, min_trees: None, area: None };

        let err = run(&command, &ctx, &mut Vec::new()).unwrap_err();
        assert_eq!(err.downcast_ref::<MetricsError>().unwrap().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_equations_markdown() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let mut out = Vec::new();
        run(&Commands::Equations, &ctx, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with('#'));
    }

    #[test]
    fn test_record_lifecycle() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let input = write_request(&dir);

        let created = run_json(
            Commands::Records {
                command: RecordCommands::Create { input: input.clone(), plot: Some("P-7".to_string()) },
            },
            &ctx,
        );
        let id: Uuid = serde_json::from_value(created["id"].clone()).unwrap();
        assert!(ctx.store_path.exists());

        let listed = run_json(Commands::Records { command: RecordCommands::List { plot: Some("P-7".to_string()) } }, &ctx);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let updated = run_json(
            Commands::Records {
                command: RecordCommands::Update { id, input: None, plot: Some("P-8".to_string()) },
            },
            &ctx,
        );
        assert_eq!(updated["plot_reference"], "P-8");

        let shown = run_json(Commands::Records { command: RecordCommands::Show { id } }, &ctx);
        assert_eq!(shown["metrics"]["trees_count"], 2);

        run_json(Commands::Records { command: RecordCommands::Delete { id } }, &ctx);
        let err = run(&Commands::Records { command: RecordCommands::Show { id } }, &ctx, &mut Vec::new()).unwrap_err();
        assert_eq!(err.downcast_ref::<MetricsError>().unwrap().error_code(), "RECORD_NOT_FOUND");
    }

    #[test]
    fn test_create_rejects_overflowing_tree_and_store_stays_readable() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        run_json(Commands::Records { command: RecordCommands::Create { input: write_request(&dir), plot: None } }, &ctx);

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"trees": [{"dap_cm": 1e200, "height_m": 20.0}], "distance_in_row_m": 5, "distance_between_rows_m": 5}"#)
            .unwrap();
        let err = run(&Commands::Records { command: RecordCommands::Create { input: bad, plot: None } }, &ctx, &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.downcast_ref::<MetricsError>().unwrap().error_code(), "INVALID_INPUT");

        let listed = run_json(Commands::Records { command: RecordCommands::List { plot: None } }, &ctx);
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_list_while_another_user_holds_lock() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        run_json(Commands::Records { command: RecordCommands::Create { input: write_request(&dir), plot: None } }, &ctx);

        let _lock = FileLock::acquire(&ctx.store_path, "someone-else").unwrap();
        let listed = run_json(Commands::Records { command: RecordCommands::List { plot: None } }, &ctx);
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_lock_released_after_modification() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let input = write_request(&dir);

        run_json(Commands::Records { command: RecordCommands::Create { input, plot: None } }, &ctx);
        assert!(FileLock::check(&ctx.store_path).is_none());
    }
}
