use std::env;
use std::fs;

use crate::data::bundle::{save_config, PlanBundle, DEFAULT_CONFIG_PATH};
use crate::data::import::{import_roster_csv, load_roster, save_roster, DEFAULT_ROSTER_PATH};
use crate::data::validate::{validate_plan, validate_roster};
use crate::data::{load_results, save_results, DEFAULT_RESULTS_PATH};
use crate::planner::{run_search, PlanConfig};
use crate::routing::{HttpRouteProvider, Router};
use crate::server;
use crate::store::{JsonFileStore, DEFAULT_DATA_DIR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Plan,
    Serve,
    Import,
    Validate,
    Share,
    Export,
    Restore,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("plan") => Some(Command::Plan),
        Some("serve") => Some(Command::Serve),
        Some("import") => Some(Command::Import),
        Some("validate") => Some(Command::Validate),
        Some("share") => Some(Command::Share),
        Some("export") => Some(Command::Export),
        Some("restore") => Some(Command::Restore),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Plan) => handle_plan(args),
        Some(Command::Serve) => handle_serve(),
        Some(Command::Import) => handle_import(args),
        Some(Command::Validate) => handle_validate(args),
        Some(Command::Share) => handle_share(args),
        Some(Command::Export) => handle_export(args),
        Some(Command::Restore) => handle_restore(args),
        None => {
            eprintln!("usage: barhop <plan|serve|import|validate|share|export|restore>");
            2
        }
    }
}

fn handle_serve() -> i32 {
    let bind_addr = env::var("BARHOP_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    match server::run_server(&bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_plan(args: &[String]) -> i32 {
    let Some(config_path) = args.get(2) else {
        eprintln!("usage: barhop plan <config.json> [trials] [keep] [seed] [--text]");
        return 2;
    };
    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return 1;
        }
    };
    if let Some(trials) = args.get(3).and_then(|arg| arg.parse().ok()) {
        config.trials = trials;
    }
    if let Some(keep) = args.get(4).and_then(|arg| arg.parse().ok()) {
        config.keep = keep;
    }
    if let Some(seed) = args.get(5).and_then(|arg| arg.parse().ok()) {
        config.seed = Some(seed);
    }
    let as_text = args.iter().any(|arg| arg == "--text");

    let participants = match load_roster(DEFAULT_ROSTER_PATH) {
        Ok(participants) => participants,
        Err(err) => {
            eprintln!("failed to load roster: {err}");
            return 1;
        }
    };

    let report = validate_plan(&config, &participants);
    for diagnostic in &report.diagnostics {
        eprintln!(
            "{}: {}: {}",
            diagnostic.severity, diagnostic.context, diagnostic.message
        );
    }
    if report.has_errors() {
        eprintln!("validation failed");
        return 1;
    }

    let store = JsonFileStore::new(DEFAULT_DATA_DIR);
    let mut router = Router::with_store(HttpRouteProvider::from_env(), Box::new(store));
    let results = match run_search(&config, &participants, &mut router) {
        Ok(results) => results,
        Err(err) => {
            eprintln!("plan failed: {err}");
            return 1;
        }
    };

    if let Err(err) = save_results(&results, DEFAULT_RESULTS_PATH) {
        eprintln!("warning: failed to save results: {err}");
    }

    if as_text {
        for (rank, trial) in results.iter().enumerate() {
            println!(
                "#{} total {} s{}",
                rank + 1,
                trial.total_seconds,
                if trial.notes.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", trial.notes.join(", "))
                }
            );
            println!("{}", trial.event.render_text());
        }
        return 0;
    }

    match serde_json::to_string_pretty(&results) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize results: {err}");
            1
        }
    }
}

fn handle_import(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: barhop import <roster.csv>");
        return 2;
    };

    match import_roster_csv(path, DEFAULT_ROSTER_PATH) {
        Ok(report) => {
            println!(
                "import complete: records={}, skipped={}, source='{}'",
                report.record_count, report.skipped, report.source_path
            );
            0
        }
        Err(err) => {
            eprintln!("import failed: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let roster_path = args
        .get(2)
        .map(String::as_str)
        .unwrap_or(DEFAULT_ROSTER_PATH);
    let participants = match load_roster(roster_path) {
        Ok(participants) => participants,
        Err(err) => {
            eprintln!("validation failed: {err}");
            return 1;
        }
    };

    let report = match args.get(3) {
        Some(config_path) => match load_config(config_path) {
            Ok(config) => validate_plan(&config, &participants),
            Err(message) => {
                eprintln!("{message}");
                return 1;
            }
        },
        None => validate_roster(&participants),
    };

    for diagnostic in &report.diagnostics {
        println!(
            "{}: {}: {}",
            diagnostic.severity, diagnostic.context, diagnostic.message
        );
    }
    if report.has_errors() {
        eprintln!("validation failed");
        1
    } else {
        println!("validation passed ({} participants)", participants.len());
        0
    }
}

fn handle_share(args: &[String]) -> i32 {
    let Some(raw_id) = args.get(2) else {
        eprintln!("usage: barhop share <group-id>");
        return 2;
    };
    let Ok(group_id) = uuid::Uuid::parse_str(raw_id) else {
        eprintln!("'{raw_id}' is not a valid group id");
        return 2;
    };

    let results = match load_results(DEFAULT_RESULTS_PATH) {
        Ok(results) => results,
        Err(err) => {
            eprintln!("no saved results: {err}");
            return 1;
        }
    };

    for ranked in &results {
        if let Some(index) = ranked.event.group_index_by_id(group_id) {
            let Some(plan) = ranked.event.share_plan(index) else {
                continue;
            };
            return match serde_json::to_string_pretty(&plan) {
                Ok(payload) => {
                    println!("{payload}");
                    0
                }
                Err(err) => {
                    eprintln!("failed to serialize share plan: {err}");
                    1
                }
            };
        }
    }

    eprintln!("group {group_id} not found in saved results");
    1
}

/// Writes config, roster and results as one restorable bundle document.
fn handle_export(args: &[String]) -> i32 {
    let Some(config_path) = args.get(2) else {
        eprintln!("usage: barhop export <config.json> [bundle.json]");
        return 2;
    };
    let output = args
        .get(3)
        .map(String::as_str)
        .unwrap_or(crate::data::bundle::DEFAULT_BUNDLE_PATH);

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return 1;
        }
    };
    let roster = load_roster(DEFAULT_ROSTER_PATH).unwrap_or_default();
    let results = load_results(DEFAULT_RESULTS_PATH).unwrap_or_default();

    let bundle = PlanBundle {
        config,
        roster,
        results,
    };
    match bundle.save(output) {
        Ok(()) => {
            println!("exported bundle to {output}");
            0
        }
        Err(err) => {
            eprintln!("export failed: {err}");
            1
        }
    }
}

/// Inverse of `export`: reads a bundle and writes its config, roster and
/// results back to the default data paths.
fn handle_restore(args: &[String]) -> i32 {
    let path = args
        .get(2)
        .map(String::as_str)
        .unwrap_or(crate::data::bundle::DEFAULT_BUNDLE_PATH);

    let bundle = match PlanBundle::load(path) {
        Ok(bundle) => bundle,
        Err(err) => {
            eprintln!("restore failed: {err}");
            return 1;
        }
    };

    if let Err(err) = save_config(&bundle.config, DEFAULT_CONFIG_PATH) {
        eprintln!("restore failed: {err}");
        return 1;
    }
    if let Err(err) = save_roster(&bundle.roster, DEFAULT_ROSTER_PATH) {
        eprintln!("restore failed: {err}");
        return 1;
    }
    if let Err(err) = save_results(&bundle.results, DEFAULT_RESULTS_PATH) {
        eprintln!("restore failed: {err}");
        return 1;
    }

    println!(
        "restored bundle from '{path}': {} participants, {} saved plans, config at {DEFAULT_CONFIG_PATH}",
        bundle.roster.len(),
        bundle.results.len()
    );
    0
}

fn load_config(path: &str) -> Result<PlanConfig, String> {
    let raw = fs::read_to_string(path).map_err(|err| format!("failed to read {path}: {err}"))?;
    serde_json::from_str(&raw).map_err(|err| format!("failed to parse {path}: {err}"))
}
