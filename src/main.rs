//! Tally - terminal budgeting with modal, rebindable keys

mod error;
mod ledger;
mod logging;
mod tui;

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tally_router::KeybindingConfig;

use error::TallyError;
use tui::keymap::{default_data_dir, default_keybindings_path, default_keys};

fn print_usage() {
    eprintln!("Usage: tally [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --keybindings <path>        Keybinding file (created if missing)");
    eprintln!("  --filters <path>            Saved filter file");
    eprintln!("  --log-file <path>           Write logs here (filter with TALLY_LOG)");
    eprintln!("  --print-keybindings         Print the built-in keybindings and exit");
    eprintln!("  --check-keybindings <path>  Validate a keybinding file and exit");
    eprintln!("  -h, --help                  Print help");
}

enum Mode {
    Run,
    PrintKeybindings,
    CheckKeybindings(PathBuf),
}

/// Validate `path` against the built-in keys without touching the file.
fn check_keybindings(path: &Path) -> anyhow::Result<()> {
    let config = KeybindingConfig::load(path).with_context(|| format!("{}", path.display()))?;
    let mut keys = default_keys();
    keys.apply_config(&config)
        .with_context(|| format!("{}", path.display()))?;
    if config.migrated {
        println!("OK (legacy layout, will be upgraded on next start): {}", path.display());
    } else {
        println!("OK: {}", path.display());
    }
    Ok(())
}

fn run(keybindings: Option<PathBuf>, filters: Option<PathBuf>, log_file: Option<PathBuf>) -> anyhow::Result<()> {
    let keybindings = match keybindings {
        Some(path) => path,
        None => default_keybindings_path().ok_or(TallyError::NoConfigDir)?,
    };
    let data_dir = default_data_dir();
    let filters = match (filters, &data_dir) {
        (Some(path), _) => path,
        (None, Some(dir)) => dir.join("filters.toml"),
        (None, None) => return Err(TallyError::NoConfigDir.into()),
    };
    let log_file = match (log_file, &data_dir) {
        (Some(path), _) => Some(path),
        (None, Some(dir)) => Some(dir.join("tally.log")),
        (None, None) => None,
    };
    if let Some(path) = &log_file {
        logging::init(path)?;
    }

    tui::run(tui::Paths { keybindings, filters })
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut mode = Mode::Run;
    let mut keybindings: Option<PathBuf> = None;
    let mut filters: Option<PathBuf> = None;
    let mut log_file: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--print-keybindings" => mode = Mode::PrintKeybindings,
            flag @ ("--keybindings" | "--filters" | "--log-file" | "--check-keybindings") => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: {} requires a file path", flag);
                    std::process::exit(1);
                }
                let path = PathBuf::from(&args[i]);
                match flag {
                    "--keybindings" => keybindings = Some(path),
                    "--filters" => filters = Some(path),
                    "--log-file" => log_file = Some(path),
                    _ => mode = Mode::CheckKeybindings(path),
                }
            }
            arg => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let result = match mode {
        Mode::PrintKeybindings => default_keys()
            .export()
            .to_toml()
            .map(|body| print!("{body}"))
            .map_err(anyhow::Error::from),
        Mode::CheckKeybindings(path) => check_keybindings(&path),
        Mode::Run => run(keybindings, filters, log_file),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
