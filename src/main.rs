//! CLI entry point for global-hotkey-manager
//!
//! Provides a command-line interface for inspecting the persisted key
//! mapping, editing bindings, and running the hotkey listener.

use clap::{Parser, Subcommand};
use colored::*;
use global_hotkey_manager::config::{FileMappingStore, MappingStore};
use global_hotkey_manager::core::parser::parse_combination;
use global_hotkey_manager::core::{merge_with_defaults, Action, KeyCombination};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_MAPPING: &str = "~/.config/global-hotkey-manager/hotkeys.json";

#[derive(Parser)]
#[command(name = "global-hotkey-manager")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the effective key mapping
    List {
        /// Path to the mapping file
        #[arg(short, long, default_value = DEFAULT_MAPPING)]
        mapping: PathBuf,
    },

    /// Check the persisted mapping for duplicate combinations
    Check {
        /// Path to the mapping file
        #[arg(short, long, default_value = DEFAULT_MAPPING)]
        mapping: PathBuf,
    },

    /// Assign a key combination to an action
    Bind {
        /// Action name, e.g. PlayPause
        action: String,
        /// Combination, e.g. "Alt+Win+Space" (or "None" to clear)
        combination: String,
        /// Path to the mapping file
        #[arg(short, long, default_value = DEFAULT_MAPPING)]
        mapping: PathBuf,
    },

    /// Clear the binding for an action
    Unbind {
        /// Action name, e.g. PlayPause
        action: String,
        /// Path to the mapping file
        #[arg(short, long, default_value = DEFAULT_MAPPING)]
        mapping: PathBuf,
    },

    /// Reset the mapping to factory defaults
    Reset {
        /// Path to the mapping file
        #[arg(short, long, default_value = DEFAULT_MAPPING)]
        mapping: PathBuf,
    },

    /// Run the listener and print actions as their hotkeys fire
    Listen {
        /// Path to the mapping file
        #[arg(short, long, default_value = DEFAULT_MAPPING)]
        mapping: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { mapping } => list_mapping(&mapping)?,
        Commands::Check { mapping } => check_mapping(&mapping)?,
        Commands::Bind {
            action,
            combination,
            mapping,
        } => bind_action(&action, &combination, &mapping)?,
        Commands::Unbind { action, mapping } => bind_action(&action, "None", &mapping)?,
        Commands::Reset { mapping } => reset_mapping(&mapping)?,
        Commands::Listen { mapping } => listen(&mapping)?,
    }

    Ok(())
}

/// Opens the file store with tilde expansion applied to the path.
fn open_store(mapping_path: &PathBuf) -> anyhow::Result<FileMappingStore> {
    let expanded = shellexpand::tilde(
        mapping_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?,
    );
    Ok(FileMappingStore::new(PathBuf::from(expanded.as_ref()))?)
}

/// Loads the persisted mapping and reconciles it against the known actions.
fn load_effective_mapping(
    store: &FileMappingStore,
) -> anyhow::Result<Vec<(Action, KeyCombination)>> {
    let persisted = store.load()?.unwrap_or_default();
    Ok(merge_with_defaults(&persisted))
}

/// List the effective mapping, defaults merged in
fn list_mapping(mapping_path: &PathBuf) -> anyhow::Result<()> {
    let store = open_store(mapping_path)?;
    let entries = load_effective_mapping(&store)?;

    println!("{}", format!("Hotkeys from: {}\n", store.mapping_path().display()).bold());

    for (action, combination) in &entries {
        let name = format!("{:<14}", action.to_string()).cyan().bold();
        if combination.is_bound() {
            println!("{} → {}", name, combination.to_string().green());
        } else {
            println!("{} → {}", name, "unbound".dimmed());
        }
    }

    let bound = entries.iter().filter(|(_, c)| c.is_bound()).count();
    println!("\n{} {} of {} actions bound", "✓".green(), bound, entries.len());

    Ok(())
}

/// Check the persisted mapping for duplicate bound combinations
///
/// The registry never produces duplicates itself, but a hand-edited mapping
/// file can.
fn check_mapping(mapping_path: &PathBuf) -> anyhow::Result<()> {
    let store = open_store(mapping_path)?;
    let persisted = store.load()?.unwrap_or_default();

    println!("{} Checking mapping: {}", "→".cyan(), store.mapping_path().display());

    let mut by_combination: HashMap<KeyCombination, Vec<Action>> = HashMap::new();
    for (action, combination) in persisted {
        if combination.is_bound() {
            by_combination.entry(combination).or_default().push(action);
        }
    }

    let conflicts: Vec<(&KeyCombination, &Vec<Action>)> = by_combination
        .iter()
        .filter(|(_, actions)| actions.len() > 1)
        .collect();

    if conflicts.is_empty() {
        println!("{} {}", "✓".green().bold(), "No conflicts detected!".bold());
        return Ok(());
    }

    println!(
        "{} Found {} conflict{}:\n",
        "✗".red().bold(),
        conflicts.len(),
        if conflicts.len() == 1 { "" } else { "s" }
    );

    for (i, (combination, actions)) in conflicts.iter().enumerate() {
        println!(
            "{} {}",
            format!("Conflict {}", i + 1).yellow().bold(),
            combination.to_string().cyan()
        );
        for (idx, action) in actions.iter().enumerate() {
            println!("  {} {}", format!("{}.", idx + 1).dimmed(), action);
        }
        println!();
    }

    println!("{}", "⚠ Only one of these actions will win registration!".yellow());
    std::process::exit(1);
}

/// Assign (or clear, with "None") a combination for one action
fn bind_action(
    action_name: &str,
    combination_text: &str,
    mapping_path: &PathBuf,
) -> anyhow::Result<()> {
    let action = Action::from_name(action_name).ok_or_else(|| {
        let known: Vec<&str> = Action::ALL.iter().map(|a| a.name()).collect();
        anyhow::anyhow!("Unknown action '{}'. Known: {}", action_name, known.join(", "))
    })?;

    let combination =
        parse_combination(combination_text).map_err(|e| anyhow::anyhow!("{}", e))?;

    let store = open_store(mapping_path)?;
    let mut entries = load_effective_mapping(&store)?;

    // Refuse a combination already assigned to a different action
    if combination.is_bound() {
        if let Some((taken_by, _)) = entries
            .iter()
            .find(|(a, c)| *a != action && *c == combination)
        {
            println!(
                "{} {} is already assigned to {}",
                "✗".red().bold(),
                combination.to_string().cyan(),
                taken_by.to_string().yellow()
            );
            std::process::exit(1);
        }
    }

    for entry in &mut entries {
        if entry.0 == action {
            entry.1 = combination;
        }
    }
    store.save(&entries)?;

    if combination.is_bound() {
        println!(
            "{} {} → {}",
            "✓".green(),
            action.to_string().cyan().bold(),
            combination.to_string().green()
        );
    } else {
        println!("{} {} unbound", "✓".green(), action.to_string().cyan().bold());
    }

    Ok(())
}

/// Write the factory defaults, replacing the current mapping
fn reset_mapping(mapping_path: &PathBuf) -> anyhow::Result<()> {
    let store = open_store(mapping_path)?;
    let defaults = merge_with_defaults(&[]);
    store.save(&defaults)?;

    println!("{} Mapping reset to defaults", "✓".green());
    Ok(())
}

/// Register the mapping and print actions as their hotkeys fire
#[cfg(windows)]
fn listen(mapping_path: &PathBuf) -> anyhow::Result<()> {
    use global_hotkey_manager::core::LogObserver;
    use global_hotkey_manager::native::windows::WindowsHotkeys;
    use global_hotkey_manager::HotkeyManager;

    let store = open_store(mapping_path)?;
    let bridge = WindowsHotkeys::new()?;
    let mut manager = HotkeyManager::new(bridge, Box::new(store), Box::new(LogObserver));
    manager.initialise()?;

    println!("{}", "Listening for hotkeys (Ctrl+C to quit):\n".bold());
    for binding in manager.snapshot() {
        if binding.is_bound() {
            println!(
                "  {} → {}",
                binding.combination.to_string().green(),
                binding.action.to_string().cyan()
            );
        }
    }
    println!();

    while let Some(action) = manager.recv_action() {
        println!("{} {}", "♪".magenta(), action.to_string().cyan().bold());
    }

    Ok(())
}

#[cfg(not(windows))]
fn listen(_mapping_path: &PathBuf) -> anyhow::Result<()> {
    anyhow::bail!("the listen command is only supported on Windows")
}
