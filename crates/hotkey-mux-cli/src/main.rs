//! hotkey-mux CLI
//!
//! Parse and validate hotkey descriptors, check bindings files, replay
//! scripted input against them, or watch a real keyboard.

mod bindings;
mod listen;
mod replay;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use hotkey_mux_core::{
    parse_config, parse_hotkey, validate_hotkey, BindingsConfig, HotkeyDescriptor, ParsedHotkey,
    Platform, ValidationResult,
};
use hotkey_mux_dispatch::HotkeyRuntime;
use miette::IntoDiagnostic;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::bindings::Bindings;
use crate::replay::{ReplayExecutor, TokioClock};

#[derive(Parser, Debug)]
#[command(name = "hotkey-mux")]
#[command(about = "Keyboard shortcut parsing and dispatch")]
#[command(version)]
struct Cli {
    /// Path to bindings file
    #[arg(short, long, default_value = "~/.config/hotkey-mux/bindings.kdl")]
    config: String,

    /// Resolve hotkeys for this platform instead of the detected one
    #[arg(short, long)]
    platform: Option<Platform>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a descriptor and print its canonical form
    Parse {
        descriptor: String,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate descriptors without loading a bindings file
    Validate {
        #[arg(required = true)]
        descriptors: Vec<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the bindings file and report what it registers
    Check,

    /// Play the bindings file's replay block and print what fires
    Replay {
        /// Print fired actions as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// List keyboards that can be listened to
    Devices,

    /// Dispatch live input from a keyboard until Ctrl+C
    Listen {
        /// Input device, e.g. /dev/input/event3
        #[arg(short, long)]
        device: PathBuf,

        /// Print fired actions as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    match cli.command {
        Commands::Parse { descriptor, json } => {
            init_tracing("warn");
            cmd_parse(&descriptor, resolve_platform(cli.platform, None), json)
        }
        Commands::Validate { descriptors, json } => {
            init_tracing("warn");
            cmd_validate(&descriptors, resolve_platform(cli.platform, None), json)
        }
        Commands::Devices => {
            init_tracing("warn");
            cmd_devices()
        }
        Commands::Check => {
            let config = load_config(&config_path)?;
            cmd_check(&config_path, &config, cli.platform)
        }
        Commands::Replay { json } => {
            let config = load_config(&config_path)?;
            cmd_replay(&config, cli.platform, json)
        }
        Commands::Listen { device, json } => {
            let config = load_config(&config_path)?;
            cmd_listen(&config, cli.platform, &device, json)
        }
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

/// Parse the bindings file, then install the subscriber at its log level.
///
/// Warnings raised while parsing go to a temporary subscriber so they are
/// not lost before the real one exists.
fn load_config(path: &Path) -> miette::Result<BindingsConfig> {
    let early = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .finish();
    let config = tracing::subscriber::with_default(early, || parse_config(path))
        .map_err(|e| miette::Report::new(e).wrap_err(format!("Failed to load {}", path.display())))?;

    init_tracing(config.settings.log_level.as_filter());
    tracing::debug!("Loaded bindings from {}", path.display());
    Ok(config)
}

/// Command line flag first, then the bindings file, then detection.
fn resolve_platform(flag: Option<Platform>, config: Option<&BindingsConfig>) -> Platform {
    flag.or_else(|| config.and_then(|c| c.settings.platform))
        .unwrap_or_else(Platform::detect)
}

fn load_bindings(
    config: &BindingsConfig,
    flag: Option<Platform>,
    runtime: HotkeyRuntime,
) -> miette::Result<Bindings> {
    let runtime = runtime.with_platform(resolve_platform(flag, Some(config)));
    Bindings::load(config, runtime).map_err(|e| miette::miette!("{:#}", e))
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    descriptor: &'a str,
    platform: Platform,
    canonical: String,
    display: String,
    hotkey: &'a ParsedHotkey,
}

fn cmd_parse(descriptor: &str, platform: Platform, json: bool) -> miette::Result<()> {
    let hotkey = parse_hotkey(&HotkeyDescriptor::from(descriptor), platform)
        .map_err(|e| miette::miette!("{}", e))?;

    if json {
        let output = ParseOutput {
            descriptor,
            platform,
            canonical: hotkey.to_string(),
            display: hotkey.display_for(platform),
            hotkey: &hotkey,
        };
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else {
        println!("{}", hotkey);
        println!("  Display ({}): {}", platform, hotkey.display_for(platform));
    }
    Ok(())
}

#[derive(Serialize)]
struct ValidateOutput<'a> {
    descriptor: &'a str,
    #[serde(flatten)]
    result: ValidationResult,
}

fn cmd_validate(descriptors: &[String], platform: Platform, json: bool) -> miette::Result<()> {
    let results: Vec<ValidateOutput> = descriptors
        .iter()
        .map(|descriptor| ValidateOutput {
            descriptor,
            result: validate_hotkey(&HotkeyDescriptor::from(descriptor), platform),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&results).into_diagnostic()?);
    } else {
        for output in &results {
            let status = if output.result.valid { "ok" } else { "invalid" };
            println!("{}: {}", output.descriptor, status);
            for error in &output.result.errors {
                println!("    error: {}", error);
            }
            for warning in &output.result.warnings {
                println!("    warning: {}", warning);
            }
        }
    }

    let invalid = results.iter().filter(|o| !o.result.valid).count();
    if invalid > 0 {
        return Err(miette::miette!("{} of {} descriptor(s) invalid", invalid, results.len()));
    }
    Ok(())
}

fn cmd_check(
    config_path: &Path,
    config: &BindingsConfig,
    flag: Option<Platform>,
) -> miette::Result<()> {
    let bindings = load_bindings(config, flag, HotkeyRuntime::new())?;
    let platform = bindings.platform();

    println!("Bindings are valid: {}", config_path.display());
    println!("  Platform: {}", platform);
    println!("  Elements: {}", config.elements.len());
    println!(
        "  Hotkeys: {} ({} registered)",
        config.hotkeys.len(),
        bindings.runtime().hotkeys().registration_count()
    );
    for binding in &config.hotkeys {
        let descriptor = HotkeyDescriptor::from(&binding.hotkey);
        let scope = binding.scope.as_deref().unwrap_or("document");
        println!("    - {} -> {} [{}]", binding.hotkey, binding.action, scope);
        for warning in validate_hotkey(&descriptor, platform).warnings {
            println!("      warning: {}", warning);
        }
    }
    println!("  Sequences: {}", bindings.runtime().sequences().sequence_count());
    for binding in &config.sequences {
        println!("    - {} -> {}", binding.steps.join(" "), binding.action);
    }
    println!("  Replay steps: {}", config.replay.len());

    Ok(())
}

fn cmd_replay(config: &BindingsConfig, flag: Option<Platform>, json: bool) -> miette::Result<()> {
    if config.replay.is_empty() {
        return Err(miette::miette!("Bindings file has no replay block"));
    }

    let bindings = load_bindings(config, flag, HotkeyRuntime::new().with_clock(TokioClock))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;

    runtime
        .block_on(ReplayExecutor::new(&bindings).execute(&config.replay))
        .map_err(|e| miette::miette!("{:#}", e))?;

    let fired = bindings.take_fired();
    if json {
        for entry in &fired {
            println!("{}", serde_json::to_string(entry).into_diagnostic()?);
        }
    } else if fired.is_empty() {
        println!("Nothing fired");
    } else {
        for entry in &fired {
            println!("{}", entry);
        }
    }
    Ok(())
}

fn cmd_devices() -> miette::Result<()> {
    let keyboards = listen::list_keyboards().map_err(|e| miette::miette!("{:#}", e))?;

    if keyboards.is_empty() {
        println!("No readable keyboards found (are you in the 'input' group?)");
        return Ok(());
    }

    println!("Available keyboards:\n");
    for keyboard in &keyboards {
        println!("  {}", keyboard.name);
        println!("    Path: {}", keyboard.path.display());
        println!("    ID: {}", keyboard.vendor_product());
        println!();
    }
    Ok(())
}

fn cmd_listen(
    config: &BindingsConfig,
    flag: Option<Platform>,
    device: &Path,
    json: bool,
) -> miette::Result<()> {
    let bindings = load_bindings(config, flag, HotkeyRuntime::new().with_clock(TokioClock))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;

    runtime
        .block_on(listen::run(&bindings, device, json))
        .map_err(|e| miette::miette!("{:#}", e))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["hotkey-mux", "--platform", "mac", "parse", "Mod+K", "--json"])
            .expect("should parse");
        assert_eq!(cli.platform, Some(Platform::Mac));
        match cli.command {
            Commands::Parse { descriptor, json } => {
                assert_eq!(descriptor, "Mod+K");
                assert!(json);
            }
            other => panic!("Expected Parse command, got: {:?}", other),
        }

        assert!(Cli::try_parse_from(["hotkey-mux", "validate"]).is_err());
        assert!(Cli::try_parse_from(["hotkey-mux", "--platform", "amiga", "check"]).is_err());
    }

    #[test]
    fn test_resolve_platform_order() {
        let mut config = BindingsConfig::default();
        config.settings.platform = Some(Platform::Windows);

        assert_eq!(resolve_platform(Some(Platform::Mac), Some(&config)), Platform::Mac);
        assert_eq!(resolve_platform(None, Some(&config)), Platform::Windows);
        assert_eq!(resolve_platform(None, None), Platform::detect());
    }

    #[test]
    fn test_validate_reports_invalid() {
        let descriptors = vec!["Ctrl+S".to_string(), "Hyper+S".to_string()];
        let err = cmd_validate(&descriptors, Platform::Linux, false).expect_err("should fail");
        assert!(err.to_string().contains("1 of 2"));

        cmd_validate(&descriptors[..1], Platform::Linux, true).expect("should pass");
    }

    #[test]
    fn test_parse_command() {
        cmd_parse("mod+shift+k", Platform::Mac, false).expect("should parse");
        assert!(cmd_parse("Ctrl+", Platform::Linux, true).is_err());
    }

    #[test]
    fn test_check_and_replay_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
        write!(
            file,
            r#"
settings {{
    platform "linux"
}}
hotkey "Mod+S" action="save"
replay {{
    tap "Ctrl+S"
}}
"#
        )
        .expect("should write");

        let config = parse_config(file.path()).expect("should parse");
        cmd_check(file.path(), &config, None).expect("should check");
        cmd_replay(&config, None, true).expect("should replay");
    }

    #[test]
    fn test_replay_without_steps_fails() {
        let config = BindingsConfig::default();
        assert!(cmd_replay(&config, Some(Platform::Linux), false).is_err());
    }
}
