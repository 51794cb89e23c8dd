//! Scene keeper CLI - offline administration of presets and tool groups.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};
use std::sync::Arc;

use clap::Parser;
use console::style;
use serde::Serialize;

use sk::cancel::CancellationToken;
use sk::cli::{Cli, Commands, ConfigArgs, PresetsCommand, ToolsCommand};
use sk::config::{Settings, default_config_path};
use sk::error::{Result, ResultExt, SkError};
use sk::live::Disconnected;
use sk::logging::init_logging;
use sk::service::Service;
use sk::tool_groups::ToolGroupInfo;

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> bool {
        option_env!("VERGEN_GIT_DIRTY") == Some("true")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color || !io::stdout().is_terminal() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        None => {
            print_quick_start(cli);
            Ok(())
        }
        Some(Commands::Presets(cmd)) => cmd_presets(cli, cmd),
        Some(Commands::Tools(cmd)) => cmd_tools(cli, cmd),
        Some(Commands::Config(args)) => cmd_config(cli, args),
        Some(Commands::Version) => {
            cmd_version(cli);
            Ok(())
        }
    }
}

/// Opens the store named by the settings. No live system is attached.
fn open_service(cli: &Cli, cancel: &CancellationToken) -> Result<Service> {
    let settings = Settings::load(cli.config.as_deref())?;
    Service::open(Arc::new(Disconnected), &settings, cancel)
}

// === Quick Start ===

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    presets: [&'static str; 4],
    tools: [&'static str; 3],
    output_modes: [&'static str; 3],
}

fn print_quick_start(cli: &Cli) {
    if cli.use_json() {
        output_json(
            cli,
            &RobotQuickStart {
                tool: "sk",
                version: build_info::VERSION,
                description: "Scene preset and tool-group administration",
                presets: [
                    "sk presets list [--scene SCENE]",
                    "sk presets show NAME",
                    "sk presets rename OLD NEW",
                    "sk presets delete NAME",
                ],
                tools: [
                    "sk tools list [--all]",
                    "sk tools show [GROUP] [--tools]",
                    "sk tools set GROUP on|off [--no-persist]",
                ],
                output_modes: [
                    "--format=text (default)",
                    "--robot or --format=json",
                    "--format=json-compact",
                ],
            },
        );
        return;
    }

    println!(
        "{} {} - scene preset and tool-group administration\n",
        style("sk").bold().cyan(),
        build_info::VERSION
    );
    println!("{}", style("QUICK START").bold().underlined());
    println!();
    println!("  {}  List presets", style("sk presets list").green());
    println!("  {}  Show a preset", style("sk presets show NAME").green());
    println!("  {}  List enabled tool groups", style("sk tools list").green());
    println!("  {}  Disable a group", style("sk tools set Audio off").green());
    println!();
    println!("Run {} for full help", style("sk --help").yellow());
}

// === Presets ===

fn cmd_presets(cli: &Cli, cmd: &PresetsCommand) -> Result<()> {
    let cancel = CancellationToken::new();
    let service = open_service(cli, &cancel)?;

    match cmd {
        PresetsCommand::List { scene } => {
            let presets = service.list_presets(scene.as_deref(), &cancel)?;
            if cli.use_json() {
                output_json(cli, &presets);
            } else if presets.is_empty() {
                println!("No presets saved");
            } else {
                for p in &presets {
                    println!(
                        "{}  {}  {}",
                        style(&p.name).bold(),
                        style(&p.scene_name).cyan(),
                        style(p.created_at.to_rfc3339()).dim()
                    );
                }
            }
        }
        PresetsCommand::Show { name } => {
            let preset = service.get_preset_details(name, &cancel)?;
            if cli.use_json() {
                output_json(cli, &preset);
            } else {
                println!(
                    "{} (scene {})",
                    style(&preset.name).bold(),
                    style(&preset.scene_name).cyan()
                );
                println!("created: {}", preset.created_at.to_rfc3339());
                for source in &preset.sources {
                    let state = if source.visible {
                        style("visible").green()
                    } else {
                        style("hidden").dim()
                    };
                    println!("  {:<24} {state}", source.name);
                }
            }
        }
        PresetsCommand::Rename { old_name, new_name } => {
            service.rename_preset(old_name, new_name, &cancel)?;
            if cli.use_json() {
                output_json(
                    cli,
                    &serde_json::json!({ "ok": true, "old_name": old_name, "new_name": new_name }),
                );
            } else {
                println!("Renamed '{old_name}' to '{new_name}'");
            }
        }
        PresetsCommand::Delete { name } => {
            service.delete_preset(name, &cancel)?;
            if cli.use_json() {
                output_json(cli, &serde_json::json!({ "ok": true, "deleted": name }));
            } else {
                println!("Deleted '{name}'");
            }
        }
    }
    Ok(())
}

// === Tool groups ===

fn cmd_tools(cli: &Cli, cmd: &ToolsCommand) -> Result<()> {
    let cancel = CancellationToken::new();
    let service = open_service(cli, &cancel)?;

    match cmd {
        ToolsCommand::List { all } => print_groups(cli, &service.list_tool_groups(*all)),
        ToolsCommand::Show { group, tools } => {
            let groups = service.get_tool_config(group.as_deref(), *tools)?;
            print_groups(cli, &groups);
        }
        ToolsCommand::Set {
            group,
            state,
            no_persist,
        } => {
            let outcome =
                service.set_tool_config(group, state.enabled(), !no_persist, &cancel)?;
            if cli.use_json() {
                output_json(cli, &outcome);
            } else {
                let label = |on: bool| if on { "on" } else { "off" };
                println!(
                    "{}: {} -> {} ({} tools)",
                    style(outcome.group).bold(),
                    label(outcome.previous_state),
                    label(outcome.new_state),
                    outcome.tools_affected.len()
                );
                if let Some(err) = &outcome.persist_error {
                    eprintln!("{}: not persisted: {err}", style("Warning").yellow());
                }
            }
        }
    }
    Ok(())
}

fn print_groups(cli: &Cli, groups: &[ToolGroupInfo]) {
    if cli.use_json() {
        output_json(cli, &groups);
        return;
    }
    for info in groups {
        let state = if info.enabled {
            style("enabled").green()
        } else {
            style("disabled").red()
        };
        println!(
            "{:<8} {state:<8} {:>2} tools  {}",
            style(info.name).bold(),
            info.tool_count,
            style(info.description).dim()
        );
        if let Some(tools) = &info.tools {
            for tool in tools {
                println!("           {tool}");
            }
        }
    }
}

// === Config ===

fn cmd_config(cli: &Cli, args: &ConfigArgs) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let path = match &settings.origin {
        Some(path) => path.clone(),
        None => cli.config.clone().map_or_else(default_config_path, Ok)?,
    };

    if args.path {
        if cli.use_json() {
            output_json(cli, &serde_json::json!({ "path": path }));
        } else {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let db_path = settings.db_path()?;
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "path": path,
                "loaded": settings.origin.is_some(),
                "db_path": db_path,
                "settings": settings,
            }),
        );
    } else {
        let body = toml::to_string_pretty(&settings).with_context(|| "Failed to render settings")?;
        let source = if settings.origin.is_some() {
            "loaded"
        } else {
            "defaults, file not found"
        };
        println!("# {} ({source})", path.display());
        println!("# database: {}", db_path.display());
        print!("{body}");
    }
    Ok(())
}

fn cmd_version(cli: &Cli) {
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "version": build_info::VERSION,
                "git_sha": build_info::git_sha(),
                "git_dirty": build_info::git_dirty(),
                "build_timestamp": build_info::build_timestamp(),
                "rustc_version": build_info::rustc_semver(),
                "target": build_info::target(),
            }),
        );
    } else {
        println!("sk {}", build_info::VERSION);
        println!(
            "git: {}{}",
            build_info::git_sha(),
            if build_info::git_dirty() { " (dirty)" } else { "" }
        );
        println!("built: {}", build_info::build_timestamp());
        println!("rustc: {}", build_info::rustc_semver());
        println!("target: {}", build_info::target());
    }
}

// === Output ===

fn output_json<T: Serialize + ?Sized>(cli: &Cli, data: &T) {
    let rendered = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

fn output_error(cli: &Cli, error: &SkError) {
    if cli.use_json() {
        let json = serde_json::json!({
            "ok": false,
            "error": {
                "kind": error.kind(),
                "message": error.to_string(),
                "suggestion": error.suggestion(),
                "recoverable": error.is_user_recoverable(),
            },
        });
        eprintln!("{json}");
    } else {
        eprintln!("{}: {}", style("Error").red().bold(), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{}: {}", style("Hint").yellow(), suggestion);
        }
    }
}
