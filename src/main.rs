use clap::{Parser, Subcommand};
use learnswitch::config::{self, Config};
use learnswitch::openflow::SwitchMessage;
use learnswitch::replay::{self, Trace};
use learnswitch::telemetry::init_logging;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "learnswitch")]
#[command(about = "L2 learning switch logic for an OpenFlow controller")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Replay a recorded event trace through the controller
    Replay {
        /// Path to config.toml (built-in defaults if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to the trace file
        #[arg(short, long)]
        trace: PathBuf,

        /// Print metrics after the replay
        #[arg(long)]
        metrics: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Check config.toml and report problems
    Validate {
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the effective configuration with defaults filled in
    Show {
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config { action } => {
            init_logging(None);
            match action {
                ConfigAction::Validate { config } => cmd_config_validate(&config),
                ConfigAction::Show { config } => cmd_config_show(&config),
            }
        }
        Commands::Replay {
            config,
            trace,
            metrics,
        } => cmd_replay(config.as_deref(), &trace, metrics),
    };

    if let Err(e) = result {
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

fn cmd_config_validate(path: &Path) -> Result<(), String> {
    println!("Validating {}...", path.display());
    let config = config::load(path).map_err(|e| e.to_string())?;

    let result = config::validate(&config);
    result.print_diagnostics();
    if result.has_errors() {
        return Err(format!(
            "{} error(s) in {}",
            result.errors.len(),
            path.display()
        ));
    }

    println!(
        "Configuration is valid ({} warning(s))",
        result.warnings.len()
    );
    Ok(())
}

fn cmd_config_show(path: &Path) -> Result<(), String> {
    let config = config::load(path).map_err(|e| e.to_string())?;
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| format!("Failed to render config: {}", e))?;
    print!("{}", rendered);
    Ok(())
}

fn cmd_replay(config_path: Option<&Path>, trace_path: &Path, show_metrics: bool) -> Result<(), String> {
    let config = match config_path {
        Some(path) => config::load(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    init_logging(Some(&config.logging));

    let validation = config::validate(&config);
    if validation.has_errors() {
        validation.print_diagnostics();
        return Err("invalid configuration".to_string());
    }

    let trace = Trace::load(trace_path).map_err(|e| e.to_string())?;
    let report = replay::run(&config, trace).map_err(|e| e.to_string())?;

    for out in &report.outbound {
        println!("{} {}", out.dpid, describe(&out.message));
    }

    if show_metrics {
        println!();
        for (name, value) in &report.metrics {
            println!("{} {}", name, value);
        }
    }
    Ok(())
}

fn describe(message: &SwitchMessage) -> String {
    match message {
        SwitchMessage::PacketOut(out) if out.is_drop() => {
            format!("DROP in_port={}", out.in_port)
        }
        SwitchMessage::PacketOut(out) => {
            let ports: Vec<String> = out.actions.iter().map(|a| format!("{:?}", a)).collect();
            format!("PACKET_OUT in_port={} actions=[{}]", out.in_port, ports.join(","))
        }
        SwitchMessage::FlowMod(flow_mod) => {
            let ports: Vec<String> = flow_mod
                .actions
                .iter()
                .map(|a| format!("{:?}", a))
                .collect();
            format!(
                "FLOW_MOD match[{}] actions=[{}] priority={} idle={} hard={}",
                flow_mod.flow_match,
                ports.join(","),
                flow_mod.priority,
                flow_mod.idle_timeout,
                flow_mod.hard_timeout
            )
        }
    }
}
