mod app;
mod config;
mod core;
mod event;
mod ipc;
mod platform;
#[cfg(windows)]
mod win32;

use std::path::PathBuf;

use anyhow::Result;
use argh::FromArgs;
use ipc::IpcClient;
use madori_ipc::{Command, Response};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Madori - rule-driven window arranger
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    InitConfig(InitConfigCmd),
    Pause(PauseCmd),
    Resume(ResumeCmd),
    Rescan(RescanCmd),
    Reload(ReloadCmd),
    Status(StatusCmd),
    Tracked(TrackedCmd),
    Quit(QuitCmd),
}

/// Start the madori daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {
    /// path to the settings file (default: the user config dir)
    #[argh(option)]
    config: Option<PathBuf>,
}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Write a commented default settings file
#[derive(FromArgs)]
#[argh(subcommand, name = "init-config")]
struct InitConfigCmd {
    /// where to write the file (default: the user config dir)
    #[argh(option)]
    config: Option<PathBuf>,
}

/// Pause automation (events are ignored until resume)
#[derive(FromArgs)]
#[argh(subcommand, name = "pause")]
struct PauseCmd {}

/// Resume automation
#[derive(FromArgs)]
#[argh(subcommand, name = "resume")]
struct ResumeCmd {}

/// Re-evaluate every window currently on screen
#[derive(FromArgs)]
#[argh(subcommand, name = "rescan")]
struct RescanCmd {}

/// Reload the settings file
#[derive(FromArgs)]
#[argh(subcommand, name = "reload")]
struct ReloadCmd {}

/// Show daemon status
#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
struct StatusCmd {}

/// List tracked windows and their matched rules
#[derive(FromArgs)]
#[argh(subcommand, name = "tracked")]
struct TrackedCmd {}

/// Quit the madori daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["madori", "--help"];
            match Cli::from_args(&args[..1], &args[1..]) {
                Ok(_) => {}
                Err(e) => {
                    println!("{}", e.output);
                }
            }
            Ok(())
        }
        Some(SubCommand::Start(cmd)) => {
            let config_path = cmd.config.unwrap_or_else(config::default_path);
            run_daemon(config_path)
        }
        Some(SubCommand::Version(_)) => {
            println!("madori {}", VERSION);
            Ok(())
        }
        Some(SubCommand::InitConfig(cmd)) => app::init_config(cmd.config),
        Some(subcmd) => run_cli(subcmd),
    }
}

#[cfg(windows)]
fn run_daemon(config_path: PathBuf) -> Result<()> {
    app::App::new(
        win32::Win32WindowSystem::new(),
        win32::Win32Manipulator::new(),
        win32::Win32Desktops::new(),
        win32::WinEventSource::new(),
        config_path,
    )
    .run()
}

#[cfg(not(windows))]
fn run_daemon(_config_path: PathBuf) -> Result<()> {
    anyhow::bail!("the madori daemon has no native window backend for this platform")
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd);
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Status { status } => {
            println!("Paused: {}", status.paused);
            println!("Tracked windows: {}", status.tracked_count);
            println!("Rules: {}", status.rule_count);
            println!("Ignore rules: {}", status.ignore_count);
            println!("Monitors: {}", status.monitor_count);
        }
        Response::Tracked { windows } => {
            for w in windows {
                println!("{:#x}: {}", w.window, w.rule);
            }
        }
    }

    Ok(())
}

fn to_command(subcmd: SubCommand) -> Command {
    match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) | SubCommand::InitConfig(_) => {
            unreachable!("handled in main")
        }
        SubCommand::Pause(_) => Command::Pause,
        SubCommand::Resume(_) => Command::Resume,
        SubCommand::Rescan(_) => Command::Rescan,
        SubCommand::Reload(_) => Command::Reload,
        SubCommand::Status(_) => Command::Status,
        SubCommand::Tracked(_) => Command::ListTracked,
        SubCommand::Quit(_) => Command::Quit,
    }
}
