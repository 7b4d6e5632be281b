use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use madori_ipc::{Command, Response};

use crate::config::{self, Settings};
use crate::core::{ApplyTask, Engine, GeometryResolver};
use crate::event::WindowEvent;
use crate::ipc::IpcServer;
use crate::platform::{DesktopManager, EventSource, WindowManipulator, WindowSystem};

type EngineHandle<S, M, D> = Arc<Engine<S, M, D>>;

pub struct App<S, M, D, E> {
    system: Arc<S>,
    manipulator: Arc<M>,
    desktops: Arc<D>,
    events: E,
    config_path: PathBuf,
}

impl<S, M, D, E> App<S, M, D, E>
where
    S: WindowSystem,
    M: WindowManipulator,
    D: DesktopManager,
    E: EventSource,
{
    pub fn new(system: S, manipulator: M, desktops: D, events: E, config_path: PathBuf) -> Self {
        Self {
            system: Arc::new(system),
            manipulator: Arc::new(manipulator),
            desktops: Arc::new(desktops),
            events,
            config_path,
        }
    }

    pub fn run(self) -> Result<()> {
        let settings = Settings::load(&self.config_path).with_context(|| {
            format!(
                "failed to load settings from {} (run `madori init-config` to create one)",
                self.config_path.display()
            )
        })?;

        // RUST_LOG wins over the configured level.
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(&settings.global.log_level)),
            )
            .init();

        tracing::info!(
            "madori starting: {} ignore rules, {} rules from {}",
            settings.ruleset.ignores.len(),
            settings.ruleset.rules.len(),
            self.config_path.display()
        );
        tracing::debug!(
            "cleanup every {:?}, event-source poll fallback {:?}",
            settings.global.cleanup_interval,
            settings.global.polling_interval
        );

        let monitors = self
            .system
            .monitors()
            .context("monitor enumeration failed")?;
        let resolver = GeometryResolver::new(monitors, settings.global.monitor_offsets.clone());
        let engine = Arc::new(Engine::new(
            self.system.clone(),
            self.manipulator.clone(),
            self.desktops.clone(),
            settings.ruleset.clone(),
            resolver,
            settings.engine_options(),
        ));

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run_async(engine, settings))
    }

    async fn run_async(&self, engine: EngineHandle<S, M, D>, mut settings: Settings) -> Result<()> {
        let (event_tx, mut event_rx) = mpsc::channel::<WindowEvent>(256);
        self.events
            .start(event_tx)
            .context("failed to start event source")?;

        let (ipc_tx, mut ipc_rx) = mpsc::channel::<(Command, mpsc::Sender<Response>)>(64);
        let ipc_server = IpcServer::new(ipc_tx);
        tokio::spawn(async move {
            if let Err(e) = ipc_server.run().await {
                tracing::error!("IPC server error: {}", e);
            }
        });

        if settings.global.apply_on_startup {
            for task in engine.scan_existing() {
                spawn_apply(&engine, task);
            }
        } else {
            tracing::info!("apply_on_startup disabled, leaving existing windows alone");
        }

        let mut cleanup = tokio::time::interval(settings.global.cleanup_interval);
        // The first interval tick fires immediately; swallow it so the first
        // sweep happens one full period after startup.
        cleanup.tick().await;

        loop {
            tokio::select! {
                Some(event) = event_rx.recv() => {
                    if let Some(task) = engine.handle_event(&event) {
                        spawn_apply(&engine, task);
                    }
                }
                Some((cmd, resp_tx)) = ipc_rx.recv() => {
                    let quit = matches!(cmd, Command::Quit);
                    let interval_before = settings.global.cleanup_interval;

                    let response = self.handle_command(&engine, &mut settings, cmd);
                    let _ = resp_tx.send(response).await;

                    if settings.global.cleanup_interval != interval_before {
                        cleanup = tokio::time::interval(settings.global.cleanup_interval);
                        cleanup.tick().await;
                    }
                    if quit {
                        tracing::info!("quit command received");
                        break;
                    }
                }
                _ = cleanup.tick() => {
                    let engine = engine.clone();
                    tokio::spawn(async move { engine.sweep() });
                }
            }
        }

        Ok(())
    }

    fn handle_command(
        &self,
        engine: &EngineHandle<S, M, D>,
        settings: &mut Settings,
        cmd: Command,
    ) -> Response {
        match cmd {
            Command::Pause => {
                engine.pause();
                Response::Ok
            }
            Command::Resume => {
                engine.resume();
                if settings.global.apply_on_resume {
                    rescan(engine);
                } else {
                    tracing::info!("apply_on_resume disabled, only new windows will be evaluated");
                }
                Response::Ok
            }
            Command::Rescan => {
                rescan(engine);
                Response::Ok
            }
            Command::Reload => match self.reload(engine, settings) {
                Ok(()) => Response::Ok,
                Err(e) => {
                    tracing::error!("reload failed, keeping previous settings: {:#}", e);
                    Response::Error {
                        message: format!("{:#}", e),
                    }
                }
            },
            Command::Status => Response::Status {
                status: engine.status(),
            },
            Command::ListTracked => Response::Tracked {
                windows: engine.tracked_windows(),
            },
            Command::Quit => Response::Ok,
        }
    }

    /// Reload settings and monitors and swap them into the engine atomically.
    /// Any failure keeps the previous snapshot; the engine keeps running.
    fn reload(&self, engine: &EngineHandle<S, M, D>, settings: &mut Settings) -> Result<()> {
        let fresh = Settings::load(&self.config_path)?;
        let monitors = self
            .system
            .monitors()
            .context("monitor enumeration failed")?;

        let resolver = GeometryResolver::new(monitors, fresh.global.monitor_offsets.clone());
        engine.apply_settings(fresh.ruleset.clone(), resolver, fresh.engine_options());
        tracing::info!("settings reloaded from {}", self.config_path.display());

        if fresh.global.apply_on_reload {
            rescan(engine);
        }

        *settings = fresh;
        Ok(())
    }
}

fn spawn_apply<S, M, D>(engine: &EngineHandle<S, M, D>, task: ApplyTask)
where
    S: WindowSystem,
    M: WindowManipulator,
    D: DesktopManager,
{
    let engine = engine.clone();
    tokio::spawn(async move { engine.run_apply(task).await });
}

/// Forget all tracked windows and re-evaluate everything currently on
/// screen, as if each window had just been created.
fn rescan<S, M, D>(engine: &EngineHandle<S, M, D>)
where
    S: WindowSystem,
    M: WindowManipulator,
    D: DesktopManager,
{
    engine.reset_tracking();
    let tasks = engine.scan_existing();
    tracing::info!("rescan scheduled {} apply tasks", tasks.len());
    for task in tasks {
        spawn_apply(engine, task);
    }
}

/// Write the default settings file, creating parent directories.
pub fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(config::default_path);
    config::write_default(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
