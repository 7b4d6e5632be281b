use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use madori_ipc::{StatusInfo, TrackedInfo};

use super::{Action, GeometryResolver, RuleSet, TrackState, WindowId, WindowTracker};
use crate::event::{EventKind, WindowEvent};
use crate::platform::{
    DesktopManager, PlatformError, WindowAttributes, WindowManipulator, WindowSystem,
};

/// Engine behavior toggles taken from the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    pub recheck_on_title_change: bool,
}

/// One scheduled unit of window mutation work. Carries the generation the
/// tracker held when it was scheduled; a task whose generation has moved on
/// was superseded by a newer match and must not touch the window.
#[derive(Debug, Clone)]
pub struct ApplyTask {
    pub window: WindowId,
    pub rule: String,
    pub generation: u64,
    pub action: Action,
}

/// Everything guarded by the serialized mutation section. The lock is held
/// for one event or one apply step, never across an await point.
struct EngineState {
    ruleset: Arc<RuleSet>,
    resolver: GeometryResolver,
    options: EngineOptions,
    tracker: WindowTracker,
    next_generation: u64,
}

impl EngineState {
    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

pub struct Engine<S, M, D> {
    system: Arc<S>,
    manipulator: Arc<M>,
    desktops: Arc<D>,
    state: Mutex<EngineState>,
    paused: AtomicBool,
}

impl<S, M, D> Engine<S, M, D>
where
    S: WindowSystem,
    M: WindowManipulator,
    D: DesktopManager,
{
    pub fn new(
        system: Arc<S>,
        manipulator: Arc<M>,
        desktops: Arc<D>,
        ruleset: RuleSet,
        resolver: GeometryResolver,
        options: EngineOptions,
    ) -> Self {
        Self {
            system,
            manipulator,
            desktops,
            state: Mutex::new(EngineState {
                ruleset: Arc::new(ruleset),
                resolver,
                options,
                tracker: WindowTracker::default(),
                next_generation: 0,
            }),
            paused: AtomicBool::new(false),
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        tracing::info!("automation paused");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        tracing::info!("automation resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Atomically replace the rule set, monitor snapshot, and options.
    pub fn apply_settings(
        &self,
        ruleset: RuleSet,
        resolver: GeometryResolver,
        options: EngineOptions,
    ) {
        let mut state = self.state.lock();
        tracing::info!(
            "applied settings: {} ignore rules, {} rules, {} monitors",
            ruleset.ignores.len(),
            ruleset.rules.len(),
            resolver.monitor_count()
        );
        state.ruleset = Arc::new(ruleset);
        state.resolver = resolver;
        state.options = options;
    }

    /// Forget all per-window state so the next events (or a rescan)
    /// re-evaluate every window from scratch.
    pub fn reset_tracking(&self) {
        let mut state = self.state.lock();
        state.tracker.clear();
    }

    /// Synthesize Created events for every currently enumerable window.
    /// Returns the apply tasks to schedule.
    pub fn scan_existing(&self) -> Vec<ApplyTask> {
        let ids = match self.system.list_windows() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("window enumeration failed, rescan skipped: {}", e);
                return Vec::new();
            }
        };

        ids.into_iter()
            .filter_map(|id| self.handle_event(&WindowEvent::new(id, EventKind::Created)))
            .collect()
    }

    /// Synchronous event intake. Evaluates ignore rules, then action rules,
    /// updates the tracker, and returns an apply task when a rule newly
    /// matched. Must stay fast: the caller is the event loop.
    pub fn handle_event(&self, event: &WindowEvent) -> Option<ApplyTask> {
        if self.is_paused() {
            return None;
        }

        let mut state = self.state.lock();

        if event.kind == EventKind::TitleChanged && !state.options.recheck_on_title_change {
            return None;
        }

        // Duplicate creation events for an already tracked window carry no
        // new information.
        if matches!(event.kind, EventKind::Created | EventKind::Shown)
            && state.tracker.contains(event.window)
        {
            return None;
        }

        let attrs = match self.system.window_attributes(event.window) {
            Ok(attrs) => attrs,
            Err(e) => {
                tracing::debug!("window {:#x} not evaluated: {}", event.window, e);
                return None;
            }
        };
        if !attrs.is_visible || attrs.is_minimized || attrs.title.is_empty() {
            return None;
        }

        let ruleset = state.ruleset.clone();
        let process = attrs.process.as_deref();
        let class = attrs.class_name.as_deref();

        if let Some(ignore) = ruleset.matching_ignore(&attrs.title, process, class) {
            tracing::info!(
                "ignore rule {:?} matched window {:#x} ({:?})",
                ignore.name,
                event.window,
                attrs.title
            );
            state.tracker.mark_ignored(event.window);
            return None;
        }

        if let Some(rule) = ruleset.matching_rule(&attrs.title, process, class) {
            if event.kind == EventKind::TitleChanged
                && state.tracker.rule_name(event.window) == Some(rule.name.as_str())
            {
                // Still the same rule; re-applying on every title keystroke
                // would fight the user.
                return None;
            }

            let generation = state.bump_generation();
            state
                .tracker
                .track(event.window, rule.name.clone(), generation);
            tracing::info!(
                "rule {:?} matched window {:#x} ({:?})",
                rule.name,
                event.window,
                attrs.title
            );
            return Some(ApplyTask {
                window: event.window,
                rule: rule.name.clone(),
                generation,
                action: rule.action.clone(),
            });
        }

        if state.tracker.remove(event.window).is_some() {
            tracing::info!(
                "window {:#x} ({:?}) no longer matches any rule, untracked",
                event.window,
                attrs.title
            );
        }
        None
    }

    /// Asynchronous apply step. Waits out the configured delay, re-validates
    /// the window, then mutates it under the serialized section.
    pub async fn run_apply(&self, task: ApplyTask) {
        if let Some(delay) = task.action.execution_delay {
            tracing::debug!(
                "delaying rule {:?} for window {:#x} by {:?}",
                task.rule,
                task.window,
                delay
            );
            tokio::time::sleep(delay).await;

            if !self.window_still_eligible(task.window) {
                tracing::warn!(
                    "window {:#x} disappeared during delay of rule {:?}",
                    task.window,
                    task.rule
                );
                self.untrack_if_current(&task);
                return;
            }
        }

        let mut state = self.state.lock();

        if !state.tracker.is_current(task.window, task.generation) {
            tracing::debug!(
                "apply of rule {:?} for window {:#x} superseded, skipping",
                task.rule,
                task.window
            );
            return;
        }

        // The window can vanish between the delay and lock acquisition.
        let attrs = match self.system.window_attributes(task.window) {
            Ok(attrs) if attrs.is_visible && !attrs.is_minimized => attrs,
            _ => {
                tracing::warn!(
                    "window {:#x} no longer valid, dropping rule {:?}",
                    task.window,
                    task.rule
                );
                state.tracker.remove(task.window);
                return;
            }
        };

        if let Some(desktop) = task.action.target_desktop {
            if let Err(e) = self.move_to_desktop(task.window, desktop) {
                tracing::warn!(
                    "moving window {:#x} to desktop {} failed: {}",
                    task.window,
                    desktop,
                    e
                );
                state.tracker.remove(task.window);
                return;
            }
        }

        let result = if task.action.maximize {
            tracing::info!("maximizing window {:#x} (rule {:?})", task.window, task.rule);
            self.manipulator.maximize(task.window)
        } else if task.action.minimize {
            tracing::info!("minimizing window {:#x} (rule {:?})", task.window, task.rule);
            self.manipulator.minimize(task.window)
        } else if task.action.has_geometry() {
            self.apply_geometry(&task, &attrs, &state.resolver)
        } else {
            Ok(())
        };

        if let Err(e) = result {
            tracing::warn!(
                "applying rule {:?} to window {:#x} failed: {}",
                task.rule,
                task.window,
                e
            );
            state.tracker.remove(task.window);
        }
    }

    fn apply_geometry(
        &self,
        task: &ApplyTask,
        attrs: &WindowAttributes,
        resolver: &GeometryResolver,
    ) -> Result<(), PlatformError> {
        let current = attrs.frame;
        let target = resolver.resolve(&task.action, current);

        if target.width != current.width || target.height != current.height {
            tracing::info!(
                "resizing window {:#x} to {}x{} (rule {:?})",
                task.window,
                target.width,
                target.height,
                task.rule
            );
            self.manipulator
                .resize_window(task.window, target.width, target.height)?;
        }
        if target.x != current.x || target.y != current.y {
            tracing::info!(
                "moving window {:#x} to ({}, {}) (rule {:?})",
                task.window,
                target.x,
                target.y,
                task.rule
            );
            self.manipulator.move_window(task.window, target.x, target.y)?;
        }
        Ok(())
    }

    fn move_to_desktop(&self, window: WindowId, desktop: usize) -> Result<(), PlatformError> {
        let count = match self.desktops.desktop_count() {
            Ok(count) => count,
            Err(e) => {
                // Environment problem, not a window problem: skip the
                // desktop step and let the rest of the action proceed.
                tracing::warn!("virtual desktop enumeration failed: {}", e);
                return Ok(());
            }
        };

        if !(1..=count).contains(&desktop) {
            tracing::warn!(
                "target desktop {} out of range 1..={}, skipping",
                desktop,
                count
            );
            return Ok(());
        }

        tracing::info!("moving window {:#x} to desktop {}", window, desktop);
        self.desktops.move_to_desktop(window, desktop)
    }

    fn window_still_eligible(&self, window: WindowId) -> bool {
        match self.system.window_attributes(window) {
            Ok(attrs) => attrs.is_visible && !attrs.is_minimized,
            Err(_) => false,
        }
    }

    fn untrack_if_current(&self, task: &ApplyTask) {
        let mut state = self.state.lock();
        if state.tracker.is_current(task.window, task.generation) {
            state.tracker.remove(task.window);
        }
    }

    /// Periodic cleanup: drop tracker entries whose window no longer exists.
    /// Aborts (keeping the map intact) when enumeration itself fails.
    pub fn sweep(&self) {
        let live: HashSet<WindowId> = match self.system.list_windows() {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                tracing::warn!("cleanup sweep skipped, enumeration failed: {}", e);
                return;
            }
        };

        let mut state = self.state.lock();
        let removed = state.tracker.retain_live(&live);
        if removed > 0 {
            tracing::debug!("cleanup removed {} stale tracker entries", removed);
        }
    }

    pub fn status(&self) -> StatusInfo {
        let state = self.state.lock();
        StatusInfo {
            paused: self.is_paused(),
            tracked_count: state.tracker.len(),
            rule_count: state.ruleset.rules.len(),
            ignore_count: state.ruleset.ignores.len(),
            monitor_count: state.resolver.monitor_count(),
        }
    }

    pub fn tracked_windows(&self) -> Vec<TrackedInfo> {
        let state = self.state.lock();
        let mut windows: Vec<TrackedInfo> = state
            .tracker
            .iter()
            .map(|(window, track)| TrackedInfo {
                window: *window,
                rule: match track {
                    TrackState::Matched { rule, .. } => rule.clone(),
                    TrackState::Ignored => "ignored".to_string(),
                },
            })
            .collect();
        windows.sort_by_key(|w| w.window);
        windows
    }

    #[cfg(test)]
    pub fn tracked_rule(&self, window: WindowId) -> Option<String> {
        self.state
            .lock()
            .tracker
            .rule_name(window)
            .map(|s| s.to_string())
    }

    #[cfg(test)]
    pub fn is_tracked(&self, window: WindowId) -> bool {
        self.state.lock().tracker.contains(window)
    }
}
