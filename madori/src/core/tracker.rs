use std::collections::{HashMap, HashSet};

use super::WindowId;

/// Automation state of one tracked window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackState {
    /// Last matched rule, plus the generation stamped when its apply task
    /// was scheduled. A task whose generation no longer matches has been
    /// superseded and must not touch the window.
    Matched { rule: String, generation: u64 },
    Ignored,
}

/// The authoritative record of per-window automation state. Each window
/// identity appears at most once.
#[derive(Debug, Default)]
pub struct WindowTracker {
    entries: HashMap<WindowId, TrackState>,
}

impl WindowTracker {
    pub fn contains(&self, window: WindowId) -> bool {
        self.entries.contains_key(&window)
    }

    pub fn rule_name(&self, window: WindowId) -> Option<&str> {
        match self.entries.get(&window) {
            Some(TrackState::Matched { rule, .. }) => Some(rule),
            _ => None,
        }
    }

    pub fn track(&mut self, window: WindowId, rule: String, generation: u64) {
        self.entries
            .insert(window, TrackState::Matched { rule, generation });
    }

    pub fn mark_ignored(&mut self, window: WindowId) {
        self.entries.insert(window, TrackState::Ignored);
    }

    pub fn remove(&mut self, window: WindowId) -> Option<TrackState> {
        self.entries.remove(&window)
    }

    /// Whether `generation` is still the live generation for `window`.
    pub fn is_current(&self, window: WindowId, generation: u64) -> bool {
        matches!(
            self.entries.get(&window),
            Some(TrackState::Matched { generation: g, .. }) if *g == generation
        )
    }

    /// Drop entries whose identity is not in `live`. Returns how many were
    /// removed.
    pub fn retain_live(&mut self, live: &HashSet<WindowId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(id));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WindowId, &TrackState)> {
        self.entries.iter()
    }
}
