use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Automation control
    Pause,
    Resume,
    Rescan,

    // Configuration
    Reload,

    // Queries
    Status,
    ListTracked,

    // Control
    Quit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    Status { status: StatusInfo },
    Tracked { windows: Vec<TrackedInfo> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub paused: bool,
    pub tracked_count: usize,
    pub rule_count: usize,
    pub ignore_count: usize,
    pub monitor_count: usize,
}

/// One tracker entry. `rule` is the matched rule name, or `"ignored"` for
/// windows suppressed by an ignore rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedInfo {
    pub window: u64,
    pub rule: String,
}
