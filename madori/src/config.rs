use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::{
    parse_size_value, Action, AnchorPoint, Condition, ConditionGroup, EdgeInsets, EngineOptions,
    IgnoreRule, Logic, MonitorOffsets, MoveTarget, Pattern, ResizeSpec, Rule, RuleCondition,
    RuleSet, SizeValue,
};

pub const DEFAULT_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Default location: `<config dir>/madori/settings.toml`.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("madori")
        .join(DEFAULT_FILE_NAME)
}

// Raw serde forms. Unknown fields are rejected so typos surface at load
// instead of silently disabling a rule.

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cleanup_interval() -> u64 {
    300
}

fn default_polling_interval() -> u64 {
    1000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default)]
    global: RawGlobal,
    #[serde(default, rename = "ignore")]
    ignores: Vec<RawIgnore>,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGlobal {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_true")]
    apply_on_startup: bool,
    #[serde(default = "default_true")]
    apply_on_reload: bool,
    #[serde(default)]
    apply_on_resume: bool,
    #[serde(default)]
    recheck_on_title_change: bool,
    #[serde(default = "default_cleanup_interval")]
    cleanup_interval_seconds: u64,
    #[serde(default = "default_polling_interval")]
    polling_interval: u64,
    #[serde(default)]
    monitor_offsets: HashMap<String, RawOffsets>,
}

impl Default for RawGlobal {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            apply_on_startup: true,
            apply_on_reload: true,
            apply_on_resume: false,
            recheck_on_title_change: false,
            cleanup_interval_seconds: default_cleanup_interval(),
            polling_interval: default_polling_interval(),
            monitor_offsets: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct RawOffsets {
    top: i32,
    bottom: i32,
    left: i32,
    right: i32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum RawLogic {
    And,
    Or,
}

impl From<RawLogic> for Logic {
    fn from(raw: RawLogic) -> Self {
        match raw {
            RawLogic::And => Logic::And,
            RawLogic::Or => Logic::Or,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCondition {
    title: Option<String>,
    process: Option<String>,
    #[serde(rename = "class")]
    class_name: Option<String>,
    #[serde(default)]
    case_sensitive: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIgnore {
    name: String,
    #[serde(default = "default_ignore_logic")]
    logic: RawLogic,
    conditions: Vec<RawCondition>,
}

fn default_ignore_logic() -> RawLogic {
    RawLogic::Or
}

fn default_group_logic() -> RawLogic {
    RawLogic::And
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    name: String,
    condition: RawRuleCondition,
    action: RawAction,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRuleCondition {
    Group {
        #[serde(default = "default_group_logic")]
        logic: RawLogic,
        conditions: Vec<RawCondition>,
    },
    Single(RawCondition),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMoveTo {
    Anchor(AnchorPoint),
    Coords { x: RawValue, y: RawValue },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResize {
    #[serde(default, alias = "w")]
    width: Option<RawValue>,
    #[serde(default, alias = "h")]
    height: Option<RawValue>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct RawOffset {
    x: i32,
    y: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAction {
    #[serde(default)]
    anchor: AnchorPoint,
    #[serde(default)]
    move_to: Option<RawMoveTo>,
    #[serde(default)]
    resize_to: Option<RawResize>,
    #[serde(default)]
    offset: Option<RawOffset>,
    #[serde(default)]
    target_monitor: Option<usize>,
    #[serde(default)]
    maximize: bool,
    #[serde(default)]
    minimize: bool,
    /// Milliseconds.
    #[serde(default)]
    execution_delay: Option<u64>,
    #[serde(default)]
    target_desktop: Option<usize>,
}

// Validated settings.

#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub log_level: String,
    pub apply_on_startup: bool,
    pub apply_on_reload: bool,
    pub apply_on_resume: bool,
    pub recheck_on_title_change: bool,
    pub cleanup_interval: Duration,
    pub polling_interval: Duration,
    pub monitor_offsets: MonitorOffsets,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub global: GlobalOptions,
    pub ruleset: RuleSet,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(DEFAULT_FILE_NAME),
            source: Box::new(source),
        })?;
        Self::from_raw(raw)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            recheck_on_title_change: self.global.recheck_on_title_change,
        }
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let monitor_offsets = convert_offsets(raw.global.monitor_offsets)?;

        let mut ignores = Vec::with_capacity(raw.ignores.len());
        for ignore in raw.ignores {
            if ignore.conditions.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "ignore rule {:?} has no conditions",
                    ignore.name
                )));
            }
            ignores.push(IgnoreRule {
                condition: ConditionGroup {
                    logic: ignore.logic.into(),
                    conditions: ignore.conditions.into_iter().map(convert_condition).collect(),
                },
                name: ignore.name,
            });
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(raw.rules.len());
        for rule in raw.rules {
            if !seen.insert(rule.name.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate rule name {:?}",
                    rule.name
                )));
            }
            let condition = convert_rule_condition(&rule.name, rule.condition)?;
            let action = convert_action(&rule.name, rule.action)?;
            rules.push(Rule {
                name: rule.name,
                condition,
                action,
            });
        }

        Ok(Settings {
            global: GlobalOptions {
                log_level: raw.global.log_level,
                apply_on_startup: raw.global.apply_on_startup,
                apply_on_reload: raw.global.apply_on_reload,
                apply_on_resume: raw.global.apply_on_resume,
                recheck_on_title_change: raw.global.recheck_on_title_change,
                cleanup_interval: Duration::from_secs(raw.global.cleanup_interval_seconds),
                polling_interval: Duration::from_millis(raw.global.polling_interval),
                monitor_offsets,
            },
            ruleset: RuleSet { ignores, rules },
        })
    }
}

fn convert_offsets(raw: HashMap<String, RawOffsets>) -> Result<MonitorOffsets, ConfigError> {
    let mut offsets = MonitorOffsets::default();
    for (key, value) in raw {
        let insets = EdgeInsets {
            top: value.top,
            bottom: value.bottom,
            left: value.left,
            right: value.right,
        };
        if key == "default" {
            offsets.default = Some(insets);
            continue;
        }
        let number = key
            .strip_prefix("monitor_")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n >= 1);
        match number {
            Some(n) => {
                offsets.per_monitor.insert(n, insets);
            }
            None => {
                return Err(ConfigError::Invalid(format!(
                    "invalid monitor_offsets key {:?}: expected \"default\" or \"monitor_N\"",
                    key
                )))
            }
        }
    }
    Ok(offsets)
}

fn convert_condition(raw: RawCondition) -> Condition {
    let case_sensitive = raw.case_sensitive;
    Condition {
        title: raw
            .title
            .as_deref()
            .map(|t| Pattern::contains(t, case_sensitive)),
        process: raw
            .process
            .as_deref()
            .map(|p| Pattern::equals(p, case_sensitive)),
        class: raw
            .class_name
            .as_deref()
            .map(|c| Pattern::contains(c, case_sensitive)),
    }
}

fn convert_rule_condition(
    rule_name: &str,
    raw: RawRuleCondition,
) -> Result<RuleCondition, ConfigError> {
    match raw {
        RawRuleCondition::Single(condition) => {
            Ok(RuleCondition::Single(convert_condition(condition)))
        }
        RawRuleCondition::Group { logic, conditions } => {
            if conditions.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "rule {:?} has an empty condition group",
                    rule_name
                )));
            }
            Ok(RuleCondition::Group(ConditionGroup {
                logic: logic.into(),
                conditions: conditions.into_iter().map(convert_condition).collect(),
            }))
        }
    }
}

fn convert_action(rule_name: &str, raw: RawAction) -> Result<Action, ConfigError> {
    if raw.maximize && raw.minimize {
        return Err(ConfigError::Invalid(format!(
            "rule {:?} sets both maximize and minimize",
            rule_name
        )));
    }

    let move_to = raw.move_to.map(|m| match m {
        RawMoveTo::Anchor(anchor) => MoveTarget::Anchor(anchor),
        RawMoveTo::Coords { x, y } => MoveTarget::Coords {
            x: convert_value(&x, rule_name, "move_to.x"),
            y: convert_value(&y, rule_name, "move_to.y"),
        },
    });

    let resize = raw
        .resize_to
        .map(|r| ResizeSpec {
            width: r.width.and_then(|v| convert_value(&v, rule_name, "resize_to.width")),
            height: r
                .height
                .and_then(|v| convert_value(&v, rule_name, "resize_to.height")),
        })
        .unwrap_or_default();

    Ok(Action {
        anchor: raw.anchor,
        move_to,
        resize,
        offset: raw.offset.map(|o| (o.x, o.y)).unwrap_or_default(),
        target_monitor: raw.target_monitor,
        maximize: raw.maximize,
        minimize: raw.minimize,
        execution_delay: raw.execution_delay.map(Duration::from_millis),
        target_desktop: raw.target_desktop,
    })
}

fn convert_value(raw: &RawValue, rule_name: &str, field: &str) -> Option<SizeValue> {
    match raw {
        RawValue::Int(i) => Some(SizeValue::Pixels(*i as i32)),
        RawValue::Float(f) => Some(SizeValue::Pixels(*f as i32)),
        RawValue::Str(s) => {
            let parsed = parse_size_value(s);
            if parsed.is_none() {
                tracing::warn!(
                    "rule {:?}: unparseable value {:?} in {}, falling back to current",
                    rule_name,
                    s,
                    field
                );
            }
            parsed
        }
    }
}

pub const DEFAULT_SETTINGS: &str = r#"# madori settings
#
# Rules are evaluated in order; the first matching rule wins. Ignore rules
# are checked before any rule. Patterns are literal by default; prefix with
# "regex:" for a regular expression.

[global]
log_level = "info"
apply_on_startup = true
apply_on_reload = true
apply_on_resume = false
recheck_on_title_change = false
cleanup_interval_seconds = 300
polling_interval = 1000

# Reserved screen edges per monitor (taskbar etc.), in pixels.
# [global.monitor_offsets.default]
# bottom = 48

# [[ignore]]
# name = "task switcher"
# [[ignore.conditions]]
# class = "XamlExplorerHostIslandWindow"

# [[rules]]
# name = "calculator centered"
# [rules.condition]
# title = "Calculator"
# [rules.action]
# anchor = "MiddleCenter"
# move_to = "MiddleCenter"
# resize_to = { width = 320, height = 480 }
"#;

/// Write the commented default settings file. Refuses to overwrite.
pub fn write_default(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::Invalid(format!(
            "{} already exists",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, DEFAULT_SETTINGS).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
