use super::{Action, ConditionGroup, RuleCondition};

/// An action rule: first matching rule in declared order wins.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub condition: RuleCondition,
    pub action: Action,
}

/// An ignore rule: a match suppresses all further rule evaluation for the
/// window, and no action is ever scheduled.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub name: String,
    pub condition: ConditionGroup,
}

/// Immutable snapshot of the configured rules, replaced wholesale on reload.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub ignores: Vec<IgnoreRule>,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// First matching ignore rule, in declared order.
    pub fn matching_ignore(
        &self,
        title: &str,
        process: Option<&str>,
        class: Option<&str>,
    ) -> Option<&IgnoreRule> {
        self.ignores
            .iter()
            .find(|ig| ig.condition.matches(title, process, class))
    }

    /// First matching action rule, in declared order.
    pub fn matching_rule(
        &self,
        title: &str,
        process: Option<&str>,
        class: Option<&str>,
    ) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|rule| rule.condition.matches(title, process, class))
    }
}
