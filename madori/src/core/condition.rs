use super::Pattern;

/// A single match condition. Every specified pattern must match (conjunctive
/// within one condition); a condition with no patterns never matches.
#[derive(Debug, Clone, Default)]
pub struct Condition {
    pub title: Option<Pattern>,
    pub process: Option<Pattern>,
    pub class: Option<Pattern>,
}

impl Condition {
    pub fn matches(&self, title: &str, process: Option<&str>, class: Option<&str>) -> bool {
        let mut checked = false;

        if let Some(pattern) = &self.title {
            if !pattern.matches(title) {
                return false;
            }
            checked = true;
        }

        if let Some(pattern) = &self.process {
            match process {
                Some(name) if pattern.matches(name) => checked = true,
                _ => return false,
            }
        }

        if let Some(pattern) = &self.class {
            match class {
                Some(name) if pattern.matches(name) => checked = true,
                _ => return false,
            }
        }

        checked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

/// AND/OR over an ordered, non-empty list of conditions. Non-emptiness is
/// enforced at configuration load.
#[derive(Debug, Clone)]
pub struct ConditionGroup {
    pub logic: Logic,
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    pub fn matches(&self, title: &str, process: Option<&str>, class: Option<&str>) -> bool {
        match self.logic {
            Logic::And => self
                .conditions
                .iter()
                .all(|c| c.matches(title, process, class)),
            Logic::Or => self
                .conditions
                .iter()
                .any(|c| c.matches(title, process, class)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RuleCondition {
    Single(Condition),
    Group(ConditionGroup),
}

impl RuleCondition {
    pub fn matches(&self, title: &str, process: Option<&str>, class: Option<&str>) -> bool {
        match self {
            RuleCondition::Single(c) => c.matches(title, process, class),
            RuleCondition::Group(g) => g.matches(title, process, class),
        }
    }
}
