use regex::RegexBuilder;

/// Marker prefix selecting regex matching over literal matching.
pub const REGEX_PREFIX: &str = "regex:";

/// A match pattern resolved once at configuration load. The literal variants
/// carry the field semantics chosen at construction: titles and class names
/// match by containment, process names by full equality.
#[derive(Debug, Clone)]
pub enum Pattern {
    Contains { text: String, case_sensitive: bool },
    Equals { text: String, case_sensitive: bool },
    Regex(regex::Regex),
    /// A regex that failed to compile. Reported at load, never matches.
    Broken,
}

impl Pattern {
    /// Pattern for title/class fields: literal containment, or an unanchored
    /// regex searched anywhere in the haystack.
    pub fn contains(raw: &str, case_sensitive: bool) -> Pattern {
        match raw.strip_prefix(REGEX_PREFIX) {
            Some(expr) => Self::compile(expr, case_sensitive),
            None => Pattern::Contains {
                text: raw.to_string(),
                case_sensitive,
            },
        }
    }

    /// Pattern for the process field: literal equality, or a regex required
    /// to match the entire candidate.
    pub fn equals(raw: &str, case_sensitive: bool) -> Pattern {
        match raw.strip_prefix(REGEX_PREFIX) {
            Some(expr) => Self::compile(&format!("^(?:{})$", expr), case_sensitive),
            None => Pattern::Equals {
                text: raw.to_string(),
                case_sensitive,
            },
        }
    }

    fn compile(expr: &str, case_sensitive: bool) -> Pattern {
        match RegexBuilder::new(expr)
            .case_insensitive(!case_sensitive)
            .build()
        {
            Ok(re) => Pattern::Regex(re),
            Err(e) => {
                tracing::warn!("invalid regex pattern {:?}: {}", expr, e);
                Pattern::Broken
            }
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Pattern::Contains {
                text,
                case_sensitive: true,
            } => candidate.contains(text.as_str()),
            Pattern::Contains {
                text,
                case_sensitive: false,
            } => candidate.to_lowercase().contains(&text.to_lowercase()),
            Pattern::Equals {
                text,
                case_sensitive: true,
            } => candidate == text,
            Pattern::Equals {
                text,
                case_sensitive: false,
            } => candidate.to_lowercase() == text.to_lowercase(),
            Pattern::Regex(re) => re.is_match(candidate),
            Pattern::Broken => false,
        }
    }
}
