//! Keyword classification of tool names.

use toolvault_shared::{ArchiveConfig, CategoryRule};

/// Maps tool names to categories with an ordered list of keyword rules.
///
/// Matching is a case-insensitive substring test; the first rule in list
/// order wins, and names matching no rule get the default category.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Rules with keywords already lowercased, in match order.
    rules: Vec<CategoryRule>,
    default_category: String,
}

impl Classifier {
    pub fn new(rules: &[CategoryRule], default_category: impl Into<String>) -> Self {
        let rules = rules
            .iter()
            .map(|r| CategoryRule::new(r.keyword.to_lowercase(), r.category.clone()))
            .collect();
        Self {
            rules,
            default_category: default_category.into(),
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(&config.rules, config.default_category.clone())
    }

    /// Category for `tool_name`. Never fails.
    pub fn classify(&self, tool_name: &str) -> &str {
        let name = tool_name.to_lowercase();
        self.rules
            .iter()
            .find(|rule| name.contains(&rule.keyword))
            .map_or(self.default_category.as_str(), |rule| rule.category.as_str())
    }

    /// Every category a tool can land in, in first-appearance order,
    /// default last unless a rule already uses it.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let all = self
            .rules
            .iter()
            .map(|r| r.category.as_str())
            .chain(std::iter::once(self.default_category.as_str()));
        for category in all {
            if !out.contains(&category) {
                out.push(category);
            }
        }
        out
    }
}
