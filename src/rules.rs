/// User-defined classification rules.
///
/// Rules run before the remote classifier and win over it. Keyword rules
/// match case-insensitively as substrings of the file name; extension rules
/// match the normalized extension exactly. Within each kind, declaration
/// order decides: the first match wins.
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// The two supported rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Keyword,
    Extension,
}

/// A single user-authored rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRule {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub pattern: String,
    pub category: Category,
}

impl CustomRule {
    pub fn keyword(id: &str, pattern: &str, category: Category) -> Self {
        Self {
            id: id.to_string(),
            kind: RuleKind::Keyword,
            pattern: pattern.to_string(),
            category,
        }
    }

    pub fn extension(id: &str, pattern: &str, category: Category) -> Self {
        Self {
            id: id.to_string(),
            kind: RuleKind::Extension,
            pattern: pattern.to_string(),
            category,
        }
    }
}

/// Evaluates all rules against a file name and its normalized extension.
///
/// Keyword rules are tried first (more specific), then extension rules.
/// Returns `None` when no rule matches.
pub fn apply_rules(name: &str, extension: &str, rules: &[CustomRule]) -> Option<Category> {
    let name_lower = name.to_lowercase();

    for rule in rules.iter().filter(|r| r.kind == RuleKind::Keyword) {
        if !rule.pattern.is_empty() && name_lower.contains(&rule.pattern.to_lowercase()) {
            return Some(rule.category);
        }
    }

    for rule in rules.iter().filter(|r| r.kind == RuleKind::Extension) {
        let pattern = rule.pattern.trim_start_matches('.').to_lowercase();
        if !pattern.is_empty() && pattern == extension {
            return Some(rule.category);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_rule_matches_substring_case_insensitively() {
        let rules = vec![CustomRule::keyword("r1", "invoice", Category::Documents)];
        assert_eq!(
            apply_rules("INVOICE-2024.xml", "xml", &rules),
            Some(Category::Documents)
        );
        assert_eq!(apply_rules("report.xml", "xml", &rules), None);
    }

    #[test]
    fn extension_rule_matches_exactly_with_dot_stripped() {
        let rules = vec![CustomRule::extension("r1", ".EXE", Category::Installers)];
        assert_eq!(
            apply_rules("setup.exe", "exe", &rules),
            Some(Category::Installers)
        );
        assert_eq!(apply_rules("setup.exe.txt", "txt", &rules), None);
    }

    #[test]
    fn keyword_wins_over_extension() {
        let rules = vec![
            CustomRule::extension("ext", "pdf", Category::Documents),
            CustomRule::keyword("kw", "screenshot", Category::Images),
        ];
        assert_eq!(
            apply_rules("screenshot.pdf", "pdf", &rules),
            Some(Category::Images)
        );
    }

    #[test]
    fn first_declared_rule_of_a_kind_wins() {
        let rules = vec![
            CustomRule::keyword("a", "backup", Category::Archives),
            CustomRule::keyword("b", "backup", Category::Junk),
        ];
        assert_eq!(
            apply_rules("backup-old.zip", "zip", &rules),
            Some(Category::Archives)
        );
    }

    #[test]
    fn empty_patterns_never_match() {
        let rules = vec![
            CustomRule::keyword("a", "", Category::Junk),
            CustomRule::extension("b", ".", Category::Junk),
        ];
        assert_eq!(apply_rules("anything.txt", "txt", &rules), None);
    }
}
