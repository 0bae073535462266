//! Category rule table.
//!
//! Rules are kept in the order they were configured: when a subject matches
//! keywords of several categories, the earliest one wins.

use serde::{Deserialize, Serialize};

/// One category and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category label, also used as the attachment subfolder name.
    pub name: String,
    /// Substrings searched for in the lower-cased subject.
    pub keywords: Vec<String>,
}

impl CategoryRule {
    /// Convenience constructor used by the built-in defaults and tests.
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered, immutable rule table with a fallback label.
///
/// Keywords are lower-cased once on construction so matching is
/// case-insensitive without per-call allocation of the keyword set.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
    fallback: String,
}

impl CategoryTable {
    pub fn new(rules: Vec<CategoryRule>, fallback: impl Into<String>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| CategoryRule {
                name: rule.name,
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Label returned when nothing matches.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

/// The keyword table the daemon ships with.
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("Работа", &["job", "вакансия", "resume", "собеседование"]),
        CategoryRule::new("Финансы", &["invoice", "счёт", "оплата", "payment"]),
        CategoryRule::new("Реклама", &["sale", "скидка", "promo", "offer"]),
        CategoryRule::new(
            "Личное",
            &["друзья", "приглашение", "вечеринка", "поздравление"],
        ),
    ]
}

/// Fallback category of the built-in table.
pub const DEFAULT_FALLBACK: &str = "Другое";
