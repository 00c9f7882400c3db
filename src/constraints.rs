//! Goal-driven exclusion rules.
//!
//! The job text is scanned for trigger terms; each matching category
//! contributes a list of forbidden terms. A page mentioning any forbidden term
//! of an active rule is dropped before ranking. Unknown phrasings activate
//! nothing.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Bumped whenever the built-in table changes.
pub const RULE_TABLE_VERSION: u32 = 1;

const MEAT_AND_FISH: &[&str] = &[
    "meat", "beef", "steak", "veal", "pork", "bacon", "ham", "sausage", "salami",
    "pepperoni", "prosciutto", "chorizo", "lamb", "mutton", "chicken", "turkey",
    "duck", "goose", "poultry", "venison", "fish", "salmon", "tuna", "cod",
    "anchovy", "anchovies", "sardine", "trout", "shrimp", "prawn", "crab",
    "lobster", "oyster", "mussel", "clam", "scallop", "squid", "octopus",
    "gelatin",
];

const ANIMAL_PRODUCTS: &[&str] = &[
    "egg", "milk", "cheese", "butter", "cream", "yogurt", "yoghurt", "honey",
    "mayonnaise", "ghee",
];

const GLUTEN: &[&str] = &[
    "wheat", "flour", "bread", "breadcrumbs", "pasta", "spaghetti", "noodle",
    "barley", "rye", "couscous", "semolina", "tortilla", "pita", "cracker",
    "croutons", "seitan",
];

const DAIRY: &[&str] = &[
    "milk", "cheese", "butter", "cream", "yogurt", "yoghurt", "ghee", "whey",
    "mozzarella", "parmesan", "cheddar", "feta", "ricotta",
];

const NUTS: &[&str] = &[
    "peanut", "almond", "walnut", "cashew", "pecan", "hazelnut", "pistachio",
    "macadamia", "nut",
];

/// One category of exclusion: when any trigger appears in the goal, pages
/// containing any forbidden term are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRule {
    pub category: String,
    pub triggers: Vec<String>,
    pub forbidden: Vec<String>,
}

impl ConstraintRule {
    pub fn new(category: &str, triggers: &[&str], forbidden: &[&[&str]]) -> Self {
        Self {
            category: category.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            forbidden: forbidden
                .iter()
                .flat_map(|list| list.iter().map(|t| t.to_string()))
                .collect(),
        }
    }
}

/// The table of known categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintTable {
    rules: Vec<ConstraintRule>,
}

impl ConstraintTable {
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                ConstraintRule::new(
                    "vegetarian",
                    &["vegetarian", "veggie", "meat-free", "meatless", "plant-based"],
                    &[MEAT_AND_FISH],
                ),
                ConstraintRule::new("vegan", &["vegan"], &[MEAT_AND_FISH, ANIMAL_PRODUCTS]),
                ConstraintRule::new(
                    "gluten-free",
                    &["gluten-free", "gluten free", "coeliac", "celiac"],
                    &[GLUTEN],
                ),
                ConstraintRule::new(
                    "dairy-free",
                    &["dairy-free", "dairy free", "lactose-free", "lactose intolerant"],
                    &[DAIRY],
                ),
                ConstraintRule::new("nut-free", &["nut-free", "nut free", "nut allergy"], &[NUTS]),
            ],
        }
    }

    pub fn with_rules(mut self, extra: impl IntoIterator<Item = ConstraintRule>) -> Self {
        self.rules.extend(extra);
        self
    }

    pub fn rules(&self) -> &[ConstraintRule] {
        &self.rules
    }

    /// Active rules for a goal. Pure function of `goal` and the table.
    pub fn derive(&self, goal: &str) -> ConstraintSet {
        let goal = goal.to_lowercase();
        let active = self
            .rules
            .iter()
            .filter(|rule| {
                rule.triggers
                    .iter()
                    .any(|t| contains_term(&goal, &t.to_lowercase()))
            })
            .filter_map(ActiveRule::compile)
            .collect::<Vec<_>>();

        if !active.is_empty() {
            tracing::info!(
                "active constraints: {:?}",
                active.iter().map(|r| r.category.as_str()).collect::<Vec<_>>()
            );
        }
        ConstraintSet { active }
    }
}

impl Default for ConstraintTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone)]
struct ActiveRule {
    category: String,
    pattern: Regex,
}

impl ActiveRule {
    /// A hit directly followed by `-free`/`-less` ("meat-free") states compliance.
    fn matches(&self, text: &str) -> bool {
        self.pattern.find_iter(text).any(|m| {
            let rest = text[m.end()..].chars().take(5).collect::<String>().to_lowercase();
            !["-free", " free", "-less"].iter().any(|suffix| rest.starts_with(suffix))
        })
    }

    fn compile(rule: &ConstraintRule) -> Option<Self> {
        let alternatives = rule
            .forbidden
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| regex::escape(&t.to_lowercase()))
            .collect::<Vec<_>>();
        if alternatives.is_empty() {
            return None;
        }
        // Whole words, allowing simple plurals.
        let pattern = format!(r"(?i)\b(?:{})(?:s|es)?\b", alternatives.join("|"));
        match Regex::new(&pattern) {
            Ok(pattern) => Some(Self {
                category: rule.category.clone(),
                pattern,
            }),
            Err(e) => {
                tracing::warn!("ignoring constraint '{}': {}", rule.category, e);
                None
            }
        }
    }
}

/// Rules activated by one goal text. Empty means nothing is filtered.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    active: Vec<ActiveRule>,
}

impl ConstraintSet {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.active.iter().map(|r| r.category.as_str()).collect()
    }

    /// Category of the first active rule whose forbidden terms occur in `text`.
    pub fn violation(&self, text: &str) -> Option<&str> {
        self.active
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| rule.category.as_str())
    }

    pub fn rejects(&self, text: &str) -> bool {
        self.violation(text).is_some()
    }
}

fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
