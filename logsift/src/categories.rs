//! Category resolution: maps a category token such as `-audit` or `Mailbox.log`
//! to the ordered list of file name prefixes it selects.
//!
//! The `all` category is never written down. It is derived as the ordered,
//! de-duplicated union of every other category, so adding a category can't
//! leave `all` behind.

use std::collections::BTreeMap;

use crate::errors::{SearchError, SearchResult};

/// Name of the derived category that selects every known prefix
pub const ALL: &str = "all";

/// Built-in categories: (name, aliases, prefixes)
const BUILTIN: &[(&str, &[&str], &[&str])] = &[
    ("address", &[], &["address"]),
    ("audit", &["audit.log"], &["audit.log"]),
    ("bruteforce", &[], &["Bruteforce"]),
    ("ip", &["ip_block"], &["ip_block"]),
    ("fail2ban", &["fail2ban.log"], &["fail2ban.log"]),
    ("mailbox", &["mailbox.log"], &["mailbox.log"]),
    ("zimbra", &["zimbra.log"], &["zimbra.log"]),
];

/// A named bucket of log file prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub aliases: Vec<String>,
    pub prefixes: Vec<String>,
}

impl Category {
    fn answers_to(&self, normalized: &str) -> bool {
        self.name.to_lowercase() == normalized
            || self.aliases.iter().any(|a| a.to_lowercase() == normalized)
    }
}

/// The immutable set of categories known to a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    categories: Vec<Category>,
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategorySet {
    /// The mail-server categories logsift ships with
    pub fn builtin() -> Self {
        let categories = BUILTIN
            .iter()
            .map(|(name, aliases, prefixes)| Category {
                name: name.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
                prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            })
            .collect();
        Self { categories }
    }

    /// Builds a deployment-specific set from a name -> prefixes map.
    ///
    /// Every category needs at least one non-empty prefix, and `all` is
    /// reserved for the derived union.
    pub fn from_map(map: &BTreeMap<String, Vec<String>>) -> SearchResult<Self> {
        let mut categories = Vec::with_capacity(map.len());
        for (name, prefixes) in map {
            let normalized = normalize(name);
            if normalized.is_empty() {
                return Err(SearchError::config_error("category name must not be empty"));
            }
            if normalized == ALL {
                return Err(SearchError::config_error(format!(
                    "category '{}' is reserved",
                    ALL
                )));
            }
            let prefixes: Vec<String> = prefixes
                .iter()
                .filter(|p| !p.is_empty())
                .cloned()
                .collect();
            if prefixes.is_empty() {
                return Err(SearchError::config_error(format!(
                    "category '{}' has no prefixes",
                    name
                )));
            }
            categories.push(Category {
                name: normalized,
                aliases: Vec::new(),
                prefixes,
            });
        }
        if categories.is_empty() {
            return Err(SearchError::config_error("no categories configured"));
        }
        Ok(Self { categories })
    }

    /// The explicitly defined categories, in definition order (`all` excluded)
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// All accepted category names, `all` first
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(ALL)
            .chain(self.categories.iter().map(|c| c.name.as_str()))
            .collect()
    }

    /// Resolves a category token to its ordered prefix list.
    ///
    /// Tokens are matched case-insensitively and may carry one leading `-`
    /// (`-audit`, `Audit`, and `audit.log` all select the audit logs).
    pub fn resolve(&self, token: &str) -> SearchResult<Vec<String>> {
        let normalized = normalize(token);

        if normalized == ALL {
            let mut prefixes: Vec<String> = Vec::new();
            for prefix in self.categories.iter().flat_map(|c| &c.prefixes) {
                if !prefixes.contains(prefix) {
                    prefixes.push(prefix.clone());
                }
            }
            return Ok(prefixes);
        }

        self.categories
            .iter()
            .find(|c| c.answers_to(&normalized))
            .map(|c| c.prefixes.clone())
            .ok_or_else(|| SearchError::unknown_category(token, self.names()))
    }
}

fn normalize(token: &str) -> String {
    let token = token.trim();
    token.strip_prefix('-').unwrap_or(token).to_lowercase()
}
