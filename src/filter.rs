//! Country policy evaluation.
//!
//! Pure functions only: the decision depends on the country code, the mode
//! and the configured set, nothing else.

use std::collections::HashSet;

use crate::config::FilterMode;

/// Set of ISO country codes, compared exactly as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountrySet(HashSet<String>);

impl CountrySet {
    /// Builds a set from configured codes; duplicates collapse.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Self {
        CountrySet(codes.iter().map(|c| c.as_ref().to_string()).collect())
    }

    /// Whether `code` is in the set (case-sensitive).
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    /// Number of distinct codes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no codes are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of evaluating a country code against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Pass the request on
    Allow,
    /// Terminate the connection
    Deny,
}

impl Decision {
    /// `true` for [`Decision::Allow`].
    pub fn is_allow(self) -> bool {
        self == Decision::Allow
    }
}

/// Decides whether a request from `country_code` may pass.
///
/// | mode      | code in set | code not in set | empty code |
/// |-----------|-------------|-----------------|------------|
/// | blacklist | deny        | allow           | deny       |
/// | whitelist | allow       | deny            | deny       |
pub fn decide(country_code: &str, mode: FilterMode, countries: &CountrySet) -> Decision {
    if country_code.is_empty() {
        return Decision::Deny;
    }

    let listed = countries.contains(country_code);
    match (mode, listed) {
        (FilterMode::Blacklist, true) | (FilterMode::Whitelist, false) => Decision::Deny,
        (FilterMode::Blacklist, false) | (FilterMode::Whitelist, true) => Decision::Allow,
    }
}
