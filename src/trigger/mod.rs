use crate::constants::{TARGET_PROCESS_NAMES, TRIGGER_DOMAINS, TRIGGER_TITLES};
use log::debug;

/// Case-insensitive set of process names for the controlled application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessNames(Vec<String>);

impl ProcessNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(normalize_all(names))
    }

    /// Whether `name` (as reported by the OS) belongs to the set.
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        !name.is_empty() && self.0.iter().any(|n| *n == name)
    }
}

/// Immutable trigger configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct TriggerPatternSet {
    titles: Vec<String>,
    domains: Vec<String>,
    process_names: ProcessNames,
}

impl Default for TriggerPatternSet {
    fn default() -> Self {
        Self::new(TRIGGER_TITLES, TRIGGER_DOMAINS, TARGET_PROCESS_NAMES)
    }
}

impl TriggerPatternSet {
    pub fn new<T, D, P>(titles: T, domains: D, process_names: P) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            titles: normalize_all(titles),
            domains: normalize_all(domains),
            process_names: ProcessNames::new(process_names),
        }
    }

    pub fn process_names(&self) -> &ProcessNames {
        &self.process_names
    }

    /// Decide whether the focused window title means the trigger is active.
    ///
    /// A title matches a pattern when it equals it, starts with it followed by
    /// a space, or contains it anywhere. The last rule makes the whole check a
    /// substring test, so "Anti-Youtube-Extension Settings" matches "youtube".
    /// Titles carrying one of the domain tokens match even without a pattern.
    pub fn matches(&self, focused_title: &str) -> bool {
        let title = focused_title.trim().to_lowercase();
        if title.is_empty() {
            return false;
        }

        for pattern in &self.titles {
            if Self::title_matches(&title, pattern) {
                debug!("Trigger detected in window: '{title}'");
                return true;
            }
        }

        if self.domains.iter().any(|d| title.contains(d.as_str())) {
            debug!("Trigger domain detected in window: '{title}'");
            return true;
        }

        false
    }

    fn title_matches(title: &str, pattern: &str) -> bool {
        title == pattern
            || title
                .strip_prefix(pattern)
                .is_some_and(|rest| rest.starts_with(' '))
            || title.contains(pattern)
    }
}

fn normalize_all<I>(values: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}
