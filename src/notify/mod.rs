//! Signup notifications for interest-group leads.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::notify::error::NotifyError;

pub mod composer;
pub mod error;

/// Interest group name to lead e-mail addresses.
///
/// Loaded from a JSON object such as
/// `{"Marketing": ["lead@example.org"], "Finance": []}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct InterestGroupDirectory {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl InterestGroupDirectory {
    pub fn new(groups: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { groups }
    }

    pub fn load(path: &Path) -> Result<Self, NotifyError> {
        let path_str = path.to_string_lossy().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| {
            NotifyError::DirectoryReadFailed {
                path: path_str.clone(),
                source,
            }
        })?;
        let directory: Self = serde_json::from_str(&raw)
            .map_err(|source| NotifyError::DirectoryParseFailed {
                path: path_str.clone(),
                source,
            })?;
        debug!(
            "Loaded {} interest groups from {path_str}",
            directory.groups.len()
        );
        Ok(directory)
    }

    /// Groups whose name occurs in `interests`.
    ///
    /// Plain case-sensitive substring test: a group named "Market" is also
    /// selected by "Marketing".
    pub fn select_groups(&self, interests: &str) -> BTreeSet<String> {
        self.groups
            .keys()
            .filter(|name| !name.is_empty() && interests.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// Deduplicated union of the leads of `groups`.
    pub fn leads_for<'a, I>(&self, groups: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        groups
            .into_iter()
            .filter_map(|group| self.groups.get(group))
            .flatten()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InterestGroupDirectory {
        serde_json::from_str(
            r#"{
                "Marketing": ["mia@example.org", "shared@example.org"],
                "Logistics": ["leo@example.org", "shared@example.org"],
                "Finance": ["fin@example.org"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_select_groups_by_substring() {
        let selected = directory().select_groups("Marketing and Logistics");
        let expected: BTreeSet<String> = ["Logistics", "Marketing"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(selected, expected);
    }

    #[test]
    fn test_select_groups_is_case_sensitive() {
        assert!(directory().select_groups("marketing, finance").is_empty());
    }

    #[test]
    fn test_leads_union_is_order_independent() {
        let dir = directory();
        let a = "Marketing".to_string();
        let b = "Logistics".to_string();

        let ab = dir.leads_for([&a, &b]);
        let ba = dir.leads_for([&b, &a]);

        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 3);
        assert!(ab.contains("shared@example.org"));
    }

    #[test]
    fn test_unknown_group_has_no_leads() {
        let unknown = "Outreach".to_string();
        assert!(directory().leads_for([&unknown]).is_empty());
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let path = std::env::temp_dir().join(format!(
            "signup-sync-groups-{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, r#"{"Marketing": "not-a-list"}"#).unwrap();
        assert!(matches!(
            InterestGroupDirectory::load(&path),
            Err(NotifyError::DirectoryParseFailed { .. })
        ));

        std::fs::write(&path, r#"{"Marketing": ["mia@example.org"]}"#).unwrap();
        let loaded = InterestGroupDirectory::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        let _ = std::fs::remove_file(path);
    }
}
