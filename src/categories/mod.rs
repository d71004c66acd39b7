//! Tag → category mapping.
//!
//! Lookups are total: a tag with no entry belongs to [`OTHER`]. Keys only
//! accumulate; nothing removes a mapping once saved.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::{Document, StoreError, UserStore};

/// Category assigned to tags with no explicit mapping.
pub const OTHER: &str = "Other";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMapping {
    entries: BTreeMap<String, String>,
}

/// One row of the category editor: an observed tag and its current category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableCategory {
    pub tag: String,
    pub category: String,
}

impl CategoryMapping {
    /// Category of `tag`, or [`OTHER`] when unmapped.
    pub fn get(&self, tag: &str) -> &str {
        self.entries.get(tag).map(String::as_str).unwrap_or(OTHER)
    }

    pub fn set(&mut self, tag: impl Into<String>, category: impl Into<String>) {
        self.entries.insert(tag.into(), category.into());
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay a saved mapping; saved values win for matching keys.
    pub fn merge_saved(&mut self, saved: CategoryMapping) {
        self.entries.extend(saved.entries);
    }

    /// Editor rows for the tags observed in the current batch.
    ///
    /// Tags that exist only in the saved mapping are not listed.
    pub fn editable<'a>(&self, observed: impl IntoIterator<Item = &'a str>) -> Vec<EditableCategory> {
        let mut rows: Vec<EditableCategory> = observed
            .into_iter()
            .map(|tag| EditableCategory {
                tag: tag.to_string(),
                category: self.get(tag).to_string(),
            })
            .collect();
        rows.sort_by(|a, b| a.tag.cmp(&b.tag));
        rows.dedup_by(|a, b| a.tag == b.tag);
        rows
    }

    /// Apply editor changes, ignoring tags outside `observed`.
    ///
    /// Returns the number of edits applied.
    pub fn apply_edits(
        &mut self,
        edits: impl IntoIterator<Item = (String, String)>,
        observed: &[&str],
    ) -> usize {
        let mut applied = 0;
        for (tag, category) in edits {
            if observed.contains(&tag.as_str()) {
                self.set(tag, category);
                applied += 1;
            } else {
                log::debug!("ignoring category edit for unobserved tag {tag:?}");
            }
        }
        applied
    }

    /// Load the saved mapping for `user`; empty when none exists.
    pub fn load(store: &UserStore, user: &str) -> Result<Self, StoreError> {
        Ok(store
            .read::<CategoryMapping>(user, Document::CategoryMap)?
            .unwrap_or_default())
    }

    /// Start from in-memory defaults and overlay the saved mapping, if any.
    pub fn load_merged(mut self, store: &UserStore, user: &str) -> Result<Self, StoreError> {
        self.merge_saved(Self::load(store, user)?);
        Ok(self)
    }

    /// Overwrite the saved mapping for `user` with this one.
    pub fn save(&self, store: &UserStore, user: &str) -> Result<(), StoreError> {
        store.write(user, Document::CategoryMap, self)?;
        Ok(())
    }
}

impl FromIterator<(String, String)> for CategoryMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_tags_are_other() {
        let mapping = CategoryMapping::default();
        assert_eq!(mapping.get("anything"), OTHER);
        assert_eq!(mapping.get(""), OTHER);
    }

    #[test]
    fn set_overrides_default() {
        let mut mapping = CategoryMapping::default();
        mapping.set("sleep", "Health");
        assert_eq!(mapping.get("sleep"), "Health");
        mapping.set("sleep", "Rest");
        assert_eq!(mapping.get("sleep"), "Rest");
    }

    #[test]
    fn saved_values_override_memory() {
        let mut memory = CategoryMapping::default();
        memory.set("a", "One");
        memory.set("b", "Two");
        let saved: CategoryMapping = [("b".to_string(), "Saved".to_string())]
            .into_iter()
            .collect();
        memory.merge_saved(saved);
        assert_eq!(memory.get("a"), "One");
        assert_eq!(memory.get("b"), "Saved");
    }

    #[test]
    fn editable_lists_only_observed_tags() {
        let mut mapping = CategoryMapping::default();
        mapping.set("old-tag", "Legacy");
        mapping.set("sleep", "Health");

        let rows = mapping.editable(["sleep", "anxiety", "sleep"]);
        assert_eq!(
            rows,
            vec![
                EditableCategory { tag: "anxiety".into(), category: OTHER.into() },
                EditableCategory { tag: "sleep".into(), category: "Health".into() },
            ]
        );
    }

    #[test]
    fn edits_for_unobserved_tags_are_ignored() {
        let mut mapping = CategoryMapping::default();
        let applied = mapping.apply_edits(
            vec![
                ("sleep".to_string(), "Health".to_string()),
                ("ghost".to_string(), "Nope".to_string()),
            ],
            &["sleep"],
        );
        assert_eq!(applied, 1);
        assert!(!mapping.contains("ghost"));
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut mapping = CategoryMapping::default();
        mapping.set("anxiety", "Mood");
        assert_eq!(serde_json::to_string(&mapping).unwrap(), r#"{"anxiety":"Mood"}"#);
    }
}
