//! Read-side checklist filters for admission listings.
//!
//! A manager selects configured status identifiers per tab; the selection is
//! compiled into [`ChecklistFilter`] predicates that act as alternatives: an
//! admission passes the selection as soon as one of them matches. Selecting a
//! refinement together with its parent collapses both into a single filter
//! carrying the parent's status tag and the union of both extras, and the
//! bare parent is dropped from the selection. Selections over distinct tabs
//! combine conjunctively.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ChecklistConfiguration, ChecklistStatus, ChecklistTree, StatusTag, Tab};

/// One compiled predicate over a tab's stored `(status, extra)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistFilter {
    pub tab: Tab,
    pub status: Option<StatusTag>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ChecklistFilter {
    /// Whether a stored entry satisfies this predicate: tags agree and every
    /// filtered extra key is present with the same value.
    pub fn matches(&self, entry: &ChecklistStatus) -> bool {
        entry.status == self.status
            && self
                .extra
                .iter()
                .all(|(key, value)| entry.extra.get(key) == Some(value))
    }

    /// Whether one admission's checklist satisfies this predicate. Under the
    /// past-experience tab a match on any child entry suffices.
    pub fn matches_tree(&self, tree: &ChecklistTree) -> bool {
        let Some(entry) = tree.tab(self.tab) else {
            return false;
        };
        if self.matches(entry) {
            return true;
        }
        self.tab == Tab::PastExperience && entry.children.iter().any(|child| self.matches(child))
    }
}

/// A selected identifier does not belong to the tab's configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("tab '{0:?}' has no checklist configuration in this context")]
    TabNotConfigured(Tab),
    #[error("'{identifier}' is not a configured status of tab '{tab:?}'")]
    UnknownStatus { tab: Tab, identifier: String },
}

/// Compile a manager's identifier selection for one tab into filters.
///
/// Refinements absorb their parent: the resulting filter requires the
/// parent's status tag and both extras at once, and a parent selected
/// alongside any of its refinements contributes no filter of its own.
pub fn build_filters(
    configuration: &ChecklistConfiguration,
    tab: Tab,
    selected: &[&str],
) -> Result<Vec<ChecklistFilter>, FilterError> {
    let tab_configuration = configuration
        .tab(tab)
        .ok_or(FilterError::TabNotConfigured(tab))?;

    let mut refined_parents: Vec<&str> = Vec::new();
    let mut entries = Vec::with_capacity(selected.len());

    for identifier in selected {
        let entry = tab_configuration
            .entry(identifier)
            .ok_or_else(|| FilterError::UnknownStatus {
                tab,
                identifier: (*identifier).to_owned(),
            })?;

        let compiled = match entry.parent_identifier.as_deref() {
            Some(parent_identifier) => {
                let parent = tab_configuration.entry(parent_identifier).ok_or_else(|| {
                    FilterError::UnknownStatus {
                        tab,
                        identifier: parent_identifier.to_owned(),
                    }
                })?;
                refined_parents.push(parent_identifier);
                entry.merge_with_parent(parent)
            }
            None => entry.clone(),
        };

        entries.push(compiled);
    }

    Ok(entries
        .into_iter()
        .filter(|entry| !refined_parents.contains(&entry.identifier.as_str()))
        .map(|entry| ChecklistFilter {
            tab,
            status: entry.status,
            extra: entry.extra,
        })
        .collect())
}

/// Whether an admission's checklist satisfies at least one filter of a
/// selection. Statuses selected together on one tab are alternatives.
pub fn tree_matches_any(tree: &ChecklistTree, filters: &[ChecklistFilter]) -> bool {
    filters.iter().any(|filter| filter.matches_tree(tree))
}

/// Whether an admission's checklist satisfies every selection, each compiled
/// from one tab. Distinct tabs narrow the listing, statuses within one tab
/// widen it.
pub fn tree_matches_all(tree: &ChecklistTree, selections: &[Vec<ChecklistFilter>]) -> bool {
    selections
        .iter()
        .all(|selection| tree_matches_any(tree, selection))
}
