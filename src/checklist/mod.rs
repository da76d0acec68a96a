//! Per-admission review checklist: one named status per functional tab, with
//! per-experience child entries under the past-experience tab.
//!
//! Statuses are written by managers through [`set_status`]; the configuration
//! tables in [`configuration`] describe the valid `(status, extra)` vocabulary
//! of each tab and back the read-side filters in [`filters`]. Configurations
//! gate searches and display, not writes: any configured status tag may be
//! written with any extra, matching the upstream system's permissiveness.

pub mod configuration;
pub mod filters;


pub use configuration::{
    ChecklistConfiguration, ChecklistStatusConfiguration, ChecklistTabConfiguration,
};
pub use filters::ChecklistFilter;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::ExperienceId;

/// Extra key carrying the experience identifier of a child entry.
pub const CHILD_IDENTIFIER_KEY: &str = "identifiant";

/// Coarse state of one checklist tab.
///
/// `INITIAL_*` tags are candidate-originated, `GEST_*` tags are under manager
/// control, `SYST_*` tags are set by the system itself (e.g. a confirmed
/// application-fee payment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusTag {
    InitialNonConcerne,
    InitialCandidat,
    GestEnCours,
    GestBlocage,
    GestBlocageUlterieur,
    GestReussite,
    SystReussite,
}

impl StatusTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitialNonConcerne => "INITIAL_NON_CONCERNE",
            Self::InitialCandidat => "INITIAL_CANDIDAT",
            Self::GestEnCours => "GEST_EN_COURS",
            Self::GestBlocage => "GEST_BLOCAGE",
            Self::GestBlocageUlterieur => "GEST_BLOCAGE_ULTERIEUR",
            Self::GestReussite => "GEST_REUSSITE",
            Self::SystReussite => "SYST_REUSSITE",
        }
    }
}

/// Functional areas of manager review. Which tabs exist depends on the
/// admission context; the configuration tables declare the per-context sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    PersonalData,
    Assimilation,
    PastExperience,
    Financeability,
    CourseChoice,
    ResearchProject,
    ApplicationFees,
    TrainingSpecificities,
    CddDecision,
    FacDecision,
    SicDecision,
}

/// State of one tab (or one experience child entry) of one admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistStatus {
    /// Human summary, display only.
    pub label: String,
    /// `None` for configuration-only refinements that never carry a tag.
    pub status: Option<StatusTag>,
    /// Secondary free-form discriminator refining the coarse status.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    /// Per-experience entries; only populated under the past-experience tab.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChecklistStatus>,
}

impl ChecklistStatus {
    pub fn new(label: impl Into<String>, status: StatusTag) -> Self {
        Self {
            label: label.into(),
            status: Some(status),
            extra: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The experience identifier of a child entry, if this is one.
    pub fn child_identifier(&self) -> Option<&str> {
        self.extra.get(CHILD_IDENTIFIER_KEY).map(String::as_str)
    }
}

/// Addresses either a whole tab or one experience child entry within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabPath {
    Tab(Tab),
    Child(Tab, ExperienceId),
}

/// One admission's checklist: a status per tab.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecklistTree {
    tabs: BTreeMap<Tab, ChecklistStatus>,
}

/// Failure of a checklist operation; the operation aborts without effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChecklistError {
    #[error("checklist tab '{0:?}' does not exist on this admission")]
    TabNotFound(Tab),
    #[error("no checklist entry for experience '{0:?}'")]
    ChildNotFound(ExperienceId),
    #[error("status '{status:?}' is not part of the enumeration of tab '{tab:?}'")]
    StatusNotAllowed { tab: Tab, status: StatusTag },
}

impl ChecklistTree {
    pub fn tab(&self, tab: Tab) -> Option<&ChecklistStatus> {
        self.tabs.get(&tab)
    }

    pub fn insert_tab(&mut self, tab: Tab, status: ChecklistStatus) {
        self.tabs.insert(tab, status);
    }

    pub fn tabs(&self) -> impl Iterator<Item = (Tab, &ChecklistStatus)> {
        self.tabs.iter().map(|(tab, status)| (*tab, status))
    }

    /// The child entry of `tab` whose `extra.identifiant` is `experience`.
    pub fn child(&self, tab: Tab, experience: ExperienceId) -> Result<&ChecklistStatus, ChecklistError> {
        let parent = self.tabs.get(&tab).ok_or(ChecklistError::TabNotFound(tab))?;
        let wanted = experience.0.to_string();
        parent
            .children
            .iter()
            .find(|child| child.child_identifier() == Some(wanted.as_str()))
            .ok_or(ChecklistError::ChildNotFound(experience))
    }

    /// Append a freshly initialized child entry under `tab`.
    pub fn append_child(&mut self, tab: Tab, child: ChecklistStatus) -> Result<(), ChecklistError> {
        let parent = self
            .tabs
            .get_mut(&tab)
            .ok_or(ChecklistError::TabNotFound(tab))?;
        parent.children.push(child);
        Ok(())
    }

    /// Write a new `(status, extra)` pair at `path`.
    ///
    /// The tag must belong to the tab's configured enumeration; the
    /// `(status, extra)` combination itself is intentionally not checked
    /// against the configuration. With `replace_extra` the stored extra is
    /// overwritten (a child entry keeps its experience identifier), otherwise
    /// the new keys are merged in (new keys win).
    pub fn set_status(
        &mut self,
        configuration: &ChecklistConfiguration,
        path: &TabPath,
        status: StatusTag,
        extra: BTreeMap<String, String>,
        replace_extra: bool,
    ) -> Result<(), ChecklistError> {
        let tab = match path {
            TabPath::Tab(tab) | TabPath::Child(tab, _) => *tab,
        };

        if !configuration.allows_status(tab, status) {
            return Err(ChecklistError::StatusNotAllowed { tab, status });
        }

        let entry = match path {
            TabPath::Tab(tab) => self
                .tabs
                .get_mut(tab)
                .ok_or(ChecklistError::TabNotFound(*tab))?,
            TabPath::Child(tab, experience) => {
                let parent = self
                    .tabs
                    .get_mut(tab)
                    .ok_or(ChecklistError::TabNotFound(*tab))?;
                let wanted = experience.0.to_string();
                parent
                    .children
                    .iter_mut()
                    .find(|child| child.child_identifier() == Some(wanted.as_str()))
                    .ok_or(ChecklistError::ChildNotFound(*experience))?
            }
        };

        entry.status = Some(status);
        if replace_extra {
            // A child entry is addressed through its experience identifier;
            // replacing the extra must not orphan it.
            let identifier = if matches!(path, TabPath::Child(..)) {
                entry.extra.get(CHILD_IDENTIFIER_KEY).cloned()
            } else {
                None
            };
            entry.extra = extra;
            if let Some(identifier) = identifier {
                entry
                    .extra
                    .insert(CHILD_IDENTIFIER_KEY.to_owned(), identifier);
            }
        } else {
            entry.extra.extend(extra);
        }

        Ok(())
    }
}

/// The canonical "to be processed" entry created when an experience becomes
/// valuated by an admission.
pub fn initialize_child_status(experience: ExperienceId) -> ChecklistStatus {
    ChecklistStatus::new("To be processed", StatusTag::InitialCandidat)
        .with_extra(CHILD_IDENTIFIER_KEY, experience.0.to_string())
}

/// Child entries to append when an experience is duplicated: one per admission
/// that already valuated the source experience.
///
/// The core only computes what must change; applying each entry (and the
/// surrounding transaction) is the command layer's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceDuplicationPlan {
    pub new_experience: ExperienceId,
    pub entries: Vec<(crate::domain::AdmissionId, ChecklistStatus)>,
}

pub fn plan_experience_duplication(
    valuated_admissions: &[crate::domain::AdmissionId],
    new_experience: ExperienceId,
) -> ExperienceDuplicationPlan {
    tracing::debug!(
        admissions = valuated_admissions.len(),
        experience = %new_experience.0,
        "planning checklist fan-out for duplicated experience"
    );
    ExperienceDuplicationPlan {
        new_experience,
        entries: valuated_admissions
            .iter()
            .map(|admission| (admission.clone(), initialize_child_status(new_experience)))
            .collect(),
    }
}
