use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::collections::BTreeMap;

use crate::assimilation::AccountingAnswers;
use crate::checklist::{
    ChecklistConfiguration, ChecklistError, ChecklistStatus, ChecklistTree, StatusTag, Tab,
    TabPath,
};
use crate::documents::DocumentRequestMap;

/// Identifier wrapper for one admission dossier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdmissionId(pub Uuid);

/// Registry number of the candidate owning the dossier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Identifier of one curriculum experience (academic or non-academic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExperienceId(pub Uuid);

/// Registry number of a manager or other acting person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

/// Program context the admission was submitted for. Drives which checklist
/// tabs exist and which system-generated documents are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionContext {
    Doctoral,
    General,
    Continuing,
}

/// Who performed a mutation, and when. Supplied by the command layer; the core
/// never reads the clock itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub actor: ActorId,
    pub at: DateTime<Utc>,
}

/// The two checklist trees owned by an admission: the snapshot frozen at
/// submission time and the live tree mutated by managers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdmissionChecklist {
    pub initial: ChecklistTree,
    pub current: ChecklistTree,
}

/// File references produced by the system itself (never user-editable).
///
/// Certificates other than the analysis report only exist for the general
/// context; doctoral and continuing dossiers expose the analysis report alone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneratedDocuments {
    pub analysis_report: Vec<Uuid>,
    pub fac_approval_certificate: Vec<Uuid>,
    pub fac_refusal_certificate: Vec<Uuid>,
    pub sic_approval_certificate: Vec<Uuid>,
    pub sic_approval_annex: Vec<Uuid>,
    pub sic_refusal_certificate: Vec<Uuid>,
}

/// Read-modify-write snapshot of one admission dossier.
///
/// The aggregate exclusively owns its checklist trees and its document request
/// map; the resolver and requirement engine are pure functions over this state
/// plus the static configuration tables. Concurrent access must be serialized
/// per admission by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admission {
    pub id: AdmissionId,
    pub candidate: CandidateId,
    pub context: AdmissionContext,
    /// `None` when the nationality is not yet known.
    pub is_eu_citizen: Option<bool>,
    pub accounting: AccountingAnswers,
    pub checklist: AdmissionChecklist,
    pub document_requests: DocumentRequestMap,
    /// Free internal documents uploaded by SIC managers, newest last.
    pub sic_internal_documents: Vec<Uuid>,
    /// Free internal documents uploaded by FAC managers, newest last.
    pub fac_internal_documents: Vec<Uuid>,
    pub generated: GeneratedDocuments,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub last_modified_by: Option<ActorId>,
}

impl Admission {
    pub fn new(id: AdmissionId, candidate: CandidateId, context: AdmissionContext) -> Self {
        Self {
            id,
            candidate,
            context,
            is_eu_citizen: None,
            accounting: AccountingAnswers::default(),
            checklist: AdmissionChecklist::default(),
            document_requests: DocumentRequestMap::new(),
            sic_internal_documents: Vec::new(),
            fac_internal_documents: Vec::new(),
            generated: GeneratedDocuments::default(),
            last_modified_at: None,
            last_modified_by: None,
        }
    }

    /// Record the author of a state change on the aggregate.
    pub fn touch(&mut self, stamp: &AuditStamp) {
        self.last_modified_at = Some(stamp.at);
        self.last_modified_by = Some(stamp.actor.clone());
    }

    /// Write a `(status, extra)` pair on the current checklist tree and stamp
    /// the aggregate's audit fields. Aborts without effect on a guard error.
    pub fn set_checklist_status(
        &mut self,
        configuration: &ChecklistConfiguration,
        path: &TabPath,
        status: StatusTag,
        extra: BTreeMap<String, String>,
        replace_extra: bool,
        stamp: &AuditStamp,
    ) -> Result<(), ChecklistError> {
        self.checklist
            .current
            .set_status(configuration, path, status, extra, replace_extra)?;
        self.touch(stamp);
        Ok(())
    }

    /// Append one freshly initialized experience child entry, typically one
    /// item of an [`ExperienceDuplicationPlan`](crate::checklist::ExperienceDuplicationPlan).
    pub fn append_experience_child(
        &mut self,
        child: ChecklistStatus,
        stamp: &AuditStamp,
    ) -> Result<(), ChecklistError> {
        self.checklist.current.append_child(Tab::PastExperience, child)?;
        self.touch(stamp);
        Ok(())
    }

    /// Child checklist entries of the past-experience tab, one per valuated
    /// experience.
    pub fn experience_checklists(&self) -> &[crate::checklist::ChecklistStatus] {
        self.checklist
            .current
            .tab(Tab::PastExperience)
            .map(|status| status.children.as_slice())
            .unwrap_or(&[])
    }
}
