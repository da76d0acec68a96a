//! Document requirement slots: which documents an admission currently needs,
//! requested or not, and where each one stands.
//!
//! A slot is addressed by a composite string identifier. Regulatory slots use
//! `SECTION.ATTACHMENT`, free documents use `LIBRE_GESTIONNAIRE.<uuid>` or
//! `LIBRE_CANDIDAT.<uuid>`, system-generated files use `SYSTEME.<KEY>`. The
//! admission aggregate stores a request map keyed by these identifiers; the
//! [`engine`] flattens the static catalog, the request map, and batch-fetched
//! file and actor metadata into the ordered slot list.

pub mod engine;


pub use engine::{recalculate_non_free_requirements, DocumentRequirementEngine};

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checklist::Tab;
use crate::domain::{ActorId, Admission, AdmissionContext, GeneratedDocuments};

/// Identifier prefix of free documents uploaded or requested by a manager.
pub const FREE_MANAGER_PREFIX: &str = "LIBRE_GESTIONNAIRE";
/// Identifier prefix of free documents uploaded unprompted by the candidate.
pub const FREE_CANDIDATE_PREFIX: &str = "LIBRE_CANDIDAT";
/// Identifier prefix of system-generated documents.
pub const SYSTEM_PREFIX: &str = "SYSTEME";

/// How a slot entered the dossier, deciding who may edit or remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentSlotType {
    /// Regulatory document derived from the static catalog.
    NonLibre,
    /// Free document a SIC manager asked the candidate for.
    LibreReclamableSic,
    /// Free document a FAC manager asked the candidate for.
    LibreReclamableFac,
    /// Internal SIC upload, never shown to the candidate.
    LibreInterneSic,
    /// Internal FAC upload, never shown to the candidate.
    LibreInterneFac,
    /// Generated by the system itself.
    Systeme,
}

impl DocumentSlotType {
    pub const fn is_free(self) -> bool {
        matches!(
            self,
            Self::LibreReclamableSic
                | Self::LibreReclamableFac
                | Self::LibreInterneSic
                | Self::LibreInterneFac
        )
    }

    pub const fn is_requestable(self) -> bool {
        matches!(
            self,
            Self::NonLibre | Self::LibreReclamableSic | Self::LibreReclamableFac
        )
    }

    pub const fn is_internal(self) -> bool {
        matches!(self, Self::LibreInterneSic | Self::LibreInterneFac)
    }
}

/// Review status of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentSlotStatus {
    /// Required, missing, not yet requested from the candidate.
    AReclamer,
    /// Actively requested, awaiting the candidate.
    Reclame,
    /// Resubmitted by the candidate after a request.
    CompleteApresReclamation,
    /// Present or optional, not reviewed yet.
    NonAnalyse,
    Valide,
}

/// When a requested document is due relative to the admission workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestTiming {
    Immediatement,
    UlterieurementBloquant,
    UlterieurementNonBloquant,
}

/// Documents produced by the system itself. Always `VALIDE`, never editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemDocument {
    DossierAnalyse,
    AttestationAccordFacultaire,
    AttestationRefusFacultaire,
    AttestationAccordSic,
    AttestationAccordAnnexeSic,
    AttestationRefusSic,
}

impl SystemDocument {
    /// Decision certificates only exist for the general context.
    pub fn for_context(context: AdmissionContext) -> &'static [SystemDocument] {
        match context {
            AdmissionContext::General => &[
                Self::DossierAnalyse,
                Self::AttestationAccordFacultaire,
                Self::AttestationRefusFacultaire,
                Self::AttestationAccordSic,
                Self::AttestationAccordAnnexeSic,
                Self::AttestationRefusSic,
            ],
            AdmissionContext::Doctoral | AdmissionContext::Continuing => &[Self::DossierAnalyse],
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DossierAnalyse => "DOSSIER_ANALYSE",
            Self::AttestationAccordFacultaire => "ATTESTATION_ACCORD_FACULTAIRE",
            Self::AttestationRefusFacultaire => "ATTESTATION_REFUS_FACULTAIRE",
            Self::AttestationAccordSic => "ATTESTATION_ACCORD_SIC",
            Self::AttestationAccordAnnexeSic => "ATTESTATION_ACCORD_ANNEXE_SIC",
            Self::AttestationRefusSic => "ATTESTATION_REFUS_SIC",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::DossierAnalyse => "Analysis folder",
            Self::AttestationAccordFacultaire => "Faculty approval certificate",
            Self::AttestationRefusFacultaire => "Faculty refusal certificate",
            Self::AttestationAccordSic => "SIC approval certificate",
            Self::AttestationAccordAnnexeSic => "SIC approval annex",
            Self::AttestationRefusSic => "SIC refusal certificate",
        }
    }

    /// The generated file references backing this slot, empty until the
    /// system has produced the document.
    pub fn uuids(self, generated: &GeneratedDocuments) -> &[Uuid] {
        match self {
            Self::DossierAnalyse => &generated.analysis_report,
            Self::AttestationAccordFacultaire => &generated.fac_approval_certificate,
            Self::AttestationRefusFacultaire => &generated.fac_refusal_certificate,
            Self::AttestationAccordSic => &generated.sic_approval_certificate,
            Self::AttestationAccordAnnexeSic => &generated.sic_approval_annex,
            Self::AttestationRefusSic => &generated.sic_refusal_certificate,
        }
    }
}

/// Composite identifier of a catalog attachment.
pub fn attachment_identifier(section: &str, attachment: &str) -> String {
    format!("{section}.{attachment}")
}

/// Composite identifier of a manager-scoped free document.
pub fn free_manager_identifier(file: Uuid) -> String {
    format!("{FREE_MANAGER_PREFIX}.{file}")
}

/// Composite identifier of a candidate-scoped free document.
pub fn free_candidate_identifier(file: Uuid) -> String {
    format!("{FREE_CANDIDATE_PREFIX}.{file}")
}

/// Composite identifier of a system-generated document.
pub fn system_identifier(document: SystemDocument) -> String {
    format!("{}.{}", SYSTEM_PREFIX, document.as_str())
}

/// One attachment of a catalog section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAttachment {
    pub identifier: String,
    pub label: String,
    pub required: bool,
    /// File references already uploaded for this attachment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uploaded: Vec<Uuid>,
}

/// One document-bearing section of the static catalog, attachments in
/// declared display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub identifier: String,
    pub label: String,
    pub attachments: Vec<SectionAttachment>,
}

/// Stored request record of one slot, persisted on the admission aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub slot_type: DocumentSlotType,
    pub status: DocumentSlotStatus,
    /// Free documents carry their own label; empty for regulatory slots.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// Manager-facing justification of the request.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<RequestTiming>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_actor: Option<ActorId>,
    /// Checklist tab whose review triggered the request, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_tab: Option<Tab>,
}

impl DocumentRequest {
    /// A fresh regulatory entry, present in the map but not yet requested.
    pub fn non_libre() -> Self {
        Self {
            slot_type: DocumentSlotType::NonLibre,
            status: DocumentSlotStatus::NonAnalyse,
            label: String::new(),
            reason: String::new(),
            timing: None,
            requested_at: None,
            deadline_at: None,
            last_action_at: None,
            last_actor: None,
            related_tab: None,
        }
    }
}

/// Request records keyed by composite slot identifier.
pub type DocumentRequestMap = BTreeMap<String, DocumentRequest>;

/// Display DTO of an acting person, resolved through the actor directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub id: ActorId,
    pub first_name: String,
    pub last_name: String,
}

/// Blob-store metadata of one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub mimetype: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<ActorId>,
}

/// One resolved requirement slot, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSlot {
    pub identifier: String,
    pub label: String,
    pub slot_type: DocumentSlotType,
    pub status: DocumentSlotStatus,
    pub required: bool,
    pub uploaded: Vec<Uuid>,
    pub reason: String,
    pub timing: Option<RequestTiming>,
    pub requested_at: Option<DateTime<Utc>>,
    pub deadline_at: Option<NaiveDate>,
    pub last_actor: Option<ActorSummary>,
    /// Metadata of the most recent uploaded file, when known.
    pub file: Option<FileMetadata>,
    /// Metadata of every uploaded file with a known blob-store entry.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<Uuid, FileMetadata>,
    pub related_tab: Option<Tab>,
}

/// Failure of a document operation; the operation aborts without effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("no document requirement found for identifier '{identifier}'")]
    SlotNotFound { identifier: String },
    #[error("slot '{identifier}' is regulatory and cannot be removed, only re-statused")]
    NotRemovable { identifier: String },
    #[error("slot type {slot_type:?} cannot be initialized as a free requestable document")]
    NotFreeRequestable { slot_type: DocumentSlotType },
}

/// Batch-resolves actor identifiers to display DTOs. Unknown identifiers
/// simply yield no entry.
pub trait ActorDirectory {
    fn search_by_ids(&self, ids: &std::collections::BTreeSet<ActorId>) -> BTreeMap<ActorId, ActorSummary>;
}

/// Batch-resolves file references to their blob-store metadata. Unknown
/// references simply yield no entry.
pub trait FileMetadataProvider {
    fn metadata_by_uuid(&self, uuids: &[Uuid]) -> BTreeMap<Uuid, FileMetadata>;
}

/// Details supplied by a manager when requesting a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestDetails {
    pub reason: String,
    pub timing: Option<RequestTiming>,
    pub deadline_at: Option<NaiveDate>,
    pub related_tab: Option<Tab>,
}

/// Create a free requestable slot and immediately request it from the
/// candidate, minting its `LIBRE_GESTIONNAIRE.<uuid>` identifier.
///
/// This is the only way a free requestable record enters the dossier; it
/// lives outside the structural catalog and therefore survives requirement
/// recalculation until the request is cancelled or the slot removed.
pub fn initialize_free_slot(
    admission: &mut Admission,
    slot_type: DocumentSlotType,
    label: impl Into<String>,
    details: RequestDetails,
    stamp: &crate::domain::AuditStamp,
) -> Result<String, DocumentError> {
    if !matches!(
        slot_type,
        DocumentSlotType::LibreReclamableSic | DocumentSlotType::LibreReclamableFac
    ) {
        return Err(DocumentError::NotFreeRequestable { slot_type });
    }

    let identifier = free_manager_identifier(Uuid::new_v4());
    admission.document_requests.insert(
        identifier.clone(),
        DocumentRequest {
            slot_type,
            status: DocumentSlotStatus::Reclame,
            label: label.into(),
            reason: details.reason,
            timing: details.timing,
            requested_at: Some(stamp.at),
            deadline_at: details.deadline_at,
            last_action_at: Some(stamp.at),
            last_actor: Some(stamp.actor.clone()),
            related_tab: details.related_tab,
        },
    );
    admission.touch(stamp);
    Ok(identifier)
}

/// Mark a slot as actively requested from the candidate.
///
/// The identifier must either already carry a request record or belong to the
/// current structural catalog; anything else is a [`DocumentError::SlotNotFound`].
pub fn request_slot(
    admission: &mut Admission,
    sections: &[DocumentSection],
    identifier: &str,
    details: RequestDetails,
    stamp: &crate::domain::AuditStamp,
) -> Result<(), DocumentError> {
    if !admission.document_requests.contains_key(identifier) {
        let known = sections.iter().any(|section| {
            section.attachments.iter().any(|attachment| {
                attachment_identifier(&section.identifier, &attachment.identifier) == identifier
            })
        });
        if !known {
            return Err(DocumentError::SlotNotFound {
                identifier: identifier.to_owned(),
            });
        }
        admission
            .document_requests
            .insert(identifier.to_owned(), DocumentRequest::non_libre());
    }

    let request = admission
        .document_requests
        .get_mut(identifier)
        .ok_or_else(|| DocumentError::SlotNotFound {
            identifier: identifier.to_owned(),
        })?;

    if !request.slot_type.is_requestable() {
        return Err(DocumentError::SlotNotFound {
            identifier: identifier.to_owned(),
        });
    }

    request.status = DocumentSlotStatus::Reclame;
    request.reason = details.reason;
    request.timing = details.timing;
    request.deadline_at = details.deadline_at;
    request.related_tab = details.related_tab;
    request.requested_at = Some(stamp.at);
    request.last_action_at = Some(stamp.at);
    request.last_actor = Some(stamp.actor.clone());
    admission.touch(stamp);
    Ok(())
}

/// Withdraw an active request, restoring the pre-request state: regulatory
/// records fall back to `A_RECLAMER`, free requestable records only existed
/// because of the request and are dropped entirely.
pub fn cancel_request(
    admission: &mut Admission,
    identifier: &str,
    stamp: &crate::domain::AuditStamp,
) -> Result<(), DocumentError> {
    let slot_type = admission
        .document_requests
        .get(identifier)
        .map(|request| request.slot_type)
        .ok_or_else(|| DocumentError::SlotNotFound {
            identifier: identifier.to_owned(),
        })?;

    match slot_type {
        DocumentSlotType::NonLibre => {
            let request = admission
                .document_requests
                .get_mut(identifier)
                .ok_or_else(|| DocumentError::SlotNotFound {
                    identifier: identifier.to_owned(),
                })?;
            request.status = DocumentSlotStatus::AReclamer;
            request.reason = String::new();
            request.timing = None;
            request.deadline_at = None;
            request.requested_at = None;
            request.last_action_at = Some(stamp.at);
            request.last_actor = Some(stamp.actor.clone());
        }
        DocumentSlotType::LibreReclamableSic | DocumentSlotType::LibreReclamableFac => {
            admission.document_requests.remove(identifier);
        }
        _ => {
            // Internal and system records are never requested.
            return Err(DocumentError::SlotNotFound {
                identifier: identifier.to_owned(),
            });
        }
    }

    admission.touch(stamp);
    Ok(())
}

/// Hard-delete a free slot's request record. Regulatory slots are never
/// removed this way, their status transitions instead.
pub fn remove_free_slot(
    admission: &mut Admission,
    identifier: &str,
    stamp: &crate::domain::AuditStamp,
) -> Result<DocumentRequest, DocumentError> {
    let slot_type = admission
        .document_requests
        .get(identifier)
        .map(|request| request.slot_type)
        .ok_or_else(|| DocumentError::SlotNotFound {
            identifier: identifier.to_owned(),
        })?;

    if !slot_type.is_free() {
        return Err(DocumentError::NotRemovable {
            identifier: identifier.to_owned(),
        });
    }

    let removed = admission
        .document_requests
        .remove(identifier)
        .ok_or_else(|| DocumentError::SlotNotFound {
            identifier: identifier.to_owned(),
        })?;
    admission.touch(stamp);
    Ok(removed)
}
