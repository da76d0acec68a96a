//! Flattens the static catalog, the stored request map, and batch-fetched
//! actor and file metadata into the ordered slot list of one admission.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::domain::Admission;

use super::{
    attachment_identifier, free_manager_identifier, system_identifier, ActorDirectory,
    ActorSummary, DocumentRequest, DocumentSection, DocumentSlot, DocumentSlotStatus,
    DocumentSlotType, FileMetadata, FileMetadataProvider, SystemDocument,
};

/// Pure aggregation over an admission snapshot plus the static catalog.
///
/// The actor directory and metadata provider are each consulted exactly once
/// per [`build_requirement_list`](Self::build_requirement_list) call, whatever
/// the slot count.
pub struct DocumentRequirementEngine<'a, A, F> {
    actors: &'a A,
    files: &'a F,
}

impl<'a, A, F> DocumentRequirementEngine<'a, A, F>
where
    A: ActorDirectory,
    F: FileMetadataProvider,
{
    pub fn new(actors: &'a A, files: &'a F) -> Self {
        Self { actors, files }
    }

    /// The full ordered slot list: catalog sections in declared order, then
    /// free requestable requests, then free internal uploads (FAC before
    /// SIC), then system-generated files.
    pub fn build_requirement_list(
        &self,
        admission: &Admission,
        sections: &[DocumentSection],
        include_free_documents: bool,
    ) -> Vec<DocumentSlot> {
        let mut pending: Vec<PendingSlot> = Vec::new();

        for section in sections {
            for attachment in &section.attachments {
                let identifier =
                    attachment_identifier(&section.identifier, &attachment.identifier);
                let request = admission.document_requests.get(&identifier);

                let status = if attachment.required && attachment.uploaded.is_empty() {
                    DocumentSlotStatus::AReclamer
                } else if let Some(request) = request {
                    request.status
                } else {
                    DocumentSlotStatus::NonAnalyse
                };

                pending.push(PendingSlot {
                    identifier,
                    label: attachment.label.clone(),
                    slot_type: request
                        .map(|request| request.slot_type)
                        .unwrap_or(DocumentSlotType::NonLibre),
                    status,
                    required: attachment.required,
                    uploaded: attachment.uploaded.clone(),
                    request: request.cloned(),
                });
            }
        }

        if include_free_documents {
            let free_requests = admission
                .document_requests
                .iter()
                .filter(|(_, request)| request.slot_type.is_free() && request.slot_type.is_requestable());
            for (identifier, request) in free_requests {
                pending.push(PendingSlot {
                    identifier: identifier.clone(),
                    label: request.label.clone(),
                    slot_type: request.slot_type,
                    status: request.status,
                    required: false,
                    uploaded: Vec::new(),
                    request: Some(request.clone()),
                });
            }

            let internal = admission
                .fac_internal_documents
                .iter()
                .map(|file| (*file, DocumentSlotType::LibreInterneFac))
                .chain(
                    admission
                        .sic_internal_documents
                        .iter()
                        .map(|file| (*file, DocumentSlotType::LibreInterneSic)),
                );
            for (file, slot_type) in internal {
                let identifier = free_manager_identifier(file);
                let request = admission.document_requests.get(&identifier);
                pending.push(PendingSlot {
                    identifier,
                    label: request
                        .map(|request| request.label.clone())
                        .unwrap_or_default(),
                    slot_type,
                    status: DocumentSlotStatus::Valide,
                    required: false,
                    uploaded: vec![file],
                    request: request.cloned(),
                });
            }
        }

        for document in SystemDocument::for_context(admission.context) {
            let uploaded = document.uuids(&admission.generated);
            if uploaded.is_empty() {
                continue;
            }
            pending.push(PendingSlot {
                identifier: system_identifier(*document),
                label: document.label().to_owned(),
                slot_type: DocumentSlotType::Systeme,
                status: DocumentSlotStatus::Valide,
                required: false,
                uploaded: uploaded.to_vec(),
                request: None,
            });
        }

        self.resolve(pending)
    }

    /// The catalog-derived and system slots only, free uploads excluded.
    pub fn non_free_slots(
        &self,
        admission: &Admission,
        sections: &[DocumentSection],
    ) -> Vec<DocumentSlot> {
        self.build_requirement_list(admission, sections, false)
    }

    /// Only the slots the candidate currently has to act on.
    pub fn requested_slots(&self, slots: &[DocumentSlot]) -> Vec<DocumentSlot> {
        slots
            .iter()
            .filter(|slot| slot.status == DocumentSlotStatus::Reclame)
            .cloned()
            .collect()
    }

    /// One metadata batch, one actor batch, then assembly.
    fn resolve(&self, pending: Vec<PendingSlot>) -> Vec<DocumentSlot> {
        let file_ids: Vec<Uuid> = pending
            .iter()
            .flat_map(|slot| slot.uploaded.iter().copied())
            .collect();
        let metadata = self.files.metadata_by_uuid(&file_ids);

        let mut actor_ids = BTreeSet::new();
        for slot in &pending {
            if let Some(request) = &slot.request {
                if let Some(actor) = &request.last_actor {
                    actor_ids.insert(actor.clone());
                }
            }
            for author in slot
                .uploaded
                .iter()
                .filter_map(|file| metadata.get(file))
                .filter_map(|file| file.author.clone())
            {
                actor_ids.insert(author);
            }
        }
        let actors = self.actors.search_by_ids(&actor_ids);

        tracing::debug!(
            slots = pending.len(),
            files = file_ids.len(),
            actors = actor_ids.len(),
            "resolved document requirement batches"
        );

        pending
            .into_iter()
            .map(|slot| {
                let files: BTreeMap<Uuid, FileMetadata> = slot
                    .uploaded
                    .iter()
                    .filter_map(|id| metadata.get(id).map(|file| (*id, file.clone())))
                    .collect();
                let file: Option<FileMetadata> =
                    slot.uploaded.last().and_then(|id| files.get(id)).cloned();
                let last_actor: Option<ActorSummary> = slot
                    .request
                    .as_ref()
                    .and_then(|request| request.last_actor.as_ref())
                    .or_else(|| file.as_ref().and_then(|file| file.author.as_ref()))
                    .and_then(|actor| actors.get(actor))
                    .cloned();

                DocumentSlot {
                    identifier: slot.identifier,
                    label: slot.label,
                    slot_type: slot.slot_type,
                    status: slot.status,
                    required: slot.required,
                    uploaded: slot.uploaded,
                    reason: slot
                        .request
                        .as_ref()
                        .map(|request| request.reason.clone())
                        .unwrap_or_default(),
                    timing: slot.request.as_ref().and_then(|request| request.timing),
                    requested_at: slot
                        .request
                        .as_ref()
                        .and_then(|request| request.requested_at),
                    deadline_at: slot
                        .request
                        .as_ref()
                        .and_then(|request| request.deadline_at),
                    last_actor,
                    file,
                    files,
                    related_tab: slot
                        .request
                        .as_ref()
                        .and_then(|request| request.related_tab),
                }
            })
            .collect()
    }
}

struct PendingSlot {
    identifier: String,
    label: String,
    slot_type: DocumentSlotType,
    status: DocumentSlotStatus,
    required: bool,
    uploaded: Vec<Uuid>,
    request: Option<DocumentRequest>,
}

/// Drop stored regulatory entries whose identifier left the structural
/// catalog; free and system entries are lifecycle-independent and always
/// survive. Returns the removed identifiers.
pub fn recalculate_non_free_requirements(
    admission: &mut Admission,
    sections: &[DocumentSection],
) -> Vec<String> {
    let known: BTreeSet<String> = sections
        .iter()
        .flat_map(|section| {
            section.attachments.iter().map(|attachment| {
                attachment_identifier(&section.identifier, &attachment.identifier)
            })
        })
        .collect();

    let stale: Vec<String> = admission
        .document_requests
        .iter()
        .filter(|(identifier, request)| {
            request.slot_type == DocumentSlotType::NonLibre && !known.contains(*identifier)
        })
        .map(|(identifier, _)| identifier.clone())
        .collect();

    for identifier in &stale {
        admission.document_requests.remove(identifier);
    }

    if !stale.is_empty() {
        tracing::debug!(
            admission = %admission.id.0,
            removed = stale.len(),
            "pruned stale regulatory document requests"
        );
    }

    stale
}
