//! End-to-end coverage of the document requirement engine against counting
//! collaborator doubles.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use admission_core::documents::{
    free_manager_identifier, initialize_free_slot, recalculate_non_free_requirements,
    system_identifier, ActorDirectory, ActorSummary, DocumentRequest, DocumentRequirementEngine,
    DocumentSection, DocumentSlotStatus, DocumentSlotType, FileMetadata, FileMetadataProvider,
    RequestDetails, SectionAttachment, SystemDocument,
};
use admission_core::{ActorId, Admission, AdmissionContext, AdmissionId, AuditStamp, CandidateId};

#[derive(Default)]
struct CountingDirectory {
    actors: BTreeMap<ActorId, ActorSummary>,
    calls: Cell<usize>,
}

impl CountingDirectory {
    fn with_actor(id: &str, first: &str, last: &str) -> Self {
        let id = ActorId(id.to_owned());
        let mut actors = BTreeMap::new();
        actors.insert(
            id.clone(),
            ActorSummary {
                id,
                first_name: first.to_owned(),
                last_name: last.to_owned(),
            },
        );
        Self {
            actors,
            calls: Cell::new(0),
        }
    }
}

impl ActorDirectory for CountingDirectory {
    fn search_by_ids(&self, ids: &BTreeSet<ActorId>) -> BTreeMap<ActorId, ActorSummary> {
        self.calls.set(self.calls.get() + 1);
        ids.iter()
            .filter_map(|id| self.actors.get(id).cloned().map(|actor| (id.clone(), actor)))
            .collect()
    }
}

#[derive(Default)]
struct CountingBlobStore {
    files: BTreeMap<Uuid, FileMetadata>,
    calls: Cell<usize>,
}

impl FileMetadataProvider for CountingBlobStore {
    fn metadata_by_uuid(&self, uuids: &[Uuid]) -> BTreeMap<Uuid, FileMetadata> {
        self.calls.set(self.calls.get() + 1);
        uuids
            .iter()
            .filter_map(|id| self.files.get(id).cloned().map(|file| (*id, file)))
            .collect()
    }
}

fn catalog() -> Vec<DocumentSection> {
    vec![
        DocumentSection {
            identifier: "IDENTIFICATION".to_owned(),
            label: "Identification".to_owned(),
            attachments: vec![
                SectionAttachment {
                    identifier: "PASSEPORT".to_owned(),
                    label: "Passport".to_owned(),
                    required: true,
                    uploaded: vec![],
                },
                SectionAttachment {
                    identifier: "PHOTO_IDENTITE".to_owned(),
                    label: "Identity photo".to_owned(),
                    required: true,
                    uploaded: vec![Uuid::new_v4()],
                },
            ],
        },
        DocumentSection {
            identifier: "COMPTABILITE".to_owned(),
            label: "Accounting".to_owned(),
            attachments: vec![SectionAttachment {
                identifier: "ATTESTATION_CPAS".to_owned(),
                label: "CPAS certificate".to_owned(),
                required: false,
                uploaded: vec![],
            }],
        },
    ]
}

fn general_admission() -> Admission {
    let mut admission = Admission::new(
        AdmissionId(Uuid::new_v4()),
        CandidateId("00112233".to_owned()),
        AdmissionContext::General,
    );
    admission.generated.analysis_report = vec![Uuid::new_v4()];
    admission.fac_internal_documents = vec![Uuid::new_v4()];
    admission.sic_internal_documents = vec![Uuid::new_v4()];
    admission
}

#[test]
fn slots_are_ordered_sections_then_free_then_system() {
    let admission = general_admission();
    let directory = CountingDirectory::default();
    let blobs = CountingBlobStore::default();
    let engine = DocumentRequirementEngine::new(&directory, &blobs);

    let slots = engine.build_requirement_list(&admission, &catalog(), true);

    let identifiers: Vec<String> = slots.iter().map(|slot| slot.identifier.clone()).collect();
    assert_eq!(
        identifiers,
        vec![
            "IDENTIFICATION.PASSEPORT".to_owned(),
            "IDENTIFICATION.PHOTO_IDENTITE".to_owned(),
            "COMPTABILITE.ATTESTATION_CPAS".to_owned(),
            free_manager_identifier(admission.fac_internal_documents[0]),
            free_manager_identifier(admission.sic_internal_documents[0]),
            system_identifier(SystemDocument::DossierAnalyse),
        ]
    );

    // Required and missing, uploaded, optional and missing.
    assert_eq!(slots[0].status, DocumentSlotStatus::AReclamer);
    assert_eq!(slots[1].status, DocumentSlotStatus::NonAnalyse);
    assert_eq!(slots[2].status, DocumentSlotStatus::NonAnalyse);
    // Free and system slots are always validated.
    assert!(slots[3..].iter().all(|slot| slot.status == DocumentSlotStatus::Valide));
    assert_eq!(slots[5].slot_type, DocumentSlotType::Systeme);
}

#[test]
fn requested_free_slots_appear_between_sections_and_internal_uploads() {
    let mut admission = general_admission();
    let stamp = AuditStamp {
        actor: ActorId("00321234".to_owned()),
        at: Utc.with_ymd_and_hms(2025, 1, 10, 14, 0, 0).unwrap(),
    };
    let identifier = initialize_free_slot(
        &mut admission,
        DocumentSlotType::LibreReclamableSic,
        "Signed declaration",
        RequestDetails {
            reason: "Missing signature".to_owned(),
            ..RequestDetails::default()
        },
        &stamp,
    )
    .unwrap();

    let directory = CountingDirectory::with_actor("00321234", "Marie", "Dupont");
    let blobs = CountingBlobStore::default();
    let engine = DocumentRequirementEngine::new(&directory, &blobs);

    let slots = engine.build_requirement_list(&admission, &catalog(), true);
    let identifiers: Vec<String> = slots.iter().map(|slot| slot.identifier.clone()).collect();
    assert_eq!(
        identifiers,
        vec![
            "IDENTIFICATION.PASSEPORT".to_owned(),
            "IDENTIFICATION.PHOTO_IDENTITE".to_owned(),
            "COMPTABILITE.ATTESTATION_CPAS".to_owned(),
            identifier.clone(),
            free_manager_identifier(admission.fac_internal_documents[0]),
            free_manager_identifier(admission.sic_internal_documents[0]),
            system_identifier(SystemDocument::DossierAnalyse),
        ]
    );

    let slot = slots.iter().find(|slot| slot.identifier == identifier).unwrap();
    assert_eq!(slot.slot_type, DocumentSlotType::LibreReclamableSic);
    assert_eq!(slot.label, "Signed declaration");
    assert_eq!(slot.status, DocumentSlotStatus::Reclame);
    assert_eq!(
        slot.last_actor.as_ref().map(|actor| actor.last_name.as_str()),
        Some("Dupont")
    );

    let requested = engine.requested_slots(&slots);
    assert!(requested.iter().any(|slot| slot.identifier == identifier));
}

#[test]
fn stored_requests_override_the_default_status() {
    let mut admission = general_admission();
    admission.document_requests.insert(
        "COMPTABILITE.ATTESTATION_CPAS".to_owned(),
        DocumentRequest {
            status: DocumentSlotStatus::Reclame,
            reason: "Needed for assimilation".to_owned(),
            ..DocumentRequest::non_libre()
        },
    );

    let directory = CountingDirectory::default();
    let blobs = CountingBlobStore::default();
    let engine = DocumentRequirementEngine::new(&directory, &blobs);

    let slots = engine.build_requirement_list(&admission, &catalog(), false);
    let cpas = slots
        .iter()
        .find(|slot| slot.identifier == "COMPTABILITE.ATTESTATION_CPAS")
        .unwrap();
    assert_eq!(cpas.status, DocumentSlotStatus::Reclame);
    assert_eq!(cpas.reason, "Needed for assimilation");

    let requested = engine.requested_slots(&slots);
    assert_eq!(requested.len(), 1);
    assert_eq!(requested[0].identifier, "COMPTABILITE.ATTESTATION_CPAS");
}

#[test]
fn building_twice_is_idempotent_with_one_batch_call_each_per_build() {
    let admission = general_admission();
    let directory = CountingDirectory::with_actor("00321234", "Marie", "Dupont");
    let blobs = CountingBlobStore::default();
    let engine = DocumentRequirementEngine::new(&directory, &blobs);
    let sections = catalog();

    let first = engine.build_requirement_list(&admission, &sections, true);
    let second = engine.build_requirement_list(&admission, &sections, true);

    assert_eq!(first, second);
    assert_eq!(directory.calls.get(), 2);
    assert_eq!(blobs.calls.get(), 2);
}

#[test]
fn last_actor_is_resolved_through_the_directory() {
    let mut admission = general_admission();
    admission.document_requests.insert(
        "IDENTIFICATION.PASSEPORT".to_owned(),
        DocumentRequest {
            status: DocumentSlotStatus::Reclame,
            last_actor: Some(ActorId("00321234".to_owned())),
            ..DocumentRequest::non_libre()
        },
    );
    // A second request pointing at an unknown actor must not fail.
    admission.document_requests.insert(
        "COMPTABILITE.ATTESTATION_CPAS".to_owned(),
        DocumentRequest {
            status: DocumentSlotStatus::Reclame,
            last_actor: Some(ActorId("99999999".to_owned())),
            ..DocumentRequest::non_libre()
        },
    );

    let directory = CountingDirectory::with_actor("00321234", "Marie", "Dupont");
    let blobs = CountingBlobStore::default();
    let engine = DocumentRequirementEngine::new(&directory, &blobs);

    let slots = engine.build_requirement_list(&admission, &catalog(), false);

    let passport = slots
        .iter()
        .find(|slot| slot.identifier == "IDENTIFICATION.PASSEPORT")
        .unwrap();
    assert_eq!(
        passport.last_actor.as_ref().map(|actor| actor.last_name.as_str()),
        Some("Dupont")
    );

    let cpas = slots
        .iter()
        .find(|slot| slot.identifier == "COMPTABILITE.ATTESTATION_CPAS")
        .unwrap();
    assert_eq!(cpas.last_actor, None);
}

#[test]
fn file_metadata_is_attached_to_uploaded_slots() {
    let admission = general_admission();
    // The catalog fixture regenerates uuids per call; build one stable copy.
    let sections = catalog();
    let uploaded = sections[0].attachments[1].uploaded[0];

    let directory = CountingDirectory::default();
    let mut blobs = CountingBlobStore::default();
    blobs.files.insert(
        uploaded,
        FileMetadata {
            name: "photo.jpg".to_owned(),
            mimetype: "image/jpeg".to_owned(),
            uploaded_at: Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap(),
            author: None,
        },
    );
    let engine = DocumentRequirementEngine::new(&directory, &blobs);

    let slots = engine.build_requirement_list(&admission, &sections, false);
    let slot = slots
        .iter()
        .find(|slot| slot.identifier == "IDENTIFICATION.PHOTO_IDENTITE")
        .unwrap();
    assert_eq!(slot.file.as_ref().map(|file| file.name.as_str()), Some("photo.jpg"));
}

#[test]
fn every_uploaded_file_of_a_slot_carries_its_metadata() {
    let admission = general_admission();
    let mut sections = catalog();
    let older = Uuid::new_v4();
    sections[0].attachments[1].uploaded.insert(0, older);
    let newest = sections[0].attachments[1].uploaded[1];

    let directory = CountingDirectory::default();
    let mut blobs = CountingBlobStore::default();
    blobs.files.insert(
        older,
        FileMetadata {
            name: "photo-2023.png".to_owned(),
            mimetype: "image/png".to_owned(),
            uploaded_at: Utc.with_ymd_and_hms(2023, 9, 15, 10, 0, 0).unwrap(),
            author: None,
        },
    );
    blobs.files.insert(
        newest,
        FileMetadata {
            name: "photo-2024.jpg".to_owned(),
            mimetype: "image/jpeg".to_owned(),
            uploaded_at: Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap(),
            author: None,
        },
    );
    let engine = DocumentRequirementEngine::new(&directory, &blobs);

    let slots = engine.build_requirement_list(&admission, &sections, false);
    let slot = slots
        .iter()
        .find(|slot| slot.identifier == "IDENTIFICATION.PHOTO_IDENTITE")
        .unwrap();

    // Both uploads are resolved in the single batch; `file` stays the newest.
    assert_eq!(slot.files.len(), 2);
    assert_eq!(slot.files[&older].mimetype, "image/png");
    assert_eq!(slot.files[&newest].mimetype, "image/jpeg");
    assert_eq!(
        slot.file.as_ref().map(|file| file.name.as_str()),
        Some("photo-2024.jpg")
    );
    assert_eq!(blobs.calls.get(), 1);
}

#[test]
fn recalculation_after_a_catalog_change_only_drops_regulatory_entries() {
    let mut admission = general_admission();
    admission.document_requests.insert(
        "COMPTABILITE.ATTESTATION_CPAS".to_owned(),
        DocumentRequest::non_libre(),
    );
    let free_id = free_manager_identifier(Uuid::new_v4());
    admission.document_requests.insert(
        free_id.clone(),
        DocumentRequest {
            slot_type: DocumentSlotType::LibreReclamableFac,
            status: DocumentSlotStatus::Reclame,
            ..DocumentRequest::non_libre()
        },
    );

    // Assimilation no longer applies, its section disappears.
    let mut sections = catalog();
    sections.retain(|section| section.identifier != "COMPTABILITE");

    let removed = recalculate_non_free_requirements(&mut admission, &sections);

    assert_eq!(removed, vec!["COMPTABILITE.ATTESTATION_CPAS".to_owned()]);
    assert!(admission.document_requests.contains_key(&free_id));
}
