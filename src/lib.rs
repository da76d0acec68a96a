//! Business core of the university admission management backend.
//!
//! Three cooperating subsystems, composed bottom-up:
//!
//! - [`assimilation`] — a recursive field-dependency resolver deriving, from a
//!   candidate's declared tuition-equivalence situation, the transitive set of
//!   supporting documents that must be provided, plus the accounting
//!   validators built on top of it.
//! - [`checklist`] — per-admission, per-tab review statuses with configured
//!   `(status, extra)` vocabularies, structural transition guards, and the
//!   read-side filters used by manager worklists.
//! - [`documents`] — the requirement engine that flattens the static document
//!   catalog, the stored request map, and batch-fetched file/actor metadata
//!   into the ordered list of document slots for an admission.
//!
//! [`curriculum`] adds the collect-all completeness report over a candidate's
//! experience history, built on the shared [`validation`] report type.
//!
//! Everything here is synchronous computation over a snapshot handed in by the
//! caller: persistence, HTTP, notifications, and permission checks are the
//! embedding application's concern, reached only through the collaborator
//! traits in [`documents`].

pub mod assimilation;
pub mod checklist;
pub mod config;
pub mod curriculum;
pub mod documents;
pub mod domain;
pub mod validation;

pub use config::EngineConfiguration;
pub use domain::{
    ActorId, Admission, AdmissionChecklist, AdmissionContext, AdmissionId, AuditStamp,
    CandidateId, ExperienceId, GeneratedDocuments,
};
pub use validation::ValidationReport;
