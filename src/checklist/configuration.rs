//! Static per-tab checklist configuration: the valid `(status, extra)`
//! vocabulary of each tab, with hierarchical refinements used by the read-side
//! filters (e.g. authentication sub-states nested under a coarse in-progress
//! status).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::AdmissionContext;

use super::{StatusTag, Tab};

/// Authentication progress of one past-experience entry, tracked in the
/// `etat_authentification` extra key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticationState {
    NonConcerne,
    AuthentificationDemandee,
    EtablissementContacte,
    Vrai,
    Faux,
}

impl AuthenticationState {
    pub const ALL: [AuthenticationState; 5] = [
        Self::NonConcerne,
        Self::AuthentificationDemandee,
        Self::EtablissementContacte,
        Self::Vrai,
        Self::Faux,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NonConcerne => "NON_CONCERNE",
            Self::AuthentificationDemandee => "AUTHENTIFICATION_DEMANDEE",
            Self::EtablissementContacte => "ETABLISSEMENT_CONTACTE",
            Self::Vrai => "VRAI",
            Self::Faux => "FAUX",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::NonConcerne => "Not concerned",
            Self::AuthentificationDemandee => "Authentication requested",
            Self::EtablissementContacte => "Institution contacted",
            Self::Vrai => "Authenticated",
            Self::Faux => "False",
        }
    }
}

/// Progress of a dispensation request, tracked in the
/// `etat_besoin_derogation` extra key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispensationState {
    NonConcerne,
    AvisDirectionDemande,
    BesoinDeComplement,
    RefusDirection,
    AccordDirection,
}

impl DispensationState {
    pub const ALL: [DispensationState; 5] = [
        Self::NonConcerne,
        Self::AvisDirectionDemande,
        Self::BesoinDeComplement,
        Self::RefusDirection,
        Self::AccordDirection,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NonConcerne => "NON_CONCERNE",
            Self::AvisDirectionDemande => "AVIS_DIRECTION_DEMANDE",
            Self::BesoinDeComplement => "BESOIN_DE_COMPLEMENT",
            Self::RefusDirection => "REFUS_DIRECTION",
            Self::AccordDirection => "ACCORD_DIRECTION",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::NonConcerne => "Not concerned",
            Self::AvisDirectionDemande => "Management opinion requested",
            Self::BesoinDeComplement => "Additional information needed",
            Self::RefusDirection => "Refused by management",
            Self::AccordDirection => "Granted by management",
        }
    }
}

/// One valid `(status, extra)` combination of a tab.
///
/// Entries with a `parent_identifier` are refinements of a coarser entry,
/// used for hierarchical filtering; they may carry no status tag of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistStatusConfiguration {
    pub identifier: String,
    pub label: String,
    pub status: Option<StatusTag>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_identifier: Option<String>,
}

impl ChecklistStatusConfiguration {
    fn new(identifier: &str, label: &str, status: StatusTag) -> Self {
        Self {
            identifier: identifier.to_owned(),
            label: label.to_owned(),
            status: Some(status),
            extra: BTreeMap::new(),
            parent_identifier: None,
        }
    }

    fn refinement(identifier: &str, label: &str, parent: &str) -> Self {
        Self {
            identifier: identifier.to_owned(),
            label: label.to_owned(),
            status: None,
            extra: BTreeMap::new(),
            parent_identifier: Some(parent.to_owned()),
        }
    }

    fn with_extra(mut self, key: &str, value: &str) -> Self {
        self.extra.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Whether a stored `(status, extra)` pair matches this configuration:
    /// the tags must agree and the configured extra must be a subset of the
    /// stored extra.
    pub fn matches(&self, status: Option<StatusTag>, extra: &BTreeMap<String, String>) -> bool {
        let Some(configured) = self.status else {
            return false;
        };
        status == Some(configured)
            && self
                .extra
                .iter()
                .all(|(key, value)| extra.get(key) == Some(value))
    }

    /// Combine a refinement with its parent so both predicates must hold:
    /// the parent supplies the missing status tag and its extra keys win on
    /// conflict.
    pub fn merge_with_parent(&self, parent: &ChecklistStatusConfiguration) -> Self {
        let mut extra = self.extra.clone();
        extra.extend(parent.extra.clone());
        Self {
            identifier: self.identifier.clone(),
            label: self.label.clone(),
            status: self.status.or(parent.status),
            extra,
            parent_identifier: self.parent_identifier.clone(),
        }
    }
}

/// All valid status configurations of one tab, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistTabConfiguration {
    pub tab: Tab,
    pub statuses: Vec<ChecklistStatusConfiguration>,
}

impl ChecklistTabConfiguration {
    pub fn entry(&self, identifier: &str) -> Option<&ChecklistStatusConfiguration> {
        self.statuses
            .iter()
            .find(|entry| entry.identifier == identifier)
    }

    /// The first configuration matching a stored `(status, extra)` pair.
    pub fn matching_entry(
        &self,
        status: Option<StatusTag>,
        extra: &BTreeMap<String, String>,
    ) -> Option<&ChecklistStatusConfiguration> {
        self.statuses.iter().find(|entry| entry.matches(status, extra))
    }
}

/// Per-context checklist configuration, built once at process start and
/// injected wherever statuses are written or filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistConfiguration {
    pub context: AdmissionContext,
    pub tabs: Vec<ChecklistTabConfiguration>,
}

impl ChecklistConfiguration {
    pub fn for_context(context: AdmissionContext) -> Self {
        match context {
            AdmissionContext::Doctoral => Self::doctoral(),
            AdmissionContext::General => Self::general(),
            AdmissionContext::Continuing => Self::continuing(),
        }
    }

    pub fn doctoral() -> Self {
        Self {
            context: AdmissionContext::Doctoral,
            tabs: vec![
                personal_data_tab(),
                assimilation_tab(),
                past_experience_tab(),
                financeability_tab(),
                course_choice_tab(),
                research_project_tab(),
                cdd_decision_tab(),
                sic_decision_tab(),
            ],
        }
    }

    pub fn general() -> Self {
        Self {
            context: AdmissionContext::General,
            tabs: vec![
                personal_data_tab(),
                assimilation_tab(),
                application_fees_tab(),
                past_experience_tab(),
                financeability_tab(),
                course_choice_tab(),
                training_specificities_tab(),
                fac_decision_tab(),
                sic_decision_tab(),
            ],
        }
    }

    pub fn continuing() -> Self {
        Self {
            context: AdmissionContext::Continuing,
            tabs: vec![
                personal_data_tab(),
                past_experience_tab(),
                course_choice_tab(),
                fac_decision_tab(),
            ],
        }
    }

    pub fn tab(&self, tab: Tab) -> Option<&ChecklistTabConfiguration> {
        self.tabs.iter().find(|configured| configured.tab == tab)
    }

    /// Whether `status` belongs to the tab's configured status enumeration.
    /// This is the only write-time guard; `(status, extra)` combinations are
    /// not gated.
    pub fn allows_status(&self, tab: Tab, status: StatusTag) -> bool {
        self.tab(tab)
            .map(|configured| {
                configured
                    .statuses
                    .iter()
                    .any(|entry| entry.status == Some(status))
            })
            .unwrap_or(false)
    }
}

fn personal_data_tab() -> ChecklistTabConfiguration {
    ChecklistTabConfiguration {
        tab: Tab::PersonalData,
        statuses: vec![
            ChecklistStatusConfiguration::new("A_TRAITER", "To be processed", StatusTag::InitialCandidat),
            ChecklistStatusConfiguration::new("A_COMPLETER", "To be completed", StatusTag::GestBlocage)
                .with_extra("fraud", "0"),
            ChecklistStatusConfiguration::new("FRAUDEUR", "Fraudster", StatusTag::GestBlocage)
                .with_extra("fraud", "1"),
            ChecklistStatusConfiguration::new("VALIDEES", "Validated", StatusTag::GestReussite),
        ],
    }
}

fn assimilation_tab() -> ChecklistTabConfiguration {
    ChecklistTabConfiguration {
        tab: Tab::Assimilation,
        statuses: vec![
            ChecklistStatusConfiguration::new("NON_CONCERNE", "Not concerned", StatusTag::InitialNonConcerne),
            ChecklistStatusConfiguration::new(
                "DECLARE_ASSIMILE_OU_PAS",
                "Declared assimilated or not",
                StatusTag::InitialCandidat,
            ),
            ChecklistStatusConfiguration::new("A_COMPLETER", "To be completed", StatusTag::GestBlocage),
            ChecklistStatusConfiguration::new("AVIS_EXPERT", "Expert opinion", StatusTag::GestEnCours),
            ChecklistStatusConfiguration::new(
                "A_COMPLETER_APRES_INSCRIPTION",
                "To be completed after enrolment",
                StatusTag::GestBlocageUlterieur,
            ),
            ChecklistStatusConfiguration::new("VALIDEE", "Validated", StatusTag::GestReussite),
        ],
    }
}

fn past_experience_tab() -> ChecklistTabConfiguration {
    let mut statuses = vec![
        ChecklistStatusConfiguration::new("A_TRAITER", "To be processed", StatusTag::InitialCandidat),
        ChecklistStatusConfiguration::new("A_COMPLETER", "To be completed", StatusTag::GestBlocage),
        ChecklistStatusConfiguration::new("AUTHENTIFICATION", "Authentication", StatusTag::GestEnCours)
            .with_extra("authentification", "1"),
    ];

    statuses.extend(AuthenticationState::ALL.into_iter().map(|state| {
        ChecklistStatusConfiguration::refinement(
            &format!("AUTHENTIFICATION.{}", state.as_str()),
            state.label(),
            "AUTHENTIFICATION",
        )
        .with_extra("etat_authentification", state.as_str())
    }));

    statuses.extend([
        ChecklistStatusConfiguration::new("AVIS_EXPERT", "Expert opinion", StatusTag::GestEnCours)
            .with_extra("authentification", "0"),
        ChecklistStatusConfiguration::new(
            "A_COMPLETER_APRES_INSCRIPTION",
            "To complete after enrolment",
            StatusTag::GestBlocageUlterieur,
        ),
        ChecklistStatusConfiguration::new("VALIDEE", "Validated", StatusTag::GestReussite),
    ]);

    ChecklistTabConfiguration {
        tab: Tab::PastExperience,
        statuses,
    }
}

fn financeability_tab() -> ChecklistTabConfiguration {
    let mut statuses = vec![
        ChecklistStatusConfiguration::new("NON_CONCERNE", "Not concerned", StatusTag::InitialNonConcerne),
        ChecklistStatusConfiguration::new("A_TRAITER", "To be processed", StatusTag::InitialCandidat),
        ChecklistStatusConfiguration::new("AVIS_EXPERT", "Expert opinion", StatusTag::GestEnCours)
            .with_extra("en_cours", "expert"),
        ChecklistStatusConfiguration::new("BESOIN_DEROGATION", "Dispensation needed", StatusTag::GestEnCours)
            .with_extra("en_cours", "derogation"),
    ];

    statuses.extend(dispensation_refinements());

    statuses.extend([
        ChecklistStatusConfiguration::new("A_COMPLETER", "To be completed", StatusTag::GestBlocage)
            .with_extra("to_be_completed", "1"),
        ChecklistStatusConfiguration::new("NON_FINANCABLE", "Not financeable", StatusTag::GestBlocage)
            .with_extra("to_be_completed", "0"),
        ChecklistStatusConfiguration::new("DEROGATION_ACCORDEE", "Dispensation granted", StatusTag::GestReussite)
            .with_extra("reussite", "derogation"),
        ChecklistStatusConfiguration::new("FINANCABLE", "Financeable", StatusTag::GestReussite)
            .with_extra("reussite", "financable"),
    ]);

    ChecklistTabConfiguration {
        tab: Tab::Financeability,
        statuses,
    }
}

fn course_choice_tab() -> ChecklistTabConfiguration {
    ChecklistTabConfiguration {
        tab: Tab::CourseChoice,
        statuses: vec![
            ChecklistStatusConfiguration::new("A_TRAITER", "To be processed", StatusTag::InitialCandidat),
            ChecklistStatusConfiguration::new("VALIDE", "Validated", StatusTag::GestReussite),
        ],
    }
}

fn research_project_tab() -> ChecklistTabConfiguration {
    ChecklistTabConfiguration {
        tab: Tab::ResearchProject,
        statuses: vec![
            ChecklistStatusConfiguration::new("A_TRAITER", "To be processed", StatusTag::InitialCandidat),
            ChecklistStatusConfiguration::new("A_COMPLETER", "To be completed", StatusTag::GestBlocage),
            ChecklistStatusConfiguration::new("VALIDE", "Validated", StatusTag::GestReussite),
        ],
    }
}

fn application_fees_tab() -> ChecklistTabConfiguration {
    ChecklistTabConfiguration {
        tab: Tab::ApplicationFees,
        statuses: vec![
            ChecklistStatusConfiguration::new("A_TRAITER", "To be processed", StatusTag::InitialCandidat),
            // First payment request vs reminder.
            ChecklistStatusConfiguration::new("RECLAMES", "Payment requested", StatusTag::GestBlocage)
                .with_extra("initial", "1"),
            ChecklistStatusConfiguration::new("RECLAMES_RAPPEL", "Payment reminder sent", StatusTag::GestBlocage)
                .with_extra("initial", "0"),
            ChecklistStatusConfiguration::new("DISPENSES", "Exempted", StatusTag::GestReussite),
            ChecklistStatusConfiguration::new("PAYES", "Paid", StatusTag::SystReussite),
        ],
    }
}

fn training_specificities_tab() -> ChecklistTabConfiguration {
    ChecklistTabConfiguration {
        tab: Tab::TrainingSpecificities,
        statuses: vec![
            ChecklistStatusConfiguration::new("A_TRAITER", "To be processed", StatusTag::InitialCandidat),
            ChecklistStatusConfiguration::new("A_COMPLETER", "To be completed", StatusTag::GestBlocage),
            ChecklistStatusConfiguration::new("VALIDE", "Validated", StatusTag::GestReussite),
        ],
    }
}

fn cdd_decision_tab() -> ChecklistTabConfiguration {
    ChecklistTabConfiguration {
        tab: Tab::CddDecision,
        statuses: decision_statuses(),
    }
}

fn fac_decision_tab() -> ChecklistTabConfiguration {
    ChecklistTabConfiguration {
        tab: Tab::FacDecision,
        statuses: decision_statuses(),
    }
}

fn decision_statuses() -> Vec<ChecklistStatusConfiguration> {
    vec![
        ChecklistStatusConfiguration::new("A_TRAITER", "To be processed", StatusTag::InitialCandidat),
        ChecklistStatusConfiguration::new("PRIS_EN_CHARGE", "Taken in charge", StatusTag::GestEnCours),
        ChecklistStatusConfiguration::new("A_COMPLETER_PAR_SIC", "To be completed by SIC", StatusTag::GestBlocage)
            .with_extra("decision", "HORS_DECISION"),
        ChecklistStatusConfiguration::new("CLOTURE", "Closed", StatusTag::GestBlocage)
            .with_extra("decision", "CLOTURE"),
        ChecklistStatusConfiguration::new("REFUS", "Refusal", StatusTag::GestBlocage)
            .with_extra("decision", "EN_DECISION"),
        ChecklistStatusConfiguration::new("ACCORD", "Approval", StatusTag::GestReussite),
    ]
}

fn sic_decision_tab() -> ChecklistTabConfiguration {
    let mut statuses = vec![
        ChecklistStatusConfiguration::new("A_TRAITER", "To be processed", StatusTag::InitialCandidat),
        ChecklistStatusConfiguration::new("A_COMPLETER", "Manager follow-up", StatusTag::GestBlocage)
            .with_extra("blocage", "to_be_completed"),
        ChecklistStatusConfiguration::new("BESOIN_DEROGATION", "Dispensation needed", StatusTag::GestEnCours)
            .with_extra("en_cours", "derogation"),
    ];

    statuses.extend(dispensation_refinements());

    statuses.extend([
        ChecklistStatusConfiguration::new("REFUS_A_VALIDER", "Refusal to validate", StatusTag::GestEnCours)
            .with_extra("en_cours", "refusal"),
        ChecklistStatusConfiguration::new("AUTORISATION_A_VALIDER", "Approval to validate", StatusTag::GestEnCours)
            .with_extra("en_cours", "approval"),
        ChecklistStatusConfiguration::new("CLOTURE", "Closed", StatusTag::GestBlocage)
            .with_extra("blocage", "closed"),
        ChecklistStatusConfiguration::new("REFUSE", "Refused", StatusTag::GestBlocage)
            .with_extra("blocage", "refusal"),
        ChecklistStatusConfiguration::new("AUTORISE", "Approved", StatusTag::GestReussite),
    ]);

    ChecklistTabConfiguration {
        tab: Tab::SicDecision,
        statuses,
    }
}

fn dispensation_refinements() -> impl Iterator<Item = ChecklistStatusConfiguration> {
    DispensationState::ALL.into_iter().map(|state| {
        ChecklistStatusConfiguration::refinement(
            &format!("BESOIN_DEROGATION.{}", state.as_str()),
            state.label(),
            "BESOIN_DEROGATION",
        )
        .with_extra("etat_besoin_derogation", state.as_str())
    })
}
