use std::collections::BTreeMap;

use super::{fields, AccountingAnswers};

/// Static mapping from a discriminator field to the document fields each of
/// its choices requires. Some required fields are themselves discriminators,
/// so resolution is transitive.
///
/// Immutable once built; construct it at process start and pass it by
/// reference into the validators and the document requirement engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTable {
    entries: BTreeMap<&'static str, BTreeMap<&'static str, Vec<&'static str>>>,
}

/// Misconfiguration detected while walking the table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyTableError {
    #[error("dependency table is misconfigured: cycle through field '{field}'")]
    Cycle { field: String },
}

impl DependencyTable {
    /// The assimilation dependency graph: one entry per declared situation and
    /// sub-declaration, mapping each choice to its supporting documents.
    pub fn assimilation() -> Self {
        let mut entries: BTreeMap<&'static str, BTreeMap<&'static str, Vec<&'static str>>> =
            BTreeMap::new();

        entries.insert(
            fields::TYPE_SITUATION_ASSIMILATION,
            BTreeMap::from([
                (
                    "AUTORISATION_ETABLISSEMENT_OU_RESIDENT_LONGUE_DUREE",
                    vec![fields::SOUS_TYPE_SITUATION_ASSIMILATION_1],
                ),
                (
                    "REFUGIE_OU_APATRIDE_OU_PROTECTION_SUBSIDIAIRE_TEMPORAIRE",
                    vec![fields::SOUS_TYPE_SITUATION_ASSIMILATION_2],
                ),
                (
                    "AUTORISATION_SEJOUR_ET_REVENUS_PROFESSIONNELS_OU_REMPLACEMENT",
                    vec![fields::SOUS_TYPE_SITUATION_ASSIMILATION_3],
                ),
                ("PRIS_EN_CHARGE_OU_DESIGNE_CPAS", vec!["attestation_cpas"]),
                (
                    "PROCHE_A_NATIONALITE_UE_OU_RESPECTE_ASSIMILATIONS_1_A_4",
                    vec![
                        fields::RELATION_PARENTE,
                        fields::SOUS_TYPE_SITUATION_ASSIMILATION_5,
                    ],
                ),
                (
                    "A_BOURSE_ARTICLE_105_PARAGRAPH_2",
                    vec![fields::SOUS_TYPE_SITUATION_ASSIMILATION_6],
                ),
                (
                    "RESIDENT_LONGUE_DUREE_UE_HORS_BELGIQUE",
                    vec![
                        "titre_identite_sejour_longue_duree_ue",
                        "titre_sejour_belgique",
                    ],
                ),
            ]),
        );

        entries.insert(
            fields::SOUS_TYPE_SITUATION_ASSIMILATION_1,
            BTreeMap::from([
                (
                    "TITULAIRE_CARTE_RESIDENT_LONGUE_DUREE",
                    vec!["carte_resident_longue_duree"],
                ),
                (
                    "TITULAIRE_CARTE_ETRANGER",
                    vec!["carte_cire_sejour_illimite_etranger"],
                ),
                (
                    "TITULAIRE_CARTE_SEJOUR_MEMBRE_UE",
                    vec!["carte_sejour_membre_ue"],
                ),
                (
                    "TITULAIRE_CARTE_SEJOUR_PERMANENT_MEMBRE_UE",
                    vec!["carte_sejour_permanent_membre_ue"],
                ),
            ]),
        );

        entries.insert(
            fields::SOUS_TYPE_SITUATION_ASSIMILATION_2,
            BTreeMap::from([
                ("REFUGIE", vec!["carte_a_b_refugie"]),
                (
                    "DEMANDEUR_ASILE",
                    vec![
                        "annexe_25_26_refugies_apatrides",
                        "attestation_immatriculation",
                    ],
                ),
                (
                    "PROTECTION_SUBSIDIAIRE",
                    vec!["carte_a_b", "decision_protection_subsidiaire"],
                ),
                (
                    "PROTECTION_TEMPORAIRE",
                    vec!["decision_protection_temporaire"],
                ),
            ]),
        );

        entries.insert(
            fields::SOUS_TYPE_SITUATION_ASSIMILATION_3,
            BTreeMap::from([
                (
                    "AUTORISATION_SEJOUR_ET_REVENUS_PROFESSIONNELS",
                    vec!["titre_sejour_3_mois_professionel", "fiches_remuneration"],
                ),
                (
                    "AUTORISATION_SEJOUR_ET_REVENUS_DE_REMPLACEMENT",
                    vec![
                        "titre_sejour_3_mois_remplacement",
                        "preuve_allocations_chomage_pension_indemnite",
                    ],
                ),
            ]),
        );

        entries.insert(
            fields::RELATION_PARENTE,
            BTreeMap::from([
                ("PERE", vec!["composition_menage_acte_naissance"]),
                ("MERE", vec!["composition_menage_acte_naissance"]),
                ("TUTEUR_LEGAL", vec!["acte_tutelle"]),
                ("CONJOINT", vec!["composition_menage_acte_mariage"]),
                (
                    "COHABITANT_LEGAL",
                    vec!["attestation_cohabitation_legale"],
                ),
            ]),
        );

        entries.insert(
            fields::SOUS_TYPE_SITUATION_ASSIMILATION_5,
            BTreeMap::from([
                ("A_NATIONALITE_UE", vec!["carte_identite_parent"]),
                (
                    "TITULAIRE_TITRE_SEJOUR_LONGUE_DUREE",
                    vec!["titre_sejour_longue_duree_parent"],
                ),
                (
                    "CANDIDATE_REFUGIE_OU_REFUGIE_OU_APATRIDE_OU_PROTECTION_SUBSIDIAIRE_TEMPORAIRE",
                    vec!["annexe_25_26_refugies_apatrides_decision_protection_parent"],
                ),
                (
                    "AUTORISATION_SEJOUR_ET_REVENUS_PROFESSIONNELS_OU_REMPLACEMENT",
                    vec!["titre_sejour_3_mois_parent", "fiches_remuneration_parent"],
                ),
                ("PRIS_EN_CHARGE_OU_DESIGNE_CPAS", vec!["attestation_cpas_parent"]),
            ]),
        );

        entries.insert(
            fields::SOUS_TYPE_SITUATION_ASSIMILATION_6,
            BTreeMap::from([
                (
                    "A_BOURSE_ETUDES_COMMUNAUTE_FRANCAISE",
                    vec!["decision_bourse_cfwb"],
                ),
                (
                    "A_BOURSE_COOPERATION_DEVELOPPEMENT",
                    vec!["attestation_boursier"],
                ),
            ]),
        );

        Self { entries }
    }

    /// Build a table from arbitrary entries. Intended for tests and for
    /// alternative catalogs supplied by the embedding application.
    pub fn from_entries(
        entries: BTreeMap<&'static str, BTreeMap<&'static str, Vec<&'static str>>>,
    ) -> Self {
        Self { entries }
    }

    pub fn is_discriminator(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    /// The complete transitive set of fields that must be non-empty for the
    /// discriminator's submitted choice to be considered complete.
    ///
    /// Immediate dependents come first, then the recursive results of each
    /// dependent that is itself a discriminator, in discovery order. The list
    /// is intentionally not deduplicated: a field reachable via two paths
    /// appears twice, as the callers treat this as a display/validation aid,
    /// not a set.
    pub fn resolve_required_fields(
        &self,
        field: &str,
        answers: &AccountingAnswers,
    ) -> Result<Vec<&'static str>, DependencyTableError> {
        let mut path = Vec::new();
        self.resolve_with_path(field, answers, &mut path)
    }

    fn resolve_with_path(
        &self,
        field: &str,
        answers: &AccountingAnswers,
        path: &mut Vec<String>,
    ) -> Result<Vec<&'static str>, DependencyTableError> {
        // The domain data is acyclic today; fail fast instead of overflowing
        // the stack if a future table edit introduces a loop.
        if path.iter().any(|visited| visited == field) {
            return Err(DependencyTableError::Cycle {
                field: field.to_owned(),
            });
        }

        let immediate = match (self.entries.get(field), answers.choice(field)) {
            (Some(by_choice), Some(choice)) => {
                by_choice.get(choice).cloned().unwrap_or_default()
            }
            _ => Vec::new(),
        };

        path.push(field.to_owned());
        let mut resolved = immediate.clone();
        for dependent in &immediate {
            if self.entries.contains_key(dependent) {
                resolved.extend(self.resolve_with_path(dependent, answers, path)?);
            }
        }
        path.pop();

        Ok(resolved)
    }
}
