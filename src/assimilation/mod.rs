//! Tuition-equivalence ("assimilation") declarations and the recursive
//! field-dependency resolver deriving which supporting documents they require.
//!
//! A candidate who is not an EU citizen declares one situation out of a closed
//! set; most situations require further sub-declarations, and every
//! declaration requires specific supporting documents. The dependency table is
//! static domain knowledge, injected once and shared by the resolver, the
//! validators, and the document requirement engine.

mod resolver;
mod validators;

#[cfg(test)]
mod tests;

pub use resolver::{DependencyTable, DependencyTableError};
pub use validators::{
    validate_absence_of_debt, validate_assimilation, validate_cotutelle,
    validate_iban_refund_account, validate_other_format_refund_account,
    validate_tuition_reduction, AccountingError, BankAccountDeclaration, CotutelleDeclaration,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminator field names of the assimilation dependency table.
pub mod fields {
    pub const TYPE_SITUATION_ASSIMILATION: &str = "type_situation_assimilation";
    pub const SOUS_TYPE_SITUATION_ASSIMILATION_1: &str = "sous_type_situation_assimilation_1";
    pub const SOUS_TYPE_SITUATION_ASSIMILATION_2: &str = "sous_type_situation_assimilation_2";
    pub const SOUS_TYPE_SITUATION_ASSIMILATION_3: &str = "sous_type_situation_assimilation_3";
    pub const RELATION_PARENTE: &str = "relation_parente";
    pub const SOUS_TYPE_SITUATION_ASSIMILATION_5: &str = "sous_type_situation_assimilation_5";
    pub const SOUS_TYPE_SITUATION_ASSIMILATION_6: &str = "sous_type_situation_assimilation_6";
}

/// One submitted answer: either a choice out of a closed enumeration, a
/// boolean flag, free text, or a list of uploaded file references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Choice(String),
    Text(String),
    Files(Vec<Uuid>),
}

impl FieldValue {
    /// Falsy check mirroring the completeness rules: an unchecked flag, an
    /// empty string, or an empty file list all count as missing.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Flag(flag) => !flag,
            FieldValue::Choice(name) => name.is_empty(),
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Files(files) => files.is_empty(),
        }
    }
}

/// Flat mapping from field name to submitted value, owned transiently by the
/// validation call. Choice values can only enter through the typed declaration
/// setters, so an invalid tag never reaches the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountingAnswers {
    answers: BTreeMap<String, FieldValue>,
}

impl AccountingAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.answers.get(field)
    }

    /// The canonical name of the choice submitted for `field`, if any.
    pub fn choice(&self, field: &str) -> Option<&str> {
        match self.answers.get(field) {
            Some(FieldValue::Choice(name)) if !name.is_empty() => Some(name),
            _ => None,
        }
    }

    /// Whether the field holds a non-empty value.
    pub fn is_filled(&self, field: &str) -> bool {
        self.answers
            .get(field)
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    }

    pub fn set_flag(&mut self, field: impl Into<String>, value: bool) {
        self.answers.insert(field.into(), FieldValue::Flag(value));
    }

    pub fn set_text(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.answers
            .insert(field.into(), FieldValue::Text(value.into()));
    }

    pub fn attach_files(&mut self, field: impl Into<String>, files: Vec<Uuid>) {
        self.answers.insert(field.into(), FieldValue::Files(files));
    }

    pub fn declare_situation(&mut self, situation: AssimilationSituation) {
        self.set_choice(fields::TYPE_SITUATION_ASSIMILATION, situation.as_str());
    }

    pub fn declare_assimilation_1(&mut self, choice: Assimilation1) {
        self.set_choice(fields::SOUS_TYPE_SITUATION_ASSIMILATION_1, choice.as_str());
    }

    pub fn declare_assimilation_2(&mut self, choice: Assimilation2) {
        self.set_choice(fields::SOUS_TYPE_SITUATION_ASSIMILATION_2, choice.as_str());
    }

    pub fn declare_assimilation_3(&mut self, choice: Assimilation3) {
        self.set_choice(fields::SOUS_TYPE_SITUATION_ASSIMILATION_3, choice.as_str());
    }

    pub fn declare_parental_tie(&mut self, tie: ParentalTie) {
        self.set_choice(fields::RELATION_PARENTE, tie.as_str());
    }

    pub fn declare_assimilation_5(&mut self, choice: Assimilation5) {
        self.set_choice(fields::SOUS_TYPE_SITUATION_ASSIMILATION_5, choice.as_str());
    }

    pub fn declare_assimilation_6(&mut self, choice: Assimilation6) {
        self.set_choice(fields::SOUS_TYPE_SITUATION_ASSIMILATION_6, choice.as_str());
    }

    fn set_choice(&mut self, field: &str, name: &str) {
        self.answers
            .insert(field.to_owned(), FieldValue::Choice(name.to_owned()));
    }
}

/// Declared tuition-equivalence situation of a non-EU candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssimilationSituation {
    AucuneAssimilation,
    AutorisationEtablissementOuResidentLongueDuree,
    RefugieOuApatrideOuProtectionSubsidiaireTemporaire,
    AutorisationSejourEtRevenusProfessionnelsOuRemplacement,
    PrisEnChargeOuDesigneCpas,
    ProcheANationaliteUeOuRespecteAssimilations1A4,
    ABourseArticle105Paragraph2,
    ResidentLongueDureeUeHorsBelgique,
}

impl AssimilationSituation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AucuneAssimilation => "AUCUNE_ASSIMILATION",
            Self::AutorisationEtablissementOuResidentLongueDuree => {
                "AUTORISATION_ETABLISSEMENT_OU_RESIDENT_LONGUE_DUREE"
            }
            Self::RefugieOuApatrideOuProtectionSubsidiaireTemporaire => {
                "REFUGIE_OU_APATRIDE_OU_PROTECTION_SUBSIDIAIRE_TEMPORAIRE"
            }
            Self::AutorisationSejourEtRevenusProfessionnelsOuRemplacement => {
                "AUTORISATION_SEJOUR_ET_REVENUS_PROFESSIONNELS_OU_REMPLACEMENT"
            }
            Self::PrisEnChargeOuDesigneCpas => "PRIS_EN_CHARGE_OU_DESIGNE_CPAS",
            Self::ProcheANationaliteUeOuRespecteAssimilations1A4 => {
                "PROCHE_A_NATIONALITE_UE_OU_RESPECTE_ASSIMILATIONS_1_A_4"
            }
            Self::ABourseArticle105Paragraph2 => "A_BOURSE_ARTICLE_105_PARAGRAPH_2",
            Self::ResidentLongueDureeUeHorsBelgique => "RESIDENT_LONGUE_DUREE_UE_HORS_BELGIQUE",
        }
    }
}

/// Residence-permit refinement of the long-term-resident situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assimilation1 {
    TitulaireCarteResidentLongueDuree,
    TitulaireCarteEtranger,
    TitulaireCarteSejourMembreUe,
    TitulaireCarteSejourPermanentMembreUe,
}

impl Assimilation1 {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TitulaireCarteResidentLongueDuree => "TITULAIRE_CARTE_RESIDENT_LONGUE_DUREE",
            Self::TitulaireCarteEtranger => "TITULAIRE_CARTE_ETRANGER",
            Self::TitulaireCarteSejourMembreUe => "TITULAIRE_CARTE_SEJOUR_MEMBRE_UE",
            Self::TitulaireCarteSejourPermanentMembreUe => {
                "TITULAIRE_CARTE_SEJOUR_PERMANENT_MEMBRE_UE"
            }
        }
    }
}

/// Protection-status refinement of the refugee/stateless situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assimilation2 {
    Refugie,
    DemandeurAsile,
    ProtectionSubsidiaire,
    ProtectionTemporaire,
}

impl Assimilation2 {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Refugie => "REFUGIE",
            Self::DemandeurAsile => "DEMANDEUR_ASILE",
            Self::ProtectionSubsidiaire => "PROTECTION_SUBSIDIAIRE",
            Self::ProtectionTemporaire => "PROTECTION_TEMPORAIRE",
        }
    }
}

/// Income-source refinement of the residence-and-income situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assimilation3 {
    AutorisationSejourEtRevenusProfessionnels,
    AutorisationSejourEtRevenusDeRemplacement,
}

impl Assimilation3 {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutorisationSejourEtRevenusProfessionnels => {
                "AUTORISATION_SEJOUR_ET_REVENUS_PROFESSIONNELS"
            }
            Self::AutorisationSejourEtRevenusDeRemplacement => {
                "AUTORISATION_SEJOUR_ET_REVENUS_DE_REMPLACEMENT"
            }
        }
    }
}

/// Relation between the candidate and the qualifying relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParentalTie {
    Pere,
    Mere,
    TuteurLegal,
    Conjoint,
    CohabitantLegal,
}

impl ParentalTie {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pere => "PERE",
            Self::Mere => "MERE",
            Self::TuteurLegal => "TUTEUR_LEGAL",
            Self::Conjoint => "CONJOINT",
            Self::CohabitantLegal => "COHABITANT_LEGAL",
        }
    }
}

/// Status of the qualifying relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assimilation5 {
    ANationaliteUe,
    TitulaireTitreSejourLongueDuree,
    CandidateRefugieOuRefugieOuApatrideOuProtectionSubsidiaireTemporaire,
    AutorisationSejourEtRevenusProfessionnelsOuRemplacement,
    PrisEnChargeOuDesigneCpas,
}

impl Assimilation5 {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ANationaliteUe => "A_NATIONALITE_UE",
            Self::TitulaireTitreSejourLongueDuree => "TITULAIRE_TITRE_SEJOUR_LONGUE_DUREE",
            Self::CandidateRefugieOuRefugieOuApatrideOuProtectionSubsidiaireTemporaire => {
                "CANDIDATE_REFUGIE_OU_REFUGIE_OU_APATRIDE_OU_PROTECTION_SUBSIDIAIRE_TEMPORAIRE"
            }
            Self::AutorisationSejourEtRevenusProfessionnelsOuRemplacement => {
                "AUTORISATION_SEJOUR_ET_REVENUS_PROFESSIONNELS_OU_REMPLACEMENT"
            }
            Self::PrisEnChargeOuDesigneCpas => "PRIS_EN_CHARGE_OU_DESIGNE_CPAS",
        }
    }
}

/// Scholarship refinement of the article 105 §2 situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assimilation6 {
    ABourseEtudesCommunauteFrancaise,
    ABourseCooperationDeveloppement,
}

impl Assimilation6 {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ABourseEtudesCommunauteFrancaise => "A_BOURSE_ETUDES_COMMUNAUTE_FRANCAISE",
            Self::ABourseCooperationDeveloppement => "A_BOURSE_COOPERATION_DEVELOPPEMENT",
        }
    }
}

/// Account format chosen for tuition refunds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankAccountType {
    Iban,
    AutreFormat,
    Non,
}

impl BankAccountType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iban => "IBAN",
            Self::AutreFormat => "AUTRE_FORMAT",
            Self::Non => "NON",
        }
    }
}

/// A wire name that does not belong to the target enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {enumeration} choice")]
pub struct UnknownChoice {
    pub enumeration: &'static str,
    pub value: String,
}

macro_rules! choice_from_str {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl std::str::FromStr for $ty {
            type Err = UnknownChoice;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                $(if value == Self::$variant.as_str() {
                    return Ok(Self::$variant);
                })+
                Err(UnknownChoice {
                    enumeration: stringify!($ty),
                    value: value.to_owned(),
                })
            }
        }
    };
}

choice_from_str!(AssimilationSituation {
    AucuneAssimilation,
    AutorisationEtablissementOuResidentLongueDuree,
    RefugieOuApatrideOuProtectionSubsidiaireTemporaire,
    AutorisationSejourEtRevenusProfessionnelsOuRemplacement,
    PrisEnChargeOuDesigneCpas,
    ProcheANationaliteUeOuRespecteAssimilations1A4,
    ABourseArticle105Paragraph2,
    ResidentLongueDureeUeHorsBelgique,
});
choice_from_str!(Assimilation1 {
    TitulaireCarteResidentLongueDuree,
    TitulaireCarteEtranger,
    TitulaireCarteSejourMembreUe,
    TitulaireCarteSejourPermanentMembreUe,
});
choice_from_str!(Assimilation2 {
    Refugie,
    DemandeurAsile,
    ProtectionSubsidiaire,
    ProtectionTemporaire,
});
choice_from_str!(Assimilation3 {
    AutorisationSejourEtRevenusProfessionnels,
    AutorisationSejourEtRevenusDeRemplacement,
});
choice_from_str!(ParentalTie {
    Pere,
    Mere,
    TuteurLegal,
    Conjoint,
    CohabitantLegal,
});
choice_from_str!(Assimilation5 {
    ANationaliteUe,
    TitulaireTitreSejourLongueDuree,
    CandidateRefugieOuRefugieOuApatrideOuProtectionSubsidiaireTemporaire,
    AutorisationSejourEtRevenusProfessionnelsOuRemplacement,
    PrisEnChargeOuDesigneCpas,
});
choice_from_str!(Assimilation6 {
    ABourseEtudesCommunauteFrancaise,
    ABourseCooperationDeveloppement,
});
choice_from_str!(BankAccountType { Iban, AutreFormat, Non });
