use uuid::Uuid;

use super::{fields, AccountingAnswers, BankAccountType, DependencyTable, DependencyTableError};

/// Incompleteness raised by the accounting validators, one variant per
/// business rule. The assimilation variant deliberately does not name the
/// missing sub-field, matching the upstream contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountingError {
    #[error("assimilation declaration is incomplete")]
    AssimilationIncomplete,
    #[error("no-debt certificate is missing for a recently attended institution")]
    AbsenceOfDebtIncomplete,
    #[error("tuition reduction declaration is incomplete")]
    TuitionReductionIncomplete,
    #[error("IBAN refund account details are incomplete")]
    IbanRefundAccountIncomplete,
    #[error("refund account details in another format are incomplete")]
    OtherFormatRefundAccountIncomplete,
    #[error("joint supervision declaration is incomplete")]
    CotutelleIncomplete,
    #[error(transparent)]
    DependencyTable(#[from] DependencyTableError),
}

/// Refund account details submitted in the accounting tab.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BankAccountDeclaration {
    pub account_type: Option<BankAccountType>,
    pub iban: String,
    pub other_format_number: String,
    pub bic_swift_code: String,
    pub holder_first_name: String,
    pub holder_last_name: String,
}

/// Joint supervision (cotutelle) declaration of a doctoral dossier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CotutelleDeclaration {
    /// `None` while the candidate has not answered the question.
    pub cotutelle: Option<bool>,
    pub motivation: String,
    pub external_institution: String,
    pub opening_request: Vec<Uuid>,
}

/// Assimilation must be fully documented for non-EU candidates.
///
/// EU citizens (and candidates whose nationality is still unknown) are not
/// concerned. Otherwise the situation must be declared and every field the
/// dependency table resolves for it must be non-empty.
pub fn validate_assimilation(
    is_eu_citizen: Option<bool>,
    answers: &AccountingAnswers,
    table: &DependencyTable,
) -> Result<(), AccountingError> {
    if is_eu_citizen != Some(false) {
        return Ok(());
    }

    if answers.choice(fields::TYPE_SITUATION_ASSIMILATION).is_none() {
        return Err(AccountingError::AssimilationIncomplete);
    }

    let required = table.resolve_required_fields(fields::TYPE_SITUATION_ASSIMILATION, answers)?;

    if required.iter().any(|field| !answers.is_filled(field)) {
        return Err(AccountingError::AssimilationIncomplete);
    }

    Ok(())
}

/// A no-debt certificate is required when the candidate recently attended an
/// institution of the French Community.
pub fn validate_absence_of_debt(
    attended_fr_institution_recently: Option<bool>,
    certificates: &[Uuid],
) -> Result<(), AccountingError> {
    if attended_fr_institution_recently == Some(true) && certificates.is_empty() {
        return Err(AccountingError::AbsenceOfDebtIncomplete);
    }
    Ok(())
}

/// Both tuition-reduction questions must be answered, and children of staff
/// must provide the supporting certificate.
pub fn validate_tuition_reduction(
    study_allowance_application: Option<bool>,
    staff_child: Option<bool>,
    staff_child_certificate: &[Uuid],
) -> Result<(), AccountingError> {
    if staff_child == Some(true) && staff_child_certificate.is_empty() {
        return Err(AccountingError::TuitionReductionIncomplete);
    }
    if study_allowance_application.is_none() || staff_child.is_none() {
        return Err(AccountingError::TuitionReductionIncomplete);
    }
    Ok(())
}

/// An IBAN refund account needs the number and the holder's full name.
pub fn validate_iban_refund_account(
    declaration: &BankAccountDeclaration,
) -> Result<(), AccountingError> {
    if declaration.account_type == Some(BankAccountType::Iban)
        && [
            &declaration.iban,
            &declaration.holder_first_name,
            &declaration.holder_last_name,
        ]
        .iter()
        .any(|field| field.is_empty())
    {
        return Err(AccountingError::IbanRefundAccountIncomplete);
    }
    Ok(())
}

/// A refund account in another format needs the number, the BIC/SWIFT code,
/// and the holder's full name.
pub fn validate_other_format_refund_account(
    declaration: &BankAccountDeclaration,
) -> Result<(), AccountingError> {
    if declaration.account_type == Some(BankAccountType::AutreFormat)
        && [
            &declaration.other_format_number,
            &declaration.bic_swift_code,
            &declaration.holder_first_name,
            &declaration.holder_last_name,
        ]
        .iter()
        .any(|field| field.is_empty())
    {
        return Err(AccountingError::OtherFormatRefundAccountIncomplete);
    }
    Ok(())
}

/// The joint supervision question must be answered; a declared cotutelle
/// additionally requires the motivation, the partner institution, and the
/// opening request documents.
pub fn validate_cotutelle(declaration: &CotutelleDeclaration) -> Result<(), AccountingError> {
    match declaration.cotutelle {
        None => Err(AccountingError::CotutelleIncomplete),
        Some(false) => Ok(()),
        Some(true) => {
            if declaration.motivation.is_empty()
                || declaration.external_institution.is_empty()
                || declaration.opening_request.is_empty()
            {
                Err(AccountingError::CotutelleIncomplete)
            } else {
                Ok(())
            }
        }
    }
}
