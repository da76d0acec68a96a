use std::collections::BTreeMap;

use uuid::Uuid;

use super::*;

fn file() -> Vec<Uuid> {
    vec![Uuid::new_v4()]
}

#[test]
fn every_choice_of_every_discriminator_resolves_to_a_finite_list() {
    let table = DependencyTable::assimilation();

    let situations = [
        AssimilationSituation::AucuneAssimilation,
        AssimilationSituation::AutorisationEtablissementOuResidentLongueDuree,
        AssimilationSituation::RefugieOuApatrideOuProtectionSubsidiaireTemporaire,
        AssimilationSituation::AutorisationSejourEtRevenusProfessionnelsOuRemplacement,
        AssimilationSituation::PrisEnChargeOuDesigneCpas,
        AssimilationSituation::ProcheANationaliteUeOuRespecteAssimilations1A4,
        AssimilationSituation::ABourseArticle105Paragraph2,
        AssimilationSituation::ResidentLongueDureeUeHorsBelgique,
    ];

    for situation in situations {
        let mut answers = AccountingAnswers::new();
        answers.declare_situation(situation);
        // Fill every sub-discriminator so the deepest chains are exercised.
        answers.declare_assimilation_1(Assimilation1::TitulaireCarteResidentLongueDuree);
        answers.declare_assimilation_2(Assimilation2::DemandeurAsile);
        answers.declare_assimilation_3(Assimilation3::AutorisationSejourEtRevenusProfessionnels);
        answers.declare_parental_tie(ParentalTie::TuteurLegal);
        answers.declare_assimilation_5(Assimilation5::PrisEnChargeOuDesigneCpas);
        answers.declare_assimilation_6(Assimilation6::ABourseEtudesCommunauteFrancaise);

        let resolved = table
            .resolve_required_fields(fields::TYPE_SITUATION_ASSIMILATION, &answers)
            .expect("acyclic table resolves");
        assert!(resolved.len() <= 8, "unexpected blow-up for {situation:?}");
    }
}

#[test]
fn resolution_recurses_through_sub_discriminators() {
    let table = DependencyTable::assimilation();
    let mut answers = AccountingAnswers::new();
    answers.declare_situation(AssimilationSituation::AutorisationEtablissementOuResidentLongueDuree);
    answers.declare_assimilation_1(Assimilation1::TitulaireCarteResidentLongueDuree);

    let resolved = table
        .resolve_required_fields(fields::TYPE_SITUATION_ASSIMILATION, &answers)
        .unwrap();

    assert_eq!(
        resolved,
        vec![
            "sous_type_situation_assimilation_1",
            "carte_resident_longue_duree",
        ],
    );
}

#[test]
fn resolution_preserves_discovery_order_across_parallel_branches() {
    let table = DependencyTable::assimilation();
    let mut answers = AccountingAnswers::new();
    answers.declare_situation(AssimilationSituation::ProcheANationaliteUeOuRespecteAssimilations1A4);
    answers.declare_parental_tie(ParentalTie::Conjoint);
    answers.declare_assimilation_5(Assimilation5::ANationaliteUe);

    let resolved = table
        .resolve_required_fields(fields::TYPE_SITUATION_ASSIMILATION, &answers)
        .unwrap();

    assert_eq!(
        resolved,
        vec![
            "relation_parente",
            "sous_type_situation_assimilation_5",
            "composition_menage_acte_mariage",
            "carte_identite_parent",
        ],
    );
}

#[test]
fn unanswered_discriminator_resolves_to_nothing() {
    let table = DependencyTable::assimilation();
    let answers = AccountingAnswers::new();

    let resolved = table
        .resolve_required_fields(fields::TYPE_SITUATION_ASSIMILATION, &answers)
        .unwrap();
    assert!(resolved.is_empty());
}

#[test]
fn cyclic_table_fails_fast_instead_of_recursing() {
    let entries = BTreeMap::from([
        ("a", BTreeMap::from([("LOOP", vec!["b"])])),
        ("b", BTreeMap::from([("LOOP", vec!["a"])])),
    ]);
    let table = DependencyTable::from_entries(entries);

    let mut answers = AccountingAnswers::new();
    answers.set_choice("a", "LOOP");
    answers.set_choice("b", "LOOP");

    let err = table.resolve_required_fields("a", &answers).unwrap_err();
    assert_eq!(
        err,
        DependencyTableError::Cycle {
            field: "a".to_owned()
        },
    );
}

#[test]
fn shared_dependent_reached_via_two_paths_is_not_a_cycle() {
    let entries = BTreeMap::from([
        ("root", BTreeMap::from([("X", vec!["left", "right"])])),
        ("left", BTreeMap::from([("X", vec!["shared"])])),
        ("right", BTreeMap::from([("X", vec!["shared"])])),
        ("shared", BTreeMap::from([("X", vec!["leaf"])])),
    ]);
    let table = DependencyTable::from_entries(entries);

    let mut answers = AccountingAnswers::new();
    for field in ["root", "left", "right", "shared"] {
        answers.set_choice(field, "X");
    }

    let resolved = table.resolve_required_fields("root", &answers).unwrap();
    // 'shared' and its leaf legitimately appear once per path.
    assert_eq!(
        resolved,
        vec!["left", "right", "shared", "leaf", "shared", "leaf"],
    );
}

#[test]
fn eu_citizens_are_not_concerned_by_assimilation() {
    let table = DependencyTable::assimilation();
    let answers = AccountingAnswers::new();

    assert!(validate_assimilation(Some(true), &answers, &table).is_ok());
    assert!(validate_assimilation(None, &answers, &table).is_ok());
}

#[test]
fn missing_situation_is_incomplete_for_non_eu_candidates() {
    let table = DependencyTable::assimilation();
    let answers = AccountingAnswers::new();

    assert_eq!(
        validate_assimilation(Some(false), &answers, &table),
        Err(AccountingError::AssimilationIncomplete),
    );
}

#[test]
fn missing_resolved_field_is_incomplete() {
    let table = DependencyTable::assimilation();
    let mut answers = AccountingAnswers::new();
    answers.declare_situation(AssimilationSituation::AutorisationEtablissementOuResidentLongueDuree);
    answers.declare_assimilation_1(Assimilation1::TitulaireCarteResidentLongueDuree);
    // 'carte_resident_longue_duree' left empty.

    assert_eq!(
        validate_assimilation(Some(false), &answers, &table),
        Err(AccountingError::AssimilationIncomplete),
    );

    answers.attach_files("carte_resident_longue_duree", file());
    assert!(validate_assimilation(Some(false), &answers, &table).is_ok());
}

#[test]
fn cpas_situation_is_complete_once_the_certificate_is_attached() {
    let table = DependencyTable::assimilation();
    let mut answers = AccountingAnswers::new();
    answers.declare_situation(AssimilationSituation::PrisEnChargeOuDesigneCpas);

    assert_eq!(
        validate_assimilation(Some(false), &answers, &table),
        Err(AccountingError::AssimilationIncomplete),
    );

    answers.attach_files("attestation_cpas", file());
    assert!(validate_assimilation(Some(false), &answers, &table).is_ok());
}

#[test]
fn debt_certificate_is_only_required_after_recent_attendance() {
    assert!(validate_absence_of_debt(None, &[]).is_ok());
    assert!(validate_absence_of_debt(Some(false), &[]).is_ok());
    assert_eq!(
        validate_absence_of_debt(Some(true), &[]),
        Err(AccountingError::AbsenceOfDebtIncomplete),
    );
    assert!(validate_absence_of_debt(Some(true), &file()).is_ok());
}

#[test]
fn tuition_reduction_needs_both_answers_and_the_staff_certificate() {
    assert_eq!(
        validate_tuition_reduction(Some(true), None, &[]),
        Err(AccountingError::TuitionReductionIncomplete),
    );
    assert_eq!(
        validate_tuition_reduction(Some(false), Some(true), &[]),
        Err(AccountingError::TuitionReductionIncomplete),
    );
    assert!(validate_tuition_reduction(Some(false), Some(true), &file()).is_ok());
    assert!(validate_tuition_reduction(Some(false), Some(false), &[]).is_ok());
}

#[test]
fn iban_account_requires_number_and_holder() {
    let mut declaration = BankAccountDeclaration {
        account_type: Some(BankAccountType::Iban),
        iban: "BE43068999999501".to_owned(),
        holder_first_name: "Marie".to_owned(),
        holder_last_name: String::new(),
        ..Default::default()
    };

    assert_eq!(
        validate_iban_refund_account(&declaration),
        Err(AccountingError::IbanRefundAccountIncomplete),
    );

    declaration.holder_last_name = "Curie".to_owned();
    assert!(validate_iban_refund_account(&declaration).is_ok());

    // The other-format rule does not fire for IBAN accounts.
    assert!(validate_other_format_refund_account(&declaration).is_ok());
}

#[test]
fn other_format_account_requires_number_bic_and_holder() {
    let declaration = BankAccountDeclaration {
        account_type: Some(BankAccountType::AutreFormat),
        other_format_number: "123456".to_owned(),
        bic_swift_code: String::new(),
        holder_first_name: "Pierre".to_owned(),
        holder_last_name: "Curie".to_owned(),
        ..Default::default()
    };

    assert_eq!(
        validate_other_format_refund_account(&declaration),
        Err(AccountingError::OtherFormatRefundAccountIncomplete),
    );
}

#[test]
fn declared_cotutelle_requires_motivation_institution_and_request() {
    assert_eq!(
        validate_cotutelle(&CotutelleDeclaration::default()),
        Err(AccountingError::CotutelleIncomplete),
    );

    let no_cotutelle = CotutelleDeclaration {
        cotutelle: Some(false),
        ..Default::default()
    };
    assert!(validate_cotutelle(&no_cotutelle).is_ok());

    let incomplete = CotutelleDeclaration {
        cotutelle: Some(true),
        motivation: "Shared lab".to_owned(),
        external_institution: "KU Leuven".to_owned(),
        opening_request: Vec::new(),
    };
    assert_eq!(
        validate_cotutelle(&incomplete),
        Err(AccountingError::CotutelleIncomplete),
    );

    let complete = CotutelleDeclaration {
        opening_request: file(),
        ..incomplete
    };
    assert!(validate_cotutelle(&complete).is_ok());
}

#[test]
fn answers_round_trip_through_their_wire_form() {
    let json = serde_json::json!({
        "type_situation_assimilation": "AUTORISATION_ETABLISSEMENT_OU_RESIDENT_LONGUE_DUREE",
        "sous_type_situation_assimilation_1": "TITULAIRE_CARTE_RESIDENT_LONGUE_DUREE",
        "carte_resident_longue_duree": ["8c9f3f8e-7e4b-4a2e-9a1c-1d2e3f405060"],
        "attestation_absence_dette_etablissement": [],
        "demande_allocation_d_etudes_communaute_francaise_belgique": false,
    });

    let answers: AccountingAnswers = serde_json::from_value(json.clone()).unwrap();
    assert_eq!(
        answers.choice(fields::TYPE_SITUATION_ASSIMILATION),
        Some("AUTORISATION_ETABLISSEMENT_OU_RESIDENT_LONGUE_DUREE")
    );
    assert!(answers.is_filled("carte_resident_longue_duree"));
    assert!(!answers.is_filled("attestation_absence_dette_etablissement"));
    assert!(!answers.is_filled("demande_allocation_d_etudes_communaute_francaise_belgique"));

    assert_eq!(serde_json::to_value(&answers).unwrap(), json);
}

#[test]
fn choice_parsing_fails_fast_on_unknown_wire_names() {
    assert_eq!(
        "PRIS_EN_CHARGE_OU_DESIGNE_CPAS".parse::<AssimilationSituation>(),
        Ok(AssimilationSituation::PrisEnChargeOuDesigneCpas)
    );
    assert_eq!(
        "IBAN".parse::<BankAccountType>(),
        Ok(BankAccountType::Iban)
    );
    assert_eq!(
        "AUTRE_FORMAT".parse::<BankAccountType>(),
        Ok(BankAccountType::AutreFormat)
    );
    assert_eq!(BankAccountType::Non.as_str(), "NON");

    let error = "N_EXISTE_PAS".parse::<AssimilationSituation>().unwrap_err();
    assert_eq!(error.enumeration, "AssimilationSituation");
    assert_eq!(error.value, "N_EXISTE_PAS");
}
