//! Curriculum completeness: verifies that a candidate's experiences cover
//! every month of the academic windows since their last known diploma or
//! enrolment, collecting every gap at once instead of failing on the first.
//!
//! An academic year must be justified from September through the following
//! February. Academic experiences cover whole academic years; non-academic
//! experiences cover calendar ranges, with breaks of at most one day between
//! consecutive ranges treated as continuous.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ExperienceId;
use crate::validation::ValidationReport;

/// First month of the academic window that must be justified.
pub const VALUATION_FIRST_MONTH: u32 = 9;
/// Last month (of the following calendar year) of that window.
pub const VALUATION_LAST_MONTH: u32 = 2;
/// How far back coverage is required at most, in academic years.
pub const MAX_YEARS_TO_JUSTIFY: i32 = 5;

/// One gap or defect found in the curriculum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum CurriculumError {
    #[error("the period from {start} to {end} is not covered by any experience")]
    MissingPeriod { start: NaiveDate, end: NaiveDate },
    #[error("the academic experience '{name}' is missing required details")]
    IncompleteExperience {
        experience: ExperienceId,
        name: String,
    },
}

impl CurriculumError {
    /// Stable chronological ordering key for the final report.
    fn sort_key(&self) -> (NaiveDate, u8) {
        match self {
            Self::MissingPeriod { start, .. } => (*start, 0),
            Self::IncompleteExperience { .. } => (NaiveDate::MIN, 1),
        }
    }
}

/// One enrolment spanning whole academic years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicExperience {
    pub experience: ExperienceId,
    pub name: String,
    /// Academic years attended, named by their starting calendar year.
    pub academic_years: Vec<i32>,
    /// Whether every per-year detail (results, credits, transcript) is filled.
    pub complete: bool,
}

/// One professional or other non-academic activity over a calendar range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonAcademicExperience {
    pub experience: ExperienceId,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Everything the completeness check needs, extracted by the caller from the
/// candidate profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumSnapshot {
    /// Academic year of the admission, named by its starting calendar year.
    pub current_academic_year: i32,
    /// Academic year the secondary diploma was obtained in, if known.
    pub secondary_diploma_year: Option<i32>,
    /// Last academic year of a previous enrolment at the institution, if any.
    pub last_enrolment_year: Option<i32>,
    /// Months starting after this date need not be justified yet, typically
    /// the earlier of the submission date and the course start.
    pub justify_up_to: Option<NaiveDate>,
    pub academic_experiences: Vec<AcademicExperience>,
    pub non_academic_experiences: Vec<NonAcademicExperience>,
}

/// First academic year that must be justified: at most five years back, and
/// never before the year following the secondary diploma or the last known
/// enrolment.
pub fn required_period_start(snapshot: &CurriculumSnapshot) -> i32 {
    let mut start = snapshot.current_academic_year - MAX_YEARS_TO_JUSTIFY;
    if let Some(diploma) = snapshot.secondary_diploma_year {
        start = start.max(diploma + 1);
    }
    if let Some(enrolment) = snapshot.last_enrolment_year {
        start = start.max(enrolment + 1);
    }
    start
}

/// Check that every month of every required academic window is covered,
/// reporting all gaps and incomplete experiences together.
pub fn check_curriculum(snapshot: &CurriculumSnapshot) -> ValidationReport<CurriculumError> {
    let mut report = ValidationReport::new();

    for experience in &snapshot.academic_experiences {
        if !experience.complete {
            report.push(CurriculumError::IncompleteExperience {
                experience: experience.experience,
                name: experience.name.clone(),
            });
        }
    }

    let start_year = required_period_start(snapshot);
    if start_year > snapshot.current_academic_year {
        report.sort_by_key(CurriculumError::sort_key);
        return report;
    }

    let ranges = merged_non_academic_ranges(snapshot);
    let mut gap_start: Option<NaiveDate> = None;
    let mut gap_end = NaiveDate::MIN;

    for (year, month) in window_months(start_year, snapshot.current_academic_year) {
        let (first_day, last_day) = month_bounds(year, month);
        if snapshot
            .justify_up_to
            .is_some_and(|bound| first_day > bound)
        {
            break;
        }
        let academic_year = if month >= VALUATION_FIRST_MONTH { year } else { year - 1 };

        let covered = snapshot
            .academic_experiences
            .iter()
            .any(|experience| experience.academic_years.contains(&academic_year))
            || ranges
                .iter()
                .any(|(start, end)| *start <= first_day && *end >= last_day);

        if covered {
            if let Some(start) = gap_start.take() {
                report.push(CurriculumError::MissingPeriod { start, end: gap_end });
            }
        } else {
            gap_start.get_or_insert(first_day);
            gap_end = last_day;
        }
    }
    if let Some(start) = gap_start {
        report.push(CurriculumError::MissingPeriod { start, end: gap_end });
    }

    report.sort_by_key(CurriculumError::sort_key);
    report
}

/// Six-month windows of each academic year, in chronological order.
fn window_months(start_year: i32, end_year: i32) -> impl Iterator<Item = (i32, u32)> {
    (start_year..=end_year).flat_map(|year| {
        (VALUATION_FIRST_MONTH..=12)
            .map(move |month| (year, month))
            .chain((1..=VALUATION_LAST_MONTH).map(move |month| (year + 1, month)))
    })
}

/// Calendar ranges covered by non-academic activity, with breaks of at most
/// one day between consecutive activities bridged.
fn merged_non_academic_ranges(snapshot: &CurriculumSnapshot) -> Vec<(NaiveDate, NaiveDate)> {
    let mut spans: Vec<(NaiveDate, NaiveDate)> = snapshot
        .non_academic_experiences
        .iter()
        .filter(|experience| experience.start <= experience.end)
        .map(|experience| (experience.start, experience.end))
        .collect();
    spans.sort();

    let mut merged: Vec<(NaiveDate, NaiveDate)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some((_, previous_end)) if start <= *previous_end + chrono::Days::new(2) => {
                *previous_end = (*previous_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn month_bounds(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next.and_then(|day| day.pred_opt()).unwrap_or(first);
    (first, last)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn academic(years: &[i32]) -> AcademicExperience {
        AcademicExperience {
            experience: ExperienceId(Uuid::new_v4()),
            name: "Bachelor".to_owned(),
            academic_years: years.to_vec(),
            complete: true,
        }
    }

    fn snapshot() -> CurriculumSnapshot {
        CurriculumSnapshot {
            current_academic_year: 2024,
            secondary_diploma_year: Some(2020),
            last_enrolment_year: None,
            justify_up_to: None,
            academic_experiences: Vec::new(),
            non_academic_experiences: Vec::new(),
        }
    }

    #[test]
    fn required_start_never_predates_the_diploma() {
        let mut snapshot = snapshot();
        assert_eq!(required_period_start(&snapshot), 2021);

        snapshot.secondary_diploma_year = Some(2010);
        assert_eq!(required_period_start(&snapshot), 2019);

        snapshot.last_enrolment_year = Some(2022);
        assert_eq!(required_period_start(&snapshot), 2023);
    }

    #[test]
    fn fully_enrolled_candidate_has_no_gaps() {
        let mut snapshot = snapshot();
        snapshot.academic_experiences = vec![academic(&[2021, 2022, 2023, 2024])];

        assert!(check_curriculum(&snapshot).is_ok());
    }

    #[test]
    fn one_missing_period_per_consecutive_uncovered_run() {
        let mut snapshot = snapshot();
        // 2022 is missing entirely; 2021, 2023 and 2024 are covered.
        snapshot.academic_experiences = vec![academic(&[2021, 2023, 2024])];

        let errors: Vec<_> = check_curriculum(&snapshot).into_iter().collect();
        assert_eq!(
            errors,
            vec![CurriculumError::MissingPeriod {
                start: date(2022, 9, 1),
                end: date(2023, 2, 28),
            }]
        );
    }

    #[test]
    fn gaps_are_reported_chronologically() {
        let mut snapshot = snapshot();
        snapshot.secondary_diploma_year = Some(2019);
        snapshot.academic_experiences = vec![academic(&[2020, 2022, 2024])];

        let errors: Vec<_> = check_curriculum(&snapshot).into_iter().collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0],
            CurriculumError::MissingPeriod {
                start: date(2021, 9, 1),
                end: date(2022, 2, 28),
            }
        );
        assert_eq!(
            errors[1],
            CurriculumError::MissingPeriod {
                start: date(2023, 9, 1),
                end: date(2024, 2, 29),
            }
        );
    }

    #[test]
    fn adjacent_jobs_with_one_day_break_count_as_continuous() {
        let mut snapshot = snapshot();
        snapshot.academic_experiences = vec![academic(&[2021, 2022, 2023])];
        // Two contracts covering the 2024 window with a single-day break.
        snapshot.non_academic_experiences = vec![
            NonAcademicExperience {
                experience: ExperienceId(Uuid::new_v4()),
                name: "First contract".to_owned(),
                start: date(2024, 8, 1),
                end: date(2024, 11, 30),
            },
            NonAcademicExperience {
                experience: ExperienceId(Uuid::new_v4()),
                name: "Second contract".to_owned(),
                start: date(2024, 12, 2),
                end: date(2025, 3, 15),
            },
        ];

        assert!(check_curriculum(&snapshot).is_ok());
    }

    #[test]
    fn a_longer_break_between_jobs_leaves_a_gap() {
        let mut snapshot = snapshot();
        snapshot.academic_experiences = vec![academic(&[2021, 2022, 2023])];
        snapshot.non_academic_experiences = vec![
            NonAcademicExperience {
                experience: ExperienceId(Uuid::new_v4()),
                name: "First contract".to_owned(),
                start: date(2024, 8, 1),
                end: date(2024, 11, 30),
            },
            NonAcademicExperience {
                experience: ExperienceId(Uuid::new_v4()),
                name: "Second contract".to_owned(),
                start: date(2024, 12, 15),
                end: date(2025, 3, 15),
            },
        ];

        let errors: Vec<_> = check_curriculum(&snapshot).into_iter().collect();
        assert_eq!(
            errors,
            vec![CurriculumError::MissingPeriod {
                start: date(2024, 12, 1),
                end: date(2024, 12, 31),
            }]
        );
    }

    #[test]
    fn months_after_the_justification_bound_are_not_required() {
        let mut snapshot = snapshot();
        snapshot.academic_experiences = vec![academic(&[2021, 2022, 2023])];
        // Submitted in October 2024: November onwards is not due yet.
        snapshot.justify_up_to = Some(date(2024, 10, 15));
        snapshot.non_academic_experiences = vec![NonAcademicExperience {
            experience: ExperienceId(Uuid::new_v4()),
            name: "Internship".to_owned(),
            start: date(2024, 9, 1),
            end: date(2024, 10, 31),
        }];

        assert!(check_curriculum(&snapshot).is_ok());
    }

    #[test]
    fn incomplete_academic_experiences_are_reported_alongside_gaps() {
        let mut snapshot = snapshot();
        let mut experience = academic(&[2021, 2022, 2023, 2024]);
        experience.complete = false;
        let id = experience.experience;
        snapshot.academic_experiences = vec![experience];

        let errors: Vec<_> = check_curriculum(&snapshot).into_iter().collect();
        assert_eq!(
            errors,
            vec![CurriculumError::IncompleteExperience {
                experience: id,
                name: "Bachelor".to_owned(),
            }]
        );
    }
}
