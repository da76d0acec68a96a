//! Collect-all error reporting.
//!
//! Validation call sites that check several independent rules at once report
//! every violation in a single ordered collection instead of failing on the
//! first, so the caller can render the complete list to the user.

use serde::{Deserialize, Serialize};

/// Ordered accumulator of typed business errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport<E> {
    errors: Vec<E>,
}

impl<E> Default for ValidationReport<E> {
    fn default() -> Self {
        Self { errors: Vec::new() }
    }
}

impl<E> ValidationReport<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: E) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = E>) {
        self.errors.extend(errors);
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// Reorder the accumulated errors by a stable, rule-specific key so the
    /// user-visible list has a deterministic composition.
    pub fn sort_by_key<K: Ord>(&mut self, key: impl FnMut(&E) -> K) {
        self.errors.sort_by_key(key);
    }

    /// `Ok(())` when empty, otherwise the full error list.
    pub fn into_result(self) -> Result<(), Vec<E>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

impl<E> IntoIterator for ValidationReport<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<E> FromIterator<E> for ValidationReport<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_ok() {
        let report: ValidationReport<&'static str> = ValidationReport::new();
        assert!(report.is_ok());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn report_keeps_every_error_in_sorted_order() {
        let mut report = ValidationReport::new();
        report.push((2024, "second"));
        report.push((2021, "first"));
        report.extend([(2025, "third")]);
        report.sort_by_key(|(year, _)| *year);

        let errors = report.into_result().unwrap_err();
        assert_eq!(
            errors,
            vec![(2021, "first"), (2024, "second"), (2025, "third")]
        );
    }
}
