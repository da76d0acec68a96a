//! Static engine configuration, built once at process start and passed by
//! reference into the resolver, the checklist operations, and the filters.
//! Nothing here is a global; tests construct alternative fixtures freely.

use crate::assimilation::DependencyTable;
use crate::checklist::ChecklistConfiguration;
use crate::domain::AdmissionContext;

/// All static tables one admission context needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfiguration {
    pub context: AdmissionContext,
    pub dependency_table: DependencyTable,
    pub checklist: ChecklistConfiguration,
}

impl EngineConfiguration {
    pub fn for_context(context: AdmissionContext) -> Self {
        Self {
            context,
            dependency_table: DependencyTable::assimilation(),
            checklist: ChecklistConfiguration::for_context(context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_context_gets_its_own_checklist_tables() {
        let doctoral = EngineConfiguration::for_context(AdmissionContext::Doctoral);
        let general = EngineConfiguration::for_context(AdmissionContext::General);

        assert_eq!(doctoral.checklist.context, AdmissionContext::Doctoral);
        assert_ne!(doctoral.checklist, general.checklist);
        // The dependency table is context-independent.
        assert_eq!(doctoral.dependency_table, general.dependency_table);
    }
}
