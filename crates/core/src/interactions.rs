//! Drug interaction scanning.
//!
//! Each medication is checked against every entry in the interaction table. Entries already
//! describe the dangerous co-factors for their drug class, so no pairwise cross-check between
//! the patient's own medications is performed.

use crate::knowledge::InteractionRule;
use crate::matching::KeywordMatcher;
use crate::triage::{Alert, AlertType};

const DRUG_ICON: &str = "💊";

/// Alerts for every (medication, table entry) match, in medication order then table order.
pub fn scan_interactions<M>(
    medications: &[String],
    rules: &[InteractionRule],
    matcher: &M,
) -> Vec<Alert>
where
    M: KeywordMatcher + ?Sized,
{
    medications
        .iter()
        .flat_map(move |medication| {
            rules
                .iter()
                .filter(move |rule| matcher.matches_any(medication, rule.keywords))
                .map(move |rule| {
                    Alert::new(
                        AlertType::Drug,
                        rule.severity,
                        format!("{} ({}): {}", medication.trim(), rule.drug_class, rule.risk),
                        DRUG_ICON,
                    )
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeBase;
    use crate::matching::SubstringMatcher;
    use crate::triage::Severity;

    fn scan(medications: &[&str]) -> Vec<Alert> {
        let medications: Vec<String> = medications.iter().map(|m| m.to_string()).collect();
        scan_interactions(
            &medications,
            KnowledgeBase::standard().interactions(),
            &SubstringMatcher,
        )
    }

    #[test]
    fn warfarin_is_critical() {
        let alerts = scan(&["WARFARIN 3mg daily"]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].alert_type, AlertType::Drug);
        assert!(alerts[0].message.contains("anticoagulant"));
    }

    #[test]
    fn severities_follow_the_table() {
        assert_eq!(scan(&["Aspirin 75mg"])[0].severity, Severity::Caution);
        assert_eq!(scan(&["metformin"])[0].severity, Severity::Caution);
        assert_eq!(scan(&["Ramipril"])[0].severity, Severity::Caution);
        assert_eq!(scan(&["Digoxin"])[0].severity, Severity::Critical);
        assert_eq!(scan(&["Phenelzine (MAOI)"])[0].severity, Severity::Critical);
    }

    #[test]
    fn keeps_medication_order() {
        let alerts = scan(&["Metformin", "Coumadin"]);
        assert_eq!(alerts.len(), 2);
        assert!(alerts[0].message.starts_with("Metformin"));
        assert!(alerts[1].message.starts_with("Coumadin"));
    }

    #[test]
    fn one_medication_can_match_several_entries() {
        let alerts = scan(&["warfarin with aspirin"]);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].severity, Severity::Caution);
    }

    #[test]
    fn unknown_medication_yields_nothing() {
        assert!(scan(&["Paracetamol", "", "vitamin D"]).is_empty());
    }
}
