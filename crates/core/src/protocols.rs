//! Emergency protocol selection.

use crate::knowledge::{ProtocolDefinition, ProtocolId, ProtocolTrigger};
use crate::matching::KeywordMatcher;
use emh_types::EmergencyProfile;
use serde::Serialize;

/// A step-by-step response shown alongside the alerts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Protocol {
    pub id: ProtocolId,
    pub title: &'static str,
    pub steps: &'static [&'static str],
}

impl From<&ProtocolDefinition> for Protocol {
    fn from(definition: &ProtocolDefinition) -> Self {
        Self {
            id: definition.id,
            title: definition.title,
            steps: definition.steps,
        }
    }
}

/// Protocols matching the profile's conditions, then its allergies, in match order.
///
/// Each protocol appears at most once, at the position of its first match.
pub fn select_protocols<M>(
    profile: &EmergencyProfile,
    definitions: &[ProtocolDefinition],
    matcher: &M,
) -> Vec<Protocol>
where
    M: KeywordMatcher + ?Sized,
{
    let conditions = profile
        .critical_conditions
        .iter()
        .map(|text| (ProtocolTrigger::Condition, text));
    let allergies = profile
        .critical_allergies
        .iter()
        .map(|text| (ProtocolTrigger::Allergy, text));

    let mut selected: Vec<Protocol> = Vec::new();
    for (trigger, text) in conditions.chain(allergies) {
        for definition in definitions
            .iter()
            .filter(|d| d.trigger == trigger && matcher.matches_any(text, d.keywords))
        {
            if selected.iter().all(|p| p.id != definition.id) {
                selected.push(definition.into());
            }
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeBase;
    use crate::matching::SubstringMatcher;

    fn select(conditions: &[&str], allergies: &[&str]) -> Vec<ProtocolId> {
        let profile = EmergencyProfile {
            critical_conditions: conditions.iter().map(|s| s.to_string()).collect(),
            critical_allergies: allergies.iter().map(|s| s.to_string()).collect(),
            ..EmergencyProfile::default()
        };
        select_protocols(
            &profile,
            KnowledgeBase::standard().protocols(),
            &SubstringMatcher,
        )
        .into_iter()
        .map(|p| p.id)
        .collect()
    }

    #[test]
    fn empty_profile_has_no_protocols() {
        assert!(select(&[], &[]).is_empty());
    }

    #[test]
    fn conditions_come_before_allergies() {
        assert_eq!(
            select(&["Epilepsy", "Type 1 Diabetes"], &["Peanuts"]),
            vec![
                ProtocolId::Epilepsy,
                ProtocolId::Diabetes,
                ProtocolId::PeanutAllergy
            ]
        );
    }

    #[test]
    fn duplicates_are_removed() {
        assert_eq!(
            select(&["Diabetes", "diabetic neuropathy"], &["penicillin", "PENICILLIN"]),
            vec![ProtocolId::Diabetes, ProtocolId::PenicillinAllergy]
        );
    }

    #[test]
    fn allergy_text_does_not_trigger_condition_protocols() {
        // A peanut condition entry is not an allergy declaration.
        assert!(select(&[], &["diabetes"]).is_empty());
        assert!(select(&["peanut farmer"], &[]).is_empty());
    }

    #[test]
    fn protocol_carries_ordered_steps() {
        let profile = EmergencyProfile {
            critical_conditions: vec!["Severe asthma".into()],
            ..EmergencyProfile::default()
        };
        let protocols = select_protocols(
            &profile,
            KnowledgeBase::standard().protocols(),
            &SubstringMatcher,
        );
        assert_eq!(protocols.len(), 1);
        assert_eq!(protocols[0].id, ProtocolId::SevereAsthma);
        assert!(protocols[0].steps.len() >= 3);
        assert!(protocols[0].steps[0].starts_with("Sit"));
    }

    #[test]
    fn unrecognised_entries_select_nothing() {
        assert!(select(&["xyz123notamedicalterm"], &["pollen"]).is_empty());
    }
}
