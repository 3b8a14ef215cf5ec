//! Triage classification.
//!
//! [`Classifier::classify`] turns an [`EmergencyProfile`] into a [`PriorityResult`]: a priority
//! level plus an ordered list of alerts. Evaluation is deterministic and performs no I/O.
//!
//! Evaluation order, which is also the order alerts appear in:
//!
//! 1. conditions
//! 2. allergies
//! 3. blood group rarity
//! 4. medications
//!
//! Priority never goes down once raised. Allergy matches escalate rather than set a level: the
//! first match on a `normal` profile raises it to `caution`, any further match (or any match on
//! an already elevated profile) raises it to `critical`. Every allergy alert is itself critical.
//! A rare blood group adds an informational alert without touching the priority.

use crate::blood::{self, Rarity};
use crate::interactions;
use crate::knowledge::KnowledgeBase;
use crate::matching::{KeywordMatcher, SubstringMatcher};
use crate::protocols::{self, Protocol};
use emh_types::{BloodGroup, EmergencyProfile};
use serde::{Deserialize, Serialize};
use std::fmt;

const ALLERGY_ICON: &str = "⚠️";
const BLOOD_ICON: &str = "🅾️";

/// Severity attached to a single alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Caution,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Caution => "caution",
            Severity::Critical => "critical",
        }
    }
}

/// Overall triage level. Ordered: `Normal < Caution < Critical`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    Caution,
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Caution => "caution",
            Priority::Critical => "critical",
        }
    }

    /// Raise to at least `severity`. Never lowers.
    pub fn raise(self, severity: Severity) -> Self {
        self.max(Priority::from(severity))
    }
}

impl From<Severity> for Priority {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Caution => Priority::Caution,
            Severity::Critical => Priority::Critical,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of the profile raised an alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Condition,
    Allergy,
    Blood,
    Drug,
}

/// A single clinical alert shown to the medic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub icon: String,
}

impl Alert {
    pub fn new(
        alert_type: AlertType,
        severity: Severity,
        message: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            alert_type,
            severity,
            message: message.into(),
            icon: icon.into(),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// Result of classifying one profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityResult {
    pub priority: Priority,
    pub alerts: Vec<Alert>,
}

impl PriorityResult {
    pub fn critical_alert_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.is_critical()).count()
    }
}

/// Evaluates profiles against a [`KnowledgeBase`] using a [`KeywordMatcher`].
///
/// Holds no mutable state; a single instance can be shared across request handlers.
#[derive(Clone, Debug)]
pub struct Classifier<M = SubstringMatcher> {
    knowledge: KnowledgeBase,
    matcher: M,
}

impl Classifier {
    /// Built-in tables with case-insensitive substring matching.
    pub fn standard() -> Self {
        Self::new(KnowledgeBase::standard(), SubstringMatcher)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::standard()
    }
}

impl<M: KeywordMatcher> Classifier<M> {
    pub fn new(knowledge: KnowledgeBase, matcher: M) -> Self {
        Self { knowledge, matcher }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Compute the triage priority and alerts for `profile`.
    pub fn classify(&self, profile: &EmergencyProfile) -> PriorityResult {
        let mut priority = Priority::Normal;
        let mut alerts = Vec::new();

        for condition in &profile.critical_conditions {
            let Some(rule) = self
                .knowledge
                .conditions()
                .iter()
                .find(|rule| self.matcher.matches_any(condition, rule.keywords))
            else {
                continue;
            };
            priority = priority.raise(rule.severity);
            alerts.push(Alert::new(
                AlertType::Condition,
                rule.severity,
                format!("{} ({}): {}", rule.title, condition.trim(), rule.advice),
                rule.icon,
            ));
        }

        for allergy in &profile.critical_allergies {
            let Some(rule) = self
                .knowledge
                .allergens()
                .iter()
                .find(|rule| self.matcher.matches_any(allergy, rule.keywords))
            else {
                continue;
            };
            priority = escalate_for_allergy(priority);
            alerts.push(Alert::new(
                AlertType::Allergy,
                Severity::Critical,
                format!("{} ({}): {}", rule.title, allergy.trim(), rule.advice),
                ALLERGY_ICON,
            ));
        }

        if let Some(alert) = blood_rarity_alert(profile.blood_group) {
            alerts.push(alert);
        }

        for alert in interactions::scan_interactions(
            &profile.current_medications,
            self.knowledge.interactions(),
            &self.matcher,
        ) {
            priority = priority.raise(alert.severity);
            alerts.push(alert);
        }

        let result = PriorityResult { priority, alerts };
        tracing::debug!(
            priority = %result.priority,
            alerts = result.alerts.len(),
            critical_alerts = result.critical_alert_count(),
            "classified profile"
        );
        result
    }

    /// Emergency protocols relevant to `profile`, conditions first, deduplicated.
    pub fn select_protocols(&self, profile: &EmergencyProfile) -> Vec<Protocol> {
        protocols::select_protocols(profile, self.knowledge.protocols(), &self.matcher)
    }

    /// Drug alerts for a medication list, independent of the rest of the profile.
    pub fn scan_interactions(&self, medications: &[String]) -> Vec<Alert> {
        interactions::scan_interactions(medications, self.knowledge.interactions(), &self.matcher)
    }
}

fn escalate_for_allergy(priority: Priority) -> Priority {
    match priority {
        Priority::Normal => Priority::Caution,
        Priority::Caution | Priority::Critical => Priority::Critical,
    }
}

fn blood_rarity_alert(blood_group: BloodGroup) -> Option<Alert> {
    let info = blood::resolve(blood_group)?;
    if info.rarity != Rarity::Rare {
        return None;
    }

    let donors = info
        .can_receive_from
        .iter()
        .map(|group| group.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Some(Alert::new(
        AlertType::Blood,
        Severity::Caution,
        format!(
            "Rare blood type {}: can receive only from {donors}; notify the blood bank early",
            blood_group
        ),
        BLOOD_ICON,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classify(profile: &EmergencyProfile) -> PriorityResult {
        Classifier::standard().classify(profile)
    }

    fn with_conditions(conditions: &[&str]) -> EmergencyProfile {
        EmergencyProfile {
            critical_conditions: conditions.iter().map(|s| s.to_string()).collect(),
            ..EmergencyProfile::default()
        }
    }

    #[test]
    fn empty_profile_is_normal_with_no_alerts() {
        let result = classify(&EmergencyProfile::default());
        assert_eq!(result, PriorityResult::default());
        assert_eq!(result.priority, Priority::Normal);
        assert!(result.alerts.is_empty());
    }

    #[test]
    fn hemophilia_is_critical() {
        let result = classify(&with_conditions(&["Hemophilia A"]));
        assert_eq!(result.priority, Priority::Critical);
        assert_eq!(result.alerts.len(), 1);
        let alert = &result.alerts[0];
        assert_eq!(alert.alert_type, AlertType::Condition);
        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.message.contains("Hemophilia A"));
    }

    #[test]
    fn penicillin_alone_is_caution_with_one_allergy_alert() {
        let profile = EmergencyProfile {
            critical_allergies: vec!["Penicillin".into()],
            ..EmergencyProfile::default()
        };
        let result = classify(&profile);
        assert_eq!(result.priority, Priority::Caution);
        assert_eq!(result.alerts.len(), 1);
        assert_eq!(result.alerts[0].alert_type, AlertType::Allergy);
        assert_eq!(result.alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn allergy_on_top_of_diabetes_escalates_to_critical() {
        let profile = EmergencyProfile {
            critical_allergies: vec!["Penicillin".into()],
            critical_conditions: vec!["Type 2 Diabetes".into()],
            ..EmergencyProfile::default()
        };
        let result = classify(&profile);
        assert_eq!(result.priority, Priority::Critical);
        assert_eq!(result.alerts.len(), 2);
        assert_eq!(result.alerts[0].alert_type, AlertType::Condition);
        assert_eq!(result.alerts[0].severity, Severity::Caution);
        assert_eq!(result.alerts[1].alert_type, AlertType::Allergy);
    }

    #[test]
    fn two_allergies_escalate_to_critical() {
        let profile = EmergencyProfile {
            critical_allergies: vec!["Latex".into(), "Peanuts".into()],
            ..EmergencyProfile::default()
        };
        assert_eq!(classify(&profile).priority, Priority::Critical);
    }

    #[test]
    fn diabetes_alone_is_caution() {
        let result = classify(&with_conditions(&["Type 1 diabetic"]));
        assert_eq!(result.priority, Priority::Caution);
        assert_eq!(result.alerts[0].icon, "💉");
    }

    #[test]
    fn o_negative_alone_adds_blood_alert_without_raising_priority() {
        let profile = EmergencyProfile {
            blood_group: BloodGroup::ONeg,
            ..EmergencyProfile::default()
        };
        let result = classify(&profile);
        assert_eq!(result.priority, Priority::Normal);
        assert_eq!(result.alerts.len(), 1);
        assert_eq!(result.alerts[0].alert_type, AlertType::Blood);
        assert_eq!(result.alerts[0].severity, Severity::Caution);
        assert!(result.alerts[0].message.contains("O-"));
        assert!(blood::resolve(BloodGroup::ONeg)
            .expect("O- is a standard group")
            .universal_donor);
    }

    #[test]
    fn common_blood_group_adds_nothing() {
        let profile = EmergencyProfile {
            blood_group: BloodGroup::APos,
            ..EmergencyProfile::default()
        };
        assert!(classify(&profile).alerts.is_empty());
    }

    #[test]
    fn warfarin_alone_is_critical() {
        let profile = EmergencyProfile {
            current_medications: vec!["Warfarin 5mg".into()],
            ..EmergencyProfile::default()
        };
        let result = classify(&profile);
        assert_eq!(result.priority, Priority::Critical);
        assert_eq!(result.alerts.len(), 1);
        assert_eq!(result.alerts[0].alert_type, AlertType::Drug);
        assert_eq!(result.alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn caution_drug_raises_to_caution() {
        let profile = EmergencyProfile {
            current_medications: vec!["Metformin".into()],
            ..EmergencyProfile::default()
        };
        assert_eq!(classify(&profile).priority, Priority::Caution);
    }

    #[test]
    fn unrecognised_text_is_ignored() {
        let profile = EmergencyProfile {
            critical_conditions: vec!["xyz123notamedicalterm".into()],
            critical_allergies: vec!["pollen".into()],
            current_medications: vec!["vitamin d".into()],
            ..EmergencyProfile::default()
        };
        let result = classify(&profile);
        assert_eq!(result.priority, Priority::Normal);
        assert!(result.alerts.is_empty());
    }

    #[test]
    fn alerts_follow_category_order() {
        let profile = EmergencyProfile {
            blood_group: BloodGroup::BNeg,
            critical_allergies: vec!["Shellfish".into()],
            critical_conditions: vec!["Epilepsy".into()],
            current_medications: vec!["Digoxin".into()],
            ..EmergencyProfile::default()
        };
        let types: Vec<_> = classify(&profile)
            .alerts
            .iter()
            .map(|a| a.alert_type)
            .collect();
        assert_eq!(
            types,
            vec![
                AlertType::Condition,
                AlertType::Allergy,
                AlertType::Blood,
                AlertType::Drug
            ]
        );
    }

    #[test]
    fn one_condition_yields_one_alert_even_if_several_rules_match() {
        // "bleeding disorder with heart murmur" hits two rules; only the first applies.
        let result = classify(&with_conditions(&["bleeding disorder with heart murmur"]));
        assert_eq!(result.alerts.len(), 1);
        assert!(result.alerts[0].message.starts_with("Bleeding disorder"));
    }

    #[test]
    fn serialises_with_lowercase_enums_and_type_key() {
        let json = serde_json::to_value(classify(&with_conditions(&["Asthma"])))
            .expect("serialise result");
        assert_eq!(json["priority"], "critical");
        assert_eq!(json["alerts"][0]["type"], "condition");
        assert_eq!(json["alerts"][0]["severity"], "critical");
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::Normal < Priority::Caution);
        assert!(Priority::Caution < Priority::Critical);
        assert_eq!(Priority::Critical.raise(Severity::Caution), Priority::Critical);
        assert_eq!(Priority::Normal.raise(Severity::Caution), Priority::Caution);
    }

    const VOCAB: &[&str] = &[
        "Hemophilia A",
        "Type 2 Diabetes",
        "Epilepsy",
        "Severe asthma",
        "Heart failure",
        "Penicillin",
        "Latex",
        "Peanuts",
        "Warfarin",
        "Metformin",
        "Lisinopril",
        "Digoxin",
        "Phenelzine",
        "Aspirin",
        "xyz123notamedicalterm",
        "seasonal hay fever",
    ];

    fn text_list() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(prop::sample::select(VOCAB).prop_map(str::to_string), 0..6)
    }

    fn any_profile() -> impl Strategy<Value = EmergencyProfile> {
        (
            text_list(),
            text_list(),
            text_list(),
            prop::sample::select(vec![
                BloodGroup::ONeg,
                BloodGroup::OPos,
                BloodGroup::AbNeg,
                BloodGroup::APos,
                BloodGroup::Unknown,
            ]),
        )
            .prop_map(|(conditions, allergies, medications, blood_group)| EmergencyProfile {
                critical_conditions: conditions,
                critical_allergies: allergies,
                current_medications: medications,
                blood_group,
                ..EmergencyProfile::default()
            })
    }

    proptest! {
        #[test]
        fn classification_is_deterministic(profile in any_profile()) {
            prop_assert_eq!(classify(&profile), classify(&profile));
        }

        #[test]
        fn adding_entries_never_lowers_priority(
            profile in any_profile(),
            extra in prop::sample::select(VOCAB),
            list in 0usize..3,
        ) {
            let before = classify(&profile).priority;
            let mut grown = profile.clone();
            match list {
                0 => grown.critical_conditions.push(extra.to_string()),
                1 => grown.critical_allergies.push(extra.to_string()),
                _ => grown.current_medications.push(extra.to_string()),
            }
            prop_assert!(classify(&grown).priority >= before);
        }

        #[test]
        fn shuffling_within_a_category_keeps_priority(
            (profile, shuffled) in any_profile().prop_flat_map(|p| {
                let conditions = p.critical_conditions.clone();
                (Just(p), Just(conditions).prop_shuffle())
            })
        ) {
            let mut reordered = profile.clone();
            reordered.critical_conditions = shuffled;
            let a = classify(&profile);
            let b = classify(&reordered);
            prop_assert_eq!(a.priority, b.priority);
            prop_assert_eq!(a.alerts.len(), b.alerts.len());
        }

        #[test]
        fn critical_stays_critical(
            profile in any_profile(),
            extra in prop::sample::select(vec!["Hemophilia A", "Penicillin", "Warfarin"]),
        ) {
            let mut critical = profile;
            critical.current_medications.push("Warfarin".to_string());
            prop_assert_eq!(classify(&critical).priority, Priority::Critical);

            let mut grown = critical.clone();
            grown.critical_conditions.push(extra.to_string());
            grown.critical_allergies.push(extra.to_string());
            grown.current_medications.push(extra.to_string());
            prop_assert_eq!(classify(&grown).priority, Priority::Critical);
        }
    }
}
