//! Clinical lookup tables.
//!
//! All tables are immutable static data. They are bundled into a [`KnowledgeBase`] value which
//! is handed to the classifier, so tests can substitute their own tables and nothing in the
//! clinical logic reaches for a global.
//!
//! Keywords are lowercase. Matching is delegated to a [`crate::matching::KeywordMatcher`].

use crate::triage::Severity;
use serde::Serialize;

/// A recognised critical condition.
#[derive(Debug, PartialEq, Eq)]
pub struct ConditionRule {
    pub keywords: &'static [&'static str],
    pub severity: Severity,
    pub title: &'static str,
    pub advice: &'static str,
    pub icon: &'static str,
}

/// A clinically severe allergen.
#[derive(Debug, PartialEq, Eq)]
pub struct AllergenRule {
    pub keywords: &'static [&'static str],
    pub title: &'static str,
    pub advice: &'static str,
}

/// A drug (or drug class) with known dangerous co-factors.
#[derive(Debug, PartialEq, Eq)]
pub struct InteractionRule {
    pub keywords: &'static [&'static str],
    pub severity: Severity,
    pub drug_class: &'static str,
    pub risk: &'static str,
}

/// Stable identity of an emergency protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolId {
    Diabetes,
    Hemophilia,
    Epilepsy,
    SevereAsthma,
    HeartCondition,
    PeanutAllergy,
    PenicillinAllergy,
}

/// Which profile list a protocol is triggered from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolTrigger {
    Condition,
    Allergy,
}

/// A fixed step-by-step emergency response.
#[derive(Debug, PartialEq, Eq)]
pub struct ProtocolDefinition {
    pub id: ProtocolId,
    pub trigger: ProtocolTrigger,
    pub keywords: &'static [&'static str],
    pub title: &'static str,
    pub steps: &'static [&'static str],
}

/// The set of tables the classifier evaluates against.
#[derive(Clone, Copy, Debug)]
pub struct KnowledgeBase {
    conditions: &'static [ConditionRule],
    allergens: &'static [AllergenRule],
    interactions: &'static [InteractionRule],
    protocols: &'static [ProtocolDefinition],
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::standard()
    }
}

impl KnowledgeBase {
    /// The built-in clinical tables.
    pub const fn standard() -> Self {
        Self {
            conditions: CONDITION_RULES,
            allergens: ALLERGEN_RULES,
            interactions: INTERACTION_RULES,
            protocols: PROTOCOLS,
        }
    }

    /// Custom tables, mainly for tests.
    pub const fn new(
        conditions: &'static [ConditionRule],
        allergens: &'static [AllergenRule],
        interactions: &'static [InteractionRule],
        protocols: &'static [ProtocolDefinition],
    ) -> Self {
        Self {
            conditions,
            allergens,
            interactions,
            protocols,
        }
    }

    pub fn conditions(&self) -> &'static [ConditionRule] {
        self.conditions
    }

    pub fn allergens(&self) -> &'static [AllergenRule] {
        self.allergens
    }

    pub fn interactions(&self) -> &'static [InteractionRule] {
        self.interactions
    }

    pub fn protocols(&self) -> &'static [ProtocolDefinition] {
        self.protocols
    }
}

const BLEEDING_KEYWORDS: &[&str] = &["hemophilia", "haemophilia", "bleeding disorder"];
const CARDIAC_KEYWORDS: &[&str] = &["heart", "cardiac"];
const SEIZURE_KEYWORDS: &[&str] = &["epilepsy", "epileptic", "seizure"];
const ASTHMA_KEYWORDS: &[&str] = &["asthma"];
const DIABETES_KEYWORDS: &[&str] = &["diabetes", "diabetic"];
const PEANUT_KEYWORDS: &[&str] = &["peanut"];
const PENICILLIN_KEYWORDS: &[&str] = &["penicillin"];

// Critical rules come first: a condition text that matches several rules takes the first.
const CONDITION_RULES: &[ConditionRule] = &[
    ConditionRule {
        keywords: BLEEDING_KEYWORDS,
        severity: Severity::Critical,
        title: "Bleeding disorder",
        advice: "avoid intramuscular injections and apply prolonged pressure to wounds; \
                 clotting factor may be required",
        icon: "🩸",
    },
    ConditionRule {
        keywords: CARDIAC_KEYWORDS,
        severity: Severity::Critical,
        title: "Cardiac condition",
        advice: "monitor heart rhythm and check for a pacemaker or implanted defibrillator",
        icon: "❤️",
    },
    ConditionRule {
        keywords: SEIZURE_KEYWORDS,
        severity: Severity::Critical,
        title: "Seizure disorder",
        advice: "protect the head and airway, time any seizure and do not restrain",
        icon: "⚡",
    },
    ConditionRule {
        keywords: ASTHMA_KEYWORDS,
        severity: Severity::Critical,
        title: "Severe asthma",
        advice: "keep a reliever inhaler ready; a quiet chest is a danger sign",
        icon: "🫁",
    },
    ConditionRule {
        keywords: DIABETES_KEYWORDS,
        severity: Severity::Caution,
        title: "Diabetes",
        advice: "check blood glucose; hypoglycaemia can mimic intoxication or stroke",
        icon: "💉",
    },
];

const ALLERGEN_RULES: &[AllergenRule] = &[
    AllergenRule {
        keywords: PENICILLIN_KEYWORDS,
        title: "Penicillin allergy",
        advice: "do not give penicillins; use other beta-lactams with caution",
    },
    AllergenRule {
        keywords: &["latex"],
        title: "Latex allergy",
        advice: "use latex-free gloves, catheters and airway equipment",
    },
    AllergenRule {
        keywords: PEANUT_KEYWORDS,
        title: "Peanut allergy",
        advice: "risk of anaphylaxis; look for an adrenaline auto-injector",
    },
    AllergenRule {
        keywords: &["shellfish"],
        title: "Shellfish allergy",
        advice: "risk of anaphylaxis; avoid shellfish-derived products",
    },
    AllergenRule {
        keywords: &["bee sting", "bee venom"],
        title: "Bee sting allergy",
        advice: "risk of anaphylaxis after stings; look for an adrenaline auto-injector",
    },
    AllergenRule {
        keywords: &["aspirin"],
        title: "Aspirin allergy",
        advice: "avoid aspirin and other NSAIDs",
    },
    AllergenRule {
        keywords: &["iodine", "contrast"],
        title: "Iodine / contrast dye allergy",
        advice: "avoid iodinated contrast media and iodine antiseptics; alert radiology",
    },
    AllergenRule {
        keywords: &["sulfa", "sulpha"],
        title: "Sulfa allergy",
        advice: "avoid sulfonamide antibiotics",
    },
    AllergenRule {
        keywords: &["morphine"],
        title: "Morphine allergy",
        advice: "avoid morphine; choose an alternative analgesic",
    },
];

const INTERACTION_RULES: &[InteractionRule] = &[
    InteractionRule {
        keywords: &["warfarin", "coumadin"],
        severity: Severity::Critical,
        drug_class: "anticoagulant",
        risk: "high bleeding risk; avoid NSAIDs and aspirin and check INR before procedures",
    },
    InteractionRule {
        keywords: &["aspirin"],
        severity: Severity::Caution,
        drug_class: "antiplatelet",
        risk: "bleeding risk rises with anticoagulants or other NSAIDs",
    },
    InteractionRule {
        keywords: &["metformin"],
        severity: Severity::Caution,
        drug_class: "biguanide",
        risk: "withhold around iodinated contrast; risk of lactic acidosis",
    },
    InteractionRule {
        keywords: &[
            "ace inhibitor",
            "lisinopril",
            "enalapril",
            "ramipril",
            "captopril",
            "perindopril",
        ],
        severity: Severity::Caution,
        drug_class: "ACE inhibitor",
        risk: "hyperkalaemia with potassium supplements or spironolactone; watch for angioedema",
    },
    InteractionRule {
        keywords: &["digoxin"],
        severity: Severity::Critical,
        drug_class: "cardiac glycoside",
        risk: "narrow therapeutic range; toxicity with amiodarone, verapamil or low potassium",
    },
    InteractionRule {
        keywords: &[
            "maoi",
            "phenelzine",
            "tranylcypromine",
            "isocarboxazid",
            "selegiline",
        ],
        severity: Severity::Critical,
        drug_class: "MAO inhibitor",
        risk: "hypertensive crisis or serotonin syndrome with pethidine, tramadol, \
               adrenaline or SSRIs",
    },
];

const PROTOCOLS: &[ProtocolDefinition] = &[
    ProtocolDefinition {
        id: ProtocolId::Diabetes,
        trigger: ProtocolTrigger::Condition,
        keywords: DIABETES_KEYWORDS,
        title: "Diabetic emergency",
        steps: &[
            "Check blood glucose if a meter is available.",
            "If conscious and able to swallow, give fast-acting sugar.",
            "If unconscious, place in the recovery position; do not give anything by mouth.",
            "Look for an insulin pump or medical ID and tell responders.",
            "Call emergency services if there is no improvement within 15 minutes.",
        ],
    },
    ProtocolDefinition {
        id: ProtocolId::Hemophilia,
        trigger: ProtocolTrigger::Condition,
        keywords: BLEEDING_KEYWORDS,
        title: "Bleeding disorder",
        steps: &[
            "Apply firm, continuous pressure to any bleeding for at least 10 minutes.",
            "Do not give intramuscular injections, aspirin or NSAIDs.",
            "Treat any head injury as serious, even if minor.",
            "Ask whether the patient carries clotting factor concentrate.",
            "Transport to a hospital with a haemophilia centre if possible.",
        ],
    },
    ProtocolDefinition {
        id: ProtocolId::Epilepsy,
        trigger: ProtocolTrigger::Condition,
        keywords: SEIZURE_KEYWORDS,
        title: "Seizure",
        steps: &[
            "Move hazards away and cushion the head.",
            "Do not restrain the patient or put anything in their mouth.",
            "Time the seizure.",
            "When jerking stops, place in the recovery position and check breathing.",
            "Call emergency services if the seizure lasts over 5 minutes or repeats.",
        ],
    },
    ProtocolDefinition {
        id: ProtocolId::SevereAsthma,
        trigger: ProtocolTrigger::Condition,
        keywords: ASTHMA_KEYWORDS,
        title: "Severe asthma attack",
        steps: &[
            "Sit the patient upright and keep them calm.",
            "Give 1 puff of the reliever inhaler every 30-60 seconds, up to 10 puffs.",
            "Call emergency services if there is no improvement or they cannot speak.",
            "Repeat the reliever inhaler while waiting for help.",
        ],
    },
    ProtocolDefinition {
        id: ProtocolId::HeartCondition,
        trigger: ProtocolTrigger::Condition,
        keywords: CARDIAC_KEYWORDS,
        title: "Cardiac emergency",
        steps: &[
            "Call emergency services immediately.",
            "Keep the patient at rest, sitting in a comfortable position.",
            "Give 300 mg aspirin to chew unless allergic or on anticoagulants.",
            "If unresponsive and not breathing normally, start CPR and use an AED.",
        ],
    },
    ProtocolDefinition {
        id: ProtocolId::PeanutAllergy,
        trigger: ProtocolTrigger::Allergy,
        keywords: PEANUT_KEYWORDS,
        title: "Anaphylaxis (peanut)",
        steps: &[
            "Use the adrenaline auto-injector into the outer thigh.",
            "Call emergency services and say 'anaphylaxis'.",
            "Lay the patient flat with legs raised, or sitting if breathing is difficult.",
            "Give a second auto-injector after 5 minutes if there is no improvement.",
        ],
    },
    ProtocolDefinition {
        id: ProtocolId::PenicillinAllergy,
        trigger: ProtocolTrigger::Allergy,
        keywords: PENICILLIN_KEYWORDS,
        title: "Penicillin allergy",
        steps: &[
            "Do not administer penicillin or amoxicillin.",
            "Tell every receiving clinician about the allergy.",
            "Watch for rash, swelling or breathing difficulty after any antibiotic.",
            "Treat signs of anaphylaxis with adrenaline and call emergency services.",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_lowercase() {
        let kb = KnowledgeBase::standard();
        let all = kb
            .conditions()
            .iter()
            .flat_map(|r| r.keywords)
            .chain(kb.allergens().iter().flat_map(|r| r.keywords))
            .chain(kb.interactions().iter().flat_map(|r| r.keywords))
            .chain(kb.protocols().iter().flat_map(|p| p.keywords));
        for keyword in all {
            assert_eq!(*keyword, keyword.to_lowercase(), "{keyword}");
            assert!(!keyword.trim().is_empty());
        }
    }

    #[test]
    fn every_protocol_id_has_exactly_one_definition() {
        let ids = [
            ProtocolId::Diabetes,
            ProtocolId::Hemophilia,
            ProtocolId::Epilepsy,
            ProtocolId::SevereAsthma,
            ProtocolId::HeartCondition,
            ProtocolId::PeanutAllergy,
            ProtocolId::PenicillinAllergy,
        ];
        let protocols = KnowledgeBase::standard().protocols();
        assert_eq!(protocols.len(), ids.len());
        for id in ids {
            assert_eq!(protocols.iter().filter(|p| p.id == id).count(), 1, "{id:?}");
        }
    }

    #[test]
    fn covers_the_severe_allergen_list() {
        let allergens = KnowledgeBase::standard().allergens();
        for keyword in [
            "penicillin",
            "latex",
            "peanut",
            "shellfish",
            "bee sting",
            "aspirin",
            "iodine",
            "contrast",
            "sulfa",
            "morphine",
        ] {
            assert!(
                allergens.iter().any(|r| r.keywords.contains(&keyword)),
                "{keyword}"
            );
        }
    }
}
