//! ABO/Rh blood groups.

use std::fmt;

/// A patient's blood group.
///
/// `Unknown` covers missing data as well as text that could not be recognised. Parsing never
/// fails: callers that need to know whether a group was supplied check [`BloodGroup::is_known`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BloodGroup {
    APos,
    ANeg,
    BPos,
    BNeg,
    AbPos,
    AbNeg,
    OPos,
    ONeg,
    #[default]
    Unknown,
}

impl BloodGroup {
    /// The eight standard groups, in display order.
    pub const STANDARD: [BloodGroup; 8] = [
        BloodGroup::APos,
        BloodGroup::ANeg,
        BloodGroup::BPos,
        BloodGroup::BNeg,
        BloodGroup::AbPos,
        BloodGroup::AbNeg,
        BloodGroup::OPos,
        BloodGroup::ONeg,
    ];

    /// Short display form, e.g. `AB-`.
    pub fn as_str(self) -> &'static str {
        match self {
            BloodGroup::APos => "A+",
            BloodGroup::ANeg => "A-",
            BloodGroup::BPos => "B+",
            BloodGroup::BNeg => "B-",
            BloodGroup::AbPos => "AB+",
            BloodGroup::AbNeg => "AB-",
            BloodGroup::OPos => "O+",
            BloodGroup::ONeg => "O-",
            BloodGroup::Unknown => "Unknown",
        }
    }

    /// Parses free text into a standard group.
    ///
    /// Accepts `A+`, `a+`, `AB neg`, `O positive` and similar. Returns `None` for anything
    /// else, including the literal `Unknown`.
    pub fn parse(input: &str) -> Option<Self> {
        let compact: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        let (abo, positive) = split_rh(&compact)?;
        let group = match (abo, positive) {
            ("A", true) => BloodGroup::APos,
            ("A", false) => BloodGroup::ANeg,
            ("B", true) => BloodGroup::BPos,
            ("B", false) => BloodGroup::BNeg,
            ("AB", true) => BloodGroup::AbPos,
            ("AB", false) => BloodGroup::AbNeg,
            ("O", true) => BloodGroup::OPos,
            ("O", false) => BloodGroup::ONeg,
            _ => return None,
        };
        Some(group)
    }

    /// Parses free text, falling back to `Unknown`.
    pub fn from_text(input: &str) -> Self {
        Self::parse(input).unwrap_or(BloodGroup::Unknown)
    }

    pub fn is_known(self) -> bool {
        self != BloodGroup::Unknown
    }
}

fn split_rh(compact: &str) -> Option<(&str, bool)> {
    const POSITIVE: [&str; 3] = ["POSITIVE", "POS", "+"];
    const NEGATIVE: [&str; 3] = ["NEGATIVE", "NEG", "-"];

    for suffix in POSITIVE {
        if let Some(abo) = compact.strip_suffix(suffix) {
            return Some((abo, true));
        }
    }
    for suffix in NEGATIVE {
        if let Some(abo) = compact.strip_suffix(suffix) {
            return Some((abo, false));
        }
    }
    None
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for BloodGroup {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for BloodGroup {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(BloodGroup::from_text(&s))
    }
}
