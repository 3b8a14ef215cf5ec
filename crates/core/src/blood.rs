//! Blood compatibility lookup.
//!
//! A static table over the eight standard ABO/Rh groups (red cell transfusion). Lookups return
//! `None` for [`BloodGroup::Unknown`]; callers omit the compatibility section in that case.

use emh_types::BloodGroup;
use serde::Serialize;
use BloodGroup::{ANeg, APos, AbNeg, AbPos, BNeg, BPos, ONeg, OPos};

/// How hard it is to find matching blood.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
}

/// Donor and recipient compatibility for one blood group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityInfo {
    pub blood_group: BloodGroup,
    pub can_receive_from: &'static [BloodGroup],
    pub can_donate_to: &'static [BloodGroup],
    pub rarity: Rarity,
    pub universal_donor: bool,
    pub universal_recipient: bool,
}

const ALL: &[BloodGroup] = &[ONeg, OPos, ANeg, APos, BNeg, BPos, AbNeg, AbPos];

const TABLE: [CompatibilityInfo; 8] = [
    CompatibilityInfo {
        blood_group: ONeg,
        can_receive_from: &[ONeg],
        can_donate_to: ALL,
        rarity: Rarity::Rare,
        universal_donor: true,
        universal_recipient: false,
    },
    CompatibilityInfo {
        blood_group: OPos,
        can_receive_from: &[ONeg, OPos],
        can_donate_to: &[OPos, APos, BPos, AbPos],
        rarity: Rarity::Common,
        universal_donor: false,
        universal_recipient: false,
    },
    CompatibilityInfo {
        blood_group: ANeg,
        can_receive_from: &[ONeg, ANeg],
        can_donate_to: &[ANeg, APos, AbNeg, AbPos],
        rarity: Rarity::Uncommon,
        universal_donor: false,
        universal_recipient: false,
    },
    CompatibilityInfo {
        blood_group: APos,
        can_receive_from: &[ONeg, OPos, ANeg, APos],
        can_donate_to: &[APos, AbPos],
        rarity: Rarity::Common,
        universal_donor: false,
        universal_recipient: false,
    },
    CompatibilityInfo {
        blood_group: BNeg,
        can_receive_from: &[ONeg, BNeg],
        can_donate_to: &[BNeg, BPos, AbNeg, AbPos],
        rarity: Rarity::Rare,
        universal_donor: false,
        universal_recipient: false,
    },
    CompatibilityInfo {
        blood_group: BPos,
        can_receive_from: &[ONeg, OPos, BNeg, BPos],
        can_donate_to: &[BPos, AbPos],
        rarity: Rarity::Uncommon,
        universal_donor: false,
        universal_recipient: false,
    },
    CompatibilityInfo {
        blood_group: AbNeg,
        can_receive_from: &[ONeg, ANeg, BNeg, AbNeg],
        can_donate_to: &[AbNeg, AbPos],
        rarity: Rarity::Rare,
        universal_donor: false,
        universal_recipient: false,
    },
    CompatibilityInfo {
        blood_group: AbPos,
        can_receive_from: ALL,
        can_donate_to: &[AbPos],
        rarity: Rarity::Uncommon,
        universal_donor: false,
        universal_recipient: true,
    },
];

/// Compatibility for `blood_group`, or `None` when the group is unknown.
pub fn resolve(blood_group: BloodGroup) -> Option<CompatibilityInfo> {
    TABLE
        .iter()
        .find(|info| info.blood_group == blood_group)
        .copied()
}

/// Lenient text variant of [`resolve`]. Unrecognised text yields `None`, never an error.
pub fn resolve_text(input: &str) -> Option<CompatibilityInfo> {
    BloodGroup::parse(input).and_then(resolve)
}

/// True if red cells from `donor` can be given to `recipient`.
pub fn can_donate_to(donor: BloodGroup, recipient: BloodGroup) -> bool {
    resolve(donor).is_some_and(|info| info.can_donate_to.contains(&recipient))
}

/// True if `recipient` can receive red cells from `donor`.
pub fn can_receive_from(recipient: BloodGroup, donor: BloodGroup) -> bool {
    resolve(recipient).is_some_and(|info| info.can_receive_from.contains(&donor))
}
