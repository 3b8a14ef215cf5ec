//! Profile boundary normalisation.
//!
//! Patient documents come from an external store in whatever shape the store keeps them:
//! optional fields missing or `null`, a single allergy written as a bare string, a medication
//! list holding `{ "name": ... }` objects. This module turns such a document into an
//! [`EmergencyProfile`] once, so the classifier never checks for presence.
//!
//! Coercions lean towards keeping data:
//!
//! - `null` or a missing list becomes an empty list
//! - a single string or number becomes a one-item list
//! - numbers inside lists become their text
//! - objects inside lists that carry a string `name` become that name
//! - unrecognised blood group text becomes `Unknown`
//!
//! Anything else with the wrong type (booleans, nameless objects, nested arrays) is an error
//! naming the offending path. It is never dropped silently.

use crate::{ProfileError, ProfileResult};
use emh_types::{BloodGroup, EmergencyContact, EmergencyProfile, HealthId, PrimaryDoctor};
use serde_json::{Map, Value};
use std::path::Path;

/// Accepted top-level keys per field, canonical key first. Keys not listed here are ignored.
const FULL_NAME: &[&str] = &["fullName", "name"];
const BLOOD_GROUP: &[&str] = &["bloodGroup", "bloodType"];
const AGE: &[&str] = &["age"];
const ALLERGIES: &[&str] = &["criticalAllergies", "allergies"];
const CONDITIONS: &[&str] = &["criticalConditions", "conditions", "medicalConditions"];
const MEDICATIONS: &[&str] = &["currentMedications", "medications"];
const PRIMARY_CONTACT: &[&str] = &["primaryEmergencyContact", "emergencyContact"];
const SECONDARY_CONTACTS: &[&str] = &["secondaryEmergencyContacts"];
const DOCTOR: &[&str] = &["primaryDoctor", "doctor"];
const NOTES: &[&str] = &["criticalNotes", "notes"];
const HEALTH_ID: &[&str] = &["healthId"];

/// Parse a JSON patient document.
pub fn parse_profile_json(text: &str) -> ProfileResult<EmergencyProfile> {
    let value: Value = serde_json::from_str(text).map_err(ProfileError::Json)?;
    normalise_profile(value)
}

/// Parse a YAML patient document.
pub fn parse_profile_yaml(text: &str) -> ProfileResult<EmergencyProfile> {
    let value: Value = serde_yaml::from_str(text).map_err(ProfileError::Yaml)?;
    normalise_profile(value)
}

/// Load a patient document from disk. `.yaml`/`.yml` files are read as YAML, anything else as
/// JSON.
pub fn load_profile_file(path: &Path) -> ProfileResult<EmergencyProfile> {
    let text = std::fs::read_to_string(path).map_err(ProfileError::FileRead)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        parse_profile_yaml(&text)
    } else {
        parse_profile_json(&text)
    }
}

/// Normalise an already parsed patient document.
pub fn normalise_profile(value: Value) -> ProfileResult<EmergencyProfile> {
    let map = match &value {
        Value::Object(map) => map,
        other => return Err(ProfileError::NotAnObject(kind_of(other))),
    };

    let (allergies, allergies_path) = field(map, ALLERGIES);
    let (conditions, conditions_path) = field(map, CONDITIONS);
    let (medications, medications_path) = field(map, MEDICATIONS);
    let (primary_contact, primary_contact_path) = field(map, PRIMARY_CONTACT);
    let (secondary_contacts, secondary_contacts_path) = field(map, SECONDARY_CONTACTS);
    let (doctor_value, doctor_path) = field(map, DOCTOR);
    let (full_name, full_name_path) = field(map, FULL_NAME);
    let (notes, notes_path) = field(map, NOTES);

    Ok(EmergencyProfile {
        full_name: optional_text(full_name, full_name_path)?.unwrap_or_default(),
        blood_group: blood_group(field(map, BLOOD_GROUP))?,
        age: age(field(map, AGE))?,
        critical_allergies: text_list(allergies, allergies_path)?,
        critical_conditions: text_list(conditions, conditions_path)?,
        current_medications: text_list(medications, medications_path)?,
        primary_emergency_contact: primary_contact
            .map(|v| contact(v, primary_contact_path))
            .transpose()?,
        secondary_emergency_contacts: contact_list(secondary_contacts, secondary_contacts_path)?,
        primary_doctor: doctor_value
            .map(|v| doctor(v, doctor_path))
            .transpose()?,
        critical_notes: optional_text(notes, notes_path)?,
        health_id: health_id(field(map, HEALTH_ID))?,
    })
}

/// The first of `keys` holding a non-null value, with the key it was read from. Aliases are only
/// consulted when the canonical key is missing or `null`. With no value the path is the
/// canonical key.
fn field<'a>(
    map: &'a Map<String, Value>,
    keys: &[&'static str],
) -> (Option<&'a Value>, &'static str) {
    keys.iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()).map(|v| (Some(v), *key)))
        .unwrap_or((None, keys[0]))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Trimmed text for a string or number. Blank text and `null` are `None`.
fn optional_text(value: Option<&Value>, path: &str) -> ProfileResult<Option<String>> {
    let text = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(ProfileError::invalid(
                path,
                format!("expected text, found {}", kind_of(other)),
            ))
        }
    };
    Ok((!text.is_empty()).then_some(text))
}

fn text_list(value: Option<&Value>, path: &str) -> ProfileResult<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                if let Some(text) = list_item(item, &format!("{path}[{index}]"))? {
                    out.push(text);
                }
            }
            Ok(out)
        }
        Some(single) => Ok(list_item(single, path)?.into_iter().collect()),
    }
}

fn list_item(item: &Value, path: &str) -> ProfileResult<Option<String>> {
    match item {
        Value::Object(map) => match map.get("name") {
            Some(name @ Value::String(_)) => optional_text(Some(name), path),
            _ => Err(ProfileError::invalid(
                path,
                "object entries must carry a string 'name'",
            )),
        },
        other => optional_text(Some(other), path),
    }
}

fn blood_group((value, path): (Option<&Value>, &str)) -> ProfileResult<BloodGroup> {
    match value {
        None | Some(Value::Null) => Ok(BloodGroup::Unknown),
        Some(Value::String(text)) => Ok(BloodGroup::from_text(text)),
        Some(other) => Err(ProfileError::invalid(
            path,
            format!("expected text, found {}", kind_of(other)),
        )),
    }
}

fn age((value, path): (Option<&Value>, &str)) -> ProfileResult<Option<u32>> {
    let invalid = || ProfileError::invalid(path, "expected a whole number of years");
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<u32>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn object<'a>(value: &'a Value, path: &str) -> ProfileResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ProfileError::invalid(path, format!("expected an object, found {}", kind_of(value)))
    })
}

fn member_text(
    map: &Map<String, Value>,
    keys: &[&str],
    path: &str,
) -> ProfileResult<Option<String>> {
    let Some((key, value)) = keys.iter().find_map(|k| map.get(*k).map(|v| (*k, v))) else {
        return Ok(None);
    };
    optional_text(Some(value), &format!("{path}.{key}"))
}

fn contact(value: &Value, path: &str) -> ProfileResult<EmergencyContact> {
    let map = object(value, path)?;
    Ok(EmergencyContact {
        name: member_text(map, &["name"], path)?.unwrap_or_default(),
        relation: member_text(map, &["relation", "relationship"], path)?.unwrap_or_default(),
        phone: member_text(map, &["phone"], path)?.unwrap_or_default(),
        email: member_text(map, &["email"], path)?,
    })
}

fn contact_list(value: Option<&Value>, path: &str) -> ProfileResult<Vec<EmergencyContact>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(index, item)| contact(item, &format!("{path}[{index}]")))
            .collect(),
        Some(single) => Ok(vec![contact(single, path)?]),
    }
}

fn doctor(value: &Value, path: &str) -> ProfileResult<PrimaryDoctor> {
    let map = object(value, path)?;
    Ok(PrimaryDoctor {
        name: member_text(map, &["name"], path)?.unwrap_or_default(),
        hospital: member_text(map, &["hospital"], path)?,
        phone: member_text(map, &["phone"], path)?,
    })
}

fn health_id((value, path): (Option<&Value>, &str)) -> ProfileResult<Option<HealthId>> {
    optional_text(value, path)?
        .map(|text| {
            HealthId::parse(&text).map_err(|e| ProfileError::invalid(path, e.to_string()))
        })
        .transpose()
}
