use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Classification of an extracted contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContactKind {
    EmergencyPhone,
    Phone,
    Email,
    Address,
}

impl ContactKind {
    /// Precedence used when duplicate values carry conflicting kinds.
    /// Lower ranks win.
    fn rank(self) -> u8 {
        match self {
            Self::EmergencyPhone => 0,
            Self::Phone => 1,
            Self::Email => 2,
            Self::Address => 3,
        }
    }
}

/// A structured emergency/standard contact extracted from a source
/// document or served from the fallback knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub kind: ContactKind,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub confidence: f32,
    pub used_fallback: bool,
}

impl ContactRecord {
    pub fn new(kind: ContactKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            source_url: None,
            confidence: 1.0,
            used_fallback: false,
        }
    }

    pub fn with_source(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Marks the record as fallback data.
    pub fn fallback(mut self) -> Self {
        self.used_fallback = true;
        self
    }
}

/// Normalizes a contact value for dedup comparison.
///
/// Phones keep a leading `+` and lose separators; emails fold to lower
/// case; addresses fold case and collapse whitespace.
pub fn normalize_contact_value(kind: ContactKind, value: &str) -> String {
    match kind {
        ContactKind::EmergencyPhone | ContactKind::Phone => {
            let mut out = String::with_capacity(value.len());
            for (i, c) in value.chars().enumerate() {
                if c == '+' && i == 0 {
                    out.push(c);
                } else if c.is_ascii_digit() {
                    out.push(c);
                }
            }
            out
        }
        ContactKind::Email => value.trim().to_lowercase(),
        ContactKind::Address => value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    }
}

/// Merges contact records by normalized value.
///
/// When the same normalized value appears under both EMERGENCY_PHONE and
/// PHONE the emergency classification wins; among records of the same
/// kind the higher-confidence source wins. Output ordering is stable
/// (kind precedence, then value) so repeated runs over identical input
/// produce identical output.
pub fn dedupe_contacts(records: Vec<ContactRecord>) -> Vec<ContactRecord> {
    use std::collections::hash_map::Entry;

    let mut merged: HashMap<String, ContactRecord> = HashMap::new();

    for record in records {
        let key = normalize_contact_value(record.kind, &record.value);
        if key.is_empty() {
            continue;
        }
        // Phone and emergency phone share a key space so the precedence
        // rule can collapse them.
        let key = match record.kind {
            ContactKind::EmergencyPhone | ContactKind::Phone => format!("tel:{key}"),
            ContactKind::Email => format!("mailto:{key}"),
            ContactKind::Address => format!("addr:{key}"),
        };

        match merged.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                let replace = record.kind.rank() < existing.kind.rank()
                    || (record.kind.rank() == existing.kind.rank()
                        && record.confidence > existing.confidence);
                if replace {
                    // A live record absorbing a fallback duplicate stays
                    // live; a fallback record never hides a live one.
                    let fallback = existing.used_fallback && record.used_fallback;
                    *existing = record;
                    existing.used_fallback = fallback;
                } else {
                    existing.used_fallback = existing.used_fallback && record.used_fallback;
                }
            }
        }
    }

    let mut out: Vec<ContactRecord> = merged.into_values().collect();
    out.sort_by(|a, b| {
        a.kind
            .rank()
            .cmp(&b.kind.rank())
            .then_with(|| a.value.cmp(&b.value))
    });
    out
}
