//! Deterministic pattern matching for contact extraction.
//!
//! Regex classes for emergency phones (keyword proximity), standard
//! phones, emails and street addresses. Everything here is pure: the
//! same input always yields the same records, which is what makes the
//! engine's pattern-only mode idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

use clarion_core::model::{ContactKind, ContactRecord, normalize_contact_value};

/// Result of one pattern pass over a document.
#[derive(Debug, Default)]
pub struct PatternExtraction {
    pub contacts: Vec<ContactRecord>,
    /// Number-like spans the patterns could not confidently classify;
    /// candidates for AI-assisted resolution.
    pub ambiguous: Vec<String>,
}

static EMERGENCY_PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:emergency|hotline|urgent|24\s*/?\s*7|rescue|helpline|dial)[^0-9+\n]{0,40}(\+?\d[\d\-\.\s\(\)]{0,18}\d|\d{3})",
    )
    .expect("emergency phone pattern")
});

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\(?\+?\d[\d\-\.\s\(\)]{5,18}\d)").expect("phone pattern"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern")
});

static DATE_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}[-./]\d{1,2}[-./]\d{1,4}$").expect("date pattern"));

static STREET_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(St|Ave|Rd|Blvd|Ln|Dr|Ct|Street|Avenue|Road|Boulevard|Lane|Drive|Court|Place|Square)\b",
    )
    .expect("street pattern")
});

static POSTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{5,6}(?:-\d{4})?\b|(?i)\b(?:PO Box|P\.O\. Box)\b").expect("postal pattern")
});

/// Runs every pattern class over the text.
pub fn extract_contacts(text: &str, source_url: Option<&str>) -> PatternExtraction {
    let mut out = PatternExtraction::default();
    if text.trim().is_empty() {
        return out;
    }

    let attach_source = |mut record: ContactRecord| {
        if let Some(url) = source_url {
            record = record.with_source(url);
        }
        record
    };

    // Emergency numbers first; short codes like 911 or 1078 only count
    // inside an emergency context.
    let mut emergency_values = Vec::new();
    for capture in EMERGENCY_PHONE.captures_iter(text) {
        let span = capture.get(1).map(|m| m.as_str()).unwrap_or_default();
        let normalized = normalize_contact_value(ContactKind::EmergencyPhone, span);
        let digits = normalized.trim_start_matches('+').len();
        if (3..=15).contains(&digits) && !DATE_LIKE.is_match(span.trim()) {
            emergency_values.push(normalized.clone());
            out.contacts.push(attach_source(
                ContactRecord::new(ContactKind::EmergencyPhone, span.trim()).with_confidence(0.8),
            ));
        }
    }

    for capture in PHONE.captures_iter(text) {
        let span = capture.get(1).map(|m| m.as_str()).unwrap_or_default();
        let trimmed = span.trim();
        if DATE_LIKE.is_match(trimmed) {
            continue;
        }
        let normalized = normalize_contact_value(ContactKind::Phone, trimmed);
        let digits = normalized.trim_start_matches('+').len();
        if !(7..=15).contains(&digits) {
            if digits > 15 && digits <= 20 {
                out.ambiguous.push(trimmed.to_string());
            }
            continue;
        }
        if all_same_digit(&normalized) {
            continue;
        }
        // Skip numbers already classified as emergency contacts.
        if emergency_values.contains(&normalized) {
            continue;
        }
        out.contacts.push(attach_source(
            ContactRecord::new(ContactKind::Phone, trimmed).with_confidence(0.7),
        ));
    }

    for m in EMAIL.find_iter(text) {
        out.contacts.push(attach_source(
            ContactRecord::new(ContactKind::Email, m.as_str()).with_confidence(0.9),
        ));
    }

    for address in extract_addresses(text) {
        out.contacts.push(attach_source(
            ContactRecord::new(ContactKind::Address, address).with_confidence(0.5),
        ));
    }

    out
}

/// Line heuristic: a street-type word or a postal marker plus enough
/// length makes a line an address candidate.
fn extract_addresses(text: &str) -> Vec<String> {
    let mut addresses = Vec::new();
    for line in text.lines() {
        let cleaned = line.trim().trim_start_matches(['-', '*', ' ']);
        if cleaned.len() <= 15 {
            continue;
        }
        let streety = STREET_WORD.is_match(cleaned);
        let postal = POSTAL.is_match(cleaned);
        let starts_numbered = cleaned
            .chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false);
        if streety && (postal || starts_numbered) {
            addresses.push(cleaned.to_string());
        }
    }
    addresses
}

fn all_same_digit(normalized: &str) -> bool {
    let digits: Vec<char> = normalized.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.len() > 1 && digits.iter().all(|c| *c == digits[0])
}
