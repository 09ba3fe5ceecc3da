//! Fallback knowledge base.
//!
//! Static lookup tables of regional emergency contacts and safety
//! instructions. This is the deterministic floor of the system: when
//! every external collaborator is unreachable, these tables still
//! produce an answer, transparently labeled as fallback data.

use crate::model::{ContactKind, ContactRecord, HazardKind};

/// Region keys served by the knowledge base.
pub const REGION_GENERAL: &str = "general";

struct RegionEntry {
    key: &'static str,
    /// Location substrings that resolve to this region.
    markers: &'static [&'static str],
    contacts: &'static [(ContactKind, &'static str, &'static str)],
}

// (kind, label, value): labels feed the formatted summary, values feed
// the ContactRecord.
static REGIONS: &[RegionEntry] = &[
    RegionEntry {
        key: "california",
        markers: &["california", "los angeles", "san francisco", "sacramento"],
        contacts: &[
            (ContactKind::EmergencyPhone, "Emergency Services", "911"),
            (ContactKind::Phone, "CAL FIRE Information Line", "916-653-5123"),
            (
                ContactKind::Phone,
                "California OES Warning Center",
                "916-845-8911",
            ),
            (ContactKind::Phone, "FEMA Helpline", "1-800-621-3362"),
        ],
    },
    RegionEntry {
        key: "florida",
        markers: &["florida", "miami", "tampa", "orlando"],
        contacts: &[
            (ContactKind::EmergencyPhone, "Emergency Services", "911"),
            (
                ContactKind::Phone,
                "Florida Emergency Information Line",
                "1-800-342-3557",
            ),
            (ContactKind::Phone, "FEMA Helpline", "1-800-621-3362"),
        ],
    },
    RegionEntry {
        key: "texas",
        markers: &["texas", "houston", "austin", "dallas"],
        contacts: &[
            (ContactKind::EmergencyPhone, "Emergency Services", "911"),
            (
                ContactKind::Phone,
                "Texas Emergency Assistance Registry",
                "211",
            ),
            (ContactKind::Phone, "FEMA Helpline", "1-800-621-3362"),
        ],
    },
    RegionEntry {
        key: "punjab",
        markers: &["punjab", "gurdaspur", "amritsar", "ludhiana", "india"],
        contacts: &[
            (
                ContactKind::EmergencyPhone,
                "National Emergency Number",
                "112",
            ),
            (ContactKind::EmergencyPhone, "Disaster Helpline", "1078"),
            (ContactKind::Phone, "NDRF Control Room", "011-24363260"),
        ],
    },
];

static GENERAL_CONTACTS: &[(ContactKind, &str, &str)] = &[
    (ContactKind::EmergencyPhone, "Emergency Services", "911"),
    (ContactKind::Phone, "Poison Control", "1-800-222-1222"),
    (ContactKind::Phone, "FEMA Helpline", "1-800-621-3362"),
];

/// Resolves a free-form location to a region key; unknown locations
/// fall through to [`REGION_GENERAL`].
pub fn region_for_location(location: Option<&str>) -> &'static str {
    let Some(location) = location else {
        return REGION_GENERAL;
    };
    let lower = location.to_lowercase();
    for entry in REGIONS {
        if entry.markers.iter().any(|m| lower.contains(m)) {
            return entry.key;
        }
    }
    REGION_GENERAL
}

/// Static contact list for a region. Every record is marked as
/// fallback data.
pub fn fallback_contacts(region: &str) -> Vec<ContactRecord> {
    let table = REGIONS
        .iter()
        .find(|entry| entry.key == region)
        .map(|entry| entry.contacts)
        .unwrap_or(GENERAL_CONTACTS);

    table
        .iter()
        .map(|(kind, label, value)| {
            ContactRecord::new(*kind, *value)
                .with_source(format!("kb:{region}/{label}"))
                .with_confidence(0.9)
                .fallback()
        })
        .collect()
}

/// Ordered safety instructions for a hazard.
pub fn safety_instructions(hazard: HazardKind) -> Vec<String> {
    let steps: &[&str] = match hazard {
        HazardKind::Flood => &[
            "Move to higher ground immediately",
            "Do not walk through moving water",
            "Do not drive through flooded areas",
            "Follow evacuation orders from authorities",
        ],
        HazardKind::Wildfire => &[
            "Evacuate immediately if authorities order it",
            "Cover nose and mouth with a wet cloth",
            "Keep windows and doors closed to prevent embers from entering",
            "Use stairs instead of elevators",
            "If trapped, signal for help from a window",
        ],
        HazardKind::Earthquake => &[
            "Drop, cover, and hold on",
            "If indoors, stay away from windows",
            "If outdoors, move to a clear area away from buildings",
            "After shaking stops, check for injuries and damage",
            "Be prepared for aftershocks",
        ],
        HazardKind::Hurricane => &[
            "Follow evacuation orders from local authorities",
            "Secure your home and property",
            "Have emergency supplies ready",
            "Stay indoors during the storm",
            "Avoid flooded areas during and after the storm",
        ],
        HazardKind::Tornado => &[
            "Seek shelter in a basement or interior room on the lowest floor",
            "Stay away from windows and outside walls",
            "Cover your head and neck with your arms",
            "If caught outside, lie flat in a nearby ditch or depression",
            "Do not try to outrun a tornado in a vehicle",
        ],
        HazardKind::Medical => &[
            "Call emergency medical services immediately",
            "Do not move a seriously injured person unless they are in danger",
            "Apply pressure to stop any bleeding",
            "Stay with the person and monitor breathing until help arrives",
        ],
        HazardKind::General => &[
            "Call your local emergency number for life-threatening situations",
            "Follow instructions from local authorities",
            "Have emergency supplies prepared",
            "Stay informed through official channels",
            "Help others if you can do so safely",
        ],
    };

    steps.iter().map(|s| s.to_string()).collect()
}

/// One-line hazard warning used by the rescue fallback brief.
pub fn safety_warning(hazard: HazardKind, location: Option<&str>) -> String {
    let area = location.unwrap_or("your area");
    let action = match hazard {
        HazardKind::Flood => {
            "Seek higher ground immediately. Avoid walking or driving through flood waters."
        }
        HazardKind::Wildfire => {
            "If ordered to evacuate, do so immediately. Keep windows and doors closed."
        }
        HazardKind::Hurricane => {
            "Secure your property and prepare for high winds and flooding. Follow evacuation orders."
        }
        HazardKind::Earthquake => {
            "Drop, cover, and hold on. Stay away from windows and exterior walls."
        }
        HazardKind::Tornado => {
            "Take shelter on the lowest floor, away from windows, right now."
        }
        HazardKind::Medical => {
            "Call emergency medical services now and stay with the affected person."
        }
        HazardKind::General => {
            "Follow instructions from local authorities and stay tuned to emergency broadcasts."
        }
    };
    format!("ATTENTION: possible {hazard} situation reported in {area}. {action}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_regions_case_insensitively() {
        assert_eq!(region_for_location(Some("Gurdaspur highway")), "punjab");
        assert_eq!(region_for_location(Some("CALIFORNIA")), "california");
        assert_eq!(region_for_location(Some("Miami, Florida")), "florida");
        assert_eq!(region_for_location(Some("Atlantis")), REGION_GENERAL);
        assert_eq!(region_for_location(None), REGION_GENERAL);
    }

    #[test]
    fn fallback_contacts_are_labeled() {
        let contacts = fallback_contacts("california");
        assert!(!contacts.is_empty());
        assert!(contacts.iter().all(|c| c.used_fallback));
        assert!(
            contacts
                .iter()
                .any(|c| c.kind == ContactKind::EmergencyPhone)
        );
    }

    #[test]
    fn unknown_region_serves_general_table() {
        let contacts = fallback_contacts("atlantis");
        assert!(contacts.iter().any(|c| c.value == "911"));
    }

    #[test]
    fn every_hazard_has_instructions() {
        use strum::IntoEnumIterator;
        for hazard in HazardKind::iter() {
            assert!(
                !safety_instructions(hazard).is_empty(),
                "missing instructions for {hazard}"
            );
        }
    }
}
