//! Hazard verification collaborator - checks a reported hazard against
//! the National Weather Service active-alerts feed.
//!
//! Verification is advisory: a confirmation failure downgrades the
//! caller's confidence but never blocks a response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use clarion_core::ClarionError;
use clarion_core::config::ClarionConfig;
use clarion_core::model::HazardKind;

const BASE_URL: &str = "https://api.weather.gov/alerts/active";

/// Outcome of a verification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Confirmed,
    NotConfirmed,
    /// The source had no coverage for this hazard/location.
    Unknown,
}

/// The hazard/weather verification collaborator contract.
#[async_trait]
pub trait HazardVerifier: Send + Sync {
    async fn verify(
        &self,
        hazard: HazardKind,
        location: Option<&str>,
    ) -> Result<Verification, ClarionError>;
}

/// Verifier backed by the NWS active-alerts API. US coverage only;
/// anything outside resolves to `Unknown`.
#[derive(Clone)]
pub struct NwsHazardVerifier {
    client: Client,
}

impl NwsHazardVerifier {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    pub fn from_config(config: &ClarionConfig) -> Self {
        Self::new(&config.http_user_agent, config.call_timeout)
    }

    /// Alert event keywords that correspond to a hazard kind.
    fn event_markers(hazard: HazardKind) -> &'static [&'static str] {
        match hazard {
            HazardKind::Flood => &["flood", "flash flood"],
            HazardKind::Wildfire => &["fire", "red flag"],
            HazardKind::Hurricane => &["hurricane", "tropical storm"],
            HazardKind::Tornado => &["tornado"],
            HazardKind::Earthquake => &["earthquake"],
            HazardKind::Medical | HazardKind::General => &[],
        }
    }
}

#[async_trait]
impl HazardVerifier for NwsHazardVerifier {
    async fn verify(
        &self,
        hazard: HazardKind,
        location: Option<&str>,
    ) -> Result<Verification, ClarionError> {
        let markers = Self::event_markers(hazard);
        if markers.is_empty() {
            return Ok(Verification::Unknown);
        }

        let response = self
            .client
            .get(BASE_URL)
            .query(&[("status", "actual"), ("message_type", "alert")])
            .send()
            .await
            .map_err(|err| {
                ClarionError::external(
                    "hazard_verifier",
                    format!("NWS alerts request failed: {err}"),
                    err.is_connect() || err.is_timeout(),
                )
            })?;

        if !response.status().is_success() {
            return Err(ClarionError::external(
                "hazard_verifier",
                format!("NWS alerts returned {}", response.status()),
                false,
            ));
        }

        let feed: AlertFeed = response.json().await.map_err(|err| {
            ClarionError::external(
                "hazard_verifier",
                format!("Failed to parse NWS alerts: {err}"),
                false,
            )
        })?;

        let location_lower = location.map(str::to_lowercase);
        let mut saw_candidate = false;
        for alert in &feed.features {
            let event = alert.properties.event.to_lowercase();
            if !markers.iter().any(|m| event.contains(m)) {
                continue;
            }
            saw_candidate = true;
            match (&location_lower, &alert.properties.area_desc) {
                (Some(loc), Some(area)) if area.to_lowercase().contains(loc.as_str()) => {
                    return Ok(Verification::Confirmed);
                }
                (None, _) => return Ok(Verification::Confirmed),
                _ => {}
            }
        }

        // Matching alerts elsewhere in the country say nothing about
        // this location.
        if saw_candidate {
            Ok(Verification::Unknown)
        } else {
            Ok(Verification::NotConfirmed)
        }
    }
}

#[derive(Deserialize)]
struct AlertFeed {
    #[serde(default)]
    features: Vec<Alert>,
}

#[derive(Deserialize)]
struct Alert {
    properties: AlertProperties,
}

#[derive(Deserialize)]
struct AlertProperties {
    event: String,
    #[serde(rename = "areaDesc")]
    area_desc: Option<String>,
}
