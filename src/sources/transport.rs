//! Mock transport emissions estimate.

use std::future::Future;
use std::pin::Pin;

use serde_json::json;
use tracing::debug;

use super::FetchSource;
use crate::models::session::EventContext;
use crate::Result;

/// Source id for transport emissions estimates.
pub const SOURCE_ID: &str = "transport_emissions";

/// Fallback attendee count when the caller omits one.
const DEFAULT_ATTENDEES: u32 = 25;

/// Canned transport emissions calculator for travel into the host city.
pub struct TransportEmissionsSource;

impl FetchSource for TransportEmissionsSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn fetch(
        &self,
        context: EventContext,
        params: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send + 'static>> {
        let origin = params
            .get("origin")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Distributed")
            .to_owned();
        let destination = context.city;
        let attendees = context.attendees.unwrap_or(DEFAULT_ATTENDEES);
        debug!(%origin, %destination, attendees, "estimating transport emissions");

        Box::pin(async move {
            Ok(json!({
                "route": format!("{origin} -> {destination}"),
                "attendees": attendees,
                "transport_mode": "Train/Mix",
                "total_transport_emissions_kg": 450
            }))
        })
    }
}
