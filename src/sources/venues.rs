//! Mock green-venue lookup.

use std::future::Future;
use std::pin::Pin;

use serde_json::json;
use tracing::debug;

use super::FetchSource;
use crate::models::session::EventContext;
use crate::Result;

/// Source id for green-venue lookups.
pub const SOURCE_ID: &str = "green_venues";

/// Canned venue directory filtered by city.
pub struct GreenVenueSource;

impl FetchSource for GreenVenueSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn fetch(
        &self,
        context: EventContext,
        _params: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send + 'static>> {
        debug!(city = %context.city, "searching green venues");
        let city = context.city;
        Box::pin(async move {
            Ok(json!([
                {
                    "name": "EcoHub Loft",
                    "city": city,
                    "certification": "LEED Gold",
                    "energy_rating": 95,
                    "base_emissions_kg": 120
                },
                {
                    "name": "GreenSpire Hotel",
                    "city": city,
                    "certification": "Green Key",
                    "energy_rating": 88,
                    "base_emissions_kg": 200
                },
                {
                    "name": "Industrial Space",
                    "city": city,
                    "certification": "None",
                    "energy_rating": 40,
                    "base_emissions_kg": 550
                }
            ]))
        })
    }
}
