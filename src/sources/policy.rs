//! Mock company-policy lookup.

use std::future::Future;
use std::pin::Pin;

use serde_json::json;
use tracing::debug;

use super::FetchSource;
use crate::models::session::EventContext;
use crate::Result;

/// Source id for company policy lookups.
pub const SOURCE_ID: &str = "company_policy";

/// Canned policy memory; always surfaces the catering requirement.
pub struct CompanyPolicySource;

impl FetchSource for CompanyPolicySource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn fetch(
        &self,
        _context: EventContext,
        params: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send + 'static>> {
        let query = params
            .get("query")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("catering")
            .to_owned();
        debug!(%query, "searching policy memory");

        Box::pin(async move {
            Ok(json!({
                "query": query,
                "policy": "The company strictly requires 100% Vegan Catering for all events."
            }))
        })
    }
}
