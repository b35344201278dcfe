//! Decision proposer: deterministic venue auditing over joined results.
//!
//! The reasoning step is a pure function of the session context and
//! the settled fetch results; identical inputs always yield the same
//! candidate. A real reasoning engine would sit behind the same
//! [`Proposer`] trait.

use std::collections::HashMap;

use serde_json::{json, Value};
use tracing::debug;

use crate::models::approval::Candidate;
use crate::models::fetch::{FetchResult, FetchStatus};
use crate::models::session::EventContext;
use crate::sources;
use crate::{AppError, Result};

/// Black-box reasoning seam: propose one candidate from joined results.
pub trait Proposer: Send + Sync {
    /// Produce a candidate for the session, or fail when the joined
    /// results carry no usable venue data.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InsufficientData`] when every source is in
    /// `error`/`timeout` state or no venue record is present.
    fn propose(
        &self,
        context: &EventContext,
        results: &HashMap<String, FetchResult>,
    ) -> Result<Candidate>;
}

/// Deterministic auditor: recommends the venue with the lowest grand
/// total (venue base emissions plus transport estimate).
pub struct EmissionsAuditor;

impl Proposer for EmissionsAuditor {
    fn propose(
        &self,
        context: &EventContext,
        results: &HashMap<String, FetchResult>,
    ) -> Result<Candidate> {
        if results.values().all(|r| !r.is_ok()) {
            return Err(AppError::InsufficientData(
                "all fetch sources failed or timed out".into(),
            ));
        }

        let venues = venue_records(results);
        if venues.is_empty() {
            return Err(AppError::InsufficientData(
                "no venue records in joined results".into(),
            ));
        }

        let transport_kg = transport_estimate(results);
        let policy_note = policy_note(results);
        let failed: Vec<&str> = results
            .values()
            .filter(|r| !r.is_ok())
            .map(|r| r.source_id.as_str())
            .collect();

        // Grand total per venue; missing figures count as zero so a
        // partial result set still yields a recommendation. Ties break
        // on venue name to keep the selection order-independent.
        let best = venues
            .iter()
            .map(|record| {
                let base = record
                    .get("base_emissions_kg")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                (record, base + transport_kg.unwrap_or(0.0))
            })
            .min_by(|(a_rec, a), (b_rec, b)| {
                a.total_cmp(b).then_with(|| {
                    record_name(a_rec).cmp(&record_name(b_rec))
                })
            });

        let Some((record, total)) = best else {
            return Err(AppError::InsufficientData(
                "no venue records in joined results".into(),
            ));
        };

        let venue = record_name(record)
            .ok_or_else(|| AppError::InsufficientData("venue record has no name".into()))?;

        let mut justification = format!(
            "Selected '{venue}' in {city} for {date}: lowest grand total of {total} kgCO2e across {count} venue option(s).",
            city = context.city,
            date = context.date,
            count = venues.len(),
        );
        if !failed.is_empty() {
            justification.push_str(&format!(
                " Partial data used: {} unavailable.",
                failed.join(", ")
            ));
        }
        if let Some(note) = policy_note {
            justification.push_str(&format!(" Policy: {note}"));
        }

        debug!(venue, total, "auditor selected candidate");

        Ok(Candidate {
            payload: json!({
                "venue": venue,
                "certification": record.get("certification").cloned().unwrap_or(Value::Null),
                "base_emissions_kg": record.get("base_emissions_kg").cloned().unwrap_or(Value::Null),
                "transport_emissions_kg": transport_kg,
                "total_emissions_kg": total,
            }),
            justification,
            requires_approval: true,
        })
    }
}

/// Collect venue records from successful results.
///
/// Accepts both an array of venue objects and a single venue object
/// (identified by a `name` or `venue` key).
fn venue_records(results: &HashMap<String, FetchResult>) -> Vec<Value> {
    let mut records = Vec::new();
    for result in results.values() {
        if result.status != FetchStatus::Ok {
            continue;
        }
        let Some(payload) = &result.payload else {
            continue;
        };
        match payload {
            Value::Array(items) => {
                records.extend(items.iter().filter(|v| looks_like_venue(v)).cloned());
            }
            record if looks_like_venue(record) => records.push(record.clone()),
            _ => {}
        }
    }
    records
}

fn looks_like_venue(value: &Value) -> bool {
    value.get("name").is_some() || value.get("venue").is_some()
}

fn record_name(value: &Value) -> Option<&str> {
    value
        .get("name")
        .or_else(|| value.get("venue"))
        .and_then(Value::as_str)
}

/// Transport total from a successful transport result, if any.
fn transport_estimate(results: &HashMap<String, FetchResult>) -> Option<f64> {
    results
        .values()
        .filter(|r| r.is_ok())
        .filter_map(|r| r.payload.as_ref())
        .find_map(|p| p.get("total_transport_emissions_kg").and_then(Value::as_f64))
}

/// Policy text from a successful policy result, if any.
fn policy_note(results: &HashMap<String, FetchResult>) -> Option<String> {
    results
        .values()
        .filter(|r| r.is_ok() && r.source_id == sources::policy::SOURCE_ID)
        .filter_map(|r| r.payload.as_ref())
        .find_map(|p| p.get("policy").and_then(Value::as_str).map(str::to_owned))
}
