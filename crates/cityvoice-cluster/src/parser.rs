//! Parse LLM output into relations, labels, demands and proposals

use crate::error::ClusterError;
use cityvoice_domain::{ClusterLabel, Consensus, Demand, ItemId, Proposal, RelatedItem};
use serde_json::Value;
use tracing::warn;

/// Extract the JSON payload from a response
///
/// Handles markdown code fences and leading or trailing prose around a
/// single JSON object or array.
pub fn extract_json(response: &str) -> Result<&str, ClusterError> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```") {
        // Language tag directly after the fence, on the same line or not
        let body = trimmed[start + 3..].trim_start_matches(|c: char| c.is_ascii_alphabetic());
        let body = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
        let body = body.trim();
        if body.starts_with(['{', '[']) {
            return Ok(body);
        }
    }

    let open = trimmed.find(|c: char| c == '{' || c == '[');
    let close = trimmed.rfind(|c: char| c == '}' || c == ']');
    match (open, close) {
        (Some(start), Some(end)) if end > start => Ok(&trimmed[start..=end]),
        _ => Err(ClusterError::InvalidFormat(
            "No JSON object found in response".to_string(),
        )),
    }
}

fn parse_value(response: &str) -> Result<Value, ClusterError> {
    let json_str = extract_json(response)?;
    serde_json::from_str(json_str)
        .map_err(|e| ClusterError::JsonParse(format!("{}: {}", e, truncate(json_str, 120))))
}

/// The array under `key`, or the top-level array itself
fn list_field<'a>(json: &'a Value, key: &str) -> Result<&'a Vec<Value>, ClusterError> {
    if let Some(list) = json.as_array() {
        return Ok(list);
    }
    json.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ClusterError::InvalidFormat(format!("Expected a '{}' array", key)))
}

/// Item id given as a number or a numeric string
fn parse_id(value: &Value) -> Option<ItemId> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().trim_start_matches('[').trim_end_matches(']').parse().ok(),
        _ => None,
    }
}

fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse a relation lookup: `{"related": [{"id": n, "reason": "..."}]}`
pub fn parse_related(response: &str) -> Result<Vec<RelatedItem>, ClusterError> {
    let json = parse_value(response)?;
    let entries = list_field(&json, "related")?;

    let mut related = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        match entry.get("id").and_then(parse_id) {
            Some(id) => {
                let reason = str_field(entry, "reason").unwrap_or_default();
                related.push(RelatedItem::new(id, reason));
            }
            None => warn!("Related entry {} has no usable id", idx),
        }
    }
    Ok(related)
}

/// Parse a cluster label: `{"name", "summary", "action", "consensus"}`
pub fn parse_label(response: &str) -> Result<ClusterLabel, ClusterError> {
    let json = parse_value(response)?;

    let name = str_field(&json, "name")
        .ok_or_else(|| ClusterError::InvalidFormat("Missing or invalid 'name'".to_string()))?;
    let summary = str_field(&json, "summary").unwrap_or_default();
    let action = str_field(&json, "action").unwrap_or_default();
    let consensus = match str_field(&json, "consensus") {
        Some(raw) => raw.parse::<Consensus>().unwrap_or_else(|e| {
            warn!("{}; using Medium", e);
            Consensus::Medium
        }),
        None => Consensus::Medium,
    };

    Ok(ClusterLabel {
        name,
        summary,
        action,
        consensus,
    })
}

/// Parse demand extraction output: `{"demands": [...]}`
///
/// Entries without a description or without any contributing id are skipped.
pub fn parse_demands(response: &str) -> Result<Vec<Demand>, ClusterError> {
    let json = parse_value(response)?;
    let entries = list_field(&json, "demands")?;

    let mut demands = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        let Some(description) = str_field(entry, "description") else {
            warn!("Demand {} has no description", idx);
            continue;
        };
        let item_ids: Vec<ItemId> = entry
            .get("item_ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(parse_id).collect())
            .unwrap_or_default();
        if item_ids.is_empty() {
            warn!("Demand '{}' lists no items", description);
            continue;
        }
        let voices: Vec<String> = entry
            .get("voices")
            .and_then(Value::as_array)
            .map(|vs| vs.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        demands.push(Demand::new(description, item_ids, voices));
    }
    Ok(demands)
}

/// Parse action synthesis output: `{"proposals": [...]}`
pub fn parse_proposals(response: &str) -> Result<Vec<Proposal>, ClusterError> {
    let json = parse_value(response)?;
    let entries = list_field(&json, "proposals")?;

    let mut proposals = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        let (Some(title), Some(proposal)) = (str_field(entry, "title"), str_field(entry, "proposal"))
        else {
            warn!("Proposal {} is missing a title or text", idx);
            continue;
        };
        let supporting_demands = entry
            .get("supporting_demands")
            .and_then(Value::as_array)
            .map(|ds| ds.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let voices_represented = entry
            .get("voices_represented")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        proposals.push(Proposal {
            title,
            proposal,
            supporting_demands,
            voices_represented,
        });
    }
    Ok(proposals)
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
