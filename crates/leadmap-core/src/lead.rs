// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::LatLng;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A lead as supplied by the CRM store or a discovery search. Every field is optional:
/// discovery results are often only partially enriched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lead {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub status: Option<String>,
    pub company: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub source: Option<String>,
    pub rating: Option<f64>,
    pub value: Option<f64>,
    pub sector: Option<String>,
    pub region: Option<String>,
    #[serde(deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
}

impl Lead {
    /// The trimmed persisted identifier, if it is non-empty.
    pub fn persisted_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Both coordinates, only when present and finite.
    pub fn coordinates(&self) -> Option<LatLng> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(LatLng::new(lat, lng))
            }
            _ => None,
        }
    }

    /// Best human label: company, then contact name, then id.
    pub fn display_name(&self) -> &str {
        self.company
            .as_deref()
            .or(self.name.as_deref())
            .or(self.persisted_id())
            .unwrap_or("Unnamed lead")
    }
}

// Supabase rows carry uuid strings, discovery payloads sometimes carry numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) => Some(s),
        Some(RawId::Int(n)) => Some(n.to_string()),
        Some(RawId::Float(f)) => Some(f.to_string()),
        None => None,
    })
}

// Supabase returns `null` for an unset array column.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a JSON array of leads.
pub fn load_leads<P: AsRef<Path>>(path: P) -> Result<Vec<Lead>> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read leads from {:?}", path))?;
    let leads: Vec<Lead> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse leads in {:?}", path))?;
    log::debug!("[Leads] Loaded {} leads from {:?}", leads.len(), path);
    Ok(leads)
}

/// CRM leads followed by discovery results whose persisted id is not already known.
pub fn merge_discovered(crm: &[Lead], discovered: &[Lead]) -> Vec<Lead> {
    let known: HashSet<&str> = crm.iter().filter_map(Lead::persisted_id).collect();

    let mut merged = crm.to_vec();
    merged.extend(
        discovered
            .iter()
            .filter(|lead| lead.persisted_id().map_or(true, |id| !known.contains(id)))
            .cloned(),
    );
    merged
}
