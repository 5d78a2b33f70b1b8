//! Filmography extraction from the embedded `__NEXT_DATA__` payload of a
//! profile page.
//!
//! The payload is vendor controlled and drifts between page generations, so
//! every field is read through the total lookups in [`super::lookup`]. Only
//! three things are reported: a missing block, an undecodable block, and a
//! decoded block with no recognizable credit container.

use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

use super::lookup::{count_or, items, lookup, lookup_text, text_or};
use crate::domain::models::ExtractedCredit;
use crate::error::{Result, SyncError};

/// Title links always point at the public site, whatever host served the profile.
pub const TITLE_URL_BASE: &str = "https://www.imdb.com";

const CONTAINER_ROOT: [&str; 3] = ["props", "pageProps", "mainColumnData"];
const RELEASED: &str = "released";
const UNRELEASED: &str = "unreleased";

/// Which credit containers a decoded payload carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadShape<'a> {
    /// Current pages: both released and unreleased groups.
    Current {
        released: &'a [Value],
        unreleased: &'a [Value],
    },
    /// Older pages only ever had the released group.
    ReleasedOnly(&'a [Value]),
    UnreleasedOnly(&'a [Value]),
    Unrecognized,
}

impl<'a> PayloadShape<'a> {
    pub fn resolve(payload: &'a Value) -> Self {
        let Some(root) = lookup(payload, &CONTAINER_ROOT) else {
            return PayloadShape::Unrecognized;
        };
        let released = container_edges(root, RELEASED);
        let unreleased = container_edges(root, UNRELEASED);

        match (released, unreleased) {
            (Some(released), Some(unreleased)) => PayloadShape::Current {
                released,
                unreleased,
            },
            (Some(released), None) => PayloadShape::ReleasedOnly(released),
            (None, Some(unreleased)) => PayloadShape::UnreleasedOnly(unreleased),
            (None, None) => PayloadShape::Unrecognized,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PayloadShape::Current { .. } => "current",
            PayloadShape::ReleasedOnly(_) => "released-only",
            PayloadShape::UnreleasedOnly(_) => "unreleased-only",
            PayloadShape::Unrecognized => "unrecognized",
        }
    }

    /// Released edges first, then unreleased, each in source order.
    pub fn edges(&self) -> impl Iterator<Item = &'a Value> {
        let (first, second): (&'a [Value], &'a [Value]) = match *self {
            PayloadShape::Current {
                released,
                unreleased,
            } => (released, unreleased),
            PayloadShape::ReleasedOnly(released) => (released, &[]),
            PayloadShape::UnreleasedOnly(unreleased) => (unreleased, &[]),
            PayloadShape::Unrecognized => (&[], &[]),
        };
        first.iter().chain(second.iter())
    }
}

/// `<container>.edges` when it is actually a list.
fn container_edges<'a>(root: &'a Value, container: &str) -> Option<&'a [Value]> {
    lookup(root, &[container, "edges"])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

pub struct CreditsExtractor;

impl CreditsExtractor {
    /// Locate and decode the embedded structured-data block.
    pub fn extract_payload(html: &str) -> Result<Value> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("script#__NEXT_DATA__").unwrap());

        let document = Html::parse_document(html);
        let raw = document
            .select(selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .ok_or_else(|| SyncError::malformed("no __NEXT_DATA__ block in document"))?;

        if raw.trim().is_empty() {
            return Err(SyncError::malformed("__NEXT_DATA__ block is empty"));
        }

        serde_json::from_str(&raw)
            .map_err(|e| SyncError::malformed(format!("invalid __NEXT_DATA__ JSON: {}", e)))
    }

    /// Normalize a fetched profile page into credits, in source order.
    ///
    /// A page with valid data but no credit container yields an empty list
    /// and a warning; that is an entity with no public credits or a layout
    /// change, not a failure.
    pub fn extract(html: &str) -> Result<Vec<ExtractedCredit>> {
        let payload = Self::extract_payload(html)?;
        Ok(Self::extract_from_payload(&payload))
    }

    pub fn extract_from_payload(payload: &Value) -> Vec<ExtractedCredit> {
        let shape = PayloadShape::resolve(payload);
        if shape == PayloadShape::Unrecognized {
            let drift = SyncError::SchemaDrift(format!(
                "no {}/{} edges under {}",
                RELEASED,
                UNRELEASED,
                CONTAINER_ROOT.join(".")
            ));
            log::warn!("[EXTRACT] {}", drift);
            return Vec::new();
        }

        let credits: Vec<ExtractedCredit> = shape.edges().map(Self::normalize_edge).collect();
        log::debug!("[EXTRACT] {} payload yielded {} credits", shape.name(), credits.len());
        credits
    }

    /// Map one edge to a credit. Never fails; absent fields take their defaults.
    pub fn normalize_edge(edge: &Value) -> ExtractedCredit {
        // Legacy edges carry the credit fields inline instead of under `node`.
        let node = match lookup(edge, &["node"]) {
            Some(node) if node.is_object() => node,
            _ => edge,
        };

        let title_url = lookup_text(node, &["title", "id"])
            .filter(|id| !id.is_empty())
            .map(|id| format!("{}/title/{}/", TITLE_URL_BASE, id))
            .unwrap_or_default();

        let start_year = lookup_text(node, &["episodeCredits", "yearRange", "year"])
            .or_else(|| lookup_text(node, &["title", "releaseYear", "year"]))
            .or_else(|| lookup_text(node, &["releaseYear", "year"]))
            .unwrap_or_default();

        let end_year = lookup_text(node, &["episodeCredits", "yearRange", "endYear"])
            .filter(|year| !year.is_empty());

        let credit_type = lookup_text(node, &["title", "titleType", "text"])
            .or_else(|| lookup_text(node, &["titleType", "text"]))
            .unwrap_or_default();

        let role = Self::first_character(node)
            .or_else(|| lookup_text(node, &["category", "text"]))
            .unwrap_or_default();

        let production_stage = lookup_text(
            node,
            &["title", "productionStatus", "currentProductionStage", "text"],
        )
        .or_else(|| lookup_text(node, &["productionStatus", "currentProductionStage", "text"]))
        .unwrap_or_default();

        ExtractedCredit {
            title: text_or(node, &["title", "titleText", "text"], ""),
            title_url,
            start_year,
            end_year,
            episode_count: count_or(node, &["episodeCredits", "total"], 0),
            credit_type,
            role,
            production_stage,
        }
    }

    /// First character name: `[{ "name": .. }]` on current pages, plain strings on older ones.
    fn first_character(node: &Value) -> Option<String> {
        let first = items(node, &["characters"]).first()?;
        match first {
            Value::String(name) => Some(name.clone()),
            other => lookup_text(other, &["name"]),
        }
    }
}
