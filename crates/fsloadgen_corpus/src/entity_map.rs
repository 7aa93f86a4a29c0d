//! Parser for the entity listing and the map it produces.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Entity IDs grouped by `(featurestore_id, entity_type)`, preserving the
/// order they appeared in the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMap {
    by_type: HashMap<(String, String), Vec<String>>,
}

impl EntityMap {
    /// Parses a whitespace-separated entity listing. Each token is a
    /// six-segment resource name:
    /// `featurestores/{featurestore_id}/entityTypes/{entity_type}/entities/{entity_id}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputMalformed`] if any token does not have exactly
    /// six `/`-separated segments in the expected positions.
    pub fn parse(listing: &str) -> Result<Self> {
        let mut by_type: HashMap<(String, String), Vec<String>> = HashMap::new();
        for (line_no, line) in listing.lines().enumerate() {
            for token in line.split_whitespace() {
                let (featurestore_id, entity_type, entity_id) =
                    parse_entity_token(token, line_no + 1)?;
                by_type
                    .entry((featurestore_id, entity_type))
                    .or_default()
                    .push(entity_id);
            }
        }
        Ok(Self { by_type })
    }

    /// Returns the entity IDs registered for a given featurestore/entity
    /// type pair, in listing order.
    #[must_use]
    pub fn entities_for(&self, featurestore_id: &str, entity_type: &str) -> Option<&[String]> {
        self.by_type
            .get(&(featurestore_id.to_string(), entity_type.to_string()))
            .map(Vec::as_slice)
    }

    /// Total number of distinct `(featurestore_id, entity_type)` groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.by_type.len()
    }

    /// Registers one `(featurestore_id, entity_type, entity_id)` row,
    /// preserving insertion order within its group. This is how a warehouse
    /// query result (rows already split into the three columns) joins the
    /// map, as opposed to [`EntityMap::parse`]'s text-token path.
    pub fn insert(
        &mut self,
        featurestore_id: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) {
        self.by_type
            .entry((featurestore_id.into(), entity_type.into()))
            .or_default()
            .push(entity_id.into());
    }
}

fn parse_entity_token(token: &str, line_no: usize) -> Result<(String, String, String)> {
    let segments: Vec<&str> = token.split('/').collect();
    let malformed = |reason: &str| Error::InputMalformed {
        location: format!("line {line_no}"),
        reason: format!("entity token '{token}': {reason}"),
    };
    if segments.len() != 6 {
        return Err(malformed("expected 6 '/'-separated segments"));
    }
    if segments[0] != "featurestores" {
        return Err(malformed("expected segment 0 to be 'featurestores'"));
    }
    if segments[2] != "entityTypes" {
        return Err(malformed("expected segment 2 to be 'entityTypes'"));
    }
    if segments[4] != "entities" {
        return Err(malformed("expected segment 4 to be 'entities'"));
    }
    if segments[1].is_empty() || segments[3].is_empty() || segments[5].is_empty() {
        return Err(malformed("featurestore_id, entity_type and entity_id must be non-empty"));
    }
    Ok((
        segments[1].to_string(),
        segments[3].to_string(),
        segments[5].to_string(),
    ))
}
