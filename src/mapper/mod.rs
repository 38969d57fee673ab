//! # Source Data Mapper
//!
//! Converts raw ConfigMaps and Secrets into flat property maps.
//!
//! - Secret payloads are bytes and must decode as UTF-8
//! - embedded `application.*` files are flattened (see [`files`])
//! - every resulting key becomes `<prefix><key>`; the prefix is used verbatim,
//!   so a prefix that should end in a dot must include it
//! - labeled sources merge all matching objects, sorted by object name; the
//!   last object in that order wins on key collisions

mod files;

use crate::client::{Payload, RawRemoteObject};
use crate::error::MappingError;
use crate::source::{NormalizedSource, SourceKind};
use std::collections::BTreeMap;
use tracing::debug;

/// Stateless converter from remote objects to properties, bound to the active profiles
#[derive(Debug, Clone, Default)]
pub struct SourceDataMapper {
    active_profiles: Vec<String>,
}

impl SourceDataMapper {
    #[must_use]
    pub fn new(active_profiles: &[String]) -> Self {
        Self {
            active_profiles: active_profiles.to_vec(),
        }
    }

    /// Map a single object fetched for `source`
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when a payload is not valid UTF-8 or an embedded
    /// YAML file cannot be parsed.
    pub fn map(
        &self,
        object: &RawRemoteObject,
        source: &NormalizedSource,
    ) -> Result<BTreeMap<String, String>, MappingError> {
        let kind = source.kind();
        let decoded = decode_entries(kind, object)?;
        let expanded = files::expand_entries(kind, &object.name, decoded, &self.active_profiles)?;

        let prefix = match source {
            NormalizedSource::Named(named) => named.prefix(),
            NormalizedSource::Labeled(_) => "",
        };
        if prefix.is_empty() {
            return Ok(expanded);
        }
        Ok(expanded
            .into_iter()
            .map(|(key, value)| (format!("{prefix}{key}"), value))
            .collect())
    }

    /// Map and merge several objects (labeled sources)
    ///
    /// Objects are processed in name order regardless of the order the API
    /// listed them in, so the merge is stable across calls.
    ///
    /// # Errors
    ///
    /// Returns the first [`MappingError`] encountered.
    pub fn map_all(
        &self,
        mut objects: Vec<RawRemoteObject>,
        source: &NormalizedSource,
    ) -> Result<BTreeMap<String, String>, MappingError> {
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        let mut merged = BTreeMap::new();
        for object in &objects {
            debug!(object = object.name.as_str(), "Merging labeled object");
            merged.extend(self.map(object, source)?);
        }
        Ok(merged)
    }
}

fn decode_entries(
    kind: SourceKind,
    object: &RawRemoteObject,
) -> Result<BTreeMap<String, String>, MappingError> {
    object
        .data
        .iter()
        .map(|(key, payload)| {
            let value = match payload {
                Payload::Text(text) => text.clone(),
                Payload::Binary(bytes) => String::from_utf8(bytes.clone()).map_err(|_| {
                    MappingError::InvalidUtf8 {
                        kind,
                        object: object.name.clone(),
                        key: key.clone(),
                    }
                })?,
            };
            Ok((key.clone(), value))
        })
        .collect()
}
