//! # Embedded File Entries
//!
//! ConfigMaps frequently carry whole `application.yaml` / `application.properties`
//! files as a single data entry. Those entries are flattened into dotted keys
//! instead of being exposed as one opaque value.
//!
//! Rules:
//! - an object with exactly one entry that looks like a file is always flattened
//! - otherwise `application.*` is flattened, then `application-<profile>.*` for each
//!   active profile in activation order (later wins)
//! - `application-<profile>.*` for an inactive profile is dropped
//! - every other key is copied verbatim

use crate::error::MappingError;
use crate::source::SourceKind;
use std::collections::BTreeMap;
use tracing::debug;

const APPLICATION_STEM: &str = "application";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Yaml,
    Properties,
}

/// Detect a file entry from its key and return the format plus the stem (name without extension)
fn file_format(key: &str) -> Option<(FileFormat, &str)> {
    if let Some(stem) = key.strip_suffix(".yaml").or_else(|| key.strip_suffix(".yml")) {
        return Some((FileFormat::Yaml, stem));
    }
    key.strip_suffix(".properties")
        .map(|stem| (FileFormat::Properties, stem))
}

/// Expand decoded entries of one object into flat properties
pub(crate) fn expand_entries(
    kind: SourceKind,
    object: &str,
    entries: BTreeMap<String, String>,
    active_profiles: &[String],
) -> Result<BTreeMap<String, String>, MappingError> {
    if entries.len() == 1 {
        if let Some((key, content)) = entries.iter().next() {
            if let Some((format, _)) = file_format(key) {
                debug!(object, key = key.as_str(), "Flattening single file entry");
                return parse_file(kind, object, key, content, format);
            }
        }
    }

    let mut result = BTreeMap::new();
    let mut base_files = Vec::new();
    let mut profile_files: Vec<Option<(&String, &String, FileFormat)>> =
        vec![None; active_profiles.len()];

    for (key, value) in &entries {
        let Some((format, stem)) = file_format(key) else {
            result.insert(key.clone(), value.clone());
            continue;
        };
        if stem == APPLICATION_STEM {
            base_files.push((key, value, format));
            continue;
        }
        match stem.strip_prefix("application-") {
            Some(profile) => match active_profiles.iter().position(|p| p == profile) {
                Some(index) => profile_files[index] = Some((key, value, format)),
                None => debug!(object, key = key.as_str(), "Skipping file of inactive profile"),
            },
            None => {
                result.insert(key.clone(), value.clone());
            }
        }
    }

    for (key, content, format) in base_files.into_iter().chain(profile_files.into_iter().flatten()) {
        result.extend(parse_file(kind, object, key, content, format)?);
    }

    Ok(result)
}

fn parse_file(
    kind: SourceKind,
    object: &str,
    key: &str,
    content: &str,
    format: FileFormat,
) -> Result<BTreeMap<String, String>, MappingError> {
    match format {
        FileFormat::Yaml => parse_yaml(content).map_err(|reason| MappingError::MalformedFile {
            kind,
            object: object.to_string(),
            key: key.to_string(),
            reason,
        }),
        FileFormat::Properties => Ok(parse_properties(content)),
    }
}

fn parse_yaml(content: &str) -> Result<BTreeMap<String, String>, String> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    let mut properties = BTreeMap::new();
    flatten_yaml_value(&yaml, String::new(), &mut properties);
    Ok(properties)
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn flatten_yaml_value(
    value: &serde_yaml::Value,
    prefix: String,
    result: &mut BTreeMap<String, String>,
) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, val) in map {
                let key_str = yaml_key(key);
                let new_prefix = if prefix.is_empty() {
                    key_str
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml_value(val, new_prefix, result);
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for (idx, val) in seq.iter().enumerate() {
                flatten_yaml_value(val, format!("{prefix}[{idx}]"), result);
            }
        }
        serde_yaml::Value::String(s) => {
            result.insert(prefix, s.clone());
        }
        serde_yaml::Value::Number(n) => {
            result.insert(prefix, n.to_string());
        }
        serde_yaml::Value::Bool(b) => {
            result.insert(prefix, b.to_string());
        }
        serde_yaml::Value::Null => {
            result.insert(prefix, String::new());
        }
        serde_yaml::Value::Tagged(tagged) => {
            flatten_yaml_value(&tagged.value, prefix, result);
        }
    }
}

fn parse_properties(content: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            properties.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    properties
}
