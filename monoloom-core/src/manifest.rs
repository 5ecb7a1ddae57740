//! Manifest synthesis: template/override merge and placeholder substitution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// File name of a package manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Token replaced by the package's short name anywhere in the serialized
/// template, including nested string fields.
pub const NAME_PLACEHOLDER: &str = "$NAME";

/// A package manifest. Recognized fields are typed; everything else rides
/// along in `extra` and survives a round-trip untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dependencies: IndexMap<String, String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestDocument {
    /// Sets or overwrites a dependency specifier. The caller guarantees
    /// `name` is not the package's own full name.
    pub fn set_dependency(&mut self, name: &str, specifier: &str) {
        self.dependencies
            .insert(name.to_string(), specifier.to_string());
    }

    /// Serializes to pretty-printed JSON with a trailing newline.
    pub fn render(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)
            .map_err(|e| Error::json(e, format!("manifest for {}", self.name)))?;
        text.push('\n');
        Ok(text)
    }
}

/// Copies every field from `source` into `target` that `target` does not
/// already have. Shallow: a present field is left alone wholesale, nested
/// objects are never merged field-by-field.
fn merge_absent(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        if !target.contains_key(key) {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Builds a package's scaffold manifest.
///
/// Starts from `{"name": full_name}`, merges the package's override fields
/// write-if-absent, then the shared template write-if-absent, so overrides
/// win over the template on conflict. The merged document is serialized and
/// every literal `$NAME` occurrence is replaced with the short name before
/// parsing the result back into a typed manifest.
pub fn synthesize(
    short_name: &str,
    full_name: &str,
    overrides: &Map<String, Value>,
    template: &Map<String, Value>,
) -> Result<ManifestDocument> {
    let mut fields = Map::new();
    fields.insert("name".to_string(), Value::String(full_name.to_string()));

    merge_absent(&mut fields, overrides);
    merge_absent(&mut fields, template);

    let text = serde_json::to_string_pretty(&Value::Object(fields))
        .map_err(|e| Error::json(e, format!("manifest for {}", full_name)))?;
    let text = text.replace(NAME_PLACEHOLDER, short_name);

    serde_json::from_str(&text).map_err(|e| Error::json(e, format!("manifest for {}", full_name)))
}

/// Parses a template file's content into a JSON object.
pub fn parse_template(content: &str, context: &str) -> Result<Map<String, Value>> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| Error::json(e, context.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::InvalidConfig(format!(
            "template {} is not a JSON object",
            context
        ))),
    }
}
