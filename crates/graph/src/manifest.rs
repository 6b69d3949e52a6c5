use crate::error::{json_kind, GraphError, Result};
use crate::types::AssetId;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Top-level layout of a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestShape {
    /// `{ "<asset id>": { ... }, ... }`
    Object,
    /// `[ { ... }, ... ]`, ids are positions
    Array,
}

/// Asset manifest: asset records in document order
#[derive(Debug, Clone)]
pub struct Manifest {
    shape: ManifestShape,
    entries: Vec<(AssetId, Map<String, Value>)>,
}

impl Manifest {
    /// Read and validate a manifest file
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| GraphError::io(path, e))?;
        let value: Value = serde_json::from_slice(&data).map_err(|e| GraphError::parse(path, e))?;
        let manifest = Self::from_value(value)?;
        log::debug!(
            "Loaded manifest {} ({} assets)",
            path.display(),
            manifest.len()
        );
        Ok(manifest)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let entries = map
                    .into_iter()
                    .map(|(key, record)| {
                        let id = AssetId::Key(key);
                        into_record(&id, record).map(|record| (id, record))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self {
                    shape: ManifestShape::Object,
                    entries,
                })
            }
            Value::Array(items) => {
                let entries = items
                    .into_iter()
                    .enumerate()
                    .map(|(pos, record)| {
                        let id = AssetId::Index(pos);
                        into_record(&id, record).map(|record| (id, record))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self {
                    shape: ManifestShape::Array,
                    entries,
                })
            }
            other => Err(GraphError::UnsupportedShape {
                found: json_kind(&other),
            }),
        }
    }

    pub fn shape(&self) -> ManifestShape {
        self.shape
    }

    /// Asset records in manifest order
    pub fn entries(&self) -> impl Iterator<Item = (&AssetId, &Map<String, Value>)> {
        self.entries.iter().map(|(id, record)| (id, record))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Give every record a value for `field` when it is missing or falsy.
    ///
    /// Returns the number of records that were patched.
    pub fn ensure_field(&mut self, field: &str, default: &Value) -> usize {
        let mut patched = 0;
        for (id, record) in &mut self.entries {
            if record.get(field).map_or(true, is_falsy) {
                log::trace!("Asset {id}: defaulting {field}");
                record.insert(field.to_string(), default.clone());
                patched += 1;
            }
        }
        patched
    }

    pub fn to_value(&self) -> Value {
        match self.shape {
            ManifestShape::Object => Value::Object(
                self.entries
                    .iter()
                    .map(|(id, record)| (id.to_string(), Value::Object(record.clone())))
                    .collect(),
            ),
            ManifestShape::Array => Value::Array(
                self.entries
                    .iter()
                    .map(|(_, record)| Value::Object(record.clone()))
                    .collect(),
            ),
        }
    }

    /// Write the manifest as pretty JSON, keeping its top-level shape
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| GraphError::io(parent, e))?;
        }
        let data = serde_json::to_vec_pretty(&self.to_value())?;
        fs::write(path, data).map_err(|e| GraphError::io(path, e))
    }
}

fn into_record(id: &AssetId, value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(record) => Ok(record),
        other => Err(GraphError::InvalidRecord {
            id: id.to_string(),
            found: json_kind(&other),
        }),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
