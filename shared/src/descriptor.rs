use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::envelope::RequestEnvelope;

/// Static description of one handler: the form its page shows and the
/// fixture used to test it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FunctionDescriptor {
    pub test_event: Value,
    #[serde(default)]
    pub expected_result: Option<String>,
    #[serde(default)]
    pub form_fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FormField {
    /// Used both as the HTML element id and the handler input key.
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    TextArea,
    DropDown { drop_down_options: Vec<String> },
}

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("form field name must not be empty")]
    EmptyFieldName,
    #[error("form field `{0}` is declared more than once")]
    DuplicateField(String),
    #[error("drop down `{0}` has no options")]
    NoOptions(String),
    #[error("{first} and {second} both describe function `{name}`")]
    DuplicateFunction {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

impl FunctionDescriptor {
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let mut seen = HashSet::new();
        for field in &self.form_fields {
            if field.name.is_empty() {
                return Err(DescriptorError::EmptyFieldName);
            }
            if !seen.insert(field.name.as_str()) {
                return Err(DescriptorError::DuplicateField(field.name.clone()));
            }
            if let FieldKind::DropDown { drop_down_options } = &field.kind {
                if drop_down_options.is_empty() {
                    return Err(DescriptorError::NoOptions(field.name.clone()));
                }
            }
        }
        Ok(())
    }

    /// The fixture wrapped as the handler would receive it.
    pub fn test_request(&self) -> RequestEnvelope {
        RequestEnvelope::from_json(&self.test_event)
    }
}

/// Function name for a descriptor file: its file name up to the first `.`.
pub fn function_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.split('.').next()?;
    (!name.is_empty()).then(|| name.to_string())
}

pub fn load_descriptor(path: impl AsRef<Path>) -> anyhow::Result<FunctionDescriptor> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read descriptor {}", path.display()))?;
    let descriptor: FunctionDescriptor = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse descriptor {}", path.display()))?;
    descriptor
        .validate()
        .with_context(|| format!("invalid descriptor {}", path.display()))?;
    Ok(descriptor)
}

/// Loads every `*.json` descriptor directly inside `dir`, keyed by function
/// name.
pub fn load_descriptors(dir: impl AsRef<Path>) -> anyhow::Result<BTreeMap<String, FunctionDescriptor>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list descriptors in {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut descriptors = BTreeMap::new();
    for path in paths {
        let Some(name) = function_name(&path) else {
            continue;
        };
        if let Some(first) = sources.get(&name) {
            return Err(DescriptorError::DuplicateFunction {
                name,
                first: first.clone(),
                second: path,
            }
            .into());
        }
        descriptors.insert(name.clone(), load_descriptor(&path)?);
        sources.insert(name, path);
    }
    Ok(descriptors)
}
