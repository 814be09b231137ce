use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainNameError {
    #[error("failed to read domain config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no single-quoted value on the first line: {0:?}")]
    Unquoted(String),
    #[error("quoted domain name on the first line is empty")]
    Empty,
}

/// Extracts the domain name from a line such as
/// `export const domainName = 'example.com';`.
///
/// The value is the text between the last two single quotes of the first
/// line.
pub fn parse_domain_name(content: &str) -> Result<String, DomainNameError> {
    let line = content.split('\n').next().unwrap_or_default();
    let parts: Vec<&str> = line.split('\'').collect();
    if parts.len() < 3 {
        return Err(DomainNameError::Unquoted(line.to_string()));
    }

    let name = parts[parts.len() - 2];
    if name.is_empty() {
        return Err(DomainNameError::Empty);
    }
    Ok(name.to_string())
}

pub fn read_domain_name(path: impl AsRef<Path>) -> Result<String, DomainNameError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| DomainNameError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_domain_name(&content)
}
