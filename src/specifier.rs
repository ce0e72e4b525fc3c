//! Package specifier parsing.
//!
//! Accepted forms: `name`, `name@version`, `@scope/name`,
//! `@scope/name@version` (split at the last `@`), and local artifact paths.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
    Registry {
        name: String,
        version: Option<String>,
    },
    Local(PathBuf),
}

#[derive(Debug, Clone, Error)]
pub enum SpecifierError {
    #[error("empty package specifier")]
    Empty,
    #[error("invalid package specifier '{input}': {reason}")]
    Invalid { input: String, reason: String },
}

impl Specifier {
    pub fn parse(input: &str) -> Result<Self, SpecifierError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SpecifierError::Empty);
        }

        if is_local_path(input) {
            return Ok(Specifier::Local(PathBuf::from(input)));
        }

        let (name, version) = split_name_version(input);
        if name.is_empty() {
            return Err(SpecifierError::Invalid {
                input: input.to_string(),
                reason: "missing package name".to_string(),
            });
        }
        if let Some(version) = version {
            if version.is_empty() {
                return Err(SpecifierError::Invalid {
                    input: input.to_string(),
                    reason: "empty version after '@'".to_string(),
                });
            }
        }
        if name.starts_with('@') && !name[1..].contains('/') {
            return Err(SpecifierError::Invalid {
                input: input.to_string(),
                reason: "scoped name must be '@scope/name'".to_string(),
            });
        }

        Ok(Specifier::Registry {
            name: name.to_string(),
            version: version.map(ToOwned::to_owned),
        })
    }
}

fn is_local_path(input: &str) -> bool {
    input.starts_with("./")
        || input.starts_with("../")
        || input.starts_with('/')
        || input.ends_with(".tgz")
        || input.ends_with(".tar.gz")
}

/// Splits at the last `@` so scoped names keep their leading `@`.
fn split_name_version(input: &str) -> (&str, Option<&str>) {
    match input.rfind('@') {
        Some(0) | None => (input, None),
        Some(idx) => (&input[..idx], Some(&input[idx + 1..])),
    }
}

#[cfg(test)]
#[path = "specifier_tests.rs"]
mod tests;
