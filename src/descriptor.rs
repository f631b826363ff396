//! Loading scenario and group descriptors from YAML files.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::scenario::{Group, Scenario};

/// Errors raised while reading descriptor files.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum DescriptorError {
    /// Raised when the file cannot be opened or read.
    #[error("failed to read {path}: {message}")]
    Read {
        /// Path that could not be read.
        path: String,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when the file is not valid YAML for the expected shape.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path that could not be parsed.
        path: String,
        /// Parser error message.
        message: String,
    },
}

/// Reads a scenario descriptor.
///
/// # Errors
///
/// Returns [`DescriptorError`] when the file cannot be read or parsed.
pub fn load_scenario(path: &Utf8Path) -> Result<Scenario, DescriptorError> {
    load_yaml(path)
}

/// Reads a group descriptor.
///
/// # Errors
///
/// Returns [`DescriptorError`] when the file cannot be read or parsed.
pub fn load_group(path: &Utf8Path) -> Result<Group, DescriptorError> {
    load_yaml(path)
}

/// Parses a scenario descriptor from YAML text.
///
/// # Errors
///
/// Returns [`DescriptorError::Parse`] when the text does not describe a
/// scenario.
pub fn parse_scenario(contents: &str) -> Result<Scenario, DescriptorError> {
    parse_yaml(Utf8Path::new("<inline>"), contents)
}

/// Parses a group descriptor from YAML text.
///
/// # Errors
///
/// Returns [`DescriptorError::Parse`] when the text does not describe a group.
pub fn parse_group(contents: &str) -> Result<Group, DescriptorError> {
    parse_yaml(Utf8Path::new("<inline>"), contents)
}

fn load_yaml<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, DescriptorError> {
    let contents = read_to_string_ambient(path).map_err(|message| DescriptorError::Read {
        path: path.to_string(),
        message,
    })?;
    parse_yaml(path, &contents)
}

fn parse_yaml<T: DeserializeOwned>(path: &Utf8Path, contents: &str) -> Result<T, DescriptorError> {
    serde_yaml::from_str(contents).map_err(|err| DescriptorError::Parse {
        path: path.to_string(),
        message: err.to_string(),
    })
}

fn read_to_string_ambient(path: &Utf8Path) -> Result<String, String> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("path has no file name: {path}"))?;

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_name).map_err(|err| err.to_string())
}
