// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
//
//!
//! # Module Info Value Object
//!
//! Describes one installable policy module inside a module store: priority,
//! name, version, source-language extension, and enabled state. Every field
//! is validated at assignment, and the store-path composition rules over an
//! abstract store root live here so that the store and its tools agree on
//! one layout.
//!
//! Store layout, for a root `R`:
//!
//! | path kind   | location                      |
//! |-------------|-------------------------------|
//! | priority    | `R/NNN` (zero-padded)         |
//! | name        | `R/NNN/name`                  |
//! | hll         | `R/NNN/name/name.ext`         |
//! | cil         | `R/NNN/name/cil`              |
//! | lang_ext    | `R/NNN/name/lang_ext`         |
//! | version     | `R/NNN/name/version`          |
//! | disabled    | `R/disabled/name`             |
//!

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

//
// =============================================================================
// Validation bounds and patterns
// =============================================================================
//

pub const PRIORITY_MIN: u16 = 1;
pub const PRIORITY_MAX: u16 = 999;

/// Module names start with a letter; dots must be followed by a regular
/// name character. The reserved name `_base` is accepted as-is.
fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z](\.?[A-Za-z0-9_-])*$").expect("name pattern is valid")
    })
}

fn lang_ext_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("lang_ext pattern is valid")
    })
}

//
// =============================================================================
// Error Taxonomy
// =============================================================================
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    InvalidPriority(u16),
    InvalidName(String),
    InvalidVersion(String),
    InvalidLangExt(String),
    InvalidEnabled(i8),
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPriority(priority) => {
                write!(f, "priority {priority} is invalid")
            }

            Self::InvalidName(name) => {
                write!(f, "name {name} is invalid")
            }

            Self::InvalidVersion(version) => {
                write!(f, "version {version} is invalid")
            }

            Self::InvalidLangExt(lang_ext) => {
                write!(f, "language extension {lang_ext} is invalid")
            }

            Self::InvalidEnabled(enabled) => {
                write!(f, "enabled status {enabled} is invalid")
            }
        }
    }
}

impl std::error::Error for ModuleError {}

//
// =============================================================================
// Validators
// =============================================================================
//

pub fn validate_priority(priority: u16) -> Result<(), ModuleError> {
    if (PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
        Ok(())
    } else {
        Err(ModuleError::InvalidPriority(priority))
    }
}

pub fn validate_name(name: &str) -> Result<(), ModuleError> {
    if name == "_base" || name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(ModuleError::InvalidName(name.to_owned()))
    }
}

/// Versions are free-form but must be non-empty printable ASCII.
pub fn validate_version(version: &str) -> Result<(), ModuleError> {
    if !version.is_empty() && version.chars().all(|c| (' '..='~').contains(&c)) {
        Ok(())
    } else {
        Err(ModuleError::InvalidVersion(version.to_owned()))
    }
}

pub fn validate_lang_ext(lang_ext: &str) -> Result<(), ModuleError> {
    if lang_ext_pattern().is_match(lang_ext) {
        Ok(())
    } else {
        Err(ModuleError::InvalidLangExt(lang_ext.to_owned()))
    }
}

pub fn validate_enabled(enabled: i8) -> Result<(), ModuleError> {
    if matches!(enabled, -1 | 0 | 1) {
        Ok(())
    } else {
        Err(ModuleError::InvalidEnabled(enabled))
    }
}

//
// =============================================================================
// ModuleInfo
// =============================================================================
//

/// One installable module. Fields are private; setters validate, log the
/// offending value, and leave the object unchanged on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    priority: u16,
    name: String,
    version: String,
    lang_ext: String,
    enabled: i8,
}

impl ModuleInfo {
    /// A blank record: priority 0 (not yet placed), empty fields, enabled
    /// state undetermined (-1).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            priority: 0,
            name: String::new(),
            version: String::new(),
            lang_ext: String::new(),
            enabled: -1,
        }
    }

    #[must_use]
    pub const fn priority(&self) -> u16 {
        self.priority
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn lang_ext(&self) -> &str {
        &self.lang_ext
    }

    #[must_use]
    pub const fn enabled(&self) -> i8 {
        self.enabled
    }

    pub fn set_priority(&mut self, priority: u16) -> Result<(), ModuleError> {
        validate_priority(priority).map_err(log_invalid)?;
        self.priority = priority;
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), ModuleError> {
        validate_name(name).map_err(log_invalid)?;
        self.name = name.to_owned();
        Ok(())
    }

    pub fn set_version(&mut self, version: &str) -> Result<(), ModuleError> {
        validate_version(version).map_err(log_invalid)?;
        self.version = version.to_owned();
        Ok(())
    }

    pub fn set_lang_ext(&mut self, lang_ext: &str) -> Result<(), ModuleError> {
        validate_lang_ext(lang_ext).map_err(log_invalid)?;
        self.lang_ext = lang_ext.to_owned();
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: i8) -> Result<(), ModuleError> {
        validate_enabled(enabled).map_err(log_invalid)?;
        self.enabled = enabled;
        Ok(())
    }

    /// Composes the store path of the given kind under `root`, validating
    /// the fields the path consumes.
    pub fn store_path(&self, root: &Path, kind: StorePath) -> Result<PathBuf, ModuleError> {
        match kind {
            StorePath::Priority => {
                validate_priority(self.priority).map_err(log_invalid)?;
                Ok(root.join(format!("{:03}", self.priority)))
            }

            StorePath::Name => {
                validate_priority(self.priority).map_err(log_invalid)?;
                validate_name(&self.name).map_err(log_invalid)?;
                Ok(root.join(format!("{:03}", self.priority)).join(&self.name))
            }

            StorePath::Hll => {
                validate_lang_ext(&self.lang_ext).map_err(log_invalid)?;
                validate_priority(self.priority).map_err(log_invalid)?;
                validate_name(&self.name).map_err(log_invalid)?;
                Ok(root
                    .join(format!("{:03}", self.priority))
                    .join(&self.name)
                    .join(format!("{}.{}", self.name, self.lang_ext)))
            }

            StorePath::Cil | StorePath::LangExt | StorePath::Version => {
                let file = match kind {
                    StorePath::Cil => "cil",
                    StorePath::LangExt => "lang_ext",
                    _ => "version",
                };
                validate_priority(self.priority).map_err(log_invalid)?;
                validate_name(&self.name).map_err(log_invalid)?;
                Ok(root
                    .join(format!("{:03}", self.priority))
                    .join(&self.name)
                    .join(file))
            }

            StorePath::Disabled => {
                validate_name(&self.name).map_err(log_invalid)?;
                Ok(root.join("disabled").join(&self.name))
            }
        }
    }
}

impl Default for ModuleInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Store path kinds composable from a module record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePath {
    Priority,
    Name,
    Hll,
    Cil,
    LangExt,
    Version,
    Disabled,
}

fn log_invalid(err: ModuleError) -> ModuleError {
    log::error!("{err}");
    err
}

//
// =============================================================================
// ModuleKey
// =============================================================================
//

/// Lookup key for a module in the store: name plus priority. Priority 0
/// means "not yet placed" and is accepted by the key (lookups across
/// priorities), but setters still reject out-of-range values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleKey {
    name: String,
    priority: u16,
}

impl ModuleKey {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name: String::new(),
            priority: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn priority(&self) -> u16 {
        self.priority
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), ModuleError> {
        validate_name(name).map_err(log_invalid)?;
        self.name = name.to_owned();
        Ok(())
    }

    pub fn set_priority(&mut self, priority: u16) -> Result<(), ModuleError> {
        validate_priority(priority).map_err(log_invalid)?;
        self.priority = priority;
        Ok(())
    }
}

impl Default for ModuleKey {
    fn default() -> Self {
        Self::new()
    }
}
