// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Error taxonomy for the lowering engine.
//!
//! Two failure families exist: fatal translation errors (broken database
//! invariants, malformed text-section lines, sink write failures) surface
//! here and abort the translation; recognised-but-inexpressible constructs
//! are *not* errors, they are logged and dropped at the emission site.

use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, LowerError>;

//
// =============================================================================
// Error Taxonomy
// =============================================================================
//

#[derive(Debug)]
pub enum LowerError {
    /// Write to the output sink failed. The stream is unrecoverable.
    Io(io::Error),
    /// A bitmap referenced a symbol value with no val_to_name entry.
    UnknownSymbolValue { kind: &'static str, value: u32 },
    /// A symbol or scope table lookup by name came back empty.
    MissingSymbol { kind: &'static str, name: String },
    /// A policy capability bit outside the known capability table.
    UnknownPolicyCapability(u32),
    /// An initial SID index outside the platform SID name table.
    UnknownInitialSid(u32),
    /// A permission bit with no name in the class or its common.
    UnknownPermissionBit { class: String, bit: u32 },
    /// Conditional expression stack underflow or leftover operands.
    InvalidConditional,
    /// Constraint expression stack underflow, leftover operands, or an
    /// attribute selector outside the fixed table.
    InvalidConstraint,
    /// A malformed line in one of the bundled text sections.
    InvalidTextLine { section: &'static str, line: String },
    /// A malformed MLS level literal in a text section.
    InvalidLevel(String),
    /// A malformed security context literal in a text section.
    InvalidContext(String),
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => {
                write!(f, "failed to write to output: {err}")
            }

            Self::UnknownSymbolValue { kind, value } => {
                write!(f, "unknown {kind} value: {value}")
            }

            Self::MissingSymbol { kind, name } => {
                write!(f, "{kind} '{name}' missing from symbol table")
            }

            Self::UnknownPolicyCapability(id) => {
                write!(f, "unknown policy capability id: {id}")
            }

            Self::UnknownInitialSid(sid) => {
                write!(f, "unknown initial sid: {sid}")
            }

            Self::UnknownPermissionBit { class, bit } => {
                write!(f, "failed to generate permission string for class '{class}' bit {bit}")
            }

            Self::InvalidConditional => {
                write!(f, "invalid conditional expression")
            }

            Self::InvalidConstraint => {
                write!(f, "invalid constraint expression")
            }

            Self::InvalidTextLine { section, line } => {
                write!(f, "invalid {section} line: {line}")
            }

            Self::InvalidLevel(level) => {
                write!(f, "invalid level: {level}")
            }

            Self::InvalidContext(context) => {
                write!(f, "invalid context: {context}")
            }
        }
    }
}

impl std::error::Error for LowerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LowerError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
