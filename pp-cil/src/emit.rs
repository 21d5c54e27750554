// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! # CIL Emitter
//!
//! Indent-aware textual writer producing the CIL stream. The writer never
//! introspects what it emits; callers are responsible for balancing forms.
//!
//! The writer also owns the synthesised-attribute counter. Attribute names
//! for anonymous type/role sets must be unique for the lifetime of one
//! output stream, and tying the counter to the writer keeps concurrent
//! translations in one process from colliding.

use std::fmt;
use std::io::Write;

use crate::error::Result;

/// Indentation is four spaces per level.
const INDENT: &[u8] = b"    ";

pub struct CilWriter<W: Write> {
    out: W,
    attr_count: u32,
}

impl<W: Write> CilWriter<W> {
    pub const fn new(out: W) -> Self {
        Self { out, attr_count: 0 }
    }

    /// Writes `level` levels of indentation.
    pub fn indent(&mut self, level: u32) -> Result<()> {
        for _ in 0..level {
            self.out.write_all(INDENT)?;
        }
        Ok(())
    }

    /// Writes preformatted arguments, no indentation, no newline.
    pub fn write(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.out.write_fmt(args)?;
        Ok(())
    }

    /// Writes one newline-terminated line at the given indent.
    pub fn writeln(&mut self, level: u32, args: fmt::Arguments<'_>) -> Result<()> {
        self.indent(level)?;
        self.out.write_fmt(args)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    /// Next synthesised-attribute ordinal. The first call yields 1.
    pub(crate) fn next_attr(&mut self) -> u32 {
        self.attr_count += 1;
        self.attr_count
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Formats into the writer without a newline: `cil_write!(w, "({name}")`.
#[macro_export]
macro_rules! cil_write {
    ($w:expr, $($arg:tt)*) => {
        $w.write(format_args!($($arg)*))
    };
}

/// Formats one indented, newline-terminated line:
/// `cil_writeln!(w, indent, "(role {key})")`.
#[macro_export]
macro_rules! cil_writeln {
    ($w:expr, $level:expr, $($arg:tt)*) => {
        $w.writeln($level, format_args!($($arg)*))
    };
}
