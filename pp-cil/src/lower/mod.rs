// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! # Policy-to-CIL Lowering
//!
//! The lowering engine walks a decoded [`PolicyPackage`](crate::policy::PolicyPackage)
//! and emits the equivalent CIL stream. Output order is semantic (orderings,
//! optional nesting), so the walk is strictly sequential.
//!
//! All state lives in [`Lowering`]: the borrowed database, the writer (which
//! owns the synthesised-attribute counter), and the fixed module name used
//! for generated identifiers.

mod blocks;
mod driver;
mod expr;
mod names;
mod ocontext;
mod rules;
mod symbols;
mod textsec;

pub use driver::module_package_to_cil;

use std::io::Write;

use crate::emit::CilWriter;
use crate::policy::PolicyDb;

pub(crate) const DEFAULT_LEVEL: &str = "systemlow";
pub(crate) const DEFAULT_OBJECT: &str = "object_r";

/// One in-flight translation: borrowed database, output writer, and the
/// fixed-up module name for generated optional/attribute identifiers.
pub(crate) struct Lowering<'p, W: Write> {
    pub(crate) pdb: &'p PolicyDb,
    pub(crate) w: CilWriter<W>,
    pub(crate) name: String,
}
