// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
//
//!
//! # Policy Package to CIL Lowering
//!
//! One-shot lowering of a binary SELinux policy-module package (.pp) into
//! the Common Intermediate Language. The package decoder is an external
//! collaborator; this crate consumes the fully decoded in-memory policy
//! database and emits a stream of parenthesised CIL forms with identical
//! runtime semantics.
//!
//! The crate reproduces every construct the legacy module format carries:
//! classes, roles, types, users, sensitivities, categories, booleans,
//! access-vector rules, conditional expressions, constraints,
//! role/type/range/filename transitions, object contexts for both target
//! platforms, optional-block scoping, and attribute synthesis for anonymous
//! type and role sets.
//!
//! ## Implementation Lineage & Design Note
//!
//! Behavioral semantics were studied from the SELinux userland toolchain to
//! preserve output compatibility for policy developers. However:
//!
//! - No source code has been copied or translated.
//! - No line-by-line reimplementation has been performed.
//!
//! This implementation introduces strong typing (closed enums for every
//! policy enumeration), construction-time validation, and ownership
//! guarantees over the legacy pointer-graph representation.
//!
// ===========================================================================
// 1. CLEAR THE NOISE FIRST
#![allow(clippy::unreadable_literal)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

// 2. NOW ENFORCE THE GROUPS
#![warn(clippy::pedantic)]

// 3. HARD SECURITY GATES
#![deny(clippy::unwrap_used)]
// ===========================================================================

pub mod ebitmap;
pub mod emit;
pub mod error;
pub mod policy;

mod lower;

//
// Re-export for ergonomic API, so consumers can write:
//     use pp_cil::{PolicyDb, module_package_to_cil};
//
// Instead of:
//     use pp_cil::policy::PolicyDb;
//
pub use ebitmap::Ebitmap;
pub use emit::CilWriter;
pub use error::{LowerError, Result};
pub use lower::module_package_to_cil;
pub use policy::{PolicyDb, PolicyPackage};
