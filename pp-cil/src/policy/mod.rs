// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! # Policy Database Model
//!
//! Read-only, strongly-typed model of a decoded policy-module package. The
//! package decoder (an external collaborator built on the sepol library)
//! produces these values; the lowering engine walks them and emits CIL. No
//! part of the lowering mutates the database.
//!
//! Layout follows the module policy database: a handful of envelope fields,
//! eight symbol tables indexed by a fixed symbol-kind enumeration,
//! object-context tables, a genfs list, and a chain of avrule blocks
//! beginning at the global block.

pub mod rules;
pub mod symbols;
pub mod ocontext;

pub use rules::*;
pub use symbols::*;
pub use ocontext::*;

use std::collections::BTreeMap;

use crate::ebitmap::Ebitmap;

//
// =============================================================================
// Envelope
// =============================================================================
//

/// A decoded policy package: the policy database plus the bundled text
/// sections. Sections may be empty.
#[derive(Debug, Clone, Default)]
pub struct PolicyPackage {
    pub policy: PolicyDb,
    pub file_contexts: String,
    pub seusers: String,
    pub user_extra: String,
    pub netfilter_contexts: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyType {
    Base,
    Module,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPlatform {
    Selinux,
    Xen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleUnknown {
    Deny,
    Reject,
    Allow,
}

impl HandleUnknown {
    #[must_use]
    pub const fn as_cil(self) -> &'static str {
        match self {
            Self::Deny => "deny",
            Self::Reject => "reject",
            Self::Allow => "allow",
        }
    }
}

//
// =============================================================================
// Symbol kinds and scoping
// =============================================================================
//

pub const SYM_NUM: usize = 8;

/// Fixed symbol-kind enumeration; the discriminants index per-kind arrays
/// such as [`ScopeIndex::scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum SymbolKind {
    Commons = 0,
    Classes = 1,
    Roles = 2,
    Types = 3,
    Users = 4,
    Booleans = 5,
    Sensitivities = 6,
    Categories = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The symbol is defined by the declaration.
    Decl,
    /// The symbol is only referenced (required) by the declaration.
    Req,
}

/// Per-name scope record: how the symbol is scoped and which declarations
/// mention it.
#[derive(Debug, Clone)]
pub struct ScopeDatum {
    pub scope: ScopeKind,
    pub decl_ids: Vec<u32>,
}

/// One symbol table: value→name, name→datum, name→scope. Symbol values use
/// the 1-based convention; value `v` names `val_to_name[v - 1]`.
#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    pub val_to_name: Vec<String>,
    pub table: BTreeMap<String, T>,
    pub scope: BTreeMap<String, ScopeDatum>,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self {
            val_to_name: Vec::new(),
            table: BTreeMap::new(),
            scope: BTreeMap::new(),
        }
    }
}

//
// =============================================================================
// The policy database
// =============================================================================
//

#[derive(Debug, Clone)]
pub struct PolicyDb {
    /// Module name; empty for base policies until the driver fixes it up.
    pub name: String,
    pub policy_type: PolicyType,
    pub mls: bool,
    pub handle_unknown: HandleUnknown,
    pub policycaps: Ebitmap,

    /// Commons are declared once, from the global scope only.
    pub commons: BTreeMap<String, CommonDatum>,
    pub classes: SymbolTable<ClassDatum>,
    pub roles: SymbolTable<RoleDatum>,
    pub types: SymbolTable<TypeDatum>,
    pub users: SymbolTable<UserDatum>,
    pub booleans: SymbolTable<BoolDatum>,
    pub sensitivities: SymbolTable<LevelDatum>,
    pub categories: SymbolTable<CatDatum>,

    /// Object contexts, keyed by target platform.
    pub ocontexts: Ocontexts,
    pub genfs: Vec<Genfs>,

    /// The avrule block chain; the global block comes first.
    pub global: Vec<AvruleBlock>,
}

impl PolicyDb {
    #[must_use]
    pub const fn target_platform(&self) -> TargetPlatform {
        match self.ocontexts {
            Ocontexts::Selinux(_) => TargetPlatform::Selinux,
            Ocontexts::Xen(_) => TargetPlatform::Xen,
        }
    }
}

impl Default for PolicyDb {
    fn default() -> Self {
        Self {
            name: String::new(),
            policy_type: PolicyType::Base,
            mls: false,
            handle_unknown: HandleUnknown::Deny,
            policycaps: Ebitmap::new(),
            commons: BTreeMap::new(),
            classes: SymbolTable::default(),
            roles: SymbolTable::default(),
            types: SymbolTable::default(),
            users: SymbolTable::default(),
            booleans: SymbolTable::default(),
            sensitivities: SymbolTable::default(),
            categories: SymbolTable::default(),
            ocontexts: Ocontexts::Selinux(SelinuxOcontexts::default()),
            genfs: Vec::new(),
            global: Vec::new(),
        }
    }
}
