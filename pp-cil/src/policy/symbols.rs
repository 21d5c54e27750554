// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Per-kind symbol data and the MLS value types they embed.
//!
//! Symbol data is polymorphic across the eight kinds; each kind gets its own
//! datum struct rather than a tagged union. All symbol references held in
//! datums (bounds, alias targets, context fields) use 1-based values.

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::ebitmap::Ebitmap;

//
// =============================================================================
// Set expressions
// =============================================================================
//

bitflags! {
    /// Flags carried by type and role set expressions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SetFlags: u32 {
        /// The set matches everything.
        const STAR = 0x01;
        /// The set is complemented.
        const COMP = 0x02;
    }
}

/// Positive/negative type set with flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet {
    pub types: Ebitmap,
    pub negset: Ebitmap,
    pub flags: SetFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet {
    pub roles: Ebitmap,
    pub flags: SetFlags,
}

//
// =============================================================================
// MLS values
// =============================================================================
//

/// An evaluated MLS level: a sensitivity plus a category bitmap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MlsLevel {
    pub sens: u32,
    pub cats: Ebitmap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MlsRange {
    pub low: MlsLevel,
    pub high: MlsLevel,
}

/// Inclusive category value run inside a semantic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatRange {
    pub low: u32,
    pub high: u32,
}

/// An unevaluated (semantic) MLS level, as stored in users and range
/// transitions: a sensitivity plus a list of category runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MlsSemanticLevel {
    pub sens: u32,
    pub cats: Vec<CatRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MlsSemanticRange {
    pub low: MlsSemanticLevel,
    pub high: MlsSemanticLevel,
}

/// A full security context: user, role, type, MLS range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub user: u32,
    pub role: u32,
    pub ty: u32,
    pub range: MlsRange,
}

//
// =============================================================================
// Class and common data
// =============================================================================
//

/// A common permission block; permission names map to 1-based bit values.
#[derive(Debug, Clone, Default)]
pub struct CommonDatum {
    pub value: u32,
    pub permissions: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    Source,
    Target,
}

impl DefaultKind {
    #[must_use]
    pub const fn as_cil(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRange {
    SourceLow,
    SourceHigh,
    SourceLowHigh,
    TargetLow,
    TargetHigh,
    TargetLowHigh,
}

impl DefaultRange {
    #[must_use]
    pub const fn as_cil(self) -> &'static str {
        match self {
            Self::SourceLow => "source low",
            Self::SourceHigh => "source high",
            Self::SourceLowHigh => "source low-high",
            Self::TargetLow => "target low",
            Self::TargetHigh => "target high",
            Self::TargetLowHigh => "target low-high",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassDatum {
    pub value: u32,
    pub permissions: BTreeMap<String, u32>,
    /// Name of the inherited common block, if any.
    pub comkey: Option<String>,
    pub default_user: Option<DefaultKind>,
    pub default_role: Option<DefaultKind>,
    pub default_type: Option<DefaultKind>,
    pub default_range: Option<DefaultRange>,
    pub constraints: Vec<super::Constraint>,
    pub validatetrans: Vec<super::Constraint>,
}

//
// =============================================================================
// Role / type / user / boolean / sensitivity / category data
// =============================================================================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFlavor {
    Role,
    Attribute,
}

#[derive(Debug, Clone)]
pub struct RoleDatum {
    pub value: u32,
    pub flavor: RoleFlavor,
    pub types: TypeSet,
    /// Role dominance; anything beyond self-dominance has no CIL rendering.
    pub dominates: Ebitmap,
    /// Bounding role value, 0 when unbounded.
    pub bounds: u32,
    /// Member roles, populated for attribute roles.
    pub roles: Ebitmap,
}

impl RoleDatum {
    #[must_use]
    pub fn new(value: u32, flavor: RoleFlavor) -> Self {
        Self {
            value,
            flavor,
            types: TypeSet::default(),
            dominates: Ebitmap::new(),
            bounds: 0,
            roles: Ebitmap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFlavor {
    Type,
    Attribute,
}

#[derive(Debug, Clone)]
pub struct TypeDatum {
    pub value: u32,
    pub flavor: TypeFlavor,
    /// False for aliases; the value then names the real type.
    pub primary: bool,
    pub permissive: bool,
    /// Bounding type value, 0 when unbounded.
    pub bounds: u32,
    /// Member types, populated for attributes.
    pub types: Ebitmap,
}

impl TypeDatum {
    #[must_use]
    pub fn new(value: u32, flavor: TypeFlavor) -> Self {
        Self {
            value,
            flavor,
            primary: true,
            permissive: false,
            bounds: 0,
            types: Ebitmap::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserDatum {
    pub value: u32,
    pub roles: Ebitmap,
    pub default_level: MlsSemanticLevel,
    pub range: MlsSemanticRange,
}

#[derive(Debug, Clone, Default)]
pub struct BoolDatum {
    pub value: u32,
    pub state: bool,
    pub tunable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LevelDatum {
    pub level: MlsLevel,
    pub alias: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CatDatum {
    pub value: u32,
    pub alias: bool,
}
