// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Rules, expressions, and the avrule block chain.
//!
//! Conditional and constraint expressions arrive in RPN order exactly as the
//! decoder produced them; the lowering converts them to prefix forms with an
//! explicit operand stack, so the node sequences here are plain vectors.

use bitflags::bitflags;

use crate::ebitmap::Ebitmap;

use super::symbols::{MlsSemanticRange, RoleSet, TypeSet};
use super::{SYM_NUM, SymbolKind};

//
// =============================================================================
// Access-vector and type rules
// =============================================================================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvruleKind {
    Allow,
    AuditAllow,
    AuditDeny,
    DontAudit,
    NeverAllow,
    Transition,
    Member,
    Change,
}

impl AvruleKind {
    /// True for the access-vector flavors, whose class-perm data is a
    /// permission bitmask; the type-rule flavors carry a destination type
    /// value instead.
    #[must_use]
    pub const fn is_access_vector(self) -> bool {
        matches!(
            self,
            Self::Allow | Self::AuditAllow | Self::AuditDeny | Self::DontAudit | Self::NeverAllow
        )
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AvruleFlags: u32 {
        /// The rule also targets each source type itself.
        const SELF = 0x01;
    }
}

/// One class entry of an avrule. `data` is a permission bitmask for
/// access-vector rules and a 1-based destination type value for type rules.
#[derive(Debug, Clone, Copy)]
pub struct ClassPermNode {
    pub class: u32,
    pub data: u32,
}

#[derive(Debug, Clone)]
pub struct Avrule {
    pub kind: AvruleKind,
    pub flags: AvruleFlags,
    pub stypes: TypeSet,
    pub ttypes: TypeSet,
    pub perms: Vec<ClassPermNode>,
}

//
// =============================================================================
// Conditional expressions
// =============================================================================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondOp {
    Not,
    Or,
    And,
    Xor,
    Eq,
    Neq,
}

/// RPN node: a boolean leaf (1-based value) or an operator.
#[derive(Debug, Clone, Copy)]
pub enum CondExprNode {
    Bool(u32),
    Op(CondOp),
}

#[derive(Debug, Clone, Default)]
pub struct CondNode {
    pub tunable: bool,
    pub expr: Vec<CondExprNode>,
    pub true_rules: Vec<Avrule>,
    pub false_rules: Vec<Avrule>,
}

//
// =============================================================================
// Constraint expressions
// =============================================================================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq,
    Neq,
    Dom,
    DomBy,
    Incomp,
}

impl ConstraintOp {
    #[must_use]
    pub const fn as_cil(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Dom => "dom",
            Self::DomBy => "domby",
            Self::Incomp => "incomp",
        }
    }
}

bitflags! {
    /// Constraint attribute selector bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CexprAttr: u32 {
        const USER = 0x0001;
        const ROLE = 0x0002;
        const TYPE = 0x0004;
        const TARGET = 0x0008;
        const XTARGET = 0x0010;
        const L1L2 = 0x0020;
        const L1H2 = 0x0040;
        const H1L2 = 0x0080;
        const H1H2 = 0x0100;
        const L1H1 = 0x0200;
        const L2H2 = 0x0400;
    }
}

/// Operand of a NAMES leaf; the payload matches the selector's symbol kind.
#[derive(Debug, Clone)]
pub enum ConstraintNames {
    Types(TypeSet),
    Users(Ebitmap),
    Roles(Ebitmap),
}

/// RPN node of a constraint expression.
#[derive(Debug, Clone)]
pub enum ConstraintExprNode {
    Attr { op: ConstraintOp, attr: CexprAttr },
    Names {
        op: ConstraintOp,
        attr: CexprAttr,
        names: ConstraintNames,
    },
    Not,
    And,
    Or,
}

/// A constraint or validatetrans body attached to a class. For constraints
/// `permissions` is the governed permission bitmask; validatetrans carries
/// no permissions.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub permissions: u32,
    pub expr: Vec<ConstraintExprNode>,
}

//
// =============================================================================
// Transition rules
// =============================================================================
//

#[derive(Debug, Clone)]
pub struct RoleTransRule {
    pub roles: RoleSet,
    pub types: TypeSet,
    pub classes: Ebitmap,
    pub new_role: u32,
}

#[derive(Debug, Clone)]
pub struct RoleAllowRule {
    pub roles: RoleSet,
    pub new_roles: RoleSet,
}

#[derive(Debug, Clone)]
pub struct RangeTransRule {
    pub stypes: TypeSet,
    pub ttypes: TypeSet,
    pub tclasses: Ebitmap,
    pub range: MlsSemanticRange,
}

#[derive(Debug, Clone)]
pub struct FilenameTransRule {
    pub stypes: TypeSet,
    pub ttypes: TypeSet,
    pub tclass: u32,
    pub name: String,
    pub otype: u32,
}

//
// =============================================================================
// Blocks and declarations
// =============================================================================
//

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BlockFlags: u32 {
        const OPTIONAL = 0x01;
    }
}

/// Per-declaration scope index: one bitmap per symbol kind plus the
/// per-class permission maps.
#[derive(Debug, Clone, Default)]
pub struct ScopeIndex {
    pub scope: [Ebitmap; SYM_NUM],
    pub class_perms_map: Vec<Ebitmap>,
}

impl ScopeIndex {
    #[must_use]
    pub fn kind(&self, kind: SymbolKind) -> &Ebitmap {
        &self.scope[kind as usize]
    }

    pub fn kind_mut(&mut self, kind: SymbolKind) -> &mut Ebitmap {
        &mut self.scope[kind as usize]
    }
}

/// Local symbol tables of a declaration, holding symbols added to an
/// enclosing (additive) scope rather than declared or required outright.
#[derive(Debug, Clone, Default)]
pub struct DeclSymtab {
    pub classes: std::collections::BTreeMap<String, super::ClassDatum>,
    pub roles: std::collections::BTreeMap<String, super::RoleDatum>,
    pub types: std::collections::BTreeMap<String, super::TypeDatum>,
    pub users: std::collections::BTreeMap<String, super::UserDatum>,
    pub booleans: std::collections::BTreeMap<String, super::BoolDatum>,
    pub sensitivities: std::collections::BTreeMap<String, super::LevelDatum>,
    pub categories: std::collections::BTreeMap<String, super::CatDatum>,
}

#[derive(Debug, Clone)]
pub struct AvruleDecl {
    pub decl_id: u32,
    pub declared: ScopeIndex,
    pub required: ScopeIndex,
    pub symtab: DeclSymtab,
    pub avrules: Vec<Avrule>,
    pub role_tr_rules: Vec<RoleTransRule>,
    pub role_allow_rules: Vec<RoleAllowRule>,
    pub range_tr_rules: Vec<RangeTransRule>,
    pub filename_trans_rules: Vec<FilenameTransRule>,
    pub cond_list: Vec<CondNode>,
}

impl AvruleDecl {
    #[must_use]
    pub fn new(decl_id: u32) -> Self {
        Self {
            decl_id,
            declared: ScopeIndex::default(),
            required: ScopeIndex::default(),
            symtab: DeclSymtab::default(),
            avrules: Vec::new(),
            role_tr_rules: Vec::new(),
            role_allow_rules: Vec::new(),
            range_tr_rules: Vec::new(),
            filename_trans_rules: Vec::new(),
            cond_list: Vec::new(),
        }
    }
}

/// A lexical block with its declaration branches. Only the first branch is
/// ever emitted; further branches (optional else) have no CIL rendering.
#[derive(Debug, Clone, Default)]
pub struct AvruleBlock {
    pub flags: BlockFlags,
    pub decls: Vec<AvruleDecl>,
}
