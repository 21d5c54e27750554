// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Per-symbol-kind converters.
//!
//! Every converter receives the symbol key, its datum, and the scope the
//! emission runs under. Declaration forms are gated on the declared scope;
//! forward requirements (Req) have no CIL rendering for classes and
//! categories, and suppress declaration forms for the rest.

use std::io::Write;

use crate::cil_write;
use crate::cil_writeln;
use crate::ebitmap::Ebitmap;
use crate::error::{LowerError, Result};
use crate::policy::{
    AvruleBlock, BlockFlags, BoolDatum, CatDatum, ClassDatum, Constraint, LevelDatum,
    MlsSemanticLevel, PolicyType, RoleDatum, RoleFlavor, ScopeKind, TypeDatum, TypeFlavor,
    UserDatum,
};

use super::{DEFAULT_LEVEL, DEFAULT_OBJECT, Lowering};
use super::names::sym_name;

impl<'p, W: Write> Lowering<'p, W> {
    //
    // ------------------------------------------------------------------------
    // Classes and commons
    // ------------------------------------------------------------------------
    //

    pub(crate) fn class_to_cil(
        &mut self,
        indent: u32,
        key: &str,
        class: &ClassDatum,
        scope: ScopeKind,
    ) -> Result<()> {
        // A required class is a forward reference; CIL has no statement for
        // it, the declaring module emits the class.
        if scope == ScopeKind::Req {
            return Ok(());
        }

        self.w.indent(indent)?;
        cil_write!(self.w, "(class {key} (")?;
        self.perm_table_inline(&class.permissions)?;
        cil_write!(self.w, "))\n")?;

        if let Some(common) = &class.comkey {
            cil_writeln!(self.w, indent, "(classcommon {key} {common})")?;
        }

        if let Some(dflt) = class.default_user {
            cil_writeln!(self.w, indent, "(defaultuser {key} {})", dflt.as_cil())?;
        }
        if let Some(dflt) = class.default_role {
            cil_writeln!(self.w, indent, "(defaultrole {key} {})", dflt.as_cil())?;
        }
        if let Some(dflt) = class.default_type {
            cil_writeln!(self.w, indent, "(defaulttype {key} {})", dflt.as_cil())?;
        }
        if let Some(dflt) = class.default_range {
            cil_writeln!(self.w, indent, "(defaultrange {key} {})", dflt.as_cil())?;
        }

        self.constraints_to_cil(indent, key, class, &class.constraints, true)?;
        self.constraints_to_cil(indent, key, class, &class.validatetrans, false)?;

        Ok(())
    }

    fn constraints_to_cil(
        &mut self,
        indent: u32,
        key: &str,
        class: &ClassDatum,
        nodes: &[Constraint],
        is_constraint: bool,
    ) -> Result<()> {
        let mls = if self.pdb.mls { "mls" } else { "" };

        for node in nodes {
            let expr = self.constraint_expr_to_string(indent, &node.expr)?;
            if is_constraint {
                let perms = self.av_to_string(class.value, node.permissions)?;
                cil_writeln!(self.w, indent, "({mls}constrain ({key} ({perms})) {expr})")?;
            } else {
                cil_writeln!(self.w, indent, "({mls}validatetrans {key} {expr})")?;
            }
        }

        Ok(())
    }

    //
    // ------------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------------
    //

    pub(crate) fn role_to_cil(
        &mut self,
        indent: u32,
        key: &str,
        role: &RoleDatum,
        scope: ScopeKind,
    ) -> Result<()> {
        let pdb = self.pdb;
        match role.flavor {
            RoleFlavor::Role => {
                if scope == ScopeKind::Decl && pdb.policy_type == PolicyType::Module {
                    // Roles are declared twice, once in a module and once in
                    // base. CIL rejects duplicate declarations, so only the
                    // module-side declaration is taken; the bindings of a
                    // declared role are handled with the decl roles.
                    cil_writeln!(self.w, indent, "(role {key})")?;
                    return Ok(());
                }

                if role.dominates.cardinality() > 1 {
                    log::warn!(
                        "role 'dominance' statement unsupported in CIL, dropping from output"
                    );
                }

                let types = self.typeset_to_names(indent, &role.types)?;
                for ty in &types {
                    cil_writeln!(self.w, indent, "(roletype {key} {ty})")?;
                }

                if role.bounds > 0 {
                    let parent = sym_name("role", &pdb.roles.val_to_name, role.bounds - 1)?;
                    cil_writeln!(self.w, indent, "(rolebounds {key} {parent})")?;
                }
            }

            RoleFlavor::Attribute => {
                if scope == ScopeKind::Decl {
                    cil_writeln!(self.w, indent, "(roleattribute {key})")?;
                }

                if !role.roles.is_empty() {
                    self.w.indent(indent)?;
                    cil_write!(self.w, "(roleattributeset {key} (")?;
                    self.names_inline("role", &pdb.roles.val_to_name, &role.roles)?;
                    cil_write!(self.w, "))\n")?;
                }

                let types = self.typeset_to_names(indent, &role.types)?;
                for ty in &types {
                    cil_writeln!(self.w, indent, "(roletype {key} {ty})")?;
                }
            }
        }

        Ok(())
    }

    //
    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------
    //

    pub(crate) fn type_to_cil(
        &mut self,
        indent: u32,
        key: &str,
        ty: &TypeDatum,
        scope: ScopeKind,
    ) -> Result<()> {
        let pdb = self.pdb;
        match ty.flavor {
            TypeFlavor::Type => {
                if scope == ScopeKind::Decl {
                    if ty.primary {
                        cil_writeln!(self.w, indent, "(type {key})")?;
                        // object_r is implicit in the legacy compiler, but
                        // not in CIL; bind it for every type.
                        cil_writeln!(self.w, indent, "(roletype {DEFAULT_OBJECT} {key})")?;
                    } else {
                        let real = sym_name("type", &pdb.types.val_to_name, ty.value - 1)?;
                        cil_writeln!(self.w, indent, "(typealias {key})")?;
                        cil_writeln!(self.w, indent, "(typealiasactual {key} {real})")?;
                    }
                }

                if ty.permissive {
                    cil_writeln!(self.w, indent, "(typepermissive {key})")?;
                }

                if ty.bounds > 0 {
                    let parent = sym_name("type", &pdb.types.val_to_name, ty.bounds - 1)?;
                    cil_writeln!(self.w, indent, "(typebounds {parent} {key})")?;
                }
            }

            TypeFlavor::Attribute => {
                if scope == ScopeKind::Decl {
                    cil_writeln!(self.w, indent, "(typeattribute {key})")?;
                }

                if !ty.types.is_empty() {
                    self.w.indent(indent)?;
                    cil_write!(self.w, "(typeattributeset {key} (")?;
                    self.names_inline("type", &pdb.types.val_to_name, &ty.types)?;
                    cil_write!(self.w, "))\n")?;
                }
            }
        }

        Ok(())
    }

    //
    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------
    //

    pub(crate) fn user_to_cil(
        &mut self,
        indent: u32,
        block: &AvruleBlock,
        key: &str,
        user: &UserDatum,
        scope: ScopeKind,
    ) -> Result<()> {
        let pdb = self.pdb;

        if scope == ScopeKind::Decl {
            cil_writeln!(self.w, indent, "(user {key})")?;
            // object_r is implicit in the legacy compiler; bind it here.
            cil_writeln!(self.w, indent, "(userrole {key} {DEFAULT_OBJECT})")?;
        }

        for i in user.roles.iter() {
            let role = sym_name("role", &pdb.roles.val_to_name, i)?;
            cil_writeln!(self.w, indent, "(userrole {key} {role})")?;
        }

        // Sensitivities in user statements inside optionals do not carry the
        // standard -1 offset.
        let sens_offset = if block.flags.contains(BlockFlags::OPTIONAL) {
            0
        } else {
            1
        };

        self.w.indent(indent)?;
        cil_write!(self.w, "(userlevel {key} ")?;
        if pdb.mls {
            self.semantic_level_to_cil(sens_offset, &user.default_level)?;
        } else {
            cil_write!(self.w, "{DEFAULT_LEVEL}")?;
        }
        cil_write!(self.w, ")\n")?;

        self.w.indent(indent)?;
        cil_write!(self.w, "(userrange {key} (")?;
        if pdb.mls {
            self.semantic_level_to_cil(sens_offset, &user.range.low)?;
            cil_write!(self.w, " ")?;
            self.semantic_level_to_cil(sens_offset, &user.range.high)?;
        } else {
            cil_write!(self.w, "{DEFAULT_LEVEL} {DEFAULT_LEVEL}")?;
        }
        cil_write!(self.w, "))\n")?;

        Ok(())
    }

    //
    // ------------------------------------------------------------------------
    // Booleans, sensitivities, categories
    // ------------------------------------------------------------------------
    //

    pub(crate) fn boolean_to_cil(
        &mut self,
        indent: u32,
        key: &str,
        boolean: &BoolDatum,
        scope: ScopeKind,
    ) -> Result<()> {
        if scope == ScopeKind::Decl {
            let statement = if boolean.tunable { "tunable" } else { "boolean" };
            let state = if boolean.state { "true" } else { "false" };
            cil_writeln!(self.w, indent, "({statement} {key} {state})")?;
        }
        Ok(())
    }

    pub(crate) fn sens_to_cil(
        &mut self,
        indent: u32,
        key: &str,
        level: &LevelDatum,
        scope: ScopeKind,
    ) -> Result<()> {
        let pdb = self.pdb;

        if scope == ScopeKind::Decl {
            if level.alias {
                let real = sym_name(
                    "sensitivity",
                    &pdb.sensitivities.val_to_name,
                    level.level.sens.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                        kind: "sensitivity",
                        value: level.level.sens,
                    })?,
                )?;
                cil_writeln!(self.w, indent, "(sensitivityalias {key})")?;
                cil_writeln!(self.w, indent, "(sensitivityaliasactual {key} {real})")?;
            } else {
                cil_writeln!(self.w, indent, "(sensitivity {key})")?;
            }
        }

        if !level.level.cats.is_empty() {
            self.w.indent(indent)?;
            cil_write!(self.w, "(sensitivitycategory {key} (")?;
            self.names_inline("category", &pdb.categories.val_to_name, &level.level.cats)?;
            cil_write!(self.w, "))\n")?;
        }

        Ok(())
    }

    pub(crate) fn sens_order_to_cil(&mut self, indent: u32, order: &Ebitmap) -> Result<()> {
        let pdb = self.pdb;
        if order.is_empty() {
            return Ok(());
        }

        self.w.indent(indent)?;
        cil_write!(self.w, "(sensitivityorder (")?;
        self.names_inline("sensitivity", &pdb.sensitivities.val_to_name, order)?;
        cil_write!(self.w, "))\n")?;

        Ok(())
    }

    pub(crate) fn cat_to_cil(
        &mut self,
        indent: u32,
        key: &str,
        cat: &CatDatum,
        scope: ScopeKind,
    ) -> Result<()> {
        let pdb = self.pdb;

        if scope == ScopeKind::Req {
            return Ok(());
        }

        if cat.alias {
            let real = sym_name(
                "category",
                &pdb.categories.val_to_name,
                cat.value.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                    kind: "category",
                    value: cat.value,
                })?,
            )?;
            cil_writeln!(self.w, indent, "(categoryalias {key})")?;
            cil_writeln!(self.w, indent, "(categoryaliasactual {key} {real})")?;
        } else {
            cil_writeln!(self.w, indent, "(category {key})")?;
        }

        Ok(())
    }

    pub(crate) fn cat_order_to_cil(&mut self, indent: u32, order: &Ebitmap) -> Result<()> {
        let pdb = self.pdb;
        if order.is_empty() {
            return Ok(());
        }

        self.w.indent(indent)?;
        cil_write!(self.w, "(categoryorder (")?;
        self.names_inline("category", &pdb.categories.val_to_name, order)?;
        cil_write!(self.w, "))\n")?;

        Ok(())
    }

    //
    // ------------------------------------------------------------------------
    // Semantic levels
    // ------------------------------------------------------------------------
    //

    /// Writes a semantic level. A category-less level is the bare
    /// sensitivity name; otherwise `(sens (c0 (range c2 c3) ...))`.
    ///
    /// `sens_offset` reflects how the decoder allocated sensitivity values
    /// for the containing statement: 1 normally, 0 inside optionals.
    pub(crate) fn semantic_level_to_cil(
        &mut self,
        sens_offset: u32,
        level: &MlsSemanticLevel,
    ) -> Result<()> {
        let pdb = self.pdb;
        let index = level.sens.checked_sub(sens_offset).ok_or(
            LowerError::UnknownSymbolValue {
                kind: "sensitivity",
                value: level.sens,
            },
        )?;
        let sens = sym_name("sensitivity", &pdb.sensitivities.val_to_name, index)?;

        if level.cats.is_empty() {
            cil_write!(self.w, "{sens}")?;
            return Ok(());
        }

        cil_write!(self.w, "({sens} (")?;
        for (i, cat) in level.cats.iter().enumerate() {
            if i > 0 {
                cil_write!(self.w, " ")?;
            }
            let low = sym_name("category", &pdb.categories.val_to_name, cat.low - 1)?;
            if cat.low == cat.high {
                cil_write!(self.w, "{low}")?;
            } else {
                let high = sym_name("category", &pdb.categories.val_to_name, cat.high - 1)?;
                cil_write!(self.w, "(range {low} {high})")?;
            }
        }
        cil_write!(self.w, "))")?;

        Ok(())
    }
}
