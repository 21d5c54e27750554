// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Block walker.
//!
//! Walks the avrule block chain, emitting each block's first declaration
//! branch. Optional blocks nest by required-scope inclusion: the walker
//! keeps a stack of required scopes, and before opening a new optional it
//! closes every optional whose requirements the incoming declaration does
//! not cover. Scope stacks grow monotonically downward, so the stack is a
//! superset chain from bottom to top.

use std::io::Write;

use crate::cil_writeln;
use crate::error::{LowerError, Result};
use crate::policy::{
    AvruleBlock, AvruleDecl, BlockFlags, RoleDatum, ScopeIndex, ScopeKind, SymbolKind,
};

use super::Lowering;
use super::names::sym_name;

/// Name lookup in a per-kind table; a miss is a broken database invariant.
fn lookup<'t, T>(
    kind: &'static str,
    table: &'t std::collections::BTreeMap<String, T>,
    key: &str,
) -> Result<&'t T> {
    table.get(key).ok_or_else(|| LowerError::MissingSymbol {
        kind,
        name: key.to_owned(),
    })
}

/// Scope-index inclusion: every per-kind bitmap and every class-perm map of
/// `sub` must be covered by `sup`.
fn is_scope_superset(sup: &ScopeIndex, sub: &ScopeIndex) -> bool {
    for (sup_map, sub_map) in sup.scope.iter().zip(&sub.scope) {
        if !sup_map.is_superset_of(sub_map) {
            return false;
        }
    }

    if sup.class_perms_map.len() < sub.class_perms_map.len() {
        return false;
    }

    for (sup_map, sub_map) in sup.class_perms_map.iter().zip(&sub.class_perms_map) {
        if !sup_map.is_superset_of(sub_map) {
            return false;
        }
    }

    true
}

/// Symbol kinds walked by the scope passes, in emission order. Commons are
/// only stored in the global symbol table and handled with the global block.
const SCOPED_KINDS: [SymbolKind; 7] = [
    SymbolKind::Classes,
    SymbolKind::Roles,
    SymbolKind::Types,
    SymbolKind::Users,
    SymbolKind::Booleans,
    SymbolKind::Sensitivities,
    SymbolKind::Categories,
];

impl<'p, W: Write> Lowering<'p, W> {
    /// Concrete roles declared anywhere in the policy, except object_r; the
    /// role→type bindings of these are emitted with the declaration that
    /// scopes each bound type.
    fn decl_roles(&self) -> Vec<&'p RoleDatum> {
        let pdb = self.pdb;
        let mut roles = Vec::new();

        for (key, role) in &pdb.roles.table {
            if key.as_str() == super::DEFAULT_OBJECT {
                continue;
            }
            match pdb.roles.scope.get(key) {
                Some(scope) if scope.scope == ScopeKind::Decl => roles.push(role),
                _ => {}
            }
        }

        roles
    }

    fn decl_roles_to_cil(
        &mut self,
        indent: u32,
        decl: &AvruleDecl,
        decl_roles: &[&'p RoleDatum],
    ) -> Result<()> {
        let pdb = self.pdb;

        for role in decl_roles {
            let types = self.typeset_to_names(indent, &role.types)?;
            for ty in &types {
                let scope = pdb
                    .types
                    .scope
                    .get(ty.as_str())
                    .ok_or_else(|| LowerError::MissingSymbol {
                        kind: "type",
                        name: ty.clone(),
                    })?;
                if scope.decl_ids.contains(&decl.decl_id) {
                    let role_name = sym_name("role", &pdb.roles.val_to_name, role.value - 1)?;
                    cil_writeln!(self.w, indent, "(roletype {role_name} {ty})")?;
                }
            }
        }

        Ok(())
    }

    /// Dispatches one symbol of the declared-scope bitmap to its converter,
    /// passing the scope recorded in the global scope table.
    fn declared_symbol_to_cil(
        &mut self,
        indent: u32,
        block: &AvruleBlock,
        kind: SymbolKind,
        index: u32,
    ) -> Result<()> {
        let pdb = self.pdb;

        match kind {
            SymbolKind::Commons => Ok(()),
            SymbolKind::Classes => {
                let key = sym_name("class", &pdb.classes.val_to_name, index)?;
                let datum = lookup("class", &pdb.classes.table, key)?;
                let scope = lookup("class", &pdb.classes.scope, key)?;
                self.class_to_cil(indent, key, datum, scope.scope)
            }
            SymbolKind::Roles => {
                let key = sym_name("role", &pdb.roles.val_to_name, index)?;
                let datum = lookup("role", &pdb.roles.table, key)?;
                let scope = lookup("role", &pdb.roles.scope, key)?;
                self.role_to_cil(indent, key, datum, scope.scope)
            }
            SymbolKind::Types => {
                let key = sym_name("type", &pdb.types.val_to_name, index)?;
                let datum = lookup("type", &pdb.types.table, key)?;
                let scope = lookup("type", &pdb.types.scope, key)?;
                self.type_to_cil(indent, key, datum, scope.scope)
            }
            SymbolKind::Users => {
                let key = sym_name("user", &pdb.users.val_to_name, index)?;
                let datum = lookup("user", &pdb.users.table, key)?;
                let scope = lookup("user", &pdb.users.scope, key)?;
                self.user_to_cil(indent, block, key, datum, scope.scope)
            }
            SymbolKind::Booleans => {
                let key = sym_name("boolean", &pdb.booleans.val_to_name, index)?;
                let datum = lookup("boolean", &pdb.booleans.table, key)?;
                let scope = lookup("boolean", &pdb.booleans.scope, key)?;
                self.boolean_to_cil(indent, key, datum, scope.scope)
            }
            SymbolKind::Sensitivities => {
                let key = sym_name("sensitivity", &pdb.sensitivities.val_to_name, index)?;
                let datum = lookup("sensitivity", &pdb.sensitivities.table, key)?;
                let scope = lookup("sensitivity", &pdb.sensitivities.scope, key)?;
                self.sens_to_cil(indent, key, datum, scope.scope)
            }
            SymbolKind::Categories => {
                let key = sym_name("category", &pdb.categories.val_to_name, index)?;
                let datum = lookup("category", &pdb.categories.table, key)?;
                let scope = lookup("category", &pdb.categories.scope, key)?;
                self.cat_to_cil(indent, key, datum, scope.scope)
            }
        }
    }

    fn declared_scopes_to_cil(
        &mut self,
        indent: u32,
        block: &AvruleBlock,
        decl: &AvruleDecl,
    ) -> Result<()> {
        for kind in SCOPED_KINDS {
            let map = decl.declared.kind(kind);
            for index in map.iter() {
                self.declared_symbol_to_cil(indent, block, kind, index)?;
            }

            if kind == SymbolKind::Categories {
                self.cat_order_to_cil(indent, map)?;
            }
            if kind == SymbolKind::Sensitivities {
                self.sens_order_to_cil(indent, map)?;
            }
        }

        Ok(())
    }

    /// Dispatches one symbol of the required-scope bitmap; required scopes
    /// always run the converters with Req.
    fn required_symbol_to_cil(
        &mut self,
        indent: u32,
        block: &AvruleBlock,
        kind: SymbolKind,
        index: u32,
    ) -> Result<()> {
        let pdb = self.pdb;

        match kind {
            SymbolKind::Commons => Ok(()),
            SymbolKind::Classes => {
                let key = sym_name("class", &pdb.classes.val_to_name, index)?;
                let datum = lookup("class", &pdb.classes.table, key)?;
                self.class_to_cil(indent, key, datum, ScopeKind::Req)
            }
            SymbolKind::Roles => {
                let key = sym_name("role", &pdb.roles.val_to_name, index)?;
                let datum = lookup("role", &pdb.roles.table, key)?;
                self.role_to_cil(indent, key, datum, ScopeKind::Req)
            }
            SymbolKind::Types => {
                let key = sym_name("type", &pdb.types.val_to_name, index)?;
                let datum = lookup("type", &pdb.types.table, key)?;
                self.type_to_cil(indent, key, datum, ScopeKind::Req)
            }
            SymbolKind::Users => {
                let key = sym_name("user", &pdb.users.val_to_name, index)?;
                let datum = lookup("user", &pdb.users.table, key)?;
                self.user_to_cil(indent, block, key, datum, ScopeKind::Req)
            }
            SymbolKind::Booleans => {
                let key = sym_name("boolean", &pdb.booleans.val_to_name, index)?;
                let datum = lookup("boolean", &pdb.booleans.table, key)?;
                self.boolean_to_cil(indent, key, datum, ScopeKind::Req)
            }
            SymbolKind::Sensitivities => {
                let key = sym_name("sensitivity", &pdb.sensitivities.val_to_name, index)?;
                let datum = lookup("sensitivity", &pdb.sensitivities.table, key)?;
                self.sens_to_cil(indent, key, datum, ScopeKind::Req)
            }
            SymbolKind::Categories => {
                let key = sym_name("category", &pdb.categories.val_to_name, index)?;
                let datum = lookup("category", &pdb.categories.table, key)?;
                self.cat_to_cil(indent, key, datum, ScopeKind::Req)
            }
        }
    }

    fn required_scopes_to_cil(
        &mut self,
        indent: u32,
        block: &AvruleBlock,
        decl: &AvruleDecl,
    ) -> Result<()> {
        for kind in SCOPED_KINDS {
            for index in decl.required.kind(kind).iter() {
                self.required_symbol_to_cil(indent, block, kind, index)?;
            }
        }

        Ok(())
    }

    /// Walks the declaration's local symbol tables; additive scopes emit as
    /// required.
    fn additive_scopes_to_cil(
        &mut self,
        indent: u32,
        block: &AvruleBlock,
        decl: &'p AvruleDecl,
    ) -> Result<()> {
        for (key, datum) in &decl.symtab.classes {
            self.class_to_cil(indent, key, datum, ScopeKind::Req)?;
        }
        for (key, datum) in &decl.symtab.roles {
            self.role_to_cil(indent, key, datum, ScopeKind::Req)?;
        }
        for (key, datum) in &decl.symtab.types {
            self.type_to_cil(indent, key, datum, ScopeKind::Req)?;
        }
        for (key, datum) in &decl.symtab.users {
            self.user_to_cil(indent, block, key, datum, ScopeKind::Req)?;
        }
        for (key, datum) in &decl.symtab.booleans {
            self.boolean_to_cil(indent, key, datum, ScopeKind::Req)?;
        }
        for (key, datum) in &decl.symtab.sensitivities {
            self.sens_to_cil(indent, key, datum, ScopeKind::Req)?;
        }
        for (key, datum) in &decl.symtab.categories {
            self.cat_to_cil(indent, key, datum, ScopeKind::Req)?;
        }

        Ok(())
    }

    /// Type aliases and commons live only in the global symbol tables; both
    /// are emitted with the global block so scoping stays correct.
    fn global_symbols_to_cil(&mut self) -> Result<()> {
        let pdb = self.pdb;

        for (key, ty) in &pdb.types.table {
            if !ty.primary {
                self.type_to_cil(0, key, ty, ScopeKind::Decl)?;
            }
        }

        for (key, common) in &pdb.commons {
            crate::cil_write!(self.w, "(common {key} (")?;
            self.perm_table_inline(&common.permissions)?;
            crate::cil_write!(self.w, "))\n")?;
        }

        Ok(())
    }

    pub(crate) fn blocks_to_cil(&mut self) -> Result<()> {
        let pdb = self.pdb;
        let decl_roles = self.decl_roles();

        let mut indent: u32 = 0;
        let mut stack: Vec<&'p ScopeIndex> = Vec::new();

        for block in &pdb.global {
            let Some(decl) = block.decls.first() else {
                continue;
            };

            if block.decls.len() > 1 {
                log::warn!(
                    "'else' blocks in optional statements are unsupported in CIL, dropping from output"
                );
            }

            if block.flags.contains(BlockFlags::OPTIONAL) {
                // Close every optional whose requirements the incoming
                // declaration does not carry.
                while stack.len() > 1 {
                    let top = stack[stack.len() - 1];
                    if is_scope_superset(&decl.required, top) {
                        break;
                    }
                    stack.pop();
                    indent -= 1;
                    cil_writeln!(self.w, indent, ")")?;
                }

                cil_writeln!(
                    self.w,
                    indent,
                    "(optional {}_optional_{}",
                    self.name,
                    decl.decl_id
                )?;
                indent += 1;
            }

            stack.push(&decl.required);

            if stack.len() == 1 {
                self.global_symbols_to_cil()?;
            }

            self.decl_roles_to_cil(indent, decl, &decl_roles)?;
            self.declared_scopes_to_cil(indent, block, decl)?;
            self.required_scopes_to_cil(indent, block, decl)?;
            self.additive_scopes_to_cil(indent, block, decl)?;
            self.avrule_list_to_cil(indent, &decl.avrules)?;
            self.role_trans_to_cil(indent, &decl.role_tr_rules)?;
            self.role_allows_to_cil(indent, &decl.role_allow_rules)?;
            self.range_trans_to_cil(indent, &decl.range_tr_rules)?;
            self.filename_trans_to_cil(indent, &decl.filename_trans_rules)?;
            self.cond_list_to_cil(indent, &decl.cond_list)?;
        }

        while indent > 0 {
            indent -= 1;
            cil_writeln!(self.w, indent, ")")?;
        }

        Ok(())
    }
}
