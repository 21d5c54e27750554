// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Name and set utilities.
//!
//! Bitmaps become name vectors through the per-kind val_to_name tables.
//! Anonymous positive/negative/complemented sets have no CIL literal form;
//! a fresh named attribute is synthesised for each one and the attribute
//! name stands in for the set.

use std::collections::BTreeMap;
use std::io::Write;

use crate::cil_write;
use crate::cil_writeln;
use crate::ebitmap::Ebitmap;
use crate::error::{LowerError, Result};
use crate::policy::{RoleSet, SetFlags, TypeSet};

use super::Lowering;

/// Looks up a 0-based index in a val_to_name table.
pub(crate) fn sym_name<'a>(
    kind: &'static str,
    val_to_name: &'a [String],
    index: u32,
) -> Result<&'a str> {
    val_to_name
        .get(index as usize)
        .map(String::as_str)
        .ok_or(LowerError::UnknownSymbolValue { kind, value: index })
}

/// Copies the name of every set bit into an owned vector.
pub(crate) fn ebitmap_to_names(
    kind: &'static str,
    val_to_name: &[String],
    map: &Ebitmap,
) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(map.cardinality());
    for i in map.iter() {
        names.push(sym_name(kind, val_to_name, i)?.to_owned());
    }
    Ok(names)
}

/// Joins a name list into one whitespace-separated string.
pub(crate) fn name_list_to_string(names: &[String]) -> String {
    names.join(" ")
}

#[derive(Clone, Copy)]
pub(crate) enum AttrKind {
    Type,
    Role,
}

impl<'p, W: Write> Lowering<'p, W> {
    /// Expands a type set to names, synthesising an attribute when the set
    /// carries a negative part or flags.
    pub(crate) fn typeset_to_names(&mut self, indent: u32, ts: &TypeSet) -> Result<Vec<String>> {
        let pdb = self.pdb;
        if !ts.negset.is_empty() || !ts.flags.is_empty() {
            self.set_to_attr(indent, AttrKind::Type, &ts.types, Some(&ts.negset), ts.flags)
        } else {
            ebitmap_to_names("type", &pdb.types.val_to_name, &ts.types)
        }
    }

    /// Expands a role set to names; roles have no negative part, so only
    /// flags force synthesis.
    pub(crate) fn roleset_to_names(&mut self, indent: u32, rs: &RoleSet) -> Result<Vec<String>> {
        let pdb = self.pdb;
        if !rs.flags.is_empty() {
            self.set_to_attr(indent, AttrKind::Role, &rs.roles, None, rs.flags)
        } else {
            ebitmap_to_names("role", &pdb.roles.val_to_name, &rs.roles)
        }
    }

    // CIL doesn't support anonymous positive/negative/complemented sets. So
    // instead we create a CIL type/roleattributeset that matches the set. If
    // the set has a negative set, then convert it to (P & !N), where P is
    // the list of members in the positive set, and N is the list of members
    // in the negative set. Additionally, if the set is complemented, then
    // wrap the whole thing with a negation.
    pub(crate) fn set_to_attr(
        &mut self,
        indent: u32,
        kind: AttrKind,
        pos: &Ebitmap,
        neg: Option<&Ebitmap>,
        flags: SetFlags,
    ) -> Result<Vec<String>> {
        let pdb = self.pdb;
        let (infix, statement, val_to_name, sym) = match kind {
            AttrKind::Type => ("_typeattr_", "type", &pdb.types.val_to_name, "type"),
            AttrKind::Role => ("_roleattr_", "role", &pdb.roles.val_to_name, "role"),
        };

        let ordinal = self.w.next_attr();
        let attr = format!("{}{}{}", self.name, infix, ordinal);

        let has_positive = !pos.is_empty();
        let has_negative = neg.is_some_and(|n| !n.is_empty());

        cil_writeln!(self.w, indent, "({statement}attribute {attr})")?;
        self.w.indent(indent)?;
        cil_write!(self.w, "({statement}attributeset {attr} ")?;

        if flags.contains(SetFlags::STAR) {
            cil_write!(self.w, "(all)")?;
        }

        if flags.contains(SetFlags::COMP) {
            cil_write!(self.w, "(not ")?;
        }

        if has_positive && has_negative {
            cil_write!(self.w, "(and ")?;
        }

        if has_positive {
            cil_write!(self.w, "(")?;
            for i in pos.iter() {
                let name = sym_name(sym, val_to_name, i)?;
                cil_write!(self.w, "{name} ")?;
            }
            cil_write!(self.w, ") ")?;
        }

        if has_negative {
            cil_write!(self.w, "(not (")?;
            if let Some(neg) = neg {
                for i in neg.iter() {
                    let name = sym_name(sym, val_to_name, i)?;
                    cil_write!(self.w, "{name} ")?;
                }
            }
            cil_write!(self.w, "))")?;
        }

        if has_positive && has_negative {
            cil_write!(self.w, ")")?;
        }

        if flags.contains(SetFlags::COMP) {
            cil_write!(self.w, ")")?;
        }

        cil_write!(self.w, ")\n")?;

        Ok(vec![attr])
    }

    /// Writes each set bit's name followed by a space, for the inline
    /// `(name1 name2 )` list bodies.
    pub(crate) fn names_inline(
        &mut self,
        kind: &'static str,
        val_to_name: &[String],
        map: &Ebitmap,
    ) -> Result<()> {
        for i in map.iter() {
            let name = sym_name(kind, val_to_name, i)?;
            cil_write!(self.w, "{name} ")?;
        }
        Ok(())
    }

    /// Writes a permission table inline, in bit-value order.
    pub(crate) fn perm_table_inline(&mut self, perms: &BTreeMap<String, u32>) -> Result<()> {
        let mut ordered: Vec<(&u32, &String)> = perms.iter().map(|(k, v)| (v, k)).collect();
        ordered.sort();
        for (_, name) in ordered {
            cil_write!(self.w, "{name} ")?;
        }
        Ok(())
    }

    /// Resolves an access-vector bitmask to permission names through the
    /// class's own table and its common's, in bit order, space-joined.
    pub(crate) fn av_to_string(&self, class_value: u32, data: u32) -> Result<String> {
        let pdb = self.pdb;
        let class_name = sym_name(
            "class",
            &pdb.classes.val_to_name,
            class_value.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                kind: "class",
                value: class_value,
            })?,
        )?;
        let class = pdb
            .classes
            .table
            .get(class_name)
            .ok_or_else(|| LowerError::MissingSymbol {
                kind: "class",
                name: class_name.to_owned(),
            })?;
        let common = class
            .comkey
            .as_deref()
            .and_then(|key| pdb.commons.get(key));

        let mut parts: Vec<&str> = Vec::new();
        for bit in 0..32u32 {
            if data & (1 << bit) == 0 {
                continue;
            }
            let value = bit + 1;
            let name = class
                .permissions
                .iter()
                .find(|(_, v)| **v == value)
                .or_else(|| {
                    common.and_then(|c| c.permissions.iter().find(|(_, v)| **v == value))
                })
                .map(|(k, _)| k.as_str())
                .ok_or_else(|| LowerError::UnknownPermissionBit {
                    class: class_name.to_owned(),
                    bit: value,
                })?;
            parts.push(name);
        }

        Ok(parts.join(" "))
    }
}
