// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Rule lowering: access-vector and type rules, role transitions, role
//! allows, range transitions, filename transitions, and conditional lists.
//!
//! Every rule's source and target set expands to a name vector and the
//! Cartesian product is emitted one line per combination.

use std::io::Write;

use crate::cil_write;
use crate::cil_writeln;
use crate::error::{LowerError, Result};
use crate::policy::{
    Avrule, AvruleFlags, AvruleKind, CondNode, FilenameTransRule, RangeTransRule, RoleAllowRule,
    RoleTransRule,
};

use super::Lowering;
use super::names::sym_name;

impl<'p, W: Write> Lowering<'p, W> {
    fn avrule_to_cil(&mut self, indent: u32, rule: &Avrule, src: &str, tgt: &str) -> Result<()> {
        let pdb = self.pdb;
        // auditdenty is the historical spelling in the opcode table; it is
        // retained as a compatibility surface.
        let op = match rule.kind {
            AvruleKind::Allow => "allow",
            AvruleKind::AuditAllow => "auditallow",
            AvruleKind::AuditDeny => "auditdenty",
            AvruleKind::DontAudit => "dontaudit",
            AvruleKind::NeverAllow => "neverallow",
            AvruleKind::Transition => "typetransition",
            AvruleKind::Member => "typemember",
            AvruleKind::Change => "typechange",
        };

        for classperm in &rule.perms {
            let class = sym_name(
                "class",
                &pdb.classes.val_to_name,
                classperm.class.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                    kind: "class",
                    value: classperm.class,
                })?,
            )?;
            if rule.kind.is_access_vector() {
                let perms = self.av_to_string(classperm.class, classperm.data)?;
                cil_writeln!(self.w, indent, "({op} {src} {tgt} ({class} ({perms})))")?;
            } else {
                let newtype = sym_name(
                    "type",
                    &pdb.types.val_to_name,
                    classperm.data.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                        kind: "type",
                        value: classperm.data,
                    })?,
                )?;
                cil_writeln!(self.w, indent, "({op} {src} {tgt} {class} {newtype})")?;
            }
        }

        Ok(())
    }

    pub(crate) fn avrule_list_to_cil(&mut self, indent: u32, rules: &[Avrule]) -> Result<()> {
        for rule in rules {
            let snames = self.typeset_to_names(indent, &rule.stypes)?;
            let tnames = self.typeset_to_names(indent, &rule.ttypes)?;

            for src in &snames {
                for tgt in &tnames {
                    self.avrule_to_cil(indent, rule, src, tgt)?;
                }
                if rule.flags.contains(AvruleFlags::SELF) {
                    self.avrule_to_cil(indent, rule, src, "self")?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn role_trans_to_cil(&mut self, indent: u32, rules: &[RoleTransRule]) -> Result<()> {
        let pdb = self.pdb;
        for rule in rules {
            let role_names = self.roleset_to_names(indent, &rule.roles)?;
            let type_names = self.typeset_to_names(indent, &rule.types)?;
            let new_role = sym_name(
                "role",
                &pdb.roles.val_to_name,
                rule.new_role.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                    kind: "role",
                    value: rule.new_role,
                })?,
            )?;

            for role in &role_names {
                for ty in &type_names {
                    for i in rule.classes.iter() {
                        let class = sym_name("class", &pdb.classes.val_to_name, i)?;
                        cil_writeln!(
                            self.w,
                            indent,
                            "(roletransition {role} {ty} {class} {new_role})"
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn role_allows_to_cil(&mut self, indent: u32, rules: &[RoleAllowRule]) -> Result<()> {
        for rule in rules {
            let roles = self.roleset_to_names(indent, &rule.roles)?;
            let new_roles = self.roleset_to_names(indent, &rule.new_roles)?;

            for role in &roles {
                for new_role in &new_roles {
                    cil_writeln!(self.w, indent, "(roleallow {role} {new_role})")?;
                }
            }
        }
        Ok(())
    }

    /// Range transitions exist only in MLS policies; otherwise nothing is
    /// emitted.
    pub(crate) fn range_trans_to_cil(&mut self, indent: u32, rules: &[RangeTransRule]) -> Result<()> {
        let pdb = self.pdb;
        if !pdb.mls {
            return Ok(());
        }

        for rule in rules {
            let stypes = self.typeset_to_names(indent, &rule.stypes)?;
            let ttypes = self.typeset_to_names(indent, &rule.ttypes)?;

            for src in &stypes {
                for tgt in &ttypes {
                    for i in rule.tclasses.iter() {
                        let class = sym_name("class", &pdb.classes.val_to_name, i)?;
                        self.w.indent(indent)?;
                        cil_write!(self.w, "(rangetransition {src} {tgt} {class} (")?;
                        self.semantic_level_to_cil(1, &rule.range.low)?;
                        cil_write!(self.w, " ")?;
                        self.semantic_level_to_cil(1, &rule.range.high)?;
                        cil_write!(self.w, "))\n")?;
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn filename_trans_to_cil(
        &mut self,
        indent: u32,
        rules: &[FilenameTransRule],
    ) -> Result<()> {
        let pdb = self.pdb;
        for rule in rules {
            let stypes = self.typeset_to_names(indent, &rule.stypes)?;
            let ttypes = self.typeset_to_names(indent, &rule.ttypes)?;
            let class = sym_name(
                "class",
                &pdb.classes.val_to_name,
                rule.tclass.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                    kind: "class",
                    value: rule.tclass,
                })?,
            )?;
            let otype = sym_name(
                "type",
                &pdb.types.val_to_name,
                rule.otype.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                    kind: "type",
                    value: rule.otype,
                })?,
            )?;

            for src in &stypes {
                for tgt in &ttypes {
                    cil_writeln!(
                        self.w,
                        indent,
                        "(typetransition {src} {tgt} {class} {} {otype})",
                        rule.name
                    )?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn cond_list_to_cil(&mut self, indent: u32, nodes: &[CondNode]) -> Result<()> {
        for node in nodes {
            self.cond_expr_to_cil(indent, node)?;

            if !node.true_rules.is_empty() {
                cil_writeln!(self.w, indent + 1, "(true")?;
                self.avrule_list_to_cil(indent + 2, &node.true_rules)?;
                cil_writeln!(self.w, indent + 1, ")")?;
            }

            if !node.false_rules.is_empty() {
                cil_writeln!(self.w, indent + 1, "(false")?;
                self.avrule_list_to_cil(indent + 2, &node.false_rules)?;
                cil_writeln!(self.w, indent + 1, ")")?;
            }

            cil_writeln!(self.w, indent, ")")?;
        }
        Ok(())
    }
}
