// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Conditional and constraint expression lowering.
//!
//! Both expression kinds arrive in RPN order. Lowering runs a small operand
//! stack of owned strings; an operator pops its operands and pushes the
//! parenthesised prefix form. The node sequences are built iteratively by
//! the decoder, so this stays a loop rather than a recursion.

use std::io::Write;

use crate::cil_writeln;
use crate::error::{LowerError, Result};
use crate::policy::{
    CexprAttr, CondExprNode, CondNode, CondOp, ConstraintExprNode, ConstraintNames,
};

use super::Lowering;
use super::names::{ebitmap_to_names, name_list_to_string, sym_name};

/// The fixed constraint attribute-selector table. The second symbol is empty
/// for single-operand selectors.
fn cexpr_attrs(attr: CexprAttr) -> Result<(&'static str, &'static str)> {
    let pair = if attr == CexprAttr::USER {
        ("u1", "u2")
    } else if attr == CexprAttr::USER.union(CexprAttr::TARGET) {
        ("u2", "")
    } else if attr == CexprAttr::USER.union(CexprAttr::XTARGET) {
        ("u3", "")
    } else if attr == CexprAttr::ROLE {
        ("r1", "r2")
    } else if attr == CexprAttr::ROLE.union(CexprAttr::TARGET) {
        ("r2", "")
    } else if attr == CexprAttr::ROLE.union(CexprAttr::XTARGET) {
        ("r3", "")
    } else if attr == CexprAttr::TYPE {
        ("t1", "")
    } else if attr == CexprAttr::TYPE.union(CexprAttr::TARGET) {
        ("t2", "")
    } else if attr == CexprAttr::TYPE.union(CexprAttr::XTARGET) {
        ("t3", "")
    } else if attr == CexprAttr::L1L2 {
        ("l1", "l2")
    } else if attr == CexprAttr::L1H2 {
        ("l1", "h2")
    } else if attr == CexprAttr::H1L2 {
        ("h1", "l2")
    } else if attr == CexprAttr::H1H2 {
        ("h1", "h2")
    } else if attr == CexprAttr::L1H1 {
        ("l1", "h1")
    } else if attr == CexprAttr::L2H2 {
        ("l2", "h2")
    } else {
        return Err(LowerError::InvalidConstraint);
    };
    Ok(pair)
}

impl<'p, W: Write> Lowering<'p, W> {
    /// Emits the conditional header line: `(tunableif <expr>` or
    /// `(booleanif <expr>`. The caller closes the form after its branches.
    pub(crate) fn cond_expr_to_cil(&mut self, indent: u32, node: &CondNode) -> Result<()> {
        let pdb = self.pdb;
        let mut stack: Vec<String> = Vec::new();

        for expr in &node.expr {
            let value = match expr {
                CondExprNode::Bool(value) => {
                    let name = sym_name(
                        "boolean",
                        &pdb.booleans.val_to_name,
                        value.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                            kind: "boolean",
                            value: *value,
                        })?,
                    )?;
                    format!("({name})")
                }
                CondExprNode::Op(op) => {
                    let name = match op {
                        CondOp::Not => "not",
                        CondOp::Or => "or",
                        CondOp::And => "and",
                        CondOp::Xor => "xor",
                        CondOp::Eq => "eq",
                        CondOp::Neq => "neq",
                    };
                    if *op == CondOp::Not {
                        let a = stack.pop().ok_or(LowerError::InvalidConditional)?;
                        format!("({name} {a})")
                    } else {
                        let b = stack.pop().ok_or(LowerError::InvalidConditional)?;
                        let a = stack.pop().ok_or(LowerError::InvalidConditional)?;
                        format!("({name} {a} {b})")
                    }
                }
            };
            stack.push(value);
        }

        let expr = stack.pop().ok_or(LowerError::InvalidConditional)?;
        if !stack.is_empty() {
            return Err(LowerError::InvalidConditional);
        }

        let keyword = if node.tunable { "tunableif" } else { "booleanif" };
        cil_writeln!(self.w, indent, "({keyword} {expr}")
    }

    /// Converts a constraint expression to its prefix string.
    pub(crate) fn constraint_expr_to_string(
        &mut self,
        indent: u32,
        exprs: &[ConstraintExprNode],
    ) -> Result<String> {
        let pdb = self.pdb;
        let mut stack: Vec<String> = Vec::new();

        for expr in exprs {
            let value = match expr {
                ConstraintExprNode::Attr { op, attr } => {
                    let (attr1, attr2) = cexpr_attrs(*attr)?;
                    format!("({} {attr1} {attr2})", op.as_cil())
                }
                ConstraintExprNode::Names { op, attr, names } => {
                    let (attr1, _) = cexpr_attrs(*attr)?;
                    let names = match names {
                        ConstraintNames::Types(ts) => self.typeset_to_names(indent, ts)?,
                        ConstraintNames::Users(map) => {
                            ebitmap_to_names("user", &pdb.users.val_to_name, map)?
                        }
                        ConstraintNames::Roles(map) => {
                            ebitmap_to_names("role", &pdb.roles.val_to_name, map)?
                        }
                    };
                    let names = name_list_to_string(&names);
                    format!("({} {attr1} {names})", op.as_cil())
                }
                ConstraintExprNode::Not => {
                    let a = stack.pop().ok_or(LowerError::InvalidConstraint)?;
                    format!("(not {a})")
                }
                ConstraintExprNode::And => {
                    let b = stack.pop().ok_or(LowerError::InvalidConstraint)?;
                    let a = stack.pop().ok_or(LowerError::InvalidConstraint)?;
                    format!("(and {a} {b})")
                }
                ConstraintExprNode::Or => {
                    let b = stack.pop().ok_or(LowerError::InvalidConstraint)?;
                    let a = stack.pop().ok_or(LowerError::InvalidConstraint)?;
                    format!("(or {a} {b})")
                }
            };
            stack.push(value);
        }

        let expr = stack.pop().ok_or(LowerError::InvalidConstraint)?;
        if !stack.is_empty() {
            return Err(LowerError::InvalidConstraint);
        }

        Ok(expr)
    }
}
