// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Text-section lowering.
//!
//! Policy packages bundle a handful of plain-text sub-files: seusers,
//! user_extra, and file_contexts, plus netfilter_contexts which has no CIL
//! rendering. Each section has its own small line grammar; legacy
//! colon/space-delimited records become CIL forms.
//!
//! Grammars:
//!
//!   seusers:        user:seuser[:levelrange]
//!   user_extra:     user NAME prefix PREFIX;
//!   file_contexts:  REGEX [MODE] CONTEXT
//!
//! Level ranges are `LOW[-HIGH]`, a level is `SENS[:CATS]`, and CATS is a
//! comma-separated list of `C` or `C1.C2` runs.

use std::io::Write;

use nom::IResult;
use nom::bytes::complete::{tag, take_till1, take_until};
use nom::character::complete::space1;

use crate::cil_write;
use crate::cil_writeln;
use crate::error::{LowerError, Result};

use super::{DEFAULT_LEVEL, Lowering};

/// Formal grammar for one user_extra record: `user NAME prefix PREFIX;`.
fn parse_user_extra_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = tag("user")(input)?;
    let (input, _) = space1(input)?;
    let (input, user) = take_till1(char::is_whitespace)(input)?;
    let (input, _) = space1(input)?;
    let (input, _) = tag("prefix")(input)?;
    let (input, _) = space1(input)?;
    let (input, prefix) = take_until(";")(input)?;
    let (input, _) = tag(";")(input)?;
    Ok((input, (user, prefix)))
}

impl<'p, W: Write> Lowering<'p, W> {
    /// Writes one level literal: bare `SENS`, or `(SENS (CATS))` where each
    /// category run is a name or a `(range lo hi)` form.
    fn level_string_to_cil(&mut self, levelstr: &str) -> Result<()> {
        let (sens, cats) = match levelstr.split_once(':') {
            Some((sens, cats)) => (sens, Some(cats)),
            None => (levelstr, None),
        };
        let cats = cats.filter(|c| !c.is_empty());

        if sens.is_empty() {
            return Err(LowerError::InvalidLevel(levelstr.to_owned()));
        }

        let Some(cats) = cats else {
            cil_write!(self.w, "{sens}")?;
            return Ok(());
        };

        cil_write!(self.w, "({sens} (")?;
        for (i, token) in cats.split(',').enumerate() {
            if token.is_empty() {
                return Err(LowerError::InvalidLevel(levelstr.to_owned()));
            }
            if i > 0 {
                cil_write!(self.w, " ")?;
            }
            match token.split_once('.') {
                Some((low, high)) => cil_write!(self.w, "(range {low} {high})")?,
                None => cil_write!(self.w, "{token}")?,
            }
        }
        cil_write!(self.w, "))")?;

        Ok(())
    }

    /// Writes a `LOW[-HIGH]` range as two space-separated levels.
    fn level_range_string_to_cil(&mut self, rangestr: &str) -> Result<()> {
        let (low, high) = match rangestr.split_once('-') {
            Some((low, high)) => (low, high),
            None => (rangestr, rangestr),
        };

        self.level_string_to_cil(low)?;
        cil_write!(self.w, " ")?;
        self.level_string_to_cil(high)?;

        Ok(())
    }

    /// Writes a `user:role:type[:range]` literal as a CIL context.
    fn context_string_to_cil(&mut self, contextstr: &str) -> Result<()> {
        let mut fields = contextstr.splitn(4, ':');
        let user = fields.next().unwrap_or("");
        let role = fields.next().unwrap_or("");
        let ty = fields.next().unwrap_or("");
        let level = fields.next();

        if user.is_empty() || role.is_empty() || ty.is_empty() {
            return Err(LowerError::InvalidContext(contextstr.to_owned()));
        }

        cil_write!(self.w, "({user} {role} {ty} (")?;

        match level {
            Some(level) => self.level_range_string_to_cil(level)?,
            None => cil_write!(self.w, "{DEFAULT_LEVEL} {DEFAULT_LEVEL}")?,
        }

        cil_write!(self.w, "))")?;

        Ok(())
    }

    //
    // ------------------------------------------------------------------------
    // seusers
    // ------------------------------------------------------------------------
    //

    pub(crate) fn seusers_to_cil(&mut self, seusers: &str) -> Result<()> {
        for line in seusers.lines() {
            let buf = line.trim();
            if buf.is_empty() || buf.starts_with('#') {
                continue;
            }

            let Some((user, rest)) = buf.split_once(':') else {
                return Err(LowerError::InvalidTextLine {
                    section: "seuser",
                    line: line.to_owned(),
                });
            };
            let (seuser, level) = match rest.split_once(':') {
                Some((seuser, level)) => (seuser, Some(level)),
                None => (rest, None),
            };

            if user.is_empty() || seuser.is_empty() || level.is_some_and(str::is_empty) {
                return Err(LowerError::InvalidTextLine {
                    section: "seuser",
                    line: line.to_owned(),
                });
            }

            if user == "__default__" {
                cil_write!(self.w, "(selinuxuserdefault {seuser} (")?;
            } else {
                cil_write!(self.w, "(selinuxuser {user} {seuser} (")?;
            }

            match level {
                Some(level) => self.level_range_string_to_cil(level)?,
                None => cil_write!(self.w, "{DEFAULT_LEVEL} {DEFAULT_LEVEL}")?,
            }

            cil_write!(self.w, "))\n")?;
        }

        Ok(())
    }

    //
    // ------------------------------------------------------------------------
    // user_extra
    // ------------------------------------------------------------------------
    //

    pub(crate) fn user_extra_to_cil(&mut self, user_extra: &str) -> Result<()> {
        for line in user_extra.lines() {
            let (user, prefix) = match parse_user_extra_line(line) {
                Ok((_, fields)) => fields,
                Err(_) => {
                    return Err(LowerError::InvalidTextLine {
                        section: "user_extra",
                        line: line.to_owned(),
                    });
                }
            };

            cil_writeln!(self.w, 0, "(userprefix {user} {prefix})")?;
        }

        Ok(())
    }

    //
    // ------------------------------------------------------------------------
    // file_contexts
    // ------------------------------------------------------------------------
    //

    pub(crate) fn file_contexts_to_cil(&mut self, file_contexts: &str) -> Result<()> {
        for line in file_contexts.lines() {
            let buf = line.trim();
            if buf.is_empty() || buf.starts_with('#') {
                continue;
            }

            let mut tokens = buf.split_whitespace();
            let (Some(regex), Some(second)) = (tokens.next(), tokens.next()) else {
                return Err(LowerError::InvalidTextLine {
                    section: "file context",
                    line: line.to_owned(),
                });
            };
            let (mode, context) = match tokens.next() {
                Some(context) => (Some(second), context),
                None => (None, second),
            };

            let cilmode = match mode {
                None => "any",
                Some("--") => "file",
                Some("-d") => "dir",
                Some("-c") => "char",
                Some("-b") => "block",
                Some("-s") => "socket",
                Some("-p") => "pipe",
                Some("-l") => "symlink",
                Some(_) => {
                    return Err(LowerError::InvalidTextLine {
                        section: "file context",
                        line: line.to_owned(),
                    });
                }
            };

            cil_write!(self.w, "(filecon \"{regex}\" \"\" {cilmode} ")?;

            if context == "<<none>>" {
                cil_write!(self.w, "()")?;
            } else {
                self.context_string_to_cil(context)?;
            }

            cil_write!(self.w, ")\n")?;
        }

        Ok(())
    }

    //
    // ------------------------------------------------------------------------
    // netfilter_contexts
    // ------------------------------------------------------------------------
    //

    /// netfilter_contexts sections have no CIL rendering; a non-empty
    /// section is reported and dropped.
    pub(crate) fn netfilter_contexts_to_cil(&mut self, netfilter_contexts: &str) {
        if !netfilter_contexts.is_empty() {
            log::warn!("netfilter_contexts unsupported in CIL, dropping from output");
        }
    }
}
