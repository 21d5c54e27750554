// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Top-level driver.
//!
//! Emission order is fixed: base-policy preamble (default level when MLS is
//! off, the object role, handle-unknown, the mls flag), policy capabilities,
//! object contexts, genfs, the bundled text sections, then the scoped block
//! chain.

use std::io::Write;

use crate::cil_writeln;
use crate::emit::CilWriter;
use crate::error::{LowerError, Result};
use crate::policy::{PolicyDb, PolicyPackage, PolicyType};

use super::{DEFAULT_LEVEL, DEFAULT_OBJECT, Lowering};

/// Policy capability names, by capability bit. Taken from the sepol
/// capability table.
const POLICYCAP_NAMES: &[&str] = &[
    "network_peer_controls",
    "open_perms",
    "extended_socket_class",
    "always_check_network",
    "cgroup_seclabel",
    "nnp_nosuid_transition",
    "genfs_seclabel_symlinks",
    "ioctl_skip_cloexec",
];

// The base module doesn't have its name set, but the name seeds generated
// identifiers (optionals, synthesised attributes), so fix it up front: base
// policies become "base", and anything the CIL identifier grammar rejects
// becomes an underscore.
fn fix_module_name(pdb: &PolicyDb) -> String {
    let name = if pdb.policy_type == PolicyType::Base {
        "base"
    } else {
        pdb.name.as_str()
    };

    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Translates a decoded policy package to CIL on the given sink.
///
/// The package is read-only; all translation state (including the
/// synthesised-attribute counter) lives in the writer, so translating the
/// same package twice onto two sinks produces identical bytes.
pub fn module_package_to_cil<W: Write>(pkg: &PolicyPackage, sink: W) -> Result<()> {
    let mut lowering = Lowering::new(&pkg.policy, sink);
    lowering.run(pkg)
}

impl<'p, W: Write> Lowering<'p, W> {
    pub(crate) fn new(pdb: &'p PolicyDb, sink: W) -> Self {
        let name = fix_module_name(pdb);
        Self {
            pdb,
            w: CilWriter::new(sink),
            name,
        }
    }

    fn polcaps_to_cil(&mut self) -> Result<()> {
        let pdb = self.pdb;
        for bit in pdb.policycaps.iter() {
            let name = POLICYCAP_NAMES
                .get(bit as usize)
                .ok_or(LowerError::UnknownPolicyCapability(bit))?;
            cil_writeln!(self.w, 0, "(policycap {name})")?;
        }
        Ok(())
    }

    pub(crate) fn run(&mut self, pkg: &PolicyPackage) -> Result<()> {
        let pdb = self.pdb;

        if pdb.policy_type == PolicyType::Base && !pdb.mls {
            // A non-MLS base still needs a level for contexts: CIL requires
            // every context to carry a range even where it is ignored.
            cil_writeln!(self.w, 0, "(sensitivity s0)")?;
            cil_writeln!(self.w, 0, "(sensitivityorder (s0))")?;
            cil_writeln!(self.w, 0, "(level {DEFAULT_LEVEL} (s0))")?;
        }

        if pdb.policy_type == PolicyType::Base {
            cil_writeln!(self.w, 0, "(role {DEFAULT_OBJECT})")?;
            cil_writeln!(self.w, 0, "(handleunknown {})", pdb.handle_unknown.as_cil())?;
            cil_writeln!(self.w, 0, "(mls {})", if pdb.mls { "true" } else { "false" })?;
        }

        self.polcaps_to_cil()?;
        self.ocontexts_to_cil()?;
        self.genfscon_to_cil()?;
        self.seusers_to_cil(&pkg.seusers)?;
        self.netfilter_contexts_to_cil(&pkg.netfilter_contexts);
        self.user_extra_to_cil(&pkg.user_extra)?;
        self.file_contexts_to_cil(&pkg.file_contexts)?;
        self.blocks_to_cil()
    }
}
