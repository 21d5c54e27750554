// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Object-context lowering, dispatched on the target platform.
//!
//! Initial-SID names are not stored in policy packages; the hardcoded
//! per-platform tables below come from the respective kernels. The sidorder
//! statement lists SIDs in reverse of their input order.

use std::io::Write;

use crate::cil_write;
use crate::cil_writeln;
use crate::error::{LowerError, Result};
use crate::policy::{
    Context, InitialSid, MlsLevel, Ocontexts, SelinuxOcontexts, XenOcontexts,
};

use super::{DEFAULT_LEVEL, Lowering};
use super::names::sym_name;

/// Initial SID names, taken from the linux kernel. Order is significant.
pub(crate) const SELINUX_SID_TO_STRING: &[&str] = &[
    "null",
    "kernel",
    "security",
    "unlabeled",
    "fs",
    "file",
    "file_labels",
    "init",
    "any_socket",
    "port",
    "netif",
    "netmsg",
    "node",
    "igmp_packet",
    "icmp_socket",
    "tcp_socket",
    "sysctl_modprobe",
    "sysctl",
    "sysctl_fs",
    "sysctl_kernel",
    "sysctl_net",
    "sysctl_net_unix",
    "sysctl_vm",
    "sysctl_dev",
    "kmod",
    "policy",
    "scmp_packet",
    "devnull",
];

/// Initial SID names, taken from the xen kernel. Order is significant.
pub(crate) const XEN_SID_TO_STRING: &[&str] = &[
    "null",
    "xen",
    "dom0",
    "domio",
    "domxen",
    "unlabeled",
    "security",
    "ioport",
    "iomem",
    "irq",
    "device",
];

impl<'p, W: Write> Lowering<'p, W> {
    /// Writes an evaluated MLS level: bare sensitivity name when there are
    /// no categories, `(sens (c0 c1 ...))` otherwise.
    pub(crate) fn level_to_cil(&mut self, level: &MlsLevel) -> Result<()> {
        let pdb = self.pdb;
        let sens = sym_name(
            "sensitivity",
            &pdb.sensitivities.val_to_name,
            level.sens.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                kind: "sensitivity",
                value: level.sens,
            })?,
        )?;

        if level.cats.is_empty() {
            cil_write!(self.w, "{sens}")?;
            return Ok(());
        }

        cil_write!(self.w, "({sens} (")?;
        let mut first = true;
        for i in level.cats.iter() {
            if !first {
                cil_write!(self.w, " ")?;
            }
            let cat = sym_name("category", &pdb.categories.val_to_name, i)?;
            cil_write!(self.w, "{cat}")?;
            first = false;
        }
        cil_write!(self.w, "))")?;

        Ok(())
    }

    /// Writes a security context: `(user role type (LO HI))`. Non-MLS
    /// policies substitute the default level for both bounds.
    pub(crate) fn context_to_cil(&mut self, con: &Context) -> Result<()> {
        let pdb = self.pdb;
        let user = sym_name(
            "user",
            &pdb.users.val_to_name,
            con.user.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                kind: "user",
                value: con.user,
            })?,
        )?;
        let role = sym_name(
            "role",
            &pdb.roles.val_to_name,
            con.role.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                kind: "role",
                value: con.role,
            })?,
        )?;
        let ty = sym_name(
            "type",
            &pdb.types.val_to_name,
            con.ty.checked_sub(1).ok_or(LowerError::UnknownSymbolValue {
                kind: "type",
                value: con.ty,
            })?,
        )?;

        cil_write!(self.w, "({user} {role} {ty} (")?;

        if pdb.mls {
            self.level_to_cil(&con.range.low)?;
            cil_write!(self.w, " ")?;
            self.level_to_cil(&con.range.high)?;
        } else {
            cil_write!(self.w, "{DEFAULT_LEVEL} {DEFAULT_LEVEL}")?;
        }

        cil_write!(self.w, "))")?;

        Ok(())
    }

    fn isids_to_cil(&mut self, sid_to_string: &[&str], isids: &[InitialSid]) -> Result<()> {
        for isid in isids {
            let name = sid_to_string
                .get(isid.sid as usize)
                .ok_or(LowerError::UnknownInitialSid(isid.sid))?;
            cil_writeln!(self.w, 0, "(sid {name})")?;
            cil_write!(self.w, "(sidcontext {name} ")?;
            self.context_to_cil(&isid.context)?;
            cil_write!(self.w, ")\n")?;
        }

        // sidorder lists the SID names in reverse of the input order.
        if !isids.is_empty() {
            cil_write!(self.w, "(sidorder (")?;
            for isid in isids.iter().rev() {
                let name = sid_to_string
                    .get(isid.sid as usize)
                    .ok_or(LowerError::UnknownInitialSid(isid.sid))?;
                cil_write!(self.w, "{name} ")?;
            }
            cil_write!(self.w, "))\n")?;
        }

        Ok(())
    }

    fn selinux_ocontexts_to_cil(&mut self, ocon: &'p SelinuxOcontexts) -> Result<()> {
        self.isids_to_cil(SELINUX_SID_TO_STRING, &ocon.initial_sids)?;

        if !ocon.fs.is_empty() {
            log::warn!("'fscon' statement unsupported in CIL, dropping from output");
        }

        for port in &ocon.ports {
            let protocol = port.protocol.as_cil();
            if port.low == port.high {
                cil_write!(self.w, "(portcon {protocol} {} ", port.low)?;
            } else {
                cil_write!(self.w, "(portcon {protocol} ({} {}) ", port.low, port.high)?;
            }
            self.context_to_cil(&port.context)?;
            cil_write!(self.w, ")\n")?;
        }

        for netif in &ocon.netifs {
            cil_write!(self.w, "(netifcon {} ", netif.name)?;
            self.context_to_cil(&netif.if_context)?;
            cil_write!(self.w, " ")?;
            self.context_to_cil(&netif.packet_context)?;
            cil_write!(self.w, ")\n")?;
        }

        for node in &ocon.nodes {
            cil_write!(self.w, "(nodecon {} {} ", node.addr, node.mask)?;
            self.context_to_cil(&node.context)?;
            cil_write!(self.w, ")\n")?;
        }

        for fs_use in &ocon.fs_uses {
            cil_write!(self.w, "(fsuse {} {} ", fs_use.behavior.as_cil(), fs_use.name)?;
            self.context_to_cil(&fs_use.context)?;
            cil_write!(self.w, ")\n")?;
        }

        for node in &ocon.nodes6 {
            cil_write!(self.w, "(nodecon {} {} ", node.addr, node.mask)?;
            self.context_to_cil(&node.context)?;
            cil_write!(self.w, ")\n")?;
        }

        Ok(())
    }

    fn xen_ocontexts_to_cil(&mut self, ocon: &'p XenOcontexts) -> Result<()> {
        self.isids_to_cil(XEN_SID_TO_STRING, &ocon.initial_sids)?;

        for pirq in &ocon.pirqs {
            cil_write!(self.w, "(pirqcon {} ", pirq.pirq)?;
            self.context_to_cil(&pirq.context)?;
            cil_write!(self.w, ")\n")?;
        }

        for ioport in &ocon.ioports {
            if ioport.low == ioport.high {
                cil_write!(self.w, "(ioportcon {} ", ioport.low)?;
            } else {
                cil_write!(self.w, "(ioportcon ({} {}) ", ioport.low, ioport.high)?;
            }
            self.context_to_cil(&ioport.context)?;
            cil_write!(self.w, ")\n")?;
        }

        for iomem in &ocon.iomems {
            if iomem.low == iomem.high {
                cil_write!(self.w, "(iomemcon {:#X} ", iomem.low)?;
            } else {
                cil_write!(self.w, "(iomemcon ({:#X} {:#X}) ", iomem.low, iomem.high)?;
            }
            self.context_to_cil(&iomem.context)?;
            cil_write!(self.w, ")\n")?;
        }

        for pcid in &ocon.pcidevices {
            cil_write!(self.w, "(pcidevicecon {:#x} ", pcid.device)?;
            self.context_to_cil(&pcid.context)?;
            cil_write!(self.w, ")\n")?;
        }

        Ok(())
    }

    pub(crate) fn ocontexts_to_cil(&mut self) -> Result<()> {
        let pdb = self.pdb;
        match &pdb.ocontexts {
            Ocontexts::Selinux(ocon) => self.selinux_ocontexts_to_cil(ocon),
            Ocontexts::Xen(ocon) => self.xen_ocontexts_to_cil(ocon),
        }
    }

    pub(crate) fn genfscon_to_cil(&mut self) -> Result<()> {
        let pdb = self.pdb;
        for genfs in &pdb.genfs {
            for entry in &genfs.entries {
                cil_write!(self.w, "(genfscon {} {} ", genfs.fstype, entry.path)?;
                self.context_to_cil(&entry.context)?;
                cil_write!(self.w, ")\n")?;
            }
        }
        Ok(())
    }
}
