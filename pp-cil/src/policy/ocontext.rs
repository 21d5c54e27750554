// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jamie Adams (a.k.a, Imodium Operator)
// ============================================================================
//! Object contexts and genfs entries.
//!
//! The context-kind table differs per target platform, so the whole table is
//! a platform-keyed variant rather than a flat array with platform-dependent
//! index meanings. Entry order inside each list is emission order; initial
//! SID order additionally determines the sidorder statement.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::symbols::Context;

#[derive(Debug, Clone)]
pub enum Ocontexts {
    Selinux(SelinuxOcontexts),
    Xen(XenOcontexts),
}

//
// =============================================================================
// SELinux object contexts
// =============================================================================
//

#[derive(Debug, Clone, Default)]
pub struct SelinuxOcontexts {
    pub initial_sids: Vec<InitialSid>,
    /// fscon entries; recognised but not expressible in CIL.
    pub fs: Vec<FsContext>,
    pub ports: Vec<PortContext>,
    pub netifs: Vec<NetifContext>,
    pub nodes: Vec<NodeContext>,
    pub fs_uses: Vec<FsUseContext>,
    pub nodes6: Vec<Node6Context>,
}

/// An initial SID: the index into the platform SID name table plus its
/// context. SID names are not stored in policy packages.
#[derive(Debug, Clone)]
pub struct InitialSid {
    pub sid: u32,
    pub context: Context,
}

#[derive(Debug, Clone)]
pub struct FsContext {
    pub name: String,
    pub contexts: [Context; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    #[must_use]
    pub const fn as_cil(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PortContext {
    pub protocol: Protocol,
    pub low: u16,
    pub high: u16,
    pub context: Context,
}

#[derive(Debug, Clone)]
pub struct NetifContext {
    pub name: String,
    pub if_context: Context,
    pub packet_context: Context,
}

#[derive(Debug, Clone)]
pub struct NodeContext {
    pub addr: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub context: Context,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsUseBehavior {
    Xattr,
    Trans,
    Task,
}

impl FsUseBehavior {
    #[must_use]
    pub const fn as_cil(self) -> &'static str {
        match self {
            Self::Xattr => "xattr",
            Self::Trans => "trans",
            Self::Task => "task",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FsUseContext {
    pub behavior: FsUseBehavior,
    pub name: String,
    pub context: Context,
}

#[derive(Debug, Clone)]
pub struct Node6Context {
    pub addr: Ipv6Addr,
    pub mask: Ipv6Addr,
    pub context: Context,
}

//
// =============================================================================
// Xen object contexts
// =============================================================================
//

#[derive(Debug, Clone, Default)]
pub struct XenOcontexts {
    pub initial_sids: Vec<InitialSid>,
    pub pirqs: Vec<PirqContext>,
    pub ioports: Vec<IoportContext>,
    pub iomems: Vec<IomemContext>,
    pub pcidevices: Vec<PciDeviceContext>,
}

#[derive(Debug, Clone)]
pub struct PirqContext {
    pub pirq: u32,
    pub context: Context,
}

#[derive(Debug, Clone)]
pub struct IoportContext {
    pub low: u32,
    pub high: u32,
    pub context: Context,
}

#[derive(Debug, Clone)]
pub struct IomemContext {
    pub low: u64,
    pub high: u64,
    pub context: Context,
}

#[derive(Debug, Clone)]
pub struct PciDeviceContext {
    pub device: u32,
    pub context: Context,
}

//
// =============================================================================
// genfs
// =============================================================================
//

#[derive(Debug, Clone)]
pub struct GenfsEntry {
    pub path: String,
    pub context: Context,
}

#[derive(Debug, Clone)]
pub struct Genfs {
    pub fstype: String,
    pub entries: Vec<GenfsEntry>,
}
