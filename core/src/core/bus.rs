use thiserror::Error;

/// Fault raised by a bus implementation when an access cannot complete.
///
/// The CPU makes no assumption about why an address is unreachable (missing
/// RAM, write-protected ROM, unmapped port); the bus decides and reports the
/// offending address or port so the caller can diagnose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BusFault {
    #[error("memory address {addr:#06X} is unreadable")]
    UnreadableMemory { addr: u16 },
    #[error("memory address {addr:#06X} is unwritable (value {value:#04X})")]
    UnwritableMemory { addr: u16, value: u8 },
    #[error("I/O port {port:#04X} is unreadable")]
    UnreadablePort { port: u8 },
    #[error("I/O port {port:#04X} is unwritable (value {value:#04X})")]
    UnwritablePort { port: u8, value: u8 },
}

/// Which decode table a byte was being interpreted under when it missed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodePage {
    Base,
    Cb,
    Ed,
    Dd,
    Fd,
    DdCb,
    FdCb,
}

impl std::fmt::Display for DecodePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DecodePage::Base => "base",
            DecodePage::Cb => "CB",
            DecodePage::Ed => "ED",
            DecodePage::Dd => "DD",
            DecodePage::Fd => "FD",
            DecodePage::DdCb => "DDCB",
            DecodePage::FdCb => "FDCB",
        };
        f.write_str(name)
    }
}

/// Errors surfaced at the `step()` / disassembly boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Z80Error {
    #[error(transparent)]
    Bus(#[from] BusFault),
    #[error("unknown opcode {opcode:#04X} at {addr:#06X} ({page} page)")]
    UnknownOpcode {
        addr: u16,
        opcode: u8,
        page: DecodePage,
    },
}

/// What the CPU (and disassembler) should do with an undecodable byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvalidOpcodePolicy {
    /// Swallow the byte as a NOP, charge its fetch cost, keep going.
    NopSilently,
    #[default]
    RaiseError,
}

/// The caller-supplied 16-bit memory bus and 8-bit I/O bus.
///
/// Every access may fail; the CPU propagates faults to the `step()` caller
/// without committing anything beyond the accesses that already succeeded.
/// Accesses arrive strictly in architectural order, so a bus with
/// side-effecting reads (memory-mapped devices, port latches) sees exactly
/// the traffic real hardware would generate.
pub trait Bus {
    fn mem_read(&mut self, addr: u16) -> Result<u8, BusFault>;
    fn mem_write(&mut self, addr: u16, data: u8) -> Result<(), BusFault>;
    fn port_in(&mut self, port: u8) -> Result<u8, BusFault>;
    fn port_out(&mut self, port: u8, data: u8) -> Result<(), BusFault>;
}
