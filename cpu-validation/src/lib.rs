//! Validation harness: a recording bus plus the JSON single-step test
//! vector types (SingleStepTests Z80 layout). Vector files are optional;
//! the runner skips when none are installed.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use zeta_core::core::{Bus, BusFault};

// --- TracingBus: flat 64KB memory with per-access recording ---

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusOp {
    MemRead,
    MemWrite,
    PortIn,
    PortOut,
}

#[derive(Clone, Debug)]
pub struct BusAccess {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

pub struct TracingBus {
    pub memory: Box<[u8; 0x10000]>,
    pub ports: [u8; 0x100],
    pub accesses: Vec<BusAccess>,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            ports: [0; 0x100],
            accesses: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn clear_accesses(&mut self) {
        self.accesses.clear();
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    fn mem_read(&mut self, addr: u16) -> Result<u8, BusFault> {
        let data = self.memory[addr as usize];
        self.accesses.push(BusAccess {
            addr,
            data,
            op: BusOp::MemRead,
        });
        Ok(data)
    }

    fn mem_write(&mut self, addr: u16, data: u8) -> Result<(), BusFault> {
        self.memory[addr as usize] = data;
        self.accesses.push(BusAccess {
            addr,
            data,
            op: BusOp::MemWrite,
        });
        Ok(())
    }

    fn port_in(&mut self, port: u8) -> Result<u8, BusFault> {
        let data = self.ports[port as usize];
        self.accesses.push(BusAccess {
            addr: port as u16,
            data,
            op: BusOp::PortIn,
        });
        Ok(data)
    }

    fn port_out(&mut self, port: u8, data: u8) -> Result<(), BusFault> {
        self.ports[port as usize] = data;
        self.accesses.push(BusAccess {
            addr: port as u16,
            data,
            op: BusOp::PortOut,
        });
        Ok(())
    }
}

// --- JSON test vector types (SingleStepTests Z80 format) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80TestCase {
    pub name: String,
    pub initial: Z80CpuState,
    #[serde(rename = "final")]
    pub final_state: Z80CpuState,
    /// One entry per T-state: (address, data, kind).
    pub cycles: Vec<(Option<u16>, Option<u8>, String)>,
    #[serde(default)]
    pub ports: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    pub i: u8,
    pub r: u8,
    pub ix: u16,
    pub iy: u16,
    #[serde(rename = "af_")]
    pub af_prime: u16,
    #[serde(rename = "bc_")]
    pub bc_prime: u16,
    #[serde(rename = "de_")]
    pub de_prime: u16,
    #[serde(rename = "hl_")]
    pub hl_prime: u16,
    pub im: u8,
    pub iff1: u8,
    pub iff2: u8,
    #[serde(default)]
    pub ei: u8,
    #[serde(default)]
    pub wz: u16,
    #[serde(default)]
    pub p: u8,
    #[serde(default)]
    pub q: u8,
    pub ram: Vec<(u16, u8)>,
}

/// Load a vector file, transparently un-gzipping `.json.gz`.
pub fn load_test_cases(path: &Path) -> std::io::Result<Vec<Z80TestCase>> {
    let mut raw = String::new();
    if path.extension().is_some_and(|e| e == "gz") {
        GzDecoder::new(File::open(path)?).read_to_string(&mut raw)?;
    } else {
        File::open(path)?.read_to_string(&mut raw)?;
    }
    serde_json::from_str(&raw).map_err(std::io::Error::other)
}
