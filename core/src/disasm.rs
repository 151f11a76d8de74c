//! Z80 disassembler.
//!
//! Static decoding of the same five opcode pages the CPU executes, producing
//! one formatted line per instruction. The disassembler only reads through
//! the bus and keeps its own cursor; it never touches CPU state.

use crate::core::{Bus, DecodePage, InvalidOpcodePolicy, Z80Error};

const R8: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
const RP: [&str; 4] = ["BC", "DE", "HL", "SP"];
const RP_AF: [&str; 4] = ["BC", "DE", "HL", "AF"];
const CC: [&str; 8] = ["NZ", "Z", "NC", "C", "PO", "PE", "P", "M"];
const ALU: [&str; 8] = ["ADD A,", "ADC A,", "SUB ", "SBC A,", "AND ", "XOR ", "OR ", "CP "];
const ROT: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SLL", "SRL"];

#[derive(Clone, Copy, Debug, PartialEq)]
enum IndexReg {
    Ix,
    Iy,
}

impl IndexReg {
    fn name(self) -> &'static str {
        match self {
            IndexReg::Ix => "IX",
            IndexReg::Iy => "IY",
        }
    }

    fn half(self, hi: bool) -> &'static str {
        match (self, hi) {
            (IndexReg::Ix, true) => "IXH",
            (IndexReg::Ix, false) => "IXL",
            (IndexReg::Iy, true) => "IYH",
            (IndexReg::Iy, false) => "IYL",
        }
    }
}

/// Decodes one instruction per call, formatting lines of the shape
/// `ADDR : byte list : mnemonic` terminated with CRLF. The cursor advances
/// with each call, so `disassemble_many` walks a listing naturally.
pub struct Disassembler {
    pub policy: InvalidOpcodePolicy,
    addr: u16,
}

impl Default for Disassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Disassembler {
    pub fn new() -> Self {
        Self {
            policy: InvalidOpcodePolicy::default(),
            addr: 0,
        }
    }

    pub fn with_policy(policy: InvalidOpcodePolicy) -> Self {
        Self { policy, addr: 0 }
    }

    /// Decode exactly one instruction at `addr` and return the formatted
    /// line. The cursor is left after the instruction.
    pub fn disassemble_at<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        addr: u16,
    ) -> Result<String, Z80Error> {
        self.addr = addr;
        let mut bytes = Vec::with_capacity(4);
        let mnemonic = self.decode(bus, &mut bytes)?;
        let hex = bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(format!("{:04X} : {:<13} : {}\r\n", addr, hex, mnemonic))
    }

    /// Decode `n` consecutive instructions starting at `addr`.
    pub fn disassemble_many<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        addr: u16,
        n: usize,
    ) -> Result<Vec<String>, Z80Error> {
        let mut lines = Vec::with_capacity(n);
        let mut at = addr;
        for _ in 0..n {
            lines.push(self.disassemble_at(bus, at)?);
            at = self.addr;
        }
        Ok(lines)
    }

    /// Decode every instruction from `from` through `to` inclusive. The
    /// trailing instruction may extend past `to`.
    pub fn disassemble_range<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        from: u16,
        to: u16,
    ) -> Result<Vec<String>, Z80Error> {
        let mut lines = Vec::new();
        let mut at = from;
        while at <= to {
            lines.push(self.disassemble_at(bus, at)?);
            if self.addr <= at {
                break; // wrapped around the address space
            }
            at = self.addr;
        }
        Ok(lines)
    }

    // --- Byte fetching ---

    fn fetch8<B: Bus + ?Sized>(&mut self, bus: &mut B, bytes: &mut Vec<u8>) -> Result<u8, Z80Error> {
        let b = bus.mem_read(self.addr)?;
        self.addr = self.addr.wrapping_add(1);
        bytes.push(b);
        Ok(b)
    }

    fn fetch16<B: Bus + ?Sized>(&mut self, bus: &mut B, bytes: &mut Vec<u8>) -> Result<u16, Z80Error> {
        let lo = self.fetch8(bus, bytes)?;
        let hi = self.fetch8(bus, bytes)?;
        Ok(((hi as u16) << 8) | lo as u16)
    }

    /// Relative branch operand: signed displacement plus the resolved
    /// absolute target.
    fn rel<B: Bus + ?Sized>(&mut self, bus: &mut B, bytes: &mut Vec<u8>) -> Result<String, Z80Error> {
        let d = self.fetch8(bus, bytes)? as i8;
        let target = self.addr.wrapping_add(d as i16 as u16);
        Ok(format!("{:+} (\u{2192} {:04X}h)", d, target))
    }

    // --- Operand naming ---

    /// The (HL)/(IX+d)/(IY+d) memory operand; fetches the displacement in
    /// indexed modes.
    fn mem_opnd<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        bytes: &mut Vec<u8>,
        idx: Option<IndexReg>,
    ) -> Result<String, Z80Error> {
        match idx {
            None => Ok("(HL)".to_string()),
            Some(ix) => {
                let d = self.fetch8(bus, bytes)? as i8;
                Ok(format!("({}{:+})", ix.name(), d))
            }
        }
    }

    /// Name of 8-bit register operand `i` (never 6). Under a prefix, H and
    /// L become the index-register halves unless the instruction also uses
    /// the memory operand.
    fn r_name(i: u8, idx: Option<IndexReg>, mem_involved: bool) -> String {
        match (i, idx, mem_involved) {
            (4, Some(ix), false) => ix.half(true).to_string(),
            (5, Some(ix), false) => ix.half(false).to_string(),
            _ => R8[i as usize].to_string(),
        }
    }

    fn hl_name(idx: Option<IndexReg>) -> &'static str {
        match idx {
            None => "HL",
            Some(ix) => ix.name(),
        }
    }

    fn rp_name(p: u8, idx: Option<IndexReg>) -> String {
        if p == 2 {
            Self::hl_name(idx).to_string()
        } else {
            RP[p as usize].to_string()
        }
    }

    fn rp_af_name(p: u8, idx: Option<IndexReg>) -> String {
        if p == 2 {
            Self::hl_name(idx).to_string()
        } else {
            RP_AF[p as usize].to_string()
        }
    }

    // --- Pages ---

    fn decode<B: Bus + ?Sized>(&mut self, bus: &mut B, bytes: &mut Vec<u8>) -> Result<String, Z80Error> {
        let op = self.fetch8(bus, bytes)?;
        match op {
            0xCB => self.decode_cb(bus, bytes),
            0xED => self.decode_ed(bus, bytes),
            0xDD => self.decode_indexed(bus, bytes, IndexReg::Ix),
            0xFD => self.decode_indexed(bus, bytes, IndexReg::Iy),
            _ => self.decode_base(bus, bytes, op, None),
        }
    }

    fn decode_indexed<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        bytes: &mut Vec<u8>,
        idx: IndexReg,
    ) -> Result<String, Z80Error> {
        // A prefix followed by another prefix contributes nothing; render
        // the orphan byte as data and let the next line pick up from the
        // second prefix.
        let next = bus.mem_read(self.addr)?;
        if next == 0xDD || next == 0xFD {
            let orphan = *bytes.last().expect("prefix byte was fetched");
            return Ok(format!("DB #{:02X}h", orphan));
        }

        let op = self.fetch8(bus, bytes)?;
        match op {
            0xCB => self.decode_index_cb(bus, bytes, idx),
            // Hardware drops a DD/FD that precedes ED.
            0xED => self.decode_ed(bus, bytes),
            _ => self.decode_base(bus, bytes, op, Some(idx)),
        }
    }

    fn decode_base<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        bytes: &mut Vec<u8>,
        op: u8,
        idx: Option<IndexReg>,
    ) -> Result<String, Z80Error> {
        let x = op >> 6;
        let y = (op >> 3) & 0x07;
        let z = op & 0x07;
        let p = y >> 1;
        let q = y & 1;

        let text = match x {
            0 => match z {
                0 => match y {
                    0 => "NOP".to_string(),
                    1 => "EX AF,AF'".to_string(),
                    2 => format!("DJNZ {}", self.rel(bus, bytes)?),
                    3 => format!("JR {}", self.rel(bus, bytes)?),
                    _ => format!("JR {},{}", CC[(y - 4) as usize], self.rel(bus, bytes)?),
                },
                1 => {
                    if q == 0 {
                        let nn = self.fetch16(bus, bytes)?;
                        format!("LD {},{:04X}h", Self::rp_name(p, idx), nn)
                    } else {
                        format!("ADD {},{}", Self::hl_name(idx), Self::rp_name(p, idx))
                    }
                }
                2 => match (q, p) {
                    (0, 0) => "LD (BC),A".to_string(),
                    (0, 1) => "LD (DE),A".to_string(),
                    (0, 2) => {
                        let nn = self.fetch16(bus, bytes)?;
                        format!("LD ({:04X}h),{}", nn, Self::hl_name(idx))
                    }
                    (0, 3) => {
                        let nn = self.fetch16(bus, bytes)?;
                        format!("LD ({:04X}h),A", nn)
                    }
                    (1, 0) => "LD A,(BC)".to_string(),
                    (1, 1) => "LD A,(DE)".to_string(),
                    (1, 2) => {
                        let nn = self.fetch16(bus, bytes)?;
                        format!("LD {},({:04X}h)", Self::hl_name(idx), nn)
                    }
                    _ => {
                        let nn = self.fetch16(bus, bytes)?;
                        format!("LD A,({:04X}h)", nn)
                    }
                },
                3 => {
                    let op_name = if q == 0 { "INC" } else { "DEC" };
                    format!("{} {}", op_name, Self::rp_name(p, idx))
                }
                4 | 5 => {
                    let op_name = if z == 4 { "INC" } else { "DEC" };
                    if y == 6 {
                        format!("{} {}", op_name, self.mem_opnd(bus, bytes, idx)?)
                    } else {
                        format!("{} {}", op_name, Self::r_name(y, idx, false))
                    }
                }
                6 => {
                    // LD r,n; for the indexed memory form the displacement
                    // precedes the immediate.
                    if y == 6 {
                        let dst = self.mem_opnd(bus, bytes, idx)?;
                        let n = self.fetch8(bus, bytes)?;
                        format!("LD {},#{:02X}h", dst, n)
                    } else {
                        let n = self.fetch8(bus, bytes)?;
                        format!("LD {},#{:02X}h", Self::r_name(y, idx, false), n)
                    }
                }
                _ => ["RLCA", "RRCA", "RLA", "RRA", "DAA", "CPL", "SCF", "CCF"][y as usize]
                    .to_string(),
            },
            1 => {
                if op == 0x76 {
                    "HALT".to_string()
                } else if z == 6 {
                    let src = self.mem_opnd(bus, bytes, idx)?;
                    format!("LD {},{}", Self::r_name(y, idx, true), src)
                } else if y == 6 {
                    let dst = self.mem_opnd(bus, bytes, idx)?;
                    format!("LD {},{}", dst, Self::r_name(z, idx, true))
                } else {
                    format!(
                        "LD {},{}",
                        Self::r_name(y, idx, false),
                        Self::r_name(z, idx, false)
                    )
                }
            }
            2 => {
                let operand = if z == 6 {
                    self.mem_opnd(bus, bytes, idx)?
                } else {
                    Self::r_name(z, idx, false)
                };
                format!("{}{}", ALU[y as usize], operand)
            }
            _ => match z {
                0 => format!("RET {}", CC[y as usize]),
                1 => {
                    if q == 0 {
                        format!("POP {}", Self::rp_af_name(p, idx))
                    } else {
                        match p {
                            0 => "RET".to_string(),
                            1 => "EXX".to_string(),
                            2 => format!("JP ({})", Self::hl_name(idx)),
                            _ => format!("LD SP,{}", Self::hl_name(idx)),
                        }
                    }
                }
                2 => {
                    let nn = self.fetch16(bus, bytes)?;
                    format!("JP {},{:04X}h", CC[y as usize], nn)
                }
                3 => match y {
                    0 => {
                        let nn = self.fetch16(bus, bytes)?;
                        format!("JP {:04X}h", nn)
                    }
                    2 => {
                        let n = self.fetch8(bus, bytes)?;
                        format!("OUT (#{:02X}h),A", n)
                    }
                    3 => {
                        let n = self.fetch8(bus, bytes)?;
                        format!("IN A,(#{:02X}h)", n)
                    }
                    4 => format!("EX (SP),{}", Self::hl_name(idx)),
                    5 => "EX DE,HL".to_string(),
                    6 => "DI".to_string(),
                    _ => "EI".to_string(),
                },
                4 => {
                    let nn = self.fetch16(bus, bytes)?;
                    format!("CALL {},{:04X}h", CC[y as usize], nn)
                }
                5 => {
                    if q == 0 {
                        format!("PUSH {}", Self::rp_af_name(p, idx))
                    } else {
                        let nn = self.fetch16(bus, bytes)?;
                        format!("CALL {:04X}h", nn)
                    }
                }
                6 => {
                    let n = self.fetch8(bus, bytes)?;
                    format!("{}#{:02X}h", ALU[y as usize], n)
                }
                _ => format!("RST {:02X}h", op & 0x38),
            },
        };
        Ok(text)
    }

    fn decode_cb<B: Bus + ?Sized>(&mut self, bus: &mut B, bytes: &mut Vec<u8>) -> Result<String, Z80Error> {
        let op = self.fetch8(bus, bytes)?;
        let x = op >> 6;
        let y = (op >> 3) & 0x07;
        let z = op & 0x07;
        let operand = R8[z as usize];
        Ok(match x {
            0 => format!("{} {}", ROT[y as usize], operand),
            1 => format!("BIT {},{}", y, operand),
            2 => format!("RES {},{}", y, operand),
            _ => format!("SET {},{}", y, operand),
        })
    }

    fn decode_index_cb<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        bytes: &mut Vec<u8>,
        idx: IndexReg,
    ) -> Result<String, Z80Error> {
        // Displacement first, then the sub-opcode.
        let d = self.fetch8(bus, bytes)? as i8;
        let op = self.fetch8(bus, bytes)?;
        let x = op >> 6;
        let y = (op >> 3) & 0x07;
        let z = op & 0x07;
        let operand = format!("({}{:+})", idx.name(), d);

        Ok(match (x, z) {
            (1, _) => format!("BIT {},{}", y, operand),
            // z != 6 names the register receiving the undocumented copy.
            (0, 6) => format!("{} {}", ROT[y as usize], operand),
            (0, _) => format!("{} {},{}", ROT[y as usize], operand, R8[z as usize]),
            (2, 6) => format!("RES {},{}", y, operand),
            (2, _) => format!("RES {},{},{}", y, operand, R8[z as usize]),
            (3, 6) => format!("SET {},{}", y, operand),
            _ => format!("SET {},{},{}", y, operand, R8[z as usize]),
        })
    }

    fn decode_ed<B: Bus + ?Sized>(&mut self, bus: &mut B, bytes: &mut Vec<u8>) -> Result<String, Z80Error> {
        let at = self.addr;
        let op = self.fetch8(bus, bytes)?;
        let text = match op {
            0x47 => "LD I,A".to_string(),
            0x4F => "LD R,A".to_string(),
            0x57 => "LD A,I".to_string(),
            0x5F => "LD A,R".to_string(),
            0x67 => "RRD".to_string(),
            0x6F => "RLD".to_string(),

            0xA0 => "LDI".to_string(),
            0xA8 => "LDD".to_string(),
            0xB0 => "LDIR".to_string(),
            0xB8 => "LDDR".to_string(),
            0xA1 => "CPI".to_string(),
            0xA9 => "CPD".to_string(),
            0xB1 => "CPIR".to_string(),
            0xB9 => "CPDR".to_string(),
            0xA2 => "INI".to_string(),
            0xAA => "IND".to_string(),
            0xB2 => "INIR".to_string(),
            0xBA => "INDR".to_string(),
            0xA3 => "OUTI".to_string(),
            0xAB => "OUTD".to_string(),
            0xB3 => "OTIR".to_string(),
            0xBB => "OTDR".to_string(),

            op if (op & 0xC7) == 0x40 => {
                let r = (op >> 3) & 0x07;
                if r == 6 {
                    "IN F,(C)".to_string()
                } else {
                    format!("IN {},(C)", R8[r as usize])
                }
            }
            op if (op & 0xC7) == 0x41 => {
                let r = (op >> 3) & 0x07;
                if r == 6 {
                    "OUT (C),0".to_string()
                } else {
                    format!("OUT (C),{}", R8[r as usize])
                }
            }
            op if (op & 0xCF) == 0x42 => format!("SBC HL,{}", RP[((op >> 4) & 3) as usize]),
            op if (op & 0xCF) == 0x4A => format!("ADC HL,{}", RP[((op >> 4) & 3) as usize]),
            op if (op & 0xCF) == 0x43 => {
                let nn = self.fetch16(bus, bytes)?;
                format!("LD ({:04X}h),{}", nn, RP[((op >> 4) & 3) as usize])
            }
            op if (op & 0xCF) == 0x4B => {
                let nn = self.fetch16(bus, bytes)?;
                format!("LD {},({:04X}h)", RP[((op >> 4) & 3) as usize], nn)
            }
            op if (op & 0xC7) == 0x44 => "NEG".to_string(),
            0x4D => "RETI".to_string(),
            op if (op & 0xC7) == 0x45 => "RETN".to_string(),
            op if (op & 0xC7) == 0x46 => {
                let mode = match (op >> 3) & 0x03 {
                    0 | 1 => 0,
                    2 => 1,
                    _ => 2,
                };
                format!("IM {}", mode)
            }

            _ => match self.policy {
                InvalidOpcodePolicy::NopSilently => "?!?".to_string(),
                InvalidOpcodePolicy::RaiseError => {
                    return Err(Z80Error::UnknownOpcode {
                        addr: at,
                        opcode: op,
                        page: DecodePage::Ed,
                    });
                }
            },
        };
        Ok(text)
    }
}
