use crate::core::{Bus, Z80Error};
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// Perform a CB rotate/shift operation on a value.
    /// op: 0=RLC, 1=RRC, 2=RL, 3=RR, 4=SLA, 5=SRA, 6=SLL(undoc), 7=SRL.
    /// Returns (result, new_flags): S, Z, PV(parity), C from the shifted
    /// bit, H=0, N=0.
    fn do_cb_rotate_shift(&self, op: u8, val: u8) -> (u8, u8) {
        let (result, carry) = match op {
            0 => {
                // RLC: rotate left circular
                let c = (val >> 7) & 1;
                ((val << 1) | c, c)
            }
            1 => {
                // RRC: rotate right circular
                let c = val & 1;
                ((val >> 1) | (c << 7), c)
            }
            2 => {
                // RL: rotate left through carry
                let old_c = if (self.f & Flag::C as u8) != 0 { 1 } else { 0 };
                let c = (val >> 7) & 1;
                ((val << 1) | old_c, c)
            }
            3 => {
                // RR: rotate right through carry
                let old_c = if (self.f & Flag::C as u8) != 0 { 0x80 } else { 0 };
                let c = val & 1;
                ((val >> 1) | old_c, c)
            }
            4 => {
                // SLA: shift left arithmetic
                let c = (val >> 7) & 1;
                (val << 1, c)
            }
            5 => {
                // SRA: shift right arithmetic (preserves sign)
                let c = val & 1;
                (((val as i8) >> 1) as u8, c)
            }
            6 => {
                // SLL: shift left logical, set bit 0 (undocumented)
                let c = (val >> 7) & 1;
                ((val << 1) | 1, c)
            }
            7 => {
                // SRL: shift right logical
                let c = val & 1;
                (val >> 1, c)
            }
            _ => unreachable!(),
        };

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(result) {
            f |= Flag::PV as u8;
        }
        if carry != 0 {
            f |= Flag::C as u8;
        }
        // H = 0, N = 0
        f |= result & (Flag::X as u8 | Flag::Y as u8);

        (result, f)
    }

    fn bit_test_flags(&mut self, val: u8, bit: u8) {
        let tested = val & (1 << bit);
        let mut f = self.f & Flag::C as u8; // preserve C
        f |= Flag::H as u8;
        if tested == 0 {
            f |= Flag::Z as u8;
            f |= Flag::PV as u8; // PV = Z for BIT
        }
        if bit == 7 && tested != 0 {
            f |= Flag::S as u8;
        }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// CB-prefixed instruction (non-indexed).
    /// Rotate/shift: see `do_cb_rotate_shift`.
    /// BIT: Z = !bit, S = bit set and b==7, PV = Z, H=1, N=0, C preserved.
    /// SET/RES: no flags affected.
    /// Register ops 8T; BIT (HL) 12T; rotate/shift/SET/RES (HL) 15T.
    pub(crate) fn execute_cb<B: Bus + ?Sized>(&mut self, bus: &mut B, op: u8) -> Result<(), Z80Error> {
        let xx = (op >> 6) & 0x03; // 0=rot/shift, 1=BIT, 2=RES, 3=SET
        let yyy = (op >> 3) & 0x07; // bit number or shift operation
        let zzz = op & 0x07; // register index

        if zzz == 6 {
            let addr = self.get_hl();
            let val = self.read8(bus, addr)?;
            self.tick(1);
            match xx {
                1 => self.bit_test_flags(val, yyy),
                _ => {
                    let result = match xx {
                        0 => {
                            let (r, f) = self.do_cb_rotate_shift(yyy, val);
                            self.f = f;
                            r
                        }
                        2 => val & !(1 << yyy),
                        3 => val | (1 << yyy),
                        _ => unreachable!(),
                    };
                    self.write8(bus, addr, result)?;
                }
            }
        } else {
            let val = self.get_reg8(zzz);
            match xx {
                0 => {
                    let (result, f) = self.do_cb_rotate_shift(yyy, val);
                    self.f = f;
                    self.set_reg8(zzz, result);
                }
                1 => self.bit_test_flags(val, yyy),
                2 => self.set_reg8(zzz, val & !(1 << yyy)),
                3 => self.set_reg8(zzz, val | (1 << yyy)),
                _ => unreachable!(),
            }
        }
        Ok(())
    }

    /// DD CB d op / FD CB d op: the operand is always (IX+d)/(IY+d), the
    /// address is pre-computed by the caller. For non-BIT ops with zzz != 6
    /// the transformed byte is also copied into register zzz
    /// (undocumented). BIT 20T; others 23T.
    pub(crate) fn execute_index_cb<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        op: u8,
        addr: u16,
    ) -> Result<(), Z80Error> {
        let xx = (op >> 6) & 0x03;
        let yyy = (op >> 3) & 0x07;
        let zzz = op & 0x07;

        let val = self.read8(bus, addr)?;
        self.tick(1);
        if xx == 1 {
            self.bit_test_flags(val, yyy);
            return Ok(());
        }

        let result = match xx {
            0 => {
                let (r, f) = self.do_cb_rotate_shift(yyy, val);
                self.f = f;
                r
            }
            2 => val & !(1 << yyy),
            3 => val | (1 << yyy),
            _ => unreachable!(),
        };
        if zzz != 6 {
            self.set_reg8(zzz, result);
        }
        self.write8(bus, addr, result)
    }
}
