use crate::core::{Bus, Z80Error};
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// Evaluate a condition code (3 bits from opcode bits 5-3).
    /// 0=NZ, 1=Z, 2=NC, 3=C, 4=PO, 5=PE, 6=P, 7=M
    pub(crate) fn eval_condition(&self, cc: u8) -> bool {
        match cc {
            0 => (self.f & Flag::Z as u8) == 0,  // NZ
            1 => (self.f & Flag::Z as u8) != 0,  // Z
            2 => (self.f & Flag::C as u8) == 0,  // NC
            3 => (self.f & Flag::C as u8) != 0,  // C
            4 => (self.f & Flag::PV as u8) == 0, // PO (parity odd)
            5 => (self.f & Flag::PV as u8) != 0, // PE (parity even)
            6 => (self.f & Flag::S as u8) == 0,  // P (positive)
            7 => (self.f & Flag::S as u8) != 0,  // M (minus)
            _ => unreachable!(),
        }
    }

    /// JP nn: 10T.
    pub(crate) fn op_jp_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), Z80Error> {
        self.pc = self.imm16(bus)?;
        Ok(())
    }

    /// JP cc,nn: 10T whether taken or not.
    pub(crate) fn op_jp_cc_nn<B: Bus + ?Sized>(&mut self, bus: &mut B, opcode: u8) -> Result<(), Z80Error> {
        let cc = (opcode >> 3) & 0x07;
        let addr = self.imm16(bus)?;
        if self.eval_condition(cc) {
            self.pc = addr;
        }
        Ok(())
    }

    /// JR e: 12T.
    pub(crate) fn op_jr_e<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), Z80Error> {
        let disp = self.imm8(bus)? as i8;
        self.tick(5);
        self.pc = self.pc.wrapping_add(disp as i16 as u16);
        Ok(())
    }

    /// JR cc,e: 12T taken / 7T not taken (NZ/Z/NC/C only).
    pub(crate) fn op_jr_cc_e<B: Bus + ?Sized>(&mut self, bus: &mut B, opcode: u8) -> Result<(), Z80Error> {
        let cc = (opcode >> 3) & 0x03;
        let disp = self.imm8(bus)? as i8;
        if self.eval_condition(cc) {
            self.tick(5);
            self.pc = self.pc.wrapping_add(disp as i16 as u16);
        }
        Ok(())
    }

    /// DJNZ e: 13T taken / 8T not taken. B is decremented, branch if
    /// non-zero.
    pub(crate) fn op_djnz<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), Z80Error> {
        self.tick(1);
        self.b = self.b.wrapping_sub(1);
        let disp = self.imm8(bus)? as i8;
        if self.b != 0 {
            self.tick(5);
            self.pc = self.pc.wrapping_add(disp as i16 as u16);
        }
        Ok(())
    }

    /// CALL nn: 17T.
    pub(crate) fn op_call_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), Z80Error> {
        let addr = self.imm16(bus)?;
        self.tick(1);
        self.push16(bus, self.pc)?;
        self.pc = addr;
        Ok(())
    }

    /// CALL cc,nn: 17T taken / 10T not taken. The address bytes are read
    /// either way.
    pub(crate) fn op_call_cc_nn<B: Bus + ?Sized>(&mut self, bus: &mut B, opcode: u8) -> Result<(), Z80Error> {
        let cc = (opcode >> 3) & 0x07;
        let addr = self.imm16(bus)?;
        if self.eval_condition(cc) {
            self.tick(1);
            self.push16(bus, self.pc)?;
            self.pc = addr;
        }
        Ok(())
    }

    /// RET: 10T.
    pub(crate) fn op_ret<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), Z80Error> {
        self.pc = self.pop16(bus)?;
        Ok(())
    }

    /// RET cc: 11T taken / 5T not taken.
    pub(crate) fn op_ret_cc<B: Bus + ?Sized>(&mut self, bus: &mut B, opcode: u8) -> Result<(), Z80Error> {
        let cc = (opcode >> 3) & 0x07;
        self.tick(1);
        if self.eval_condition(cc) {
            self.pc = self.pop16(bus)?;
        }
        Ok(())
    }

    /// RST p: 11T. Target address = opcode & 0x38.
    pub(crate) fn op_rst<B: Bus + ?Sized>(&mut self, bus: &mut B, opcode: u8) -> Result<(), Z80Error> {
        let target = (opcode & 0x38) as u16;
        self.tick(1);
        self.push16(bus, self.pc)?;
        self.pc = target;
        Ok(())
    }

    /// DI: 4T.
    pub(crate) fn op_di(&mut self) {
        self.iff1 = false;
        self.iff2 = false;
    }

    /// EI: 4T. Interrupts are not sampled until after the following
    /// instruction.
    pub(crate) fn op_ei(&mut self) {
        self.iff1 = true;
        self.iff2 = true;
        self.ei_delay = true;
    }

    // --- ED control flow ---

    /// RETN/RETI: 14T. Pops PC and copies IFF2 into IFF1 (both opcodes
    /// behave identically; RETI additionally signals daisy-chained
    /// peripherals, which is the bus's concern).
    pub(crate) fn op_retn<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), Z80Error> {
        self.iff1 = self.iff2;
        self.pc = self.pop16(bus)?;
        Ok(())
    }

    /// IM 0/1/2: 8T. Bits 4-3 of the opcode select the mode; the
    /// undocumented aliases map onto the same three modes.
    pub(crate) fn op_im(&mut self, opcode: u8) {
        self.im = match (opcode >> 3) & 0x03 {
            0 | 1 => 0,
            2 => 1,
            3 => 2,
            _ => unreachable!(),
        };
    }

    // --- Byte I/O ---

    /// IN A,(n): 11T. No flags.
    pub(crate) fn op_in_a_n<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), Z80Error> {
        let port = self.imm8(bus)?;
        self.a = self.io_in(bus, port)?;
        Ok(())
    }

    /// OUT (n),A: 11T.
    pub(crate) fn op_out_n_a<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), Z80Error> {
        let port = self.imm8(bus)?;
        self.io_out(bus, port, self.a)
    }

    /// IN r,(C) (ED page): 12T. S, Z, PV(parity) from the input byte,
    /// H=0, N=0, C preserved. r=6 is the undocumented IN F,(C): flags
    /// only, value discarded.
    pub(crate) fn op_in_r_c<B: Bus + ?Sized>(&mut self, bus: &mut B, opcode: u8) -> Result<(), Z80Error> {
        let r = (opcode >> 3) & 0x07;
        let val = self.io_in(bus, self.c)?;
        if r != 6 {
            self.set_reg8(r, val);
        }
        let mut f = self.f & Flag::C as u8;
        if val == 0 { f |= Flag::Z as u8; }
        if (val & 0x80) != 0 { f |= Flag::S as u8; }
        if Self::get_parity(val) { f |= Flag::PV as u8; }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        Ok(())
    }

    /// OUT (C),r (ED page): 12T, no flags. r=6 is the undocumented
    /// OUT (C),0.
    pub(crate) fn op_out_c_r<B: Bus + ?Sized>(&mut self, bus: &mut B, opcode: u8) -> Result<(), Z80Error> {
        let r = (opcode >> 3) & 0x07;
        let val = if r == 6 { 0 } else { self.get_reg8(r) };
        self.io_out(bus, self.c, val)
    }
}
