use crate::core::{Bus, Z80Error};
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// LDI/LDD and the LDIR/LDDR repeat forms.
    /// (DE) <- (HL), HL and DE stepped, BC decremented; P/V = (BC != 0),
    /// H=0, N=0, S/Z/C preserved. 16T, or 21T when a repeat form rewinds
    /// PC for another iteration.
    pub(crate) fn op_ldi_ldd<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        opcode: u8,
        repeat: bool,
    ) -> Result<(), Z80Error> {
        let dec = (opcode & 0x08) != 0;
        let val = self.read8(bus, self.get_hl())?;
        self.write8(bus, self.get_de(), val)?;
        self.tick(2);

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_de(self.get_de().wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));

        let n = val.wrapping_add(self.a);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::C as u8);
        if self.get_bc() != 0 { f |= Flag::PV as u8; }
        // Undocumented: X = bit 3 of (val+A), Y = bit 1 of (val+A)
        if (n & 0x08) != 0 { f |= Flag::X as u8; }
        if (n & 0x02) != 0 { f |= Flag::Y as u8; }
        self.f = f;

        if repeat && self.get_bc() != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.tick(5);
        }
        Ok(())
    }

    /// CPI/CPD and the CPIR/CPDR repeat forms.
    /// Compare A with (HL), HL stepped, BC decremented; Z on match,
    /// P/V = (BC != 0), N=1, C preserved. Repeat forms loop while BC != 0
    /// and not Z. 16T, 21T when repeating.
    pub(crate) fn op_cpi_cpd<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        opcode: u8,
        repeat: bool,
    ) -> Result<(), Z80Error> {
        let dec = (opcode & 0x08) != 0;
        let val = self.read8(bus, self.get_hl())?;
        self.tick(5);

        let result = self.a.wrapping_sub(val);
        let half = (self.a & 0xF) < (val & 0xF);

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));

        let mut f = self.f & Flag::C as u8; // preserve C
        f |= Flag::N as u8;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if half { f |= Flag::H as u8; }
        if self.get_bc() != 0 { f |= Flag::PV as u8; }
        // Undocumented X/Y: n = result - H
        let n = result.wrapping_sub(if half { 1 } else { 0 });
        if (n & 0x08) != 0 { f |= Flag::X as u8; }
        if (n & 0x02) != 0 { f |= Flag::Y as u8; }
        self.f = f;

        if repeat && self.get_bc() != 0 && result != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.tick(5);
        }
        Ok(())
    }

    /// INI/IND and the INIR/INDR repeat forms.
    /// B decremented first, port (C) read into (HL), HL stepped.
    /// Z reflects the new B; N=1; C preserved. Repeat while B != 0.
    pub(crate) fn op_ini_ind<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        opcode: u8,
        repeat: bool,
    ) -> Result<(), Z80Error> {
        let dec = (opcode & 0x08) != 0;
        self.tick(1);
        self.b = self.b.wrapping_sub(1);
        let val = self.io_in(bus, self.c)?;
        self.write8(bus, self.get_hl(), val)?;

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_in_out_block_flags();

        if repeat && self.b != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.tick(5);
        }
        Ok(())
    }

    /// OUTI/OUTD and the OTIR/OTDR repeat forms.
    /// B decremented first, (HL) written to port (C), HL stepped.
    pub(crate) fn op_outi_outd<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        opcode: u8,
        repeat: bool,
    ) -> Result<(), Z80Error> {
        let dec = (opcode & 0x08) != 0;
        self.tick(1);
        self.b = self.b.wrapping_sub(1);
        let val = self.read8(bus, self.get_hl())?;
        self.io_out(bus, self.c, val)?;

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_in_out_block_flags();

        if repeat && self.b != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.tick(5);
        }
        Ok(())
    }

    fn set_in_out_block_flags(&mut self) {
        let mut f = self.f & Flag::C as u8;
        f |= Flag::N as u8;
        if self.b == 0 { f |= Flag::Z as u8; }
        if (self.b & 0x80) != 0 { f |= Flag::S as u8; }
        f |= self.b & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }
}
