//! Optional per-step execution tracing.
//!
//! The tracer owns a line-oriented text sink and its own disassembler. It
//! is strictly best-effort: a sink failure is logged and execution carries
//! on untraced rather than surfacing an error to `step()`.

use std::io::Write;

use crate::core::{Bus, InvalidOpcodePolicy};
use crate::cpu::z80::{Flag, Z80};
use crate::disasm::Disassembler;

pub struct Tracer {
    sink: Box<dyn Write>,
    disasm: Disassembler,
}

impl Tracer {
    pub fn new(sink: Box<dyn Write>) -> Self {
        Self {
            sink,
            // Render undecodable bytes as ?!? instead of failing the trace.
            disasm: Disassembler::with_policy(InvalidOpcodePolicy::NopSilently),
        }
    }

    /// Marker line for RESET and interrupt entry.
    pub(crate) fn marker(&mut self, text: &str) {
        self.write_str(text);
        self.write_str("\r\n");
    }

    /// Disassembled line for the instruction about to execute.
    pub(crate) fn instruction<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) {
        match self.disasm.disassemble_at(bus, addr) {
            Ok(line) => self.write_str(&line),
            Err(err) => self.marker(&format!("{:04X} : <{}>", addr, err)),
        }
    }

    /// Register/flag dump after an instruction has executed.
    pub(crate) fn dump(&mut self, cpu: &Z80) {
        let flags = format!(
            "S{} Z{} H{} P{} N{} C{}",
            cpu.flag(Flag::S) as u8,
            cpu.flag(Flag::Z) as u8,
            cpu.flag(Flag::H) as u8,
            cpu.flag(Flag::PV) as u8,
            cpu.flag(Flag::N) as u8,
            cpu.flag(Flag::C) as u8,
        );
        let line = format!(
            "  PC={:04X} SP={:04X} IX={:04X} IY={:04X} I={:02X} R={:02X} \
             A={:02X} BC={:04X} DE={:04X} HL={:04X} F={:02X} [{}] \
             A'={:02X} F'={:02X} BC'={:02X}{:02X} DE'={:02X}{:02X} HL'={:02X}{:02X}\r\n",
            cpu.pc,
            cpu.sp,
            cpu.ix,
            cpu.iy,
            cpu.i,
            cpu.r,
            cpu.a,
            cpu.get_bc(),
            cpu.get_de(),
            cpu.get_hl(),
            cpu.f,
            flags,
            cpu.a_prime,
            cpu.f_prime,
            cpu.b_prime,
            cpu.c_prime,
            cpu.d_prime,
            cpu.e_prime,
            cpu.h_prime,
            cpu.l_prime,
        );
        self.write_str(&line);
    }

    pub(crate) fn flush(&mut self) {
        if let Err(err) = self.sink.flush() {
            log::warn!("trace sink flush failed: {err}");
        }
    }

    fn write_str(&mut self, s: &str) {
        if let Err(err) = self.sink.write_all(s.as_bytes()) {
            log::warn!("trace sink write failed: {err}");
        }
    }
}
