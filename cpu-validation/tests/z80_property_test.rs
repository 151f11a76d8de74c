//! Randomized algebraic laws of the instruction set, driven through the
//! recording bus.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use zeta_core::cpu::z80::{Flag, Z80};
use zeta_cpu_validation::TracingBus;

fn fresh(program: &[u8]) -> (Z80, TracingBus) {
    let mut bus = TracingBus::new();
    bus.load(0, program);
    (Z80::new(), bus)
}

fn run_program(cpu: &mut Z80, bus: &mut TracingBus, instructions: usize) {
    for _ in 0..instructions {
        cpu.step(bus).expect("step faulted");
    }
}

#[test]
fn cpl_twice_is_identity() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..256 {
        let a = rng.next_u32() as u8;
        let (mut cpu, mut bus) = fresh(&[0x2F, 0x2F]);
        cpu.a = a;
        cpu.f = rng.next_u32() as u8;
        run_program(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.a, a, "CPL;CPL must restore A={a:#04X}");
    }
}

#[test]
fn neg_twice_is_identity_and_flags_match() {
    let mut rng = StdRng::seed_from_u64(0xDEC0);
    for _ in 0..256 {
        let a = rng.next_u32() as u8;
        let (mut cpu, mut bus) = fresh(&[0xED, 0x44, 0xED, 0x44]);
        cpu.a = a;
        cpu.f = rng.next_u32() as u8;

        cpu.step(&mut bus).expect("step faulted");
        assert_eq!(
            cpu.flag(Flag::C),
            a != 0,
            "after NEG of {a:#04X}, C = (A != 0)"
        );
        assert_eq!(
            cpu.flag(Flag::PV),
            a == 0x80,
            "after NEG of {a:#04X}, P/V = (A == 0x80)"
        );

        cpu.step(&mut bus).expect("step faulted");
        assert_eq!(cpu.a, a, "NEG;NEG must restore A={a:#04X}");
    }
}

#[test]
fn eight_rlcs_are_identity_and_carries_count_bits() {
    let mut rng = StdRng::seed_from_u64(0x0507);
    let program: Vec<u8> = std::iter::repeat([0xCB, 0x07]).take(8).flatten().collect();
    for _ in 0..64 {
        let a = rng.next_u32() as u8;
        let (mut cpu, mut bus) = fresh(&program);
        cpu.a = a;
        cpu.f = rng.next_u32() as u8;

        let mut carries = 0u32;
        for _ in 0..8 {
            cpu.step(&mut bus).expect("step faulted");
            carries += cpu.flag(Flag::C) as u32;
        }
        assert_eq!(cpu.a, a, "eight RLC A leave A={a:#04X} unchanged");
        assert_eq!(carries, a.count_ones(), "C emits each set bit once");
    }
}

fn to_bcd(n: u32) -> u8 {
    (((n / 10) << 4) | (n % 10)) as u8
}

#[test]
fn daa_fixes_up_every_bcd_addition() {
    for x in 0..100u32 {
        for y in 0..100u32 {
            let (mut cpu, mut bus) = fresh(&[0x80, 0x27]); // ADD A,B; DAA
            cpu.a = to_bcd(x);
            cpu.b = to_bcd(y);
            run_program(&mut cpu, &mut bus, 2);

            let sum = x + y;
            assert_eq!(
                cpu.a,
                to_bcd(sum % 100),
                "BCD {x:02} + {y:02} adjusted digits"
            );
            assert_eq!(
                cpu.flag(Flag::C),
                sum >= 100,
                "BCD {x:02} + {y:02} decimal carry"
            );
            assert_eq!(cpu.flag(Flag::Z), sum % 100 == 0);
        }
    }
}

#[test]
fn daa_fixes_up_every_bcd_subtraction() {
    for x in 0..100u32 {
        for y in 0..100u32 {
            let (mut cpu, mut bus) = fresh(&[0x90, 0x27]); // SUB B; DAA
            cpu.a = to_bcd(x);
            cpu.b = to_bcd(y);
            run_program(&mut cpu, &mut bus, 2);

            let diff = (100 + x - y) % 100;
            assert_eq!(
                cpu.a,
                to_bcd(diff),
                "BCD {x:02} - {y:02} adjusted digits"
            );
            assert_eq!(
                cpu.flag(Flag::C),
                y > x,
                "BCD {x:02} - {y:02} decimal borrow"
            );
        }
    }
}

#[test]
fn push_pop_round_trips_random_words() {
    let mut rng = StdRng::seed_from_u64(0x57AC);
    for _ in 0..128 {
        let word = rng.next_u32() as u16;
        let (mut cpu, mut bus) = fresh(&[0xC5, 0xE1]); // PUSH BC; POP HL
        cpu.sp = 0x9000;
        cpu.set_bc(word);
        run_program(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.get_hl(), word);
        assert_eq!(cpu.sp, 0x9000);
    }
}
