pub mod bus;

pub use bus::{Bus, BusFault, DecodePage, InvalidOpcodePolicy, Z80Error};
