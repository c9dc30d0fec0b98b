//! 6502 CPU emulation for the NES (Ricoh 2A03).
//!
//! Implements the official instruction set as a 256-entry decode table of
//! (mnemonic, addressing mode) records plus an interpreter over the
//! [`Bus`](crate::bus::Bus) trait. The 2A03 has no decimal adder, so ADC/SBC
//! are always binary even with D set. NMI/IRQ are polled at instruction
//! boundaries; the reset vector is read from $FFFC–$FFFD. Undocumented
//! opcodes decode to a fatal [`UnknownOpcode`](cpu::UnknownOpcode) error.

pub mod cpu;
pub mod flags;
pub mod opcode;
