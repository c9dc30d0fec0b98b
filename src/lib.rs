//! Kestrel: An NES (Nintendo Entertainment System) emulator written in Rust.
//!
//! ## Modules
//!
//! - **bus** – CPU memory map, PPU/controller/cartridge access, state dumps
//! - **cartridge** – iNES loading and validation (NROM)
//! - **controller** – NES controller shift-register protocol
//! - **cpu** – 6502 decode table and interpreter
//! - **ppu** – Background, sprites, palettes, framebuffer, vblank/NMI

pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod ppu;
