//! NES cartridge loading.
//!
//! - **cartridge**: Parses and validates iNES (.nes) files into PRG/CHR
//!   blobs plus the nametable arrangement flag. Only NROM (mapper 0) with
//!   the horizontal arrangement is accepted; everything else is a distinct
//!   [`RomError`](cartridge::RomError).

pub mod cartridge;
