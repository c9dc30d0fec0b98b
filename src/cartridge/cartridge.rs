//! iNES (.nes) file parsing.
//!
//! Layout: 16-byte header (magic `NES\x1A`, PRG bank count × 16 KiB, CHR
//! bank count × 8 KiB, two control bytes, RAM bank count, seven zero bytes),
//! then the PRG payload, then the CHR payload, and nothing after. Every
//! malformed input maps to its own [`RomError`] variant so the host can
//! report exactly what was wrong before the CPU ever starts.

use core::fmt;
use std::fs;

use log::info;

pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;

const MAGIC: [u8; 4] = *b"NES\x1A";
const HEADER_SIZE: usize = 16;

/// Nametable arrangement requested by the cartridge. Only the horizontal
/// arrangement ($2800 folding onto $2000) is accepted by the loader.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mirroring {
    Horizontal,
    Vertical,
}

#[derive(Debug)]
pub enum RomError {
    /// The file could not be opened or read.
    Io(std::io::Error),
    /// The magic bytes are absent or wrong.
    BadMagic,
    /// The header is shorter than 16 bytes or its reserved tail is nonzero.
    BadHeader,
    /// The PRG payload is shorter than the header declares.
    TruncatedPrg { expected: usize, actual: usize },
    /// The CHR payload is shorter than the header declares.
    TruncatedChr { expected: usize, actual: usize },
    /// Bytes remain after the declared payloads.
    TrailingData(usize),
    /// Valid iNES, but outside the NROM/horizontal subset.
    Unsupported(&'static str),
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomError::Io(err) => write!(f, "failed to read ROM: {err}"),
            RomError::BadMagic => write!(f, "not an iNES file (bad magic)"),
            RomError::BadHeader => write!(f, "malformed iNES header"),
            RomError::TruncatedPrg { expected, actual } => {
                write!(f, "PRG payload truncated: {actual} of {expected} bytes")
            }
            RomError::TruncatedChr { expected, actual } => {
                write!(f, "CHR payload truncated: {actual} of {expected} bytes")
            }
            RomError::TrailingData(extra) => {
                write!(f, "{extra} unexpected bytes after the CHR payload")
            }
            RomError::Unsupported(what) => write!(f, "unsupported cartridge: {what}"),
        }
    }
}

impl std::error::Error for RomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RomError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RomError {
    fn from(err: std::io::Error) -> Self {
        RomError::Io(err)
    }
}

/// A validated cartridge: PRG for the CPU bus high region, CHR for the PPU
/// pattern tables, and the nametable arrangement flag.
pub struct Cartridge {
    pub prg: Vec<u8>,
    pub chr: Vec<u8>,
    pub mirroring: Mirroring,
}

impl Cartridge {
    /// Read and validate an iNES file.
    pub fn load(path: &str) -> Result<Self, RomError> {
        let data = fs::read(path)?;
        let cart = Self::parse(&data)?;
        info!(
            "loaded {path}: PRG {} KiB, CHR {} KiB, {:?} arrangement",
            cart.prg.len() / 1024,
            cart.chr.len() / 1024,
            cart.mirroring
        );
        Ok(cart)
    }

    /// Validate an iNES image held in memory.
    pub fn parse(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < MAGIC.len() || data[..MAGIC.len()] != MAGIC {
            return Err(RomError::BadMagic);
        }
        if data.len() < HEADER_SIZE {
            return Err(RomError::BadHeader);
        }
        if data[9..HEADER_SIZE].iter().any(|&b| b != 0) {
            return Err(RomError::BadHeader);
        }

        let prg_banks = data[4] as usize;
        let chr_banks = data[5] as usize;
        let control1 = data[6];
        let control2 = data[7];

        let mapper = (control1 >> 4) | (control2 & 0xF0);
        if mapper != 0 {
            return Err(RomError::Unsupported("mapper (NROM only)"));
        }
        if control1 & 0x04 != 0 {
            return Err(RomError::Unsupported("trainer section"));
        }
        if control1 & 0x08 != 0 {
            return Err(RomError::Unsupported("four-screen nametables"));
        }
        if control1 & 0x01 != 0 {
            return Err(RomError::Unsupported("vertical nametable arrangement"));
        }
        if !(1..=2).contains(&prg_banks) {
            return Err(RomError::Unsupported("PRG size (16 or 32 KiB only)"));
        }
        if chr_banks != 1 {
            return Err(RomError::Unsupported("CHR size (8 KiB only)"));
        }

        let prg_size = prg_banks * PRG_BANK_SIZE;
        let chr_size = chr_banks * CHR_BANK_SIZE;
        let payload = &data[HEADER_SIZE..];

        if payload.len() < prg_size {
            return Err(RomError::TruncatedPrg {
                expected: prg_size,
                actual: payload.len(),
            });
        }
        if payload.len() < prg_size + chr_size {
            return Err(RomError::TruncatedChr {
                expected: chr_size,
                actual: payload.len() - prg_size,
            });
        }
        if payload.len() > prg_size + chr_size {
            return Err(RomError::TrailingData(payload.len() - prg_size - chr_size));
        }

        Ok(Self {
            prg: payload[..prg_size].to_vec(),
            chr: payload[prg_size..].to_vec(),
            mirroring: Mirroring::Horizontal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom(prg_banks: u8, chr_banks: u8) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"NES\x1A");
        data.push(prg_banks);
        data.push(chr_banks);
        data.extend_from_slice(&[0, 0, 0]); // control1, control2, RAM banks
        data.extend_from_slice(&[0; 7]);
        data.resize(
            16 + prg_banks as usize * PRG_BANK_SIZE + chr_banks as usize * CHR_BANK_SIZE,
            0,
        );
        data
    }

    #[test]
    fn accepts_a_minimal_nrom_image() {
        let cart = Cartridge::parse(&rom(1, 1)).unwrap();
        assert_eq!(cart.prg.len(), PRG_BANK_SIZE);
        assert_eq!(cart.chr.len(), CHR_BANK_SIZE);
        assert_eq!(cart.mirroring, Mirroring::Horizontal);
    }

    #[test]
    fn accepts_a_double_prg_bank_image() {
        let cart = Cartridge::parse(&rom(2, 1)).unwrap();
        assert_eq!(cart.prg.len(), 2 * PRG_BANK_SIZE);
    }

    #[test]
    fn payload_bytes_land_in_prg_and_chr() {
        let mut data = rom(1, 1);
        data[16] = 0xA9;
        data[16 + PRG_BANK_SIZE] = 0x3C;
        let cart = Cartridge::parse(&data).unwrap();
        assert_eq!(cart.prg[0], 0xA9);
        assert_eq!(cart.chr[0], 0x3C);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = rom(1, 1);
        data[0] = b'X';
        assert!(matches!(
            Cartridge::parse(&data),
            Err(RomError::BadMagic)
        ));
    }

    #[test]
    fn rejects_a_nonzero_reserved_tail() {
        let mut data = rom(1, 1);
        data[12] = 1;
        assert!(matches!(
            Cartridge::parse(&data),
            Err(RomError::BadHeader)
        ));
    }

    #[test]
    fn rejects_truncated_prg() {
        let data = &rom(1, 1)[..16 + 100];
        assert!(matches!(
            Cartridge::parse(data),
            Err(RomError::TruncatedPrg { expected, actual })
                if expected == PRG_BANK_SIZE && actual == 100
        ));
    }

    #[test]
    fn rejects_truncated_chr() {
        let data = &rom(1, 1)[..16 + PRG_BANK_SIZE + 100];
        assert!(matches!(
            Cartridge::parse(data),
            Err(RomError::TruncatedChr { expected, actual })
                if expected == CHR_BANK_SIZE && actual == 100
        ));
    }

    #[test]
    fn rejects_trailing_data() {
        let mut data = rom(1, 1);
        data.push(0xFF);
        assert!(matches!(
            Cartridge::parse(&data),
            Err(RomError::TrailingData(1))
        ));
    }

    #[test]
    fn rejects_other_mappers() {
        let mut data = rom(1, 1);
        data[6] = 0x10; // mapper 1
        assert!(matches!(
            Cartridge::parse(&data),
            Err(RomError::Unsupported(_))
        ));
    }

    #[test]
    fn rejects_vertical_arrangement() {
        let mut data = rom(1, 1);
        data[6] = 0x01;
        assert!(matches!(
            Cartridge::parse(&data),
            Err(RomError::Unsupported(_))
        ));
    }

    #[test]
    fn rejects_trainer_images() {
        let mut data = rom(1, 1);
        data[6] = 0x04;
        assert!(matches!(
            Cartridge::parse(&data),
            Err(RomError::Unsupported(_))
        ));
    }
}
