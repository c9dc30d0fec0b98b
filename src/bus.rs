//! Memory bus and address decoding for the NES.
//!
//! Implements the [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map):
//!
//! | Range       | Size   | Device |
//! |-------------|--------|--------|
//! | $0000–$07FF | 2 KiB  | Internal RAM |
//! | $0800–$1FFF | mirror | Mirrors of $0000–$07FF (incomplete decode) |
//! | $2000–$2007 | 8 B    | [PPU registers](https://www.nesdev.org/wiki/PPU_registers) (mirrored every 8 bytes to $3FFF) |
//! | $4014       |        | OAM DMA |
//! | $4016       |        | Controller latch |
//! | $4000–$4017 |        | APU: stubbed, reads 0 and writes are dropped |
//! | $4018–$7FFF |        | Unmapped: reads 0, writes dropped (warned once) |
//! | $8000–$FFFF |        | Cartridge PRG (16 KiB bank mirrored, or 32 KiB) |
//!
//! `tick(n)` advances the PPU frame state machine by `n` executed CPU
//! instructions and renders each completed visible scanline, so stores to
//! the PPU registers are always visible to the next line.

use std::fs;
use std::io;

use log::{info, warn};

use crate::{
    cartridge::cartridge::{Cartridge, PRG_BANK_SIZE},
    controller::Controller,
    ppu::ppu::PPU,
};

/// The CPU's view of memory. `NesBus` is the real machine; tests substitute
/// flat-memory implementations.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
    /// Account for `instructions` executed instructions.
    fn tick(&mut self, instructions: usize);
    /// True once per raised NMI; reading clears the pending line.
    fn poll_nmi(&mut self) -> bool;
    /// Level of the IRQ line at this instruction boundary.
    fn poll_irq(&mut self) -> bool;
}

/// Main NES bus: 2 KiB internal RAM, the PRG image, PPU, and controller.
pub struct NesBus {
    /// Internal RAM; $0800–$1FFF mirror it (addr & $07FF).
    pub ram: [u8; 0x800],
    /// $8000–$FFFF. A single 16 KiB PRG bank is mirrored into both halves.
    pub prg: [u8; 0x8000],
    pub ppu: PPU,
    /// Controller port 1 ($4016). Port 2 is part of the APU stub range.
    pub controller: Controller,
    warned_read: bool,
    warned_write: bool,
}

impl NesBus {
    /// Build the bus from a validated cartridge: PRG into the high region,
    /// CHR into the PPU pattern tables.
    pub fn new(cart: &Cartridge) -> Self {
        let mut prg = [0u8; 0x8000];
        if cart.prg.len() == PRG_BANK_SIZE {
            prg[..PRG_BANK_SIZE].copy_from_slice(&cart.prg);
            prg[PRG_BANK_SIZE..].copy_from_slice(&cart.prg);
        } else {
            prg.copy_from_slice(&cart.prg);
        }

        let mut ppu = PPU::new();
        ppu.load_chr(&cart.chr);

        Self {
            ram: [0; 0x800],
            prg,
            ppu,
            controller: Controller::new(),
            warned_read: false,
            warned_write: false,
        }
    }

    /// True when the PPU has entered vblank and the framebuffer holds a
    /// complete frame.
    pub fn frame_ready(&self) -> bool {
        self.ppu.frame_ready
    }

    /// Clear after presenting, so the next vblank can set it again.
    pub fn clear_frame_ready(&mut self) {
        self.ppu.frame_ready = false;
    }

    /// Write the three state dumps to the working directory: `core.dump`
    /// (64 KiB CPU-visible image: RAM, then PRG at $8000, rest zero),
    /// `oam.dump` (256 bytes), and `ppu.dump` (64 KiB with the 16 KiB PPU
    /// address space at offset 0).
    pub fn dump_state(&self) -> io::Result<()> {
        let mut core = vec![0u8; 0x10000];
        core[..0x800].copy_from_slice(&self.ram);
        core[0x8000..].copy_from_slice(&self.prg);
        fs::write("core.dump", &core)?;

        fs::write("oam.dump", self.ppu.oam)?;

        let mut ppu_space = vec![0u8; 0x10000];
        ppu_space[..0x4000].copy_from_slice(&self.ppu.mem);
        fs::write("ppu.dump", &ppu_space)?;

        info!("state dumped to core.dump, oam.dump, ppu.dump");
        Ok(())
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Incomplete decode: four images of the 2 KiB RAM.
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU registers repeat every 8 bytes. Only $2002, $2004 and
            // $2007 are readable; the rest are write-only latches.
            0x2000..=0x3FFF => match 0x2000 + (addr & 0x0007) {
                0x2002 => self.ppu.read_status(),
                0x2004 => self.ppu.read_oam_data(),
                0x2007 => self.ppu.read_data(),
                _ => 0,
            },
            0x4016 => self.controller.read(),
            // APU stub and the unmapped gap: reads yield 0, warned once.
            0x4000..=0x7FFF => {
                if !self.warned_read {
                    self.warned_read = true;
                    warn!("read from unmapped address ${addr:04X}");
                }
                0
            }
            0x8000..=0xFFFF => self.prg[(addr - 0x8000) as usize],
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            // $2002 is read-only; writes to it fall through to the latch
            // graveyard below.
            0x2000..=0x3FFF => match 0x2000 + (addr & 0x0007) {
                0x2000 => self.ppu.write_ctrl(data),
                0x2001 => self.ppu.write_mask(data),
                0x2003 => self.ppu.write_oam_addr(data),
                0x2004 => self.ppu.write_oam_data(data),
                0x2005 => self.ppu.write_scroll(data),
                0x2006 => self.ppu.write_addr(data),
                0x2007 => self.ppu.write_data(data),
                _ => {}
            },
            // OAM DMA: one whole CPU RAM page into OAM.
            0x4014 => self.ppu.oam_dma(&self.ram, data),
            0x4016 => self.controller.write(data),
            // APU stub drops the write.
            0x4000..=0x4017 => {}
            0x4018..=0xFFFF => {
                if !self.warned_write {
                    self.warned_write = true;
                    warn!("write of ${data:02X} to unmapped or read-only address ${addr:04X}");
                }
            }
        }
    }

    fn tick(&mut self, instructions: usize) {
        for _ in 0..instructions {
            if let Some(line) = self.ppu.tick() {
                self.ppu.render_scanline(line);
            }
        }
    }

    fn poll_nmi(&mut self) -> bool {
        if self.ppu.nmi {
            self.ppu.nmi = false;
            true
        } else {
            false
        }
    }

    fn poll_irq(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::cartridge::{CHR_BANK_SIZE, Mirroring};
    use crate::cpu::cpu::CPU;

    fn cart_with_prg(prg: Vec<u8>) -> Cartridge {
        Cartridge {
            prg,
            chr: vec![0; CHR_BANK_SIZE],
            mirroring: Mirroring::Horizontal,
        }
    }

    fn bus_with_program(program: &[u8]) -> NesBus {
        let mut prg = vec![0u8; PRG_BANK_SIZE];
        prg[..program.len()].copy_from_slice(program);
        // Reset vector → $8000.
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0x80;
        NesBus::new(&cart_with_prg(prg))
    }

    #[test]
    fn ram_aliases_every_two_kib() {
        let mut bus = NesBus::new(&cart_with_prg(vec![0; PRG_BANK_SIZE]));
        bus.write(0x0123, 0xAB);
        assert_eq!(bus.read(0x0123), 0xAB);
        assert_eq!(bus.read(0x0923), 0xAB);
        assert_eq!(bus.read(0x1123), 0xAB);
        assert_eq!(bus.read(0x1923), 0xAB);

        bus.write(0x1FFF, 0x11);
        assert_eq!(bus.read(0x07FF), 0x11);
    }

    #[test]
    fn ppu_registers_alias_every_eight_bytes() {
        let mut bus = NesBus::new(&cart_with_prg(vec![0; PRG_BANK_SIZE]));
        bus.write(0x2008, 0x80); // $2000 mirror
        assert_eq!(bus.ppu.ctrl, 0x80);
        bus.write(0x3FF9, 0x1E); // $2001 mirror at the top of the window
        assert_eq!(bus.ppu.mask, 0x1E);

        bus.ppu.vblank = true;
        assert_eq!(bus.read(0x3FFA) & 0x80, 0x80); // $2002 mirror
        assert!(!bus.ppu.vblank);
    }

    #[test]
    fn apu_range_reads_zero_and_drops_writes() {
        let mut bus = NesBus::new(&cart_with_prg(vec![0; PRG_BANK_SIZE]));
        bus.write(0x4000, 0x30);
        bus.write(0x4015, 0x0F);
        assert_eq!(bus.read(0x4000), 0);
        assert_eq!(bus.read(0x4015), 0);
        assert_eq!(bus.read(0x4017), 0);
    }

    #[test]
    fn unmapped_reads_return_zero() {
        let mut bus = NesBus::new(&cart_with_prg(vec![0; PRG_BANK_SIZE]));
        assert_eq!(bus.read(0x5000), 0);
        assert_eq!(bus.read(0x7FFF), 0);
    }

    #[test]
    fn rom_writes_are_dropped() {
        let mut bus = NesBus::new(&cart_with_prg(vec![0x55; PRG_BANK_SIZE]));
        bus.write(0x8000, 0x00);
        assert_eq!(bus.read(0x8000), 0x55);
    }

    #[test]
    fn sixteen_kib_prg_mirrors_into_the_upper_half() {
        let mut prg = vec![0u8; PRG_BANK_SIZE];
        prg[0] = 0x42;
        let mut bus = NesBus::new(&cart_with_prg(prg));
        assert_eq!(bus.read(0x8000), 0x42);
        assert_eq!(bus.read(0xC000), 0x42);
    }

    #[test]
    fn thirty_two_kib_prg_fills_the_region() {
        let mut prg = vec![0u8; 2 * PRG_BANK_SIZE];
        prg[0] = 0x11;
        prg[PRG_BANK_SIZE] = 0x22;
        let mut bus = NesBus::new(&cart_with_prg(prg));
        assert_eq!(bus.read(0x8000), 0x11);
        assert_eq!(bus.read(0xC000), 0x22);
    }

    #[test]
    fn oam_dma_copies_a_whole_ram_page() {
        let mut bus = NesBus::new(&cart_with_prg(vec![0; PRG_BANK_SIZE]));
        for i in 0..256u16 {
            bus.write(0x0200 + i, i as u8);
        }
        bus.write(0x2003, 0x42); // OAM address must not matter
        bus.write(0x4014, 0x02);
        for i in 0..256 {
            assert_eq!(bus.ppu.oam[i], i as u8);
        }
    }

    #[test]
    fn controller_is_reachable_through_the_latch_address() {
        let mut bus = NesBus::new(&cart_with_prg(vec![0; PRG_BANK_SIZE]));
        bus.controller.state = 0x01; // A pressed
        bus.write(0x4016, 1);
        bus.write(0x4016, 0);
        assert_eq!(bus.read(0x4016), 1);
        assert_eq!(bus.read(0x4016), 0);
    }

    #[test]
    fn reset_vector_reaches_the_program_counter() {
        let mut prg = vec![0u8; PRG_BANK_SIZE];
        prg[0x3FFC] = 0x34;
        prg[0x3FFD] = 0x12;
        let bus = NesBus::new(&cart_with_prg(prg));
        let mut cpu = CPU::new(bus);
        cpu.reset();
        assert_eq!(cpu.pc, 0x1234);
    }

    #[test]
    fn store_into_zero_page_through_the_whole_machine() {
        // LDA #$42; STA $10; BRK
        let bus = bus_with_program(&[0xA9, 0x42, 0x85, 0x10, 0x00]);
        let mut cpu = CPU::new(bus);
        cpu.reset();
        while !cpu.halted {
            cpu.step().unwrap();
        }
        assert_eq!(cpu.bus.ram[0x10], 0x42);
        assert_eq!(cpu.a, 0x42);
    }

    #[test]
    fn nmi_line_reaches_the_cpu_once() {
        let mut bus = NesBus::new(&cart_with_prg(vec![0; PRG_BANK_SIZE]));
        bus.ppu.nmi = true;
        assert!(bus.poll_nmi());
        assert!(!bus.poll_nmi(), "polling acknowledges the line");
    }
}
