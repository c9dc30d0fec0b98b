//! NES emulator entry point.
//!
//! Loads an iNES cartridge and interleaves the CPU with the PPU scanline
//! renderer, presenting frames in a window at ~60 Hz.
//! Usage: `kestrel path/to/game.nes`
//!
//! The process exits 0 on a clean stop (window closed or Escape) and
//! non-zero on an interrupt signal, a BRK trap, or a fatal decode error; in
//! every case the machine state is dumped to `core.dump`, `oam.dump` and
//! `ppu.dump` in the working directory.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ansi_term::Colour::Red;
use kestrel::{
    bus::NesBus,
    cartridge::cartridge::Cartridge,
    cpu::cpu::CPU,
    ppu::ppu::{SCR_HEIGHT, SCR_WIDTH},
};
use log::{error, info, warn};
use minifb::{Key, Scale, ScaleMode, Window, WindowOptions};

/// NES frame rate ~60.1 Hz (NTSC); pace one frame per 16.67 ms.
const FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

/// NES controller 1 bits: 0=A, 1=B, 2=Select, 3=Start, 4=Up, 5=Down,
/// 6=Left, 7=Right.
fn controller_state_from_keys(window: &Window) -> u8 {
    let mut state = 0u8;
    if window.is_key_down(Key::Z) {
        state |= 1 << 0; // A
    }
    if window.is_key_down(Key::X) {
        state |= 1 << 1; // B
    }
    if window.is_key_down(Key::RightShift) || window.is_key_down(Key::LeftShift) {
        state |= 1 << 2; // Select
    }
    if window.is_key_down(Key::Enter) {
        state |= 1 << 3; // Start
    }
    if window.is_key_down(Key::Up) {
        state |= 1 << 4;
    }
    if window.is_key_down(Key::Down) {
        state |= 1 << 5;
    }
    if window.is_key_down(Key::Left) {
        state |= 1 << 6;
    }
    if window.is_key_down(Key::Right) {
        state |= 1 << 7;
    }
    state
}

enum Outcome {
    /// Window closed or Escape pressed.
    Clean,
    /// Interrupt signal.
    Interrupted,
    /// The program landed in BRK.
    Trapped,
    /// Unrecognized instruction or a dead window.
    Fatal,
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: kestrel <rom.nes>");
        return ExitCode::FAILURE;
    };

    let cart = match Cartridge::load(&path) {
        Ok(cart) => cart,
        Err(err) => {
            eprintln!("{} {err}", Red.bold().paint("ERROR"));
            return ExitCode::FAILURE;
        }
    };

    let mut cpu = CPU::new(NesBus::new(&cart));
    cpu.reset();
    info!("reset vector ${:04X}", cpu.pc);

    // NES native resolution 256×240, integer-upscaled by the window.
    let mut window = match Window::new(
        "Kestrel",
        SCR_WIDTH,
        SCR_HEIGHT,
        WindowOptions {
            resize: true,
            scale: Scale::X2,
            scale_mode: ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    ) {
        Ok(window) => window,
        Err(err) => {
            eprintln!("{} failed to create window: {err}", Red.bold().paint("ERROR"));
            return ExitCode::FAILURE;
        }
    };
    window.set_target_fps(60);

    // Interrupt signal → stop flag, observed at the next frame boundary.
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(err) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            warn!("interrupt handler not installed: {err}");
        }
    }

    let outcome = 'frames: loop {
        if !running.load(Ordering::SeqCst) {
            eprintln!("interrupt signal captured, dumping state");
            break Outcome::Interrupted;
        }
        if !window.is_open() || window.is_key_down(Key::Escape) {
            break Outcome::Clean;
        }

        let frame_start = Instant::now();

        // Keyboard → controller port 1 (latched when the game strobes $4016).
        cpu.bus.controller.state = controller_state_from_keys(&window);

        // Run the interleave until the PPU reports a finished frame; every
        // step ticks the PPU, so register writes land before the next line.
        while !cpu.bus.frame_ready() {
            if cpu.halted {
                info!(
                    "landed in BRK: PC:{:04X} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
                    cpu.pc, cpu.a, cpu.x, cpu.y, cpu.status, cpu.sp
                );
                break 'frames Outcome::Trapped;
            }
            if let Err(err) = cpu.step() {
                eprintln!("{} {err}", Red.bold().paint("ERROR"));
                break 'frames Outcome::Fatal;
            }
        }

        if let Err(err) = window.update_with_buffer(&cpu.bus.ppu.framebuffer, SCR_WIDTH, SCR_HEIGHT)
        {
            eprintln!("{} window update failed: {err}", Red.bold().paint("ERROR"));
            break Outcome::Fatal;
        }
        cpu.bus.clear_frame_ready();

        // Pace to ~60 fps; emulation runs far faster than the real machine.
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    };

    if let Err(err) = cpu.bus.dump_state() {
        error!("state dump failed: {err}");
    }

    match outcome {
        Outcome::Clean => ExitCode::SUCCESS,
        Outcome::Interrupted | Outcome::Trapped | Outcome::Fatal => ExitCode::FAILURE,
    }
}
