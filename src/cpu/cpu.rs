use core::fmt;

use log::trace;

use crate::{
    bus::Bus,
    cpu::flags::{
        FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_OVERFLOW,
        FLAG_ZERO,
    },
    cpu::opcode::{AddrMode, Mnemonic, OPCODES},
};

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

/// Decode failure: the fetched opcode byte has no entry in the table.
/// Fatal to the run loop; the host dumps state and exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOpcode {
    pub opcode: u8,
    pub pc: u16,
}

impl fmt::Display for UnknownOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized instruction ${:02X} at ${:04X}",
            self.opcode, self.pc
        )
    }
}

impl std::error::Error for UnknownOpcode {}

pub struct CPU<B: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    pub bus: B,
    /// Set when BRK executes; the run loop treats it as a trap and stops.
    pub halted: bool,
}

impl<B: Bus> CPU<B> {
    pub fn new(bus: B) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFF,
            pc: 0,
            status: 0,
            bus,
            halted: false,
        }
    }

    /// Power-on state: registers zeroed, SP at the stack top, PC from the
    /// reset vector at $FFFC/$FFFD.
    pub fn reset(&mut self) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.status = 0;
        self.sp = 0xFF;
        self.halted = false;
        self.pc = self.read_word(RESET_VECTOR);
    }

    /// Run one instruction: service pending interrupts at the boundary, then
    /// fetch, decode, resolve the address mode, execute, and tick the bus.
    pub fn step(&mut self) -> Result<(), UnknownOpcode> {
        if self.halted {
            return Ok(());
        }

        if self.bus.poll_nmi() {
            self.interrupt(NMI_VECTOR);
        } else if self.bus.poll_irq() && self.status & FLAG_INTERRUPT_DISABLE == 0 {
            self.interrupt(IRQ_VECTOR);
        }

        let pc = self.pc;
        let byte = self.fetch_byte();
        let Some(entry) = OPCODES[byte as usize] else {
            return Err(UnknownOpcode { opcode: byte, pc });
        };

        trace!(
            "{:04X}  {:02X}        A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
            pc, byte, self.a, self.x, self.y, self.status, self.sp
        );

        let addr = self.resolve(entry.mode);
        self.execute(entry.mnemonic, entry.mode, addr);
        self.bus.tick(1);
        Ok(())
    }

    fn fetch_byte(&mut self) -> u8 {
        let byte = self.bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte() as u16;
        let hi = self.fetch_byte() as u16;
        (hi << 8) | lo
    }

    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.bus.read(addr) as u16;
        let hi = self.bus.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    // Pushes store then decrement; pulls increment then load.
    fn push(&mut self, data: u8) {
        self.bus.write(0x0100 + self.sp as u16, data);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.bus.read(0x0100 + self.sp as u16)
    }

    fn interrupt(&mut self, vector: u16) {
        self.push((self.pc >> 8) as u8);
        self.push(self.pc as u8);
        self.push(self.status);
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read_word(vector);
    }

    fn set_flag(&mut self, mask: u8, on: bool) {
        if on {
            self.status |= mask;
        } else {
            self.status &= !mask;
        }
    }

    fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }

    /// Effective address for the mode, consuming the operand bytes. `None`
    /// for implied/accumulator instructions.
    fn resolve(&mut self, mode: AddrMode) -> Option<u16> {
        match mode {
            AddrMode::Implied => None,
            AddrMode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                Some(addr)
            }
            AddrMode::ZeroPage => Some(self.fetch_byte() as u16),
            AddrMode::ZeroPageX => Some(self.fetch_byte().wrapping_add(self.x) as u16),
            AddrMode::ZeroPageY => Some(self.fetch_byte().wrapping_add(self.y) as u16),
            AddrMode::Absolute => Some(self.fetch_word()),
            AddrMode::AbsoluteX => Some(self.fetch_word().wrapping_add(self.x as u16)),
            AddrMode::AbsoluteY => Some(self.fetch_word().wrapping_add(self.y as u16)),
            AddrMode::Indirect => {
                // The pointer high byte comes from the same page as the low
                // byte: ($xxFF) reads $xxFF and $xx00.
                let ptr = self.fetch_word();
                let lo = self.bus.read(ptr) as u16;
                let hi = self.bus.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF)) as u16;
                Some((hi << 8) | lo)
            }
            AddrMode::IndexedIndirect => {
                let base = self.fetch_byte().wrapping_add(self.x);
                let lo = self.bus.read(base as u16) as u16;
                let hi = self.bus.read(base.wrapping_add(1) as u16) as u16;
                Some((hi << 8) | lo)
            }
            AddrMode::IndirectIndexed => {
                let zp = self.fetch_byte();
                let lo = self.bus.read(zp as u16) as u16;
                let hi = self.bus.read(zp.wrapping_add(1) as u16) as u16;
                Some(((hi << 8) | lo).wrapping_add(self.y as u16))
            }
            AddrMode::Relative => {
                let offset = self.fetch_byte() as i8;
                Some(self.pc.wrapping_add(offset as u16))
            }
        }
    }

    fn read_operand(&mut self, addr: Option<u16>) -> u8 {
        match addr {
            Some(addr) => self.bus.read(addr),
            None => unreachable!("memory operation decoded without an address"),
        }
    }

    fn target(addr: Option<u16>) -> u16 {
        match addr {
            Some(addr) => addr,
            None => unreachable!("addressed operation decoded without an address"),
        }
    }

    fn execute(&mut self, mnemonic: Mnemonic, mode: AddrMode, addr: Option<u16>) {
        use Mnemonic::*;
        match mnemonic {
            Lda => {
                self.a = self.read_operand(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Ldx => {
                self.x = self.read_operand(addr);
                self.update_zero_and_negative_flags(self.x);
            }
            Ldy => {
                self.y = self.read_operand(addr);
                self.update_zero_and_negative_flags(self.y);
            }
            Sta => {
                let addr = Self::target(addr);
                self.bus.write(addr, self.a);
            }
            Stx => {
                let addr = Self::target(addr);
                self.bus.write(addr, self.x);
            }
            Sty => {
                let addr = Self::target(addr);
                self.bus.write(addr, self.y);
            }

            Adc => {
                let m = self.read_operand(addr);
                self.add_with_carry(m);
            }
            Sbc => {
                let m = self.read_operand(addr);
                self.add_with_carry(m ^ 0xFF);
            }

            And => {
                self.a &= self.read_operand(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Ora => {
                self.a |= self.read_operand(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Eor => {
                self.a ^= self.read_operand(addr);
                self.update_zero_and_negative_flags(self.a);
            }

            Asl => self.shift(mode, addr, Self::asl_value),
            Lsr => self.shift(mode, addr, Self::lsr_value),
            Rol => self.shift(mode, addr, Self::rol_value),
            Ror => self.shift(mode, addr, Self::ror_value),

            Bpl => self.branch(addr, self.status & FLAG_NEGATIVE == 0),
            Bmi => self.branch(addr, self.status & FLAG_NEGATIVE != 0),
            Bvc => self.branch(addr, self.status & FLAG_OVERFLOW == 0),
            Bvs => self.branch(addr, self.status & FLAG_OVERFLOW != 0),
            Bcc => self.branch(addr, self.status & FLAG_CARRY == 0),
            Bcs => self.branch(addr, self.status & FLAG_CARRY != 0),
            Bne => self.branch(addr, self.status & FLAG_ZERO == 0),
            Beq => self.branch(addr, self.status & FLAG_ZERO != 0),

            Cmp => {
                let m = self.read_operand(addr);
                self.compare(self.a, m);
            }
            Cpx => {
                let m = self.read_operand(addr);
                self.compare(self.x, m);
            }
            Cpy => {
                let m = self.read_operand(addr);
                self.compare(self.y, m);
            }

            Bit => {
                let m = self.read_operand(addr);
                self.set_flag(FLAG_ZERO, self.a & m == 0);
                self.set_flag(FLAG_NEGATIVE, m & 0x80 != 0);
                self.set_flag(FLAG_OVERFLOW, m & 0x40 != 0);
            }

            Jmp => self.pc = Self::target(addr),
            Jsr => {
                // Return address is the last operand byte; RTS adds one.
                let ret = self.pc.wrapping_sub(1);
                self.push((ret >> 8) as u8);
                self.push(ret as u8);
                self.pc = Self::target(addr);
            }
            Rts => {
                let lo = self.pull() as u16;
                let hi = self.pull() as u16;
                self.pc = ((hi << 8) | lo).wrapping_add(1);
            }
            Rti => {
                self.status = self.pull();
                let lo = self.pull() as u16;
                let hi = self.pull() as u16;
                self.pc = (hi << 8) | lo;
            }
            Brk => {
                // Software interrupt: the pushed return address skips the
                // padding byte after the opcode, and the pushed P carries B.
                let ret = self.pc.wrapping_add(1);
                self.push((ret >> 8) as u8);
                self.push(ret as u8);
                self.push(self.status | FLAG_BREAK);
                self.status |= FLAG_INTERRUPT_DISABLE;
                self.pc = self.read_word(IRQ_VECTOR);
                self.halted = true;
            }

            Tax => {
                self.x = self.a;
                self.update_zero_and_negative_flags(self.x);
            }
            Tay => {
                self.y = self.a;
                self.update_zero_and_negative_flags(self.y);
            }
            Txa => {
                self.a = self.x;
                self.update_zero_and_negative_flags(self.a);
            }
            Tya => {
                self.a = self.y;
                self.update_zero_and_negative_flags(self.a);
            }
            Tsx => {
                self.x = self.sp;
                self.update_zero_and_negative_flags(self.x);
            }
            Txs => self.sp = self.x,

            Pha => self.push(self.a),
            Pla => {
                self.a = self.pull();
                self.update_zero_and_negative_flags(self.a);
            }
            Php => self.push(self.status),
            Plp => self.status = self.pull(),

            Inx => {
                self.x = self.x.wrapping_add(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Inc => {
                let addr = Self::target(addr);
                let value = self.bus.read(addr).wrapping_add(1);
                self.update_zero_and_negative_flags(value);
                self.bus.write(addr, value);
            }
            Dec => {
                let addr = Self::target(addr);
                let value = self.bus.read(addr).wrapping_sub(1);
                self.update_zero_and_negative_flags(value);
                self.bus.write(addr, value);
            }

            Sec => self.status |= FLAG_CARRY,
            Clc => self.status &= !FLAG_CARRY,
            Sei => self.status |= FLAG_INTERRUPT_DISABLE,
            Cli => self.status &= !FLAG_INTERRUPT_DISABLE,
            Sed => self.status |= FLAG_DECIMAL,
            Cld => self.status &= !FLAG_DECIMAL,
            Clv => self.status &= !FLAG_OVERFLOW,

            Nop => {}
        }
    }

    /// Shared ADC/SBC core; SBC passes the operand ones-complemented. The
    /// 2A03 has no decimal adder, so D never changes the arithmetic.
    fn add_with_carry(&mut self, m: u8) {
        let carry = (self.status & FLAG_CARRY) as u16;
        let sum = self.a as u16 + m as u16 + carry;
        let result = sum as u8;
        self.set_flag(FLAG_OVERFLOW, !(self.a ^ m) & (self.a ^ result) & 0x80 != 0);
        self.set_flag(FLAG_CARRY, sum > 0xFF);
        self.a = result;
        self.update_zero_and_negative_flags(result);
    }

    fn compare(&mut self, reg: u8, m: u8) {
        let diff = reg.wrapping_sub(m);
        self.set_flag(FLAG_CARRY, reg >= m);
        self.set_flag(FLAG_ZERO, reg == m);
        self.set_flag(FLAG_NEGATIVE, diff & 0x80 != 0);
    }

    fn branch(&mut self, addr: Option<u16>, taken: bool) {
        let target = Self::target(addr);
        if taken {
            self.pc = target;
        }
    }

    /// Shift/rotate against the accumulator (implied mode) or memory.
    fn shift(&mut self, mode: AddrMode, addr: Option<u16>, f: fn(&mut Self, u8) -> u8) {
        if mode == AddrMode::Implied {
            let value = self.a;
            let result = f(self, value);
            self.a = result;
        } else {
            let addr = Self::target(addr);
            let value = self.bus.read(addr);
            let result = f(self, value);
            self.bus.write(addr, result);
        }
    }

    fn asl_value(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn lsr_value(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn rol_value(&mut self, value: u8) -> u8 {
        let carry_in = self.status & FLAG_CARRY;
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn ror_value(&mut self, value: u8) -> u8 {
        let carry_in = self.status & FLAG_CARRY;
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = (value >> 1) | (carry_in << 7);
        self.update_zero_and_negative_flags(result);
        result
    }
}
