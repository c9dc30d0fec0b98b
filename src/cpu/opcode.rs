//! Opcode decode table for the official 6502 instruction set.
//!
//! One 256-entry table indexed by the opcode byte. Each defined slot names the
//! (mnemonic, addressing mode) pair; empty slots are undocumented opcodes and
//! decode to an error in the interpreter.

/// How the effective address is produced. `Implied` doubles as the
/// accumulator mode for the shift/rotate instructions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AddrMode {
    Implied,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// JMP ($xxxx) only; the pointer high byte is fetched from the same page
    /// as the low byte when the pointer sits at $xxFF.
    Indirect,
    /// ($zp,X)
    IndexedIndirect,
    /// ($zp),Y
    IndirectIndexed,
    Relative,
}

impl AddrMode {
    /// Operand bytes following the opcode byte.
    pub fn operand_len(self) -> u16 {
        match self {
            AddrMode::Implied => 0,
            AddrMode::Immediate
            | AddrMode::ZeroPage
            | AddrMode::ZeroPageX
            | AddrMode::ZeroPageY
            | AddrMode::IndexedIndirect
            | AddrMode::IndirectIndexed
            | AddrMode::Relative => 1,
            AddrMode::Absolute | AddrMode::AbsoluteX | AddrMode::AbsoluteY | AddrMode::Indirect => {
                2
            }
        }
    }
}

/// The 56 official mnemonics.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

#[derive(Clone, Copy, Debug)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub mode: AddrMode,
}

const fn op(mnemonic: Mnemonic, mode: AddrMode) -> Option<Opcode> {
    Some(Opcode { mnemonic, mode })
}

const NUL: Option<Opcode> = None;

use AddrMode::*;
use Mnemonic::*;

/// Decode table, indexed by the opcode byte.
#[rustfmt::skip]
pub static OPCODES: [Option<Opcode>; 256] = [
    /* $00 */ op(Brk, Implied), op(Ora, IndexedIndirect), NUL, NUL,
    /* $04 */ NUL, op(Ora, ZeroPage), op(Asl, ZeroPage), NUL,
    /* $08 */ op(Php, Implied), op(Ora, Immediate), op(Asl, Implied), NUL,
    /* $0C */ NUL, op(Ora, Absolute), op(Asl, Absolute), NUL,
    /* $10 */ op(Bpl, Relative), op(Ora, IndirectIndexed), NUL, NUL,
    /* $14 */ NUL, op(Ora, ZeroPageX), op(Asl, ZeroPageX), NUL,
    /* $18 */ op(Clc, Implied), op(Ora, AbsoluteY), NUL, NUL,
    /* $1C */ NUL, op(Ora, AbsoluteX), op(Asl, AbsoluteX), NUL,
    /* $20 */ op(Jsr, Absolute), op(And, IndexedIndirect), NUL, NUL,
    /* $24 */ op(Bit, ZeroPage), op(And, ZeroPage), op(Rol, ZeroPage), NUL,
    /* $28 */ op(Plp, Implied), op(And, Immediate), op(Rol, Implied), NUL,
    /* $2C */ op(Bit, Absolute), op(And, Absolute), op(Rol, Absolute), NUL,
    /* $30 */ op(Bmi, Relative), op(And, IndirectIndexed), NUL, NUL,
    /* $34 */ NUL, op(And, ZeroPageX), op(Rol, ZeroPageX), NUL,
    /* $38 */ op(Sec, Implied), op(And, AbsoluteY), NUL, NUL,
    /* $3C */ NUL, op(And, AbsoluteX), op(Rol, AbsoluteX), NUL,
    /* $40 */ op(Rti, Implied), op(Eor, IndexedIndirect), NUL, NUL,
    /* $44 */ NUL, op(Eor, ZeroPage), op(Lsr, ZeroPage), NUL,
    /* $48 */ op(Pha, Implied), op(Eor, Immediate), op(Lsr, Implied), NUL,
    /* $4C */ op(Jmp, Absolute), op(Eor, Absolute), op(Lsr, Absolute), NUL,
    /* $50 */ op(Bvc, Relative), op(Eor, IndirectIndexed), NUL, NUL,
    /* $54 */ NUL, op(Eor, ZeroPageX), op(Lsr, ZeroPageX), NUL,
    /* $58 */ op(Cli, Implied), op(Eor, AbsoluteY), NUL, NUL,
    /* $5C */ NUL, op(Eor, AbsoluteX), op(Lsr, AbsoluteX), NUL,
    /* $60 */ op(Rts, Implied), op(Adc, IndexedIndirect), NUL, NUL,
    /* $64 */ NUL, op(Adc, ZeroPage), op(Ror, ZeroPage), NUL,
    /* $68 */ op(Pla, Implied), op(Adc, Immediate), op(Ror, Implied), NUL,
    /* $6C */ op(Jmp, Indirect), op(Adc, Absolute), op(Ror, Absolute), NUL,
    /* $70 */ op(Bvs, Relative), op(Adc, IndirectIndexed), NUL, NUL,
    /* $74 */ NUL, op(Adc, ZeroPageX), op(Ror, ZeroPageX), NUL,
    /* $78 */ op(Sei, Implied), op(Adc, AbsoluteY), NUL, NUL,
    /* $7C */ NUL, op(Adc, AbsoluteX), op(Ror, AbsoluteX), NUL,
    /* $80 */ NUL, op(Sta, IndexedIndirect), NUL, NUL,
    /* $84 */ op(Sty, ZeroPage), op(Sta, ZeroPage), op(Stx, ZeroPage), NUL,
    /* $88 */ op(Dey, Implied), NUL, op(Txa, Implied), NUL,
    /* $8C */ op(Sty, Absolute), op(Sta, Absolute), op(Stx, Absolute), NUL,
    /* $90 */ op(Bcc, Relative), op(Sta, IndirectIndexed), NUL, NUL,
    /* $94 */ op(Sty, ZeroPageX), op(Sta, ZeroPageX), op(Stx, ZeroPageY), NUL,
    /* $98 */ op(Tya, Implied), op(Sta, AbsoluteY), op(Txs, Implied), NUL,
    /* $9C */ NUL, op(Sta, AbsoluteX), NUL, NUL,
    /* $A0 */ op(Ldy, Immediate), op(Lda, IndexedIndirect), op(Ldx, Immediate), NUL,
    /* $A4 */ op(Ldy, ZeroPage), op(Lda, ZeroPage), op(Ldx, ZeroPage), NUL,
    /* $A8 */ op(Tay, Implied), op(Lda, Immediate), op(Tax, Implied), NUL,
    /* $AC */ op(Ldy, Absolute), op(Lda, Absolute), op(Ldx, Absolute), NUL,
    /* $B0 */ op(Bcs, Relative), op(Lda, IndirectIndexed), NUL, NUL,
    /* $B4 */ op(Ldy, ZeroPageX), op(Lda, ZeroPageX), op(Ldx, ZeroPageY), NUL,
    /* $B8 */ op(Clv, Implied), op(Lda, AbsoluteY), op(Tsx, Implied), NUL,
    /* $BC */ op(Ldy, AbsoluteX), op(Lda, AbsoluteX), op(Ldx, AbsoluteY), NUL,
    /* $C0 */ op(Cpy, Immediate), op(Cmp, IndexedIndirect), NUL, NUL,
    /* $C4 */ op(Cpy, ZeroPage), op(Cmp, ZeroPage), op(Dec, ZeroPage), NUL,
    /* $C8 */ op(Iny, Implied), op(Cmp, Immediate), op(Dex, Implied), NUL,
    /* $CC */ op(Cpy, Absolute), op(Cmp, Absolute), op(Dec, Absolute), NUL,
    /* $D0 */ op(Bne, Relative), op(Cmp, IndirectIndexed), NUL, NUL,
    /* $D4 */ NUL, op(Cmp, ZeroPageX), op(Dec, ZeroPageX), NUL,
    /* $D8 */ op(Cld, Implied), op(Cmp, AbsoluteY), NUL, NUL,
    /* $DC */ NUL, op(Cmp, AbsoluteX), op(Dec, AbsoluteX), NUL,
    /* $E0 */ op(Cpx, Immediate), op(Sbc, IndexedIndirect), NUL, NUL,
    /* $E4 */ op(Cpx, ZeroPage), op(Sbc, ZeroPage), op(Inc, ZeroPage), NUL,
    /* $E8 */ op(Inx, Implied), op(Sbc, Immediate), op(Nop, Implied), NUL,
    /* $EC */ op(Cpx, Absolute), op(Sbc, Absolute), op(Inc, Absolute), NUL,
    /* $F0 */ op(Beq, Relative), op(Sbc, IndirectIndexed), NUL, NUL,
    /* $F4 */ NUL, op(Sbc, ZeroPageX), op(Inc, ZeroPageX), NUL,
    /* $F8 */ op(Sed, Implied), op(Sbc, AbsoluteY), NUL, NUL,
    /* $FC */ NUL, op(Sbc, AbsoluteX), op(Inc, AbsoluteX), NUL,
];
