// Processor status register (P), bit-packed.
//
// The 2A03 carries the full 6502 flag set; D is settable but the
// decimal adder is disabled, so ADC/SBC ignore it.
//
//     bit  7 6 5 4 3 2 1 0
//          N V - B D I Z C
//
// B and the unused bit have no physical latch; they only matter as
// values pushed to the stack (BRK pushes P with B set).

pub const FLAG_CARRY: u8 = 1 << 0;
pub const FLAG_ZERO: u8 = 1 << 1;
pub const FLAG_INTERRUPT_DISABLE: u8 = 1 << 2;
pub const FLAG_DECIMAL: u8 = 1 << 3;
pub const FLAG_BREAK: u8 = 1 << 4;
pub const FLAG_UNUSED: u8 = 1 << 5;
pub const FLAG_OVERFLOW: u8 = 1 << 6;
pub const FLAG_NEGATIVE: u8 = 1 << 7;
