use std::fmt;

use crate::u4;

/// The operand fields of a raw 16-bit instruction word.
///
/// | Field | Bits  | Meaning             |
/// |-------|-------|---------------------|
/// | `op`  | 15-12 | opcode group        |
/// | `x`   | 11-8  | register index      |
/// | `y`   | 7-4   | register index      |
/// | `n`   | 3-0   | nibble immediate    |
/// | `nn`  | 7-0   | byte immediate      |
/// | `nnn` | 11-0  | 12-bit address      |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: u4,
    pub x: u4,
    pub y: u4,
    pub n: u4,
    pub nn: u8,
    pub nnn: u16,
}

impl From<u16> for Instruction {
    fn from(word: u16) -> Self {
        Self {
            op: u4::from_low_bits((word >> 12) as u8),
            x: u4::from_low_bits((word >> 8) as u8),
            y: u4::from_low_bits((word >> 4) as u8),
            n: u4::from_low_bits(word as u8),
            nn: (word & 0x00FF) as u8,
            nnn: word & 0x0FFF,
        }
    }
}

/// A decoded instruction, named after its assembler mnemonic.
///
/// Decoding is total: words outside the instruction set become `Unknown`
/// and are only rejected when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// 00E0
    Cls,
    /// 00EE, pop the return address.
    Ret,
    /// 1nnn
    Jp { nnn: u16 },
    /// 2nnn, push PC then jump.
    Call { nnn: u16 },
    /// 3xnn
    SeImm { x: u4, nn: u8 },
    /// 4xnn
    SneImm { x: u4, nn: u8 },
    /// 5xy0
    SeReg { x: u4, y: u4 },
    /// 6xnn
    LdImm { x: u4, nn: u8 },
    /// 7xnn, wraps and never touches VF.
    AddImm { x: u4, nn: u8 },
    /// 8xyN register arithmetic, see [`AluOp`].
    Alu { x: u4, y: u4, op: AluOp },
    /// 9xy0
    SneReg { x: u4, y: u4 },
    /// Annn
    LdI { nnn: u16 },
    /// Bnnn, jump to nnn + V0.
    JpV0 { nnn: u16 },
    /// Cxnn, random byte masked with nn.
    Rnd { x: u4, nn: u8 },
    /// Dxyn, XOR an n-row sprite from I onto the display.
    Drw { x: u4, y: u4, n: u4 },
    /// Ex9E
    Skp { x: u4 },
    /// ExA1
    Sknp { x: u4 },
    /// Fx07
    LdVxDt { x: u4 },
    /// Fx0A, suspend until a key goes down.
    LdKey { x: u4 },
    /// Fx15
    LdDtVx { x: u4 },
    /// Fx18
    LdStVx { x: u4 },
    /// Fx1E
    AddI { x: u4 },
    /// Fx29, point I at the glyph for the digit in Vx.
    LdFont { x: u4 },
    /// Fx33, decimal digits of Vx at I, I+1, I+2.
    LdBcd { x: u4 },
    /// Fx55, copy V0..=Vx to memory at I.
    Store { x: u4 },
    /// Fx65, copy memory at I into V0..=Vx.
    Load { x: u4 },
    /// Anything outside the instruction set, including 0nnn machine calls.
    Unknown(u16),
}

/// The 8xyN sub-operations, selected by the low nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Mov,
    Or,
    And,
    Xor,
    /// VF = carry
    Add,
    /// Vx - Vy, VF = no borrow
    Sub,
    /// VF = bit shifted out
    Shr,
    /// Vy - Vx, VF = no borrow
    Subn,
    /// VF = bit shifted out
    Shl,
}

impl AluOp {
    fn from_nibble(n: u4) -> Option<Self> {
        Some(match u8::from(n) {
            0x0 => AluOp::Mov,
            0x1 => AluOp::Or,
            0x2 => AluOp::And,
            0x3 => AluOp::Xor,
            0x4 => AluOp::Add,
            0x5 => AluOp::Sub,
            0x6 => AluOp::Shr,
            0x7 => AluOp::Subn,
            0xE => AluOp::Shl,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Mov => "LD",
            AluOp::Or => "OR",
            AluOp::And => "AND",
            AluOp::Xor => "XOR",
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::Shr => "SHR",
            AluOp::Subn => "SUBN",
            AluOp::Shl => "SHL",
        }
    }
}

impl Opcode {
    pub fn decode(word: u16) -> Self {
        let ins = Instruction::from(word);
        let Instruction { x, y, n, nn, nnn, .. } = ins;

        let decoded = match u8::from(ins.op) {
            0x0 => match nnn {
                0x0E0 => Some(Opcode::Cls),
                0x0EE => Some(Opcode::Ret),
                _ => None,
            },
            0x1 => Some(Opcode::Jp { nnn }),
            0x2 => Some(Opcode::Call { nnn }),
            0x3 => Some(Opcode::SeImm { x, nn }),
            0x4 => Some(Opcode::SneImm { x, nn }),
            0x5 if u8::from(n) == 0 => Some(Opcode::SeReg { x, y }),
            0x6 => Some(Opcode::LdImm { x, nn }),
            0x7 => Some(Opcode::AddImm { x, nn }),
            0x8 => AluOp::from_nibble(n).map(|op| Opcode::Alu { x, y, op }),
            0x9 if u8::from(n) == 0 => Some(Opcode::SneReg { x, y }),
            0xA => Some(Opcode::LdI { nnn }),
            0xB => Some(Opcode::JpV0 { nnn }),
            0xC => Some(Opcode::Rnd { x, nn }),
            0xD => Some(Opcode::Drw { x, y, n }),
            0xE => match nn {
                0x9E => Some(Opcode::Skp { x }),
                0xA1 => Some(Opcode::Sknp { x }),
                _ => None,
            },
            0xF => match nn {
                0x07 => Some(Opcode::LdVxDt { x }),
                0x0A => Some(Opcode::LdKey { x }),
                0x15 => Some(Opcode::LdDtVx { x }),
                0x18 => Some(Opcode::LdStVx { x }),
                0x1E => Some(Opcode::AddI { x }),
                0x29 => Some(Opcode::LdFont { x }),
                0x33 => Some(Opcode::LdBcd { x }),
                0x55 => Some(Opcode::Store { x }),
                0x65 => Some(Opcode::Load { x }),
                _ => None,
            },
            _ => None,
        };

        decoded.unwrap_or(Opcode::Unknown(word))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Opcode::Cls => write!(f, "CLS"),
            Opcode::Ret => write!(f, "RET"),
            Opcode::Jp { nnn } => write!(f, "JP {nnn:#05X}"),
            Opcode::Call { nnn } => write!(f, "CALL {nnn:#05X}"),
            Opcode::SeImm { x, nn } => write!(f, "SE V{x}, {nn:#04X}"),
            Opcode::SneImm { x, nn } => write!(f, "SNE V{x}, {nn:#04X}"),
            Opcode::SeReg { x, y } => write!(f, "SE V{x}, V{y}"),
            Opcode::LdImm { x, nn } => write!(f, "LD V{x}, {nn:#04X}"),
            Opcode::AddImm { x, nn } => write!(f, "ADD V{x}, {nn:#04X}"),
            Opcode::Alu { x, y, op } => write!(f, "{} V{x}, V{y}", op.mnemonic()),
            Opcode::SneReg { x, y } => write!(f, "SNE V{x}, V{y}"),
            Opcode::LdI { nnn } => write!(f, "LD I, {nnn:#05X}"),
            Opcode::JpV0 { nnn } => write!(f, "JP V0, {nnn:#05X}"),
            Opcode::Rnd { x, nn } => write!(f, "RND V{x}, {nn:#04X}"),
            Opcode::Drw { x, y, n } => write!(f, "DRW V{x}, V{y}, {n}"),
            Opcode::Skp { x } => write!(f, "SKP V{x}"),
            Opcode::Sknp { x } => write!(f, "SKNP V{x}"),
            Opcode::LdVxDt { x } => write!(f, "LD V{x}, DT"),
            Opcode::LdKey { x } => write!(f, "LD V{x}, K"),
            Opcode::LdDtVx { x } => write!(f, "LD DT, V{x}"),
            Opcode::LdStVx { x } => write!(f, "LD ST, V{x}"),
            Opcode::AddI { x } => write!(f, "ADD I, V{x}"),
            Opcode::LdFont { x } => write!(f, "LD F, V{x}"),
            Opcode::LdBcd { x } => write!(f, "LD B, V{x}"),
            Opcode::Store { x } => write!(f, "LD [I], V{x}"),
            Opcode::Load { x } => write!(f, "LD V{x}, [I]"),
            Opcode::Unknown(word) => write!(f, "DW {word:#06X}"),
        }
    }
}
