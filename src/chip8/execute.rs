use log::warn;
use rand::Rng;

use super::{
    AluOp, Chip8, Chip8Error, Chip8Result, FONT_GLYPH_SIZE, FONT_START_ADDRESS, Opcode,
    UnknownOpcodePolicy,
};
use crate::u4;

/// Result of an 8xyN operation: the new Vx and, if the operation defines
/// one, the value written to VF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutput {
    pub value: u8,
    pub flag: Option<u8>,
}

/// Evaluates an 8xyN operation on the operand values.
pub fn alu(op: AluOp, vx: u8, vy: u8) -> AluOutput {
    let (value, flag) = match op {
        AluOp::Mov => (vy, None),
        AluOp::Or => (vx | vy, None),
        AluOp::And => (vx & vy, None),
        AluOp::Xor => (vx ^ vy, None),
        AluOp::Add => {
            let (sum, carry) = vx.overflowing_add(vy);
            (sum, Some(carry as u8))
        }
        // Equal operands clear VF
        AluOp::Sub => (vx.wrapping_sub(vy), Some((vx > vy) as u8)),
        AluOp::Subn => (vy.wrapping_sub(vx), Some((vy > vx) as u8)),
        AluOp::Shr => (vx >> 1, Some(vx & 0x01)),
        AluOp::Shl => (vx << 1, Some(vx >> 7)),
    };

    AluOutput { value, flag }
}

impl Chip8 {
    /// Applies a decoded instruction. PC has already been advanced past it.
    ///
    /// Fallible instructions check every address they touch before writing
    /// anything.
    pub(crate) fn execute_opcode(&mut self, opcode: Opcode) -> Result<Chip8Result, Chip8Error> {
        match opcode {
            Opcode::Cls => {
                self.display.clear();
                return Ok(Chip8Result::Drew);
            }
            Opcode::Drw { x, y, n } => {
                let collided = self.draw(self.v[x], self.v[y], n)?;
                self.v[0xF] = collided as u8;
                return Ok(Chip8Result::Drew);
            }
            Opcode::LdKey { x } => {
                self.waiting_for_key = Some(x);
                return Ok(Chip8Result::WaitingForKey { register: x });
            }

            Opcode::Jp { nnn } => self.pc = nnn,
            Opcode::JpV0 { nnn } => self.pc = nnn + u16::from(self.v[0]),
            Opcode::Call { nnn } => {
                self.stack.push(self.pc)?;
                self.pc = nnn;
            }
            Opcode::Ret => self.pc = self.stack.pop()?,

            Opcode::SeImm { x, nn } => self.skip_if(self.v[x] == nn),
            Opcode::SneImm { x, nn } => self.skip_if(self.v[x] != nn),
            Opcode::SeReg { x, y } => self.skip_if(self.v[x] == self.v[y]),
            Opcode::SneReg { x, y } => self.skip_if(self.v[x] != self.v[y]),
            Opcode::Skp { x } => self.skip_if(self.key_in(x)),
            Opcode::Sknp { x } => self.skip_if(!self.key_in(x)),

            Opcode::LdImm { x, nn } => self.v[x] = nn,
            Opcode::AddImm { x, nn } => self.v[x] = self.v[x].wrapping_add(nn),
            Opcode::Alu { x, y, op } => {
                let out = alu(op, self.v[x], self.v[y]);
                self.v[x] = out.value;
                // Written after Vx so the flag survives x == F
                if let Some(flag) = out.flag {
                    self.v[0xF] = flag;
                }
            }
            Opcode::Rnd { x, nn } => self.v[x] = self.rng.random::<u8>() & nn,

            Opcode::LdI { nnn } => self.i = nnn,
            Opcode::AddI { x } => {
                let vx = self.v[x];
                self.i = self.i.checked_add(u16::from(vx)).ok_or(
                    Chip8Error::MemoryOutOfBounds {
                        address: usize::from(self.i) + usize::from(vx),
                    },
                )?;
            }
            Opcode::LdFont { x } => {
                self.i = (FONT_START_ADDRESS + usize::from(self.v[x]) * FONT_GLYPH_SIZE) as u16;
            }

            Opcode::LdVxDt { x } => self.v[x] = self.delay_timer,
            Opcode::LdDtVx { x } => self.delay_timer = self.v[x],
            Opcode::LdStVx { x } => self.sound_timer = self.v[x],

            Opcode::LdBcd { x } => {
                let value = self.v[x];
                self.memory
                    .slice_mut(usize::from(self.i), 3)?
                    .copy_from_slice(&[value / 100, value / 10 % 10, value % 10]);
            }
            Opcode::Store { x } => {
                let regs = &self.v[..=usize::from(x)];
                self.memory
                    .slice_mut(usize::from(self.i), regs.len())?
                    .copy_from_slice(regs);
            }
            Opcode::Load { x } => {
                let len = usize::from(x) + 1;
                let block = self.memory.slice(usize::from(self.i), len)?;
                self.v[..len].copy_from_slice(block);
            }

            Opcode::Unknown(word) => self.unknown(word)?,
        }

        Ok(Chip8Result::Continue)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    fn key_in(&self, x: u4) -> bool {
        u4::try_from(self.v[x]).is_ok_and(|key| self.keypad.is_down(key))
    }

    /// Draws an `n`-row sprite from I, reading only the rows that land on
    /// screen. Returns whether any lit pixel was erased.
    fn draw(&mut self, x: u8, y: u8, n: u4) -> Result<bool, Chip8Error> {
        let (x, y) = (usize::from(x), usize::from(y));

        let rows = self.display.visible_rows(y, usize::from(n));
        let sprite = self.memory.slice(usize::from(self.i), rows)?;

        Ok(self.display.draw_sprite(x, y, sprite))
    }

    fn unknown(&self, word: u16) -> Result<(), Chip8Error> {
        match self.config().unknown_opcode {
            UnknownOpcodePolicy::Fault => Err(Chip8Error::UnknownOpcode { opcode: word }),
            UnknownOpcodePolicy::Ignore => {
                warn!(
                    "Ignoring unknown opcode {word:#06X} at {:#05X}",
                    self.pc.wrapping_sub(2)
                );
                Ok(())
            }
        }
    }
}
