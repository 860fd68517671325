use super::Chip8Error;

// Standard CHIP-8 memory map
pub const MEMORY_SIZE: usize = 4096;
pub const ROM_START_ADDRESS: usize = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - ROM_START_ADDRESS;

/// 4KB byte-addressable memory with bounds-checked access.
///
/// Addresses never wrap: anything at or above `MEMORY_SIZE` is a
/// `MemoryOutOfBounds` fault.
#[derive(Clone, Debug)]
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        Self {
            bytes: [0; MEMORY_SIZE],
        }
    }

    pub fn read(&self, addr: usize) -> Result<u8, Chip8Error> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(Chip8Error::MemoryOutOfBounds { address: addr })
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), Chip8Error> {
        let byte = self
            .bytes
            .get_mut(addr)
            .ok_or(Chip8Error::MemoryOutOfBounds { address: addr })?;
        *byte = value;
        Ok(())
    }

    /// Reads a big-endian 16-bit word.
    pub fn read_word(&self, addr: usize) -> Result<u16, Chip8Error> {
        let high = self.read(addr)?;
        let low = self.read(addr + 1)?;

        Ok(u16::from_be_bytes([high, low]))
    }

    /// Borrows `len` bytes starting at `addr`, failing on the first
    /// address that would fall outside memory.
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8], Chip8Error> {
        self.check_range(addr, len)?;
        Ok(&self.bytes[addr..addr + len])
    }

    pub fn slice_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8], Chip8Error> {
        self.check_range(addr, len)?;
        Ok(&mut self.bytes[addr..addr + len])
    }

    pub fn as_bytes(&self) -> &[u8; MEMORY_SIZE] {
        &self.bytes
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8; MEMORY_SIZE] {
        &mut self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    fn check_range(&self, addr: usize, len: usize) -> Result<(), Chip8Error> {
        if addr > MEMORY_SIZE || addr + len > MEMORY_SIZE {
            return Err(Chip8Error::MemoryOutOfBounds {
                address: addr.max(MEMORY_SIZE),
            });
        }

        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
