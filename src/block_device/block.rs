//! emmc-sdhc - Blocks and block addressing

/// A single 512-byte block (or sector) of card storage.
#[derive(Clone)]
pub struct Block {
    /// The raw bytes of the block.
    pub contents: [u8; Block::LEN],
}

impl Block {
    /// Number of bytes in a block.
    pub const LEN: usize = 512;
    /// Number of bytes in a block, as a `u32`.
    pub const LEN_U32: u32 = 512;

    /// Create a block full of zeros.
    pub const fn new() -> Block {
        Block {
            contents: [0u8; Self::LEN],
        }
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

impl core::ops::Deref for Block {
    type Target = [u8; Block::LEN];
    fn deref(&self) -> &Self::Target {
        &self.contents
    }
}

impl core::ops::DerefMut for Block {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.contents
    }
}

impl core::fmt::Debug for Block {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Block:")?;
        for line in self.contents.chunks(32) {
            for b in line {
                write!(f, "{:02x}", b)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The linear index of a block on the card, counted from zero.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockIdx(pub u32);

impl BlockIdx {
    /// The byte offset of the first byte in this block.
    pub fn byte_address(self) -> u64 {
        u64::from(self.0) * u64::from(Block::LEN_U32)
    }
}

impl core::ops::Add<BlockCount> for BlockIdx {
    type Output = BlockIdx;
    fn add(self, rhs: BlockCount) -> BlockIdx {
        BlockIdx(self.0 + rhs.0)
    }
}

/// A number of blocks.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockCount(pub u32);
