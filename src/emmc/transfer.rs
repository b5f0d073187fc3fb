//! emmc-sdhc - Block transfers and erase

use core::convert::TryFrom;

use super::proto::{Cmd, CurrentState};
use super::regs::{Interrupt, Reg, Registers, Status};
use super::wait::{wait_for_data, wait_for_interrupt, Delay};
use super::{Emmc, Error, Support};
use crate::block_device::{Block, BlockCount, BlockDevice, BlockIdx};
use crate::platform::{Board, Clock};

#[cfg(feature = "log")]
use log::{trace, warn};

#[cfg(feature = "defmt-log")]
use defmt::{trace, warn};

/// Words of FIFO data per block.
const WORDS_PER_BLOCK: usize = Block::LEN / 4;

/// BLKCNT is 16 bits wide.
const MAX_BLOCKS_PER_TRANSFER: usize = u16::MAX as usize;

/// Microseconds to wait for an erase to finish.
const ERASE_TIMEOUT_US: u32 = 1_000_000;

/// Where the data of a transfer comes from or goes to.
#[derive(Debug)]
pub enum DataBuffer<'a> {
    /// Read from the card into the buffer.
    Read(&'a mut [u8]),
    /// Write the buffer to the card.
    Write(&'a [u8]),
}

/// One or more whole blocks the data FIFO is drained into or filled from.
trait BlockBuffer {
    /// Bytes available.
    fn len(&self) -> usize;

    fn is_write(&self) -> bool;

    /// Move block `index` through the data FIFO.
    fn exchange<R: Registers>(&mut self, regs: &mut R, index: usize);
}

impl<'a> BlockBuffer for DataBuffer<'a> {
    fn len(&self) -> usize {
        match self {
            DataBuffer::Read(b) => b.len(),
            DataBuffer::Write(b) => b.len(),
        }
    }

    fn is_write(&self) -> bool {
        matches!(self, DataBuffer::Write(_))
    }

    fn exchange<R: Registers>(&mut self, regs: &mut R, index: usize) {
        let range = index * Block::LEN..(index + 1) * Block::LEN;
        match self {
            DataBuffer::Read(b) => read_fifo_block(regs, &mut b[range]),
            DataBuffer::Write(b) => write_fifo_block(regs, &b[range]),
        }
    }
}

/// Blocks handed over by the block device interface.
enum Blocks<'a> {
    Read(&'a mut [Block]),
    Write(&'a [Block]),
}

impl<'a> BlockBuffer for Blocks<'a> {
    fn len(&self) -> usize {
        match self {
            Blocks::Read(b) => b.len() * Block::LEN,
            Blocks::Write(b) => b.len() * Block::LEN,
        }
    }

    fn is_write(&self) -> bool {
        matches!(self, Blocks::Write(_))
    }

    fn exchange<R: Registers>(&mut self, regs: &mut R, index: usize) {
        match self {
            Blocks::Read(b) => read_fifo_block(regs, &mut b[index].contents),
            Blocks::Write(b) => write_fifo_block(regs, &b[index].contents),
        }
    }
}

fn read_fifo_block<R: Registers>(regs: &mut R, block: &mut [u8]) {
    for chunk in block.chunks_exact_mut(4).take(WORDS_PER_BLOCK) {
        let word = regs.read(Reg::Data);
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

fn write_fifo_block<R: Registers>(regs: &mut R, block: &[u8]) {
    for chunk in block.chunks_exact(4).take(WORDS_PER_BLOCK) {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        regs.write(Reg::Data, word);
    }
}

impl<R, C, B> Emmc<R, C, B>
where
    R: Registers,
    C: Clock,
    B: Board,
{
    /// Read `block_count` blocks starting at byte `address` into `buffer`.
    pub fn read_blocks(
        &mut self,
        address: u64,
        block_count: u32,
        buffer: &mut [u8],
    ) -> Result<(), Error> {
        self.transfer(address, block_count, DataBuffer::Read(buffer))
    }

    /// Write `block_count` blocks from `buffer` starting at byte `address`.
    pub fn write_blocks(
        &mut self,
        address: u64,
        block_count: u32,
        buffer: &[u8],
    ) -> Result<(), Error> {
        self.transfer(address, block_count, DataBuffer::Write(buffer))
    }

    /// Move `block_count` 512-byte blocks between the card, starting at
    /// byte `address`, and the buffer.
    ///
    /// High capacity cards only take addresses on a block boundary; the low
    /// nine bits are dropped.
    pub fn transfer(
        &mut self,
        address: u64,
        block_count: u32,
        mut buffer: DataBuffer<'_>,
    ) -> Result<(), Error> {
        self.transfer_buffer(address, block_count, &mut buffer)
    }

    fn transfer_buffer<T>(
        &mut self,
        address: u64,
        block_count: u32,
        buffer: &mut T,
    ) -> Result<(), Error>
    where
        T: BlockBuffer,
    {
        self.check_ready()?;

        let num_blocks = u16::try_from(block_count).map_err(|_| Error::Failed)?;
        if buffer.len() < usize::from(num_blocks) * Block::LEN {
            warn!(
                "Buffer of {} bytes too small for {} blocks",
                buffer.len(),
                num_blocks
            );
            return Err(Error::Failed);
        }
        if num_blocks == 0 {
            return Ok(());
        }

        let write = buffer.is_write();
        let (ready, cmd) = match (write, num_blocks) {
            (false, 1) => (Interrupt::READ_RDY, Cmd::ReadSingle),
            (false, _) => (Interrupt::READ_RDY, Cmd::ReadMulti),
            (true, 1) => (Interrupt::WRITE_RDY, Cmd::WriteSingle),
            (true, _) => (Interrupt::WRITE_RDY, Cmd::WriteMulti),
        };
        let multi = num_blocks > 1;
        let set_block_count = self.card.support.contains(Support::SET_BLOCK_COUNT);

        if multi && set_block_count {
            self.send_with_arg(Cmd::SetBlockCnt, u32::from(num_blocks))?;
        }

        let block_address = self.block_address(address)?;
        trace!(
            "{} {} blocks at {:x}",
            cmd.command().name,
            num_blocks,
            block_address
        );

        // With TM_BLKCNT_EN set the controller counts BLKCNT down as blocks
        // go by and stops the transfer at zero.
        self.regs.write(
            Reg::BlkSizeCnt,
            (u32::from(num_blocks) << 16) | Block::LEN as u32,
        );
        self.send_with_arg(cmd, block_address)?;

        let mut blocks_done = 0;
        while blocks_done < usize::from(num_blocks) {
            if let Err(e) = wait_for_interrupt(&mut self.regs, &mut self.clock, ready) {
                warn!("No ready for block {}: {:?}", blocks_done, e);
                break;
            }
            buffer.exchange(&mut self.regs, blocks_done);
            blocks_done += 1;
        }

        if blocks_done != usize::from(num_blocks) {
            warn!("Transfer only did {}/{} blocks", blocks_done, num_blocks);
            if !write && multi {
                // Best effort, the transfer has failed anyway.
                if let Err(e) = self.send(Cmd::StopTrans) {
                    warn!("STOP_TRANS failed too: {:?}", e);
                }
            }
            return Err(Error::Timeout);
        }

        if write {
            wait_for_interrupt(&mut self.regs, &mut self.clock, Interrupt::DATA_DONE)?;
        }

        // Without SET_BLOCKCNT the card doesn't know where the transfer ends.
        if multi && !set_block_count {
            self.send(Cmd::StopTrans)?;
        }
        Ok(())
    }

    /// Erase `block_count` blocks starting at byte `address`.
    pub fn erase(&mut self, address: u64, block_count: u32) -> Result<(), Error> {
        self.check_ready()?;
        if block_count == 0 {
            return Ok(());
        }

        let start = self.block_address(address)?;
        let end = (block_count - 1)
            .checked_mul(self.card.block_stride())
            .and_then(|span| start.checked_add(span))
            .ok_or(Error::Failed)?;
        trace!("Erase {:x}..={:x}", start, end);

        self.send_with_arg(Cmd::EraseWrSt, start)?;
        self.send_with_arg(Cmd::EraseWrEnd, end)?;
        self.send(Cmd::Erase)?;

        let mut delay = Delay::new(ERASE_TIMEOUT_US, 10);
        while self.regs.read(Reg::Status) & Status::DAT_INHIBIT.bits() != 0 {
            delay.delay(&mut self.clock, Error::Timeout)?;
        }
        Ok(())
    }

    /// Ask the card for its status and return the state it is in.
    pub fn send_status(&mut self) -> Result<CurrentState, Error> {
        if !self.card.init {
            return Err(Error::NoResponse);
        }
        self.send(Cmd::SendStatus)?;
        Ok(self.card.card_state)
    }

    /// The argument data commands take for byte `address` on this card.
    pub fn block_address(&self, address: u64) -> Result<u32, Error> {
        self.card.block_address(address).ok_or(Error::Failed)
    }

    /// Data operations need an initialized card and an idle data line.
    fn check_ready(&mut self) -> Result<(), Error> {
        if !self.card.init {
            return Err(Error::NoResponse);
        }
        wait_for_data(&mut self.regs, &mut self.clock).map_err(|_| Error::Timeout)
    }
}

impl<R, C, B> BlockDevice for Emmc<R, C, B>
where
    R: Registers,
    C: Clock,
    B: Board,
{
    type Error = Error;

    /// Read one or more blocks, starting at the given block index.
    fn read(&mut self, blocks: &mut [Block], start_block_idx: BlockIdx) -> Result<(), Self::Error> {
        let mut address = start_block_idx.byte_address();
        for run in blocks.chunks_mut(MAX_BLOCKS_PER_TRANSFER) {
            let count = run.len() as u32;
            self.transfer_buffer(address, count, &mut Blocks::Read(run))?;
            address += u64::from(count) * u64::from(Block::LEN_U32);
        }
        Ok(())
    }

    /// Write one or more blocks, starting at the given block index.
    fn write(&mut self, blocks: &[Block], start_block_idx: BlockIdx) -> Result<(), Self::Error> {
        let mut address = start_block_idx.byte_address();
        for run in blocks.chunks(MAX_BLOCKS_PER_TRANSFER) {
            let count = run.len() as u32;
            self.transfer_buffer(address, count, &mut Blocks::Write(run))?;
            address += u64::from(count) * u64::from(Block::LEN_U32);
        }
        Ok(())
    }

    /// Determine how many blocks this device can hold.
    fn num_blocks(&mut self) -> Result<BlockCount, Self::Error> {
        if !self.card.init {
            return Err(Error::NoResponse);
        }
        let num_blocks = self.card.capacity / u64::from(Block::LEN_U32);
        Ok(BlockCount(u32::try_from(num_blocks).map_err(|_| Error::Failed)?))
    }
}
