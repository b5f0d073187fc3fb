//! emmc-sdhc - Bounded busy-waiting on controller state
//!
//! Nothing here ever blocks forever: every loop runs against a budget in
//! microseconds and gives up with an error once it is spent.

use super::regs::{Interrupt, Reg, Registers, Status};
use super::Error;
use crate::platform::Clock;

#[cfg(feature = "log")]
use log::warn;

#[cfg(feature = "defmt-log")]
use defmt::warn;

/// Ticks of the 1 MHz reference to wait for an interrupt.
pub const INTERRUPT_TIMEOUT_TICKS: u32 = 1_000_000;
/// Microseconds to wait for command inhibit to clear.
pub const COMMAND_TIMEOUT_US: u32 = 1_000_000;
/// Microseconds to wait for data inhibit to clear.
pub const DATA_TIMEOUT_US: u32 = 500_000;

/// A time budget for busy-waiting, spent in fixed steps.
pub struct Delay {
    remaining_us: u32,
    step_us: u32,
}

impl Delay {
    /// A budget of `budget_us` microseconds, spent `step_us` at a time.
    pub fn new(budget_us: u32, step_us: u32) -> Delay {
        Delay {
            remaining_us: budget_us,
            step_us: step_us.max(1),
        }
    }

    /// Busy-wait one step, or fail with `err` if the budget is used up.
    pub fn delay<C>(&mut self, clock: &mut C, err: Error) -> Result<(), Error>
    where
        C: Clock,
    {
        if self.remaining_us == 0 {
            Err(err)
        } else {
            clock.delay_us(self.step_us);
            self.remaining_us = self.remaining_us.saturating_sub(self.step_us);
            Ok(())
        }
    }
}

/// Write-1-to-clear every pending interrupt.
pub fn clear_interrupts<R>(regs: &mut R)
where
    R: Registers,
{
    let pending = regs.read(Reg::Interrupt);
    regs.write(Reg::Interrupt, pending);
}

/// Wait until one of the interrupts in `mask`, or any error, is flagged.
///
/// On success only the bits in `mask` are cleared, so other pending
/// interrupts survive. On failure the whole register is cleared.
pub fn wait_for_interrupt<R, C>(regs: &mut R, clock: &mut C, mask: Interrupt) -> Result<(), Error>
where
    R: Registers,
    C: Clock,
{
    let wait_mask = (mask | Interrupt::ERROR_MASK).bits();
    let start = clock.ticks();
    let mut timed_out = true;
    while clock.ticks().wrapping_sub(start) < INTERRUPT_TIMEOUT_TICKS {
        if regs.read(Reg::Interrupt) & wait_mask != 0 {
            timed_out = false;
            break;
        }
    }

    let irq = Interrupt::from_bits_truncate(regs.read(Reg::Interrupt));
    if timed_out || irq.intersects(Interrupt::CMD_TIMEOUT | Interrupt::DATA_TIMEOUT) {
        warn!("Timed out waiting for {:x}, interrupt {:x}", mask.bits(), irq.bits());
        clear_interrupts(regs);
        return Err(Error::Timeout);
    }
    if irq.intersects(Interrupt::ERROR_MASK) {
        warn!("Error waiting for {:x}, interrupt {:x}", mask.bits(), irq.bits());
        clear_interrupts(regs);
        return Err(Error::Failed);
    }

    regs.write(Reg::Interrupt, mask.bits());
    Ok(())
}

/// Wait for the command line to be free.
pub fn wait_for_command<R, C>(regs: &mut R, clock: &mut C) -> Result<(), Error>
where
    R: Registers,
    C: Clock,
{
    wait_for_status_clear(regs, clock, Status::CMD_INHIBIT, COMMAND_TIMEOUT_US)
}

/// Wait for any data transfer in progress to finish.
pub fn wait_for_data<R, C>(regs: &mut R, clock: &mut C) -> Result<(), Error>
where
    R: Registers,
    C: Clock,
{
    wait_for_status_clear(regs, clock, Status::DAT_INHIBIT, DATA_TIMEOUT_US)
}

fn wait_for_status_clear<R, C>(
    regs: &mut R,
    clock: &mut C,
    inhibit: Status,
    budget_us: u32,
) -> Result<(), Error>
where
    R: Registers,
    C: Clock,
{
    let mut delay = Delay::new(budget_us, 1);
    loop {
        if regs.read(Reg::Interrupt) & Interrupt::ERROR_MASK.bits() != 0 {
            warn!("Error flagged while waiting for {:x} to clear", inhibit.bits());
            return Err(Error::Busy);
        }
        if regs.read(Reg::Status) & inhibit.bits() == 0 {
            return Ok(());
        }
        delay.delay(clock, Error::Busy)?;
    }
}
