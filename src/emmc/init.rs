//! emmc-sdhc - Card initialization

use super::card::{CardState, CardType};
use super::proto::{Cmd, Ocr, BUS_WIDTH_4_ARG, FREQ_NORMAL, FREQ_SETUP, IF_COND_ARG};
use super::regs::{Control0, Control1, HostVersion, Interrupt, Reg, Registers, Status};
use super::wait::{wait_for_data, wait_for_interrupt, Delay};
use super::{Emmc, Error, Support};
use crate::platform::{Board, Clock, EMMC_PINS};

#[cfg(feature = "log")]
use log::{debug, trace, warn};

#[cfg(feature = "defmt-log")]
use defmt::{debug, trace, warn};

/// Ticks of the 1 MHz reference to keep repeating ACMD41. The card gets at
/// least a second to power up.
const OP_COND_TIMEOUT_TICKS: u32 = 1_500_000;

impl<R, C, B> Emmc<R, C, B>
where
    R: Registers,
    C: Clock,
    B: Board,
{
    /// Bring the card from power-on to ready for data transfer.
    ///
    /// Does nothing if the card is already initialized. A failure leaves the
    /// card uninitialized; calling this again starts over from the reset.
    pub fn initialize(&mut self) -> Result<(), Error> {
        if self.card.init {
            return Ok(());
        }

        for pin in EMMC_PINS.iter() {
            self.board.configure_emmc_pin(*pin);
        }

        self.host_version = HostVersion::from_slotisr_ver(self.regs.read(Reg::SlotIsrVer));
        self.base_clock_hz = self.board.base_clock_hz().map_err(|_e| {
            warn!("Can't get the EMMC base clock rate");
            Error::Failed
        })?;
        debug!(
            "Host version {:?}, base clock {} Hz",
            self.host_version, self.base_clock_hz
        );

        self.reset()?;

        match self.send_with_arg(Cmd::SendIfCond, IF_COND_ARG) {
            Ok(()) => {
                self.negotiate_op_cond(Ocr::ARG_HC)?;
                let card_type = if self.ocr().contains(Ocr::CCS) {
                    CardType::Sd2Hc
                } else {
                    CardType::Sd2Sc
                };
                self.card.card_type = Some(card_type);
            }
            Err(Error::Busy) => {
                warn!("Card busy after SEND_IF_COND");
                return Err(Error::Busy);
            }
            Err(_e) => {
                debug!("No answer to SEND_IF_COND, assuming a version 1 card");
                if self.regs.read(Reg::Status) & Status::CMD_INHIBIT.bits() != 0 {
                    self.reset()?;
                }
                self.negotiate_op_cond(Ocr::ARG_SC)?;
                self.card.card_type = Some(CardType::Sd1);
            }
        }
        debug!("Card type: {:?}", self.card.card_type);

        if self.ocr().contains(Ocr::S18) {
            self.switch_voltage()?;
        }

        self.send(Cmd::AllSendCid)?;
        self.send(Cmd::SendRelAddr)?;
        let cid = self.card.cid;
        let name = cid.product_name();
        debug!(
            "Card {} mfr {:x} oem {:x} rev {:x} serial {:x} made {}/{}, RCA {:x}, state {:?}",
            core::str::from_utf8(&name).unwrap_or("?"),
            cid.manufacturer_id(),
            cid.oem_id(),
            cid.product_revision(),
            cid.serial_number(),
            cid.manufacturing_month(),
            cid.manufacturing_year(),
            self.card.rca,
            self.card.card_state
        );

        self.send(Cmd::SendCsd)?;
        self.card.parse_csd();
        debug!(
            "Capacity {} bytes, file format {:?}",
            self.card.capacity, self.card.file_format
        );
        if !self.card.file_format.is_supported() {
            warn!("Unsupported file format {:?}", self.card.file_format);
            return Err(Error::Failed);
        }

        self.set_clock(FREQ_NORMAL)?;

        self.send(Cmd::CardSelect)?;

        // The SCR tells us which bus widths are allowed.
        self.read_scr()?;

        if self.card.support.contains(Support::BUS_WIDTH_4) {
            let arg = self.card.rca_arg() | BUS_WIDTH_4_ARG;
            self.send_with_arg(Cmd::SetBusWidth, arg)?;
            self.regs
                .modify(Reg::Control0, |v| v | Control0::HCTL_DWIDTH.bits());
            debug!("4-bit bus enabled");
        }

        self.send_with_arg(Cmd::SetBlockLen, 512)?;

        self.card.init = true;
        Ok(())
    }

    fn ocr(&self) -> Ocr {
        Ocr::from_bits_truncate(self.card.ocr)
    }

    /// Reset the host controller and put the card in the idle state.
    fn reset(&mut self) -> Result<(), Error> {
        trace!("Reset host controller..");
        self.regs.write(Reg::Control0, 0);
        self.regs
            .modify(Reg::Control1, |v| v | Control1::SRST_HC.bits());
        self.clock.delay_us(10);

        let mut delay = Delay::new(100_000, 10);
        while self.regs.read(Reg::Control1) & Control1::SRST_HC.bits() != 0 {
            delay.delay(&mut self.clock, Error::Reset)?;
        }

        self.regs.modify(Reg::Control1, |v| {
            v | (Control1::CLK_INTLEN | Control1::TOUNIT_MAX).bits()
        });
        self.clock.delay_us(10);

        self.set_clock(FREQ_SETUP)?;

        self.regs.write(Reg::IrptEn, 0xffff_ffff);
        self.regs.write(Reg::IrptMask, 0xffff_ffff);

        self.card = CardState::default();

        self.send(Cmd::GoIdleState)
    }

    /// Repeat ACMD41 until the card reports power up complete.
    fn negotiate_op_cond(&mut self, arg: Ocr) -> Result<(), Error> {
        let start = self.clock.ticks();
        loop {
            match self.send_with_arg(Cmd::AppSendOpCond, arg.bits()) {
                Ok(()) | Err(Error::Timeout) => {}
                Err(e) => {
                    warn!("ACMD41 failed: {:?}", e);
                    return Err(e);
                }
            }
            if self.ocr().contains(Ocr::COMPLETE)
                || self.clock.ticks().wrapping_sub(start) >= OP_COND_TIMEOUT_TICKS
            {
                break;
            }
        }

        let ocr = self.ocr();
        if !ocr.contains(Ocr::COMPLETE) {
            warn!("Card didn't finish powering up, OCR {:x}", ocr.bits());
            return Err(Error::Timeout);
        }
        if !ocr.intersects(Ocr::VOLTAGE) {
            warn!("No voltage accepted, OCR {:x}", ocr.bits());
            return Err(Error::Voltage);
        }
        Ok(())
    }

    /// The EMMC controller is fixed at 3.3V, so there is nothing to switch.
    fn switch_voltage(&mut self) -> Result<(), Error> {
        debug!("Card accepts 1.8V, staying at 3.3V");
        self.card.uhsi = true;
        Ok(())
    }

    /// Read the SD configuration register and record the optional features
    /// it lists.
    fn read_scr(&mut self) -> Result<(), Error> {
        wait_for_data(&mut self.regs, &mut self.clock).map_err(|_| Error::Timeout)?;

        // One block of 8 bytes.
        self.regs.write(Reg::BlkSizeCnt, (1 << 16) | 8);
        self.send(Cmd::SendScr)?;
        wait_for_interrupt(&mut self.regs, &mut self.clock, Interrupt::READ_RDY)?;

        let mut delay = Delay::new(100_000, 1);
        let mut num_read = 0;
        while num_read < self.card.scr.data.len() {
            if self.regs.read(Reg::Status) & Status::READ_AVAILABLE.bits() != 0 {
                self.card.scr.data[num_read] = self.regs.read(Reg::Data);
                num_read += 1;
            } else if delay.delay(&mut self.clock, Error::Timeout).is_err() {
                warn!("Only read {} words of the SCR", num_read);
                return Err(Error::Timeout);
            }
        }

        self.card.support |= self.card.scr.support();
        debug!(
            "SCR {:x} {:x}, spec {}, support {:x}",
            self.card.scr.data[0],
            self.card.scr.data[1],
            self.card.scr.sd_spec(),
            self.card.support.bits()
        );
        Ok(())
    }
}
