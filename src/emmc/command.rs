//! emmc-sdhc - Command dispatch and response decoding

use super::proto::{r6_status, CardStatus, Cmd, CurrentState, Response};
use super::regs::{Interrupt, Reg, Registers};
use super::wait::{clear_interrupts, wait_for_command, wait_for_interrupt};
use super::{Emmc, Error};
use crate::platform::{Board, Clock};

#[cfg(feature = "log")]
use log::{trace, warn};

#[cfg(feature = "defmt-log")]
use defmt::{trace, warn};

impl<R, C, B> Emmc<R, C, B>
where
    R: Registers,
    C: Clock,
    B: Board,
{
    /// Send a command with its implicit argument: the RCA if the command
    /// addresses the card, zero otherwise. APP_CMD is sent first if needed.
    pub(crate) fn send(&mut self, cmd: Cmd) -> Result<(), Error> {
        let arg = if cmd.command().rca {
            self.card.rca_arg()
        } else {
            0
        };
        self.send_with_arg(cmd, arg)
    }

    /// Send a command with an explicit argument. APP_CMD is sent first if
    /// needed.
    pub(crate) fn send_with_arg(&mut self, cmd: Cmd, arg: u32) -> Result<(), Error> {
        if cmd.is_app() {
            self.send_app_cmd()?;
        }
        self.send_raw(cmd, arg)?;
        // Once the card has an RCA its response tells us whether it took
        // the command as an application command.
        if cmd.is_app() && self.card.rca != 0 && !self.app_cmd_accepted() {
            warn!("{} not taken as an application command", cmd.command().name);
            return Err(Error::AppCmd);
        }
        Ok(())
    }

    fn send_app_cmd(&mut self) -> Result<(), Error> {
        if self.card.rca == 0 {
            // No RCA, no status to check. Send errors still propagate.
            return self.send_raw(Cmd::AppCmd, 0);
        }
        let arg = self.card.rca_arg();
        self.send_raw(Cmd::AppCmdRca, arg)?;
        if !self.app_cmd_accepted() {
            warn!("APP_CMD not accepted, status {:x}", self.card.status);
            return Err(Error::AppCmd);
        }
        Ok(())
    }

    fn app_cmd_accepted(&self) -> bool {
        CardStatus::from_word(self.card.status).contains(CardStatus::APP_CMD)
    }

    /// Issue one command and decode its response into the card state.
    fn send_raw(&mut self, cmd: Cmd, arg: u32) -> Result<(), Error> {
        wait_for_command(&mut self.regs, &mut self.clock)?;

        let command = cmd.command();
        trace!("Sending {} arg {:x}", command.name, arg);
        self.card.last_cmd = Some(cmd);
        self.card.last_arg = arg;

        clear_interrupts(&mut self.regs);
        self.regs.write(Reg::Arg1, arg);
        self.regs.write(Reg::CmdTm, command.code);
        if command.delay_us != 0 {
            self.clock.delay_us(command.delay_us);
        }

        wait_for_interrupt(&mut self.regs, &mut self.clock, Interrupt::CMD_DONE)?;

        let resp0 = self.regs.read(Reg::Resp0);
        match command.response {
            Response::None => Ok(()),
            Response::R1 | Response::R1b => {
                self.card.status = resp0;
                // The state the card was in when it accepted the command.
                self.card.card_state = CurrentState::from_status(resp0);
                self.check_status(command.name)
            }
            Response::R2Cid | Response::R2Csd => {
                self.card.status = 0;
                let data = [
                    self.regs.read(Reg::Resp3),
                    self.regs.read(Reg::Resp2),
                    self.regs.read(Reg::Resp1),
                    resp0,
                ];
                if command.response == Response::R2Cid {
                    self.card.cid.data = data;
                } else {
                    self.card.csd.data = data;
                }
                Ok(())
            }
            Response::R3 => {
                self.card.status = 0;
                self.card.ocr = resp0;
                Ok(())
            }
            Response::R6 => {
                let rca = (resp0 >> 16) as u16;
                self.card.status = r6_status(resp0);
                self.card.card_state = CurrentState::from_status(resp0);
                self.check_status(command.name)?;
                // Only a clean response enumerates the card.
                self.card.rca = rca;
                Ok(())
            }
            Response::R7 => {
                self.card.status = 0;
                if resp0 == arg {
                    Ok(())
                } else {
                    warn!("{} echoed {:x}, sent {:x}", command.name, resp0, arg);
                    Err(Error::Failed)
                }
            }
        }
    }

    fn check_status(&self, name: &str) -> Result<(), Error> {
        let errors = self.card.status & CardStatus::ERRORS.bits();
        if errors != 0 {
            warn!("{} failed, card status {:x}", name, self.card.status);
            Err(Error::Failed)
        } else {
            Ok(())
        }
    }
}
