/// DD command processor.
///
/// Commands are issued by writing an opcode into the upper halfword of
/// ASIC_CMD_STATUS. Arguments and results travel through ASIC_DATA.
/// Every command, including ones the drive does not understand, finishes
/// by raising MECHA_INT and the DD interrupt.
use super::clock::bcd;
use super::geometry;
use super::regs::*;
use super::DdController;
use crate::bus::InterruptLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdCommand {
    Noop,
    SeekRead,
    SeekWrite,
    Recalibrate,
    Sleep,
    Start,
    SetStandby,
    SetSleep,
    ClrDskChng,
    ClrReset,
    ReadVersion,
    SetDiskType,
    RequestStatus,
    Standby,
    IdxLockRetry,
    SetYearMonth,
    SetDayHour,
    SetMinSec,
    GetYearMonth,
    GetDayHour,
    GetMinSec,
    FeatureInq,
    Unknown(u16),
}

impl DdCommand {
    pub fn from_word(word: u32) -> Self {
        match (word >> 16) as u16 {
            0x00 => Self::Noop,
            0x01 => Self::SeekRead,
            0x02 => Self::SeekWrite,
            0x03 => Self::Recalibrate,
            0x04 => Self::Sleep,
            0x05 => Self::Start,
            0x06 => Self::SetStandby,
            0x07 => Self::SetSleep,
            0x08 => Self::ClrDskChng,
            0x09 => Self::ClrReset,
            0x0A => Self::ReadVersion,
            0x0B => Self::SetDiskType,
            0x0C => Self::RequestStatus,
            0x0D => Self::Standby,
            0x0E => Self::IdxLockRetry,
            0x0F => Self::SetYearMonth,
            0x10 => Self::SetDayHour,
            0x11 => Self::SetMinSec,
            0x12 => Self::GetYearMonth,
            0x13 => Self::GetDayHour,
            0x14 => Self::GetMinSec,
            0x1B => Self::FeatureInq,
            other => Self::Unknown(other),
        }
    }

    pub fn opcode(self) -> u16 {
        match self {
            Self::Noop => 0x00,
            Self::SeekRead => 0x01,
            Self::SeekWrite => 0x02,
            Self::Recalibrate => 0x03,
            Self::Sleep => 0x04,
            Self::Start => 0x05,
            Self::SetStandby => 0x06,
            Self::SetSleep => 0x07,
            Self::ClrDskChng => 0x08,
            Self::ClrReset => 0x09,
            Self::ReadVersion => 0x0A,
            Self::SetDiskType => 0x0B,
            Self::RequestStatus => 0x0C,
            Self::Standby => 0x0D,
            Self::IdxLockRetry => 0x0E,
            Self::SetYearMonth => 0x0F,
            Self::SetDayHour => 0x10,
            Self::SetMinSec => 0x11,
            Self::GetYearMonth => 0x12,
            Self::GetDayHour => 0x13,
            Self::GetMinSec => 0x14,
            Self::FeatureInq => 0x1B,
            Self::Unknown(op) => op,
        }
    }

    /// The ASIC_CMD_STATUS word that issues this command.
    pub fn word(self) -> u32 {
        (self.opcode() as u32) << 16
    }
}

impl DdController {
    pub(super) fn execute_command(&mut self, cmd: DdCommand, irq: &mut impl InterruptLine) {
        log::debug!(
            "DD command: {:?} (DATA={:#010X})",
            cmd,
            self.regs[DdRegister::Data as usize]
        );

        match cmd {
            DdCommand::SeekRead => self.seek(true),
            DdCommand::SeekWrite => self.seek(false),
            DdCommand::Recalibrate => self.regs[DdRegister::Data as usize] = 0,
            DdCommand::Sleep => *self.status_mut() |= STATUS_MTR_N_SPIN | STATUS_HEAD_RTRCT,
            DdCommand::Standby => {
                let status = self.status_mut();
                *status |= STATUS_HEAD_RTRCT;
                *status &= !STATUS_MTR_N_SPIN;
            }
            DdCommand::Start => *self.status_mut() &= !(STATUS_MTR_N_SPIN | STATUS_HEAD_RTRCT),
            DdCommand::ClrDskChng => *self.status_mut() &= !STATUS_DISK_CHNG,
            DdCommand::ClrReset => *self.status_mut() &= !STATUS_RST_STATE,
            DdCommand::FeatureInq => self.regs[DdRegister::Data as usize] = 0x0001_0000,
            DdCommand::IdxLockRetry => self.regs[DdRegister::CurTk as usize] |= CUR_TK_LOCKED,
            DdCommand::GetYearMonth => {
                let now = self.clock.now();
                self.set_data_bcd(now.year.rem_euclid(100) as u8, now.month);
            }
            DdCommand::GetDayHour => {
                let now = self.clock.now();
                self.set_data_bcd(now.day, now.hour);
            }
            DdCommand::GetMinSec => {
                let now = self.clock.now();
                self.set_data_bcd(now.minute, now.second);
            }
            // Recognised by the drive but not emulated: the RTC cannot be
            // set and the drive reports no version or extended status.
            DdCommand::SetYearMonth
            | DdCommand::SetDayHour
            | DdCommand::SetMinSec
            | DdCommand::SetDiskType
            | DdCommand::ReadVersion
            | DdCommand::RequestStatus
            | DdCommand::SetStandby
            | DdCommand::SetSleep
            | DdCommand::Noop => {}
            DdCommand::Unknown(op) => log::debug!("DD: unknown command {:#06X}", op),
        }

        *self.status_mut() |= STATUS_MECHA_INT;
        irq.signal();
    }

    /// SEEK_READ / SEEK_WRITE: latch the target track from ASIC_DATA and
    /// select the buffer manager direction.
    fn seek(&mut self, read: bool) {
        let target = self.regs[DdRegister::Data as usize] | CUR_TK_LOCKED;
        self.regs[DdRegister::CurTk as usize] = target;
        *self.status_mut() &= !(STATUS_MTR_N_SPIN | STATUS_HEAD_RTRCT);
        self.session.mode_read = read;

        let loc = geometry::resolve(target);
        self.session.zone = loc.zone;
        self.session.track_byte_offset = loc.byte_offset;
        log::debug!(
            "DD seek ({}): track {:#X} head {} -> zone {}, offset {:#X}",
            if read { "read" } else { "write" },
            loc.track,
            loc.head,
            loc.zone,
            loc.byte_offset
        );
    }

    fn set_data_bcd(&mut self, hi: u8, lo: u8) {
        self.regs[DdRegister::Data as usize] = (bcd(hi) << 24) | (bcd(lo) << 16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::IrqLine;
    use crate::dd::clock::{FixedClock, RtcTime};

    const ALL_BITS: u32 = 0xFFFF_FFFF;

    fn controller() -> DdController {
        DdController::new(None, vec![0; 0x100]).with_clock(FixedClock(RtcTime {
            year: 1999,
            month: 12,
            day: 31,
            hour: 23,
            minute: 58,
            second: 7,
        }))
    }

    fn issue(dd: &mut DdController, irq: &mut IrqLine, cmd: DdCommand) {
        dd.write_reg(DdRegister::CmdStatus, cmd.word(), ALL_BITS, irq);
    }

    #[test]
    fn opcodes_round_trip() {
        for op in 0..0x20u16 {
            let cmd = DdCommand::from_word((op as u32) << 16);
            assert_eq!(cmd.opcode(), op);
        }
        assert_eq!(DdCommand::from_word(0x001B_0000), DdCommand::FeatureInq);
        assert_eq!(DdCommand::from_word(0x0015_0000), DdCommand::Unknown(0x15));
    }

    #[test]
    fn feature_inquiry_reports_and_interrupts_once() {
        let mut dd = controller();
        let mut irq = IrqLine::new();
        dd.write_reg(DdRegister::CmdStatus, 0x001B_0000, ALL_BITS, &mut irq);

        assert_eq!(dd.reg(DdRegister::Data), 0x0001_0000);
        assert_ne!(dd.reg(DdRegister::CmdStatus) & STATUS_MECHA_INT, 0);
        assert_eq!(irq.signal_count, 1);
        assert!(irq.asserted);
    }

    #[test]
    fn low_halfword_never_reaches_the_decoder() {
        let mut dd = controller();
        let mut irq = IrqLine::new();
        dd.write_reg(DdRegister::CmdStatus, 0x001B_FFFF, ALL_BITS, &mut irq);
        assert_eq!(dd.reg(DdRegister::Data), 0x0001_0000);
    }

    #[test]
    fn seek_read_latches_track_and_geometry() {
        let mut dd = controller();
        let mut irq = IrqLine::new();
        let target = CUR_TK_HEAD | (0x2FB << 16);
        dd.write_reg(DdRegister::Data, target, ALL_BITS, &mut irq);
        issue(&mut dd, &mut irq, DdCommand::SeekRead);

        assert_eq!(dd.reg(DdRegister::CurTk), target | 0x6000_0000);
        let status = dd.reg(DdRegister::CmdStatus);
        assert_eq!(status & (STATUS_MTR_N_SPIN | STATUS_HEAD_RTRCT), 0);
        assert_ne!(status & STATUS_MECHA_INT, 0);

        let loc = geometry::locate(0x2FB, 1);
        let session = dd.session();
        assert!(session.mode_read);
        assert_eq!(session.zone, 13);
        assert_eq!(session.zone, loc.zone);
        assert_eq!(session.track_byte_offset, loc.byte_offset);
        assert_eq!(irq.signal_count, 1);
    }

    #[test]
    fn seek_write_selects_write_mode() {
        let mut dd = controller();
        let mut irq = IrqLine::new();
        issue(&mut dd, &mut irq, DdCommand::SeekRead);
        dd.write_reg(DdRegister::Data, 0x0010_0000, ALL_BITS, &mut irq);
        issue(&mut dd, &mut irq, DdCommand::SeekWrite);

        assert!(!dd.session().mode_read);
        assert_eq!(dd.reg(DdRegister::CurTk), 0x6010_0000);
        assert_eq!(dd.session().track_byte_offset, 0x10 * 232 * 170);
    }

    #[test]
    fn motor_commands_drive_spin_and_head_bits() {
        let mut dd = controller();
        let mut irq = IrqLine::new();
        let bits = |dd: &DdController| {
            dd.reg(DdRegister::CmdStatus) & (STATUS_MTR_N_SPIN | STATUS_HEAD_RTRCT)
        };

        issue(&mut dd, &mut irq, DdCommand::Start);
        assert_eq!(bits(&dd), 0);
        issue(&mut dd, &mut irq, DdCommand::Standby);
        assert_eq!(bits(&dd), STATUS_HEAD_RTRCT);
        issue(&mut dd, &mut irq, DdCommand::Sleep);
        assert_eq!(bits(&dd), STATUS_MTR_N_SPIN | STATUS_HEAD_RTRCT);
        assert_eq!(irq.signal_count, 3);
    }

    #[test]
    fn recalibrate_and_index_lock_retry() {
        let mut dd = controller();
        let mut irq = IrqLine::new();
        dd.write_reg(DdRegister::Data, 0x0042_0000, ALL_BITS, &mut irq);
        issue(&mut dd, &mut irq, DdCommand::Recalibrate);
        assert_eq!(dd.reg(DdRegister::Data), 0);

        issue(&mut dd, &mut irq, DdCommand::IdxLockRetry);
        assert_eq!(dd.reg(DdRegister::CurTk), 0x6000_0000);
    }

    #[test]
    fn clear_reset_clears_only_reset_state() {
        let mut dd = controller();
        let mut irq = IrqLine::new();
        dd.write_reg(DdRegister::HardReset, HARD_RESET_MAGIC, ALL_BITS, &mut irq);
        let before = dd.reg(DdRegister::CmdStatus);
        issue(&mut dd, &mut irq, DdCommand::ClrReset);
        assert_eq!(
            dd.reg(DdRegister::CmdStatus),
            (before & !STATUS_RST_STATE) | STATUS_MECHA_INT
        );
    }

    #[test]
    fn clearing_an_already_clear_disk_change_only_runs_the_epilogue() {
        let mut dd = controller();
        let mut irq = IrqLine::new();
        let regs_before: Vec<u32> = DdRegister::ALL.iter().map(|&r| dd.reg(r)).collect();
        let session_before = *dd.session();

        issue(&mut dd, &mut irq, DdCommand::ClrDskChng);

        for (i, &reg) in DdRegister::ALL.iter().enumerate() {
            let expected = if reg == DdRegister::CmdStatus {
                regs_before[i] | STATUS_MECHA_INT
            } else {
                regs_before[i]
            };
            assert_eq!(dd.reg(reg), expected, "{}", reg.mnemonic());
        }
        assert_eq!(*dd.session(), session_before);
        assert_eq!(irq.signal_count, 1);
    }

    #[test]
    fn unimplemented_and_unknown_opcodes_still_interrupt() {
        let mut dd = controller();
        let mut irq = IrqLine::new();
        let data_before = dd.reg(DdRegister::Data);
        let cmds = [
            DdCommand::Noop,
            DdCommand::SetYearMonth,
            DdCommand::SetDiskType,
            DdCommand::ReadVersion,
            DdCommand::RequestStatus,
            DdCommand::Unknown(0x7F),
        ];
        for cmd in cmds {
            issue(&mut dd, &mut irq, cmd);
        }
        assert_eq!(irq.signal_count, cmds.len() as u64);
        assert_eq!(dd.reg(DdRegister::Data), data_before);
        assert_ne!(dd.reg(DdRegister::CmdStatus) & STATUS_MECHA_INT, 0);
    }

    #[test]
    fn rtc_commands_return_packed_bcd() {
        let mut dd = controller();
        let mut irq = IrqLine::new();

        issue(&mut dd, &mut irq, DdCommand::GetYearMonth);
        assert_eq!(dd.reg(DdRegister::Data), 0x9912_0000);
        issue(&mut dd, &mut irq, DdCommand::GetDayHour);
        assert_eq!(dd.reg(DdRegister::Data), 0x3123_0000);
        issue(&mut dd, &mut irq, DdCommand::GetMinSec);
        assert_eq!(dd.reg(DdRegister::Data), 0x5807_0000);
    }

    #[test]
    fn rtc_year_wraps_to_two_digits() {
        let mut dd = DdController::new(None, Vec::new()).with_clock(FixedClock(RtcTime {
            year: 2026,
            month: 1,
            day: 2,
            hour: 3,
            minute: 4,
            second: 5,
        }));
        let mut irq = IrqLine::new();
        issue(&mut dd, &mut irq, DdCommand::GetYearMonth);
        assert_eq!(dd.reg(DdRegister::Data), 0x2601_0000);
    }
}
