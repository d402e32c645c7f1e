pub mod bm;
pub mod buffers;
pub mod clock;
pub mod command;
pub mod geometry;
pub mod mmio;
pub mod regs;

use crate::bus::InterruptLine;
use crate::trace::{NoopTracer, RegisterTracer};
use buffers::{C2S_BUFFER_LEN, DS_BUFFER_LEN, MS_RAM_LEN};
use clock::{Clock, SystemClock};
use regs::*;

pub use command::DdCommand;
pub use regs::DdRegister;

/// Transient controller state that is not visible through any register.
///
/// Reset at power-on. `reset_hold` and `current_block` are also cleared
/// on the trailing edge of a BM reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub reset_hold: bool,
    /// Buffer manager direction: true = disk -> host, false = host -> disk.
    pub mode_read: bool,
    /// 0 or 1. Always agrees with ASIC_CUR_SECTOR (>= 0x5A means block 1).
    pub current_block: u32,
    pub zone: usize,
    pub track_byte_offset: u32,
    /// Set once sector 0x59 has been replayed for the current transfer.
    pub sector55_skipped: bool,
}

/// 64DD controller: the ASIC register file, its command processor and
/// buffer manager, the three sector buffers and the loaded media.
///
/// One instance per drive. The bus owns it and passes the interrupt line
/// in on every access that can raise or drop the DD interrupt.
pub struct DdController {
    regs: [u32; NUM_REGISTERS],
    session: Session,
    /// Disk image. Empty means no disk in the drive.
    disk: Vec<u8>,
    /// Set when the buffer manager has committed a sector to `disk`.
    dirty: bool,
    ipl_rom: Option<Vec<u8>>,
    c2s_buffer: [u8; C2S_BUFFER_LEN],
    ds_buffer: [u8; DS_BUFFER_LEN],
    ms_ram: [u8; MS_RAM_LEN],
    clock: Box<dyn Clock>,
    tracer: Box<dyn RegisterTracer>,
}

impl DdController {
    /// Power on the drive with an optional IPL ROM and a disk image.
    pub fn new(ipl_rom: Option<Vec<u8>>, disk: Vec<u8>) -> Self {
        let mut regs = [0u32; NUM_REGISTERS];
        regs[DdRegister::IdReg as usize] = if ipl_rom.is_some() {
            ID_WITH_IPL
        } else {
            ID_WITHOUT_IPL
        };

        let mut status = STATUS_MTR_N_SPIN | STATUS_HEAD_RTRCT;
        if !disk.is_empty() {
            status |= STATUS_DISK_PRES;
        }
        regs[DdRegister::CmdStatus as usize] = status;

        log::info!(
            "DD: init (IPL ROM: {}, disk: {:#X} bytes)",
            if ipl_rom.is_some() { "present" } else { "absent" },
            disk.len()
        );

        Self {
            regs,
            session: Session::default(),
            disk,
            dirty: false,
            ipl_rom,
            c2s_buffer: [0; C2S_BUFFER_LEN],
            ds_buffer: [0; DS_BUFFER_LEN],
            ms_ram: [0; MS_RAM_LEN],
            clock: Box::new(SystemClock),
            tracer: Box::new(NoopTracer),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_tracer(mut self, tracer: impl RegisterTracer + 'static) -> Self {
        self.tracer = Box::new(tracer);
        self
    }

    /// Register contents without any read side effects.
    pub fn reg(&self, reg: DdRegister) -> u32 {
        self.regs[reg as usize]
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn disk_present(&self) -> bool {
        !self.disk.is_empty()
    }

    pub fn has_ipl_rom(&self) -> bool {
        self.ipl_rom.is_some()
    }

    /// Disk image contents, including any sectors written back by the BM.
    pub fn disk_data(&self) -> &[u8] {
        &self.disk
    }

    /// True once any sector has been written back into the disk image.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read a register as the CPU would.
    ///
    /// Polling ASIC_CMD_STATUS while a BM interrupt is pending past the
    /// user-data sectors drains the interrupt and steps the buffer
    /// manager. The returned word is the value before that step.
    pub fn read_reg(&mut self, reg: DdRegister, irq: &mut impl InterruptLine) -> u32 {
        let word = self.regs[reg as usize];
        self.tracer.on_read(reg.mnemonic(), word);

        if reg == DdRegister::CmdStatus
            && word & STATUS_BM_INT != 0
            && self.sector_in_block() > geometry::SECTORS_PER_BLOCK
        {
            self.regs[DdRegister::CmdStatus as usize] &= !STATUS_BM_INT;
            irq.clear();
            log::trace!("DD: status poll drained BM interrupt, stepping BM");
            self.update_bm(irq);
        }

        word
    }

    /// Write a register as the CPU would. `mask` selects the driven bits.
    ///
    /// Panics if ASIC_HARD_RESET is written with anything but the magic
    /// word: software that does that has broken the drive's contract.
    pub fn write_reg(&mut self, reg: DdRegister, word: u32, mask: u32, irq: &mut impl InterruptLine) {
        self.tracer.on_write(reg.mnemonic(), word, mask);

        // The low halfword is never latched.
        let word = word & 0xFFFF_0000;

        match reg {
            DdRegister::CmdStatus => self.execute_command(DdCommand::from_word(word), irq),
            DdRegister::BmStatusCtl => self.write_bm_control(word, irq),
            DdRegister::HardReset => {
                assert!(
                    word == HARD_RESET_MAGIC,
                    "DD: hard reset written without magic word ({:#010X})",
                    word
                );
                self.regs[DdRegister::CmdStatus as usize] |= STATUS_RST_STATE;
            }
            r if r.is_read_only() => {
                log::debug!("DD: dropped write to read-only {} = {:#010X}", r.mnemonic(), word);
            }
            r => {
                let slot = &mut self.regs[r as usize];
                *slot = (*slot & !mask) | word;
            }
        }
    }

    /// Sector index within the current block, from ASIC_CUR_SECTOR.
    fn sector_in_block(&self) -> u32 {
        let sector = self.regs[DdRegister::CurSector as usize] >> 16;
        if sector >= bm::BLOCK_SECTOR_STRIDE {
            sector - bm::BLOCK_SECTOR_STRIDE
        } else {
            sector
        }
    }

    fn status_mut(&mut self) -> &mut u32 {
        &mut self.regs[DdRegister::CmdStatus as usize]
    }

    fn bm_status_mut(&mut self) -> &mut u32 {
        &mut self.regs[DdRegister::BmStatusCtl as usize]
    }
}
