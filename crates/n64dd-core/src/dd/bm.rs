/// DD buffer manager: moves one sector per step between the DS buffer
/// and the disk image.
///
/// A track holds two blocks. Each block is 85 user sectors, then 4 C2
/// (ECC) sectors, then a gap sector, so ASIC_CUR_SECTOR counts 0..0x59
/// in block 0 and 0x5A..0xB3 in block 1. Nothing here is time driven:
/// the BM steps when the host starts it through ASIC_BM_STATUS_CTL and
/// when the host polls ASIC_CMD_STATUS past the user sectors.
use super::geometry::{self, SECTORS_PER_BLOCK};
use super::regs::*;
use super::DdController;
use crate::bus::InterruptLine;

/// Sector-register distance between block 0 and block 1.
pub const BLOCK_SECTOR_STRIDE: u32 = 0x5A;
pub const C2_SECTORS: u32 = 4;
/// Gap after the C2 sectors (0x59).
pub const GAP_SECTOR: u32 = SECTORS_PER_BLOCK + C2_SECTORS;
/// Track whose block 0 is served from the IPL ROM instead of the disk.
pub const IPL_TRACK: u32 = 6;

impl DdController {
    /// ASIC_BM_STATUS_CTL write.
    pub(super) fn write_bm_control(&mut self, word: u32, irq: &mut impl InterruptLine) {
        if word & BM_CTL_RESET != 0 {
            self.session.reset_hold = true;
        } else if self.session.reset_hold {
            // Trailing edge of a BM reset.
            self.session.reset_hold = false;
            *self.bm_status_mut() = 0;
            self.regs[DdRegister::CurSector as usize] = 0;
            *self.status_mut() &=
                !(STATUS_BM_INT | STATUS_BM_ERR | STATUS_DATA_RQ | STATUS_C2_XFER);
            self.session.current_block = 0;
            log::debug!("DD BM: reset released");
        }

        if word & BM_CTL_MECHA_RST != 0 {
            *self.status_mut() &= !STATUS_MECHA_INT;
        }

        if word & BM_CTL_BLK_TRANS != 0 {
            *self.bm_status_mut() |= BM_STATUS_BLOCK;
        } else {
            *self.bm_status_mut() &= !BM_STATUS_BLOCK;
        }

        let sector = word & BM_CTL_SECTOR_MASK;
        self.regs[DdRegister::CurSector as usize] = sector;
        self.session.current_block = u32::from((sector >> 16) >= BLOCK_SECTOR_STRIDE);

        if self.regs[DdRegister::CmdStatus as usize] & (STATUS_BM_INT | STATUS_MECHA_INT) == 0 {
            irq.clear();
        }

        if word & BM_CTL_START != 0 {
            *self.bm_status_mut() |= BM_STATUS_RUNNING;
            self.session.sector55_skipped = false;
            log::debug!(
                "DD BM: start ({}) at sector {:#X}",
                if self.session.mode_read { "read" } else { "write" },
                sector >> 16
            );
            self.update_bm(irq);
        }
    }

    /// Advance the buffer manager by one sector, if it is running.
    pub(super) fn update_bm(&mut self, irq: &mut impl InterruptLine) {
        if self.regs[DdRegister::BmStatusCtl as usize] & BM_STATUS_RUNNING == 0 {
            return;
        }

        let mut sector = self.regs[DdRegister::CurSector as usize] >> 16;
        if sector >= BLOCK_SECTOR_STRIDE {
            self.session.current_block = 1;
            sector -= BLOCK_SECTOR_STRIDE;
        }

        let sector = if self.session.mode_read {
            self.bm_read_step(sector)
        } else {
            self.bm_write_step(sector)
        };

        self.regs[DdRegister::CurSector as usize] =
            (sector + BLOCK_SECTOR_STRIDE * self.session.current_block) << 16;
        *self.status_mut() |= STATUS_BM_INT;
        irq.signal();
    }

    /// Host -> disk. Sector 0 only requests data; every later step commits
    /// the sector the host filled in response to the previous request.
    fn bm_write_step(&mut self, mut sector: u32) -> u32 {
        log::trace!(
            "DD BM write: block {} sector {:#X}",
            self.current_block_number(),
            sector
        );

        if sector == 0 {
            sector += 1;
            *self.status_mut() |= STATUS_DATA_RQ;
        } else if sector < SECTORS_PER_BLOCK {
            self.commit_sector(sector - 1);
            sector += 1;
            *self.status_mut() |= STATUS_DATA_RQ;
        } else if sector == SECTORS_PER_BLOCK {
            self.commit_sector(sector - 1);
            if self.regs[DdRegister::BmStatusCtl as usize] & BM_STATUS_BLOCK != 0 {
                sector = 1;
                self.session.current_block = 1 - self.session.current_block;
                *self.bm_status_mut() &= !BM_STATUS_BLOCK;
                *self.status_mut() |= STATUS_DATA_RQ;
            } else {
                sector += 1;
                *self.bm_status_mut() &= !BM_STATUS_RUNNING;
                log::debug!("DD BM: write transfer complete");
            }
        }
        sector
    }

    /// Disk -> host.
    fn bm_read_step(&mut self, mut sector: u32) -> u32 {
        log::trace!(
            "DD BM read: block {} sector {:#X}",
            self.current_block_number(),
            sector
        );
        let track = (self.regs[DdRegister::CurTk as usize] & CUR_TK_TRACK_MASK) >> 16;

        *self.status_mut() &= !(STATUS_DATA_RQ | STATUS_C2_XFER);

        // The IPL expects the gap to be reported twice per transfer.
        if !self.session.sector55_skipped && sector == GAP_SECTOR {
            self.session.sector55_skipped = true;
            sector -= 1;
        }

        if track == IPL_TRACK && self.session.current_block == 0 && self.ipl_rom.is_some() {
            *self.status_mut() &= !STATUS_DATA_RQ;
        } else if sector < SECTORS_PER_BLOCK {
            self.read_sector(sector);
            sector += 1;
            *self.status_mut() |= STATUS_DATA_RQ;
        } else if sector < GAP_SECTOR {
            sector += 1;
            if sector == GAP_SECTOR {
                // No real Reed-Solomon; the host only needs the transfer.
                self.c2s_buffer.fill(0);
                *self.status_mut() |= STATUS_C2_XFER;
            }
        } else if sector == GAP_SECTOR {
            if self.regs[DdRegister::BmStatusCtl as usize] & BM_STATUS_BLOCK != 0 {
                self.session.current_block = 1 - self.session.current_block;
                sector = 0;
                *self.bm_status_mut() &= !BM_STATUS_BLOCK;
            } else {
                *self.bm_status_mut() &= !BM_STATUS_RUNNING;
                log::debug!("DD BM: read transfer complete");
            }
        }
        sector
    }

    /// Bytes moved per sector: ASIC_HOST_SECBYTE holds the size minus one.
    pub(super) fn host_sector_len(&self) -> usize {
        let len = ((self.regs[DdRegister::HostSecByte as usize] >> 16) & 0xFF) as usize + 1;
        len.min(self.ds_buffer.len())
    }

    /// Disk image byte range for user sector `index` of the current block,
    /// clamped to the image.
    fn sector_range(&self, index: u32) -> Option<std::ops::Range<usize>> {
        let start = geometry::sector_offset(
            self.session.track_byte_offset,
            self.session.zone,
            self.session.current_block,
            index,
        ) as usize;
        let end = (start + self.host_sector_len()).min(self.disk.len());
        if start >= end {
            log::warn!(
                "DD BM: sector {} of block {} at {:#X} is outside the disk image ({:#X} bytes)",
                index,
                self.current_block_number(),
                start,
                self.disk.len()
            );
            return None;
        }
        Some(start..end)
    }

    fn read_sector(&mut self, index: u32) {
        if let Some(range) = self.sector_range(index) {
            let len = range.len();
            self.ds_buffer[..len].copy_from_slice(&self.disk[range]);
        }
    }

    fn commit_sector(&mut self, index: u32) {
        if let Some(range) = self.sector_range(index) {
            let len = range.len();
            self.disk[range].copy_from_slice(&self.ds_buffer[..len]);
            self.dirty = true;
        }
    }

    fn current_block_number(&self) -> u32 {
        let track = (self.regs[DdRegister::CurTk as usize] & CUR_TK_TRACK_MASK) >> 16;
        (track << 1) + self.session.current_block
    }
}
