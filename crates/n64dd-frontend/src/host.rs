/// Host-side drive routines: what IPL software does over the bus to issue
/// commands and move blocks through the buffer manager.
///
/// Everything goes through `DdBus` physical addresses so the harness
/// exercises the same path a CPU core would.
use n64dd_core::dd::bm::{BLOCK_SECTOR_STRIDE, IPL_TRACK};
use n64dd_core::dd::geometry::{self, SECTORS_PER_BLOCK};
use n64dd_core::dd::mmio::{DS_BUFFER_BASE, REGS_BASE};
use n64dd_core::dd::regs::*;
use n64dd_core::dd::DdCommand;
use n64dd_core::DdBus;

/// Upper bound on status polls per transfer. A healthy two-block read
/// needs about 200.
const MAX_POLLS: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("track {0} block 0 is served from the IPL ROM and never raises DATA_RQ")]
    IplTrack(u32),
    #[error("BM still running after {0} status polls")]
    Stalled(usize),
    #[error("{0} blocks requested (a track holds 1 or 2)")]
    BadBlockCount(u32),
}

fn reg_addr(reg: DdRegister) -> u32 {
    REGS_BASE + reg.offset()
}

fn read_reg(bus: &mut DdBus, reg: DdRegister) -> u32 {
    bus.read_u32(reg_addr(reg))
}

fn write_reg(bus: &mut DdBus, reg: DdRegister, val: u32) {
    bus.write_u32(reg_addr(reg), val);
}

/// Issue a drive command, optionally loading ASIC_DATA first, and
/// acknowledge the mechanism interrupt. Returns ASIC_DATA afterwards.
pub fn command(bus: &mut DdBus, cmd: DdCommand, data: Option<u32>) -> u32 {
    if let Some(data) = data {
        write_reg(bus, DdRegister::Data, data);
    }
    write_reg(bus, DdRegister::CmdStatus, cmd.word());
    let result = read_reg(bus, DdRegister::Data);
    write_reg(bus, DdRegister::BmStatusCtl, BM_CTL_MECHA_RST);
    result
}

/// Drive RTC as read back through the GET_* commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcReading {
    /// Two-digit year.
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl std::fmt::Display for RtcReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn from_bcd(b: u8) -> u8 {
    (b >> 4) * 10 + (b & 0xF)
}

pub fn read_rtc(bus: &mut DdBus) -> RtcReading {
    let pair = |word: u32| (from_bcd((word >> 24) as u8), from_bcd((word >> 16) as u8));
    let (year, month) = pair(command(bus, DdCommand::GetYearMonth, None));
    let (day, hour) = pair(command(bus, DdCommand::GetDayHour, None));
    let (minute, second) = pair(command(bus, DdCommand::GetMinSec, None));
    RtcReading {
        year,
        month,
        day,
        hour,
        minute,
        second,
    }
}

pub fn seek(bus: &mut DdBus, track: u32, head: u32, read: bool) {
    let target = ((head & 1) << 28) | ((track & 0xFFF) << 16);
    let cmd = if read {
        DdCommand::SeekRead
    } else {
        DdCommand::SeekWrite
    };
    command(bus, cmd, Some(target));
}

/// Bytes per user sector on `track`/`head`.
pub fn sector_size(track: u32, head: u32) -> usize {
    geometry::locate(track, head).sector_size() as usize
}

/// (Re)start the BM at `cur_sector` (ASIC_CUR_SECTOR format). Block
/// transfer stays requested while the BM is still in block 0 of a
/// two-block transfer.
fn arm(bus: &mut DdBus, cur_sector: u32, two_blocks: bool) {
    let mut ctl = BM_CTL_START | (cur_sector & BM_CTL_SECTOR_MASK);
    if two_blocks && (cur_sector >> 16) < BLOCK_SECTOR_STRIDE {
        ctl |= BM_CTL_BLK_TRANS;
    }
    write_reg(bus, DdRegister::BmStatusCtl, ctl);
}

fn sector_in_block(cur_sector: u32) -> u32 {
    (cur_sector >> 16) % BLOCK_SECTOR_STRIDE
}

fn setup_transfer(bus: &mut DdBus, track: u32, head: u32, blocks: u32, read: bool) -> Result<usize, HostError> {
    if !(1..=2).contains(&blocks) {
        return Err(HostError::BadBlockCount(blocks));
    }
    if read && track == IPL_TRACK && bus.dd.has_ipl_rom() {
        return Err(HostError::IplTrack(track));
    }
    seek(bus, track, head, read);
    let size = sector_size(track, head);
    write_reg(bus, DdRegister::HostSecByte, ((size as u32 - 1) & 0xFF) << 16);
    Ok(size)
}

fn read_ds(bus: &mut DdBus, out: &mut Vec<u8>, len: usize) {
    for offset in (0..len as u32).step_by(4) {
        let word = bus.read_u32(DS_BUFFER_BASE + offset).to_be_bytes();
        let take = (len - offset as usize).min(4);
        out.extend_from_slice(&word[..take]);
    }
}

fn fill_ds(bus: &mut DdBus, bytes: &[u8]) {
    for (i, chunk) in bytes.chunks(4).enumerate() {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        bus.write_u32(DS_BUFFER_BASE + (i as u32) * 4, u32::from_be_bytes(word));
    }
}

/// Read `blocks` (1 or 2) user blocks of a track, starting at block 0.
pub fn read_blocks(bus: &mut DdBus, track: u32, head: u32, blocks: u32) -> Result<Vec<u8>, HostError> {
    let size = setup_transfer(bus, track, head, blocks, true)?;
    let two_blocks = blocks == 2;
    let mut out = Vec::with_capacity(size * (SECTORS_PER_BLOCK * blocks) as usize);

    arm(bus, 0, two_blocks);
    for _ in 0..MAX_POLLS {
        // Past the user sectors this poll is what steps the BM.
        let status = read_reg(bus, DdRegister::CmdStatus);
        if status & STATUS_DATA_RQ != 0 {
            read_ds(bus, &mut out, size);
            bus.dd.clear_ds(&mut bus.irq);
        }
        if read_reg(bus, DdRegister::BmStatusCtl) & BM_STATUS_RUNNING == 0 {
            log::debug!("host: read {} bytes from track {:#X} head {}", out.len(), track, head);
            return Ok(out);
        }
        let cur = read_reg(bus, DdRegister::CurSector);
        if sector_in_block(cur) <= SECTORS_PER_BLOCK {
            arm(bus, cur, two_blocks);
        }
    }
    Err(HostError::Stalled(MAX_POLLS))
}

/// Write whole user blocks of a track. `data` must hold 1 or 2 blocks of
/// sectors for this track's zone; a short tail is zero padded.
pub fn write_blocks(bus: &mut DdBus, track: u32, head: u32, data: &[u8]) -> Result<(), HostError> {
    let size = sector_size(track, head);
    let block_len = size * SECTORS_PER_BLOCK as usize;
    let blocks = data.len().div_ceil(block_len) as u32;
    setup_transfer(bus, track, head, blocks, false)?;
    let two_blocks = blocks == 2;

    let mut sector = vec![0u8; size];
    arm(bus, 0, two_blocks);
    for _ in 0..MAX_POLLS {
        let status = read_reg(bus, DdRegister::CmdStatus);
        if read_reg(bus, DdRegister::BmStatusCtl) & BM_STATUS_RUNNING == 0 {
            log::debug!("host: wrote {} blocks to track {:#X} head {}", blocks, track, head);
            return Ok(());
        }
        let cur = read_reg(bus, DdRegister::CurSector);
        if status & STATUS_DATA_RQ != 0 {
            // The BM asks for the sector before the one it points at.
            let block = u32::from((cur >> 16) >= BLOCK_SECTOR_STRIDE);
            let index = (block * SECTORS_PER_BLOCK + sector_in_block(cur) - 1) as usize;
            let start = (index * size).min(data.len());
            let end = (start + size).min(data.len());
            sector.fill(0);
            sector[..end - start].copy_from_slice(&data[start..end]);
            fill_ds(bus, &sector);
            bus.dd.clear_ds(&mut bus.irq);
        }
        arm(bus, cur, two_blocks);
    }
    Err(HostError::Stalled(MAX_POLLS))
}

/// Decoded ASIC_CMD_STATUS flags, for display.
pub fn status_flags(status: u32) -> Vec<&'static str> {
    const FLAGS: [(u32, &str); 13] = [
        (STATUS_DATA_RQ, "DATA_RQ"),
        (STATUS_C2_XFER, "C2_XFER"),
        (STATUS_BM_ERR, "BM_ERR"),
        (STATUS_BM_INT, "BM_INT"),
        (STATUS_MECHA_INT, "MECHA_INT"),
        (STATUS_DISK_PRES, "DISK_PRES"),
        (STATUS_BUSY_STATE, "BUSY_STATE"),
        (STATUS_RST_STATE, "RST_STATE"),
        (STATUS_MTR_N_SPIN, "MTR_N_SPIN"),
        (STATUS_HEAD_RTRCT, "HEAD_RTRCT"),
        (STATUS_WR_PR_ERR, "WR_PR_ERR"),
        (STATUS_MECHA_ERR, "MECHA_ERR"),
        (STATUS_DISK_CHNG, "DISK_CHNG"),
    ];
    FLAGS
        .iter()
        .filter(|&&(bit, _)| status & bit != 0)
        .map(|&(_, name)| name)
        .collect()
}
