/// DD byte windows: C2 (ECC) sector buffer, DS (data strobe) sector
/// buffer, microsequencer RAM, and the IPL ROM.
///
/// Bytes are kept in bus order, so a word written at offset `o` reads
/// back unchanged and a sector copied from the disk image reads out as
/// big-endian words. Offsets are checked here as well as on the bus.
use super::regs::{DdRegister, STATUS_BM_INT, STATUS_C2_XFER, STATUS_DATA_RQ};
use super::DdController;
use crate::bus::InterruptLine;

pub const C2S_BUFFER_LEN: usize = 0x400;
pub const DS_BUFFER_LEN: usize = 0x100;
pub const MS_RAM_LEN: usize = 0x40;
pub const IPL_ROM_LEN: usize = 0x40_0000;

fn read_be(buf: &[u8], offset: u32, window: &str) -> u32 {
    let i = (offset & !3) as usize;
    match buf.get(i..i + 4) {
        Some(b) => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        None => {
            log::warn!("DD: {} read out of range: {:#X}", window, offset);
            0
        }
    }
}

fn write_be(buf: &mut [u8], offset: u32, val: u32, mask: u32, window: &str) {
    let i = (offset & !3) as usize;
    match buf.get_mut(i..i + 4) {
        Some(b) => {
            let old = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
            b.copy_from_slice(&((old & !mask) | (val & mask)).to_be_bytes());
        }
        None => log::warn!("DD: {} write out of range: {:#X} = {:#010X}", window, offset, val),
    }
}

impl DdController {
    /// IPL ROM word. Reads as zero when no IPL ROM is loaded.
    pub fn read_ipl_rom(&self, offset: u32) -> u32 {
        match &self.ipl_rom {
            Some(rom) => read_be(rom, offset, "DD_IPL_ROM"),
            None => 0,
        }
    }

    /// The IPL ROM is mask ROM; a CPU store to it means the bus map or
    /// the software is broken.
    pub fn write_ipl_rom(&mut self, offset: u32, val: u32) {
        panic!(
            "DD: attempt to write to IPL ROM at {:#X} ({:#010X})",
            offset, val
        );
    }

    pub fn read_c2s_buffer(&mut self, offset: u32) -> u32 {
        let word = read_be(&self.c2s_buffer, offset, "DD_C2S_BUFFER");
        self.tracer.on_read("DD_C2S_BUFFER", word);
        word
    }

    /// The C2 buffer is filled by the drive only; host stores are dropped.
    pub fn write_c2s_buffer(&mut self, _offset: u32, val: u32, mask: u32) {
        self.tracer.on_write("DD_C2S_BUFFER", val, mask);
    }

    /// Host has consumed (or filled) the DS buffer: drop DATA_RQ and the
    /// BM interrupt it raised.
    pub fn clear_ds(&mut self, irq: &mut impl InterruptLine) {
        self.regs[DdRegister::CmdStatus as usize] &= !(STATUS_DATA_RQ | STATUS_BM_INT);
        irq.clear();
    }

    /// Host has consumed the C2 buffer: drop C2_XFER and the BM interrupt.
    ///
    /// Past the user sectors the BM only advances when a status poll
    /// drains BM_INT, so acknowledging here parks the pump until the host
    /// restarts it.
    pub fn clear_c2s(&mut self, irq: &mut impl InterruptLine) {
        self.regs[DdRegister::CmdStatus as usize] &= !(STATUS_C2_XFER | STATUS_BM_INT);
        irq.clear();
    }

    pub fn read_ds_buffer(&mut self, offset: u32) -> u32 {
        let word = read_be(&self.ds_buffer, offset, "DD_DS_BUFFER");
        self.tracer.on_read("DD_DS_BUFFER", word);
        word
    }

    pub fn write_ds_buffer(&mut self, offset: u32, val: u32, mask: u32) {
        self.tracer.on_write("DD_DS_BUFFER", val, mask);
        write_be(&mut self.ds_buffer, offset, val, mask, "DD_DS_BUFFER");
    }

    pub fn read_ms_ram(&mut self, offset: u32) -> u32 {
        let word = read_be(&self.ms_ram, offset, "DD_MS_RAM");
        self.tracer.on_read("DD_MS_RAM", word);
        word
    }

    pub fn write_ms_ram(&mut self, offset: u32, val: u32, mask: u32) {
        self.tracer.on_write("DD_MS_RAM", val, mask);
        write_be(&mut self.ms_ram, offset, val, mask, "DD_MS_RAM");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ds_buffer_words_are_stored_big_endian() {
        let mut dd = DdController::new(None, Vec::new());
        dd.write_ds_buffer(0x10, 0x1122_3344, 0xFFFF_FFFF);
        assert_eq!(&dd.ds_buffer[0x10..0x14], &[0x11, 0x22, 0x33, 0x44]);
        assert_eq!(dd.read_ds_buffer(0x10), 0x1122_3344);
        // Sub-word offsets address the containing word.
        assert_eq!(dd.read_ds_buffer(0x13), 0x1122_3344);
    }

    #[test]
    fn masked_store_keeps_undriven_bytes() {
        let mut dd = DdController::new(None, Vec::new());
        dd.write_ms_ram(0, 0xAABB_CCDD, 0xFFFF_FFFF);
        dd.write_ms_ram(0, 0x0000_1100, 0x0000_FF00);
        assert_eq!(dd.read_ms_ram(0), 0xAABB_11DD);
    }

    #[test]
    fn out_of_range_accesses_are_dropped() {
        let mut dd = DdController::new(None, Vec::new());
        dd.write_ms_ram(MS_RAM_LEN as u32, 0xDEAD_BEEF, 0xFFFF_FFFF);
        assert_eq!(dd.read_ms_ram(MS_RAM_LEN as u32), 0);
        assert_eq!(dd.read_ds_buffer(DS_BUFFER_LEN as u32 + 4), 0);
        assert!(dd.ms_ram.iter().all(|&b| b == 0));
    }

    #[test]
    fn c2s_buffer_ignores_host_writes() {
        let mut dd = DdController::new(None, Vec::new());
        dd.write_c2s_buffer(0, 0xFFFF_FFFF, 0xFFFF_FFFF);
        assert_eq!(dd.read_c2s_buffer(0), 0);
    }

    #[test]
    fn ipl_rom_reads_big_endian_or_zero_when_absent() {
        let dd = DdController::new(Some(vec![0x80, 0x27, 0x07, 0x40, 1, 2]), Vec::new());
        assert_eq!(dd.read_ipl_rom(0), 0x8027_0740);
        // Partial trailing word is past the image.
        assert_eq!(dd.read_ipl_rom(4), 0);

        let empty = DdController::new(None, Vec::new());
        assert_eq!(empty.read_ipl_rom(0), 0);
    }

    #[test]
    fn clear_ds_acknowledges_data_request_only() {
        let mut dd = DdController::new(None, Vec::new());
        let mut irq = crate::bus::IrqLine::new();
        dd.regs[DdRegister::CmdStatus as usize] |= STATUS_DATA_RQ | STATUS_BM_INT | STATUS_C2_XFER;
        irq.signal();

        dd.clear_ds(&mut irq);
        let status = dd.reg(DdRegister::CmdStatus);
        assert_eq!(status & (STATUS_DATA_RQ | STATUS_BM_INT), 0);
        assert_ne!(status & STATUS_C2_XFER, 0);
        assert!(!irq.asserted);
        assert_eq!(irq.clear_count, 1);
    }

    #[test]
    fn clear_c2s_acknowledges_c2_transfer_only() {
        let mut dd = DdController::new(None, Vec::new());
        let mut irq = crate::bus::IrqLine::new();
        dd.regs[DdRegister::CmdStatus as usize] |= STATUS_DATA_RQ | STATUS_BM_INT | STATUS_C2_XFER;
        irq.signal();

        dd.clear_c2s(&mut irq);
        let status = dd.reg(DdRegister::CmdStatus);
        assert_eq!(status & (STATUS_C2_XFER | STATUS_BM_INT), 0);
        assert_ne!(status & STATUS_DATA_RQ, 0);
        assert!(!irq.asserted);
    }

    #[test]
    #[should_panic(expected = "write to IPL ROM")]
    fn ipl_rom_writes_are_fatal() {
        let mut dd = DdController::new(Some(vec![0; 4]), Vec::new());
        dd.write_ipl_rom(0, 0);
    }
}
