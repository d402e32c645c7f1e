/// Per-window MMIO views over a `DdController`.
///
/// Each view borrows the controller (and, for the register file, the
/// interrupt line) for the duration of one access and exposes it through
/// the `Mmio` trait. Offsets are relative to the window base.
use super::buffers::{C2S_BUFFER_LEN, DS_BUFFER_LEN, IPL_ROM_LEN, MS_RAM_LEN};
use super::regs::{DdRegister, NUM_REGISTERS};
use super::DdController;
use crate::bus::{InterruptLine, Mmio};

pub const C2S_BUFFER_BASE: u32 = 0x0500_0000;
pub const DS_BUFFER_BASE: u32 = 0x0500_0400;
pub const REGS_BASE: u32 = 0x0500_0500;
pub const REGS_LEN: usize = NUM_REGISTERS * 4;
pub const MS_RAM_BASE: u32 = 0x0500_0580;
pub const IPL_ROM_BASE: u32 = 0x0600_0000;

/// Window lengths, for bus decoders.
pub const WINDOWS: [(u32, usize); 5] = [
    (C2S_BUFFER_BASE, C2S_BUFFER_LEN),
    (DS_BUFFER_BASE, DS_BUFFER_LEN),
    (REGS_BASE, REGS_LEN),
    (MS_RAM_BASE, MS_RAM_LEN),
    (IPL_ROM_BASE, IPL_ROM_LEN),
];

pub struct DdRegisters<'a, I: InterruptLine> {
    pub dd: &'a mut DdController,
    pub irq: &'a mut I,
}

impl<'a, I: InterruptLine> DdRegisters<'a, I> {
    pub fn new(dd: &'a mut DdController, irq: &'a mut I) -> Self {
        Self { dd, irq }
    }
}

impl<I: InterruptLine> Mmio for DdRegisters<'_, I> {
    fn read_u32(&mut self, offset: u32) -> u32 {
        match DdRegister::from_offset(offset) {
            Some(reg) => self.dd.read_reg(reg, &mut *self.irq),
            None => {
                log::warn!("DD: read from unknown register offset {:#X}", offset);
                0
            }
        }
    }

    fn write_u32(&mut self, offset: u32, val: u32, mask: u32) {
        match DdRegister::from_offset(offset) {
            Some(reg) => self.dd.write_reg(reg, val, mask, &mut *self.irq),
            None => log::warn!(
                "DD: write to unknown register offset {:#X} = {:#010X}",
                offset,
                val
            ),
        }
    }
}

pub struct DdIplRom<'a>(pub &'a mut DdController);

impl Mmio for DdIplRom<'_> {
    fn read_u32(&mut self, offset: u32) -> u32 {
        self.0.read_ipl_rom(offset)
    }

    fn write_u32(&mut self, offset: u32, val: u32, _mask: u32) {
        self.0.write_ipl_rom(offset, val)
    }
}

pub struct DdC2Buffer<'a>(pub &'a mut DdController);

impl Mmio for DdC2Buffer<'_> {
    fn read_u32(&mut self, offset: u32) -> u32 {
        self.0.read_c2s_buffer(offset)
    }

    fn write_u32(&mut self, offset: u32, val: u32, mask: u32) {
        self.0.write_c2s_buffer(offset, val, mask)
    }
}

pub struct DdDsBuffer<'a>(pub &'a mut DdController);

impl Mmio for DdDsBuffer<'_> {
    fn read_u32(&mut self, offset: u32) -> u32 {
        self.0.read_ds_buffer(offset)
    }

    fn write_u32(&mut self, offset: u32, val: u32, mask: u32) {
        self.0.write_ds_buffer(offset, val, mask)
    }
}

pub struct DdMsRam<'a>(pub &'a mut DdController);

impl Mmio for DdMsRam<'_> {
    fn read_u32(&mut self, offset: u32) -> u32 {
        self.0.read_ms_ram(offset)
    }

    fn write_u32(&mut self, offset: u32, val: u32, mask: u32) {
        self.0.write_ms_ram(offset, val, mask)
    }
}
