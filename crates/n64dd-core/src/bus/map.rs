use crate::bus::{InterruptLine, IrqLine, Mmio};
use crate::dd::mmio::{
    DdC2Buffer, DdDsBuffer, DdIplRom, DdMsRam, DdRegisters, C2S_BUFFER_BASE, DS_BUFFER_BASE,
    IPL_ROM_BASE, MS_RAM_BASE, REGS_BASE,
};
use crate::dd::DdController;

/// DD MMIO window an address decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdWindow {
    C2sBuffer,
    DsBuffer,
    Registers,
    MsRam,
    IplRom,
}

impl DdWindow {
    /// Window and window-relative offset for a physical address.
    pub fn decode(addr: u32) -> Option<(DdWindow, u32)> {
        let hit = match addr {
            0x0500_0000..=0x0500_03FF => (DdWindow::C2sBuffer, addr - C2S_BUFFER_BASE),
            0x0500_0400..=0x0500_04FF => (DdWindow::DsBuffer, addr - DS_BUFFER_BASE),
            0x0500_0500..=0x0500_054B => (DdWindow::Registers, addr - REGS_BASE),
            0x0500_0580..=0x0500_05BF => (DdWindow::MsRam, addr - MS_RAM_BASE),
            0x0600_0000..=0x063F_FFFF => (DdWindow::IplRom, addr - IPL_ROM_BASE),
            _ => return None,
        };
        Some(hit)
    }
}

/// Physical-address front end for one drive.
///
/// Owns the controller and its interrupt line and routes CPU accesses in
/// the 0x0500_0000 and 0x0600_0000 ranges to the matching window.
pub struct DdBus<I: InterruptLine = IrqLine> {
    pub dd: DdController,
    pub irq: I,
}

impl DdBus<IrqLine> {
    pub fn new(dd: DdController) -> Self {
        Self::with_irq(dd, IrqLine::new())
    }

    /// True while the DD is holding its interrupt line asserted.
    pub fn interrupt_pending(&self) -> bool {
        self.irq.asserted
    }
}

impl<I: InterruptLine> DdBus<I> {
    pub fn with_irq(dd: DdController, irq: I) -> Self {
        Self { dd, irq }
    }

    fn with_window<R>(&mut self, which: DdWindow, f: impl FnOnce(&mut dyn Mmio) -> R) -> R {
        match which {
            DdWindow::C2sBuffer => f(&mut DdC2Buffer(&mut self.dd)),
            DdWindow::DsBuffer => f(&mut DdDsBuffer(&mut self.dd)),
            DdWindow::Registers => f(&mut DdRegisters::new(&mut self.dd, &mut self.irq)),
            DdWindow::MsRam => f(&mut DdMsRam(&mut self.dd)),
            DdWindow::IplRom => f(&mut DdIplRom(&mut self.dd)),
        }
    }

    pub fn read_u32(&mut self, addr: u32) -> u32 {
        match DdWindow::decode(addr) {
            Some((which, offset)) => self.with_window(which, |w| w.read_u32(offset)),
            None => {
                log::warn!("Unhandled DD read32: {:#010X}", addr);
                0
            }
        }
    }

    pub fn write_u32(&mut self, addr: u32, val: u32) {
        self.write_u32_masked(addr, val, 0xFFFF_FFFF);
    }

    /// Store with only the bits in `mask` driven by the CPU.
    pub fn write_u32_masked(&mut self, addr: u32, val: u32, mask: u32) {
        match DdWindow::decode(addr) {
            Some((which, offset)) => {
                self.with_window(which, |w| w.write_u32(offset, val & mask, mask))
            }
            None => log::warn!("Unhandled DD write32: {:#010X} = {:#010X}", addr, val),
        }
    }

    pub fn read_u8(&mut self, addr: u32) -> u8 {
        let word = self.read_u32(addr & !3);
        let shift = (3 - (addr & 3)) * 8;
        (word >> shift) as u8
    }

    pub fn read_u16(&mut self, addr: u32) -> u16 {
        let word = self.read_u32(addr & !3);
        let shift = (2 - (addr & 2)) * 8;
        (word >> shift) as u16
    }

    /// Sub-word stores go out as masked word stores so that no read side
    /// effect is triggered on the way.
    pub fn write_u8(&mut self, addr: u32, val: u8) {
        let shift = (3 - (addr & 3)) * 8;
        self.write_u32_masked(addr & !3, (val as u32) << shift, 0xFFu32 << shift);
    }

    pub fn write_u16(&mut self, addr: u32, val: u16) {
        let shift = (2 - (addr & 2)) * 8;
        self.write_u32_masked(addr & !3, (val as u32) << shift, 0xFFFFu32 << shift);
    }
}
