pub mod map;

/// Interrupt line from the DD into the CPU.
///
/// The 64DD raises the cartridge interrupt (COP0 Cause IP3) directly
/// rather than going through MI, so all the controller needs is a way to
/// assert and deassert its own line. Implemented by whatever owns the CPU
/// interrupt state.
pub trait InterruptLine {
    fn signal(&mut self);
    fn clear(&mut self);
}

/// One word-addressable MMIO window.
///
/// Offsets are window-relative bytes; the bus has already subtracted the
/// window base. `mask` selects the bits of `val` the CPU actually drove.
/// Reads take `&mut self` because reading ASIC_CMD_STATUS can advance the
/// buffer manager.
pub trait Mmio {
    fn read_u32(&mut self, offset: u32) -> u32;
    fn write_u32(&mut self, offset: u32, val: u32, mask: u32);
}

/// Minimal interrupt line: tracks the level and counts edges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IrqLine {
    pub asserted: bool,
    pub signal_count: u64,
    pub clear_count: u64,
}

impl IrqLine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InterruptLine for IrqLine {
    fn signal(&mut self) {
        self.asserted = true;
        self.signal_count += 1;
    }

    fn clear(&mut self) {
        self.asserted = false;
        self.clear_count += 1;
    }
}
