/// DD ASIC register file layout and flag bits.
///
/// Registers live at physical 0x0500_0500, one 32-bit word each. Only the
/// upper halfword of anything written is meaningful; the ASIC drops the
/// low 16 bits on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DdRegister {
    Data = 0,
    MiscReg,
    CmdStatus,
    CurTk,
    BmStatusCtl,
    ErrSector,
    SeqStatusCtl,
    CurSector,
    HardReset,
    C1S0,
    HostSecByte,
    C1S2,
    SecByte,
    C1S4,
    C1S6,
    CurAddr,
    IdReg,
    TestReg,
    TestPinSel,
}

pub const NUM_REGISTERS: usize = 19;

impl DdRegister {
    pub const ALL: [DdRegister; NUM_REGISTERS] = [
        DdRegister::Data,
        DdRegister::MiscReg,
        DdRegister::CmdStatus,
        DdRegister::CurTk,
        DdRegister::BmStatusCtl,
        DdRegister::ErrSector,
        DdRegister::SeqStatusCtl,
        DdRegister::CurSector,
        DdRegister::HardReset,
        DdRegister::C1S0,
        DdRegister::HostSecByte,
        DdRegister::C1S2,
        DdRegister::SecByte,
        DdRegister::C1S4,
        DdRegister::C1S6,
        DdRegister::CurAddr,
        DdRegister::IdReg,
        DdRegister::TestReg,
        DdRegister::TestPinSel,
    ];

    /// Register addressed by a window-relative byte offset.
    pub fn from_offset(offset: u32) -> Option<Self> {
        Self::ALL.get((offset >> 2) as usize).copied()
    }

    pub fn offset(self) -> u32 {
        (self as u32) << 2
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Data => "ASIC_DATA",
            Self::MiscReg => "ASIC_MISC_REG",
            Self::CmdStatus => "ASIC_CMD_STATUS",
            Self::CurTk => "ASIC_CUR_TK",
            Self::BmStatusCtl => "ASIC_BM_STATUS_CTL",
            Self::ErrSector => "ASIC_ERR_SECTOR",
            Self::SeqStatusCtl => "ASIC_SEQ_STATUS_CTL",
            Self::CurSector => "ASIC_CUR_SECTOR",
            Self::HardReset => "ASIC_HARD_RESET",
            Self::C1S0 => "ASIC_C1_S0",
            Self::HostSecByte => "ASIC_HOST_SECBYTE",
            Self::C1S2 => "ASIC_C1_S2",
            Self::SecByte => "ASIC_SEC_BYTE",
            Self::C1S4 => "ASIC_C1_S4",
            Self::C1S6 => "ASIC_C1_S6",
            Self::CurAddr => "ASIC_CUR_ADDR",
            Self::IdReg => "ASIC_ID_REG",
            Self::TestReg => "ASIC_TEST_REG",
            Self::TestPinSel => "ASIC_TEST_PIN_SEL",
        }
    }

    /// Registers the host can never write; stores to them are dropped.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            Self::CurTk
                | Self::ErrSector
                | Self::CurSector
                | Self::C1S0
                | Self::C1S2
                | Self::C1S4
                | Self::C1S6
                | Self::CurAddr
                | Self::IdReg
                | Self::TestReg
        )
    }
}

// ASIC_CMD_STATUS (read side)
pub const STATUS_DATA_RQ: u32 = 0x4000_0000;
pub const STATUS_C2_XFER: u32 = 0x1000_0000;
pub const STATUS_BM_ERR: u32 = 0x0800_0000;
pub const STATUS_BM_INT: u32 = 0x0400_0000;
pub const STATUS_MECHA_INT: u32 = 0x0200_0000;
pub const STATUS_DISK_PRES: u32 = 0x0100_0000;
pub const STATUS_BUSY_STATE: u32 = 0x0080_0000;
pub const STATUS_RST_STATE: u32 = 0x0040_0000;
pub const STATUS_MTR_N_SPIN: u32 = 0x0010_0000;
pub const STATUS_HEAD_RTRCT: u32 = 0x0008_0000;
pub const STATUS_WR_PR_ERR: u32 = 0x0004_0000;
pub const STATUS_MECHA_ERR: u32 = 0x0002_0000;
pub const STATUS_DISK_CHNG: u32 = 0x0001_0000;

// ASIC_BM_STATUS_CTL (read side)
pub const BM_STATUS_RUNNING: u32 = 0x8000_0000;
pub const BM_STATUS_ERROR: u32 = 0x0400_0000;
pub const BM_STATUS_MICRO: u32 = 0x0200_0000;
pub const BM_STATUS_BLOCK: u32 = 0x0100_0000;
pub const BM_STATUS_C1CRR: u32 = 0x0080_0000;
pub const BM_STATUS_C1DBL: u32 = 0x0040_0000;
pub const BM_STATUS_C1SNG: u32 = 0x0020_0000;
pub const BM_STATUS_C1ERR: u32 = 0x0001_0000;

// ASIC_BM_STATUS_CTL (write side)
pub const BM_CTL_START: u32 = 0x8000_0000;
pub const BM_CTL_MNGRMODE: u32 = 0x4000_0000;
pub const BM_CTL_INTMASK: u32 = 0x2000_0000;
pub const BM_CTL_RESET: u32 = 0x1000_0000;
pub const BM_CTL_DIS_OR_CHK: u32 = 0x0800_0000;
pub const BM_CTL_DIS_C1_CRR: u32 = 0x0400_0000;
pub const BM_CTL_BLK_TRANS: u32 = 0x0200_0000;
pub const BM_CTL_MECHA_RST: u32 = 0x0100_0000;
/// Starting sector written alongside the BM control bits.
pub const BM_CTL_SECTOR_MASK: u32 = 0x00FF_0000;

// ASIC_CUR_TK
pub const CUR_TK_HEAD: u32 = 0x1000_0000;
pub const CUR_TK_TRACK_MASK: u32 = 0x0FFF_0000;
/// Index-lock + on-track bits reported after every seek.
pub const CUR_TK_LOCKED: u32 = 0x6000_0000;

/// The only value ever observed being written to ASIC_HARD_RESET.
pub const HARD_RESET_MAGIC: u32 = 0xAAAA_0000;

pub const ID_WITH_IPL: u32 = 0x0003_0000;
pub const ID_WITHOUT_IPL: u32 = 0x0004_0000;
