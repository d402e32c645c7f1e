/// Zoned-bit-recording geometry of a 64DD disk.
///
/// The platter is split into 8 concentric zones per head. Outer zones
/// pack more bytes per sector. Zones 0..=7 are head 0, zones 8..=15 are
/// the same bands seen through head 1. A disk image stores the zones back
/// to back, so every zone's start offset is the running total of the ones
/// before it.
use super::regs::{CUR_TK_HEAD, CUR_TK_TRACK_MASK};

pub const SECTORS_PER_BLOCK: u32 = 85;
pub const BLOCKS_PER_TRACK: u32 = 2;
pub const NUM_ZONES: usize = 16;

/// Bytes per sector, indexed by zone.
pub const ZONE_SECTOR_SIZE: [u32; NUM_ZONES] = [
    232, 216, 208, 192, 176, 160, 144, 128, //
    216, 208, 192, 176, 160, 144, 128, 112,
];

/// Tracks per zone.
pub const ZONE_TRACKS: [u32; NUM_ZONES] = [
    158, 158, 149, 149, 149, 149, 149, 114, //
    158, 158, 149, 149, 149, 149, 149, 114,
];

/// Byte offset of each zone's first track inside the disk image.
pub const ZONE_START: [u32; NUM_ZONES] = [
    0x000_0000, 0x05F_15E0, 0x0B7_9D00, 0x108_01A0, 0x152_3720, 0x196_3D80, 0x1D4_14C0, 0x20B_BCE0,
    0x231_96E0, 0x28A_1E00, 0x2DF_5DC0, 0x329_9340, 0x36D_99A0, 0x3AB_70E0, 0x3E3_1900, 0x414_9200,
];

/// First track of each band with its head-0 zone, highest band first.
const ZONE_BANDS: [(u32, usize); 8] = [
    (0x425, 7),
    (0x390, 6),
    (0x2FB, 5),
    (0x266, 4),
    (0x1D1, 3),
    (0x13C, 2),
    (0x09E, 1),
    (0x000, 0),
];

/// Where a seek landed: zone plus the byte offset of the track's first block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackLocation {
    pub track: u32,
    pub head: u32,
    pub zone: usize,
    /// Track index relative to the first track of the zone's band.
    pub track_in_zone: u32,
    pub byte_offset: u32,
}

impl TrackLocation {
    pub fn sector_size(&self) -> u32 {
        ZONE_SECTOR_SIZE[self.zone]
    }

    /// Byte offset of `sector` (0-based, user sectors only) in `block`.
    pub fn sector_offset(&self, block: u32, sector: u32) -> u32 {
        sector_offset(self.byte_offset, self.zone, block, sector)
    }

    /// Disk LBA-style block number, as the IPL counts blocks.
    pub fn block_number(&self, block: u32) -> u32 {
        (self.track << 1) + block
    }
}

/// Byte offset of a user sector, given a track start offset and zone.
pub fn sector_offset(track_offset: u32, zone: usize, block: u32, sector: u32) -> u32 {
    let size = ZONE_SECTOR_SIZE[zone];
    track_offset + block * SECTORS_PER_BLOCK * size + sector * size
}

/// Split an ASIC_CUR_TK value into (head, track).
pub fn head_and_track(cur_tk: u32) -> (u32, u32) {
    let head = (cur_tk & CUR_TK_HEAD) >> 28;
    let track = (cur_tk & CUR_TK_TRACK_MASK) >> 16;
    (head, track)
}

/// Resolve ASIC_CUR_TK to a zone and track byte offset.
pub fn resolve(cur_tk: u32) -> TrackLocation {
    let (head, track) = head_and_track(cur_tk);
    locate(track, head)
}

/// Resolve a (track, head) pair. Head 1 selects the mirrored zones 8..=15;
/// only bit 0 of `head` is significant.
pub fn locate(track: u32, head: u32) -> TrackLocation {
    let head = head & 1;
    let (band_start, base_zone) = ZONE_BANDS
        .iter()
        .copied()
        .find(|&(start, _)| track >= start)
        .unwrap_or((0, 0));

    let zone = base_zone + 8 * head as usize;
    let track_in_zone = track - band_start;
    if track_in_zone >= ZONE_TRACKS[zone] {
        log::warn!(
            "DD: track {:#X} (head {}) runs past zone {} ({} tracks)",
            track,
            head,
            zone,
            ZONE_TRACKS[zone]
        );
    }

    let byte_offset = ZONE_START[zone]
        + track_in_zone * ZONE_SECTOR_SIZE[zone] * SECTORS_PER_BLOCK * BLOCKS_PER_TRACK;

    TrackLocation {
        track,
        head,
        zone,
        track_in_zone,
        byte_offset,
    }
}

/// Total bytes covered by all 16 zones.
pub const fn disk_geometry_len() -> usize {
    let mut total = 0usize;
    let mut zone = 0;
    while zone < NUM_ZONES {
        total += (ZONE_TRACKS[zone] * ZONE_SECTOR_SIZE[zone] * SECTORS_PER_BLOCK * BLOCKS_PER_TRACK)
            as usize;
        zone += 1;
    }
    total
}
