use std::fs;
use std::path::Path;

use crate::dd::buffers::IPL_ROM_LEN;
use crate::dd::geometry::disk_geometry_len;

/// Size of a retail NDD dump (Japanese retail disk image).
pub const RETAIL_DISK_SIZE: usize = 0x3DE_C800;

#[derive(Debug, thiserror::Error)]
pub enum DiskError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("IPL ROM too large ({0:#X} bytes, window is 0x400000)")]
    IplTooLarge(usize),
    #[error("Disk image too large ({0:#X} bytes, geometry covers 0x435B0C0)")]
    DiskTooLarge(usize),
}

/// Load a disk image. The bytes are kept exactly as stored; an image
/// smaller than a retail dump is accepted and sector accesses past its
/// end are clamped by the buffer manager.
pub fn load_disk(path: &Path) -> Result<Vec<u8>, DiskError> {
    let data = fs::read(path)?;
    if data.len() > disk_geometry_len() {
        return Err(DiskError::DiskTooLarge(data.len()));
    }
    if data.len() != RETAIL_DISK_SIZE {
        log::warn!(
            "Disk image {} is {:#X} bytes (retail dumps are {:#X})",
            path.display(),
            data.len(),
            RETAIL_DISK_SIZE
        );
    }
    log::info!("Loaded disk image {} ({:#X} bytes)", path.display(), data.len());
    Ok(data)
}

/// Load a DD IPL ROM (big-endian, as dumped).
pub fn load_ipl(path: &Path) -> Result<Vec<u8>, DiskError> {
    let data = fs::read(path)?;
    if data.len() > IPL_ROM_LEN {
        return Err(DiskError::IplTooLarge(data.len()));
    }
    log::info!("Loaded IPL ROM {} ({:#X} bytes)", path.display(), data.len());
    Ok(data)
}

/// Write a disk image back, e.g. after the buffer manager committed sectors.
pub fn save_disk(path: &Path, data: &[u8]) -> Result<(), DiskError> {
    fs::write(path, data)?;
    log::info!("Saved disk image {} ({:#X} bytes)", path.display(), data.len());
    Ok(())
}
