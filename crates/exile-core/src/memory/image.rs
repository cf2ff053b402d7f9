//! Sparse memory image
//!
//! A `MemoryImage` is a set of byte regions keyed by base address. It backs
//! the test mock and the CLI, which loads images captured by an external
//! dumper from a JSON file:
//!
//! ```json
//! {
//!   "ui_root": 4096,
//!   "surface": { "width": 1920.0, "height": 1080.0 },
//!   "roots": { "inventory_panel": 8192 },
//!   "regions": [ { "base": 4096, "bytes": "00000000..." } ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::reader::ReadMemory;
use crate::error::{Error, Result};

/// Sparse, read-only view of process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryImage {
    regions: BTreeMap<u64, Vec<u8>>,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write raw bytes, patching an existing region when it covers the range
    pub fn write_bytes(&mut self, address: u64, data: &[u8]) {
        let end = address + data.len() as u64;
        if let Some((&base, region)) = self.regions.range_mut(..=address).next_back() {
            if end <= base + region.len() as u64 {
                let offset = (address - base) as usize;
                region[offset..offset + data.len()].copy_from_slice(data);
                return;
            }
        }
        self.regions.insert(address, data.to_vec());
    }

    pub fn write_pod<T: Pod>(&mut self, address: u64, value: &T) {
        self.write_bytes(address, bytemuck::bytes_of(value));
    }

    pub fn write_pointers(&mut self, address: u64, pointers: &[u64]) {
        let bytes: Vec<u8> = pointers.iter().flat_map(|p| p.to_le_bytes()).collect();
        self.write_bytes(address, &bytes);
    }

    /// Remove every region starting at `address`
    pub fn unmap(&mut self, address: u64) {
        self.regions.remove(&address);
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn slice(&self, address: u64, size: usize) -> Option<&[u8]> {
        let end = address.checked_add(size as u64)?;
        self.regions
            .range(..=address)
            .rev()
            .find(|(base, region)| end <= **base + region.len() as u64)
            .map(|(base, region)| {
                let offset = (address - base) as usize;
                &region[offset..offset + size]
            })
    }
}

impl ReadMemory for MemoryImage {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if address == 0 {
            return Err(Error::InvalidAddress(address));
        }
        self.slice(address, size)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::read_failed(address, format!("{} bytes not mapped", size)))
    }
}

/// Render surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 2560.0,
            height: 1600.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegionRecord {
    base: u64,
    bytes: String,
}

/// On-disk memory image plus the metadata needed to interpret it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageFile {
    #[serde(default)]
    pub ui_root: u64,
    #[serde(default)]
    pub surface: SurfaceSize,
    #[serde(default)]
    pub roots: HashMap<String, u64>,
    #[serde(default)]
    regions: Vec<RegionRecord>,
}

impl ImageFile {
    pub fn from_memory(memory: &MemoryImage) -> Self {
        Self {
            regions: memory
                .regions
                .iter()
                .map(|(&base, bytes)| RegionRecord {
                    base,
                    bytes: hex::encode(bytes),
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Load an image from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let file: ImageFile = serde_json::from_str(&content)?;
        debug!(
            "Loaded memory image: {} regions, ui_root=0x{:X}",
            file.regions.len(),
            file.ui_root
        );
        Ok(file)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Decode the regions into a readable image
    pub fn memory(&self) -> Result<MemoryImage> {
        let mut memory = MemoryImage::new();
        for record in &self.regions {
            if record.base == 0 {
                return Err(Error::InvalidImage("region at address 0".to_string()));
            }
            let bytes = hex::decode(record.bytes.trim())?;
            memory.write_bytes(record.base, &bytes);
        }
        Ok(memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_inside_region() {
        let mut memory = MemoryImage::new();
        memory.write_bytes(0x1000, &[1, 2, 3, 4, 5, 6, 7, 8]);

        assert_eq!(memory.read_bytes(0x1002, 3).unwrap(), vec![3, 4, 5]);
        assert!(memory.read_bytes(0x1006, 4).is_err());
        assert!(memory.read_bytes(0x0FFF, 1).is_err());
    }

    #[test]
    fn test_write_patches_existing_region() {
        let mut memory = MemoryImage::new();
        memory.write_bytes(0x1000, &[0; 16]);
        memory.write_bytes(0x1004, &[9, 9]);

        assert_eq!(memory.region_count(), 1);
        assert_eq!(memory.read_bytes(0x1003, 4).unwrap(), vec![0, 9, 9, 0]);
    }

    #[test]
    fn test_address_zero_is_never_mapped() {
        let memory = MemoryImage::new();
        assert!(matches!(
            memory.read_bytes(0, 4),
            Err(Error::InvalidAddress(0))
        ));
    }

    #[test]
    fn test_image_file_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();

        let mut memory = MemoryImage::new();
        memory.write_pointers(0x2000, &[0x3000, 0x4000]);
        let mut file = ImageFile::from_memory(&memory);
        file.ui_root = 0x2000;
        file.roots.insert("inventory_panel".to_string(), 0x3000);
        file.save(temp_file.path()).unwrap();

        let loaded = ImageFile::load(temp_file.path()).unwrap();
        assert_eq!(loaded.ui_root, 0x2000);
        assert_eq!(loaded.roots.get("inventory_panel"), Some(&0x3000));
        let memory = loaded.memory().unwrap();
        assert_eq!(memory.read_u64(0x2008).unwrap(), 0x4000);
    }

    #[test]
    fn test_image_file_rejects_bad_hex() {
        let file: ImageFile =
            serde_json::from_str(r#"{"regions":[{"base":4096,"bytes":"zz"}]}"#).unwrap();
        assert!(matches!(file.memory(), Err(Error::Hex(_))));
    }
}
