use bytemuck::Pod;

use crate::error::{Error, Result};

/// Size of a pointer in the target process.
pub const POINTER_SIZE: u64 = 8;

/// Core trait for reading memory from a target process.
///
/// Only [`ReadMemory::read_bytes`] is required; typed reads are built on top of it.
/// Implementations must report unmapped or short reads as errors instead of panicking.
pub trait ReadMemory: Send + Sync {
    /// Read `size` raw bytes starting at `address`
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Read a plain-old-data value
    fn read_pod<T: Pod>(&self, address: u64) -> Result<T>
    where
        Self: Sized,
    {
        read_pod_dyn(self, address)
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_bytes(address, 4)?;
        let array: [u8; 4] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::read_failed(address, "short read"))?;
        Ok(i32::from_le_bytes(array))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        let array: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::read_failed(address, "short read"))?;
        Ok(u64::from_le_bytes(array))
    }
}

/// Typed read usable through `dyn ReadMemory`.
pub fn read_pod_dyn<T: Pod, R: ReadMemory + ?Sized>(reader: &R, address: u64) -> Result<T> {
    let size = std::mem::size_of::<T>();
    let bytes = reader.read_bytes(address, size)?;

    if bytes.len() != size {
        return Err(Error::read_failed(
            address,
            format!("expected {} bytes, got {}", size, bytes.len()),
        ));
    }

    Ok(bytemuck::pod_read_unaligned(&bytes))
}

/// Read the pointer-sized values in `[start, end)`.
///
/// The whole span is read in one go; when that fails the pointers are read one
/// at a time and the result stops at the first failure, so a partially mapped
/// span yields a shorter sequence rather than an error. Spans holding more
/// than `limit` pointers are treated as garbage and yield nothing.
pub fn read_pointer_array<R: ReadMemory + ?Sized>(
    reader: &R,
    start: u64,
    end: u64,
    limit: usize,
) -> Vec<u64> {
    if start == 0 || end <= start {
        return Vec::new();
    }

    let count = (end - start) / POINTER_SIZE;
    let Some(size) = usize::try_from(count)
        .ok()
        .filter(|&count| count <= limit)
        .and_then(|count| count.checked_mul(POINTER_SIZE as usize))
    else {
        return Vec::new();
    };
    let count = size / POINTER_SIZE as usize;

    if let Ok(bytes) = reader.read_bytes(start, size) {
        if bytes.len() == size {
            return bytes
                .chunks_exact(POINTER_SIZE as usize)
                .map(|chunk| {
                    let mut array = [0u8; 8];
                    array.copy_from_slice(chunk);
                    u64::from_le_bytes(array)
                })
                .collect();
        }
    }

    let mut pointers = Vec::with_capacity(count);
    for i in 0..count as u64 {
        match reader.read_u64(start + i * POINTER_SIZE) {
            Ok(value) => pointers.push(value),
            Err(_) => break,
        }
    }
    pointers
}

/// Decode a UTF-16LE buffer, stopping at the first NUL.
pub fn decode_utf16(bytes: &[u8]) -> String {
    let wide: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .take_while(|&c| c != 0)
        .collect();
    String::from_utf16_lossy(&wide)
}
