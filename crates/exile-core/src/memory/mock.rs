//! Mock memory reader for testing
//!
//! Wraps a [`MemoryImage`] behind a lock so tests can mutate memory between
//! frames, and counts every read so tests can assert that no read happened.

use std::sync::atomic::{AtomicUsize, Ordering};

use bytemuck::Pod;
use parking_lot::RwLock;

use super::image::MemoryImage;
use super::reader::ReadMemory;
use crate::error::Result;

pub struct MockMemoryReader {
    memory: RwLock<MemoryImage>,
    reads: AtomicUsize,
}

impl MockMemoryReader {
    pub fn new(memory: MemoryImage) -> Self {
        Self {
            memory: RwLock::new(memory),
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of `read_bytes` calls so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn reset_read_count(&self) {
        self.reads.store(0, Ordering::SeqCst);
    }

    pub fn write_pod<T: Pod>(&self, address: u64, value: &T) {
        self.memory.write().write_pod(address, value);
    }

    pub fn write_pointers(&self, address: u64, pointers: &[u64]) {
        self.memory.write().write_pointers(address, pointers);
    }

    pub fn unmap(&self, address: u64) {
        self.memory.write().unmap(address);
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.memory.read().read_bytes(address, size)
    }
}

#[derive(Default)]
pub struct MockMemoryBuilder {
    memory: MemoryImage,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bytes(mut self, address: u64, data: &[u8]) -> Self {
        self.memory.write_bytes(address, data);
        self
    }

    pub fn write_i32(self, address: u64, value: i32) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_u64(self, address: u64, value: u64) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_pod<T: Pod>(mut self, address: u64, value: &T) -> Self {
        self.memory.write_pod(address, value);
        self
    }

    pub fn write_pointers(mut self, address: u64, pointers: &[u64]) -> Self {
        self.memory.write_pointers(address, pointers);
        self
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader::new(self.memory)
    }
}
