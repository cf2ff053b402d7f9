pub mod image;
pub mod layout;
mod reader;

#[cfg(test)]
pub mod mock;

pub use image::{ImageFile, MemoryImage, SurfaceSize};
pub use reader::{POINTER_SIZE, ReadMemory, decode_utf16, read_pod_dyn, read_pointer_array};

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
