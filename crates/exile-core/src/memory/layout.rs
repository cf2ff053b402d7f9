//! Memory layout of the game structures read by this crate
//!
//! The raw structs here are the schema the object model projects from. They are
//! `#[repr(C)]` plain-old-data so a snapshot is a single `read_bytes` call
//! reinterpreted in place. Offsets are noted next to each field.

use bytemuck::{Pod, Zeroable};

/// Native small-string-optimized UTF-16 string
///
/// When `capacity` is below [`text::INLINE_CAPACITY`] the characters live in
/// `buffer` itself; otherwise the first 8 bytes of `buffer` point to them.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct NativeUtf16Text {
    pub buffer: [u8; 16],
    pub length: u64,
    pub capacity: u64,
}

impl NativeUtf16Text {
    pub fn is_inline(&self) -> bool {
        self.capacity < text::INLINE_CAPACITY
    }

    pub fn heap_pointer(&self) -> u64 {
        let mut array = [0u8; 8];
        array.copy_from_slice(&self.buffer[..8]);
        u64::from_le_bytes(array)
    }
}

/// Raw UI element header
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ElementOffsets {
    pub vtable: u64,                    // 0x00
    pub self_pointer: u64,              // 0x08
    pub child_start: u64,               // 0x10
    pub child_end: u64,                 // 0x18
    pub child_capacity_end: u64,        // 0x20
    pub parent: u64,                    // 0x28
    pub x: f32,                         // 0x30
    pub y: f32,                         // 0x34
    pub scale: f32,                     // 0x38
    pub is_visible_local: u8,           // 0x3C
    pub is_highlighted: u8,             // 0x3D
    pub _pad0: [u8; 2],                 // 0x3E
    pub width: f32,                     // 0x40
    pub height: f32,                    // 0x44
    pub tooltip: u64,                   // 0x48
    pub border_color: u32,              // 0x50
    pub background_color: u32,          // 0x54
    pub overlay_color: u32,             // 0x58
    pub text_box_border_color: u32,     // 0x5C
    pub text_box_background_color: u32, // 0x60
    pub text_box_overlay_color: u32,    // 0x64
    pub highlight_border_color: u32,    // 0x68
    pub _pad1: u32,                     // 0x6C
}

/// Raw life component
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct LifeComponentOffsets {
    pub vtable: u64,                // 0x00
    pub owner: u64,                 // 0x08
    pub max_hp: i32,                // 0x10
    pub cur_hp: i32,                // 0x14
    pub reserved_flat_hp: i32,      // 0x18
    pub reserved_percent_hp: i32,   // 0x1C
    pub max_mana: i32,              // 0x20
    pub cur_mana: i32,              // 0x24
    pub reserved_flat_mana: i32,    // 0x28
    pub reserved_percent_mana: i32, // 0x2C
    pub max_es: i32,                // 0x30
    pub cur_es: i32,                // 0x34
}

/// Element field offsets and flags
pub mod element {
    /// Size of [`super::ElementOffsets`]
    pub const SIZE: u64 = 0x70;

    pub const CHILD_START: u64 = 0x10;
    pub const IS_VISIBLE_LOCAL: u64 = 0x3C;

    /// Bit of `is_visible_local` that marks the element itself as shown
    pub const VISIBLE_FLAG: u8 = 8;

    /// Label text, directly after the header
    pub const TEXT: u64 = 0x70;
    /// Secondary label text
    pub const LONG_TEXT: u64 = 0x90;
}

/// Native string constants
pub mod text {
    /// Strings with a smaller capacity are stored inline
    pub const INLINE_CAPACITY: u64 = 8;

    /// Longest string read from a heap buffer, in UTF-16 units
    pub const MAX_LENGTH: u64 = 1024;
}

/// Screen mapping constants
pub mod screen {
    pub const REFERENCE_WIDTH: f32 = 2560.0;
    pub const REFERENCE_HEIGHT: f32 = 1600.0;
    /// 16:10
    pub const REFERENCE_ASPECT: f32 = 1.6;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_sizes() {
        assert_eq!(std::mem::size_of::<ElementOffsets>() as u64, element::SIZE);
        assert_eq!(std::mem::size_of::<NativeUtf16Text>(), 0x20);
        assert_eq!(std::mem::size_of::<LifeComponentOffsets>(), 0x38);
        assert_eq!(element::LONG_TEXT - element::TEXT, 0x20);
    }

    #[test]
    fn test_field_offsets() {
        assert_eq!(
            std::mem::offset_of!(ElementOffsets, child_start) as u64,
            element::CHILD_START
        );
        assert_eq!(
            std::mem::offset_of!(ElementOffsets, is_visible_local) as u64,
            element::IS_VISIBLE_LOCAL
        );
        assert_eq!(std::mem::offset_of!(ElementOffsets, tooltip), 0x48);
        assert_eq!(std::mem::offset_of!(LifeComponentOffsets, max_es), 0x30);
    }

    #[test]
    fn test_native_text_storage() {
        let mut text = NativeUtf16Text {
            capacity: 7,
            ..Default::default()
        };
        assert!(text.is_inline());

        text.capacity = 32;
        text.buffer[..8].copy_from_slice(&0x1234_5678u64.to_le_bytes());
        assert!(!text.is_inline());
        assert_eq!(text.heap_pointer(), 0x1234_5678);
    }
}
