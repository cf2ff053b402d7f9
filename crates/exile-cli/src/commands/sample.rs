//! Sample command implementation.
//!
//! Writes a small hand-built UI tree so the other commands have something
//! to inspect without a live capture.

use std::path::Path;

use anyhow::Result;
use exile_core::memory::POINTER_SIZE;
use exile_core::memory::layout::{ElementOffsets, LifeComponentOffsets, NativeUtf16Text, element};
use exile_core::{ImageFile, MemoryImage, SurfaceSize};

pub const ROOT: u64 = 0x10_000;
pub const HUD: u64 = 0x10_800;
pub const INVENTORY: u64 = 0x11_000;
pub const SLOT_SWORD: u64 = 0x12_000;
pub const SLOT_FLASK: u64 = 0x13_000;
pub const CHAT: u64 = 0x14_000;
pub const CHAT_LINE: u64 = 0x15_000;
pub const LIFE: u64 = 0x30_000;

const ROOT_CHILDREN: u64 = 0x20_000;
const HUD_CHILDREN: u64 = 0x20_800;
const INVENTORY_CHILDREN: u64 = 0x21_000;
const CHAT_CHILDREN: u64 = 0x22_000;
const HEAP_TEXT: u64 = 0x40_000;

struct Node {
    address: u64,
    parent: u64,
    position: (f32, f32),
    size: (f32, f32),
    visible: bool,
}

impl Node {
    fn new(address: u64, parent: u64, position: (f32, f32), size: (f32, f32)) -> Self {
        Self {
            address,
            parent,
            position,
            size,
            visible: true,
        }
    }

    fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn header(&self) -> ElementOffsets {
        ElementOffsets {
            self_pointer: self.address,
            parent: self.parent,
            x: self.position.0,
            y: self.position.1,
            scale: 1.0,
            width: self.size.0,
            height: self.size.1,
            is_visible_local: if self.visible { element::VISIBLE_FLAG } else { 0 },
            background_color: 0xCC10_1010,
            ..Default::default()
        }
    }
}

fn write_element(memory: &mut MemoryImage, node: &Node, children: &[u64], array: u64) {
    let mut header = node.header();
    if !children.is_empty() {
        header.child_start = array;
        header.child_end = array + children.len() as u64 * POINTER_SIZE;
        header.child_capacity_end = header.child_end;
        memory.write_pointers(array, children);
    }
    memory.write_pod(node.address, &header);
}

fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Label stored in the string header itself; at most 7 UTF-16 units
fn inline_label(text: &str) -> NativeUtf16Text {
    let bytes = utf16(text);
    let mut native = NativeUtf16Text {
        length: (bytes.len() / 2) as u64,
        capacity: 7,
        ..Default::default()
    };
    native.buffer[..bytes.len()].copy_from_slice(&bytes);
    native
}

/// Label whose characters live in a separate buffer
fn heap_label(memory: &mut MemoryImage, buffer: u64, text: &str) -> NativeUtf16Text {
    let bytes = utf16(text);
    memory.write_bytes(buffer, &bytes);
    let mut native = NativeUtf16Text {
        length: (bytes.len() / 2) as u64,
        capacity: (bytes.len() / 2).max(8) as u64,
        ..Default::default()
    };
    native.buffer[..8].copy_from_slice(&buffer.to_le_bytes());
    native
}

/// Build the sample image
///
/// ```text
/// root
/// └── hud
///     ├── inventory_panel   (visible)
///     │   ├── "Sword"
///     │   └── "x4 Flask" behind an icon placeholder
///     └── chat              (hidden)
///         └── "Welcome to the sample image"
/// ```
pub fn build() -> ImageFile {
    let mut memory = MemoryImage::new();

    let nodes = [
        (
            Node::new(ROOT, 0, (0.0, 0.0), (2560.0, 1600.0)),
            vec![HUD],
            ROOT_CHILDREN,
        ),
        (
            Node::new(HUD, ROOT, (0.0, 0.0), (2560.0, 1600.0)),
            vec![INVENTORY, CHAT],
            HUD_CHILDREN,
        ),
        (
            Node::new(INVENTORY, HUD, (1700.0, 600.0), (800.0, 900.0)),
            vec![SLOT_SWORD, SLOT_FLASK],
            INVENTORY_CHILDREN,
        ),
        (
            Node::new(SLOT_SWORD, INVENTORY, (20.0, 40.0), (140.0, 280.0)),
            vec![],
            0,
        ),
        (
            Node::new(SLOT_FLASK, INVENTORY, (180.0, 40.0), (70.0, 140.0)),
            vec![],
            0,
        ),
        (
            Node::new(CHAT, HUD, (20.0, 1100.0), (900.0, 400.0)).hidden(),
            vec![CHAT_LINE],
            CHAT_CHILDREN,
        ),
        (
            Node::new(CHAT_LINE, CHAT, (0.0, 0.0), (900.0, 24.0)),
            vec![],
            0,
        ),
    ];
    for (node, children, array) in &nodes {
        write_element(&mut memory, node, children, *array);
    }

    memory.write_pod(SLOT_SWORD + element::TEXT, &inline_label("Sword"));
    let flask = heap_label(&mut memory, HEAP_TEXT, "\u{A0}\u{A0}\u{A0}\u{A0}x4 Flask");
    memory.write_pod(SLOT_FLASK + element::TEXT, &flask);
    let welcome = heap_label(&mut memory, HEAP_TEXT + 0x100, "Welcome to the sample image");
    memory.write_pod(CHAT_LINE + element::TEXT, &welcome);

    memory.write_pod(
        LIFE,
        &LifeComponentOffsets {
            max_hp: 150,
            cur_hp: 40,
            reserved_flat_hp: 60,
            max_mana: 200,
            cur_mana: 120,
            reserved_percent_mana: 2500,
            max_es: 80,
            cur_es: 80,
            ..Default::default()
        },
    );

    let mut file = ImageFile::from_memory(&memory);
    file.ui_root = ROOT;
    file.surface = SurfaceSize {
        width: 1920.0,
        height: 1080.0,
    };
    file.roots.insert("inventory_panel".to_string(), INVENTORY);
    file.roots.insert("chat".to_string(), CHAT);
    file
}

/// Run the sample command
pub fn run(output: &Path) -> Result<()> {
    let file = build();
    file.save(output)?;
    println!("Sample image written to {:?}", output);
    println!("Try: exile --image {:?} tree --all", output);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use exile_core::{ContextConfig, RemoteContext, RemoteObject};
    use tempfile::NamedTempFile;

    /// Context over the sample image, via a file on disk
    pub(crate) fn sample_context() -> (NamedTempFile, RemoteContext) {
        let temp_file = NamedTempFile::new().unwrap();
        run(temp_file.path()).unwrap();
        let ctx = crate::commands::open_context(temp_file.path(), &ContextConfig::default()).unwrap();
        (temp_file, ctx)
    }

    #[test]
    fn test_sample_tree_shape() {
        let (_file, ctx) = sample_context();
        let root = ctx.ui_root();

        assert_eq!(root.child_count(), 1);
        assert_eq!(root.child_at(0).child_count(), 2);
        assert_eq!(root.child_from_indices(&[0, 0]).address().raw(), INVENTORY);
        assert_eq!(root.child_from_indices(&[0, 0, 1]).address().raw(), SLOT_FLASK);
        assert_eq!(ctx.named_root("chat").address().raw(), CHAT);
    }

    #[test]
    fn test_sample_labels() {
        let (_file, ctx) = sample_context();
        let root = ctx.ui_root();

        assert_eq!(root.child_from_indices(&[0, 0, 0]).text(), "Sword");
        assert_eq!(root.child_from_indices(&[0, 0, 1]).text(), "{{icon}}x4 Flask");
        assert_eq!(
            root.all_strings(),
            vec!["Sword", "{{icon}}x4 Flask", "Welcome to the sample image"]
        );
    }

    #[test]
    fn test_sample_visibility() {
        let (_file, ctx) = sample_context();
        let root = ctx.ui_root();

        assert!(root.child_from_indices(&[0, 0, 0]).is_visible());
        assert!(!root.child_from_indices(&[0, 1, 0]).is_visible());
    }
}
