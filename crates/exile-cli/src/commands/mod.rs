//! CLI command implementations.

pub mod hex_utils;
pub mod life;
pub mod path;
pub mod sample;
pub mod strings;
pub mod tree;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use exile_core::{ContextConfig, ImageFile, RemoteContext, UiRoots};
use tracing::info;

/// Load a memory image and build a context over it
pub fn open_context(image: &Path, config: &ContextConfig) -> Result<RemoteContext> {
    let file = ImageFile::load(image).with_context(|| format!("Failed to load {:?}", image))?;
    let memory = file.memory()?;
    let roots: UiRoots = file
        .roots
        .iter()
        .map(|(name, &address)| (name.clone(), address))
        .collect();

    info!(
        "Opened image: {} regions, ui_root=0x{:X}, {} named roots",
        memory.region_count(),
        file.ui_root,
        roots.len()
    );

    Ok(RemoteContext::builder(Arc::new(memory))
        .config(config.clone())
        .ui_root(file.ui_root)
        .surface(file.surface)
        .roots(roots)
        .build())
}
