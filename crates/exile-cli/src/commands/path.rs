//! Path command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use exile_core::{ContextConfig, RemoteObject};
use owo_colors::OwoColorize;
use tracing::warn;

use super::open_context;

/// Run the path command
pub fn run(image: &Path, config: &ContextConfig, indices: &[usize]) -> Result<()> {
    let ctx = open_context(image, config)?;
    let root = ctx.ui_root();

    let element = root.child_from_indices(indices);
    if element.address().is_null() {
        warn!("Path {:?} does not resolve", indices);
        bail!("No element at {:?}", indices);
    }

    let elem = element.elem();
    println!("{} {}", "Element".bold(), element.address());
    println!("  path:       {}", element.path_from_root());
    println!("  valid:      {}", element.is_valid());
    println!(
        "  visible:    {} (local: {})",
        element.is_visible(),
        element.is_visible_local()
    );
    println!("  position:   ({}, {}) scale {}", elem.x, elem.y, elem.scale);
    println!("  size:       {} x {}", elem.width, elem.height);
    println!("  client:     {}", element.client_rect());
    println!("  children:   {}", element.child_count());
    println!("  background: {}", element.background_color());
    if !element.text().is_empty() {
        println!("  text:       {}", format!("{:?}", element.text()).green());
    }
    if !element.long_text().is_empty() {
        println!("  long text:  {:?}", element.long_text());
    }

    let chain = element.parent_chain();
    if !chain.is_empty() {
        println!("  ancestors:");
        for ancestor in &chain {
            println!("    {}", ancestor.address());
        }
    }
    Ok(())
}
