//! Tree command implementation.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Result, bail};
use exile_core::{Address, ContextConfig, Element, Rect, RemoteObject};
use owo_colors::OwoColorize;

use super::open_context;

/// One printed row of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub depth: usize,
    pub index: usize,
    pub address: Address,
    pub visible: bool,
    pub rect: Rect,
    pub text: String,
    pub child_count: i64,
}

/// Flatten the tree below `root`, pre-order
///
/// Hidden subtrees are skipped unless `all` is set. Rows deeper than
/// `max_depth` are not emitted.
pub fn collect_rows(root: &Element, all: bool, max_depth: usize) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    let mut visited = HashSet::new();
    collect(root, 0, 0, all, max_depth, &mut visited, &mut rows);
    rows
}

fn collect(
    element: &Element,
    index: usize,
    depth: usize,
    all: bool,
    max_depth: usize,
    visited: &mut HashSet<Address>,
    rows: &mut Vec<TreeRow>,
) {
    if depth > max_depth || !visited.insert(element.address()) {
        return;
    }
    let visible = element.is_visible_local();
    if !visible && !all {
        return;
    }

    rows.push(TreeRow {
        depth,
        index,
        address: element.address(),
        visible,
        rect: element.client_rect(),
        text: element.text(),
        child_count: element.child_count(),
    });

    for (child_index, child) in element.children().iter().enumerate() {
        collect(child, child_index, depth + 1, all, max_depth, visited, rows);
    }
}

fn print_row(row: &TreeRow) {
    let indent = "  ".repeat(row.depth);
    let label = if row.text.is_empty() {
        String::new()
    } else {
        format!(" {:?}", row.text)
    };
    let line = format!(
        "{}[{}] {} {} children={}",
        indent, row.index, row.address, row.rect, row.child_count
    );

    if row.visible {
        println!("{}{}", line, label.green());
    } else {
        println!("{}{} {}", line.dimmed(), label.dimmed(), "(hidden)".yellow());
    }
}

/// Run the tree command
pub fn run(image: &Path, config: &ContextConfig, all: bool, depth: usize) -> Result<()> {
    let ctx = open_context(image, config)?;
    let root = ctx.ui_root();
    if !root.is_valid() {
        bail!("UI root {} does not point at an element", root.address());
    }

    let rows = collect_rows(&root, all, depth);
    for row in &rows {
        print_row(row);
    }
    println!();
    println!("{} elements", rows.len());
    Ok(())
}
