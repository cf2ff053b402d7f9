//! Watch command implementation.
//!
//! Re-reads the image file on every tick, so an external dumper can keep
//! overwriting it while this prints which labels appear and disappear.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use exile_core::{ContextConfig, RemoteContext};
use owo_colors::OwoColorize;
use tracing::{info, warn};

use super::open_context;
use crate::shutdown::ShutdownSignal;

/// `(path, text)` of every label currently on screen
pub fn visible_labels(ctx: &RemoteContext) -> BTreeSet<(String, String)> {
    ctx.ui_root()
        .all_text_elements()
        .into_iter()
        .filter(|element| element.is_visible())
        .map(|element| (element.path_from_root(), element.text()))
        .collect()
}

/// Run the watch command
pub fn run(image: &Path, config: &ContextConfig, interval: u64) -> Result<()> {
    // Setup graceful shutdown handler
    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        shutdown_ctrlc.trigger();
    })?;

    info!("Watching {:?} every {}ms (Ctrl-C to stop)", image, interval);
    let interval = Duration::from_millis(interval);
    let mut previous = BTreeSet::new();

    while !shutdown.is_shutdown() {
        match open_context(image, config) {
            Ok(ctx) => {
                let current = visible_labels(&ctx);
                for (path, text) in current.difference(&previous) {
                    println!("{} {:<22} {:?}", "+".green(), path, text);
                }
                for (path, text) in previous.difference(&current) {
                    println!("{} {:<22} {:?}", "-".red(), path, text);
                }
                previous = current;
            }
            Err(e) => warn!("Failed to read image: {:#}", e),
        }

        if shutdown.wait(interval) {
            break;
        }
    }

    info!("Stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sample::tests::sample_context;

    #[test]
    fn test_hidden_labels_are_not_reported() {
        let (_file, ctx) = sample_context();
        let labels = visible_labels(&ctx);

        assert_eq!(labels.len(), 2);
        assert!(labels.contains(&("(inventory_panel)0->0".to_string(), "Sword".to_string())));
        assert!(!labels.iter().any(|(_, text)| text.starts_with("Welcome")));
    }
}
