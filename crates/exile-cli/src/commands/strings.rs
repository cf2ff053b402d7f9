//! Strings command implementation.

use std::path::Path;

use anyhow::Result;
use exile_core::ContextConfig;

use super::open_context;

/// Run the strings command
pub fn run(image: &Path, config: &ContextConfig) -> Result<()> {
    let ctx = open_context(image, config)?;

    let elements = ctx.ui_root().all_text_elements();
    for element in &elements {
        println!("{:<22} {:?}", element.path_from_root(), element.text());
    }
    println!();
    println!("{} labels", elements.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::commands::sample::{self, tests::sample_context};
    use exile_core::RemoteObject;

    #[test]
    fn test_label_paths() {
        let (_file, ctx) = sample_context();
        let elements = ctx.ui_root().all_text_elements();

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].address().raw(), sample::SLOT_SWORD);
        assert_eq!(elements[0].path_from_root(), "(inventory_panel)0->0");
        assert_eq!(elements[2].path_from_root(), "(chat)1->0");
    }

    #[test]
    fn test_element_by_string() {
        let (_file, ctx) = sample_context();
        let found = ctx.ui_root().element_by_string("Sword").unwrap();

        assert_eq!(found.address().raw(), sample::SLOT_SWORD);
        assert!(ctx.ui_root().element_by_string("Shield").is_none());
    }
}
