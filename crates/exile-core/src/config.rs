//! Tunables for reading the UI tree

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::memory::layout::screen;

/// Addresses at or above this value are treated as garbage
pub const DEFAULT_INVALID_ADDRESS_FLOOR: u64 = 1_770_350_607_106_052;

/// Configuration for a [`crate::RemoteContext`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Resolution UI coordinates are authored in
    pub reference_width: f32,
    pub reference_height: f32,
    /// Aspect ratio the horizontal correction is relative to
    pub reference_aspect: f32,
    /// How long a computed client rectangle stays valid (ms)
    pub client_rect_cache_ms: u64,
    pub invalid_address_floor: u64,
    /// Longest parent chain followed before giving up
    pub max_parent_depth: usize,
    /// Largest child span accepted; bigger spans are treated as torn reads
    pub max_child_count: usize,
    /// Deepest level visited by whole-tree traversals
    pub max_tree_depth: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            reference_width: screen::REFERENCE_WIDTH,
            reference_height: screen::REFERENCE_HEIGHT,
            reference_aspect: screen::REFERENCE_ASPECT,
            client_rect_cache_ms: 200,
            invalid_address_floor: DEFAULT_INVALID_ADDRESS_FLOOR,
            max_parent_depth: 256,
            max_child_count: 16_384,
            max_tree_depth: 256,
        }
    }
}

impl ContextConfig {
    /// Create a new configuration builder
    pub fn builder() -> ContextConfigBuilder {
        ContextConfigBuilder::default()
    }

    pub fn client_rect_window(&self) -> Duration {
        Duration::from_millis(self.client_rect_cache_ms)
    }
}

/// Builder for ContextConfig
#[derive(Debug, Clone, Default)]
pub struct ContextConfigBuilder {
    reference_size: Option<(f32, f32)>,
    reference_aspect: Option<f32>,
    client_rect_cache_ms: Option<u64>,
    invalid_address_floor: Option<u64>,
    max_parent_depth: Option<usize>,
    max_child_count: Option<usize>,
    max_tree_depth: Option<usize>,
}

impl ContextConfigBuilder {
    pub fn reference_size(mut self, width: f32, height: f32) -> Self {
        self.reference_size = Some((width, height));
        self
    }

    pub fn reference_aspect(mut self, aspect: f32) -> Self {
        self.reference_aspect = Some(aspect);
        self
    }

    pub fn client_rect_cache_ms(mut self, ms: u64) -> Self {
        self.client_rect_cache_ms = Some(ms);
        self
    }

    pub fn invalid_address_floor(mut self, floor: u64) -> Self {
        self.invalid_address_floor = Some(floor);
        self
    }

    pub fn max_parent_depth(mut self, depth: usize) -> Self {
        self.max_parent_depth = Some(depth);
        self
    }

    pub fn max_child_count(mut self, count: usize) -> Self {
        self.max_child_count = Some(count);
        self
    }

    pub fn max_tree_depth(mut self, depth: usize) -> Self {
        self.max_tree_depth = Some(depth);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ContextConfig {
        let default = ContextConfig::default();
        let (reference_width, reference_height) = self
            .reference_size
            .unwrap_or((default.reference_width, default.reference_height));
        ContextConfig {
            reference_width,
            reference_height,
            reference_aspect: self.reference_aspect.unwrap_or(default.reference_aspect),
            client_rect_cache_ms: self
                .client_rect_cache_ms
                .unwrap_or(default.client_rect_cache_ms),
            invalid_address_floor: self
                .invalid_address_floor
                .unwrap_or(default.invalid_address_floor),
            max_parent_depth: self.max_parent_depth.unwrap_or(default.max_parent_depth),
            max_child_count: self.max_child_count.unwrap_or(default.max_child_count),
            max_tree_depth: self.max_tree_depth.unwrap_or(default.max_tree_depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        assert_eq!(ContextConfig::builder().build(), ContextConfig::default());
        assert_eq!(
            ContextConfig::default().client_rect_window(),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = ContextConfig::builder()
            .reference_size(1920.0, 1080.0)
            .max_parent_depth(4)
            .build();

        assert_eq!(config.reference_width, 1920.0);
        assert_eq!(config.reference_height, 1080.0);
        assert_eq!(config.max_parent_depth, 4);
        assert_eq!(config.max_child_count, 16_384);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ContextConfig =
            serde_json::from_str(r#"{"client_rect_cache_ms": 50}"#).unwrap();
        assert_eq!(config.client_rect_cache_ms, 50);
        assert_eq!(config.reference_aspect, 1.6);
    }
}
