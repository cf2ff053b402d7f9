//! Reader configuration file

use std::fs;
use std::path::Path;

use anyhow::Result;
use exile_core::ContextConfig;
use tracing::{info, warn};

/// Parse a TOML configuration file
pub fn load(path: &Path) -> Result<ContextConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load the configuration, falling back to defaults on any error
pub fn load_or_default(path: &Path) -> ContextConfig {
    match load(path) {
        Ok(config) => {
            info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            if path.exists() {
                warn!("Failed to load config: {}, using defaults", e);
            }
            ContextConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "client_rect_cache_ms = 50\nmax_parent_depth = 16").unwrap();

        let config = load(file.path()).unwrap();
        assert_eq!(config.client_rect_cache_ms, 50);
        assert_eq!(config.max_parent_depth, 16);
        assert_eq!(config.reference_width, 2560.0);
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let config = load_or_default(Path::new("does-not-exist.toml"));
        assert_eq!(config, ContextConfig::default());
    }

    #[test]
    fn test_invalid_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_parent_depth = \"deep\"").unwrap();

        assert!(load(file.path()).is_err());
        assert_eq!(load_or_default(file.path()), ContextConfig::default());
    }
}
