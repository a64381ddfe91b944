// ============================================================================
// retime-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for EngineConfig
//
// Fluent overrides on top of the environment-derived defaults.

use std::path::PathBuf;

use super::{EngineConfig, ProbeStrategy};

/// Builder for creating `EngineConfig` instances.
///
/// # Examples
///
/// ```rust
/// use retime_core::config::{EngineConfigBuilder, ProbeStrategy};
///
/// let config = EngineConfigBuilder::new()
///     .ffmpeg_path("/usr/local/bin/ffmpeg")
///     .probe_strategy(ProbeStrategy::Decode)
///     .temp_dir("/var/tmp/retime")
///     .build();
/// assert_eq!(config.probe_strategy, ProbeStrategy::Decode);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfigBuilder {
    /// Starts from `EngineConfig::default()`, i.e. the environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    #[must_use]
    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffmpeg_path = path.into();
        self
    }

    #[must_use]
    pub fn ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffprobe_path = path.into();
        self
    }

    /// Sets the base directory for scratch output.
    #[must_use]
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn probe_strategy(mut self, strategy: ProbeStrategy) -> Self {
        self.config.probe_strategy = strategy;
        self
    }

    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
