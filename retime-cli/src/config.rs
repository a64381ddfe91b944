// retime-cli/src/config.rs
//
// Maps global CLI options onto the core engine configuration.

use crate::cli::Cli;
use retime_core::{EngineConfig, EngineConfigBuilder};

/// Environment defaults with any command-line overrides applied on top.
#[must_use]
pub fn engine_config(cli: &Cli) -> EngineConfig {
    let mut builder = EngineConfigBuilder::new();
    if let Some(ffmpeg) = &cli.ffmpeg {
        builder = builder.ffmpeg_path(ffmpeg);
    }
    if let Some(ffprobe) = &cli.ffprobe {
        builder = builder.ffprobe_path(ffprobe);
    }
    if let Some(strategy) = cli.probe_strategy {
        builder = builder.probe_strategy(strategy);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use retime_core::ProbeStrategy;
    use std::path::Path;

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "retime",
            "--ffmpeg",
            "/opt/ff/ffmpeg",
            "--ffprobe",
            "/opt/ff/ffprobe",
            "--probe-strategy",
            "decode",
            "probe",
            "in.webm",
        ])
        .unwrap();
        let config = engine_config(&cli);
        assert_eq!(config.ffmpeg_path, Path::new("/opt/ff/ffmpeg"));
        assert_eq!(config.ffprobe_path, Path::new("/opt/ff/ffprobe"));
        assert_eq!(config.probe_strategy, ProbeStrategy::Decode);
    }
}
