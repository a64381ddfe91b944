use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::utils::{format_duration, serialize_secs};

/// Frame dimensions of the selected video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Returns `None` when either dimension is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What the probe learned about the stream besides duration and size.
///
/// The variant depends on the probe strategy: ffprobe reports codec details,
/// the decode pass counts frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StreamDetails {
    Codec { codec: String, pixel_format: String },
    Frames { frame_count: u64 },
}

/// Metadata of an input video, computed once when it is opened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Total duration of the input
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,

    /// Resolution of the first video stream, when known
    pub resolution: Option<Resolution>,

    /// Strategy-specific stream details
    pub details: StreamDetails,
}

impl Metadata {
    #[must_use]
    pub fn codec(&self) -> Option<&str> {
        match &self.details {
            StreamDetails::Codec { codec, .. } => Some(codec),
            StreamDetails::Frames { .. } => None,
        }
    }

    #[must_use]
    pub fn pixel_format(&self) -> Option<&str> {
        match &self.details {
            StreamDetails::Codec { pixel_format, .. } => Some(pixel_format),
            StreamDetails::Frames { .. } => None,
        }
    }

    #[must_use]
    pub fn frame_count(&self) -> Option<u64> {
        match self.details {
            StreamDetails::Frames { frame_count } => Some(frame_count),
            StreamDetails::Codec { .. } => None,
        }
    }

    /// Expected duration of the output when re-timed by `speed`.
    ///
    /// Returns zero for a speed that is not a finite positive number.
    #[must_use]
    pub fn output_duration(&self, speed: f64) -> Duration {
        if !speed.is_finite() || speed <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.duration.as_secs_f64() / speed).unwrap_or(Duration::ZERO)
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duration {}", format_duration(self.duration))?;
        if let Some(resolution) = self.resolution {
            write!(f, ", {resolution}")?;
        }
        match &self.details {
            StreamDetails::Codec {
                codec,
                pixel_format,
            } => write!(f, ", {codec} ({pixel_format})"),
            StreamDetails::Frames { frame_count } => write!(f, ", {frame_count} frames"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec_metadata() -> Metadata {
        Metadata {
            duration: Duration::from_secs_f64(49.713),
            resolution: Resolution::new(320, 240),
            details: StreamDetails::Codec {
                codec: "vp9".to_string(),
                pixel_format: "yuv420p".to_string(),
            },
        }
    }

    #[test]
    fn test_resolution_rejects_zero_dimension() {
        assert_eq!(Resolution::new(0, 240), None);
        assert_eq!(Resolution::new(320, 0), None);
        assert_eq!(Resolution::new(320, 240).unwrap().to_string(), "320x240");
    }

    #[test]
    fn test_accessors_follow_details() {
        let metadata = codec_metadata();
        assert_eq!(metadata.codec(), Some("vp9"));
        assert_eq!(metadata.pixel_format(), Some("yuv420p"));
        assert_eq!(metadata.frame_count(), None);

        let frames = Metadata {
            details: StreamDetails::Frames { frame_count: 1243 },
            ..codec_metadata()
        };
        assert_eq!(frames.codec(), None);
        assert_eq!(frames.frame_count(), Some(1243));
    }

    #[test]
    fn test_output_duration() {
        let metadata = Metadata {
            duration: Duration::from_secs(60),
            ..codec_metadata()
        };
        assert_eq!(metadata.output_duration(2.0), Duration::from_secs(30));
        assert_eq!(metadata.output_duration(0.5), Duration::from_secs(120));
        assert_eq!(metadata.output_duration(0.0), Duration::ZERO);
        assert_eq!(metadata.output_duration(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_display_and_json() {
        let metadata = codec_metadata();
        assert_eq!(metadata.to_string(), "duration 00:00:49, 320x240, vp9 (yuv420p)");

        let json = serde_json::to_value(&metadata).unwrap();
        assert!((json["duration"].as_f64().unwrap() - 49.713).abs() < 1e-6);
        assert_eq!(json["resolution"]["width"], 320);
        assert_eq!(json["details"]["kind"], "codec");
        assert_eq!(json["details"]["pixel_format"], "yuv420p");
    }
}
