// retime-cli/src/output.rs
//
// Terminal presentation: metadata listing and the encode progress bar.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use retime_core::{Metadata, Progress, StreamDetails, format_bytes, format_duration};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

const PROGRESS_TEMPLATE: &str =
    "  ⧖ Encoding: {percent:>3}% [{bar:30}] ({elapsed_precise} / {eta_precise}) {msg}";

/// Print an info line with an aligned label.
pub fn print_info<T: std::fmt::Display>(label: &str, value: T) {
    println!("{label:<12} {value}");
}

/// Prints the metadata of `input` the way `probe` shows it.
pub fn print_metadata(input: &Path, metadata: &Metadata) {
    print_info("Input:", input.display());
    print_info("Duration:", format_duration(metadata.duration));
    match &metadata.resolution {
        Some(resolution) => print_info("Resolution:", resolution),
        None => print_info("Resolution:", "unknown"),
    }
    match &metadata.details {
        StreamDetails::Codec {
            codec,
            pixel_format,
        } => {
            print_info("Codec:", codec);
            print_info("Pixel fmt:", pixel_format);
        }
        StreamDetails::Frames { frame_count } => print_info("Frames:", frame_count),
    }
}

/// Creates a bar measuring output time in milliseconds up to `total`.
///
/// The bar is hidden when stderr is not a terminal.
pub fn create_progress_bar(total: Duration) -> ProgressBar {
    let length = u64::try_from(total.as_millis()).unwrap_or(u64::MAX).max(1);
    let bar = ProgressBar::new(length);
    match ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
        Ok(style) => bar.set_style(style.progress_chars("##.")),
        Err(e) => log::debug!("Falling back to default progress style: {e}"),
    }
    if !std::io::stderr().is_terminal() {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    bar
}

/// Moves the bar to the time of `progress` and shows its rates.
pub fn update_progress_bar(bar: &ProgressBar, progress: &Progress) {
    let position = u64::try_from(progress.time.as_millis()).unwrap_or(u64::MAX);
    bar.set_position(position.min(bar.length().unwrap_or(u64::MAX)));
    bar.set_message(progress_message(progress));
}

/// One-line summary of a progress record.
#[must_use]
pub fn progress_message(progress: &Progress) -> String {
    let size = progress
        .size_bytes()
        .map_or_else(|| progress.size.clone(), format_bytes);
    let mut message = format!("{:.1} fps, {}, {} written", progress.fps, progress.bitrate, size);
    if let Some(speed) = progress.speed {
        message.push_str(&format!(", {speed:.2}x"));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(speed: Option<f64>) -> Progress {
        Progress {
            frame: Some(250),
            fps: 24.96,
            size: "2048kB".to_string(),
            time: Duration::from_secs(10),
            bitrate: "1677.7kbits/s".to_string(),
            speed,
        }
    }

    #[test]
    fn test_progress_message() {
        let message = progress_message(&sample(Some(1.5)));
        assert!(message.starts_with("25.0 fps, 1677.7kbits/s, "));
        assert!(message.ends_with(" written, 1.50x"));
        assert!(!progress_message(&sample(None)).contains('x'));
    }

    #[test]
    fn test_progress_bar_clamps_to_total() {
        let bar = create_progress_bar(Duration::from_secs(5));
        assert_eq!(bar.length(), Some(5_000));
        update_progress_bar(&bar, &sample(None));
        assert_eq!(bar.position(), 5_000);
    }
}
