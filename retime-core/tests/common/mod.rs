// retime-core/tests/common/mod.rs
//
// Shell scripts standing in for ffmpeg and ffprobe. They are all written once,
// before any test spawns a process, so no test ever execs a file another
// thread still holds open for writing.

#![allow(dead_code)]

use retime_core::{EngineConfig, ProbeStrategy};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::TempDir;

/// Reports five progress lines, writes its output file and succeeds.
const FFMPEG_OK: &str = r#"#!/bin/sh
for last; do :; done
printf 'ffmpeg version 6.1 Copyright (c) 2000-2023 the FFmpeg developers\n' >&2
printf "Input #0, matroska,webm, from 'input.webm':\n" >&2
printf 'Press [q] to stop, [?] for help\n' >&2
i=1
while [ $i -le 5 ]; do
  printf 'frame=%4d fps=25.0 q=28.0 size=%6dkB time=00:00:%02d.00 bitrate= 512.0kbits/s speed=1.00x\r' $((i * 25)) $((i * 64)) $i >&2
  sleep 0.02
  i=$((i + 1))
done
printf 'muxing\n'
printf 'fake-output' > "$last"
printf '\n' >&2
exit 0
"#;

/// Reports progress until interrupted, then exits 255 like ffmpeg.
const FFMPEG_INTERRUPTIBLE: &str = r#"#!/bin/sh
for last; do :; done
trap 'printf "Exiting normally, received signal 2.\n" >&2; exit 255' INT
printf 'partial' > "$last"
i=1
while :; do
  printf 'frame=%4d fps=25.0 q=28.0 size=%6dkB time=00:%02d:%02d.00 bitrate= 512.0kbits/s speed=1.00x\r' $i $i $((i / 60)) $((i % 60)) >&2
  sleep 0.05
  i=$((i + 1))
done
"#;

/// Fails the way ffmpeg does on an encoder error.
const FFMPEG_FAILING: &str = r#"#!/bin/sh
printf 'frame=   10 fps=0.0 q=0.0 size=       0kB time=00:00:00.40 bitrate=   0.0kbits/s speed=0.8x\r' >&2
printf '\nError while encoding\nConversion failed!\n' >&2
exit 1
"#;

/// Exits right away but leaves a background process holding its pipes.
const FFMPEG_DETACHING: &str = r#"#!/bin/sh
for last; do :; done
sleep 3 &
printf 'frame=   25 fps=25.0 q=28.0 size=      64kB time=00:00:01.00 bitrate= 512.0kbits/s speed=1.00x\r' >&2
printf 'fake-output' > "$last"
exit 0
"#;

/// Null-sink decode pass as used by the decode probe.
const FFMPEG_DECODE: &str = r#"#!/bin/sh
printf "Input #0, matroska,webm, from 'input.webm':\n" >&2
printf '  Duration: 00:00:49.71, start: 0.000000, bitrate: 300 kb/s\n' >&2
printf '  Stream #0:0(eng): Video: vp9 (Profile 0), yuv420p(tv), 320x240, SAR 1:1 DAR 4:3, 25 fps, 25 tbr, 1k tbn (default)\n' >&2
printf 'frame=  610 fps=0.0 q=-0.0 size=N/A time=00:00:24.36 bitrate=N/A speed=48.7x\r' >&2
printf 'frame= 1243 fps=0.0 q=-0.0 Lsize=N/A time=00:00:49.72 bitrate=N/A speed= 397x\n' >&2
exit 0
"#;

const FFPROBE_OK: &str = r#"#!/bin/sh
cat <<'JSON'
{
  "streams": [
    {"index": 0, "codec_type": "video", "codec_name": "vp9", "pix_fmt": "yuv420p", "width": 320, "height": 240},
    {"index": 1, "codec_type": "audio", "codec_name": "opus"}
  ],
  "format": {"filename": "input.webm", "duration": "49.713000"}
}
JSON
"#;

const FFPROBE_TWO_VIDEO: &str = r#"#!/bin/sh
cat <<'JSON'
{
  "streams": [
    {"index": 0, "codec_type": "video", "codec_name": "h264", "pix_fmt": "yuv420p", "width": 1920, "height": 1080},
    {"index": 1, "codec_type": "video", "codec_name": "mjpeg", "pix_fmt": "yuvj420p", "width": 600, "height": 600}
  ],
  "format": {"duration": "12.000000"}
}
JSON
"#;

const FFPROBE_AUDIO_ONLY: &str = r#"#!/bin/sh
printf '{"streams": [{"index": 0, "codec_type": "audio", "codec_name": "flac"}], "format": {"duration": "3.0"}}\n'
"#;

const FFPROBE_INVALID: &str = r#"#!/bin/sh
for last; do :; done
printf '%s: Invalid data found when processing input\n' "$last" >&2
exit 1
"#;

pub struct Fixtures {
    dir: TempDir,
    pub input: PathBuf,
    pub ffmpeg_ok: PathBuf,
    pub ffmpeg_interruptible: PathBuf,
    pub ffmpeg_failing: PathBuf,
    pub ffmpeg_detaching: PathBuf,
    pub ffmpeg_decode: PathBuf,
    pub ffprobe_ok: PathBuf,
    pub ffprobe_two_video: PathBuf,
    pub ffprobe_audio_only: PathBuf,
    pub ffprobe_invalid: PathBuf,
}

static FIXTURES: LazyLock<Fixtures> = LazyLock::new(|| {
    // RUST_LOG=debug shows the supervisor's logs in failing tests
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempfile::Builder::new()
        .prefix("retime-fixtures-")
        .tempdir()
        .expect("create fixture directory");
    let input = dir.path().join("input.webm");
    fs::write(&input, b"not really a webm").expect("write input");

    let base = dir.path().to_path_buf();
    let script = |name: &str, body: &str| write_script(&base, name, body);
    Fixtures {
        input,
        ffmpeg_ok: script("ffmpeg-ok", FFMPEG_OK),
        ffmpeg_interruptible: script("ffmpeg-interruptible", FFMPEG_INTERRUPTIBLE),
        ffmpeg_failing: script("ffmpeg-failing", FFMPEG_FAILING),
        ffmpeg_detaching: script("ffmpeg-detaching", FFMPEG_DETACHING),
        ffmpeg_decode: script("ffmpeg-decode", FFMPEG_DECODE),
        ffprobe_ok: script("ffprobe-ok", FFPROBE_OK),
        ffprobe_two_video: script("ffprobe-two-video", FFPROBE_TWO_VIDEO),
        ffprobe_audio_only: script("ffprobe-audio-only", FFPROBE_AUDIO_ONLY),
        ffprobe_invalid: script("ffprobe-invalid", FFPROBE_INVALID),
        dir,
    }
});

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    path
}

/// Shared fixtures; every test calls this before spawning anything.
pub fn fixtures() -> &'static Fixtures {
    &FIXTURES
}

impl Fixtures {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Config using the given fake engine and the well-behaved ffprobe.
    pub fn config(&self, ffmpeg: &Path) -> EngineConfig {
        EngineConfig {
            ffmpeg_path: ffmpeg.to_path_buf(),
            ffprobe_path: self.ffprobe_ok.clone(),
            temp_dir: None,
            probe_strategy: ProbeStrategy::Ffprobe,
        }
    }
}

/// Lists the entries of `dir` by file name, sorted.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
