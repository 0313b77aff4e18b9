//! Meeting file conventions: recording discovery, input pairing, and output naming.
//!
//! A recording `<name>.webm` in the input directory is paired with its
//! live-caption export `<name>.txt`. Outputs are named after the sanitized
//! recording name, which starts with the `YYYY_MM_DD` tag the history loader
//! keys on.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::SystemTime;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info, instrument};

use recap_shared::{INSIGHT_SUFFIX, RecapError, Result, SUMMARY_SUFFIX, TRANSCRIPTION_SUFFIX};

/// Extension of recorded meeting audio.
pub const RECORDING_EXTENSION: &str = "webm";

/// Extension of the live-caption transcript next to a recording.
pub const CAPTIONS_EXTENSION: &str = "txt";

/// Suffix of the re-encoded copy of a recording, before the extension.
pub const COMPRESSED_SUFFIX: &str = "-compressed";

/// Recordings larger than this are re-encoded before transcription.
pub const COMPRESSION_THRESHOLD_BYTES: u64 = 3 * 1024 * 1024;

/// Prefix added by the recording extension.
const RECORDER_PREFIX: &str = "beesy_recording-";

static TIME_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_[0-9]{2}_[0-9]{2}_[0-9]{2}-.*$").expect("valid regex"));

static LEADING_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})_([0-9]{2})_([0-9]{2})").expect("valid regex"));

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Name (without extension) of the most recently modified recording in `input_dir`.
pub fn latest_recording(input_dir: &Path) -> Result<String> {
    let entries = std::fs::read_dir(input_dir).map_err(|e| RecapError::io(input_dir, e))?;

    let mut newest: Option<(SystemTime, String)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| RecapError::io(input_dir, e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(RECORDING_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        if stem.ends_with(COMPRESSED_SUFFIX) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| RecapError::io(&path, e))?;

        let is_newer = match &newest {
            Some((time, name)) => modified > *time || (modified == *time && stem > *name),
            None => true,
        };
        if is_newer {
            newest = Some((modified, stem));
        }
    }

    let (_, name) = newest.ok_or_else(|| {
        RecapError::validation(format!(
            "no .{RECORDING_EXTENSION} recordings found in {}",
            input_dir.display()
        ))
    })?;
    debug!(recording = %name, "latest recording selected");
    Ok(name)
}

/// Strip the recorder prefix and the `_HH_MM_SS-<code>` suffix from a recording name.
///
/// `beesy_recording-2025_07_02_10_15_00-abc-defg-hij` becomes `2025_07_02`.
/// Names in any other shape pass through minus the prefix.
pub fn sanitize_recording_name(name: &str) -> String {
    let name = name.strip_prefix(RECORDER_PREFIX).unwrap_or(name);
    TIME_SUFFIX_RE.replace(name, "").into_owned()
}

/// The date a recording tag starts with, if it is a valid calendar date.
pub fn date_from_tag(tag: &str) -> Option<NaiveDate> {
    let caps = LEADING_DATE_RE.captures(tag)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Input and output locations for one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingPaths {
    /// Sanitized name that prefixes every output file.
    pub tag: String,
    pub audio: PathBuf,
    /// Opus re-encode of `audio`, produced on demand by [`compress_recording`].
    pub compressed_audio: PathBuf,
    pub captions: PathBuf,
    pub transcription: PathBuf,
    pub summary: PathBuf,
    pub insights: PathBuf,
}

impl MeetingPaths {
    pub fn new(input_dir: &Path, output_dir: &Path, recording: &str) -> Self {
        let tag = sanitize_recording_name(recording);
        Self {
            audio: input_dir.join(format!("{recording}.{RECORDING_EXTENSION}")),
            compressed_audio: input_dir
                .join(format!("{recording}{COMPRESSED_SUFFIX}.{RECORDING_EXTENSION}")),
            captions: input_dir.join(format!("{recording}.{CAPTIONS_EXTENSION}")),
            transcription: output_dir.join(format!("{tag}{TRANSCRIPTION_SUFFIX}")),
            summary: output_dir.join(format!("{tag}{SUMMARY_SUFFIX}")),
            insights: output_dir.join(format!("{tag}{INSIGHT_SUFFIX}")),
            tag,
        }
    }
}

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

/// The recording to upload for transcription.
///
/// An existing `compressed` file is reused as is. Otherwise recordings above
/// [`COMPRESSION_THRESHOLD_BYTES`] are re-encoded to 64 kbit/s Opus with
/// `ffmpeg`, and smaller ones are returned unchanged.
#[instrument(skip_all, fields(audio = %audio.display()))]
pub async fn compress_recording(audio: &Path, compressed: &Path) -> Result<PathBuf> {
    if tokio::fs::try_exists(compressed)
        .await
        .map_err(|e| RecapError::io(compressed, e))?
    {
        info!(path = %compressed.display(), "reusing compressed recording");
        return Ok(compressed.to_path_buf());
    }

    let size = tokio::fs::metadata(audio)
        .await
        .map_err(|e| RecapError::io(audio, e))?
        .len();
    if size <= COMPRESSION_THRESHOLD_BYTES {
        debug!(bytes = size, "recording small enough to upload as is");
        return Ok(audio.to_path_buf());
    }

    info!(bytes = size, "compressing recording");
    let start = std::time::Instant::now();
    let output = tokio::process::Command::new("ffmpeg")
        .arg("-i")
        .arg(audio)
        .args(["-c:a", "libopus", "-b:a", "64k"])
        .arg(compressed)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| RecapError::backend(format!("failed to run ffmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr.lines().rfind(|l| !l.trim().is_empty()).unwrap_or_default();
        return Err(RecapError::backend(format!(
            "ffmpeg exited with {}: {last_line}",
            output.status
        )));
    }

    info!(
        path = %compressed.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "recording compressed"
    );
    Ok(compressed.to_path_buf())
}

// ---------------------------------------------------------------------------
// File IO
// ---------------------------------------------------------------------------

/// Contents of `path`, or `None` if it does not exist.
pub async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RecapError::io(path, e)),
    }
}

/// Contents of `path`; a missing file reads as empty text.
pub async fn read_or_empty(path: &Path) -> Result<String> {
    Ok(read_optional(path).await?.unwrap_or_default())
}

/// Write `content` to `path`, creating parent directories as needed.
pub async fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RecapError::io(parent, e))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| RecapError::io(path, e))?;
    info!(path = %path.display(), bytes = content.len(), "output written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, FileTimes};
    use std::time::Duration;

    fn touch(dir: &Path, name: &str, age_secs: u64) {
        let file = File::create(dir.join(name)).unwrap();
        let when = SystemTime::now() - Duration::from_secs(age_secs);
        file.set_times(FileTimes::new().set_modified(when)).unwrap();
    }

    #[test]
    fn latest_recording_picks_newest_webm() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "2025_06_30_09_00_00-old.webm", 3600);
        touch(dir.path(), "2025_07_02_10_00_00-new.webm", 60);
        touch(dir.path(), "2025_07_03_10_00_00-newer.txt", 0);

        let name = latest_recording(dir.path()).unwrap();
        assert_eq!(name, "2025_07_02_10_00_00-new");
    }

    #[test]
    fn latest_recording_skips_compressed_copies() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "2025_07_02_10_00_00-abc.webm", 60);
        touch(dir.path(), "2025_07_02_10_00_00-abc-compressed.webm", 0);

        let name = latest_recording(dir.path()).unwrap();
        assert_eq!(name, "2025_07_02_10_00_00-abc");
    }

    #[test]
    fn latest_recording_without_webm_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "notes.txt", 0);
        let err = latest_recording(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no .webm recordings"));
    }

    #[test]
    fn latest_recording_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = latest_recording(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, RecapError::Io { .. }));
    }

    #[test]
    fn sanitize_strips_prefix_and_time_suffix() {
        assert_eq!(
            sanitize_recording_name("beesy_recording-2025_07_02_10_15_00-abc-defg-hij"),
            "2025_07_02"
        );
        assert_eq!(sanitize_recording_name("2025_07_02_10_15_00-xyz"), "2025_07_02");
        assert_eq!(sanitize_recording_name("weekly-sync"), "weekly-sync");
        assert_eq!(sanitize_recording_name("2025_07_02"), "2025_07_02");
        assert_eq!(
            sanitize_recording_name("2025_07_02_١٠_١٥_٠٠-xyz"),
            "2025_07_02_١٠_١٥_٠٠-xyz"
        );
    }

    #[test]
    fn date_from_tag_parses_valid_dates_only() {
        assert_eq!(
            date_from_tag("2025_07_02-summary.md"),
            NaiveDate::from_ymd_opt(2025, 7, 2)
        );
        assert_eq!(date_from_tag("2025_13_40"), None);
        assert_eq!(date_from_tag("٢٠٢٥_٠٧_٠٢"), None);
        assert_eq!(date_from_tag("weekly-sync"), None);
    }

    #[test]
    fn paths_follow_naming_convention() {
        let paths = MeetingPaths::new(
            Path::new("in"),
            Path::new("out"),
            "beesy_recording-2025_07_02_10_15_00-abc",
        );
        assert_eq!(paths.tag, "2025_07_02");
        assert_eq!(paths.audio, Path::new("in/beesy_recording-2025_07_02_10_15_00-abc.webm"));
        assert_eq!(
            paths.compressed_audio,
            Path::new("in/beesy_recording-2025_07_02_10_15_00-abc-compressed.webm")
        );
        assert_eq!(paths.captions, Path::new("in/beesy_recording-2025_07_02_10_15_00-abc.txt"));
        assert_eq!(paths.transcription, Path::new("out/2025_07_02-transcription.txt"));
        assert_eq!(paths.summary, Path::new("out/2025_07_02-summary.md"));
        assert_eq!(paths.insights, Path::new("out/2025_07_02-deeper-insights.md"));
    }

    #[tokio::test]
    async fn existing_compressed_recording_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let paths = MeetingPaths::new(dir.path(), dir.path(), "2025_07_02_10_00_00-abc");
        std::fs::write(&paths.audio, vec![0u8; 16]).unwrap();
        std::fs::write(&paths.compressed_audio, b"opus").unwrap();

        let upload = compress_recording(&paths.audio, &paths.compressed_audio)
            .await
            .unwrap();
        assert_eq!(upload, paths.compressed_audio);
    }

    #[tokio::test]
    async fn small_recording_is_uploaded_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let paths = MeetingPaths::new(dir.path(), dir.path(), "2025_07_02_10_00_00-abc");
        std::fs::write(&paths.audio, vec![0u8; 1024]).unwrap();

        let upload = compress_recording(&paths.audio, &paths.compressed_audio)
            .await
            .unwrap();
        assert_eq!(upload, paths.audio);
        assert!(!paths.compressed_audio.exists());
    }

    #[tokio::test]
    async fn missing_recording_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = MeetingPaths::new(dir.path(), dir.path(), "absent");

        let err = compress_recording(&paths.audio, &paths.compressed_audio)
            .await
            .unwrap_err();
        assert!(matches!(err, RecapError::Io { .. }));
    }

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        assert_eq!(read_or_empty(&path).await.unwrap(), "");
        assert_eq!(read_optional(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_output_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outputFiles/nested/2025_07_02-summary.md");
        write_output(&path, "## Summary:\nok\n").await.unwrap();
        assert_eq!(read_or_empty(&path).await.unwrap(), "## Summary:\nok\n");
    }
}
