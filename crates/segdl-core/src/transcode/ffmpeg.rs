use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::TranscodeError;

use super::{TranscodeOutcome, Transcoder};

const STDERR_TAIL: usize = 2000;

/// Video/audio codecs passed to the encoder.
const VIDEO_CODEC: &str = "libx264";
const AUDIO_CODEC: &str = "aac";

#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder {
    program: Option<PathBuf>,
}

impl FfmpegTranscoder {
    /// Use `configured` if it names an existing file or a program on PATH,
    /// otherwise look up `ffmpeg`. With neither, every call copies.
    pub fn discover(configured: Option<&Path>) -> Self {
        let program = configured
            .and_then(|p| {
                if p.is_file() {
                    Some(p.to_path_buf())
                } else {
                    which::which(p).ok()
                }
            })
            .or_else(|| which::which("ffmpeg").ok());
        match &program {
            Some(p) => tracing::debug!("encoder: {}", p.display()),
            None => tracing::warn!("no encoder found; episodes will be copied without re-encoding"),
        }
        Self { program }
    }

    pub fn with_program(program: PathBuf) -> Self {
        Self {
            program: Some(program),
        }
    }

    pub fn copy_only() -> Self {
        Self { program: None }
    }

    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }

    fn copy(input: &Path, output: &Path) -> Result<TranscodeOutcome, TranscodeError> {
        if let Err(source) = std::fs::copy(input, output) {
            let _ = std::fs::remove_file(output);
            return Err(TranscodeError::Copy {
                from: input.to_path_buf(),
                to: output.to_path_buf(),
                source,
            });
        }
        Ok(TranscodeOutcome::Copied)
    }
}

fn tail(s: &str) -> String {
    let s = s.trim();
    if s.len() <= STDERR_TAIL {
        return s.to_string();
    }
    let mut start = s.len() - STDERR_TAIL;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
        format: &str,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let Some(program) = &self.program else {
            tracing::warn!(output = %output.display(), "copying without re-encoding");
            return Self::copy(input, output);
        };

        tracing::info!(format, input = %input.display(), output = %output.display(), "encoding");
        let out = Command::new(program)
            .arg("-i")
            .arg(input)
            .args(["-c:v", VIDEO_CODEC, "-c:a", AUDIO_CODEC, "-strict", "experimental", "-y"])
            .arg(output)
            .output()
            .map_err(|source| TranscodeError::Spawn {
                program: program.clone(),
                source,
            })?;

        if out.status.success() {
            return Ok(TranscodeOutcome::Encoded);
        }
        let _ = std::fs::remove_file(output);
        Err(TranscodeError::Failed {
            code: out.status.code(),
            stderr: tail(&String::from_utf8_lossy(&out.stderr)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_only_preserves_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("episode_01.temp.mp4");
        let output = dir.path().join("episode_01.mp4");
        std::fs::write(&input, b"concatenated-ts").unwrap();

        let t = FfmpegTranscoder::copy_only();
        assert_eq!(t.transcode(&input, &output, "mp4").unwrap(), TranscodeOutcome::Copied);
        assert_eq!(std::fs::read(&output).unwrap(), b"concatenated-ts");
        assert!(input.exists());
    }

    #[test]
    fn failed_copy_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("episode_02.part.mp4");
        std::fs::write(&output, b"stale").unwrap();

        let t = FfmpegTranscoder::copy_only();
        let err = t
            .transcode(&dir.path().join("gone.temp.mp4"), &output, "mp4")
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Copy { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"x").unwrap();
        let t = FfmpegTranscoder::with_program(dir.path().join("no-such-encoder"));
        let err = t.transcode(&input, &dir.path().join("out.mp4"), "mp4").unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn { .. }));
    }

    #[test]
    fn stderr_tail_is_bounded() {
        let long = "x".repeat(STDERR_TAIL * 2);
        assert_eq!(tail(&long).len(), STDERR_TAIL);
        assert_eq!(tail("  short \n"), "short");
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn encoder_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.mp4");
        std::fs::write(&input, b"payload").unwrap();

        let ok = script(dir.path(), "enc-ok", "in=\"$2\"\nfor a in \"$@\"; do out=\"$a\"; done\ncp \"$in\" \"$out\"");
        let t = FfmpegTranscoder::with_program(ok);
        assert_eq!(t.transcode(&input, &output, "mp4").unwrap(), TranscodeOutcome::Encoded);
        assert_eq!(std::fs::read(&output).unwrap(), b"payload");

        std::fs::remove_file(&output).unwrap();
        let bad = script(dir.path(), "enc-fail", "echo 'Invalid data found' >&2\nexit 3");
        let t = FfmpegTranscoder::with_program(bad);
        match t.transcode(&input, &output, "mp4").unwrap_err() {
            TranscodeError::Failed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "Invalid data found");
            }
            other => panic!("unexpected: {other}"),
        }
        assert!(input.exists());
    }
}
