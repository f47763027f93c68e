//! Extraction of embedded files according to [`AttachmentMode`].

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::process::{AttachmentMode, Options};
use crate::report::AttachmentData;
use crate::source::{ByteSource, SeekPos};
use crate::utils::errors::FormatError;

/// File extension for an image MIME type, `image/jpeg` giving `jpg`.
pub fn image_extension(mime: &str) -> Option<&str> {
    let sub = mime.strip_prefix("image/")?;
    Some(match sub {
        "jpeg" | "pjpeg" => "jpg",
        "svg+xml" => "svg",
        "x-icon" | "vnd.microsoft.icon" => "ico",
        other => other,
    })
}

/// Reads or copies `length` bytes at `offset`.
///
/// Returns `None` when the mode stores nothing. In directory mode the file is
/// written as `dir/name`, with an image extension appended when `image_mime`
/// is given, and any partial file is removed on failure.
pub fn save_attachment(
    source: &mut dyn ByteSource,
    options: &Options,
    name: &str,
    offset: u64,
    length: u64,
    image_mime: Option<&str>,
) -> Result<Option<AttachmentData>> {
    match &options.attachments {
        AttachmentMode::None => Ok(None),
        AttachmentMode::Inline => {
            let want = usize::try_from(length).map_err(|_| FormatError::AttachmentRead)?;
            source.seek(SeekPos::Start(offset))?;
            let data = source.read(want)?;
            if data.len() != want {
                bail!(FormatError::AttachmentRead);
            }
            Ok(Some(AttachmentData::Inline(data)))
        }
        AttachmentMode::Directory(dir) => {
            let dest = destination(dir, name, image_mime)?;
            let chunk = options.read_buffer_size.max(1);
            if let Err(err) = copy_range(source, &dest, offset, length, chunk) {
                if dest.exists() {
                    let _ = fs::remove_file(&dest);
                }
                return Err(err);
            }
            Ok(Some(AttachmentData::Saved(dest)))
        }
    }
}

fn destination(dir: &Path, name: &str, image_mime: Option<&str>) -> Result<PathBuf> {
    let writable = fs::metadata(dir).is_ok_and(|m| m.is_dir() && !m.permissions().readonly());
    if !writable {
        bail!(FormatError::AttachmentDir(dir.display().to_string()));
    }

    // Only the final component of the stored name is used.
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    let file_name = match image_mime.and_then(image_extension) {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    };
    Ok(dir.join(file_name))
}

fn copy_range(
    source: &mut dyn ByteSource,
    dest: &Path,
    offset: u64,
    length: u64,
    chunk: usize,
) -> Result<()> {
    let file = File::create(dest)
        .map_err(|e| anyhow::anyhow!("failed to create file {}: {e}", dest.display()))?;
    let mut writer = BufWriter::new(file);

    source.seek(SeekPos::Start(offset))?;
    let mut left = length;
    while left > 0 {
        let buffer = source.read(chunk.min(left as usize))?;
        if buffer.is_empty() {
            bail!("not enough data to read");
        }
        writer.write_all(&buffer)?;
        left -= buffer.len() as u64;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn payload() -> MemorySource {
        MemorySource::new((0u8..=255).collect::<Vec<_>>())
    }

    #[test]
    fn inline_and_none_modes() -> Result<()> {
        let mut src = payload();
        let inline = Options::default();
        let data = save_attachment(&mut src, &inline, "a.bin", 10, 5, None)?;
        assert_eq!(data, Some(AttachmentData::Inline(vec![10, 11, 12, 13, 14])));

        assert!(save_attachment(&mut src, &inline, "a.bin", 250, 10, None).is_err());

        let none = Options {
            attachments: AttachmentMode::None,
            ..Default::default()
        };
        assert_eq!(save_attachment(&mut src, &none, "a.bin", 0, 5, None)?, None);
        Ok(())
    }

    #[test]
    fn directory_mode_writes_sanitized_name() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = Options {
            attachments: AttachmentMode::Directory(dir.path().to_path_buf()),
            read_buffer_size: 7,
            ..Default::default()
        };
        let mut src = payload();
        let saved = save_attachment(&mut src, &options, "../../cover", 100, 40, Some("image/jpeg"))?;
        let expected = dir.path().join("cover.jpg");
        assert_eq!(saved, Some(AttachmentData::Saved(expected.clone())));
        assert_eq!(fs::read(expected)?, (100u8..140).collect::<Vec<_>>());

        let err = save_attachment(&mut src, &options, "short", 250, 40, None);
        assert!(err.is_err());
        assert!(!dir.path().join("short").exists());
        Ok(())
    }

    #[test]
    fn missing_directory_is_reported() {
        let options = Options {
            attachments: AttachmentMode::Directory(PathBuf::from("/nonexistent/mediaid")),
            ..Default::default()
        };
        let mut src = payload();
        let err = save_attachment(&mut src, &options, "x", 0, 1, None).unwrap_err();
        assert!(err.to_string().contains("does not exist, or is not writable"));
    }

    #[test]
    fn image_extensions() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("image/png"), Some("png"));
        assert_eq!(image_extension("application/x-truetype-font"), None);
    }
}
