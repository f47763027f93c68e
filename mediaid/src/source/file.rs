use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::{ByteRange, ByteSource, SeekPos, check_range, resolve_seek};
use crate::utils::errors::SourceError;

/// Source over a window of a file on disk.
///
/// Every sub-source opens its own handle, so nested parsers never disturb
/// each other's cursor.
#[derive(Debug)]
pub struct FileSource {
    reader: BufReader<File>,
    path: PathBuf,
    base: u64,
    len: u64,
    pos: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        if len > i64::MAX as u64 {
            return Err(SourceError::TooLarge(len));
        }

        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            base: 0,
            len,
            pos: 0,
        })
    }

    fn open_window(path: &Path, base: u64, len: u64) -> Result<Self, SourceError> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(base))?;

        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            base,
            len,
            pos: 0,
        })
    }
}

impl ByteSource for FileSource {
    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        let remaining = self.len.saturating_sub(self.pos);
        let n = (buf.len() as u64).min(remaining) as usize;
        if n == 0 {
            return Ok(0);
        }

        let read = self.reader.read(&mut buf[..n])?;
        self.pos += read as u64;

        Ok(read)
    }

    fn seek(&mut self, pos: SeekPos) -> Result<u64, SourceError> {
        let target = resolve_seek(pos, self.pos, self.len)?;
        let delta = target as i128 - self.pos as i128;

        if let Ok(delta) = i64::try_from(delta) {
            self.reader.seek_relative(delta)?;
        } else {
            self.reader.seek(SeekFrom::Start(self.base + target))?;
        }
        self.pos = target;

        Ok(target)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn sub_source(&self, range: ByteRange) -> Result<Box<dyn ByteSource>, SourceError> {
        check_range(range, self.len)?;
        Ok(Box::new(Self::open_window(
            &self.path,
            self.base + range.start,
            range.len(),
        )?))
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn file_window_reads() -> Result<(), SourceError> {
        let mut tmp = tempfile::NamedTempFile::new()?;
        tmp.write_all(b"header\nbody line\r\ntail")?;
        tmp.flush()?;

        let mut src = FileSource::open(tmp.path())?;
        assert_eq!(src.len(), 22);
        assert_eq!(src.read_line()?, b"header\n");

        let mut sub = src.sub_source(ByteRange::new(7, 18))?;
        assert_eq!(sub.read_line()?, b"body line\r\n");
        assert!(sub.at_end());
        assert_eq!(sub.path(), Some(tmp.path()));

        assert_eq!(src.read(4)?, b"body");
        src.seek(SeekPos::End(-4))?;
        assert_eq!(src.read(10)?, b"tail");
        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSource::open(dir.path().join("absent.mkv")).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
