//! DSD Stream File: `DSD `, `fmt ` and `data` chunks, all little-endian.

use anyhow::{Result, bail};
use mediaid_macros::{FromBytes, chunk_magic};
use serde::Serialize;

use crate::process::Session;
use crate::report::AudioStream;
use crate::utils::byteorder::Chunk;
use crate::utils::errors::{ByteOrderError, FormatError};

#[chunk_magic(b"DSD ")]
#[derive(FromBytes, Clone, Debug, Default, PartialEq, Serialize)]
pub struct DsdChunk {
    pub dsd_chunk_size: u64,
    pub dsf_file_size: u64,
    pub meta_chunk_offset: u64,
}

#[chunk_magic(b"fmt ")]
#[derive(FromBytes, Clone, Debug, Default, PartialEq, Serialize)]
pub struct FmtChunk {
    pub fmt_chunk_size: u64,
    pub format_version: u32,
    pub format_id: u32,
    pub channel_type_id: u32,
    pub channels: u32,
    pub sample_rate: u32,
    pub bits_per_sample: u32,
    pub sample_count: u64,
    pub channel_block_size: u32,
    pub reserved: u32,
}

#[chunk_magic(b"data")]
#[derive(FromBytes, Clone, Debug, Default, PartialEq, Serialize)]
pub struct DataChunk {
    pub data_chunk_size: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DsfInfo {
    pub dsd: DsdChunk,
    pub fmt: FmtChunk,
    pub channel_type: &'static str,
    pub data: DataChunk,
}

pub fn channel_type(id: u32) -> &'static str {
    match id {
        1 => "mono",
        2 => "stereo",
        3 => "3-channel",
        4 => "quad",
        5 => "4-channel",
        6 => "5-channel",
        7 => "5.1",
        _ => "",
    }
}

const DSD_CHUNK_LEN: u64 = 28;
const CHUNK_HEADER_LEN: u64 = 12;

fn magic_error(expected: &str, offset: u64, err: ByteOrderError) -> anyhow::Error {
    match err {
        ByteOrderError::BadMagic { found, .. } => FormatError::BadMagic {
            expected: expected.into(),
            offset,
            found: String::from_utf8_lossy(&found).into_owned(),
        }
        .into(),
        other => other.into(),
    }
}

pub fn analyze(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let head = session.read_at(start, (DSD_CHUNK_LEN + CHUNK_HEADER_LEN) as usize)?;
    let mut src = &head[..];
    let dsd = DsdChunk::read_chunk(&mut src).map_err(|e| magic_error("DSD ", start, e))?;

    session.report.fileformat = Some("dsf".into());
    session.report.audio_mut().merge_from(&AudioStream {
        dataformat: Some("dsf".into()),
        lossless: Some(true),
        bitrate_mode: Some("cbr".into()),
        ..Default::default()
    });

    let fmt_offset = start + DSD_CHUNK_LEN;
    let fmt_size = match src.get(4..12) {
        Some(size) => u64::from_le_bytes(size.try_into()?),
        None => 0,
    };
    if src.get(..4) != Some(b"fmt ".as_slice()) {
        bail!(FormatError::BadMagic {
            expected: "fmt ".into(),
            offset: fmt_offset,
            found: String::from_utf8_lossy(src.get(..4).unwrap_or_default()).into_owned(),
        });
    }

    // the fmt chunk plus the next chunk header
    let expected = dsd
        .dsd_chunk_size
        .checked_add(fmt_size)
        .and_then(|len| len.checked_add(CHUNK_HEADER_LEN));
    let header_len = fmt_size
        .checked_add(CHUNK_HEADER_LEN)
        .and_then(|len| usize::try_from(len).ok());
    let (Some(expected), Some(header_len)) = (expected, header_len) else {
        bail!(FormatError::Unsupported(format!(
            "Chunk sizes overflow: DSD {}, fmt {fmt_size}",
            dsd.dsd_chunk_size
        )));
    };
    let rest = session.read_at(fmt_offset, header_len)?;
    let found = DSD_CHUNK_LEN + rest.len() as u64;
    if found != expected {
        bail!(FormatError::Unsupported(format!(
            "Expecting {} bytes header, found {found} bytes",
            expected - CHUNK_HEADER_LEN
        )));
    }

    let mut src = &rest[..];
    let fmt = FmtChunk::read_chunk(&mut src).map_err(|e| magic_error("fmt ", fmt_offset, e))?;
    let data_offset = fmt_offset + fmt_size;
    let Some(mut src) = usize::try_from(fmt_size).ok().and_then(|at| rest.get(at..)) else {
        bail!(FormatError::Truncated {
            expected: fmt_size.saturating_add(CHUNK_HEADER_LEN),
            found: rest.len() as u64,
        });
    };
    let data = DataChunk::read_chunk(&mut src).map_err(|e| magic_error("data", data_offset, e))?;

    session.report.avdataoffset = Some(data_offset + CHUNK_HEADER_LEN);
    session.report.avdataend =
        Some((data_offset + CHUNK_HEADER_LEN).saturating_add(data.data_chunk_size));

    let channel_type = channel_type(fmt.channel_type_id);
    let bitrate = fmt.bits_per_sample as f64 * fmt.sample_rate as f64 * fmt.channels as f64;
    let audio = session.report.audio_mut();
    audio.channelmode = Some(channel_type.into());
    audio.bits_per_sample = Some(fmt.bits_per_sample);
    audio.sample_rate = Some(fmt.sample_rate as f64);
    audio.channels = Some(fmt.channels);
    audio.bitrate = Some(bitrate);
    if bitrate > 0.0 {
        session.report.playtime_seconds = Some(data.data_chunk_size as f64 * 8.0 / bitrate);
    }

    session.report.dsf = Some(DsfInfo {
        dsd,
        fmt,
        channel_type,
        data,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Options;
    use crate::source::MemorySource;

    fn dsf_file(data_len: u64) -> Vec<u8> {
        let mut file = b"DSD ".to_vec();
        file.extend_from_slice(&28u64.to_le_bytes());
        file.extend_from_slice(&(92 + data_len).to_le_bytes());
        file.extend_from_slice(&0u64.to_le_bytes());
        file.extend_from_slice(b"fmt ");
        file.extend_from_slice(&52u64.to_le_bytes());
        for v in [1u32, 0, 2, 2, 2_822_400, 1] {
            file.extend_from_slice(&v.to_le_bytes());
        }
        file.extend_from_slice(&(data_len * 4).to_le_bytes());
        file.extend_from_slice(&4096u32.to_le_bytes());
        file.extend_from_slice(&0u32.to_le_bytes());
        file.extend_from_slice(b"data");
        file.extend_from_slice(&(data_len + 12).to_le_bytes());
        file.resize(file.len() + data_len as usize, 0x69);
        file
    }

    #[test]
    fn parses_stereo_dsd64() -> Result<()> {
        let options = Options::default();
        let mut session = Session::new(Box::new(MemorySource::new(dsf_file(705_600))), &options);
        analyze(&mut session)?;
        let report = &session.report;
        let dsf = report.dsf.as_ref().unwrap();
        assert_eq!(dsf.fmt.channels, 2);
        assert_eq!(dsf.channel_type, "stereo");
        assert_eq!(report.avdataoffset, Some(92));
        let audio = report.audio.as_ref().unwrap();
        assert_eq!(audio.bitrate, Some(5_644_800.0));
        assert_eq!(audio.lossless, Some(true));
        assert_eq!(report.playtime_seconds, Some((705_612.0 * 8.0) / 5_644_800.0));
        Ok(())
    }

    #[test]
    fn short_header_and_bad_magic() {
        let options = Options::default();
        let mut file = dsf_file(0);
        file.truncate(60);
        let mut session = Session::new(Box::new(MemorySource::new(file)), &options);
        let err = analyze(&mut session).unwrap_err();
        assert!(err.to_string().contains("Expecting 80 bytes header, found 60 bytes"));

        let mut file = dsf_file(0);
        file[0] = b'X';
        let mut session = Session::new(Box::new(MemorySource::new(file)), &options);
        assert!(analyze(&mut session).is_err());
        assert!(session.report.fileformat.is_none());
    }

    #[test]
    fn inconsistent_chunk_sizes_are_errors() {
        let options = Options::default();

        // DSD size 0 makes a short read look complete
        let mut file = dsf_file(20);
        file[4..12].copy_from_slice(&0u64.to_le_bytes());
        file[32..40].copy_from_slice(&100u64.to_le_bytes());
        let mut session = Session::new(Box::new(MemorySource::new(file.clone())), &options);
        let err = analyze(&mut session).unwrap_err();
        assert!(err.to_string().contains("expecting 112 bytes, found 84"), "{err}");
        let report = crate::Analyzer::default().analyze_bytes(file);
        assert!(report.error.iter().any(|e| e.contains("truncated")), "{:?}", report.error);

        let mut file = dsf_file(16);
        file[32..40].copy_from_slice(&(u64::MAX - 4).to_le_bytes());
        let mut session = Session::new(Box::new(MemorySource::new(file.clone())), &options);
        let err = analyze(&mut session).unwrap_err();
        assert!(err.to_string().contains("overflow"), "{err}");
        let report = crate::Analyzer::default().analyze_bytes(file);
        assert!(report.error.iter().any(|e| e.contains("truncated")), "{:?}", report.error);

        let mut file = dsf_file(0);
        let at = file.len() - 8;
        file[at..].copy_from_slice(&u64::MAX.to_le_bytes());
        let mut session = Session::new(Box::new(MemorySource::new(file)), &options);
        analyze(&mut session).unwrap();
        assert_eq!(session.report.avdataend, Some(u64::MAX));
    }
}
