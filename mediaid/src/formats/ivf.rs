//! IVF: a 32-byte `DKIF` header followed by frames, each with a 12-byte
//! header (u32 size, u64 timestamp).

use anyhow::{Result, bail};
use mediaid_macros::{FromBytes, chunk_magic};
use serde::{Serialize, Serializer};

use crate::process::Session;
use crate::utils::byteorder::Chunk;
use crate::utils::errors::FormatError;

#[chunk_magic(b"DKIF")]
#[derive(FromBytes, Clone, Debug, Default, PartialEq, Serialize)]
pub struct IvfHeader {
    pub version: u16,
    pub headersize: u16,
    #[serde(serialize_with = "serialize_fourcc")]
    pub fourcc: [u8; 4],
    pub resolution_x: u16,
    pub resolution_y: u16,
    pub timebase_numerator: u32,
    pub timebase_denominator: u32,
    pub frame_count: u32,
    #[serde(skip)]
    pub reserved: u32,
}

fn serialize_fourcc<S: Serializer>(value: &[u8; 4], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(value))
}

impl IvfHeader {
    pub const LENGTH: usize = 32;

    pub fn frame_rate(&self) -> Option<f64> {
        (self.timebase_denominator > 0)
            .then(|| self.timebase_numerator as f64 / self.timebase_denominator as f64)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IvfInfo {
    pub header: IvfHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_frame_rate: Option<f64>,
    /// Frames actually present, as opposed to the header's claim.
    pub frame_count: u64,
}

const FRAME_HEADER_LEN: u64 = 12;

pub fn analyze(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let end = session.avdataend();
    let raw = session.read_at(start, IvfHeader::LENGTH)?;
    let header = match IvfHeader::read_chunk(&mut &raw[..]) {
        Ok(header) => header,
        Err(_) => bail!(FormatError::BadMagic {
            expected: "DKIF".into(),
            offset: start,
            found: raw.iter().take(4).map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(" "),
        }),
    };

    session.report.fileformat = Some("ivf".into());
    let video = session.report.video_mut();
    video.dataformat = Some("ivf".into());
    video.resolution_x = Some(header.resolution_x as u64);
    video.resolution_y = Some(header.resolution_y as u64);
    video.codec = Some(String::from_utf8_lossy(&header.fourcc).into_owned());

    if header.version > 0 {
        session.warn(format!(
            "Expecting IVF header version 0, found version {}, results may not be accurate",
            header.version
        ));
    }

    let mut pos = start + IvfHeader::LENGTH as u64;
    let mut frame_count = 0u64;
    let mut last_timestamp = 0u64;
    while pos + FRAME_HEADER_LEN <= end {
        let frame = session.read_at(pos, FRAME_HEADER_LEN as usize)?;
        let Ok(frame) = <[u8; 12]>::try_from(frame.as_slice()) else {
            break;
        };
        let size = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) as u64;
        last_timestamp = u64::from_le_bytes([
            frame[4], frame[5], frame[6], frame[7], frame[8], frame[9], frame[10], frame[11],
        ]);
        frame_count += 1;
        pos += FRAME_HEADER_LEN + size;
    }
    log::debug!("IVF: {frame_count} frames, last timestamp {last_timestamp}");

    if frame_count > 0 && last_timestamp > 0 {
        let playtime = last_timestamp as f64 / 100000.0;
        session.report.playtime_seconds = Some(playtime);
        session.report.video_mut().frame_rate = Some(frame_count as f64 / playtime);
    }

    session.report.ivf = Some(IvfInfo {
        header_frame_rate: header.frame_rate(),
        header,
        frame_count,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Options;
    use crate::source::MemorySource;

    fn ivf_file(version: u16, timestamps: &[u64]) -> Vec<u8> {
        let mut file = b"DKIF".to_vec();
        file.extend_from_slice(&version.to_le_bytes());
        file.extend_from_slice(&32u16.to_le_bytes());
        file.extend_from_slice(b"VP80");
        file.extend_from_slice(&320u16.to_le_bytes());
        file.extend_from_slice(&240u16.to_le_bytes());
        file.extend_from_slice(&30u32.to_le_bytes());
        file.extend_from_slice(&1u32.to_le_bytes());
        file.extend_from_slice(&(timestamps.len() as u32).to_le_bytes());
        file.extend_from_slice(&[0; 4]);
        for &ts in timestamps {
            file.extend_from_slice(&5u32.to_le_bytes());
            file.extend_from_slice(&ts.to_le_bytes());
            file.extend_from_slice(&[0xAA; 5]);
        }
        file
    }

    #[test]
    fn counts_frames_and_derives_rate() -> Result<()> {
        let options = Options::default();
        let file = ivf_file(0, &[0, 100_000, 200_000, 300_000]);
        let mut session = Session::new(Box::new(MemorySource::new(file)), &options);
        analyze(&mut session)?;
        let report = &session.report;
        let ivf = report.ivf.as_ref().unwrap();
        assert_eq!(ivf.frame_count, 4);
        assert_eq!(ivf.header_frame_rate, Some(30.0));
        assert_eq!(report.playtime_seconds, Some(3.0));
        let video = report.video.as_ref().unwrap();
        assert_eq!(video.codec.as_deref(), Some("VP80"));
        assert_eq!(video.frame_rate, Some(4.0 / 3.0));
        assert!(report.warning.is_empty());
        Ok(())
    }

    #[test]
    fn version_warning_and_bad_magic() {
        let options = Options::default();
        let mut session =
            Session::new(Box::new(MemorySource::new(ivf_file(1, &[0, 50]))), &options);
        analyze(&mut session).unwrap();
        assert_eq!(session.report.warning.len(), 1);

        let mut file = ivf_file(0, &[]);
        file[0] = b'X';
        let mut session = Session::new(Box::new(MemorySource::new(file)), &options);
        let err = analyze(&mut session).unwrap_err();
        assert!(err.to_string().contains("Expecting \"DKIF\" at offset 0"));
    }
}
