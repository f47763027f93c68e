//! Vorbis identification header, as found in Matroska CodecPrivate.

use anyhow::{Result, bail};
use mediaid_macros::FromBytes;
use serde::Serialize;

use crate::process::Session;
use crate::report::AudioStream;
use crate::utils::byteorder::ReadBytesLe;
use crate::utils::errors::FormatError;

pub const IDENTIFICATION: u8 = 1;
pub const MAGIC: &[u8; 6] = b"vorbis";

#[derive(FromBytes, Clone, Debug, Default, PartialEq, Serialize)]
pub struct IdentificationHeader {
    pub packet_type: u8,
    #[serde(skip)]
    pub magic: [u8; 6],
    pub version: u32,
    pub channels: u8,
    pub sample_rate: u32,
    pub bitrate_max: i32,
    pub bitrate_nominal: i32,
    pub bitrate_min: i32,
    pub blocksize: u8,
    pub framing: u8,
}

impl IdentificationHeader {
    pub const LENGTH: usize = 30;

    pub fn blocksize_small(&self) -> u32 {
        1 << (self.blocksize & 0x0F)
    }

    pub fn blocksize_large(&self) -> u32 {
        1 << (self.blocksize >> 4)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VorbisInfo {
    pub identification: IdentificationHeader,
    pub blocksize_small: u32,
    pub blocksize_large: u32,
}

impl VorbisInfo {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let header = IdentificationHeader::read_le(&mut &bytes[..])?;
        if header.packet_type != IDENTIFICATION || &header.magic != MAGIC {
            bail!(FormatError::BadMagic {
                expected: "\\x01vorbis".into(),
                offset: 0,
                found: String::from_utf8_lossy(&bytes[..bytes.len().min(7)]).into_owned(),
            });
        }
        if header.sample_rate == 0 {
            bail!(FormatError::Unsupported(
                "Corrupt Vorbis file: sample_rate == zero".into()
            ));
        }
        Ok(Self {
            blocksize_small: header.blocksize_small(),
            blocksize_large: header.blocksize_large(),
            identification: header,
        })
    }

    pub fn stream(&self) -> AudioStream {
        let id = &self.identification;
        let positive = |v: i32| (v > 0).then_some(v as f64);
        AudioStream {
            dataformat: Some("vorbis".into()),
            sample_rate: Some(id.sample_rate as f64),
            channels: Some(id.channels as u32),
            bitrate: positive(id.bitrate_nominal),
            bitrate_mode: Some(
                if id.bitrate_max == id.bitrate_min && id.bitrate_max > 0 {
                    "cbr"
                } else {
                    "vbr"
                }
                .into(),
            ),
            lossless: Some(false),
            ..Default::default()
        }
    }
}

pub fn analyze(session: &mut Session) -> Result<()> {
    let offset = session.avdataoffset();
    let header = session.read_at(offset, IdentificationHeader::LENGTH)?;
    let info = VorbisInfo::parse(&header)?;

    session.report.fileformat = Some("ogg".into());
    let stream = info.stream();
    if let Some(bitrate) = stream.bitrate {
        session.report.bitrate = Some(bitrate);
    }
    session.report.audio_mut().merge_from(&stream);
    session.report.ogg = Some(info);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn identification(channels: u8, sample_rate: u32, nominal: i32) -> Vec<u8> {
        let mut out = vec![IDENTIFICATION];
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&0u32.to_le_bytes());
        out.push(channels);
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&nominal.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.push(0xB8);
        out.push(1);
        out
    }

    #[test]
    fn parses_identification_header() -> Result<()> {
        let info = VorbisInfo::parse(&identification(2, 44100, 128_000))?;
        assert_eq!(info.identification.channels, 2);
        assert_eq!(info.identification.sample_rate, 44100);
        assert_eq!(info.blocksize_small, 256);
        assert_eq!(info.blocksize_large, 2048);
        let stream = info.stream();
        assert_eq!(stream.bitrate, Some(128_000.0));
        assert_eq!(stream.bitrate_mode.as_deref(), Some("vbr"));
        Ok(())
    }

    #[test]
    fn rejects_other_packets() {
        let mut data = identification(2, 44100, 0);
        data[0] = 3;
        assert!(VorbisInfo::parse(&data).is_err());
        assert!(VorbisInfo::parse(&identification(2, 0, 0)).is_err());
        assert!(VorbisInfo::parse(&[1, b'v']).is_err());
    }
}
