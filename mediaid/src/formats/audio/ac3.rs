//! AC-3 sync frame: syncinfo followed by the bit stream information block.

use anyhow::{Result, bail};
use serde::Serialize;

use crate::process::Session;
use crate::report::AudioStream;
use crate::utils::bitstream_io::HeaderReader;
use crate::utils::errors::FormatError;

pub const SYNC_WORD: u16 = 0x0B77;

/// Highest bsid this parser understands; larger values are E-AC-3.
const MAX_BSID: u8 = 10;

const BITRATES_KBPS: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Ac3Raw {
    pub synchinfo_crc1: u16,
    pub fscod: u8,
    pub frmsizecod: u8,
    pub bsid: u8,
    pub bsmod: u8,
    pub acmod: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmixlev: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surmixlev: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsurmod: Option<u8>,
    pub lfeon: bool,
    pub dialnorm: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Ac3Info {
    pub raw: Ac3Raw,
    pub sample_rate: u32,
    pub bitrate: u32,
    pub frame_length: u32,
    pub service_type: &'static str,
    pub channel_config: &'static str,
    pub dialogue_normalization: i32,
}

impl Ac3Info {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = HeaderReader::new(bytes);
        let sync: u16 = reader.get_n(16)?;
        if sync != SYNC_WORD {
            bail!(FormatError::BadMagic {
                expected: "\\x0B\\x77".into(),
                offset: 0,
                found: format!("{sync:04X}"),
            });
        }

        let mut raw = Ac3Raw {
            synchinfo_crc1: reader.get_n(16)?,
            fscod: reader.get_n(2)?,
            frmsizecod: reader.get_n(6)?,
            bsid: reader.get_n(5)?,
            bsmod: reader.get_n(3)?,
            acmod: reader.get_n(3)?,
            ..Default::default()
        };

        if raw.bsid > MAX_BSID {
            bail!(FormatError::Unsupported(format!(
                "Bit stream identification is version {}, but this parser only supports up to version {MAX_BSID}",
                raw.bsid
            )));
        }

        if raw.acmod & 0x01 != 0 && raw.acmod != 0x01 {
            raw.cmixlev = Some(reader.get_n(2)?);
        }
        if raw.acmod & 0x04 != 0 {
            raw.surmixlev = Some(reader.get_n(2)?);
        }
        if raw.acmod == 0x02 {
            raw.dsurmod = Some(reader.get_n(2)?);
        }
        raw.lfeon = reader.get()?;
        raw.dialnorm = reader.get_n(5)?;

        let sample_rate = match raw.fscod {
            0 => 48000,
            1 => 44100,
            2 => 32000,
            _ => bail!(FormatError::Unsupported(
                "AC-3 sample rate code 3 is reserved".into()
            )),
        };

        let Some(&kbps) = BITRATES_KBPS.get((raw.frmsizecod >> 1) as usize) else {
            bail!(FormatError::Unsupported(format!(
                "Invalid AC-3 frame size code {}",
                raw.frmsizecod
            )));
        };

        let words = match raw.fscod {
            0 => kbps * 2,
            1 => kbps * 320 / 147 + (raw.frmsizecod & 1) as u32,
            _ => kbps * 3,
        };

        Ok(Self {
            sample_rate,
            bitrate: kbps * 1000,
            frame_length: words * 2,
            service_type: service_type(raw.bsmod, raw.acmod),
            channel_config: channel_config(raw.acmod),
            dialogue_normalization: -(raw.dialnorm as i32),
            raw,
        })
    }

    pub fn channels(&self) -> u32 {
        let full = match self.raw.acmod {
            0 => 2,
            1 => 1,
            2 => 2,
            3 | 4 => 3,
            5 | 6 => 4,
            _ => 5,
        };
        full + self.raw.lfeon as u32
    }

    pub fn stream(&self) -> AudioStream {
        AudioStream {
            dataformat: Some("ac3".into()),
            sample_rate: Some(self.sample_rate as f64),
            channels: Some(self.channels()),
            bitrate: Some(self.bitrate as f64),
            bitrate_mode: Some("cbr".into()),
            lossless: Some(false),
            ..Default::default()
        }
    }
}

fn channel_config(acmod: u8) -> &'static str {
    match acmod {
        0 => "1+1",
        1 => "1/0",
        2 => "2/0",
        3 => "3/0",
        4 => "2/1",
        5 => "3/1",
        6 => "2/2",
        _ => "3/2",
    }
}

fn service_type(bsmod: u8, acmod: u8) -> &'static str {
    match bsmod {
        0 => "main audio service: complete main (CM)",
        1 => "main audio service: music and effects (ME)",
        2 => "associated service: visually impaired (VI)",
        3 => "associated service: hearing impaired (HI)",
        4 => "associated service: dialogue (D)",
        5 => "associated service: commentary (C)",
        6 => "associated service: emergency (E)",
        _ if acmod == 1 => "associated service: voice over (VO)",
        _ => "main audio service: karaoke",
    }
}

pub fn analyze(session: &mut Session) -> Result<()> {
    let offset = session.avdataoffset();
    let header = session.read_at(offset, 32)?;
    let info = Ac3Info::parse(&header)?;

    session.report.fileformat = Some("ac3".into());
    session.report.audio_mut().merge_from(&info.stream());

    let data_len = session.avdataend().saturating_sub(offset);
    if info.bitrate > 0 && data_len > 0 {
        session.report.playtime_seconds = Some(data_len as f64 * 8.0 / info.bitrate as f64);
    }
    session.report.bitrate = Some(info.bitrate as f64);
    session.report.ac3 = Some(info);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 48 kHz, 448 kbit/s, 3/2 with LFE.
    pub(crate) const FRAME_5_1: [u8; 8] = [0x0B, 0x77, 0x12, 0x34, 0x1C, 0x40, 0xE1, 0xF0];

    #[test]
    fn parses_5_1_header() -> Result<()> {
        let info = Ac3Info::parse(&FRAME_5_1)?;
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.bitrate, 448_000);
        assert_eq!(info.frame_length, 1792);
        assert_eq!(info.raw.bsid, 8);
        assert_eq!(info.raw.acmod, 7);
        assert!(info.raw.lfeon);
        assert_eq!(info.channels(), 6);
        assert_eq!(info.channel_config, "3/2");
        Ok(())
    }

    #[test]
    fn rejects_bad_sync_and_eac3() {
        assert!(Ac3Info::parse(&[0x0B, 0x78, 0, 0, 0, 0, 0, 0]).is_err());
        // bsid 16
        assert!(Ac3Info::parse(&[0x0B, 0x77, 0, 0, 0x1C, 0x80, 0, 0]).is_err());
    }
}
