//! DTS core frame header (big-endian 16-bit word layout only).

use anyhow::{Result, bail};
use serde::Serialize;

use crate::process::Session;
use crate::report::AudioStream;
use crate::utils::bitstream_io::HeaderReader;
use crate::utils::errors::FormatError;

pub const SYNC_WORD: u32 = 0x7FFE_8001;

const SAMPLE_RATES: [u32; 16] = [
    0, 8000, 16000, 32000, 0, 0, 11025, 22050, 44100, 0, 0, 12000, 24000, 48000, 0, 0,
];

const BITRATES_KBPS: [f64; 29] = [
    32.0, 56.0, 64.0, 96.0, 112.0, 128.0, 192.0, 224.0, 256.0, 320.0, 384.0, 448.0, 512.0, 576.0,
    640.0, 768.0, 960.0, 1024.0, 1152.0, 1280.0, 1344.0, 1408.0, 1411.2, 1472.0, 1536.0, 1920.0,
    2048.0, 3072.0, 3840.0,
];

const AMODE_CHANNELS: [u32; 16] = [1, 2, 2, 2, 2, 3, 3, 4, 4, 5, 6, 6, 6, 7, 8, 8];

const AMODE_ARRANGEMENT: [&str; 16] = [
    "A",
    "A + B (dual mono)",
    "L + R (stereo)",
    "(L+R) + (L-R) (sum-difference)",
    "LT + RT (left and right total)",
    "C + L + R",
    "L + R + S",
    "C + L + R + S",
    "L + R + SL + SR",
    "C + L + R + SL + SR",
    "CL + CR + L + R + SL + SR",
    "C + L + R+ LR + RR + OV",
    "CF + CR + LF + RF + LR + RR",
    "CL + C + CR + L + R + SL + SR",
    "CL + CR + L + R + SL1 + SL2 + SR1 + SR2",
    "CL + C+ CR + L + R + SL + S + SR",
];

const PCM_BITS: [u32; 8] = [16, 16, 20, 20, 0, 24, 24, 0];

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DtsRaw {
    pub frame_type: u8,
    pub deficit_samples: u8,
    pub crc_present: bool,
    pub pcm_sample_blocks: u8,
    pub frame_byte_size: u16,
    pub channel_arrangement: u8,
    pub sample_frequency: u8,
    pub bitrate: u8,
    pub flag_embedded_downmix: bool,
    pub flag_dynamicrange: bool,
    pub flag_timestamp: bool,
    pub flag_auxdata: bool,
    pub flag_hdcd: bool,
    pub extension_audio_descriptor: u8,
    pub extended_coding: bool,
    pub audio_sync_insertion: bool,
    pub lfe_effects: u8,
    pub predictor_history: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crc16: Option<u16>,
    pub mri_perfect_reconst: bool,
    pub encoder_soft_version: u8,
    pub copy_history: u8,
    pub bits_per_sample: u8,
    pub surround_es: bool,
    pub front_sum_diff: bool,
    pub surround_sum_diff: bool,
    pub dialog_normalization: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DtsInfo {
    pub raw: DtsRaw,
    pub bitrate: f64,
    pub bitrate_mode: &'static str,
    pub sample_rate: u32,
    pub bits_per_sample: u32,
    pub channels: u32,
    pub channel_arrangement: &'static str,
    pub frame_length: u32,
}

impl DtsInfo {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = HeaderReader::new(bytes);
        let sync: u32 = r.get_n(32)?;
        if sync != SYNC_WORD {
            bail!(FormatError::BadMagic {
                expected: "\\x7F\\xFE\\x80\\x01".into(),
                offset: 0,
                found: format!("{sync:08X}"),
            });
        }

        let mut raw = DtsRaw {
            frame_type: r.get_n(1)?,
            deficit_samples: r.get_n(5)?,
            crc_present: r.get()?,
            pcm_sample_blocks: r.get_n(7)?,
            frame_byte_size: r.get_n(14)?,
            channel_arrangement: r.get_n(6)?,
            sample_frequency: r.get_n(4)?,
            bitrate: r.get_n(5)?,
            flag_embedded_downmix: r.get()?,
            flag_dynamicrange: r.get()?,
            flag_timestamp: r.get()?,
            flag_auxdata: r.get()?,
            flag_hdcd: r.get()?,
            extension_audio_descriptor: r.get_n(3)?,
            extended_coding: r.get()?,
            audio_sync_insertion: r.get()?,
            lfe_effects: r.get_n(2)?,
            predictor_history: r.get()?,
            ..Default::default()
        };
        if raw.crc_present {
            raw.crc16 = Some(r.get_n(16)?);
        }
        raw.mri_perfect_reconst = r.get()?;
        raw.encoder_soft_version = r.get_n(4)?;
        raw.copy_history = r.get_n(2)?;
        raw.bits_per_sample = r.get_n(3)?;
        raw.surround_es = raw.bits_per_sample & 1 != 0;
        raw.front_sum_diff = r.get()?;
        raw.surround_sum_diff = r.get()?;
        raw.dialog_normalization = r.get_n(4)?;

        let (bitrate, bitrate_mode) = match raw.bitrate {
            i @ 0..=28 => (BITRATES_KBPS[i as usize] * 1000.0, "cbr"),
            30 => (0.0, "vbr"),
            31 => (0.0, "lossless"),
            _ => (0.0, "open"),
        };

        let arrangement = raw.channel_arrangement as usize;
        Ok(Self {
            bitrate,
            bitrate_mode,
            sample_rate: SAMPLE_RATES[raw.sample_frequency as usize],
            bits_per_sample: PCM_BITS[raw.bits_per_sample as usize],
            channels: AMODE_CHANNELS.get(arrangement).copied().unwrap_or(0)
                + (raw.lfe_effects != 0) as u32,
            channel_arrangement: AMODE_ARRANGEMENT
                .get(arrangement)
                .copied()
                .unwrap_or("user-defined"),
            frame_length: raw.frame_byte_size as u32 + 1,
            raw,
        })
    }

    pub fn stream(&self) -> AudioStream {
        AudioStream {
            dataformat: Some("dts".into()),
            sample_rate: Some(self.sample_rate as f64),
            channels: Some(self.channels),
            bits_per_sample: (self.bits_per_sample > 0).then_some(self.bits_per_sample),
            bitrate: (self.bitrate > 0.0).then_some(self.bitrate),
            bitrate_mode: Some(self.bitrate_mode.into()),
            lossless: Some(self.bitrate_mode == "lossless"),
            ..Default::default()
        }
    }
}

pub fn analyze(session: &mut Session) -> Result<()> {
    let offset = session.avdataoffset();
    let header = session.read_at(offset, 16)?;
    let info = DtsInfo::parse(&header)?;

    session.report.fileformat = Some("dts".into());
    session.report.audio_mut().merge_from(&info.stream());
    if info.bitrate > 0.0 {
        session.report.bitrate = Some(info.bitrate);
        let data_len = session.avdataend().saturating_sub(offset);
        session.report.playtime_seconds = Some(data_len as f64 * 8.0 / info.bitrate);
    }
    session.report.dts = Some(info);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Core frame: 48 kHz, 1536 kbit/s, C+L+R+SL+SR with LFE, 24 bit.
    pub(crate) const FRAME_5_1: [u8; 13] = [
        0x7F, 0xFE, 0x80, 0x01, 0xFC, 0x3F, 0xFF, 0xF2, 0x77, 0x00, 0x02, 0x01, 0x40,
    ];

    #[test]
    fn parses_core_header() -> Result<()> {
        let info = DtsInfo::parse(&FRAME_5_1)?;
        assert_eq!(info.raw.frame_type, 1);
        assert_eq!(info.raw.deficit_samples, 31);
        assert!(!info.raw.crc_present);
        assert_eq!(info.raw.pcm_sample_blocks, 15);
        assert_eq!(info.frame_length, 16384);
        assert_eq!(info.raw.channel_arrangement, 9);
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.bitrate, 1_536_000.0);
        assert_eq!(info.channels, 6);
        assert_eq!(info.bits_per_sample, 24);
        Ok(())
    }

    #[test]
    fn rejects_bad_sync() {
        assert!(DtsInfo::parse(&[0x7F, 0xFE, 0x80, 0x02, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
    }
}
