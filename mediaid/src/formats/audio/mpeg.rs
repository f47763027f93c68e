//! MPEG-1/2/2.5 audio frame headers (layers I to III).
//!
//! ```text
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//! A sync  B version  C layer  D protection absent
//! E bitrate  F sample rate  G padding  H private
//! I channel mode  J mode extension  K copyright  L original  M emphasis
//! ```

use anyhow::{Result, bail};
use serde::Serialize;

use crate::process::Session;
use crate::report::AudioStream;
use crate::utils::errors::FormatError;

/// How far past the data offset a frame sync is searched for.
const SCAN_LIMIT: usize = 65536;

const BITRATES_KBPS: [[u32; 15]; 5] = [
    // MPEG-1 layer I, II, III
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
    // MPEG-2/2.5 layer I, then II and III
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MpegVersion {
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "2")]
    V2,
    #[serde(rename = "2.5")]
    V2_5,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: u8,
    pub protection: bool,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub padding: bool,
    pub private: bool,
    pub channelmode: &'static str,
    pub modeextension: u8,
    pub copyright: bool,
    pub original: bool,
    pub emphasis: &'static str,
    pub framelength: u32,
}

impl FrameHeader {
    /// Decodes four header bytes. Returns `None` for anything that is not a
    /// usable frame header, free-format bitrates included.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let h = u32::from_be_bytes(bytes.get(..4)?.try_into().ok()?);
        if h >> 21 != 0x7FF {
            return None;
        }

        let version = match (h >> 19) & 0x3 {
            0 => MpegVersion::V2_5,
            2 => MpegVersion::V2,
            3 => MpegVersion::V1,
            _ => return None,
        };
        let layer = match (h >> 17) & 0x3 {
            1 => 3,
            2 => 2,
            3 => 1,
            _ => return None,
        };

        let bitrate_index = ((h >> 12) & 0xF) as usize;
        let rate_index = ((h >> 10) & 0x3) as usize;
        if bitrate_index == 0 || bitrate_index == 15 || rate_index == 3 {
            return None;
        }

        let table = match (version, layer) {
            (MpegVersion::V1, l) => (l - 1) as usize,
            (_, 1) => 3,
            _ => 4,
        };
        let bitrate = BITRATES_KBPS[table][bitrate_index] * 1000;
        let sample_rate = match version {
            MpegVersion::V1 => [44100, 48000, 32000][rate_index],
            MpegVersion::V2 => [22050, 24000, 16000][rate_index],
            MpegVersion::V2_5 => [11025, 12000, 8000][rate_index],
        };
        let padding = (h >> 9) & 1 != 0;

        let framelength = match layer {
            1 => (12 * bitrate / sample_rate + padding as u32) * 4,
            2 => 144 * bitrate / sample_rate + padding as u32,
            _ => {
                let coefficient = if version == MpegVersion::V1 { 144 } else { 72 };
                coefficient * bitrate / sample_rate + padding as u32
            }
        };

        Some(Self {
            version,
            layer,
            protection: (h >> 16) & 1 == 0,
            bitrate,
            sample_rate,
            padding,
            private: (h >> 8) & 1 != 0,
            channelmode: match (h >> 6) & 0x3 {
                0 => "stereo",
                1 => "joint stereo",
                2 => "dual channel",
                _ => "mono",
            },
            modeextension: ((h >> 4) & 0x3) as u8,
            copyright: (h >> 3) & 1 != 0,
            original: (h >> 2) & 1 != 0,
            emphasis: match h & 0x3 {
                0 => "none",
                1 => "50/15 ms",
                2 => "reserved",
                _ => "CCIT J.17",
            },
            framelength,
        })
    }

    pub fn channels(&self) -> u32 {
        if self.channelmode == "mono" { 1 } else { 2 }
    }

    pub fn dataformat(&self) -> &'static str {
        match self.layer {
            1 => "mp1",
            2 => "mp2",
            _ => "mp3",
        }
    }

    fn continues_with(&self, other: &FrameHeader) -> bool {
        self.version == other.version
            && self.layer == other.layer
            && self.sample_rate == other.sample_rate
    }

    pub fn stream(&self) -> AudioStream {
        AudioStream {
            dataformat: Some(self.dataformat().into()),
            sample_rate: Some(self.sample_rate as f64),
            channels: Some(self.channels()),
            bitrate: Some(self.bitrate as f64),
            bitrate_mode: Some("cbr".into()),
            lossless: Some(false),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MpegInfo {
    /// Offset of the first frame relative to the scanned data.
    pub sync_offset: u64,
    pub header: FrameHeader,
}

/// Finds the first frame header that is followed by another matching one,
/// or whose successor lies past the end of `data`.
pub fn find_sync(data: &[u8]) -> Option<(usize, FrameHeader)> {
    let mut pos = 0;
    while pos + 4 <= data.len() {
        let Some(found) = data[pos..].iter().position(|&b| b == 0xFF) else {
            break;
        };
        pos += found;
        if let Some(header) = FrameHeader::decode(&data[pos..]) {
            let next = pos + header.framelength as usize;
            if next + 4 > data.len() {
                return Some((pos, header));
            } else if FrameHeader::decode(&data[next..]).is_some_and(|n| header.continues_with(&n))
            {
                return Some((pos, header));
            }
        }
        pos += 1;
    }
    None
}

impl MpegInfo {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let Some((pos, header)) = find_sync(data) else {
            bail!(FormatError::Unsupported(
                "Could not find valid MPEG synch before end of file".into()
            ));
        };
        Ok(Self {
            sync_offset: pos as u64,
            header,
        })
    }
}

pub fn analyze(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let end = session.avdataend();
    let want = (end.saturating_sub(start) as usize).min(SCAN_LIMIT);
    let data = session.read_at(start, want)?;
    let info = MpegInfo::parse(&data)?;

    let offset = start + info.sync_offset;
    if info.sync_offset > 0 {
        session.warn(format!(
            "Unknown data before synch (expected at offset {start}, found at {offset})"
        ));
    }
    session.report.avdataoffset = Some(offset);
    session.report.fileformat = Some("mp3".into());
    session.report.audio_mut().merge_from(&info.header.stream());

    let bitrate = info.header.bitrate as f64;
    session.report.bitrate = Some(bitrate);
    session.report.playtime_seconds = Some(end.saturating_sub(offset) as f64 * 8.0 / bitrate);
    session.report.mpeg = Some(info);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// MPEG-1 layer III, 128 kbit/s, 44.1 kHz, joint stereo: 417 bytes/frame.
    pub(crate) const HEADER_128K: [u8; 4] = [0xFF, 0xFB, 0x90, 0x44];

    pub(crate) fn frames(count: usize) -> Vec<u8> {
        let mut data = Vec::new();
        for _ in 0..count {
            data.extend_from_slice(&HEADER_128K);
            data.resize(data.len() + 413, 0);
        }
        data
    }

    #[test]
    fn decodes_layer3_header() {
        let h = FrameHeader::decode(&HEADER_128K).unwrap();
        assert_eq!(h.version, MpegVersion::V1);
        assert_eq!(h.layer, 3);
        assert_eq!(h.bitrate, 128_000);
        assert_eq!(h.sample_rate, 44100);
        assert_eq!(h.channelmode, "joint stereo");
        assert_eq!(h.framelength, 417);
        assert_eq!(h.dataformat(), "mp3");
    }

    #[test]
    fn rejects_reserved_fields() {
        // reserved version
        assert!(FrameHeader::decode(&[0xFF, 0xEB, 0x90, 0x44]).is_none());
        // free-format bitrate
        assert!(FrameHeader::decode(&[0xFF, 0xFB, 0x00, 0x44]).is_none());
        // reserved sample rate
        assert!(FrameHeader::decode(&[0xFF, 0xFB, 0x9C, 0x44]).is_none());
    }

    #[test]
    fn sync_skips_garbage_and_checks_next_frame() {
        let mut data = vec![0x00, 0xFF, 0xFB, 0x90, 0x44, 0x12];
        data.extend(frames(3));
        let (pos, header) = find_sync(&data).unwrap();
        assert_eq!(pos, 6);
        assert_eq!(header.layer, 3);

        assert!(MpegInfo::parse(&[0u8; 100]).is_err());
    }
}
