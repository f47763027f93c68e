//! Windows codec structures carried in CodecPrivate by `A_MS/ACM` and
//! `V_MS/VFW/FOURCC` tracks.

use anyhow::Result;
use mediaid_macros::FromBytes;
use serde::Serialize;

use crate::report::{AudioStream, VideoStream};
use crate::utils::byteorder::ReadBytesLe;

#[derive(FromBytes, Clone, Debug, Default, PartialEq, Serialize)]
pub struct WaveFormatEx {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WaveFormatEx {
    pub const LENGTH: usize = 16;

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(Self::read_le(&mut &bytes[..])?)
    }

    pub fn codec(&self) -> String {
        format_tag_name(self.format_tag)
            .map(str::to_string)
            .unwrap_or_else(|| format!("unknown: 0x{:04X}", self.format_tag))
    }

    pub fn stream(&self) -> AudioStream {
        AudioStream {
            codec: Some(self.codec()),
            sample_rate: Some(self.samples_per_sec as f64),
            channels: Some(self.channels as u32),
            bits_per_sample: (self.bits_per_sample > 0).then_some(self.bits_per_sample as u32),
            bitrate: (self.avg_bytes_per_sec > 0).then_some(self.avg_bytes_per_sec as f64 * 8.0),
            lossless: matches!(self.format_tag, 0x0001 | 0x0003 | 0x0163).then_some(true),
            ..Default::default()
        }
    }
}

pub fn format_tag_name(tag: u16) -> Option<&'static str> {
    Some(match tag {
        0x0001 => "Pulse Code Modulation (PCM)",
        0x0002 => "Microsoft ADPCM",
        0x0003 => "IEEE Float",
        0x0006 => "Microsoft A-Law",
        0x0007 => "Microsoft mu-Law",
        0x0011 => "Intel DVI/IMA ADPCM",
        0x0031 => "Microsoft GSM 6.10",
        0x0050 => "MPEG Layer-2 or Layer-1",
        0x0055 => "MPEG Layer-3",
        0x00FF => "AAC",
        0x0161 => "Windows Media Audio",
        0x0162 => "Windows Media Audio 9 Professional",
        0x0163 => "Windows Media Audio 9 Lossless",
        0x2000 => "AC-3",
        0x2001 => "DTS",
        0x674F | 0x6750 | 0x6751 | 0x676F | 0x6770 | 0x6771 => "Ogg Vorbis",
        0xF1AC => "Free Lossless Audio Codec FLAC",
        0xFFFE => "WAVE_FORMAT_EXTENSIBLE",
        _ => return None,
    })
}

#[derive(FromBytes, Clone, Debug, Default, PartialEq, Serialize)]
pub struct BitmapInfoHeader {
    pub size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    #[serde(serialize_with = "serialize_fourcc")]
    pub compression: [u8; 4],
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

fn serialize_fourcc<S: serde::Serializer>(fourcc: &[u8; 4], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(fourcc))
}

impl BitmapInfoHeader {
    pub const LENGTH: usize = 40;

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(Self::read_le(&mut &bytes[..])?)
    }

    pub fn fourcc(&self) -> String {
        String::from_utf8_lossy(&self.compression).into_owned()
    }

    pub fn codec(&self) -> String {
        fourcc_name(&self.compression)
            .map(str::to_string)
            .unwrap_or_else(|| self.fourcc())
    }

    pub fn stream(&self) -> VideoStream {
        VideoStream {
            codec: Some(self.codec()),
            resolution_x: Some(self.width.unsigned_abs() as u64),
            resolution_y: Some(self.height.unsigned_abs() as u64),
            bits_per_sample: (self.bit_count > 0).then_some(self.bit_count as u32),
            ..Default::default()
        }
    }
}

pub fn fourcc_name(fourcc: &[u8; 4]) -> Option<&'static str> {
    let upper = fourcc.to_ascii_uppercase();
    Some(match upper.as_slice() {
        [0, 0, 0, 0] => "RGB",
        b"AVC1" | b"H264" | b"X264" => "H.264/MPEG-4 AVC",
        b"CVID" => "Cinepak",
        b"DIV3" | b"MP43" => "Microsoft MPEG-4 v3",
        b"DIVX" => "DivX 4",
        b"DX50" => "DivX 5",
        b"FMP4" | b"MP4V" => "MPEG-4 Part 2",
        b"HEVC" | b"HVC1" => "H.265/HEVC",
        b"MJPG" => "Motion JPEG",
        b"MP42" => "Microsoft MPEG-4 v2",
        b"VP80" => "On2 VP8",
        b"WMV1" => "Windows Media Video 7",
        b"WMV2" => "Windows Media Video 8",
        b"WMV3" => "Windows Media Video 9",
        b"WVC1" => "Windows Media Video 9 Advanced Profile",
        b"XVID" => "XviD",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveformatex_pcm() -> Result<()> {
        let mut raw = 1u16.to_le_bytes().to_vec();
        raw.extend_from_slice(&2u16.to_le_bytes());
        raw.extend_from_slice(&48000u32.to_le_bytes());
        raw.extend_from_slice(&192_000u32.to_le_bytes());
        raw.extend_from_slice(&4u16.to_le_bytes());
        raw.extend_from_slice(&16u16.to_le_bytes());
        let wf = WaveFormatEx::parse(&raw)?;
        let stream = wf.stream();
        assert_eq!(stream.codec.as_deref(), Some("Pulse Code Modulation (PCM)"));
        assert_eq!(stream.bitrate, Some(1_536_000.0));
        assert_eq!(stream.bits_per_sample, Some(16));
        assert_eq!(stream.lossless, Some(true));
        assert!(WaveFormatEx::parse(&raw[..10]).is_err());
        Ok(())
    }

    #[test]
    fn bitmapinfoheader_xvid() -> Result<()> {
        let mut raw = 40u32.to_le_bytes().to_vec();
        raw.extend_from_slice(&640i32.to_le_bytes());
        raw.extend_from_slice(&(-480i32).to_le_bytes());
        raw.extend_from_slice(&1u16.to_le_bytes());
        raw.extend_from_slice(&24u16.to_le_bytes());
        raw.extend_from_slice(b"xvid");
        raw.extend_from_slice(&[0; 20]);
        let bih = BitmapInfoHeader::parse(&raw)?;
        assert_eq!(bih.fourcc(), "xvid");
        let stream = bih.stream();
        assert_eq!(stream.codec.as_deref(), Some("XviD"));
        assert_eq!(stream.resolution_y, Some(480));
        assert_eq!(stream.bits_per_sample, Some(24));
        Ok(())
    }
}
