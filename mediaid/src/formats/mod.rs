//! Format parsers.
//!
//! Every supported format is a [`Format`] variant. A parser reads from the
//! session's data offset and fills its own section of the report plus the
//! shared `audio`/`video` fields.

use std::fmt::Display;

use anyhow::Result;
use serde::Serialize;

use crate::process::Session;

pub mod archive;
pub mod attachment;
pub mod audio;
pub mod bink;
pub mod cue;
pub mod dsf;
pub mod ivf;
pub mod matroska;
pub mod riff;

/// Codec header decoded for one container track.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamHeader {
    Ac3(audio::ac3::Ac3Info),
    Dts(audio::dts::DtsInfo),
    Mpeg(audio::mpeg::MpegInfo),
    Flac(audio::flac::FlacInfo),
    Vorbis(audio::vorbis::VorbisInfo),
    WaveFormat(riff::WaveFormatEx),
    Bitmap(riff::BitmapInfoHeader),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Ac3,
    Dsf,
    Dts,
    Flac,
    Mp3,
    Bink,
    Ivf,
    Matroska,
    Wtv,
    Efax,
    Cue,
    Hpk,
    Rar,
    Xz,
    SevenZip,
    Par2,
    Pdf,
    MsOffice,
    Exe,
    Gpx,
}

impl Format {
    /// Name used for `fileformat` and in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Format::Ac3 => "ac3",
            Format::Dsf => "dsf",
            Format::Dts => "dts",
            Format::Flac => "flac",
            Format::Mp3 => "mp3",
            Format::Bink => "bink",
            Format::Ivf => "ivf",
            Format::Matroska => "matroska",
            Format::Wtv => "wtv",
            Format::Efax => "efax",
            Format::Cue => "cue",
            Format::Hpk => "hpk",
            Format::Rar => "rar",
            Format::Xz => "xz",
            Format::SevenZip => "7zip",
            Format::Par2 => "par2",
            Format::Pdf => "pdf",
            Format::MsOffice => "msoffice",
            Format::Exe => "exe",
            Format::Gpx => "gpx",
        }
    }

    pub fn mime_type(self) -> Option<&'static str> {
        Some(match self {
            Format::Rar | Format::Par2 | Format::MsOffice | Format::Cue => return None,
            Format::Ac3 => "audio/ac3",
            Format::Dsf => "audio/dsd",
            Format::Dts => "audio/dts",
            Format::Flac => "audio/flac",
            Format::Mp3 => "audio/mpeg",
            Format::Bink | Format::Hpk | Format::Exe => "application/octet-stream",
            Format::Ivf => "video/x-ivf",
            Format::Matroska => "video/x-matroska",
            Format::Wtv => "video/x-ms-wtv",
            Format::Efax => "image/efax",
            Format::Xz => "application/x-xz",
            Format::SevenZip => "application/x-7z-compressed",
            Format::Pdf => "application/pdf",
            Format::Gpx => "application/gpx+xml",
        })
    }

    pub fn analyze(self, session: &mut Session) -> Result<()> {
        match self {
            Format::Ac3 => audio::ac3::analyze(session),
            Format::Dsf => dsf::analyze(session),
            Format::Dts => audio::dts::analyze(session),
            Format::Flac => audio::flac::analyze(session),
            Format::Mp3 => audio::mpeg::analyze(session),
            Format::Bink => bink::analyze(session),
            Format::Ivf => ivf::analyze(session),
            Format::Matroska => matroska::analyze(session),
            Format::Wtv => archive::analyze_wtv(session),
            Format::Efax => archive::analyze_efax(session),
            Format::Cue => cue::analyze(session),
            Format::Hpk => archive::analyze_hpk(session),
            Format::Rar => archive::analyze_named(session, "rar", "RAR"),
            Format::Xz => archive::analyze_xz(session),
            Format::SevenZip => archive::analyze_7zip(session),
            Format::Par2 => archive::analyze_named(session, "par2", "PAR2"),
            Format::Pdf => archive::analyze_named(session, "pdf", "PDF"),
            Format::MsOffice => archive::analyze_msoffice(session),
            Format::Exe => archive::analyze_exe(session),
            Format::Gpx => archive::analyze_named(session, "gpx", "GPX"),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
