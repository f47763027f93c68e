use std::path::Path;
use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::formats::Format;

/// Bytes read at the data offset for identification.
pub const SNIFF_LENGTH: usize = 32774;

/// Signatures tried in order against the leading bytes. First match wins.
const SIGNATURES: &[(Format, &str)] = &[
    (Format::Ac3, r"^\x0B\x77"),
    (Format::Dsf, r"^DSD "),
    (Format::Dts, r"^\x7F\xFE\x80\x01"),
    (Format::Flac, r"^fLaC"),
    (
        Format::Mp3,
        r"^\xFF[\xE2-\xE7\xF2-\xF7\xFA-\xFF][\x00-\x0B\x10-\x1B\x20-\x2B\x30-\x3B\x40-\x4B\x50-\x5B\x60-\x6B\x70-\x7B\x80-\x8B\x90-\x9B\xA0-\xAB\xB0-\xBB\xC0-\xCB\xD0-\xDB\xE0-\xEB\xF0-\xFB]",
    ),
    (Format::Bink, r"^(BIK|SMK)"),
    (Format::Ivf, r"^DKIF"),
    (Format::Matroska, r"^\x1A\x45\xDF\xA3"),
    (
        Format::Wtv,
        r"^\xB7\xD8\x00\x20\x37\x49\xDA\x11\xA6\x4E\x00\x07\xE9\x5E\xAD\x8D",
    ),
    (Format::Efax, r"^\xDC\xFE"),
    (Format::Hpk, r"^BPUL"),
    (Format::Rar, r"^Rar!"),
    (Format::Xz, r"^\xFD7zXZ\x00"),
    (Format::SevenZip, r"^7z\xBC\xAF\x27\x1C"),
    (Format::Par2, r"^PAR2\x00PKT"),
    (Format::Pdf, r"^\x25PDF"),
    (Format::MsOffice, r"^\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1"),
    (Format::Exe, r"^MZ"),
    (Format::Gpx, r"^<\?xml [^>]+>[\s]*<gpx "),
];

static TABLE: LazyLock<Vec<(Format, Regex)>> = LazyLock::new(|| {
    SIGNATURES
        .iter()
        .map(|&(format, pattern)| {
            let re = Regex::new(&format!("(?s-u){pattern}")).expect("valid regex");
            (format, re)
        })
        .collect()
});

static MP3_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)\.mp[123a]$").expect("valid regex"));

static CUE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)\.cue$").expect("valid regex"));

static CUE_FILE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?-u)FILE "[^"]+" (BINARY|MOTOROLA|AIFF|WAVE|MP3)"#).expect("valid regex")
});

/// Identifies a format from the leading bytes of its data.
pub fn sniff(head: &[u8]) -> Option<Format> {
    TABLE
        .iter()
        .find(|(_, re)| re.is_match(head))
        .map(|&(format, _)| format)
}

/// Formats without a reliable signature, recognized by file name.
pub fn sniff_extension(path: &Path, head: &[u8]) -> Option<Format> {
    let name = path.file_name()?.as_encoded_bytes();
    if MP3_EXTENSION.is_match(name) {
        Some(Format::Mp3)
    } else if CUE_EXTENSION.is_match(name) && CUE_FILE_LINE.is_match(head) {
        Some(Format::Cue)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_in_table_order() {
        assert_eq!(sniff(b"\x1A\x45\xDF\xA3\x9F\x42\x86\x81\x01"), Some(Format::Matroska));
        assert_eq!(sniff(b"fLaC\x00\x00\x00\x22"), Some(Format::Flac));
        assert_eq!(sniff(&[0xFF, 0xFB, 0x90, 0x44]), Some(Format::Mp3));
        // MPEG 2.5 sync is not recognized.
        assert_eq!(sniff(&[0xFF, 0xE0, 0x90, 0x44]), None);
        assert_eq!(sniff(b"7z\xBC\xAF\x27\x1C\x00\x04"), Some(Format::SevenZip));
        assert_eq!(sniff(b"<?xml version=\"1.0\"?>\n  <gpx version"), Some(Format::Gpx));
        assert_eq!(sniff(b"MZ\x90\x00"), Some(Format::Exe));
        assert_eq!(sniff(b"RIFF\x00\x00\x00\x00WAVE"), None);
        assert_eq!(sniff(b""), None);
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(sniff_extension(Path::new("/music/Track.MP2"), b"junk"), Some(Format::Mp3));
        let sheet = b"REM x\nFILE \"a b.wav\" WAVE\n  TRACK 01 AUDIO\n";
        assert_eq!(sniff_extension(Path::new("disc.cue"), sheet), Some(Format::Cue));
        assert_eq!(sniff_extension(Path::new("disc.cue"), b"TITLE x\n"), None);
        assert_eq!(sniff_extension(Path::new("notes.txt"), sheet), None);
    }
}
