//! Formats that are identified but not parsed: archives, documents,
//! executables and a few oddities.
//!
//! Where a fixed header is cheap to decode it is recorded before the
//! parser bails out with a named error.

use anyhow::{Result, bail};
use mediaid_macros::FromBytes;
use serde::{Serialize, Serializer};

use crate::process::Session;
use crate::utils::byteorder::{ReadBytesLe, trimmed_string};
use crate::utils::errors::FormatError;

fn not_enabled(what: &str) -> FormatError {
    FormatError::Unsupported(format!(
        "{what} parsing not enabled in this version of mediaid [{}]",
        env!("CARGO_PKG_VERSION")
    ))
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn serialize_hex<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex(bytes))
}

#[derive(FromBytes, Clone, Debug, Default, PartialEq, Serialize)]
pub struct SevenZipHeader {
    #[serde(serialize_with = "serialize_hex")]
    pub magic: [u8; 6],
    pub version_major: u8,
    pub version_minor: u8,
    pub start_header_crc: u32,
    pub next_header_offset: u64,
    pub next_header_size: u64,
    pub next_header_crc: u32,
}

const SEVENZIP_MAGIC: [u8; 6] = [b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C];
const XZ_MAGIC: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];
const MSOFFICE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

pub fn analyze_7zip(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let raw = session.read_at(start, 32)?;
    let header = SevenZipHeader::read_le(&mut &raw[..])?;
    if header.magic != SEVENZIP_MAGIC {
        bail!(FormatError::Unsupported(format!(
            "Invalid 7zip stream header magic (expecting {}, found {}) at offset {start}",
            hex(&SEVENZIP_MAGIC),
            hex(&header.magic)
        )));
    }
    session.report.fileformat = Some("7zip".into());
    session.report.sevenzip = Some(header);
    bail!(not_enabled("7zip"))
}

pub fn analyze_xz(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let magic = session.read_at(start, 6)?;
    if magic != XZ_MAGIC {
        bail!(FormatError::Unsupported(format!(
            "Invalid XZ stream header magic (expecting {}, found {}) at offset {start}",
            hex(&XZ_MAGIC),
            hex(&magic)
        )));
    }
    session.report.fileformat = Some("xz".into());
    bail!(not_enabled("XZ"))
}

pub fn analyze_msoffice(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let magic = session.read_at(start, 8)?;
    if magic != MSOFFICE_MAGIC {
        bail!(FormatError::BadMagic {
            expected: hex(&MSOFFICE_MAGIC),
            offset: start,
            found: hex(&magic),
        });
    }
    session.report.fileformat = Some("msoffice".into());
    bail!(not_enabled("MS Office (.doc, .xls, etc)"))
}

/// Formats with nothing decoded at all.
pub fn analyze_named(session: &mut Session, fileformat: &str, label: &str) -> Result<()> {
    session.report.fileformat = Some(fileformat.into());
    bail!(not_enabled(label))
}

pub fn analyze_wtv(session: &mut Session) -> Result<()> {
    session.report.fileformat = Some("wtv".into());
    session.report.video_mut().dataformat = Some("wtv".into());
    session.error(format!(
        "WTV (Windows Recorded TV Show) files not properly processed by this version of mediaid [{}]",
        env!("CARGO_PKG_VERSION")
    ));
    Ok(())
}

#[derive(FromBytes, Clone, Debug, Default, PartialEq, Serialize)]
pub struct MzRaw {
    pub last_page_size: u16,
    pub page_count: u16,
    pub relocation_count: u16,
    pub header_paragraphs: u16,
    pub min_memory_paragraphs: u16,
    pub max_memory_paragraphs: u16,
    pub initial_ss: u16,
    pub initial_sp: u16,
    pub checksum: u16,
    pub cs_ip: u32,
    pub relocation_table_offset: u16,
    pub overlay_number: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ExeInfo {
    pub raw: MzRaw,
    pub byte_size: i64,
    pub header_size: u32,
    pub memory_minimum: u32,
    pub memory_recommended: u32,
}

pub fn analyze_exe(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let raw = session.read_at(start, 28)?;
    if raw.get(..2) != Some(b"MZ".as_slice()) {
        bail!(FormatError::BadMagic {
            expected: "4D 5A".into(),
            offset: start,
            found: hex(&raw[..raw.len().min(2)]),
        });
    }
    let mz = MzRaw::read_le(&mut &raw[2..])?;
    session.report.fileformat = Some("exe".into());
    session.report.exe = Some(ExeInfo {
        byte_size: (mz.page_count as i64 - 1) * 512 + mz.last_page_size as i64,
        header_size: mz.header_paragraphs as u32 * 16,
        memory_minimum: mz.min_memory_paragraphs as u32 * 16,
        memory_recommended: mz.max_memory_paragraphs as u32 * 16,
        raw: mz,
    });
    bail!(not_enabled("EXE"))
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EfaxHeader {
    pub filesize: u32,
    pub software1: String,
    pub software2: String,
    pub software3: String,
    pub pages: u16,
    pub data_bytes: u32,
}

pub fn analyze_efax(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let raw = session.read_at(start, 1024)?;
    if raw.get(..2) != Some([0xDC, 0xFE].as_slice()) {
        bail!(FormatError::Unsupported(format!(
            "Invalid eFax byte order identifier (expecting DC FE, found {}) at offset {start}",
            hex(&raw[..raw.len().min(2)])
        )));
    }
    if raw.len() < 206 {
        bail!(FormatError::Truncated {
            expected: 206,
            found: raw.len() as u64,
        });
    }
    session.report.fileformat = Some("efax".into());

    let u32_at = |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
    let header = EfaxHeader {
        filesize: u32_at(2),
        software1: trimmed_string(&raw[26..58]),
        software2: trimmed_string(&raw[58..90]),
        software3: trimmed_string(&raw[90..122]),
        pages: u16::from_le_bytes([raw[198], raw[199]]),
        data_bytes: u32_at(202),
    };

    let filesize = session.source.len();
    if header.filesize as u64 != filesize {
        session.error(format!(
            "Probable {} file, expecting {} bytes, found {filesize} bytes",
            if header.filesize as u64 > filesize { "truncated" } else { "corrupt" },
            header.filesize
        ));
    }
    session.report.efax = Some(header);
    bail!(not_enabled("eFax"))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct HpkEntry {
    pub offset: u32,
    pub length: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HpkHeader {
    pub data_offset: u32,
    pub fragments_per_file: u32,
    pub fragments_residual_offset: u32,
    pub fragments_residual_count: u32,
    pub fragmented_filesystem_offset: u32,
    pub fragmented_filesystem_length: u32,
    pub filesystem_entries: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HpkInfo {
    pub header: HpkHeader,
    pub filesystem: Vec<HpkEntry>,
}

pub fn analyze_hpk(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let raw = session.read_at(start, 36)?;
    if raw.get(..4) != Some(b"BPUL".as_slice()) {
        bail!(FormatError::BadMagic {
            expected: "BPUL".into(),
            offset: start,
            found: hex(&raw[..raw.len().min(4)]),
        });
    }
    if raw.len() < 36 {
        bail!(FormatError::Truncated {
            expected: 36,
            found: raw.len() as u64,
        });
    }
    session.report.fileformat = Some("hpk".into());

    let u32_at = |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
    let mut header = HpkHeader {
        data_offset: u32_at(4),
        fragments_per_file: u32_at(8),
        fragments_residual_offset: u32_at(16),
        fragments_residual_count: u32_at(20),
        fragmented_filesystem_offset: u32_at(28),
        fragmented_filesystem_length: u32_at(32),
        filesystem_entries: 0,
    };
    let entry_size = header.fragments_per_file.saturating_mul(8);
    if entry_size > 0 {
        header.filesystem_entries = header.fragmented_filesystem_length / entry_size;
    }

    let table_len = header.filesystem_entries as usize * 8;
    let table = session.read_at(header.fragmented_filesystem_offset as u64, table_len)?;
    let filesystem = table
        .chunks_exact(8)
        .map(|e| HpkEntry {
            offset: u32::from_le_bytes([e[0], e[1], e[2], e[3]]),
            length: u32::from_le_bytes([e[4], e[5], e[6], e[7]]),
        })
        .collect();

    session.report.hpk = Some(HpkInfo { header, filesystem });
    bail!(FormatError::Unsupported(format!(
        "HPK parsing incomplete (and mostly broken) in this version of mediaid [{}]",
        env!("CARGO_PKG_VERSION")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Options;
    use crate::source::MemorySource;

    fn session(file: Vec<u8>, options: &Options) -> Session<'_> {
        Session::new(Box::new(MemorySource::new(file)), options)
    }

    #[test]
    fn sevenzip_header_is_kept() {
        let options = Options::default();
        let mut file = SEVENZIP_MAGIC.to_vec();
        file.extend_from_slice(&[0, 4]);
        file.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        file.extend_from_slice(&100u64.to_le_bytes());
        file.extend_from_slice(&30u64.to_le_bytes());
        file.extend_from_slice(&0u32.to_le_bytes());
        let mut s = session(file, &options);
        let err = analyze_7zip(&mut s).unwrap_err();
        assert!(err.to_string().starts_with("7zip parsing not enabled"));
        let header = s.report.sevenzip.unwrap();
        assert_eq!(header.version_minor, 4);
        assert_eq!(header.next_header_offset, 100);
        assert_eq!(s.report.fileformat.as_deref(), Some("7zip"));
    }

    #[test]
    fn exe_sizes() {
        let options = Options::default();
        let mut file = b"MZ".to_vec();
        for v in [0x90u16, 3, 0, 4, 0, 0xFFFF, 0, 0xB8, 0] {
            file.extend_from_slice(&v.to_le_bytes());
        }
        file.extend_from_slice(&0u32.to_le_bytes());
        file.extend_from_slice(&0x40u16.to_le_bytes());
        file.extend_from_slice(&0u16.to_le_bytes());
        let mut s = session(file, &options);
        assert!(analyze_exe(&mut s).is_err());
        let exe = s.report.exe.unwrap();
        assert_eq!(exe.byte_size, 2 * 512 + 0x90);
        assert_eq!(exe.header_size, 64);
        assert_eq!(exe.memory_recommended, 0xFFFF * 16);
    }

    #[test]
    fn efax_size_mismatch() {
        let options = Options::default();
        let mut file = vec![0u8; 300];
        file[..2].copy_from_slice(&[0xDC, 0xFE]);
        file[2..6].copy_from_slice(&400u32.to_le_bytes());
        file[26..32].copy_from_slice(b"FaxPro");
        file[198..200].copy_from_slice(&2u16.to_le_bytes());
        let mut s = session(file, &options);
        let err = analyze_efax(&mut s).unwrap_err();
        assert!(err.to_string().starts_with("eFax parsing not enabled"));
        assert_eq!(
            s.report.error,
            ["Probable truncated file, expecting 400 bytes, found 300 bytes"]
        );
        let efax = s.report.efax.unwrap();
        assert_eq!(efax.software1, "FaxPro");
        assert_eq!(efax.pages, 2);
    }

    #[test]
    fn hpk_filesystem_entries() {
        let options = Options::default();
        let mut file = b"BPUL".to_vec();
        file.extend_from_slice(&36u32.to_le_bytes());
        file.extend_from_slice(&1u32.to_le_bytes());
        file.extend_from_slice(&[0; 16]);
        file.extend_from_slice(&36u32.to_le_bytes());
        file.extend_from_slice(&16u32.to_le_bytes());
        for v in [100u32, 20, 120, 40] {
            file.extend_from_slice(&v.to_le_bytes());
        }
        let mut s = session(file, &options);
        assert!(analyze_hpk(&mut s).is_err());
        let hpk = s.report.hpk.unwrap();
        assert_eq!(hpk.header.filesystem_entries, 2);
        assert_eq!(hpk.filesystem[1], HpkEntry { offset: 120, length: 40 });
    }

    #[test]
    fn named_and_wtv() {
        let options = Options::default();
        let mut s = session(b"%PDF-1.7".to_vec(), &options);
        let err = analyze_named(&mut s, "pdf", "PDF").unwrap_err();
        assert!(err.to_string().starts_with("PDF parsing not enabled"));

        let mut s = session(vec![0; 16], &options);
        analyze_wtv(&mut s).unwrap();
        assert_eq!(s.report.error.len(), 1);
        assert_eq!(s.report.video.unwrap().dataformat.as_deref(), Some("wtv"));

        let mut s = session(b"\xFD7zXZ\0".to_vec(), &options);
        assert!(analyze_xz(&mut s).is_err());
        assert_eq!(s.report.fileformat.as_deref(), Some("xz"));
    }
}
