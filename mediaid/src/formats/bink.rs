//! Bink and Smacker video. Only the leading header is looked at.

use anyhow::{Result, bail};
use serde::Serialize;

use crate::process::Session;
use crate::utils::errors::FormatError;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BinkInfo {
    pub data_size: u32,
    pub frame_count: u16,
}

pub fn analyze(session: &mut Session) -> Result<()> {
    session.error(format!(
        "Bink / Smacker files not properly processed by this version of mediaid [{}]",
        env!("CARGO_PKG_VERSION")
    ));

    let start = session.avdataoffset();
    let head = session.read_at(start, 16)?;
    match head.get(..3) {
        Some(b"BIK") => {
            session.report.fileformat = Some("bink".into());
            session.report.video_mut().dataformat = Some("bink".into());
            let Some(fields) = head.get(4..10) else {
                bail!(FormatError::Truncated {
                    expected: 16,
                    found: head.len() as u64,
                });
            };
            let info = BinkInfo {
                data_size: u32::from_le_bytes([fields[0], fields[1], fields[2], fields[3]]),
                frame_count: u16::from_le_bytes([fields[4], fields[5]]),
            };
            let found = session.avdataend().saturating_sub(start);
            if found != info.data_size as u64 + 8 {
                session.error(FormatError::Truncated {
                    expected: info.data_size as u64,
                    found,
                });
            }
            session.report.bink = Some(info);
        }
        Some(b"SMK") => {
            session.report.fileformat = Some("smacker".into());
            session.report.video_mut().dataformat = Some("smacker".into());
        }
        _ => bail!(FormatError::BadMagic {
            expected: "BIK\" or \"SMK".into(),
            offset: start,
            found: String::from_utf8_lossy(&head[..head.len().min(3)]).into_owned(),
        }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Options;
    use crate::source::MemorySource;

    fn run(file: Vec<u8>) -> Session<'static> {
        static OPTIONS: std::sync::LazyLock<Options> = std::sync::LazyLock::new(Options::default);
        let mut session = Session::new(Box::new(MemorySource::new(file)), &OPTIONS);
        analyze(&mut session).unwrap();
        session
    }

    #[test]
    fn bink_size_check() {
        let mut file = b"BIKi".to_vec();
        file.extend_from_slice(&24u32.to_le_bytes());
        file.extend_from_slice(&7u16.to_le_bytes());
        file.resize(32, 0);
        let session = run(file.clone());
        assert_eq!(session.report.bink.as_ref().unwrap().frame_count, 7);
        assert_eq!(session.report.error.len(), 1);

        file.truncate(20);
        let session = run(file);
        assert_eq!(session.report.error.len(), 2);
        assert!(session.report.error[1].contains("expecting 24 bytes, found 20"));
    }

    #[test]
    fn smacker_is_labelled() {
        let session = run(b"SMK2\0\0\0\0".to_vec());
        assert_eq!(session.report.fileformat.as_deref(), Some("smacker"));
    }
}
