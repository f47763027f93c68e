//! Cue sheets.
//!
//! Commands before the first `TRACK` apply to the disc, later ones to the
//! most recent track. Unknown commands are reported as warnings and skipped.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::Serialize;

use crate::process::Session;
use crate::report::{CommentValue, Comments};

/// Cue sheets are small; anything beyond this is not read.
const MAX_CUE_SIZE: usize = 1 << 20;

static FILE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^FILE\s+(?:"([^"]*)"|(\S+))\s+(\S+)\s*$"#).expect("valid regex")
});

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CueFile {
    pub filename: String,
    #[serde(rename = "type")]
    pub filetype: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CueTime {
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

impl CueTime {
    /// Parses `mm:ss:ff`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(':').map(|p| p.trim().parse::<u32>());
        let time = Self {
            minutes: parts.next()?.ok()?,
            seconds: parts.next()?.ok()?,
            frames: parts.next()?.ok()?,
        };
        parts.next().is_none().then_some(time)
    }

    /// Seconds, at 75 frames per second.
    pub fn as_seconds(&self) -> f64 {
        self.minutes as f64 * 60.0 + self.seconds as f64 + self.frames as f64 / 75.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CueFlags {
    #[serde(rename = "4ch")]
    pub four_channel: bool,
    pub dcp: bool,
    pub pre: bool,
    pub scms: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CueTrack {
    pub number: u32,
    pub datatype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub songwriter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<CueFlags>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub index: BTreeMap<u32, CueTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pregap: Option<CueTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgap: Option<CueTime>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub comments: BTreeMap<String, Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CueSheet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdtextfile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<CueFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub songwriter: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<CueTrack>,
    #[serde(skip_serializing_if = "Comments::is_empty")]
    pub comments: Comments,
}

fn unquote(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .to_string()
}

impl CueSheet {
    /// Parses the text of a cue sheet. Problems are returned as warnings.
    pub fn parse(text: &str) -> (Self, Vec<String>) {
        let mut sheet = Self::default();
        let mut warnings = Vec::new();

        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let rest = rest.trim();
            let track = sheet.tracks.last_mut();

            match command.to_ascii_uppercase().as_str() {
                "REM" => {
                    let (key, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                    let key = key.to_ascii_lowercase();
                    let value = unquote(value);
                    match track {
                        Some(track) => track.comments.entry(key).or_default().push(value),
                        None => sheet
                            .comments
                            .entry(key)
                            .or_default()
                            .push(CommentValue::Text(value)),
                    }
                }
                "TITLE" | "PERFORMER" | "SONGWRITER" => {
                    let value = unquote(rest);
                    let key = command.to_ascii_lowercase();
                    let slot = match (track, key.as_str()) {
                        (Some(t), "title") => &mut t.title,
                        (Some(t), "performer") => &mut t.performer,
                        (Some(t), _) => &mut t.songwriter,
                        (None, "title") => &mut sheet.title,
                        (None, "performer") => &mut sheet.performer,
                        (None, _) => &mut sheet.songwriter,
                    };
                    *slot = Some(value);
                }
                "FILE" => match FILE_LINE.captures(line) {
                    Some(caps) => {
                        let filename = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                        sheet.file = Some(CueFile {
                            filename: filename.to_string(),
                            filetype: caps[3].to_ascii_uppercase(),
                        });
                    }
                    None => warnings.push(format!("Malformed FILE line {}: {line}", n + 1)),
                },
                "TRACK" => {
                    let mut parts = rest.split_whitespace();
                    match parts.next().and_then(|p| p.parse().ok()) {
                        Some(number) => sheet.tracks.push(CueTrack {
                            number,
                            datatype: parts.next().unwrap_or_default().to_string(),
                            ..Default::default()
                        }),
                        None => warnings.push(format!("Malformed TRACK line {}: {line}", n + 1)),
                    }
                }
                "INDEX" => {
                    let mut parts = rest.split_whitespace();
                    let number = parts.next().and_then(|p| p.parse::<u32>().ok());
                    let time = parts.next().and_then(CueTime::parse);
                    match (track, number, time) {
                        (Some(track), Some(number), Some(time)) => {
                            track.index.insert(number, time);
                        }
                        _ => warnings.push(format!("Malformed INDEX line {}: {line}", n + 1)),
                    }
                }
                "PREGAP" | "POSTGAP" => match (track, CueTime::parse(rest)) {
                    (Some(track), Some(time)) => {
                        if command.eq_ignore_ascii_case("PREGAP") {
                            track.pregap = Some(time);
                        } else {
                            track.postgap = Some(time);
                        }
                    }
                    _ => warnings.push(format!("Malformed {command} line {}: {line}", n + 1)),
                },
                "FLAGS" => {
                    let mut flags = CueFlags::default();
                    for flag in rest.split_whitespace() {
                        match flag.to_ascii_uppercase().as_str() {
                            "4CH" => flags.four_channel = true,
                            "DCP" => flags.dcp = true,
                            "PRE" => flags.pre = true,
                            "SCMS" => flags.scms = true,
                            _ => {}
                        }
                    }
                    if let Some(track) = track {
                        track.flags = Some(flags);
                    }
                }
                "ISRC" => {
                    if let Some(track) = track {
                        track.isrc = Some(unquote(rest));
                    }
                }
                "CATALOG" => sheet.catalog = Some(unquote(rest)),
                "CDTEXTFILE" => sheet.cdtextfile = Some(unquote(rest)),
                _ => warnings.push(format!("unhandled line {}: {line}", n + 1)),
            }
        }

        for (key, value) in [
            ("title", &sheet.title),
            ("performer", &sheet.performer),
            ("songwriter", &sheet.songwriter),
        ] {
            if let Some(value) = value {
                sheet
                    .comments
                    .entry(key.to_string())
                    .or_default()
                    .push(CommentValue::Text(value.clone()));
            }
        }

        (sheet, warnings)
    }
}

pub fn analyze(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let len = session.avdataend().saturating_sub(start) as usize;
    let raw = session.read_at(start, len.min(MAX_CUE_SIZE))?;
    let text = String::from_utf8_lossy(&raw);

    let (sheet, warnings) = CueSheet::parse(&text);
    for warning in warnings {
        session.warn(warning);
    }
    session.report.fileformat = Some("cue".into());
    session.report.cue = Some(sheet);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SHEET: &str = "\u{FEFF}REM GENRE Rock\r\n\
        REM DATE 1999\r\n\
        PERFORMER \"The Band\"\r\n\
        TITLE \"Live\"\r\n\
        CATALOG 0123456789012\r\n\
        FILE \"live show.flac\" WAVE\r\n\
        \x20 TRACK 01 AUDIO\r\n\
        \x20   TITLE \"Intro\"\r\n\
        \x20   FLAGS DCP PRE\r\n\
        \x20   ISRC USABC9900001\r\n\
        \x20   INDEX 01 00:00:00\r\n\
        \x20 TRACK 02 AUDIO\r\n\
        \x20   PREGAP 00:02:00\r\n\
        \x20   REM COMPOSER Someone\r\n\
        \x20   INDEX 00 03:10:50\r\n\
        \x20   INDEX 01 03:12:00\r\n";

    #[test]
    fn parses_disc_and_tracks() {
        let (sheet, warnings) = CueSheet::parse(SHEET);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(sheet.catalog.as_deref(), Some("0123456789012"));
        assert_eq!(
            sheet.file,
            Some(CueFile {
                filename: "live show.flac".into(),
                filetype: "WAVE".into(),
            })
        );
        assert_eq!(sheet.comments["genre"], [CommentValue::Text("Rock".into())]);
        assert_eq!(sheet.comments["performer"], [CommentValue::Text("The Band".into())]);
        assert_eq!(sheet.tracks.len(), 2);

        let intro = &sheet.tracks[0];
        assert_eq!(intro.title.as_deref(), Some("Intro"));
        assert_eq!(intro.flags.as_ref().map(|f| (f.dcp, f.pre, f.scms)), Some((true, true, false)));
        assert_eq!(intro.isrc.as_deref(), Some("USABC9900001"));

        let second = &sheet.tracks[1];
        assert_eq!(second.pregap, Some(CueTime { minutes: 0, seconds: 2, frames: 0 }));
        assert_eq!(second.index[&0].as_seconds(), 190.0 + 50.0 / 75.0);
        assert_eq!(second.comments["composer"], ["Someone"]);
    }

    #[test]
    fn malformed_lines_warn() {
        let (sheet, warnings) = CueSheet::parse("TRACK xx AUDIO\nINDEX 01 1:2\nBOGUS 1\n");
        assert!(sheet.tracks.is_empty());
        assert_eq!(warnings.len(), 3);
    }
}
