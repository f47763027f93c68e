use std::io::Write;

use anyhow::Result;
use mediaid::{Analyzer, Options, Report};

use super::command::{DumpArgs, DumpFormat};
use crate::input::Input;

pub fn cmd_dump(args: &DumpArgs, options: Options) -> Result<()> {
    let input = Input::new(&args.input);
    log::info!("Analyzing {}", input.display_name());

    let report = input.analyze(&Analyzer::new(options))?;
    let mut stdout = std::io::stdout().lock();
    write_report(&mut stdout, &report, args.format)?;
    stdout.flush()?;
    Ok(())
}

fn write_report(out: &mut impl Write, report: &Report, format: DumpFormat) -> Result<()> {
    match format {
        DumpFormat::Yaml => serde_yaml_ng::to_writer(&mut *out, report)?,
        DumpFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report {
            fileformat: Some("cue".into()),
            filesize: Some(120),
            warning: vec!["short sheet".into()],
            ..Default::default()
        }
    }

    #[test]
    fn json_output() -> Result<()> {
        let mut out = Vec::new();
        write_report(&mut out, &sample(), DumpFormat::Json)?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value["fileformat"], "cue");
        assert_eq!(value["filesize"], 120);
        assert_eq!(value["warning"][0], "short sheet");
        assert!(value.get("audio").is_none());
        Ok(())
    }

    #[test]
    fn yaml_output() -> Result<()> {
        let mut out = Vec::new();
        write_report(&mut out, &sample(), DumpFormat::Yaml)?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("fileformat: cue\n"));
        assert!(text.contains("filesize: 120\n"));
        assert!(!text.contains("audio"));
        Ok(())
    }
}
