use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use mediaid::{AttachmentMode, Options};

static VERSION: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{} ({}, built {}, mediaid {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown"),
        env!("BUILD_TIMESTAMP"),
        env!("MEDIAID_VERSION"),
    )
});

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = VERSION.as_str(),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Inspect media container files and report their structural metadata",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (abort the parser on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress spinners during analysis.
    #[arg(long, global = true)]
    pub progress: bool,

    /// YAML file with analysis options. Flags override its values.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep walking Matroska clusters after all tracks have been seen.
    #[arg(long, global = true)]
    pub parse_whole_file: bool,

    /// Include cluster and cue listings in the report.
    #[arg(long, global = true)]
    pub show_clusters: bool,

    /// How embedded attachments are reported.
    #[arg(long, global = true, value_enum)]
    pub attachments: Option<AttachmentArg>,

    /// Write embedded attachments into this directory.
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "attachments")]
    pub attachments_dir: Option<PathBuf>,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print a summary of each file
    Info(InfoArgs),

    /// Print the full analysis report
    Dump(DumpArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input media files (use "-" for stdin).
    #[arg(value_name = "FILES", required = true)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Input media file (use "-" for stdin).
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = DumpFormat::Yaml)]
    pub format: DumpFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum AttachmentArg {
    /// List attachments without reading them.
    None,
    /// Keep attachment contents in the report.
    Inline,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum DumpFormat {
    Yaml,
    Json,
}

impl Cli {
    /// Analysis options from the config file, if any, with flags applied on
    /// top.
    pub fn options(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => load_config(path)?,
            None => Options::default(),
        };

        if self.strict {
            options.strict = true;
        }
        if self.parse_whole_file {
            options.parse_whole_file = true;
        }
        if self.show_clusters {
            options.hide_clusters = false;
        }
        match (self.attachments, &self.attachments_dir) {
            (_, Some(dir)) => options.attachments = AttachmentMode::Directory(dir.clone()),
            (Some(AttachmentArg::None), None) => options.attachments = AttachmentMode::None,
            (Some(AttachmentArg::Inline), None) => options.attachments = AttachmentMode::Inline,
            (None, None) => {}
        }
        Ok(options)
    }
}

fn load_config(path: &Path) -> Result<Options> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_yaml_ng::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mediaid").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_map_to_options() {
        let cli = parse(&["--strict", "--show-clusters", "--attachments", "none", "info", "a.mkv"]);
        let options = cli.options().unwrap();
        assert!(options.strict);
        assert!(!options.hide_clusters);
        assert!(!options.parse_whole_file);
        assert_eq!(options.attachments, AttachmentMode::None);

        let cli = parse(&["dump", "a.mkv", "--attachments-dir", "/tmp/att", "--format", "json"]);
        let options = cli.options().unwrap();
        assert_eq!(
            options.attachments,
            AttachmentMode::Directory(PathBuf::from("/tmp/att"))
        );
        assert!(matches!(
            cli.command,
            Commands::Dump(DumpArgs {
                format: DumpFormat::Json,
                ..
            })
        ));
    }

    #[test]
    fn flags_override_config() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("mediaid.yaml");
        std::fs::write(
            &path,
            "parse_whole_file: true\nextra_info: false\nattachments: none\n",
        )?;

        let config = path.to_string_lossy().into_owned();
        let cli = parse(&["--config", config.as_str(), "--attachments", "inline", "info", "a.mkv"]);
        let options = cli.options()?;
        assert!(options.parse_whole_file);
        assert!(!options.extra_info);
        assert!(options.hide_clusters);
        assert_eq!(options.attachments, AttachmentMode::Inline);
        Ok(())
    }

    #[test]
    fn missing_config_is_an_error() {
        let cli = parse(&["--config", "/nonexistent/mediaid.yaml", "info", "a.mkv"]);
        let err = cli.options().unwrap_err();
        assert!(err.to_string().starts_with("failed to read config"));
    }
}
