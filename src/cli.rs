//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use image_downloader_core::Source;

/// Fetch, curate and archive images from keyword or team input.
///
/// Keyword sources (Google/Imagen, Pixabay) fetch a fixed number of images
/// per keyword. The footy source collects player render links for a team,
/// lets you confirm them, then generates one render per link.
#[derive(Parser, Debug)]
#[command(name = "image-downloader")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress everything except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Directory for archives and saved images
    #[arg(short = 'o', long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// History database path
    #[arg(long, global = true)]
    pub history_db: Option<PathBuf>,

    /// Pixabay API key (overrides PIXABAY_API_KEY)
    #[arg(long, global = true)]
    pub pixabay_api_key: Option<String>,

    /// Gemini API key for Google/Imagen and footy renders (overrides GEMINI_API_KEY)
    #[arg(long, global = true)]
    pub gemini_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch images for comma-separated keywords
    Fetch(FetchArgs),
    /// Collect player links for a team and generate renders
    Footy(FootyArgs),
    /// Show recent batches
    History(HistoryArgs),
}

/// Keyword sources selectable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    Google,
    Pixabay,
}

impl From<SourceArg> for Source {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Google => Source::Google,
            SourceArg::Pixabay => Source::Pixabay,
        }
    }
}

/// Options shared by every command that produces results.
#[derive(Args, Debug, Clone, Default)]
pub struct ResultArgs {
    /// Show the largest images first
    #[arg(long)]
    pub sort_by_size: bool,

    /// Export every result to <output-dir>/<input>.zip
    #[arg(long)]
    pub zip: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Open an interactive curation session after the batch
    #[arg(short, long)]
    pub interactive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Image source
    #[arg(short, long, value_enum)]
    pub source: SourceArg,

    /// Images per keyword (1-100)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub count: Option<u32>,

    #[command(flatten)]
    pub results: ResultArgs,

    /// Keywords; arguments are joined with ',' and split on ','
    #[arg(required = true, num_args = 1..)]
    pub keywords: Vec<String>,
}

impl FetchArgs {
    /// Keyword input as one comma-separated string.
    #[must_use]
    pub fn keyword_input(&self) -> String {
        self.keywords.join(",")
    }
}

#[derive(Args, Debug, Clone)]
pub struct FootyArgs {
    /// Pages of links to collect (1-50)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub max_pages: Option<u32>,

    /// Confirm every collected link without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Deselect links containing this text (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    #[command(flatten)]
    pub results: ResultArgs,

    /// Team name or URL
    pub team: String,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Maximum rows to print (1-100)
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub limit: u8,

    /// Print records as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_fetch_parses_keywords_and_source() {
        let cli =
            Cli::try_parse_from(["image-downloader", "fetch", "-s", "pixabay", "cats", "dogs"])
                .unwrap();
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch command");
        };
        assert_eq!(args.source, SourceArg::Pixabay);
        assert_eq!(args.keyword_input(), "cats,dogs");
        assert!(args.count.is_none());
        assert!(!args.results.zip);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let cli = Cli::try_parse_from(["image-downloader", "-vv", "history"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["image-downloader", "history", "--verbose"]).unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let err = Cli::try_parse_from(["image-downloader", "-q", "-v", "history"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_count_out_of_range_rejected() {
        for count in ["0", "101"] {
            let err = Cli::try_parse_from([
                "image-downloader",
                "fetch",
                "--source",
                "google",
                "-n",
                count,
                "cats",
            ])
            .unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_footy_source_is_not_a_keyword_source() {
        let err = Cli::try_parse_from(["image-downloader", "fetch", "-s", "footy", "cats"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_cli_footy_flags() {
        let cli = Cli::try_parse_from([
            "image-downloader",
            "footy",
            "--max-pages",
            "2",
            "--exclude",
            "goalkeeper",
            "--exclude",
            "coach",
            "--yes",
            "--zip",
            "Arsenal",
        ])
        .unwrap();
        let Command::Footy(args) = cli.command else {
            panic!("expected footy command");
        };
        assert_eq!(args.max_pages, Some(2));
        assert_eq!(args.exclude, vec!["goalkeeper", "coach"]);
        assert!(args.yes);
        assert!(args.results.zip);
        assert_eq!(args.team, "Arsenal");
    }

    #[test]
    fn test_cli_max_pages_over_max_rejected() {
        let err = Cli::try_parse_from(["image-downloader", "footy", "--max-pages", "51", "x"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_history_defaults() {
        let cli = Cli::try_parse_from(["image-downloader", "history"]).unwrap();
        let Command::History(args) = cli.command else {
            panic!("expected history command");
        };
        assert_eq!(args.limit, 20);
        assert!(!args.json);
    }

    #[test]
    fn test_cli_missing_command_is_error() {
        assert!(Cli::try_parse_from(["image-downloader"]).is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Cli::try_parse_from(["image-downloader", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Cli::try_parse_from(["image-downloader", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
