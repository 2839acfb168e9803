//! Merges CLI flags, environment and file config into effective settings.

use std::path::PathBuf;

use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use image_downloader_core::export::DEFAULT_ARCHIVE_CONCURRENCY;
use image_downloader_core::{DEFAULT_IMAGES_PER_ITEM, DEFAULT_PAGES, HttpTimeouts};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Cli;

pub(crate) const PIXABAY_KEY_ENV: &str = "PIXABAY_API_KEY";
pub(crate) const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";
/// Older deployments exported the Gemini key under this name.
pub(crate) const LEGACY_GEMINI_KEY_ENV: &str = "API_KEY";

const HISTORY_DB_FILE: &str = "history.db";
const APP_DIR: &str = "image-downloader";

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

/// Effective settings for one process run.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub(crate) output_dir: PathBuf,
    pub(crate) history_db: PathBuf,
    pub(crate) pixabay_api_key: Option<String>,
    pub(crate) gemini_api_key: Option<String>,
    pub(crate) images_per_keyword: u32,
    pub(crate) max_pages: u32,
    pub(crate) archive_concurrency: usize,
    pub(crate) timeouts: HttpTimeouts,
    pub(crate) verbose: u8,
    pub(crate) quiet: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Cli, CliValueSources) {
    let command = Cli::command();
    let matches = command.get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    let sources = CliValueSources {
        verbose: is_commandline_value(&matches, "verbose"),
        quiet: is_commandline_value(&matches, "quiet"),
    };
    (cli, sources)
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Resolves settings with precedence CLI > environment > file > default.
///
/// `env` looks up an environment variable; empty values count as unset.
pub(crate) fn resolve_settings<F>(
    cli: &Cli,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
    env: F,
) -> RunSettings
where
    F: Fn(&str) -> Option<String>,
{
    let env_non_empty = |name: &str| env(name).filter(|value| !value.trim().is_empty());
    let file = file_config.cloned().unwrap_or_default();

    let pixabay_api_key = cli
        .pixabay_api_key
        .clone()
        .or_else(|| env_non_empty(PIXABAY_KEY_ENV))
        .or(file.pixabay_api_key);
    let gemini_api_key = cli
        .gemini_api_key
        .clone()
        .or_else(|| env_non_empty(GEMINI_KEY_ENV))
        .or_else(|| env_non_empty(LEGACY_GEMINI_KEY_ENV))
        .or(file.gemini_api_key);

    let output_dir = cli
        .output_dir
        .clone()
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let history_db = cli
        .history_db
        .clone()
        .or(file.history_db)
        .unwrap_or_else(|| default_history_db(&env_non_empty));

    let mut timeouts = HttpTimeouts::default();
    if let Some(value) = file.connect_timeout_secs {
        timeouts.connect_timeout_secs = value;
    }
    if let Some(value) = file.read_timeout_secs {
        timeouts.read_timeout_secs = value;
    }

    let (mut verbose, mut quiet) = (cli.verbose, cli.quiet);
    if !cli_sources.verbose
        && !cli_sources.quiet
        && let Some(verbosity) = file.verbosity
    {
        (verbose, quiet) = config_verbosity(verbosity);
    }

    RunSettings {
        output_dir,
        history_db,
        pixabay_api_key,
        gemini_api_key,
        images_per_keyword: file.images_per_keyword.unwrap_or(DEFAULT_IMAGES_PER_ITEM),
        max_pages: file.max_pages.unwrap_or(DEFAULT_PAGES),
        archive_concurrency: file
            .archive_concurrency
            .map_or(DEFAULT_ARCHIVE_CONCURRENCY, usize::from),
        timeouts,
        verbose,
        quiet,
    }
}

fn config_verbosity(verbosity: VerbositySetting) -> (u8, bool) {
    match verbosity {
        VerbositySetting::Default => (0, false),
        VerbositySetting::Verbose => (1, false),
        VerbositySetting::Quiet => (0, true),
        VerbositySetting::Debug => (2, false),
    }
}

/// `$XDG_DATA_HOME/image-downloader/history.db`, then
/// `$HOME/.local/share/image-downloader/history.db`, then the working directory.
fn default_history_db<F>(env: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(data_home) = env("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR).join(HISTORY_DB_FILE);
    }
    if let Some(home) = env("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR)
            .join(HISTORY_DB_FILE);
    }
    PathBuf::from(format!(".{APP_DIR}")).join(HISTORY_DB_FILE)
}

/// Default tracing level. User-facing progress goes through the activity
/// log, so diagnostics stay at `warn` unless asked for.
pub(crate) fn resolve_default_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet
}
