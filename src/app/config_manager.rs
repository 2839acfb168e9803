//! Configuration lifecycle: load file config, merge environment and CLI.

use anyhow::Result;
use tracing::debug;

use crate::app::config_runtime::{self, CliValueSources, RunSettings};
use crate::app_config::load_default_file_config;
use crate::cli::Cli;

/// Load file config and merge it under environment and CLI values.
pub(crate) fn resolve_config(cli: &Cli, cli_sources: &CliValueSources) -> Result<RunSettings> {
    let loaded_config = load_default_file_config()?;
    if let Some(path) = loaded_config.path.as_deref()
        && loaded_config.config.is_some()
    {
        debug!(path = %path.display(), "Loaded config file");
    }
    Ok(config_runtime::resolve_settings(
        cli,
        cli_sources,
        loaded_config.config.as_ref(),
        |name| std::env::var(name).ok(),
    ))
}

#[cfg(test)]
mod tests {
    use super::resolve_config;
    use crate::app::config_runtime::CliValueSources;
    use crate::cli::Cli;
    use clap::Parser;
    use tempfile::TempDir;

    /// A malformed config file is a hard error rather than silently ignored.
    #[test]
    fn test_resolve_config_rejects_invalid_file() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("image-downloader");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.toml"), "max_pages = 99\n").unwrap();

        let prev = std::env::var_os("XDG_CONFIG_HOME");
        // SAFETY: test isolates env change and restores on drop.
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp.path());
        }
        let _restore = RestoreEnv::new("XDG_CONFIG_HOME", prev);

        let cli = Cli::try_parse_from(["image-downloader", "history"]).unwrap();
        let err = resolve_config(&cli, &CliValueSources::default()).unwrap_err();
        assert!(format!("{err:#}").contains("max_pages"));
    }

    /// Restores an env var to its previous value (or removes it) when dropped.
    struct RestoreEnv {
        key: &'static str,
        value: Option<std::ffi::OsString>,
    }
    impl RestoreEnv {
        fn new(key: &'static str, value: Option<std::ffi::OsString>) -> Self {
            Self { key, value }
        }
    }
    impl Drop for RestoreEnv {
        fn drop(&mut self) {
            // SAFETY: test restores env to prior state.
            match &self.value {
                Some(v) => unsafe { std::env::set_var(self.key, v) },
                None => unsafe { std::env::remove_var(self.key) },
            }
        }
    }
}
