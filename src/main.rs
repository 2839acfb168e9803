//! CLI entry point for the image downloader.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;
mod commands;
mod output;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Results were produced and every requested export succeeded.
    Success,
    /// The batch produced no images, or a requested export failed.
    Failure,
    /// Invalid input or configuration.
    Usage,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Usage => 2,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_image_downloader().await {
        Ok(exit) => ExitCode::from(exit.code()),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(ProcessExit::Usage.code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProcessExit;

    #[test]
    fn test_process_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Failure.code(), 1);
        assert_eq!(ProcessExit::Usage.code(), 2);
    }
}
