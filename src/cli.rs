use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Check and install the packages listed in a requirements.txt file into a
/// chosen Python environment.
///
/// Without a subcommand an interactive terminal UI is started.
#[derive(Parser, Debug)]
#[command(name = "reqman")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// requirements.txt to manage
    #[arg(short = 'r', long = "requirements", value_name = "MANIFEST")]
    pub requirements: Option<PathBuf>,

    /// Python environment directory or interpreter
    #[arg(short, long, value_name = "PYTHON")]
    pub python: Option<PathBuf>,

    /// Package index: default, aliyun, tsinghua, douban or a URL
    #[arg(short, long)]
    pub mirror: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "REQMAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log file used by the terminal UI
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Print every requirement with its install status
    Status,
    /// Install the whole manifest
    Install,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_args() {
        let cli = Cli::parse_from([
            "reqman",
            "-r",
            "req.txt",
            "--python",
            "/env",
            "-m",
            "tsinghua",
            "status",
        ]);
        assert_eq!(cli.requirements, Some(PathBuf::from("req.txt")));
        assert_eq!(cli.python, Some(PathBuf::from("/env")));
        assert_eq!(cli.mirror.as_deref(), Some("tsinghua"));
        assert_eq!(cli.command, Some(Command::Status));

        let cli = Cli::parse_from(["reqman"]);
        assert_eq!(cli.command, None);
        assert!(!cli.verbose);
    }
}
