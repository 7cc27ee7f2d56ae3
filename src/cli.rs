//! Command-line interface definition using clap
//!
//! Provides structured argument parsing with automatic help generation.

use clap::{Parser, Subcommand};

// =============================================================================
// CLI Definition
// =============================================================================

/// Stream site environment logs from the cloud hosting API
#[derive(Parser, Debug, Default)]
#[command(name = "logstream")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output (stderr)
    #[arg(short, long)]
    pub verbose: bool,

    /// Print accepted lines to stdout instead of running the TUI
    #[arg(long)]
    pub headless: bool,

    /// Site to stream from (overrides the saved selection)
    #[arg(long, value_name = "SITE")]
    pub site: Option<String>,

    /// Environment to stream from (overrides the saved selection)
    #[arg(long = "env", value_name = "ENV")]
    pub environment: Option<String>,

    /// Pick site and environment by a domain they serve
    #[arg(long, value_name = "HOST")]
    pub domain: Option<String>,

    /// Only show log lines caused by this tool's own requests
    #[arg(long)]
    pub only_mine: bool,

    /// Only show lines matching this regex
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Number of messages kept for display (overrides config)
    #[arg(long, value_name = "N")]
    pub max_entries: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One-shot API queries
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List the sites the account can access
    Sites,

    /// List the environments of a site
    Envs {
        /// Site name as listed by `sites`
        site: String,
    },
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["logstream"]);
        assert!(!cli.verbose);
        assert!(!cli.headless);
        assert!(!cli.only_mine);
        assert!(cli.site.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_verbose() {
        let cli = Cli::parse_from(["logstream", "-v"]);
        assert!(cli.verbose);

        let cli = Cli::parse_from(["logstream", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_headless_selection() {
        let cli = Cli::parse_from([
            "logstream",
            "--headless",
            "--site",
            "devcloud:acme",
            "--env",
            "prod",
            "--only-mine",
            "--filter",
            "fatal|error",
            "--max-entries",
            "200",
        ]);
        assert!(cli.headless);
        assert_eq!(cli.site.as_deref(), Some("devcloud:acme"));
        assert_eq!(cli.environment.as_deref(), Some("prod"));
        assert!(cli.only_mine);
        assert_eq!(cli.filter.as_deref(), Some("fatal|error"));
        assert_eq!(cli.max_entries, Some(200));
    }

    #[test]
    fn test_cli_parse_domain() {
        let cli = Cli::parse_from(["logstream", "--domain", "www.acme.test"]);
        assert_eq!(cli.domain.as_deref(), Some("www.acme.test"));
    }

    #[test]
    fn test_cli_parse_subcommands() {
        let cli = Cli::parse_from(["logstream", "sites"]);
        assert_eq!(cli.command, Some(Command::Sites));

        let cli = Cli::parse_from(["logstream", "envs", "acme"]);
        assert_eq!(
            cli.command,
            Some(Command::Envs {
                site: "acme".into()
            })
        );
    }

    #[test]
    fn test_cli_envs_requires_site() {
        assert!(Cli::try_parse_from(["logstream", "envs"]).is_err());
    }
}
