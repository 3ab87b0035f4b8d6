//! Command-line configuration for the replay host.

use crate::types::{RegistryConfig, Result, DEFAULT_REGISTRY_URL};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Finds private node module names leaking through HTTP traffic.
#[derive(Parser, Debug, Clone)]
#[command(name = "privmod")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Replay HAR captures and report private modules
    Replay(ReplayConfig),
    /// Print the node module names referenced by local files (no network)
    Extract(ExtractConfig),
    /// Check package names against the registry
    Check(CheckConfig),
}

/// Registry flags shared by the networked commands.
#[derive(clap::Args, Debug, Clone)]
pub struct RegistryArgs {
    /// Registry base URL
    #[arg(long, default_value = DEFAULT_REGISTRY_URL)]
    pub registry: String,

    /// Registry request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Registry lookups in flight at once for one response
    #[arg(long, default_value = "8")]
    pub lookup_concurrency: usize,
}

impl Default for RegistryArgs {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY_URL.to_string(),
            timeout: 30,
            lookup_concurrency: 8,
        }
    }
}

impl RegistryArgs {
    /// Registry client settings for these flags.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            registry_url: self.registry.clone(),
            timeout_secs: self.timeout,
            ..Default::default()
        }
    }
}

/// Configuration for the replay command.
#[derive(Parser, Debug, Clone)]
pub struct ReplayConfig {
    /// HAR capture file(s) to replay
    #[arg(required = true)]
    pub captures: Vec<PathBuf>,

    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Number of transactions analysed in parallel
    #[arg(long, short = 'p', default_value = "8")]
    pub parallel: usize,

    /// Output findings as JSON
    #[arg(long)]
    pub json: bool,

    /// Write findings as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Quiet mode: only show findings
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Configuration for the extract command.
#[derive(Parser, Debug, Clone)]
pub struct ExtractConfig {
    /// Files to scan (bundles, source maps, HTML)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output names as JSON
    #[arg(long)]
    pub json: bool,
}

/// Configuration for the check command.
#[derive(Parser, Debug, Clone)]
pub struct CheckConfig {
    /// Package names to look up
    #[arg(required_unless_present = "file")]
    pub names: Vec<String>,

    /// File containing package names (one per line)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub registry: RegistryArgs,
}

impl CheckConfig {
    /// Names from the command line followed by those in `--file`.
    pub fn load_names(&self) -> Result<Vec<String>> {
        let mut names = self.names.clone();

        if let Some(ref file_path) = self.file {
            let content = std::fs::read_to_string(file_path)?;
            for line in content.lines() {
                let trimmed = line.trim();
                if !trimmed.is_empty() && !trimmed.starts_with('#') {
                    names.push(trimmed.to_string());
                }
            }
        }

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_replay_defaults() {
        let config = Config::try_parse_from(["privmod", "replay", "capture.har"]).unwrap();
        match config.command {
            Commands::Replay(replay) => {
                assert_eq!(replay.captures, vec![PathBuf::from("capture.har")]);
                assert_eq!(replay.parallel, 8);
                let registry = replay.registry.registry_config();
                assert_eq!(registry.registry_url, "https://registry.npmjs.org");
                assert_eq!(registry.timeout_secs, 30);
                assert_eq!(replay.registry.lookup_concurrency, 8);
            }
            other => panic!("Expected replay, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_flags() {
        let config = Config::try_parse_from([
            "privmod",
            "-v",
            "check",
            "left-pad",
            "--registry",
            "http://localhost:4873",
            "--timeout",
            "5",
        ])
        .unwrap();

        assert!(config.verbose);
        match config.command {
            Commands::Check(check) => {
                assert_eq!(check.names, vec!["left-pad"]);
                assert_eq!(check.registry.registry, "http://localhost:4873");
                assert_eq!(check.registry.timeout, 5);
            }
            other => panic!("Expected check, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_concurrency_flag() {
        let config = Config::try_parse_from([
            "privmod",
            "replay",
            "capture.har",
            "--lookup-concurrency",
            "1",
        ])
        .unwrap();

        match config.command {
            Commands::Replay(replay) => assert_eq!(replay.registry.lookup_concurrency, 1),
            other => panic!("Expected replay, got {:?}", other),
        }

        assert!(Config::try_parse_from([
            "privmod",
            "check",
            "left-pad",
            "--lookup-concurrency",
            "many",
        ])
        .is_err());
    }

    #[test]
    fn test_replay_requires_capture() {
        assert!(Config::try_parse_from(["privmod", "replay"]).is_err());
    }

    #[test]
    fn test_load_names_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# internal packages\nacme-ui\n\n  acme-billing  ").unwrap();

        let config = CheckConfig {
            names: vec!["react".to_string()],
            file: Some(file.path().to_path_buf()),
            registry: RegistryArgs::default(),
        };

        assert_eq!(config.load_names().unwrap(), vec!["react", "acme-ui", "acme-billing"]);
    }
}
