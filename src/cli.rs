use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "playerwatch", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The rcon address (host:port)
    #[arg(long)]
    pub addr: Option<String>,

    /// The rcon password
    #[arg(long)]
    pub pass: Option<String>,

    /// The webhook url
    #[arg(long)]
    pub hook: Option<String>,

    /// Seconds between polls
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Add debug info
    #[arg(long)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate sample configuration
    ConfigSample {
        /// Output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Flags win over file values
    pub fn apply(&self, config: &mut Config) {
        if let Some(addr) = &self.addr {
            config.rcon.address = addr.clone();
        }
        if let Some(pass) = &self.pass {
            config.rcon.password = pass.clone();
        }
        if let Some(hook) = &self.hook {
            config.webhook.url = hook.clone();
        }
        if let Some(interval) = self.interval {
            config.scan.interval_secs = interval;
        }
        if self.debug {
            config.debug = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let cli = Cli::parse_from([
            "playerwatch",
            "--addr",
            "10.0.0.9:27015",
            "--hook",
            "https://hooks.example.com/1",
            "--interval",
            "30",
            "--debug",
        ]);
        let mut config = Config::sample();
        cli.apply(&mut config);

        assert_eq!(config.rcon.address, "10.0.0.9:27015");
        assert_eq!(config.rcon.password, "change-me");
        assert_eq!(config.webhook.url, "https://hooks.example.com/1");
        assert_eq!(config.scan.interval_secs, 30);
        assert!(config.debug);
    }

    #[test]
    fn config_sample_subcommand() {
        let cli = Cli::parse_from(["playerwatch", "config-sample", "-o", "out.yml"]);
        match cli.command {
            Some(Commands::ConfigSample { output }) => {
                assert_eq!(output, Some(PathBuf::from("out.yml")))
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
