//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{parse_seconds, parse_timeout};
use crate::devices::DeviceSource;
use crate::ssh::runner::MAX_BUFFER_SIZE;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "devrun",
    version,
    about = "Runs a command against a device or devices",
    long_about = "Runs a single command against one or more network devices over an interactive\nSSH shell. Pagination is disabled first (\"term len 0\"), then the command is\nsent and whatever the device prints within the settle time is captured.\n\nHost keys are NOT verified: any key a device presents is accepted and its\nfingerprint is written to the log.",
    after_help = "EXAMPLES:\n  Single device:          devrun -d 10.0.0.1\n  Every device in a list: devrun -l\n  Non-interactive:        devrun -l -u netops -c \"show version\"\n\nSettings may also be placed in ~/.devrunrc (key = value)."
)]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        conflicts_with = "uselist",
        help = "Enter an IPv4 Address to run command against a single device."
    )]
    pub device: Option<String>,

    #[arg(
        short = 'l',
        long,
        help = "Use device-list.txt file for list of devices to run commands against."
    )]
    pub uselist: bool,

    #[arg(long, value_name = "PATH", help = "Device list file used with --uselist")]
    pub list_file: Option<PathBuf>,

    #[arg(short = 'u', long, help = "Username (skips the username prompt)")]
    pub username: Option<String>,

    #[arg(short = 'c', long, help = "Command to run (skips the command prompt)")]
    pub command: Option<String>,

    #[arg(short = 'p', long, help = "SSH port [default: 22]")]
    pub port: Option<u16>,

    #[arg(
        long,
        value_name = "SECS",
        value_parser = parse_timeout,
        help = "Connection timeout in seconds [default: 4]"
    )]
    pub timeout: Option<Duration>,

    #[arg(
        long,
        value_name = "SECS",
        value_parser = parse_seconds,
        help = "Wait after each send before reading, in seconds [default: 4]"
    )]
    pub settle: Option<Duration>,

    #[arg(
        long,
        value_name = "BYTES",
        value_parser = clap::value_parser!(u32).range(1..=MAX_BUFFER_SIZE as i64),
        help = "Maximum bytes captured per read, up to 16777216 [default: 524280]"
    )]
    pub buffer_size: Option<u32>,

    #[arg(long, value_name = "PATH", help = "Configuration file [default: ~/.devrunrc]")]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Mirror logs to stderr (-v info, -vv debug, -vvv trace)"
    )]
    pub verbose: u8,
}

impl Cli {
    /// Picks the device source. `device_list` is the configured list path.
    #[must_use]
    pub fn device_source(&self, device_list: &std::path::Path) -> DeviceSource {
        if let Some(device) = &self.device {
            DeviceSource::Single(device.clone())
        } else if self.uselist {
            DeviceSource::List(
                self.list_file
                    .clone()
                    .unwrap_or_else(|| device_list.to_path_buf()),
            )
        } else {
            DeviceSource::Interactive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("devrun").chain(args.iter().copied()))
    }

    #[test]
    fn test_device_flag() {
        let cli = parse(&["-d", "10.0.0.1"]).unwrap();
        assert_eq!(
            cli.device_source(Path::new("device-list.txt")),
            DeviceSource::Single("10.0.0.1".to_string())
        );
    }

    #[test]
    fn test_uselist_flag() {
        let cli = parse(&["--uselist"]).unwrap();
        assert_eq!(
            cli.device_source(Path::new("device-list.txt")),
            DeviceSource::List(PathBuf::from("device-list.txt"))
        );

        let cli = parse(&["-l", "--list-file", "lab.txt"]).unwrap();
        assert_eq!(
            cli.device_source(Path::new("device-list.txt")),
            DeviceSource::List(PathBuf::from("lab.txt"))
        );
    }

    #[test]
    fn test_no_source_is_interactive() {
        let cli = parse(&[]).unwrap();
        assert!(cli.device_source(Path::new("x")).is_interactive());
    }

    #[test]
    fn test_device_and_list_conflict() {
        assert!(parse(&["-d", "10.0.0.1", "-l"]).is_err());
    }

    #[test]
    fn test_timing_flags() {
        let cli = parse(&["--timeout", "10", "--settle", "0.5", "--buffer-size", "4096"]).unwrap();
        assert_eq!(cli.timeout, Some(Duration::from_secs(10)));
        assert_eq!(cli.settle, Some(Duration::from_millis(500)));
        assert_eq!(cli.buffer_size, Some(4096));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse(&["--settle", "-1"]).is_err());
        assert!(parse(&["--timeout", "soon"]).is_err());
        assert!(parse(&["--buffer-size", "0"]).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout_but_not_zero_settle() {
        assert!(parse(&["--timeout", "0"]).is_err());
        let cli = parse(&["--settle", "0"]).unwrap();
        assert_eq!(cli.settle, Some(Duration::ZERO));
    }

    #[test]
    fn test_buffer_size_upper_bound() {
        let max = MAX_BUFFER_SIZE.to_string();
        let cli = parse(&["--buffer-size", &max]).unwrap();
        assert_eq!(cli.buffer_size, Some(MAX_BUFFER_SIZE as u32));

        let over = (MAX_BUFFER_SIZE + 1).to_string();
        assert!(parse(&["--buffer-size", &over]).is_err());
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = parse(&["-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
