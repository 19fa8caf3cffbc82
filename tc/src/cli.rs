//! CLI argument parsing for taskc

use clap::{Parser, Subcommand};

use taskd::config::{DEFAULT_HOST, DEFAULT_PORT};
use taskd::domain::TaskKind;

#[derive(Parser, Debug)]
#[command(name = "taskc")]
#[command(author, version, about = "Send a task for processing or get its status", long_about = None)]
pub struct Cli {
    /// Server address
    #[arg(short = 'H', long, global = true, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Server port
    #[arg(short = 'P', long, global = true, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a new task to the server
    Task {
        /// Type of the task: 1 (reverse), 2 (swap pairs), 3 (expand)
        kind: TaskKind,

        /// Content of the message
        data: String,

        /// Keep polling until the task is done
        #[arg(long)]
        packet: bool,

        /// Seconds between status polls in packet mode
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },

    /// Get the status of a task
    Status {
        /// Identifier of the task
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_task() {
        let cli = Cli::parse_from(["taskc", "task", "1", "abcd"]);
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.port, 5000);
        match cli.command {
            Command::Task {
                kind,
                data,
                packet,
                interval,
            } => {
                assert_eq!(kind, TaskKind::Reverse);
                assert_eq!(data, "abcd");
                assert!(!packet);
                assert_eq!(interval, 2);
            }
            other => panic!("Expected Task command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_task_packet_mode() {
        let cli = Cli::parse_from(["taskc", "-H", "10.0.0.1", "-P", "6000", "task", "3", "xyz", "--packet"]);
        assert_eq!(cli.host, "10.0.0.1");
        assert_eq!(cli.port, 6000);
        assert!(matches!(
            cli.command,
            Command::Task {
                kind: TaskKind::RunLengthExpand,
                packet: true,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["taskc", "status", "3f9a61c2"]);
        assert!(matches!(cli.command, Command::Status { ref id } if id == "3f9a61c2"));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["taskc", "status", "3f9a61c2", "--port", "7000"]);
        assert_eq!(cli.port, 7000);
    }

    #[test]
    fn test_cli_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["taskc", "task", "9", "abcd"]).is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["taskc"]).is_err());
    }
}
