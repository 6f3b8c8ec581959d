//! CLI command definitions for task-manager
//!
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Args, Parser, Subcommand};

/// Role-based task tracking server and admin tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Interface to bind (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server (default if no subcommand given)
    Serve,

    /// Ensure the configured admin account exists
    Seed,

    /// Manage the user directory
    #[command(subcommand)]
    Users(UsersCommand),
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Add a user
    Add(AddUserArgs),

    /// List all users
    List,
}

#[derive(Args, Debug)]
pub struct AddUserArgs {
    /// Full name shown in listings and reports
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    /// admin or user
    #[arg(long, default_value = "user")]
    pub role: String,

    /// Identifier forwarded by the identity provider (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["task-manager"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
        assert!(!cli.verbose);
    }

    #[test]
    fn global_overrides_after_subcommand() {
        let cli = Cli::parse_from(["task-manager", "serve", "--port", "9001", "-d", "x.db"]);
        assert!(matches!(cli.command, Some(Command::Serve)));
        assert_eq!(cli.port, Some(9001));
        assert_eq!(cli.database.as_deref(), Some("x.db"));
    }

    #[test]
    fn users_add_defaults_role() {
        let cli = Cli::parse_from([
            "task-manager",
            "users",
            "add",
            "--name",
            "Ada Lovelace",
            "--email",
            "ada@example.com",
        ]);
        match cli.command {
            Some(Command::Users(UsersCommand::Add(args))) => {
                assert_eq!(args.name, "Ada Lovelace");
                assert_eq!(args.role, "user");
                assert!(args.id.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
