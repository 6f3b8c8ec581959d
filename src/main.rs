//! Task Manager
//!
//! Server-rendered task tracking web application with a small admin CLI.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use task_manager::cli::{AddUserArgs, Cli, Command, UsersCommand};
use task_manager::config::{Config, ConfigLoader, ConfigPaths, EnvOverrides};
use task_manager::db::Database;
use task_manager::logging::{LogTarget, init_logging};
use task_manager::types::Role;
use task_manager::web;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    // An explicit --config wins over TASK_MANAGER_CONFIG_PATH.
    let mut env = EnvOverrides::from_env();
    if let Some(ref config_path) = cli.config {
        env.config_path = Some(config_path.clone());
    }
    let mut loader = ConfigLoader::load_with(ConfigPaths::discover(), &env)?;
    if let Some(path) = loader.config_path() {
        info!(path = %path.display(), "Loaded configuration");
    }

    // CLI flags override every config tier.
    let config = loader.config_mut();
    if let Some(ref db_path) = cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(ref host) = cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let config = loader.into_config();

    match cli.command {
        Some(Command::Seed) => run_seed(&config),
        Some(Command::Users(UsersCommand::Add(args))) => run_add_user(&config, args),
        Some(Command::Users(UsersCommand::List)) => run_list_users(&config),
        Some(Command::Serve) | None => run_server(config).await,
    }
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    Database::open(&config.server.db_path).with_context(|| {
        format!(
            "Failed to open database {}",
            config.server.db_path.display()
        )
    })
}

async fn run_server(config: Config) -> Result<()> {
    let db = Arc::new(open_database(&config)?);
    info!(
        db_path = %config.server.db_path.display(),
        user_header = %config.auth.user_header,
        "Starting task manager"
    );
    if db.count_users()? == 0 {
        tracing::warn!("User directory is empty; run `task-manager seed` to create an admin");
    }
    web::serve(db, &config).await
}

fn run_seed(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let (admin, created) = db.ensure_admin(&config.seed.admin_name, &config.seed.admin_email)?;
    if created {
        info!(user_id = %admin.id, email = %admin.email, "Created admin account");
    } else {
        info!(user_id = %admin.id, email = %admin.email, "Admin account already exists");
    }
    println!("{}\t{}\t{}", admin.id, admin.email, admin.role);
    Ok(())
}

fn run_add_user(config: &Config, args: AddUserArgs) -> Result<()> {
    let role: Role = args.role.parse()?;
    let db = open_database(config)?;
    let user = db.create_user(args.id, &args.name, &args.email, role)?;
    println!("{}\t{}\t{}\t{}", user.id, user.full_name, user.email, user.role);
    Ok(())
}

fn run_list_users(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    for user in db.list_users()? {
        println!("{}\t{}\t{}\t{}", user.id, user.full_name, user.email, user.role);
    }
    Ok(())
}
