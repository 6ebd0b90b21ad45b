//! Command-line interface.

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::db::{Store, UserChanges};

/// Mangashelf - personal manga collection tracker
#[derive(Parser)]
#[command(name = "mangashelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve,

    /// Create an account directly in the database
    CreateUser {
        username: String,
        password: String,
        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },

    /// Create default config file
    #[command(alias = "--init")]
    InitConfig,
}

pub async fn cmd_create_user(
    config: &Config,
    username: &str,
    password: &str,
    admin: bool,
) -> anyhow::Result<()> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        anyhow::bail!("Username and password must not be empty");
    }

    let store = Store::with_pool_options(
        &config.general.database_path,
        1,
        1,
        config.security.clone(),
    )
    .await?;

    if let Some(existing) = store.get_user_by_username(username).await? {
        println!("User '{}' already exists (ID: {}).", existing.username, existing.id);
        return Ok(());
    }

    let user = store
        .add_user(UserChanges {
            username: username.to_string(),
            password: Some(password.to_string()),
            is_admin: admin,
            user_logo: None,
        })
        .await?;

    let role = if user.isadmin { "admin" } else { "user" };
    println!("✓ Created {role} '{}' (ID: {})", user.username, user.id);

    Ok(())
}

pub fn cmd_init_config() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("✓ Created config.toml with default settings");
    } else {
        println!("config.toml already exists, leaving it untouched");
    }
    Ok(())
}
