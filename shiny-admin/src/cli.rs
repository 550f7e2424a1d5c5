//! Command-line interface: server options and administrative subcommands

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shiny_common::users::{self, NewUser};
use shiny_common::{groups, Error};
use sqlx::SqlitePool;

/// Command-line arguments for shiny-admin
#[derive(Parser, Debug)]
#[command(name = "shiny-admin")]
#[command(about = "Accounts, sessions and run preferences for the Dams MCDA application")]
#[command(version)]
pub struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "SHINY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "SHINY_BIND")]
    pub bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SHINY_PORT")]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Manage groups
    Group {
        #[command(subcommand)]
        action: GroupCommand,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GroupCommand {
    /// Create a group
    Add { name: String },
    /// List groups
    List,
    /// Delete a group; its users and preferences lose the group reference
    Delete { id: i64 },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// List users
    List,
    /// Delete a user together with their preferences and sessions
    Delete { username: String },
    /// Create a staff superuser account
    CreateSuperuser {
        username: String,
        password: String,
        #[arg(long, default_value = "")]
        email: String,
    },
}

/// Run an administrative command, returning the lines to print
pub async fn run_admin(pool: &SqlitePool, command: Command) -> Result<Vec<String>> {
    match command {
        Command::Serve => bail!("serve is not an administrative command"),
        Command::Group { action } => run_group(pool, action).await,
        Command::User { action } => run_user(pool, action).await,
    }
}

async fn run_group(pool: &SqlitePool, action: GroupCommand) -> Result<Vec<String>> {
    match action {
        GroupCommand::Add { name } => {
            let group = groups::create_group(pool, &name)
                .await
                .context("Failed to create group")?;
            Ok(vec![format!("Created group {} ({})", group.id, group.name)])
        }
        GroupCommand::List => {
            let lines = groups::list_groups(pool)
                .await?
                .into_iter()
                .map(|group| format!("{}\t{}", group.id, group.name))
                .collect();
            Ok(lines)
        }
        GroupCommand::Delete { id } => {
            groups::delete_group(pool, id)
                .await
                .with_context(|| format!("Failed to delete group {}", id))?;
            Ok(vec![format!("Deleted group {}", id)])
        }
    }
}

async fn run_user(pool: &SqlitePool, action: UserCommand) -> Result<Vec<String>> {
    match action {
        UserCommand::List => {
            let lines = users::list_users(pool)
                .await?
                .into_iter()
                .map(|user| {
                    let group = user.group_id.map(|id| id.to_string()).unwrap_or_default();
                    let flags = match (user.is_superuser, user.is_active) {
                        (true, _) => "superuser",
                        (false, false) => "inactive",
                        (false, true) => "",
                    };
                    format!("{}\t{}\t{}\t{}", user.id, user.username, group, flags)
                })
                .collect();
            Ok(lines)
        }
        UserCommand::Delete { username } => {
            let user = users::get_user_by_username(pool, &username)
                .await?
                .ok_or_else(|| Error::NotFound(format!("user {}", username)))?;
            users::delete_user(pool, user.id).await?;
            Ok(vec![format!("Deleted user {}", username)])
        }
        UserCommand::CreateSuperuser {
            username,
            password,
            email,
        } => {
            if password.is_empty() {
                bail!("Password must not be empty");
            }
            let user = users::create_user(
                pool,
                NewUser {
                    username,
                    password,
                    email,
                    group_id: None,
                    is_staff: true,
                    is_superuser: true,
                },
            )
            .await
            .context("Failed to create superuser")?;
            Ok(vec![format!("Created superuser {} ({})", user.id, user.username)])
        }
    }
}
