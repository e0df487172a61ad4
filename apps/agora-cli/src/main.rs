mod cli;
mod commands;
mod config;

use std::sync::Arc;

use agora_store_sqlite::SqliteStore;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, GrantCommand, MemberCommand};
use commands::*;
use config::AgoraConfig;

async fn open_store(config: &AgoraConfig) -> Result<SqliteStore, Box<dyn std::error::Error>> {
    let store = match &config.database_url {
        Some(url) => SqliteStore::open_with(url, config.max_connections).await?,
        None => SqliteStore::open_default().await?,
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = AgoraConfig::from_env()?.with_overrides(cli.database_url, cli.log);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(open_store(&config).await?);
    let output = Output::from_flag(cli.json);
    let mut out = std::io::stdout().lock();

    match cli.command {
        Command::Grant { grant_cmd } => match grant_cmd {
            GrantCommand::Set {
                group,
                permission,
                deny,
            } => {
                cmd_grant_set(store, &mut out, group, permission, deny).await?;
            }
            GrantCommand::Unset { group, permission } => {
                cmd_grant_unset(store, &mut out, group, permission).await?;
            }
            GrantCommand::List { group, permission } => {
                cmd_grant_list(store, &mut out, output, group, permission).await?;
            }
        },
        Command::Member { member_cmd } => match member_cmd {
            MemberCommand::Add {
                user,
                group,
                significance,
            } => {
                cmd_member_add(store, &mut out, user, group, significance).await?;
            }
            MemberCommand::Remove { user, group } => {
                cmd_member_remove(store, &mut out, user, group).await?;
            }
            MemberCommand::Rank {
                user,
                group,
                significance,
            } => {
                cmd_member_rank(store, &mut out, user, group, significance).await?;
            }
            MemberCommand::Groups {
                user,
                order_by,
                direction,
                limit,
                offset,
            } => {
                cmd_member_groups(
                    store, &mut out, output, user, order_by, direction, limit, offset,
                )
                .await?;
            }
            MemberCommand::Users {
                group,
                limit,
                offset,
            } => {
                cmd_member_users(store, &mut out, output, group, limit, offset).await?;
            }
        },
        Command::Check(args) => {
            let granted = match args.user {
                Some(user) => {
                    cmd_check_user(store, &mut out, user, &args.permissions, args.residual)
                        .await?
                }
                None => {
                    cmd_check_groups(
                        store,
                        &mut out,
                        &args.groups,
                        &args.permissions,
                        args.residual,
                    )
                    .await?
                }
            };
            if !granted {
                drop(out);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
