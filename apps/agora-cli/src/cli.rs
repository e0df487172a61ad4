use agora_storage::{MembershipOrder, SortDirection};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agora")]
#[command(about = "Agora group permission administration")]
pub struct Cli {
    /// Database URL (sqlite://path/to/agora.db); overrides DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Log filter directive; overrides AGORA_LOG
    #[arg(long, global = true)]
    pub log: Option<String>,

    /// Print listings as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Group permission grants
    Grant {
        #[command(subcommand)]
        grant_cmd: GrantCommand,
    },
    /// User to group memberships
    Member {
        #[command(subcommand)]
        member_cmd: MemberCommand,
    },
    /// Check whether a user or a group set holds permissions
    Check(CheckArgs),
}

#[derive(Subcommand)]
pub enum GrantCommand {
    /// Grant a permission to a group, or deny it with --deny
    Set {
        group: i64,
        permission: i64,
        /// Record an explicit denial instead of a grant
        #[arg(long)]
        deny: bool,
    },
    /// Remove a group's grant or denial
    Unset { group: i64, permission: i64 },
    /// List grants of a group or of a permission
    List {
        #[arg(long, conflicts_with = "permission", required_unless_present = "permission")]
        group: Option<i64>,
        #[arg(long)]
        permission: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum MemberCommand {
    /// Add a user to a group
    Add {
        user: i64,
        group: i64,
        /// Rank of the group for this user (defaults to below the lowest)
        #[arg(long, allow_negative_numbers = true)]
        significance: Option<i64>,
    },
    /// Remove a user from a group
    Remove { user: i64, group: i64 },
    /// Change the rank of a user's group
    Rank {
        user: i64,
        group: i64,
        #[arg(allow_negative_numbers = true)]
        significance: i64,
    },
    /// List a user's groups
    Groups {
        user: i64,
        /// significance, group_id, user_id or id
        #[arg(long, default_value = "significance")]
        order_by: MembershipOrder,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        direction: SortDirection,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// List the members of a group
    Users {
        group: i64,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
}

#[derive(Args)]
pub struct CheckArgs {
    /// Resolve through this user's memberships
    #[arg(long, conflicts_with = "groups", required_unless_present = "groups")]
    pub user: Option<i64>,

    /// Resolve against these groups, in precedence order
    #[arg(long = "group", value_delimiter = ',')]
    pub groups: Vec<i64>,

    /// Report permissions no group had an opinion on instead of denying
    #[arg(long)]
    pub residual: bool,

    /// Permission ids to check
    #[arg(required = true, num_args = 1..)]
    pub permissions: Vec<i64>,
}
