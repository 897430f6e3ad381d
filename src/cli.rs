use clap::{Parser, Subcommand};
use clap_complete::Shell;
use memberkit::MemberSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rolesync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative Nexus role assignments that leave other roles alone", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: <config dir>/rolesync.toml)
    #[arg(short, long, global = true, env = "ROLESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file (default: <state dir>/state.json)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(TargetArgs),

    /// Assign the declared roles, keeping roles granted elsewhere
    Apply(ApplyArgs),

    /// Remove every role rolesync assigned
    Destroy(DestroyArgs),

    /// Show recorded and remote state per user
    Status(TargetArgs),

    /// Show a user's profile and all of their roles
    Show {
        /// Nexus user id
        userid: String,
    },

    /// Adopt roles a user already has without writing to Nexus
    Import {
        /// Nexus user id
        userid: String,

        /// Roles to adopt (comma-separated); defaults to the declared roles
        #[arg(long, value_delimiter = ',')]
        roles: Option<Vec<String>>,
    },

    /// Drop a user from the state file; their roles stay assigned
    Forget {
        /// Nexus user id
        userid: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct TargetArgs {
    /// Limit to a resource type or user (e.g. "user_role", "jdoe", "user_role.jdoe")
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Limit to a resource type or user
    pub target: Option<String>,

    /// Show what would change without applying
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Limit to a resource type or user
    pub target: Option<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Turn `--roles a,b,a` into a set
pub fn role_set(roles: Option<Vec<String>>) -> Option<MemberSet> {
    roles.map(|r| r.into_iter().map(|s| s.trim().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from(["rolesync", "apply", "user_role.jdoe", "--dry-run", "-y"])
            .unwrap();
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.target.as_deref(), Some("user_role.jdoe"));
                assert!(args.dry_run);
                assert!(args.yes);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_parse_import_roles() {
        let cli = Cli::try_parse_from([
            "rolesync",
            "import",
            "jdoe",
            "--roles",
            "nx-dev, nx-deploy,nx-dev",
        ])
        .unwrap();
        match cli.command {
            Command::Import { userid, roles } => {
                assert_eq!(userid, "jdoe");
                let roles = role_set(roles).unwrap();
                assert_eq!(roles.len(), 2);
                assert!(roles.contains("nx-deploy"));
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "rolesync",
            "status",
            "-vv",
            "--state",
            "/tmp/state.json",
            "--config",
            "/tmp/rolesync.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.state, Some(PathBuf::from("/tmp/state.json")));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/rolesync.toml")));
    }
}
