use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "aclsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile Databricks object permissions with a declared state")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Workspace URL
    #[arg(long, env = "DATABRICKS_HOST", global = true)]
    pub host: Option<String>,

    /// Personal access token
    #[arg(long, env = "DATABRICKS_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "60", global = true)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Make live permissions match the declared state
    Apply(ApplyArgs),

    /// Check declarations without contacting the workspace
    Validate(ConfigArgs),

    /// Show the direct grants on one object
    Read {
        /// Object path, e.g. /clusters/0123-456789-abc
        object: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reset an object's grants to administrators plus owner
    Reset {
        /// Object path, e.g. /jobs/123
        object: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List supported object types and their identifier fields
    Types,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Declarative
// ============================================================================

#[derive(Parser)]
pub struct ConfigArgs {
    /// Permissions file (default: ~/.config/aclsync/permissions.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Only this declaration (by name or identifier)
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct PlanArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of parallel requests
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,
}

#[derive(Parser)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of parallel requests
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,

    /// Show the plan without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Stop issuing requests after the first failure
    #[arg(long)]
    pub fail_fast: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from([
            "aclsync",
            "--host",
            "example.com",
            "apply",
            "--jobs",
            "8",
            "--fail-fast",
            "-t",
            "etl",
        ])
        .unwrap();
        assert_eq!(cli.host.as_deref(), Some("example.com"));
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.jobs, 8);
        assert!(args.fail_fast);
        assert_eq!(args.config.target.as_deref(), Some("etl"));
    }

    #[test]
    fn test_parse_read() {
        let cli =
            Cli::try_parse_from(["aclsync", "read", "/clusters/abc", "--json", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Read { json: true, .. }));
    }
}
