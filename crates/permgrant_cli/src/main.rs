//! permgrant CLI - run the permission-set assignment action outside a host.

mod commands;
mod config;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use permgrant::{AssignParams, AssignPermissionSet, HaltParams, JobContext};
use tracing_subscriber::EnvFilter;

use crate::commands::action::{RunOutcome, print_json, run_error, run_halt, run_invoke};

#[derive(Parser)]
#[command(name = "permgrant")]
#[command(version)]
#[command(about = "Assign a Salesforce permission set to a user")]
#[command(
    long_about = "permgrant resolves a Salesforce user by username and assigns a permission \
set to them. An assignment that already exists counts as success. It exposes the \
invoke/error/halt lifecycle of a host job framework as subcommands and prints each \
result as JSON on stdout."
)]
#[command(after_long_help = r#"EXAMPLES
    Assign a permission set using a bearer token:
        $ PERMGRANT_ENVIRONMENT__ADDRESS=https://acme.my.salesforce.com \
          PERMGRANT_SECRETS__BEARER_AUTH_TOKEN=00D... \
          permgrant invoke -u jane@acme.com -p 0PS5e000000abcdGAA

    Use a host-shaped context file:
        $ permgrant --context ctx.json invoke -u jane@acme.com -p 0PS5e000000abcdGAA

    Ask whether a failure should be retried:
        $ permgrant error -m "User lookup failed with status 503: unavailable"

CONFIGURATION
    permgrant reads configuration from:
      1. ~/.config/permgrant/config.toml (or $XDG_CONFIG_HOME/permgrant/config.toml)
      2. ./permgrant.toml
      3. Environment variables (PERMGRANT_* prefix, "__" between section and key)
      4. .env file in current directory

AUTHENTICATION (first match wins)
    PERMGRANT_SECRETS__BEARER_AUTH_TOKEN
    PERMGRANT_SECRETS__BASIC_USERNAME + PERMGRANT_SECRETS__BASIC_PASSWORD
    PERMGRANT_SECRETS__OAUTH2_CLIENT_CREDENTIALS_CLIENT_SECRET
        with PERMGRANT_ENVIRONMENT__OAUTH2_CLIENT_CREDENTIALS_TOKEN_URL
        and  PERMGRANT_ENVIRONMENT__OAUTH2_CLIENT_CREDENTIALS_CLIENT_ID
    PERMGRANT_SECRETS__OAUTH2_AUTHORIZATION_CODE_ACCESS_TOKEN
"#)]
pub(crate) struct Cli {
    /// Host context JSON file ({"environment": {...}, "secrets": {...}})
    #[arg(long, global = true)]
    context: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign the permission set (the job's main entry point)
    Invoke {
        /// Salesforce username
        #[arg(short, long)]
        username: String,

        /// Permission set id (0PS...)
        #[arg(short, long)]
        permission_set_id: String,

        /// Salesforce instance URL (overrides ADDRESS)
        #[arg(short, long)]
        address: Option<String>,

        /// REST API version (default from config or v61.0)
        #[arg(long)]
        api_version: Option<String>,
    },
    /// Classify a failure message: retry, fatal, or unrecoverable
    Error {
        /// The failure message from a previous invoke
        #[arg(short, long)]
        message: String,

        /// Username the failed job was working on
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Acknowledge a halted job
    Halt {
        /// Username the job was working on
        #[arg(short, long)]
        username: Option<String>,

        /// Why the job was halted
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("permgrant=info,permgrant_cli=info"),
    };

    // stdout carries the JSON result; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn job_context(
    cli_context: Option<&PathBuf>,
    config: &config::Config,
) -> Result<JobContext, Box<dyn std::error::Error>> {
    match cli_context {
        Some(path) => config::load_context_file(path),
        None => Ok(config.job_context()?),
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let config = config::Config::load()?;
    let ctx = job_context(cli.context.as_ref(), &config)?;
    let action = AssignPermissionSet::new(config.timeout())?;

    match cli.command {
        Commands::Invoke {
            username,
            permission_set_id,
            address,
            api_version,
        } => {
            let params = AssignParams {
                username,
                permission_set_id,
                address,
                api_version: api_version.or_else(|| config.salesforce.api_version.clone()),
            };
            match run_invoke(&action, params, &ctx, shutdown::interrupted()).await? {
                RunOutcome::Completed(output) => print_json(&output)?,
                RunOutcome::Halted(output) => {
                    print_json(&output)?;
                    return Ok(ExitCode::from(shutdown::INTERRUPTED_EXIT_CODE));
                }
            }
        }
        Commands::Error { message, username } => {
            let output = run_error(&action, message, username, &ctx).await?;
            print_json(&output)?;
        }
        Commands::Halt { username, reason } => {
            let output = run_halt(&action, HaltParams { username, reason }, &ctx).await?;
            print_json(&output)?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_invoke_arguments() {
        let cli = Cli::try_parse_from([
            "permgrant",
            "invoke",
            "-u",
            "jane@acme.com",
            "-p",
            "0PS1",
            "--api-version",
            "v60.0",
        ])
        .unwrap();

        match cli.command {
            Commands::Invoke {
                username,
                permission_set_id,
                address,
                api_version,
            } => {
                assert_eq!(username, "jane@acme.com");
                assert_eq!(permission_set_id, "0PS1");
                assert!(address.is_none());
                assert_eq!(api_version.as_deref(), Some("v60.0"));
            }
            _ => panic!("expected invoke"),
        }
    }

    #[test]
    fn invoke_requires_username_and_permission_set() {
        assert!(Cli::try_parse_from(["permgrant", "invoke", "-u", "jane@acme.com"]).is_err());
        assert!(Cli::try_parse_from(["permgrant", "invoke", "-p", "0PS1"]).is_err());
    }

    #[test]
    fn context_flag_is_global() {
        let cli = Cli::try_parse_from(["permgrant", "halt", "--context", "ctx.json"]).unwrap();
        assert_eq!(cli.context, Some(PathBuf::from("ctx.json")));
        assert!(matches!(
            cli.command,
            Commands::Halt {
                username: None,
                reason: None
            }
        ));
    }

    #[test]
    fn job_context_prefers_context_file() {
        let path = std::env::temp_dir().join(format!(
            "permgrant-main-context-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"secrets": {"BEARER_AUTH_TOKEN": "from-file"}}"#).unwrap();

        let config = config::Config::default();
        let ctx = job_context(Some(&path), &config).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ctx.secrets.bearer_auth_token.as_deref(), Some("from-file"));

        let ctx = job_context(None, &config).unwrap();
        assert!(ctx.secrets.bearer_auth_token.is_none());
    }
}
