//! gatekeep - stateless access/refresh token authentication server

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gatekeep_api::{ApiServer, ApiServerConfig, AppState, CookieConfig};
use gatekeep_auth::{InMemoryIdentityStore, TokenConfig, TokenKeys};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// gatekeep - issue, verify and refresh short-lived credentials
#[derive(Parser, Debug)]
#[command(name = "gatekeep")]
#[command(about = "gatekeep - issue, verify and refresh short-lived credentials")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    #[command(long_about = r#"
Run the HTTP API: login, logout, refresh and the protected session endpoint.

EXAMPLES:
  gatekeep serve \
    --access-secret "$ACCESS_SECRET" \
    --refresh-secret "$REFRESH_SECRET" \
    --user "u1:alice@example.com:correct-horse"

ENVIRONMENT VARIABLES:
  GATEKEEP_BIND             Address to listen on
  GATEKEEP_ACCESS_SECRET    Secret for access tokens
  GATEKEEP_REFRESH_SECRET   Secret for refresh tokens (must differ)
  GATEKEEP_ACCESS_TTL       Access token lifetime in seconds
  GATEKEEP_REFRESH_TTL      Refresh token lifetime in seconds
  GATEKEEP_USERS            Principals, ';'-separated id:email:password entries
    "#)]
    Serve {
        /// Address to listen on
        #[arg(long, env = "GATEKEEP_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Secret signature for access tokens
        #[arg(long, env = "GATEKEEP_ACCESS_SECRET", hide_env_values = true)]
        access_secret: String,

        /// Secret signature for refresh tokens
        #[arg(long, env = "GATEKEEP_REFRESH_SECRET", hide_env_values = true)]
        refresh_secret: String,

        /// Access token lifetime in seconds
        #[arg(long, env = "GATEKEEP_ACCESS_TTL", default_value = "3600")]
        access_ttl: i64,

        /// Refresh token lifetime in seconds
        #[arg(long, env = "GATEKEEP_REFRESH_TTL", default_value = "7200")]
        refresh_ttl: i64,

        /// Max-age of the access token cookie in seconds
        #[arg(long, env = "GATEKEEP_ACCESS_COOKIE_MAX_AGE", default_value = "1209600")]
        access_cookie_max_age: i64,

        /// Max-age of the refresh token cookie in seconds
        #[arg(long, env = "GATEKEEP_REFRESH_COOKIE_MAX_AGE", default_value = "1209600")]
        refresh_cookie_max_age: i64,

        /// Drop the Secure cookie attribute (plain-HTTP local development only)
        #[arg(long)]
        insecure_cookies: bool,

        /// Disable CORS
        #[arg(long)]
        no_cors: bool,

        /// Principal as id:email:password (repeatable)
        #[arg(
            long = "user",
            env = "GATEKEEP_USERS",
            value_delimiter = ';',
            hide_env_values = true
        )]
        users: Vec<String>,
    },
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Parse `id:email:password`. The password may itself contain ':'.
fn parse_user(entry: &str) -> Result<(&str, &str, &str)> {
    let mut parts = entry.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(id), Some(email), Some(password))
            if !id.is_empty() && !email.is_empty() && !password.is_empty() =>
        {
            Ok((id, email, password))
        }
        _ => bail!("Invalid user entry, expected id:email:password"),
    }
}

fn lifetime_from_secs(secs: i64, flag: &str) -> Result<chrono::Duration> {
    chrono::Duration::try_seconds(secs).with_context(|| format!("{} is out of range", flag))
}

fn build_identity_store(users: &[String]) -> Result<InMemoryIdentityStore> {
    let mut store =
        InMemoryIdentityStore::new().context("Failed to initialise identity store")?;
    for entry in users {
        let (id, email, password) = parse_user(entry)?;
        store = store
            .with_principal(id, email, password)
            .with_context(|| format!("Failed to register principal '{}'", id))?;
    }
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            bind,
            access_secret,
            refresh_secret,
            access_ttl,
            refresh_ttl,
            access_cookie_max_age,
            refresh_cookie_max_age,
            insecure_cookies,
            no_cors,
            users,
        } => {
            info!("gatekeep starting...");

            let token_config = TokenConfig::new(
                access_secret,
                refresh_secret,
                lifetime_from_secs(access_ttl, "--access-ttl")?,
                lifetime_from_secs(refresh_ttl, "--refresh-ttl")?,
            )
            .context("Invalid token configuration")?;
            info!(
                "Access token lifetime: {}s, refresh token lifetime: {}s",
                access_ttl, refresh_ttl
            );

            let store = build_identity_store(&users)?;
            if store.is_empty() {
                warn!("No principals configured; every login will be rejected");
            } else {
                info!("Loaded {} principal(s)", store.len());
            }

            let cookies = CookieConfig {
                access_max_age: time::Duration::seconds(access_cookie_max_age),
                refresh_max_age: time::Duration::seconds(refresh_cookie_max_age),
                secure: !insecure_cookies,
            };
            if insecure_cookies {
                warn!("Secure cookie attribute disabled; do not use outside local development");
            }

            let keys = Arc::new(TokenKeys::new(&token_config));
            let state = AppState::new(Arc::new(store), keys, cookies);
            let server = ApiServer::new(
                ApiServerConfig {
                    bind_addr: bind,
                    enable_cors: !no_cors,
                },
                state,
            );

            server.start().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user() {
        assert_eq!(
            parse_user("u1:a@b.com:pw").unwrap(),
            ("u1", "a@b.com", "pw")
        );
        assert_eq!(
            parse_user("u1:a@b.com:p:w").unwrap(),
            ("u1", "a@b.com", "p:w")
        );
        assert!(parse_user("u1:a@b.com").is_err());
        assert!(parse_user("u1::pw").is_err());
    }

    #[test]
    fn test_lifetime_out_of_range() {
        assert_eq!(
            lifetime_from_secs(3600, "--access-ttl").unwrap(),
            chrono::Duration::hours(1)
        );
        assert!(lifetime_from_secs(i64::MAX, "--refresh-ttl").is_err());
    }

    #[test]
    fn test_huge_ttl_fails_config_instead_of_panicking() {
        let refresh = lifetime_from_secs(10_000_000_000_000, "--refresh-ttl").unwrap();
        assert!(TokenConfig::new("a", "r", chrono::Duration::hours(1), refresh).is_err());
    }

    #[test]
    fn test_cli_parses_serve() {
        let cli = Cli::try_parse_from([
            "gatekeep",
            "serve",
            "--access-secret",
            "a",
            "--refresh-secret",
            "r",
            "--user",
            "u1:a@b.com:pw",
            "--user",
            "u2:c@d.com:pw2",
        ])
        .unwrap();

        match cli.command {
            Commands::Serve {
                users,
                access_ttl,
                refresh_ttl,
                ..
            } => {
                assert_eq!(users.len(), 2);
                assert_eq!(access_ttl, 3600);
                assert_eq!(refresh_ttl, 7200);
            }
        }
    }
}
