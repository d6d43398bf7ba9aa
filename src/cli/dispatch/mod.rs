//! Map validated CLI matches to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_APPLY_SCHEMA, ARG_DSN, ARG_PORT, auth};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if an argument is missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches.get_one::<String>(ARG_DSN).cloned();
    let apply_schema = matches.get_flag(ARG_APPLY_SCHEMA);

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        apply_schema,
        frontend_base_url: auth_opts.frontend_base_url,
        landing_path: auth_opts.landing_path,
        login_path: auth_opts.login_path,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_action_without_dsn() {
        temp_env::with_vars(
            [
                ("INGRESSO_DSN", None::<&str>),
                ("INGRESSO_PORT", None),
                ("INGRESSO_FRONTEND_BASE_URL", None),
                ("INGRESSO_SESSION_TTL_SECONDS", None),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["ingresso"]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.dsn, None);
                    assert!(!args.apply_schema);
                    assert_eq!(args.session_ttl_seconds, 1_209_600);
                }
            },
        );
    }

    #[test]
    fn invalid_frontend_url_is_rejected() {
        temp_env::with_vars(
            [("INGRESSO_FRONTEND_BASE_URL", Some("mailto:someone@example.com"))],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["ingresso"]);
                let result = handler(&matches);
                assert!(result.is_err());
                if let Err(err) = result {
                    assert!(err.to_string().contains("http or https"));
                }
            },
        );
    }
}
