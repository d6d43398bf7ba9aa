use anyhow::{Context, Result, bail};
use clap::{Arg, ArgMatches, Command};
use url::Url;

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_LANDING_PATH: &str = "landing-path";
pub const ARG_LOGIN_PATH: &str = "login-path";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub frontend_base_url: String,
    pub landing_path: String,
    pub login_path: String,
    pub session_ttl_seconds: i64,
}

impl Options {
    /// Read the auth options from validated matches.
    ///
    /// # Errors
    /// Returns an error if the frontend URL is not http(s), a redirect target
    /// is not an absolute path, or the session TTL is not positive.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .context("missing required argument: --frontend-base-url")?;
        let url = Url::parse(&frontend_base_url).context("invalid --frontend-base-url")?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("--frontend-base-url must use http or https");
        }

        let landing_path = redirect_path(matches, ARG_LANDING_PATH)?;
        let login_path = redirect_path(matches, ARG_LOGIN_PATH)?;

        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .context("missing required argument: --session-ttl-seconds")?;
        if session_ttl_seconds <= 0 {
            bail!("--session-ttl-seconds must be positive");
        }

        Ok(Self {
            frontend_base_url,
            landing_path,
            login_path,
            session_ttl_seconds,
        })
    }
}

fn redirect_path(matches: &ArgMatches, arg: &str) -> Result<String> {
    let path = matches
        .get_one::<String>(arg)
        .cloned()
        .with_context(|| format!("missing required argument: --{arg}"))?;
    // Only same-site redirects; `//host` would leave the site.
    if !path.starts_with('/') || path.starts_with("//") {
        bail!("--{arg} must be an absolute path");
    }
    Ok(path)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long("frontend-base-url")
                .help("Public base URL; cookies are marked Secure when it is https")
                .env("INGRESSO_FRONTEND_BASE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new(ARG_LANDING_PATH)
                .long("landing-path")
                .help("Where to redirect after registration and login")
                .env("INGRESSO_LANDING_PATH")
                .default_value("/"),
        )
        .arg(
            Arg::new(ARG_LOGIN_PATH)
                .long("login-path")
                .help("Where to redirect after logout")
                .env("INGRESSO_LOGIN_PATH")
                .default_value("/login"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long("session-ttl-seconds")
                .help("Session cookie TTL in seconds")
                .env("INGRESSO_SESSION_TTL_SECONDS")
                .default_value("1209600")
                .value_parser(clap::value_parser!(i64)),
        )
}
