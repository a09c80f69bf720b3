//! Arguments shared by every command: where the API lives, where the session
//! record is kept, and the credentials used when no session is remembered.

use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STATE_FILE: &str = "state-file";
pub const ARG_TIMEOUT: &str = "timeout";
pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Task API base URL")
                .env("TASKDESK_API_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE_FILE)
                .long(ARG_STATE_FILE)
                .help("Where the signed-in identity is remembered")
                .env("TASKDESK_STATE_FILE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds (none by default)")
                .env("TASKDESK_TIMEOUT_SECONDS")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_USERNAME)
                .short('u')
                .long(ARG_USERNAME)
                .help("Username used to sign in when no session is active")
                .env("TASKDESK_USERNAME")
                .global(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .short('p')
                .long(ARG_PASSWORD)
                .help("Password used to sign in when no session is active")
                .env("TASKDESK_PASSWORD")
                .hide_env_values(true)
                .global(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub api_url: Option<String>,
    pub state_file: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl Options {
    /// Parse connection arguments from matches.
    ///
    /// # Errors
    /// Returns an error if only one half of the credentials is supplied.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        // clap passes through empty env vars
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let username = get_non_empty(ARG_USERNAME);
        let password = get_non_empty(ARG_PASSWORD).map(SecretString::from);
        if username.is_some() != password.is_some() {
            anyhow::bail!("--{ARG_USERNAME} and --{ARG_PASSWORD} must be given together");
        }

        Ok(Self {
            api_url: get_non_empty(ARG_API_URL),
            state_file: get_non_empty(ARG_STATE_FILE),
            timeout_seconds: matches.get_one::<u64>(ARG_TIMEOUT).copied(),
            username,
            password,
        })
    }
}
