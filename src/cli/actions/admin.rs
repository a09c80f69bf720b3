use crate::{
    api::admin,
    cli::{actions::client::Client, globals::GlobalArgs},
    transport::Transport,
};
use anyhow::Result;
use std::fmt::Write as _;

pub const ROUTE: &str = "/admin/users";

#[derive(Debug)]
pub enum Command {
    Users,
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Execute an admin action.
/// # Errors
/// Returns an error if the session lacks the admin role or the API call fails.
pub async fn execute(args: Args) -> Result<()> {
    let client = Client::connect(&args.globals)?;
    let output = run(&client, &args.globals, args.command).await?;
    println!("{output}");
    Ok(())
}

pub(crate) async fn run<T: Transport>(client: &Client<T>, globals: &GlobalArgs, command: Command) -> Result<String> {
    client.resume(globals).await?;
    client.authorize(ROUTE)?;

    match command {
        Command::Users => {
            let mut output = String::new();
            for user in admin::list_users(&client.gateway).await? {
                let status = if user.disabled { "disabled" } else { "active" };
                writeln!(output, "{:<5} {:<20} {:<6} {status}", user.id, user.username, user.role.as_str())?;
            }
            Ok(output.trim_end().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        session::testing::{ScriptedTransport, VALID_PASSWORD},
    };
    use secrecy::SecretString;

    fn globals(username: &str) -> GlobalArgs {
        let config = AppConfig {
            state_file: std::env::temp_dir()
                .join(format!("taskdesk-admin-{}", uuid::Uuid::new_v4()))
                .join("session.json"),
            ..AppConfig::default()
        };
        let mut globals = GlobalArgs::new(config);
        globals.set_credentials(username.to_string(), SecretString::from(VALID_PASSWORD));
        globals
    }

    #[tokio::test]
    async fn admin_lists_users() {
        let globals = globals("root");
        let client = Client::with_transport(ScriptedTransport::new(), &globals);

        let output = run(&client, &globals, Command::Users).await.expect("users");

        assert_eq!(output.lines().count(), 2);
        assert!(output.lines().next().is_some_and(|line| line.contains("root")));
        let _ = std::fs::remove_dir_all(globals.config.state_file.parent().unwrap_or(&globals.config.state_file));
    }

    #[tokio::test]
    async fn regular_user_is_redirected_without_a_request() {
        let globals = globals("alice");
        let client = Client::with_transport(ScriptedTransport::new(), &globals);

        let err = run(&client, &globals, Command::Users).await.expect_err("not admin");

        assert_eq!(err.to_string(), "/admin/users requires the admin role");
        assert_eq!(client.gateway.transport().calls(ROUTE), 0);
        let _ = std::fs::remove_dir_all(globals.config.state_file.parent().unwrap_or(&globals.config.state_file));
    }
}
