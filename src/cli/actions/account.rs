use crate::{
    api::auth::{self, validate_registration},
    cli::{actions::client::Client, globals::GlobalArgs},
    session::SessionState,
    transport::Transport,
};
use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub enum Command {
    WhoAmI,
    Login,
    Logout,
    Register { confirm: SecretString },
    CheckUser { username: String },
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Execute an account action.
/// # Errors
/// Returns an error if the API call fails or required arguments are missing.
pub async fn execute(args: Args) -> Result<()> {
    let client = Client::connect(&args.globals)?;
    let output = run(&client, &args.globals, args.command).await?;
    println!("{output}");
    Ok(())
}

pub(crate) async fn run<T: Transport>(client: &Client<T>, globals: &GlobalArgs, command: Command) -> Result<String> {
    match command {
        Command::WhoAmI => match client.resume(globals).await? {
            SessionState::Authenticated(claims) => Ok(format!("{} ({})", claims.sub, claims.role)),
            _ => Ok("not signed in".to_string()),
        },
        Command::Login => {
            let (username, password) = globals
                .credentials()
                .context("login requires --username and --password")?;
            client.sign_in(username, password.expose_secret()).await?;
            let claims = client.session.claims().context("session was not established")?;
            Ok(format!("signed in as {} ({})", claims.sub, claims.role))
        }
        Command::Logout => {
            client.session.logout().await;
            Ok("signed out".to_string())
        }
        Command::Register { confirm } => {
            let (username, password) = globals
                .credentials()
                .context("register requires --username and --password")?;
            validate_registration(username, password.expose_secret(), confirm.expose_secret())?;
            if auth::username_taken(&client.gateway, username).await? {
                bail!("Username is already taken.");
            }
            let user = auth::register(&client.gateway, username, password.expose_secret()).await?;
            Ok(format!("registered {}", user.username))
        }
        Command::CheckUser { username } => {
            let taken = auth::username_taken(&client.gateway, &username).await?;
            Ok(format!("{username} is {}", if taken { "taken" } else { "available" }))
        }
    }
}
