pub mod connection;
pub mod logging;
pub mod tasks;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_REGISTER: &str = "register";
pub const CMD_CHECK_USER: &str = "check-user";
pub const CMD_ADMIN: &str = "admin";
pub const ARG_CONFIRM: &str = "confirm";

fn account_subcommands(command: Command) -> Command {
    command
        .subcommand(Command::new(CMD_WHOAMI).about("Show the signed-in user"))
        .subcommand(Command::new(CMD_LOGIN).about("Sign in with --username and --password"))
        .subcommand(Command::new(CMD_LOGOUT).about("Sign out and forget the session"))
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create an account with --username and --password")
                .arg(
                    Arg::new(ARG_CONFIRM)
                        .long(ARG_CONFIRM)
                        .help("Password confirmation")
                        .env("TASKDESK_PASSWORD_CONFIRM")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(CMD_CHECK_USER)
                .about("Check whether a username is taken")
                .arg(Arg::new("name").help("Username to check").required(true)),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("taskdesk")
        .about("Task manager client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true);

    let command = account_subcommands(command)
        .subcommand(tasks::subcommand())
        .subcommand(
            Command::new(CMD_ADMIN)
                .about("Administration, admin role required")
                .subcommand_required(true)
                .subcommand(Command::new("users").about("List every account")),
        );

    let command = connection::with_args(command);
    logging::with_args(command)
}
