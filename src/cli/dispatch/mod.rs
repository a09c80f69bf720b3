//! Maps validated CLI matches to an action with its resolved configuration.

use crate::{
    api::TaskInput,
    cli::{
        actions::{account, admin, tasks, Action},
        commands::{self, connection, tasks as task_args},
        globals::GlobalArgs,
    },
    config::{AppConfig, Overrides},
};
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;

fn globals(matches: &ArgMatches) -> Result<GlobalArgs> {
    let options = connection::Options::parse(matches)?;

    let mut config = AppConfig::load();
    config.apply(Overrides {
        api_base_url: options.api_url,
        state_file: options.state_file,
        timeout_seconds: options.timeout_seconds,
    });

    let mut globals = GlobalArgs::new(config);
    if let (Some(username), Some(password)) = (options.username, options.password) {
        globals.set_credentials(username, password);
    }
    Ok(globals)
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(id)
        .with_context(|| format!("missing required argument: {id}"))
}

fn task_input(matches: &ArgMatches) -> Result<TaskInput> {
    Ok(TaskInput {
        desc: required(matches, task_args::ARG_DESC)?.clone(),
        date: required(matches, task_args::ARG_DATE)?.clone(),
    })
}

fn task_id(matches: &ArgMatches) -> Result<i64> {
    matches
        .get_one::<i64>(task_args::ARG_ID)
        .copied()
        .context("missing required argument: id")
}

fn task_command(matches: &ArgMatches) -> Result<tasks::Command> {
    Ok(match matches.subcommand() {
        Some(("list", sub)) => tasks::Command::List {
            page: sub.get_one::<u64>(task_args::ARG_PAGE).copied().unwrap_or(1),
            page_size: sub
                .get_one::<u64>(task_args::ARG_PAGE_SIZE)
                .copied()
                .unwrap_or(crate::api::tasks::DEFAULT_PAGE_SIZE),
        },
        Some(("get", sub)) => tasks::Command::Get { id: task_id(sub)? },
        Some(("add", sub)) => tasks::Command::Add(task_input(sub)?),
        Some(("update", sub)) => tasks::Command::Update {
            id: task_id(sub)?,
            input: task_input(sub)?,
        },
        Some(("delete", sub)) => tasks::Command::Delete { id: task_id(sub)? },
        _ => bail!("unknown tasks command"),
    })
}

fn account_action(globals: GlobalArgs, command: account::Command) -> Action {
    Action::Account(account::Args { globals, command })
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let globals = globals(matches)?;

    match matches.subcommand() {
        Some((commands::CMD_WHOAMI, _)) => Ok(account_action(globals, account::Command::WhoAmI)),
        Some((commands::CMD_LOGIN, _)) => Ok(account_action(globals, account::Command::Login)),
        Some((commands::CMD_LOGOUT, _)) => Ok(account_action(globals, account::Command::Logout)),
        Some((commands::CMD_REGISTER, sub)) => {
            let confirm = SecretString::from(required(sub, commands::ARG_CONFIRM)?.clone());
            Ok(account_action(globals, account::Command::Register { confirm }))
        }
        Some((commands::CMD_CHECK_USER, sub)) => {
            let username = required(sub, "name")?.clone();
            Ok(account_action(globals, account::Command::CheckUser { username }))
        }
        Some((task_args::CMD_TASKS, sub)) => Ok(Action::Tasks(tasks::Args {
            command: task_command(sub)?,
            globals,
        })),
        Some((commands::CMD_ADMIN, sub)) => match sub.subcommand_name() {
            Some("users") => Ok(Action::Admin(admin::Args {
                globals,
                command: admin::Command::Users,
            })),
            _ => bail!("unknown admin command"),
        },
        _ => bail!("no command given"),
    }
}
