use clap::{Arg, Command};

pub const CMD_TASKS: &str = "tasks";
pub const ARG_ID: &str = "id";
pub const ARG_PAGE: &str = "page";
pub const ARG_PAGE_SIZE: &str = "page-size";
pub const ARG_DESC: &str = "desc";
pub const ARG_DATE: &str = "date";

fn id_arg() -> Arg {
    Arg::new(ARG_ID)
        .help("Task id")
        .required(true)
        .value_parser(clap::value_parser!(i64))
}

fn body_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DESC)
                .long(ARG_DESC)
                .help("Task description")
                .required(true),
        )
        .arg(
            Arg::new(ARG_DATE)
                .long(ARG_DATE)
                .help("Due date, YYYY-MM-DD")
                .required(true),
        )
}

#[must_use]
pub fn subcommand() -> Command {
    Command::new(CMD_TASKS)
        .about("Manage your tasks")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List one page of tasks")
                .arg(
                    Arg::new(ARG_PAGE)
                        .long(ARG_PAGE)
                        .help("Page number, starting at 1")
                        .default_value("1")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new(ARG_PAGE_SIZE)
                        .long(ARG_PAGE_SIZE)
                        .help("Tasks per page")
                        .default_value("10")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
        .subcommand(Command::new("get").about("Show a task").arg(id_arg()))
        .subcommand(body_args(Command::new("add").about("Create a task")))
        .subcommand(body_args(
            Command::new("update").about("Replace a task").arg(id_arg()),
        ))
        .subcommand(Command::new("delete").about("Delete a task").arg(id_arg()))
}
