use crate::{
    api::{tasks, Task, TaskInput},
    cli::{actions::client::Client, globals::GlobalArgs},
    transport::Transport,
};
use anyhow::Result;
use std::fmt::Write as _;

/// Route whose guard protects the task commands.
pub const ROUTE: &str = "/dashboard/tasks";

#[derive(Debug)]
pub enum Command {
    List { page: u64, page_size: u64 },
    Get { id: i64 },
    Add(TaskInput),
    Update { id: i64, input: TaskInput },
    Delete { id: i64 },
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Execute a task action.
/// # Errors
/// Returns an error if the session cannot be established or the API call fails.
pub async fn execute(args: Args) -> Result<()> {
    let client = Client::connect(&args.globals)?;
    let output = run(&client, &args.globals, args.command).await?;
    println!("{output}");
    Ok(())
}

fn line(task: &Task) -> String {
    format!("#{:<5} {}  {}", task.id, task.date, task.task)
}

pub(crate) async fn run<T: Transport>(client: &Client<T>, globals: &GlobalArgs, command: Command) -> Result<String> {
    client.resume(globals).await?;
    client.authorize(ROUTE)?;

    let gateway = &client.gateway;
    let output = match command {
        Command::List { page, page_size } => {
            let page = tasks::list(gateway, page, page_size).await?;
            let mut output = String::new();
            for task in &page.tasks {
                writeln!(output, "{}", line(task))?;
            }
            write!(
                output,
                "page {}/{} ({} tasks)",
                page.page, page.total_pages, page.total
            )?;
            output
        }
        Command::Get { id } => line(&tasks::get(gateway, id).await?),
        Command::Add(input) => format!("created {}", line(&tasks::create(gateway, &input).await?)),
        Command::Update { id, input } => {
            format!("updated {}", line(&tasks::update(gateway, id, &input).await?))
        }
        Command::Delete { id } => format!("deleted {}", line(&tasks::delete(gateway, id).await?)),
    };
    Ok(output)
}
