use crate::cli::actions::{account, admin, tasks, Action};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Account(args) => account::execute(args).await,
        Action::Tasks(args) => tasks::execute(args).await,
        Action::Admin(args) => admin::execute(args).await,
    }
}
