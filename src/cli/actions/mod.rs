pub mod watch;

// Internal "interpreter" for `Action`; new variants get their arm in `run::execute`.
mod run;

#[derive(Debug)]
pub enum Action {
    Watch(watch::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
