use crate::commands::{execute, open_storage, CommandResult};

pub fn run() -> CommandResult {
    execute("migrate", |config| async move {
        let pool = open_storage(&config).await?;
        pool.close().await;
        Ok(format!("applied pending migrations to {}", config.storage.url))
    })
}
