use movemate_client::drafts::DraftStore;
use movemate_core::domain::draft::Draft;

use crate::commands::{api_transport, draft_repository, execute, open_storage, CommandResult};

pub fn list() -> CommandResult {
    execute("drafts.list", |config| async move {
        let pool = open_storage(&config).await?;
        let transport = api_transport(&config)?;
        let store = DraftStore::open(draft_repository(&pool), transport)
            .await
            .map_err(|error| ("storage", error.to_string(), 4u8))?;

        let drafts = store.book().all();
        let mut lines = vec![format!("{} drafts", drafts.len())];
        lines.extend(drafts.into_iter().map(render_draft));
        pool.close().await;
        Ok(lines.join("\n"))
    })
}

pub fn sync(user_id: Option<String>) -> CommandResult {
    execute("drafts.sync", |config| async move {
        let Some(user_id) = user_id.or_else(|| config.api.user_id.clone()) else {
            return Err((
                "missing_user_id",
                "pass --user-id or set api.user_id".to_string(),
                2u8,
            ));
        };

        let pool = open_storage(&config).await?;
        let transport = api_transport(&config)?;
        let mut store = DraftStore::open(draft_repository(&pool), transport)
            .await
            .map_err(|error| ("storage", error.to_string(), 4u8))?;
        let remote = store
            .fetch_remote(&user_id)
            .await
            .map_err(|error| ("remote", error.to_string(), 5u8))?;

        let mut lines = vec![format!("fetched {} api drafts for {user_id}", remote.len())];
        lines.extend(remote.iter().map(render_draft));
        pool.close().await;
        Ok(lines.join("\n"))
    })
}

pub fn clear_local() -> CommandResult {
    execute("drafts.clear_local", |config| async move {
        let pool = open_storage(&config).await?;
        let transport = api_transport(&config)?;
        let mut store = DraftStore::open(draft_repository(&pool), transport)
            .await
            .map_err(|error| ("storage", error.to_string(), 4u8))?;
        let removed =
            store.clear_local_only().await.map_err(|error| ("storage", error.to_string(), 4u8))?;
        pool.close().await;
        Ok(format!("removed {removed} local drafts"))
    })
}

fn render_draft(draft: &Draft) -> String {
    let contact = draft.data.contact.contact_name.trim();
    format!(
        "  - {} [{}] {} {} (last modified {})",
        draft.id,
        draft.source.as_str(),
        draft.data.request_type.as_str(),
        if contact.is_empty() { "<no contact>" } else { contact },
        draft.last_modified.to_rfc3339()
    )
}
