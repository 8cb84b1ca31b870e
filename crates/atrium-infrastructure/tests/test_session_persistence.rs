use atrium_core::chat::ChatSession;
use atrium_core::events::EventBus;
use atrium_core::guest::GuestIdentity;
use atrium_core::storage::KeyValueStore;
use atrium_infrastructure::FileKeyValueStore;
use std::sync::Arc;
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> Arc<dyn KeyValueStore> {
    Arc::new(FileKeyValueStore::new(dir.path().join("client-state.json")))
}

#[tokio::test]
async fn test_conversation_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut session = ChatSession::load(open_store(&temp_dir), EventBus::new())
            .await
            .unwrap();
        session
            .append_user_message("strategist", "How should we price the pilot?")
            .await
            .unwrap();
        let handle = session.begin_assistant_stream("strategist").await.unwrap();
        session
            .update_streaming_content(&handle, "Start with a fixed fee.")
            .await
            .unwrap();
        session.end_stream(&handle);
    }

    let session = ChatSession::load(open_store(&temp_dir), EventBus::new())
        .await
        .unwrap();
    let messages = session.conversation("strategist");

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "How should we price the pilot?");
    assert_eq!(messages[1].content, "Start with a fixed fee.");
    assert!(!session.is_streaming("strategist"));
}

#[tokio::test]
async fn test_guest_id_shares_file_with_conversations() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    let guest_id = GuestIdentity::new(store.clone()).get_or_create().await.unwrap();
    let mut session = ChatSession::load(store, EventBus::new()).await.unwrap();
    session.append_user_message("engineer", "hi").await.unwrap();

    let reopened = open_store(&temp_dir);
    let again = GuestIdentity::new(reopened.clone()).get_or_create().await.unwrap();
    assert_eq!(guest_id, again);

    let session = ChatSession::load(reopened, EventBus::new()).await.unwrap();
    assert_eq!(session.conversation("engineer").len(), 1);
}

#[tokio::test]
async fn test_corrupt_state_file_starts_fresh() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("client-state.json"), "not json").unwrap();

    let session = ChatSession::load(open_store(&temp_dir), EventBus::new())
        .await
        .unwrap();
    assert!(session.conversations().is_empty());
}
