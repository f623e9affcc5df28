//! Integration tests for `FileQuestStore`.

use chrono::Utc;
use encounter_core::ids::PlayerId;
use encounter_core::store::{QuestStore, StoredRecord};
use encounter_store::file_quest_store::FileQuestStore;

fn make_record(player_id: PlayerId, progress: u32) -> StoredRecord {
    StoredRecord {
        player_id,
        payload: serde_json::json!({"active": {"progress": progress}, "available": []}),
        saved_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_documents_survive_reopening_the_store() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let player = PlayerId::new();
    let saved = make_record(player, 4);
    {
        let store = FileQuestStore::open(dir.path()).await.unwrap();
        store.save(saved.clone()).await.unwrap();
    }

    // Act
    let reopened = FileQuestStore::open(dir.path()).await.unwrap();
    let loaded = reopened.load(player).await.unwrap().unwrap();
    let players = reopened.list_players().await.unwrap();

    // Assert
    assert_eq!(loaded.player_id, player);
    assert_eq!(loaded.payload, saved.payload);
    assert_eq!(loaded.saved_at, saved.saved_at);
    assert_eq!(players, vec![player]);
}

#[tokio::test]
async fn test_players_are_stored_independently() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileQuestStore::open(dir.path()).await.unwrap();
    let first = PlayerId::new();
    let second = PlayerId::new();

    store.save(make_record(first, 1)).await.unwrap();
    store.save(make_record(second, 7)).await.unwrap();

    let loaded = store.load(first).await.unwrap().unwrap();
    assert_eq!(loaded.payload["active"]["progress"], 1);
    assert_eq!(store.list_players().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_players_on_empty_directory_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileQuestStore::open(dir.path()).await.unwrap();

    assert!(store.list_players().await.unwrap().is_empty());
}
