//! Integration tests for `DatabaseStateStore` against a scratch sqlite file.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use cafebot_core::store::{self, StateKey};
use cafebot_core::{DialogFrame, DialogStack, StateStore};
use cafebot_store::DatabaseStateStore;
use serde_json::json;

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

struct ScratchDb {
    path: PathBuf,
}

impl ScratchDb {
    fn new() -> Self {
        let n = NEXT_DB.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "cafebot-store-test-{}-{n}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        Self { path }
    }

    fn url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path.display())
    }
}

impl Drop for ScratchDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[tokio::test]
async fn set_get_delete_round_trip() {
    let scratch = ScratchDb::new();
    let store = DatabaseStateStore::connect(&scratch.url())
        .await
        .expect("database should open");

    assert!(store.get("missing").await.expect("get").is_none());

    store
        .set("user/u1/profile", json!({ "name": "Ada" }))
        .await
        .expect("insert");
    store
        .set("user/u1/profile", json!({ "name": "Grace" }))
        .await
        .expect("update");

    assert_eq!(
        store.get("user/u1/profile").await.expect("get"),
        Some(json!({ "name": "Grace" }))
    );
    assert_eq!(store.keys().await.expect("keys"), vec!["user/u1/profile"]);

    store.delete("user/u1/profile").await.expect("delete");
    assert!(store.get("user/u1/profile").await.expect("get").is_none());
}

#[tokio::test]
async fn state_survives_reconnect() {
    let scratch = ScratchDb::new();
    let key = StateKey::DialogStack("conv-9").to_string();

    let mut stack = DialogStack::new();
    stack.push(DialogFrame::new("BookTable"));

    {
        let store = DatabaseStateStore::connect(&scratch.url())
            .await
            .expect("database should open");
        store::save(&store, &key, &stack).await.expect("save");
    }

    // Second connect hits the existing table.
    let store = DatabaseStateStore::connect(&scratch.url())
        .await
        .expect("database should reopen");
    let loaded: Option<DialogStack> = store::load(&store, &key).await.expect("load");

    assert_eq!(loaded, Some(stack));
}
