//! Session lifecycle against the file-backed store: create, persist,
//! restore, and the two cleanup paths.

use std::sync::Arc;

use callguide::extract::CapturedInfoUpdate;
use callguide::journey::Segment;
use callguide::machine::Station;
use callguide::session::{FileSessionStore, SessionManager, SessionStore};

fn file_backed_manager(dir: &std::path::Path) -> SessionManager {
    SessionManager::new(Arc::new(FileSessionStore::new(dir)) as Arc<dyn SessionStore>)
}

#[tokio::test]
async fn create_is_idempotent_and_counts_once() {
    let dir = tempfile::tempdir().unwrap();
    let manager = file_backed_manager(dir.path());

    let first = manager.create_session("call-1", Some("+447700900001")).await;
    let second = manager.create_session("call-1", Some("+447700900099")).await;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.get_active_session_count(), 1);
    assert_eq!(manager.get_active_session_ids(), vec!["call-1".to_string()]);
    // The original phone number wins.
    assert!(manager.find_session_by_phone("+447700900001").is_some());
    assert!(manager.find_session_by_phone("+447700900099").is_none());
}

#[tokio::test]
async fn session_restores_across_managers() {
    let dir = tempfile::tempdir().unwrap();

    {
        let manager = file_backed_manager(dir.path());
        let machine = manager.create_session("call-1", Some("+447700900001")).await;
        {
            let mut machine = machine.lock().await;
            machine.update_captured_info(&CapturedInfoUpdate {
                job: Some("boiler service".to_string()),
                postcode: Some("SW11 2AB".to_string()),
                ..Default::default()
            });
            machine.confirm_station().unwrap();
            machine.confirm_segment(Segment::Landlord);
        }
        manager.end_session("call-1").await.unwrap();
    }

    // A fresh manager, as after a process restart.
    let manager = file_backed_manager(dir.path());
    assert!(!manager.has_session("call-1"));

    let restored = manager.restore_session("call-1").await.unwrap().unwrap();
    let restored = restored.lock().await;
    assert_eq!(restored.current_station(), Station::Segment);
    assert_eq!(restored.state().detected_segment, Some(Segment::Landlord));
    assert_eq!(
        restored.state().captured_info.postcode.as_deref(),
        Some("SW11 2AB")
    );
}

#[tokio::test]
async fn stale_eviction_snapshots_first() {
    let dir = tempfile::tempdir().unwrap();
    let manager = file_backed_manager(dir.path());

    let machine = manager.create_session("call-1", None).await;
    machine
        .lock()
        .await
        .update_captured_info(&CapturedInfoUpdate {
            job: Some("leaking tap".to_string()),
            ..Default::default()
        });
    manager.create_session("call-2", None).await;

    let evicted = manager.cleanup_stale_sessions(chrono::Duration::zero()).await;
    assert_eq!(evicted, 2);
    assert_eq!(manager.get_active_session_count(), 0);

    // The evicted call's latest state made it to disk.
    let restored = manager.restore_session("call-1").await.unwrap().unwrap();
    assert_eq!(
        restored.lock().await.state().captured_info.job.as_deref(),
        Some("leaking tap")
    );
}

#[tokio::test]
async fn retention_sweep_removes_only_expired_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let manager = file_backed_manager(dir.path());

    manager.create_session("old-call", None).await;
    manager.end_session("old-call").await.unwrap();
    manager.create_session("fresh-call", None).await;
    manager.end_session("fresh-call").await.unwrap();

    // Backdate the old snapshot on disk.
    let old_path = dir.path().join("old-call.json");
    let json = std::fs::read_to_string(&old_path).unwrap();
    let stale_stamp = (chrono::Utc::now() - chrono::Duration::hours(48)).to_rfc3339();
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value["updatedAt"] = serde_json::Value::String(stale_stamp);
    std::fs::write(&old_path, serde_json::to_string(&value).unwrap()).unwrap();

    let removed = manager
        .cleanup_old_db_sessions(chrono::Duration::hours(24))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(!old_path.exists());
    assert!(dir.path().join("fresh-call.json").exists());
}

#[tokio::test]
async fn get_or_create_prefers_the_stored_session() {
    let dir = tempfile::tempdir().unwrap();
    let manager = file_backed_manager(dir.path());

    let machine = manager.create_session("call-1", None).await;
    machine
        .lock()
        .await
        .update_captured_info(&CapturedInfoUpdate {
            job: Some("boiler service".to_string()),
            ..Default::default()
        });
    manager.end_session("call-1").await.unwrap();

    let machine = manager.get_or_create_session("call-1", None).await;
    assert_eq!(
        machine.lock().await.state().captured_info.job.as_deref(),
        Some("boiler service")
    );
}

#[tokio::test]
async fn background_sweep_runs_on_its_interval() {
    let dir = tempfile::tempdir().unwrap();
    let manager = Arc::new(file_backed_manager(dir.path()));
    manager.create_session("call-1", None).await;

    manager.start_cleanup_interval(
        std::time::Duration::from_millis(50),
        chrono::Duration::zero(),
        chrono::Duration::hours(24),
    );

    // Give the sweep a couple of intervals to run.
    let mut waited = 0;
    while manager.get_active_session_count() > 0 && waited < 2000 {
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        waited += 25;
    }

    assert_eq!(manager.get_active_session_count(), 0);
    // The evicted session is still recoverable from disk.
    assert!(manager.restore_session("call-1").await.unwrap().is_some());
    manager.stop_cleanup_interval();
}
