//! Flagdeck Core Integration Tests

use flagdeck_core::{
    domain::audit::AuditEventKind,
    domain::flag::{FlagManager, FlagType},
    error::Error,
    storage::Database,
};
use uuid::Uuid;

async fn setup() -> FlagManager {
    let db = Database::in_memory()
        .await
        .expect("Failed to create test database");
    FlagManager::new(db.pool().clone())
}

#[tokio::test]
async fn test_full_revision_lifecycle() {
    let manager = setup().await;
    let org = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let flag = manager
        .create_flag(
            "dark-mode".to_string(),
            FlagType::Boolean,
            "false".to_string(),
            vec![],
            vec!["prod".to_string(), "staging".to_string()],
            org,
            actor,
        )
        .await
        .expect("Failed to create flag");
    assert_eq!(flag.version, 1);

    // Draft and ship a first revision.
    let r1 = manager
        .create_draft(flag.id, "true".to_string(), vec![], actor)
        .await
        .unwrap();
    let flag_v2 = manager.approve_revision(flag.id, r1.id, actor).await.unwrap();
    assert_eq!(flag_v2.version, 2);
    assert!(flag_v2.live_revision().unwrap().last_revision_id.is_none());

    // Ship a second; the first gets archived and backlinked.
    let r2 = manager
        .create_draft(flag.id, "false".to_string(), vec![], actor)
        .await
        .unwrap();
    let flag_v3 = manager.approve_revision(flag.id, r2.id, actor).await.unwrap();
    assert_eq!(flag_v3.version, 3);
    let live = flag_v3.live_revision().unwrap();
    assert_eq!(live.id, r2.id);
    assert_eq!(live.last_revision_id, Some(r1.id));

    // Rollback restores the first and decrements the counter.
    let restored = manager.rollback(flag.id, actor).await.unwrap();
    assert_eq!(restored.unwrap().id, r1.id);
    let current = manager.get(flag.id).await.unwrap();
    assert_eq!(current.version, 2);
    assert_eq!(current.live_revision().unwrap().id, r1.id);

    // One more rollback hits the chain start; nothing is live.
    let restored = manager.rollback(flag.id, actor).await.unwrap();
    assert!(restored.is_none());
    let current = manager.get(flag.id).await.unwrap();
    assert_eq!(current.version, 1);
    assert!(current.live_revision().is_none());
}

#[tokio::test]
async fn test_environment_toggles_survive_restart() {
    let db = Database::in_memory().await.unwrap();
    let manager = FlagManager::new(db.pool().clone());
    let actor = Uuid::new_v4();

    let flag = manager
        .create_flag(
            "beta-banner".to_string(),
            FlagType::String,
            "off".to_string(),
            vec![],
            vec!["prod".to_string()],
            Uuid::new_v4(),
            actor,
        )
        .await
        .unwrap();

    manager.toggle_environment(flag.id, "prod", actor).await.unwrap();

    // A second manager over the same pool sees the toggle.
    let other = FlagManager::new(db.pool().clone());
    let loaded = other.get(flag.id).await.unwrap();
    assert!(loaded.environment("prod").unwrap().is_enabled);
}

#[tokio::test]
async fn test_audit_trail_records_full_history() {
    let manager = setup().await;
    let actor = Uuid::new_v4();

    let flag = manager
        .create_flag(
            "new-pricing".to_string(),
            FlagType::Json,
            "{}".to_string(),
            vec![],
            vec!["prod".to_string()],
            Uuid::new_v4(),
            actor,
        )
        .await
        .unwrap();

    let r1 = manager
        .create_draft(flag.id, "{\"tier\":\"a\"}".to_string(), vec![], actor)
        .await
        .unwrap();
    manager.approve_revision(flag.id, r1.id, actor).await.unwrap();
    manager.toggle_environment(flag.id, "prod", actor).await.unwrap();
    manager.rollback(flag.id, actor).await.unwrap();
    manager.soft_delete(flag.id, actor).await.unwrap();

    let events = manager.audit_trail(flag.id).await.unwrap();
    let kinds: Vec<AuditEventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AuditEventKind::Created,
            AuditEventKind::RevisionCreated,
            AuditEventKind::RevisionApproved,
            AuditEventKind::Toggled,
            AuditEventKind::RolledBack,
            AuditEventKind::Deleted,
        ]
    );
}

#[tokio::test]
async fn test_single_live_invariant_through_many_approvals() {
    let manager = setup().await;
    let actor = Uuid::new_v4();

    let flag = manager
        .create_flag(
            "recsys-model".to_string(),
            FlagType::Number,
            "1".to_string(),
            vec![],
            vec!["prod".to_string()],
            Uuid::new_v4(),
            actor,
        )
        .await
        .unwrap();

    for value in ["2", "3", "4", "5"] {
        let revision = manager
            .create_draft(flag.id, value.to_string(), vec![], actor)
            .await
            .unwrap();
        manager
            .approve_revision(flag.id, revision.id, actor)
            .await
            .unwrap();

        let current = manager.get(flag.id).await.unwrap();
        let live_count = current.revisions.iter().filter(|r| r.is_live()).count();
        assert_eq!(live_count, 1);
    }

    let current = manager.get(flag.id).await.unwrap();
    assert_eq!(current.version, 5);
    assert_eq!(current.revisions.len(), 4);
}

#[tokio::test]
async fn test_approve_twice_is_rejected() {
    let manager = setup().await;
    let actor = Uuid::new_v4();

    let flag = manager
        .create_flag(
            "replay-guard".to_string(),
            FlagType::Boolean,
            "false".to_string(),
            vec![],
            vec!["prod".to_string()],
            Uuid::new_v4(),
            actor,
        )
        .await
        .unwrap();

    let r1 = manager
        .create_draft(flag.id, "true".to_string(), vec![], actor)
        .await
        .unwrap();
    manager.approve_revision(flag.id, r1.id, actor).await.unwrap();

    let result = manager.approve_revision(flag.id, r1.id, actor).await;
    assert!(matches!(result, Err(Error::InvalidStateTransition(_))));

    // The failed attempt changed nothing.
    let current = manager.get(flag.id).await.unwrap();
    assert_eq!(current.version, 2);
}
