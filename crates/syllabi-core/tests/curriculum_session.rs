//! End-to-end flows through the public `Workbench` API with the offline
//! generator. No network or external services required.

mod common;

use common::{data_science_request, signed_in, temp_db_path, FlakyGenerator, EMAIL, PASSWORD};
use syllabi_core::advisory::{credit_advisory, Severity};
use syllabi_core::export;
use syllabi_core::generation::OfflineGenerator;
use syllabi_core::model::*;
use syllabi_core::storage::{
    MemoryStorage, ResourceKind, SqliteStorage, StorageBackend, StorageKey,
};
use syllabi_core::{GenerationError, SyllabiError, Workbench};

#[tokio::test]
async fn test_create_refine_delete_scenario() {
    let (wb, _) = signed_in().await;

    let a1 = wb.create(data_science_request()).await.unwrap();
    assert_eq!(a1.course_name(), "Data Science & ML");
    assert_eq!(a1.content.modules.len(), 12);
    assert_eq!(wb.history().unwrap()[0].id, a1.id);

    let refined = wb.regenerate("add more labs").await.unwrap();
    assert_eq!(refined.id, a1.id);
    assert!(refined.timestamp > a1.timestamp);
    assert_eq!(refined.request, a1.request);
    let history = wb.history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0], refined);

    let after_delete = wb.delete(a1.id).await.unwrap();
    assert!(after_delete.iter().all(|a| a.id != a1.id));

    let again = wb.delete(a1.id).await.unwrap();
    assert_eq!(again, after_delete);
}

#[tokio::test]
async fn test_history_never_exceeds_bound_or_duplicates() {
    let (wb, _) = signed_in().await;
    let mut ids = Vec::new();

    for i in 0..24u32 {
        let artifact = wb
            .create(data_science_request().with_duration(1 + i % 5))
            .await
            .unwrap();
        ids.push(artifact.id);
        if i % 3 == 0 {
            wb.regenerate("tighten the scope").await.unwrap();
        }
        if i % 4 == 0 {
            wb.edit_field(&FieldEdit::ModuleTopic {
                index: 0,
                value: format!("Kickoff {i}"),
            })
            .await
            .unwrap();
        }

        let history = wb.history().unwrap();
        assert!(history.len() <= 20);
        let mut seen = std::collections::HashSet::new();
        assert!(history.iter().all(|a| seen.insert(a.id)));
        assert_eq!(history[0].id, artifact.id);
    }

    // The 20 most recent creations survive, newest first
    let expected: Vec<_> = ids.iter().rev().take(20).copied().collect();
    let actual: Vec<_> = wb.history().unwrap().iter().map(|a| a.id).collect();
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_failed_regenerate_is_invisible() {
    let path = temp_db_path();
    let generator = FlakyGenerator::default();
    let wb = Workbench::new(SqliteStorage::open(&path).unwrap(), generator.clone(), 20);
    wb.register("Ada", EMAIL, PASSWORD).await.unwrap();
    wb.create(data_science_request()).await.unwrap();
    let current = wb.require_current().unwrap();
    let history = wb.history().unwrap();

    // A second connection sees exactly what was persisted
    let reader = SqliteStorage::open(&path).unwrap();
    let history_key = StorageKey::identity(EMAIL, ResourceKind::History);
    let persisted = reader.get(&history_key).await.unwrap();
    assert!(persisted.is_some());

    generator.fail_next(GenerationError::QuotaOrPermissionDenied(
        "quota exceeded".into(),
    ));
    let err = wb.regenerate("add more labs").await.unwrap_err();
    assert!(matches!(
        err.generation_cause(),
        Some(GenerationError::QuotaOrPermissionDenied(_))
    ));

    assert_eq!(wb.require_current().unwrap(), current);
    assert_eq!(wb.history().unwrap(), history);
    assert_eq!(reader.get(&history_key).await.unwrap(), persisted);

    generator.fail_next(GenerationError::Transport("connection reset".into()));
    let err = wb.create(data_science_request().with_duration(6)).await.unwrap_err();
    assert!(matches!(err, SyllabiError::GenerationFailed(_)));
    assert_eq!(wb.require_current().unwrap(), current);
    assert_eq!(reader.get(&history_key).await.unwrap(), persisted);

    // A later attempt goes through normally
    assert!(wb.regenerate("add more labs").await.is_ok());
    assert_ne!(reader.get(&history_key).await.unwrap(), persisted);
}

#[tokio::test]
async fn test_logout_login_restores_identical_history() {
    let (wb, _) = signed_in().await;
    for weeks in [4, 8, 12] {
        wb.create(data_science_request().with_duration(weeks))
            .await
            .unwrap();
    }
    let before = wb.history().unwrap();

    wb.logout().await.unwrap();
    assert!(matches!(
        wb.history().unwrap_err(),
        SyllabiError::NotAuthenticated
    ));

    wb.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(wb.history().unwrap(), before);
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let (wb, _) = signed_in().await;
    wb.logout().await.unwrap();

    let err = wb
        .register("Someone Else", EMAIL, "Zz999!!zz")
        .await
        .unwrap_err();
    assert!(matches!(err, SyllabiError::DuplicateIdentity));
    assert!(wb.session().is_none());

    assert!(matches!(
        wb.login(EMAIL, "Zz999!!zz").await.unwrap_err(),
        SyllabiError::InvalidCredentials
    ));
    assert!(wb.login(EMAIL, PASSWORD).await.is_ok());
}

#[tokio::test]
async fn test_password_policy_at_registration() {
    let wb = Workbench::new(MemoryStorage::new(), OfflineGenerator, 20);
    let err = wb
        .register("Ada", "ada@example.com", "abc12345")
        .await
        .unwrap_err();
    assert!(matches!(err, SyllabiError::WeakPassword(_)));
    assert!(wb
        .register("Ada", "ada@example.com", "Abc123!@")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_advisory_does_not_touch_artifact() {
    let (wb, _) = signed_in().await;
    let artifact = wb
        .create(data_science_request().with_duration(4).with_credits(8))
        .await
        .unwrap();

    let advisory = credit_advisory(
        artifact.request.duration_weeks,
        artifact.request.credit_hours,
    )
    .unwrap();
    assert_eq!(advisory.severity, Severity::Warning);
    assert!((advisory.ratio - 2.0).abs() < f64::EPSILON);
    assert_eq!(wb.require_current().unwrap(), artifact);
}

#[tokio::test]
async fn test_select_then_refine_targets_selected() {
    let (wb, _) = signed_in().await;
    let first = wb.create(data_science_request()).await.unwrap();
    let second = wb
        .create(CurriculumRequest::new("Cloud Computing & DevOps", IndustryMode::Startup))
        .await
        .unwrap();

    wb.select(first.id).await.unwrap();
    let refined = wb.regenerate("focus on notebooks").await.unwrap();
    assert_eq!(refined.id, first.id);

    let order: Vec<_> = wb.history().unwrap().iter().map(|a| a.id).collect();
    assert_eq!(order, vec![first.id, second.id]);
}

#[tokio::test]
async fn test_export_names_file_after_course() {
    let (wb, _) = signed_in().await;
    let artifact = wb.create(data_science_request()).await.unwrap();
    assert_eq!(
        export::export_file_name(&artifact, "md"),
        "Data Science & ML.md"
    );
    let md = export::render_markdown(&artifact);
    assert!(md.contains("## Weekly Syllabus"));
    assert!(md.contains("### Week 12:"));
}

#[tokio::test]
async fn test_sqlite_profile_survives_restart() {
    let path = temp_db_path();
    let artifact = {
        let wb = Workbench::new(
            SqliteStorage::open(&path).unwrap(),
            FlakyGenerator::default(),
            20,
        );
        wb.register("Ada", EMAIL, PASSWORD).await.unwrap();
        wb.create(data_science_request()).await.unwrap()
    };

    let wb = Workbench::new(
        SqliteStorage::open(&path).unwrap(),
        FlakyGenerator::default(),
        20,
    );
    let session = wb.restore().await.unwrap().expect("session should persist");
    assert_eq!(session.email(), EMAIL);
    assert_eq!(wb.history().unwrap(), vec![artifact]);

    drop(wb);
    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}
