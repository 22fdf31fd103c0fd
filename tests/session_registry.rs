// tests/session_registry.rs

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use driveschool_backend::error::AppError;
use driveschool_backend::models::question::AnswerOption;
use driveschool_backend::session::{SessionKey, SessionRegistry, SessionSnapshot};
use driveschool_backend::store::SessionStore;

use common::{MemoryStore, sample_question, sample_test, three_question_test};

fn store_with_default_test() -> Arc<MemoryStore> {
    let (test, questions) = three_question_test();
    Arc::new(MemoryStore::new().with_test(test, questions))
}

#[tokio::test]
async fn a_second_start_joins_the_existing_session() {
    let store = store_with_default_test();
    let registry = SessionRegistry::new();
    let key = SessionKey::new(42, 1);

    let first = registry
        .start(store.clone() as Arc<dyn SessionStore>, key)
        .await
        .unwrap();
    {
        let mut session = first.lock().await;
        session.select_option(1, AnswerOption::A).unwrap();
    }

    // Another tab or device opening the same test joins, not forks.
    let second = registry
        .start(store.clone() as Arc<dyn SessionStore>, key)
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        second.lock().await.selected_answer(1),
        Some(AnswerOption::A)
    );
}

#[tokio::test]
async fn start_seeds_from_a_persisted_snapshot() {
    let store = store_with_default_test();
    let registry = SessionRegistry::new();
    let key = SessionKey::new(42, 1);

    let mut answers = BTreeMap::new();
    answers.insert(1, AnswerOption::B);
    let snapshot = SessionSnapshot {
        index: 2,
        answers,
        time: 120,
        marked: vec![3],
    };
    store.save_snapshot(key, &snapshot).await.unwrap();

    let shared = registry
        .start(store as Arc<dyn SessionStore>, key)
        .await
        .unwrap();
    let session = shared.lock().await;

    assert_eq!(session.cursor(), 2);
    assert_eq!(session.selected_answer(1), Some(AnswerOption::B));
    assert_eq!(session.remaining_secs(), 120);
    assert!(session.is_marked(3));
}

#[tokio::test]
async fn inactive_tests_cannot_be_started() {
    let (mut test, questions) = three_question_test();
    test.is_active = false;
    let store = Arc::new(MemoryStore::new().with_test(test, questions));
    let registry = SessionRegistry::new();

    let err = registry
        .start(store as Arc<dyn SessionStore>, SessionKey::new(42, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn a_test_with_no_questions_is_a_config_error() {
    let test = sample_test(7, &[], 60, 30);
    let store = Arc::new(MemoryStore::new().with_test(test, Vec::new()));
    let registry = SessionRegistry::new();

    let err = registry
        .start(store as Arc<dyn SessionStore>, SessionKey::new(42, 7))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConfigError(_)));
}

#[tokio::test(start_paused = true)]
async fn expiry_auto_submits_exactly_once_and_evicts_the_session() {
    let questions = vec![
        sample_question(1, AnswerOption::A),
        sample_question(2, AnswerOption::B),
        sample_question(3, AnswerOption::C),
    ];
    let test = sample_test(1, &[1, 2, 3], 60, 1); // one minute
    let store = Arc::new(MemoryStore::new().with_test(test, questions));
    let registry = SessionRegistry::new();
    let key = SessionKey::new(42, 1);

    let shared = registry
        .start(store.clone() as Arc<dyn SessionStore>, key)
        .await
        .unwrap();
    shared
        .lock()
        .await
        .select_option(1, AnswerOption::A)
        .unwrap();

    // Let the virtual clock run past the limit; the ticker drives the
    // countdown and submits on expiry.
    tokio::time::sleep(Duration::from_secs(90)).await;

    assert_eq!(store.record_count(), 1);
    assert!(registry.get(key).await.is_none());
    assert!(store.snapshot_for(key).is_none());

    let records = store.records.lock().unwrap();
    let script = &records[0].1.answer_script;
    assert_eq!(script.summary.answered, 1);
    assert_eq!(script.summary.score, 33);
    assert_eq!(script.time_spent, 60);
}

#[tokio::test]
async fn finish_removes_the_session() {
    let store = store_with_default_test();
    let registry = SessionRegistry::new();
    let key = SessionKey::new(42, 1);

    registry
        .start(store as Arc<dyn SessionStore>, key)
        .await
        .unwrap();
    assert!(registry.get(key).await.is_some());

    registry.finish(key).await;
    assert!(registry.get(key).await.is_none());
}
