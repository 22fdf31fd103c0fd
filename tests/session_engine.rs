// tests/session_engine.rs

mod common;

use driveschool_backend::error::AppError;
use driveschool_backend::models::question::AnswerOption;
use driveschool_backend::session::{Phase, TestSession, TickOutcome};

use common::three_question_test;

fn session() -> TestSession {
    let (test, questions) = three_question_test();
    TestSession::new(test, questions, 42).unwrap()
}

#[test]
fn new_session_seeds_timer_from_time_limit() {
    let s = session();
    assert_eq!(s.remaining_secs(), 30 * 60);
    assert_eq!(s.cursor(), 0);
    assert_eq!(s.phase(), Phase::InProgress);
    assert!(s.answers().is_empty());
}

#[test]
fn a_test_without_questions_cannot_start() {
    let (mut test, _) = three_question_test();
    test.questions.0.clear();
    let err = TestSession::new(test, Vec::new(), 42).unwrap_err();
    assert!(matches!(err, AppError::ConfigError(_)));
}

#[test]
fn goto_clamps_out_of_range_indexes() {
    let mut s = session();
    assert_eq!(s.go_to(99).unwrap(), 2);
    assert_eq!(s.go_to(1).unwrap(), 1);
    assert_eq!(s.go_to(0).unwrap(), 0);
}

#[test]
fn next_at_last_question_is_a_no_op() {
    let mut s = session();
    s.go_to(2).unwrap();
    assert_eq!(s.next().unwrap(), 2);
    assert_eq!(s.cursor(), 2);
}

#[test]
fn previous_at_first_question_is_a_no_op() {
    let mut s = session();
    assert_eq!(s.previous().unwrap(), 0);
    assert_eq!(s.cursor(), 0);
}

#[test]
fn next_and_previous_walk_without_wraparound() {
    let mut s = session();
    assert_eq!(s.next().unwrap(), 1);
    assert_eq!(s.next().unwrap(), 2);
    assert_eq!(s.next().unwrap(), 2);
    assert_eq!(s.previous().unwrap(), 1);
    assert_eq!(s.previous().unwrap(), 0);
    assert_eq!(s.previous().unwrap(), 0);
}

#[test]
fn selecting_overwrites_previous_answer() {
    let mut s = session();
    s.select_option(1, AnswerOption::A).unwrap();
    s.select_option(1, AnswerOption::C).unwrap();
    assert_eq!(s.selected_answer(1), Some(AnswerOption::C));
    assert_eq!(s.answers().len(), 1);
}

#[test]
fn answer_for_foreign_question_is_rejected() {
    let mut s = session();
    let err = s.select_option(999, AnswerOption::A).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn toggle_review_flips_membership() {
    let mut s = session();
    assert!(s.toggle_review(3).unwrap());
    assert!(s.is_marked(3));
    assert!(!s.toggle_review(3).unwrap());
    assert!(!s.is_marked(3));
}

#[test]
fn marks_do_not_affect_answers() {
    let mut s = session();
    s.select_option(2, AnswerOption::B).unwrap();
    s.toggle_review(2).unwrap();
    assert_eq!(s.selected_answer(2), Some(AnswerOption::B));
}

#[test]
fn question_map_overlay_leaves_timer_and_answers_alone() {
    let mut s = session();
    s.select_option(1, AnswerOption::A).unwrap();
    let before = s.remaining_secs();

    s.show_map().unwrap();
    assert_eq!(s.phase(), Phase::Reviewing);
    s.hide_map().unwrap();
    assert_eq!(s.phase(), Phase::InProgress);

    assert_eq!(s.remaining_secs(), before);
    assert_eq!(s.selected_answer(1), Some(AnswerOption::A));
}

#[test]
fn jumping_from_the_map_closes_it() {
    let mut s = session();
    s.show_map().unwrap();
    s.go_to(2).unwrap();
    assert_eq!(s.phase(), Phase::InProgress);
    assert_eq!(s.cursor(), 2);
}

#[test]
fn finalize_and_back() {
    let mut s = session();
    s.begin_finalize().unwrap();
    assert_eq!(s.phase(), Phase::Finalizing);
    s.cancel_finalize().unwrap();
    assert_eq!(s.phase(), Phase::InProgress);
}

#[test]
fn tick_counts_down_to_a_floor_of_zero() {
    let (test, questions) = three_question_test();
    let mut test = test;
    test.time_limit = 1; // 60 seconds
    let mut s = TestSession::new(test, questions, 42).unwrap();

    for expected in (1..60).rev() {
        assert_eq!(s.tick(), TickOutcome::Running(expected));
    }
    assert_eq!(s.tick(), TickOutcome::Expired);
    assert_eq!(s.remaining_secs(), 0);
}
