// tests/scoring_engine.rs

mod common;

use std::collections::BTreeMap;

use driveschool_backend::error::AppError;
use driveschool_backend::models::question::AnswerOption;
use driveschool_backend::session::scoring::{is_correct, score_answers};

use common::{sample_question, three_question_test};

#[test]
fn unanswered_question_is_never_correct() {
    let q = sample_question(1, AnswerOption::A);
    let answers = BTreeMap::new();
    assert!(!is_correct(&q, &answers));
}

#[test]
fn correctness_is_exact_label_match() {
    let q = sample_question(1, AnswerOption::B);

    let mut answers = BTreeMap::new();
    answers.insert(1, AnswerOption::B);
    assert!(is_correct(&q, &answers));

    answers.insert(1, AnswerOption::C);
    assert!(!is_correct(&q, &answers));
}

#[test]
fn one_of_three_rounds_to_33() {
    let (_, questions) = three_question_test();
    let mut answers = BTreeMap::new();
    answers.insert(1, AnswerOption::A); // correct
    answers.insert(2, AnswerOption::A); // wrong

    let score = score_answers(&questions, &answers).unwrap();
    assert_eq!(score.correct, 1);
    assert_eq!(score.score, 33);
}

#[test]
fn two_of_three_rounds_to_67() {
    let (_, questions) = three_question_test();
    let mut answers = BTreeMap::new();
    answers.insert(1, AnswerOption::A);
    answers.insert(2, AnswerOption::B);

    let score = score_answers(&questions, &answers).unwrap();
    assert_eq!(score.correct, 2);
    assert_eq!(score.score, 67);
}

#[test]
fn all_correct_is_100() {
    let (_, questions) = three_question_test();
    let mut answers = BTreeMap::new();
    answers.insert(1, AnswerOption::A);
    answers.insert(2, AnswerOption::B);
    answers.insert(3, AnswerOption::C);

    let score = score_answers(&questions, &answers).unwrap();
    assert_eq!(score.correct, 3);
    assert_eq!(score.score, 100);
}

#[test]
fn empty_question_set_is_a_config_error() {
    let answers = BTreeMap::new();
    let err = score_answers(&[], &answers).unwrap_err();
    assert!(matches!(err, AppError::ConfigError(_)));
}

#[test]
fn invalid_option_labels_are_rejected_at_the_boundary() {
    assert!("option_b".parse::<AnswerOption>().is_ok());
    assert!("option_d".parse::<AnswerOption>().is_err());
    assert!("b".parse::<AnswerOption>().is_err());
    assert!(serde_json::from_str::<AnswerOption>("\"option_d\"").is_err());
}
