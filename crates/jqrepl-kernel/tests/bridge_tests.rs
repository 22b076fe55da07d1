//! Integration tests for the evaluation bridge over the jaq engine.
//!
//! Tests verify:
//! - compile errors arrive once, with no output
//! - outputs arrive in engine order
//! - runtime errors arrive on the error channel
//! - cancellation and abandoned runs leave the session usable

use std::time::Duration;

use jqrepl_kernel::{RunError, RunEvent, Session, SessionConfig};
use jqrepl_types::Jv;
use rstest::rstest;

// ============================================================================
// Test Helpers
// ============================================================================

fn session() -> Session {
    Session::open(SessionConfig::named("test")).expect("session opens")
}

fn json(text: &str) -> Jv {
    Jv::parse(text).expect("valid json")
}

// ============================================================================
// Outputs
// ============================================================================

#[tokio::test]
async fn test_invalid_syntax_is_one_compile_error() {
    let session = session();
    let outcome = session.start(".[[[").collect(json("null")).await;

    assert!(outcome.outputs.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(outcome.errors[0], RunError::Compile(_)));
}

#[tokio::test]
async fn test_iteration_is_ordered() {
    let session = session();
    let outcome = session.start(".[]").collect(json("[1,2,3]")).await;

    assert_eq!(outcome.outputs, vec![json("1"), json("2"), json("3")]);
    assert!(outcome.errors.is_empty());
}

#[rstest]
#[case(". / 2", "4", "2")]
#[case(".a", r#"{"a": "x"}"#, r#""x""#)]
#[case("[.[] | . * 10]", "[1,2]", "[10,20]")]
#[case("keys", r#"{"b":1,"a":2}"#, r#"["a","b"]"#)]
#[case(". + {c: 3}", r#"{"a":1}"#, r#"{"a":1,"c":3}"#)]
#[case("length", r#""héllo""#, "5")]
#[tokio::test]
async fn test_single_output(#[case] program: &str, #[case] input: &str, #[case] expected: &str) {
    let session = session();
    let outcome = session.start(program).collect(json(input)).await;

    assert!(outcome.errors.is_empty(), "errors: {:?}", outcome.errors);
    assert_eq!(outcome.outputs, vec![json(expected)]);
}

#[tokio::test]
async fn test_object_key_order_survives() {
    let session = session();
    let outcome = session.start(".").collect(json(r#"{"z":1,"a":2}"#)).await;

    assert_eq!(outcome.outputs.len(), 1);
    assert_eq!(outcome.outputs[0].to_string(), r#"{"z":1,"a":2}"#);
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_runtime_error_is_reported() {
    let session = session();
    let outcome = session.start(r#"1, error("boom")"#).collect(json("null")).await;

    assert_eq!(outcome.outputs, vec![json("1")]);
    assert_eq!(outcome.errors, vec![RunError::Evaluation("boom".into())]);
}

#[tokio::test]
async fn test_error_yields_no_extra_output() {
    let session = session();
    let outcome = session.start(r#"error("boom")"#).collect(json("null")).await;
    assert!(outcome.outputs.is_empty(), "outputs: {:?}", outcome.outputs);
    assert_eq!(outcome.errors.len(), 1);

    let outcome = session.start("error(null)").collect(json("null")).await;
    assert!(outcome.outputs.is_empty(), "outputs: {:?}", outcome.outputs);
    assert_eq!(outcome.errors.len(), 1);
}

#[tokio::test]
async fn test_object_error_is_dumped() {
    let session = session();
    let outcome = session.start(r#"error({code: 7})"#).collect(json("null")).await;

    assert!(outcome.outputs.is_empty());
    assert_eq!(outcome.errors, vec![RunError::Evaluation(r#"{"code":7}"#.into())]);
}

#[tokio::test]
async fn test_type_error_is_evaluation_error() {
    let session = session();
    let outcome = session.start(".a").collect(json("5")).await;

    assert!(outcome.outputs.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(outcome.errors[0], RunError::Evaluation(_)));
}

#[tokio::test]
async fn test_close_after_finished_run() {
    let session = session();
    let outcome = session.start(".").collect(json("null")).await;
    assert_eq!(outcome.outputs, vec![json("null")]);
    session.close().expect("clean shutdown");
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_dropped_input_ends_without_output() {
    let session = session();
    let mut run = session.start(".");
    run.close_input();

    assert_eq!(run.next_event().await, None);
}

#[tokio::test]
async fn test_cancel_stops_infinite_output() {
    let session = session();
    let mut run = session.start("range(1000000000)");
    assert!(run.send_input(json("null")));

    let mut seen = 0;
    while let Some(event) = run.next_event().await {
        assert!(matches!(event, RunEvent::Output(_)));
        seen += 1;
        if seen == 5 {
            run.cancel();
        }
    }

    assert!(run.is_cancelled());
    assert!(seen < 10, "saw {seen} outputs");
}

#[tokio::test]
async fn test_dropped_run_unblocks_session() {
    let session = session();
    let mut abandoned = session.start("range(1000000000)");
    abandoned.send_input(json("null"));
    assert!(abandoned.next_event().await.is_some());
    drop(abandoned);

    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        session.start(". + 1").collect(json("1")),
    )
    .await
    .expect("second run finishes");
    assert_eq!(outcome.outputs, vec![json("2")]);
}

#[tokio::test]
async fn test_sequential_runs_share_session() {
    let session = session();
    for i in 0..5 {
        let outcome = session.start(". * 2").collect(Jv::number(i as f64)).await;
        assert_eq!(outcome.outputs, vec![Jv::number(i as f64 * 2.0)]);
    }
}

#[tokio::test]
async fn test_input_handle_outlives_run() {
    let session = session();
    let input = json(r#"{"keep": [1, 2]}"#);
    let outcome = session.start(".keep").collect(input.clone()).await;

    assert_eq!(outcome.outputs, vec![json("[1,2]")]);
    assert_eq!(input.get("keep").expect("object"), Some(json("[1,2]")));
}
