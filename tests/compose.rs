//! Child process exit code handling.

#![cfg(unix)]

use graphstudio::compose::{ComposeError, run_command};

async fn run_sh(script: &str) -> Result<(), ComposeError> {
    run_command("sh", &["-c".to_string(), script.to_string()]).await
}

#[tokio::test]
async fn zero_exit_is_success() {
    run_sh("exit 0").await.unwrap();
}

#[tokio::test]
async fn sigint_exit_code_is_treated_as_normal_termination() {
    run_sh("exit 130").await.unwrap();
}

#[tokio::test]
async fn other_nonzero_exit_fails_with_code_and_command_line() {
    let err = run_sh("exit 3").await.unwrap_err();
    match err {
        ComposeError::CommandFailed { code, command } => {
            assert_eq!(code, 3);
            assert!(command.starts_with("sh -c"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    let err = run_command("definitely-not-a-real-binary-4a1f", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ComposeError::Spawn { .. }));
}
