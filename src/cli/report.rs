//! Failure reporting.
//!
//! Errors always go to stderr. Inside a GitHub Actions job an `::error::`
//! workflow command is also printed so the failure shows up as an
//! annotation on the run, as `core.setFailed` would.

/// Whether the process runs inside a GitHub Actions job.
pub fn in_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").map(|v| v == "true").unwrap_or(false)
}

/// Escape a message for use as workflow command data.
pub fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// The `::error::` line for `message`.
pub fn error_annotation(message: &str) -> String {
    format!("::error::{}", escape_workflow_data(message))
}

/// Print a run failure.
pub fn report_failure(err: &anyhow::Error) {
    let message = format!("{:#}", err);
    eprintln!("Error: {}", message);
    if in_github_actions() {
        println!("{}", error_annotation(&message));
    }
}
