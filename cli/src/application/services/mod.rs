//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

use std::process::Output;

pub mod client_setup;
pub mod context;
pub mod lifecycle;
pub mod pipeline;
pub mod rebuild;
pub mod verification;


/// Number of trailing stderr lines carried into error messages.
const STDERR_TAIL_LINES: usize = 5;

/// Last few non-empty stderr lines of `output`, joined with `; `.
pub(crate) fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let skip = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[skip..].join("; ")
}
