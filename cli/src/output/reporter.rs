//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use std::cell::RefCell;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// On a TTY the latest `step()` spins until the next event arrives, then
/// settles into a plain `→` line. Everything is suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    active: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            active: RefCell::new(None),
        }
    }

    /// Replace the running spinner, if any, with its plain step line.
    fn settle(&self) {
        if let Some(pb) = self.active.borrow_mut().take() {
            let message = pb.message();
            pb.finish_and_clear();
            println!("  {} {message}", "→".style(self.ctx.styles.step));
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        self.settle();
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn header(&self, message: &str) {
        self.settle();
        if !self.ctx.quiet {
            println!();
        }
        self.ctx.header(message);
    }

    fn step(&self, message: &str) {
        self.settle();
        if self.ctx.show_progress() {
            *self.active.borrow_mut() = Some(progress::spinner(message));
        } else if !self.ctx.quiet {
            println!("  {} {message}", "→".style(self.ctx.styles.step));
        }
    }

    fn success(&self, message: &str) {
        self.settle();
        self.ctx.success(message);
    }

    fn warn(&self, message: &str) {
        self.settle();
        self.ctx.warn(message);
    }

    fn error(&self, message: &str) {
        self.settle();
        if !self.ctx.quiet {
            println!("  {} {message}", "✗".style(self.ctx.styles.error));
        }
    }

    fn info(&self, message: &str) {
        self.settle();
        self.ctx.info(message);
    }
}
