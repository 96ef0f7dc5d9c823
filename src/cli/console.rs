//! Terminal side of the approval workflow.
//!
//! Stdin is read on a helper thread and Ctrl-C is caught on a second thread
//! running a single-threaded tokio runtime. Both feed channels that
//! [`ConsoleIo::next_event`] selects over, so an interrupt unblocks a pending
//! prompt.

use std::io::{self, BufRead, Write};
use std::thread;

use crossbeam_channel::{Receiver, bounded, never, select, unbounded};
use tracing::{debug, warn};

use crate::cli::colors::{ColorSupport, LearnStyles, format_category, format_priority, styled};
use crate::cli::output::HumanLayout;
use crate::error::{LearnError, Result};
use crate::learning::{ApprovalInput, ApprovalIo, PromptItem};
use crate::suggestions::Suggestion;

const CHOICES: &str = "[y]es / [n]o / [a]ll / [s]kip rest / [q]uit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsoleEvent {
    Line(String),
    Eof,
    Interrupt,
}

pub struct ConsoleIo {
    lines: Receiver<String>,
    signals: Receiver<()>,
    support: ColorSupport,
    interrupted: bool,
}

impl ConsoleIo {
    /// Spawn the stdin reader and the Ctrl-C listener.
    pub fn start() -> Result<Self> {
        let (line_tx, lines) = unbounded();
        thread::Builder::new()
            .name("config-learn-stdin".to_string())
            .spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    match line {
                        Ok(line) => {
                            if line_tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            debug!(error = %err, "stdin closed");
                            break;
                        }
                    }
                }
            })?;

        let (signal_tx, signals) = bounded(1);
        thread::Builder::new()
            .name("config-learn-signal".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        warn!(error = %err, "ctrl-c listener unavailable");
                        return;
                    }
                };
                loop {
                    if let Err(err) = runtime.block_on(tokio::signal::ctrl_c()) {
                        warn!(error = %err, "ctrl-c listener failed");
                        return;
                    }
                    if signal_tx.send(()).is_err() {
                        return;
                    }
                }
            })?;

        Ok(Self::from_channels(lines, signals, ColorSupport::detect()))
    }

    fn from_channels(lines: Receiver<String>, signals: Receiver<()>, support: ColorSupport) -> Self {
        Self {
            lines,
            signals,
            support,
            interrupted: false,
        }
    }

    #[must_use]
    pub const fn interrupted(&self) -> bool {
        self.interrupted
    }

    fn next_event(&mut self) -> ConsoleEvent {
        loop {
            let signal = select! {
                recv(self.signals) -> msg => msg,
                recv(self.lines) -> msg => {
                    return msg.map_or(ConsoleEvent::Eof, ConsoleEvent::Line);
                }
            };
            if signal.is_ok() {
                return ConsoleEvent::Interrupt;
            }
            // Listener is gone; keep reading stdin only.
            self.signals = never();
        }
    }

    fn prompt(text: &str) -> Result<()> {
        eprint!("{text}");
        io::stderr().flush().map_err(LearnError::from)
    }
}

impl ApprovalIo for ConsoleIo {
    fn present(&mut self, item: &PromptItem<'_>) -> Result<()> {
        let suggestion = item.suggestion;
        let mut layout = HumanLayout::new();
        layout
            .blank()
            .push_line(format!(
                "[{}/{}] {} {}",
                item.position,
                item.total,
                format_category(suggestion.category(), self.support),
                format_priority(suggestion.priority(), self.support),
            ))
            .paragraph(suggestion.description(), 2)
            .blank()
            .kv("  Will change", &item.preview.what_will_change)
            .kv("  Consequences", &item.preview.consequences)
            .kv("  Undo", &item.preview.how_to_undo);
        eprintln!("{}", layout.build());
        Ok(())
    }

    fn read_input(&mut self) -> Result<ApprovalInput> {
        if self.interrupted {
            return Ok(ApprovalInput::Interrupt);
        }
        Self::prompt(&format!("{CHOICES}: "))?;
        match self.next_event() {
            ConsoleEvent::Line(line) => Ok(ApprovalInput::parse(&line)),
            ConsoleEvent::Eof | ConsoleEvent::Interrupt => {
                eprintln!();
                self.interrupted = true;
                Ok(ApprovalInput::Interrupt)
            }
        }
    }

    fn invalid_input(&mut self) -> Result<()> {
        eprintln!(
            "{} please answer one of {CHOICES}",
            styled("Invalid input:", LearnStyles::warning, self.support)
        );
        Ok(())
    }

    fn warn(&mut self, message: &str) {
        eprintln!("{} {message}", styled("Warning:", LearnStyles::warning, self.support));
    }

    fn confirm_apply(&mut self, pending: &[Suggestion]) -> Result<bool> {
        if self.interrupted {
            return Ok(false);
        }
        let mut layout = HumanLayout::new();
        layout.blank().section("Pending changes");
        for suggestion in pending {
            layout.bullet(&suggestion.preview().what_will_change);
        }
        eprintln!("{}", layout.build());

        Self::prompt(&format!("Apply {} change(s)? [y/N] ", pending.len()))?;
        match self.next_event() {
            ConsoleEvent::Line(line) => {
                let answer = line.trim();
                Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
            }
            ConsoleEvent::Eof | ConsoleEvent::Interrupt => {
                eprintln!();
                self.interrupted = true;
                Ok(false)
            }
        }
    }
}

/// Boundary for runs that never prompt.
#[derive(Debug, Default)]
pub struct HeadlessIo;

impl ApprovalIo for HeadlessIo {
    fn present(&mut self, _item: &PromptItem<'_>) -> Result<()> {
        Ok(())
    }

    fn read_input(&mut self) -> Result<ApprovalInput> {
        Ok(ApprovalInput::Interrupt)
    }

    fn warn(&mut self, message: &str) {
        warn!("{message}");
    }

    fn confirm_apply(&mut self, _pending: &[Suggestion]) -> Result<bool> {
        Ok(false)
    }
}
