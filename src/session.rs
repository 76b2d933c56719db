//! Line-oriented question session.
//!
//! One question per input line; "exit" (any case) or end of input ends the
//! session. A collaborator failure ends the session unless
//! [`SessionConfig::recover_collaborator_errors`] is set, in which case it is
//! reported in place of an answer.

use std::io::{BufRead, Write};

use crate::config::SessionConfig;
use crate::error::TwinResult;
use crate::llm::CollaboratorError;
use crate::router::IntentRouter;

/// Input line that ends the session.
pub const EXIT_COMMAND: &str = "exit";

const RULE: &str = "----------------------------------";

/// A question router plus the session policy around it.
#[derive(Debug)]
pub struct Session<'a> {
    router: IntentRouter<'a>,
    config: SessionConfig,
}

impl<'a> Session<'a> {
    pub fn new(router: IntentRouter<'a>, config: SessionConfig) -> Self {
        Self { router, config }
    }

    /// Answer one question as display text.
    pub fn answer(&self, question: &str) -> Result<String, CollaboratorError> {
        match self.router.route(question) {
            Ok(answer) => Ok(answer.to_string()),
            Err(e) if self.config.recover_collaborator_errors => {
                tracing::warn!(error = %e, "collaborator failed, continuing session");
                Ok(format!("Collaborator unavailable: {e}"))
            }
            Err(e) => Err(e),
        }
    }

    /// Read questions from `input` and write answers to `output` until "exit"
    /// or end of input. Returns the number of questions answered.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> TwinResult<usize> {
        writeln!(output, "\n--- Refrigeration Plant Digital Twin ---\n")?;
        writeln!(output, "Ask a question about the ship refrigeration system.\n")?;

        let mut answered = 0;
        let mut lines = input.lines();
        loop {
            write!(output, "Question (or '{EXIT_COMMAND}'): ")?;
            output.flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            let question = line.trim();

            if question.eq_ignore_ascii_case(EXIT_COMMAND) {
                writeln!(output, "Exiting.")?;
                break;
            }
            if question.is_empty() {
                continue;
            }

            let text = self.answer(question)?;
            writeln!(output, "\n{text}\n\n{RULE}\n")?;
            answered += 1;
        }
        Ok(answered)
    }
}
