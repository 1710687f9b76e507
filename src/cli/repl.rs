//! Interactive prompt loop shared by the query commands.

use std::future::Future;
use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::AgentError;

/// Prompt printed before every line of input.
pub const PROMPT: &str = "Enter prompt: ";

/// One way of answering prompts.
#[async_trait]
pub trait Session: Send {
    /// Answers `prompt`, returning the text to print.
    async fn respond(&mut self, prompt: &str) -> Result<String, AgentError>;
}

/// How the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplExit {
    /// End of input or interrupt.
    Interrupted,
    /// A turn or the input stream failed.
    Failed(String),
}

/// Reads prompts from `input` until EOF, interrupt, or the first error.
///
/// `interrupt` resolving (Ctrl-C in the binary) ends the loop whether it
/// fires while waiting for input or during a turn.
pub async fn run_repl<S, R, W, I>(
    session: &mut S,
    input: R,
    output: &mut W,
    interrupt: I,
) -> std::io::Result<ReplExit>
where
    S: Session + ?Sized,
    R: AsyncBufRead + Unpin,
    W: Write,
    I: Future<Output = ()>,
{
    let mut lines = input.lines();
    tokio::pin!(interrupt);

    let exit = loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line,
            () = &mut interrupt => break ReplExit::Interrupted,
        };
        let prompt = match line {
            Ok(Some(prompt)) => prompt,
            Ok(None) => break ReplExit::Interrupted,
            Err(e) => break ReplExit::Failed(e.to_string()),
        };

        let result = tokio::select! {
            result = session.respond(&prompt) => result,
            () = &mut interrupt => break ReplExit::Interrupted,
        };
        match result {
            Ok(text) => writeln!(output, "{text}")?,
            Err(e) => break ReplExit::Failed(e.to_string()),
        }
    };

    match &exit {
        ReplExit::Interrupted => writeln!(output, "\nExiting program.")?,
        ReplExit::Failed(message) => writeln!(output, "An unexpected error occurred: {message}")?,
    }
    writeln!(output, "Goodbye!")?;
    output.flush()?;
    Ok(exit)
}
