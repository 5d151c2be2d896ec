//! Read-Eval-Print Loop
//!
//! Drives a [`Session`] from any line-oriented async input, writing replies
//! to any async output. The binary wires it to stdin/stdout; tests use
//! in-memory buffers.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::cli::command::HELP;
use crate::cli::session::{Outcome, Session};

/// Prompt printed before each line is read.
pub const PROMPT: &str = "cache> ";

/// Runs the shell until EXIT or end of input.
///
/// End of input behaves like EXIT: the engine is shut down before returning.
pub async fn run<R, W>(session: &mut Session, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let capacity = session.engine().capacity();
    output
        .write_all(format!("=== Cache Engine (capacity: {capacity} entries) ===\n{HELP}\n\n").as_bytes())
        .await?;

    let mut lines = input.lines();
    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            info!("end of input, closing shell");
            output.write_all(b"\n").await?;
            session.engine().shutdown().await;
            break;
        };

        let Some(outcome) = session.execute_line(&line).await else {
            continue;
        };

        output.write_all(outcome.reply().as_bytes()).await?;
        output.write_all(b"\n").await?;

        if let Outcome::Exit(_) = outcome {
            break;
        }
    }

    output.flush().await
}
