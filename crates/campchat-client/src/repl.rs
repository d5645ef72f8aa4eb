//! Line-at-a-time chat loop helpers.
//!
//! Tokio keeps its SIGINT handler installed once `ctrl_c()` has been polled,
//! so the loop must answer Ctrl-C itself both at the prompt and mid-reply.

use std::future::Future;
use std::io;

use tokio::io::{AsyncBufRead, Lines};
use tokio_util::sync::CancellationToken;

/// Next input line, or `None` on end of input or an interrupt at the prompt.
pub async fn next_input<R, I>(lines: &mut Lines<R>, interrupt: I) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = io::Result<()>>,
{
    tokio::select! {
        line = lines.next_line() => line,
        signal = interrupt => {
            if let Err(err) = signal {
                tracing::warn!(error = %err, "Interrupt listener failed");
            }
            Ok(None)
        }
    }
}

/// Drive `reply` to completion, cancelling it on the first interrupt.
pub async fn with_interrupt<F, I>(reply: F, interrupt: I, cancel: &CancellationToken) -> F::Output
where
    F: Future,
    I: Future<Output = io::Result<()>>,
{
    tokio::pin!(reply);
    tokio::pin!(interrupt);
    let mut listening = true;

    loop {
        tokio::select! {
            output = &mut reply => return output,
            signal = &mut interrupt, if listening => {
                listening = false;
                match signal {
                    Ok(()) => cancel.cancel(),
                    Err(err) => tracing::warn!(error = %err, "Interrupt listener failed"),
                }
            }
        }
    }
}
