// src/supervisor/output.rs

//! Readers that pump the managed process's stdout/stderr into the console.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::console::ConsoleBuffer;

/// Spawn a task that copies `reader` into `console` line by line until EOF.
///
/// Lines are appended verbatim (terminator included) so a partial last line
/// is kept as-is. Invalid UTF-8 is replaced rather than ending the stream.
pub(crate) fn spawn_output_reader<R>(
    reader: R,
    console: ConsoleBuffer,
    stream: &'static str,
    generation: u64,
) -> JoinHandle<()>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::with_capacity(256);

        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => console.append(&String::from_utf8_lossy(&line)),
                Err(e) => {
                    warn!(stream, generation, error = %e, "error reading server output");
                    break;
                }
            }
        }

        debug!(stream, generation, "output reader finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn reader_copies_lines_and_partial_tail() {
        let console = ConsoleBuffer::new(1024);
        let (mut tx, rx) = tokio::io::duplex(64);

        let handle = spawn_output_reader(rx, console.clone(), "stdout", 1);
        tx.write_all(b"[INFO] Done (3.2s)!\nno newline").await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(console.snapshot(), "[INFO] Done (3.2s)!\nno newline");
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_fatal() {
        let console = ConsoleBuffer::new(1024);
        let (mut tx, rx) = tokio::io::duplex(64);

        let handle = spawn_output_reader(rx, console.clone(), "stderr", 1);
        tx.write_all(b"bad \xff byte\nnext\n").await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(console.snapshot(), "bad \u{FFFD} byte\nnext\n");
    }
}
