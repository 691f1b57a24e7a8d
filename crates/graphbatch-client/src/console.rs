//! Console pauses.
//!
//! The workflow stops twice: before deleting what it created and before
//! exiting. Both go through [`Confirmation`] so tests can script answers.
//!
//! Answers are read on a dedicated OS thread, not on the runtime's blocking
//! pool. A read abandoned by cancellation then never holds up runtime
//! shutdown.

use std::io::{self, BufRead};
use std::sync::mpsc;

use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use graphbatch_providers::BoxFuture;

/// Something that can answer a yes/no pause.
pub trait Confirmation: Send {
    /// Shows `prompt` and resolves to `true` to proceed.
    fn confirm<'a>(&'a mut self, prompt: &'a str) -> BoxFuture<'a, bool>;
}

/// Always proceeds without printing anything (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn confirm<'a>(&'a mut self, prompt: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            debug!(prompt, "auto-confirmed");
            true
        })
    }
}

type LineReply = oneshot::Sender<io::Result<Option<String>>>;

/// Reads one line per request from a blocking source on its own thread.
///
/// Dropping the reply receiver abandons the answer; the thread keeps
/// blocking until the source yields and then discards the line.
struct LineReader {
    requests: mpsc::Sender<LineReply>,
}

impl LineReader {
    fn spawn<R>(mut source: R) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (requests, pending) = mpsc::channel::<LineReply>();

        std::thread::Builder::new()
            .name("graphbatch-console".to_string())
            .spawn(move || {
                for reply in pending {
                    let mut line = String::new();
                    let answer = match source.read_line(&mut line) {
                        Ok(0) => Ok(None),
                        Ok(_) => Ok(Some(line)),
                        Err(e) => Err(e),
                    };
                    if reply.send(answer).is_err() {
                        debug!("console answer abandoned");
                    }
                }
            })?;

        Ok(Self { requests })
    }

    async fn next_line(&self) -> io::Result<Option<String>> {
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(reply)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "console reader stopped"))?;
        answer
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "console reader stopped"))?
    }
}

/// Writes prompts to `W` and reads answers line by line.
///
/// Enter (or any answer other than `n`/`no`) proceeds; end of input declines.
pub struct LineConfirmation<W> {
    reader: Option<LineReader>,
    out: W,
}

/// The interactive prompt on the process stdin and stdout.
pub type StdinConfirmation = LineConfirmation<Stdout>;

impl StdinConfirmation {
    /// Creates a prompt on the process stdin and stdout.
    pub fn stdin() -> Self {
        LineConfirmation::new(io::BufReader::new(io::stdin()), tokio::io::stdout())
    }
}

impl<W> LineConfirmation<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a prompt reading answers from `source` and writing to `out`.
    ///
    /// If the reader thread cannot be started every prompt declines.
    pub fn new<R>(source: R, out: W) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let reader = match LineReader::spawn(source) {
            Ok(reader) => Some(reader),
            Err(e) => {
                warn!(error = %e, "failed to start console reader");
                None
            }
        };
        Self { reader, out }
    }

    async fn show(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).await {
            warn!(error = %e, "failed to write prompt");
        }
        if let Err(e) = self.out.flush().await {
            debug!(error = %e, "failed to flush prompt");
        }
    }
}

impl<W> Confirmation for LineConfirmation<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn confirm<'a>(&'a mut self, prompt: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.show(&format!("{} ", prompt)).await;

            let Some(ref reader) = self.reader else {
                return false;
            };

            let answer = reader.next_line().await;
            match answer {
                Ok(Some(answer)) => is_affirmative(&answer),
                Ok(None) => {
                    self.show("\n").await;
                    debug!("input closed, treating as decline");
                    false
                }
                Err(e) => {
                    warn!(error = %e, "failed to read answer, treating as decline");
                    false
                }
            }
        })
    }
}

/// Interprets a typed answer.
pub fn is_affirmative(answer: &str) -> bool {
    !matches!(answer.trim().to_ascii_lowercase().as_str(), "n" | "no")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use crate::cancel::CancelHandler;

    /// Blocks every read until the test drops the sender.
    struct Held(mpsc::Receiver<()>);

    impl io::Read for Held {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    /// A terminal that refuses every write.
    struct Broken;

    impl AsyncWrite for Broken {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn answers() {
        assert!(is_affirmative(""));
        assert!(is_affirmative("y"));
        assert!(is_affirmative("  yes "));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("No"));
    }

    #[tokio::test]
    async fn auto_confirm_proceeds() {
        assert!(AutoConfirm.confirm("Delete?").await);
    }

    #[tokio::test]
    async fn enter_proceeds_and_prompt_is_shown() {
        let mut prompt = LineConfirmation::new(Cursor::new(b"\n".to_vec()), Vec::<u8>::new());
        assert!(prompt.confirm("Delete?").await);
        assert_eq!(prompt.out.as_slice(), b"Delete? ");
    }

    #[tokio::test]
    async fn answers_are_read_one_line_per_prompt() {
        let mut prompt = LineConfirmation::new(Cursor::new(b"y\nno\n".to_vec()), Vec::<u8>::new());
        assert!(prompt.confirm("First?").await);
        assert!(!prompt.confirm("Second?").await);
        assert!(!prompt.confirm("Third?").await);
    }

    #[tokio::test]
    async fn end_of_input_declines() {
        let mut prompt = LineConfirmation::new(Cursor::new(Vec::new()), Vec::<u8>::new());
        assert!(!prompt.confirm("Delete?").await);
        assert_eq!(prompt.out.as_slice(), b"Delete? \n");
    }

    #[tokio::test]
    async fn write_failure_still_reads_the_answer() {
        let mut prompt = LineConfirmation::new(Cursor::new(b"\n".to_vec()), Broken);
        assert!(prompt.confirm("Delete?").await);

        let mut prompt = LineConfirmation::new(Cursor::new(Vec::new()), Broken);
        assert!(!prompt.confirm("Delete?").await);
    }

    #[test]
    fn cancelled_prompt_does_not_block_runtime_shutdown() {
        let (_hold, held) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            let answered = runtime.block_on(async move {
                let handler = CancelHandler::new();
                let token = handler.token();
                let mut prompt =
                    LineConfirmation::new(io::BufReader::new(Held(held)), Vec::<u8>::new());

                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    handler.trigger();
                });

                tokio::select! {
                    answer = prompt.confirm("Delete?") => Some(answer),
                    _ = token.cancelled() => None,
                }
            });

            drop(runtime);
            let _ = done_tx.send(answered);
        });

        let answered = done_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("runtime shutdown blocked on a pending prompt");
        assert_eq!(answered, None);
    }
}
