//! Speech input and output.
//!
//! Real microphone capture and text-to-speech are out of scope; the console
//! stand-ins read utterances line by line from stdin and print responses to
//! stdout. [`TimedListener`] bounds every listen call so a hung recognizer
//! cannot stall the loop.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Errors from speech input or output.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The input source is exhausted; no further utterances will arrive.
    #[error("input closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpeechResult<T> = Result<T, SpeechError>;

/// Source of transcribed utterances.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Next utterance. `Ok(None)` means nothing intelligible was heard this
    /// tick; `Err(SpeechError::Closed)` ends the loop.
    async fn listen(&self) -> SpeechResult<Option<String>>;
}

/// Sink for responses.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Say `message` aloud.
    async fn speak(&self, message: &str) -> SpeechResult<()>;

    /// Show `text` without speaking it (dictation buffer, plan summary).
    async fn show(&self, text: &str) -> SpeechResult<()> {
        let _ = text;
        Ok(())
    }
}

/// Reads one utterance per stdin line.
pub struct ConsoleListener {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleListener {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for ConsoleListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for ConsoleListener {
    async fn listen(&self) -> SpeechResult<Option<String>> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await? {
            Some(line) => {
                let line = line.trim();
                Ok((!line.is_empty()).then(|| line.to_string()))
            }
            None => Err(SpeechError::Closed),
        }
    }
}

/// Wraps a listener with a hard per-call timeout. A timeout is a
/// recognition failure for that tick, not an error.
pub struct TimedListener<L> {
    inner: L,
    timeout: Duration,
}

impl<L: Listener> TimedListener<L> {
    pub fn new(inner: L, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<L: Listener> Listener for TimedListener<L> {
    async fn listen(&self) -> SpeechResult<Option<String>> {
        match tokio::time::timeout(self.timeout, self.inner.listen()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(timeout = ?self.timeout, "listen timed out");
                Ok(None)
            }
        }
    }
}

/// Prints responses to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSpeaker;

impl ConsoleSpeaker {
    async fn write_line(text: &str) -> SpeechResult<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Speaker for ConsoleSpeaker {
    async fn speak(&self, message: &str) -> SpeechResult<()> {
        Self::write_line(message).await
    }

    async fn show(&self, text: &str) -> SpeechResult<()> {
        Self::write_line(text).await
    }
}
