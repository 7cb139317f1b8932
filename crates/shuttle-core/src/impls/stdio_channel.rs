//! Newline-delimited JSON channel.
//!
//! One JSON object per line, flushed after each write. End of input means
//! the host hung up. The worker binary uses stdin/stdout; tests use byte
//! buffers.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::domain::{HostMessage, WorkerMessage};
use crate::ports::{ChannelError, MessageSink, MessageSource};

pub struct LineSource<R> {
    reader: R,
    /// Bytes of the current line read so far; survives a cancelled `recv`.
    pending: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::new(),
        }
    }
}

impl LineSource<BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> MessageSource for LineSource<R> {
    async fn recv(&mut self) -> Result<Option<HostMessage>, ChannelError> {
        // read_until は途中まで読んだ分を pending に残すので cancel しても行が欠けない
        loop {
            let read = self.reader.read_until(b'\n', &mut self.pending).await?;
            if read == 0 && self.pending.is_empty() {
                return Ok(None);
            }
            let bytes = std::mem::take(&mut self.pending);
            let line = String::from_utf8(bytes)
                .map_err(|e| ChannelError::InvalidMessage(format!("line is not UTF-8: {e}")))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            return HostMessage::parse(line)
                .map(Some)
                .map_err(|e| ChannelError::InvalidMessage(e.to_string()));
        }
    }
}

pub struct LineSink<W> {
    writer: Mutex<W>,
    closed: AtomicBool,
}

impl<W: AsyncWrite + Unpin + Send> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            closed: AtomicBool::new(false),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn write_line(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    }
}

impl LineSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessageSink for LineSink<W> {
    async fn send(&self, message: WorkerMessage) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ChannelError::Closed);
        }
        let bytes = serde_json::to_vec(&message)
            .map_err(|e| ChannelError::InvalidMessage(format!("failed to serialize: {e}")))?;
        if let Err(err) = self.write_line(&bytes).await {
            // 書けなくなったら以後は閉じているとみなす
            self.closed.store(true, Ordering::Release);
            return Err(err.into());
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}
