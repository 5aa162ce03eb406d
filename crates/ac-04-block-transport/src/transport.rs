//! # Byte-Stream Transport
//!
//! One in-process duplex pipe. Every miner writes through the single writer
//! lock; every validator reads through the single reader lock, so each frame
//! reaches exactly one validator.
//!
//! Both sides keep their partial progress inside the lock. A cancelled `send`
//! leaves the rest of its frame queued and the next `send` (or `close`)
//! finishes it first. A cancelled `recv` keeps the bytes it has read. The
//! stream never sees an interleaved or torn frame.
//!
//! A failed read or write is retried by the caller. Partial progress stays
//! in place, and only EOF or an undecodable frame closes the reader.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::codec::{self, BlockMessage};
use crate::{TransportError, DEFAULT_BUFFER_BYTES};

const READ_CHUNK: usize = 4096;

/// Upper bound on flushing a half-written frame during `close`.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct WriterState<W = DuplexStream> {
    stream: W,
    pending: Vec<u8>,
    written: usize,
}

impl<W: AsyncWrite + Unpin> WriterState<W> {
    fn new(stream: W, capacity: usize) -> Self {
        Self {
            stream,
            pending: Vec::with_capacity(capacity),
            written: 0,
        }
    }

    /// Finish any earlier frame, then write `frame`.
    ///
    /// If the queued remainder is `frame` itself (a retry after a failed
    /// write), it is completed instead of queued a second time.
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        if self.pending != frame {
            self.flush_pending().await?;
            self.pending.extend_from_slice(frame);
        }
        self.flush_pending().await
    }

    /// Write out whatever remains of the current frame. Cancel-safe.
    async fn flush_pending(&mut self) -> io::Result<()> {
        while self.written < self.pending.len() {
            let n = self.stream.write(&self.pending[self.written..]).await?;
            if n == 0 {
                return Err(io::ErrorKind::WriteZero.into());
            }
            self.written += n;
        }
        self.pending.clear();
        self.written = 0;
        Ok(())
    }
}

#[derive(Debug)]
struct ReaderState<R = DuplexStream> {
    stream: R,
    buffer: Vec<u8>,
    closed: bool,
}

impl<R: AsyncRead + Unpin> ReaderState<R> {
    fn new(stream: R, capacity: usize) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(capacity),
            closed: false,
        }
    }

    /// Read until `frame_len` bytes are buffered and return them.
    ///
    /// A read error leaves the buffered bytes and the open state untouched.
    /// EOF latches `closed`.
    async fn next_frame(&mut self, frame_len: usize) -> Result<Vec<u8>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        let mut chunk = [0u8; READ_CHUNK];
        while self.buffer.len() < frame_len {
            let wanted = (frame_len - self.buffer.len()).min(READ_CHUNK);
            let n = self
                .stream
                .read(&mut chunk[..wanted])
                .await
                .map_err(|e| TransportError::Io(e.to_string()))?;
            if n == 0 {
                self.closed = true;
                if self.buffer.is_empty() {
                    return Err(TransportError::Closed);
                }
                let partial = self.buffer.len();
                self.buffer.clear();
                warn!(bytes = partial, "[ac-04] stream ended inside a frame");
                return Err(TransportError::Malformed(codec::CodecError::WrongFrameLength {
                    expected: frame_len,
                    found: partial,
                }));
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
        Ok(self.buffer.drain(..frame_len).collect())
    }
}

/// Shared block channel between miners and validators.
#[derive(Debug)]
pub struct BlockTransport {
    tx_per_block: usize,
    frame_len: usize,
    writer: Mutex<Option<WriterState>>,
    reader: Mutex<ReaderState>,
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
}

impl BlockTransport {
    /// Transport for blocks of `tx_per_block` transactions.
    pub fn new(tx_per_block: usize) -> Self {
        Self::with_buffer(tx_per_block, DEFAULT_BUFFER_BYTES)
    }

    /// Transport with an explicit pipe buffer size (at least one frame).
    pub fn with_buffer(tx_per_block: usize, buffer_bytes: usize) -> Self {
        let frame_len = codec::frame_size(tx_per_block);
        let (write_end, read_end) = tokio::io::duplex(buffer_bytes.max(frame_len));
        Self {
            tx_per_block,
            frame_len,
            writer: Mutex::new(Some(WriterState::new(write_end, frame_len))),
            reader: Mutex::new(ReaderState::new(read_end, frame_len)),
            frames_sent: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
        }
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn transactions_per_block(&self) -> usize {
        self.tx_per_block
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    /// Write one complete frame under the writer lock.
    pub async fn send(&self, msg: &BlockMessage) -> Result<(), TransportError> {
        let frame = codec::encode(msg, self.tx_per_block)?;

        let mut guard = self.writer.lock().await;
        let state = guard.as_mut().ok_or(TransportError::Closed)?;
        state.write_frame(&frame).await.map_err(map_write_error)?;

        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        debug!(
            miner = msg.miner_id,
            block = %msg.block.id,
            bytes = frame.len(),
            "[ac-04] frame written"
        );
        Ok(())
    }

    /// Read one complete frame under the reader lock.
    ///
    /// EOF on a frame boundary is `Closed`; EOF inside a frame or an
    /// undecodable frame is `Malformed`, after which the reader stays closed.
    /// A read error is `Io` and the next call picks up where it stopped.
    pub async fn recv(&self) -> Result<BlockMessage, TransportError> {
        let mut state = self.reader.lock().await;
        let frame = state.next_frame(self.frame_len).await?;
        match codec::decode(&frame, self.tx_per_block) {
            Ok(msg) => {
                self.frames_received.fetch_add(1, Ordering::Relaxed);
                Ok(msg)
            }
            Err(e) => {
                state.closed = true;
                warn!(error = %e, "[ac-04] malformed frame");
                Err(TransportError::Malformed(e))
            }
        }
    }

    /// Close the write side. Readers drain what was sent, then see `Closed`.
    pub async fn close(&self) {
        let Some(mut state) = self.writer.lock().await.take() else {
            return;
        };
        match tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, state.flush_pending()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "[ac-04] could not flush last frame"),
            Err(_) => warn!("[ac-04] timed out flushing last frame"),
        }
        if let Err(e) = state.stream.shutdown().await {
            debug!(error = %e, "[ac-04] shutdown of write side failed");
        }
        debug!(sent = self.frames_sent(), "[ac-04] transport closed");
    }

    pub async fn is_closed(&self) -> bool {
        self.writer.lock().await.is_none()
    }
}

fn map_write_error(e: io::Error) -> TransportError {
    match e.kind() {
        io::ErrorKind::BrokenPipe => TransportError::Closed,
        _ => TransportError::Io(e.to_string()),
    }
}
