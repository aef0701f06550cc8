//! # Streamed Bodies
//!
//! A [`BodyStream`] is a response body produced incrementally. The adapter
//! layer never reads it: it is handed from the handler to the canonical
//! response (which then reports `is_streamed`) and finally to the framework
//! binding, which writes chunks as they arrive.
//!
//! [`channel()`] pairs a [`StreamSender`] with a stream backed by a `may`
//! mpsc channel, so a coroutine can keep producing after the handler returns:
//!
//! ```rust
//! use oasbridge::stream;
//!
//! let (tx, body) = stream::channel();
//! tx.send_event("tick");
//! drop(tx);
//! let chunks: Vec<_> = body.collect();
//! assert_eq!(&chunks[0][..], b"data: tick\n\n");
//! ```

use bytes::Bytes;
use may::sync::mpsc;
use std::fmt;

/// Incrementally produced response body.
pub struct BodyStream {
    inner: Box<dyn Iterator<Item = Bytes> + Send>,
}

impl BodyStream {
    pub fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self {
            inner: Box::new(chunks.into_iter()),
        }
    }

    /// Drain the stream into one buffer. Only for tests and tooling; the
    /// request path never calls this.
    pub fn concat(self) -> Bytes {
        let mut out = Vec::new();
        for chunk in self {
            out.extend_from_slice(&chunk);
        }
        Bytes::from(out)
    }
}

impl Iterator for BodyStream {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        self.inner.next()
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream").finish_non_exhaustive()
    }
}

/// Producer side of a channel-backed [`BodyStream`].
///
/// Clone it to produce from several coroutines. The stream ends once every
/// sender is dropped.
#[derive(Clone)]
pub struct StreamSender {
    tx: mpsc::Sender<Bytes>,
}

impl StreamSender {
    /// Queue a raw chunk. Returns `false` once the receiving side is gone.
    pub fn send(&self, chunk: impl Into<Bytes>) -> bool {
        self.tx.send(chunk.into()).is_ok()
    }

    /// Queue one `text/event-stream` frame (`data: ...\n\n`).
    pub fn send_event(&self, data: &str) -> bool {
        let mut frame = String::with_capacity(data.len() + 8);
        for line in data.split('\n') {
            frame.push_str("data: ");
            frame.push_str(line);
            frame.push('\n');
        }
        frame.push('\n');
        self.send(frame)
    }
}

struct ChannelChunks {
    rx: mpsc::Receiver<Bytes>,
}

impl Iterator for ChannelChunks {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        self.rx.recv().ok()
    }
}

pub fn channel() -> (StreamSender, BodyStream) {
    let (tx, rx) = mpsc::channel();
    (StreamSender { tx }, BodyStream::new(ChannelChunks { rx }))
}
