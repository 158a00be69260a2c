//! The append-only log shared by one publication and its subscriptions.

use std::sync::{Arc, Mutex};

use fixgw_types::{LogPosition, SessionId};

use crate::{Result, TransportError};

/// Maximum single-frame claim size. Mirrors a conservative Aeron
/// max-message-length; chosen so `try_claim` can reject pathological
/// requests without the caller needing to know the log's total capacity.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

struct Frame {
    position: LogPosition,
    bytes: Vec<u8>,
}

/// Shared state behind one logical publication (one stream incarnation).
///
/// Identified by a [`SessionId`] the way an Aeron `Image` carries the
/// publishing session's id — when a leader steps down and a new one takes
/// over, a fresh `TransportLog` with a new `SessionId` is created and
/// positions restart at zero, so a subscription watching across a
/// leadership change must notice the session-id change and resync.
pub struct TransportLog {
    session_id: SessionId,
    frames: Vec<Frame>,
    next_position: u64,
}

impl TransportLog {
    pub fn new(session_id: SessionId) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            session_id,
            frames: Vec::new(),
            next_position: 0,
        }))
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }
}

/// Write side of a [`TransportLog`]. Only one producer should hold a given
/// `Publication` at a time; the replication core's leader role and the FIX
/// session's outbound path are the two callers in this workspace.
#[derive(Clone)]
pub struct Publication {
    inner: Arc<Mutex<TransportLog>>,
}

impl Publication {
    pub fn new(inner: Arc<Mutex<TransportLog>>) -> Self {
        Self { inner }
    }

    pub fn session_id(&self) -> SessionId {
        self.inner.lock().unwrap().session_id
    }

    pub fn position(&self) -> LogPosition {
        LogPosition::new(self.inner.lock().unwrap().next_position)
    }

    /// Reserves `len` bytes in the log and hands back a [`BufferClaim`] the
    /// caller fills in directly, then must `commit` or `abort`.
    ///
    /// A claimed slot must be released on every exit path; `BufferClaim`'s
    /// `Drop` aborts automatically if the caller never calls either, so an
    /// early return or a panic unwind can't leak a half-claimed slot.
    pub fn try_claim(&self, len: usize) -> Result<BufferClaim<'_>> {
        if len == 0 || len > MAX_FRAME_LEN {
            return Err(TransportError::InvalidLength(len));
        }
        let position = self.position();
        Ok(BufferClaim {
            publication: self,
            position,
            buffer: vec![0u8; len],
            resolved: false,
        })
    }

    /// Convenience wrapper over `try_claim` for callers that already have a
    /// complete frame in hand.
    pub fn offer(&self, bytes: &[u8]) -> Result<LogPosition> {
        let mut claim = self.try_claim(bytes.len())?;
        claim.as_mut_slice().copy_from_slice(bytes);
        Ok(claim.commit())
    }

    fn commit_frame(&self, position: LogPosition, bytes: Vec<u8>) {
        let mut log = self.inner.lock().unwrap();
        log.frames.push(Frame { position, bytes });
        log.next_position = position.value() + log.frames.last().unwrap().bytes.len() as u64;
    }

    pub fn subscription(&self) -> Subscription {
        Subscription {
            inner: Arc::clone(&self.inner),
            cursor: 0,
        }
    }
}

/// A scoped acquisition of a slice of the publication's log.
///
/// Must be released via [`BufferClaim::commit`] or [`BufferClaim::abort`];
/// if dropped without either, it aborts (no bytes are written to the log).
pub struct BufferClaim<'p> {
    publication: &'p Publication,
    position: LogPosition,
    buffer: Vec<u8>,
    resolved: bool,
}

impl<'p> BufferClaim<'p> {
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub fn position(&self) -> LogPosition {
        self.position
    }

    /// Appends the claimed bytes to the log and returns the position they
    /// were written at.
    pub fn commit(mut self) -> LogPosition {
        self.resolved = true;
        let position = self.position;
        let bytes = std::mem::take(&mut self.buffer);
        self.publication.commit_frame(position, bytes);
        position
    }

    /// Discards the claim; nothing is written to the log.
    pub fn abort(mut self) {
        self.resolved = true;
    }
}

impl Drop for BufferClaim<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::warn!(position = %self.position.value(), "buffer claim dropped without commit/abort");
        }
    }
}

/// Read side of a [`TransportLog`]. Each subscriber owns an independent
/// cursor; polling one subscription never affects another.
pub struct Subscription {
    inner: Arc<Mutex<TransportLog>>,
    cursor: u64,
}

impl Subscription {
    /// Repositions the read cursor, used when resyncing from the archive
    /// reader after a leader/session-id change.
    pub fn seek(&mut self, position: LogPosition) {
        self.cursor = position.value();
    }

    pub fn position(&self) -> LogPosition {
        LogPosition::new(self.cursor)
    }

    /// Delivers up to `limit` fragments whose position is `>= cursor`, in
    /// log order, to `handler`. Returns the number of fragments delivered.
    pub fn poll(&mut self, handler: &mut dyn FragmentHandler, limit: usize) -> usize {
        let log = self.inner.lock().unwrap();
        let session_id = log.session_id;
        let mut delivered = 0;
        for frame in &log.frames {
            if delivered >= limit {
                break;
            }
            if frame.position.value() < self.cursor {
                continue;
            }
            handler.on_fragment(session_id, frame.position, &frame.bytes);
            self.cursor = frame.position.value() + frame.bytes.len() as u64;
            delivered += 1;
        }
        delivered
    }
}

/// Callback invoked once per delivered fragment.
pub trait FragmentHandler {
    fn on_fragment(&mut self, session_id: SessionId, position: LogPosition, data: &[u8]);
}

impl<F> FragmentHandler for F
where
    F: FnMut(SessionId, LogPosition, &[u8]),
{
    fn on_fragment(&mut self, session_id: SessionId, position: LogPosition, data: &[u8]) {
        (self)(session_id, position, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publication() -> Publication {
        Publication::new(TransportLog::new(SessionId::new(1)))
    }

    #[test]
    fn offer_then_poll_delivers_in_order() {
        let publication = publication();
        let mut subscription = publication.subscription();

        let p1 = publication.offer(b"alpha").unwrap();
        let p2 = publication.offer(b"beta").unwrap();
        assert!(p2 > p1);

        let mut seen = Vec::new();
        subscription.poll(
            &mut |_sid, pos, data: &[u8]| seen.push((pos, data.to_vec())),
            10,
        );
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1, b"alpha");
        assert_eq!(seen[1].1, b"beta");
    }

    #[test]
    fn claim_dropped_without_commit_writes_nothing() {
        let publication = publication();
        {
            let mut claim = publication.try_claim(4).unwrap();
            claim.as_mut_slice().copy_from_slice(b"test");
            // dropped here without commit() or abort()
        }
        let mut subscription = publication.subscription();
        let mut count = 0;
        subscription.poll(&mut |_, _, _| count += 1, 10);
        assert_eq!(count, 0);
    }

    #[test]
    fn independent_subscriptions_have_independent_cursors() {
        let publication = publication();
        publication.offer(b"one").unwrap();

        let mut sub_a = publication.subscription();
        let mut a_count = 0;
        sub_a.poll(&mut |_, _, _| a_count += 1, 10);
        assert_eq!(a_count, 1);

        publication.offer(b"two").unwrap();
        let mut sub_b = publication.subscription();
        let mut b_count = 0;
        sub_b.poll(&mut |_, _, _| b_count += 1, 10);
        assert_eq!(b_count, 2, "fresh subscription sees everything written so far");
    }

    #[test]
    fn zero_length_claim_is_rejected() {
        let publication = publication();
        assert_eq!(
            publication.try_claim(0).unwrap_err(),
            TransportError::InvalidLength(0)
        );
    }
}
