//! Fixtures for multi-rank and codec-level tests.
//!
//! - [`run_ranks`] runs one closure per rank on scoped threads.
//! - [`CountingCodec`] wraps the wire encoding and counts calls.
//! - [`FailingCodec`] fails decoding after a fixed number of values.

use std::sync::atomic::{AtomicUsize, Ordering};

use mosaic_core::{Codec, Wire, WireError};

/// Run `f` once per item, each on its own scoped thread, and return the
/// results in item order.
///
/// Items are typically one transport per rank, so rank `i`'s result lands
/// at index `i`.
///
/// # Panics
///
/// Re-raises a panic from any rank.
pub fn run_ranks<X, R, F>(items: Vec<X>, f: F) -> Vec<R>
where
    X: Send,
    R: Send,
    F: Fn(X) -> R + Sync,
{
    let f = &f;
    std::thread::scope(|scope| {
        let handles: Vec<_> = items
            .into_iter()
            .map(|item| scope.spawn(move || f(item)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(r) => r,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

/// Wire encoding that counts encode and decode calls.
#[derive(Default)]
pub struct CountingCodec {
    pub encoded: AtomicUsize,
    pub decoded: AtomicUsize,
}

impl CountingCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encoded(&self) -> usize {
        self.encoded.load(Ordering::Relaxed)
    }

    pub fn decoded(&self) -> usize {
        self.decoded.load(Ordering::Relaxed)
    }
}

impl<T: Wire> Codec<T> for CountingCodec {
    fn encode(&self, value: &T, out: &mut Vec<u8>) {
        self.encoded.fetch_add(1, Ordering::Relaxed);
        value.encode(out);
    }

    fn decode(&self, input: &mut &[u8]) -> Result<T, WireError> {
        self.decoded.fetch_add(1, Ordering::Relaxed);
        T::decode(input)
    }
}

/// Wire encoding whose decode fails once `fail_after` values have been
/// decoded successfully.
pub struct FailingCodec {
    pub fail_after: usize,
    decoded: AtomicUsize,
}

impl FailingCodec {
    pub fn new(fail_after: usize) -> Self {
        Self {
            fail_after,
            decoded: AtomicUsize::new(0),
        }
    }
}

impl<T: Wire> Codec<T> for FailingCodec {
    fn encode(&self, value: &T, out: &mut Vec<u8>) {
        value.encode(out);
    }

    fn decode(&self, input: &mut &[u8]) -> Result<T, WireError> {
        let n = self.decoded.fetch_add(1, Ordering::Relaxed);
        if n >= self.fail_after {
            return Err(WireError::Malformed {
                detail: format!("decode #{n} rejected by FailingCodec"),
            });
        }
        T::decode(input)
    }
}
