//! Communication substrate for Mosaic.
//!
//! A [`Transport`] moves raw byte messages between ranks. A
//! [`Communicator`] builds the collectives on top of it: broadcast,
//! scatter, gather, all-gather, neighbor exchange and the coloring-scheduled
//! exchange used for halo refresh.
//!
//! # Framing
//!
//! Every logical payload travels as two messages on the same ordered pair
//! of ranks: an 8-byte little-endian `u64` byte count, then the payload.
//! The receiver checks the count against
//! [`CommConfig::max_message_bytes`] before accepting the payload and
//! checks the payload length against the count afterwards.
//!
//! # Failure model
//!
//! Collectives block until their post-conditions hold on the calling rank.
//! There are no timeouts and no retries. Any error poisons the
//! communicator, and every later call fails with [`CommError::Poisoned`].
//! All ranks must call the same collectives in the same order.
//!
//! # Backends
//!
//! - [`LocalCluster`]: one [`ThreadTransport`] per rank, wired with
//!   crossbeam channels, for running every rank as a thread.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod collective;
pub mod config;
pub mod error;
pub mod local;
pub mod metrics;
pub mod scratch;
pub mod transport;

pub use collective::Communicator;
pub use config::CommConfig;
pub use error::CommError;
pub use local::{LocalCluster, ThreadTransport};
pub use metrics::CommMetrics;
pub use scratch::CommScratch;
pub use transport::Transport;
