//! # ookrx: OOK pulse-timing demodulation
//!
//! This crate decodes captured on-off-keying (OOK) radio pulse
//! timing into a raw bitstream. A capture layer measures, for each
//! pulse, how long the carrier was on (`high`) and how long it was
//! off afterwards (`low`); one capture window's worth of those pairs
//! is a [`Burst`]. From a burst, the decoder recovers the bit
//! sequence the transmitter encoded with a Manchester-style line
//! code over variable-length pulses.
//!
//! Decoding runs in four stages, rebuilt from scratch for every
//! burst:
//!
//! 1. Cluster the observed durations into discrete timing classes
//!    ([`ClusterSet`]), without knowing the transmitter's nominal
//!    timings in advance.
//! 2. Label the classes with physical-layer symbols—short/long
//!    pulses and the end-of-transmission marker ([`SymbolTable`]).
//! 3. Translate the pulses into a linear symbol sequence and run a
//!    finite-state machine over it, emitting a bit on selected
//!    transitions.
//! 4. Collect the bits in a [`BitStream`], which readers can walk
//!    forwards, rewind, and group into LSB-first nibbles.
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use ookrx::{Burst, OokDecoder, Pulse};
//!
//! // three pulses, timed in nanoseconds by the capture layer
//! let pulses = vec![
//!     Pulse { high: 100, low: 200, frequency_offset: 0 },
//!     Pulse { high: 100, low: 100, frequency_offset: 0 },
//!     Pulse { high: 200, low: 1000, frequency_offset: 0 },
//! ];
//! let burst = Burst::new(Duration::from_millis(4), pulses).unwrap();
//!
//! let decoded = OokDecoder::new().decode(&burst).unwrap();
//! assert_eq!(decoded.bit_string(), "1001");
//!
//! // the burst ended with an explicit end-of-transmission marker
//! assert!(decoded.terminated());
//! ```
//!
//! A burst that fails to decode—noisy timing, a malformed symbol
//! sequence, data after the end marker—is reported as a
//! [`DecodeError`] for that burst alone. Callers working through a
//! capture archive typically log the failure and continue with the
//! next burst.
//!
//! Capture, storage, and transport live at the edges of this crate:
//! [`Burst`] carries its own little-endian wire record, bursts are
//! archived in tar containers ([`BurstArchive`], [`BurstWriter`]),
//! and they travel between processes as multicast datagrams
//! ([`BurstListener`], [`BurstPublisher`]). The decoding core never
//! performs I/O itself.

mod archive;
mod bitstream;
mod burst;
mod cluster;
mod decoder;
mod manchester;
mod net;
mod symbol;

pub use archive::{ArchiveError, BurstArchive, BurstWriter, Bursts};
pub use bitstream::{BitStream, BitStreamError, BitStreamReader};
pub use burst::{Burst, Pulse, WireError, BURST_MAGIC};
pub use cluster::{ClusterDescription, ClusterError, ClusterSet};
pub use decoder::{BurstDecode, DecodeError, OokDecoder, DEFAULT_TOLERANCE};
pub use manchester::{ManchesterError, ManchesterOutput, State};
pub use net::{BurstListener, BurstPublisher};
pub use symbol::{Symbol, SymbolError, SymbolTable};
