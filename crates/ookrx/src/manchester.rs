//! Manchester-style symbol-to-bit decoding
//!
//! The transmitter encodes each bit across a pair of pulse segments,
//! so the decoder tracks whether it is in a data phase or a clock
//! phase and on which level the last segment ended. Selected
//! transitions emit a bit; the end-of-transmission marker completes
//! the decode.

use thiserror::Error;

use crate::bitstream::{BitStream, BitStreamError};
use crate::symbol::Symbol;

/// Decoder phase
///
/// `D` states are data phases and `C` states are clock phases; the
/// trailing digit is the level the last segment left the line at
/// (0 = low, 1 = high).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    D0,
    D1,
    C0,
    C1,
}

/// Error decoding a symbol sequence
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManchesterError {
    /// No transition is defined for this state and symbol
    #[error("invalid manchester encoding: state={state:?} symbol={symbol:?}")]
    InvalidTransition { state: State, symbol: Symbol },

    /// Input continued after the end-of-transmission marker
    #[error("symbols after end of transmission")]
    SymbolsAfterEnd,

    /// Failure appending to the output stream
    #[error(transparent)]
    BitStream(#[from] BitStreamError),
}

/// What a transition does before the machine moves on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    EmitZero,
    EmitOne,
    NoBit,
    End,
}

/// The transition table
///
/// Any pair without an entry is an invalid encoding.
fn transition(state: State, symbol: Symbol) -> Option<(Action, State)> {
    use self::Action::*;
    use self::State::*;
    use crate::symbol::Symbol::*;

    match (state, symbol) {
        (C0, HighShort) => Some((EmitOne, D1)),
        (D1, LowShort) => Some((NoBit, C0)),
        (D1, LowLong) => Some((EmitZero, D0)),
        (D1, EndOfTransmission) => Some((End, C0)),
        (D0, HighShort) => Some((NoBit, C1)),
        (D0, HighLong) => Some((EmitOne, D1)),
        (C1, LowShort) => Some((EmitZero, D0)),
        (C1, EndOfTransmission) => Some((End, C0)),
        _ => None,
    }
}

/// Result of a Manchester decode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManchesterOutput {
    bits: BitStream,
    terminated: bool,
}

impl ManchesterOutput {
    /// Decoded bits, in emission order
    pub fn bits(&self) -> &BitStream {
        &self.bits
    }

    /// Take ownership of the decoded bits
    pub fn into_bits(self) -> BitStream {
        self.bits
    }

    /// True if an end-of-transmission marker was seen
    ///
    /// A decode that runs out of symbols without an end marker still
    /// succeeds, but `terminated()` is `false` so callers can tell a
    /// clean decode from a truncated one.
    pub fn terminated(&self) -> bool {
        self.terminated
    }
}

/// Decode a symbol sequence into bits
///
/// Starts in [`State::C0`] and consumes one symbol at a time. Any
/// symbol after the end marker fails the decode, as does a state and
/// symbol pair with no defined transition.
pub fn decode(symbols: &[Symbol]) -> Result<ManchesterOutput, ManchesterError> {
    let mut bits = BitStream::with_capacity(symbols.len());
    let mut state = State::C0;
    let mut terminated = false;

    for &symbol in symbols {
        if terminated {
            return Err(ManchesterError::SymbolsAfterEnd);
        }

        let (action, next) =
            transition(state, symbol).ok_or(ManchesterError::InvalidTransition { state, symbol })?;

        match action {
            Action::EmitZero => bits.add(0)?,
            Action::EmitOne => bits.add(1)?,
            Action::End => terminated = true,
            Action::NoBit => {}
        }
        state = next;
    }

    Ok(ManchesterOutput { bits, terminated })
}
