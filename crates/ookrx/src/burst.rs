//! Pulse bursts and their wire record
//!
//! A burst is one capture window's worth of (high, low) pulse timing
//! pairs plus the capture offset. On the wire a burst is a fixed
//! little-endian record:
//!
//! ```txt
//! magic:    u32   = 0x3636_0001
//! position: u64   nanoseconds since the capture daemon started
//! count:    u32   number of pulses
//! count ×  (high: u32, low: u32, frequency_offset: i32)
//! ```

use std::io;
use std::time::Duration;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

/// Wire record version tag
pub const BURST_MAGIC: u32 = 0x3636_0001;

// Refuse to allocate for absurd pulse counts in a corrupt record
pub(crate) const MAX_WIRE_PULSES: u32 = 1 << 20;

/// Error decoding a burst wire record
#[derive(Error, Debug)]
pub enum WireError {
    /// The record did not begin with [`BURST_MAGIC`]
    #[error("bad version tag in burst record: {0:#010x}")]
    BadMagic(u32),

    /// The record claims zero pulses
    #[error("burst record contains no pulses")]
    Empty,

    /// The record claims an implausible number of pulses
    #[error("burst record claims {0} pulses")]
    OversizePulseCount(u32),

    /// The record was truncated or unreadable
    #[error("reading burst record: {0}")]
    Io(#[from] io::Error),
}

/// One measured pulse: carrier on, then off
///
/// Durations are in nanoseconds. `frequency_offset` is the measured
/// carrier offset in Hz, kept for diagnostics; the decoder only uses
/// the durations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pulse {
    /// Duration the carrier was on
    pub high: u32,
    /// Duration the carrier was off afterwards
    pub low: u32,
    /// Carrier frequency offset, Hz
    pub frequency_offset: i32,
}

/// An ordered, non-empty sequence of pulses plus capture offset
///
/// Bursts are produced by a capture layer and consumed read-only by
/// the decoder; nothing here mutates a burst after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Burst {
    position: Duration,
    pulses: Vec<Pulse>,
}

impl Burst {
    /// New burst from captured pulses
    ///
    /// `position` is the offset of this burst from the start of the
    /// capture. The pulse sequence must be non-empty.
    pub fn new(position: Duration, pulses: Vec<Pulse>) -> Result<Self, WireError> {
        if pulses.is_empty() {
            return Err(WireError::Empty);
        }
        Ok(Self { position, pulses })
    }

    /// Capture offset of this burst
    pub fn position(&self) -> Duration {
        self.position
    }

    /// Pulses in capture order; never empty
    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    /// Serialize to the wire record
    pub fn encode_to<W: io::Write>(&self, mut sink: W) -> io::Result<()> {
        sink.write_u32::<LittleEndian>(BURST_MAGIC)?;
        sink.write_u64::<LittleEndian>(self.position.as_nanos() as u64)?;
        sink.write_u32::<LittleEndian>(self.pulses.len() as u32)?;
        for pulse in &self.pulses {
            sink.write_u32::<LittleEndian>(pulse.high)?;
            sink.write_u32::<LittleEndian>(pulse.low)?;
            sink.write_i32::<LittleEndian>(pulse.frequency_offset)?;
        }
        Ok(())
    }

    /// Deserialize from the wire record
    pub fn decode_from<R: io::Read>(mut source: R) -> Result<Self, WireError> {
        let magic = source.read_u32::<LittleEndian>()?;
        if magic != BURST_MAGIC {
            return Err(WireError::BadMagic(magic));
        }

        let position = Duration::from_nanos(source.read_u64::<LittleEndian>()?);
        let count = source.read_u32::<LittleEndian>()?;
        if count == 0 {
            return Err(WireError::Empty);
        }
        if count > MAX_WIRE_PULSES {
            return Err(WireError::OversizePulseCount(count));
        }

        let mut pulses = Vec::with_capacity(count as usize);
        for _ in 0..count {
            pulses.push(Pulse {
                high: source.read_u32::<LittleEndian>()?,
                low: source.read_u32::<LittleEndian>()?,
                frequency_offset: source.read_i32::<LittleEndian>()?,
            });
        }

        Ok(Self { position, pulses })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_burst() -> Burst {
        Burst::new(
            Duration::from_micros(1500),
            vec![
                Pulse {
                    high: 100,
                    low: 200,
                    frequency_offset: -4,
                },
                Pulse {
                    high: 200,
                    low: 1000,
                    frequency_offset: 7,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_burst_rejected() {
        assert!(matches!(
            Burst::new(Duration::ZERO, Vec::new()),
            Err(WireError::Empty)
        ));
    }

    #[test]
    fn test_wire_layout() {
        let mut wire = Vec::new();
        sample_burst().encode_to(&mut wire).unwrap();

        // magic + position + count + 2 × 12-byte pulses
        assert_eq!(wire.len(), 4 + 8 + 4 + 24);
        assert_eq!(&wire[0..4], &[0x01, 0x00, 0x36, 0x36]);
        // position: 1500 µs = 1_500_000 ns, little-endian
        assert_eq!(
            &wire[4..12],
            &1_500_000u64.to_le_bytes()
        );
        assert_eq!(&wire[12..16], &2u32.to_le_bytes());
        assert_eq!(&wire[16..20], &100u32.to_le_bytes());
        assert_eq!(&wire[20..24], &200u32.to_le_bytes());
        assert_eq!(&wire[24..28], &(-4i32).to_le_bytes());
    }

    #[test]
    fn test_encode_decode() {
        let burst = sample_burst();
        let mut wire = Vec::new();
        burst.encode_to(&mut wire).unwrap();
        let decoded = Burst::decode_from(wire.as_slice()).unwrap();
        assert_eq!(decoded, burst);
    }

    #[test]
    fn test_bad_magic() {
        let mut wire = Vec::new();
        sample_burst().encode_to(&mut wire).unwrap();
        wire[3] = 0x77;
        assert!(matches!(
            Burst::decode_from(wire.as_slice()),
            Err(WireError::BadMagic(_))
        ));
    }

    #[test]
    fn test_truncated_record() {
        let mut wire = Vec::new();
        sample_burst().encode_to(&mut wire).unwrap();
        wire.truncate(wire.len() - 5);
        assert!(matches!(
            Burst::decode_from(wire.as_slice()),
            Err(WireError::Io(_))
        ));
    }

    #[test]
    fn test_zero_pulse_count() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&BURST_MAGIC.to_le_bytes());
        wire.extend_from_slice(&0u64.to_le_bytes());
        wire.extend_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            Burst::decode_from(wire.as_slice()),
            Err(WireError::Empty)
        ));
    }

    #[test]
    fn test_oversize_pulse_count() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&BURST_MAGIC.to_le_bytes());
        wire.extend_from_slice(&0u64.to_le_bytes());
        wire.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            Burst::decode_from(wire.as_slice()),
            Err(WireError::OversizePulseCount(_))
        ));
    }
}
