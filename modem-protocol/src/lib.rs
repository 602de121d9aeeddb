pub mod addr;
pub mod frame;
pub mod seq;
pub mod symbol;

pub use addr::{CheckPattern, NodeAddr};
pub use frame::{ends_with_trailer, parse, Frame, ParseError};
pub use seq::{ReceivedSet, Seq, SequenceCounter};
pub use symbol::Symbol;

/// Audio sample rate, in Hz, shared by capture and synthesis.
pub const SAMPLE_RATE: u32 = 44100;

/// Duration of a single symbol (data tone or delimiter), in seconds.
pub const BIT_DURATION: f32 = 0.2;

/// Samples per symbol: `SAMPLE_RATE as f32 * BIT_DURATION`.
pub const CHUNK_SIZE: usize = 8820;

static_assertions::const_assert_eq!(CHUNK_SIZE, 8820);
static_assertions::const_assert!(CW_MIN < CW_MAX);
static_assertions::const_assert_eq!(RECEIVER_TRAILER.len() + 1, TRAILER.len());

/// Tone frequencies, in Hz.
pub const FREQ_ZERO: f32 = 440.0;
pub const FREQ_ONE: f32 = 1320.0;
pub const FREQ_DELIMITER: f32 = 880.0;

/// Classification tolerance around each tone frequency, in Hz.
pub const TOLERANCE: f32 = 50.0;

pub const CW_MIN: u32 = 4;
pub const CW_MAX: u32 = 1024;

pub const SIFS: f32 = 0.3;
pub const DIFS: f32 = 1.5;
pub const SLOT_DURATION: f32 = 1.0;

pub const TO_R: f32 = 1.5;
pub const TO_A: f32 = 1.5;

pub const ACK_SEND_INIT: f32 = 1.0;
pub const ACK_SEND_TIME: f32 = 6.4;
pub const RECEIVER_INIT_TIME: f32 = 0.5;
pub const SENDER_INIT_TIME: f32 = 1.0;

pub const PREAMBLE: [u8; 6] = [0, 0, 0, 0, 0, 1];
pub const TRAILER: [u8; 7] = [0, 0, 0, 0, 0, 1, 1];
/// The receiver only matches the first six bits of [`TRAILER`]; the sender's
/// trailing `1` is consumed by the post-frame silence, not by the parser.
pub const RECEIVER_TRAILER: [u8; 6] = [0, 0, 0, 0, 0, 1];

/// Literal ACK bit vector: preamble of four 1s, a leading `1` that doubles as
/// the ACK Receiver's delimiter-hunt target, payload, and a single trailer
/// bit. The Receiver side emits this whole vector; the sender side only ever
/// matches the payload window derived from it (see [`ACK_PAYLOAD`]).
pub const ACK_BITS: [u8; 11] = [1, 1, 1, 1, 0, 1, 0, 0, 0, 1, 1];

/// Payload window a transmitter matches against while waiting for an ACK.
/// Derived from [`ACK_BITS`] rather than hand-copied, since the bit string
/// in prose descriptions of this frame does not agree with the literal
/// vector bit-for-bit.
pub fn ack_payload() -> &'static [u8] {
    &ACK_BITS[5..ACK_BITS.len() - 1]
}
