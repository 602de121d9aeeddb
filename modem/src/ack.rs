use std::time::{Duration, Instant};

use modem_core::ToneCodec;
use modem_protocol::symbol::Symbol;
use modem_protocol::{ack_payload, TO_A};

use crate::channel::{read_symbol, DeviceGuard};

/// Listens for the fixed ACK frame. Returns `true` on an exact payload
/// match, `false` on timeout or mismatch -- the caller (the transmitter's
/// CSMA/CA loop) decides what failure means for retry. The decode here is
/// inlined rather than routed through the general line decoder, since it
/// needs to bail out the instant the accumulated bits exceed the target
/// length rather than decoding an entire stream first.
pub fn listen_for_ack(device: &mut DeviceGuard, tone: &ToneCodec) -> bool {
    let timeout = Duration::from_secs_f32(TO_A);
    let mut deadline = Instant::now() + timeout;

    // HUNT_ZERO: the ACK's preamble is four 1s, so the first non-preamble
    // symbol the receiver sees is a 0.
    loop {
        if Instant::now() >= deadline {
            return false;
        }
        let symbol = read_symbol(device, tone);
        if matches!(symbol, Symbol::Zero | Symbol::One | Symbol::Delimiter) {
            deadline = Instant::now() + timeout;
        }
        if symbol == Symbol::Zero {
            break;
        }
    }

    // SKIP_ZEROS: consume until the delimiter following that 0.
    loop {
        if Instant::now() >= deadline {
            return false;
        }
        let symbol = read_symbol(device, tone);
        if matches!(symbol, Symbol::Zero | Symbol::One | Symbol::Delimiter) {
            deadline = Instant::now() + timeout;
        }
        if symbol == Symbol::Delimiter {
            break;
        }
    }

    // READ: decode bits until they match the ACK payload exactly, or
    // exceed its length (mismatch), or the rolling timeout fires.
    let target = ack_payload();
    let mut prev = Symbol::Delimiter;
    let mut bits = Vec::with_capacity(target.len());

    loop {
        if Instant::now() >= deadline {
            return false;
        }
        let symbol = read_symbol(device, tone);
        if matches!(symbol, Symbol::Zero | Symbol::One | Symbol::Delimiter) {
            deadline = Instant::now() + timeout;
        }
        if symbol == prev || symbol == Symbol::None {
            continue;
        }
        prev = symbol;
        if let Some(bit) = symbol.bit() {
            bits.push(bit);
            if bits.len() > target.len() {
                return false;
            }
            if bits.len() == target.len() {
                return bits == target;
            }
        }
    }
}
