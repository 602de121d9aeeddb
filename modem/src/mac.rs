use std::time::{Duration, Instant};

use rand::Rng;

use modem_protocol::symbol::Symbol;
use modem_protocol::{NodeAddr, ACK_SEND_TIME, CW_MAX, CW_MIN, DIFS, RECEIVER_INIT_TIME, SIFS, SLOT_DURATION};

use crate::ack::listen_for_ack;
use crate::channel::{read_symbol, transmit_bits, DeviceGuard};
use crate::node::Node;
use modem_core::ToneCodec;

/// Carrier sense: one chunk read, true iff it classifies as a channel
/// symbol (as opposed to silence/noise).
fn carrier_sense(device: &mut DeviceGuard, tone: &ToneCodec) -> bool {
    matches!(
        read_symbol(device, tone),
        Symbol::Zero | Symbol::One | Symbol::Delimiter
    )
}

/// Senses repeatedly for wall-clock duration `t`; returns `true` on the
/// first detection, `false` once `t` elapses with none.
fn sense_for(device: &mut DeviceGuard, tone: &ToneCodec, t: f32) -> bool {
    let deadline = Instant::now() + Duration::from_secs_f32(t);
    while Instant::now() < deadline {
        if carrier_sense(device, tone) {
            return true;
        }
    }
    false
}

/// Drives one fully framed bit vector through CSMA/CA until it's
/// acknowledged. `dest` drives unicast vs. broadcast ACK handling.
/// Retransmissions reuse the same frame (and therefore the same sequence
/// number) across attempts -- only the caller bumps the counter, once per
/// application message.
///
/// Acquires the node's device once for the whole attempt, retries
/// included, so the receiver thread is suspended for as long as this
/// transmission is in flight.
pub fn transmit(node: &Node, wire: &[u8], dest: NodeAddr) {
    let mut device = node.device.acquire();

    let mut cw = CW_MIN;
    let mut ack1_confirmed = false;
    let mut ack2_confirmed = false;

    loop {
        // Step 1: channel must be idle before we even begin backing off.
        while carrier_sense(&mut device, &node.tone) {
            // busy: no backoff decrement, just keep watching.
        }

        // Step 2: DIFS wait; restart from step 1 on mid-window carrier.
        if sense_for(&mut device, &node.tone, DIFS) {
            continue;
        }

        // Step 3: random backoff. A busy slot does not decrement the
        // counter and does not restart the attempt -- it keeps re-sensing
        // the same remaining slot count until an idle slot lets it
        // decrement, exactly like the original backoff loop.
        let mut slots = rand::thread_rng().gen_range(0..=cw);
        while slots > 0 {
            if !sense_for(&mut device, &node.tone, SLOT_DURATION) {
                slots -= 1;
            }
        }

        // Step 4: SIFS check; double CW and retry on busy.
        if sense_for(&mut device, &node.tone, SIFS) {
            cw = double_cw(cw);
            log::info!("channel busy at SIFS, doubling contention window to {cw}");
            continue;
        }

        // Step 5: transmit.
        transmit_bits(&mut device, &node.tone, &node.line, wire);

        // Steps 6/7: await ACK(s).
        if dest.is_broadcast() {
            if broadcast_ack_wait(&mut device, &node.tone, &mut ack1_confirmed, &mut ack2_confirmed) {
                return;
            }
        } else if listen_for_ack(&mut device, &node.tone) {
            return;
        } else {
            log::info!("ACK not received, retrying");
        }
    }
}

fn double_cw(cw: u32) -> u32 {
    let doubled = cw.saturating_mul(2);
    if doubled > CW_MAX {
        CW_MIN
    } else {
        doubled
    }
}

/// Waits for the two unicast ACKs a broadcast needs. A confirmation from
/// a prior attempt is remembered across retries (per the design notes:
/// this is a once-per-(counter, source) confirmation, not per retry) --
/// the second receive is skipped in favor of simply waiting out its
/// slot, since re-listening for an already-confirmed ACK would risk
/// consuming the other node's still-pending one.
fn broadcast_ack_wait(device: &mut DeviceGuard, tone: &ToneCodec, ack1: &mut bool, ack2: &mut bool) -> bool {
    if !*ack1 {
        *ack1 = listen_for_ack(device, tone);
    } else {
        std::thread::sleep(Duration::from_secs_f32(ACK_SEND_TIME));
    }

    std::thread::sleep(Duration::from_secs_f32(RECEIVER_INIT_TIME));

    if !*ack2 {
        *ack2 = listen_for_ack(device, tone);
    } else {
        std::thread::sleep(Duration::from_secs_f32(ACK_SEND_TIME));
    }

    *ack1 && *ack2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cw_doubles_and_resets_on_overflow() {
        assert_eq!(double_cw(4), 8);
        assert_eq!(double_cw(512), 1024);
        assert_eq!(double_cw(1024), CW_MIN);
    }
}
