use std::time::{Duration, Instant};

use modem_protocol::symbol::Symbol;
use modem_protocol::{
    ends_with_trailer, parse, CheckPattern, NodeAddr, ACK_SEND_INIT, ACK_SEND_TIME, SENDER_INIT_TIME, TO_R,
};

use crate::channel::{read_symbol, transmit_bits, DeviceGuard};
use crate::node::Node;

/// Runs the receive loop forever: HUNT_ONE -> SKIP_PREAMBLE -> READ ->
/// VALIDATE -> DISPATCH -> DELIVER -> HUNT_ONE. Never returns; intended
/// to be the body of the node's receiver thread.
pub fn run(node: &Node) -> ! {
    loop {
        hunt_one(node);
    }
}

/// Acquires the node's device for one hunt-and-decode pass, releasing it
/// as soon as the pass concludes (by delivery or by timeout) so the
/// transmitter gets a chance to acquire it between passes.
fn hunt_one(node: &Node) {
    let mut device = node.device.acquire();

    let timeout = Duration::from_secs_f32(TO_R);
    let mut deadline = Instant::now() + timeout;

    loop {
        if Instant::now() >= deadline {
            return;
        }
        let symbol = read_symbol(&mut device, &node.tone);
        if matches!(symbol, Symbol::Zero | Symbol::One | Symbol::Delimiter) {
            deadline = Instant::now() + timeout;
        }
        if symbol == Symbol::One {
            break;
        }
    }

    skip_preamble(node, &mut device, deadline);
}

/// Returns `true` if the frame body was fully read, validated, and
/// dispatched; `false` on any timeout, which sends control back to
/// `hunt_one`.
fn skip_preamble(node: &Node, device: &mut DeviceGuard, mut deadline: Instant) -> bool {
    let timeout = Duration::from_secs_f32(TO_R);
    let mut prev = Symbol::One;

    loop {
        if Instant::now() >= deadline {
            return false;
        }
        let symbol = read_symbol(device, &node.tone);
        if matches!(symbol, Symbol::Zero | Symbol::One | Symbol::Delimiter) {
            deadline = Instant::now() + timeout;
        }
        if symbol == Symbol::Delimiter && prev != Symbol::Delimiter {
            break;
        }
        prev = symbol;
    }

    read_frame(node, device, deadline)
}

fn read_frame(node: &Node, device: &mut DeviceGuard, mut deadline: Instant) -> bool {
    let timeout = Duration::from_secs_f32(TO_R);
    let mut prev = Symbol::Delimiter;
    let mut bits = Vec::new();

    loop {
        if Instant::now() >= deadline {
            return false;
        }
        let symbol = read_symbol(device, &node.tone);
        if matches!(symbol, Symbol::Zero | Symbol::One | Symbol::Delimiter) {
            deadline = Instant::now() + timeout;
        }
        if symbol == prev || symbol == Symbol::None {
            continue;
        }
        prev = symbol;
        if let Some(bit) = symbol.bit() {
            bits.push(bit);
            if ends_with_trailer(&bits) {
                break;
            }
        }
    }

    validate(node, device, &bits)
}

fn validate(node: &Node, device: &mut DeviceGuard, accumulated: &[u8]) -> bool {
    let body = &accumulated[..accumulated.len() - modem_protocol::RECEIVER_TRAILER.len()];

    let frame = match parse(body) {
        Ok(frame) => frame,
        Err(_) => return false,
    };

    if !CheckPattern::valid_pair(frame.source, frame.check) {
        log::info!("UNIDENTIFIED SENDER: {:?}", frame.source);
        return false;
    }

    dispatch(node, device, &frame);
    true
}

fn dispatch(node: &Node, device: &mut DeviceGuard, frame: &modem_protocol::Frame) {
    let addressed_to_us = frame.dest == node.addr;
    let is_broadcast_from_other = frame.dest.is_broadcast() && frame.source != node.addr;

    if addressed_to_us {
        std::thread::sleep(Duration::from_secs_f32(ACK_SEND_INIT));
        send_ack(node, device);
    } else if is_broadcast_from_other {
        broadcast_ack_wait(node, frame.source);
        send_ack(node, device);
    }

    if addressed_to_us || is_broadcast_from_other {
        deliver(node, frame);
    }
}

/// The deterministic, address-based ordering that keeps two non-source
/// unicast nodes from colliding while ACKing the same broadcast.
fn broadcast_ack_wait(node: &Node, source: NodeAddr) {
    let wait = match node.addr.as_u8() {
        0b01 => SENDER_INIT_TIME,
        0b10 => {
            if source.as_u8() == 0b01 {
                SENDER_INIT_TIME
            } else {
                ACK_SEND_TIME
            }
        }
        0b11 => ACK_SEND_TIME,
        _ => SENDER_INIT_TIME,
    };
    std::thread::sleep(Duration::from_secs_f32(wait));
}

fn send_ack(node: &Node, device: &mut DeviceGuard) {
    transmit_bits(device, &node.tone, &node.line, &modem_protocol::ACK_BITS);
}

fn deliver(node: &Node, frame: &modem_protocol::Frame) {
    let newly_received = {
        let mut received = node.received.lock().unwrap();
        received.insert_if_new(frame.source, frame.seq)
    };

    if newly_received {
        if let Err(err) = node.received_log.record("[RECVD]", &frame.payload, frame.source.as_u8()) {
            log::error!("failed to write receive log: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use modem_core::{LineCoder, ToneCodec};
    use modem_device::mock::{RecordingPlayback, ScriptedCapture};
    use modem_protocol::{frame::transform, NodeAddr, Seq, BIT_DURATION, FREQ_DELIMITER, FREQ_ONE, FREQ_ZERO};
    use termcolor::Color;

    use super::*;
    use crate::logio::EventLog;

    /// Renders a fully-framed bit vector (as produced by [`transform`]) into
    /// the integer-PCM chunks a capture device would hand the receiver:
    /// one chunk per line-coded symbol, each exactly [`modem_protocol::CHUNK_SIZE`]
    /// samples, matching what [`ToneCodec::classify`] expects.
    fn wire_chunks(bits: &[u8]) -> Vec<Vec<i16>> {
        let tone = ToneCodec::new();
        let line = LineCoder::new();
        line.encode(bits)
            .into_iter()
            .map(|symbol| {
                let freq = match symbol {
                    Symbol::Zero => FREQ_ZERO,
                    Symbol::One => FREQ_ONE,
                    Symbol::Delimiter => FREQ_DELIMITER,
                    Symbol::None => unreachable!("line coder never emits None"),
                };
                tone.synthesize(freq, BIT_DURATION)
                    .iter()
                    .map(|&s| (s * i16::MAX as f32) as i16)
                    .collect()
            })
            .collect()
    }

    fn tmp_path(label: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("modem-receiver-test-{label}-{}.txt", std::process::id()));
        path
    }

    fn test_node(addr: NodeAddr, chunks: Vec<Vec<i16>>, label: &str) -> (Node, PathBuf) {
        let capture = ScriptedCapture::new(chunks, modem_protocol::CHUNK_SIZE);
        let device = Device::new(Box::new(capture), Box::new(RecordingPlayback::default()));
        let received_path = tmp_path(label);
        let sent_log = EventLog::new(tmp_path(&format!("{label}-sent")), Color::Green);
        let received_log = EventLog::new(received_path.clone(), Color::Cyan);
        (Node::new(addr, device, sent_log, received_log), received_path)
    }

    /// A unicast frame addressed to this node is decoded, validated, and
    /// delivered exactly once, with the expected payload and source.
    #[test]
    fn unicast_frame_is_delivered_and_logged() {
        let source = NodeAddr::new(0b01);
        let dest = NodeAddr::new(0b10);
        let wire = transform(&[1, 0, 1, 0], source, dest, Seq::from_bits([0, 1, 0]));

        let (node, receive_path) = test_node(dest, wire_chunks(&wire), "unicast");
        hunt_one(&node);

        let logged = std::fs::read_to_string(&receive_path).unwrap();
        assert!(logged.contains("[RECVD]: [1, 0, 1, 0] 1 "));
        let _ = std::fs::remove_file(&receive_path);
    }

    /// The same (source, counter) pair delivered twice (simulating a lost
    /// ACK forcing a retransmit) is logged only once.
    #[test]
    fn duplicate_frame_is_delivered_once() {
        let source = NodeAddr::new(0b01);
        let dest = NodeAddr::new(0b10);
        let seq = Seq::from_bits([0, 1, 1]);
        let wire = transform(&[1, 1, 0, 0], source, dest, seq);

        let mut chunks = wire_chunks(&wire);
        chunks.extend(wire_chunks(&wire));

        let (node, receive_path) = test_node(dest, chunks, "duplicate");
        hunt_one(&node);
        hunt_one(&node);

        let logged = std::fs::read_to_string(&receive_path).unwrap();
        assert_eq!(logged.matches("[RECVD]").count(), 1);
        let _ = std::fs::remove_file(&receive_path);
    }

    /// Frames not addressed to us (neither unicast-to-self nor a broadcast
    /// from someone else) are never delivered.
    #[test]
    fn frame_for_other_node_is_not_delivered() {
        let source = NodeAddr::new(0b01);
        let dest = NodeAddr::new(0b11);
        let wire = transform(&[1, 0, 0, 1], source, dest, Seq::from_bits([1, 0, 0]));

        // addr = 10: neither the destination (11) nor the broadcast case.
        let (node, receive_path) = test_node(NodeAddr::new(0b10), wire_chunks(&wire), "other");
        hunt_one(&node);

        assert!(std::fs::read_to_string(&receive_path).unwrap_or_default().is_empty());
        let _ = std::fs::remove_file(&receive_path);
    }

    /// Silence for longer than TO_R abandons the frame and returns to
    /// HUNT_ONE without delivering anything.
    #[test]
    fn idle_channel_times_out_without_delivering() {
        let silence = vec![vec![0i16; modem_protocol::CHUNK_SIZE]; 4];
        let (node, receive_path) = test_node(NodeAddr::new(0b01), silence, "idle");
        hunt_one(&node);

        assert!(std::fs::read_to_string(&receive_path).unwrap_or_default().is_empty());
        let _ = std::fs::remove_file(&receive_path);
    }
}
