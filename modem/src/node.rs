use std::sync::{Arc, Mutex};

use modem_core::{LineCoder, ToneCodec};
use modem_protocol::{NodeAddr, ReceivedSet, SequenceCounter};

use crate::channel::Device;
use crate::logio::EventLog;
use crate::messages::{confirm, read_message_file, MessageFileError};
use crate::{mac, receiver, thread};

/// Everything one running node owns: its own address, the shared audio
/// device, the codecs, and the two pieces of state the spec calls out as
/// process-lifetime and role-exclusive (`RECEIVED_SET` mutated only by
/// the receiver, the sequence counter only by the transmitter).
pub struct Node {
    pub addr: NodeAddr,
    pub device: Device,
    pub tone: ToneCodec,
    pub line: LineCoder,
    pub received: Mutex<ReceivedSet>,
    pub seq: Mutex<SequenceCounter>,
    pub sent_log: EventLog,
    pub received_log: EventLog,
}

impl Node {
    pub fn new(addr: NodeAddr, device: Device, sent_log: EventLog, received_log: EventLog) -> Self {
        Node {
            addr,
            device,
            tone: ToneCodec::new(),
            line: LineCoder::new(),
            received: Mutex::new(ReceivedSet::new()),
            seq: Mutex::new(SequenceCounter::new()),
            sent_log,
            received_log,
        }
    }
}

/// Spawns the receiver thread and drives the transmitter from
/// `messages.txt` on the calling thread until the file is exhausted, per
/// the external interfaces contract ("Receiver loops indefinitely;
/// Transmitter exits when the input file is exhausted").
pub fn run(node: Arc<Node>, messages_path: &std::path::Path, interactive: bool) -> Result<(), MessageFileError> {
    let receiver_node = Arc::clone(&node);
    thread::start("modem/receive", move || {
        receiver::run(&receiver_node);
    });

    drive_transmitter(&node, messages_path, interactive)
}

fn drive_transmitter(node: &Node, messages_path: &std::path::Path, interactive: bool) -> Result<(), MessageFileError> {
    let entries = read_message_file(messages_path)?;

    for entry in entries {
        let _ = confirm(&entry, interactive);

        let Some(dest) = entry.dest else {
            continue;
        };

        let seq = {
            let mut counter = node.seq.lock().unwrap();
            counter.next()
        };

        let wire = modem_protocol::frame::transform(&entry.bits, node.addr, dest, seq);
        mac::transmit(node, &wire, dest);

        if let Err(err) = node.sent_log.record("[SENT]", &entry.bits, dest.as_u8()) {
            log::error!("failed to write send log: {err}");
        }
    }

    Ok(())
}
