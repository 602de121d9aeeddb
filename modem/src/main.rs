mod ack;
mod channel;
mod config;
mod logio;
mod mac;
mod messages;
mod node;
mod receiver;
mod thread;
mod time;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use structopt::StructOpt;
use thiserror::Error;

use modem_device::cpal_backend::{Capture, Playback};
use modem_protocol::NodeAddr;

use crate::channel::Device;
use crate::node::Node;

#[derive(StructOpt, Debug)]
#[structopt(name = "modem", about = "acoustic CSMA/CA modem node")]
struct Opt {
    /// This node's unicast address: 1, 2, or 3.
    #[structopt(long, env = "MODEM_ADDR")]
    addr: u8,

    /// Path to the outgoing message queue file.
    #[structopt(long, env = "MODEM_MESSAGES", default_value = "messages.txt")]
    messages: PathBuf,

    /// Path to the acknowledged-send log.
    #[structopt(long, env = "MODEM_SEND_LOG", default_value = "send.txt")]
    send_log: PathBuf,

    /// Path to the newly-delivered-frame log.
    #[structopt(long, env = "MODEM_RECEIVE_LOG", default_value = "receive.txt")]
    receive_log: PathBuf,

    /// Skip the interactive confirmation before each send.
    #[structopt(long)]
    non_interactive: bool,

    /// Capture device name; defaults to the host's default input device.
    #[structopt(long, env = "MODEM_INPUT_DEVICE")]
    input_device: Option<String>,

    /// Playback device name; defaults to the host's default output device.
    #[structopt(long, env = "MODEM_OUTPUT_DEVICE")]
    output_device: Option<String>,
}

#[derive(Debug, Error)]
enum RunError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("node address must be 1, 2, or 3, got {0}")]
    InvalidAddr(u8),
    #[error("failed to open audio device: {0}")]
    Device(#[from] modem_device::OpenError),
    #[error("failed to process message file: {0}")]
    Messages(#[from] messages::MessageFileError),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RunError> {
    config::read()?;
    let opt = Opt::from_args();

    if !(1..=3).contains(&opt.addr) {
        return Err(RunError::InvalidAddr(opt.addr));
    }
    let addr = NodeAddr::new(opt.addr);

    thread::set_realtime_priority();

    let capture = Capture::open(opt.input_device.as_deref())?;
    let playback = Playback::open(opt.output_device.as_deref())?;
    let device = Device::new(Box::new(capture), Box::new(playback));

    let sent_log = logio::sent_log(&opt.send_log);
    let received_log = logio::received_log(&opt.receive_log);

    let node = Arc::new(Node::new(addr, device, sent_log, received_log));

    node::run(node, &opt.messages, !opt.non_interactive)?;

    Ok(())
}
