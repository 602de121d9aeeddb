use std::io::{self, BufRead, Write};
use std::path::Path;

use thiserror::Error;

use modem_protocol::NodeAddr;

/// One line of `messages.txt`: a bit string to send, and either a
/// destination or an instruction to skip the entry entirely.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    pub bits: Vec<u8>,
    pub dest: Option<NodeAddr>,
}

#[derive(Debug, Error)]
pub enum MessageFileError {
    #[error("failed to read message file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed line {line_no} in message file: {line:?}")]
    Malformed { line_no: usize, line: String },
}

/// Parses every line of `messages.txt`. A malformed line is a programmer
/// error per the protocol's error handling design, so this fails the
/// whole read rather than skipping the bad line.
pub fn read_message_file(path: &Path) -> Result<Vec<MessageEntry>, MessageFileError> {
    let contents = std::fs::read_to_string(path).map_err(|source| MessageFileError::Read {
        path: path.display().to_string(),
        source,
    })?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(i + 1, line))
        .collect()
}

fn parse_line(line_no: usize, line: &str) -> Result<MessageEntry, MessageFileError> {
    let malformed = || MessageFileError::Malformed {
        line_no,
        line: line.to_string(),
    };

    let mut parts = line.split_whitespace();
    let bits_str = parts.next().ok_or_else(malformed)?;
    let dest_str = parts.next().ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }

    let bits = bits_str
        .chars()
        .map(|c| match c {
            '0' => Ok(0u8),
            '1' => Ok(1u8),
            _ => Err(malformed()),
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let dest_value: i8 = dest_str.parse().map_err(|_| malformed())?;
    let dest = match dest_value {
        -1 => None,
        0..=3 => Some(NodeAddr::new(dest_value as u8)),
        _ => return Err(malformed()),
    };

    Ok(MessageEntry { bits, dest })
}

/// Pauses for an interactive confirmation before transmitting the next
/// entry, unless running non-interactively (used by tests and scripted
/// runs).
pub fn confirm(entry: &MessageEntry, interactive: bool) -> io::Result<()> {
    if !interactive {
        return Ok(());
    }
    print!(
        "press enter to send {:?} to {} ",
        entry.bits,
        entry
            .dest
            .map(|d| d.as_u8().to_string())
            .unwrap_or_else(|| "(skip)".to_string())
    );
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unicast_and_skip_lines() {
        assert_eq!(parse_line(1, "1010 2").unwrap().dest.unwrap().as_u8(), 2);
        assert!(parse_line(2, "1010 -1").unwrap().dest.is_none());
    }

    #[test]
    fn rejects_non_binary_bits() {
        assert!(parse_line(1, "102 1").is_err());
    }

    #[test]
    fn rejects_out_of_range_dest() {
        assert!(parse_line(1, "1010 4").is_err());
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(parse_line(1, "1010").is_err());
        assert!(parse_line(1, "1010 1 extra").is_err());
    }
}
