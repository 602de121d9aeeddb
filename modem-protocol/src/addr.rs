use std::fmt;

/// A two-bit node address. `00` is the reserved broadcast address; `01`,
/// `10`, `11` are the three unicast addresses this protocol supports.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeAddr(u8);

pub const BROADCAST: NodeAddr = NodeAddr(0b00);

impl NodeAddr {
    /// Constructs an address from its low two bits. Panics if `value` is
    /// outside `0..=3`; callers at process boundaries should validate first.
    pub fn new(value: u8) -> Self {
        assert!(value <= 0b11, "node address out of range: {value}");
        NodeAddr(value)
    }

    pub const fn broadcast() -> Self {
        BROADCAST
    }

    pub fn is_broadcast(self) -> bool {
        self.0 == 0b00
    }

    /// True if `self` is the addressee of a frame sent to `dest`: either
    /// `dest` names us directly, or `dest` is broadcast and `self` isn't
    /// the sender (checked separately by callers against the source field).
    pub fn matches(self, dest: NodeAddr) -> bool {
        dest.is_broadcast() || dest == self
    }

    pub fn bits(self) -> [u8; 2] {
        [(self.0 >> 1) & 1, self.0 & 1]
    }

    pub fn from_bits(bits: [u8; 2]) -> Self {
        NodeAddr((bits[0] << 1) | bits[1])
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeAddr({:02b})", self.0)
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed 4-bit check pattern associated with each unicast sender
/// address. Redundant with the source field; a mismatch marks an
/// unidentified sender.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CheckPattern([u8; 4]);

impl CheckPattern {
    pub fn bits(self) -> [u8; 4] {
        self.0
    }

    pub fn from_bits(bits: [u8; 4]) -> Self {
        CheckPattern(bits)
    }

    /// The pattern assigned to a unicast sender address, or `None` for the
    /// broadcast address (which never originates a frame as a sender).
    pub fn for_addr(addr: NodeAddr) -> Option<Self> {
        match addr.as_u8() {
            0b01 => Some(CheckPattern([0, 0, 1, 1])),
            0b10 => Some(CheckPattern([1, 1, 0, 0])),
            0b11 => Some(CheckPattern([0, 1, 1, 0])),
            _ => None,
        }
    }

    /// True iff `check` is the pattern legally associated with `addr`.
    pub fn valid_pair(addr: NodeAddr, check: CheckPattern) -> bool {
        CheckPattern::for_addr(addr) == Some(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_matches_everyone() {
        assert!(NodeAddr::new(0b01).matches(BROADCAST));
        assert!(NodeAddr::new(0b10).matches(BROADCAST));
    }

    #[test]
    fn unicast_matches_only_self() {
        let a = NodeAddr::new(0b01);
        let b = NodeAddr::new(0b10);
        assert!(a.matches(a));
        assert!(!a.matches(b));
    }

    #[test]
    fn bits_round_trip() {
        for raw in 0..=0b11u8 {
            let addr = NodeAddr::new(raw);
            assert_eq!(NodeAddr::from_bits(addr.bits()), addr);
        }
    }

    #[test]
    fn check_patterns_match_assignment() {
        assert!(CheckPattern::valid_pair(
            NodeAddr::new(0b01),
            CheckPattern::from_bits([0, 0, 1, 1])
        ));
        assert!(!CheckPattern::valid_pair(
            NodeAddr::new(0b01),
            CheckPattern::from_bits([1, 1, 0, 0])
        ));
        assert!(CheckPattern::for_addr(BROADCAST).is_none());
    }
}
