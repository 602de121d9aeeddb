/// Classification of one captured audio chunk.
///
/// The reference implementation this protocol is modeled on mixed a
/// stringly-typed delimiter marker into an otherwise numeric domain; here
/// the whole symbol alphabet is one enum, including the "no tone detected"
/// case.
#[derive(Copy, Clone, Debug, PartialEq, Eq, derive_more::Display)]
pub enum Symbol {
    #[display(fmt = "0")]
    Zero,
    #[display(fmt = "1")]
    One,
    #[display(fmt = "delimiter")]
    Delimiter,
    #[display(fmt = "none")]
    None,
}

impl Symbol {
    pub fn bit(self) -> Option<u8> {
        match self {
            Symbol::Zero => Some(0),
            Symbol::One => Some(1),
            Symbol::Delimiter | Symbol::None => None,
        }
    }
}
