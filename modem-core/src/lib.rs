pub mod line;
pub mod tone;

pub use line::LineCoder;
pub use tone::ToneCodec;
