//! Protocol module containing the pixel-frame datagram codec.

pub mod codec;
pub mod sequence;

pub use codec::{decode_frame, encode_frame, FrameHeader, ProtocolError};
pub use sequence::SequenceCounter;
