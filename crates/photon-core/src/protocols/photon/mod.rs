//! Photon (Exit Games) UDP protocol decoding.
//!
//! A captured datagram is a 12-byte session header followed by
//! length-prefixed commands (`frame`). SendReliable commands carry a message
//! header (`message`) and a parameter table in a tagged value grammar
//! (`value`, driven by a `dialect` table). Messages too large for one
//! datagram arrive as SendReliableFragment commands (`fragment`) and are
//! stitched back together by a per-stream cache (`buffer`).
//!
//! All integers are big-endian. Offsets and tag values live in `layout`;
//! slice-advancing reads live in `reader`. Every decoder reports malformed
//! input through an error type in `error` instead of panicking.

pub mod buffer;
pub mod command;
pub mod dialect;
pub mod error;
pub mod fragment;
pub mod frame;
pub mod layout;
pub mod message;
pub mod reader;
pub mod value;

pub use buffer::FragmentBuffer;
pub use command::{CommandType, RawCommand};
pub use dialect::{Dialect, DialectKind, PHOTON, ValueRule};
pub use error::{CommandError, FrameError, ParameterError, ValueError};
pub use fragment::{ReliableFragment, as_reliable_fragment};
pub use frame::{DecodedFrame, SessionFrame, parse_session_frame};
pub use message::{MessageKind, ReliableMessage, as_reliable_message, as_reliable_message_with};
pub use value::{
    ParameterTable, RawString, TypedValue, decode_parameters, decode_parameters_with,
    decode_value, decode_value_with,
};
