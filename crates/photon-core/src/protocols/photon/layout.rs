pub const SESSION_HEADER_LEN: usize = 12;
pub const COMMAND_HEADER_LEN: usize = 12;
pub const FRAGMENT_HEADER_LEN: usize = 20;

pub const PEER_ID_RANGE: std::ops::Range<usize> = 0..2;
pub const CRC_ENABLED_OFFSET: usize = 2;
pub const COMMAND_COUNT_OFFSET: usize = 3;
pub const TIMESTAMP_RANGE: std::ops::Range<usize> = 4..8;
pub const CHALLENGE_RANGE: std::ops::Range<usize> = 8..12;

pub const COMMAND_ACKNOWLEDGE: u8 = 1;
pub const COMMAND_CONNECT: u8 = 2;
pub const COMMAND_VERIFY_CONNECT: u8 = 3;
pub const COMMAND_DISCONNECT: u8 = 4;
pub const COMMAND_PING: u8 = 5;
pub const COMMAND_SEND_RELIABLE: u8 = 6;
pub const COMMAND_SEND_UNRELIABLE: u8 = 7;
pub const COMMAND_SEND_RELIABLE_FRAGMENT: u8 = 8;

pub const MESSAGE_OPERATION_REQUEST: u8 = 2;
pub const MESSAGE_OPERATION_RESPONSE_LEGACY: u8 = 3;
pub const MESSAGE_EVENT_DATA: u8 = 4;
pub const MESSAGE_OPERATION_RESPONSE: u8 = 7;

pub const TAG_NIL: u8 = 42;
pub const TAG_NIL_ZERO: u8 = 0;
pub const TAG_INT8: u8 = 98;
pub const TAG_FLOAT32: u8 = 102;
pub const TAG_INT32: u8 = 105;
pub const TAG_INT16: u8 = 107;
pub const TAG_INT16_LEGACY: u8 = 7;
pub const TAG_INT64: u8 = 108;
pub const TAG_BOOLEAN: u8 = 111;
pub const TAG_STRING: u8 = 115;
pub const TAG_BYTE_ARRAY: u8 = 120;
pub const TAG_ARRAY: u8 = 121;

pub const DEFAULT_FRAGMENT_CAPACITY: usize = 128;
pub const DEFAULT_MAX_DEPTH: usize = 64;
/// Largest `total_length` a fragmented message may declare.
pub const MAX_REASSEMBLED_LENGTH: usize = 1 << 20;

/// UDP ports used by Photon servers (master and game server).
pub const DEFAULT_PORTS: [u16; 2] = [5055, 5056];
