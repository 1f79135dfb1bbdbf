use serde::{Deserialize, Serialize};

use super::layout;

/// Photon command type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Acknowledge,
    Connect,
    VerifyConnect,
    Disconnect,
    Ping,
    SendReliable,
    SendUnreliable,
    SendReliableFragment,
}

impl CommandType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        let command = match tag {
            layout::COMMAND_ACKNOWLEDGE => CommandType::Acknowledge,
            layout::COMMAND_CONNECT => CommandType::Connect,
            layout::COMMAND_VERIFY_CONNECT => CommandType::VerifyConnect,
            layout::COMMAND_DISCONNECT => CommandType::Disconnect,
            layout::COMMAND_PING => CommandType::Ping,
            layout::COMMAND_SEND_RELIABLE => CommandType::SendReliable,
            layout::COMMAND_SEND_UNRELIABLE => CommandType::SendUnreliable,
            layout::COMMAND_SEND_RELIABLE_FRAGMENT => CommandType::SendReliableFragment,
            _ => return None,
        };
        Some(command)
    }

    pub fn tag(self) -> u8 {
        match self {
            CommandType::Acknowledge => layout::COMMAND_ACKNOWLEDGE,
            CommandType::Connect => layout::COMMAND_CONNECT,
            CommandType::VerifyConnect => layout::COMMAND_VERIFY_CONNECT,
            CommandType::Disconnect => layout::COMMAND_DISCONNECT,
            CommandType::Ping => layout::COMMAND_PING,
            CommandType::SendReliable => layout::COMMAND_SEND_RELIABLE,
            CommandType::SendUnreliable => layout::COMMAND_SEND_UNRELIABLE,
            CommandType::SendReliableFragment => layout::COMMAND_SEND_RELIABLE_FRAGMENT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandType::Acknowledge => "acknowledge",
            CommandType::Connect => "connect",
            CommandType::VerifyConnect => "verify_connect",
            CommandType::Disconnect => "disconnect",
            CommandType::Ping => "ping",
            CommandType::SendReliable => "send_reliable",
            CommandType::SendUnreliable => "send_unreliable",
            CommandType::SendReliableFragment => "send_reliable_fragment",
        }
    }
}

/// One command carried in a session frame.
///
/// `length` counts the 12-byte command header, so `data` holds exactly
/// `length - 12` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    pub type_tag: u8,
    pub channel_id: u8,
    pub flags: u8,
    pub reserved: u8,
    pub length: i32,
    pub reliable_sequence_number: i32,
    pub data: Vec<u8>,
}

impl RawCommand {
    /// Build a SendReliable command around an already assembled body.
    pub fn reliable(reliable_sequence_number: i32, data: Vec<u8>) -> Self {
        let length = data
            .len()
            .saturating_add(layout::COMMAND_HEADER_LEN)
            .try_into()
            .unwrap_or(i32::MAX);
        Self {
            type_tag: layout::COMMAND_SEND_RELIABLE,
            channel_id: 0,
            flags: 0,
            reserved: 0,
            length,
            reliable_sequence_number,
            data,
        }
    }

    pub fn command_type(&self) -> Option<CommandType> {
        CommandType::from_tag(self.type_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandType, RawCommand};

    #[test]
    fn tags_round_trip_through_command_type() {
        for tag in 1..=8u8 {
            let command = CommandType::from_tag(tag).unwrap();
            assert_eq!(command.tag(), tag);
        }
        assert!(CommandType::from_tag(0).is_none());
        assert!(CommandType::from_tag(9).is_none());
    }

    #[test]
    fn reliable_command_counts_header_in_length() {
        let command = RawCommand::reliable(7, vec![0xca, 0xfe]);
        assert_eq!(command.command_type(), Some(CommandType::SendReliable));
        assert_eq!(command.length, 14);
        assert_eq!(command.reliable_sequence_number, 7);
    }
}
