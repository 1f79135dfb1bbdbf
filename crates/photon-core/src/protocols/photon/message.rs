//! Reliable-message headers.
//!
//! Only the header is decoded here. Parameters stay as raw bytes until
//! [`ReliableMessage::parameters`] is called, so callers can filter on
//! operation or event codes first.

use serde::{Deserialize, Serialize};

use super::command::RawCommand;
use super::dialect::{Dialect, PHOTON};
use super::error::{CommandError, ParameterError};
use super::layout;
use super::reader::{read_i16_be, read_u8, read_u16_be};
use super::value::{ParameterTable, TypedValue, decode_parameters_with, decode_value_with};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    OperationRequest,
    OperationResponse,
    EventData,
}

impl MessageKind {
    /// Map a wire kind byte, folding the legacy response value `3` into `7`.
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            layout::MESSAGE_OPERATION_REQUEST => Some(MessageKind::OperationRequest),
            layout::MESSAGE_OPERATION_RESPONSE | layout::MESSAGE_OPERATION_RESPONSE_LEGACY => {
                Some(MessageKind::OperationResponse)
            }
            layout::MESSAGE_EVENT_DATA => Some(MessageKind::EventData),
            _ => None,
        }
    }

    pub fn wire_value(self) -> u8 {
        match self {
            MessageKind::OperationRequest => layout::MESSAGE_OPERATION_REQUEST,
            MessageKind::OperationResponse => layout::MESSAGE_OPERATION_RESPONSE,
            MessageKind::EventData => layout::MESSAGE_EVENT_DATA,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::OperationRequest => "operation_request",
            MessageKind::OperationResponse => "operation_response",
            MessageKind::EventData => "event_data",
        }
    }
}

/// Header of an operation request, operation response or event.
#[derive(Debug, Clone, PartialEq)]
pub struct ReliableMessage {
    pub signature: u8,
    pub message_kind: MessageKind,
    pub operation_code: Option<u8>,
    pub event_code: Option<u8>,
    pub response_code: Option<u16>,
    pub debug_type_tag: Option<u8>,
    pub debug_payload: Option<TypedValue>,
    pub parameter_count: i16,
    pub parameter_data: Vec<u8>,
}

impl ReliableMessage {
    /// Operation code for requests/responses, event code for events.
    pub fn code(&self) -> Option<u8> {
        self.operation_code.or(self.event_code)
    }

    pub fn parameters(&self) -> Result<ParameterTable, ParameterError> {
        self.parameters_with(&PHOTON)
    }

    pub fn parameters_with(&self, dialect: &Dialect) -> Result<ParameterTable, ParameterError> {
        decode_parameters_with(dialect, self.parameter_count, &self.parameter_data)
    }
}

/// Decode the header of a SendReliable command with the stock dialect.
///
/// # Examples
/// ```
/// use photon_core::{MessageKind, RawCommand, as_reliable_message};
///
/// let command = RawCommand::reliable(0, vec![0x00, 0x04, 0x01, 0x00, 0x00]);
/// let message = as_reliable_message(&command).unwrap();
/// assert_eq!(message.message_kind, MessageKind::EventData);
/// assert_eq!(message.event_code, Some(1));
/// ```
pub fn as_reliable_message(command: &RawCommand) -> Result<ReliableMessage, CommandError> {
    as_reliable_message_with(command, &PHOTON)
}

/// Decode the header of a SendReliable command.
///
/// The dialect is only consulted for the debug payload of operation
/// responses.
pub fn as_reliable_message_with(
    command: &RawCommand,
    dialect: &Dialect,
) -> Result<ReliableMessage, CommandError> {
    if command.type_tag != layout::COMMAND_SEND_RELIABLE {
        return Err(CommandError::WrongCommandKind {
            expected: layout::COMMAND_SEND_RELIABLE,
            actual: command.type_tag,
        });
    }

    let (signature, rest) = read_u8(&command.data)?;
    let (kind, rest) = read_u8(rest)?;
    let message_kind =
        MessageKind::from_wire(kind).ok_or(CommandError::UnknownMessageKind { value: kind })?;

    let mut message = ReliableMessage {
        signature,
        message_kind,
        operation_code: None,
        event_code: None,
        response_code: None,
        debug_type_tag: None,
        debug_payload: None,
        parameter_count: 0,
        parameter_data: Vec::new(),
    };

    let rest = match message_kind {
        MessageKind::OperationRequest => {
            let (code, rest) = read_u8(rest)?;
            message.operation_code = Some(code);
            rest
        }
        MessageKind::EventData => {
            let (code, rest) = read_u8(rest)?;
            message.event_code = Some(code);
            rest
        }
        MessageKind::OperationResponse => {
            let (code, rest) = read_u8(rest)?;
            let (response_code, rest) = read_u16_be(rest)?;
            let (debug_tag, rest) = read_u8(rest)?;
            let (debug_payload, rest) = decode_value_with(dialect, debug_tag, rest)?;
            message.operation_code = Some(code);
            message.response_code = Some(response_code);
            message.debug_type_tag = Some(debug_tag);
            message.debug_payload = Some(debug_payload);
            rest
        }
    };

    let (parameter_count, rest) = read_i16_be(rest)?;
    message.parameter_count = parameter_count;
    message.parameter_data = rest.to_vec();
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::photon::error::ValueError;
    use crate::protocols::photon::layout::{TAG_INT8, TAG_NIL, TAG_STRING};

    fn reliable(data: &[u8]) -> RawCommand {
        RawCommand::reliable(1, data.to_vec())
    }

    #[test]
    fn rejects_other_command_types() {
        let mut command = reliable(&[]);
        command.type_tag = 0;
        let err = as_reliable_message(&command).unwrap_err();
        assert_eq!(
            err,
            CommandError::WrongCommandKind {
                expected: 6,
                actual: 0
            }
        );
    }

    #[test]
    fn decodes_operation_request() {
        let message = as_reliable_message(&reliable(&[0x00, 0x02, 0x01, 0x00, 0x01])).unwrap();
        assert_eq!(message.message_kind, MessageKind::OperationRequest);
        assert_eq!(message.operation_code, Some(1));
        assert_eq!(message.event_code, None);
        assert_eq!(message.parameter_count, 1);
        assert!(message.parameter_data.is_empty());
    }

    #[test]
    fn decodes_event_data() {
        let message = as_reliable_message(&reliable(&[0x00, 0x04, 0x01, 0x00, 0x01])).unwrap();
        assert_eq!(message.message_kind, MessageKind::EventData);
        assert_eq!(message.event_code, Some(1));
        assert_eq!(message.code(), Some(1));
        assert_eq!(message.parameter_count, 1);
    }

    #[test]
    fn legacy_response_kind_matches_current_kind() {
        let legacy = [0x00, 0x03, 0x01, 0x00, 0x01, TAG_NIL, 0x00, 0x00];
        let mut current = legacy;
        current[1] = 0x07;

        let legacy = as_reliable_message(&reliable(&legacy)).unwrap();
        let current = as_reliable_message(&reliable(&current)).unwrap();
        assert_eq!(legacy, current);
        assert_eq!(legacy.message_kind, MessageKind::OperationResponse);
        assert_eq!(legacy.operation_code, Some(1));
        assert_eq!(legacy.response_code, Some(1));
        assert_eq!(legacy.debug_type_tag, Some(TAG_NIL));
        assert_eq!(legacy.debug_payload, Some(TypedValue::Nil));
        assert_eq!(legacy.parameter_count, 0);
    }

    #[test]
    fn response_reads_string_debug_payload() {
        let data = [
            0x00, // signature
            0x07, // kind
            0xff, // operation code
            0x00, 0xff, // response code
            TAG_STRING, 0x00, 0x04, 0x30, 0x31, 0x32, 0x33, // debug payload
            0x00, 0x00, // parameter count
        ];
        let message = as_reliable_message(&reliable(&data)).unwrap();
        assert_eq!(message.operation_code, Some(255));
        assert_eq!(message.response_code, Some(255));
        assert_eq!(message.debug_type_tag, Some(TAG_STRING));
        assert_eq!(message.debug_payload, Some(TypedValue::String("0123".into())));
    }

    #[test]
    fn response_with_unknown_debug_tag_fails() {
        let data = [0x00, 0x07, 0x01, 0x00, 0x00, 64, 0x00, 0x00];
        let err = as_reliable_message(&reliable(&data)).unwrap_err();
        assert_eq!(
            err,
            CommandError::DebugPayload(ValueError::UnknownTypeTag { tag: 64 })
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = as_reliable_message(&reliable(&[0x00, 0x09, 0x00, 0x00, 0x00])).unwrap_err();
        assert_eq!(err, CommandError::UnknownMessageKind { value: 9 });
    }

    #[test]
    fn truncated_header_is_an_error() {
        let err = as_reliable_message(&reliable(&[0x00, 0x02, 0x01, 0x00])).unwrap_err();
        assert!(matches!(err, CommandError::TooShort { needed: 2, actual: 1 }));
    }

    #[test]
    fn parameters_decode_lazily() {
        let data = [0x00, 0x02, 0x10, 0x00, 0x01, 0x05, TAG_INT8, 0x7f];
        let message = as_reliable_message(&reliable(&data)).unwrap();
        assert_eq!(message.parameter_data, vec![0x05, TAG_INT8, 0x7f]);
        let parameters = message.parameters().unwrap();
        assert_eq!(parameters[&5], TypedValue::Int8(127));
    }
}
