use std::ops::Range;

use super::command::RawCommand;
use super::error::FrameError;
use super::layout;
use super::reader::{read_i32_be, read_u8, read_u16_be, read_u32_be, take, take_array};

/// Session header plus the commands of one captured datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFrame {
    pub peer_id: u16,
    pub crc_enabled: u8,
    pub command_count: u8,
    pub timestamp: u32,
    pub challenge: i32,
    pub commands: Vec<RawCommand>,
}

/// A decoded frame with the byte ranges it consumed and left over.
///
/// `contents` and `payload` index into the slice passed to
/// [`parse_session_frame`], so a layered dissector can keep going after the
/// Photon layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub frame: SessionFrame,
    pub contents: Range<usize>,
    pub payload: Range<usize>,
}

impl DecodedFrame {
    /// Bytes of the frame within `data`, or `None` if `data` is shorter than
    /// the slice that was parsed.
    pub fn contents_of<'a>(&self, data: &'a [u8]) -> Option<&'a [u8]> {
        data.get(self.contents.clone())
    }

    pub fn payload_of<'a>(&self, data: &'a [u8]) -> Option<&'a [u8]> {
        data.get(self.payload.clone())
    }
}

/// Parse one UDP payload into a [`SessionFrame`].
///
/// Fails on the first command whose declared length does not fit; no partial
/// frame is returned.
///
/// # Examples
/// ```
/// use photon_core::parse_session_frame;
///
/// let data = [
///     0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
///     0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0c, 0x00, 0x00, 0x00, 0x01,
/// ];
/// let decoded = parse_session_frame(&data).unwrap();
/// assert_eq!(decoded.frame.peer_id, 1);
/// assert_eq!(decoded.frame.commands.len(), 1);
/// assert!(decoded.payload.is_empty());
/// ```
pub fn parse_session_frame(data: &[u8]) -> Result<DecodedFrame, FrameError> {
    let (header, mut rest) = take_array::<{ layout::SESSION_HEADER_LEN }>(data)?;
    let (peer_id, _) = read_u16_be(&header[layout::PEER_ID_RANGE])?;
    let crc_enabled = header[layout::CRC_ENABLED_OFFSET];
    let command_count = header[layout::COMMAND_COUNT_OFFSET];
    let (timestamp, _) = read_u32_be(&header[layout::TIMESTAMP_RANGE])?;
    let (challenge, _) = read_i32_be(&header[layout::CHALLENGE_RANGE])?;

    let mut commands = Vec::with_capacity(command_count as usize);
    for index in 0..command_count as usize {
        let (command, next) = parse_command(index, rest)?;
        commands.push(command);
        rest = next;
    }

    let used = data.len() - rest.len();
    Ok(DecodedFrame {
        frame: SessionFrame {
            peer_id,
            crc_enabled,
            command_count,
            timestamp,
            challenge,
            commands,
        },
        contents: 0..used,
        payload: used..data.len(),
    })
}

fn parse_command(index: usize, input: &[u8]) -> Result<(RawCommand, &[u8]), FrameError> {
    let truncated = |_| FrameError::TruncatedCommandHeader {
        index,
        needed: layout::COMMAND_HEADER_LEN,
        actual: input.len(),
    };
    let (header, rest) = take(input, layout::COMMAND_HEADER_LEN).map_err(truncated)?;
    let (type_tag, header) = read_u8(header)?;
    let (channel_id, header) = read_u8(header)?;
    let (flags, header) = read_u8(header)?;
    let (reserved, header) = read_u8(header)?;
    let (length, header) = read_i32_be(header)?;
    let (reliable_sequence_number, _) = read_i32_be(header)?;

    let malformed = FrameError::MalformedFrame {
        index,
        length,
        available: rest.len(),
    };
    let data_len = usize::try_from(i64::from(length) - layout::COMMAND_HEADER_LEN as i64)
        .map_err(|_| malformed.clone())?;
    let (data, rest) = take(rest, data_len).map_err(|_| malformed)?;

    Ok((
        RawCommand {
            type_tag,
            channel_id,
            flags,
            reserved,
            length,
            reliable_sequence_number,
            data: data.to_vec(),
        },
        rest,
    ))
}
