use super::command::RawCommand;
use super::error::CommandError;
use super::layout;
use super::reader::read_i32_be;

/// One piece of a reliable message split across several commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReliableFragment {
    pub sequence_number: i32,
    pub fragment_count: i32,
    pub fragment_number: i32,
    pub total_length: i32,
    pub fragment_offset: i32,
    pub data: Vec<u8>,
}

/// Decode the header of a SendReliableFragment command.
pub fn as_reliable_fragment(command: &RawCommand) -> Result<ReliableFragment, CommandError> {
    if command.type_tag != layout::COMMAND_SEND_RELIABLE_FRAGMENT {
        return Err(CommandError::WrongCommandKind {
            expected: layout::COMMAND_SEND_RELIABLE_FRAGMENT,
            actual: command.type_tag,
        });
    }

    let (sequence_number, rest) = read_i32_be(&command.data)?;
    let (fragment_count, rest) = read_i32_be(rest)?;
    let (fragment_number, rest) = read_i32_be(rest)?;
    let (total_length, rest) = read_i32_be(rest)?;
    let (fragment_offset, rest) = read_i32_be(rest)?;

    Ok(ReliableFragment {
        sequence_number,
        fragment_count,
        fragment_number,
        total_length,
        fragment_offset,
        data: rest.to_vec(),
    })
}
