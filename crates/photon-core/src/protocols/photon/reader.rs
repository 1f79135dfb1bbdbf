//! Slice-advancing reads for big-endian Photon fields.
//!
//! Every read returns the decoded value together with the unread remainder,
//! so nested decoders thread the cursor explicitly instead of sharing a
//! mutable buffer position.

/// A read asked for more bytes than the input holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortRead {
    pub needed: usize,
    pub actual: usize,
}

pub type Read<'a, T> = Result<(T, &'a [u8]), ShortRead>;

pub fn take(input: &[u8], len: usize) -> Read<'_, &[u8]> {
    if input.len() < len {
        return Err(ShortRead {
            needed: len,
            actual: input.len(),
        });
    }
    Ok(input.split_at(len))
}

pub fn take_array<const N: usize>(input: &[u8]) -> Read<'_, [u8; N]> {
    let (head, rest) = take(input, N)?;
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(head);
    Ok((bytes, rest))
}

pub fn read_u8(input: &[u8]) -> Read<'_, u8> {
    let ([value], rest) = take_array::<1>(input)?;
    Ok((value, rest))
}

pub fn read_i8(input: &[u8]) -> Read<'_, i8> {
    let (bytes, rest) = take_array(input)?;
    Ok((i8::from_be_bytes(bytes), rest))
}

pub fn read_u16_be(input: &[u8]) -> Read<'_, u16> {
    let (bytes, rest) = take_array(input)?;
    Ok((u16::from_be_bytes(bytes), rest))
}

pub fn read_i16_be(input: &[u8]) -> Read<'_, i16> {
    let (bytes, rest) = take_array(input)?;
    Ok((i16::from_be_bytes(bytes), rest))
}

pub fn read_u32_be(input: &[u8]) -> Read<'_, u32> {
    let (bytes, rest) = take_array(input)?;
    Ok((u32::from_be_bytes(bytes), rest))
}

pub fn read_i32_be(input: &[u8]) -> Read<'_, i32> {
    let (bytes, rest) = take_array(input)?;
    Ok((i32::from_be_bytes(bytes), rest))
}

pub fn read_i64_be(input: &[u8]) -> Read<'_, i64> {
    let (bytes, rest) = take_array(input)?;
    Ok((i64::from_be_bytes(bytes), rest))
}

pub fn read_f32_be(input: &[u8]) -> Read<'_, f32> {
    let (bytes, rest) = take_array(input)?;
    Ok((f32::from_be_bytes(bytes), rest))
}
