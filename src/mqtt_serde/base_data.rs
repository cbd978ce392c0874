use crate::mqtt_serde::parser::ParseError;

/// Largest value representable by the remaining-length field (four 7-bit groups).
pub const REMAINING_LENGTH_MAX: usize = 268_435_455;

pub struct TwoByteInteger;

impl TwoByteInteger {
    pub fn encode(val: u16) -> [u8; 2] {
        val.to_be_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<(u16, usize), ParseError> {
        if bytes.len() < 2 {
            return Err(ParseError::BufferTooShort);
        }
        let mut array = [0u8; 2];
        array.copy_from_slice(&bytes[0..2]);
        Ok((u16::from_be_bytes(array), 2))
    }
}

/// The MQTT remaining-length field: 1 to 4 bytes, 7 value bits per byte,
/// top bit is the continuation flag.
pub struct VariableByteInteger;

impl VariableByteInteger {
    pub fn encode(val: usize) -> Result<Vec<u8>, ParseError> {
        if val > REMAINING_LENGTH_MAX {
            return Err(ParseError::RemainingLengthOutOfRange(val));
        }
        let mut bytes = Vec::new();
        let mut num = val;
        loop {
            let mut byte = (num % 128) as u8;
            num /= 128;
            if num > 0 {
                byte |= 128;
            }
            bytes.push(byte);
            if num == 0 {
                break;
            }
        }
        Ok(bytes)
    }

    pub fn decode(buffer: &[u8]) -> Result<(usize, usize), ParseError> {
        let mut multiplier = 1;
        let mut value = 0;
        let mut i: usize = 0;

        loop {
            let byte = *buffer.get(i).ok_or(ParseError::More(
                1,
                "remaining length: truncated mid-field".to_string(),
            ))?;

            if byte > 127 && i == 3 {
                // A fifth group would be needed; the field caps at four bytes.
                return Err(ParseError::RemainingLengthTooLong);
            }

            value += (byte & 127) as usize * multiplier;
            multiplier *= 128;

            i += 1;
            if byte & 128 == 0 {
                break;
            }
        }

        Ok((value, i))
    }
}

pub struct BinaryData;

impl BinaryData {
    pub fn encode(data: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + data.len());
        bytes.extend_from_slice(&(data.len() as u16).to_be_bytes());
        bytes.extend_from_slice(data);
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<(Vec<u8>, usize), ParseError> {
        let (len, _) = TwoByteInteger::decode(bytes)?;
        let len = len as usize;
        let start = 2;
        let end = start + len;
        if bytes.len() < end {
            return Err(ParseError::BufferTooShort);
        }
        Ok((bytes[start..end].to_vec(), end))
    }
}

/// UTF-8 bytes prefixed by a 16-bit big-endian length.
pub struct Utf8String;

impl Utf8String {
    pub fn encode(s: &str) -> Vec<u8> {
        BinaryData::encode(s.as_bytes())
    }

    pub fn decode(bytes: &[u8]) -> Result<(String, usize), ParseError> {
        let (data, len) = BinaryData::decode(bytes)?;
        let s = String::from_utf8(data).map_err(|e| ParseError::Utf8Error(e.utf8_error()))?;
        Ok((s, len))
    }
}
