//! COBS (Consistent Overhead Byte Stuffing) codec
//!
//! Removes all `0x00` bytes from a data stream so that `0x00` can serve as
//! an unambiguous frame delimiter on the link. Each block starts with a code
//! byte giving the distance to the next logical zero; runs longer than 254
//! non-zero bytes are split with a `0xFF` code byte.

/// The byte value eliminated from encoded output.
pub const DELIMITER: u8 = 0x00;

/// Maximum input length accepted by the encoder.
///
/// Matches the maximum raw frame the link layer produces; anything larger is
/// refused outright rather than split.
pub const MAX_INPUT_SIZE: usize = 254;

/// Errors that can occur during COBS encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CobsError {
    /// Input exceeds [`MAX_INPUT_SIZE`]
    InputTooLarge,
    /// Output buffer too small for the encoded/decoded result
    OutputTooSmall,
    /// Encoded data contained a zero code byte
    ZeroCode,
    /// Encoded data ended in the middle of a block
    Truncated,
}

/// Worst-case encoded length for a given input length.
///
/// One code byte per started run of 254 bytes, plus the leading code byte.
pub const fn max_encoded_len(input_len: usize) -> usize {
    input_len + input_len / 254 + 1
}

/// COBS-encode `input` into `output`, returning the encoded length.
///
/// The output never contains [`DELIMITER`]. Empty input produces empty
/// output ("no frame").
pub fn encode(input: &[u8], output: &mut [u8]) -> Result<usize, CobsError> {
    if input.is_empty() {
        return Ok(0);
    }
    if input.len() > MAX_INPUT_SIZE {
        return Err(CobsError::InputTooLarge);
    }
    if output.len() < max_encoded_len(input.len()) {
        return Err(CobsError::OutputTooSmall);
    }

    let mut write_idx = 1; // first code byte slot is reserved
    let mut code_idx = 0;
    let mut code: u8 = 1;

    for &byte in input {
        if byte == DELIMITER {
            output[code_idx] = code;
            code_idx = write_idx;
            write_idx += 1;
            code = 1;
        } else {
            output[write_idx] = byte;
            write_idx += 1;
            code += 1;

            // A full run of 254 non-zero bytes: flush the block so the code
            // byte itself never reaches the delimiter value.
            if code == 0xFF {
                output[code_idx] = code;
                code_idx = write_idx;
                write_idx += 1;
                code = 1;
            }
        }
    }

    output[code_idx] = code;
    Ok(write_idx)
}

/// COBS-decode `input` into `output`, returning the decoded length.
///
/// Decoding is strict: a zero code byte or a block that runs past the end of
/// the input is rejected.
pub fn decode(input: &[u8], output: &mut [u8]) -> Result<usize, CobsError> {
    let mut read_idx = 0;
    let mut write_idx = 0;

    while read_idx < input.len() {
        let code = input[read_idx];
        if code == 0 {
            return Err(CobsError::ZeroCode);
        }
        read_idx += 1;

        for _ in 1..code {
            if read_idx >= input.len() {
                return Err(CobsError::Truncated);
            }
            if write_idx >= output.len() {
                return Err(CobsError::OutputTooSmall);
            }
            output[write_idx] = input[read_idx];
            write_idx += 1;
            read_idx += 1;
        }

        // A code below 0xFF marks a logical zero, except at end of input.
        if code < 0xFF && read_idx < input.len() {
            if write_idx >= output.len() {
                return Err(CobsError::OutputTooSmall);
            }
            output[write_idx] = DELIMITER;
            write_idx += 1;
        }
    }

    Ok(write_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_empty() {
        let mut out = [0u8; 8];
        assert_eq!(encode(&[], &mut out), Ok(0));
    }

    #[test]
    fn test_encode_no_zeros() {
        let mut out = [0u8; 8];
        let len = encode(&[0x01, 0x02, 0x03], &mut out).unwrap();
        assert_eq!(&out[..len], &[0x04, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_encode_single_zero() {
        let mut out = [0u8; 8];
        let len = encode(&[0x00], &mut out).unwrap();
        assert_eq!(&out[..len], &[0x01, 0x01]);
    }

    #[test]
    fn test_encode_mixed() {
        let mut out = [0u8; 8];
        let len = encode(&[0x01, 0x00, 0x02], &mut out).unwrap();
        assert_eq!(&out[..len], &[0x02, 0x01, 0x02, 0x02]);
    }

    #[test]
    fn test_decode_no_zeros() {
        let mut out = [0u8; 8];
        let len = decode(&[0x04, 0x01, 0x02, 0x03], &mut out).unwrap();
        assert_eq!(&out[..len], &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_decode_single_zero() {
        let mut out = [0u8; 8];
        let len = decode(&[0x01, 0x01], &mut out).unwrap();
        assert_eq!(&out[..len], &[0x00]);
    }

    #[test]
    fn test_decode_rejects_zero_code() {
        let mut out = [0u8; 8];
        assert_eq!(decode(&[0x00, 0x01], &mut out), Err(CobsError::ZeroCode));
    }

    #[test]
    fn test_decode_rejects_truncated_block() {
        let mut out = [0u8; 8];
        assert_eq!(decode(&[0x04, 0x01], &mut out), Err(CobsError::Truncated));
    }

    #[test]
    fn test_roundtrip() {
        let original = [0x45, 0x00, 0x00, 0x2C, 0x4C, 0x79, 0x00, 0x05];
        let mut encoded = [0u8; 16];
        let mut decoded = [0u8; 16];

        let enc_len = encode(&original, &mut encoded).unwrap();
        let dec_len = decode(&encoded[..enc_len], &mut decoded).unwrap();

        assert_eq!(&decoded[..dec_len], &original);
    }

    #[test]
    fn test_encoded_output_has_no_delimiter() {
        // Exercise a spread of lengths and zero densities
        let mut input = [0u8; MAX_INPUT_SIZE];
        for (i, b) in input.iter_mut().enumerate() {
            *b = if i % 3 == 0 { 0x00 } else { (i & 0xFF) as u8 };
        }
        for len in [0usize, 1, 2, 7, 63, 200, MAX_INPUT_SIZE] {
            let mut encoded = [0u8; max_encoded_len(MAX_INPUT_SIZE)];
            let enc_len = encode(&input[..len], &mut encoded).unwrap();
            assert!(encoded[..enc_len].iter().all(|&b| b != DELIMITER));

            let mut decoded = [0u8; MAX_INPUT_SIZE];
            let dec_len = decode(&encoded[..enc_len], &mut decoded).unwrap();
            assert_eq!(&decoded[..dec_len], &input[..len]);
        }
    }

    #[test]
    fn test_long_run_splits_block() {
        // 254 non-zero bytes needs exactly one block of code 0xFF
        let input = [0xAAu8; 254];
        let mut encoded = [0u8; 260];
        let enc_len = encode(&input, &mut encoded).unwrap();
        assert_eq!(enc_len, 256);
        assert_eq!(encoded[0], 0xFF);
        assert_eq!(encoded[255], 0x01);

        let mut decoded = [0u8; 254];
        let dec_len = decode(&encoded[..enc_len], &mut decoded).unwrap();
        assert_eq!(&decoded[..dec_len], &input);
    }

    #[test]
    fn test_encode_rejects_oversize_input() {
        let input = [0x01u8; MAX_INPUT_SIZE + 1];
        let mut out = [0u8; 300];
        assert_eq!(encode(&input, &mut out), Err(CobsError::InputTooLarge));
    }
}
