use crate::error::FilterError;
use crate::Result;

/// `ASCII85Decode` — base-85 with the Adobe `<~ ... ~>` delimiters
/// optional on input (they are stripped if present) and the `z` shorthand
/// for a run of four zero bytes.
pub fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut input = data;
    if let Some(rest) = input.strip_prefix(b"<~") {
        input = rest;
    }
    if let Some(pos) = input.windows(2).position(|w| w == b"~>") {
        input = &input[..pos];
    }

    let mut out = Vec::with_capacity(input.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut group_len = 0usize;

    for &byte in input {
        if byte.is_ascii_whitespace() {
            continue;
        }
        if byte == b'z' && group_len == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !(b'!'..=b'u').contains(&byte) {
            return Err(FilterError::DecoderFailed {
                filter: "ASCII85Decode",
                message: format!("byte {byte:#x} is outside the ASCII85 alphabet"),
            }
            .into());
        }
        group[group_len] = byte - b'!';
        group_len += 1;
        if group_len == 5 {
            out.extend_from_slice(&decode_group(&group, 5));
            group_len = 0;
        }
    }

    if group_len > 0 {
        // Short final group: spec pads with 'u' (84) for the missing
        // digits, then only the first (group_len - 1) decoded bytes are
        // real output.
        for slot in group.iter_mut().skip(group_len) {
            *slot = 84;
        }
        let decoded = decode_group(&group, 5);
        out.extend_from_slice(&decoded[..group_len - 1]);
    }

    Ok(out)
}

fn decode_group(digits: &[u8; 5], _len: usize) -> [u8; 4] {
    let mut value: u32 = 0;
    for &d in digits {
        value = value.wrapping_mul(85).wrapping_add(d as u32);
    }
    value.to_be_bytes()
}

/// `ASCIIHexDecode` — pairs of hex nibbles, whitespace ignored, an odd
/// trailing nibble padded with `0`, terminated (optionally) by `>`.
pub fn asciihex_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut nibbles = Vec::with_capacity(data.len());
    for &byte in data {
        if byte == b'>' {
            break;
        }
        if byte.is_ascii_whitespace() {
            continue;
        }
        let nibble = (byte as char)
            .to_digit(16)
            .ok_or_else(|| FilterError::DecoderFailed {
                filter: "ASCIIHexDecode",
                message: format!("byte {byte:#x} is not a hex digit"),
            })?;
        nibbles.push(nibble as u8);
    }
    if nibbles.len() % 2 == 1 {
        nibbles.push(0);
    }
    Ok(nibbles.chunks_exact(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

/// `RunLengthDecode` — a length byte `0..=127` means "copy the next
/// `length + 1` literal bytes"; `129..=255` means "repeat the next byte
/// `257 - length` times"; `128` is EOD.
pub fn run_length_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut i = 0;
    while i < data.len() {
        let length = data[i];
        i += 1;
        if length == 128 {
            break;
        } else if length < 128 {
            let count = length as usize + 1;
            let end = i + count;
            if end > data.len() {
                return Err(FilterError::DecoderFailed {
                    filter: "RunLengthDecode",
                    message: "literal run extends past end of input".into(),
                }
                .into());
            }
            out.extend_from_slice(&data[i..end]);
            i = end;
        } else {
            let count = 257 - length as usize;
            let byte = *data.get(i).ok_or_else(|| FilterError::DecoderFailed {
                filter: "RunLengthDecode",
                message: "repeat run missing its byte".into(),
            })?;
            i += 1;
            out.resize(out.len() + count, byte);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii85_roundtrip_hello_world() {
        // "Hello world" encoded with the standard ASCII85 alphabet.
        let encoded = b"87cURD]j7BEbo7";
        let decoded = ascii85_decode(encoded).unwrap();
        assert_eq!(decoded, b"Hello world");
    }

    #[test]
    fn asciihex_decode_basic() {
        let decoded = asciihex_decode(b"48656c6c6f20776f726c64>").unwrap();
        assert_eq!(decoded, b"Hello world");
    }

    #[test]
    fn asciihex_odd_nibble_padded() {
        let decoded = asciihex_decode(b"4").unwrap();
        assert_eq!(decoded, vec![0x40]);
    }

    #[test]
    fn run_length_roundtrip() {
        // copy 3 literal bytes, then repeat 'b' 4 times, then EOD
        let encoded: Vec<u8> = vec![2, b'a', b'b', b'c', 253, b'b', 128];
        let decoded = run_length_decode(&encoded).unwrap();
        assert_eq!(decoded, b"abcbbbb");
    }
}
