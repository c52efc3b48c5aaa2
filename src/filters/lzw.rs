use weezl::decode::Decoder;
use weezl::BitOrder;

use crate::error::FilterError;
use crate::Result;

/// `LZWDecode`. PDF's variant uses MSB bit order and, unless
/// `/EarlyChange 0` is declared, increments the code width one symbol
/// early relative to the textbook algorithm (`early_change`).
pub fn lzw_decode(data: &[u8], early_change: bool) -> Result<Vec<u8>> {
    let mut decoder = if early_change {
        Decoder::new(BitOrder::Msb, 8)
    } else {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    };

    let mut out = Vec::with_capacity(data.len() * 3);
    let mut input = data;
    let mut scratch = [0u8; 65536];

    loop {
        let result = decoder.decode_bytes(input, &mut scratch);
        out.extend_from_slice(&scratch[..result.consumed_out]);
        input = &input[result.consumed_in..];

        match result.status {
            Ok(weezl::LzwStatus::Done) => break,
            Ok(weezl::LzwStatus::NoProgress) => break,
            Ok(weezl::LzwStatus::Ok) => continue,
            Err(e) => {
                return Err(FilterError::DecoderFailed { filter: "LZWDecode", message: e.to_string() }.into())
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_decodes_to_empty_output() {
        let out = lzw_decode(&[], true).unwrap();
        assert!(out.is_empty());
    }
}
