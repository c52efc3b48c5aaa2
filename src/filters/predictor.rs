use crate::error::FilterError;
use crate::Result;

/// PNG/TIFF predictor parameters, defaulting per the PDF spec (§4.2):
/// `Columns` = 1, `Colors` = 1, `BitsPerComponent` = 8.
#[derive(Debug, Clone, Copy)]
pub struct PredictorParams {
    pub predictor: i64,
    pub columns: usize,
    pub colors: usize,
    pub bits_per_component: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        PredictorParams { predictor: 1, columns: 1, colors: 1, bits_per_component: 8 }
    }
}

impl PredictorParams {
    fn bytes_per_pixel(&self) -> usize {
        ((self.colors * self.bits_per_component) as f64 / 8.0).ceil() as usize
    }

    fn row_bytes(&self) -> usize {
        ((self.colors * self.bits_per_component * self.columns) as f64 / 8.0).ceil() as usize
    }

    /// Reverses the predictor applied by an encoder, returning the
    /// un-predicted bytes. `predictor == 1` is a no-op (identity).
    pub fn unpredict(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.predictor {
            1 => Ok(data.to_vec()),
            2 => Ok(self.unpredict_tiff(data)),
            10..=15 => self.unpredict_png(data),
            other => Err(FilterError::UnsupportedPredictor(other).into()),
        }
    }

    fn unpredict_tiff(&self, data: &[u8]) -> Vec<u8> {
        let bpp = self.bytes_per_pixel();
        let row_bytes = self.row_bytes();
        let mut out = data.to_vec();
        for row in out.chunks_mut(row_bytes) {
            for i in bpp..row.len() {
                row[i] = row[i].wrapping_add(row[i - bpp]);
            }
        }
        out
    }

    /// PNG predictors prefix every encoded row with a one-byte tag
    /// selecting None/Sub/Up/Average/Paeth for that row; predictor values
    /// 10-15 all map onto this scheme ("optimal" just means the encoder
    /// chose per-row, which is exactly what the tag byte already records).
    fn unpredict_png(&self, data: &[u8]) -> Result<Vec<u8>> {
        let bpp = self.bytes_per_pixel().max(1);
        let row_bytes = self.row_bytes();
        let stride = row_bytes + 1;
        if stride == 1 {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(data.len());
        let mut prev_row = vec![0u8; row_bytes];

        for chunk in data.chunks(stride) {
            if chunk.is_empty() {
                break;
            }
            let tag = chunk[0];
            let mut row = chunk[1..].to_vec();
            row.resize(row_bytes, 0);

            for i in 0..row.len() {
                let a = if i >= bpp { row[i - bpp] } else { 0 };
                let b = prev_row[i];
                let c = if i >= bpp { prev_row[i - bpp] } else { 0 };
                let predicted = match tag {
                    0 => 0,
                    1 => a,
                    2 => b,
                    3 => ((a as u16 + b as u16) / 2) as u8,
                    4 => paeth(a, b, c),
                    other => {
                        return Err(FilterError::DecoderFailed {
                            filter: "FlateDecode",
                            message: format!("unknown PNG filter tag {other}"),
                        }
                        .into())
                    }
                };
                row[i] = row[i].wrapping_add(predicted);
            }

            out.extend_from_slice(&row);
            prev_row = row;
        }

        Ok(out)
    }
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i32, b as i32, c as i32);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_predictor_is_noop() {
        let p = PredictorParams::default();
        assert_eq!(p.unpredict(b"hello").unwrap(), b"hello");
    }

    #[test]
    fn tiff_predictor_undoes_running_sum() {
        let p = PredictorParams { predictor: 2, columns: 4, colors: 1, bits_per_component: 8 };
        // row encoded as successive deltas from the previous byte
        let encoded = vec![10u8, 1, 1, 1];
        let decoded = p.unpredict(&encoded);
        assert_eq!(decoded.unwrap(), vec![10, 11, 12, 13]);
    }

    #[test]
    fn png_none_filter_passes_through() {
        let p = PredictorParams { predictor: 15, columns: 3, colors: 1, bits_per_component: 8 };
        let mut encoded = vec![0u8]; // tag 0 = None
        encoded.extend_from_slice(&[1, 2, 3]);
        assert_eq!(p.unpredict(&encoded).unwrap(), vec![1, 2, 3]);
    }
}
