//! Packed depth codec
//!
//! Stores a `[0, 1]` depth in four 8-bit channels so that it survives a round trip
//! through an ordinary RGBA8 color target. Channel `i` carries the next 8 bits of
//! the fraction left over by the channels before it. The WGSL `pack_depth` and
//! `unpack_depth` functions use the same formulas.

use crate::config::DepthEncoding;
use crate::error::{RenderError, Result};

/// Largest round-trip error the packed codec may introduce.
pub const PACKED_DEPTH_TOLERANCE: f32 = 1.0 / 16_777_216.0;

/// Weights applied to each normalized channel on decode.
pub const UNPACK_WEIGHTS: [f64; 4] = [1.0, 1.0 / 256.0, 1.0 / 65_536.0, 1.0 / 16_777_216.0];

/// Encode a depth value into four bytes.
pub fn pack_depth(depth: f32) -> [u8; 4] {
    let mut v = f64::from(depth.clamp(0.0, 1.0)) * 255.0;
    let r = v.floor();
    v = (v - r) * 256.0;
    let g = v.floor();
    v = (v - g) * 256.0;
    let b = v.floor();
    v = (v - b) * 256.0;
    let a = v.round().min(255.0);
    [r as u8, g as u8, b as u8, a as u8]
}

/// Decode four bytes produced by [`pack_depth`].
pub fn unpack_depth(texel: [u8; 4]) -> f32 {
    let sum: f64 = texel
        .iter()
        .zip(UNPACK_WEIGHTS)
        .map(|(&c, w)| f64::from(c) / 255.0 * w)
        .sum();
    sum as f32
}

/// Check that the depth written by the shadow pass can be read back by the
/// shading pass.
pub fn verify_depth_codec(written: DepthEncoding, read: DepthEncoding) -> Result<()> {
    if written != read {
        return Err(RenderError::EncodingMismatch { written, read });
    }
    if written == DepthEncoding::Packed {
        for probe in [0.0, 0.25, 0.5, 0.75, 0.999_999, 1.0] {
            let decoded = unpack_depth(pack_depth(probe));
            if (decoded - probe).abs() > PACKED_DEPTH_TOLERANCE {
                tracing::error!(
                    "Packed depth probe {} decoded as {}",
                    probe,
                    decoded
                );
                return Err(RenderError::EncodingMismatch { written, read });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_within_tolerance() {
        for depth in [0.0, 0.5, 0.999_999, 1.0] {
            let decoded = unpack_depth(pack_depth(depth));
            assert!(
                (decoded - depth).abs() <= PACKED_DEPTH_TOLERANCE,
                "{depth} decoded as {decoded}"
            );
        }
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(pack_depth(0.0), [0, 0, 0, 0]);
        assert_eq!(pack_depth(1.0), [255, 0, 0, 0]);
        assert_eq!(pack_depth(0.5), [127, 128, 0, 0]);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(pack_depth(-0.5), pack_depth(0.0));
        assert_eq!(pack_depth(2.0), pack_depth(1.0));
    }

    #[test]
    fn test_encoding_is_monotonic() {
        let mut previous = 0.0;
        for i in 1..=1000 {
            let decoded = unpack_depth(pack_depth(i as f32 / 1000.0));
            assert!(decoded > previous);
            previous = decoded;
        }
    }

    #[test]
    fn test_verify_codec() {
        assert!(verify_depth_codec(DepthEncoding::Native, DepthEncoding::Native).is_ok());
        assert!(verify_depth_codec(DepthEncoding::Packed, DepthEncoding::Packed).is_ok());
        assert!(matches!(
            verify_depth_codec(DepthEncoding::Packed, DepthEncoding::Native),
            Err(RenderError::EncodingMismatch {
                written: DepthEncoding::Packed,
                read: DepthEncoding::Native
            })
        ));
    }
}
