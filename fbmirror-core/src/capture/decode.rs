//! Frame payload size check and decompression.
//!
//! Payloads arrive either raw or zstd-compressed. The decoder only
//! guarantees that the result holds exactly one frame for the current
//! descriptor; interpreting the pixels is the presentation layer's job.
//! Decompression never produces more than one frame's worth of bytes, so
//! the work done per payload is bounded by the descriptor.

use bytes::Bytes;

use crate::device::FramebufferDescriptor;
use crate::error::MirrorError;

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

// ── DecodedFrame ─────────────────────────────────────────────────

/// One full frame matching its descriptor.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub descriptor: FramebufferDescriptor,
    /// Exactly `descriptor.frame_len()` bytes of tightly packed rows.
    pub data: Bytes,
}

// ── FrameDecoder ─────────────────────────────────────────────────

/// Stateless decoder; rejects anything that is not one whole frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode `payload` against `descriptor`.
    pub fn decode(
        &self,
        descriptor: &FramebufferDescriptor,
        payload: Bytes,
    ) -> Result<DecodedFrame, MirrorError> {
        let expected = descriptor.frame_len();
        let data = if payload.starts_with(&ZSTD_MAGIC) {
            // Output is capped at one frame; anything larger is an error.
            let raw = zstd::bulk::decompress(payload.as_ref(), expected)
                .map_err(|e| MirrorError::Decode(format!("zstd decode failed: {e}")))?;
            Bytes::from(raw)
        } else {
            payload
        };

        if data.len() < expected {
            return Err(MirrorError::Decode(format!(
                "frame too short: {} < {}",
                data.len(),
                expected
            )));
        }

        Ok(DecodedFrame {
            descriptor: *descriptor,
            data: data.slice(..expected),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PixelFormat;

    fn small() -> FramebufferDescriptor {
        FramebufferDescriptor::new(4, 2, PixelFormat::Rgb565, None).unwrap()
    }

    #[test]
    fn raw_frame_accepted() {
        let frame = FrameDecoder::new()
            .decode(&small(), Bytes::from(vec![7u8; 16]))
            .unwrap();
        assert_eq!(frame.data.len(), 16);
        assert_eq!(frame.descriptor, small());
    }

    #[test]
    fn trailing_bytes_trimmed() {
        let frame = FrameDecoder::new()
            .decode(&small(), Bytes::from(vec![1u8; 20]))
            .unwrap();
        assert_eq!(frame.data.len(), 16);
    }

    #[test]
    fn short_frame_rejected() {
        let err = FrameDecoder::new()
            .decode(&small(), Bytes::from(vec![0u8; 15]))
            .unwrap_err();
        assert!(matches!(err, MirrorError::Decode(_)));
    }

    #[test]
    fn compressed_frame_accepted() {
        let raw: Vec<u8> = (0..16u8).collect();
        let packed = zstd::encode_all(raw.as_slice(), 3).unwrap();
        let frame = FrameDecoder::new()
            .decode(&small(), Bytes::from(packed))
            .unwrap();
        assert_eq!(frame.data.as_ref(), raw.as_slice());
    }

    #[test]
    fn oversized_compressed_frame_rejected() {
        let packed = zstd::encode_all(vec![0u8; 4096].as_slice(), 3).unwrap();
        let err = FrameDecoder::new()
            .decode(&small(), Bytes::from(packed))
            .unwrap_err();
        assert!(matches!(err, MirrorError::Decode(_)));
    }

    #[test]
    fn corrupt_compressed_frame_rejected() {
        let mut bogus = ZSTD_MAGIC.to_vec();
        bogus.extend_from_slice(&[0xFF; 32]);
        assert!(FrameDecoder::new().decode(&small(), Bytes::from(bogus)).is_err());
    }
}
