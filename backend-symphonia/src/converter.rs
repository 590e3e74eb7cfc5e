//! Sample format conversion to the adapter's fixed output format.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Normalizes any Symphonia audio buffer to interleaved signed 16-bit.
///
/// Codecs hand back planar buffers in whatever sample type they decode to
/// (i16, i24, i32, f32, f64, unsigned variants). Everything funnels through
/// the same conversion: per-frame, per-channel, into i16.
pub struct SampleConverter;

impl SampleConverter {
    /// Convert to interleaved i16 samples (LRLRLR... for stereo).
    pub fn to_interleaved_s16(buffer: &AudioBufferRef<'_>) -> Vec<i16> {
        match buffer {
            AudioBufferRef::U8(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::U16(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::U24(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::U32(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::S8(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::S16(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::S24(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::S32(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::F32(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::F64(buf) => Self::convert_and_interleave(&**buf),
        }
    }

    /// Convert to interleaved i16 rendered as native-endian bytes, the form
    /// the decode loop moves around.
    pub fn to_interleaved_s16_bytes(buffer: &AudioBufferRef<'_>) -> Vec<u8> {
        let samples = Self::to_interleaved_s16(buffer);
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_ne_bytes());
        }
        bytes
    }

    fn convert_and_interleave<S>(buf: &AudioBuffer<S>) -> Vec<i16>
    where
        S: Sample + IntoSample<i16>,
    {
        let channels = buf.spec().channels.count();
        let frames = buf.frames();
        let mut interleaved = Vec::with_capacity(frames * channels);
        for frame in 0..frames {
            for channel in 0..channels {
                interleaved.push(buf.chan(channel)[frame].into_sample());
            }
        }
        interleaved
    }
}
