//! Packet decoding bridge: raw packet bytes in, interleaved S16 out.

use crate::converter::SampleConverter;
use core_decode::backend::{BackendError, BackendResult, DecodeStep, PacketDecoder};
use symphonia::core::codecs::Decoder as SymphoniaDecoder;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::Packet as SymphoniaPacket;

/// A Symphonia codec bound to one track.
pub struct SymphoniaPacketDecoder {
    decoder: Box<dyn SymphoniaDecoder>,
    track_id: u32,
}

impl SymphoniaPacketDecoder {
    pub fn new(decoder: Box<dyn SymphoniaDecoder>, track_id: u32) -> Self {
        Self { decoder, track_id }
    }
}

impl PacketDecoder for SymphoniaPacketDecoder {
    fn decode(&mut self, input: &[u8]) -> BackendResult<DecodeStep> {
        // Symphonia decodes whole packets: one step always consumes the
        // entire slice, unlike cursor-style codecs.
        let packet = SymphoniaPacket::new_from_boxed_slice(
            self.track_id,
            0,
            0,
            input.to_vec().into_boxed_slice(),
        );
        match self.decoder.decode(&packet) {
            Ok(buffer) => Ok(DecodeStep {
                consumed: input.len(),
                pcm: SampleConverter::to_interleaved_s16_bytes(&buffer),
            }),
            Err(SymphoniaError::DecodeError(msg)) => Err(BackendError::Decode(msg.to_string())),
            Err(err) => Err(BackendError::Decode(err.to_string())),
        }
    }

    fn reset(&mut self) {
        self.decoder.reset();
    }
}
