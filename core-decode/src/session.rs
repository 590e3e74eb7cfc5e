//! # Decode Session
//!
//! One opened stream and the full pull-decode state machine around it:
//! lifecycle (open/close), the packet-to-frame decode loop, and seek
//! translation.
//!
//! ## Buffering model
//!
//! Decoded frame sizes never align with the caller's buffer size, so the
//! session keeps a [`RemainderBuffer`] of decoded-but-undelivered bytes.
//! Every decode call drains that buffer first; only when it is empty does
//! the session pull fresh packets. At most one frame is decoded ahead, so
//! the carry-over never grows beyond what a single call produced.
//!
//! ## Error model
//!
//! Failures surface through a single-slot [`ErrorChannel`], cleared at the
//! top of every decode call: `Fatal` means the session is dead, `Stream`
//! means one frame was skipped and decoding already moved on. End of stream
//! is not an error - it is a 0-byte successful return.

use crate::backend::{CodecId, MediaBackend, MediaContainer, PacketDecoder, SeekRequest, TimeBase};
use crate::backend::{ContainerProps, StreamInfo, StreamKind};
use crate::bitrate::BitrateEstimator;
use crate::error::ErrorChannel;
use crate::remainder::RemainderBuffer;
use bridge_plugin::{DecodeProgress, Decoder, DecoderError, SeekError, SoundParams};
use bytes::Buf;
use std::path::Path;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenState {
    /// Opening failed; only the error slot is meaningful.
    Failed,
    Open,
    Closed,
}

/// One per opened stream. Created by [`DecodeSession::open`], driven by one
/// logical caller in strict sequence, released by [`DecodeSession::close`].
pub struct DecodeSession {
    state: OpenState,
    container: Option<Box<dyn MediaContainer>>,
    codec: Option<Box<dyn PacketDecoder>>,
    stream: Option<StreamInfo>,
    audio_index: usize,
    params: SoundParams,
    props: ContainerProps,
    remainder: RemainderBuffer,
    errors: ErrorChannel,
    bitrate: BitrateEstimator,
}

impl DecodeSession {
    /// Open `path` through `backend` and select its first audio stream.
    ///
    /// Never returns absence: every failure records a fatal error and yields
    /// a session in failed state so the host can still ask what went wrong.
    /// Whatever was acquired before the failing stage is released on the way
    /// out.
    pub fn open(backend: &dyn MediaBackend, path: &Path) -> Self {
        let mut session = Self {
            state: OpenState::Failed,
            container: None,
            codec: None,
            stream: None,
            audio_index: 0,
            params: SoundParams::new(0, 0),
            props: ContainerProps::default(),
            remainder: RemainderBuffer::new(),
            errors: ErrorChannel::new(),
            bitrate: BitrateEstimator::default(),
        };

        let mut container = match backend.open(path) {
            Ok(container) => container,
            Err(err) => {
                session
                    .errors
                    .set(DecoderError::fatal(0, format!("can't open file: {err}")));
                return session;
            }
        };

        // Select by capability, not by position: the first stream that
        // declares itself audio wins.
        let Some(stream) = container
            .streams()
            .into_iter()
            .find(|s| s.kind == StreamKind::Audio)
        else {
            session
                .errors
                .set(DecoderError::fatal(0, "no audio stream in file"));
            return session;
        };

        let codec = match container.new_decoder(stream.index) {
            Ok(codec) => codec,
            Err(err) => {
                session
                    .errors
                    .set(DecoderError::fatal(0, format!("no codec for this file: {err}")));
                return session;
            }
        };

        let props = container.properties();
        debug!(
            index = stream.index,
            rate = stream.sample_rate,
            channels = stream.channels,
            "opened audio stream"
        );

        session.params = SoundParams::new(stream.channels, stream.sample_rate);
        session.bitrate = BitrateEstimator::at_open(&props);
        session.audio_index = stream.index;
        session.props = props;
        session.stream = Some(stream);
        session.codec = Some(codec);
        session.container = Some(container);
        session.state = OpenState::Open;
        session
    }

    /// Release codec and container and clear the error slot. The session
    /// must not be decoded from or seeked afterwards.
    pub fn close(&mut self) {
        if self.state == OpenState::Open {
            self.codec = None;
            self.container = None;
            self.remainder.clear();
        }
        self.errors.clear();
        self.state = OpenState::Closed;
    }

    /// Pull up to `out.len()` decoded bytes.
    ///
    /// Carry-over from the previous call is delivered first; otherwise
    /// packets are read and decoded until at least one byte lands in `out`
    /// or in the carry-over buffer. An empty `out` is legal: one call's
    /// worth of audio is decoded into the carry-over and 0 is returned.
    pub fn decode(&mut self, out: &mut [u8]) -> DecodeProgress {
        self.errors.clear();
        // Params are reported unconditionally, even when this call fails.
        let params = self.params;

        if !self.remainder.is_empty() {
            let written = self.remainder.drain_into(out);
            trace!(bytes = written, "drained carry-over");
            return DecodeProgress { params, written };
        }

        let audio_index = self.audio_index;
        let (container, codec) = match (self.container.as_mut(), self.codec.as_mut()) {
            (Some(container), Some(codec)) => (container, codec),
            _ => {
                self.errors.set(DecoderError::fatal(
                    0,
                    "decode on a session that is not open",
                ));
                return DecodeProgress { params, written: 0 };
            }
        };

        let capacity = out.len();
        let mut written = 0usize;
        let mut compressed = 0usize;

        'packets: loop {
            let packet = match container.read_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => {
                    debug!("end of stream");
                    return DecodeProgress { params, written: 0 };
                }
                Err(err) => {
                    warn!(error = %err, "packet read failed");
                    return DecodeProgress { params, written: 0 };
                }
            };
            if packet.stream != audio_index {
                continue;
            }
            trace!(bytes = packet.data.len(), "got packet");

            let mut data = packet.data;
            while !data.is_empty() {
                let step = match codec.decode(&data) {
                    Ok(step) => step,
                    Err(err) => {
                        // Skip the frame and abandon the rest of the packet;
                        // retrying the same bytes cannot succeed.
                        self.errors.set(DecoderError::stream(
                            0,
                            format!("error in the stream: {err}"),
                        ));
                        break;
                    }
                };
                let consumed = step.consumed.min(data.len());
                compressed += consumed;
                data.advance(consumed);

                let frame = step.pcm;
                if written < capacity {
                    let to_copy = frame.len().min(capacity - written);
                    out[written..written + to_copy].copy_from_slice(&frame[..to_copy]);
                    written += to_copy;
                    trace!(bytes = to_copy, filled = written, "copied into caller buffer");
                    if to_copy < frame.len() {
                        self.remainder.replace(&frame[to_copy..]);
                    }
                } else if !frame.is_empty() {
                    self.remainder.append(&frame);
                }

                if consumed == 0 {
                    warn!("decoder consumed no input; dropping rest of packet");
                    break;
                }
            }

            if written > 0 || !self.remainder.is_empty() {
                break 'packets;
            }
        }

        self.bitrate
            .record(compressed, written + self.remainder.len(), &params);
        DecodeProgress { params, written }
    }

    /// Seek to an absolute offset in seconds.
    ///
    /// The target is rescaled into the selected stream's time base. For FLAC
    /// the container timestamps are unreliable, so the request becomes a
    /// byte-position estimate over the play-time fraction instead - a
    /// best-effort approximation, not an accurate seek. On success any
    /// carried-over audio is discarded; on failure nothing changes.
    pub fn seek(&mut self, seconds: u64) -> Result<u64, SeekError> {
        let (Some(stream), Some(container)) = (self.stream.as_ref(), self.container.as_mut())
        else {
            return Err(SeekError {
                requested: seconds,
                reason: "session is not open".to_string(),
            });
        };

        let tb = stream.time_base;
        let request = if stream.codec == CodecId::Flac {
            match (self.props.byte_len, stream.duration_ts) {
                (Some(byte_len), Some(duration_ts)) if duration_ts > 0 => {
                    let pos = byte_len as f64 * seconds as f64 * tb.den as f64
                        / (tb.num as f64 * duration_ts as f64);
                    SeekRequest::BytePosition(pos as u64)
                }
                // Without a size or duration there is nothing to scale by.
                _ => SeekRequest::Timestamp(rescale(seconds, tb)),
            }
        } else {
            SeekRequest::Timestamp(rescale(seconds, tb))
        };

        match container.seek(self.audio_index, request) {
            Ok(()) => {
                if let Some(codec) = self.codec.as_mut() {
                    codec.reset();
                }
                // Anything decoded before the seek is stale now.
                self.remainder.clear();
                debug!(seconds, ?request, "seek done");
                Ok(seconds)
            }
            Err(err) => {
                warn!(error = %err, seconds, "seek error");
                Err(SeekError {
                    requested: seconds,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Whether open succeeded and close has not been called.
    pub fn is_open(&self) -> bool {
        self.state == OpenState::Open
    }

    /// Output description captured at open time.
    pub fn sound_params(&self) -> SoundParams {
        self.params
    }

    /// Instantaneous bitrate of the most recent decode call, in kbps.
    pub fn bitrate_kbps(&self) -> u32 {
        self.bitrate.current_kbps()
    }

    /// Whole-file average bitrate fixed at open, in kbps; 0 when unknown.
    pub fn avg_bitrate_kbps(&self) -> u32 {
        self.bitrate.avg_kbps()
    }

    /// Container duration in whole seconds, when known.
    pub fn duration_secs(&self) -> Option<u64> {
        self.props.duration.map(|d| d.as_secs())
    }

    /// Snapshot of the pending error, if any.
    pub fn last_error(&self) -> Option<DecoderError> {
        self.errors.get()
    }

    /// Decoded bytes carried over for the next call. Diagnostic.
    pub fn pending_bytes(&self) -> usize {
        self.remainder.len()
    }
}

/// Seconds to time-base ticks.
fn rescale(seconds: u64, tb: TimeBase) -> u64 {
    seconds * u64::from(tb.den) / u64::from(tb.num.max(1))
}

impl Decoder for DecodeSession {
    fn decode(&mut self, out: &mut [u8]) -> DecodeProgress {
        DecodeSession::decode(self, out)
    }

    fn seek(&mut self, seconds: u64) -> Result<u64, SeekError> {
        DecodeSession::seek(self, seconds)
    }

    fn bitrate_kbps(&self) -> u32 {
        DecodeSession::bitrate_kbps(self)
    }

    fn avg_bitrate_kbps(&self) -> u32 {
        DecodeSession::avg_bitrate_kbps(self)
    }

    fn duration_secs(&self) -> Option<u64> {
        DecodeSession::duration_secs(self)
    }

    fn last_error(&self) -> Option<DecoderError> {
        DecodeSession::last_error(self)
    }

    fn close(&mut self) {
        DecodeSession::close(self)
    }
}
