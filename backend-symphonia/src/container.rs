//! Probed container state: stream table, packet reads, seeks, metadata.

use crate::decoder::SymphoniaPacketDecoder;
use bytes::Bytes;
use core_decode::backend::{
    BackendError, BackendResult, CodecId, ContainerMetadata, ContainerProps, MediaContainer,
    Packet, PacketDecoder, SeekRequest, StreamInfo, StreamKind, TimeBase,
};
use std::time::Duration;
use symphonia::core::codecs::{self, CodecParameters, CodecType, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::{Hint, ProbedMetadata};
use tracing::{debug, warn};

/// One probed Symphonia container.
pub struct SymphoniaContainer {
    reader: Box<dyn FormatReader>,
    probe_metadata: ProbedMetadata,
    /// Our stream table, positionally matching `track_ids`.
    streams: Vec<StreamInfo>,
    track_ids: Vec<u32>,
    codec_params: Vec<CodecParameters>,
    byte_len: Option<u64>,
}

impl SymphoniaContainer {
    /// Probe `mss` and build the stream table.
    pub fn open(
        mss: MediaSourceStream,
        hint: &Hint,
        byte_len: Option<u64>,
    ) -> BackendResult<Box<dyn MediaContainer>> {
        let probed = symphonia::default::get_probe()
            .format(
                hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|err| BackendError::Open(err.to_string()))?;

        let reader = probed.format;
        let mut streams = Vec::new();
        let mut track_ids = Vec::new();
        let mut codec_params = Vec::new();

        for (index, track) in reader.tracks().iter().enumerate() {
            let params = &track.codec_params;
            let sample_rate = params.sample_rate.unwrap_or(0);
            streams.push(StreamInfo {
                index,
                // Symphonia only demuxes audio; tracks it cannot name stay
                // unclassified instead of being guessed at.
                kind: if params.codec == CODEC_TYPE_NULL {
                    StreamKind::Other
                } else {
                    StreamKind::Audio
                },
                codec: codec_id(params.codec),
                sample_rate,
                channels: params.channels.map(|ch| ch.count() as u16).unwrap_or(2),
                time_base: params
                    .time_base
                    .map(|tb| TimeBase {
                        num: tb.numer,
                        den: tb.denom,
                    })
                    .unwrap_or(TimeBase {
                        num: 1,
                        den: sample_rate.max(1),
                    }),
                duration_ts: params.n_frames,
            });
            track_ids.push(track.id);
            codec_params.push(params.clone());
        }

        debug!(tracks = streams.len(), "container probed");
        Ok(Box::new(Self {
            reader,
            probe_metadata: probed.metadata,
            streams,
            track_ids,
            codec_params,
            byte_len,
        }))
    }

    fn stream_index_of(&self, track_id: u32) -> Option<usize> {
        self.track_ids.iter().position(|&id| id == track_id)
    }
}

impl MediaContainer for SymphoniaContainer {
    fn streams(&self) -> Vec<StreamInfo> {
        self.streams.clone()
    }

    fn new_decoder(&mut self, stream_index: usize) -> BackendResult<Box<dyn PacketDecoder>> {
        let params = self
            .codec_params
            .get(stream_index)
            .ok_or_else(|| BackendError::Codec(format!("no stream {stream_index}")))?;
        let decoder = symphonia::default::get_codecs()
            .make(params, &codecs::DecoderOptions::default())
            .map_err(|err| BackendError::Codec(err.to_string()))?;
        Ok(Box::new(SymphoniaPacketDecoder::new(
            decoder,
            self.track_ids[stream_index],
        )))
    }

    fn read_packet(&mut self) -> BackendResult<Option<Packet>> {
        loop {
            match self.reader.next_packet() {
                Ok(packet) => {
                    // Tracks we did not table (none today, but cheap to
                    // guard) are skipped rather than misattributed.
                    let Some(stream) = self.stream_index_of(packet.track_id()) else {
                        continue;
                    };
                    return Ok(Some(Packet {
                        stream,
                        ts: packet.ts(),
                        dur: packet.dur(),
                        data: Bytes::from(packet.data.into_vec()),
                    }));
                }
                Err(SymphoniaError::IoError(err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    // The track list changed (chained streams); this session
                    // is bound to the old tracks, so treat it as the end.
                    warn!("track list reset mid-stream; ending packet reads");
                    return Ok(None);
                }
                Err(SymphoniaError::IoError(err)) => return Err(BackendError::Io(err)),
                Err(err) => return Err(BackendError::Decode(err.to_string())),
            }
        }
    }

    fn seek(&mut self, stream_index: usize, request: SeekRequest) -> BackendResult<()> {
        let track_id = *self
            .track_ids
            .get(stream_index)
            .ok_or_else(|| BackendError::Seek(format!("no stream {stream_index}")))?;

        let ts = match request {
            SeekRequest::Timestamp(ts) => ts,
            SeekRequest::BytePosition(pos) => {
                // The demuxer only repositions on the timeline; scale the
                // byte offset back onto it. Best effort by construction.
                let duration_ts = self.streams[stream_index].duration_ts;
                match (self.byte_len, duration_ts) {
                    (Some(len), Some(dur)) if len > 0 => {
                        (pos as f64 / len as f64 * dur as f64) as u64
                    }
                    _ => {
                        return Err(BackendError::Seek(
                            "no byte-to-time mapping for this stream".to_string(),
                        ))
                    }
                }
            }
        };

        self.reader
            .seek(SeekMode::Coarse, SeekTo::TimeStamp { ts, track_id })
            .map(|_| ())
            .map_err(|err| BackendError::Seek(err.to_string()))
    }

    fn properties(&self) -> ContainerProps {
        let audio = self
            .streams
            .iter()
            .find(|s| s.kind == StreamKind::Audio);
        let duration = audio.and_then(|s| {
            let ticks = s.duration_ts?;
            let tb = s.time_base;
            if tb.den == 0 {
                return None;
            }
            Some(Duration::from_secs_f64(
                ticks as f64 * tb.num as f64 / tb.den as f64,
            ))
        });
        ContainerProps {
            byte_len: self.byte_len,
            duration,
            // Symphonia reports no container-level bitrate; the adapter
            // derives averages from size and duration instead.
            bit_rate: None,
            format_name: audio.map(|s| container_name(&s.codec).to_string()),
        }
    }

    fn metadata(&mut self) -> ContainerMetadata {
        let mut out = ContainerMetadata::default();
        {
            let mut metadata = self.reader.metadata();
            if let Some(revision) = metadata.skip_to_latest() {
                collect_tags(revision, &mut out);
            }
        }
        // Side-channel metadata found during probing (e.g. ID3v2 in front of
        // an MP3 stream) fills whatever the container itself did not carry.
        if let Some(mut metadata) = self.probe_metadata.get() {
            if let Some(revision) = metadata.skip_to_latest() {
                collect_tags(revision, &mut out);
            }
        }
        out
    }
}

fn collect_tags(revision: &MetadataRevision, out: &mut ContainerMetadata) {
    for tag in revision.tags() {
        match tag.std_key {
            Some(StandardTagKey::TrackTitle) if out.title.is_none() => {
                out.title = Some(tag.value.to_string());
            }
            Some(StandardTagKey::Artist) if out.artist.is_none() => {
                out.artist = Some(tag.value.to_string());
            }
            Some(StandardTagKey::Album) if out.album.is_none() => {
                out.album = Some(tag.value.to_string());
            }
            Some(StandardTagKey::TrackNumber) if out.track.is_none() => {
                out.track = parse_track_number(&tag.value.to_string());
            }
            _ => {}
        }
    }
}

/// Track numbers frequently arrive as "3/12"; only the position matters.
fn parse_track_number(raw: &str) -> Option<u32> {
    raw.split('/').next()?.trim().parse().ok()
}

/// Map a codec to the short container name used for identification.
fn container_name(codec: &CodecId) -> &'static str {
    match codec {
        CodecId::Mp3 => "mp3",
        CodecId::Aac => "m4a",
        CodecId::Flac => "flac",
        CodecId::Vorbis => "ogg",
        CodecId::Opus => "opus",
        CodecId::Wav => "wav",
        CodecId::Alac => "m4a",
        CodecId::Unknown | CodecId::Other(_) => "bin",
    }
}

fn codec_id(codec: CodecType) -> CodecId {
    if codec == codecs::CODEC_TYPE_MP3 {
        CodecId::Mp3
    } else if codec == codecs::CODEC_TYPE_AAC {
        CodecId::Aac
    } else if codec == codecs::CODEC_TYPE_FLAC {
        CodecId::Flac
    } else if codec == codecs::CODEC_TYPE_VORBIS {
        CodecId::Vorbis
    } else if codec == codecs::CODEC_TYPE_OPUS {
        CodecId::Opus
    } else if codec == codecs::CODEC_TYPE_ALAC {
        CodecId::Alac
    } else if codec == codecs::CODEC_TYPE_PCM_S16LE
        || codec == codecs::CODEC_TYPE_PCM_S16BE
        || codec == codecs::CODEC_TYPE_PCM_S24LE
        || codec == codecs::CODEC_TYPE_PCM_S24BE
        || codec == codecs::CODEC_TYPE_PCM_S32LE
        || codec == codecs::CODEC_TYPE_PCM_S32BE
        || codec == codecs::CODEC_TYPE_PCM_U8
        || codec == codecs::CODEC_TYPE_PCM_F32LE
        || codec == codecs::CODEC_TYPE_PCM_F32BE
        || codec == codecs::CODEC_TYPE_PCM_F64LE
        || codec == codecs::CODEC_TYPE_PCM_F64BE
    {
        CodecId::Wav
    } else {
        CodecId::Unknown
    }
}
