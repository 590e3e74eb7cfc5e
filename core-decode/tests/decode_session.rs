//! Decode session behavior against a scripted backend.
//!
//! The backend speaks a tiny framing protocol so tests control exactly how
//! packets split into frames:
//!
//! - `0x01, len: u32 BE, payload` - one decodable frame
//! - `0x02` - an undecodable frame
//! - `0x03` - a step that consumes nothing (codec stall)

use bytes::Bytes;
use core_decode::backend::{
    BackendError, BackendResult, CodecId, ContainerMetadata, ContainerProps, MediaBackend,
    MediaContainer, Packet, PacketDecoder, SeekRequest, StreamInfo, StreamKind, TimeBase,
};
use core_decode::{DecodeSession, ErrorKind};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Scripted backend
// ============================================================================

const REC_FRAME: u8 = 0x01;
const REC_BAD: u8 = 0x02;
const REC_STALL: u8 = 0x03;

struct ScriptDecoder;

impl PacketDecoder for ScriptDecoder {
    fn decode(&mut self, input: &[u8]) -> BackendResult<core_decode::backend::DecodeStep> {
        match input[0] {
            REC_FRAME => {
                let mut len_bytes = [0u8; 4];
                len_bytes.copy_from_slice(&input[1..5]);
                let len = u32::from_be_bytes(len_bytes) as usize;
                Ok(core_decode::backend::DecodeStep {
                    consumed: 5 + len,
                    pcm: input[5..5 + len].to_vec(),
                })
            }
            REC_STALL => Ok(core_decode::backend::DecodeStep {
                consumed: 0,
                pcm: Vec::new(),
            }),
            _ => Err(BackendError::Decode("scripted bad frame".to_string())),
        }
    }
}

struct ScriptContainer {
    streams: Vec<StreamInfo>,
    packets: VecDeque<Packet>,
    post_seek_packets: Option<Vec<Packet>>,
    props: ContainerProps,
    fail_seek: bool,
    seek_log: Arc<Mutex<Vec<SeekRequest>>>,
}

impl MediaContainer for ScriptContainer {
    fn streams(&self) -> Vec<StreamInfo> {
        self.streams.clone()
    }

    fn new_decoder(&mut self, _stream_index: usize) -> BackendResult<Box<dyn PacketDecoder>> {
        Ok(Box::new(ScriptDecoder))
    }

    fn read_packet(&mut self) -> BackendResult<Option<Packet>> {
        Ok(self.packets.pop_front())
    }

    fn seek(&mut self, _stream_index: usize, request: SeekRequest) -> BackendResult<()> {
        self.seek_log.lock().unwrap().push(request);
        if self.fail_seek {
            return Err(BackendError::Seek("scripted seek failure".to_string()));
        }
        if let Some(after) = self.post_seek_packets.clone() {
            self.packets = after.into();
        }
        Ok(())
    }

    fn properties(&self) -> ContainerProps {
        self.props.clone()
    }

    fn metadata(&mut self) -> ContainerMetadata {
        ContainerMetadata::default()
    }
}

#[derive(Default)]
struct ScriptBackend {
    streams: Vec<StreamInfo>,
    packets: Vec<Packet>,
    post_seek_packets: Option<Vec<Packet>>,
    props: ContainerProps,
    fail_open: bool,
    fail_seek: bool,
    seek_log: Arc<Mutex<Vec<SeekRequest>>>,
}

impl MediaBackend for ScriptBackend {
    fn open(&self, _path: &Path) -> BackendResult<Box<dyn MediaContainer>> {
        if self.fail_open {
            return Err(BackendError::Open("scripted open failure".to_string()));
        }
        Ok(Box::new(ScriptContainer {
            streams: self.streams.clone(),
            packets: self.packets.clone().into(),
            post_seek_packets: self.post_seek_packets.clone(),
            props: self.props.clone(),
            fail_seek: self.fail_seek,
            seek_log: Arc::clone(&self.seek_log),
        }))
    }
}

// ============================================================================
// Builders
// ============================================================================

fn audio_stream(codec: CodecId) -> StreamInfo {
    StreamInfo {
        index: 0,
        kind: StreamKind::Audio,
        codec,
        sample_rate: 44100,
        channels: 2,
        time_base: TimeBase { num: 1, den: 44100 },
        duration_ts: Some(3 * 44100),
    }
}

fn video_stream(index: usize) -> StreamInfo {
    StreamInfo {
        index,
        kind: StreamKind::Video,
        codec: CodecId::Unknown,
        sample_rate: 0,
        channels: 0,
        time_base: TimeBase { num: 1, den: 90000 },
        duration_ts: None,
    }
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut record = vec![REC_FRAME];
    record.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    record.extend_from_slice(payload);
    record
}

fn packet(stream: usize, records: &[Vec<u8>]) -> Packet {
    let data: Vec<u8> = records.iter().flatten().copied().collect();
    Packet {
        stream,
        ts: 0,
        dur: 0,
        data: Bytes::from(data),
    }
}

/// Deterministic PCM-like payload.
fn source_bytes(len: usize, salt: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_add(salt)).collect()
}

/// Slice `source` into frames of the given sizes (cycled) and group
/// `frames_per_packet` frames into each packet.
fn packets_from_source(source: &[u8], frame_sizes: &[usize], frames_per_packet: usize) -> Vec<Packet> {
    let mut frames = Vec::new();
    let mut offset = 0;
    let mut size_idx = 0;
    while offset < source.len() {
        let size = frame_sizes[size_idx % frame_sizes.len()].min(source.len() - offset);
        frames.push(frame(&source[offset..offset + size]));
        offset += size;
        size_idx += 1;
    }
    frames
        .chunks(frames_per_packet)
        .map(|chunk| packet(0, chunk))
        .collect()
}

fn backend_for_source(source: &[u8], frame_sizes: &[usize], frames_per_packet: usize) -> ScriptBackend {
    ScriptBackend {
        streams: vec![audio_stream(CodecId::Mp3)],
        packets: packets_from_source(source, frame_sizes, frames_per_packet),
        ..ScriptBackend::default()
    }
}

fn collect_all(session: &mut DecodeSession, cap: usize) -> Vec<u8> {
    let mut collected = Vec::new();
    loop {
        let mut buf = vec![0u8; cap];
        let progress = session.decode(&mut buf);
        if progress.written == 0 {
            return collected;
        }
        collected.extend_from_slice(&buf[..progress.written]);
    }
}

// ============================================================================
// Decode loop
// ============================================================================

#[test]
fn chunked_reads_reassemble_the_stream_exactly() {
    let source = source_bytes(50_000, 3);
    for cap in [237usize, 1000, 65_536] {
        let backend = backend_for_source(&source, &[3000, 4410, 777, 128], 2);
        let mut session = DecodeSession::open(&backend, Path::new("/music/a.mp3"));
        assert!(session.is_open());
        let collected = collect_all(&mut session, cap);
        assert_eq!(collected, source, "capacity {cap} lost or reordered bytes");
    }
}

#[test]
fn end_to_end_three_second_stereo_stream() {
    // 3 s of stereo S16 at 44.1 kHz, in 120 frames of 4410 bytes.
    let total = 3 * 44100 * 2 * 2;
    let source = source_bytes(total, 0);
    let backend = backend_for_source(&source, &[4410], 2);
    let mut session = DecodeSession::open(&backend, Path::new("/music/three_sec.mp3"));

    let mut sizes = Vec::new();
    let mut collected = Vec::new();
    loop {
        let mut buf = vec![0u8; 1000];
        let progress = session.decode(&mut buf);
        assert_eq!(progress.params.channels, 2);
        assert_eq!(progress.params.rate, 44100);
        if progress.written == 0 {
            assert!(session.last_error().is_none(), "EOS is not an error");
            break;
        }
        assert!(progress.written <= 1000);
        sizes.push(progress.written);
        collected.extend_from_slice(&buf[..progress.written]);
    }

    assert_eq!(collected.len(), 529_200);
    assert_eq!(collected, source);
    let last = *sizes.last().unwrap();
    assert!(last < 1000, "stream length is not a multiple of the buffer");

    // A terminal call stays at end of stream.
    let mut buf = vec![0u8; 1000];
    assert_eq!(session.decode(&mut buf).written, 0);
}

#[test]
fn zero_capacity_decodes_into_carry_over_without_losing_bytes() {
    let source = source_bytes(9000, 11);
    let backend = backend_for_source(&source, &[3000], 1);
    let mut session = DecodeSession::open(&backend, Path::new("/music/a.mp3"));

    let progress = session.decode(&mut []);
    assert_eq!(progress.written, 0);
    assert!(session.last_error().is_none());
    assert_eq!(session.pending_bytes(), 3000, "one call's audio is carried");

    let collected = collect_all(&mut session, 1024);
    assert_eq!(collected, source, "zero-capacity call dropped audio");
}

#[test]
fn oversized_frame_is_carried_over_and_drained() {
    let source = source_bytes(10_000, 5);
    let backend = backend_for_source(&source, &[10_000], 1);
    let mut session = DecodeSession::open(&backend, Path::new("/music/a.mp3"));

    let mut buf = vec![0u8; 1000];
    let progress = session.decode(&mut buf);
    assert_eq!(progress.written, 1000);
    assert_eq!(session.pending_bytes(), 9000);

    // Drains shrink the carry-over monotonically down to empty.
    let mut pending = session.pending_bytes();
    loop {
        let progress = session.decode(&mut buf);
        if progress.written == 0 {
            break;
        }
        assert!(session.pending_bytes() < pending || pending == 0);
        pending = session.pending_bytes();
    }
    assert_eq!(session.pending_bytes(), 0);
}

#[test]
fn stream_error_skips_the_packet_but_not_the_session() {
    let good_a = source_bytes(500, 1);
    let never_decoded = source_bytes(400, 2);
    let good_c = source_bytes(600, 3);

    let backend = ScriptBackend {
        streams: vec![audio_stream(CodecId::Mp3)],
        packets: vec![
            packet(0, &[frame(&good_a), vec![REC_BAD], frame(&never_decoded)]),
            packet(0, &[frame(&good_c)]),
        ],
        ..ScriptBackend::default()
    };
    let mut session = DecodeSession::open(&backend, Path::new("/music/a.mp3"));

    // The bad frame is reported, but the bytes decoded before it still count.
    let mut buf = vec![0u8; 4096];
    let progress = session.decode(&mut buf);
    assert_eq!(progress.written, 500);
    assert_eq!(&buf[..500], &good_a[..]);
    let err = session.last_error().expect("stream error recorded");
    assert_eq!(err.kind, ErrorKind::Stream);

    // The next call starts fresh: error cleared, next packet decodes.
    let progress = session.decode(&mut buf);
    assert_eq!(progress.written, 600);
    assert_eq!(&buf[..600], &good_c[..]);
    assert!(session.last_error().is_none());
}

#[test]
fn stalled_decoder_abandons_the_packet() {
    let payload = source_bytes(800, 9);
    let backend = ScriptBackend {
        streams: vec![audio_stream(CodecId::Mp3)],
        packets: vec![
            packet(0, &[vec![REC_STALL]]),
            packet(0, &[frame(&payload)]),
        ],
        ..ScriptBackend::default()
    };
    let mut session = DecodeSession::open(&backend, Path::new("/music/a.mp3"));

    let mut buf = vec![0u8; 4096];
    let progress = session.decode(&mut buf);
    assert_eq!(progress.written, 800);
    assert_eq!(&buf[..800], &payload[..]);
}

#[test]
fn packets_from_other_streams_are_skipped() {
    let payload = source_bytes(700, 4);
    let audio = StreamInfo {
        index: 1,
        ..audio_stream(CodecId::Mp3)
    };
    let backend = ScriptBackend {
        streams: vec![video_stream(0), audio],
        packets: vec![
            packet(0, &[frame(&source_bytes(100, 0))]),
            packet(1, &[frame(&payload)]),
        ],
        ..ScriptBackend::default()
    };
    let mut session = DecodeSession::open(&backend, Path::new("/music/a.mkv"));

    let mut buf = vec![0u8; 4096];
    let progress = session.decode(&mut buf);
    assert_eq!(progress.written, 700);
    assert_eq!(&buf[..700], &payload[..]);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn open_failure_yields_a_queryable_failed_session() {
    let backend = ScriptBackend {
        fail_open: true,
        ..ScriptBackend::default()
    };
    let mut session = DecodeSession::open(&backend, Path::new("/music/missing.mp3"));

    assert!(!session.is_open());
    let err = session.last_error().expect("fatal error recorded");
    assert_eq!(err.kind, ErrorKind::Fatal);

    let mut buf = vec![0u8; 64];
    assert_eq!(session.decode(&mut buf).written, 0);
    assert!(session.seek(1).is_err());
}

#[test]
fn file_without_audio_stream_fails_to_open() {
    let backend = ScriptBackend {
        streams: vec![video_stream(0)],
        ..ScriptBackend::default()
    };
    let session = DecodeSession::open(&backend, Path::new("/video/clip.mkv"));

    assert!(!session.is_open());
    let err = session.last_error().expect("fatal error recorded");
    assert_eq!(err.kind, ErrorKind::Fatal);
    assert!(err.message.contains("no audio stream"));
}

#[test]
fn decode_after_close_reports_fatal() {
    let source = source_bytes(1000, 7);
    let backend = backend_for_source(&source, &[1000], 1);
    let mut session = DecodeSession::open(&backend, Path::new("/music/a.mp3"));
    assert!(session.is_open());

    session.close();
    assert!(!session.is_open());

    let mut buf = vec![0u8; 64];
    assert_eq!(session.decode(&mut buf).written, 0);
    let err = session.last_error().expect("fatal error recorded");
    assert_eq!(err.kind, ErrorKind::Fatal);
}

// ============================================================================
// Seek
// ============================================================================

#[test]
fn seek_translates_to_the_stream_time_base_and_clears_carry_over() {
    let source = source_bytes(12_000, 2);
    let post_seek = source_bytes(5000, 42);
    let seek_log = Arc::new(Mutex::new(Vec::new()));
    let backend = ScriptBackend {
        streams: vec![audio_stream(CodecId::Mp3)],
        packets: packets_from_source(&source, &[4000], 1),
        post_seek_packets: Some(packets_from_source(&post_seek, &[5000], 1)),
        seek_log: Arc::clone(&seek_log),
        ..ScriptBackend::default()
    };
    let mut session = DecodeSession::open(&backend, Path::new("/music/a.mp3"));

    // Leave bytes in the carry-over, then seek past them.
    let mut buf = vec![0u8; 100];
    session.decode(&mut buf);
    assert!(session.pending_bytes() > 0);

    assert_eq!(session.seek(2).unwrap(), 2);
    assert_eq!(session.pending_bytes(), 0, "stale audio must not survive a seek");
    assert_eq!(
        seek_log.lock().unwrap().as_slice(),
        &[SeekRequest::Timestamp(2 * 44100)]
    );

    // The next decode delivers post-seek audio, not pre-seek carry-over.
    let mut buf = vec![0u8; 8192];
    let progress = session.decode(&mut buf);
    assert_eq!(progress.written, 5000);
    assert_eq!(&buf[..5000], &post_seek[..]);
}

#[test]
fn flac_seek_uses_a_byte_position_estimate() {
    let seek_log = Arc::new(Mutex::new(Vec::new()));
    let backend = ScriptBackend {
        streams: vec![audio_stream(CodecId::Flac)],
        props: ContainerProps {
            byte_len: Some(1_000_000),
            duration: Some(Duration::from_secs(3)),
            ..ContainerProps::default()
        },
        seek_log: Arc::clone(&seek_log),
        ..ScriptBackend::default()
    };
    let mut session = DecodeSession::open(&backend, Path::new("/music/a.flac"));

    assert!(session.seek(1).is_ok());
    // 1_000_000 * 1 * 44100 / (1 * 132300) = 333333.33..., truncated.
    assert_eq!(
        seek_log.lock().unwrap().as_slice(),
        &[SeekRequest::BytePosition(333_333)]
    );
}

#[test]
fn failed_seek_leaves_the_session_usable() {
    let source = source_bytes(8000, 6);
    let backend = ScriptBackend {
        streams: vec![audio_stream(CodecId::Mp3)],
        packets: packets_from_source(&source, &[4000], 1),
        fail_seek: true,
        ..ScriptBackend::default()
    };
    let mut session = DecodeSession::open(&backend, Path::new("/music/a.mp3"));

    let mut buf = vec![0u8; 100];
    session.decode(&mut buf);
    let pending_before = session.pending_bytes();
    assert!(pending_before > 0);

    let err = session.seek(2).unwrap_err();
    assert_eq!(err.requested, 2);
    assert_eq!(session.pending_bytes(), pending_before, "failure mutates nothing");

    // Decoding resumes from the prior position: carry-over drains first.
    let mut rest = vec![0u8; 16_384];
    let progress = session.decode(&mut rest);
    assert_eq!(progress.written, pending_before);
}

// ============================================================================
// Bitrate
// ============================================================================

#[test]
fn bitrate_figures_behave_per_contract() {
    // Half a second of stereo S16 at 44.1 kHz per frame.
    let payload = source_bytes(88_200, 8);
    let backend = ScriptBackend {
        streams: vec![audio_stream(CodecId::Mp3)],
        packets: vec![packet(0, &[frame(&payload)])],
        props: ContainerProps {
            byte_len: Some(5_000_000),
            duration: Some(Duration::from_secs(100)),
            ..ContainerProps::default()
        },
        ..ScriptBackend::default()
    };
    let mut session = DecodeSession::open(&backend, Path::new("/music/a.mp3"));

    assert_eq!(session.avg_bitrate_kbps(), 400);

    let mut buf = vec![0u8; 100_000];
    let progress = session.decode(&mut buf);
    assert_eq!(progress.written, 88_200);

    // 88_205 compressed bytes over 0.5 s of audio.
    assert_eq!(session.bitrate_kbps(), 1411);
    assert!(session.bitrate_kbps() > 0);
    assert_eq!(session.avg_bitrate_kbps(), 400, "average is fixed at open");
}
