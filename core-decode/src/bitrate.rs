//! Bitrate estimation from container facts and per-call decode accounting.

use crate::backend::ContainerProps;
use bridge_plugin::SoundParams;

/// Tracks the two bitrate figures a host displays.
///
/// `avg_kbps` is fixed once at open from total file size over total
/// duration. `current_kbps` is an instantaneous per-call estimate - the
/// compressed bits a decode call consumed over the seconds of audio it
/// produced - and is intentionally unsmoothed; callers wanting a stable
/// readout smooth it themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitrateEstimator {
    avg_kbps: u32,
    current_kbps: u32,
}

impl BitrateEstimator {
    /// Derive the open-time figures from container facts. A missing or zero
    /// duration leaves the average at 0 (unknown) rather than dividing by it.
    pub fn at_open(props: &ContainerProps) -> Self {
        let avg_kbps = match (props.byte_len, props.duration) {
            (Some(bytes), Some(duration)) if !duration.is_zero() => {
                (bytes as f64 * 8.0 / duration.as_secs_f64() / 1000.0).round() as u32
            }
            _ => 0,
        };
        let current_kbps = match props.bit_rate {
            Some(bits_per_sec) => bits_per_sec / 1000,
            None => avg_kbps,
        };
        Self {
            avg_kbps,
            current_kbps,
        }
    }

    /// Account one decode call: `compressed_bytes` consumed from the
    /// container, `pcm_bytes` produced (delivered plus carried over).
    pub fn record(&mut self, compressed_bytes: usize, pcm_bytes: usize, params: &SoundParams) {
        if pcm_bytes == 0 || params.rate == 0 || params.channels == 0 {
            return;
        }
        // 2 bytes per sample in the fixed S16 output.
        let audio_secs =
            pcm_bytes as f64 / 2.0 / params.channels as f64 / params.rate as f64;
        self.current_kbps =
            (compressed_bytes as f64 * 8.0 / audio_secs / 1000.0).round() as u32;
    }

    pub fn current_kbps(&self) -> u32 {
        self.current_kbps
    }

    pub fn avg_kbps(&self) -> u32 {
        self.avg_kbps
    }
}
