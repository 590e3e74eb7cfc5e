//! Decode a file end to end and print what the plugin reports about it.
//!
//! ```sh
//! cargo run --example decode_demo -- /path/to/track.mp3
//! ```

use anyhow::{bail, Context, Result};
use backend_symphonia::decoder_plugin;
use bridge_plugin::{DecoderPlugin, TagSelection};
use std::path::PathBuf;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path: PathBuf = std::env::args()
        .nth(1)
        .context("usage: decode_demo <file>")?
        .into();

    let plugin = decoder_plugin();
    plugin.init();

    if !plugin.supports_file(&path) {
        bail!("{} is not a pure-audio file", path.display());
    }
    println!("format: {}", plugin.identify(&path));

    let tags = plugin.tags(&path, TagSelection::all());
    if let Some(title) = &tags.title {
        println!("title:  {title}");
    }
    if let Some(artist) = &tags.artist {
        println!("artist: {artist}");
    }
    if let Some(secs) = tags.duration_secs {
        println!("length: {}:{:02}", secs / 60, secs % 60);
    }

    let mut decoder = plugin.open(&path);
    if let Some(err) = decoder.last_error() {
        bail!("open failed: {err}");
    }

    let mut buf = vec![0u8; 16 * 1024];
    let mut total: u64 = 0;
    loop {
        let progress = decoder.decode(&mut buf);
        if progress.written == 0 {
            break;
        }
        total += progress.written as u64;
    }

    println!(
        "decoded {total} bytes of PCM ({} kbps avg, {} kbps last)",
        decoder.avg_bitrate_kbps(),
        decoder.bitrate_kbps()
    );
    decoder.close();
    Ok(())
}
