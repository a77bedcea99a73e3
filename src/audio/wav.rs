use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec};

/// Decoded audio: mono samples in [-1.0, 1.0] plus the source format.
#[derive(Debug, Clone)]
pub struct Audio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the file before downmixing.
    pub channels: u16,
}

impl Audio {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Load a WAV file as mono f32 samples in [-1.0, 1.0].
///
/// Multi-channel files are downmixed by averaging each frame. The sample
/// rate is kept as-is.
pub fn load_samples(path: &Path) -> Result<Audio> {
    let mut reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    if spec.channels == 0 {
        anyhow::bail!("WAV file has no channels: {}", path.display());
    }

    let interleaved = read_interleaved(&mut reader, spec)
        .with_context(|| format!("Failed to read WAV samples: {}", path.display()))?;

    Ok(Audio {
        samples: downmix(&interleaved, spec.channels),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn read_interleaved<R: std::io::Read>(reader: &mut WavReader<R>, spec: WavSpec) -> Result<Vec<f32>> {
    let samples = match spec.sample_format {
        SampleFormat::Int => {
            let max_val = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<hound::Result<Vec<_>>>()?
        }
        SampleFormat::Float => reader.samples::<f32>().collect::<hound::Result<Vec<_>>>()?,
    };
    Ok(samples)
}

/// Average interleaved frames down to one channel. A trailing partial frame
/// is dropped.
fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let n = channels as usize;
    interleaved
        .chunks_exact(n)
        .map(|frame| frame.iter().sum::<f32>() / n as f32)
        .collect()
}
