//! Sample-rate conversion for the sample bank
//!
//! Decoded samples are always interleaved stereo. They are brought to the
//! output device's rate once, at load time, so the mixer plays every buffer
//! at one rate and never converts on the audio thread.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

/// Rate used when no output device is available
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Convert interleaved stereo from `from_rate` to `to_rate`
///
/// The whole clip goes through rubato as a single chunk. A trailing half
/// frame is dropped.
pub fn resample_stereo(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let frames = samples.len() / 2;
    if from_rate == to_rate {
        return Ok(samples[..frames * 2].to_vec());
    }
    if frames == 0 {
        return Ok(Vec::new());
    }

    let (left, right): (Vec<f32>, Vec<f32>) = samples
        .chunks_exact(2)
        .map(|frame| (frame[0], frame[1]))
        .unzip();
    let sides = vec![left, right];

    let mut converter = FastFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        frames,
        2,
    )
    .map_err(|e| Error::Decode(format!("Cannot convert {}Hz to {}Hz: {}", from_rate, to_rate, e)))?;

    let planar = converter
        .process(&sides, None)
        .map_err(|e| Error::Decode(format!("Sample-rate conversion failed: {}", e)))?;

    let [left, right] = planar.as_slice() else {
        return Err(Error::Internal(format!(
            "Expected 2 converted channels, got {}",
            planar.len()
        )));
    };
    let stereo: Vec<f32> = left
        .iter()
        .zip(right)
        .flat_map(|(&l, &r)| [l, r])
        .collect();

    debug!(
        "Converted {} frames at {}Hz to {} frames at {}Hz",
        frames,
        from_rate,
        stereo.len() / 2,
        to_rate
    );
    Ok(stereo)
}
