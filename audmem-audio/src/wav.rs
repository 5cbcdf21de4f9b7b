use crate::buffer::StereoBuffer;
use crate::error::AudioError;
use crate::resample::{resample, resampled_len};
use std::path::Path;

/// Reads a WAV file as a stereo buffer at `target_rate`.
///
/// Mono files are duplicated onto both channels; channels beyond the second
/// are dropped. Integer PCM is scaled to [-1, 1).
pub fn read_wav(path: impl AsRef<Path>, target_rate: u32) -> Result<StereoBuffer, AudioError> {
    let mut reader = hound::WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let (left, right): (Vec<f32>, Vec<f32>) = samples
        .chunks_exact(channels)
        .map(|frame| (frame[0], if channels > 1 { frame[1] } else { frame[0] }))
        .unzip();

    let (left, right) = if spec.sample_rate != target_rate {
        let len = resampled_len(left.len(), spec.sample_rate, target_rate);
        log::debug!(
            "Resampling {} from {} Hz to {} Hz",
            path.as_ref().display(),
            spec.sample_rate,
            target_rate
        );
        (resample(&left, len), resample(&right, len))
    } else {
        (left, right)
    };

    Ok(StereoBuffer::new(
        left.into_iter().zip(right).map(|(l, r)| [l, r]).collect(),
    ))
}

/// Writes a stereo buffer as 32-bit float WAV.
pub fn write_wav(
    path: impl AsRef<Path>,
    buffer: &StereoBuffer,
    sample_rate: u32,
) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for frame in buffer.frames() {
        writer.write_sample(frame[0])?;
        writer.write_sample(frame[1])?;
    }
    writer.finalize()?;
    Ok(())
}
