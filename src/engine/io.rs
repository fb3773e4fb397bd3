//! Audio file I/O
//!
//! WAV import/export for the offline host. Files keep their own sample rate
//! and channel count; the processor is prepared to match whatever is loaded.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};

use crate::engine::buffer::AudioBuffer;
use crate::error::{GainKnobError, Result};

/// Output sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Bit depth: 16, 24 (integer) or 32 (float)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 24 }
    }
}

impl ExportFormat {
    pub fn new(bit_depth: u16) -> Self {
        ExportFormat { bit_depth }
    }

    /// 32-bit float, lossless for processed output
    pub fn float() -> Self {
        ExportFormat { bit_depth: 32 }
    }
}

/// Read a WAV file into a planar buffer
///
/// # Errors
/// * `FileNotFound` - the path does not exist
/// * `InvalidAudio` - the file is not a readable WAV file
/// * `UnsupportedFormat` - an integer bit depth other than 8/16/24/32
/// * `EmptyAudio` - the file holds no frames
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(GainKnobError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let reader = WavReader::open(path).map_err(|e| GainKnobError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(GainKnobError::InvalidAudio {
            reason: "file declares zero channels".to_string(),
            source: None,
        });
    }

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if interleaved.len() < channels {
        return Err(GainKnobError::EmptyAudio);
    }

    // Drop a trailing partial frame rather than failing the whole file.
    let usable = interleaved.len() - interleaved.len() % channels;
    let buffer = AudioBuffer::from_interleaved(&interleaved[..usable], channels, spec.sample_rate)?;

    info!(
        "Imported {}: {} ch, {} Hz, {:.2}s",
        path.display(),
        channels,
        spec.sample_rate,
        buffer.duration_secs()
    );
    Ok(buffer)
}

/// Write a planar buffer to a WAV file
///
/// Integer formats clamp to full scale.
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    if buffer.num_channels() == 0 {
        return Err(GainKnobError::EmptyAudio);
    }

    let sample_format = match format.bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => {
            return Err(GainKnobError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", other),
            });
        }
    };

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format,
    };

    let interleaved = buffer.to_interleaved();
    let mut writer = WavWriter::create(path, spec)?;

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                writer.write_sample((sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32)?;
            }
        }
        _ => {
            for sample in interleaved {
                writer.write_sample(sample)?;
            }
        }
    }

    writer.finalize()?;
    debug!("Exported {} ({}-bit)", path.display(), format.bit_depth);
    Ok(())
}

/// Generate a sine test tone, identical on every channel
pub fn generate_test_tone(
    frequency: f32,
    duration_secs: f32,
    sample_rate: u32,
    channels: usize,
    amplitude: f32,
) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    let tone: Vec<f32> = (0..num_samples)
        .map(|i| amplitude * (angular_freq * i as f32).sin())
        .collect();

    AudioBuffer {
        samples: vec![tone; channels],
        sample_rate,
    }
}

/// Read samples from a WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |e: hound::Error| GainKnobError::InvalidAudio {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
        source: Some(Box::new(e)),
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                other => {
                    return Err(GainKnobError::UnsupportedFormat {
                        format: format!("{}-bit integer audio", other),
                    })
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(invalid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tempfile::tempdir;
    use test_case::test_case;

    #[test]
    fn test_generate_test_tone() {
        let tone = generate_test_tone(1000.0, 0.5, 48000, 2, 0.5);
        assert_eq!(tone.num_channels(), 2);
        assert_eq!(tone.num_samples(), 24000);
        assert_eq!(tone.channel(0), tone.channel(1));
        assert_abs_diff_eq!(tone.channel_peak(0), 0.5, epsilon = 1e-3);
    }

    #[test_case(16, 1e-4)]
    #[test_case(24, 1e-6)]
    #[test_case(32, 0.0)]
    fn test_export_import(bit_depth: u16, tolerance: f32) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let tone = generate_test_tone(440.0, 0.2, 44100, 2, 0.8);

        export_audio(&tone, &path, ExportFormat::new(bit_depth)).unwrap();
        let loaded = import_audio(&path).unwrap();

        assert_eq!(loaded.sample_rate, 44100);
        assert_eq!(loaded.num_channels(), 2);
        assert_eq!(loaded.num_samples(), tone.num_samples());
        for (a, b) in tone.channel(1).iter().zip(loaded.channel(1)) {
            assert_abs_diff_eq!(a, b, epsilon = tolerance);
        }
    }

    #[test]
    fn test_missing_file() {
        let err = import_audio(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_not_a_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.wav");
        std::fs::write(&path, b"this is not audio").unwrap();
        let err = import_audio(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO");
    }

    #[test]
    fn test_unsupported_export_depth() {
        let dir = tempdir().unwrap();
        let tone = generate_test_tone(440.0, 0.01, 48000, 1, 0.5);
        let path = dir.path().join("x.wav");
        let err = export_audio(&tone, &path, ExportFormat::new(12)).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
        assert!(!path.exists());
    }
}
