//! Debug File Helpers
//!
//! Whole-file read/write used by the demo for config loading and debug
//! captures, plus a WAV dump of interleaved ring audio behind the
//! `export-wav` feature.

use std::fs;
use std::path::Path;

use crate::Result;

/// Read a whole file into memory
pub fn read_entire_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Write `contents` to `path`, replacing whatever was there
pub fn write_entire_file<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<()> {
    Ok(fs::write(path, contents)?)
}

/// Dump interleaved stereo samples to a 16-bit PCM WAV file
#[cfg(feature = "export-wav")]
pub fn dump_wav<P: AsRef<Path>>(path: P, interleaved: &[i16], sample_rate: u32) -> Result<()> {
    use crate::PixeltoneError;

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path.as_ref(), spec)
        .map_err(|e| PixeltoneError::AudioFileError(format!("Failed to create WAV file: {e}")))?;
    for &sample in interleaved {
        writer
            .write_sample(sample)
            .map_err(|e| PixeltoneError::AudioFileError(format!("Failed to write sample: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| PixeltoneError::AudioFileError(format!("Failed to finalize WAV file: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.bin");
        write_entire_file(&path, b"ring state").unwrap();
        assert_eq!(read_entire_file(&path).unwrap(), b"ring state");
    }

    #[test]
    fn test_read_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_entire_file(dir.path().join("absent.bin")).is_err());
    }

    #[cfg(feature = "export-wav")]
    #[test]
    fn test_dump_wav_writes_stereo_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<i16> = (0..64).map(|i| (i * 100) as i16).collect();
        dump_wav(&path, &samples, 48_000).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 48_000);
        assert_eq!(reader.len(), 64);
    }
}
