//! Synthetic dataset: text files of random decimal numbers, one per line.

use crate::error::DatasetError;
use rand::Rng;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Number lengths are limited to this many decimal digits.
pub const NUM_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 5..=20;

/// Parameters of a generated dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetSpec {
    pub folder: PathBuf,
    pub file_prefix: String,
    pub num_files: usize,
    pub min_file_size_kb: u64,
    pub max_file_size_kb: u64,
    pub min_num_length: usize,
    pub max_num_length: usize,
}

impl Default for DatasetSpec {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("dataset"),
            file_prefix: "data".into(),
            num_files: 20,
            min_file_size_kb: 1,
            max_file_size_kb: 50,
            min_num_length: 5,
            max_num_length: 18,
        }
    }
}

impl DatasetSpec {
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.min_file_size_kb > self.max_file_size_kb {
            return Err(DatasetError::InvalidParameter {
                message: "min_file_size_kb must be less than or equal to max_file_size_kb"
                    .into(),
            });
        }
        if self.min_num_length > self.max_num_length
            || !NUM_LENGTH_RANGE.contains(&self.min_num_length)
            || !NUM_LENGTH_RANGE.contains(&self.max_num_length)
        {
            return Err(DatasetError::InvalidParameter {
                message: format!(
                    "min_num_length and max_num_length must be within {}..={}, and min_num_length <= max_num_length",
                    NUM_LENGTH_RANGE.start(),
                    NUM_LENGTH_RANGE.end()
                ),
            });
        }
        Ok(())
    }

    /// Write `num_files` files named `{prefix}_{i}.txt` into `folder`.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<PathBuf>, DatasetError> {
        self.validate()?;
        fs::create_dir_all(&self.folder).map_err(|source| DatasetError::Io {
            path: self.folder.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.num_files);
        for i in 1..=self.num_files {
            let target_kb = rng.gen_range(self.min_file_size_kb..=self.max_file_size_kb);
            let path = self.folder.join(format!("{}_{i}.txt", self.file_prefix));
            let size = self.write_file(&path, target_kb * 1024, rng)?;
            info!(path = %path.display(), target_kb, size, "dataset file created");
            written.push(path);
        }
        Ok(written)
    }

    /// Append lines until at least `target_bytes` have been written.
    fn write_file<R: Rng + ?Sized>(
        &self,
        path: &Path,
        target_bytes: u64,
        rng: &mut R,
    ) -> Result<u64, DatasetError> {
        let io_err = |source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
        let mut size = 0u64;
        while size < target_bytes {
            let len = rng.gen_range(self.min_num_length..=self.max_num_length);
            let number = random_number(len, rng);
            writeln!(out, "{number}").map_err(io_err)?;
            size += number.len() as u64 + 1;
        }
        out.flush().map_err(io_err)?;
        debug!(path = %path.display(), size, "flushed");
        Ok(size)
    }
}

/// Uniform decimal number in `[10^(len-1), 10^len - 1]`, i.e. exactly `len` digits.
pub fn random_number<R: Rng + ?Sized>(len: usize, rng: &mut R) -> String {
    let mut digits = String::with_capacity(len);
    if len == 0 {
        return digits;
    }
    digits.push(char::from(b'0' + rng.gen_range(1..=9u8)));
    for _ in 1..len {
        digits.push(char::from(b'0' + rng.gen_range(0..=9u8)));
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("qrlme-dataset-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_random_number_length() {
        let mut rng = StdRng::seed_from_u64(3);
        for len in NUM_LENGTH_RANGE {
            let n = random_number(len, &mut rng);
            assert_eq!(n.len(), len);
            assert!(!n.starts_with('0'));
            assert!(n.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_invalid_sizes() {
        let spec = DatasetSpec {
            min_file_size_kb: 10,
            max_file_size_kb: 2,
            ..DatasetSpec::default()
        };
        assert!(matches!(
            spec.validate(),
            Err(DatasetError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_invalid_lengths() {
        for (min, max) in [(4, 10), (5, 21), (12, 8)] {
            let spec = DatasetSpec {
                min_num_length: min,
                max_num_length: max,
                ..DatasetSpec::default()
            };
            assert!(
                matches!(spec.validate(), Err(DatasetError::InvalidParameter { .. })),
                "lengths {min}..={max} accepted"
            );
        }
    }

    #[test]
    fn test_generate_files() {
        let dir = scratch_dir("generate");
        let spec = DatasetSpec {
            folder: dir.clone(),
            file_prefix: "sample".into(),
            num_files: 3,
            min_file_size_kb: 1,
            max_file_size_kb: 2,
            min_num_length: 5,
            max_num_length: 7,
        };
        let mut rng = StdRng::seed_from_u64(11);
        let paths = spec.generate(&mut rng).unwrap();
        assert_eq!(paths.len(), 3);
        for (i, path) in paths.iter().enumerate() {
            assert_eq!(
                path.file_name().unwrap().to_str().unwrap(),
                format!("sample_{}.txt", i + 1)
            );
            let size = fs::metadata(path).unwrap().len();
            assert!(size >= 1024, "{} too small: {size}", path.display());
            // overshoot is at most one line
            assert!(size < 2048 + 8);
            let content = fs::read_to_string(path).unwrap();
            for line in content.lines() {
                assert!((5..=7).contains(&line.len()));
                assert!(line.parse::<u64>().is_ok());
            }
        }
        fs::remove_dir_all(&dir).unwrap();
    }
}
