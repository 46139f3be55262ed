//! File batch driver: encrypt/decrypt every record of every dataset file,
//! time both passes and persist the results table as CSV.

use crate::{
    cipher::Cipher,
    error::{PipelineError, PipelineResult, QrlmeError},
    scheme::Qrlme,
};
use chrono::{DateTime, TimeZone};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, warn};

/// What to do with a record that is not below the key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordPolicy {
    /// Encrypt `record mod key`.
    #[default]
    Reduce,
    /// Fail with `PlaintextOutOfRange`.
    Reject,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub policy: RecordPolicy,
    /// Decrypt records on the rayon pool.
    pub parallel: bool,
}

/// Header row of the results table.
pub const RESULT_COLUMNS: [&str; 6] = [
    "file_name",
    "file_size (in bytes)",
    "encryption_time (in seconds)",
    "decryption_time (in seconds)",
    "records",
    "mismatches",
];

/// One row of the results table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub file_name: String,
    #[serde(rename = "file_size (in bytes)")]
    pub file_size: u64,
    #[serde(rename = "encryption_time (in seconds)")]
    pub encryption_time: f64,
    #[serde(rename = "decryption_time (in seconds)")]
    pub decryption_time: f64,
    pub records: usize,
    pub mismatches: usize,
}

/// Encrypted contents of one file.
#[derive(Clone, Debug)]
pub struct EncryptedFile {
    pub ciphers: Vec<Cipher>,
    /// Plaintexts actually encrypted (after the record policy).
    pub plaintexts: Vec<u64>,
    pub elapsed: Duration,
}

pub struct BatchPipeline {
    codec: Qrlme,
    options: PipelineOptions,
}

impl BatchPipeline {
    pub fn new(codec: Qrlme, options: PipelineOptions) -> Self {
        Self { codec, options }
    }

    pub fn codec(&self) -> &Qrlme {
        &self.codec
    }

    /// Map a decimal record to a plaintext in `[0, key)` according to the
    /// policy. `digits` must be non-empty ASCII digits (see [`read_records`]).
    pub fn admit(&self, digits: &str) -> PipelineResult<u64> {
        let key = self.codec.key();
        match self.options.policy {
            RecordPolicy::Reduce => Ok(reduce_decimal(digits, key)),
            RecordPolicy::Reject => {
                // too long for u128 means far above any u64 key
                let record = digits.parse::<u128>().unwrap_or(u128::MAX);
                if record < u128::from(key) {
                    Ok(record as u64)
                } else {
                    Err(QrlmeError::PlaintextOutOfRange {
                        plaintext: record,
                        key,
                    }
                    .into())
                }
            }
        }
    }

    /// Encrypt every record of `path`. Only the encryption loop is timed.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn encrypt_file<R: Rng + ?Sized>(
        &self,
        path: &Path,
        rng: &mut R,
    ) -> PipelineResult<EncryptedFile> {
        let plaintexts = read_records(path)?
            .into_iter()
            .map(|record| self.admit(&record))
            .collect::<PipelineResult<Vec<_>>>()?;

        let start = Instant::now();
        let ciphers = plaintexts
            .iter()
            .map(|&p| self.codec.encrypt(p, rng))
            .collect::<Result<Vec<_>, _>>()?;
        let elapsed = start.elapsed();

        debug!(records = ciphers.len(), ?elapsed, "encrypted");
        Ok(EncryptedFile {
            ciphers,
            plaintexts,
            elapsed,
        })
    }

    /// Decrypt a batch; `None` marks a record that failed to decrypt.
    pub fn decrypt_batch(&self, ciphers: &[Cipher]) -> (Vec<Option<u64>>, Duration) {
        let start = Instant::now();
        let values: Vec<Option<u64>> = if self.options.parallel {
            ciphers
                .par_iter()
                .map(|c| self.codec.decrypt(c).ok())
                .collect()
        } else {
            ciphers.iter().map(|c| self.codec.decrypt(c).ok()).collect()
        };
        (values, start.elapsed())
    }

    /// Encrypt and decrypt one file and summarise it.
    pub fn process_file<R: Rng + ?Sized>(
        &self,
        path: &Path,
        rng: &mut R,
    ) -> PipelineResult<FileReport> {
        let file_size = fs::metadata(path)
            .map_err(|source| PipelineError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let encrypted = self.encrypt_file(path, rng)?;
        let (decrypted, decryption_time) = self.decrypt_batch(&encrypted.ciphers);

        let mismatches = decrypted
            .iter()
            .zip(&encrypted.plaintexts)
            .filter(|&(d, p)| *d != Some(*p))
            .count();
        if mismatches > 0 {
            warn!(path = %path.display(), mismatches, "decrypted values differ from plaintexts");
        }

        Ok(FileReport {
            file_name: file_name(path),
            file_size,
            encryption_time: encrypted.elapsed.as_secs_f64(),
            decryption_time: decryption_time.as_secs_f64(),
            records: encrypted.plaintexts.len(),
            mismatches,
        })
    }

    /// Process every `*.txt` file in `dir`, in file-name order.
    pub fn process_directory<R: Rng + ?Sized>(
        &self,
        dir: &Path,
        rng: &mut R,
    ) -> PipelineResult<Vec<FileReport>> {
        let files = list_text_files(dir)?;
        info!(dir = %dir.display(), files = files.len(), "processing dataset");
        files
            .iter()
            .map(|path| self.process_file(path, rng))
            .collect()
    }
}

/// `*.txt` files directly inside `dir`, sorted by name.
pub fn list_text_files(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let io_err = |source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// One non-negative decimal integer of any length per line, returned as its
/// digit string. Blank lines are skipped; a leading `+` is accepted.
pub fn read_records(path: &Path) -> PipelineResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let trimmed = line.trim();
            let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                Ok(digits.to_string())
            } else {
                Err(PipelineError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    content: line.to_string(),
                })
            }
        })
        .collect()
}

/// `digits mod key`, one digit at a time (Horner), for numbers of any length.
pub fn reduce_decimal(digits: &str, key: u64) -> u64 {
    let key = u128::from(key);
    let rem = digits
        .bytes()
        .fold(0u128, |acc, b| (acc * 10 + u128::from(b - b'0')) % key);
    rem as u64
}

/// `QRLME_{%Y-%m-%d_%H-%M-%S}.csv`
pub fn results_file_name<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("QRLME_{}.csv", timestamp.format("%Y-%m-%d_%H-%M-%S"))
}

/// Write the results table into `output_dir` and return the file path.
pub fn save_results_csv<Tz: TimeZone>(
    reports: &[FileReport],
    output_dir: &Path,
    timestamp: &DateTime<Tz>,
) -> PipelineResult<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    fs::create_dir_all(output_dir).map_err(|source| PipelineError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let path = output_dir.join(results_file_name(timestamp));
    let mut wtr = csv::Writer::from_path(&path)?;
    if reports.is_empty() {
        // serialize() only emits the header alongside the first row
        wtr.write_record(RESULT_COLUMNS)?;
    }
    for report in reports {
        wtr.serialize(report)?;
    }
    wtr.flush().map_err(|source| PipelineError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), rows = reports.len(), "results saved");
    Ok(path)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn pipeline(policy: RecordPolicy) -> BatchPipeline {
        let codec = Qrlme::new(vec![2, 3, 5, 7, 11]).unwrap();
        BatchPipeline::new(
            codec,
            PipelineOptions {
                policy,
                parallel: false,
            },
        )
    }

    #[test]
    fn test_admit_reduce() {
        let p = pipeline(RecordPolicy::Reduce);
        assert_eq!(p.admit("12").unwrap(), 12);
        assert_eq!(p.admit("2310").unwrap(), 0);
        let big = 123_456_789_012_345_678_901u128;
        assert_eq!(p.admit(&big.to_string()).unwrap(), (big % 2310) as u64);
    }

    #[test]
    fn test_reduce_decimal_beyond_u128() {
        // 43 digits, more than u128 holds
        let digits = "1234567890123456789012345678901234567890123";
        assert!(digits.parse::<u128>().is_err());
        // digits = hi · 10^20 + lo
        let (hi, lo) = digits.split_at(23);
        let hi = hi.parse::<u128>().unwrap() % 2310;
        let lo = lo.parse::<u128>().unwrap() % 2310;
        let shift = (0..20).fold(1u128, |acc, _| acc * 10 % 2310);
        let expected = ((hi * shift + lo) % 2310) as u64;
        assert_eq!(reduce_decimal(digits, 2310), expected);

        let p = pipeline(RecordPolicy::Reduce);
        assert_eq!(p.admit(digits).unwrap(), expected);
        assert_eq!(reduce_decimal("0", 7), 0);
        assert_eq!(reduce_decimal("000123", 1000), 123);
    }

    #[test]
    fn test_admit_reject() {
        let p = pipeline(RecordPolicy::Reject);
        assert_eq!(p.admit("2309").unwrap(), 2309);
        assert!(matches!(
            p.admit("1234567890123456789012345678901234567890123"),
            Err(PipelineError::Codec {
                source: QrlmeError::PlaintextOutOfRange { plaintext: u128::MAX, key: 2310 }
            })
        ));
        assert!(matches!(
            p.admit("2310"),
            Err(PipelineError::Codec {
                source: QrlmeError::PlaintextOutOfRange { plaintext: 2310, key: 2310 }
            })
        ));
    }

    #[test]
    fn test_decrypt_batch_marks_failures() {
        let p = pipeline(RecordPolicy::Reduce);
        let good = p.codec().encrypt_with_noise(42, 1).unwrap();
        let bad = Cipher::from_pairs([(2, 5), (3, 0), (5, 0), (7, 0), (11, 0)]);
        let (values, _) = p.decrypt_batch(&[good, bad]);
        assert_eq!(values, vec![Some(42), None]);
    }

    #[test]
    fn test_results_file_name() {
        let ts = Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(7, 5, 1)
                .unwrap(),
        );
        assert_eq!(results_file_name(&ts), "QRLME_2024-03-09_07-05-01.csv");
    }
}
