//! Batch processing: compress many files concurrently.
//!
//! Each file is an independent invocation, run on tokio's blocking pool;
//! `config.concurrency` bounds how many are in flight. A failing file
//! becomes a [`FileResult`] carrying a [`FileError`] and the rest of the
//! batch carries on. Only a batch in which *every* file fails is an error.

use crate::compress::compress_file_indexed;
use crate::config::CompressionConfig;
use crate::error::{CompressError, FileError};
use crate::output::{BatchOutput, BatchStats, FileResult};
use crate::pipeline::input;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Compress every file in `inputs`, writing `compressed_<stem>.jpg` files
/// into `output_dir` (created if missing).
///
/// Results are returned in input order.
///
/// # Errors
/// * [`CompressError::InvalidConfig`] — `inputs` is empty
/// * [`CompressError::AllFilesFailed`] — no file could be compressed
pub async fn compress_batch<P: AsRef<Path>>(
    inputs: &[P],
    output_dir: impl AsRef<Path>,
    config: &CompressionConfig,
) -> Result<BatchOutput, CompressError> {
    let batch_start = Instant::now();
    let total = inputs.len();
    if total == 0 {
        return Err(CompressError::InvalidConfig("No input files given".into()));
    }

    let inputs: Vec<PathBuf> = inputs.iter().map(|p| p.as_ref().to_path_buf()).collect();
    let destinations = output_paths(&inputs, output_dir.as_ref());
    info!(
        "Compressing {} files → {} (concurrency {})",
        total,
        output_dir.as_ref().display(),
        config.concurrency
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut files: Vec<FileResult> = stream::iter(inputs.into_iter().zip(destinations).enumerate().map(
        |(index, (input_path, dest))| {
            let cfg = config.clone();
            async move {
                let task_input = input_path.clone();
                let task_dest = dest.clone();
                let result = tokio::task::spawn_blocking(move || {
                    let output = compress_file_indexed(&task_input, &cfg, index, total)?;
                    output.artifact.write_to(&task_dest)?;
                    Ok::<_, CompressError>(output.stats)
                })
                .await
                .unwrap_or_else(|e| {
                    Err(CompressError::Internal(format!("Compress task panicked: {e}")))
                });

                match result {
                    Ok(stats) => FileResult {
                        index,
                        input: input_path,
                        output: Some(dest),
                        stats: Some(stats),
                        error: None,
                    },
                    Err(e) => FileResult {
                        index,
                        error: Some(FileError::new(&input_path, &e)),
                        input: input_path,
                        output: None,
                        stats: None,
                    },
                }
            }
        },
    ))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    files.sort_by_key(|f| f.index);

    let succeeded = files.iter().filter(|f| f.is_success()).count();
    let stats = BatchStats {
        total_files: total,
        succeeded,
        failed: total - succeeded,
        total_input_bytes: files
            .iter()
            .filter_map(|f| f.stats.as_ref())
            .map(|s| s.input_bytes as u64)
            .sum(),
        total_output_bytes: files
            .iter()
            .filter_map(|f| f.stats.as_ref())
            .map(|s| s.output_bytes as u64)
            .sum(),
        total_duration_ms: batch_start.elapsed().as_millis() as u64,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    if succeeded == 0 {
        let first = files.iter().find_map(|f| f.error.as_ref());
        return Err(CompressError::AllFilesFailed {
            total,
            first_kind: first
                .map(|e| e.kind)
                .unwrap_or(crate::error::ErrorKind::Internal),
            first_error: first
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
        });
    }

    info!(
        "Batch complete: {}/{} files, {} → {} bytes, {}ms",
        succeeded, total, stats.total_input_bytes, stats.total_output_bytes, stats.total_duration_ms
    );

    Ok(BatchOutput { files, stats })
}

/// Destination for each input. `cat.png` and `cat.gif` would both map to
/// `compressed_cat.jpg`, so later duplicates get a numeric suffix, starting
/// at their index and counting up past any name already taken.
fn output_paths(inputs: &[PathBuf], output_dir: &Path) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let name = path
                .file_name()
                .map(|n| input::output_filename(&n.to_string_lossy()))
                .unwrap_or_else(|| input::output_filename(""));
            let name = if seen.insert(name.clone()) {
                name
            } else {
                let stem = name.trim_end_matches(".jpg");
                let mut n = index;
                loop {
                    let candidate = format!("{stem}_{n}.jpg");
                    if seen.insert(candidate.clone()) {
                        break candidate;
                    }
                    n += 1;
                }
            };
            output_dir.join(name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_stems_get_suffix() {
        let inputs = vec![
            PathBuf::from("a/cat.png"),
            PathBuf::from("b/cat.gif"),
            PathBuf::from("dog.jpg"),
        ];
        let out = output_paths(&inputs, Path::new("out"));
        assert_eq!(
            out,
            vec![
                PathBuf::from("out/compressed_cat.jpg"),
                PathBuf::from("out/compressed_cat_1.jpg"),
                PathBuf::from("out/compressed_dog.jpg"),
            ]
        );
    }

    #[test]
    fn suffix_skips_names_already_taken() {
        let inputs = vec![
            PathBuf::from("cat_2.png"),
            PathBuf::from("a/cat.png"),
            PathBuf::from("b/cat.gif"),
        ];
        let out = output_paths(&inputs, Path::new("out"));
        assert_eq!(
            out,
            vec![
                PathBuf::from("out/compressed_cat_2.jpg"),
                PathBuf::from("out/compressed_cat.jpg"),
                PathBuf::from("out/compressed_cat_3.jpg"),
            ]
        );
        let unique: HashSet<_> = out.iter().collect();
        assert_eq!(unique.len(), out.len());
    }

    #[tokio::test]
    async fn colliding_names_all_land_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let png = {
            let img = image::RgbImage::from_pixel(6, 6, image::Rgb([40, 80, 120]));
            let mut buf = Vec::new();
            image::DynamicImage::ImageRgb8(img)
                .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
                .unwrap();
            buf
        };
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        let inputs = vec![
            dir.path().join("cat_2.png"),
            dir.path().join("a/cat.png"),
            dir.path().join("b/cat.png"),
        ];
        for p in &inputs {
            std::fs::write(p, &png).unwrap();
        }

        let out_dir = dir.path().join("out");
        let batch = compress_batch(&inputs, &out_dir, &CompressionConfig::default())
            .await
            .unwrap();
        assert_eq!(batch.stats.succeeded, 3);

        let outputs: HashSet<_> = batch.files.iter().filter_map(|f| f.output.clone()).collect();
        assert_eq!(outputs.len(), 3);
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 3);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let inputs: Vec<PathBuf> = vec![];
        let err = compress_batch(&inputs, "out", &CompressionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CompressError::InvalidConfig(_)));
    }
}
