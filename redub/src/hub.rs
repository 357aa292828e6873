//! Streamed file download with progress, shared by model and voice
//! provisioning. Writes to a `.part` file first and renames on success.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Download `url` to `dest`. Fails through `err` when the transfer dies
/// or the result is smaller than `min_bytes` (likely an HTML error page).
pub(crate) async fn fetch(
    url: &str,
    dest: &Path,
    min_bytes: u64,
    err: fn(String) -> Error,
) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| err(format!("HTTP error: {e}")))?;

    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb.set_message(format!(
        "Downloading {}",
        dest.file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));

    let tmp_path = part_path(dest);
    let mut file = std::fs::File::create(&tmp_path)?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    use std::io::Write;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    let file_size = std::fs::metadata(&tmp_path)?.len();
    if file_size < min_bytes {
        std::fs::remove_file(&tmp_path).ok();
        return Err(err(format!(
            "downloaded file too small ({file_size} bytes) — likely an error page"
        )));
    }

    std::fs::rename(&tmp_path, dest)?;
    pb.finish_with_message("Download complete");

    if total_size > 0 && file_size != total_size {
        warn!(
            expected = total_size,
            actual = file_size,
            "file size mismatch — download may be corrupt"
        );
    }

    info!(path = %dest.display(), size = file_size, "file saved");
    Ok(())
}

/// Temp path next to `dest` with `.part` appended to the full file name.
/// Keeps the real extension visible (`model.onnx.part`, not `model.part`).
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|f| f.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path_keeps_extension() {
        assert_eq!(
            part_path(Path::new("/cache/ggml-base.bin")),
            PathBuf::from("/cache/ggml-base.bin.part")
        );
        assert_eq!(
            part_path(Path::new("/voices/en_US-lessac-medium.onnx")),
            PathBuf::from("/voices/en_US-lessac-medium.onnx.part")
        );
        assert_eq!(
            part_path(Path::new("/voices/en_US-lessac-medium.onnx.json")),
            PathBuf::from("/voices/en_US-lessac-medium.onnx.json.part")
        );
    }
}
