//! Downloads the tracks dataset to a flat file, once.

use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};
use reqwest::blocking::Client;

use crate::{
    config::{DatasetConfig, DatasetSource},
    dataset::error::DatasetError,
};

const GOOGLE_DRIVE_URL: &str = "https://docs.google.com/uc?export=download";
const CONFIRM_COOKIE_PREFIX: &str = "download_warning";
const CHUNK_SIZE: usize = 32768;

/// Makes sure the dataset file exists locally, downloading it if needed.
///
/// An existing file is reused unless `config.refresh` or `force` is set.
pub fn ensure_present(config: &DatasetConfig, force: bool) -> Result<PathBuf, DatasetError> {
    let path = &config.path;
    if path.is_file() && !config.refresh && !force {
        debug!("using cached dataset at {}", path.to_string_lossy());
        return Ok(path.clone());
    }

    match &config.source {
        DatasetSource::Local => {
            if !path.is_file() {
                return Err(DatasetError::Missing(path.clone()));
            }
        }
        DatasetSource::GoogleDrive { file_id } => {
            info!("downloading dataset {file_id} from Google Drive");
            let written = download_from_google_drive(file_id, path)?;
            info!("saved {written} bytes to {}", path.to_string_lossy());
        }
        DatasetSource::Url { url } => {
            info!("downloading dataset from {url}");
            let written = download_url(url, path)?;
            info!("saved {written} bytes to {}", path.to_string_lossy());
        }
    }
    Ok(path.clone())
}

/// Large Drive files answer the first request with a virus-scan warning
/// and a `download_warning*` cookie; repeating the request with that token
/// as `confirm` yields the file itself.
fn download_from_google_drive(file_id: &str, destination: &Path) -> Result<u64, DatasetError> {
    let client = Client::builder().cookie_store(true).build()?;

    let response = client
        .get(GOOGLE_DRIVE_URL)
        .query(&[("id", file_id)])
        .send()?
        .error_for_status()?;

    let token = confirm_token(response.cookies().map(|c| (c.name().to_string(), c.value().to_string())));

    let response = match token {
        Some(token) => {
            debug!("google drive asked for confirmation, retrying with token");
            client
                .get(GOOGLE_DRIVE_URL)
                .query(&[("id", file_id), ("confirm", token.as_str())])
                .send()?
                .error_for_status()?
        }
        None => response,
    };

    Ok(save_response_content(response, destination)?)
}

fn download_url(url: &str, destination: &Path) -> Result<u64, DatasetError> {
    let response = Client::new().get(url).send()?.error_for_status()?;
    Ok(save_response_content(response, destination)?)
}

fn confirm_token(cookies: impl Iterator<Item = (String, String)>) -> Option<String> {
    cookies
        .into_iter()
        .find(|(name, _)| name.starts_with(CONFIRM_COOKIE_PREFIX))
        .map(|(_, value)| value)
}

/// Streams `content` into `destination` in fixed-size chunks.
///
/// Writes to a sibling `.part` file first so an interrupted download
/// never leaves a truncated dataset behind.
fn save_response_content(mut content: impl Read, destination: &Path) -> std::io::Result<u64> {
    let mut partial = destination.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let mut file = File::create(&partial)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = content.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        written += n as u64;
    }
    file.flush()?;
    drop(file);

    std::fs::rename(&partial, destination)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io::Cursor};
    use tempfile::tempdir;

    fn config(path: PathBuf, source: DatasetSource) -> DatasetConfig {
        DatasetConfig {
            path,
            source,
            refresh: false,
        }
    }

    #[test]
    fn test_confirm_token_found() {
        let cookies = vec![
            ("NID".to_string(), "abc".to_string()),
            ("download_warning_13058876669334088843_160y".to_string(), "Xy12".to_string()),
        ];
        assert_eq!(confirm_token(cookies.into_iter()), Some("Xy12".to_string()));
    }

    #[test]
    fn test_confirm_token_absent() {
        let cookies = vec![("NID".to_string(), "abc".to_string())];
        assert_eq!(confirm_token(cookies.into_iter()), None);
    }

    #[test]
    fn test_save_response_content_spans_chunks() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let destination = dir.path().join("dataset.csv");
        let content: Vec<u8> = (0..CHUNK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();

        let written = save_response_content(Cursor::new(content.clone()), &destination)?;

        assert_eq!(written, content.len() as u64);
        assert_eq!(fs::read(&destination)?, content);
        assert!(!dir.path().join("dataset.csv.part").exists());

        Ok(())
    }

    #[test]
    fn test_ensure_present_reuses_existing_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dataset.csv");
        fs::write(&path, "track_id,track_genre\n")?;

        // would need the network if it tried to download
        let cfg = config(
            path.clone(),
            DatasetSource::GoogleDrive {
                file_id: "unused".to_string(),
            },
        );

        assert_eq!(ensure_present(&cfg, false)?, path);
        Ok(())
    }

    #[test]
    fn test_ensure_present_local_missing() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let cfg = config(dir.path().join("nope.csv"), DatasetSource::Local);

        let result = ensure_present(&cfg, false);
        assert!(matches!(result, Err(DatasetError::Missing(_))));

        Ok(())
    }

    #[test]
    fn test_ensure_present_local_force_keeps_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dataset.csv");
        fs::write(&path, "x")?;
        let cfg = config(path.clone(), DatasetSource::Local);

        assert_eq!(ensure_present(&cfg, true)?, path);
        assert_eq!(fs::read_to_string(&path)?, "x");

        Ok(())
    }
}
