//! Product image refresh
//!
//! Downloads a product's image into the image directory and reports the
//! stored path. Failures never escape: they are notified and yield an empty
//! path.

use crate::crawler::fetcher::AssetFetcher;
use crate::notify::Notifier;
use crate::ValidationError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

/// Characters replaced by `_` when a title becomes a file name
const UNSAFE_FILENAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Derives the file an image is stored under
///
/// The name is the title with whitespace and path-unsafe characters replaced
/// by `_`, and the extension is taken from the last path segment of `url`.
/// When a replacement was needed the name also carries the first 8 hex
/// digits of the title's SHA-256, so `"A B"` and `"A_B"` get different files.
///
/// # Example
///
/// ```
/// use catalog_harvest::crawler::image_file_path;
/// use std::path::Path;
///
/// let path = image_file_path(Path::new("images"), "Widget", "https://x/a/widget.jpg?v=3").unwrap();
/// assert_eq!(path, Path::new("images/Widget.jpg"));
///
/// let path = image_file_path(Path::new("images"), "Dental Mirror", "https://x/a/mirror.jpg").unwrap();
/// assert_eq!(path, Path::new("images/Dental_Mirror-19b0c017.jpg"));
/// ```
pub fn image_file_path(dir: &Path, title: &str, url: &str) -> Result<PathBuf, ValidationError> {
    let title = title.trim();
    let mut stem: String = title
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            if c.is_whitespace() || UNSAFE_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        return Err(ValidationError::EmptyFilename);
    }

    if stem != title {
        let digest = hex::encode(Sha256::digest(title.as_bytes()));
        stem.push('-');
        stem.push_str(&digest[..8]);
    }

    let extension = image_extension(url)?;
    Ok(dir.join(format!("{}.{}", stem, extension)))
}

/// Extension of the last path segment of `url`, without any query
fn image_extension(url: &str) -> Result<String, ValidationError> {
    let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", url, e)))?;

    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    match segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Ok(ext.to_string())
        }
        _ => Err(ValidationError::MissingExtension(url.to_string())),
    }
}

/// Refreshes product images for one run
pub struct ImageRefresher<'a> {
    fetcher: &'a AssetFetcher,
    notifier: &'a dyn Notifier,
    image_dir: &'a Path,
}

impl<'a> ImageRefresher<'a> {
    pub fn new(fetcher: &'a AssetFetcher, notifier: &'a dyn Notifier, image_dir: &'a Path) -> Self {
        Self {
            fetcher,
            notifier,
            image_dir,
        }
    }

    /// Downloads the image at `url` for `title` and returns its stored path
    ///
    /// Returns an empty string without any network call when `url` is empty,
    /// and an empty string after notifying when anything fails.
    pub async fn refresh(&self, url: &str, title: &str) -> String {
        if url.is_empty() {
            return String::new();
        }

        let path = match image_file_path(self.image_dir, title, url) {
            Ok(path) => path,
            Err(e) => {
                self.notifier
                    .notify(&format!("Invalid or empty image filename for {}: {}", title, e));
                return String::new();
            }
        };

        let bytes = match self.fetcher.fetch(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.notifier
                    .notify(&format!("Failed to download image for {}: {}", title, e));
                return String::new();
            }
        };

        if let Err(e) = write_image(&path, &bytes).await {
            self.notifier.notify(&format!(
                "Failed to save image for {} to {}: {}",
                title,
                path.display(),
                e
            ));
            return String::new();
        }

        tracing::debug!("Stored image for {} at {}", title, path.display());
        path.to_string_lossy().into_owned()
    }
}

async fn write_image(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetcherConfig;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl Notifier for Collect {
        fn notify(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn fetcher() -> AssetFetcher {
        let config = FetcherConfig {
            max_attempts: 1,
            initial_backoff_ms: 1,
            ..FetcherConfig::default()
        };
        AssetFetcher::new(&config, None).unwrap()
    }

    #[test]
    fn test_file_path_from_title_and_extension() {
        let dir = Path::new("images");
        assert_eq!(
            image_file_path(dir, "Widget", "http://x/a.jpg").unwrap(),
            Path::new("images/Widget.jpg")
        );
        assert_eq!(
            image_file_path(dir, "Bur 10/20 Kit", "https://cdn.x/u/2024/kit.final.PNG?w=300").unwrap(),
            Path::new("images/Bur_10_20_Kit-2e1e3662.PNG")
        );
    }

    #[test]
    fn test_file_paths_of_similar_titles_differ() {
        let dir = Path::new("images");
        let url = "http://x/a.jpg";
        let paths: Vec<_> = ["A_B", "A B", "A/B"]
            .iter()
            .map(|title| image_file_path(dir, title, url).unwrap())
            .collect();

        assert_eq!(
            paths,
            vec![
                Path::new("images/A_B.jpg").to_path_buf(),
                Path::new("images/A_B-fea4c5ce.jpg").to_path_buf(),
                Path::new("images/A_B-998d3ed8.jpg").to_path_buf(),
            ]
        );
    }

    #[test]
    fn test_file_path_validation() {
        let dir = Path::new("images");
        assert_eq!(
            image_file_path(dir, "   ", "http://x/a.jpg"),
            Err(ValidationError::EmptyFilename)
        );
        assert_eq!(
            image_file_path(dir, "..", "http://x/a.jpg"),
            Err(ValidationError::EmptyFilename)
        );
        assert!(matches!(
            image_file_path(dir, "Widget", "http://x/image"),
            Err(ValidationError::MissingExtension(_))
        ));
        assert!(matches!(
            image_file_path(dir, "Widget", "not a url"),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_url_skips_network() {
        let dir = TempDir::new().unwrap();
        let notifier = Collect::default();
        let fetcher = fetcher();
        let refresher = ImageRefresher::new(&fetcher, &notifier, dir.path());

        assert_eq!(refresher.refresh("", "Widget").await, "");
        assert!(notifier.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_downloads_and_writes_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFFu8, 0xD8, 0xFF]))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let image_dir = dir.path().join("images");
        let notifier = Collect::default();
        let fetcher = fetcher();
        let refresher = ImageRefresher::new(&fetcher, &notifier, &image_dir);

        let stored = refresher
            .refresh(&format!("{}/a.jpg", server.uri()), "Dental Mirror")
            .await;

        let expected = image_dir.join("Dental_Mirror-19b0c017.jpg");
        assert_eq!(stored, expected.to_string_lossy());
        assert_eq!(std::fs::read(&expected).unwrap(), vec![0xFFu8, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_download_failure_yields_empty_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let notifier = Collect::default();
        let fetcher = fetcher();
        let refresher = ImageRefresher::new(&fetcher, &notifier, dir.path());

        let stored = refresher
            .refresh(&format!("{}/missing.jpg", server.uri()), "Widget")
            .await;

        assert_eq!(stored, "");
        let messages = notifier.0.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Failed to download image for Widget"));
    }

    #[tokio::test]
    async fn test_invalid_filename_is_notified_without_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let notifier = Collect::default();
        let fetcher = fetcher();
        let refresher = ImageRefresher::new(&fetcher, &notifier, dir.path());

        let stored = refresher
            .refresh(&format!("{}/no-extension", server.uri()), "Widget")
            .await;

        assert_eq!(stored, "");
        assert!(notifier.0.lock().unwrap()[0].starts_with("Invalid or empty image filename"));
    }
}
