//! End-to-end batch: discovery → (fetch → grayscale) × count.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use grayscout_discovery::{DiscoveryOptions, discover_urls};
use grayscout_fetcher::Downloader;
use grayscout_gemini::{GeminiClient, GeminiOptions};
use grayscout_shared::{
    AppConfig, ExtensionPolicy, GrayscoutError, ImageOutcome, ImageSlot, Result, RunReport,
};

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Key for the generation endpoint.
    pub api_key: String,
    /// Number of images to produce.
    pub count: usize,
    /// Generation endpoint options.
    pub gemini: GeminiOptions,
    /// Discovery loop options.
    pub discovery: DiscoveryOptions,
    /// Directory for downloaded originals.
    pub images_dir: PathBuf,
    /// Directory for grayscale derivatives.
    pub grayscale_dir: PathBuf,
    /// Output file naming.
    pub extension: ExtensionPolicy,
    /// Download timeout. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
}

impl PipelineConfig {
    /// Merge the loaded config with the resolved key and requested count.
    pub fn from_app_config(config: &AppConfig, api_key: impl Into<String>, count: usize) -> Self {
        Self {
            api_key: api_key.into(),
            count,
            gemini: GeminiOptions::from(config),
            discovery: DiscoveryOptions::from(config),
            images_dir: PathBuf::from(&config.output.images_dir),
            grayscale_dir: PathBuf::from(&config.output.grayscale_dir),
            extension: config.output.extension,
            fetch_timeout: config.fetch.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before an image is downloaded.
    fn image_started(&self, slot: &ImageSlot, total: usize);
    /// Called once an image has been downloaded and converted, or has failed.
    fn image_finished(&self, slot: &ImageSlot, outcome: &ImageOutcome);
    /// Called when the pipeline completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn image_started(&self, _slot: &ImageSlot, _total: usize) {}
    fn image_finished(&self, _slot: &ImageSlot, _outcome: &ImageOutcome) {}
    fn done(&self, _report: &RunReport) {}
}

/// Run the full batch.
///
/// 1. Create output directories
/// 2. Discover `count` reachable URLs
/// 3. For each URL in order: download, then convert to grayscale
///
/// Per-image failures are recorded in the report and never stop the batch.
/// Directory creation and discovery failures are returned as errors.
#[instrument(skip_all, fields(count = config.count))]
pub async fn run(config: &PipelineConfig, progress: &dyn ProgressReporter) -> Result<RunReport> {
    let start = Instant::now();
    let mut report = RunReport {
        requested: config.count,
        ..Default::default()
    };

    if config.count == 0 {
        info!("no images requested");
        report.elapsed = start.elapsed();
        progress.done(&report);
        return Ok(report);
    }

    // --- Phase 1: Output directories ---
    progress.phase("Preparing output directories");
    for dir in [&config.images_dir, &config.grayscale_dir] {
        std::fs::create_dir_all(dir).map_err(|e| GrayscoutError::io(dir, e))?;
    }

    // --- Phase 2: Discovery ---
    progress.phase("Discovering image URLs");
    let client = GeminiClient::new(&config.gemini, config.api_key.clone())?;
    let accepted = discover_urls(&client, config.count, &config.discovery).await?;

    // --- Phase 3: Fetch + transform ---
    progress.phase("Downloading and converting images");
    let downloader = Downloader::new(config.fetch_timeout)?;
    let total = accepted.len();

    for (i, url) in accepted.iter().enumerate() {
        let slot = ImageSlot::new(
            i + 1,
            url,
            &config.images_dir,
            &config.grayscale_dir,
            config.extension,
        );
        progress.image_started(&slot, total);

        let outcome = process_image(&downloader, &slot).await;

        progress.image_finished(&slot, &outcome);
        report.images.push((slot, outcome));
    }

    report.accepted = accepted;
    report.elapsed = start.elapsed();

    info!(
        requested = report.requested,
        converted = report.converted(),
        failed = report.failed(),
        elapsed_ms = report.elapsed.as_millis(),
        "pipeline complete"
    );

    progress.done(&report);
    Ok(report)
}

/// Download one image and write its grayscale twin.
async fn process_image(downloader: &Downloader, slot: &ImageSlot) -> ImageOutcome {
    let bytes = match downloader.fetch(&slot.url, &slot.original).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(index = slot.index, url = %slot.url, error = %e, "download failed, skipping image");
            return ImageOutcome::FetchFailed {
                reason: e.to_string(),
            };
        }
    };
    info!(index = slot.index, path = %slot.original.display(), "downloaded");

    match grayscout_imaging::to_grayscale(&slot.original, &slot.grayscale) {
        Ok(()) => {
            info!(index = slot.index, path = %slot.grayscale.display(), "saved grayscale");
            ImageOutcome::Converted { bytes }
        }
        Err(e) => {
            warn!(index = slot.index, path = %slot.original.display(), error = %e, "grayscale conversion failed");
            ImageOutcome::TransformFailed {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Mutex;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT_PATH: &str = "/v1beta/models/gemini-2.5-flash-lite:generateContent";

    fn image_bytes(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(6, 4, |x, y| Rgb([(x * 40) as u8, (y * 60) as u8, 90]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
    }

    /// Mock the generation endpoint so extraction returns `routes` on the server.
    async fn mount_generation(server: &MockServer, routes: &[&str]) {
        let lines: Vec<String> = routes.iter().map(|r| format!("{}{r}", server.uri())).collect();

        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .and(query_param("key", "ABC123"))
            .and(body_string_contains("Extract all URLs"))
            .respond_with(reply(&lines.join("\n")))
            .with_priority(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .and(query_param("key", "ABC123"))
            .respond_with(reply("Here are a few public domain pictures you might like."))
            .mount(server)
            .await;
    }

    async fn mount_image(server: &MockServer, route: &str, status: u16, body: Vec<u8>) {
        Mock::given(method("HEAD"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
            .mount(server)
            .await;
    }

    fn config(server: &MockServer, root: &Path, count: usize) -> PipelineConfig {
        let mut app = AppConfig::default();
        app.gemini.base_url = server.uri();
        app.discovery.max_rounds = 2;
        app.discovery.probe_timeout_secs = 2;
        let mut config = PipelineConfig::from_app_config(&app, "ABC123", count);
        config.images_dir = root.join("images");
        config.grayscale_dir = root.join("gs-images");
        config
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase:{name}"));
        }
        fn image_started(&self, slot: &ImageSlot, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}/{total}", slot.index));
        }
        fn image_finished(&self, slot: &ImageSlot, outcome: &ImageOutcome) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finish:{}:{}", slot.index, outcome.is_success()));
        }
        fn done(&self, report: &RunReport) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{}", report.converted()));
        }
    }

    #[tokio::test]
    async fn converts_every_discovered_image() {
        let server = MockServer::start().await;
        mount_generation(&server, &["/x.jpg", "/y.png"]).await;
        mount_image(&server, "/x.jpg", 200, image_bytes(ImageFormat::Jpeg)).await;
        mount_image(&server, "/y.png", 200, image_bytes(ImageFormat::Png)).await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), 2);
        let progress = RecordingProgress::default();

        let report = run(&config, &progress).await.unwrap();

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.converted(), 2);
        assert_eq!(report.accepted[1], format!("{}/y.png", server.uri()));
        for name in ["1.jpg", "2.jpg"] {
            assert!(dir.path().join("images").join(name).exists());
            let gray = image::open(dir.path().join("gs-images").join(name)).unwrap();
            assert_eq!(gray.color(), image::ColorType::L8);
        }
        // PNG content keeps its bytes under the fixed `.jpg` name.
        assert_eq!(
            std::fs::read(dir.path().join("images/2.jpg")).unwrap(),
            image_bytes(ImageFormat::Png)
        );

        let events = progress.events.lock().unwrap();
        assert_eq!(
            events.iter().filter(|e| e.starts_with("start:")).collect::<Vec<_>>(),
            vec!["start:1/2", "start:2/2"]
        );
        assert_eq!(events.last().unwrap(), "done:2");
    }

    #[tokio::test]
    async fn source_extension_policy_names_files_by_url() {
        let server = MockServer::start().await;
        mount_generation(&server, &["/y.png"]).await;
        mount_image(&server, "/y.png", 200, image_bytes(ImageFormat::Png)).await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&server, dir.path(), 1);
        config.extension = ExtensionPolicy::Source;

        let report = run(&config, &SilentProgress).await.unwrap();

        assert_eq!(report.converted(), 1);
        let gray = image::open(dir.path().join("gs-images/1.png")).unwrap();
        assert_eq!(gray.color(), image::ColorType::L8);
    }

    #[tokio::test]
    async fn failed_images_do_not_stop_the_batch() {
        let server = MockServer::start().await;
        mount_generation(&server, &["/gone.jpg", "/corrupt.jpg", "/fine.jpg"]).await;
        mount_image(&server, "/gone.jpg", 500, Vec::new()).await;
        mount_image(&server, "/corrupt.jpg", 200, b"definitely not an image".to_vec()).await;
        mount_image(&server, "/fine.jpg", 200, image_bytes(ImageFormat::Jpeg)).await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), 3);

        let report = run(&config, &SilentProgress).await.unwrap();

        let outcomes: Vec<&ImageOutcome> = report.images.iter().map(|(_, o)| o).collect();
        assert!(matches!(outcomes[0], ImageOutcome::FetchFailed { .. }));
        assert!(matches!(outcomes[1], ImageOutcome::TransformFailed { .. }));
        assert!(matches!(outcomes[2], ImageOutcome::Converted { .. }));
        assert_eq!(report.failed(), 2);

        assert!(!dir.path().join("images/1.jpg").exists());
        assert!(dir.path().join("images/2.jpg").exists());
        assert!(!dir.path().join("gs-images/2.jpg").exists());
        assert!(dir.path().join("gs-images/3.jpg").exists());
    }

    #[tokio::test]
    async fn exhausted_discovery_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), 1);

        let err = run(&config, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, GrayscoutError::DiscoveryExhausted { found: 0, .. }));
    }

    #[tokio::test]
    async fn zero_count_touches_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("unused"))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), 0);

        let report = run(&config, &SilentProgress).await.unwrap();

        assert!(report.images.is_empty());
        assert!(!dir.path().join("images").exists());
    }

    #[test]
    fn config_from_app_config() {
        let app = AppConfig::default();
        let config = PipelineConfig::from_app_config(&app, "key", 4);
        assert_eq!(config.count, 4);
        assert_eq!(config.images_dir, PathBuf::from("images"));
        assert_eq!(config.grayscale_dir, PathBuf::from("gs-images"));
        assert_eq!(config.extension, ExtensionPolicy::Fixed);
        assert_eq!(config.fetch_timeout, None);
        assert_eq!(config.discovery.max_rounds, 10);
    }
}
