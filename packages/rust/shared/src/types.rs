//! Core domain types for a grayscout run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ExtensionPolicy;

// ---------------------------------------------------------------------------
// ImageSlot
// ---------------------------------------------------------------------------

/// Where the i-th accepted URL lands on disk.
///
/// Both artifacts share the 1-based `index`, so `images/3.jpg` and
/// `gs-images/3.jpg` always derive from the third accepted URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    /// 1-based position in discovery order.
    pub index: usize,
    /// Accepted source URL.
    pub url: String,
    /// Path of the downloaded original.
    pub original: PathBuf,
    /// Path of the grayscale derivative.
    pub grayscale: PathBuf,
}

impl ImageSlot {
    /// Build the slot for `url` at 1-based `index`.
    pub fn new(
        index: usize,
        url: &str,
        images_dir: &Path,
        grayscale_dir: &Path,
        policy: ExtensionPolicy,
    ) -> Self {
        let file_name = format!("{index}.{}", policy.extension_for(url));
        Self {
            index,
            url: url.to_string(),
            original: images_dir.join(&file_name),
            grayscale: grayscale_dir.join(&file_name),
        }
    }
}

// ---------------------------------------------------------------------------
// ImageOutcome
// ---------------------------------------------------------------------------

/// What happened to one image in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Downloaded and converted.
    Converted {
        /// Size of the downloaded original.
        bytes: u64,
    },
    /// The download failed; no grayscale artifact was attempted.
    FetchFailed { reason: String },
    /// The download succeeded but the grayscale transform failed.
    TransformFailed { reason: String },
}

impl ImageOutcome {
    /// True when the grayscale artifact was written.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Summary of a completed pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Number of images requested on the command line.
    pub requested: usize,
    /// Accepted URLs in discovery order.
    pub accepted: Vec<String>,
    /// Per-image results, in the same order as `accepted`.
    pub images: Vec<(ImageSlot, ImageOutcome)>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of images that made it to a grayscale artifact.
    pub fn converted(&self) -> usize {
        self.images.iter().filter(|(_, o)| o.is_success()).count()
    }

    /// Number of images that failed at fetch or transform.
    pub fn failed(&self) -> usize {
        self.images.len() - self.converted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_paths_share_index() {
        let slot = ImageSlot::new(
            2,
            "http://b.com/y.png",
            Path::new("images"),
            Path::new("gs-images"),
            ExtensionPolicy::Fixed,
        );
        assert_eq!(slot.original, PathBuf::from("images/2.jpg"));
        assert_eq!(slot.grayscale, PathBuf::from("gs-images/2.jpg"));
    }

    #[test]
    fn slot_paths_keep_source_extension() {
        let slot = ImageSlot::new(
            1,
            "http://b.com/y.png",
            Path::new("out"),
            Path::new("gray"),
            ExtensionPolicy::Source,
        );
        assert_eq!(slot.original, PathBuf::from("out/1.png"));
        assert_eq!(slot.grayscale, PathBuf::from("gray/1.png"));
    }

    #[test]
    fn report_counts() {
        let slot = |i| {
            ImageSlot::new(i, "http://a.com/x.jpg", Path::new("i"), Path::new("g"), ExtensionPolicy::Fixed)
        };
        let report = RunReport {
            requested: 3,
            accepted: vec!["a".into(), "b".into(), "c".into()],
            images: vec![
                (slot(1), ImageOutcome::Converted { bytes: 10 }),
                (slot(2), ImageOutcome::FetchFailed { reason: "HTTP 404".into() }),
                (slot(3), ImageOutcome::TransformFailed { reason: "corrupt".into() }),
            ],
            elapsed: Duration::from_millis(5),
        };
        assert_eq!(report.converted(), 1);
        assert_eq!(report.failed(), 2);
    }

    #[test]
    fn only_converted_is_success() {
        assert!(ImageOutcome::Converted { bytes: 0 }.is_success());
        assert!(!ImageOutcome::FetchFailed { reason: "timeout".into() }.is_success());
        assert!(!ImageOutcome::TransformFailed { reason: "corrupt".into() }.is_success());
    }
}
