//! Media source identity
//!
//! A `MediaSource` is the authoritative "current video": one is created per
//! file selection or URL submission and replaced wholesale when the user
//! picks a new one. Its uuid is what async completions are checked against
//! so late responses for a superseded source are discarded.

use uuid::Uuid;

/// Where the active video came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOrigin {
    /// Selected from the local filesystem and uploaded.
    LocalFile,
    /// Fetched server-side from a user-supplied URL.
    RemoteUrl,
}

/// Ephemeral reference to preview data for the active video.
///
/// Exclusively owned by the pipeline and never shared; it must be released
/// when superseded or on reset so repeated selections cannot accumulate
/// live references. Once released the location is gone for good.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    location: String,
    released: bool,
}

impl PreviewHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            released: false,
        }
    }

    /// Where the preview can be read from, or `None` once released.
    pub fn location(&self) -> Option<&str> {
        if self.released {
            None
        } else {
            Some(&self.location)
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn release(&mut self) {
        self.released = true;
    }
}

/// Identity and known metadata of the active video.
///
/// `natural_width`/`natural_height`/`duration_seconds` are zero until
/// learned, either from the local probe right after upload or from
/// analysis.
#[derive(Debug)]
pub struct MediaSource {
    pub id: Uuid,
    pub origin: MediaOrigin,
    /// Backend-assigned identity, present once upload/fetch succeeded.
    pub remote_filename: Option<String>,
    pub natural_width: u32,
    pub natural_height: u32,
    pub duration_seconds: f64,
    preview: Option<PreviewHandle>,
}

impl MediaSource {
    /// New source for a local file; the file path doubles as the local
    /// preview location until analysis supplies a backend preview.
    pub fn local(preview_location: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin: MediaOrigin::LocalFile,
            remote_filename: None,
            natural_width: 0,
            natural_height: 0,
            duration_seconds: 0.0,
            preview: Some(PreviewHandle::new(preview_location)),
        }
    }

    /// New source for a remote URL; no local preview exists until the
    /// backend renders one.
    pub fn remote() -> Self {
        Self {
            id: Uuid::new_v4(),
            origin: MediaOrigin::RemoteUrl,
            remote_filename: None,
            natural_width: 0,
            natural_height: 0,
            duration_seconds: 0.0,
            preview: None,
        }
    }

    pub fn preview_location(&self) -> Option<&str> {
        self.preview.as_ref().and_then(|handle| handle.location())
    }

    pub fn has_live_preview(&self) -> bool {
        self.preview_location().is_some()
    }

    /// Swap in a backend-rendered preview, releasing the local one.
    pub fn adopt_backend_preview(&mut self, url: impl Into<String>) {
        self.release_preview();
        self.preview = Some(PreviewHandle::new(url));
    }

    /// Release the preview handle without replacing it.
    pub fn release_preview(&mut self) {
        if let Some(handle) = self.preview.as_mut() {
            handle.release();
        }
        self.preview = None;
    }

    /// Record locally probed dimensions and duration; zero values are
    /// treated as "still unknown" and do not overwrite.
    pub fn adopt_local_metadata(&mut self, width: u32, height: u32, duration_seconds: f64) {
        if width > 0 && height > 0 {
            self.natural_width = width;
            self.natural_height = height;
        }
        if duration_seconds > 0.0 {
            self.duration_seconds = duration_seconds;
        }
    }

    pub fn has_dimensions(&self) -> bool {
        self.natural_width > 0 && self.natural_height > 0
    }
}
