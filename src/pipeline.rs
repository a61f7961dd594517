//! Conversion pipeline: selection, upload, analysis, conversion.
//!
//! The machine is split in two layers. `PipelineState` is pure: every
//! network operation is a `begin_*` transition that hands out an
//! `OpTicket`, plus a `complete_*` transition that applies the result
//! only if the ticket still matches the active media and pending
//! operation. A new selection mints a fresh MediaSource uuid, so
//! completions for a superseded video fail the ticket check and are
//! discarded with a warning instead of corrupting the new session.
//!
//! `ConversionPipeline` drives the pure core over a `BackendClient` and
//! a local metadata probe, one awaited operation per method.

use std::path::Path;

use uuid::Uuid;

use crate::backend::{
    AnalyzeResponse, BackendClient, ConvertResponse, ProgressFn, UploadResponse,
};
use crate::constants::{
    ALLOWED_VIDEO_EXTENSIONS, MAX_FPS, MAX_OUTPUT_WIDTH, MAX_SPEED_FACTOR, MIN_FPS,
    MIN_OUTPUT_WIDTH, MIN_SPEED_FACTOR,
};
use crate::error::{ClientError, RequestKind};
use crate::probe::{MediaProbe, ProbedMetadata};
use crate::state::{
    ConversionConfig, ConvertRequest, MediaSource, OutputArtifact, OutputFormat, TrimRange,
};

/// Where the active video sits in its lifecycle.
///
/// `Failed` is an idle entry point: it carries the surfaced message but
/// behaves exactly like `Idle` for every guard, and a fresh selection is
/// the retry path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Uploading,
    Uploaded,
    Analyzing,
    Analyzed,
    Converting,
    Converted,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Uploading => "uploading",
            PipelineStage::Uploaded => "uploaded",
            PipelineStage::Analyzing => "analyzing",
            PipelineStage::Analyzed => "analyzed",
            PipelineStage::Converting => "converting",
            PipelineStage::Converted => "converted",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A network operation the pipeline can have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOp {
    Upload,
    FetchUrl,
    Analyze,
    Convert,
}

impl PipelineOp {
    pub fn request_kind(self) -> RequestKind {
        match self {
            PipelineOp::Upload => RequestKind::Upload,
            PipelineOp::FetchUrl => RequestKind::FetchUrl,
            PipelineOp::Analyze => RequestKind::Analyze,
            PipelineOp::Convert => RequestKind::Convert,
        }
    }
}

/// Claim check for one in-flight operation. A completion is applied only
/// while its ticket matches both the pending operation and the active
/// MediaSource id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpTicket {
    pub source_id: Uuid,
    pub op: PipelineOp,
}

/// Whether a completion was applied or discarded as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    Stale,
}

impl Applied {
    pub fn is_applied(self) -> bool {
        matches!(self, Applied::Applied)
    }
}

/// Pure pipeline state. All transitions are synchronous; the async
/// driver below feeds it network results.
#[derive(Debug)]
pub struct PipelineState {
    stage: PipelineStage,
    media: Option<MediaSource>,
    config: ConversionConfig,
    scene_marks: Vec<f64>,
    output: Option<OutputArtifact>,
    pending: Option<OpTicket>,
    last_error: Option<String>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            stage: PipelineStage::Idle,
            media: None,
            config: ConversionConfig::default(),
            scene_marks: Vec::new(),
            output: None,
            pending: None,
            last_error: None,
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn media(&self) -> Option<&MediaSource> {
        self.media.as_ref()
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Settings are edited in place between operations; convert snapshots
    /// them at submit, so later edits never relabel an in-flight request.
    pub fn config_mut(&mut self) -> &mut ConversionConfig {
        &mut self.config
    }

    pub fn scene_marks(&self) -> &[f64] {
        &self.scene_marks
    }

    pub fn output(&self) -> Option<&OutputArtifact> {
        self.output.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn remote_filename(&self) -> Option<&str> {
        self.media.as_ref()?.remote_filename.as_deref()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select a local file. Always allowed outside an in-flight selection
    /// gate: a new selection supersedes whatever was active, including an
    /// in-flight operation for the previous video (its completion will
    /// fail the ticket check).
    pub fn begin_select_file(&mut self, path: &Path) -> Result<OpTicket, ClientError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ClientError::InvalidInput(
                "Invalid file type. Use MP4, AVI, MOV, WEBM, or MKV.".to_string(),
            ));
        }
        Ok(self.adopt_selection(MediaSource::local(path.display().to_string()), PipelineOp::Upload))
    }

    /// Select a remote URL for the backend to fetch.
    pub fn begin_select_url(&mut self, url: &str) -> Result<OpTicket, ClientError> {
        if url.trim().is_empty() {
            return Err(ClientError::InvalidInput("No video URL provided.".to_string()));
        }
        Ok(self.adopt_selection(MediaSource::remote(), PipelineOp::FetchUrl))
    }

    /// Replace the active video wholesale: release the old preview, reset
    /// every per-video setting, mint a fresh ticket.
    fn adopt_selection(&mut self, source: MediaSource, op: PipelineOp) -> OpTicket {
        if let Some(mut previous) = self.media.take() {
            previous.release_preview();
        }
        let ticket = OpTicket {
            source_id: source.id,
            op,
        };
        self.media = Some(source);
        self.config = ConversionConfig::default();
        self.scene_marks.clear();
        self.output = None;
        self.last_error = None;
        self.pending = Some(ticket);
        self.stage = PipelineStage::Uploading;
        ticket
    }

    /// Record locally probed metadata for the given source. Ignored when
    /// the source has been superseded.
    pub fn adopt_probed_metadata(&mut self, source_id: Uuid, meta: ProbedMetadata) -> Applied {
        let Some(media) = self.media.as_mut().filter(|media| media.id == source_id) else {
            tracing::warn!("discarding probe result for superseded media");
            return Applied::Stale;
        };
        media.adopt_local_metadata(meta.width, meta.height, meta.duration_seconds);
        if self.config.trim.end <= 0.0 && media.duration_seconds > 0.0 {
            self.config.trim = TrimRange::full(media.duration_seconds);
        }
        Applied::Applied
    }

    /// Apply an upload (or URL fetch) result. On failure the media is
    /// discarded entirely; selecting again is the retry path.
    pub fn complete_upload(
        &mut self,
        ticket: OpTicket,
        result: Result<UploadResponse, ClientError>,
    ) -> Result<Applied, ClientError> {
        if !self.ticket_is_current(&ticket) {
            tracing::warn!(op = %ticket.op.request_kind(), "discarding stale completion");
            return Ok(Applied::Stale);
        }
        self.pending = None;
        match result {
            Ok(response) => {
                if let Some(media) = self.media.as_mut() {
                    media.remote_filename = Some(response.filename);
                }
                self.stage = PipelineStage::Uploaded;
                Ok(Applied::Applied)
            }
            Err(err) => {
                self.fail_discarding_media(&err);
                Err(err)
            }
        }
    }

    // =========================================================================
    // Analysis
    // =========================================================================

    pub fn begin_analyze(&mut self) -> Result<(OpTicket, String), ClientError> {
        if let Some(pending) = self.pending {
            return Err(ClientError::Busy(pending.op.request_kind()));
        }
        let filename = match self.stage {
            PipelineStage::Uploaded => self.remote_filename().map(|name| name.to_string()),
            _ => None,
        };
        let Some(filename) = filename else {
            return Err(ClientError::InvalidInput(
                "No uploaded video to analyze.".to_string(),
            ));
        };
        let source_id = self.media.as_ref().map(|media| media.id).unwrap_or_default();
        let ticket = OpTicket {
            source_id,
            op: PipelineOp::Analyze,
        };
        self.pending = Some(ticket);
        self.stage = PipelineStage::Analyzing;
        Ok((ticket, filename))
    }

    /// Apply an analysis result: the backend's duration is authoritative,
    /// scene marks become snap hints, and a backend preview (when given)
    /// replaces the local one.
    pub fn complete_analyze(
        &mut self,
        ticket: OpTicket,
        result: Result<AnalyzeResponse, ClientError>,
    ) -> Result<Applied, ClientError> {
        if !self.ticket_is_current(&ticket) {
            tracing::warn!("discarding stale analysis completion");
            return Ok(Applied::Stale);
        }
        self.pending = None;
        match result {
            Ok(response) => {
                let duration = response.duration.max(0.0);
                if let Some(media) = self.media.as_mut() {
                    media.duration_seconds = duration;
                    if let Some(url) = response.preview_url {
                        media.adopt_backend_preview(url);
                    }
                }
                let mut marks: Vec<f64> = response
                    .scenes
                    .into_iter()
                    .filter(|mark| mark.is_finite() && *mark >= 0.0 && *mark <= duration)
                    .collect();
                marks.sort_by(|a, b| a.total_cmp(b));
                self.scene_marks = marks;
                if !self.config.trim.is_valid_for(duration) || self.config.trim.end <= 0.0 {
                    self.config.trim = TrimRange::full(duration);
                }
                self.stage = PipelineStage::Analyzed;
                Ok(Applied::Applied)
            }
            Err(err) => {
                self.fail_discarding_media(&err);
                Err(err)
            }
        }
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Validate the committed settings and snapshot the request payload.
    /// The payload is final: `output_format` is derived here from the
    /// include-audio flag and later config edits cannot change it.
    pub fn begin_convert(&mut self) -> Result<(OpTicket, ConvertRequest), ClientError> {
        if let Some(pending) = self.pending {
            return Err(ClientError::Busy(pending.op.request_kind()));
        }
        if !matches!(self.stage, PipelineStage::Analyzed | PipelineStage::Converted) {
            return Err(ClientError::InvalidInput(
                "No analyzed video to convert.".to_string(),
            ));
        }
        let Some(media) = self.media.as_ref() else {
            return Err(ClientError::InvalidInput(
                "No analyzed video to convert.".to_string(),
            ));
        };
        let Some(filename) = media.remote_filename.clone() else {
            return Err(ClientError::InvalidInput(
                "No analyzed video to convert.".to_string(),
            ));
        };
        self.validate_for_convert(media.duration_seconds, media.natural_width, media.natural_height)?;

        let request = ConvertRequest::from_config(filename, &self.config);
        let ticket = OpTicket {
            source_id: media.id,
            op: PipelineOp::Convert,
        };
        self.pending = Some(ticket);
        self.stage = PipelineStage::Converting;
        Ok((ticket, request))
    }

    fn validate_for_convert(
        &self,
        duration: f64,
        natural_width: u32,
        natural_height: u32,
    ) -> Result<(), ClientError> {
        let config = &self.config;
        if !(MIN_FPS..=MAX_FPS).contains(&config.fps) {
            return Err(ClientError::InvalidInput(format!(
                "FPS must be between {} and {}.",
                MIN_FPS, MAX_FPS
            )));
        }
        if !(MIN_OUTPUT_WIDTH..=MAX_OUTPUT_WIDTH).contains(&config.width) {
            return Err(ClientError::InvalidInput(format!(
                "Width must be between {} and {}.",
                MIN_OUTPUT_WIDTH, MAX_OUTPUT_WIDTH
            )));
        }
        if !(MIN_SPEED_FACTOR..=MAX_SPEED_FACTOR).contains(&config.speed_factor) {
            return Err(ClientError::InvalidInput(format!(
                "Speed factor must be between {} and {}.",
                MIN_SPEED_FACTOR, MAX_SPEED_FACTOR
            )));
        }
        if !config.trim.is_valid_for(duration) || config.trim.end <= config.trim.start {
            return Err(ClientError::InvalidInput(
                "Trim range must lie within the video duration.".to_string(),
            ));
        }
        if let Some(crop) = &config.crop {
            // Dimensions can stay unknown when no probe ran and analysis
            // did not report them; a crop can only have been committed
            // against known dimensions, so validate when we have them.
            if natural_width > 0
                && natural_height > 0
                && !crop.fits_within(natural_width, natural_height)
            {
                return Err(ClientError::InvalidInput(
                    "Crop region must lie within the video frame.".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Apply a conversion result. `format` is the snapshot's derived
    /// output format, carried alongside the ticket so the artifact label
    /// reflects what was actually requested. Failure returns to Analyzed
    /// with all settings preserved.
    pub fn complete_convert(
        &mut self,
        ticket: OpTicket,
        format: OutputFormat,
        result: Result<ConvertResponse, ClientError>,
    ) -> Result<Applied, ClientError> {
        if !self.ticket_is_current(&ticket) {
            tracing::warn!("discarding stale conversion completion");
            return Ok(Applied::Stale);
        }
        self.pending = None;
        match result {
            Ok(response) => {
                self.output = Some(OutputArtifact {
                    url: response.url,
                    format,
                });
                self.stage = PipelineStage::Converted;
                Ok(Applied::Applied)
            }
            Err(err) => {
                self.last_error = Some(err.surface_message());
                self.stage = PipelineStage::Analyzed;
                Err(err)
            }
        }
    }

    /// Drop everything and return to Idle.
    pub fn reset(&mut self) {
        if let Some(mut media) = self.media.take() {
            media.release_preview();
        }
        self.config = ConversionConfig::default();
        self.scene_marks.clear();
        self.output = None;
        self.pending = None;
        self.last_error = None;
        self.stage = PipelineStage::Idle;
    }

    fn ticket_is_current(&self, ticket: &OpTicket) -> bool {
        self.pending == Some(*ticket)
            && self
                .media
                .as_ref()
                .is_some_and(|media| media.id == ticket.source_id)
    }

    fn fail_discarding_media(&mut self, err: &ClientError) {
        if let Some(mut media) = self.media.take() {
            media.release_preview();
        }
        self.last_error = Some(err.surface_message());
        self.stage = PipelineStage::Failed;
    }
}

/// Async driver: one awaited backend operation per method, pure
/// transitions on either side of the await.
pub struct ConversionPipeline {
    backend: BackendClient,
    probe: Box<dyn MediaProbe + Send + Sync>,
    state: PipelineState,
}

impl ConversionPipeline {
    pub fn new(backend: BackendClient, probe: Box<dyn MediaProbe + Send + Sync>) -> Self {
        Self {
            backend,
            probe,
            state: PipelineState::new(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PipelineState {
        &mut self.state
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// Select and upload a local file. Local metadata is probed before
    /// the upload so the editors can seed immediately.
    pub async fn select_file(
        &mut self,
        path: &Path,
        progress: Option<ProgressFn>,
    ) -> Result<(), ClientError> {
        let ticket = self.state.begin_select_file(path)?;
        tracing::info!(path = %path.display(), "uploading video");
        if let Some(meta) = self.probe.probe(path) {
            self.state.adopt_probed_metadata(ticket.source_id, meta);
        }
        let result = self.backend.upload(path, progress).await;
        self.state.complete_upload(ticket, result)?;
        Ok(())
    }

    /// Submit a remote URL for server-side fetching.
    pub async fn select_url(&mut self, url: &str) -> Result<(), ClientError> {
        let ticket = self.state.begin_select_url(url)?;
        tracing::info!(url, "submitting video URL");
        let result = self.backend.process_url(url).await;
        self.state.complete_upload(ticket, result)?;
        Ok(())
    }

    /// Analyze the uploaded video.
    pub async fn analyze(&mut self) -> Result<(), ClientError> {
        let (ticket, filename) = self.state.begin_analyze()?;
        tracing::info!(filename, "analyzing video");
        let result = self.backend.analyze(&filename).await;
        self.state.complete_analyze(ticket, result)?;
        Ok(())
    }

    /// Convert with the committed settings.
    pub async fn convert(&mut self) -> Result<(), ClientError> {
        let (ticket, request) = self.state.begin_convert()?;
        let format = request.output_format;
        tracing::info!(filename = %request.filename, format = %format, "converting video");
        let result = self.backend.convert(&request).await;
        self.state.complete_convert(ticket, format, result)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CropRegion, TextPosition};
    use std::path::PathBuf;

    fn upload_ok(name: &str) -> Result<UploadResponse, ClientError> {
        Ok(UploadResponse {
            filename: name.to_string(),
        })
    }

    fn analyze_ok(duration: f64, scenes: Vec<f64>) -> Result<AnalyzeResponse, ClientError> {
        Ok(AnalyzeResponse {
            duration,
            scenes,
            preview_url: None,
        })
    }

    fn convert_ok(url: &str) -> Result<ConvertResponse, ClientError> {
        Ok(ConvertResponse {
            url: url.to_string(),
        })
    }

    /// Drive a fresh state to Analyzed with a 30s video.
    fn analyzed_state() -> PipelineState {
        let mut state = PipelineState::new();
        let ticket = state
            .begin_select_file(&PathBuf::from("/tmp/clip.mp4"))
            .unwrap();
        state
            .adopt_probed_metadata(
                ticket.source_id,
                ProbedMetadata {
                    width: 1920,
                    height: 1080,
                    duration_seconds: 30.0,
                },
            );
        state.complete_upload(ticket, upload_ok("clip.mp4")).unwrap();
        let (ticket, _) = state.begin_analyze().unwrap();
        state
            .complete_analyze(ticket, analyze_ok(30.0, vec![5.0, 12.5]))
            .unwrap();
        state
    }

    #[test]
    fn test_fresh_state_is_idle() {
        let state = PipelineState::new();
        assert_eq!(state.stage(), PipelineStage::Idle);
        assert!(state.media().is_none());
        assert!(state.output().is_none());
    }

    #[test]
    fn test_select_upload_analyze_happy_path() {
        let state = analyzed_state();
        assert_eq!(state.stage(), PipelineStage::Analyzed);
        assert_eq!(state.remote_filename(), Some("clip.mp4"));
        assert_eq!(state.scene_marks(), &[5.0, 12.5]);
        let media = state.media().unwrap();
        assert_eq!(media.duration_seconds, 30.0);
        assert_eq!(state.config().trim, TrimRange { start: 0.0, end: 30.0 });
    }

    #[test]
    fn test_disallowed_extension_rejected_before_upload() {
        let mut state = PipelineState::new();
        let err = state
            .begin_select_file(&PathBuf::from("/tmp/notes.txt"))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
        assert_eq!(state.stage(), PipelineStage::Idle);
        assert!(state.media().is_none());
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut state = PipelineState::new();
        let err = state.begin_select_url("   ").unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[test]
    fn test_upload_failure_discards_media() {
        let mut state = PipelineState::new();
        let ticket = state
            .begin_select_file(&PathBuf::from("/tmp/clip.mp4"))
            .unwrap();
        let err = state
            .complete_upload(
                ticket,
                Err(ClientError::transport(RequestKind::Upload, "connection refused")),
            )
            .unwrap_err();
        assert_eq!(err.surface_message(), "connection refused");
        assert_eq!(state.stage(), PipelineStage::Failed);
        assert!(state.media().is_none());
        assert_eq!(state.last_error(), Some("connection refused"));
        // Failed behaves like Idle: a fresh selection goes straight through.
        assert!(state.begin_select_file(&PathBuf::from("/tmp/other.mov")).is_ok());
        assert_eq!(state.stage(), PipelineStage::Uploading);
    }

    #[test]
    fn test_new_selection_supersedes_inflight_upload() {
        let mut state = PipelineState::new();
        let first = state
            .begin_select_file(&PathBuf::from("/tmp/a.mp4"))
            .unwrap();
        let second = state
            .begin_select_file(&PathBuf::from("/tmp/b.mp4"))
            .unwrap();
        assert_ne!(first.source_id, second.source_id);

        // The first upload lands late and must be discarded.
        let applied = state.complete_upload(first, upload_ok("a.mp4")).unwrap();
        assert_eq!(applied, Applied::Stale);
        assert_eq!(state.stage(), PipelineStage::Uploading);
        assert_eq!(state.remote_filename(), None);

        let applied = state.complete_upload(second, upload_ok("b.mp4")).unwrap();
        assert_eq!(applied, Applied::Applied);
        assert_eq!(state.remote_filename(), Some("b.mp4"));
    }

    #[test]
    fn test_stale_failure_is_swallowed() {
        let mut state = PipelineState::new();
        let first = state
            .begin_select_file(&PathBuf::from("/tmp/a.mp4"))
            .unwrap();
        state.begin_select_file(&PathBuf::from("/tmp/b.mp4")).unwrap();
        // Failure of the superseded upload neither errors nor fails the
        // new session.
        let applied = state
            .complete_upload(
                first,
                Err(ClientError::transport(RequestKind::Upload, "timeout")),
            )
            .unwrap();
        assert_eq!(applied, Applied::Stale);
        assert_eq!(state.stage(), PipelineStage::Uploading);
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn test_analyze_requires_uploaded_stage() {
        let mut state = PipelineState::new();
        assert!(matches!(
            state.begin_analyze().unwrap_err(),
            ClientError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_analyze_busy_while_uploading() {
        let mut state = PipelineState::new();
        state.begin_select_file(&PathBuf::from("/tmp/clip.mp4")).unwrap();
        assert!(matches!(
            state.begin_analyze().unwrap_err(),
            ClientError::Busy(RequestKind::Upload)
        ));
    }

    #[test]
    fn test_analyze_failure_discards_media() {
        let mut state = PipelineState::new();
        let ticket = state
            .begin_select_file(&PathBuf::from("/tmp/clip.mp4"))
            .unwrap();
        state.complete_upload(ticket, upload_ok("clip.mp4")).unwrap();
        let (ticket, _) = state.begin_analyze().unwrap();
        state
            .complete_analyze(
                ticket,
                Err(ClientError::transport(RequestKind::Analyze, "Server error")),
            )
            .unwrap_err();
        assert_eq!(state.stage(), PipelineStage::Failed);
        assert!(state.media().is_none());
        assert_eq!(state.remote_filename(), None);
    }

    #[test]
    fn test_analyze_adopts_backend_preview_and_filters_marks() {
        let mut state = PipelineState::new();
        let ticket = state
            .begin_select_file(&PathBuf::from("/tmp/clip.mp4"))
            .unwrap();
        state.complete_upload(ticket, upload_ok("clip.mp4")).unwrap();
        let (ticket, filename) = state.begin_analyze().unwrap();
        assert_eq!(filename, "clip.mp4");
        state
            .complete_analyze(
                ticket,
                Ok(AnalyzeResponse {
                    duration: 20.0,
                    scenes: vec![25.0, 3.0, -1.0, 10.0],
                    preview_url: Some("https://cdn.example/preview.mp4".to_string()),
                }),
            )
            .unwrap();
        // Out-of-range marks dropped, remainder sorted.
        assert_eq!(state.scene_marks(), &[3.0, 10.0]);
        let media = state.media().unwrap();
        assert_eq!(media.preview_location(), Some("https://cdn.example/preview.mp4"));
        assert_eq!(state.config().trim, TrimRange { start: 0.0, end: 20.0 });
    }

    #[test]
    fn test_analyze_keeps_valid_probed_trim() {
        let mut state = PipelineState::new();
        let ticket = state
            .begin_select_file(&PathBuf::from("/tmp/clip.mp4"))
            .unwrap();
        state.complete_upload(ticket, upload_ok("clip.mp4")).unwrap();
        state.config_mut().trim = TrimRange { start: 2.0, end: 8.0 };
        let (ticket, _) = state.begin_analyze().unwrap();
        state
            .complete_analyze(ticket, analyze_ok(30.0, Vec::new()))
            .unwrap();
        assert_eq!(state.config().trim, TrimRange { start: 2.0, end: 8.0 });
    }

    #[test]
    fn test_convert_snapshot_derives_format_from_audio() {
        let mut state = analyzed_state();
        state.config_mut().include_audio = true;
        // A stale hint must not leak into the snapshot.
        state.config_mut().output_format = OutputFormat::Gif;
        let (_, request) = state.begin_convert().unwrap();
        assert_eq!(request.output_format, OutputFormat::Mp4);
        assert_eq!(request.filename, "clip.mp4");
        assert_eq!(request.start_time, 0.0);
        assert_eq!(request.end_time, 30.0);
    }

    #[test]
    fn test_convert_happy_path_sets_artifact() {
        let mut state = analyzed_state();
        let (ticket, request) = state.begin_convert().unwrap();
        assert_eq!(state.stage(), PipelineStage::Converting);
        state
            .complete_convert(ticket, request.output_format, convert_ok("/download/clip.gif"))
            .unwrap();
        assert_eq!(state.stage(), PipelineStage::Converted);
        let artifact = state.output().unwrap();
        assert_eq!(artifact.url, "/download/clip.gif");
        assert_eq!(artifact.format, OutputFormat::Gif);
    }

    #[test]
    fn test_mid_flight_audio_toggle_does_not_relabel() {
        let mut state = analyzed_state();
        let (ticket, request) = state.begin_convert().unwrap();
        assert_eq!(request.output_format, OutputFormat::Gif);
        // User toggles audio while the conversion is in flight.
        state.config_mut().include_audio = true;
        state
            .complete_convert(ticket, request.output_format, convert_ok("/download/clip.gif"))
            .unwrap();
        assert_eq!(state.output().unwrap().format, OutputFormat::Gif);
    }

    #[test]
    fn test_convert_failure_returns_to_analyzed_with_config() {
        let mut state = analyzed_state();
        state.config_mut().fps = 24;
        state.config_mut().text.text = "hello".to_string();
        state.config_mut().text.position = TextPosition::BottomLeft;
        let (ticket, request) = state.begin_convert().unwrap();
        state
            .complete_convert(
                ticket,
                request.output_format,
                Err(ClientError::transport(RequestKind::Convert, "Server error")),
            )
            .unwrap_err();
        assert_eq!(state.stage(), PipelineStage::Analyzed);
        assert_eq!(state.config().fps, 24);
        assert_eq!(state.config().text.text, "hello");
        assert_eq!(state.last_error(), Some("Server error"));
        // Retry goes straight through.
        assert!(state.begin_convert().is_ok());
    }

    #[test]
    fn test_convert_busy_rejected_not_queued() {
        let mut state = analyzed_state();
        state.begin_convert().unwrap();
        assert!(matches!(
            state.begin_convert().unwrap_err(),
            ClientError::Busy(RequestKind::Convert)
        ));
    }

    #[test]
    fn test_reconvert_from_converted_is_identical() {
        let mut state = analyzed_state();
        let (ticket, first) = state.begin_convert().unwrap();
        state
            .complete_convert(ticket, first.output_format, convert_ok("/download/clip.gif"))
            .unwrap();
        let (_, second) = state.begin_convert().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_convert_validates_trim_speed_and_crop() {
        let mut state = analyzed_state();
        state.config_mut().trim = TrimRange { start: 12.0, end: 8.0 };
        assert!(matches!(
            state.begin_convert().unwrap_err(),
            ClientError::InvalidInput(_)
        ));

        let mut state = analyzed_state();
        state.config_mut().speed_factor = 9.0;
        assert!(matches!(
            state.begin_convert().unwrap_err(),
            ClientError::InvalidInput(_)
        ));

        let mut state = analyzed_state();
        state.config_mut().crop = Some(CropRegion {
            x: 1900,
            y: 0,
            width: 100,
            height: 100,
        });
        assert!(matches!(
            state.begin_convert().unwrap_err(),
            ClientError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_convert_rejects_extreme_crop_without_overflow() {
        let mut state = analyzed_state();
        state.config_mut().crop = Some(CropRegion {
            x: u32::MAX,
            y: 0,
            width: u32::MAX,
            height: 100,
        });
        assert!(matches!(
            state.begin_convert().unwrap_err(),
            ClientError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_new_selection_resets_everything() {
        let mut state = analyzed_state();
        state.config_mut().fps = 24;
        let (ticket, request) = state.begin_convert().unwrap();
        state
            .complete_convert(ticket, request.output_format, convert_ok("/download/clip.gif"))
            .unwrap();

        state.begin_select_url("https://example.com/other.mp4").unwrap();
        assert_eq!(state.stage(), PipelineStage::Uploading);
        assert_eq!(state.config().fps, crate::constants::DEFAULT_FPS);
        assert!(state.output().is_none());
        assert!(state.scene_marks().is_empty());
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn test_probe_for_superseded_media_is_stale() {
        let mut state = PipelineState::new();
        let first = state
            .begin_select_file(&PathBuf::from("/tmp/a.mp4"))
            .unwrap();
        state.begin_select_file(&PathBuf::from("/tmp/b.mp4")).unwrap();
        let applied = state.adopt_probed_metadata(
            first.source_id,
            ProbedMetadata {
                width: 640,
                height: 480,
                duration_seconds: 5.0,
            },
        );
        assert_eq!(applied, Applied::Stale);
        assert!(!state.media().unwrap().has_dimensions());
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut state = analyzed_state();
        state.reset();
        assert_eq!(state.stage(), PipelineStage::Idle);
        assert!(state.media().is_none());
        assert_eq!(state.config().trim, TrimRange { start: 0.0, end: 0.0 });
    }
}
