//! Local metadata probing for files picked before upload.
//!
//! Probing is best-effort: dimensions and duration discovered here seed
//! the editors early, but the backend's analysis is always authoritative
//! and overwrites whatever a probe reported.

use std::path::Path;

/// Metadata a probe managed to discover. Zero means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProbedMetadata {
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
}

/// Source of local media metadata. Implementations may inspect the file
/// or answer from out-of-band knowledge; returning `None` means the
/// probe learned nothing and the pipeline waits for backend analysis.
pub trait MediaProbe {
    fn probe(&self, path: &Path) -> Option<ProbedMetadata>;
}

/// Probe that never learns anything. The default when the host has no
/// way to inspect media locally.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl MediaProbe for NullProbe {
    fn probe(&self, _path: &Path) -> Option<ProbedMetadata> {
        None
    }
}

/// Probe with a fixed answer, fed from caller-supplied dimensions (for
/// example a `--natural-size` flag) or from tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe {
    metadata: ProbedMetadata,
}

impl StaticProbe {
    pub fn new(metadata: ProbedMetadata) -> Self {
        Self { metadata }
    }
}

impl MediaProbe for StaticProbe {
    fn probe(&self, _path: &Path) -> Option<ProbedMetadata> {
        Some(self.metadata)
    }
}
