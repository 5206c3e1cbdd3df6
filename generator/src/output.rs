//! Output layout, API accumulators and the file writer
//!
//! The writer is the only part of the generator that touches the
//! filesystem. It records every path it writes in run order; writing the
//! same path twice in one run is allowed (Convolve and Depthwise share a
//! directory) but logged and reported.

use crate::error::{GenError, Result};
use crate::variant::VariantKind;
use indexmap::IndexMap;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub const PUBLIC_API_HEADER: &str = "arm_cmixnn.h";
pub const SUPPORT_API_HEADER: &str = "arm_cmixnn_support.h";

/// Output directories under the install root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputDir {
    Include,
    Convolution,
    /// Declared for the library layout; nothing is generated into it
    FullyConnected,
    /// Declared for the library layout; nothing is generated into it
    Pooling,
    NnSupport,
}

impl OutputDir {
    pub const ALL: [OutputDir; 5] = [
        OutputDir::Include,
        OutputDir::Convolution,
        OutputDir::FullyConnected,
        OutputDir::Pooling,
        OutputDir::NnSupport,
    ];

    pub fn relative_path(&self) -> &'static str {
        match self {
            OutputDir::Include => "Include",
            OutputDir::Convolution => "Source/ConvolutionFunctions",
            OutputDir::FullyConnected => "Source/FullyConnectedFunctions",
            OutputDir::Pooling => "Source/PoolingFunctions",
            OutputDir::NnSupport => "Source/NNSupportFunctions",
        }
    }

    /// Convolve, Depthwise and MatMul all land in the convolution directory.
    pub fn for_kind(kind: VariantKind) -> OutputDir {
        match kind {
            VariantKind::Convolve | VariantKind::Depthwise | VariantKind::MatMul => {
                OutputDir::Convolution
            }
            VariantKind::ConvertReorder => OutputDir::NnSupport,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, dir: OutputDir) -> PathBuf {
        self.root.join(dir.relative_path())
    }
}

/// Create `path` and its parents. An existing directory is fine; anything
/// else at that path, or any other failure, is an error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| GenError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Which aggregate header a kind's declaration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiGroup {
    General,
    Support,
}

impl ApiGroup {
    pub fn for_kind(kind: VariantKind) -> ApiGroup {
        match kind {
            VariantKind::ConvertReorder => ApiGroup::Support,
            _ => ApiGroup::General,
        }
    }
}

/// Declarations in the order they were generated.
#[derive(Debug, Clone)]
pub struct ApiAccumulator {
    text: String,
    declarations: usize,
}

impl ApiAccumulator {
    pub fn new() -> Self {
        Self {
            text: "\n".to_string(),
            declarations: 0,
        }
    }

    pub fn push(&mut self, declaration: &str) {
        self.text.push_str(declaration);
        self.text.push('\n');
        self.declarations += 1;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn declarations(&self) -> usize {
        self.declarations
    }
}

impl Default for ApiAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiAccumulators {
    pub general: ApiAccumulator,
    pub support: ApiAccumulator,
}

impl ApiAccumulators {
    pub fn push(&mut self, kind: VariantKind, declaration: &str) {
        match ApiGroup::for_kind(kind) {
            ApiGroup::General => self.general.push(declaration),
            ApiGroup::Support => self.support.push(declaration),
        }
    }
}

pub struct OutputWriter {
    layout: OutputLayout,
    dry_run: bool,
    /// Path -> number of writes this run
    written: IndexMap<PathBuf, usize>,
}

impl OutputWriter {
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout,
            dry_run: false,
            written: IndexMap::new(),
        }
    }

    /// Record paths without creating directories or writing files.
    pub fn dry_run(layout: OutputLayout) -> Self {
        Self {
            dry_run: true,
            ..Self::new(layout)
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn prepare(&self, dir: OutputDir) -> Result<PathBuf> {
        let path = self.layout.dir(dir);
        if !self.dry_run {
            ensure_dir(&path)?;
        }
        Ok(path)
    }

    /// Write `contents` to `filename` inside `dir`, replacing any previous
    /// content.
    pub fn write(&mut self, dir: OutputDir, filename: &str, contents: &str) -> Result<PathBuf> {
        let path = self.layout.dir(dir).join(filename);
        if !self.dry_run {
            fs::write(&path, contents).map_err(|source| GenError::Write {
                path: path.clone(),
                source,
            })?;
        }
        debug!("Wrote {} ({} bytes)", path.display(), contents.len());

        let count = self.written.entry(path.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            warn!("{} was already written in this run and has been overwritten", path.display());
        }
        Ok(path)
    }

    /// Distinct paths in first-write order.
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.written.keys().map(PathBuf::as_path)
    }

    /// Paths written more than once.
    pub fn overwritten(&self) -> impl Iterator<Item = &Path> {
        self.written
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(path, _)| path.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_directories() {
        assert_eq!(OutputDir::for_kind(VariantKind::Convolve), OutputDir::Convolution);
        assert_eq!(OutputDir::for_kind(VariantKind::Depthwise), OutputDir::Convolution);
        assert_eq!(OutputDir::for_kind(VariantKind::MatMul), OutputDir::Convolution);
        assert_eq!(OutputDir::for_kind(VariantKind::ConvertReorder), OutputDir::NnSupport);
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Source").join("ConvolutionFunctions");
        ensure_dir(&path).unwrap();
        ensure_dir(&path).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Include");
        fs::write(&path, "not a directory").unwrap();
        assert!(matches!(ensure_dir(&path), Err(GenError::CreateDir { .. })));
    }

    #[test]
    fn test_accumulators_route_by_kind() {
        let mut acc = ApiAccumulators::default();
        acc.push(VariantKind::Convolve, "conv;");
        acc.push(VariantKind::MatMul, "mm;");
        acc.push(VariantKind::ConvertReorder, "reorder;");

        assert_eq!(acc.general.text(), "\nconv;\nmm;\n");
        assert_eq!(acc.general.declarations(), 2);
        assert_eq!(acc.support.text(), "\nreorder;\n");
        assert_eq!(acc.support.declarations(), 1);
    }

    #[test]
    fn test_writer_tracks_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = OutputWriter::new(OutputLayout::new(tmp.path()));
        writer.prepare(OutputDir::Convolution).unwrap();

        writer.write(OutputDir::Convolution, "a.c", "first").unwrap();
        writer.write(OutputDir::Convolution, "b.c", "b").unwrap();
        let path = writer.write(OutputDir::Convolution, "a.c", "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(writer.written().count(), 2);
        let overwritten: Vec<&Path> = writer.overwritten().collect();
        assert_eq!(overwritten, vec![path.as_path()]);
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = OutputWriter::new(OutputLayout::new(tmp.path()));
        let err = writer.write(OutputDir::Pooling, "x.c", "x").unwrap_err();
        assert!(matches!(err, GenError::Write { .. }));
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = OutputWriter::dry_run(OutputLayout::new(tmp.path()));
        writer.prepare(OutputDir::Include).unwrap();
        writer.write(OutputDir::Include, PUBLIC_API_HEADER, "x").unwrap();

        assert!(!tmp.path().join("Include").exists());
        assert_eq!(writer.written().count(), 1);
    }
}
