//! On-disk project tree and packaging.
//!
//! The generation worker hands every scaffolding stage to a [`Scaffolder`].
//! [`FsScaffolder`] lays out the per-session tree, writes the project files of
//! each stage (see [`templates`]) and the two documents, and packs the result
//! as a gzipped tarball.

pub mod templates;

use crate::generation::{DocumentKind, RenderedConfig};
use crate::jobs::{JobStage, SessionId};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Used when a topic has no usable characters.
pub const DEFAULT_PROJECT_NAME: &str = "crew_project";

/// Scaffolding errors.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// File system failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being touched.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ScaffoldError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io { path: path.to_path_buf(), source }
    }
}

/// Result type for scaffolding operations.
pub type Result<T> = std::result::Result<T, ScaffoldError>;

/// Identifies the tree a session writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldContext {
    /// Owning session.
    pub session_id: SessionId,
    /// Topic as submitted.
    pub topic: String,
    /// Directory and package name, derived from the topic.
    pub project_name: String,
}

impl ScaffoldContext {
    /// Context for a session generating `topic`.
    pub fn new(session_id: SessionId, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        let project_name = project_name(&topic);
        Self { session_id, topic, project_name }
    }
}

/// Collaborator that materializes a project.
pub trait Scaffolder: Send + Sync {
    /// Performs the work of one scaffolding stage.
    fn prepare_stage(&self, ctx: &ScaffoldContext, stage: JobStage) -> Result<()>;

    /// Writes the final documents.
    fn write_config(&self, ctx: &ScaffoldContext, rendered: &RenderedConfig) -> Result<()>;

    /// Packages the project; returns the artifact path.
    fn package(&self, ctx: &ScaffoldContext) -> Result<PathBuf>;
}

/// Derives a project identifier from a topic.
///
/// Lower-cases, turns spaces and hyphens into underscores and drops anything
/// outside `[a-z0-9_]`.
pub fn project_name(topic: &str) -> String {
    let name: String = topic
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '-' => Some('_'),
            'a'..='z' | '0'..='9' | '_' => Some(c),
            _ => None,
        })
        .collect();

    if name.trim_matches('_').is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        name
    }
}

/// Writes session trees under a root directory.
#[derive(Debug, Clone)]
pub struct FsScaffolder {
    output_dir: PathBuf,
}

impl FsScaffolder {
    /// Scaffolder rooted at `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    /// Directory holding everything a session produced.
    pub fn session_dir(&self, ctx: &ScaffoldContext) -> PathBuf {
        self.output_dir.join(ctx.session_id.to_string())
    }

    /// Root of the project tree.
    pub fn project_dir(&self, ctx: &ScaffoldContext) -> PathBuf {
        self.session_dir(ctx).join(&ctx.project_name)
    }

    fn create_structure(&self, ctx: &ScaffoldContext) -> Result<()> {
        let root = self.project_dir(ctx);
        let package = root.join("src").join(&ctx.project_name);

        for dir in [package.join("config"), package.join("tools"), root.join("tests"), root.join("knowledge")] {
            fs::create_dir_all(&dir).map_err(ScaffoldError::io(&dir))?;
        }

        debug!(path = %root.display(), "Created project structure");
        Ok(())
    }

    fn write_files(&self, ctx: &ScaffoldContext, stage: JobStage) -> Result<()> {
        let root = self.project_dir(ctx);

        for file in templates::files_for(stage, ctx) {
            let path = root.join(&file.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(ScaffoldError::io(parent))?;
            }
            fs::write(&path, file.contents).map_err(ScaffoldError::io(&path))?;
            debug!(stage = %stage.as_str(), path = %file.path.display(), "Wrote project file");
        }

        Ok(())
    }
}

impl Scaffolder for FsScaffolder {
    fn prepare_stage(&self, ctx: &ScaffoldContext, stage: JobStage) -> Result<()> {
        match stage {
            JobStage::CreatingStructure => self.create_structure(ctx),
            stage => self.write_files(ctx, stage),
        }
    }

    fn write_config(&self, ctx: &ScaffoldContext, rendered: &RenderedConfig) -> Result<()> {
        let root = self.project_dir(ctx);

        for kind in [DocumentKind::Agents, DocumentKind::Tasks] {
            let path = root.join(kind.relative_path(&ctx.project_name));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(ScaffoldError::io(parent))?;
            }
            fs::write(&path, rendered.document(kind)).map_err(ScaffoldError::io(&path))?;
        }

        Ok(())
    }

    fn package(&self, ctx: &ScaffoldContext) -> Result<PathBuf> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use tar::Builder;

        let root = self.project_dir(ctx);
        let archive = self.session_dir(ctx).join(format!("{}.tar.gz", ctx.project_name));

        let file = fs::File::create(&archive).map_err(ScaffoldError::io(&archive))?;
        let enc = GzEncoder::new(file, Compression::default());
        let mut tar = Builder::new(enc);

        tar.append_dir_all(&ctx.project_name, &root).map_err(ScaffoldError::io(&root))?;
        tar.into_inner()
            .and_then(GzEncoder::finish)
            .map_err(ScaffoldError::io(&archive))?;

        debug!(path = %archive.display(), "Packaged project");
        Ok(archive)
    }
}
