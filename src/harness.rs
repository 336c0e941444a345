//! Analysis harness: compile source strings and collect analyzer diagnostics.
//!
//! Each call builds its own project from the given sources, the framework
//! references, and any reference manifests sitting next to the running
//! executable. Compilation and analysis run on tokio's blocking pool.

use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{reference_stem, Compilation, CompilationOptions, MetadataReference, OutputKind, Project};
use crate::detect::{DetectionResult, Diagnostic, MisplacedAttributeAnalyzer, Runner};

/// Runs the misplaced-attribute analyzer over in-memory sources.
#[derive(Debug, Clone)]
pub struct AnalyzerRunner {
    analyzer: MisplacedAttributeAnalyzer,
    output_kind: OutputKind,
    /// Directory scanned for reference manifests; the executable's directory when unset.
    reference_dir: Option<PathBuf>,
}

impl Default for AnalyzerRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerRunner {
    pub fn new() -> Self {
        Self {
            analyzer: MisplacedAttributeAnalyzer::default(),
            output_kind: OutputKind::default(),
            reference_dir: None,
        }
    }

    pub fn with_output_kind(mut self, output_kind: OutputKind) -> Self {
        self.output_kind = output_kind;
        self
    }

    pub fn with_analyzer(mut self, analyzer: MisplacedAttributeAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_reference_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.reference_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Diagnostics for a single source document.
    pub async fn get_diagnostics(&self, source: &str) -> anyhow::Result<Vec<Diagnostic>> {
        self.get_diagnostics_for_sources(&[source]).await
    }

    /// Diagnostics for several documents compiled together.
    pub async fn get_diagnostics_for_sources(
        &self,
        sources: &[&str],
    ) -> anyhow::Result<Vec<Diagnostic>> {
        let project = self.create_project_with_references_in_bin_dir(sources)?;
        self.get_diagnostics_for_project(project).await
    }

    pub async fn get_diagnostics_for_project(
        &self,
        project: Project,
    ) -> anyhow::Result<Vec<Diagnostic>> {
        Ok(self.analyze_project(project).await?.diagnostics)
    }

    /// Full result, including compiler diagnostics and suppressed findings.
    pub async fn analyze_project(&self, project: Project) -> anyhow::Result<DetectionResult> {
        let analyzer = self.analyzer.clone();
        tokio::task::spawn_blocking(move || {
            let compilation = Compilation::create(&project)?;
            for diagnostic in compilation.compiler_diagnostics() {
                tracing::warn!("{}", diagnostic);
            }
            Ok(Runner::new(analyzer).run(&compilation))
        })
        .await
        .map_err(|e| anyhow::anyhow!("analysis task failed: {}", e))?
    }

    /// A project over `sources` with every manifest in the reference directory added.
    pub fn create_project_with_references_in_bin_dir(
        &self,
        sources: &[&str],
    ) -> anyhow::Result<Project> {
        let dir = match &self.reference_dir {
            Some(dir) => dir.clone(),
            None => bin_dir()?,
        };
        let project = add_references_from_dir(Project::create(sources), &dir)?;
        let options = self.configure_compilation_options(project.options.clone());
        Ok(project.with_options(options))
    }

    pub fn configure_compilation_options(&self, options: CompilationOptions) -> CompilationOptions {
        options.with_output_kind(self.output_kind)
    }
}

/// Directory containing the running executable.
fn bin_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("executable has no parent directory: {}", exe.display()))
}

/// Add each `*.json` manifest in `dir` whose file stem is not already
/// referenced (case-insensitive). Unreadable manifests are skipped.
pub fn add_references_from_dir(mut project: Project, dir: &Path) -> anyhow::Result<Project> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "reference directory does not exist");
        return Ok(project);
    }

    let mut manifests: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map_or(false, |ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
        })
        .collect();
    manifests.sort();

    for path in manifests {
        let stem = reference_stem(&path);
        if project.has_reference_named(&stem) {
            continue;
        }
        match MetadataReference::from_file(&path) {
            Ok(reference) => {
                tracing::debug!(reference = %reference.display, "adding metadata reference");
                project = project.add_metadata_reference(reference);
            }
            Err(e) => tracing::warn!("skipping reference: {}", e),
        }
    }

    Ok(project)
}
