use anyhow::{bail, Context as AnyhowContext, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::export::exporters_for;
use crate::progress::Phase;

use super::endpoints::extract_endpoints;
use super::java::JavaParser;
use super::linker::Linker;
use super::mapper_xml::parse_mapper_xml;
use super::model::{is_model_class, NodeKind, Summary};
use super::pool::ComponentPool;
use super::reader::{is_java_file, SourceReader};
use super::scanner::scan_directory;

/// Main orchestration engine: scan -> read -> parse -> link -> extract ->
/// export, one invocation, one pool.
pub struct Engine {
    config: Config,
    reader: SourceReader,
    parser: JavaParser,
}

impl Engine {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        debug!(?config, "loaded configuration");

        Ok(Self {
            config,
            reader: SourceReader::new(),
            parser: JavaParser::new(),
        })
    }

    /// Run the full analysis pipeline
    pub fn analyze(
        &mut self,
        source: Option<PathBuf>,
        output: Option<PathBuf>,
        formats: Option<String>,
    ) -> Result<()> {
        if let Some(source) = source {
            self.config.project.root_dir = source;
        }
        if let Some(output) = output {
            self.config.output.dir = output;
        }
        if let Some(formats) = formats {
            self.config.output.formats = formats.split(',').map(|s| s.trim().to_string()).collect();
        }

        self.config.validate().context("invalid configuration")?;
        self.config.ensure_output_dir()?;

        info!(root = %self.config.project.root_dir.display(), "Phase 1: scanning & parsing");
        let files = scan_directory(&self.config.project.root_dir, &self.config);
        let scan_phase = Phase::bar("Scanning", files.len() as u64);

        let mut pool = ComponentPool::new();
        let root = self.config.project.root_dir.clone();

        for path in &files {
            self.ingest_file(&mut pool, &root, path);
            scan_phase.inc();
        }
        scan_phase.finish(&format!("{} files", files.len()));

        info!("Phase 2: linking components");
        let link_phase = Phase::spinner("Linking");
        Linker::new(&mut pool).link();
        link_phase.finish(&format!("{} nodes", pool.len()));

        let summary = build_summary(&pool);
        info!(
            controllers = summary.total_controllers,
            services = summary.total_services,
            mappers = summary.total_mappers,
            sqls = summary.total_sqls,
            "pool statistics"
        );

        let endpoints = extract_endpoints(&pool);
        info!(count = endpoints.len(), "extracted API endpoints");

        info!("Phase 3: generating reports");
        let exporters = exporters_for(&self.config.output.formats);
        let report_phase = Phase::bar("Generating", exporters.len() as u64);

        let mut failures = 0usize;
        for exporter in &exporters {
            match exporter.export(&summary, &pool, &endpoints, &self.config) {
                Ok(path) => info!(format = exporter.format_name(), path = %path.display(), "report written"),
                Err(err) => {
                    warn!(format = exporter.format_name(), error = %err, "export failed");
                    failures += 1;
                }
            }
            report_phase.inc();
        }
        report_phase.finish(&format!("{} reports", exporters.len() - failures));

        if failures > 0 {
            bail!("{} of {} exports failed", failures, exporters.len());
        }

        info!(output = %self.config.output.dir.display(), "analysis complete");
        Ok(())
    }

    /// Write a default configuration file
    pub fn init(&self, path: Option<PathBuf>) -> Result<()> {
        let target = path
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spec-recon.toml");

        if target.exists() {
            bail!("refusing to overwrite existing {}", target.display());
        }

        self.config.save(&target)?;
        info!(path = %target.display(), "wrote default configuration");
        Ok(())
    }

    /// Read, decode, parse, and register a single candidate file.
    /// Failures are logged and the file contributes no nodes.
    fn ingest_file(&self, pool: &mut ComponentPool, root: &Path, path: &Path) {
        let rel_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        if is_java_file(path) {
            // CLI-level utility filter: skip whole files by class-name
            // pattern; the core re-checks data-class suffixes regardless
            if !self.config.analysis.include_utils {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if self.config.is_util(stem) {
                        debug!(file = %rel_path, "skipping utility class file");
                        return;
                    }
                }
            }

            let content = match self.reader.read_file(path) {
                Ok(content) => content,
                Err(err) => {
                    warn!(file = %rel_path, error = %err, "failed to read file");
                    return;
                }
            };

            match self.parser.parse(&content) {
                Ok(class) => pool.add_java_class(&class, &rel_path),
                Err(err) => warn!(file = %rel_path, error = %err, "failed to parse Java source"),
            }
        } else {
            let content = match self.reader.read_file(path) {
                Ok(content) => content,
                Err(err) => {
                    warn!(file = %rel_path, error = %err, "failed to read file");
                    return;
                }
            };

            match parse_mapper_xml(&content) {
                Ok(mapper) => pool.add_mapper_xml(&mapper, &rel_path),
                Err(err) => debug!(file = %rel_path, error = %err, "not a mapper document"),
            }
        }
    }
}

/// Build system-level statistics from the linked pool.
///
/// Only classes that pass the data-class filter and actually carry methods
/// are counted, so the overview matches what the detail report renders.
pub fn build_summary(pool: &ComponentPool) -> Summary {
    let mut summary = Summary {
        analysis_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        ..Default::default()
    };

    for class_id in pool.class_ids() {
        let node = pool.node(class_id);

        if is_model_class(&node.id) {
            continue;
        }
        if node.children.is_empty() {
            continue;
        }

        match node.kind {
            NodeKind::Controller => summary.total_controllers += 1,
            NodeKind::Service => summary.total_services += 1,
            NodeKind::Mapper => summary.total_mappers += 1,
            NodeKind::Util => summary.total_utils += 1,
            NodeKind::Sql => {}
        }
    }

    summary.total_sqls = pool.sql_count();
    summary
}
