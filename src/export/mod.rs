mod csv_report;
mod html;
mod openapi;

use std::path::PathBuf;

use crate::config::Config;
use crate::core::{is_model_class, ComponentPool, EndpointDef, Node, NodeId, Summary};
use crate::error::Result;

pub use csv_report::CsvExporter;
pub use html::HtmlExporter;
pub use openapi::OpenApiExporter;

/// Unified interface for all reporting strategies
pub trait Exporter {
    fn format_name(&self) -> &'static str;

    /// Write one report file; returns the path written
    fn export(
        &self,
        summary: &Summary,
        pool: &ComponentPool,
        endpoints: &[EndpointDef],
        config: &Config,
    ) -> Result<PathBuf>;
}

/// Resolve requested format names to exporters, ignoring duplicates and
/// unknown names
pub fn exporters_for(formats: &[String]) -> Vec<Box<dyn Exporter>> {
    let mut exporters: Vec<Box<dyn Exporter>> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for format in formats {
        let format = format.trim().to_lowercase();
        if format.is_empty() || seen.contains(&format) {
            continue;
        }
        seen.push(format.clone());

        match format.as_str() {
            "csv" | "excel" | "table" => exporters.push(Box::new(CsvExporter)),
            "html" => exporters.push(Box::new(HtmlExporter)),
            "openapi" | "swagger" | "json" => exporters.push(Box::new(OpenApiExporter)),
            _ => {}
        }
    }

    exporters
}

/// Names that must never surface in rendered reports: the strict filter
/// shared across all exporters
pub fn is_noise(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return true;
    }

    let lower = trimmed.to_lowercase();

    const KEYWORDS: [&str; 16] = [
        "if", "else", "switch", "case", "for", "while", "do", "return", "new", "throw", "throws",
        "try", "catch", "finally", "break", "continue",
    ];
    if KEYWORDS.contains(&lower.as_str()) {
        return true;
    }

    if trimmed.ends_with("Exception") {
        return true;
    }

    matches!(lower.as_str(), "modelandview" | "model" | "void" | "string")
}

/// A node paired with its call-chain indent level for linear rendering
pub struct FlattenedRow {
    pub node: NodeId,
    pub indent: usize,
}

/// Flatten a controller subtree depth-first, separating utility nodes from
/// the business stream. Utility children stay in the utility stream to
/// preserve their context.
pub fn flatten_tree(pool: &ComponentPool, root: NodeId) -> (Vec<FlattenedRow>, Vec<FlattenedRow>) {
    let mut main = Vec::new();
    let mut utils = Vec::new();
    let mut path = Vec::new();

    for &child in &pool.node(root).children {
        traverse(pool, child, 1, &mut main, &mut utils, false, &mut path);
    }

    (main, utils)
}

fn traverse(
    pool: &ComponentPool,
    node_id: NodeId,
    indent: usize,
    main: &mut Vec<FlattenedRow>,
    utils: &mut Vec<FlattenedRow>,
    in_util_stream: bool,
    path: &mut Vec<NodeId>,
) {
    // The call graph may contain cycles (mutual recursion); stop a branch
    // when it revisits a node already on the current path
    if path.contains(&node_id) {
        return;
    }

    let node = pool.node(node_id);
    let is_util = node.is_util() || in_util_stream;

    let row = FlattenedRow { node: node_id, indent };
    if is_util {
        utils.push(row);
    } else {
        main.push(row);
    }

    path.push(node_id);
    for &child in &node.children {
        traverse(pool, child, indent + 1, main, utils, is_util, path);
    }
    path.pop();
}

/// A node worth a report row: named, not noise, not a data class, and for
/// utilities only when they lead somewhere
pub fn is_exportable(node: &Node) -> bool {
    if node.method.trim().is_empty() {
        return false;
    }

    if is_noise(&node.method) {
        return false;
    }

    if is_model_class(&node.id) {
        return false;
    }

    if node.is_util() && node.children.is_empty() {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_filter_rejects_keywords_and_exceptions() {
        assert!(is_noise(""));
        assert!(is_noise("   "));
        assert!(is_noise("if"));
        assert!(is_noise("Return"));
        assert!(is_noise("NotFoundException"));
        assert!(is_noise("ModelAndView"));
        assert!(!is_noise("processUser"));
        assert!(!is_noise("selectUserByCredentials"));
    }

    #[test]
    fn format_registry_dedupes_and_ignores_unknown() {
        let formats = vec![
            "csv".to_string(),
            "CSV".to_string(),
            "html".to_string(),
            "docx".to_string(),
            "openapi".to_string(),
        ];
        let exporters = exporters_for(&formats);
        assert_eq!(exporters.len(), 3);
        assert_eq!(exporters[0].format_name(), "csv");
        assert_eq!(exporters[1].format_name(), "html");
        assert_eq!(exporters[2].format_name(), "openapi");
    }
}
