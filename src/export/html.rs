use std::collections::HashSet;
use std::path::PathBuf;
use tera::{Context, Tera};

use crate::config::Config;
use crate::core::{ComponentPool, EndpointDef, Summary};
use crate::error::Result;

const TEMPLATE: &str = include_str!("templates/api_report.html");

/// Renders the endpoint list as a self-contained Swagger-style HTML page.
pub struct HtmlExporter;

impl super::Exporter for HtmlExporter {
    fn format_name(&self) -> &'static str {
        "html"
    }

    fn export(
        &self,
        summary: &Summary,
        _pool: &ComponentPool,
        endpoints: &[EndpointDef],
        config: &Config,
    ) -> Result<PathBuf> {
        let html = render(summary, endpoints)?;

        let output_path = config.output_base().with_extension("html");
        std::fs::write(&output_path, html)?;

        Ok(output_path)
    }
}

pub fn render(summary: &Summary, endpoints: &[EndpointDef]) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template("api_report", TEMPLATE)?;

    // Stats come from the visible endpoints, not global pool counts, so the
    // overview never disagrees with the content below it
    let controllers: HashSet<&str> = endpoints
        .iter()
        .map(|e| e.controller_name.as_str())
        .collect();

    let mut context = Context::new();
    context.insert("analysis_date", &summary.analysis_date);
    context.insert("total_endpoints", &endpoints.len());
    context.insert("total_controllers", &controllers.len());
    context.insert("endpoints", endpoints);

    Ok(tera.render("api_report", &context)?)
}
