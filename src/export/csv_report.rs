use std::path::PathBuf;

use crate::config::Config;
use crate::core::{ComponentPool, EndpointDef, Summary};
use crate::error::Result;

use super::{flatten_tree, is_exportable, FlattenedRow};

/// Emits the tabular call-chain report as CSV.
///
/// Layout follows the spreadsheet the tool is usually read through: per
/// controller a header row, then the business stream (service, mapper, SQL)
/// depth-first, then the utility stream, with the indent level in its own
/// column so the chain shape survives the flat format.
pub struct CsvExporter;

const HEADERS: [&str; 8] = [
    "Type",
    "Depth",
    "Package",
    "Method/ID",
    "URL",
    "Params (Input)",
    "Return/Detail (Output)",
    "Comment",
];

impl super::Exporter for CsvExporter {
    fn format_name(&self) -> &'static str {
        "csv"
    }

    fn export(
        &self,
        summary: &Summary,
        pool: &ComponentPool,
        _endpoints: &[EndpointDef],
        config: &Config,
    ) -> Result<PathBuf> {
        let output_path = config.output_base().with_extension("csv");
        let mut writer = csv::Writer::from_path(&output_path)?;

        // Leading summary block keeps the single-file report self-contained
        writer.write_record(["Metric", "Count", "", "", "", "", "", ""])?;
        let metrics = [
            ("Total Controllers", summary.total_controllers),
            ("Total Services", summary.total_services),
            ("Total Mappers", summary.total_mappers),
            ("Total SQL Queries", summary.total_sqls),
            ("Total Utils", summary.total_utils),
        ];
        for (label, count) in metrics {
            let count = count.to_string();
            writer.write_record([label, count.as_str(), "", "", "", "", "", ""])?;
        }
        writer.write_record(["", "", "", "", "", "", "", ""])?;

        writer.write_record(HEADERS)?;

        for class_id in pool.class_ids() {
            let controller = pool.node(class_id);
            if !controller.is_controller() {
                continue;
            }

            let (main_stream, util_stream) = flatten_tree(pool, class_id);

            let valid_main: Vec<&FlattenedRow> = main_stream
                .iter()
                .filter(|row| is_exportable(pool.node(row.node)))
                .collect();
            let valid_util: Vec<&FlattenedRow> = util_stream
                .iter()
                .filter(|row| is_exportable(pool.node(row.node)))
                .collect();

            // Empty shells get no header row
            if valid_main.is_empty() && valid_util.is_empty() {
                continue;
            }

            let kind_label = format!("[{}]", controller.kind);
            writer.write_record([
                kind_label.as_str(),
                "0",
                controller.package.as_str(),
                controller.method.as_str(),
                controller.url.as_str(),
                controller.params.as_str(),
                controller.return_detail.as_str(),
                controller.comment.as_str(),
            ])?;

            for row in &valid_main {
                write_node_row(&mut writer, pool, row)?;
            }

            if !valid_util.is_empty() {
                if !valid_main.is_empty() {
                    writer.write_record(["", "", "", "", "", "", "", ""])?;
                }
                for row in &valid_util {
                    write_node_row(&mut writer, pool, row)?;
                }
            }
        }

        writer.flush()?;
        Ok(output_path)
    }
}

fn write_node_row(
    writer: &mut csv::Writer<std::fs::File>,
    pool: &ComponentPool,
    row: &FlattenedRow,
) -> Result<()> {
    let node = pool.node(row.node);

    let package_or_file = if node.package.is_empty() {
        node.file.as_str()
    } else {
        node.package.as_str()
    };

    let comment = if node.is_util() && node.comment.trim().is_empty() {
        "[Ref] Used in this flow"
    } else {
        node.comment.as_str()
    };

    let kind_label = format!("[{}]", node.kind);
    let depth = row.indent.to_string();
    writer.write_record([
        kind_label.as_str(),
        depth.as_str(),
        package_or_file,
        node.method.as_str(),
        node.url.as_str(),
        node.params.as_str(),
        node.return_detail.as_str(),
        comment,
    ])?;

    Ok(())
}
