//! Table formatting utilities for CLI output.

use std::path::Path;

use comfy_table::{ContentArrangement, Table, presets};
use pmd::Metadata;

/// Format template metadata as an ASCII table, one row per key.
pub fn format_metadata_table(templates: &[(&Path, &Metadata)]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Template", "Key", "Value"]);

    for (path, metadata) in templates {
        if metadata.is_empty() {
            table.add_row(vec![path.display().to_string(), "-".into(), String::new()]);
        }
        for (key, value) in *metadata {
            table.add_row(vec![path.display().to_string(), key.clone(), value.clone()]);
        }
    }

    table
}

/// Format template check results as an ASCII table.
pub fn format_check_table(results: &[(&Path, Option<String>)]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Template", "Status"]);

    for (path, error) in results {
        let status = error.clone().unwrap_or_else(|| "ok".to_string());
        table.add_row(vec![path.display().to_string(), status]);
    }

    table
}
