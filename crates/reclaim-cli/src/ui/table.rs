//! Disk-usage tables.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Table};
use reclaim_core::engine::{DiskUsageRow, FilesystemUsage};
use reclaim_core::snapshot::format_size;

/// Engine usage per resource type.
pub fn usage_table(rows: &[DiskUsageRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec!["TYPE", "TOTAL", "ACTIVE", "SIZE", "RECLAIMABLE"]);

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.kind),
            Cell::new(row.total_count).set_alignment(CellAlignment::Right),
            Cell::new(row.active).set_alignment(CellAlignment::Right),
            Cell::new(&row.size).set_alignment(CellAlignment::Right),
            Cell::new(&row.reclaimable).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Host filesystem usage as a single-row table.
pub fn filesystem_table(fs: &FilesystemUsage) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec!["FILESYSTEM", "SIZE", "USED", "AVAILABLE", "USE%", "MOUNTED ON"])
        .add_row(vec![
            Cell::new(&fs.filesystem),
            Cell::new(format_size(fs.size_kb * 1024)).set_alignment(CellAlignment::Right),
            Cell::new(format_size(fs.used_kb * 1024)).set_alignment(CellAlignment::Right),
            Cell::new(format_size(fs.available_kb * 1024)).set_alignment(CellAlignment::Right),
            Cell::new(&fs.capacity).set_alignment(CellAlignment::Right),
            Cell::new(&fs.mount),
        ]);
    table
}
