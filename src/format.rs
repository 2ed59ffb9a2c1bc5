//! Text rendering of command results.

use comfy_table::{Cell, ContentArrangement, Table};

use crate::commands::DbResult;
use crate::db_types::{Column, Row};

pub const FAREWELL: &str = "Goodbye.";

pub const HELP_TEXT: &str = "\
*** Record store ***

Commands:
  create_table <table> <column:type> ..     create a table (types: int, str, bool)
  drop_table <table>                        drop a table
  list_tables                               list all tables
  insert into <table> values (<v1>, ...)    add a record
  select from <table> [where <col> = <v>]   show records
  update <table> set <col> = <v> where <col> = <v>
                                            change matching records
  delete from <table> where <col> = <v>     remove matching records
  info <table>                              show table details
  help                                      show this help
  exit                                      quit";

pub fn render(result: &DbResult) -> String {
    match result {
        DbResult::Created { table, columns } => format!(
            "Table \"{table}\" created with columns: {}",
            columns
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        DbResult::Dropped { table } => format!("Table \"{table}\" dropped."),
        DbResult::Tables(tables) if tables.is_empty() => "No tables created.".to_string(),
        DbResult::Tables(tables) => tables
            .iter()
            .map(|t| format!("- {t}"))
            .collect::<Vec<_>>()
            .join("\n"),
        DbResult::Inserted { table, id } => {
            format!("Record with ID={id} added to table \"{table}\".")
        }
        DbResult::Rows { rows, .. } if rows.is_empty() => "No records found.".to_string(),
        DbResult::Rows { columns, rows } => render_rows(columns, rows),
        DbResult::Updated { count: 0, .. } => "No records found to update.".to_string(),
        DbResult::Updated { table, count } => {
            format!("Updated {count} record(s) in table \"{table}\".")
        }
        DbResult::Deleted { count: 0, .. } => "No records found to delete.".to_string(),
        DbResult::Deleted { table, count } => {
            format!("Deleted {count} record(s) from table \"{table}\".")
        }
        DbResult::Info(info) => format!(
            "Table: {}\nColumns: {}\nRecords: {}",
            info.name, info.columns, info.row_count
        ),
        DbResult::Help => HELP_TEXT.to_string(),
        DbResult::Exit => FAREWELL.to_string(),
    }
}

fn render_rows(columns: &[Column], rows: &[Row]) -> String {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_header(columns.iter().map(|c| Cell::new(&c.name)));

    for row in rows {
        table.add_row(columns.iter().map(|c| {
            Cell::new(row.get(&c.name).map(ToString::to_string).unwrap_or_default())
        }));
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_types::{ColumnType, Value};
    use crate::rows::TableInfo;

    #[test]
    fn test_confirmations() {
        assert_eq!(
            render(&DbResult::Inserted {
                table: "users".into(),
                id: 7
            }),
            "Record with ID=7 added to table \"users\"."
        );
        assert_eq!(
            render(&DbResult::Created {
                table: "users".into(),
                columns: vec![Column::id(), Column::new("name", ColumnType::Str)],
            }),
            "Table \"users\" created with columns: ID:int, name:str"
        );
        assert_eq!(
            render(&DbResult::Updated {
                table: "users".into(),
                count: 0
            }),
            "No records found to update."
        );
        assert_eq!(
            render(&DbResult::Deleted {
                table: "users".into(),
                count: 2
            }),
            "Deleted 2 record(s) from table \"users\"."
        );
    }

    #[test]
    fn test_empty_states() {
        assert_eq!(render(&DbResult::Tables(vec![])), "No tables created.");
        assert_eq!(
            render(&DbResult::Tables(vec!["a".into(), "b".into()])),
            "- a\n- b"
        );
        assert_eq!(
            render(&DbResult::Rows {
                columns: vec![Column::id()],
                rows: vec![]
            }),
            "No records found."
        );
    }

    #[test]
    fn test_rows_table_uses_schema_order() {
        let columns = vec![Column::id(), Column::new("name", ColumnType::Str)];
        let rows = vec![
            Row::new()
                .with("name", Value::Str("Alice".into()))
                .with("ID", Value::Int(1)),
        ];
        let out = render(&DbResult::Rows { columns, rows });

        let header = out.lines().nth(1).unwrap();
        assert!(header.find("ID").unwrap() < header.find("name").unwrap());
        assert!(out.contains("Alice"));
    }

    #[test]
    fn test_info() {
        let out = render(&DbResult::Info(TableInfo {
            name: "users".into(),
            columns: "ID:int, name:str".into(),
            row_count: 3,
        }));
        assert_eq!(out, "Table: users\nColumns: ID:int, name:str\nRecords: 3");
    }
}
