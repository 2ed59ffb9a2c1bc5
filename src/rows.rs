//! Operations over one table's row collection.
//!
//! Rows are kept in insertion order. None of these functions touch storage;
//! the caller loads the collection, applies one operation and persists it.

use crate::db_types::{ID_COLUMN, Row, Value};
use crate::error::DbError;
use crate::predicate::Predicate;
use crate::registry::Schema;

/// Descriptive projection returned by `info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: String,
    pub row_count: usize,
}

/// Next identity: highest existing ID plus one, or 1 for an empty table.
///
/// IDs are not monotonic across deletions: removing the row with the
/// highest ID makes the next insert reuse it. An ID can be set to any
/// integer by `update`, so `i64::MAX` leaves no successor.
pub fn next_id(rows: &[Row]) -> Result<i64, DbError> {
    match rows.iter().filter_map(Row::id).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or(DbError::IdExhausted(max)),
    }
}

/// Parses raw tokens against the schema and appends the new row.
pub fn insert<S: AsRef<str>>(
    schema: &Schema,
    rows: &mut Vec<Row>,
    raw_values: &[S],
) -> Result<Row, DbError> {
    let columns: Vec<_> = schema.columns_excluding_id().collect();
    if raw_values.len() != columns.len() {
        return Err(DbError::ArityMismatch {
            expected: columns.len(),
            actual: raw_values.len(),
        });
    }

    let values = columns
        .iter()
        .zip(raw_values)
        .map(|(column, raw)| column.coerce(raw.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    insert_values(schema, rows, values)
}

/// Appends a row built from already typed values, checked kind by kind.
pub fn insert_values(
    schema: &Schema,
    rows: &mut Vec<Row>,
    values: Vec<Value>,
) -> Result<Row, DbError> {
    let columns: Vec<_> = schema.columns_excluding_id().collect();
    if values.len() != columns.len() {
        return Err(DbError::ArityMismatch {
            expected: columns.len(),
            actual: values.len(),
        });
    }
    for (value, column) in values.iter().zip(&columns) {
        column.check(value)?;
    }

    let mut row = Row::new().with(ID_COLUMN, Value::Int(next_id(rows)?));
    for (column, value) in columns.into_iter().zip(values) {
        row.set(column.name.clone(), value);
    }

    rows.push(row.clone());
    Ok(row)
}

/// All rows, or those matching `filter`, in stored order.
pub fn select<'a>(rows: &'a [Row], filter: Option<&Predicate>) -> Vec<&'a Row> {
    match filter {
        None => rows.iter().collect(),
        Some(filter) => rows.iter().filter(|row| filter.matches(row)).collect(),
    }
}

/// Applies `set` to every row matching `filter`. Without a filter nothing
/// is updated. The assigned value is not checked against the schema.
pub fn update(rows: &mut [Row], set: &Predicate, filter: Option<&Predicate>) -> usize {
    let Some(filter) = filter else {
        return 0;
    };

    let mut updated = 0;
    for row in rows.iter_mut().filter(|row| filter.matches(row)) {
        row.set(set.column.clone(), set.value.clone());
        updated += 1;
    }
    updated
}

/// Removes rows matching `filter`; without a filter every row goes.
pub fn delete(rows: &mut Vec<Row>, filter: Option<&Predicate>) -> usize {
    let before = rows.len();
    match filter {
        None => rows.clear(),
        Some(filter) => rows.retain(|row| !filter.matches(row)),
    }
    before - rows.len()
}

pub fn table_info(name: &str, schema: &Schema, rows: &[Row]) -> TableInfo {
    TableInfo {
        name: name.to_string(),
        columns: schema.summary(),
        row_count: rows.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_types::ColumnType;
    use crate::registry::Registry;

    fn users() -> Schema {
        let mut registry = Registry::default();
        registry
            .create_table("users", &["name:str", "age:int", "active:bool"])
            .unwrap()
            .clone()
    }

    fn seeded() -> (Schema, Vec<Row>) {
        let schema = users();
        let mut rows = Vec::new();
        insert(&schema, &mut rows, &["\"Alice\"", "30", "true"]).unwrap();
        insert(&schema, &mut rows, &["Bob", "25", "false"]).unwrap();
        insert(&schema, &mut rows, &["'Carol'", "30", "true"]).unwrap();
        (schema, rows)
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let (_, rows) = seeded();
        let ids: Vec<_> = rows.iter().filter_map(Row::id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(
            rows[0],
            Row::new()
                .with("ID", Value::Int(1))
                .with("name", Value::Str("Alice".into()))
                .with("age", Value::Int(30))
                .with("active", Value::Bool(true))
        );
    }

    #[test]
    fn test_insert_reuses_highest_id_after_delete() {
        let (schema, mut rows) = seeded();
        let deleted = delete(&mut rows, Some(&Predicate::new("ID", Value::Int(3))));
        assert_eq!(deleted, 1);

        let row = insert(&schema, &mut rows, &["Dan", "40", "false"]).unwrap();
        assert_eq!(row.id(), Some(3));

        // A gap below the maximum is never filled.
        delete(&mut rows, Some(&Predicate::new("ID", Value::Int(1))));
        let row = insert(&schema, &mut rows, &["Eve", "22", "true"]).unwrap();
        assert_eq!(row.id(), Some(4));
    }

    #[test]
    fn test_insert_failures_store_nothing() {
        let (schema, mut rows) = seeded();
        let before = rows.clone();

        assert!(matches!(
            insert(&schema, &mut rows, &["Dan", "40"]),
            Err(DbError::ArityMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            insert(&schema, &mut rows, &["Dan", "forty", "true"]),
            Err(DbError::ParseError {
                expected: ColumnType::Int,
                ..
            })
        ));
        assert!(matches!(
            insert(&schema, &mut rows, &["Dan", "40", "maybe"]),
            Err(DbError::ParseError {
                expected: ColumnType::Bool,
                ..
            })
        ));
        assert!(matches!(
            insert_values(
                &schema,
                &mut rows,
                vec![Value::Str("Dan".into()), Value::Bool(true), Value::Bool(true)]
            ),
            Err(DbError::TypeMismatch { column, .. }) if column == "age"
        ));

        assert_eq!(rows, before);
    }

    #[test]
    fn test_insert_after_max_id_fails_cleanly() {
        let (schema, mut rows) = seeded();
        let first = Predicate::new("ID", Value::Int(1));
        let set = Predicate::new("ID", Value::Int(i64::MAX));
        assert_eq!(update(&mut rows, &set, Some(&first)), 1);
        let before = rows.clone();

        assert!(matches!(next_id(&rows), Err(DbError::IdExhausted(i64::MAX))));
        assert!(matches!(
            insert(&schema, &mut rows, &["Dan", "40", "false"]),
            Err(DbError::IdExhausted(_))
        ));
        assert_eq!(rows, before);

        // Negative IDs are fine; only the top of the range has no successor.
        let set = Predicate::new("ID", Value::Int(-5));
        let top = Predicate::new("ID", Value::Int(i64::MAX));
        update(&mut rows, &set, Some(&top));
        assert_eq!(next_id(&rows).unwrap(), 4);
    }

    #[test]
    fn test_select_with_and_without_filter() {
        let (_, rows) = seeded();
        assert_eq!(select(&rows, None).len(), 3);

        let thirty = Predicate::new("age", Value::Int(30));
        let found: Vec<_> = select(&rows, Some(&thirty))
            .into_iter()
            .filter_map(Row::id)
            .collect();
        assert_eq!(found, vec![1, 3]);

        let as_text = Predicate::new("age", Value::Str("30".into()));
        assert!(select(&rows, Some(&as_text)).is_empty());
        let unknown = Predicate::new("email", Value::Str("x".into()));
        assert!(select(&rows, Some(&unknown)).is_empty());
    }

    #[test]
    fn test_update_without_filter_is_noop() {
        let (_, mut rows) = seeded();
        let before = rows.clone();
        let set = Predicate::new("age", Value::Int(99));

        assert_eq!(update(&mut rows, &set, None), 0);
        assert_eq!(rows, before);
    }

    #[test]
    fn test_update_matching_rows_without_type_check() {
        let (_, mut rows) = seeded();
        let filter = Predicate::new("age", Value::Int(30));

        let set = Predicate::new("age", Value::Int(31));
        assert_eq!(update(&mut rows, &set, Some(&filter)), 2);
        assert_eq!(rows[0].get("age"), Some(&Value::Int(31)));
        assert_eq!(rows[1].get("age"), Some(&Value::Int(25)));
        assert_eq!(rows[2].get("age"), Some(&Value::Int(31)));

        // The schema says int; the store keeps whatever was assigned.
        let set = Predicate::new("age", Value::Str("old".into()));
        let bob = Predicate::new("name", Value::Str("Bob".into()));
        assert_eq!(update(&mut rows, &set, Some(&bob)), 1);
        assert_eq!(rows[1].get("age"), Some(&Value::Str("old".into())));
    }

    #[test]
    fn test_delete_without_filter_removes_everything() {
        let (_, mut rows) = seeded();
        assert_eq!(delete(&mut rows, None), 3);
        assert!(rows.is_empty());
        assert_eq!(next_id(&rows).unwrap(), 1);
    }

    #[test]
    fn test_delete_keeps_survivor_order() {
        let (_, mut rows) = seeded();
        let bob = Predicate::new("name", Value::Str("Bob".into()));
        assert_eq!(delete(&mut rows, Some(&bob)), 1);
        let ids: Vec<_> = rows.iter().filter_map(Row::id).collect();
        assert_eq!(ids, vec![1, 3]);

        let nobody = Predicate::new("name", Value::Str("Zed".into()));
        assert_eq!(delete(&mut rows, Some(&nobody)), 0);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_table_info() {
        let (schema, rows) = seeded();
        let info = table_info("users", &schema, &rows);
        assert_eq!(info.name, "users");
        assert_eq!(info.columns, "ID:int, name:str, age:int, active:bool");
        assert_eq!(info.row_count, 3);
    }
}
