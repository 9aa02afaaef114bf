//! Aggregated table metadata: a map from qualified table name
//! (`schema.table`) to its columns, indexes and constraints, built once at
//! startup from three independently fetched catalog row sets and treated as
//! read-only afterwards.
//!
//! A `BTreeMap` keeps iteration deterministic (lexicographic by qualified
//! name); that order is the documented tie-break for unqualified table
//! lookups that match in more than one schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{ColumnRow, ConstraintRow, IndexRow};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexInfo {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstraintInfo {
    pub name: String,
    pub kind: String,
    pub definition: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableInfo {
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
    pub constraints: Vec<ConstraintInfo>,
}

pub type Metadata = BTreeMap<String, TableInfo>;

/// Merge the three catalog row sets into one map keyed by qualified name.
/// Column rows define which tables exist; a table absent from the index or
/// constraint rows simply gets empty vectors. Pure function of its inputs.
pub fn build(
    columns: &[ColumnRow],
    indexes: &[IndexRow],
    constraints: &[ConstraintRow],
) -> Metadata {
    let mut metadata = Metadata::new();
    for col in columns {
        let qualified = format!("{}.{}", col.schema, col.table);
        metadata
            .entry(qualified)
            .or_default()
            .columns
            .push(ColumnInfo { name: col.column.clone(), data_type: col.data_type.clone() });
    }
    for idx in indexes {
        let qualified = format!("{}.{}", idx.schema, idx.table);
        if let Some(entry) = lookup_mut(&mut metadata, &qualified) {
            entry.indexes.push(IndexInfo { name: idx.name.clone(), definition: idx.definition.clone() });
        }
    }
    for con in constraints {
        let qualified = format!("{}.{}", con.schema, con.table);
        if let Some(entry) = lookup_mut(&mut metadata, &qualified) {
            entry.constraints.push(ConstraintInfo {
                name: con.name.clone(),
                kind: con.kind.clone(),
                definition: con.definition.clone(),
            });
        }
    }
    metadata
}

fn lookup_mut<'a>(metadata: &'a mut Metadata, qualified: &str) -> Option<&'a mut TableInfo> {
    // Fast path: exact key. Fallback: case-insensitive scan, since catalog
    // views can disagree on identifier casing for quoted names.
    if metadata.contains_key(qualified) {
        return metadata.get_mut(qualified);
    }
    let key = metadata
        .keys()
        .find(|k| k.eq_ignore_ascii_case(qualified))
        .cloned()?;
    metadata.get_mut(&key)
}

/// Resolve a possibly-unqualified table reference.
/// A name containing `.` must match a full qualified name exactly
/// (case-insensitive). A bare name matches any entry whose table segment
/// equals it case-insensitively; the first match in map order wins and
/// multi-schema ambiguity is not reported.
pub fn find_table<'a>(metadata: &'a Metadata, name: &str) -> Option<(&'a String, &'a TableInfo)> {
    if name.contains('.') {
        metadata.iter().find(|(qualified, _)| qualified.eq_ignore_ascii_case(name))
    } else {
        let suffix = format!(".{}", name.to_lowercase());
        metadata.iter().find(|(qualified, _)| qualified.to_lowercase().ends_with(&suffix))
    }
}

/// Subset of entries whose qualified name contains `keyword`
/// (case-insensitive substring match).
pub fn filter_by_keyword(metadata: &Metadata, keyword: &str) -> Metadata {
    let needle = keyword.to_lowercase();
    metadata
        .iter()
        .filter(|(name, _)| name.to_lowercase().contains(&needle))
        .map(|(name, info)| (name.clone(), info.clone()))
        .collect()
}

/// All qualified table names, no per-table data.
pub fn summarize(metadata: &Metadata) -> Vec<&String> {
    metadata.keys().collect()
}

/// Number of entries whose qualified name starts with `<schema>.`
/// (case-insensitive).
pub fn count_in_schema(metadata: &Metadata, schema: &str) -> usize {
    let prefix = format!("{}.", schema.to_lowercase());
    metadata.keys().filter(|name| name.to_lowercase().starts_with(&prefix)).count()
}

/// Qualified names of the entries in `schema`, in map order.
pub fn tables_in_schema<'a>(metadata: &'a Metadata, schema: &str) -> Vec<&'a String> {
    let prefix = format!("{}.", schema.to_lowercase());
    metadata.keys().filter(|name| name.to_lowercase().starts_with(&prefix)).collect()
}
