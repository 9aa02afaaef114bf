//! Intent classification: decides, from a raw query string, which catalog
//! or statistics data to fetch and whether to route to direct SQL execution
//! or to prompt construction.
//!
//! `detect` is a pure first-match cascade over a fixed rule order; `classify`
//! runs the matched rule's handler, which may fetch live catalog data. The
//! two schema-specific index rules are parameterized on the schema named in
//! the query (`in <schema> schema`) and are checked before the plain
//! schema-count rule, otherwise that more general pattern would shadow them.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::catalog::{Catalog, IndexRow};
use crate::error::Result;
use crate::metadata::{self, Metadata};
use crate::prompt;

static SELECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*select").unwrap());
static SCHEMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"in\s+["']?(\w+)["']?\s+schema"#).unwrap());
static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"tables\s+with\s+(\w+)").unwrap());

/// Classified purpose of a user query. Exactly one per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    DirectSql,
    RecordCountRanking,
    SchemaIndexExtreme { schema: String },
    SchemaZeroIndex { schema: String },
    SchemaTableCount { schema: String },
    SlowQueryReport,
    FrequentSlowQueryReport,
    ActiveSessionReport,
    IndexReport,
    KeywordTableFilter { keyword: String },
    MetadataSummary,
}

/// Classification result: ready-to-run SQL, or a finished prompt for the
/// generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Sql(String),
    Prompt(String),
}

/// Pick the intent for a query. Pure and infallible; the rule order is
/// fixed and the first match wins.
pub fn detect(query: &str) -> Intent {
    if SELECT_RE.is_match(query) {
        return Intent::DirectSql;
    }
    let lower = query.to_lowercase();
    if lower.contains("record count") {
        return Intent::RecordCountRanking;
    }
    if let Some(cap) = SCHEMA_RE.captures(&lower) {
        let schema = cap[1].to_string();
        let superlative =
            lower.contains("more") || lower.contains("highest") || lower.contains("most");
        if lower.contains("index") && superlative {
            return Intent::SchemaIndexExtreme { schema };
        }
        if lower.contains("zero index") {
            return Intent::SchemaZeroIndex { schema };
        }
        return Intent::SchemaTableCount { schema };
    }
    if lower.contains("slow quer") {
        return Intent::SlowQueryReport;
    }
    if lower.contains("frequent") && lower.contains("slow") {
        return Intent::FrequentSlowQueryReport;
    }
    if lower.contains("active query") || lower.contains("pg_stat_activity") {
        return Intent::ActiveSessionReport;
    }
    if lower.contains("index") {
        return Intent::IndexReport;
    }
    if let Some(cap) = KEYWORD_RE.captures(&lower) {
        return Intent::KeywordTableFilter { keyword: cap[1].to_string() };
    }
    Intent::MetadataSummary
}

/// Run the handler for the detected intent. Classification itself cannot
/// fail; errors come only from the underlying catalog fetches and propagate
/// unchanged.
pub async fn classify(query: &str, md: &Metadata, catalog: &Catalog) -> Result<Response> {
    let intent = detect(query);
    debug!(?intent, "classified query");
    let response = match intent {
        Intent::DirectSql => Response::Sql(query.to_string()),

        Intent::RecordCountRanking => {
            let counts = catalog.fetch_table_counts().await?;
            let top = top_counts(counts);
            Response::Prompt(prompt::record_counts(&to_json(&top)))
        }

        Intent::SchemaIndexExtreme { schema } => {
            let indexes = catalog.fetch_indexes().await?;
            let top = index_extreme_top(&indexes, &schema);
            Response::Prompt(prompt::index_extreme(
                &schema,
                top.as_ref().map(|(t, n)| (t.as_str(), *n)),
            ))
        }

        Intent::SchemaZeroIndex { schema } => {
            let indexes = catalog.fetch_indexes().await?;
            let zero = zero_index_tables(md, &indexes, &schema);
            let payload = if zero.is_empty() { None } else { Some(to_json(&zero)) };
            Response::Prompt(prompt::zero_index(&schema, payload.as_deref()))
        }

        Intent::SchemaTableCount { schema } => {
            Response::Prompt(schema_count_prompt(md, &schema))
        }

        Intent::SlowQueryReport => {
            let slow = catalog.fetch_slow_queries().await?;
            Response::Prompt(prompt::slow_queries(&to_json(&slow)))
        }

        Intent::FrequentSlowQueryReport => {
            let freq = catalog.fetch_frequent_slow_queries().await?;
            Response::Prompt(prompt::frequent_slow_queries(&to_json(&freq)))
        }

        Intent::ActiveSessionReport => {
            let activity = catalog.fetch_active_sessions().await?;
            Response::Prompt(prompt::active_sessions(&to_json(&activity)))
        }

        Intent::IndexReport => {
            let indexes = catalog.fetch_indexes().await?;
            Response::Prompt(prompt::index_report(&to_json(&indexes)))
        }

        Intent::KeywordTableFilter { keyword } => {
            let filtered = metadata::filter_by_keyword(md, &keyword);
            Response::Prompt(prompt::metadata_overview(query, &to_json(&filtered)))
        }

        Intent::MetadataSummary => {
            let names = metadata::summarize(md);
            Response::Prompt(prompt::metadata_overview(query, &to_json(&names)))
        }
    };
    Ok(response)
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

/// Top 10 (qualified name, approximate count) pairs, descending by count.
pub fn top_counts(mut counts: Vec<(String, i64)>) -> Vec<(String, i64)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(10);
    counts
}

/// Table with the most indexes in `schema`, counted over the fetched index
/// rows. Ties resolve to the first table in lexicographic order. `None`
/// when the schema owns no indexes at all.
pub fn index_extreme_top(indexes: &[IndexRow], schema: &str) -> Option<(String, usize)> {
    let mut per_table: BTreeMap<String, usize> = BTreeMap::new();
    for row in indexes.iter().filter(|r| r.schema.eq_ignore_ascii_case(schema)) {
        *per_table.entry(row.qualified_table()).or_insert(0) += 1;
    }
    let mut top: Option<(String, usize)> = None;
    for (table, count) in per_table {
        match &top {
            Some((_, best)) if count <= *best => {}
            _ => top = Some((table, count)),
        }
    }
    top
}

/// Tables of `schema` present in the metadata that own no index according
/// to the fetched index rows.
pub fn zero_index_tables(md: &Metadata, indexes: &[IndexRow], schema: &str) -> Vec<String> {
    let indexed: HashSet<String> = indexes
        .iter()
        .filter(|r| r.schema.eq_ignore_ascii_case(schema))
        .map(|r| r.qualified_table().to_lowercase())
        .collect();
    metadata::tables_in_schema(md, schema)
        .into_iter()
        .filter(|name| !indexed.contains(&name.to_lowercase()))
        .cloned()
        .collect()
}

/// Count-only prompt: "all"/"entire" reports the whole database, anything
/// else reports the named schema (zero when absent).
pub fn schema_count_prompt(md: &Metadata, schema: &str) -> String {
    if schema.eq_ignore_ascii_case("all") || schema.eq_ignore_ascii_case("entire") {
        prompt::schema_count_all(md.len())
    } else {
        prompt::schema_count(schema, metadata::count_in_schema(md, schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnRow;

    fn col(schema: &str, table: &str) -> ColumnRow {
        ColumnRow {
            schema: schema.into(),
            table: table.into(),
            column: "id".into(),
            data_type: "integer".into(),
        }
    }

    fn idx(schema: &str, table: &str, name: &str) -> IndexRow {
        IndexRow {
            schema: schema.into(),
            table: table.into(),
            name: name.into(),
            definition: format!("CREATE INDEX {} ON {}.{} (id)", name, schema, table),
        }
    }

    #[test]
    fn select_wins_over_every_other_keyword() {
        assert_eq!(detect("select * from index_log"), Intent::DirectSql);
        assert_eq!(detect("  SELECT count(*) FROM slow_queries"), Intent::DirectSql);
        assert_eq!(detect("SELECT 1"), Intent::DirectSql);
    }

    #[test]
    fn record_count_ranks_before_schema_rules() {
        assert_eq!(detect("show record count in sales schema"), Intent::RecordCountRanking);
        assert_eq!(detect("tables with high record count"), Intent::RecordCountRanking);
    }

    #[test]
    fn schema_index_rules_win_over_plain_schema_count() {
        assert_eq!(
            detect("list the table in sales schema which has more indexes"),
            Intent::SchemaIndexExtreme { schema: "sales".into() }
        );
        assert_eq!(
            detect("which table has the highest index count in 'billing' schema"),
            Intent::SchemaIndexExtreme { schema: "billing".into() }
        );
        assert_eq!(
            detect("list a table which has got zero indexes in audit schema"),
            Intent::SchemaZeroIndex { schema: "audit".into() }
        );
        assert_eq!(
            detect("how many tables in finance schema"),
            Intent::SchemaTableCount { schema: "finance".into() }
        );
        assert_eq!(
            detect("How many tables in all schema"),
            Intent::SchemaTableCount { schema: "all".into() }
        );
    }

    #[test]
    fn performance_rules_in_fixed_order() {
        assert_eq!(detect("show me the slow queries"), Intent::SlowQueryReport);
        // "slow quer" wins when both substrings are present
        assert_eq!(detect("frequent slow queries"), Intent::SlowQueryReport);
        assert_eq!(detect("frequently slow statements"), Intent::FrequentSlowQueryReport);
        assert_eq!(detect("any active query right now?"), Intent::ActiveSessionReport);
        assert_eq!(detect("dump pg_stat_activity"), Intent::ActiveSessionReport);
    }

    #[test]
    fn general_index_and_keyword_and_fallback() {
        assert_eq!(detect("review our indexes"), Intent::IndexReport);
        assert_eq!(
            detect("tables with email"),
            Intent::KeywordTableFilter { keyword: "email".into() }
        );
        assert_eq!(detect("what does this database contain?"), Intent::MetadataSummary);
        assert_eq!(detect(""), Intent::MetadataSummary);
    }

    #[test]
    fn detect_is_pure() {
        let q = "tables with email";
        assert_eq!(detect(q), detect(q));
    }

    #[test]
    fn top_counts_sorts_descending_and_caps_at_ten() {
        let counts: Vec<(String, i64)> =
            (0..15).map(|i| (format!("public.t{:02}", i), i as i64)).collect();
        let top = top_counts(counts);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0], ("public.t14".to_string(), 14));
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn record_count_payload_is_json_array_of_pairs() {
        let top = top_counts(vec![
            ("public.big".into(), 1000),
            ("public.small".into(), 1),
        ]);
        let json = serde_json::to_string_pretty(&top).unwrap();
        let parsed: Vec<(String, i64)> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0].0, "public.big");
        assert_eq!(parsed[0].1, 1000);
    }

    #[test]
    fn index_extreme_counts_per_table_and_breaks_ties_deterministically() {
        let rows = vec![
            idx("sales", "orders", "orders_pkey"),
            idx("sales", "orders", "orders_date_idx"),
            idx("sales", "items", "items_pkey"),
            idx("sales", "items", "items_sku_idx"),
            idx("other", "orders", "other_pkey"),
        ];
        // items and orders tie at 2; lexicographic order picks items first
        let top = index_extreme_top(&rows, "sales").unwrap();
        assert_eq!(top, ("sales.items".to_string(), 2));
        assert!(index_extreme_top(&rows, "empty").is_none());
    }

    #[test]
    fn zero_index_is_a_set_difference_scoped_to_the_schema() {
        let md = metadata::build(
            &[col("audit", "log"), col("audit", "trail"), col("public", "users")],
            &[],
            &[],
        );
        let rows = vec![idx("audit", "log", "log_pkey")];
        let zero = zero_index_tables(&md, &rows, "audit");
        assert_eq!(zero, vec!["audit.trail".to_string()]);

        // Every table indexed -> empty difference
        let all = vec![idx("audit", "log", "log_pkey"), idx("audit", "trail", "trail_pkey")];
        assert!(zero_index_tables(&md, &all, "audit").is_empty());
    }

    #[test]
    fn schema_count_prompt_has_exact_sentences() {
        let md = metadata::build(
            &[col("public", "users"), col("public", "orders"), col("audit", "log")],
            &[],
            &[],
        );
        assert_eq!(
            schema_count_prompt(&md, "all"),
            "According to the metadata, there are 3 tables in the database."
        );
        assert_eq!(
            schema_count_prompt(&md, "entire"),
            "According to the metadata, there are 3 tables in the database."
        );
        assert_eq!(
            schema_count_prompt(&md, "public"),
            "According to the metadata, there are 2 tables in the \"public\" schema."
        );
        // Scenario E: empty metadata, unknown schema
        let empty = Metadata::new();
        assert_eq!(
            schema_count_prompt(&empty, "finance"),
            "According to the metadata, there are 0 tables in the \"finance\" schema."
        );
    }

    #[test]
    fn keyword_filter_payload_contains_only_matching_tables() {
        let md = metadata::build(
            &[col("public", "user_emails"), col("public", "orders")],
            &[],
            &[],
        );
        let filtered = metadata::filter_by_keyword(&md, "email");
        let json = serde_json::to_string_pretty(&filtered).unwrap();
        let p = prompt::metadata_overview("tables with email", &json);
        assert!(p.contains("public.user_emails"));
        assert!(!p.contains("public.orders"));
    }
}
