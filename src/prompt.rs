//! Prompt construction for the generation backend. Pure string composition:
//! a fixed preamble per intent, the serialized data payload, and a closing
//! instruction. Only the generic metadata branches (fallback and keyword
//! filter) cap the payload length.

/// Hard cap on the serialized data segment of the generic metadata prompt.
pub const MAX_PAYLOAD_LEN: usize = 4000;
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Truncation law: payloads longer than the cap are cut to exactly the
/// first `MAX_PAYLOAD_LEN` characters with the marker appended; shorter
/// payloads pass through verbatim.
pub fn cap_payload(payload: &str) -> String {
    if payload.chars().count() <= MAX_PAYLOAD_LEN {
        return payload.to_string();
    }
    let mut out: String = payload.chars().take(MAX_PAYLOAD_LEN).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

pub fn record_counts(counts_json: &str) -> String {
    format!(
        "Below is the approximate record count for tables in our PostgreSQL database:\n\n\
         {counts_json}\n\n\
         Based on the above data, please identify the top 10 tables with the highest record \
         counts and provide any insights or recommendations for performance tuning."
    )
}

pub fn schema_count_all(table_count: usize) -> String {
    format!("According to the metadata, there are {table_count} tables in the database.")
}

pub fn schema_count(schema: &str, table_count: usize) -> String {
    format!(
        "According to the metadata, there are {table_count} tables in the \"{schema}\" schema."
    )
}

pub fn slow_queries(performance_json: &str) -> String {
    format!(
        "Below is performance data from pg_stat_statements for our PostgreSQL database:\n\n\
         {performance_json}\n\n\
         Based on the above data, please identify the top 10 slow queries by average execution \
         time and provide specific performance tuning recommendations (for example, suggestions \
         for adding indexes, rewriting queries, or adjusting configuration settings)."
    )
}

pub fn frequent_slow_queries(performance_json: &str) -> String {
    format!(
        "Below is performance data from pg_stat_statements showing frequently executed slow \
         queries:\n\n\
         {performance_json}\n\n\
         Based on the above data, please identify the queries that are most frequently slow and \
         suggest specific tuning recommendations."
    )
}

pub fn active_sessions(activity_json: &str) -> String {
    format!(
        "Below is a list of currently active queries from pg_stat_activity:\n\n\
         {activity_json}\n\n\
         Based on the above data, please provide an analysis of the active queries and suggest \
         any performance improvements."
    )
}

/// Single table with the highest index count in a schema, or an explicit
/// statement that the schema has no index data at all.
pub fn index_extreme(schema: &str, top: Option<(&str, usize)>) -> String {
    match top {
        Some((table, count)) => format!(
            "Based on the index data for the {schema} schema, the table with the highest index \
             count is:\n\n\
             {table} with {count} indexes.\n\n\
             Please provide any recommendations for index optimization if applicable."
        ),
        None => format!("No index data found for the {schema} schema."),
    }
}

/// Tables in a schema owning no index, or an explicit all-indexed statement.
pub fn zero_index(schema: &str, tables_json: Option<&str>) -> String {
    match tables_json {
        Some(json) => format!(
            "Below is the list of tables in the {schema} schema that have zero indexes according \
             to the metadata:\n\n\
             {json}\n\n\
             Based on this information, please provide any recommendations for indexing these \
             tables if appropriate."
        ),
        None => format!(
            "All tables in the {schema} schema have at least one index according to the metadata."
        ),
    }
}

pub fn index_report(index_json: &str) -> String {
    format!(
        "Below is the index information from pg_indexes for our PostgreSQL database:\n\n\
         {index_json}\n\n\
         Based on the above information, analyze the current index structure. Identify any \
         indexes that are missing, redundant, or underutilized, and provide specific \
         recommendations for index optimization."
    )
}

/// Generic metadata prompt used by the keyword filter and the fallback.
/// The only branch that enforces the payload cap.
pub fn metadata_overview(user_query: &str, metadata_json: &str) -> String {
    let capped = cap_payload(metadata_json);
    format!(
        "You are an expert database analyst. Below is the full PostgreSQL metadata (including \
         columns, indexes, and constraints) in JSON format:\n\n\
         {capped}\n\n\
         User Query: {user_query}\n\n\
         Based on the metadata, please provide a clear, concise answer."
    )
}
