//! Unified error model for the assistant core.
//! Connection failures are fatal at startup; catalog and SQL failures are
//! surfaced per call with no retry. Generation-backend failures never reach
//! this taxonomy: `llm::LlmClient::generate` converts them to plain strings
//! so the interactive loop always completes a cycle.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Could not establish the database session. Fatal at startup.
    #[error("database connection failed: {0}")]
    Connection(#[source] tokio_postgres::Error),

    /// A catalog or statistics fetch failed. All-or-nothing per call.
    #[error("catalog access failed: {0}")]
    Catalog(#[source] tokio_postgres::Error),

    /// A caller-supplied SQL statement failed to execute. A statement that
    /// produces no result set is not an error (it yields `Ok(None)`).
    #[error("sql execution failed: {0}")]
    Sql(#[source] tokio_postgres::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
