pub mod area;
pub mod assemble;
pub mod filter;
pub mod format;
pub mod search;

pub use filter::Filter;

use tracing::debug;

use crate::api::MailApi;
use crate::error::AppResult;

use area::project;
use format::{OutputBlock, render};
use search::ResultSet;

/// Presentation of results: where the output goes and what it looks like.
#[derive(Debug, Clone)]
pub struct Statement {
    /// Destination path, or [`STDOUT`] for standard output.
    pub output: String,
    /// Write each message to its own file instead of one delimited stream.
    pub split: bool,
    /// Serialization format, `json` or `txt`.
    pub format: String,
    /// Projection shape, one of `raw`, `all`, `small`, `easy`.
    pub area: String,
}

/// Sentinel output value meaning standard output.
pub const STDOUT: &str = "stdout";

/// Runs the whole pipeline: paginated retrieval, per-message projection and
/// serialization in listing order, then assembly into the requested
/// destination. Every block is buffered before anything is written.
pub async fn run<S: MailApi>(
    service: &S,
    user: &str,
    access_token: &str,
    filter: &Filter,
    statement: &Statement,
) -> AppResult<()> {
    let results = search::retrieve(service, user, &filter.query(), access_token).await?;
    let blocks = render_blocks(&results, statement)?;
    debug!(blocks = blocks.len(), "rendered output blocks");
    assemble::assemble(&blocks, statement)
}

/// Projects and serializes every retrieved message, preserving listing order.
/// The first projection or serialization failure aborts the whole batch.
pub fn render_blocks(results: &ResultSet, statement: &Statement) -> AppResult<Vec<OutputBlock>> {
    let mut blocks = Vec::with_capacity(results.messages.len());
    for message in &results.messages {
        let projection = project(message, &statement.area)?;
        blocks.push(render(&projection, &statement.format)?);
    }
    Ok(blocks)
}
