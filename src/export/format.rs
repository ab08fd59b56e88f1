use crate::error::{AppError, AppResult};

use super::area::Projection;

/// One serialized message, ready for assembly. The format that produced it
/// is carried by the statement, which also selects the assembly delimiters.
pub type OutputBlock = Vec<u8>;

/// Serializes a projected message into the named format.
pub fn render(projection: &Projection, format: &str) -> AppResult<OutputBlock> {
    match format {
        "json" => projection.to_json(),
        "txt" => Ok(projection.to_txt()),
        other => Err(AppError::UnsupportedFormat(other.to_string())),
    }
}
