#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    Malformed(&'static str),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
