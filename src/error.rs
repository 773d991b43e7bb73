use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage precondition: the input table lacks one or more columns the
    /// stage needs. Reported before any row is processed.
    #[error("{stage}: missing required column(s): {}", .columns.join(", "))]
    MissingColumns {
        stage: &'static str,
        columns: Vec<String>,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
