use crate::calendar::CalendarError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("unknown task type '{0}'")]
    UnknownTaskType(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type LoadResult<T> = Result<T, LoadError>;

pub mod file;

pub use file::{
    load_graph_config, load_project_from_json, load_tasks_from_csv, parse_instant,
    project_from_json_str,
};
