use super::{LoadError, LoadResult};
use crate::calendar::CalendarMode;
use crate::config::GraphConfig;
use crate::project::{ProjectInfo, ProjectInput};
use crate::task::{TaskId, TaskRecord, TaskType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Deserialize)]
struct ProjectDocument {
    #[serde(default)]
    project_info: ProjectInfoDocument,
    #[serde(default)]
    tasks: Vec<TaskDocument>,
}

#[derive(Default, Deserialize)]
struct ProjectInfoDocument {
    start_date: Option<String>,
    calendar: Option<String>,
    hours_per_day: Option<u32>,
    name: Option<String>,
    publish_date: Option<String>,
}

impl ProjectInfoDocument {
    fn into_project_info(self) -> LoadResult<ProjectInfo> {
        let raw_start = self
            .start_date
            .ok_or_else(|| LoadError::InvalidData("project start_date is missing".into()))?;
        let start = parse_instant(&raw_start).ok_or_else(|| {
            LoadError::InvalidData(format!("invalid project start_date '{raw_start}'"))
        })?;
        let mode = match self.calendar.as_deref() {
            Some(raw) => raw.parse::<CalendarMode>()?,
            None => CalendarMode::default(),
        };
        let hours_per_day = self
            .hours_per_day
            .unwrap_or(ProjectInfo::DEFAULT_HOURS_PER_DAY);

        let mut info = ProjectInfo::new(start, mode, hours_per_day)?;
        if let Some(name) = non_empty(self.name) {
            info = info.with_name(name);
        }
        if let Some(raw_publish) = non_empty(self.publish_date) {
            match parse_instant(&raw_publish) {
                Some(published) => info = info.with_publish_instant(published),
                None => log::warn!("ignoring unparsable publish_date '{raw_publish}'"),
            }
        }
        Ok(info)
    }
}

/// `predecessors` as written by project files: `"1, 2"`, `[1, 2]` or `1`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PredecessorField {
    Ids(Vec<TaskId>),
    Single(TaskId),
    Text(String),
}

impl PredecessorField {
    fn into_ids(self) -> LoadResult<Vec<TaskId>> {
        match self {
            PredecessorField::Ids(ids) => Ok(ids),
            PredecessorField::Single(id) => Ok(vec![id]),
            PredecessorField::Text(text) => split_ids(&text),
        }
    }
}

#[derive(Deserialize)]
struct TaskDocument {
    id: TaskId,
    name: String,
    #[serde(default)]
    start: f64,
    finish: Option<f64>,
    #[serde(rename = "type")]
    task_type: Option<String>,
    chain: Option<String>,
    resources: Option<String>,
    predecessors: Option<PredecessorField>,
    remaining: Option<f64>,
    url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl TaskDocument {
    fn into_record(self) -> LoadResult<TaskRecord> {
        let task_type = match non_empty(self.task_type) {
            Some(raw) => TaskType::parse(&raw).ok_or(LoadError::UnknownTaskType(raw))?,
            None => TaskType::Unassigned,
        };
        let finish = self.finish.unwrap_or(self.start);

        let mut task = TaskRecord::new(self.id, self.name, self.start, finish).with_type(task_type);
        if let Some(chain) = non_empty(self.chain) {
            task.chain = chain;
        }
        task.resources = self.resources.unwrap_or_default();
        task.predecessors = match self.predecessors {
            Some(field) => field.into_ids()?,
            None => Vec::new(),
        };
        task.remaining = self.remaining;
        task.url = non_empty(self.url);
        task.tags = self.tags;
        Ok(task)
    }
}

/// Parse a project document held in memory.
pub fn project_from_json_str(json: &str) -> LoadResult<ProjectInput> {
    let document: ProjectDocument = serde_json::from_str(json)?;
    into_input(document)
}

/// Read a `{ "project_info": ..., "tasks": [...] }` project file.
pub fn load_project_from_json<P: AsRef<Path>>(path: P) -> LoadResult<ProjectInput> {
    let file = File::open(path)?;
    let document: ProjectDocument = serde_json::from_reader(BufReader::new(file))?;
    into_input(document)
}

fn into_input(document: ProjectDocument) -> LoadResult<ProjectInput> {
    let info = document.project_info.into_project_info()?;
    let tasks = document
        .tasks
        .into_iter()
        .map(TaskDocument::into_record)
        .collect::<LoadResult<Vec<_>>>()?;
    Ok(ProjectInput::new(info, tasks))
}

pub fn load_graph_config<P: AsRef<Path>>(path: P) -> LoadResult<GraphConfig> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[derive(Deserialize)]
struct TaskCsvRecord {
    id: TaskId,
    name: String,
    #[serde(default)]
    start: String,
    #[serde(default)]
    finish: String,
    #[serde(default, rename = "type")]
    task_type: String,
    #[serde(default)]
    chain: String,
    #[serde(default)]
    resources: String,
    #[serde(default)]
    predecessors: String,
    #[serde(default)]
    remaining: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    tags: String,
}

impl TaskCsvRecord {
    fn into_document(self) -> LoadResult<TaskDocument> {
        Ok(TaskDocument {
            id: self.id,
            name: self.name,
            start: parse_f64(&self.start)?.unwrap_or_default(),
            finish: parse_f64(&self.finish)?,
            task_type: Some(self.task_type),
            chain: Some(self.chain),
            resources: Some(self.resources),
            predecessors: Some(PredecessorField::Text(self.predecessors)),
            remaining: parse_f64(&self.remaining)?,
            url: Some(self.url),
            tags: split_strings(&self.tags),
        })
    }
}

/// Read task rows from a CSV table with the project-file column names.
///
/// `predecessors` is comma-separated and `tags` semicolon-separated.
pub fn load_tasks_from_csv<P: AsRef<Path>>(path: P) -> LoadResult<Vec<TaskRecord>> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut tasks = Vec::new();
    for record in reader.deserialize::<TaskCsvRecord>() {
        tasks.push(record?.into_document()?.into_record()?);
    }
    Ok(tasks)
}

/// Parse an ISO-8601 instant: a date, a naive datetime, or RFC 3339 (taken as UTC).
pub fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(instant) = raw.parse::<NaiveDateTime>() {
        return Some(instant);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(instant) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(instant);
        }
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_f64(input: &str) -> LoadResult<Option<f64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| LoadError::InvalidData(format!("invalid number '{input}': {e}")))
}

fn split_ids(input: &str) -> LoadResult<Vec<TaskId>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<TaskId>().map_err(|e| {
                LoadError::InvalidData(format!("invalid predecessor id '{part}': {e}"))
            })
        })
        .collect()
}

fn split_strings(input: &str) -> Vec<String> {
    input
        .split(';')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
