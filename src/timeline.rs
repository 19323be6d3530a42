use crate::calendar::CalendarMode;
use crate::graph::{ChainGroup, NodeId, TaskGraph};
use crate::task::{TaskId, TaskType};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Everything a chart needs to draw one task bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    /// Position in the topological order.
    pub row: usize,
    /// Index of the task's chain group; the critical chain is lane 0 when present.
    pub lane: usize,
    pub id: TaskId,
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub chain: String,
    pub resources: String,
    pub color: String,
    pub start_date: NaiveDateTime,
    pub finish_date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_until: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeView {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerView {
    pub id: NodeId,
    pub date: NaiveDateTime,
}

/// Serializable snapshot of a built graph for external renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineExport {
    pub title: String,
    pub calendar: CalendarMode,
    pub project_start: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<NaiveDateTime>,
    pub start: MarkerView,
    pub end: MarkerView,
    pub chains: Vec<ChainGroup>,
    pub tasks: Vec<TaskView>,
    pub edges: Vec<EdgeView>,
    /// Dates to shade between the two markers; empty for continuous calendars.
    pub non_working_days: Vec<NaiveDate>,
}

impl TaskGraph {
    /// One view per task, ordered by row.
    pub fn views(&self) -> Vec<TaskView> {
        let lanes: HashMap<TaskId, usize> = self
            .chain_groups()
            .iter()
            .enumerate()
            .flat_map(|(lane, group)| group.tasks.iter().map(move |id| (*id, lane)))
            .collect();
        let palette = &self.config().palette;

        self.ordered_tasks()
            .enumerate()
            .map(|(row, task)| TaskView {
                row,
                lane: lanes.get(&task.id()).copied().unwrap_or_default(),
                id: task.id(),
                name: task.name().to_string(),
                label: task.label(),
                task_type: task.task_type(),
                chain: task.chain().to_string(),
                resources: task.resources().to_string(),
                color: palette.color(task.task_type()).to_string(),
                start_date: task.start_date(),
                finish_date: task.finish_date(),
                completed_until: task.progress().map(|progress| progress.completed_until),
                url: task.record().url.clone(),
                tags: task.record().tags.clone(),
            })
            .collect()
    }

    pub fn export(&self) -> TimelineExport {
        let start = self.start_sentinel();
        let end = self.end_sentinel();
        TimelineExport {
            title: self.chart_title(),
            calendar: self.calendar().mode(),
            project_start: self.calendar().start(),
            publish_date: self.project().publish_instant(),
            start: MarkerView {
                id: start.id,
                date: start.marker,
            },
            end: MarkerView {
                id: end.id,
                date: end.marker,
            },
            chains: self.chain_groups().to_vec(),
            tasks: self.views(),
            edges: self
                .edges()
                .into_iter()
                .map(|(from, to)| EdgeView { from, to })
                .collect(),
            non_working_days: self
                .calendar()
                .non_working_days(start.marker.date(), end.marker.date()),
        }
    }

    /// Task views as a polars frame with microsecond datetime columns.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let views = self.views();
        let mut columns: Vec<Column> = Vec::with_capacity(10);

        let rows: Vec<u32> = views.iter().map(|v| v.row as u32).collect();
        columns.push(Series::new(PlSmallStr::from_static("row"), rows).into_column());

        let ids: Vec<i32> = views.iter().map(|v| v.id).collect();
        columns.push(Series::new(PlSmallStr::from_static("id"), ids).into_column());

        let names: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("name"), names).into_column());

        let types: Vec<&str> = views.iter().map(|v| v.task_type.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("type"), types).into_column());

        let chains: Vec<&str> = views.iter().map(|v| v.chain.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("chain"), chains).into_column());

        let lanes: Vec<u32> = views.iter().map(|v| v.lane as u32).collect();
        columns.push(Series::new(PlSmallStr::from_static("lane"), lanes).into_column());

        let starts: Vec<NaiveDateTime> = views.iter().map(|v| v.start_date).collect();
        columns.push(Self::series_from_datetimes("start", &starts)?.into_column());

        let finishes: Vec<NaiveDateTime> = views.iter().map(|v| v.finish_date).collect();
        columns.push(Self::series_from_datetimes("finish", &finishes)?.into_column());

        let resources: Vec<&str> = views.iter().map(|v| v.resources.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("resources"), resources).into_column());

        let colors: Vec<&str> = views.iter().map(|v| v.color.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("color"), colors).into_column());

        DataFrame::new(columns)
    }

    fn series_from_datetimes(name: &str, values: &[NaiveDateTime]) -> PolarsResult<Series> {
        let micros: Vec<i64> = values
            .iter()
            .map(|value| value.and_utc().timestamp_micros())
            .collect();
        Series::new(name.into(), micros).cast(&DataType::Datetime(TimeUnit::Microseconds, None))
    }
}

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        _ => value.to_string(),
    }
}

/// Render a frame as a boxed plain-text table.
pub fn render_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| {
                    col.get(row_idx)
                        .map(|value| cell_text(&value))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, value) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(value.chars().count())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}
