use super::{BuildError, GraphNode, NodeId, SentinelNode, TaskGraph, chain};
use crate::calendar::{CalendarError, ProjectCalendar};
use crate::config::GraphConfig;
use crate::project::{ProjectInfo, ProjectInput};
use crate::task::{Progress, ResolvedTask, TaskId, TaskRecord};
use crate::task_validation;
use chrono::{Duration, NaiveDateTime};
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef, Reversed};
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

pub struct GraphBuilder<'a> {
    project: &'a ProjectInfo,
    tasks: &'a [TaskRecord],
    config: GraphConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(project: &'a ProjectInfo, tasks: &'a [TaskRecord]) -> Self {
        Self {
            project,
            tasks,
            config: GraphConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(&self) -> Result<TaskGraph, BuildError> {
        // Steps 1-2: record shapes, unique ids, known predecessors
        task_validation::validate_task_collection(self.tasks)?;

        // Step 3: resolve calendar dates
        let calendar = ProjectCalendar::for_project(self.project);
        let resolved = self.resolve_dates(&calendar)?;

        // Step 4: allocate sentinels
        let (start, end) = self.allocate_sentinels(&resolved, &calendar);
        log::debug!("sentinels: START={} END={}", start.id, end.id);

        // Step 5: nodes and edges
        let (graph, id_to_index) = self.build_graph_structure(resolved, start, end);

        // Steps 6 and 8: cycle check doubles as the stable ordering
        let topo = Self::stable_topological_order(&graph)?;

        // Step 7: reachability
        Self::check_reachability(&graph, &id_to_index, start.id, end.id)?;

        let order: Vec<TaskId> = topo
            .into_iter()
            .filter_map(|ix| graph[ix].as_task().map(ResolvedTask::id))
            .collect();
        let rows = order
            .iter()
            .enumerate()
            .map(|(row, id)| (*id, row))
            .collect();

        // Step 9: chain grouping
        let chains = chain::group_chains(
            order
                .iter()
                .filter_map(|id| id_to_index.get(id))
                .filter_map(|&ix| graph[ix].as_task()),
            &self.config,
        );

        log::info!(
            "built task graph: {} tasks, {} edges, {} chains",
            order.len(),
            graph.edge_count(),
            chains.len()
        );

        Ok(TaskGraph {
            graph,
            id_to_index,
            start,
            end,
            order,
            rows,
            chains,
            project: self.project.clone(),
            calendar,
            config: self.config.clone(),
        })
    }

    fn resolve_dates(&self, calendar: &ProjectCalendar) -> Result<Vec<ResolvedTask>, BuildError> {
        // Resolution is pure, so tasks resolve in parallel; the sequential collect
        // keeps the reported failure the first one in input order.
        let results: Vec<Result<ResolvedTask, BuildError>> = self
            .tasks
            .par_iter()
            .map(|record| resolve_task(record, calendar))
            .collect();
        results.into_iter().collect()
    }

    fn allocate_sentinels(
        &self,
        resolved: &[ResolvedTask],
        calendar: &ProjectCalendar,
    ) -> (SentinelNode, SentinelNode) {
        let ids = || resolved.iter().map(ResolvedTask::id);
        // Ids are validated positive and below TaskId::MAX, so neither bound overflows.
        let start_id = ids().min().map_or(0, |min| min - 1);
        let end_id = ids().max().map_or(1, |max| max + 1);

        let earliest = resolved
            .iter()
            .map(ResolvedTask::start_date)
            .min()
            .unwrap_or(calendar.start());
        let latest = resolved.iter().map(ResolvedTask::finish_date).max();
        let end_marker = match latest {
            Some(latest) => shift_days(latest, 2),
            None => shift_days(calendar.start(), 1),
        };

        (
            SentinelNode {
                id: start_id,
                marker: shift_days(earliest, -1),
            },
            SentinelNode {
                id: end_id,
                marker: end_marker,
            },
        )
    }

    fn build_graph_structure(
        &self,
        resolved: Vec<ResolvedTask>,
        start: SentinelNode,
        end: SentinelNode,
    ) -> (DiGraph<GraphNode, ()>, HashMap<NodeId, NodeIndex>) {
        let mut graph: DiGraph<GraphNode, ()> =
            DiGraph::with_capacity(resolved.len() + 2, resolved.len() * 2);
        let mut id_to_index: HashMap<NodeId, NodeIndex> = HashMap::new();

        // Node insertion order is the tie-break priority of the topological sort.
        let start_ix = graph.add_node(GraphNode::Start(start));
        id_to_index.insert(start.id, start_ix);
        for task in resolved {
            let id = task.id();
            let ix = graph.add_node(GraphNode::Task(task));
            id_to_index.insert(id, ix);
        }
        let end_ix = graph.add_node(GraphNode::End(end));
        id_to_index.insert(end.id, end_ix);

        if self.tasks.is_empty() {
            graph.add_edge(start_ix, end_ix, ());
            return (graph, id_to_index);
        }

        let referenced: HashSet<TaskId> = self
            .tasks
            .iter()
            .flat_map(|task| task.predecessors.iter().copied())
            .collect();

        let roots: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|task| task.predecessors.is_empty())
            .map(|task| task.id)
            .collect();
        for id in &roots {
            graph.add_edge(start_ix, id_to_index[id], ());
        }

        for task in self.tasks {
            let task_ix = id_to_index[&task.id];
            for pred in &task.predecessors {
                // update_edge collapses repeated predecessor entries into one edge
                graph.update_edge(id_to_index[pred], task_ix, ());
            }
        }

        let leaves: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|task| !referenced.contains(&task.id))
            .map(|task| task.id)
            .collect();
        for id in &leaves {
            graph.add_edge(id_to_index[id], end_ix, ());
        }

        log::debug!("connecting START to roots: {roots:?}");
        log::debug!("connecting leaves to END: {leaves:?}");
        (graph, id_to_index)
    }

    /// Kahn's algorithm, always taking the ready node inserted earliest.
    fn stable_topological_order(
        graph: &DiGraph<GraphNode, ()>,
    ) -> Result<Vec<NodeIndex>, BuildError> {
        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|ix| graph.edges_directed(ix, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(ix, _)| Reverse(ix))
            .collect();

        let mut order = Vec::with_capacity(graph.node_count());
        while let Some(Reverse(ix)) = ready.pop() {
            let node = NodeIndex::new(ix);
            order.push(node);
            for edge in graph.edges(node) {
                let target = edge.target().index();
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    ready.push(Reverse(target));
                }
            }
        }

        if order.len() < graph.node_count() {
            return Err(BuildError::CyclicDependency(Self::cycle_members(graph)));
        }
        Ok(order)
    }

    /// Task ids lying on a cycle: strongly connected components larger than one
    /// node, plus nodes with a self-loop.
    fn cycle_members(graph: &DiGraph<GraphNode, ()>) -> Vec<TaskId> {
        let mut members: Vec<TaskId> = tarjan_scc(graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&ix| graph.find_edge(ix, ix).is_some())
            })
            .flatten()
            .map(|ix| graph[ix].id())
            .collect();
        members.sort_unstable();
        members
    }

    fn check_reachability(
        graph: &DiGraph<GraphNode, ()>,
        id_to_index: &HashMap<NodeId, NodeIndex>,
        start_id: NodeId,
        end_id: NodeId,
    ) -> Result<(), BuildError> {
        let start_ix = id_to_index[&start_id];
        let end_ix = id_to_index[&end_id];

        let mut from_start = HashSet::with_capacity(graph.node_count());
        let mut dfs = Dfs::new(graph, start_ix);
        while let Some(ix) = dfs.next(graph) {
            from_start.insert(ix);
        }

        let mut to_end = HashSet::with_capacity(graph.node_count());
        let reversed = Reversed(graph);
        let mut dfs = Dfs::new(reversed, end_ix);
        while let Some(ix) = dfs.next(reversed) {
            to_end.insert(ix);
        }

        match graph
            .node_indices()
            .find(|ix| !from_start.contains(ix) || !to_end.contains(ix))
        {
            Some(ix) => Err(BuildError::DisconnectedTask(graph[ix].id())),
            None => Ok(()),
        }
    }
}

fn resolve_task(
    record: &TaskRecord,
    calendar: &ProjectCalendar,
) -> Result<ResolvedTask, BuildError> {
    let date_error = |source: CalendarError| BuildError::TaskDate {
        task_id: record.id,
        source,
    };
    if record.finish < record.start {
        return Err(BuildError::InvertedTaskInterval {
            task_id: record.id,
            start: record.start,
            finish: record.finish,
        });
    }
    let start_date = calendar.resolve(record.start).map_err(date_error)?;
    let finish_date = calendar.resolve(record.finish).map_err(date_error)?;

    let progress = match record.remaining {
        None => None,
        Some(remaining) => {
            let span = record.span();
            if remaining > span {
                return Err(BuildError::InvalidTask {
                    task_id: record.id,
                    reason: format!("remaining {remaining} exceeds the task span of {span} days"),
                });
            }
            let completed_until = calendar
                .resolve(record.finish - remaining)
                .map_err(date_error)?;
            let completed_fraction = if span > 0.0 {
                (span - remaining) / span
            } else {
                1.0
            };
            Some(Progress {
                completed_until,
                completed_fraction,
                remaining_days: remaining,
            })
        }
    };

    Ok(ResolvedTask::new(
        record.clone(),
        start_date,
        finish_date,
        progress,
    ))
}

fn shift_days(instant: NaiveDateTime, days: i64) -> NaiveDateTime {
    instant
        .checked_add_signed(Duration::days(days))
        .unwrap_or(instant)
}

/// Build several projects in parallel; results keep the order of `inputs`.
pub fn build_all(
    inputs: &[ProjectInput],
    config: &GraphConfig,
) -> Vec<Result<TaskGraph, BuildError>> {
    inputs
        .par_iter()
        .map(|input| input.build_with(config))
        .collect()
}
