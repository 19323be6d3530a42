use super::{ChainGroup, GraphNode, NodeId, SentinelNode};
use crate::calendar::ProjectCalendar;
use crate::config::GraphConfig;
use crate::project::ProjectInfo;
use crate::task::{ResolvedTask, TaskId};
use chrono::NaiveDateTime;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Validated, immutable task network for one project load.
///
/// Nodes live in a petgraph arena keyed by [`NodeIndex`]; `id_to_index` maps
/// task and sentinel ids onto that arena. Edges run predecessor -> successor.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    pub(crate) graph: DiGraph<GraphNode, ()>,
    pub(crate) id_to_index: HashMap<NodeId, NodeIndex>,
    pub(crate) start: SentinelNode,
    pub(crate) end: SentinelNode,
    pub(crate) order: Vec<TaskId>,
    pub(crate) rows: HashMap<TaskId, usize>,
    pub(crate) chains: Vec<ChainGroup>,
    pub(crate) project: ProjectInfo,
    pub(crate) calendar: ProjectCalendar,
    pub(crate) config: GraphConfig,
}

impl TaskGraph {
    pub fn project(&self) -> &ProjectInfo {
        &self.project
    }

    pub fn calendar(&self) -> &ProjectCalendar {
        &self.calendar
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn start_id(&self) -> NodeId {
        self.start.id
    }

    pub fn end_id(&self) -> NodeId {
        self.end.id
    }

    pub fn start_sentinel(&self) -> &SentinelNode {
        &self.start
    }

    pub fn end_sentinel(&self) -> &SentinelNode {
        &self.end
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.id_to_index.get(&id).map(|&ix| &self.graph[ix])
    }

    pub fn task(&self, id: TaskId) -> Option<&ResolvedTask> {
        self.node(id).and_then(GraphNode::as_task)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn task_count(&self) -> usize {
        self.order.len()
    }

    /// Real task ids in stable topological order.
    pub fn topological_order(&self) -> &[TaskId] {
        &self.order
    }

    /// Resolved tasks in stable topological order.
    pub fn ordered_tasks(&self) -> impl Iterator<Item = &ResolvedTask> + '_ {
        self.order.iter().filter_map(|id| self.task(*id))
    }

    /// Position of a task in [`Self::topological_order`].
    pub fn row_of(&self, id: TaskId) -> Option<usize> {
        self.rows.get(&id).copied()
    }

    pub fn chain_groups(&self) -> &[ChainGroup] {
        &self.chains
    }

    /// Index of the chain group containing `id`.
    pub fn chain_index_of(&self, id: TaskId) -> Option<usize> {
        self.chains
            .iter()
            .position(|group| group.tasks.contains(&id))
    }

    /// Every edge as `(from, to)`, sentinels included, in insertion order.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.graph
            .edge_references()
            .map(|edge| (self.graph[edge.source()].id(), self.graph[edge.target()].id()))
            .collect()
    }

    pub fn predecessors_of(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    pub fn successors_of(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        let Some(&ix) = self.id_to_index.get(&id) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(ix, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                (edge.id(), self.graph[other].id())
            })
            .collect();
        edges.sort_by_key(|(edge_ix, _)| *edge_ix);
        edges.into_iter().map(|(_, node_id)| node_id).collect()
    }

    /// Earliest task start and latest task finish, if there are tasks.
    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let earliest = self.ordered_tasks().map(ResolvedTask::start_date).min()?;
        let latest = self.ordered_tasks().map(ResolvedTask::finish_date).max()?;
        Some((earliest, latest))
    }

    /// `"<name> - Timeline"`, with the publish instant appended when known.
    pub fn chart_title(&self) -> String {
        let mut title = format!("{} - Timeline", self.project.display_name());
        if let Some(published) = self.project.publish_instant() {
            title.push_str(&format!(
                " (Data as of: {})",
                published.format("%Y-%m-%d %H:%M")
            ));
        }
        title
    }
}
