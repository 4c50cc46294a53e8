pub mod comparer;
pub mod details;
pub mod normalize;
pub mod operations;
pub mod types;

pub use comparer::SchemaComparer;
pub use types::{
    CompareOptions, ComparisonMode, DetailKind, DiffType, DifferenceDetail, RiskLevel,
    SchemaComparison, SchemaDifference,
};

use crate::catalog::ObjectRef;
use crate::catalog::utils::is_system_schema;
use crate::diff::operations::{MigrationStep, Phase, SqlRenderer};
use crate::error::MigrationError;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Pair up items of two lists by id and diff each pair; ids present on one
/// side only are passed with `None` for the other.
pub fn diff_list<T, I: Eq + Ord + Clone, R>(
    old: &[T],
    new: &[T],
    id_of: impl Fn(&T) -> I,
    diff_fn: impl Fn(Option<&T>, Option<&T>) -> Vec<R>,
) -> Vec<R> {
    let mut old_map = BTreeMap::new();
    let mut new_map = BTreeMap::new();
    for o in old {
        old_map.insert(id_of(o), o);
    }
    for n in new {
        new_map.insert(id_of(n), n);
    }

    let all_ids: BTreeSet<_> = old_map.keys().chain(new_map.keys()).cloned().collect();

    all_ids
        .into_iter()
        .flat_map(|id| diff_fn(old_map.get(&id).cloned(), new_map.get(&id).cloned()))
        .collect()
}

/// Order steps so that every statement runs after what it needs.
///
/// Drops come first (dependents before their dependencies), then alters and
/// moves, then creates (dependencies before dependents). Within a phase the
/// fixed per-type rank decides, refined by the objects' own declared
/// dependencies. Ties keep their input order.
pub fn order_steps(steps: Vec<MigrationStep>) -> Result<Vec<MigrationStep>, MigrationError> {
    info!("Ordering {} migration steps...", steps.len());

    let mut steps: Vec<(usize, MigrationStep)> = steps.into_iter().enumerate().collect();
    steps.sort_by_key(|(i, step)| (step.phase(), step.rank(), *i));
    let steps: Vec<MigrationStep> = steps.into_iter().map(|(_, step)| step).collect();

    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..steps.len()).map(|i| graph.add_node(i)).collect();

    let mut providers: BTreeMap<(Phase, ObjectRef), Vec<usize>> = BTreeMap::new();
    for (i, step) in steps.iter().enumerate() {
        providers
            .entry((step.phase(), step.object_ref()))
            .or_default()
            .push(i);
    }

    for (i, step) in steps.iter().enumerate() {
        let phase = step.phase();
        if phase == Phase::Alter {
            continue;
        }

        for dep in step.dependencies() {
            let Some(indices) = providers.get(&(phase.clone(), dep.clone())) else {
                if !is_system_schema(&dep.schema) {
                    debug!(
                        "{} depends on {}.{} which is not part of this migration",
                        step.label(),
                        dep.schema,
                        dep.name
                    );
                }
                continue;
            };

            for &j in indices {
                if i == j {
                    continue;
                }
                // Dependents are dropped before what they depend on
                let (from, to) = if phase == Phase::Drop { (i, j) } else { (j, i) };
                graph.add_edge(nodes[from], nodes[to], ());
            }
        }
    }

    toposort(&graph, None).map_err(|cycle| {
        let step = &steps[graph[cycle.node_id()]];
        MigrationError::DependencyCycle(step.label())
    })?;

    // Kahn's algorithm, always taking the earliest ready step
    let mut in_degree: Vec<usize> = nodes
        .iter()
        .map(|&n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();
    let mut ready: BTreeSet<usize> = (0..steps.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(steps.len());

    while let Some(i) = ready.pop_first() {
        order.push(i);
        for next in graph.neighbors_directed(nodes[i], Direction::Outgoing) {
            let j = graph[next];
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                ready.insert(j);
            }
        }
    }

    let mut slots: Vec<Option<MigrationStep>> = steps.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect())
}
