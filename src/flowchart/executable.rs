use super::definition::{DecisionOption, FlowchartDefinition, FlowchartNode};
use super::diagram::DiagramData;
use crate::error::FlowchartError;
use ahash::AHashMap;
use std::collections::BTreeMap;
use tracing::warn;

/// A node merged with its diagram label and phase.
#[derive(Debug, Clone)]
pub struct ExecutableNode {
    pub id: String,
    pub label: Option<String>,
    pub phase: Option<String>,
    pub definition: FlowchartNode,
}

/// The declarative graph joined with the companion diagram by node id.
#[derive(Debug, Clone)]
pub struct ExecutableFlowchart {
    pub definition: FlowchartDefinition,
    pub nodes: BTreeMap<String, ExecutableNode>,
    /// Cross-reference mismatches found while merging. Never fatal.
    pub warnings: Vec<String>,
    /// Diagram edges keyed by source node: `(target, label)`.
    diagram_edges: AHashMap<String, Vec<(String, Option<String>)>>,
}

impl ExecutableFlowchart {
    /// Merges a definition with optional diagram data.
    ///
    /// Only a missing entry node is an error; ids present on one side but not
    /// the other are recorded in `warnings`.
    pub fn load(
        definition: FlowchartDefinition,
        diagram: Option<DiagramData>,
    ) -> Result<Self, FlowchartError> {
        if !definition.nodes.contains_key(&definition.entry_node) {
            return Err(FlowchartError::MissingEntryNode(
                definition.entry_node.clone(),
            ));
        }

        let diagram = diagram.unwrap_or_default();
        let mut warnings = Vec::new();

        for id in diagram.nodes.keys() {
            if !definition.nodes.contains_key(id) {
                warnings.push(format!("Diagram node '{}' has no definition", id));
            }
        }

        let mut diagram_edges: AHashMap<String, Vec<(String, Option<String>)>> = AHashMap::new();
        for edge in &diagram.edges {
            diagram_edges
                .entry(edge.from.clone())
                .or_default()
                .push((edge.to.clone(), edge.label.clone()));
        }

        let nodes = definition
            .nodes
            .iter()
            .map(|(id, node)| {
                let label = diagram
                    .nodes
                    .get(id)
                    .cloned()
                    .or_else(|| node.content().map(str::to_string));
                if !diagram.nodes.is_empty() && !diagram.nodes.contains_key(id) {
                    warnings.push(format!("Node '{}' does not appear in the diagram", id));
                }
                let executable = ExecutableNode {
                    id: id.clone(),
                    label,
                    phase: diagram.phase_of(id).map(|p| p.id.clone()),
                    definition: node.clone(),
                };
                (id.clone(), executable)
            })
            .collect();

        for warning in &warnings {
            warn!(flowchart = %definition.id, "{}", warning);
        }

        Ok(Self {
            definition,
            nodes,
            warnings,
            diagram_edges,
        })
    }

    pub fn from_json(
        definition_json: &str,
        diagram_json: Option<&str>,
    ) -> Result<Self, FlowchartError> {
        let definition = FlowchartDefinition::from_json(definition_json)?;
        let diagram = diagram_json.map(DiagramData::from_json).transpose()?;
        Self::load(definition, diagram)
    }

    pub fn entry(&self) -> &str {
        &self.definition.entry_node
    }

    pub fn node(&self, id: &str) -> Option<&ExecutableNode> {
        self.nodes.get(id)
    }

    /// Forced successor of a non-branching node: the node's own `next`, then the
    /// definition's edge table, then the diagram's edges.
    pub fn next_of(&self, id: &str) -> Option<&str> {
        let node = self.nodes.get(id)?;
        node.definition
            .next()
            .or_else(|| {
                self.definition
                    .edges
                    .get(id)
                    .and_then(|targets| targets.first())
                    .map(String::as_str)
            })
            .or_else(|| {
                self.diagram_edges
                    .get(id)
                    .and_then(|targets| targets.first())
                    .map(|(to, _)| to.as_str())
            })
    }

    /// Target of a decision option: its own `next`, then a diagram edge labelled
    /// with the option's label or value, then the edge tables by option index.
    pub fn option_target<'a>(
        &'a self,
        id: &str,
        index: usize,
        option: &'a DecisionOption,
    ) -> Option<&'a str> {
        if let Some(next) = option.next.as_deref() {
            return Some(next);
        }
        let diagram_targets = self.diagram_edges.get(id);
        let labelled = diagram_targets.and_then(|targets| {
            targets.iter().find_map(|(to, label)| {
                let label = label.as_deref()?.trim();
                (label.eq_ignore_ascii_case(&option.label)
                    || label.eq_ignore_ascii_case(&option.value))
                .then_some(to.as_str())
            })
        });
        labelled
            .or_else(|| {
                self.definition
                    .edges
                    .get(id)
                    .and_then(|targets| targets.get(index))
                    .map(String::as_str)
            })
            .or_else(|| {
                diagram_targets
                    .and_then(|targets| targets.get(index))
                    .map(|(to, _)| to.as_str())
            })
    }

    /// Every distinct successor of a node, including skip targets.
    pub fn successors(&self, id: &str) -> Vec<&str> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut targets: Vec<&str> = match &node.definition {
            FlowchartNode::Decision(decision) => {
                let mut targets: Vec<&str> = decision
                    .options
                    .iter()
                    .enumerate()
                    .filter_map(|(i, option)| self.option_target(id, i, option))
                    .collect();
                targets.extend(decision.skip().map(|s| s.target));
                targets
            }
            FlowchartNode::Checkpoint(checkpoint) => {
                let mut targets: Vec<&str> = self.next_of(id).into_iter().collect();
                targets.extend(checkpoint.skip().map(|s| s.target));
                targets
            }
            FlowchartNode::Terminal(_) => Vec::new(),
            _ => self.next_of(id).into_iter().collect(),
        };
        let mut seen = ahash::AHashSet::new();
        targets.retain(|t| seen.insert(*t));
        targets
    }

    /// Fails on the first successor that names an undefined node.
    pub fn check_references(&self) -> Result<(), FlowchartError> {
        for id in self.nodes.keys() {
            for target in self.successors(id) {
                if !self.nodes.contains_key(target) {
                    return Err(FlowchartError::NodeNotFound {
                        missing_node_id: target.to_string(),
                        referenced_from: id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
