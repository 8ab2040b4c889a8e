use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of the companion-diagram parser: node labels, labelled edges and phases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramData {
    #[serde(default)]
    pub nodes: BTreeMap<String, String>,
    #[serde(default)]
    pub edges: Vec<DiagramEdge>,
    #[serde(default)]
    pub phases: Vec<DiagramPhase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramPhase {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub node_ids: Vec<String>,
}

impl DiagramData {
    pub fn from_json(json: &str) -> Result<Self, crate::error::FlowchartError> {
        serde_json::from_str(json)
            .map_err(|e| crate::error::FlowchartError::JsonParse(e.to_string()))
    }

    pub fn phase_of(&self, id: &str) -> Option<&DiagramPhase> {
        self.phases
            .iter()
            .find(|p| p.node_ids.iter().any(|n| n == id))
    }
}
