//! Workflow state value types

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Composite identity of a workflow state used for transition lookups
///
/// Metadata is not part of the key: two states that differ only in metadata
/// share transition statistics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    pub phase: String,
    pub current_step: String,
    pub document_type: String,
}

impl StateKey {
    pub fn new(
        phase: impl Into<String>,
        current_step: impl Into<String>,
        document_type: impl Into<String>,
    ) -> Self {
        Self {
            phase: phase.into(),
            current_step: current_step.into(),
            document_type: document_type.into(),
        }
    }

    /// Decode the key into a state, taking the document type from context
    pub fn to_state_in_context(&self, context: &WorkflowState) -> WorkflowState {
        WorkflowState::new(
            self.phase.clone(),
            self.current_step.clone(),
            context.document_type().to_string(),
        )
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.phase, self.current_step, self.document_type
        )
    }
}

/// An observed step in an acquisition workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    phase: String,
    current_step: String,
    document_type: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl WorkflowState {
    /// Create a state without metadata
    pub fn new(
        phase: impl Into<String>,
        current_step: impl Into<String>,
        document_type: impl Into<String>,
    ) -> Self {
        Self {
            phase: phase.into(),
            current_step: current_step.into(),
            document_type: document_type.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Replace all metadata
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a single metadata entry
    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn current_step(&self) -> &str {
        &self.current_step
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Transition lookup key
    pub fn key(&self) -> StateKey {
        StateKey::new(
            self.phase.clone(),
            self.current_step.clone(),
            self.document_type.clone(),
        )
    }
}
