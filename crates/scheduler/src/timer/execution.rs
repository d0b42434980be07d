use serde::{Deserialize, Serialize};

use super::declaration::FlowElementKind;
use crate::expression::{Variables, VariableScope};

/// The running execution a timer is bound to.
///
/// Start-event timers have none; boundary and intermediate timers are
/// resolved against the execution that reached them.
pub trait Execution {
    fn id(&self) -> Option<&str>;
    fn activity_id(&self) -> Option<&str>;
    fn current_element_kind(&self) -> FlowElementKind;
    fn process_definition_id(&self) -> Option<&str>;
    fn process_instance_id(&self) -> Option<&str>;
    fn tenant_id(&self) -> Option<&str>;
    fn scope(&self) -> &dyn VariableScope;
}

/// Owned, serializable execution view.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub element_kind: FlowElementKind,
    #[serde(default)]
    pub process_definition_id: Option<String>,
    #[serde(default)]
    pub process_instance_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub variables: Variables,
}

impl ExecutionSnapshot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn at(mut self, activity_id: impl Into<String>, kind: FlowElementKind) -> Self {
        self.activity_id = Some(activity_id.into());
        self.element_kind = kind;
        self
    }

    pub fn in_process(
        mut self,
        definition_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        self.process_definition_id = Some(definition_id.into());
        self.process_instance_id = Some(instance_id.into());
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }
}

impl Execution for ExecutionSnapshot {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn activity_id(&self) -> Option<&str> {
        self.activity_id.as_deref()
    }

    fn current_element_kind(&self) -> FlowElementKind {
        self.element_kind
    }

    fn process_definition_id(&self) -> Option<&str> {
        self.process_definition_id.as_deref()
    }

    fn process_instance_id(&self) -> Option<&str> {
        self.process_instance_id.as_deref()
    }

    fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    fn scope(&self) -> &dyn VariableScope {
        &self.variables
    }
}
