//! Presence-trigger graph.
//!
//! An edge `source -> target` means "while `source` is filtered, `target`
//! carries its default". The graph is validated once and is read-only
//! afterwards; cycles are rejected so default injection always terminates.

use std::collections::{BTreeMap, HashMap};

use siftql_model::DefinitionError;

use super::definition::FieldDefinition;

/// Directed presence-trigger graph with its reverse map.
#[derive(Debug, Clone, Default)]
pub struct TriggerGraph {
    targets: BTreeMap<String, Vec<String>>,
    sources: BTreeMap<String, Vec<String>>,
}

impl TriggerGraph {
    /// Builds and validates the graph over `fields`.
    pub(crate) fn build(fields: &[FieldDefinition]) -> Result<Self, DefinitionError> {
        let by_name: HashMap<&str, &FieldDefinition> =
            fields.iter().map(|f| (f.name.as_str(), f)).collect();
        let mut graph = Self::default();

        for field in fields {
            for target in &field.on_present {
                let Some(definition) = by_name.get(target.as_str()) else {
                    return Err(DefinitionError::UnknownTriggerTarget {
                        field: field.name.clone(),
                        target: target.clone(),
                    });
                };
                if definition.default.is_none() {
                    return Err(DefinitionError::TriggerWithoutDefault {
                        field: field.name.clone(),
                        target: target.clone(),
                    });
                }
                push_unique(graph.targets.entry(field.name.clone()).or_default(), target);
                push_unique(graph.sources.entry(target.clone()).or_default(), &field.name);
            }
        }

        graph.check_acyclic()?;
        Ok(graph)
    }

    /// Fields defaulted while `field` is present.
    #[must_use]
    pub fn targets_of(&self, field: &str) -> &[String] {
        self.targets.get(field).map_or(&[], Vec::as_slice)
    }

    /// Fields whose presence defaults `field`.
    #[must_use]
    pub fn sources_of(&self, field: &str) -> &[String] {
        self.sources.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` when some trigger defaults `field`.
    #[must_use]
    pub fn is_target(&self, field: &str) -> bool {
        self.sources.contains_key(field)
    }

    fn check_acyclic(&self) -> Result<(), DefinitionError> {
        let mut done: HashMap<&str, bool> = HashMap::new();
        for start in self.targets.keys() {
            let mut stack = Vec::new();
            self.visit(start, &mut stack, &mut done)?;
        }
        Ok(())
    }

    /// Depth-first walk; `done[n]` is `false` while `n` is on the stack.
    fn visit<'a>(
        &'a self,
        node: &'a str,
        stack: &mut Vec<&'a str>,
        done: &mut HashMap<&'a str, bool>,
    ) -> Result<(), DefinitionError> {
        match done.get(node) {
            Some(true) => return Ok(()),
            Some(false) => {
                let from = stack.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = stack[from..].iter().map(|n| (*n).to_owned()).collect();
                cycle.push(node.to_owned());
                return Err(DefinitionError::TriggerCycle { cycle });
            }
            None => {}
        }

        done.insert(node, false);
        stack.push(node);
        for target in self.targets_of(node) {
            self.visit(target, stack, done)?;
        }
        stack.pop();
        done.insert(node, true);
        Ok(())
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_owned());
    }
}
