//! Relation path resolution
//!
//! Walks a chain of relation names (`comments.author`) over the model graph,
//! producing one join descriptor per hop. Every descriptor of a chain is
//! tagged with the chain's first relation name so joins coming from
//! different filters can be grouped per root relation later on.

use std::sync::Arc;

use super::errors::{PlannerError, PlannerResult};
use super::join::JoinDescriptor;
use crate::schema::{ModelDef, ModelGraph, RelationDef};

/// Outcome of resolving a relation chain
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Model reached by the last hop
    pub endpoint: Arc<ModelDef>,
    /// One descriptor per hop, in chain order
    pub joins: Vec<JoinDescriptor>,
}

impl Resolution {
    /// Table of the last hop
    pub fn endpoint_table(&self) -> &str {
        &self.endpoint.table
    }
}

/// Resolves relation chains against a model graph
pub struct RelationResolver<'a> {
    graph: &'a ModelGraph,
}

impl<'a> RelationResolver<'a> {
    pub fn new(graph: &'a ModelGraph) -> Self {
        Self { graph }
    }

    /// Looks up a registered model by name.
    pub fn model(&self, name: &str) -> PlannerResult<Arc<ModelDef>> {
        self.graph
            .model(name)
            .cloned()
            .ok_or_else(|| PlannerError::UnknownModel(name.to_string()))
    }

    /// Looks up one relation of `model` and the model it points at.
    pub fn related(
        &self,
        model: &ModelDef,
        relation: &str,
    ) -> PlannerResult<(&'a RelationDef, Arc<ModelDef>)> {
        let def = self
            .graph
            .model(&model.name)
            .and_then(|m| m.relation(relation))
            .ok_or_else(|| PlannerError::UnknownRelation(relation.to_string()))?;
        let target = self.model(&def.target)?;
        Ok((def, target))
    }

    /// Walks `relations` from `model`, left to right.
    pub fn resolve(&self, model: &Arc<ModelDef>, relations: &[String]) -> PlannerResult<Resolution> {
        let mut current = Arc::clone(model);
        let mut joins = Vec::with_capacity(relations.len());

        let Some(root) = relations.first() else {
            return Ok(Resolution {
                endpoint: current,
                joins,
            });
        };

        for (depth, name) in relations.iter().enumerate() {
            let (def, target) = self.related(&current, name)?;
            joins.push(build_join(name, root, depth, def, &current, &target));
            current = target;
        }

        Ok(Resolution {
            endpoint: current,
            joins,
        })
    }

    /// Resolves a dotted include path (`comments.author`).
    pub fn resolve_path(&self, model: &Arc<ModelDef>, path: &str) -> PlannerResult<Resolution> {
        let relations: Vec<String> = path.split('.').map(str::to_string).collect();
        self.resolve(model, &relations)
    }
}

/// Builds the descriptor for one hop.
///
/// belongs-to: `target.id = parent.fk`; every other kind: `target.fk = parent.id`.
fn build_join(
    relation: &str,
    root: &str,
    depth: usize,
    def: &RelationDef,
    parent: &ModelDef,
    target: &ModelDef,
) -> JoinDescriptor {
    let fk = def.foreign_key_column(parent, target);

    let (foreign_key, parent_key) = if def.kind.is_belongs_to() {
        (target.qualified_id(), parent.qualify(&fk))
    } else {
        (target.qualify(&fk), parent.qualified_id())
    };

    JoinDescriptor {
        relation: relation.to_string(),
        parent: root.to_string(),
        parent_table: parent.table.clone(),
        table: target.table.clone(),
        foreign_key,
        parent_key,
        depth,
    }
}
