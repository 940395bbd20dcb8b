//! Model graph types
//!
//! A model maps to one table and exposes named relations to other models.
//! Relations are looked up by name; a miss is an explicit error at the
//! call site instead of a reflective dispatch failure.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::inflect::singularize;

/// Relation kind, as far as join construction is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The parent row holds the foreign key
    BelongsTo,
    /// The target row holds the foreign key, at most one target
    HasOne,
    /// The target rows hold the foreign key
    HasMany,
}

impl RelationKind {
    pub fn is_belongs_to(&self) -> bool {
        matches!(self, RelationKind::BelongsTo)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::BelongsTo => "belongs_to",
            RelationKind::HasOne => "has_one",
            RelationKind::HasMany => "has_many",
        }
    }
}

/// A named relation from one model to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDef {
    pub kind: RelationKind,

    /// Name of the target model
    pub target: String,

    /// Foreign-key column; inferred from table names when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
}

impl RelationDef {
    pub fn belongs_to(target: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::BelongsTo,
            target: target.into(),
            foreign_key: None,
        }
    }

    pub fn has_many(target: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::HasMany,
            target: target.into(),
            foreign_key: None,
        }
    }

    pub fn has_one(target: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::HasOne,
            target: target.into(),
            foreign_key: None,
        }
    }

    pub fn with_foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = Some(foreign_key.into());
        self
    }

    /// Foreign-key column for this relation between `parent` and `target`.
    ///
    /// Without an explicit key: belongs-to uses `<singular target table>_<target id>`
    /// (on the parent), every other kind `<singular parent table>_<parent id>`
    /// (on the target). The belongs-to form follows the ORM convention of
    /// naming the key after the related table, not the declaring one.
    pub fn foreign_key_column(&self, parent: &ModelDef, target: &ModelDef) -> String {
        if let Some(fk) = &self.foreign_key {
            return fk.clone();
        }

        if self.kind.is_belongs_to() {
            format!("{}_{}", singularize(&target.table), target.id_attribute)
        } else {
            format!("{}_{}", singularize(&parent.table), parent.id_attribute)
        }
    }
}

fn default_id_attribute() -> String {
    "id".to_string()
}

/// A model: one table plus its relations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDef {
    /// Model (resource) name
    pub name: String,

    /// Table name
    pub table: String,

    /// Identifying column (default: "id")
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,

    #[serde(default)]
    pub relations: BTreeMap<String, RelationDef>,
}

impl ModelDef {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            id_attribute: default_id_attribute(),
            relations: BTreeMap::new(),
        }
    }

    pub fn with_id_attribute(mut self, id_attribute: impl Into<String>) -> Self {
        self.id_attribute = id_attribute.into();
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>, relation: RelationDef) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }

    /// `table.column`, unless `column` is already qualified
    pub fn qualify(&self, column: &str) -> String {
        if column.contains('.') {
            column.to_string()
        } else {
            format!("{}.{}", self.table, column)
        }
    }

    /// Table-qualified identifying column
    pub fn qualified_id(&self) -> String {
        self.qualify(&self.id_attribute)
    }
}

/// On-disk shape of a model graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GraphFile {
    models: Vec<ModelDef>,
}

/// Read-only registry of models, shared across calls
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    models: HashMap<String, Arc<ModelDef>>,
}

impl ModelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model. Names must be unique.
    pub fn register(&mut self, model: ModelDef) -> SchemaResult<()> {
        if self.models.contains_key(&model.name) {
            return Err(SchemaError::DuplicateModel(model.name));
        }
        self.models.insert(model.name.clone(), Arc::new(model));
        Ok(())
    }

    /// Builder-style registration
    pub fn with_model(mut self, model: ModelDef) -> SchemaResult<Self> {
        self.register(model)?;
        Ok(self)
    }

    pub fn model(&self, name: &str) -> Option<&Arc<ModelDef>> {
        self.models.get(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model names in sorted order
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Checks that every relation points at a registered model.
    pub fn validate(&self) -> SchemaResult<()> {
        for name in self.model_names() {
            let model = &self.models[name];
            for (relation, def) in &model.relations {
                if !self.models.contains_key(&def.target) {
                    return Err(SchemaError::UnknownTarget {
                        model: model.name.clone(),
                        relation: relation.clone(),
                        target: def.target.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Parses `{"models": [...]}` and validates the result.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let file: GraphFile = serde_json::from_str(json)?;

        let mut graph = Self::new();
        for model in file.models {
            graph.register(model)?;
        }
        graph.validate()?;

        Ok(graph)
    }
}
