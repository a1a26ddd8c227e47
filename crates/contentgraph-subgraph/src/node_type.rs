//! Node type schema collaborator and constraint evaluation.
//!
//! The schema answers "is type A a specialization of type B", which is what
//! gives [`NodeTypeConstraints`] their subtype semantics. Constraints are
//! resolved once against the schema ([`ResolvedNodeTypeConstraints`]) and
//! then evaluated per node.

use std::collections::{BTreeMap, HashSet, VecDeque};

use contentgraph_core::{Error, NodeTypeConstraints, NodeTypeName, Result};
use serde::{Deserialize, Serialize};

/// Resolves node type names to their declared supertypes.
pub trait NodeTypeSchema: Send + Sync {
    /// Whether the schema declares `name`.
    fn has_node_type(&self, name: &NodeTypeName) -> bool;

    /// Direct supertypes of `name` (empty for unknown types).
    fn declared_supertypes(&self, name: &NodeTypeName) -> Vec<NodeTypeName>;

    /// Every declared type name.
    fn node_type_names(&self) -> Vec<NodeTypeName>;

    /// Number of inheritance steps from `sub_type` up to `super_type`.
    ///
    /// `Some(0)` for identical names, `None` if `sub_type` does not
    /// specialize `super_type`.
    fn inheritance_distance(
        &self,
        sub_type: &NodeTypeName,
        super_type: &NodeTypeName,
    ) -> Option<usize> {
        let mut seen: HashSet<NodeTypeName> = HashSet::new();
        let mut queue = VecDeque::from([(sub_type.clone(), 0usize)]);

        while let Some((current, distance)) = queue.pop_front() {
            if &current == super_type {
                return Some(distance);
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            for parent in self.declared_supertypes(&current) {
                queue.push_back((parent, distance + 1));
            }
        }

        None
    }

    /// Whether `name` equals or specializes `super_type`.
    fn is_of_type(&self, name: &NodeTypeName, super_type: &NodeTypeName) -> bool {
        self.inheritance_distance(name, super_type).is_some()
    }

    /// `super_type` and every type that specializes it.
    fn sub_types_of(&self, super_type: &NodeTypeName) -> Vec<NodeTypeName> {
        self.node_type_names()
            .into_iter()
            .filter(|name| self.is_of_type(name, super_type))
            .collect()
    }
}

/// Declaration of a node type for [`StaticNodeTypeSchema`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeDeclaration {
    pub name: NodeTypeName,
    #[serde(default)]
    pub super_types: Vec<NodeTypeName>,
}

impl NodeTypeDeclaration {
    pub fn new(name: NodeTypeName) -> Self {
        Self {
            name,
            super_types: Vec::new(),
        }
    }

    pub fn with_super_type(mut self, super_type: NodeTypeName) -> Self {
        self.super_types.push(super_type);
        self
    }
}

/// In-memory schema built from declarations.
#[derive(Clone, Debug, Default)]
pub struct StaticNodeTypeSchema {
    types: BTreeMap<NodeTypeName, Vec<NodeTypeName>>,
}

impl StaticNodeTypeSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema; every referenced supertype must be declared too.
    pub fn from_declarations(
        declarations: impl IntoIterator<Item = NodeTypeDeclaration>,
    ) -> Result<Self> {
        let mut types = BTreeMap::new();
        for declaration in declarations {
            if types
                .insert(declaration.name.clone(), declaration.super_types)
                .is_some()
            {
                return Err(Error::invalid_argument(format!(
                    "node type '{}' declared twice",
                    declaration.name
                )));
            }
        }

        for (name, super_types) in &types {
            if let Some(missing) = super_types.iter().find(|s| !types.contains_key(*s)) {
                return Err(Error::unknown_node_type(format!(
                    "{missing} (supertype of {name})"
                )));
            }
        }

        Ok(Self { types })
    }

    /// The declarations this schema was built from.
    pub fn declarations(&self) -> Vec<NodeTypeDeclaration> {
        self.types
            .iter()
            .map(|(name, super_types)| NodeTypeDeclaration {
                name: name.clone(),
                super_types: super_types.clone(),
            })
            .collect()
    }
}

impl NodeTypeSchema for StaticNodeTypeSchema {
    fn has_node_type(&self, name: &NodeTypeName) -> bool {
        self.types.contains_key(name)
    }

    fn declared_supertypes(&self, name: &NodeTypeName) -> Vec<NodeTypeName> {
        self.types.get(name).cloned().unwrap_or_default()
    }

    fn node_type_names(&self) -> Vec<NodeTypeName> {
        self.types.keys().cloned().collect()
    }
}

/// Constraints checked against a schema, ready for evaluation.
#[derive(Clone)]
pub struct ResolvedNodeTypeConstraints<'a> {
    constraints: &'a NodeTypeConstraints,
    schema: &'a dyn NodeTypeSchema,
}

impl<'a> ResolvedNodeTypeConstraints<'a> {
    /// Resolve `constraints` against `schema`.
    ///
    /// Fails with [`Error::UnknownNodeType`] if a listed name is not declared.
    pub fn resolve(
        constraints: &'a NodeTypeConstraints,
        schema: &'a dyn NodeTypeSchema,
    ) -> Result<Self> {
        if let Some(unknown) = constraints
            .allowed()
            .iter()
            .chain(constraints.disallowed())
            .find(|name| !schema.has_node_type(name))
        {
            return Err(Error::unknown_node_type(unknown.to_string()));
        }

        Ok(Self {
            constraints,
            schema,
        })
    }

    /// Whether a node of type `node_type` passes.
    ///
    /// The listed name closest to `node_type` in the inheritance graph
    /// decides; a deny wins a tie. With no listed ancestor the wildcard
    /// flag decides.
    pub fn matches(&self, node_type: &NodeTypeName) -> bool {
        if self.constraints.is_unconstrained() {
            return true;
        }

        let closest = |names: &std::collections::BTreeSet<NodeTypeName>| {
            names
                .iter()
                .filter_map(|name| self.schema.inheritance_distance(node_type, name))
                .min()
        };

        match (
            closest(self.constraints.allowed()),
            closest(self.constraints.disallowed()),
        ) {
            (Some(allow), Some(deny)) => allow < deny,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => self.constraints.is_wildcard_allowed(),
        }
    }
}

impl std::fmt::Debug for ResolvedNodeTypeConstraints<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedNodeTypeConstraints")
            .field("constraints", &self.constraints.to_string())
            .finish()
    }
}
