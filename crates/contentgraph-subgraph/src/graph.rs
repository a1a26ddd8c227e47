//! Entry point handing out subgraphs.

use std::fmt;
use std::sync::Arc;

use contentgraph_core::{ContentStreamIdentifier, DimensionSpacePoint};

use crate::node_type::NodeTypeSchema;
use crate::store::{HierarchyStore, SubgraphScope};
use crate::subgraph::{ContentSubgraph, SubgraphSettings};

/// Shared store and schema, producing one [`ContentSubgraph`] per view.
///
/// Subgraphs are cheap and short-lived: create one per logical query
/// session. Each gets its own empty cache.
#[derive(Clone)]
pub struct ContentGraph {
    store: Arc<dyn HierarchyStore>,
    schema: Arc<dyn NodeTypeSchema>,
    settings: SubgraphSettings,
}

impl ContentGraph {
    pub fn new(store: Arc<dyn HierarchyStore>, schema: Arc<dyn NodeTypeSchema>) -> Self {
        Self {
            store,
            schema,
            settings: SubgraphSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SubgraphSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &SubgraphSettings {
        &self.settings
    }

    pub fn schema(&self) -> &Arc<dyn NodeTypeSchema> {
        &self.schema
    }

    /// A fresh subgraph for one (content stream, dimension space point).
    pub fn subgraph(
        &self,
        content_stream_identifier: ContentStreamIdentifier,
        dimension_space_point: DimensionSpacePoint,
    ) -> ContentSubgraph {
        self.subgraph_for_scope(SubgraphScope::new(
            content_stream_identifier,
            dimension_space_point,
        ))
    }

    pub fn subgraph_for_scope(&self, scope: SubgraphScope) -> ContentSubgraph {
        log::debug!("opening subgraph {scope}");
        ContentSubgraph::new(
            scope,
            Arc::clone(&self.store),
            Arc::clone(&self.schema),
            self.settings,
        )
    }
}

impl fmt::Debug for ContentGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentGraph")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, id};

    #[tokio::test]
    async fn test_subgraphs_do_not_share_caches() {
        let graph = fixtures::site_graph();
        let a = graph.subgraph(
            ContentStreamIdentifier::new("live").unwrap(),
            "language=en".parse().unwrap(),
        );
        let b = graph.subgraph(
            ContentStreamIdentifier::new("live").unwrap(),
            "language=en".parse().unwrap(),
        );

        a.find_node_by_identifier(&id("home")).await.unwrap().unwrap();
        assert_eq!(a.in_memory_cache().len(), 1);
        assert!(b.in_memory_cache().is_empty());
    }

    #[tokio::test]
    async fn test_dimension_isolation() {
        let graph = fixtures::site_graph();
        let en = graph.subgraph(
            ContentStreamIdentifier::new("live").unwrap(),
            "language=en".parse().unwrap(),
        );
        let de = graph.subgraph(
            ContentStreamIdentifier::new("live").unwrap(),
            "language=de".parse().unwrap(),
        );

        let home_de = de
            .find_node_by_node_aggregate_identifier(&fixtures::agg("agg-home"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(home_de.identifier, id("home-de"));
        assert!(en.find_node_by_identifier(&id("home-de")).await.unwrap().is_none());
    }

    #[test]
    fn test_settings_propagate() {
        let graph = fixtures::site_graph()
            .with_settings(SubgraphSettings::default().with_max_hierarchy_depth(7));
        let subgraph = graph.subgraph_for_scope(fixtures::scope("live"));
        assert_eq!(subgraph.settings().max_hierarchy_depth, 7);
    }
}
