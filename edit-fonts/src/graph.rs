//! The order in which tables are updated
//!
//! Some values in a font are derived from others: the bounding box in `head`
//! depends on the outlines in `glyf`, the extents in `hhea` depend on the
//! metrics in `hmtx`, and so on. Each table family declares which tables
//! must be updated before it, and those declarations form a directed
//! acyclic graph. Updating walks the tables present in a font in
//! topological order.

#[cfg(feature = "dot2")]
mod graphviz;

use std::collections::{BTreeMap, BTreeSet};

use font_types::Tag;

use crate::tables::AnyTable;

/// A problem with a set of dependency declarations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum GraphError {
    #[error("table '{0}' is declared as depending on itself")]
    SelfDependency(Tag),
    #[error("dependency cycle between tables {}", DisplayTags(.0))]
    Cycle(Vec<Tag>),
}

struct DisplayTags<'a>(&'a [Tag]);

impl std::fmt::Display for DisplayTags<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{tag}'")?;
        }
        Ok(())
    }
}

/// A validated set of "update X before Y" edges between tables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    // downstream -> upstream
    upstream: BTreeMap<Tag, BTreeSet<Tag>>,
    // upstream -> downstream
    downstream: BTreeMap<Tag, BTreeSet<Tag>>,
}

impl DependencyGraph {
    /// Build a graph from `(upstream, downstream)` edges.
    ///
    /// Edges may name tables that are not in any particular font. Returns an
    /// error if the edges contain a cycle.
    pub fn from_edges(edges: impl IntoIterator<Item = (Tag, Tag)>) -> Result<Self, GraphError> {
        let mut graph = DependencyGraph::default();
        for (up, down) in edges {
            if up == down {
                return Err(GraphError::SelfDependency(up));
            }
            graph.upstream.entry(down).or_default().insert(up);
            graph.upstream.entry(up).or_default();
            graph.downstream.entry(up).or_default().insert(down);
            graph.downstream.entry(down).or_default();
        }
        let order = graph.sort(graph.nodes());
        if order.len() != graph.upstream.len() {
            let sorted: BTreeSet<_> = order.into_iter().collect();
            // tables left unsorted only because they follow a cycle are not reported
            let cycle = graph
                .nodes()
                .filter(|tag| !sorted.contains(tag) && graph.on_cycle(*tag))
                .collect();
            return Err(GraphError::Cycle(cycle));
        }
        Ok(graph)
    }

    /// `true` if `tag` can be reached from its own downstream tables.
    fn on_cycle(&self, tag: Tag) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<_> = self.downstream(tag).collect();
        while let Some(next) = stack.pop() {
            if next == tag {
                return true;
            }
            if seen.insert(next) {
                stack.extend(self.downstream(next));
            }
        }
        false
    }

    /// Build a graph from per-table declarations of upstream tables.
    pub fn from_declarations<'a>(
        declarations: impl IntoIterator<Item = (Tag, &'a [Tag])>,
    ) -> Result<Self, GraphError> {
        Self::from_edges(
            declarations
                .into_iter()
                .flat_map(|(down, ups)| ups.iter().map(move |up| (*up, down))),
        )
    }

    /// The graph declared by the built-in table families.
    pub fn for_known_tables() -> Result<Self, GraphError> {
        Self::from_declarations(AnyTable::FAMILIES.iter().copied())
    }

    fn nodes(&self) -> impl Iterator<Item = Tag> + '_ {
        self.upstream.keys().copied()
    }

    /// Tables that must be updated before `tag`.
    pub fn upstream(&self, tag: Tag) -> impl Iterator<Item = Tag> + '_ {
        self.upstream.get(&tag).into_iter().flatten().copied()
    }

    /// Tables that must be updated after `tag`.
    pub fn downstream(&self, tag: Tag) -> impl Iterator<Item = Tag> + '_ {
        self.downstream.get(&tag).into_iter().flatten().copied()
    }

    /// All `(upstream, downstream)` edges, sorted.
    pub fn edges(&self) -> impl Iterator<Item = (Tag, Tag)> + '_ {
        self.downstream
            .iter()
            .flat_map(|(up, downs)| downs.iter().map(move |down| (*up, *down)))
    }

    /// The order in which to update `tables`.
    ///
    /// Every table comes after the tables it depends on, including
    /// dependencies through tables that are not in `tables`. Tables with no
    /// constraint between them are ordered by tag.
    pub fn order(&self, tables: impl IntoIterator<Item = Tag>) -> Vec<Tag> {
        let present: BTreeSet<_> = tables.into_iter().collect();
        self.sort(self.nodes().chain(present.iter().copied()))
            .into_iter()
            .filter(|tag| present.contains(tag))
            .collect()
    }

    // Kahn's algorithm, always taking the smallest ready tag.
    //
    // Nodes involved in a cycle are never ready, and are missing from the
    // result.
    fn sort(&self, nodes: impl IntoIterator<Item = Tag>) -> Vec<Tag> {
        let mut in_degree: BTreeMap<Tag, usize> = nodes
            .into_iter()
            .map(|tag| (tag, self.upstream(tag).count()))
            .collect();
        let mut ready: BTreeSet<_> = in_degree
            .iter()
            .filter_map(|(tag, count)| (*count == 0).then_some(*tag))
            .collect();
        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(tag) = ready.pop_first() {
            order.push(tag);
            for down in self.downstream(tag) {
                if let Some(count) = in_degree.get_mut(&down) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(down);
                    }
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> Tag {
        s.parse().unwrap()
    }

    fn tags(s: &[&str]) -> Vec<Tag> {
        s.iter().map(|s| tag(s)).collect()
    }

    #[test]
    fn known_tables_order() {
        let graph = DependencyGraph::for_known_tables().unwrap();
        let order = graph.order(tags(&[
            "head", "hhea", "maxp", "OS/2", "hmtx", "cmap", "loca", "glyf", "name", "post",
        ]));
        assert_eq!(
            order,
            tags(&["cmap", "glyf", "hmtx", "OS/2", "hhea", "loca", "head", "maxp", "name", "post"])
        );
    }

    #[test]
    fn known_edges() {
        let graph = DependencyGraph::for_known_tables().unwrap();
        let downstream: Vec<_> = graph.downstream(tag("glyf")).collect();
        assert_eq!(downstream, tags(&["head", "hhea", "loca", "maxp"]));
        let downstream: Vec<_> = graph.downstream(tag("hmtx")).collect();
        assert_eq!(downstream, tags(&["OS/2", "head", "hhea"]));
        let downstream: Vec<_> = graph.downstream(tag("loca")).collect();
        assert_eq!(downstream, tags(&["head"]));
        assert_eq!(graph.upstream(tag("cmap")).count(), 0);
        assert_eq!(graph.downstream(tag("cmap")).count(), 0);
        assert_eq!(graph.edges().count(), 8);
    }

    #[test]
    fn order_respects_absent_intermediates() {
        // a -> b -> c, but b is not present: a must still precede c
        let graph = DependencyGraph::from_edges([(tag("zzzz"), tag("mmmm")), (tag("mmmm"), tag("aaaa"))])
            .unwrap();
        assert_eq!(graph.order(tags(&["aaaa", "zzzz"])), tags(&["zzzz", "aaaa"]));
    }

    #[test]
    fn unrelated_tables_in_tag_order() {
        let graph = DependencyGraph::default();
        assert_eq!(
            graph.order(tags(&["post", "cmap", "name"])),
            tags(&["cmap", "name", "post"])
        );
    }

    #[test]
    fn cycle_is_rejected() {
        let result = DependencyGraph::from_edges([
            (tag("aaaa"), tag("bbbb")),
            (tag("bbbb"), tag("cccc")),
            (tag("cccc"), tag("aaaa")),
            (tag("cccc"), tag("dddd")),
        ]);
        // dddd follows the cycle but is not part of it
        assert_eq!(
            result,
            Err(GraphError::Cycle(tags(&["aaaa", "bbbb", "cccc"])))
        );
    }

    #[test]
    fn only_cycle_members_are_reported() {
        let result = DependencyGraph::from_edges([
            (tag("aaaa"), tag("bbbb")),
            (tag("bbbb"), tag("aaaa")),
            (tag("bbbb"), tag("cccc")),
            (tag("cccc"), tag("dddd")),
            (tag("dddd"), tag("eeee")),
            (tag("eeee"), tag("dddd")),
        ]);
        assert_eq!(
            result,
            Err(GraphError::Cycle(tags(&["aaaa", "bbbb", "dddd", "eeee"])))
        );
    }

    #[test]
    fn self_edge_is_rejected() {
        let result = DependencyGraph::from_edges([(tag("head"), tag("head"))]);
        assert_eq!(result, Err(GraphError::SelfDependency(tag("head"))));
    }

    #[test]
    fn declarations() {
        let glyf = tag("glyf");
        let graph = DependencyGraph::from_declarations([(tag("loca"), &[glyf][..])]).unwrap();
        assert_eq!(graph.edges().collect::<Vec<_>>(), [(glyf, tag("loca"))]);
    }
}
