//! Support for generating graphviz files from the dependency graph

use font_types::Tag;

use super::DependencyGraph;

impl DependencyGraph {
    /// Write out this graph as a graphviz file to the provided path.
    ///
    /// Overwrites any existing file at this location.
    pub fn write_graphviz(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_graphviz()?)
    }

    /// Render this graph in the graphviz `dot` language.
    pub fn to_graphviz(&self) -> std::io::Result<Vec<u8>> {
        let view = GraphVizGraph {
            nodes: self.nodes().collect(),
            edges: self.edges().collect(),
        };
        let mut buf = Vec::new();
        dot2::render(&view, &mut buf).map_err(|e| std::io::Error::other(format!("{e:?}")))?;
        Ok(buf)
    }
}

struct GraphVizGraph {
    nodes: Vec<Tag>,
    edges: Vec<(Tag, Tag)>,
}

impl<'a> dot2::GraphWalk<'a> for GraphVizGraph {
    type Node = Tag;
    type Edge = (Tag, Tag);
    type Subgraph = ();

    fn nodes(&'a self) -> dot2::Nodes<'a, Self::Node> {
        self.nodes.as_slice().into()
    }

    fn edges(&'a self) -> dot2::Edges<'a, Self::Edge> {
        self.edges.as_slice().into()
    }

    fn source(&'a self, edge: &Self::Edge) -> Self::Node {
        edge.0
    }

    fn target(&'a self, edge: &Self::Edge) -> Self::Node {
        edge.1
    }
}

impl<'a> dot2::Labeller<'a> for GraphVizGraph {
    type Node = Tag;
    type Edge = (Tag, Tag);
    type Subgraph = ();

    fn graph_id(&'a self) -> dot2::Result<dot2::Id<'a>> {
        dot2::Id::new("TableDependencies")
    }

    fn node_id(&'a self, n: &Self::Node) -> dot2::Result<dot2::Id<'a>> {
        // ids must be identifiers; tags can contain '/' and spaces
        dot2::Id::new(format!("T{:08X}", n.to_u32()))
    }

    fn node_label<'b>(&'b self, n: &Self::Node) -> dot2::Result<dot2::label::Text<'b>> {
        Ok(dot2::label::Text::LabelStr(n.to_string().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_known_tables() {
        let graph = DependencyGraph::for_known_tables().unwrap();
        let dot = String::from_utf8(graph.to_graphviz().unwrap()).unwrap();
        assert!(dot.contains("TableDependencies"));
        assert!(dot.contains("OS/2"));
        assert_eq!(dot.matches("->").count(), graph.edges().count());
    }
}
