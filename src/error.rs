use thiserror::Error;

/// Problems found while validating a scene before routing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("duplicate node id: {id}")]
    DuplicateNode { id: String },

    #[error("edge {edge} references unknown node {node}")]
    UnknownNode { edge: String, node: String },

    #[error("duplicate edge id: {id}")]
    DuplicateEdge { id: String },

    #[error("node {id} has non-finite geometry")]
    InvalidGeometry { id: String },
}

impl SceneError {
    pub fn unknown_node(edge: &str, node: &str) -> Self {
        Self::UnknownNode {
            edge: edge.to_string(),
            node: node.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_ids() {
        let err = SceneError::unknown_node("e1", "ghost");
        assert_eq!(err.to_string(), "edge e1 references unknown node ghost");
        let err = SceneError::DuplicateNode { id: "A".into() };
        assert!(err.to_string().contains("A"));
    }
}
