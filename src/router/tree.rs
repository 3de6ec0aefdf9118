use http::Method;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use super::error::RouteError;
use crate::spec::SchemaType;

/// Method names a path segment may never take.
pub const HTTP_METHODS: [&str; 8] = [
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "TRACE",
];

/// Handle to a node in a [`RouteTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// What a node matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Exactly its own name
    Literal,
    /// Any segment that parses as `kind`, bound to `param`
    Placeholder { kind: SchemaType, param: String },
}

/// One node of the routing tree.
#[derive(Debug)]
pub struct PathNode<H> {
    pub name: String,
    pub kind: SegmentKind,
    pub(crate) children: BTreeMap<String, NodeId>,
    pub(crate) placeholders: Vec<NodeId>,
    pub(crate) handlers: Option<HashMap<Method, Arc<H>>>,
}

impl<H> PathNode<H> {
    fn new(name: String, kind: SegmentKind) -> Self {
        Self {
            name,
            kind,
            children: BTreeMap::new(),
            placeholders: Vec::new(),
            handlers: None,
        }
    }

    /// A node is terminal iff it carries a handler set.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.handlers.is_some()
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, SegmentKind::Placeholder { .. })
    }

    #[must_use]
    pub fn handlers(&self) -> Option<&HashMap<Method, Arc<H>>> {
        self.handlers.as_ref()
    }
}

/// Arena-backed tree of literal and typed-placeholder path segments.
///
/// Built once at registration time and only read afterwards. Placeholder segments are written
/// `{prefix}{type}-{name}`, e.g. `is-x-integer-userId`.
#[derive(Debug)]
pub struct RouteTree<H> {
    pub(crate) nodes: Vec<PathNode<H>>,
    prefix: String,
    placeholder_types: Vec<SchemaType>,
}

impl<H> RouteTree<H> {
    /// Empty tree using `prefix` for placeholder markers and `[integer, string]` as the
    /// placeholder type priority.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            nodes: vec![PathNode::new(String::new(), SegmentKind::Literal)],
            prefix: prefix.into(),
            placeholder_types: vec![SchemaType::Integer, SchemaType::String],
        }
    }

    /// Placeholder types in tie-break priority order.
    #[must_use]
    pub fn with_placeholder_types(mut self, types: Vec<SchemaType>) -> Self {
        self.placeholder_types = types;
        self
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn placeholder_types(&self) -> &[SchemaType] {
        &self.placeholder_types
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &PathNode<H> {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Register `handler` for `method` on the `/`-separated `path`.
    ///
    /// Missing intermediate nodes are created. Fails on segments named like an HTTP method,
    /// malformed placeholder markers, and a second registration of the same path and method.
    pub fn insert(&mut self, path: &str, method: Method, handler: H) -> Result<NodeId, RouteError> {
        let mut current = self.root();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.child_or_insert(current, segment)?;
        }

        let node = &mut self.nodes[current.0];
        let handlers = node.handlers.get_or_insert_with(HashMap::new);
        if handlers.contains_key(&method) {
            return Err(RouteError::invalid(
                path,
                format!("a {} handler is already registered", method),
            ));
        }
        debug!(path = %path, method = %method, "Registered route");
        handlers.insert(method, Arc::new(handler));
        Ok(current)
    }

    fn child_or_insert(&mut self, parent: NodeId, segment: &str) -> Result<NodeId, RouteError> {
        if let Some(id) = self.nodes[parent.0].children.get(segment) {
            return Ok(*id);
        }
        if HTTP_METHODS.iter().any(|m| m.eq_ignore_ascii_case(segment)) {
            return Err(RouteError::invalid(
                segment,
                "segments must not be named like an HTTP method",
            ));
        }

        let kind = self.parse_segment(segment)?;
        let id = NodeId(self.nodes.len());
        let placeholder = matches!(kind, SegmentKind::Placeholder { .. });
        self.nodes.push(PathNode::new(segment.to_string(), kind));
        let parent = &mut self.nodes[parent.0];
        parent.children.insert(segment.to_string(), id);
        if placeholder {
            parent.placeholders.push(id);
        }
        Ok(id)
    }

    fn parse_segment(&self, segment: &str) -> Result<SegmentKind, RouteError> {
        let marker = match segment.strip_prefix(self.prefix.as_str()) {
            Some(marker) if !self.prefix.is_empty() => marker,
            _ => return Ok(SegmentKind::Literal),
        };
        let (kind, param) = marker.split_once('-').ok_or_else(|| {
            RouteError::invalid(segment, "placeholder must be written <prefix><type>-<name>")
        })?;
        if param.is_empty() {
            return Err(RouteError::invalid(segment, "placeholder name is empty"));
        }
        let kind = self
            .placeholder_types
            .iter()
            .copied()
            .find(|t| t.as_str() == kind)
            .ok_or_else(|| {
                RouteError::invalid(
                    segment,
                    format!("placeholder type '{}' is not a recognised placeholder type", kind),
                )
            })?;
        Ok(SegmentKind::Placeholder {
            kind,
            param: param.to_string(),
        })
    }

    /// Literal child of `parent` named exactly `segment`.
    #[must_use]
    pub fn literal_child(&self, parent: NodeId, segment: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .get(segment)
            .copied()
            .filter(|id| !self.nodes[id.0].is_placeholder())
    }

    /// Every registered `(path, method, handler)`, sorted by path.
    #[must_use]
    pub fn routes(&self) -> Vec<(String, Method, Arc<H>)> {
        let mut out = Vec::new();
        self.collect_routes(self.root(), String::new(), &mut out);
        out.sort_by(|a, b| (a.0.as_str(), a.1.as_str()).cmp(&(b.0.as_str(), b.1.as_str())));
        out
    }

    fn collect_routes(&self, id: NodeId, path: String, out: &mut Vec<(String, Method, Arc<H>)>) {
        let node = &self.nodes[id.0];
        if let Some(handlers) = &node.handlers {
            for (method, handler) in handlers {
                out.push((path.clone(), method.clone(), Arc::clone(handler)));
            }
        }
        for (name, child) in &node.children {
            self.collect_routes(*child, format!("{}/{}", path, name), out);
        }
    }
}
