use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::error::RouteError;
use super::tree::{NodeId, RouteTree, SegmentKind};
use crate::spec::SchemaType;
use crate::validator::simple_validate;
use crate::value::{Map, Value};

/// A resolved route: the terminal node, its handler set and the typed path parameters.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub node: NodeId,
    /// Names of the matched nodes joined with `/`
    pub full_name: String,
    pub handlers: &'a HashMap<Method, Arc<H>>,
    pub path_params: Map,
    /// Segments left over after the terminal node
    pub remaining_path: Vec<String>,
}

impl<H> RouteMatch<'_, H> {
    /// Handler registered for `method`, if any.
    #[must_use]
    pub fn handler(&self, method: &Method) -> Option<&Arc<H>> {
        self.handlers.get(method)
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    trail: Vec<NodeId>,
    path_params: Map,
    consumed: usize,
}

impl Candidate {
    fn node(&self) -> Option<NodeId> {
        self.trail.last().copied()
    }
}

impl<H> RouteTree<H> {
    /// Resolve `segments` (empty segments already removed) to a single terminal node.
    ///
    /// Every structurally valid match is collected first: literal children are followed on an
    /// exact name match, placeholder children whenever the segment parses as their type. Ties
    /// are broken by, in turn, the fewest unconsumed segments, a literal final segment, and the
    /// placeholder type priority. `Ok(None)` means nothing matched; a tie that survives every
    /// rule is [`RouteError::Ambiguous`].
    pub fn resolve<S: AsRef<str>>(
        &self,
        segments: &[S],
    ) -> Result<Option<RouteMatch<'_, H>>, RouteError> {
        let segments: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
        let mut candidates = Vec::new();
        self.explore(
            self.root(),
            &segments,
            Candidate {
                trail: Vec::new(),
                path_params: Map::new(),
                consumed: 0,
            },
            &mut candidates,
        );
        debug!(
            path = %segments.join("/"),
            candidates = candidates.len(),
            "Collected route candidates"
        );

        let winner = match self.disambiguate(candidates, &segments)? {
            Some(winner) => winner,
            None => return Ok(None),
        };
        let node = winner.node().unwrap_or_else(|| self.root());
        let handlers = match self.node(node).handlers() {
            Some(handlers) => handlers,
            None => return Ok(None),
        };
        let full_name = winner
            .trail
            .iter()
            .map(|id| self.node(*id).name.as_str())
            .collect::<Vec<_>>()
            .join("/");
        Ok(Some(RouteMatch {
            node,
            full_name,
            handlers,
            path_params: winner.path_params,
            remaining_path: segments[winner.consumed..]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }))
    }

    fn explore(&self, id: NodeId, segments: &[&str], current: Candidate, out: &mut Vec<Candidate>) {
        let node = self.node(id);
        if node.is_terminal() {
            trace!(node = %node.name, remaining = segments.len() - current.consumed, "Terminal candidate");
            out.push(current.clone());
        }
        let Some(segment) = segments.get(current.consumed) else {
            return;
        };

        if let Some(child) = self.literal_child(id, segment) {
            let mut next = current.clone();
            next.trail.push(child);
            next.consumed += 1;
            self.explore(child, segments, next, out);
        }

        for child in &node.placeholders {
            let SegmentKind::Placeholder { kind, param } = &self.node(*child).kind else {
                continue;
            };
            match simple_validate(&Value::from(*segment), *kind) {
                Ok(value) => {
                    let mut next = current.clone();
                    next.trail.push(*child);
                    next.consumed += 1;
                    next.path_params.insert(param.clone(), value);
                    self.explore(*child, segments, next, out);
                }
                Err(e) => trace!(segment = %segment, kind = %kind, error = %e, "Placeholder rejected segment"),
            }
        }
    }

    fn disambiguate(
        &self,
        candidates: Vec<Candidate>,
        segments: &[&str],
    ) -> Result<Option<Candidate>, RouteError> {
        let min_remaining = match candidates.iter().map(|c| segments.len() - c.consumed).min() {
            Some(min) => min,
            None => return Ok(None),
        };
        let mut tied: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| segments.len() - c.consumed == min_remaining)
            .collect();
        if tied.len() == 1 {
            return Ok(tied.pop());
        }

        let describe = |set: &[Candidate]| {
            set.iter()
                .map(|c| {
                    c.trail
                        .iter()
                        .map(|id| self.node(*id).name.as_str())
                        .collect::<Vec<_>>()
                        .join("/")
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        let (mut literal, placeholder): (Vec<Candidate>, Vec<Candidate>) =
            tied.into_iter().partition(|c| match c.node() {
                Some(id) => !self.node(id).is_placeholder(),
                None => true,
            });
        if !literal.is_empty() {
            if literal.len() == 1 {
                return Ok(literal.pop());
            }
            return Err(RouteError::ambiguous(format!(
                "{} literal matches for '{}': [{}]",
                literal.len(),
                segments.join("/"),
                describe(&literal)
            )));
        }

        for kind in self.placeholder_types() {
            let mut of_kind: Vec<Candidate> = placeholder
                .iter()
                .filter(|c| self.final_kind(c) == Some(*kind))
                .cloned()
                .collect();
            match of_kind.len() {
                0 => continue,
                1 => return Ok(of_kind.pop()),
                n => {
                    return Err(RouteError::ambiguous(format!(
                        "{} '{}' placeholder matches for '{}': [{}]",
                        n,
                        kind,
                        segments.join("/"),
                        describe(&of_kind)
                    )))
                }
            }
        }

        Err(RouteError::ambiguous(format!(
            "no tie-break settled '{}': [{}]",
            segments.join("/"),
            describe(&placeholder)
        )))
    }

    fn final_kind(&self, candidate: &Candidate) -> Option<SchemaType> {
        match &self.node(candidate.node()?).kind {
            SegmentKind::Placeholder { kind, .. } => Some(*kind),
            SegmentKind::Literal => None,
        }
    }
}
