//! Segment tree nodes.
//!
//! Each node stands for one `/`-separated segment. Static children are kept
//! sorted so lookups can binary search; a node has at most one parameter child
//! and at most one wildcard child.

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// Kind of a pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal text such as `users`.
    Static,
    /// `{name}`: matches exactly one segment.
    Param(String),
    /// `*name`: matches the rest of the path, possibly empty.
    Wildcard(String),
}

/// A node of the routing tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    segment: String,
    kind: SegmentKind,
    methods: Option<MethodRouter<T>>,
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_kind(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates the root of an empty tree.
    #[must_use]
    pub fn root() -> Self {
        Self::with_kind("", SegmentKind::Static)
    }

    /// Segment text as written in the pattern.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Segment kind.
    #[must_use]
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// Splits a pattern into typed segments. Empty segments are dropped, so
    /// `/users/` and `/users` are the same pattern.
    pub(crate) fn parse_pattern(path: &str) -> Result<Vec<(String, SegmentKind)>, RouteError> {
        let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let last = raw.len().saturating_sub(1);
        raw.iter()
            .enumerate()
            .map(|(i, s)| {
                let kind = if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    SegmentKind::Param(name.to_string())
                } else if let Some(name) = s.strip_prefix('*') {
                    if i != last {
                        return Err(RouteError::WildcardNotLast {
                            path: path.to_string(),
                        });
                    }
                    SegmentKind::Wildcard(name.to_string())
                } else {
                    SegmentKind::Static
                };
                match &kind {
                    SegmentKind::Param(n) | SegmentKind::Wildcard(n) if n.is_empty() => {
                        Err(RouteError::UnnamedParam {
                            path: path.to_string(),
                        })
                    }
                    _ => Ok(((*s).to_string(), kind)),
                }
            })
            .collect()
    }

    /// Adds `value` for `method` at `path`.
    pub fn insert(&mut self, method: &Method, path: &str, value: T) -> Result<(), RouteError> {
        let segments = Self::parse_pattern(path)?;
        let target = self.descend_or_create(&segments, path)?;
        let table = target.methods.get_or_insert_with(MethodRouter::new);
        table.insert(method, value).map_err(|(err, _)| match err {
            RouteError::Conflict { method, .. } => RouteError::Conflict {
                method,
                path: path.to_string(),
            },
            other => other,
        })
    }

    fn descend_or_create(
        &mut self,
        segments: &[(String, SegmentKind)],
        path: &str,
    ) -> Result<&mut Node<T>, RouteError> {
        let Some(((segment, kind), rest)) = segments.split_first() else {
            return Ok(self);
        };

        let child = match kind {
            SegmentKind::Static => {
                let idx = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(idx) => idx,
                    Err(idx) => {
                        self.static_children
                            .insert(idx, Node::with_kind(segment.clone(), SegmentKind::Static));
                        idx
                    }
                };
                &mut self.static_children[idx]
            }
            SegmentKind::Param(name) | SegmentKind::Wildcard(name) => {
                let slot = if matches!(kind, SegmentKind::Param(_)) {
                    &mut self.param_child
                } else {
                    &mut self.wildcard_child
                };
                let child = slot.get_or_insert_with(|| Box::new(Node::with_kind(segment.clone(), kind.clone())));
                if let SegmentKind::Param(existing) | SegmentKind::Wildcard(existing) = &child.kind {
                    if existing != name {
                        return Err(RouteError::ParamConflict {
                            path: path.to_string(),
                            existing: existing.clone(),
                            found: name.clone(),
                        });
                    }
                }
                child.as_mut()
            }
        };
        child.descend_or_create(rest, path)
    }

    /// Finds the method table for a concrete request path.
    ///
    /// Static segments are tried first, then the parameter child, then the
    /// wildcard. A failing branch releases the captures it made.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let table = self.match_segments(&segments, &mut params)?;
        Some((table, params))
    }

    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a MethodRouter<T>> {
        let Some((segment, rest)) = segments.split_first() else {
            if let Some(table) = &self.methods {
                return Some(table);
            }
            // `/files/*path` also answers `/files`.
            let wildcard = self.wildcard_child.as_ref()?;
            let table = wildcard.methods.as_ref()?;
            if let SegmentKind::Wildcard(name) = &wildcard.kind {
                params.push(name.clone(), "");
            }
            return Some(table);
        };

        if let Ok(idx) = self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
        {
            if let Some(found) = self.static_children[idx].match_segments(rest, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(rest, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        let child = self.wildcard_child.as_ref()?;
        let table = child.methods.as_ref()?;
        if let SegmentKind::Wildcard(name) = &child.kind {
            params.push(name.clone(), segments.join("/"));
        }
        Some(table)
    }

    /// Visits every registered `(pattern, table)` pair, depth first.
    pub fn walk<'a>(&'a self, prefix: &str, visit: &mut dyn FnMut(&str, &'a MethodRouter<T>)) {
        let here = if self.segment.is_empty() {
            prefix.to_string()
        } else {
            format!("{prefix}/{}", self.segment)
        };
        if let Some(table) = &self.methods {
            if here.is_empty() {
                visit("/", table);
            } else {
                visit(&here, table);
            }
        }
        for child in &self.static_children {
            child.walk(&here, visit);
        }
        if let Some(child) = &self.param_child {
            child.walk(&here, visit);
        }
        if let Some(child) = &self.wildcard_child {
            child.walk(&here, visit);
        }
    }
}
