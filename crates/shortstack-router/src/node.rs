//! Radix tree node implementation.
//!
//! Each node represents one path segment. Unlike a first-match trie, lookup
//! walks every branch that can match and reports all candidate entries; the
//! router then ranks them by specificity and registration order.

use crate::params::Params;
use crate::pattern::Segment;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Named capture (e.g., ":id", "{id}")
    Param(String),
    /// Catch-all glob (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// The path segment this node represents
    segment: String,

    /// The kind of segment (static, param, or wildcard)
    kind: SegmentKind,

    /// Router entries ending at this node
    entries: Vec<usize>,

    /// Static children, sorted by segment for binary search
    static_children: Vec<Node>,

    /// Capture children, one per distinct capture name
    param_children: Vec<Node>,

    /// Glob children, always leaves
    wildcard_children: Vec<Node>,
}

impl Node {
    fn new(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            entries: Vec::new(),
            static_children: Vec::new(),
            param_children: Vec::new(),
            wildcard_children: Vec::new(),
        }
    }

    /// Creates a root node for the tree.
    pub(crate) fn root() -> Self {
        Self::new(String::new(), SegmentKind::Static)
    }

    /// Inserts a compiled variant, attaching `entry` to its final node.
    pub(crate) fn insert(&mut self, segments: &[Segment], entry: usize) {
        let Some((first, rest)) = segments.split_first() else {
            self.entries.push(entry);
            return;
        };

        let child = match first {
            Segment::Literal(text) => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(text))
                {
                    Ok(i) => &mut self.static_children[i],
                    Err(i) => {
                        // Keep sorted for binary search
                        self.static_children
                            .insert(i, Node::new(text.clone(), SegmentKind::Static));
                        &mut self.static_children[i]
                    }
                }
            }
            Segment::Capture(name) => {
                Self::child_for(&mut self.param_children, name, SegmentKind::Param(name.clone()))
            }
            Segment::Glob(name) => Self::child_for(
                &mut self.wildcard_children,
                name,
                SegmentKind::Wildcard(name.clone()),
            ),
        };
        child.insert(rest, entry);
    }

    fn child_for<'a>(children: &'a mut Vec<Node>, name: &str, kind: SegmentKind) -> &'a mut Node {
        let index = match children.iter().position(|c| c.segment == name) {
            Some(i) => i,
            None => {
                children.push(Node::new(name.to_string(), kind));
                children.len() - 1
            }
        };
        &mut children[index]
    }

    /// Collects every entry reachable by `segments`, with its captures.
    pub(crate) fn collect(
        &self,
        segments: &[&str],
        params: &mut Params,
        out: &mut Vec<(usize, Params)>,
    ) {
        let Some((first, rest)) = segments.split_first() else {
            out.extend(self.entries.iter().map(|&entry| (entry, params.clone())));
            return;
        };

        if let Some(child) = self.find_static_child(first) {
            child.collect(rest, params, out);
        }

        let mark = params.len();
        for child in &self.param_children {
            if let SegmentKind::Param(name) = &child.kind {
                params.push(name.clone(), *first);
                child.collect(rest, params, out);
                params.truncate(mark);
            }
        }

        for child in &self.wildcard_children {
            if let SegmentKind::Wildcard(name) = &child.kind {
                params.push(name.clone(), segments.join("/"));
                out.extend(child.entries.iter().map(|&entry| (entry, params.clone())));
                params.truncate(mark);
            }
        }
    }

    /// Finds a static child by segment using binary search.
    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;

    fn tree(patterns: &[&str]) -> Node {
        let mut root = Node::root();
        for (entry, source) in patterns.iter().enumerate() {
            let pattern = Pattern::parse(source).unwrap();
            for variant in pattern.variants() {
                root.insert(variant.segments(), entry);
            }
        }
        root
    }

    fn collect(root: &Node, path: &str) -> Vec<(usize, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut out = Vec::new();
        root.collect(&segments, &mut Params::new(), &mut out);
        out
    }

    #[test]
    fn test_static_children_stay_sorted() {
        let root = tree(&["/zeta", "/alpha", "/mid"]);
        let names: Vec<_> = root
            .static_children
            .iter()
            .map(|c| c.segment.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_collects_all_candidates() {
        let root = tree(&["/posts/:id", "/posts/featured"]);
        let found: Vec<usize> = collect(&root, "/posts/featured")
            .into_iter()
            .map(|(e, _)| e)
            .collect();
        assert_eq!(found, vec![1, 0]);
    }

    #[test]
    fn test_distinct_capture_names_keep_their_own_nodes() {
        let root = tree(&["/posts/:id", "/posts/:slug/edit"]);
        let found = collect(&root, "/posts/hello/edit");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.get("slug"), Some("hello"));
        assert_eq!(found[0].1.get("id"), None);
    }

    #[test]
    fn test_backtracking_drops_stale_captures() {
        let root = tree(&["/a/:x/b", "/a/:y/c"]);
        let found = collect(&root, "/a/1/c");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.len(), 1);
        assert_eq!(found[0].1.get("y"), Some("1"));
    }

    #[test]
    fn test_glob_captures_remaining_segments() {
        let root = tree(&["/files/*path"]);
        let found = collect(&root, "/files/images/logo.png");
        assert_eq!(found[0].1.get("path"), Some("images/logo.png"));
        assert!(collect(&root, "/files").is_empty());
    }

    #[test]
    fn test_root_entry() {
        let root = tree(&["/"]);
        assert_eq!(collect(&root, "/").len(), 1);
        assert_eq!(collect(&root, "").len(), 1);
    }
}
