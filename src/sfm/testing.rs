//! Fluent assertions over parsed forests
//!
//!     Tree shape checks written by hand with indexing and `as_element()`
//!     chains get long quickly and fail with unhelpful messages. The builders
//!     here walk the tree for you and report failures with the path of the
//!     node that did not match:
//!
//!     ```rust,ignore
//!     use sfm::sfm::testing::assert_nodes;
//!
//!     let doc = usfm::parse("\\id GEN\n\\c 1\n\\p\n\\v 1 In the beginning").unwrap();
//!     assert_nodes(&doc).count(1).node(0, |id| {
//!         id.element("id").text("GEN\n").child(1, |c| {
//!             c.element("c").args(&["1"]).child(0, |p| {
//!                 p.element("p").child_count(3);
//!             });
//!         });
//!     });
//!     ```

use crate::sfm::ast::{Element, Node, Position, IMPLICIT_CLOSED, NESTED};

/// Text matching strategies for assertions
#[derive(Debug, Clone)]
pub enum TextMatch {
    Exact(String),
    StartsWith(String),
    Contains(String),
}

impl TextMatch {
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            TextMatch::Exact(expected) => actual == expected,
            TextMatch::StartsWith(prefix) => actual.starts_with(prefix),
            TextMatch::Contains(substring) => actual.contains(substring),
        }
    }

    pub fn assert(&self, actual: &str, context: &str) {
        let (how, expected) = match self {
            TextMatch::Exact(expected) => ("to be", expected),
            TextMatch::StartsWith(prefix) => ("to start with", prefix),
            TextMatch::Contains(substring) => ("to contain", substring),
        };
        assert!(
            self.matches(actual),
            "{}: Expected text {} {:?}, but got {:?}",
            context,
            how,
            expected,
            actual
        );
    }
}

fn summarize(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            Node::Element(e) => format!("\\{}", e.name().unwrap_or("(anonymous)")),
            Node::Text(t) => format!("{:?}", t.as_str()),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Entry Point
// ============================================================================

/// Create an assertion builder for a forest
pub fn assert_nodes(nodes: &[Node]) -> NodesAssertion<'_> {
    NodesAssertion {
        nodes,
        context: "nodes".to_string(),
    }
}

// ============================================================================
// Node lists
// ============================================================================

pub struct NodesAssertion<'a> {
    nodes: &'a [Node],
    context: String,
}

impl<'a> NodesAssertion<'a> {
    pub fn count(self, expected: usize) -> Self {
        assert_eq!(
            self.nodes.len(),
            expected,
            "{}: Expected {} nodes, found {}: [{}]",
            self.context,
            expected,
            self.nodes.len(),
            summarize(self.nodes)
        );
        self
    }

    /// Assert on the node at `index`
    pub fn node<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        assert!(
            index < self.nodes.len(),
            "{}: Node index {} out of bounds ({} nodes: [{}])",
            self.context,
            index,
            self.nodes.len(),
            summarize(self.nodes)
        );
        assertion(NodeAssertion {
            node: &self.nodes[index],
            context: format!("{}[{}]", self.context, index),
        });
        self
    }

    /// Assert the element names of the nodes, `None` standing for text
    pub fn names(self, expected: &[Option<&str>]) -> Self {
        let actual: Vec<Option<&str>> = self
            .nodes
            .iter()
            .map(|node| node.as_element().and_then(|e| e.name()))
            .collect();
        assert_eq!(actual, expected, "{}: Unexpected node names", self.context);
        self
    }
}

// ============================================================================
// Single nodes
// ============================================================================

pub struct NodeAssertion<'a> {
    node: &'a Node,
    context: String,
}

impl<'a> NodeAssertion<'a> {
    /// Assert this node is an element named `name`
    pub fn element(self, name: &str) -> ElementAssertion<'a> {
        match self.node {
            Node::Element(element) => {
                assert_eq!(
                    element.name(),
                    Some(name),
                    "{}: Expected element \\{}",
                    self.context,
                    name
                );
                ElementAssertion {
                    element,
                    context: format!("{}(\\{})", self.context, name),
                }
            }
            Node::Text(text) => panic!(
                "{}: Expected element \\{}, found text {:?}",
                self.context,
                name,
                text.as_str()
            ),
        }
    }

    /// Assert this node is an element without a name
    pub fn anonymous(self) -> ElementAssertion<'a> {
        match self.node.as_element() {
            Some(element) if element.name().is_none() => ElementAssertion {
                element,
                context: self.context,
            },
            _ => panic!("{}: Expected an anonymous element", self.context),
        }
    }

    pub fn text(self, expected: &str) -> Self {
        self.text_matching(TextMatch::Exact(expected.to_string()))
    }

    pub fn text_contains(self, substring: &str) -> Self {
        self.text_matching(TextMatch::Contains(substring.to_string()))
    }

    fn text_matching(self, matcher: TextMatch) -> Self {
        match self.node.as_text() {
            Some(text) => matcher.assert(text.as_str(), &self.context),
            None => panic!("{}: Expected text, found an element", self.context),
        }
        self
    }

    pub fn pos(self, line: usize, column: usize) -> Self {
        assert_eq!(
            self.node.pos(),
            Position::new(line, column),
            "{}: Unexpected position",
            self.context
        );
        self
    }
}

// ============================================================================
// Elements
// ============================================================================

pub struct ElementAssertion<'a> {
    element: &'a Element,
    context: String,
}

impl<'a> ElementAssertion<'a> {
    pub fn args(self, expected: &[&str]) -> Self {
        assert_eq!(
            self.element.args(),
            expected,
            "{}: Unexpected arguments",
            self.context
        );
        self
    }

    pub fn pos(self, line: usize, column: usize) -> Self {
        assert_eq!(
            self.element.pos(),
            Position::new(line, column),
            "{}: Unexpected position",
            self.context
        );
        self
    }

    pub fn nested(self, expected: bool) -> Self {
        self.flag(NESTED, expected)
    }

    pub fn implicitly_closed(self, expected: bool) -> Self {
        self.flag(IMPLICIT_CLOSED, expected)
    }

    /// Assert a boolean annotation is (or is not) set
    pub fn flag(self, key: &str, expected: bool) -> Self {
        assert_eq!(
            self.element.annotations().is_set(key),
            expected,
            "{}: Expected annotation '{}' to be {}",
            self.context,
            key,
            if expected { "set" } else { "unset" }
        );
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        assert_eq!(
            self.element.len(),
            expected,
            "{}: Expected {} children, found {}: [{}]",
            self.context,
            expected,
            self.element.len(),
            summarize(self.element.content())
        );
        self
    }

    pub fn empty(self) -> Self {
        self.child_count(0)
    }

    /// Concatenation of the element's direct text children
    pub fn text(self, expected: &str) -> Self {
        let actual: String = self
            .element
            .content()
            .iter()
            .filter_map(Node::as_text)
            .map(|t| t.as_str())
            .collect();
        TextMatch::Exact(expected.to_string()).assert(&actual, &self.context);
        self
    }

    /// Assert on the child at `index`
    pub fn child<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        let content = self.element.content();
        assert!(
            index < content.len(),
            "{}: Child index {} out of bounds ({} children: [{}])",
            self.context,
            index,
            content.len(),
            summarize(content)
        );
        assertion(NodeAssertion {
            node: &content[index],
            context: format!("{}/{}", self.context, index),
        });
        self
    }

    /// Assert on all children at once
    pub fn children<F>(self, assertion: F) -> Self
    where
        F: FnOnce(NodesAssertion<'a>),
    {
        assertion(NodesAssertion {
            nodes: self.element.content(),
            context: self.context.clone(),
        });
        self
    }
}
