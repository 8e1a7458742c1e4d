//! Marker-rooted elements and the node type shared by the whole tree
//!
//! Each element exclusively owns its children through [`Node`] values.
//! Parent links are non-owning [`Weak`] back-references that are wired up
//! once, when the element is built around its finished content. After that
//! the structure is immutable; tree operations build new trees instead of
//! editing existing ones.

use super::position::Position;
use super::text::Text;
use crate::sfm::style::Marker;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Annotation set by the parser when the opening marker had the `+` prefix
pub const NESTED: &str = "nested";
/// Annotation set when an element was closed without its explicit end marker
pub const IMPLICIT_CLOSED: &str = "implicit-closed";
/// Annotation set on notes whose `\ft` children were unwrapped into them
pub const CONTENT_PROMOTED: &str = "content-promoted";

// ============================================================================
// Annotations
// ============================================================================

/// String keyed annotation bag attached to every element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations(BTreeMap<String, Value>);

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// True when `key` is present with a truthy value
    pub fn is_set(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(_) => true,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Serialize for Annotations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

// ============================================================================
// Node
// ============================================================================

/// A child of an element, or a root of a parsed forest
#[derive(Clone, PartialEq)]
pub enum Node {
    Element(Rc<Element>),
    Text(Text),
}

impl Node {
    pub fn pos(&self) -> Position {
        match self {
            Node::Element(e) => e.pos(),
            Node::Text(t) => t.pos(),
        }
    }

    pub fn parent(&self) -> Option<Rc<Element>> {
        match self {
            Node::Element(e) => e.parent(),
            Node::Text(t) => t.parent(),
        }
    }

    pub fn as_element(&self) -> Option<&Rc<Element>> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub(crate) fn set_parent(&self, parent: Weak<Element>) {
        match self {
            Node::Element(e) => *e.parent.borrow_mut() = parent,
            Node::Text(t) => t.set_parent(parent),
        }
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Rc<Element>> for Node {
    fn from(element: Rc<Element>) -> Self {
        Node::Element(element)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(e) => e.fmt(f),
            Node::Text(t) => t.fmt(f),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Element(e) => e.serialize(serializer),
            Node::Text(t) => t.serialize(serializer),
        }
    }
}

// ============================================================================
// Element
// ============================================================================

/// A named marker with its arguments, stylesheet record and children
pub struct Element {
    name: Option<String>,
    pos: Position,
    args: Vec<String>,
    meta: Arc<Marker>,
    annotations: Annotations,
    content: Vec<Node>,
    parent: RefCell<Weak<Element>>,
}

impl Element {
    /// Start building an element called `name`
    pub fn builder(name: impl Into<String>) -> ElementBuilder {
        ElementBuilder::new(Some(name.into()))
    }

    /// Start building a nameless collector element
    pub fn anonymous() -> ElementBuilder {
        ElementBuilder::new(None)
    }

    /// Marker name without the backslash or nesting prefix
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Stylesheet record active when this element was parsed
    pub fn meta(&self) -> &Arc<Marker> {
        &self.meta
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn content(&self) -> &[Node] {
        &self.content
    }

    pub fn parent(&self) -> Option<Rc<Element>> {
        self.parent.borrow().upgrade()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.content.iter()
    }

    pub fn is_nested(&self) -> bool {
        self.annotations.is_set(NESTED)
    }

    pub fn is_implicitly_closed(&self) -> bool {
        self.annotations.is_set(IMPLICIT_CLOSED)
    }

    /// Names from the root of the tree down to this element
    pub fn path(&self) -> Vec<Option<String>> {
        let mut path = vec![self.name.clone()];
        let mut current = self.parent();
        while let Some(e) = current {
            path.push(e.name.clone());
            current = e.parent();
        }
        path.reverse();
        path
    }

    /// A builder pre-filled with this element's name, position, args, meta
    /// and annotations but no children
    pub fn to_builder(&self) -> ElementBuilder {
        ElementBuilder {
            name: self.name.clone(),
            pos: self.pos,
            args: self.args.clone(),
            meta: self.meta.clone(),
            annotations: self.annotations.clone(),
            content: Vec::new(),
        }
    }
}

impl<'a> IntoIterator for &'a Element {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args && self.content == other.content
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Element");
        s.field("name", &self.name);
        if !self.args.is_empty() {
            s.field("args", &self.args);
        }
        if !self.annotations.is_empty() {
            s.field("annotations", &self.annotations);
        }
        if !self.content.is_empty() {
            s.field("content", &self.content);
        }
        s.finish()
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Element", 5)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("pos", &self.pos)?;
        state.serialize_field("args", &self.args)?;
        state.serialize_field("annotations", &self.annotations)?;
        state.serialize_field("content", &self.content)?;
        state.end()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Collects the parts of an element; [`ElementBuilder::build`] wires the
/// parent links of the children to the new element
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    name: Option<String>,
    pos: Position,
    args: Vec<String>,
    meta: Arc<Marker>,
    annotations: Annotations,
    content: Vec<Node>,
}

impl ElementBuilder {
    fn new(name: Option<String>) -> Self {
        Self {
            name,
            pos: Position::default(),
            args: Vec::new(),
            meta: Arc::new(Marker::default()),
            annotations: Annotations::new(),
            content: Vec::new(),
        }
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn pos(mut self, pos: Position) -> Self {
        self.pos = pos;
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn meta(mut self, meta: Arc<Marker>) -> Self {
        self.meta = meta;
        self
    }

    pub fn annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn annotate(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.annotations.insert(key, value);
        self
    }

    /// Append a child node
    ///
    /// Children are shared, not copied: `build` points the parent link of
    /// every child at the new element, so an element already placed in
    /// another tree is re-parented. Pass a copy from
    /// [`crate::sfm::tree::copy`] to leave the original attached where it was.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.content.push(node.into());
        self
    }

    pub fn text(self, value: &str) -> Self {
        self.child(Text::new(value, Position::default()))
    }

    /// Append several children, re-parenting them the same way as `child`
    pub fn children<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        self.content.extend(nodes);
        self
    }

    pub fn build(self) -> Rc<Element> {
        let ElementBuilder {
            name,
            pos,
            args,
            meta,
            annotations,
            content,
        } = self;
        Rc::new_cyclic(|me| {
            for child in &content {
                child.set_parent(me.clone());
            }
            Element {
                name,
                pos,
                args,
                meta,
                annotations,
                content,
                parent: RefCell::new(Weak::new()),
            }
        })
    }

    /// Build and wrap in a [`Node`]
    pub fn node(self) -> Node {
        Node::Element(self.build())
    }
}
