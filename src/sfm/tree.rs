//! Structural operations over parsed forests
//!
//! Trees are immutable once built, so every operation here returns a new
//! forest (or a value folded from one). Positions, records and annotations
//! of rebuilt elements are carried over from the originals and parent links
//! are rewired to the new elements.
//!
//! Predicates for [`sfilter`] are plain closures over elements; [`mpath`] and
//! [`text_properties`] build the common ones.

use crate::sfm::ast::{Element, Node, Text};
use std::rc::Rc;

/// Structural left fold
///
/// Text nodes are folded with `text_fn(text, acc)`. For an element, its
/// children are folded first, starting again from `initial`, and the result
/// is handed to `elem_fn(element, acc, folded_children)`.
pub fn sreduce<A, E, T>(mut elem_fn: E, mut text_fn: T, trees: &[Node], initial: A) -> A
where
    A: Clone,
    E: FnMut(&Rc<Element>, A, A) -> A,
    T: FnMut(&Text, A) -> A,
{
    fn fold<A, E, T>(elem_fn: &mut E, text_fn: &mut T, nodes: &[Node], initial: &A, acc: A) -> A
    where
        A: Clone,
        E: FnMut(&Rc<Element>, A, A) -> A,
        T: FnMut(&Text, A) -> A,
    {
        nodes.iter().fold(acc, |acc, node| match node {
            Node::Text(text) => text_fn(text, acc),
            Node::Element(element) => {
                let children =
                    fold(elem_fn, text_fn, element.content(), initial, initial.clone());
                elem_fn(element, acc, children)
            }
        })
    }

    let start = initial.clone();
    fold(&mut elem_fn, &mut text_fn, trees, &initial, start)
}

/// Parts of an element handed to and returned from an [`smap`] element function
pub type ElementParts = (Option<String>, Vec<String>, Vec<Node>);

/// Structural map
///
/// `elem_fn(name, args, mapped_children)` returns the name, args and
/// children of the replacement element; `text_fn(text)` returns the
/// replacement string for a text node.
pub fn smap<E, T>(mut elem_fn: E, mut text_fn: T, trees: &[Node]) -> Vec<Node>
where
    E: FnMut(Option<&str>, &[String], Vec<Node>) -> ElementParts,
    T: FnMut(&Text) -> String,
{
    fn map<E, T>(elem_fn: &mut E, text_fn: &mut T, node: &Node) -> Node
    where
        E: FnMut(Option<&str>, &[String], Vec<Node>) -> ElementParts,
        T: FnMut(&Text) -> String,
    {
        match node {
            Node::Text(text) => Node::Text(Text::new(text_fn(text), text.pos())),
            Node::Element(element) => {
                let children = element
                    .content()
                    .iter()
                    .map(|child| map(elem_fn, text_fn, child))
                    .collect();
                let (name, args, children) = elem_fn(element.name(), element.args(), children);
                element
                    .to_builder()
                    .name(name)
                    .args(args)
                    .children(children)
                    .node()
            }
        }
    }

    trees
        .iter()
        .map(|node| map(&mut elem_fn, &mut text_fn, node))
        .collect()
}

/// Structural filter
///
/// An element is kept when `predicate` accepts it or when any of its
/// descendants is kept. A text node is kept when its parent element is
/// accepted; top-level text has no parent and is dropped.
pub fn sfilter<P>(predicate: P, trees: &[Node]) -> Vec<Node>
where
    P: Fn(&Element) -> bool,
{
    fn filter<P: Fn(&Element) -> bool>(predicate: &P, node: &Node) -> Option<Node> {
        match node {
            Node::Text(text) => text
                .parent()
                .filter(|parent| predicate(parent.as_ref()))
                .map(|_| Node::Text(text.clone())),
            Node::Element(element) => {
                let children: Vec<Node> = element
                    .content()
                    .iter()
                    .filter_map(|child| filter(predicate, child))
                    .collect();
                if children.is_empty() && !predicate(element.as_ref()) {
                    return None;
                }
                Some(element.to_builder().children(children).node())
            }
        }
    }

    trees
        .iter()
        .filter_map(|node| filter(&predicate, node))
        .collect()
}

/// Accepts elements whose root-to-element name path ends with `names`
///
/// `mpath(["c", "p", "v"])` selects verses directly under paragraphs
/// directly under chapters.
pub fn mpath<I, S>(names: I) -> impl Fn(&Element) -> bool
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    move |element: &Element| {
        let path = element.path();
        path.len() >= names.len()
            && path[path.len() - names.len()..]
                .iter()
                .zip(&names)
                .all(|(step, name)| step.as_deref() == Some(name.as_str()))
    }
}

/// Accepts elements whose record has all of the given text properties
pub fn text_properties<I, S>(props: I) -> impl Fn(&Element) -> bool
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let props: Vec<String> = props.into_iter().map(Into::into).collect();
    move |element: &Element| {
        props
            .iter()
            .all(|prop| element.meta().text_properties.contains(prop))
    }
}

/// Deep copy of a forest
pub fn copy(trees: &[Node]) -> Vec<Node> {
    smap(
        |name, args, children| (name.map(str::to_string), args.to_vec(), children),
        |text| text.as_str().to_string(),
        trees,
    )
}
