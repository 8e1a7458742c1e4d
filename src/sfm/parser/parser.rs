//! Stylesheet guided SFM parser
//!
//! The parser pulls tokens on demand and yields one finished root-level node
//! per call to [`Iterator::next`]. Open elements live on an explicit stack of
//! [`Frame`]s; an element is only turned into an immutable [`Element`] once
//! its sub-parser has consumed all of its content.
//!
//! Each marker token goes through the same steps:
//!
//! 1. An end marker glued to following text (`\f*and`) is split in two and
//!    the text part is pushed back onto the token stream.
//! 2. The name is looked up in the stylesheet. Unknown names are reported and
//!    fall back to the default record.
//! 3. If the record allows the marker under the current element, a new frame
//!    is opened and the sub-parser registered for its text type fills it.
//!    A record without a text type is an end marker and closes the current
//!    frame instead.
//! 4. Otherwise the current frame is closed (implicitly, when it expects an
//!    end marker) and the token is pushed back for the enclosing frame.
//!
//! At the top level a rejected end marker is unrecoverable, while a rejected
//! start marker is reported and opened anyway.

use crate::sfm::ast::{Annotations, Element, Node, Position, Text, IMPLICIT_CLOSED, NESTED};
use crate::sfm::error::{Diagnostic, ErrorKind, ErrorLevel, ParseError};
use crate::sfm::lexer::{tokeniser, PutBack, Token, Tokenizer};
use crate::sfm::parser::options::ParserOptions;
use crate::sfm::parser::text_types::{default_text_types, parse_default};
use crate::sfm::style::{Marker, Stylesheet, TextType};
use std::collections::{BTreeSet, HashMap};
use std::iter::FusedIterator;
use std::rc::Rc;
use std::sync::Arc;

/// Fills the innermost open frame from the token stream
pub type TextTypeParser = fn(&mut Parser<'_>) -> Result<(), ParseError>;

type TokenStream<'a> = PutBack<Box<dyn Iterator<Item = Token> + 'a>>;

/// An element that is still being parsed
#[derive(Debug)]
pub struct Frame {
    pub name: String,
    pub pos: Position,
    pub meta: Arc<Marker>,
    pub args: Vec<String>,
    pub annotations: Annotations,
    pub content: Vec<Node>,
}

impl Frame {
    fn new(name: String, pos: Position, meta: Arc<Marker>, nested: bool) -> Self {
        let mut annotations = Annotations::new();
        if nested {
            annotations.insert(NESTED, true);
        }
        Self {
            name,
            pos,
            meta,
            args: Vec::new(),
            annotations,
            content: Vec::new(),
        }
    }

    pub fn push(&mut self, node: Node) {
        self.content.push(node);
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn into_element(self) -> Rc<Element> {
        Element::builder(self.name)
            .pos(self.pos)
            .args(self.args)
            .meta(self.meta)
            .annotations(self.annotations)
            .children(self.content)
            .build()
    }
}

/// Outcome of feeding one token to the innermost frame
#[derive(Debug)]
pub enum Step {
    /// A finished node belonging to the innermost frame, or to the top level
    Node(Node),
    /// The token produced nothing
    Skip,
    /// The innermost frame is complete
    Close,
}

pub struct Parser<'a> {
    tokens: TokenStream<'a>,
    stylesheet: &'a Stylesheet,
    source_name: String,
    default_meta: Option<Arc<Marker>>,
    private_prefix: Option<String>,
    error_level: ErrorLevel,
    text_types: HashMap<TextType, TextTypeParser>,
    stack: Vec<Frame>,
    warnings: Vec<Diagnostic>,
    last_unknown: Option<Position>,
    failed: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser over `lines`, each of which keeps its line terminator
    pub fn new<I, S>(
        lines: I,
        stylesheet: &'a Stylesheet,
        options: ParserOptions,
    ) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: 'a,
        S: AsRef<str>,
    {
        options
            .validate()
            .map_err(|msg| ParseError::assertion(&options.source_name, msg))?;
        let pattern = tokeniser(&options.tag_escapes).map_err(|err| {
            ParseError::assertion(
                &options.source_name,
                format!("invalid tag escapes '{}': {}", options.tag_escapes, err),
            )
        })?;
        let tokens: Box<dyn Iterator<Item = Token> + 'a> =
            Box::new(Tokenizer::new(lines.into_iter(), pattern));

        Ok(Self {
            tokens: PutBack::new(tokens),
            stylesheet,
            source_name: options.source_name,
            default_meta: options.default_meta.map(Arc::new),
            private_prefix: options.private_prefix.filter(|p| !p.is_empty()),
            error_level: options.error_level,
            text_types: default_text_types(),
            stack: Vec::new(),
            warnings: Vec::new(),
            last_unknown: None,
            failed: false,
        })
    }

    /// Use `parser` for elements whose record has `text_type`
    pub fn with_text_type(mut self, text_type: TextType, parser: TextTypeParser) -> Self {
        self.register_text_type(text_type, parser);
        self
    }

    pub fn register_text_type(&mut self, text_type: TextType, parser: TextTypeParser) {
        self.text_types.insert(text_type, parser);
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        self.stylesheet
    }

    pub fn error_level(&self) -> ErrorLevel {
        self.error_level
    }

    pub fn default_meta(&self) -> Option<&Arc<Marker>> {
        self.default_meta.as_ref()
    }

    /// Issues reported so far that were below the error level
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.warnings)
    }

    // ------------------------------------------------------------------
    // Token stream access for text type parsers
    // ------------------------------------------------------------------

    pub fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    pub fn peek_token(&mut self) -> Option<&Token> {
        self.tokens.peek()
    }

    pub fn put_back(&mut self, token: Token) {
        self.tokens.put_back(token);
    }

    /// The innermost open element
    pub fn frame(&self) -> Option<&Frame> {
        self.stack.last()
    }

    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        self.stack.last_mut()
    }

    /// Append a node to the innermost open element
    pub fn push_node(&mut self, node: Node) {
        if let Some(frame) = self.stack.last_mut() {
            frame.push(node);
        }
    }

    /// Mark the innermost element as implicitly closed by end of input
    pub fn close_at_eof(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            if frame.meta.endmarker.is_some() {
                log::debug!(
                    "{}: end of input closes \\{} ({})",
                    self.source_name,
                    frame.name,
                    frame.pos
                );
                frame.annotations.insert(IMPLICIT_CLOSED, true);
            }
        }
    }

    // ------------------------------------------------------------------
    // Issue reporting
    // ------------------------------------------------------------------

    fn error(
        &self,
        level: ErrorLevel,
        kind: ErrorKind,
        pos: Position,
        message: impl Into<String>,
    ) -> ParseError {
        Diagnostic::new(self.source_name.clone(), pos, level, kind, message).into()
    }

    /// Report an issue: fatal ones come back as `Err`, the rest are logged
    /// and kept in [`Parser::warnings`]
    pub fn issue(
        &mut self,
        level: ErrorLevel,
        kind: ErrorKind,
        pos: Position,
        message: impl Into<String>,
    ) -> Result<(), ParseError> {
        let diagnostic = Diagnostic::new(self.source_name.clone(), pos, level, kind, message);
        if level.is_fatal_at(self.error_level) {
            return Err(diagnostic.into());
        }
        if level == ErrorLevel::Note {
            log::info!("{}", diagnostic);
        } else {
            log::warn!("{}", diagnostic);
        }
        self.warnings.push(diagnostic);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Core state machine
    // ------------------------------------------------------------------

    /// Feed one token to the innermost frame
    pub fn step(&mut self, token: Token) -> Result<Step, ParseError> {
        match token {
            Token::Text(text) => Ok(self.text_step(text)),
            Token::Marker(marker) => self.marker_step(marker),
        }
    }

    fn text_step(&self, text: Text) -> Step {
        // Drop the separator after the marker and its arguments
        let text = match self.stack.last() {
            Some(frame)
                if frame.is_empty() && !text.starts_with('\n') && !text.starts_with("\r\n") =>
            {
                text.skip(1)
            }
            _ => text,
        };
        if text.is_empty() {
            Step::Skip
        } else {
            Step::Node(Node::Text(text))
        }
    }

    fn marker_step(&mut self, raw: Text) -> Result<Step, ParseError> {
        let raw = self.split_end_marker(raw);
        let (nested, name) = marker_name(&raw);
        let meta = self.lookup(&name, &raw)?;
        let is_end = meta.is_end_marker();

        let anchor = self.anchor(nested && !is_end).map(|f| f.name.clone());
        if meta.may_occur_under(anchor.as_deref()) {
            self.open(name, raw.pos(), meta, nested)
        } else {
            self.reject(raw, name, meta, nested, is_end)
        }
    }

    /// Split `\x*rest` into the end marker `\x*` and the text `rest` when
    /// `x*` closes one of the open frames
    fn split_end_marker(&mut self, raw: Text) -> Text {
        let (nested, name) = marker_name(&raw);
        let endmarker = self
            .stack
            .iter()
            .rev()
            .filter_map(|frame| frame.meta.endmarker.as_deref())
            .find(|em| !em.is_empty() && name.starts_with(em))
            .map(str::to_string);

        let Some(endmarker) = endmarker else {
            return raw;
        };
        if endmarker.len() == name.len() {
            return raw;
        }

        let cut = 1 + usize::from(nested) + endmarker.chars().count();
        let mut residue = raw.skip(cut);
        if self.tokens.peek().is_some_and(Token::is_text) {
            if let Some(next) = self.tokens.next() {
                residue = residue.join(next.as_str());
            }
        }
        self.tokens.put_back(Token::Text(residue));
        raw.slice(0, cut)
    }

    fn lookup(&mut self, name: &str, raw: &Text) -> Result<Arc<Marker>, ParseError> {
        if let Some(meta) = self.stylesheet.get(name) {
            return Ok(meta.clone());
        }

        let private = self
            .private_prefix
            .as_deref()
            .is_some_and(|prefix| name.starts_with(prefix));
        let (level, kind, message) = if private {
            (
                ErrorLevel::Note,
                ErrorKind::UnknownPrivateMarker,
                format!(
                    "unknown private marker \\{}: not in stylesheet, using default marker definition",
                    name
                ),
            )
        } else {
            (
                ErrorLevel::Marker,
                ErrorKind::UnknownMarker,
                format!("unknown marker \\{}: not in stylesheet", name),
            )
        };

        // A pushed back token is looked up again by the enclosing frame
        if self.last_unknown != Some(raw.pos()) {
            self.last_unknown = Some(raw.pos());
            self.issue(level, kind, raw.pos(), message.clone())?;
        }
        match &self.default_meta {
            Some(meta) => Ok(meta.clone()),
            None => Err(self.error(level, kind, raw.pos(), message)),
        }
    }

    /// The frame a marker attaches to; nested inlines look through
    /// enclosing character style frames
    fn anchor(&self, skip_inlines: bool) -> Option<&Frame> {
        let mut frames = self.stack.iter().rev();
        let mut current = frames.next();
        if skip_inlines {
            while current.is_some_and(|frame| frame.meta.is_character()) {
                current = frames.next();
            }
        }
        current
    }

    fn open(
        &mut self,
        name: String,
        pos: Position,
        meta: Arc<Marker>,
        nested: bool,
    ) -> Result<Step, ParseError> {
        let Some(text_type) = meta.text_type.clone() else {
            return Ok(Step::Close);
        };
        let parse: TextTypeParser = self
            .text_types
            .get(&text_type)
            .copied()
            .unwrap_or(parse_default);

        log::trace!("{}: open \\{} at {} as {}", self.source_name, name, pos, text_type);
        self.stack.push(Frame::new(name, pos, meta, nested));
        parse(self)?;
        let frame = self.stack.pop().ok_or_else(|| {
            ParseError::assertion(self.source_name.clone(), "open element lost by its parser")
        })?;
        Ok(Step::Node(Node::Element(frame.into_element())))
    }

    fn reject(
        &mut self,
        raw: Text,
        name: String,
        meta: Arc<Marker>,
        nested: bool,
        is_end: bool,
    ) -> Result<Step, ParseError> {
        let pos = raw.pos();
        let Some(frame) = self.stack.last() else {
            if is_end {
                return Err(self.error(
                    ErrorLevel::Unrecoverable,
                    ErrorKind::OrphanEndMarker,
                    pos,
                    format!(
                        "orphan end marker {}: no matching opening marker \\{}",
                        raw,
                        meta.owner().unwrap_or_default()
                    ),
                ));
            }
            self.issue(
                ErrorLevel::Structure,
                ErrorKind::OrphanMarker,
                pos,
                format!(
                    "orphan marker {}: may only occur under {}",
                    raw,
                    marker_list(&meta.occurs_under)
                ),
            )?;
            return self.open(name, pos, meta, nested);
        };

        if let Some(expected) = frame.meta.endmarker.clone() {
            let parent = frame.name.clone();
            let parent_pos = frame.pos;
            let inline = frame.meta.is_character() || frame.meta.text_type == Some(TextType::NoteText);
            let (level, kind, message) = if inline {
                (
                    ErrorLevel::Note,
                    ErrorKind::ImplicitClose,
                    format!(
                        "implicit end marker before {}: \\{} ({}) closed without \\{}",
                        raw, parent, parent_pos, expected
                    ),
                )
            } else if is_end {
                (
                    ErrorLevel::Structure,
                    ErrorKind::WrongEndMarker,
                    format!(
                        "invalid end marker {}: \\{} ({}) can only be closed with \\{}",
                        raw, parent, parent_pos, expected
                    ),
                )
            } else {
                (
                    ErrorLevel::Content,
                    ErrorKind::ImplicitClose,
                    format!(
                        "implicit end marker before {}: \\{} ({}) should be closed with \\{}",
                        raw, parent, parent_pos, expected
                    ),
                )
            };
            self.issue(level, kind, pos, message)?;
            if let Some(frame) = self.stack.last_mut() {
                frame.annotations.insert(IMPLICIT_CLOSED, true);
            }
        }

        self.tokens.put_back(Token::Marker(raw));
        Ok(Step::Close)
    }

    fn next_root(&mut self) -> Result<Option<Node>, ParseError> {
        while let Some(token) = self.tokens.next() {
            match self.step(token)? {
                Step::Node(node) => return Ok(Some(node)),
                Step::Skip => {}
                Step::Close => {
                    log::debug!(
                        "{}: ignoring marker without a text type at top level",
                        self.source_name
                    );
                }
            }
        }
        Ok(None)
    }
}

impl Iterator for Parser<'_> {
    type Item = Result<Node, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_root() {
            Ok(node) => node.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for Parser<'_> {}

/// Marker name without the backslash and nesting `+`, and whether the `+`
/// was present
fn marker_name(raw: &Text) -> (bool, String) {
    let body = raw.strip_prefix('\\').unwrap_or(raw.as_str());
    match body.strip_prefix('+') {
        Some(name) => (true, name.to_string()),
        None => (false, body.to_string()),
    }
}

/// `\a, \b, toplevel` style listing of permitted parents
fn marker_list(parents: &BTreeSet<Option<String>>) -> String {
    parents
        .iter()
        .map(|parent| match parent {
            Some(name) => format!("\\{}", name),
            None => "toplevel".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
