//! Member-name matching against escaped JSON input.
//!
//! A [`SyntaxTrie`] is built from the candidate names of a record, then
//! compiled into a [`CompiledTrie`]: a flat, immutable automaton whose edges
//! are keyed on decoded UTF-8 bytes. The matcher is driven by raw input right
//! after an opening quote; escapes are decoded one at a time as the walk
//! reaches them, so `"name"` matches `name` without a decode pass.
//!
//! A candidate only matches when the closing quote arrives exactly at its
//! terminal: `"foo"` against `{foo, foobar}` yields `foo` and never looks at
//! `foobar`'s suffix.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::chars::is_control;
use crate::error::{JsonError, JsonErrorKind, Span};
use crate::read::{self, decode_escape, unexpected};
use crate::source::{SliceSource, Source};

/// Why a name could not be added to a [`SyntaxTrie`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// The empty string is never a valid member name.
    Empty,
    /// The name is already present.
    Duplicate {
        /// The name that was added twice.
        name: String,
    },
}

impl fmt::Display for TrieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrieError::Empty => write!(f, "empty name"),
            TrieError::Duplicate { name } => write!(f, "duplicate name `{name}`"),
        }
    }
}

impl std::error::Error for TrieError {}

struct BuildNode<P> {
    children: BTreeMap<u8, BuildNode<P>>,
    terminal: Option<P>,
}

impl<P> BuildNode<P> {
    const fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            terminal: None,
        }
    }

    fn remove(&mut self, name: &[u8]) -> Option<P> {
        match name.split_first() {
            None => self.terminal.take(),
            Some((first, rest)) => {
                let child = self.children.get_mut(first)?;
                let removed = child.remove(rest);
                if child.terminal.is_none() && child.children.is_empty() {
                    self.children.remove(first);
                }
                removed
            }
        }
    }
}

/// Mutable trie over member names, each carrying a payload.
pub struct SyntaxTrie<P> {
    root: BuildNode<P>,
    len: usize,
}

impl<P> Default for SyntaxTrie<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SyntaxTrie<P> {
    /// An empty trie.
    pub const fn new() -> Self {
        Self {
            root: BuildNode::new(),
            len: 0,
        }
    }

    /// Number of names.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no names have been added.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add `name`; fails if it is empty or already present.
    pub fn add(&mut self, name: &str, payload: P) -> Result<(), TrieError> {
        if name.is_empty() {
            return Err(TrieError::Empty);
        }
        let mut node = &mut self.root;
        for &b in name.as_bytes() {
            node = node.children.entry(b).or_insert_with(BuildNode::new);
        }
        if node.terminal.is_some() {
            return Err(TrieError::Duplicate { name: name.into() });
        }
        node.terminal = Some(payload);
        self.len += 1;
        Ok(())
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        let mut node = &self.root;
        for b in name.as_bytes() {
            match node.children.get(b) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.terminal.is_some()
    }

    /// Remove `name`, returning its payload. Branches left without names are
    /// pruned.
    pub fn remove(&mut self, name: &str) -> Option<P> {
        let removed = self.root.remove(name.as_bytes());
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Freeze into a matcher.
    pub fn compile(self) -> CompiledTrie<P> {
        let mut nodes = Vec::new();
        flatten(self.root, Vec::new(), &mut nodes);
        CompiledTrie {
            nodes: nodes.into_boxed_slice(),
            len: self.len,
        }
    }
}

impl<P> fmt::Debug for SyntaxTrie<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTrie")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

// Chains of single-child nodes without a terminal fold into the run of the
// node they lead to.
fn flatten<P>(mut node: BuildNode<P>, mut run: Vec<u8>, nodes: &mut Vec<Node<P>>) -> usize {
    while node.terminal.is_none() && node.children.len() == 1 {
        let Some((b, child)) = node.children.pop_first() else {
            break;
        };
        run.push(b);
        node = child;
    }

    let index = nodes.len();
    nodes.push(Node {
        run: run.into_boxed_slice(),
        edges: Box::default(),
        terminal: node.terminal,
    });
    let edges: Vec<(u8, usize)> = node
        .children
        .into_iter()
        .map(|(b, child)| (b, flatten(child, Vec::new(), nodes)))
        .collect();
    nodes[index].edges = edges.into_boxed_slice();
    index
}

struct Node<P> {
    // bytes that must follow the edge into this node
    run: Box<[u8]>,
    // sorted by byte
    edges: Box<[(u8, usize)]>,
    terminal: Option<P>,
}

/// Immutable matcher produced by [`SyntaxTrie::compile`].
pub struct CompiledTrie<P> {
    nodes: Box<[Node<P>]>,
    len: usize,
}

impl<P> fmt::Debug for CompiledTrie<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTrie")
            .field("len", &self.len)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

enum Step {
    Byte(u8),
    Close,
}

// Decoded bytes of the escape currently being fed to the walk.
#[derive(Default)]
struct Pending {
    buf: [u8; 4],
    at: usize,
    len: usize,
}

impl Pending {
    const fn is_empty(&self) -> bool {
        self.at == self.len
    }

    fn fill(&mut self, c: char) -> u8 {
        self.len = c.encode_utf8(&mut self.buf).len();
        self.at = 1;
        self.buf[0]
    }

    fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let b = self.buf[self.at];
        self.at += 1;
        Some(b)
    }
}

fn step<S: Source>(src: &mut S, pending: &mut Pending) -> Result<Step, JsonError> {
    if let Some(b) = pending.pop() {
        return Ok(Step::Byte(b));
    }
    let pos = src.position();
    match src.next_byte()? {
        Some(b'"') => Ok(Step::Close),
        Some(b'\\') => {
            let c = decode_escape(src, pos)?;
            Ok(Step::Byte(pending.fill(c)))
        }
        Some(b) if is_control(b) => Err(JsonError::new(
            JsonErrorKind::ControlCharacter(b),
            Span::new(pos, 1),
        )),
        Some(b) => Ok(Step::Byte(b)),
        None => Err(unexpected(None, pos, "a closing quote")),
    }
}

// No candidate can match any more; consume the rest of the string.
fn no_match<S: Source, P>(src: &mut S) -> Result<Option<P>, JsonError> {
    read::skip_string_content(src)?;
    Ok(None)
}

impl<P: Copy> CompiledTrie<P> {
    /// Number of names.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the trie holds no names.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Match the string content starting at `buf[*pos]` (just past the
    /// opening quote). On success `*pos` is just past the closing quote,
    /// whether or not a name matched.
    pub fn match_slice(&self, buf: &[u8], pos: &mut usize) -> Result<Option<P>, JsonError> {
        let mut src = SliceSource::at(buf, *pos);
        let matched = self.walk(&mut src)?;
        *pos = src.position();
        Ok(matched)
    }

    /// Match the string content at the cursor of `src` (just past the
    /// opening quote), consuming through the closing quote.
    pub fn match_source<S: Source>(&self, src: &mut S) -> Result<Option<P>, JsonError> {
        self.walk(src)
    }

    fn walk<S: Source>(&self, src: &mut S) -> Result<Option<P>, JsonError> {
        let Some(mut node) = self.nodes.first() else {
            return no_match(src);
        };
        let mut pending = Pending::default();
        loop {
            let mut i = 0;
            while i < node.run.len() {
                if pending.is_empty() && src.eat_literal(&node.run[i..])? {
                    break;
                }
                match step(src, &mut pending)? {
                    Step::Byte(b) if b == node.run[i] => i += 1,
                    Step::Byte(_) => return no_match(src),
                    Step::Close => return Ok(None),
                }
            }

            match step(src, &mut pending)? {
                Step::Close => return Ok(node.terminal),
                Step::Byte(b) => match node.edges.binary_search_by_key(&b, |&(edge, _)| edge) {
                    Ok(found) => node = &self.nodes[node.edges[found].1],
                    Err(_) => return no_match(src),
                },
            }
        }
    }
}
