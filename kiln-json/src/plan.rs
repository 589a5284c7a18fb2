//! Compiled plans.
//!
//! A [`Program`] is a flat arena of [`Node`]s. Nodes refer to each other by
//! index, so a record that contains itself (through a pointer, an option or a
//! collection) is simply a node whose subtree leads back to its own index.

use alloc::boxed::Box;
use core::fmt;

use kiln_shape::{
    ConstructFn, ListVTable, MapVTable, MemberGetFn, MemberSetFn, OptionVTable, PointerVTable,
    ScalarKind, Shape,
};

use crate::trie::CompiledTrie;

/// Index of a node within its [`Program`].
pub(crate) type NodeId = usize;

/// Which way a plan converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Values to JSON.
    Serialize,
    /// JSON to values.
    Deserialize,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Serialize => "serialize",
            Direction::Deserialize => "deserialize",
        })
    }
}

pub(crate) enum Node {
    Scalar(ScalarKind),
    Nullable {
        vtable: &'static OptionVTable,
        inner: NodeId,
    },
    Pointer {
        vtable: &'static PointerVTable,
        inner: NodeId,
        // shared pointer: its address enters the cycle guard
        guarded: Option<&'static str>,
    },
    Sequence {
        vtable: &'static ListVTable,
        item: NodeId,
    },
    Map {
        vtable: &'static MapVTable,
        value: NodeId,
    },
    ReadRecord(ReadRecord),
    WriteRecord(WriteRecord),
    Dynamic,
    // stands in for a node still being compiled; never left in a finished program
    Placeholder,
}

pub(crate) struct ReadRecord {
    pub(crate) type_name: &'static str,
    pub(crate) construct: ConstructFn,
    pub(crate) fields: Box<[FieldIn]>,
    pub(crate) keys: CompiledTrie<usize>,
}

pub(crate) struct FieldIn {
    pub(crate) set: MemberSetFn,
    pub(crate) node: NodeId,
}

pub(crate) struct WriteRecord {
    pub(crate) fields: Box<[FieldOut]>,
}

pub(crate) struct FieldOut {
    pub(crate) get: MemberGetFn,
    pub(crate) node: NodeId,
    // `"name":`, already escaped
    pub(crate) key: Box<[u8]>,
}

/// The compiled form of one shape in one [`Direction`].
///
/// Programs are immutable and shared by every serializer or deserializer of
/// the same type created from one [`Engine`](crate::Engine).
pub struct Program {
    pub(crate) shape: &'static Shape,
    pub(crate) direction: Direction,
    pub(crate) nodes: Box<[Node]>,
    pub(crate) root: NodeId,
}

impl Program {
    /// The shape this program converts.
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// Which way it converts.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of plan nodes, one per distinct shape reached from the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("shape", &self.shape.type_name())
            .field("direction", &self.direction)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}
