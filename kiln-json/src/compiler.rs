//! Shape descriptors to plans.
//!
//! Compilation is a structural recursion over [`Def`]s, memoized by type: the
//! first visit to a shape reserves its node as a placeholder before
//! descending, so a type that reaches itself again resolves to that same node
//! rather than recursing forever. Every rejection happens here, once, and
//! carries the path from the root to the offending shape.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;
use std::collections::HashMap;

use kiln_shape::{Def, PointerDef, RecordDef, ScalarKind, Shape};

use crate::error::{CompileError, CompileErrorKind, Unsupported};
use crate::naming::NamingStrategy;
use crate::plan::{Direction, FieldIn, FieldOut, Node, NodeId, Program, ReadRecord, WriteRecord};
use crate::trie::{SyntaxTrie, TrieError};
use crate::write::write_escaped;

/// Compile the plan for `shape`.
pub(crate) fn compile(
    shape: &'static Shape,
    direction: Direction,
    naming: &dyn NamingStrategy,
) -> Result<Program, CompileError> {
    let mut compiler = Compiler {
        direction,
        naming,
        nodes: Vec::new(),
        memo: HashMap::new(),
        path: String::from("$"),
    };
    let root = compiler.node(shape)?;
    debug!(
        shape = shape.type_name(),
        %direction,
        nodes = compiler.nodes.len(),
        "compiled plan"
    );
    Ok(Program {
        shape,
        direction,
        nodes: compiler.nodes.into_boxed_slice(),
        root,
    })
}

struct Compiler<'a> {
    direction: Direction,
    naming: &'a dyn NamingStrategy,
    nodes: Vec<Node>,
    memo: HashMap<TypeId, NodeId>,
    // `$` followed by `.member`, `[]` and `{}` segments
    path: String,
}

impl Compiler<'_> {
    fn error(&self, shape: &'static Shape, kind: CompileErrorKind) -> CompileError {
        CompileError {
            kind,
            type_name: shape.type_name(),
            path: self.path.clone(),
        }
    }

    fn unsupported(&self, shape: &'static Shape, reason: Unsupported) -> CompileError {
        self.error(shape, CompileErrorKind::Unsupported(reason))
    }

    /// Compile `shape` with `segment` appended to the path.
    fn nested(&mut self, segment: &str, shape: &'static Shape) -> Result<NodeId, CompileError> {
        let len = self.path.len();
        self.path.push_str(segment);
        let id = self.node(shape);
        self.path.truncate(len);
        id
    }

    fn node(&mut self, shape: &'static Shape) -> Result<NodeId, CompileError> {
        let key = shape.id.get();
        if let Some(&id) = self.memo.get(&key) {
            return Ok(id);
        }
        let id = self.nodes.len();
        self.nodes.push(Node::Placeholder);
        self.memo.insert(key, id);

        let node = self.build(shape)?;
        self.nodes[id] = node;
        Ok(id)
    }

    fn build(&mut self, shape: &'static Shape) -> Result<Node, CompileError> {
        Ok(match shape.def {
            Def::Scalar(kind) => Node::Scalar(kind),
            Def::Option(def) => Node::Nullable {
                vtable: def.vtable,
                inner: self.node(def.t())?,
            },
            Def::Pointer(def) => self.pointer(def)?,
            Def::Array(def) | Def::List(def) => Node::Sequence {
                vtable: def.vtable,
                item: self.nested("[]", def.t())?,
            },
            Def::Map(def) => {
                let key = def.k();
                if !matches!(key.def, Def::Scalar(ScalarKind::String)) {
                    return Err(self.unsupported(
                        shape,
                        Unsupported::NonStringKey {
                            key: key.type_name(),
                        },
                    ));
                }
                Node::Map {
                    vtable: def.vtable,
                    value: self.nested("{}", def.v())?,
                }
            }
            Def::Record(def) => self.record(shape, def)?,
            Def::Dynamic => Node::Dynamic,
            Def::Enum(_) => return Err(self.unsupported(shape, Unsupported::Enum)),
            Def::Interface => return Err(self.unsupported(shape, Unsupported::Interface)),
            Def::MultiArray(def) => {
                return Err(self.unsupported(shape, Unsupported::MultiArray { rank: def.rank }));
            }
            Def::Function => return Err(self.unsupported(shape, Unsupported::Function)),
            Def::Generic(def) => {
                return Err(self.unsupported(shape, Unsupported::OpenGeneric { param: def.param }));
            }
        })
    }

    fn pointer(&mut self, def: PointerDef) -> Result<Node, CompileError> {
        let pointee = def.pointee();
        let guarded = def.kind.is_shared().then(|| pointee.type_name());
        Ok(Node::Pointer {
            vtable: def.vtable,
            inner: self.node(pointee)?,
            guarded,
        })
    }

    /// Candidate names of every member taking part in this direction, checked
    /// for emptiness and for clashes across members.
    fn member_names(
        &self,
        shape: &'static Shape,
        def: RecordDef,
    ) -> Result<Vec<(usize, Vec<String>)>, CompileError> {
        let mut seen = SyntaxTrie::new();
        let mut out = Vec::new();
        for (index, member) in def.members.iter().enumerate() {
            let takes_part = match self.direction {
                Direction::Serialize => member.is_readable(),
                Direction::Deserialize => member.is_writable(),
            };
            if !takes_part {
                continue;
            }
            let names = self.naming.candidate_names(shape, member);
            if names.is_empty() {
                return Err(self.error(shape, CompileErrorKind::EmptyName { member: member.name }));
            }
            for name in &names {
                match seen.add(name, ()) {
                    Ok(()) => {}
                    Err(TrieError::Empty) => {
                        return Err(
                            self.error(shape, CompileErrorKind::EmptyName { member: member.name })
                        );
                    }
                    Err(TrieError::Duplicate { name }) => {
                        return Err(self.error(shape, CompileErrorKind::DuplicateName { name }));
                    }
                }
            }
            out.push((index, names));
        }
        Ok(out)
    }

    fn record(&mut self, shape: &'static Shape, def: RecordDef) -> Result<Node, CompileError> {
        let names = self.member_names(shape, def)?;
        match self.direction {
            Direction::Deserialize => {
                let Some(construct) = def.construct else {
                    return Err(self.unsupported(shape, Unsupported::NoConstructor));
                };
                let mut keys = SyntaxTrie::new();
                let mut fields = Vec::with_capacity(names.len());
                for (index, candidates) in names {
                    let member = &def.members[index];
                    let Some(set) = member.set else {
                        continue;
                    };
                    let node = self.nested(&member_segment(member.name), member.shape())?;
                    let slot = fields.len();
                    for name in &candidates {
                        // names were checked above; a clash here means the strategy is not
                        // deterministic
                        keys.add(name, slot).map_err(|_| {
                            self.error(shape, CompileErrorKind::DuplicateName { name: name.clone() })
                        })?;
                    }
                    fields.push(FieldIn { set, node });
                }
                Ok(Node::ReadRecord(ReadRecord {
                    type_name: shape.type_name(),
                    construct,
                    fields: fields.into_boxed_slice(),
                    keys: keys.compile(),
                }))
            }
            Direction::Serialize => {
                let mut fields = Vec::with_capacity(names.len());
                for (index, candidates) in names {
                    let member = &def.members[index];
                    let Some(get) = member.get else {
                        continue;
                    };
                    let node = self.nested(&member_segment(member.name), member.shape())?;
                    fields.push(FieldOut {
                        get,
                        node,
                        key: member_key(&candidates[0]),
                    });
                }
                Ok(Node::WriteRecord(WriteRecord {
                    fields: fields.into_boxed_slice(),
                }))
            }
        }
    }
}

fn member_segment(name: &str) -> String {
    let mut segment = String::with_capacity(name.len() + 1);
    segment.push('.');
    segment.push_str(name);
    segment
}

/// `"name":` with the name escaped.
fn member_key(name: &str) -> Box<[u8]> {
    let mut key = Vec::with_capacity(name.len() + 3);
    key.push(b'"');
    write_escaped(&mut key, name);
    key.extend_from_slice(b"\":");
    key.into_boxed_slice()
}
