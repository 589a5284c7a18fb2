use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use crate::{Shape, TypeMismatch};

/// Borrow a member's value out of an erased record.
pub type MemberGetFn = for<'a> fn(&'a dyn Any) -> Result<&'a dyn Any, TypeMismatch>;

/// Store a member's value into an erased record.
pub type MemberSetFn = fn(&mut dyn Any, Box<dyn Any>) -> Result<(), TypeMismatch>;

/// Build a fresh record to accumulate members into.
pub type ConstructFn = fn() -> Box<dyn Any>;

/// Describes a record: an ordered list of named members.
#[derive(Clone, Copy, Debug)]
pub struct RecordDef {
    /// Members in declaration order; serializers write them in this order.
    pub members: &'static [Member],

    /// Builds the fresh instance deserialization fills in. Without it the
    /// record can be written but not read.
    pub construct: Option<ConstructFn>,
}

impl RecordDef {
    /// A record with the given members and no constructor.
    pub const fn new(members: &'static [Member]) -> Self {
        Self {
            members,
            construct: None,
        }
    }

    /// Set the constructor.
    pub const fn construct(mut self, construct: ConstructFn) -> Self {
        self.construct = Some(construct);
        self
    }
}

/// One member of a record.
#[derive(Clone, Copy)]
pub struct Member {
    /// Declared name of the member (the Rust field name).
    pub name: &'static str,

    /// Declared JSON name, replacing `name` when present.
    pub rename: Option<&'static str>,

    /// Additional names accepted when reading.
    pub aliases: &'static [&'static str],

    /// Shape of the member's value.
    pub shape: fn() -> &'static Shape,

    /// Accessor used when writing; `None` for members that cannot be read.
    pub get: Option<MemberGetFn>,

    /// Accessor used when reading; `None` for members that cannot be set.
    pub set: Option<MemberSetFn>,
}

impl Member {
    /// A member with neither accessor; add them with [`Member::getter`] and [`Member::setter`].
    pub const fn new(name: &'static str, shape: fn() -> &'static Shape) -> Self {
        Self {
            name,
            rename: None,
            aliases: &[],
            shape,
            get: None,
            set: None,
        }
    }

    /// Set the read accessor.
    pub const fn getter(mut self, get: MemberGetFn) -> Self {
        self.get = Some(get);
        self
    }

    /// Set the write accessor.
    pub const fn setter(mut self, set: MemberSetFn) -> Self {
        self.set = Some(set);
        self
    }

    /// Set the declared JSON name.
    pub const fn rename(mut self, rename: &'static str) -> Self {
        self.rename = Some(rename);
        self
    }

    /// Set additional accepted names.
    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// The shape of the member's value.
    pub fn shape(&self) -> &'static Shape {
        (self.shape)()
    }

    /// The declared JSON name: the rename if any, else the field name.
    pub fn json_name(&self) -> &'static str {
        self.rename.unwrap_or(self.name)
    }

    /// Whether the member takes part in serialization.
    pub const fn is_readable(&self) -> bool {
        self.get.is_some()
    }

    /// Whether the member takes part in deserialization.
    pub const fn is_writable(&self) -> bool {
        self.set.is_some()
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("rename", &self.rename)
            .field("aliases", &self.aliases)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish_non_exhaustive()
    }
}
