use derive_more::{Display, From};

/// A generational slot index.
///
/// The generation is bumped when a slot is freed, so a handle to a destroyed object never aliases its successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{index}v{generation}")]
pub struct SlotId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

macro_rules! object_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
        #[display("{_0}")]
        pub struct $name(pub(crate) SlotId);
    };
}

object_id!(GroupId, "A handle to a [`Group`](crate::hierarchy::Group).");
object_id!(DimId, "A handle to a [`Dimension`](crate::hierarchy::Dimension).");
object_id!(AttId, "A handle to an [`Attribute`](crate::hierarchy::Attribute).");
object_id!(VarId, "A handle to a [`Variable`](crate::hierarchy::Variable).");
object_id!(VarGroupId, "A handle to a [`VarGroup`](crate::hierarchy::VarGroup).");
object_id!(VarArrayId, "A handle to a [`VarArray`](crate::hierarchy::VarArray).");

/// The kind of an object in a [`Hierarchy`](crate::Hierarchy).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum ObjectKind {
    /// A group.
    Group,
    /// A dimension.
    Dim,
    /// An attribute.
    Att,
    /// A variable.
    Var,
    /// A variable group.
    VarGroup,
    /// A variable array.
    VarArray,
}

impl ObjectKind {
    /// The token placed before the object name in a path.
    #[must_use]
    pub const fn separator(self) -> &'static str {
        match self {
            Self::Group => "/",
            Self::Dim => "/_dims_/",
            Self::Att => "/_atts_/",
            Self::Var => "/_vars_/",
            Self::VarGroup => "/_vargroups_/",
            Self::VarArray => "/_vararrays_/",
        }
    }
}

/// A handle to an object of any kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, From)]
pub enum ObjectId {
    /// A group.
    Group(GroupId),
    /// A dimension.
    Dim(DimId),
    /// An attribute.
    Att(AttId),
    /// A variable.
    Var(VarId),
    /// A variable group.
    VarGroup(VarGroupId),
    /// A variable array.
    VarArray(VarArrayId),
}

impl ObjectId {
    /// Returns the kind of the object.
    #[must_use]
    pub const fn kind(self) -> ObjectKind {
        match self {
            Self::Group(_) => ObjectKind::Group,
            Self::Dim(_) => ObjectKind::Dim,
            Self::Att(_) => ObjectKind::Att,
            Self::Var(_) => ObjectKind::Var,
            Self::VarGroup(_) => ObjectKind::VarGroup,
            Self::VarArray(_) => ObjectKind::VarArray,
        }
    }
}

/// The owner of an [`Attribute`](crate::hierarchy::Attribute).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, From)]
pub enum AttParent {
    /// A group attribute.
    Group(GroupId),
    /// A variable attribute.
    Var(VarId),
}

impl From<AttParent> for ObjectId {
    fn from(parent: AttParent) -> Self {
        match parent {
            AttParent::Group(group) => Self::Group(group),
            AttParent::Var(var) => Self::Var(var),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_kinds() {
        let slot = SlotId {
            index: 2,
            generation: 1,
        };
        assert_eq!(ObjectId::from(DimId(slot)).kind(), ObjectKind::Dim);
        assert_eq!(ObjectId::from(AttParent::Var(VarId(slot))).kind(), ObjectKind::Var);
        assert_eq!(VarId(slot).to_string(), "2v1");
        assert_eq!(ObjectKind::VarGroup.separator(), "/_vargroups_/");
    }
}
