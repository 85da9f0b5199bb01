//! Name-addressed access to host objects.
//!
//! Known object kinds describe their members with a static [`Member`] table
//! of typed getters and setters; the table is the registry, so nothing is
//! discovered at runtime. [`DynamicObject`] covers open-ended kinds whose
//! members are only known once the object exists.

mod dynamic;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::values::{TypeDescriptor, TypedValue};

pub use dynamic::DynamicObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberAccess {
    Property,
    Field,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberInfo {
    pub name: String,
    pub access: MemberAccess,
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberWriteError {
    #[error("no member named '{member}'")]
    Unknown { member: String },
    #[error("member '{member}' is read-only")]
    ReadOnly { member: String },
    #[error("member '{member}' expects {expected}, got {found}")]
    TypeMismatch {
        member: String,
        expected: TypeDescriptor,
        found: TypeDescriptor,
    },
}

pub trait Reflect: fmt::Debug {
    fn kind(&self) -> &str;
    fn members(&self) -> Vec<MemberInfo>;
    fn read(&self, member: &str) -> Option<TypedValue>;
    fn write(&mut self, member: &str, value: TypedValue) -> Result<(), MemberWriteError>;

    /// Owned sub-objects (a renderer's material). Their members are not part
    /// of `members()`.
    fn child(&self, _name: &str) -> Option<&dyn Reflect> {
        None
    }

    fn child_mut(&mut self, _name: &str) -> Option<&mut dyn Reflect> {
        None
    }

    fn child_names(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn member_info(&self, name: &str) -> Option<MemberInfo> {
        self.members().into_iter().find(|member| member.name == name)
    }

    fn writable_member_names(&self) -> Vec<String> {
        self.members()
            .into_iter()
            .filter(|member| member.writable)
            .map(|member| member.name)
            .collect()
    }
}

/// One entry of a static member table.
pub struct Member<T> {
    pub name: &'static str,
    pub access: MemberAccess,
    pub descriptor: TypeDescriptor,
    pub get: fn(&T) -> TypedValue,
    pub set: Option<fn(&mut T, TypedValue)>,
}

impl<T> Member<T> {
    pub const fn property(
        name: &'static str,
        descriptor: TypeDescriptor,
        get: fn(&T) -> TypedValue,
        set: fn(&mut T, TypedValue),
    ) -> Self {
        Self {
            name,
            access: MemberAccess::Property,
            descriptor,
            get,
            set: Some(set),
        }
    }

    pub const fn read_only(
        name: &'static str,
        descriptor: TypeDescriptor,
        get: fn(&T) -> TypedValue,
    ) -> Self {
        Self {
            name,
            access: MemberAccess::Property,
            descriptor,
            get,
            set: None,
        }
    }

    pub const fn field(
        name: &'static str,
        descriptor: TypeDescriptor,
        get: fn(&T) -> TypedValue,
        set: fn(&mut T, TypedValue),
    ) -> Self {
        Self {
            name,
            access: MemberAccess::Field,
            descriptor,
            get,
            set: Some(set),
        }
    }

    fn info(&self) -> MemberInfo {
        MemberInfo {
            name: self.name.to_string(),
            access: self.access,
            descriptor: self.descriptor,
            writable: self.set.is_some(),
        }
    }
}

/// Implemented by host types with a compile-time member table; they get
/// [`Reflect`] for free.
pub trait MemberTable: fmt::Debug + Sized + 'static {
    const KIND: &'static str;

    fn table() -> &'static [Member<Self>];

    fn owned_child(&self, _name: &str) -> Option<&dyn Reflect> {
        None
    }

    fn owned_child_mut(&mut self, _name: &str) -> Option<&mut dyn Reflect> {
        None
    }

    fn owned_child_names(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

fn find_member<T: MemberTable>(name: &str) -> Option<&'static Member<T>> {
    T::table().iter().find(|member| member.name == name)
}

impl<T: MemberTable> Reflect for T {
    fn kind(&self) -> &str {
        T::KIND
    }

    fn members(&self) -> Vec<MemberInfo> {
        T::table().iter().map(Member::info).collect()
    }

    fn read(&self, member: &str) -> Option<TypedValue> {
        find_member::<T>(member).map(|entry| (entry.get)(self))
    }

    fn write(&mut self, member: &str, value: TypedValue) -> Result<(), MemberWriteError> {
        let entry = find_member::<T>(member).ok_or_else(|| MemberWriteError::Unknown {
            member: member.to_string(),
        })?;
        let set = entry.set.ok_or_else(|| MemberWriteError::ReadOnly {
            member: member.to_string(),
        })?;
        let found = value.descriptor();
        let value = value
            .coerce_to(entry.descriptor)
            .ok_or_else(|| MemberWriteError::TypeMismatch {
                member: member.to_string(),
                expected: entry.descriptor,
                found,
            })?;
        set(self, value);
        Ok(())
    }

    fn child(&self, name: &str) -> Option<&dyn Reflect> {
        self.owned_child(name)
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut dyn Reflect> {
        self.owned_child_mut(name)
    }

    fn child_names(&self) -> Vec<&'static str> {
        self.owned_child_names()
    }
}
