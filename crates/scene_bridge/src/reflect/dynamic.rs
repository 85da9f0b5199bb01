use crate::values::TypedValue;

use super::{MemberAccess, MemberInfo, MemberWriteError, Reflect};

#[derive(Debug, Clone, PartialEq)]
struct DynamicMember {
    name: String,
    value: TypedValue,
    writable: bool,
}

/// Host object whose members are declared at runtime, e.g. a script
/// component. Every member is a field and keeps the type of its initial
/// value for its whole lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicObject {
    kind: String,
    members: Vec<DynamicMember>,
}

impl DynamicObject {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            members: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: TypedValue) -> Self {
        self.insert(name, value, true);
        self
    }

    pub fn with_read_only(mut self, name: impl Into<String>, value: TypedValue) -> Self {
        self.insert(name, value, false);
        self
    }

    /// Declares or redeclares a member; redeclaring replaces type and value.
    pub fn insert(&mut self, name: impl Into<String>, value: TypedValue, writable: bool) {
        let name = name.into();
        match self.members.iter_mut().find(|member| member.name == name) {
            Some(existing) => {
                existing.value = value;
                existing.writable = writable;
            }
            None => self.members.push(DynamicMember {
                name,
                value,
                writable,
            }),
        }
    }
}

impl Reflect for DynamicObject {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn members(&self) -> Vec<MemberInfo> {
        self.members
            .iter()
            .map(|member| MemberInfo {
                name: member.name.clone(),
                access: MemberAccess::Field,
                descriptor: member.value.descriptor(),
                writable: member.writable,
            })
            .collect()
    }

    fn read(&self, member: &str) -> Option<TypedValue> {
        self.members
            .iter()
            .find(|entry| entry.name == member)
            .map(|entry| entry.value.clone())
    }

    fn write(&mut self, member: &str, value: TypedValue) -> Result<(), MemberWriteError> {
        let entry = self
            .members
            .iter_mut()
            .find(|entry| entry.name == member)
            .ok_or_else(|| MemberWriteError::Unknown {
                member: member.to_string(),
            })?;
        if !entry.writable {
            return Err(MemberWriteError::ReadOnly {
                member: member.to_string(),
            });
        }
        let expected = entry.value.descriptor();
        let found = value.descriptor();
        entry.value = value
            .coerce_to(expected)
            .ok_or_else(|| MemberWriteError::TypeMismatch {
                member: member.to_string(),
                expected,
                found,
            })?;
        Ok(())
    }
}
