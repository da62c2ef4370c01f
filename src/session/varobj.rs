use crate::engine::{ThreadId, ValueHandle, ValueInfo, VarFormat};
use crate::mi::record::Results;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarObjKind {
    /// Variable, register or a child member.
    Plain,
    /// Result of expression evaluation, re-evaluated on update.
    ExpressionResult,
}

/// Named binding to a runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarObject {
    pub name: String,
    pub expression: String,
    pub handle: ValueHandle,
    pub kind: VarObjKind,
    pub format: VarFormat,
    pub thread: Option<ThreadId>,
    pub frame: Option<u32>,
    pub parent: Option<String>,
    /// Last known value info.
    pub info: ValueInfo,
}

impl VarObject {
    /// Apply fresh engine value info, return true if rendered value changed.
    pub fn refresh(&mut self, info: ValueInfo) -> bool {
        let changed = self.info.value != info.value || self.info.in_scope != info.in_scope;
        self.info = info;
        changed
    }

    /// Results of `var-create`.
    pub fn create_results(&self) -> Results {
        Results::new()
            .with("name", self.name.as_str())
            .with("numchild", self.info.children.to_string())
            .with("value", self.info.value.as_str())
            .with("type", self.info.type_name.as_str())
            .with("thread-id", self.info.thread.to_string())
            .with("has_more", "0")
    }

    /// Change list entry of `var-update` and `var-set-format`, value is omitted if
    /// `with_value` is false.
    pub fn change_results(&self, with_value: bool) -> Results {
        let mut change = Results::new().with("name", self.name.as_str());
        if with_value {
            change.push("value", self.info.value.as_str());
        }
        change
            .with("in_scope", if self.info.in_scope { "true" } else { "false" })
            .with("type_changed", "false")
            .with("has_more", "0")
    }

    /// Child tuple of `var-list-children`, value is omitted if `with_value` is false.
    pub fn child_results(&self, with_value: bool) -> Results {
        let mut child = Results::new()
            .with("name", self.name.as_str())
            .with("exp", self.expression.as_str())
            .with("numchild", self.info.children.to_string());
        if with_value {
            child.push("value", self.info.value.as_str());
        }
        child
            .with("type", self.info.type_name.as_str())
            .with("thread-id", self.info.thread.to_string())
            .with("has_more", "0")
    }
}

/// Name of a child object: `parent.member`, or `parent.$index` for unnamed members.
pub fn child_name(parent: &str, member: &str, index: u32) -> String {
    if member.is_empty() {
        format!("{parent}.${index}")
    } else {
        format!("{parent}.{member}")
    }
}
