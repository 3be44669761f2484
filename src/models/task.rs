//! Task Models
//!
//! Work items supplied by the external task store. A task is read-only
//! for the duration of one orchestration cycle; mutations flow back to
//! the store as a `TaskPatch` or a completion call.

use serde::{Deserialize, Serialize};

/// One entry of a task's ordered checklist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    /// Item text
    pub text: String,
    /// Whether the item is already checked off
    #[serde(default)]
    pub done: bool,
}

/// A work item fetched from the task store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned identifier
    pub id: String,
    /// Short title
    pub title: String,
    /// Free-text notes/description
    #[serde(default)]
    pub notes: String,
    /// Ordered checklist
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    /// Tag set (order not significant)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Section/heading label the task sits under, if any
    #[serde(default)]
    pub section: Option<String>,
    /// Project the task belongs to, if any
    #[serde(default)]
    pub project: Option<String>,
}

impl Task {
    /// Minimal constructor used by local mode and tests.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            notes: String::new(),
            checklist: Vec::new(),
            tags: Vec::new(),
            section: None,
            project: None,
        }
    }

    /// Set the notes text.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Set the section label.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Set the project label.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add a checklist item.
    pub fn with_checklist_item(mut self, text: impl Into<String>, done: bool) -> Self {
        self.checklist.push(ChecklistItem {
            text: text.into(),
            done,
        });
        self
    }

    /// All textual fields joined into one scan surface.
    ///
    /// Used by the routing engine for inline override markers and keyword
    /// classification: title, notes, checklist text, tags, section and
    /// project labels, newline-separated.
    pub fn combined_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.title.as_str()];
        if !self.notes.is_empty() {
            parts.push(self.notes.as_str());
        }
        for item in &self.checklist {
            parts.push(item.text.as_str());
        }
        for tag in &self.tags {
            parts.push(tag.as_str());
        }
        if let Some(ref section) = self.section {
            parts.push(section.as_str());
        }
        if let Some(ref project) = self.project {
            parts.push(project.as_str());
        }
        parts.join("\n")
    }

    /// Open (unchecked) checklist items.
    pub fn open_checklist(&self) -> Vec<&ChecklistItem> {
        self.checklist.iter().filter(|i| !i.done).collect()
    }

    /// Apply a patch in place, the way the store side does.
    ///
    /// Appended notes land on a blank line; duplicate tags are ignored.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(ref extra) = patch.append_notes {
            if self.notes.is_empty() {
                self.notes = extra.clone();
            } else {
                self.notes.push_str("\n\n");
                self.notes.push_str(extra);
            }
        }
        for tag in &patch.add_tags {
            if !self.tags.iter().any(|t| t == tag) {
                self.tags.push(tag.clone());
            }
        }
    }
}

/// Partial update written back to the task store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// Text appended to the task's notes (store decides separator)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_notes: Option<String>,
    /// Tags added to the task's tag set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_tags: Vec<String>,
}

impl TaskPatch {
    /// Patch that appends a note.
    pub fn note(text: impl Into<String>) -> Self {
        Self {
            append_notes: Some(text.into()),
            add_tags: Vec::new(),
        }
    }

    /// Add a tag to the patch.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tags.push(tag.into());
        self
    }

    /// True when the patch carries no changes.
    pub fn is_empty(&self) -> bool {
        self.append_notes.is_none() && self.add_tags.is_empty()
    }
}
