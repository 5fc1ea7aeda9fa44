//! In-memory document host.
//!
//! A DOM-ish node tree implementing [`Host`]. It is the concrete
//! renderer the event layer binds to: nodes carry the state the
//! controlled-input machinery needs (value, checked state, radio group
//! name, the value tracker, and the recorded controlled props).
//!
//! Two kinds of writes exist:
//! - *tracked* writes (`set_value`, `set_checked`) update the node and
//!   its value tracker, modelling property setters the framework
//!   intercepts;
//! - *forced* writes (`force_value`, `force_checked`) update only the
//!   node, modelling the browser (or foreign code) mutating state out
//!   from under the framework.

use std::ops::{Index, IndexMut};

use rustc_hash::FxHashMap;

use crate::host::Host;
use crate::types::{InstanceId, Props};

// =============================================================================
// Node
// =============================================================================

/// Input types that participate in text-value change tracking.
const TEXT_INPUT_TYPES: &[&str] = &[
    "color",
    "date",
    "datetime",
    "datetime-local",
    "email",
    "month",
    "number",
    "password",
    "range",
    "search",
    "tel",
    "text",
    "time",
    "url",
    "week",
];

/// One document node.
#[derive(Debug, Default)]
pub struct DomNode {
    /// Lowercase node name ("div", "input", "#text", "#document").
    pub node_name: String,
    /// `type` attribute for inputs.
    pub input_type: Option<String>,
    /// Current value (text-valued controls).
    pub value: String,
    /// Current checked state (checkables).
    pub checked: bool,
    /// Radio group / form control name.
    pub name: Option<String>,
    /// Text content (text nodes).
    pub text: String,
    /// Remaining attributes, stored as DOM strings.
    pub attrs: FxHashMap<String, String>,

    pub parent: Option<InstanceId>,
    pub children: Vec<InstanceId>,

    /// Last-known value for change deduplication. `None` means no
    /// tracker is installed (treated as "always changed").
    pub(crate) tracker: Option<String>,

    /// Controlled props recorded at the last commit, consulted by the
    /// post-dispatch state restore.
    pub(crate) controlled_value: Option<String>,
    pub(crate) controlled_checked: Option<bool>,
}

impl DomNode {
    fn element(node_name: &str) -> Self {
        Self {
            node_name: node_name.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Checkbox/radio-kind control.
    pub fn is_checkable(&self) -> bool {
        self.node_name == "input"
            && matches!(self.input_type.as_deref(), Some("checkbox") | Some("radio"))
    }

    /// Text-valued control tracked through `input`/`change` events.
    pub fn is_text_input(&self) -> bool {
        match self.node_name.as_str() {
            "textarea" => true,
            "input" => match self.input_type.as_deref() {
                None => true,
                Some(ty) => TEXT_INPUT_TYPES.contains(&ty),
            },
            _ => false,
        }
    }

    /// Selects whether the raw `change` event is authoritative for this
    /// node kind (rather than `input`).
    pub fn uses_change_event(&self) -> bool {
        self.node_name == "select"
            || (self.node_name == "input" && self.input_type.as_deref() == Some("file"))
    }

    /// Nodes that get a value tracker installed on mount.
    pub fn is_change_capable(&self) -> bool {
        matches!(self.node_name.as_str(), "input" | "textarea" | "select")
    }

    /// The value the change machinery compares: checkables report their
    /// checked state as "true"/"false", everything else its value.
    pub fn current_dom_value(&self) -> String {
        if self.is_checkable() {
            if self.checked { "true" } else { "false" }.to_string()
        } else {
            self.value.clone()
        }
    }

    fn is_radio(&self) -> bool {
        self.node_name == "input" && self.input_type.as_deref() == Some("radio")
    }
}

// =============================================================================
// Document
// =============================================================================

/// Node arena with a `#document` root.
pub struct Document {
    nodes: Vec<Option<DomNode>>,
    free: Vec<u32>,
    root: InstanceId,
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: InstanceId(0),
        };
        doc.root = doc.allocate(DomNode::element("#document"));
        doc
    }

    pub fn root(&self) -> InstanceId {
        self.root
    }

    fn allocate(&mut self, node: DomNode) -> InstanceId {
        if let Some(index) = self.free.pop() {
            self.nodes[index as usize] = Some(node);
            InstanceId(index)
        } else {
            self.nodes.push(Some(node));
            InstanceId((self.nodes.len() - 1) as u32)
        }
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, node_name: &str) -> InstanceId {
        self.allocate(DomNode::element(node_name))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> InstanceId {
        let mut node = DomNode::element("#text");
        node.text = text.to_string();
        self.allocate(node)
    }

    pub fn get(&self, id: InstanceId) -> Option<&DomNode> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut DomNode> {
        self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        false // the root always exists
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    /// Append `child`, detaching it from its current position first
    /// (appending an attached node moves it).
    pub fn append(&mut self, parent: InstanceId, child: InstanceId) {
        self.detach(child);
        self[child].parent = Some(parent);
        self[parent].children.push(child);
    }

    pub fn insert_before_node(&mut self, parent: InstanceId, child: InstanceId, before: InstanceId) {
        self.detach(child);
        self[child].parent = Some(parent);
        let children = &mut self[parent].children;
        match children.iter().position(|&c| c == before) {
            Some(pos) => children.insert(pos, child),
            None => children.push(child),
        }
    }

    fn detach(&mut self, child: InstanceId) {
        if let Some(old_parent) = self[child].parent.take() {
            self[old_parent].children.retain(|&c| c != child);
        }
    }

    /// Unlink `child` from `parent` and free its subtree.
    pub fn remove(&mut self, parent: InstanceId, child: InstanceId) {
        self[parent].children.retain(|&c| c != child);
        self.free_subtree(child);
    }

    fn free_subtree(&mut self, id: InstanceId) {
        let children = std::mem::take(&mut self[id].children);
        for child in children {
            self.free_subtree(child);
        }
        self.nodes[id.0 as usize] = None;
        self.free.push(id.0);
    }

    /// Nearest `form` ancestor, if any.
    pub fn owning_form(&self, id: InstanceId) -> Option<InstanceId> {
        let mut cursor = self.get(id)?.parent;
        while let Some(current) = cursor {
            if self[current].node_name == "form" {
                return Some(current);
            }
            cursor = self[current].parent;
        }
        None
    }

    /// All radio inputs sharing `name` within the same owning form as
    /// `of` (document-wide scan, like a `querySelectorAll`).
    pub fn radio_group(&self, of: InstanceId, name: &str) -> Vec<InstanceId> {
        let form = self.owning_form(of);
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (InstanceId(i as u32), node)))
            .filter(|(id, node)| {
                node.is_radio() && node.name.as_deref() == Some(name) && self.owning_form(*id) == form
            })
            .map(|(id, _)| id)
            .collect()
    }

    // =========================================================================
    // Value writes
    // =========================================================================

    /// Tracked value write: updates the node and, for value-tracked
    /// nodes, the tracker (the intercepted property setter path).
    pub fn set_value(&mut self, id: InstanceId, value: impl Into<String>) {
        let value = value.into();
        let node = &mut self[id];
        node.value = value.clone();
        if node.tracker.is_some() && !node.is_checkable() {
            node.tracker = Some(value);
        }
    }

    /// Forced value write: node only, tracker untouched.
    pub fn force_value(&mut self, id: InstanceId, value: impl Into<String>) {
        self[id].value = value.into();
    }

    /// Tracked checked write. Checking a named radio unchecks the rest
    /// of its group with forced writes (native exclusivity does not run
    /// through intercepted setters).
    pub fn set_checked(&mut self, id: InstanceId, checked: bool) {
        let node = &mut self[id];
        node.checked = checked;
        if node.tracker.is_some() && node.is_checkable() {
            node.tracker = Some(if checked { "true" } else { "false" }.to_string());
        }
        if checked {
            self.uncheck_radio_siblings(id);
        }
    }

    /// Forced checked write: node only, tracker untouched. Still applies
    /// radio exclusivity to the rest of the group.
    pub fn force_checked(&mut self, id: InstanceId, checked: bool) {
        self[id].checked = checked;
        if checked {
            self.uncheck_radio_siblings(id);
        }
    }

    fn uncheck_radio_siblings(&mut self, id: InstanceId) {
        let name = match self.get(id) {
            Some(node) if node.is_radio() => match &node.name {
                Some(name) => name.clone(),
                None => return,
            },
            _ => return,
        };
        for other in self.radio_group(id, &name) {
            if other != id {
                self[other].checked = false;
            }
        }
    }

    // =========================================================================
    // Props application
    // =========================================================================

    /// Initial props application for a freshly created instance.
    fn mount_props(&mut self, id: InstanceId, props: &Props) {
        self.apply_attrs(id, props);

        let controlled_value = props.string("value");
        let controlled_checked = props.truthy("checked");
        let initial_value = controlled_value
            .clone()
            .or_else(|| props.string("defaultValue"))
            .unwrap_or_default();
        let initial_checked = controlled_checked
            .or_else(|| props.truthy("defaultChecked"))
            .unwrap_or(false);

        let node = &mut self[id];
        node.value = initial_value;
        node.checked = initial_checked;
        node.controlled_value = controlled_value;
        node.controlled_checked = controlled_checked;
    }

    /// Props update for a mounted instance: re-assert controlled state
    /// through tracked writes and refresh the controlled records.
    fn update_props(&mut self, id: InstanceId, props: &Props) {
        self.apply_attrs(id, props);

        let controlled_value = props.string("value");
        let controlled_checked = props.truthy("checked");

        if let Some(value) = controlled_value.clone() {
            self.set_value(id, value);
        }
        if let Some(checked) = controlled_checked {
            self.set_checked(id, checked);
        }

        let node = &mut self[id];
        node.controlled_value = controlled_value;
        node.controlled_checked = controlled_checked;
    }

    fn apply_attrs(&mut self, id: InstanceId, props: &Props) {
        let node = &mut self[id];
        node.attrs.clear();
        node.input_type = None;
        node.name = None;
        for (attr_name, attr_value) in props.iter() {
            match attr_name {
                "type" => node.input_type = Some(attr_value.to_dom_string()),
                "name" => node.name = Some(attr_value.to_dom_string()),
                // Value/checked state is handled by the controlled logic.
                "value" | "defaultValue" | "checked" | "defaultChecked" => {}
                _ => {
                    node.attrs
                        .insert(attr_name.to_string(), attr_value.to_dom_string());
                }
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<InstanceId> for Document {
    type Output = DomNode;

    fn index(&self, id: InstanceId) -> &DomNode {
        self.get(id)
            .unwrap_or_else(|| panic!("node {id} is not in the document"))
    }
}

impl IndexMut<InstanceId> for Document {
    fn index_mut(&mut self, id: InstanceId) -> &mut DomNode {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("node {id} is not in the document"))
    }
}

// =============================================================================
// Host implementation
// =============================================================================

impl Host for Document {
    fn create_instance(&mut self, ty: &str, props: &Props) -> InstanceId {
        let id = self.create_element(ty);
        self.mount_props(id, props);
        if self[id].is_change_capable() {
            crate::events::tracker::track(self, id);
        }
        id
    }

    fn create_text_instance(&mut self, text: &str) -> InstanceId {
        self.create_text(text)
    }

    fn append_child(&mut self, parent: InstanceId, child: InstanceId) {
        self.append(parent, child);
    }

    fn insert_before(&mut self, parent: InstanceId, child: InstanceId, before: InstanceId) {
        self.insert_before_node(parent, child, before);
    }

    fn remove_child(&mut self, parent: InstanceId, child: InstanceId) {
        self.remove(parent, child);
    }

    fn commit_update(&mut self, instance: InstanceId, _old_props: &Props, new_props: &Props) {
        self.update_props(instance, new_props);
    }

    fn commit_text_update(&mut self, instance: InstanceId, _old_text: &str, new_text: &str) {
        self[instance].text = new_text.to_string();
    }

    fn reset_text_content(&mut self, instance: InstanceId) {
        self[instance].text.clear();
        let text_children: Vec<InstanceId> = self[instance]
            .children
            .iter()
            .copied()
            .filter(|&c| self[c].node_name == "#text")
            .collect();
        for child in text_children {
            self.remove(instance, child);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn checkbox(doc: &mut Document) -> InstanceId {
        doc.create_instance("input", &Props::new().attr("type", "checkbox"))
    }

    fn radio(doc: &mut Document, name: &str) -> InstanceId {
        doc.create_instance(
            "input",
            &Props::new().attr("type", "radio").attr("name", name),
        )
    }

    #[test]
    fn test_create_instance_initializes_from_defaults() {
        let mut doc = Document::new();
        let id = doc.create_instance(
            "input",
            &Props::new().attr("type", "text").attr("defaultValue", "hi"),
        );
        assert_eq!(doc[id].value, "hi");
        assert!(doc[id].controlled_value.is_none());
        assert_eq!(doc[id].tracker.as_deref(), Some("hi"));
    }

    #[test]
    fn test_controlled_props_recorded() {
        let mut doc = Document::new();
        let id = doc.create_instance(
            "input",
            &Props::new().attr("type", "checkbox").attr("checked", true),
        );
        assert!(doc[id].checked);
        assert_eq!(doc[id].controlled_checked, Some(true));
    }

    #[test]
    fn test_tracked_vs_forced_writes() {
        let mut doc = Document::new();
        let id = checkbox(&mut doc);
        assert_eq!(doc[id].tracker.as_deref(), Some("false"));

        doc.set_checked(id, true);
        assert_eq!(doc[id].tracker.as_deref(), Some("true"));

        doc.force_checked(id, false);
        assert!(!doc[id].checked);
        assert_eq!(doc[id].tracker.as_deref(), Some("true"));
    }

    #[test]
    fn test_radio_exclusivity_bypasses_sibling_trackers() {
        let mut doc = Document::new();
        let a = radio(&mut doc, "g");
        let b = radio(&mut doc, "g");
        doc.append(doc.root(), a);
        doc.append(doc.root(), b);

        doc.set_checked(a, true);
        assert!(doc[a].checked);
        assert_eq!(doc[a].tracker.as_deref(), Some("true"));

        doc.set_checked(b, true);
        assert!(!doc[a].checked);
        // Sibling unchecking is a forced write: tracker still says true.
        assert_eq!(doc[a].tracker.as_deref(), Some("true"));
    }

    #[test]
    fn test_props_update_clears_dropped_type_and_name() {
        let mut doc = Document::new();
        let id = radio(&mut doc, "g");
        assert_eq!(doc[id].input_type.as_deref(), Some("radio"));
        assert_eq!(doc[id].name.as_deref(), Some("g"));

        doc.update_props(id, &Props::new().attr("type", "text"));
        assert_eq!(doc[id].input_type.as_deref(), Some("text"));
        // The dropped name must not keep the node in its old radio group.
        assert!(doc[id].name.is_none());
        assert!(doc.radio_group(id, "g").is_empty());
    }

    #[test]
    fn test_radio_group_scoped_to_owning_form() {
        let mut doc = Document::new();
        let form = doc.create_element("form");
        doc.append(doc.root(), form);

        let inside = radio(&mut doc, "g");
        doc.append(form, inside);
        let outside = radio(&mut doc, "g");
        doc.append(doc.root(), outside);

        let group = doc.radio_group(inside, "g");
        assert_eq!(group, vec![inside]);
    }

    #[test]
    fn test_remove_frees_subtree() {
        let mut doc = Document::new();
        let parent = doc.create_element("div");
        let child = doc.create_text("x");
        doc.append(doc.root(), parent);
        doc.append(parent, child);

        doc.remove(doc.root(), parent);
        assert!(!doc.contains(parent));
        assert!(!doc.contains(child));
    }
}
