//! In-memory [`Page`] double for unit tests.
//!
//! Supports exactly the selector grammar the agent uses (`tag[attr]`,
//! `tag[attr="value"]`, and the tag-less forms), keeps nodes in insertion
//! order to model document order, and records native navigation calls so
//! tests can assert on them.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::identifiers::NodeId;

use super::{Page, Rect};

// ============================================================================
// FakeNode
// ============================================================================

#[derive(Debug, Default)]
struct FakeNode {
    tag: String,
    attributes: FxHashMap<String, String>,
    class_name: String,
    element_id: String,
    text: String,
    styles: FxHashMap<String, String>,
    rect: Option<Rect>,
    svg_descendant: bool,
    overlay_text: String,
    overlay_position: Option<(f64, f64)>,
    overlay_visible: bool,
    attached: bool,
}

// ============================================================================
// FakePage
// ============================================================================

/// An in-memory page. Starts embedded, ready, and with a rendered root.
pub(crate) struct FakePage {
    nodes: FxHashMap<NodeId, FakeNode>,
    order: Vec<NodeId>,
    next_id: u64,
    pub embedded: bool,
    pub ready: bool,
    pub rendered: bool,
    pub viewport: f64,
    url: String,
    pub back_calls: usize,
    pub forward_calls: usize,
    pub reload_calls: usize,
    storage: FxHashMap<String, String>,
    pub storage_disabled: bool,
    pub pointer_capture: bool,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            order: Vec::new(),
            next_id: 1,
            embedded: true,
            ready: true,
            rendered: true,
            viewport: 1280.0,
            url: "http://localhost:8081/".to_string(),
            back_calls: 0,
            forward_calls: 0,
            reload_calls: 0,
            storage: FxHashMap::default(),
            storage_disabled: false,
            pointer_capture: false,
        }
    }

    fn insert(&mut self, node: FakeNode) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        self.order.push(id);
        id
    }

    // ========================================================================
    // Test construction helpers
    // ========================================================================

    pub fn add_element(&mut self, tag: &str) -> NodeId {
        self.insert(FakeNode {
            tag: tag.to_lowercase(),
            rect: Some(Rect::new(0.0, 100.0, 200.0, 50.0)),
            attached: true,
            ..FakeNode::default()
        })
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Option<Rect>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.rect = rect;
        }
    }

    pub fn set_class(&mut self, node: NodeId, class: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.class_name = class.to_string();
        }
    }

    pub fn set_elem_id(&mut self, node: NodeId, id: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.element_id = id.to_string();
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.text = text.to_string();
        }
    }

    pub fn mark_svg_descendant(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.svg_descendant = true;
        }
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    // ========================================================================
    // Test inspection helpers
    // ========================================================================

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.attributes.contains_key(name))
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.attached)
    }

    pub fn text_of(&self, node: NodeId) -> String {
        self.nodes
            .get(&node)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.nodes
            .get(&node)
            .and_then(|n| n.styles.get(property).cloned())
    }

    pub fn overlays_with_class(&self, class: &str) -> Vec<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| n.attached && n.tag == "div" && n.class_name == class)
            })
            .collect()
    }

    pub fn overlay_visible(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.overlay_visible)
    }

    pub fn overlay_position(&self, node: NodeId) -> Option<(f64, f64)> {
        self.nodes.get(&node).and_then(|n| n.overlay_position)
    }

    pub fn overlay_text(&self, node: NodeId) -> String {
        self.nodes
            .get(&node)
            .map(|n| n.overlay_text.clone())
            .unwrap_or_default()
    }

    pub fn storage_contains(&self, key: &str) -> bool {
        self.storage.contains_key(key)
    }

    // ========================================================================
    // Selector grammar
    // ========================================================================

    /// Parses `tag[attr]` / `tag[attr="value"]` (tag optional).
    fn parse_selector(selector: &str) -> Option<(Option<&str>, &str, Option<&str>)> {
        let open = selector.find('[')?;
        let tag = &selector[..open];
        let inner = selector[open + 1..].strip_suffix(']')?;

        let (name, value) = match inner.split_once('=') {
            Some((name, value)) => (name, Some(value.trim_matches('"'))),
            None => (inner, None),
        };

        let tag = (!tag.is_empty()).then_some(tag);
        Some((tag, name, value))
    }

    fn matches(&self, node: &FakeNode, tag: Option<&str>, name: &str, value: Option<&str>) -> bool {
        if !node.attached {
            return false;
        }
        if let Some(tag) = tag
            && node.tag != tag
        {
            return false;
        }
        match value {
            Some(value) => node.attributes.get(name).map(String::as_str) == Some(value),
            None => node.attributes.contains_key(name),
        }
    }
}

// ============================================================================
// Page Implementation
// ============================================================================

impl Page for FakePage {
    fn is_embedded(&self) -> bool {
        self.embedded
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn root_rendered(&self) -> bool {
        self.rendered
    }

    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        let Some((tag, name, value)) = Self::parse_selector(selector) else {
            return Vec::new();
        };

        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| self.matches(n, tag, name, value))
            })
            .collect()
    }

    fn contains(&self, node: NodeId) -> bool {
        self.is_attached(node)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes
            .get(&node)
            .filter(|n| n.attached)
            .map(|n| n.tag.clone())
    }

    fn class_name(&self, node: NodeId) -> Option<String> {
        self.nodes
            .get(&node)
            .filter(|n| n.attached)
            .map(|n| n.class_name.clone())
    }

    fn element_id(&self, node: NodeId) -> Option<String> {
        self.nodes
            .get(&node)
            .filter(|n| n.attached)
            .map(|n| n.element_id.clone())
    }

    fn inner_text(&self, node: NodeId) -> Option<String> {
        self.nodes
            .get(&node)
            .filter(|n| n.attached)
            .map(|n| n.text.clone())
    }

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .get(&node)
            .filter(|n| n.attached)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.nodes.get(&node).filter(|n| n.attached).and_then(|n| n.rect)
    }

    fn is_svg_descendant(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.svg_descendant)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.nodes.get_mut(&node)
            && n.attached
        {
            n.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.attributes.remove(name);
        }
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node)
            && n.attached
        {
            n.text = text.to_string();
        }
    }

    fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(n) = self.nodes.get_mut(&node)
            && n.attached
        {
            n.styles.insert(property.to_string(), value.to_string());
        }
    }

    fn remove_node(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.attached = false;
        }
    }

    fn create_overlay_node(&mut self, class_name: &str) -> NodeId {
        self.insert(FakeNode {
            tag: "div".to_string(),
            class_name: class_name.to_string(),
            attached: true,
            ..FakeNode::default()
        })
    }

    fn set_overlay_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.overlay_text = text.to_string();
        }
    }

    fn set_overlay_position(&mut self, node: NodeId, x: f64, y: f64) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.overlay_position = Some((x, y));
        }
    }

    fn set_overlay_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.overlay_visible = visible;
        }
    }

    fn inject_stylesheet(&mut self, css: &str) -> NodeId {
        self.insert(FakeNode {
            tag: "style".to_string(),
            text: css.to_string(),
            attached: true,
            ..FakeNode::default()
        })
    }

    fn set_pointer_capture(&mut self, enabled: bool) {
        self.pointer_capture = enabled;
    }

    fn viewport_width(&self) -> f64 {
        self.viewport
    }

    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn go_back(&mut self) {
        self.back_calls += 1;
    }

    fn go_forward(&mut self) {
        self.forward_calls += 1;
    }

    fn reload(&mut self) {
        self.reload_calls += 1;
    }

    fn storage_get(&self, key: &str) -> Result<Option<String>> {
        if self.storage_disabled {
            return Err(Error::storage("storage disabled"));
        }
        Ok(self.storage.get(key).cloned())
    }

    fn storage_set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.storage_disabled {
            return Err(Error::storage("storage disabled"));
        }
        self.storage.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn storage_remove(&mut self, key: &str) -> Result<()> {
        if self.storage_disabled {
            return Err(Error::storage("storage disabled"));
        }
        self.storage.remove(key);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_by_attribute_value() {
        let mut page = FakePage::new();
        let a = page.add_element("div");
        let b = page.add_element("div");
        page.set_attribute(a, "data-inspect-id", "app.tsx:1:2");
        page.set_attribute(b, "data-inspect-id", "app.tsx:9:9");

        let hits = page.query_selector_all(r#"[data-inspect-id="app.tsx:1:2"]"#);
        assert_eq!(hits, vec![a]);
    }

    #[test]
    fn test_selector_by_presence_in_document_order() {
        let mut page = FakePage::new();
        let a = page.add_element("span");
        let b = page.add_element("p");
        page.set_attribute(a, "data-inspect-hovered", "true");
        page.set_attribute(b, "data-inspect-hovered", "true");

        let hits = page.query_selector_all("[data-inspect-hovered]");
        assert_eq!(hits, vec![a, b]);
    }

    #[test]
    fn test_selector_with_tag() {
        let mut page = FakePage::new();
        let button = page.add_element("button");
        let div = page.add_element("div");
        page.set_attribute(button, "disabled", "");
        page.set_attribute(div, "disabled", "");

        let hits = page.query_selector_all("button[disabled]");
        assert_eq!(hits, vec![button]);
    }

    #[test]
    fn test_detached_nodes_do_not_match() {
        let mut page = FakePage::new();
        let a = page.add_element("div");
        page.set_attribute(a, "data-inspect-selected", "true");
        page.remove_node(a);

        assert!(page.query_selector_all("[data-inspect-selected]").is_empty());
        assert!(page.bounding_rect(a).is_none());
    }

    #[test]
    fn test_storage_disabled_errors() {
        let mut page = FakePage::new();
        page.storage_disabled = true;

        assert!(page.storage_get("k").is_err());
        assert!(page.storage_set("k", "v").is_err());
    }
}
