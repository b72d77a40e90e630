//! Headless document tree: an arena of elements with id/class lookup,
//! attribute and inline-style mutation, and detach-on-remove semantics.
//!
//! Removed elements stay in the arena (like a script still holding a reference
//! to a detached node) but are no longer reachable from the root, so queries
//! never return them again.

use std::collections::BTreeMap;

/// Index of an element in a [`Document`] arena
pub type NodeId = usize;

/// Tags serialized without a closing tag
const VOID_TAGS: &[&str] = &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

/// Minimal view of a document that timer-driven page actions mutate.
///
/// Lookups are live: every call walks the tree as it is right now.
pub trait DocumentTree {
    /// First attached element (document order) whose `id` equals `id`
    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// All attached elements whose class list currently includes `class`
    fn elements_by_class_name(&self, class: &str) -> Vec<NodeId>;

    /// Set an attribute; returns false if `node` does not exist
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool;

    /// Set an inline style property; returns false if `node` does not exist
    fn set_style_property(&mut self, node: NodeId, name: &str, value: &str) -> bool;

    /// Unlink `node` from its parent, even if that parent is itself detached.
    /// Returns false when `node` has no parent (or is the root).
    fn remove_element(&mut self, node: NodeId) -> bool;

    /// Whether `node` is currently reachable from the root
    fn contains(&self, node: NodeId) -> bool;
}

/// A single element node
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes, including `id` and `class`
    pub attributes: BTreeMap<String, String>,
    /// Inline style properties (`opacity`, ...)
    pub style: BTreeMap<String, String>,
    /// Concatenated direct text content
    pub text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(|s| s.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed document. Node 0 is always the `<html>` root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty `<html><head></head><body></body></html>` document
    pub fn new() -> Self {
        let mut doc = Document { nodes: vec![Element::new("html")] };
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.append_child(0, head);
        doc.append_child(0, body);
        doc
    }

    /// Parse an HTML document into an arena.
    ///
    /// Only element structure, attributes and direct text are kept; comments
    /// and doctype nodes are dropped.
    #[cfg(feature = "html")]
    pub fn from_html(html: &str) -> Self {
        let parsed = scraper::Html::parse_document(html);
        let root = parsed.root_element();
        let mut doc = Document { nodes: Vec::new() };

        let mut stack: Vec<(scraper::ElementRef, Option<NodeId>)> = vec![(root, None)];
        while let Some((node, parent_idx)) = stack.pop() {
            let mut el = Element::new(node.value().name());
            for (k, v) in node.value().attrs() {
                el.attributes.insert(k.to_string(), v.to_string());
            }
            if let Some(style) = el.attributes.remove("style") {
                el.style = parse_inline_style(&style);
            }
            el.text = node
                .children()
                .filter_map(|n| n.value().as_text().map(|t| String::from(&**t)))
                .collect::<String>()
                .trim()
                .to_string();

            let idx = doc.nodes.len();
            doc.nodes.push(el);
            if let Some(p) = parent_idx {
                doc.nodes[idx].parent = Some(p);
                doc.nodes[p].children.push(idx);
            }
            let children: Vec<_> = node.children().filter_map(scraper::ElementRef::wrap).collect();
            for child in children.into_iter().rev() {
                stack.push((child, Some(idx)));
            }
        }
        doc
    }

    pub fn root(&self) -> NodeId {
        0
    }

    /// First `<body>` element, if the document has one attached
    pub fn body(&self) -> Option<NodeId> {
        self.descendants(0).into_iter().find(|&n| self.nodes[n].tag == "body")
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(node)?.attributes.get(name).map(|s| s.as_str())
    }

    pub fn style_property(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(node)?.style.get(name).map(|s| s.as_str())
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Element::new(tag));
        self.nodes.len() - 1
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> bool {
        match self.nodes.get_mut(node) {
            Some(el) => {
                el.text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Add a class token unless it is already present
    pub fn add_class(&mut self, node: NodeId, class: &str) -> bool {
        let Some(el) = self.nodes.get_mut(node) else {
            return false;
        };
        if el.has_class(class) {
            return true;
        }
        let entry = el.attributes.entry("class".to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(class);
        true
    }

    /// Append `child` as the last child of `parent`, moving it if it was
    /// attached elsewhere. Refuses to create cycles.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent >= self.nodes.len() || child >= self.nodes.len() || child == 0 {
            return false;
        }
        if self.is_inclusive_ancestor(child, parent) {
            return false;
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        true
    }

    /// Attached nodes in document (pre-)order, starting at `from`
    fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(n) = stack.pop() {
            out.push(n);
            for &c in self.nodes[n].children.iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.nodes[n].parent;
        }
        false
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(p) = self.nodes[node].parent.take() {
            self.nodes[p].children.retain(|&c| c != node);
        }
    }

    /// Serialize the attached tree back to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(0, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let el = &self.nodes[node];
        out.push('<');
        out.push_str(&el.tag);
        for (k, v) in &el.attributes {
            out.push_str(&format!(" {}=\"{}\"", k, escape(v)));
        }
        if !el.style.is_empty() {
            let style = el.style.iter().map(|(k, v)| format!("{}: {}", k, v)).collect::<Vec<_>>().join("; ");
            out.push_str(&format!(" style=\"{}\"", escape(&style)));
        }
        out.push('>');
        if VOID_TAGS.contains(&el.tag.as_str()) {
            return;
        }
        out.push_str(&escape(&el.text));
        for &c in &el.children {
            self.write_html(c, out);
        }
        out.push_str(&format!("</{}>", el.tag));
    }
}

impl DocumentTree for Document {
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(0).into_iter().find(|&n| self.nodes[n].id() == Some(id))
    }

    fn elements_by_class_name(&self, class: &str) -> Vec<NodeId> {
        self.descendants(0).into_iter().filter(|&n| self.nodes[n].has_class(class)).collect()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        match self.nodes.get_mut(node) {
            Some(el) => {
                el.attributes.insert(name.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    fn set_style_property(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        match self.nodes.get_mut(node) {
            Some(el) => {
                el.style.insert(name.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    fn remove_element(&mut self, node: NodeId) -> bool {
        if node == 0 || self.nodes.get(node).and_then(|el| el.parent).is_none() {
            return false;
        }
        self.detach(node);
        true
    }

    fn contains(&self, node: NodeId) -> bool {
        node < self.nodes.len() && self.is_inclusive_ancestor(0, node)
    }
}

// "opacity: 0; color: red" -> {opacity: 0, color: red}
fn parse_inline_style(s: &str) -> BTreeMap<String, String> {
    s.split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim().to_ascii_lowercase();
            if k.is_empty() {
                return None;
            }
            Some((k, v.trim().to_string()))
        })
        .collect()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let img = doc.create_element("img");
        doc.set_attribute(img, "id", "slideshow");
        doc.append_child(body, img);
        let a = doc.create_element("div");
        doc.add_class(a, "flash");
        doc.add_class(a, "error");
        doc.append_child(body, a);
        let b = doc.create_element("div");
        doc.add_class(b, "flash");
        doc.append_child(body, b);
        (doc, img, a, b)
    }

    #[test]
    fn lookup_by_id_and_class() {
        let (doc, img, a, b) = sample();
        assert_eq!(doc.element_by_id("slideshow"), Some(img));
        assert_eq!(doc.element_by_id("missing"), None);
        assert_eq!(doc.elements_by_class_name("flash"), vec![a, b]);
        assert_eq!(doc.elements_by_class_name("error"), vec![a]);
        assert_eq!(doc.attribute(a, "class"), Some("flash error"));
    }

    #[test]
    fn removed_elements_are_detached_and_unqueryable() {
        let (mut doc, _img, a, b) = sample();
        assert!(doc.remove_element(a));
        assert!(!doc.contains(a));
        assert!(!doc.remove_element(a));
        assert_eq!(doc.elements_by_class_name("flash"), vec![b]);
        // the detached node is still addressable
        assert!(doc.set_style_property(a, "opacity", "0"));
        assert_eq!(doc.style_property(a, "opacity"), Some("0"));
    }

    #[test]
    fn child_of_detached_parent_can_still_be_removed() {
        let (mut doc, _img, a, b) = sample();
        assert!(doc.append_child(a, b));
        assert!(doc.remove_element(a));
        assert!(!doc.contains(b));
        assert!(doc.remove_element(b));
        assert_eq!(doc.element(b).unwrap().parent(), None);
        assert!(doc.element(a).unwrap().children().is_empty());
        assert!(!doc.remove_element(b));
    }

    #[test]
    fn root_cannot_be_removed_and_cycles_are_refused() {
        let (mut doc, _img, a, b) = sample();
        assert!(!doc.remove_element(doc.root()));
        assert!(doc.append_child(a, b));
        assert!(!doc.append_child(b, a));
        assert_eq!(doc.element(a).unwrap().children(), &[b]);
        assert_eq!(doc.element(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn serializes_style_and_void_tags() {
        let (mut doc, img, a, _b) = sample();
        doc.set_attribute(img, "src", "a.jpg");
        doc.set_style_property(a, "opacity", "0");
        doc.set_text(a, "<saved>");
        let html = doc.to_html();
        assert!(html.contains("&lt;saved&gt;"));
        assert!(html.contains("<img id=\"slideshow\" src=\"a.jpg\">"));
        assert!(!html.contains("</img>"));
        assert!(html.contains("style=\"opacity: 0\""));
    }

    #[cfg(feature = "html")]
    #[test]
    fn parses_html_with_inline_style() {
        let html = r#"<html><body><img id="slideshow" src="x.jpg"><div class="flash success" style="color: green">Saved</div></body></html>"#;
        let doc = Document::from_html(html);
        let img = doc.element_by_id("slideshow").unwrap();
        assert_eq!(doc.attribute(img, "src"), Some("x.jpg"));
        let flashes = doc.elements_by_class_name("flash");
        assert_eq!(flashes.len(), 1);
        assert_eq!(doc.style_property(flashes[0], "color"), Some("green"));
        assert_eq!(doc.element(flashes[0]).unwrap().text, "Saved");
    }
}
