//! Arena-backed markup tree
//!
//! Nodes live in a flat arena and refer to each other through [`NodeId`]
//! indices. Parent links are plain indices, so sibling and ancestor
//! navigation never fights the borrow checker. Detached nodes stay in the
//! arena but are unreachable from the document node and are never written.

/// Handle to a node inside one [`XmlTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element's qualified name and attributes, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    /// Create an element without attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Builder-style attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic document node at the top of every tree
    Document,
    Element(Element),
    /// Unescaped character data
    Text(String),
    CData(String),
    /// Raw comment body
    Comment(String),
    /// Raw `<?xml ...?>` declaration body
    Declaration(String),
    /// Raw processing instruction body
    ProcessingInstruction(String),
    /// Raw doctype body
    DocType(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable document tree
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<NodeData>,
}

impl Default for XmlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The document node
    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    /// The outermost element, if any
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.document())
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    // ---- construction -------------------------------------------------

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached node
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(kind)
    }

    /// Create a detached element
    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.alloc(NodeKind::Element(element))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    /// Create an element and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = self.create_element(element);
        self.append_child(parent, id);
        id
    }

    /// Create a text node and append it to `parent`
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        let id = self.create_text(text);
        self.append_child(parent, id);
        id
    }

    // ---- structural edits ---------------------------------------------

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` as the first child of `parent`, detaching it first
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.insert(0, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `node` immediately before `anchor`; no-op if `anchor` is detached
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) {
        self.insert_relative(anchor, node, 0);
    }

    /// Insert `node` immediately after `anchor`; no-op if `anchor` is detached
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        self.insert_relative(anchor, node, 1);
    }

    fn insert_relative(&mut self, anchor: NodeId, node: NodeId, offset: usize) {
        if anchor == node {
            return;
        }
        self.detach(node);
        let Some(parent) = self.parent(anchor) else {
            return;
        };
        let Some(pos) = self.index_in_parent(anchor) else {
            return;
        };
        self.nodes[parent.0].children.insert(pos + offset, node);
        self.nodes[node.0].parent = Some(parent);
    }

    /// Unlink a node from its parent; the subtree stays intact but unreachable
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Remove every child of `parent`
    pub fn clear_children(&mut self, parent: NodeId) {
        let children = std::mem::take(&mut self.nodes[parent.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Copy a subtree; the copy is detached
    pub fn deep_clone(&mut self, node: NodeId) -> NodeId {
        let kind = self.nodes[node.0].kind.clone();
        let copy = self.alloc(kind);
        let children = self.nodes[node.0].children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    /// First child element named `name`, created and appended if absent
    pub fn ensure_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        match self.first_child_named(parent, name) {
            Some(child) => child,
            None => self.append_element(parent, Element::new(name)),
        }
    }

    /// First child element named `name`, created as the first child if absent
    pub fn ensure_first_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        match self.first_child_named(parent, name) {
            Some(child) => child,
            None => {
                let child = self.create_element(Element::new(name));
                self.prepend_child(parent, child);
                child
            }
        }
    }

    /// First child element named `name`; if absent it is created in front of
    /// the first existing child whose name is listed in `before`, or appended
    pub fn ensure_child_before(&mut self, parent: NodeId, name: &str, before: &[&str]) -> NodeId {
        if let Some(child) = self.first_child_named(parent, name) {
            return child;
        }
        let child = self.create_element(Element::new(name));
        let anchor = self
            .children(parent)
            .iter()
            .copied()
            .find(|&c| self.name(c).is_some_and(|n| before.contains(&n)));
        match anchor {
            Some(anchor) => self.insert_before(anchor, child),
            None => self.append_child(parent, child),
        }
        child
    }

    // ---- navigation ---------------------------------------------------

    /// Node payload
    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    /// Element payload, if the node is an element
    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Qualified element name
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.name.as_str())
    }

    /// Check an element's qualified name
    pub fn is(&self, node: NodeId, name: &str) -> bool {
        self.name(node) == Some(name)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Child elements with the given name
    pub fn children_named<'a>(
        &'a self,
        node: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(node)
            .iter()
            .copied()
            .filter(move |&c| self.is(c, name))
    }

    pub fn first_child_named(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.children_named(node, name).next()
    }

    /// Follow a path of child element names
    pub fn child_path(&self, node: NodeId, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(node, |cur, name| self.first_child_named(cur, name))
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.nodes[parent.0].children.iter().position(|&c| c == node)
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let pos = self.index_in_parent(node)?;
        pos.checked_sub(1)
            .map(|p| self.nodes[parent.0].children[p])
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let pos = self.index_in_parent(node)?;
        self.nodes[parent.0].children.get(pos + 1).copied()
    }

    /// Ancestors from the parent outward, ending at the document node
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |&n| self.parent(n))
    }

    /// Nearest ancestor element named `name`
    pub fn ancestor_named(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.ancestors(node).find(|&a| self.is(a, name))
    }

    /// Whether `ancestor` is a proper ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is reachable from the document node
    pub fn is_attached(&self, node: NodeId) -> bool {
        node == self.document() || self.is_ancestor(self.document(), node)
    }

    /// All nodes below `node` in document order (pre-order), excluding `node`
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(cur) = stack.pop() {
            out.push(cur);
            stack.extend(self.children(cur).iter().rev().copied());
        }
        out
    }

    /// Descendant elements named `name`, in document order
    pub fn descendants_named(&self, node: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|&d| self.is(d, name))
            .collect()
    }

    /// The maximal subtrees lying strictly between `start` and `end` in
    /// document order
    ///
    /// Ancestors of either node are never included; their children are
    /// examined instead. Returns an empty list when `end` does not follow
    /// `start`.
    pub fn nodes_between(&self, start: NodeId, end: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = start;

        'walk: loop {
            let mut next = self.next_sibling(cur);
            while next.is_none() {
                match self.parent(cur) {
                    Some(parent) => {
                        cur = parent;
                        next = self.next_sibling(cur);
                    }
                    None => return Vec::new(),
                }
            }

            let mut node = match next {
                Some(node) => node,
                None => return Vec::new(),
            };
            loop {
                if node == end {
                    break 'walk;
                }
                if self.is_ancestor(node, end) {
                    match self.children(node).first() {
                        Some(&first) => {
                            node = first;
                            continue;
                        }
                        None => break 'walk,
                    }
                }
                out.push(node);
                cur = node;
                break;
            }
        }

        out
    }

    // ---- attributes and text -----------------------------------------

    /// Attribute value by qualified name
    pub fn attr(&self, node: NodeId, key: &str) -> Option<&str> {
        self.element(node)?
            .attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set (or replace) an attribute
    pub fn set_attr(&mut self, node: NodeId, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(element) = self.element_mut(node) {
            match element.attrs.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value,
                None => element.attrs.push((key.to_string(), value)),
            }
        }
    }

    /// Concatenated character data of a subtree
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let NodeKind::Text(t) | NodeKind::CData(t) = self.kind(node) {
            out.push_str(t);
        }
        for d in self.descendants(node) {
            if let NodeKind::Text(t) | NodeKind::CData(t) = self.kind(d) {
                out.push_str(t);
            }
        }
        out
    }

    /// Replace a node's children with a single text node
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        self.clear_children(node);
        self.append_text(node, text);
    }
}
