//! Arena holding the live node tree of a virtual screen.

use std::collections::HashMap;

use uiauto_core_types::{NodeFlag, Point, Rect};

use super::fixture::NodeSpec;

#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    pub id: u64,
    pub parent: Option<u64>,
    pub children: Vec<u64>,
    /// Attributes only; `props.children` is always empty.
    pub props: NodeSpec,
    pub package: String,
    /// Set by a long press; the next delete key wipes the whole text.
    pub select_all: bool,
}

impl NodeData {
    pub fn bounds(&self) -> Rect {
        self.props.rect()
    }

    pub fn flag(&self, flag: NodeFlag) -> bool {
        self.props.flag_value(flag)
    }

    /// Text as the platform reports it: hint text while empty.
    pub fn displayed_text(&self) -> String {
        if self.props.text.is_empty() {
            self.props.hint.clone().unwrap_or_default()
        } else {
            self.props.text.clone()
        }
    }
}

#[derive(Debug)]
pub(crate) struct Tree {
    nodes: HashMap<u64, NodeData>,
    root: u64,
    next_id: u64,
}

impl Tree {
    pub fn build(root: NodeSpec, package: &str) -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            root: 1,
            next_id: 1,
        };
        tree.root = tree.insert(None, root, package);
        tree
    }

    fn insert(&mut self, parent: Option<u64>, mut spec: NodeSpec, package: &str) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let children = std::mem::take(&mut spec.children);
        let package = spec.package.clone().unwrap_or_else(|| package.to_string());
        self.nodes.insert(
            id,
            NodeData {
                id,
                parent,
                children: Vec::new(),
                props: spec,
                package: package.clone(),
                select_all: false,
            },
        );
        let child_ids: Vec<u64> = children
            .into_iter()
            .map(|child| self.insert(Some(id), child, &package))
            .collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = child_ids;
        }
        id
    }

    pub fn root(&self) -> u64 {
        self.root
    }

    pub fn get(&self, id: u64) -> Option<&NodeData> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut NodeData> {
        self.nodes.get_mut(&id)
    }

    /// Pre-order walk starting at (and including) `from`.
    pub fn preorder(&self, from: u64) -> Vec<u64> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    pub fn descendants(&self, of: u64) -> Vec<u64> {
        let mut all = self.preorder(of);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    pub fn sibling_index(&self, id: u64) -> u32 {
        self.get(id)
            .and_then(|node| node.parent)
            .and_then(|parent| self.get(parent))
            .and_then(|parent| parent.children.iter().position(|c| *c == id))
            .map(|pos| pos as u32)
            .unwrap_or(0)
    }

    /// Hidden nodes and everything under them are off screen.
    pub fn is_hidden(&self, id: u64) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.nodes.get(&cur) {
                Some(node) if node.props.hidden => return true,
                Some(node) => current = node.parent,
                None => return true,
            }
        }
        false
    }

    /// Unhides `id` and every hidden ancestor.
    pub fn reveal(&mut self, id: u64) {
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.nodes.get_mut(&cur) {
                Some(node) => {
                    node.props.hidden = false;
                    current = node.parent;
                }
                None => break,
            }
        }
    }

    /// Detaches the subtree rooted at `id`. Returns the number of nodes dropped.
    pub fn remove(&mut self, id: u64) -> usize {
        if id == self.root {
            return 0;
        }
        let doomed = self.preorder(id);
        if let Some(parent) = self.nodes.get(&id).and_then(|node| node.parent) {
            if let Some(parent) = self.nodes.get_mut(&parent) {
                parent.children.retain(|c| *c != id);
            }
        }
        for node in &doomed {
            self.nodes.remove(node);
        }
        doomed.len()
    }

    pub fn append(&mut self, parent: u64, spec: NodeSpec) -> Option<u64> {
        let package = self.nodes.get(&parent)?.package.clone();
        let id = self.insert(Some(parent), spec, &package);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        Some(id)
    }

    /// Deepest visible node whose bounds contain `point`.
    pub fn topmost_at(&self, point: Point) -> Option<u64> {
        self.preorder(self.root)
            .into_iter()
            .filter(|id| !self.is_hidden(*id))
            .filter(|id| self.nodes.get(id).is_some_and(|n| n.bounds().contains(point)))
            .last()
    }

    pub fn focus(&mut self, id: u64) {
        for node in self.nodes.values_mut() {
            node.props.focused = node.id == id;
        }
    }

    pub fn focused(&self) -> Option<u64> {
        self.preorder(self.root)
            .into_iter()
            .find(|id| self.nodes.get(id).is_some_and(|n| n.props.focused))
    }

    /// Document position of every live node.
    pub fn positions(&self) -> HashMap<u64, usize> {
        self.preorder(self.root)
            .into_iter()
            .enumerate()
            .map(|(pos, id)| (id, pos))
            .collect()
    }
}
