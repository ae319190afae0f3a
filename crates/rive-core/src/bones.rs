use crate::artboard::{Artboard, Bone};
use glam::Vec2;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

/// Read-only view of a skeletal bone owned by the host runtime.
///
/// The hierarchy never caches what these methods return: the pose may be
/// rewritten by animation between building the hierarchy and reading it.
pub trait BonePayload {
    /// Stable identity of the bone within its skeleton.
    fn index(&self) -> usize;
    /// Index of the parent bone, or `None` for a root bone.
    fn parent_index(&self) -> Option<usize>;
    fn name(&self) -> &str;
    fn translation(&self) -> Vec2;
    fn scale(&self) -> Vec2;
    /// Rotation in radians.
    fn rotation(&self) -> f32;
    fn length(&self) -> f32;
}

/// 64-bit hash of a bone name, used as a lookup key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameHash(pub u64);

impl NameHash {
    pub fn of(name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        NameHash(hasher.finish())
    }
}

/// Position of a node inside its hierarchy's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug)]
pub struct BoneNode<'a, B> {
    index: usize,
    name_hash: NameHash,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    bone: &'a B,
}

impl<'a, B: BonePayload> BoneNode<'a, B> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name_hash(&self) -> NameHash {
        self.name_hash
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in the order they were discovered in the source list.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn bone(&self) -> &'a B {
        self.bone
    }

    pub fn name(&self) -> &'a str {
        self.bone.name()
    }

    pub fn position(&self) -> Vec2 {
        self.bone.translation()
    }

    pub fn scale(&self) -> Vec2 {
        self.bone.scale()
    }

    pub fn rotation(&self) -> f32 {
        self.bone.rotation()
    }

    pub fn length(&self) -> f32 {
        self.bone.length()
    }
}

/// A forest of bone nodes stored in a single arena.
///
/// `nodes` is the sole owner of every node; `roots` only holds ids into it.
/// Each node has at most one parent and child lists are derived from those
/// parent links, so every node appears in at most one child list and a
/// traversal from the roots always terminates. Nodes caught in a parent
/// cycle are unreachable from the roots and reported by [`detached`].
///
/// [`detached`]: BoneHierarchy::detached
#[derive(Debug)]
pub struct BoneHierarchy<'a, B> {
    nodes: Vec<BoneNode<'a, B>>,
    roots: Vec<NodeId>,
}

/// Returns every bone of the artboard in component order.
pub fn collect(artboard: &Artboard) -> Vec<&Bone> {
    artboard.bones()
}

impl<'a> BoneHierarchy<'a, Bone> {
    pub fn from_artboard(artboard: &'a Artboard) -> Self {
        Self::build(collect(artboard))
    }
}

impl<'a, B: BonePayload> BoneHierarchy<'a, B> {
    /// Builds the forest from a flat bone list.
    ///
    /// Parents may appear before or after their children. A bone whose
    /// parent index is not in the list (or names itself) becomes a root.
    /// Duplicate indices produce independent nodes; parent lookups resolve
    /// to the first node carrying the index.
    pub fn build<I>(bones: I) -> Self
    where
        I: IntoIterator<Item = &'a B>,
    {
        let mut nodes: Vec<BoneNode<'a, B>> = bones
            .into_iter()
            .map(|bone| BoneNode {
                index: bone.index(),
                name_hash: NameHash::of(bone.name()),
                parent: None,
                children: Vec::new(),
                bone,
            })
            .collect();

        let mut by_index: HashMap<usize, NodeId> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            by_index.entry(node.index).or_insert(NodeId(i));
        }

        let mut roots = Vec::new();
        for i in 0..nodes.len() {
            let id = NodeId(i);
            let parent = match nodes[i].bone.parent_index() {
                None => None,
                Some(parent_index) => match by_index.get(&parent_index) {
                    Some(&parent_id) if parent_id == id => {
                        warn!(
                            "Bone '{}' ({}) is its own parent, treating it as a root.",
                            nodes[i].name(),
                            nodes[i].index
                        );
                        None
                    }
                    Some(&parent_id) => Some(parent_id),
                    None => {
                        warn!(
                            "Bone '{}' ({}) references missing parent {}, treating it as a root.",
                            nodes[i].name(),
                            nodes[i].index,
                            parent_index
                        );
                        None
                    }
                },
            };

            match parent {
                Some(parent_id) => {
                    nodes[i].parent = Some(parent_id);
                    nodes[parent_id.0].children.push(id);
                }
                None => roots.push(id),
            }
        }

        let hierarchy = BoneHierarchy { nodes, roots };
        let detached = hierarchy.detached();
        if !detached.is_empty() {
            warn!(
                "{} bone(s) form a parent cycle and are unreachable from any root.",
                detached.len()
            );
        }
        debug!(
            bones = hierarchy.nodes.len(),
            roots = hierarchy.roots.len(),
            "built bone hierarchy"
        );
        hierarchy
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in source order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> &BoneNode<'a, B> {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&BoneNode<'a, B>> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// First node whose name hashes to the same value as `name`.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let hash = NameHash::of(name);
        self.nodes
            .iter()
            .position(|n| n.name_hash == hash)
            .map(NodeId)
    }

    /// Depth-first pre-order walk over every tree, yielding `(node, depth)`.
    pub fn pre_order(&self) -> PreOrder<'_, 'a, B> {
        PreOrder {
            hierarchy: self,
            stack: self.roots.iter().rev().map(|&id| (id, 0)).collect(),
        }
    }

    /// Nodes that cannot be reached from any root.
    pub fn detached(&self) -> Vec<NodeId> {
        let mut reached = vec![false; self.nodes.len()];
        for (id, _) in self.pre_order() {
            reached[id.0] = true;
        }
        reached
            .iter()
            .enumerate()
            .filter_map(|(i, &r)| (!r).then_some(NodeId(i)))
            .collect()
    }

    /// Reports duplicate and empty bone names. Never renames anything.
    pub fn validate_names(&self) -> NameValidation {
        let mut validation = NameValidation::default();
        let mut seen: HashMap<NameHash, Vec<NodeId>> = HashMap::new();
        let mut order = Vec::new();

        for (i, node) in self.nodes.iter().enumerate() {
            if node.name().is_empty() {
                warn!(
                    "Bone {} has no name! Each bone must have a unique, non empty name.",
                    i
                );
                validation.unnamed.push(NodeId(i));
                continue;
            }
            let ids = seen.entry(node.name_hash).or_insert_with(|| {
                order.push(node.name_hash);
                Vec::new()
            });
            ids.push(NodeId(i));
        }

        for hash in order {
            let ids = &seen[&hash];
            if ids.len() > 1 {
                let name = self.nodes[ids[0].0].name().to_string();
                warn!(
                    "{} bones have the name '{}'! Each bone must have a unique, non empty name.",
                    ids.len(),
                    name
                );
                validation.collisions.push(NameCollision {
                    name,
                    hash,
                    nodes: ids.clone(),
                });
            }
        }
        validation
    }

    /// Drops every node. The flat list is walked directly, so deep rigs do
    /// not recurse; calling this on an emptied hierarchy does nothing.
    pub fn free(&mut self) {
        self.roots.clear();
        self.nodes.clear();
    }

    /// Writes the forest as an indented tree, two spaces per level.
    pub fn write_tree<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for (id, depth) in self.pre_order() {
            writeln!(out, "{:indent$}{}", "", self.nodes[id.0].name(), indent = depth * 2)?;
        }
        Ok(())
    }

    pub fn debug_print(&self) {
        let mut tree = String::new();
        if self.write_tree(&mut tree).is_ok() {
            for line in tree.lines() {
                debug!("{}", line);
            }
        }
    }
}

impl<'a, B: BonePayload> fmt::Display for BoneHierarchy<'a, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f)
    }
}

pub struct PreOrder<'h, 'a, B> {
    hierarchy: &'h BoneHierarchy<'a, B>,
    stack: Vec<(NodeId, usize)>,
}

impl<'h, 'a, B: BonePayload> Iterator for PreOrder<'h, 'a, B> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        let children = self.hierarchy.children(id);
        self.stack
            .extend(children.iter().rev().map(|&child| (child, depth + 1)));
        Some((id, depth))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameCollision {
    pub name: String,
    pub hash: NameHash,
    pub nodes: Vec<NodeId>,
}

/// Result of [`BoneHierarchy::validate_names`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameValidation {
    pub collisions: Vec<NameCollision>,
    pub unnamed: Vec<NodeId>,
}

impl NameValidation {
    pub fn is_ok(&self) -> bool {
        self.collisions.is_empty() && self.unnamed.is_empty()
    }

    pub fn colliding_names(&self) -> impl Iterator<Item = &str> {
        self.collisions.iter().map(|c| c.name.as_str())
    }
}
