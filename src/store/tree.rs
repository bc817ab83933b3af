//! In-memory archive tree.
//!
//! A [`Tree`] holds the complete content of one archive: groups, datasets and
//! attributes addressed by absolute paths. It knows nothing about files.

use std::collections::BTreeMap;

use crate::core::path::{self, ATTRIBUTE_PREFIX};
use crate::core::NodeKind;
use crate::util::{
    Dimensions, Error, Hyperslab, NativeKind, NativeSlice, NativeSliceMut, Result,
};

/// Array of native elements with its shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    kind: NativeKind,
    dims: Dimensions,
    /// Elements in native byte order, row-major.
    bytes: Vec<u8>,
}

impl Dataset {
    /// Create a zero-filled dataset.
    pub fn zeroed(kind: NativeKind, dims: Dimensions) -> Result<Self> {
        let len = dims
            .checked_num_bytes(kind.num_bytes())
            .ok_or_else(|| Error::range(format!("{} dataset of extent {} is too large", kind, dims)))?;
        Ok(Self { kind, dims, bytes: vec![0u8; len] })
    }

    /// Create a dataset from raw element bytes.
    pub fn from_bytes(kind: NativeKind, dims: Dimensions, bytes: Vec<u8>) -> Result<Self> {
        let expected = dims
            .checked_num_bytes(kind.num_bytes())
            .ok_or_else(|| Error::invalid(format!("extent {} overflows", dims)))?;
        if bytes.len() != expected {
            return Err(Error::invalid(format!(
                "{} dataset of extent {} needs {} bytes, found {}",
                kind,
                dims,
                expected,
                bytes.len()
            )));
        }
        Ok(Self { kind, dims, bytes })
    }

    #[inline]
    pub fn kind(&self) -> NativeKind {
        self.kind
    }

    #[inline]
    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copy a packed chunk into the region.
    fn write_region(&mut self, slab: &Hyperslab, src: &[u8]) {
        let Dataset { kind, dims, bytes } = self;
        let size = kind.num_bytes();
        slab.for_each_run(dims, |at, from, len| {
            bytes[at * size..(at + len) * size].copy_from_slice(&src[from * size..(from + len) * size]);
        });
    }

    /// Apply a write to an existing dataset, or build the replacement.
    ///
    /// Returns None when `existing` had the same kind and shape and was
    /// updated in place.
    fn update(
        existing: Option<&mut Dataset>,
        data: NativeSlice<'_>,
        shape: &Dimensions,
        slab: &Hyperslab,
    ) -> Result<Option<Dataset>> {
        if let Some(dataset) = existing {
            if dataset.kind == data.kind() && dataset.dims == *shape {
                dataset.write_region(slab, data.as_bytes());
                return Ok(None);
            }
        }
        let mut dataset = Dataset::zeroed(data.kind(), shape.clone())?;
        dataset.write_region(slab, data.as_bytes());
        Ok(Some(dataset))
    }

    /// Copy the region into a packed chunk.
    fn read_region(&self, slab: &Hyperslab, dst: &mut [u8]) {
        let size = self.kind.num_bytes();
        slab.for_each_run(&self.dims, |at, to, len| {
            dst[to * size..(to + len) * size].copy_from_slice(&self.bytes[at * size..(at + len) * size]);
        });
    }
}

/// Body of a node: a group of named children or a dataset.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Group(BTreeMap<String, Node>),
    Data(Dataset),
}

/// One node of the tree with its attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub attributes: BTreeMap<String, Dataset>,
    pub body: Body,
}

impl Node {
    /// Create an empty group node.
    pub fn group() -> Self {
        Self { attributes: BTreeMap::new(), body: Body::Group(BTreeMap::new()) }
    }

    /// Create a dataset node.
    pub fn data(dataset: Dataset) -> Self {
        Self { attributes: BTreeMap::new(), body: Body::Data(dataset) }
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self.body, Body::Group(_))
    }

    fn kind_name(&self) -> &'static str {
        match self.body {
            Body::Group(_) => "group",
            Body::Data(_) => "dataset",
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::group()
    }
}

/// Parsed address: a node, or an attribute hanging off a node.
enum Target<'a> {
    Node(Vec<&'a str>),
    Attribute { owner: Vec<&'a str>, name: &'a str },
}

impl<'a> Target<'a> {
    fn parse(path: &'a str) -> Result<Self> {
        let mut segments: Vec<&str> = path::segments(path).collect();
        if let Some(pos) = segments.iter().position(|s| path::is_attribute_segment(s)) {
            if pos + 1 != segments.len() {
                return Err(Error::InvalidPath(format!(
                    "attribute must be the last segment: {}",
                    path
                )));
            }
            let name = &segments[pos][ATTRIBUTE_PREFIX.len_utf8()..];
            if name.is_empty() {
                return Err(Error::InvalidPath(format!("empty attribute name: {}", path)));
            }
            segments.pop();
            return Ok(Self::Attribute { owner: segments, name });
        }
        Ok(Self::Node(segments))
    }
}

/// Root of an archive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tree {
    root: Node,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a decoded root node.
    pub fn from_root(root: Node) -> Result<Self> {
        if !root.is_group() {
            return Err(Error::invalid("root node is not a group"));
        }
        Ok(Self { root })
    }

    #[inline]
    pub fn root(&self) -> &Node {
        &self.root
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    fn find(&self, segments: &[&str]) -> Option<&Node> {
        let mut node = &self.root;
        for segment in segments {
            match &node.body {
                Body::Group(children) => node = children.get(*segment)?,
                Body::Data(_) => return None,
            }
        }
        Some(node)
    }

    fn find_mut(&mut self, segments: &[&str]) -> Option<&mut Node> {
        let mut node = &mut self.root;
        for segment in segments {
            match &mut node.body {
                Body::Group(children) => node = children.get_mut(*segment)?,
                Body::Data(_) => return None,
            }
        }
        Some(node)
    }

    /// Children of the group at `segments`, creating missing groups on the way.
    fn ensure_group(&mut self, segments: &[&str]) -> Result<&mut BTreeMap<String, Node>> {
        let mut children = match &mut self.root.body {
            Body::Group(children) => children,
            Body::Data(_) => return Err(Error::invalid("root node is not a group")),
        };
        for (depth, segment) in segments.iter().enumerate() {
            if path::is_attribute_segment(segment) {
                return Err(Error::InvalidPath(format!("group name starts with '@': {}", segment)));
            }
            let node = children.entry(segment.to_string()).or_insert_with(Node::group);
            children = match &mut node.body {
                Body::Group(children) => children,
                Body::Data(_) => {
                    return Err(Error::mismatch(
                        &path::join(&segments[..=depth]),
                        "group",
                        "dataset",
                    ))
                }
            };
        }
        Ok(children)
    }

    fn dataset(&self, path: &str) -> Result<&Dataset> {
        match Target::parse(path)? {
            Target::Attribute { owner, name } => self
                .find(&owner)
                .and_then(|node| node.attributes.get(name))
                .ok_or_else(|| Error::not_found(path)),
            Target::Node(segments) => {
                let node = self.find(&segments).ok_or_else(|| Error::not_found(path))?;
                match &node.body {
                    Body::Data(dataset) => Ok(dataset),
                    Body::Group(_) => Err(Error::mismatch(path, "dataset", "group")),
                }
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// What `path` refers to, if anything.
    pub fn node_kind(&self, path: &str) -> Option<NodeKind> {
        match Target::parse(path).ok()? {
            Target::Attribute { owner, name } => self
                .find(&owner)
                .filter(|node| node.attributes.contains_key(name))
                .map(|_| NodeKind::Attribute),
            Target::Node(segments) => self.find(&segments).map(|node| match node.body {
                Body::Group(_) => NodeKind::Group,
                Body::Data(_) => NodeKind::Data,
            }),
        }
    }

    /// Kind of the elements at a dataset or attribute.
    pub fn stored_kind(&self, path: &str) -> Result<NativeKind> {
        Ok(self.dataset(path)?.kind)
    }

    /// Shape of a dataset or attribute.
    pub fn extent(&self, path: &str) -> Result<Dimensions> {
        Ok(self.dataset(path)?.dims.clone())
    }

    /// Names of the children of a group.
    pub fn list_children(&self, path: &str) -> Result<Vec<String>> {
        let segments = match Target::parse(path)? {
            Target::Node(segments) => segments,
            Target::Attribute { .. } => return Err(Error::mismatch(path, "group", "attribute")),
        };
        let node = self.find(&segments).ok_or_else(|| Error::not_found(path))?;
        match &node.body {
            Body::Group(children) => Ok(children.keys().cloned().collect()),
            Body::Data(_) => Err(Error::mismatch(path, "group", "dataset")),
        }
    }

    /// Names of the attributes of a group or dataset.
    pub fn list_attributes(&self, path: &str) -> Result<Vec<String>> {
        let segments = match Target::parse(path)? {
            Target::Node(segments) => segments,
            Target::Attribute { .. } => {
                return Err(Error::InvalidPath(format!("attributes have no attributes: {}", path)))
            }
        };
        let node = self.find(&segments).ok_or_else(|| Error::not_found(path))?;
        Ok(node.attributes.keys().cloned().collect())
    }

    // ========================================================================
    // Typed I/O
    // ========================================================================

    /// Read a dataset or attribute (or a region of it) into `out`.
    pub fn read_typed(
        &self,
        path: &str,
        mut out: NativeSliceMut<'_>,
        slab: Option<&Hyperslab>,
    ) -> Result<()> {
        let dataset = self.dataset(path)?;
        if dataset.kind != out.kind() {
            return Err(Error::mismatch(path, out.kind(), dataset.kind));
        }

        let whole = Hyperslab::whole(&dataset.dims);
        let slab = match slab {
            Some(slab) => {
                slab.check(&dataset.dims, path)?;
                slab
            }
            None => &whole,
        };
        if out.len() != slab.num_points() {
            return Err(Error::range(format!(
                "{}: buffer holds {} elements, region has {}",
                path,
                out.len(),
                slab.num_points()
            )));
        }

        dataset.read_region(slab, out.as_bytes_mut());
        Ok(())
    }

    /// Write `data` as an array of `shape`, or as the `slab` region of one.
    ///
    /// A region write into an existing dataset of the same kind and shape only
    /// touches the region. Otherwise the dataset is replaced by a zero-filled
    /// one of `shape` before the region is copied in. Attributes of a replaced
    /// dataset are kept.
    pub fn write_typed(
        &mut self,
        path: &str,
        data: NativeSlice<'_>,
        shape: &Dimensions,
        slab: Option<&Hyperslab>,
    ) -> Result<()> {
        if shape.checked_num_bytes(data.kind().num_bytes()).is_none() {
            return Err(Error::range(format!("{}: extent {} is too large", path, shape)));
        }

        let whole = Hyperslab::whole(shape);
        let slab = match slab {
            Some(slab) => {
                slab.check(shape, path)?;
                slab
            }
            None => &whole,
        };
        if data.len() != slab.num_points() {
            return Err(Error::range(format!(
                "{}: {} elements given for a region of {}",
                path,
                data.len(),
                slab.num_points()
            )));
        }

        match Target::parse(path)? {
            Target::Attribute { owner, name } => {
                let node = self
                    .find_mut(&owner)
                    .ok_or_else(|| Error::not_found(path::join(&owner)))?;
                let existing = node.attributes.get_mut(name);
                if let Some(dataset) = Dataset::update(existing, data, shape, slab)? {
                    node.attributes.insert(name.to_string(), dataset);
                }
            }
            Target::Node(segments) => {
                let (leaf, parent) = segments
                    .split_last()
                    .ok_or_else(|| Error::InvalidPath("cannot write data to the root group".into()))?;
                let children = self.ensure_group(parent)?;
                match children.get_mut(*leaf).map(|node| &mut node.body) {
                    Some(Body::Group(_)) => return Err(Error::mismatch(path, "dataset", "group")),
                    Some(Body::Data(existing)) => {
                        if let Some(dataset) = Dataset::update(Some(&mut *existing), data, shape, slab)? {
                            *existing = dataset;
                        }
                    }
                    None => {
                        if let Some(dataset) = Dataset::update(None, data, shape, slab)? {
                            children.insert(leaf.to_string(), Node::data(dataset));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Create a group and its missing parents. Existing groups are kept.
    pub fn create_group(&mut self, path: &str) -> Result<()> {
        match Target::parse(path)? {
            Target::Node(segments) => self.ensure_group(&segments).map(|_| ()),
            Target::Attribute { .. } => Err(Error::InvalidPath(format!("not a group path: {}", path))),
        }
    }

    /// Remove a group with everything below it.
    pub fn delete_group(&mut self, path: &str) -> Result<()> {
        self.delete_node(path, true)
    }

    /// Remove a dataset.
    pub fn delete_data(&mut self, path: &str) -> Result<()> {
        self.delete_node(path, false)
    }

    fn delete_node(&mut self, path: &str, group: bool) -> Result<()> {
        let segments = match Target::parse(path)? {
            Target::Node(segments) => segments,
            Target::Attribute { .. } => return Err(Error::not_found(path)),
        };
        let (leaf, parent) = segments
            .split_last()
            .ok_or_else(|| Error::InvalidPath("cannot delete the root group".into()))?;
        let children = match self.find_mut(parent).map(|node| &mut node.body) {
            Some(Body::Group(children)) => children,
            _ => return Err(Error::not_found(path)),
        };
        match children.get(*leaf).map(|node| (node.is_group(), node.kind_name())) {
            Some((is_group, _)) if is_group == group => {
                children.remove(*leaf);
                Ok(())
            }
            Some((_, kind)) => Err(Error::NotFound(format!("{} is a {}", path, kind))),
            None => Err(Error::not_found(path)),
        }
    }

    /// Remove an attribute.
    pub fn delete_attribute(&mut self, path: &str) -> Result<()> {
        match Target::parse(path)? {
            Target::Attribute { owner, name } => self
                .find_mut(&owner)
                .and_then(|node| node.attributes.remove(name))
                .map(|_| ())
                .ok_or_else(|| Error::not_found(path)),
            Target::Node(_) => Err(Error::InvalidPath(format!("not an attribute path: {}", path))),
        }
    }
}
