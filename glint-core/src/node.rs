//! Node types for the scene hierarchy
//!
//! A Node is one element of the scene tree: uniquely identified, typed via
//! [`NodeKind`], and linked to its parent and children by id. Ownership of
//! the node values lives in the [`crate::scene::SceneGraph`] map.

use chrono::Utc;
use glam::DVec3;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form key/value bag carried by every node
pub type PropertyBag = BTreeMap<String, serde_json::Value>;

/// Stable string identifier for a node
///
/// Identifiers are immutable after creation and globally unique within one
/// scene graph. Generated ids are type-prefixed so a raw id remains readable
/// in logs and scene files (`"sprite2d-18c2f4a1b33-7f03a2"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an existing identifier string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id from a type tag, the current time, and a random suffix
    ///
    /// Uniqueness is best-effort; [`crate::scene::SceneGraph::allocate_node_id`]
    /// retries against the node map before handing an id out.
    pub fn generate(tag: &str) -> Self {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let suffix = rand::random::<u32>() & 0xff_ffff;
        Self(format!("{tag}-{millis:x}-{suffix:06x}"))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Euler rotation order for 3D transforms
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RotationOrder {
    Xyz,
    Xzy,
    #[default]
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

impl RotationOrder {
    /// All six valid permutations
    pub fn all() -> &'static [RotationOrder] {
        &[
            RotationOrder::Xyz,
            RotationOrder::Xzy,
            RotationOrder::Yxz,
            RotationOrder::Yzx,
            RotationOrder::Zxy,
            RotationOrder::Zyx,
        ]
    }
}

/// 3D transform state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    /// World position
    pub position: DVec3,
    /// Euler angles in radians, applied per `rotation_order`
    pub rotation: DVec3,
    /// Rotation order for the Euler triple
    pub rotation_order: RotationOrder,
    /// Per-axis scale factors
    pub scale: DVec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            rotation_order: RotationOrder::default(),
            scale: DVec3::ONE,
        }
    }
}

/// 2D transform state
///
/// Rotation is stored in radians; degrees appear only at boundaries
/// (property schema, committed transform records).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    /// Position on the stage plane (y-up)
    pub position: Point,
    /// Rotation in radians
    pub rotation: f64,
    /// Per-axis scale factors
    pub scale: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Point::ORIGIN,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transform2D {
    /// Rotation in degrees
    pub fn rotation_degrees(&self) -> f64 {
        self.rotation.to_degrees()
    }
}

/// Light parameters for a 3D light node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light3D {
    pub transform: Transform3D,
    /// Linear RGB color
    pub color: [f32; 3],
    /// Brightness multiplier
    pub energy: f32,
    /// Attenuation range in world units
    pub range: f32,
}

impl Default for Light3D {
    fn default() -> Self {
        Self {
            transform: Transform3D::default(),
            color: [1.0, 1.0, 1.0],
            energy: 1.0,
            range: 10.0,
        }
    }
}

/// Camera parameters for a 3D camera node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera3D {
    pub transform: Transform3D,
    /// Vertical field of view in degrees
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    /// Whether this camera drives the runtime viewport
    pub current: bool,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self {
            transform: Transform3D::default(),
            fov_degrees: 70.0,
            near: 0.05,
            far: 4000.0,
            current: false,
        }
    }
}

/// Sprite with an explicit size in local units, independent of scale
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sprite2D {
    pub transform: Transform2D,
    /// Declared width/height; gizmo handles map 1:1 to these
    pub size: Size,
    /// Optional texture reference
    pub texture: Option<String>,
}

/// Layout container with an explicit size and parent-relative layout fields
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Container2D {
    pub transform: Transform2D,
    /// Declared width/height in local units
    pub size: Size,
    /// Normalized anchor inside the parent rect (0..1 per axis)
    pub layout_anchor: Vec2,
    /// Offset from the anchored parent point to this node's position
    pub layout_offset: Vec2,
}

/// Closed set of node types
///
/// The variant discriminates which transform/behavior fields are meaningful;
/// property (de)serialization dispatches over this enum rather than any
/// runtime type inspection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    /// Plain 3D transform node
    Spatial3d(Transform3D),
    /// 3D light source
    Light3d(Light3D),
    /// 3D camera
    Camera3d(Camera3D),
    /// Plain 2D node; sized by scale only
    Node2d(Transform2D),
    /// 2D sprite with explicit dimensions
    Sprite2d(Sprite2D),
    /// 2D layout container with explicit dimensions
    Container2d(Container2D),
}

impl NodeKind {
    /// Stable type tag used by the node factory and generated ids
    pub fn type_tag(&self) -> &'static str {
        match self {
            NodeKind::Spatial3d(_) => "spatial3d",
            NodeKind::Light3d(_) => "light3d",
            NodeKind::Camera3d(_) => "camera3d",
            NodeKind::Node2d(_) => "node2d",
            NodeKind::Sprite2d(_) => "sprite2d",
            NodeKind::Container2d(_) => "container2d",
        }
    }

    /// Human-readable default name for new nodes of this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::Spatial3d(_) => "Spatial",
            NodeKind::Light3d(_) => "Light",
            NodeKind::Camera3d(_) => "Camera",
            NodeKind::Node2d(_) => "Node2D",
            NodeKind::Sprite2d(_) => "Sprite",
            NodeKind::Container2d(_) => "Container",
        }
    }

    /// Whether this kind lives on the 2D stage plane
    pub fn is_2d(&self) -> bool {
        matches!(
            self,
            NodeKind::Node2d(_) | NodeKind::Sprite2d(_) | NodeKind::Container2d(_)
        )
    }
}

/// Value type of an editable property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    Text,
    Bool,
    Float,
    /// Angle, edited in degrees
    Degrees,
    Vec2,
    Vec3,
    Size,
    Color,
}

/// One editable/serializable field declared by a node kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    const fn new(key: &'static str, label: &'static str, kind: PropertyKind) -> Self {
        Self { key, label, kind }
    }
}

/// One element of the scene hierarchy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier, immutable after creation
    id: NodeId,

    /// Display name
    pub name: String,

    /// Typed geometry/behavior state
    pub kind: NodeKind,

    /// Free-form properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyBag,

    /// Free-form metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: PropertyBag,

    /// Set when this node is a reference to an external prefab
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_path: Option<String>,

    /// Parent link; `None` for root nodes
    pub(crate) parent: Option<NodeId>,

    /// Ordered child ids
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    /// Create a new node with no parent or children
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            properties: PropertyBag::new(),
            metadata: PropertyBag::new(),
            instance_path: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// The node's stable identifier
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Parent id, if any
    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    /// Ordered child ids
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node is an instanced prefab reference
    pub fn is_instance(&self) -> bool {
        self.instance_path.is_some()
    }

    /// 2D transform, if this kind carries one
    pub fn transform_2d(&self) -> Option<&Transform2D> {
        match &self.kind {
            NodeKind::Node2d(t) => Some(t),
            NodeKind::Sprite2d(s) => Some(&s.transform),
            NodeKind::Container2d(c) => Some(&c.transform),
            _ => None,
        }
    }

    /// Mutable 2D transform, if this kind carries one
    pub fn transform_2d_mut(&mut self) -> Option<&mut Transform2D> {
        match &mut self.kind {
            NodeKind::Node2d(t) => Some(t),
            NodeKind::Sprite2d(s) => Some(&mut s.transform),
            NodeKind::Container2d(c) => Some(&mut c.transform),
            _ => None,
        }
    }

    /// 3D transform, if this kind carries one
    pub fn transform_3d(&self) -> Option<&Transform3D> {
        match &self.kind {
            NodeKind::Spatial3d(t) => Some(t),
            NodeKind::Light3d(l) => Some(&l.transform),
            NodeKind::Camera3d(c) => Some(&c.transform),
            _ => None,
        }
    }

    /// Mutable 3D transform, if this kind carries one
    pub fn transform_3d_mut(&mut self) -> Option<&mut Transform3D> {
        match &mut self.kind {
            NodeKind::Spatial3d(t) => Some(t),
            NodeKind::Light3d(l) => Some(&mut l.transform),
            NodeKind::Camera3d(c) => Some(&mut c.transform),
            _ => None,
        }
    }

    /// Declared width/height for kinds with explicit dimensions
    pub fn declared_size(&self) -> Option<Size> {
        match &self.kind {
            NodeKind::Sprite2d(s) => Some(s.size),
            NodeKind::Container2d(c) => Some(c.size),
            _ => None,
        }
    }

    /// Set the declared width/height; no-op for kinds sized by scale only
    pub fn set_declared_size(&mut self, size: Size) {
        match &mut self.kind {
            NodeKind::Sprite2d(s) => s.size = size,
            NodeKind::Container2d(c) => c.size = size,
            _ => {}
        }
    }

    /// Container layout fields, if this is a container
    pub fn layout(&self) -> Option<(Vec2, Vec2)> {
        match &self.kind {
            NodeKind::Container2d(c) => Some((c.layout_anchor, c.layout_offset)),
            _ => None,
        }
    }

    /// Set the container layout offset; no-op for other kinds
    pub fn set_layout_offset(&mut self, offset: Vec2) {
        if let NodeKind::Container2d(c) = &mut self.kind {
            c.layout_offset = offset;
        }
    }

    /// Editable fields declared by this node's kind
    ///
    /// Dispatched via a closed match; every kind declares its own schema.
    pub fn describe_properties(&self) -> Vec<PropertyDescriptor> {
        use PropertyKind::*;

        let mut schema = vec![PropertyDescriptor::new("name", "Name", Text)];
        match &self.kind {
            NodeKind::Spatial3d(_) => {
                schema.extend([
                    PropertyDescriptor::new("position", "Position", Vec3),
                    PropertyDescriptor::new("rotation", "Rotation", Vec3),
                    PropertyDescriptor::new("rotationOrder", "Rotation Order", Text),
                    PropertyDescriptor::new("scale", "Scale", Vec3),
                ]);
            }
            NodeKind::Light3d(_) => {
                schema.extend([
                    PropertyDescriptor::new("position", "Position", Vec3),
                    PropertyDescriptor::new("rotation", "Rotation", Vec3),
                    PropertyDescriptor::new("color", "Color", Color),
                    PropertyDescriptor::new("energy", "Energy", Float),
                    PropertyDescriptor::new("range", "Range", Float),
                ]);
            }
            NodeKind::Camera3d(_) => {
                schema.extend([
                    PropertyDescriptor::new("position", "Position", Vec3),
                    PropertyDescriptor::new("rotation", "Rotation", Vec3),
                    PropertyDescriptor::new("fov", "Field of View", Degrees),
                    PropertyDescriptor::new("near", "Near Plane", Float),
                    PropertyDescriptor::new("far", "Far Plane", Float),
                    PropertyDescriptor::new("current", "Current", Bool),
                ]);
            }
            NodeKind::Node2d(_) => {
                schema.extend([
                    PropertyDescriptor::new("position", "Position", Vec2),
                    PropertyDescriptor::new("rotation", "Rotation", Degrees),
                    PropertyDescriptor::new("scale", "Scale", Vec2),
                ]);
            }
            NodeKind::Sprite2d(_) => {
                schema.extend([
                    PropertyDescriptor::new("position", "Position", Vec2),
                    PropertyDescriptor::new("rotation", "Rotation", Degrees),
                    PropertyDescriptor::new("scale", "Scale", Vec2),
                    PropertyDescriptor::new("size", "Size", Size),
                    PropertyDescriptor::new("texture", "Texture", Text),
                ]);
            }
            NodeKind::Container2d(_) => {
                schema.extend([
                    PropertyDescriptor::new("position", "Position", Vec2),
                    PropertyDescriptor::new("rotation", "Rotation", Degrees),
                    PropertyDescriptor::new("scale", "Scale", Vec2),
                    PropertyDescriptor::new("size", "Size", Size),
                    PropertyDescriptor::new("layoutAnchor", "Anchor", Vec2),
                    PropertyDescriptor::new("layoutOffset", "Offset", Vec2),
                ]);
            }
        }
        schema
    }
}
