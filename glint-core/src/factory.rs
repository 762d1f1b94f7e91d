//! Node factory and injected services
//!
//! The factory turns a type tag plus a property bag into a [`NodeKind`];
//! every registered node type declares its own builder. [`Services`] bundles
//! the capabilities the command pipeline injects into each invocation (the
//! factory and the telemetry hub) so command authors never reach for
//! process-wide state.

use crate::node::{
    Camera3D, Container2D, Light3D, NodeKind, PropertyBag, Sprite2D, Transform2D, Transform3D,
};
use crate::scene::SceneError;
use crate::telemetry::TelemetryHub;
use kurbo::{Point, Size, Vec2};
use std::collections::HashMap;

/// Builds one node kind from a property bag
pub type NodeBuilder = fn(&PropertyBag) -> Result<NodeKind, SceneError>;

/// Registry from type tag to node builder
pub struct NodeFactory {
    builders: HashMap<String, NodeBuilder>,
}

impl Default for NodeFactory {
    fn default() -> Self {
        Self::with_builtin_kinds()
    }
}

impl NodeFactory {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Create a registry with every built-in node kind registered
    pub fn with_builtin_kinds() -> Self {
        let mut factory = Self::new();
        factory.register("spatial3d", |_| {
            Ok(NodeKind::Spatial3d(Transform3D::default()))
        });
        factory.register("light3d", |bag| {
            let mut light = Light3D::default();
            if let Some(energy) = bag_f64(bag, "energy") {
                light.energy = energy as f32;
            }
            if let Some(range) = bag_f64(bag, "range") {
                light.range = range as f32;
            }
            Ok(NodeKind::Light3d(light))
        });
        factory.register("camera3d", |bag| {
            let mut camera = Camera3D::default();
            if let Some(fov) = bag_f64(bag, "fov") {
                camera.fov_degrees = fov;
            }
            Ok(NodeKind::Camera3d(camera))
        });
        factory.register("node2d", |bag| {
            Ok(NodeKind::Node2d(transform_2d_from_bag(bag)))
        });
        factory.register("sprite2d", |bag| {
            Ok(NodeKind::Sprite2d(Sprite2D {
                transform: transform_2d_from_bag(bag),
                size: size_from_bag(bag, Size::new(64.0, 64.0)),
                texture: bag
                    .get("texture")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            }))
        });
        factory.register("container2d", |bag| {
            Ok(NodeKind::Container2d(Container2D {
                transform: transform_2d_from_bag(bag),
                size: size_from_bag(bag, Size::new(100.0, 100.0)),
                layout_anchor: Vec2::ZERO,
                layout_offset: Vec2::ZERO,
            }))
        });
        factory
    }

    /// Register (or replace) a builder for a type tag
    pub fn register(&mut self, tag: impl Into<String>, builder: NodeBuilder) {
        self.builders.insert(tag.into(), builder);
    }

    /// Construct a node kind from a type tag and a property bag
    pub fn create(&self, tag: &str, properties: &PropertyBag) -> Result<NodeKind, SceneError> {
        let builder = self
            .builders
            .get(tag)
            .ok_or_else(|| SceneError::UnknownNodeType(tag.to_string()))?;
        builder(properties)
    }

    /// Whether a type tag is registered
    pub fn knows(&self, tag: &str) -> bool {
        self.builders.contains_key(tag)
    }

    /// The registered type tags, sorted
    pub fn registered_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

fn bag_f64(bag: &PropertyBag, key: &str) -> Option<f64> {
    bag.get(key).and_then(|v| v.as_f64())
}

fn transform_2d_from_bag(bag: &PropertyBag) -> Transform2D {
    Transform2D {
        position: Point::new(
            bag_f64(bag, "x").unwrap_or(0.0),
            bag_f64(bag, "y").unwrap_or(0.0),
        ),
        ..Transform2D::default()
    }
}

fn size_from_bag(bag: &PropertyBag, fallback: Size) -> Size {
    Size::new(
        bag_f64(bag, "width").unwrap_or(fallback.width),
        bag_f64(bag, "height").unwrap_or(fallback.height),
    )
}

/// Capabilities injected into every command invocation
#[derive(Default)]
pub struct Services {
    /// Command telemetry publisher
    pub telemetry: TelemetryHub,

    /// Node construction capability
    pub factory: NodeFactory,
}

impl Services {
    /// Create services with the built-in node kinds registered
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_tags_registered() {
        let factory = NodeFactory::with_builtin_kinds();
        assert_eq!(
            factory.registered_tags(),
            vec![
                "camera3d",
                "container2d",
                "light3d",
                "node2d",
                "spatial3d",
                "sprite2d"
            ]
        );
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let factory = NodeFactory::with_builtin_kinds();
        let err = factory.create("mesh3d", &PropertyBag::new()).unwrap_err();
        assert_eq!(err, SceneError::UnknownNodeType("mesh3d".to_string()));
    }

    #[test]
    fn test_sprite_builder_reads_bag() {
        let factory = NodeFactory::with_builtin_kinds();
        let mut bag = PropertyBag::new();
        bag.insert("width".to_string(), json!(128.0));
        bag.insert("height".to_string(), json!(32.0));
        bag.insert("x".to_string(), json!(10.0));
        bag.insert("texture".to_string(), json!("hero.png"));

        let kind = factory.create("sprite2d", &bag).unwrap();
        match kind {
            NodeKind::Sprite2d(sprite) => {
                assert_eq!(sprite.size, Size::new(128.0, 32.0));
                assert_eq!(sprite.transform.position, Point::new(10.0, 0.0));
                assert_eq!(sprite.texture.as_deref(), Some("hero.png"));
            }
            other => panic!("expected sprite, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_registration() {
        let mut factory = NodeFactory::new();
        assert!(!factory.knows("node2d"));

        factory.register("node2d", |_| Ok(NodeKind::Node2d(Transform2D::default())));
        assert!(factory.knows("node2d"));
        assert!(factory.create("node2d", &PropertyBag::new()).is_ok());
    }
}
