//! Selection gizmo: handles and hit testing
//!
//! The selection overlay is the interactive box drawn around the selected 2D
//! nodes: eight resize handles named by compass direction, a rotate knob
//! above the north edge, and the box interior as the move affordance. Compass
//! directions follow the stage plane (y-up), so `n` is +y and `e` is +x.

use crate::node::{Node, NodeId};
use crate::scene::SceneGraph;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Stage-plane extent used for 2D nodes without declared dimensions
pub const UNSIZED_NODE_EXTENT: f64 = 32.0;

/// Default distance from the north edge to the rotate knob, in world units
pub const ROTATE_KNOB_OFFSET: f64 = 24.0;

/// One of the eight resize handles, named by compass direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    /// All eight handles
    pub fn all() -> &'static [ResizeHandle] {
        &[
            ResizeHandle::N,
            ResizeHandle::S,
            ResizeHandle::E,
            ResizeHandle::W,
            ResizeHandle::Ne,
            ResizeHandle::Nw,
            ResizeHandle::Se,
            ResizeHandle::Sw,
        ]
    }

    /// Whether dragging this handle resizes along x
    pub fn affects_x(self) -> bool {
        !matches!(self, ResizeHandle::N | ResizeHandle::S)
    }

    /// Whether dragging this handle resizes along y
    pub fn affects_y(self) -> bool {
        !matches!(self, ResizeHandle::E | ResizeHandle::W)
    }

    /// Unit direction from the box center toward this handle
    pub fn unit(self) -> Vec2 {
        match self {
            ResizeHandle::N => Vec2::new(0.0, 1.0),
            ResizeHandle::S => Vec2::new(0.0, -1.0),
            ResizeHandle::E => Vec2::new(1.0, 0.0),
            ResizeHandle::W => Vec2::new(-1.0, 0.0),
            ResizeHandle::Ne => Vec2::new(1.0, 1.0),
            ResizeHandle::Nw => Vec2::new(-1.0, 1.0),
            ResizeHandle::Se => Vec2::new(1.0, -1.0),
            ResizeHandle::Sw => Vec2::new(-1.0, -1.0),
        }
    }

    /// Unit direction toward the anchor: the opposite corner or edge
    pub fn anchor_unit(self) -> Vec2 {
        self.unit() * -1.0
    }

    /// The opposite handle
    pub fn opposite(self) -> ResizeHandle {
        match self {
            ResizeHandle::N => ResizeHandle::S,
            ResizeHandle::S => ResizeHandle::N,
            ResizeHandle::E => ResizeHandle::W,
            ResizeHandle::W => ResizeHandle::E,
            ResizeHandle::Ne => ResizeHandle::Sw,
            ResizeHandle::Nw => ResizeHandle::Se,
            ResizeHandle::Se => ResizeHandle::Nw,
            ResizeHandle::Sw => ResizeHandle::Ne,
        }
    }
}

/// Interactive hotspot driving a transform gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Handle {
    Move,
    Rotate,
    Resize(ResizeHandle),
}

/// Node-only stage bounds of a 2D node
///
/// Descendants are excluded so a container's handles reflect only its own
/// declared size. Nodes without declared dimensions get a nominal square
/// extent scaled by their transform. Rotation is folded into an axis-aligned
/// bounding box.
pub fn node_stage_bounds(node: &Node) -> Option<Rect> {
    let transform = node.transform_2d()?;
    let base = node
        .declared_size()
        .unwrap_or_else(|| Size::new(UNSIZED_NODE_EXTENT, UNSIZED_NODE_EXTENT));
    let width = base.width * transform.scale.x.abs();
    let height = base.height * transform.scale.y.abs();

    let (sin, cos) = transform.rotation.sin_cos();
    let half_w = (width * cos.abs() + height * sin.abs()) / 2.0;
    let half_h = (width * sin.abs() + height * cos.abs()) / 2.0;
    Some(Rect::from_center_size(
        transform.position,
        Size::new(half_w * 2.0, half_h * 2.0),
    ))
}

/// The selection box and its interactive hotspots
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionOverlay {
    /// Combined node-only bounds of the selected 2D nodes
    pub bounds: Rect,
    /// Distance from the north edge to the rotate knob
    pub rotate_offset: f64,
}

impl SelectionOverlay {
    /// Build the overlay for the given selection
    ///
    /// Returns `None` when the selection contains no 2D nodes.
    pub fn from_selection(graph: &SceneGraph, ids: &[NodeId]) -> Option<Self> {
        let mut bounds: Option<Rect> = None;
        for id in ids {
            let node = graph.node(id)?;
            if let Some(rect) = node_stage_bounds(node) {
                bounds = Some(match bounds {
                    Some(acc) => acc.union(rect),
                    None => rect,
                });
            }
        }
        Some(Self {
            bounds: bounds?,
            rotate_offset: ROTATE_KNOB_OFFSET,
        })
    }

    /// Center of the selection box
    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    /// World position of a resize handle
    pub fn handle_point(&self, handle: ResizeHandle) -> Point {
        let center = self.bounds.center();
        let unit = handle.unit();
        Point::new(
            center.x + unit.x * self.bounds.width() / 2.0,
            center.y + unit.y * self.bounds.height() / 2.0,
        )
    }

    /// World position of the rotate knob, above the north edge
    pub fn rotate_knob(&self) -> Point {
        Point::new(self.bounds.center().x, self.bounds.y1 + self.rotate_offset)
    }

    /// Hit test a stage-plane point against the overlay
    ///
    /// Real handles win over the thin rotate-knob connector line when both
    /// are within tolerance; the box interior maps to `Move` only when no
    /// handle was hit.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> Option<Handle> {
        let mut best: Option<(f64, ResizeHandle)> = None;
        for &handle in ResizeHandle::all() {
            let distance = (point - self.handle_point(handle)).hypot();
            if distance <= tolerance && best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, handle));
            }
        }
        if let Some((_, handle)) = best {
            return Some(Handle::Resize(handle));
        }

        if (point - self.rotate_knob()).hypot() <= tolerance {
            return Some(Handle::Rotate);
        }

        // The connector runs vertically from the north edge to the knob.
        let connector_x = self.bounds.center().x;
        let on_connector = (point.x - connector_x).abs() <= tolerance
            && point.y >= self.bounds.y1
            && point.y <= self.bounds.y1 + self.rotate_offset;
        if on_connector {
            return Some(Handle::Rotate);
        }

        if self.bounds.contains(point) {
            return Some(Handle::Move);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, Sprite2D};

    fn sprite(id: &str, x: f64, y: f64, w: f64, h: f64) -> Node {
        let mut sprite = Sprite2D {
            size: Size::new(w, h),
            ..Sprite2D::default()
        };
        sprite.transform.position = Point::new(x, y);
        Node::new(NodeId::new(id), id.to_string(), NodeKind::Sprite2d(sprite))
    }

    fn overlay_for(nodes: &[Node]) -> SelectionOverlay {
        let mut graph = SceneGraph::new();
        let mut ids = Vec::new();
        for node in nodes {
            ids.push(node.id().clone());
            graph.insert_node(node.clone(), None, None).unwrap();
        }
        SelectionOverlay::from_selection(&graph, &ids).unwrap()
    }

    #[test]
    fn test_handle_axes() {
        assert!(!ResizeHandle::N.affects_x());
        assert!(ResizeHandle::N.affects_y());
        assert!(ResizeHandle::E.affects_x());
        assert!(!ResizeHandle::E.affects_y());
        assert!(ResizeHandle::Se.affects_x() && ResizeHandle::Se.affects_y());
    }

    #[test]
    fn test_anchor_is_opposite() {
        for &handle in ResizeHandle::all() {
            assert_eq!(handle.anchor_unit(), handle.opposite().unit());
        }
    }

    #[test]
    fn test_combined_bounds_union() {
        let overlay = overlay_for(&[
            sprite("a", 0.0, 0.0, 100.0, 100.0),
            sprite("b", 100.0, 0.0, 100.0, 100.0),
        ]);
        assert_eq!(overlay.bounds, Rect::new(-50.0, -50.0, 150.0, 50.0));
    }

    #[test]
    fn test_rotated_node_bounds() {
        let mut node = sprite("a", 0.0, 0.0, 100.0, 50.0);
        node.transform_2d_mut().unwrap().rotation = std::f64::consts::FRAC_PI_2;
        let bounds = node_stage_bounds(&node).unwrap();
        // Quarter turn swaps the extents.
        assert!((bounds.width() - 50.0).abs() < 1e-9);
        assert!((bounds.height() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_corner_handle() {
        let overlay = overlay_for(&[sprite("a", 0.0, 0.0, 100.0, 100.0)]);
        let hit = overlay.hit_test(Point::new(51.0, 49.0), 4.0);
        assert_eq!(hit, Some(Handle::Resize(ResizeHandle::Ne)));
    }

    #[test]
    fn test_handle_wins_over_connector() {
        let overlay = overlay_for(&[sprite("a", 0.0, 0.0, 10.0, 10.0)]);
        // Just above the north edge: within tolerance of both the `n` handle
        // and the connector line.
        let hit = overlay.hit_test(Point::new(0.0, 5.5), 1.0);
        assert_eq!(hit, Some(Handle::Resize(ResizeHandle::N)));
    }

    #[test]
    fn test_connector_rotates_when_no_handle_near() {
        let overlay = overlay_for(&[sprite("a", 0.0, 0.0, 100.0, 100.0)]);
        let hit = overlay.hit_test(Point::new(0.0, 60.0), 2.0);
        assert_eq!(hit, Some(Handle::Rotate));
    }

    #[test]
    fn test_knob_rotates() {
        let overlay = overlay_for(&[sprite("a", 0.0, 0.0, 100.0, 100.0)]);
        let hit = overlay.hit_test(overlay.rotate_knob(), 2.0);
        assert_eq!(hit, Some(Handle::Rotate));
    }

    #[test]
    fn test_inside_bounds_moves() {
        let overlay = overlay_for(&[sprite("a", 0.0, 0.0, 100.0, 100.0)]);
        assert_eq!(overlay.hit_test(Point::new(10.0, -20.0), 4.0), Some(Handle::Move));
    }

    #[test]
    fn test_outside_misses() {
        let overlay = overlay_for(&[sprite("a", 0.0, 0.0, 100.0, 100.0)]);
        assert_eq!(overlay.hit_test(Point::new(200.0, 200.0), 4.0), None);
    }

    #[test]
    fn test_no_2d_nodes_no_overlay() {
        let mut graph = SceneGraph::new();
        let node = Node::new(
            NodeId::new("cam"),
            "Camera",
            NodeKind::Camera3d(crate::node::Camera3D::default()),
        );
        graph.insert_node(node, None, None).unwrap();
        assert!(SelectionOverlay::from_selection(&graph, &[NodeId::new("cam")]).is_none());
    }
}
