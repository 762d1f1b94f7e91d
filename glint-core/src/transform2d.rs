//! Interactive 2D transform gestures
//!
//! A gesture runs `idle → dragging → idle`: [`start_transform`] captures the
//! start-of-gesture state, [`update_transform`] recomputes every node's pose
//! from that captured state and the current pointer (never accumulating
//! frame-over-frame, so repeated identical input is idempotent), and
//! [`complete_transform`] turns the whole gesture into one undoable
//! transaction per node.
//!
//! Resizing keeps the anchor — the corner or edge opposite the dragged
//! handle — fixed on the stage plane: the new box center is solved from
//! `new_center = anchor_world − anchor_local_at_new_size`.

use crate::commands::transform_nodes::{Transform2dState, TransformNodeEdit};
use crate::gizmo::{Handle, SelectionOverlay};
use crate::history::HistoryEntry;
use crate::node::{NodeId, NodeKind};
use crate::scene::SceneGraph;
use crate::viewport::{OrthographicCamera, Viewport};
use kurbo::{Point, Rect, Size, Vec2};

/// Minimum resize extent in device-independent pixels
pub const MIN_RESIZE_DIP: f64 = 4.0;

/// Start-of-gesture record for one manipulated node
#[derive(Clone, Debug)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub position: Point,
    /// Rotation in radians
    pub rotation: f64,
    pub scale: Vec2,
    /// Declared size for kinds with explicit dimensions
    pub size: Option<Size>,
    /// Container layout offset at gesture start
    pub layout_offset: Option<Vec2>,
    /// Offset from the combined box center at gesture start
    pub offset: Vec2,
}

/// Transient state for one manipulation gesture
///
/// Created on pointer-down over a handle, consulted on every pointer move,
/// and converted into history entries on pointer-up.
#[derive(Clone, Debug)]
pub struct Active2DTransform {
    pub handle: Handle,
    /// Pointer position on the stage plane at gesture start
    pub start_pointer: Point,
    /// Combined node-only bounds at gesture start
    pub bounds: Rect,
    /// The point that stays fixed during the gesture, in world coordinates
    pub anchor_world: Point,
    /// The anchor's offset from the box center at gesture start
    pub anchor_local: Vec2,
    /// Resize floor in world units, derived from the display density
    pub min_extent: f64,
    /// Per-node start state
    pub nodes: Vec<NodeSnapshot>,
}

/// Begin a gesture on the given handle
///
/// Returns `None` when the selection holds no 2D nodes; callers treat that
/// as "gesture not started".
pub fn start_transform(
    pointer_screen: Point,
    handle: Handle,
    overlay: &SelectionOverlay,
    graph: &SceneGraph,
    selected: &[NodeId],
    camera: &OrthographicCamera,
    viewport: &Viewport,
) -> Option<Active2DTransform> {
    let center = overlay.bounds.center();
    let mut nodes = Vec::new();
    for id in selected {
        let node = graph.node(id)?;
        let Some(transform) = node.transform_2d() else {
            continue;
        };
        nodes.push(NodeSnapshot {
            id: id.clone(),
            position: transform.position,
            rotation: transform.rotation,
            scale: transform.scale,
            size: node.declared_size(),
            layout_offset: node.layout().map(|(_, offset)| offset),
            offset: transform.position - center,
        });
    }
    if nodes.is_empty() {
        return None;
    }

    let anchor_local = match handle {
        Handle::Resize(resize) => {
            let unit = resize.anchor_unit();
            Vec2::new(
                unit.x * overlay.bounds.width() / 2.0,
                unit.y * overlay.bounds.height() / 2.0,
            )
        }
        // Move and rotate pivot around the box center.
        Handle::Move | Handle::Rotate => Vec2::ZERO,
    };

    Some(Active2DTransform {
        handle,
        start_pointer: camera.screen_to_world(pointer_screen, viewport),
        bounds: overlay.bounds,
        anchor_world: center + anchor_local,
        anchor_local,
        min_extent: MIN_RESIZE_DIP * viewport.pixel_ratio / camera.zoom,
        nodes,
    })
}

/// Recompute every manipulated node from the captured start state
pub fn update_transform(
    pointer_screen: Point,
    session: &Active2DTransform,
    graph: &mut SceneGraph,
    camera: &OrthographicCamera,
    viewport: &Viewport,
) {
    let pointer = camera.screen_to_world(pointer_screen, viewport);
    match session.handle {
        Handle::Move => {
            let delta = pointer - session.start_pointer;
            for snapshot in &session.nodes {
                write_pose(graph, snapshot, snapshot.position + delta, None, None);
            }
        }
        Handle::Rotate => {
            let center = session.bounds.center();
            let angle = signed_angle(session.start_pointer - center, pointer - center);
            for snapshot in &session.nodes {
                // Spin the node and swing its offset so the whole selection
                // pivots around the shared box center.
                let position = center + rotate_vec(snapshot.offset, angle);
                write_pose(graph, snapshot, position, Some(snapshot.rotation + angle), None);
            }
        }
        Handle::Resize(resize) => {
            let center = session.bounds.center();
            let pointer_local = pointer - center;
            let start_w = session.bounds.width();
            let start_h = session.bounds.height();

            let new_w = if resize.affects_x() {
                (pointer_local.x - session.anchor_local.x)
                    .abs()
                    .max(session.min_extent)
            } else {
                start_w
            };
            let new_h = if resize.affects_y() {
                (pointer_local.y - session.anchor_local.y)
                    .abs()
                    .max(session.min_extent)
            } else {
                start_h
            };

            let sx = if start_w > f64::EPSILON { new_w / start_w } else { 1.0 };
            let sy = if start_h > f64::EPSILON { new_h / start_h } else { 1.0 };

            // Solve for the center that pins the anchor in place at the new size.
            let unit = resize.anchor_unit();
            let anchor_local_new = Vec2::new(unit.x * new_w / 2.0, unit.y * new_h / 2.0);
            let new_center = session.anchor_world - anchor_local_new;

            for snapshot in &session.nodes {
                let position =
                    new_center + Vec2::new(snapshot.offset.x * sx, snapshot.offset.y * sy);
                let scaled = scale_snapshot(snapshot, sx, sy, session.min_extent);
                write_pose(graph, snapshot, position, None, Some(scaled));
            }
        }
    }
}

/// Finish a gesture, producing one undoable transaction per changed node
///
/// A `Move` gesture re-derives container layout offsets from the final
/// absolute positions, inside the same per-node transaction. Nodes whose
/// state did not change produce no entry, so a zero-delta gesture is safe to
/// commit and pushes nothing.
pub fn complete_transform(
    session: Active2DTransform,
    graph: &mut SceneGraph,
) -> Vec<HistoryEntry> {
    let verb = match session.handle {
        Handle::Move => "Move",
        Handle::Rotate => "Rotate",
        Handle::Resize(_) => "Resize",
    };

    let mut entries = Vec::new();
    for snapshot in session.nodes {
        if session.handle == Handle::Move {
            if let Some(offset) = derived_layout_offset(graph, &snapshot.id) {
                if let Some(node) = graph.node_mut(&snapshot.id) {
                    node.set_layout_offset(offset);
                }
            }
        }

        let Some(node) = graph.node(&snapshot.id) else {
            continue;
        };
        let Some(after) = Transform2dState::capture(node) else {
            continue;
        };
        let before = Transform2dState {
            position: snapshot.position,
            rotation_deg: snapshot.rotation.to_degrees(),
            scale: snapshot.scale,
            size: snapshot.size,
            layout_offset: snapshot.layout_offset,
        };
        if before == after {
            continue;
        }
        entries.push(HistoryEntry::new(
            format!("{verb} {}", node.name),
            TransformNodeEdit::new(snapshot.id.clone(), before, after),
        ));
    }
    entries
}

/// Re-derive a container's layout offset from its absolute position
///
/// The offset is measured from the anchored point inside the parent's rect;
/// without a sized parent it degenerates to the absolute position.
pub fn derived_layout_offset(graph: &SceneGraph, id: &NodeId) -> Option<Vec2> {
    let node = graph.node(id)?;
    let (anchor, _) = node.layout()?;
    let position = node.transform_2d()?.position;

    let parent_rect = node
        .parent()
        .and_then(|pid| graph.node(pid))
        .and_then(parent_layout_rect)
        .unwrap_or(Rect::ZERO);
    let anchored = Point::new(
        parent_rect.x0 + anchor.x * parent_rect.width(),
        parent_rect.y0 + anchor.y * parent_rect.height(),
    );
    Some(position - anchored)
}

fn parent_layout_rect(parent: &crate::node::Node) -> Option<Rect> {
    if !matches!(
        parent.kind,
        NodeKind::Sprite2d(_) | NodeKind::Container2d(_)
    ) {
        return None;
    }
    let size = parent.declared_size()?;
    let position = parent.transform_2d()?.position;
    Some(Rect::from_center_size(position, size))
}

/// New declared size or scale for one node under per-axis resize factors
enum ScaledExtent {
    DeclaredSize(Size),
    Scale(Vec2),
}

fn scale_snapshot(snapshot: &NodeSnapshot, sx: f64, sy: f64, min_extent: f64) -> ScaledExtent {
    match snapshot.size {
        // Explicit dimensions scale directly; the node's own scale is held.
        Some(size) => ScaledExtent::DeclaredSize(Size::new(
            (size.width * sx).max(min_extent),
            (size.height * sy).max(min_extent),
        )),
        None => ScaledExtent::Scale(Vec2::new(snapshot.scale.x * sx, snapshot.scale.y * sy)),
    }
}

fn write_pose(
    graph: &mut SceneGraph,
    snapshot: &NodeSnapshot,
    position: Point,
    rotation: Option<f64>,
    extent: Option<ScaledExtent>,
) {
    let Some(node) = graph.node_mut(&snapshot.id) else {
        return;
    };
    if let Some(transform) = node.transform_2d_mut() {
        transform.position = position;
        transform.rotation = rotation.unwrap_or(snapshot.rotation);
        transform.scale = match &extent {
            Some(ScaledExtent::Scale(scale)) => *scale,
            _ => snapshot.scale,
        };
    }
    if let Some(ScaledExtent::DeclaredSize(size)) = extent {
        node.set_declared_size(size);
    }
}

fn signed_angle(from: Vec2, to: Vec2) -> f64 {
    if from.hypot() < f64::EPSILON || to.hypot() < f64::EPSILON {
        return 0.0;
    }
    from.cross(to).atan2(from.dot(to))
}

fn rotate_vec(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gizmo::ResizeHandle;
    use crate::node::{Node, Sprite2D, Transform2D};

    fn sprite_scene(w: f64, h: f64) -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let id = NodeId::new("sprite2d-1");
        let sprite = Sprite2D {
            size: Size::new(w, h),
            ..Sprite2D::default()
        };
        graph
            .insert_node(
                Node::new(id.clone(), "Hero", NodeKind::Sprite2d(sprite)),
                None,
                None,
            )
            .unwrap();
        (graph, id)
    }

    fn session_for(
        graph: &SceneGraph,
        id: &NodeId,
        handle: Handle,
        pointer_screen: Point,
    ) -> Active2DTransform {
        let overlay =
            SelectionOverlay::from_selection(graph, std::slice::from_ref(id)).unwrap();
        start_transform(
            pointer_screen,
            handle,
            &overlay,
            graph,
            std::slice::from_ref(id),
            &OrthographicCamera::default(),
            &Viewport::default(),
        )
        .unwrap()
    }

    // Viewport-centered screen coordinates for a world point under the
    // default camera.
    fn screen(world: Point) -> Point {
        OrthographicCamera::default().world_to_screen(world, &Viewport::default())
    }

    #[test]
    fn test_resize_se_keeps_nw_corner_fixed() {
        let (mut graph, id) = sprite_scene(100.0, 100.0);
        let session = session_for(
            &graph,
            &id,
            Handle::Resize(ResizeHandle::Se),
            screen(Point::new(50.0, -50.0)),
        );
        assert_eq!(session.anchor_world, Point::new(-50.0, 50.0));

        update_transform(
            screen(Point::new(110.0, -110.0)),
            &session,
            &mut graph,
            &OrthographicCamera::default(),
            &Viewport::default(),
        );

        let node = graph.node(&id).unwrap();
        assert_eq!(node.declared_size(), Some(Size::new(160.0, 160.0)));
        let position = node.transform_2d().unwrap().position;
        assert!((position - Point::new(30.0, -30.0)).hypot() < 1e-9);
        // The nw corner is still where it was.
        let nw = Point::new(position.x - 80.0, position.y + 80.0);
        assert!((nw - session.anchor_world).hypot() < 1e-4);
    }

    #[test]
    fn test_resize_edge_handle_affects_one_axis() {
        let (mut graph, id) = sprite_scene(100.0, 40.0);
        let session = session_for(
            &graph,
            &id,
            Handle::Resize(ResizeHandle::E),
            screen(Point::new(50.0, 0.0)),
        );
        // West edge midpoint is the anchor.
        assert_eq!(session.anchor_world, Point::new(-50.0, 0.0));

        update_transform(
            screen(Point::new(150.0, 37.0)),
            &session,
            &mut graph,
            &OrthographicCamera::default(),
            &Viewport::default(),
        );

        let node = graph.node(&id).unwrap();
        assert_eq!(node.declared_size(), Some(Size::new(200.0, 40.0)));
        assert_eq!(node.transform_2d().unwrap().position, Point::new(50.0, 0.0));
    }

    #[test]
    fn test_resize_floor_when_pointer_crosses_anchor() {
        let (mut graph, id) = sprite_scene(100.0, 100.0);
        let session = session_for(
            &graph,
            &id,
            Handle::Resize(ResizeHandle::E),
            screen(Point::new(50.0, 0.0)),
        );

        // Drag far past the west-edge anchor.
        update_transform(
            screen(Point::new(-51.0, 0.0)),
            &session,
            &mut graph,
            &OrthographicCamera::default(),
            &Viewport::default(),
        );

        let size = graph.node(&id).unwrap().declared_size().unwrap();
        assert_eq!(size.width, MIN_RESIZE_DIP);
        assert_eq!(size.height, 100.0);
    }

    #[test]
    fn test_scale_only_node_resizes_via_scale() {
        let mut graph = SceneGraph::new();
        let id = NodeId::new("node2d-1");
        graph
            .insert_node(
                Node::new(
                    id.clone(),
                    "Group",
                    NodeKind::Node2d(Transform2D::default()),
                ),
                None,
                None,
            )
            .unwrap();

        // Unsized nodes get a 32-unit nominal extent; double it.
        let session = session_for(
            &graph,
            &id,
            Handle::Resize(ResizeHandle::Se),
            screen(Point::new(16.0, -16.0)),
        );
        update_transform(
            screen(Point::new(48.0, -48.0)),
            &session,
            &mut graph,
            &OrthographicCamera::default(),
            &Viewport::default(),
        );

        let node = graph.node(&id).unwrap();
        assert!(node.declared_size().is_none());
        let transform = node.transform_2d().unwrap();
        assert!((transform.scale.x - 2.0).abs() < 1e-9);
        assert!((transform.scale.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_is_idempotent_per_frame() {
        let (mut graph, id) = sprite_scene(100.0, 100.0);
        let session = session_for(
            &graph,
            &id,
            Handle::Move,
            screen(Point::new(0.0, 0.0)),
        );

        for _ in 0..3 {
            update_transform(
                screen(Point::new(25.0, 10.0)),
                &session,
                &mut graph,
                &OrthographicCamera::default(),
                &Viewport::default(),
            );
        }
        // Repeated identical input does not accumulate.
        assert_eq!(
            graph.node(&id).unwrap().transform_2d().unwrap().position,
            Point::new(25.0, 10.0)
        );
    }

    #[test]
    fn test_zero_delta_gesture_produces_no_entries() {
        let (mut graph, id) = sprite_scene(100.0, 100.0);
        let session = session_for(&graph, &id, Handle::Move, screen(Point::new(0.0, 0.0)));
        let entries = complete_transform(session, &mut graph);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_rotation_spins_offsets_around_shared_center() {
        let mut graph = SceneGraph::new();
        for (id, x) in [("a", -50.0), ("b", 50.0)] {
            let sprite = Sprite2D {
                size: Size::new(20.0, 20.0),
                transform: Transform2D {
                    position: Point::new(x, 0.0),
                    ..Transform2D::default()
                },
                ..Sprite2D::default()
            };
            graph
                .insert_node(
                    Node::new(NodeId::new(id), id, NodeKind::Sprite2d(sprite)),
                    None,
                    None,
                )
                .unwrap();
        }
        let ids = [NodeId::new("a"), NodeId::new("b")];
        let overlay = SelectionOverlay::from_selection(&graph, &ids).unwrap();
        let session = start_transform(
            screen(Point::new(0.0, 60.0)),
            Handle::Rotate,
            &overlay,
            &graph,
            &ids,
            &OrthographicCamera::default(),
            &Viewport::default(),
        )
        .unwrap();

        // Quarter turn counter-clockwise: pointer swings from +y to -x.
        update_transform(
            screen(Point::new(-60.0, 0.0)),
            &session,
            &mut graph,
            &OrthographicCamera::default(),
            &Viewport::default(),
        );

        let a = graph.node(&ids[0]).unwrap().transform_2d().unwrap().clone();
        let b = graph.node(&ids[1]).unwrap().transform_2d().unwrap().clone();
        assert!((a.position - Point::new(0.0, -50.0)).hypot() < 1e-9);
        assert!((b.position - Point::new(0.0, 50.0)).hypot() < 1e-9);
        assert!((a.rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_layout_offset_rederived_after_move() {
        let mut graph = SceneGraph::new();
        let parent_id = NodeId::new("container2d-parent");
        let child_id = NodeId::new("container2d-child");

        let parent = crate::node::Container2D {
            size: Size::new(200.0, 100.0),
            ..Default::default()
        };
        graph
            .insert_node(
                Node::new(parent_id.clone(), "Panel", NodeKind::Container2d(parent)),
                None,
                None,
            )
            .unwrap();
        let child = crate::node::Container2D {
            size: Size::new(40.0, 40.0),
            layout_anchor: Vec2::new(0.5, 0.5),
            ..Default::default()
        };
        graph
            .insert_node(
                Node::new(child_id.clone(), "Button", NodeKind::Container2d(child)),
                Some(&parent_id),
                None,
            )
            .unwrap();

        if let Some(t) = graph.node_mut(&child_id).unwrap().transform_2d_mut() {
            t.position = Point::new(30.0, 10.0);
        }
        // Anchored to the parent center (0, 0): offset equals the position.
        assert_eq!(
            derived_layout_offset(&graph, &child_id),
            Some(Vec2::new(30.0, 10.0))
        );
    }
}
