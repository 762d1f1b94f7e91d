// Built-in editor commands

pub mod create_node;
pub mod delete_nodes;
pub mod set_node_properties;
pub mod transform_nodes;

pub use create_node::CreateNodeCommand;
pub use delete_nodes::DeleteNodesCommand;
pub use set_node_properties::{NodeProperty, SetNodePropertiesCommand};
pub use transform_nodes::{Transform2dState, TransformNodeEdit, TransformNodesCommand};
