pub mod entity;
pub mod node;
pub mod sensor;

pub use entity::*;
pub use node::*;
pub use sensor::*;
