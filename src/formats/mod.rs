pub mod render;
pub mod tap;
pub mod tree;
