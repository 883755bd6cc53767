pub mod backend;
pub mod error;
pub mod live;
pub mod memory;
pub mod subscription;
pub mod workflow;
