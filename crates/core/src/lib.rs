pub mod collection;
pub mod events;
pub mod record;
