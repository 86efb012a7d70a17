pub mod event;
pub mod participation;
pub mod profile;

pub use event::Currency;
