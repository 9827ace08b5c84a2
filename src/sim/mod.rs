pub mod builder;
pub mod clock;
pub mod event;
pub mod session;
