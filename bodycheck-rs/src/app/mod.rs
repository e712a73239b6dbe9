//! Application, Module, HttpModule.

pub mod application;
pub mod module;
pub mod routing;

pub use application::{typed_handler, Application};
pub use module::Module;
pub use routing::HttpModule;
