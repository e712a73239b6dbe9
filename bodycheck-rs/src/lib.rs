//! bodycheck Rust facade: Application, Module trait, typed handlers, demo endpoints, logging.

pub mod app;
pub mod demo;
pub mod logging;

pub use app::{typed_handler, Application, HttpModule, Module};
pub use bodycheck_core::{
    CoreError, HandlerError, ObjectSchema, Request, Response, RouteId, Schema, ServerConfig,
    Service,
};
