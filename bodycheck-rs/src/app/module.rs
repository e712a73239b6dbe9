//! Module trait: a group of endpoints registered into an Application at startup.

use bodycheck_core::CoreError;

use super::application::Application;

pub trait Module {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError>;
}
