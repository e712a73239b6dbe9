//! Demo endpoints: the same body schema, once strict and once nullable.
//!
//! - `POST /non-null` requires `{ "name": string }` and answers with the name.
//! - `POST /nullable` also accepts no body (or `null`) and then answers `DEFAULT`.

use bodycheck_core::{CoreError, HandlerError, ObjectSchema, Schema};
use serde::Deserialize;

use crate::app::{Application, HttpModule};

pub const DEFAULT_NAME: &str = "DEFAULT";

#[derive(Debug, Deserialize)]
pub struct Person {
    pub name: String,
}

pub fn person_schema() -> Schema {
    Schema::object(ObjectSchema::new().field("name", Schema::string()))
}

pub async fn non_null(body: Person) -> Result<String, HandlerError> {
    Ok(body.name)
}

pub async fn nullable(body: Option<Person>) -> Result<String, HandlerError> {
    Ok(body
        .map(|person| person.name)
        .unwrap_or_else(|| DEFAULT_NAME.to_owned()))
}

pub fn module() -> HttpModule {
    HttpModule::new("names", Some("/"))
        .post_typed("non-null", person_schema(), non_null)
        .post_typed("nullable", Schema::nullable(person_schema()), nullable)
}

/// Application with the demo module registered.
pub fn application() -> Result<Application, CoreError> {
    let mut app = Application::new();
    app.register(&mut module())?;
    Ok(app)
}
