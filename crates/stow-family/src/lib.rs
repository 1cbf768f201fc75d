//! Sample Stow domain: family trees.
//!
//! [`Person`] links to a father and a mother; a [`Model`] names a tree and
//! points at the person it is rooted at. Both types keep a stow slot so a
//! loaded tree can be saved back to the backend it came from.

pub mod model;
pub mod person;

pub use model::{Model, MODEL_SCHEMA};
pub use person::{Person, PERSON_SCHEMA};

use std::sync::Arc;

use stow_engine::{EngineResult, Registration, Registry, RegistryResult};

/// Register [`Person`] and [`Model`].
///
/// Either both types end up registered or neither does.
pub fn register(registry: &Registry) -> RegistryResult<Vec<Registration>> {
    let person = registry.register_type::<Person>()?;
    match registry.register_type::<Model>() {
        Ok(model) => Ok(vec![person, model]),
        Err(e) => {
            person.unregister();
            Err(e)
        }
    }
}

/// Jon's paternal line: six people and a model.
///
/// ```text
/// Model ─ Jon ─┬─ Rhaegar ─┬─ Aerys
///              │           └─ Rhaella
///              └─ Lyanna
/// ```
pub fn targaryen_model() -> EngineResult<Arc<Model>> {
    let aerys = Person::new("Aerys", Some("Targaryen"))?;
    let rhaella = Person::new("Rhaella", Some("Targaryen"))?;
    let rhaegar = Person::new("Rhaegar", Some("Targaryen"))?;
    let lyanna = Person::new("Lyanna", Some("Stark"))?;
    let jon = Person::new("John", Some("Snow"))?;

    rhaegar.set_father(aerys);
    rhaegar.set_mother(rhaella);
    jon.set_father(rhaegar);
    jon.set_mother(lyanna);

    Model::new("Targaryen", jon)
}
