use std::fmt;
use std::sync::{Arc, OnceLock};

use stow_engine::{
    Deserialized, EngineError, EngineResult, ObjectId, Serializable, SerializableType, Serialized,
    SerializedRecord, StowSlot,
};

use crate::person::Person;

pub const MODEL_SCHEMA: &str = "model/1";

/// Named entry point into a family tree.
///
/// Models are the roots users look up by id prefix (`model_*`); everything
/// else is reached through `root_person`.
pub struct Model {
    id: ObjectId,
    name: String,
    root_person: OnceLock<Arc<Person>>,
    stow: StowSlot,
}

impl Model {
    /// Create a model with a freshly generated `model_…` id.
    pub fn new(name: &str, root_person: Arc<Person>) -> EngineResult<Arc<Self>> {
        let model = Self::empty(ObjectId::generate("model")?, name);
        let _ = model.root_person.set(root_person);
        Ok(Arc::new(model))
    }

    fn empty(id: ObjectId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            root_person: OnceLock::new(),
            stow: StowSlot::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The person this model is rooted at. Always set outside a load.
    pub fn root_person(&self) -> Option<&Arc<Person>> {
        self.root_person.get()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("root_person", &self.root_person().map(|p| p.id().clone()))
            .finish()
    }
}

impl Serializable for Model {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn serialize(&self) -> EngineResult<Serialized> {
        let root = self
            .root_person()
            .ok_or_else(|| EngineError::malformed(&self.id, "model has no root person"))?;
        let record = SerializedRecord::new(Self::TYPE, self.id.clone(), MODEL_SCHEMA)
            .with_field("name", &self.name)?
            .with_field("rootPerson", root.id())?;
        Ok(Serialized::new(record).with_other(root.clone()))
    }

    fn stow_slot(&self) -> Option<&StowSlot> {
        Some(&self.stow)
    }
}

impl SerializableType for Model {
    const TYPE: &'static str = "model";

    fn deserialize(record: &SerializedRecord) -> EngineResult<Deserialized> {
        if record.schema != MODEL_SCHEMA {
            return Err(EngineError::malformed(
                &record.id,
                format!("unsupported model schema {:?}", record.schema),
            ));
        }
        let model = Arc::new(Self::empty(record.id.clone(), &record.field::<String>("name")?));
        let root_id: ObjectId = record.field("rootPerson")?;

        let target = Arc::clone(&model);
        Ok(Deserialized::new(model).link(root_id.clone(), move |objects| {
            let _ = target.root_person.set(objects.get_as::<Person>(&root_id)?);
            Ok(())
        }))
    }
}
