use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use stow_engine::{
    Deserialized, EngineError, EngineResult, ObjectId, ObjectRef, Serializable, SerializableType,
    Serialized, SerializedRecord, StowSlot,
};

/// Current wire schema for [`Person`].
pub const PERSON_SCHEMA: &str = "person/1";

/// A person with optional links to their parents.
pub struct Person {
    id: ObjectId,
    first_name: String,
    last_name: Option<String>,
    father: RwLock<Option<Arc<Person>>>,
    mother: RwLock<Option<Arc<Person>>>,
    stow: StowSlot,
}

impl Person {
    /// Create a person with a freshly generated `person_…` id.
    pub fn new(first_name: &str, last_name: Option<&str>) -> EngineResult<Arc<Self>> {
        Ok(Self::with_id(
            ObjectId::generate("person")?,
            first_name,
            last_name,
        ))
    }

    /// Create a person with a caller-chosen id.
    pub fn with_id(id: ObjectId, first_name: &str, last_name: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.map(str::to_string),
            father: RwLock::new(None),
            mother: RwLock::new(None),
            stow: StowSlot::new(),
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }

    pub fn father(&self) -> Option<Arc<Person>> {
        self.father.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn mother(&self) -> Option<Arc<Person>> {
        self.mother.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_father(&self, father: Arc<Person>) {
        *self.father.write().unwrap_or_else(PoisonError::into_inner) = Some(father);
    }

    pub fn set_mother(&self, mother: Arc<Person>) {
        *self.mother.write().unwrap_or_else(PoisonError::into_inner) = Some(mother);
    }

    /// Known parents, father first.
    pub fn parents(&self) -> Vec<Arc<Person>> {
        self.father().into_iter().chain(self.mother()).collect()
    }
}

impl fmt::Debug for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Person")
            .field("id", &self.id)
            .field("name", &self.full_name())
            .field("father", &self.father().map(|p| p.id.clone()))
            .field("mother", &self.mother().map(|p| p.id.clone()))
            .finish()
    }
}

impl Serializable for Person {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn serialize(&self) -> EngineResult<Serialized> {
        let father = self.father();
        let mother = self.mother();
        let record = SerializedRecord::new(Self::TYPE, self.id.clone(), PERSON_SCHEMA)
            .with_field("firstName", &self.first_name)?
            .with_field("lastName", &self.last_name)?
            .with_field("father", &father.as_ref().map(|p| p.id.clone()))?
            .with_field("mother", &mother.as_ref().map(|p| p.id.clone()))?;
        let others = father
            .into_iter()
            .chain(mother)
            .map(|p| p as ObjectRef);
        Ok(Serialized::new(record).with_others(others))
    }

    fn stow_slot(&self) -> Option<&StowSlot> {
        Some(&self.stow)
    }
}

impl SerializableType for Person {
    const TYPE: &'static str = "person";

    fn deserialize(record: &SerializedRecord) -> EngineResult<Deserialized> {
        if record.schema != PERSON_SCHEMA {
            return Err(EngineError::malformed(
                &record.id,
                format!("unsupported person schema {:?}", record.schema),
            ));
        }
        let first_name: String = record.field("firstName")?;
        let last_name: Option<String> = record.optional_field("lastName")?;
        let person = Person::with_id(record.id.clone(), &first_name, last_name.as_deref());
        let mut out = Deserialized::new(person.clone());

        if let Some(father_id) = record.reference("father")? {
            let child = Arc::clone(&person);
            out = out.link(father_id.clone(), move |objects| {
                child.set_father(objects.get_as::<Person>(&father_id)?);
                Ok(())
            });
        }
        if let Some(mother_id) = record.reference("mother")? {
            let child = Arc::clone(&person);
            out = out.link(mother_id.clone(), move |objects| {
                child.set_mother(objects.get_as::<Person>(&mother_id)?);
                Ok(())
            });
        }
        Ok(out)
    }
}
