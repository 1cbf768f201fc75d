//! Small domain used by the engine's own tests.
//!
//! [`Node`] carries every kind of reference the engine has to handle: an
//! owning `next` link, a weak `prev` back-link, and a list of shared
//! `children`. [`Tag`] is a plain leaf without a stow slot.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use stow_types::{ObjectId, SerializedRecord};

use crate::error::{EngineError, EngineResult};
use crate::object::{Deserialized, ObjectRef, Serializable, SerializableType, Serialized, StowSlot};

pub const NODE_SCHEMA: &str = "node/1";

#[derive(Debug)]
pub struct Node {
    id: ObjectId,
    pub label: String,
    next: RwLock<Option<Arc<Node>>>,
    prev: RwLock<Option<Weak<Node>>>,
    children: RwLock<Vec<Arc<Node>>>,
    tag: RwLock<Option<Arc<Tag>>>,
    stow: StowSlot,
}

impl Node {
    pub fn new(id: &str, label: &str) -> Arc<Self> {
        Arc::new(Self {
            id: ObjectId::new(id).unwrap(),
            label: label.to_string(),
            next: RwLock::new(None),
            prev: RwLock::new(None),
            children: RwLock::new(Vec::new()),
            tag: RwLock::new(None),
            stow: StowSlot::new(),
        })
    }

    pub fn next(&self) -> Option<Arc<Node>> {
        self.next.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_next(&self, next: Arc<Node>) {
        *self.next.write().unwrap_or_else(PoisonError::into_inner) = Some(next);
    }

    pub fn prev(&self) -> Option<Arc<Node>> {
        self.prev
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    pub fn set_prev(&self, prev: &Arc<Node>) {
        *self.prev.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::downgrade(prev));
    }

    pub fn children(&self) -> Vec<Arc<Node>> {
        self.children.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn add_child(&self, child: Arc<Node>) {
        self.children.write().unwrap_or_else(PoisonError::into_inner).push(child);
    }

    pub fn tag(&self) -> Option<Arc<Tag>> {
        self.tag.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_tag(&self, tag: Arc<Tag>) {
        *self.tag.write().unwrap_or_else(PoisonError::into_inner) = Some(tag);
    }
}

impl Serializable for Node {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn serialize(&self) -> EngineResult<Serialized> {
        let next = self.next();
        let prev = self.prev();
        let children = self.children();
        let tag = self.tag();

        let record = SerializedRecord::new(Self::TYPE, self.id.clone(), NODE_SCHEMA)
            .with_field("label", &self.label)?
            .with_field("next", &next.as_ref().map(|n| n.id.clone()))?
            .with_field("prev", &prev.as_ref().map(|p| p.id.clone()))?
            .with_field(
                "children",
                &children.iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
            )?
            .with_field("tag", &tag.as_ref().map(|t| t.id.clone()))?;

        let mut others: Vec<ObjectRef> = Vec::new();
        others.extend(next.map(|n| n as ObjectRef));
        others.extend(prev.map(|p| p as ObjectRef));
        others.extend(children.into_iter().map(|c| c as ObjectRef));
        others.extend(tag.map(|t| t as ObjectRef));
        Ok(Serialized::new(record).with_others(others))
    }

    fn stow_slot(&self) -> Option<&StowSlot> {
        Some(&self.stow)
    }
}

impl SerializableType for Node {
    const TYPE: &'static str = "node";

    fn deserialize(record: &SerializedRecord) -> EngineResult<Deserialized> {
        if record.schema != NODE_SCHEMA {
            return Err(EngineError::malformed(
                &record.id,
                format!("unknown node schema {:?}", record.schema),
            ));
        }
        let node = Arc::new(Node {
            id: record.id.clone(),
            label: record.field("label")?,
            next: RwLock::new(None),
            prev: RwLock::new(None),
            children: RwLock::new(Vec::new()),
            tag: RwLock::new(None),
            stow: StowSlot::new(),
        });
        let mut out = Deserialized::new(node.clone());

        if let Some(next_id) = record.reference("next")? {
            let target = Arc::clone(&node);
            out = out.link(next_id.clone(), move |objects| {
                target.set_next(objects.get_as::<Node>(&next_id)?);
                Ok(())
            });
        }
        if let Some(prev_id) = record.reference("prev")? {
            let target = Arc::clone(&node);
            out = out.link(prev_id.clone(), move |objects| {
                target.set_prev(&objects.get_as::<Node>(&prev_id)?);
                Ok(())
            });
        }
        let child_ids: Vec<ObjectId> = record.field("children")?;
        if !child_ids.is_empty() {
            for child_id in &child_ids {
                out = out.need(child_id.clone());
            }
            let target = Arc::clone(&node);
            out = out.complete(move |objects| {
                for child_id in &child_ids {
                    target.add_child(objects.get_as::<Node>(child_id)?);
                }
                Ok(())
            });
        }
        if let Some(tag_id) = record.reference("tag")? {
            let target = Arc::clone(&node);
            out = out.link(tag_id.clone(), move |objects| {
                target.set_tag(objects.get_as::<Tag>(&tag_id)?);
                Ok(())
            });
        }
        Ok(out)
    }
}

#[derive(Debug)]
pub struct Tag {
    id: ObjectId,
    pub name: String,
}

impl Tag {
    pub fn new(id: &str, name: &str) -> Arc<Self> {
        Arc::new(Self {
            id: ObjectId::new(id).unwrap(),
            name: name.to_string(),
        })
    }
}

impl Serializable for Tag {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn serialize(&self) -> EngineResult<Serialized> {
        let record = SerializedRecord::new(Self::TYPE, self.id.clone(), "tag/1")
            .with_field("name", &self.name)?;
        Ok(Serialized::new(record))
    }
}

impl SerializableType for Tag {
    const TYPE: &'static str = "tag";

    fn deserialize(record: &SerializedRecord) -> EngineResult<Deserialized> {
        let tag = Arc::new(Tag {
            id: record.id.clone(),
            name: record.field("name")?,
        });
        Ok(Deserialized::new(tag))
    }
}

/// Registry with both test types.
pub fn registry() -> crate::Registry {
    let registry = crate::Registry::new();
    registry.register_type::<Node>().unwrap();
    registry.register_type::<Tag>().unwrap();
    registry
}
