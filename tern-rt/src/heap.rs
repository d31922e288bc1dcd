#![forbid(unsafe_code)]

//! Reference-counted object arena.
//!
//! Class instances and array storage live in slots addressed by
//! [`Handle`]s (an index plus the slot's generation) instead of pointers.
//! Destroying an object bumps its slot's generation, so every outstanding
//! handle to it, strong or weak, stops resolving. Counts are plain integers:
//! the arena is `!Sync` and belongs to one thread.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

use crate::bounds::check_index;
use crate::fault::Fault;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

/// Non-owning observer of a class instance. Does not keep it alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WeakHandle {
    target: Handle,
}

impl WeakHandle {
    pub(crate) fn new(target: Handle) -> Self {
        Self { target }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Instance {
        class: String,
        fields: Vec<(String, Value)>,
    },
    Array(Vec<Value>),
}

impl Object {
    fn into_children(self) -> Vec<Value> {
        match self {
            Object::Instance { fields, .. } => fields.into_iter().map(|(_, v)| v).collect(),
            Object::Array(items) => items,
        }
    }
}

/// Outcome of a release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// Still referenced; carries the remaining count.
    Alive(u32),
    /// The count reached zero and the object was destroyed.
    Destroyed,
}

#[derive(Debug)]
struct Entry {
    count: u32,
    object: Object,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, object: Object) -> Handle {
        let entry = Entry { count: 1, object };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return Handle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        Handle::new(index, 0)
    }

    /// Allocates a class instance with a count of one. The fields are moved
    /// in; the caller's references become the instance's.
    pub fn alloc_instance(&mut self, class: impl Into<String>, fields: Vec<(String, Value)>) -> Handle {
        self.alloc(Object::Instance {
            class: class.into(),
            fields,
        })
    }

    pub fn alloc_array(&mut self, items: Vec<Value>) -> Handle {
        self.alloc(Object::Array(items))
    }

    fn entry(&self, h: Handle) -> Result<&Entry, Fault> {
        self.slots
            .get(h.index as usize)
            .filter(|s| s.generation == h.generation)
            .and_then(|s| s.entry.as_ref())
            .ok_or(Fault::DanglingHandle { index: h.index })
    }

    fn entry_mut(&mut self, h: Handle) -> Result<&mut Entry, Fault> {
        self.slots
            .get_mut(h.index as usize)
            .filter(|s| s.generation == h.generation)
            .and_then(|s| s.entry.as_mut())
            .ok_or(Fault::DanglingHandle { index: h.index })
    }

    pub fn is_alive(&self, h: Handle) -> bool {
        self.entry(h).is_ok()
    }

    pub fn ref_count(&self, h: Handle) -> Result<u32, Fault> {
        self.entry(h).map(|e| e.count)
    }

    pub fn retain(&mut self, h: Handle) -> Result<u32, Fault> {
        let entry = self.entry_mut(h)?;
        entry.count += 1;
        Ok(entry.count)
    }

    /// Decrements the count. At zero the object is destroyed and every strong
    /// reference it owned is released in turn.
    pub fn release(&mut self, h: Handle) -> Result<Release, Fault> {
        let first = self.release_one(h)?;
        if let Some(children) = first.1 {
            let mut pending: Vec<Handle> = children.iter().flat_map(Value::strong_handles).collect();
            while let Some(next) = pending.pop() {
                if let (_, Some(children)) = self.release_one(next)? {
                    pending.extend(children.iter().flat_map(Value::strong_handles));
                }
            }
        }
        Ok(first.0)
    }

    fn release_one(&mut self, h: Handle) -> Result<(Release, Option<Vec<Value>>), Fault> {
        let entry = self.entry_mut(h)?;
        entry.count -= 1;
        if entry.count > 0 {
            return Ok((Release::Alive(entry.count), None));
        }
        let slot = &mut self.slots[h.index as usize];
        let object = slot.entry.take().map(|e| e.object);
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(h.index);
        Ok((Release::Destroyed, object.map(Object::into_children)))
    }

    pub fn downgrade(&self, h: Handle) -> Result<WeakHandle, Fault> {
        self.entry(h)?;
        Ok(WeakHandle::new(h))
    }

    /// Strong handle to the observed object if it is still alive. A
    /// successful upgrade retains.
    pub fn upgrade(&mut self, w: WeakHandle) -> Option<Handle> {
        self.retain(w.target).ok().map(|_| w.target)
    }

    /// Reads a weak observer as an optional strong reference: absent once the
    /// object has been destroyed.
    pub fn read_weak(&mut self, w: WeakHandle) -> Value {
        match self.upgrade(w) {
            Some(h) => Value::some(Value::Class(h)),
            None => Value::none(),
        }
    }

    /// Copies `v` with value semantics: inline aggregates are duplicated and
    /// every strong handle reachable through them is retained.
    pub fn copy_value(&mut self, v: &Value) -> Result<Value, Fault> {
        let handles = v.strong_handles();
        for h in &handles {
            self.entry(*h)?;
        }
        for h in handles {
            self.retain(h)?;
        }
        Ok(v.clone())
    }

    /// Ends the lifetime of `v`, releasing every strong handle it owns.
    pub fn drop_value(&mut self, v: Value) -> Result<(), Fault> {
        for h in v.strong_handles() {
            self.release(h)?;
        }
        Ok(())
    }

    pub fn object(&self, h: Handle) -> Result<&Object, Fault> {
        self.entry(h).map(|e| &e.object)
    }

    pub fn field(&self, h: Handle, name: &str) -> Result<&Value, Fault> {
        match &self.entry(h)?.object {
            Object::Instance { fields, .. } => fields
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v)
                .ok_or_else(|| Fault::UnknownField { field: name.to_string() }),
            Object::Array(_) => Err(Fault::KindMismatch { expected: "class instance" }),
        }
    }

    /// Stores `value` (already owned by the caller) and releases whatever the
    /// field held before.
    pub fn set_field(&mut self, h: Handle, name: &str, value: Value) -> Result<(), Fault> {
        let old = match &mut self.entry_mut(h)?.object {
            Object::Instance { fields, .. } => {
                let slot = fields
                    .iter_mut()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v)
                    .ok_or_else(|| Fault::UnknownField { field: name.to_string() })?;
                std::mem::replace(slot, value)
            }
            Object::Array(_) => return Err(Fault::KindMismatch { expected: "class instance" }),
        };
        self.drop_value(old)
    }

    fn items(&self, h: Handle) -> Result<&Vec<Value>, Fault> {
        match &self.entry(h)?.object {
            Object::Array(items) => Ok(items),
            Object::Instance { .. } => Err(Fault::KindMismatch { expected: "array" }),
        }
    }

    fn items_mut(&mut self, h: Handle) -> Result<&mut Vec<Value>, Fault> {
        match &mut self.entry_mut(h)?.object {
            Object::Array(items) => Ok(items),
            Object::Instance { .. } => Err(Fault::KindMismatch { expected: "array" }),
        }
    }

    pub fn len(&self, h: Handle) -> Result<usize, Fault> {
        self.items(h).map(Vec::len)
    }

    pub fn element(&self, h: Handle, index: i128) -> Result<&Value, Fault> {
        let items = self.items(h)?;
        let i = check_index(index, items.len())?;
        Ok(&items[i])
    }

    pub fn set_element(&mut self, h: Handle, index: i128, value: Value) -> Result<(), Fault> {
        let items = self.items_mut(h)?;
        let i = check_index(index, items.len())?;
        let old = std::mem::replace(&mut items[i], value);
        self.drop_value(old)
    }

    pub fn push(&mut self, h: Handle, value: Value) -> Result<(), Fault> {
        self.items_mut(h)?.push(value);
        Ok(())
    }

    pub fn live_objects(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::IntType;

    fn node(heap: &mut Heap) -> Handle {
        heap.alloc_instance("Node", vec![("next".into(), Value::none())])
    }

    #[test]
    fn destroyed_exactly_when_count_reaches_zero() {
        let mut heap = Heap::new();
        let h = node(&mut heap);
        assert_eq!(heap.retain(h), Ok(2));
        assert_eq!(heap.release(h), Ok(Release::Alive(1)));
        assert!(heap.is_alive(h));
        assert_eq!(heap.release(h), Ok(Release::Destroyed));
        assert!(!heap.is_alive(h));
        assert_eq!(heap.release(h), Err(Fault::DanglingHandle { index: h.index() }));
    }

    #[test]
    fn weak_reads_absent_after_destroy() {
        let mut heap = Heap::new();
        let h = node(&mut heap);
        let w = heap.downgrade(h).unwrap();

        let live = heap.read_weak(w);
        assert_eq!(live, Value::some(Value::Class(h)));
        heap.drop_value(live).unwrap();

        heap.release(h).unwrap();
        assert_eq!(heap.read_weak(w), Value::none());
    }

    #[test]
    fn reused_slot_does_not_revive_old_handles() {
        let mut heap = Heap::new();
        let old = node(&mut heap);
        let w = heap.downgrade(old).unwrap();
        heap.release(old).unwrap();

        let fresh = node(&mut heap);
        assert_eq!(fresh.index(), old.index());
        assert!(!heap.is_alive(old));
        assert!(heap.upgrade(w).is_none());
    }

    #[test]
    fn destroying_parent_releases_children() {
        let mut heap = Heap::new();
        let child = node(&mut heap);
        let parent = heap.alloc_instance("Node", vec![("next".into(), Value::some(Value::Class(child)))]);
        assert_eq!(heap.live_objects(), 2);
        heap.release(parent).unwrap();
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn overwriting_a_field_releases_the_old_value() {
        let mut heap = Heap::new();
        let a = node(&mut heap);
        let b = node(&mut heap);
        let holder = heap.alloc_instance("Holder", vec![("item".into(), Value::Class(a))]);
        heap.set_field(holder, "item", Value::Class(b)).unwrap();
        assert!(!heap.is_alive(a));
        assert_eq!(heap.field(holder, "item"), Ok(&Value::Class(b)));
    }

    #[test]
    fn copy_retains_nested_handles() {
        let mut heap = Heap::new();
        let h = node(&mut heap);
        let v = Value::some(Value::Class(h));
        let copy = heap.copy_value(&v).unwrap();
        assert_eq!(heap.ref_count(h), Ok(2));
        heap.drop_value(copy).unwrap();
        heap.drop_value(v).unwrap();
        assert!(!heap.is_alive(h));
    }

    #[test]
    fn element_access_is_bounds_checked() {
        let mut heap = Heap::new();
        let one = Value::int(IntType::I32, 1).unwrap();
        let arr = heap.alloc_array(vec![one.clone(), one.clone(), one]);
        assert!(heap.element(arr, 2).is_ok());
        assert_eq!(heap.element(arr, 3), Err(Fault::BoundsError { index: 3, len: 3 }));
    }
}
