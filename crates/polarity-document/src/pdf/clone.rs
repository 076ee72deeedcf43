// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deep copy of object graphs between lopdf documents.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::warn;

/// Copies objects from `source` into a target document, following references.
///
/// Each source object is copied at most once; later references to it reuse
/// the first copy, which also makes reference cycles safe. Ids registered with
/// [`ObjectCloner::map_to`] are never copied and resolve to the given target
/// object instead (used to point page references at pages that already exist
/// in the target).
pub(crate) struct ObjectCloner<'a> {
    source: &'a Document,
    mapped: HashMap<ObjectId, ObjectId>,
    /// Dictionary keys dropped from every copied dictionary.
    skip_keys: &'static [&'static [u8]],
}

impl<'a> ObjectCloner<'a> {
    pub(crate) fn new(source: &'a Document, skip_keys: &'static [&'static [u8]]) -> Self {
        Self {
            source,
            mapped: HashMap::new(),
            skip_keys,
        }
    }

    /// Resolve references to `source_id` to `target_id` instead of copying.
    pub(crate) fn map_to(&mut self, source_id: ObjectId, target_id: ObjectId) {
        self.mapped.insert(source_id, target_id);
    }

    pub(crate) fn clone_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.clone_reference(target, *id),
            Object::Dictionary(dict) => Object::Dictionary(self.clone_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.clone_object(target, item))
                    .collect(),
            ),
            Object::Stream(stream) => Object::Stream(Stream::new(
                self.clone_dictionary(target, &stream.dict),
                stream.content.clone(),
            )),
            // Boolean, Integer, Real, String, Name and Null copy as-is.
            other => other.clone(),
        }
    }

    pub(crate) fn clone_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if self.skip_keys.iter().any(|skip| *skip == key.as_slice()) {
                continue;
            }
            let cloned = self.clone_object(target, value);
            copy.set(key.clone(), cloned);
        }
        copy
    }

    fn clone_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(mapped) = self.mapped.get(&id) {
            return Object::Reference(*mapped);
        }

        let source = self.source;
        match source.get_object(id) {
            Ok(object) => {
                // Register before recursing so cycles resolve to this id.
                let new_id = target.new_object_id();
                self.mapped.insert(id, new_id);
                let cloned = self.clone_object(target, object);
                target.objects.insert(new_id, cloned);
                Object::Reference(new_id)
            }
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        }
    }
}
