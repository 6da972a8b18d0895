//! Reference-ordered queue of annotations waiting to be written.

use crate::model::{Annotation, ScriptureReference};
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct AnnotationQueue<'a> {
    pending: VecDeque<&'a Annotation>,
}

impl<'a> AnnotationQueue<'a> {
    /// `annotations` must already be sorted by begin reference.
    pub fn new(annotations: Vec<&'a Annotation>) -> Self {
        Self {
            pending: annotations.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and returns every annotation that begins strictly before
    /// `boundary`, in queue order.
    pub fn drain_before(&mut self, boundary: ScriptureReference) -> Vec<&'a Annotation> {
        let count = self
            .pending
            .iter()
            .take_while(|a| a.begin < boundary)
            .count();
        self.pending.drain(..count).collect()
    }

    pub fn drain_all(&mut self) -> Vec<&'a Annotation> {
        self.pending.drain(..).collect()
    }
}
