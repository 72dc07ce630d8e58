//! ## Persistent Vector Iterator
//! This module contains an implementation of an iterator over a vector as a persistent data
//! structure to allow for cheap cloning. The discrimination tree query iterators fork their
//! position whenever the tree branches, so cloning has to be cheap.

use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct PersistentVecIterator<V> {
    vec: Rc<Vec<V>>,
    pos: usize,
}

impl<V> PersistentVecIterator<V> {
    pub fn new(vec: Vec<V>) -> Self {
        Self {
            vec: Rc::new(vec),
            pos: 0,
        }
    }
}

impl<V: Copy> Iterator for PersistentVecIterator<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        let ret = self.vec.get(self.pos).copied();
        if ret.is_some() {
            self.pos += 1;
        }
        ret
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vec.len() - self.pos;
        (remaining, Some(remaining))
    }
}
