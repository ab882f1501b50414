//! An insertion-ordered set of individuals that reports its changes.

use std::fmt;

use indexmap::IndexMap;

use crate::individual::{Handle, Individual, IndividualId};

/// A structural change of an [`IndividualSet`].
#[derive(Debug)]
pub enum ArchiveEvent<'a, S> {
  /// The individual became a member.
  Added(&'a Handle<S>),
  /// The individual is no longer a member.
  Removed(&'a Handle<S>),
}

/// Receives membership changes synchronously, on the thread that mutated the
/// set.
///
/// # Examples
/// ```
/// # use pareto_archive::individual::set::{ArchiveEvent, IndividualSet};
/// let mut set = IndividualSet::<()>::new();
/// set.add_listener(Box::new(|event: ArchiveEvent<'_, ()>| {
///   if let ArchiveEvent::Added(individual) = event {
///     println!("added {}", individual.id());
///   }
/// }));
/// ```
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait ArchiveListener<S>: Send {
  /// Called once per added or removed individual.
  fn on_event(&mut self, event: ArchiveEvent<'_, S>);
}

impl<S, F> ArchiveListener<S> for F
where
  F: FnMut(ArchiveEvent<'_, S>) + Send,
{
  fn on_event(&mut self, event: ArchiveEvent<'_, S>) {
    self(event)
  }
}

/// Handle of a registered listener, used to remove it again.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(usize);

/// A set of [`Handle`]s compared by identity. Iteration follows insertion
/// order, which makes every order-dependent decision built on top of it
/// reproducible.
pub struct IndividualSet<S> {
  individuals: IndexMap<IndividualId, Handle<S>>,
  listeners: Vec<(ListenerId, Box<dyn ArchiveListener<S>>)>,
  next_listener: usize,
}

impl<S> Default for IndividualSet<S> {
  fn default() -> Self {
    Self {
      individuals: IndexMap::new(),
      listeners: Vec::new(),
      next_listener: 0,
    }
  }
}

impl<S> fmt::Debug for IndividualSet<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("IndividualSet")
      .field("individuals", &self.individuals.keys().collect::<Vec<_>>())
      .field("listeners", &self.listeners.len())
      .finish()
  }
}

impl<S> IndividualSet<S> {
  /// Creates an empty set.
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the number of members.
  pub fn len(&self) -> usize {
    self.individuals.len()
  }

  /// Returns `true` if there are no members.
  pub fn is_empty(&self) -> bool {
    self.individuals.is_empty()
  }

  /// Returns `true` if `individual` is a member.
  pub fn contains(&self, individual: &Individual<S>) -> bool {
    self.individuals.contains_key(&individual.id())
  }

  /// Returns `true` if the individual with given identity is a member.
  pub fn contains_id(&self, id: IndividualId) -> bool {
    self.individuals.contains_key(&id)
  }

  /// Returns the member with given identity.
  pub fn get(&self, id: IndividualId) -> Option<&Handle<S>> {
    self.individuals.get(&id)
  }

  /// Iterates over the members in insertion order.
  pub fn iter(&self) -> Iter<'_, S> {
    Iter(self.individuals.values())
  }

  /// Adds `individual` and notifies the listeners. Returns `false` if it was
  /// already a member.
  pub fn insert(&mut self, individual: Handle<S>) -> bool {
    if self.individuals.contains_key(&individual.id()) {
      return false;
    }
    self.notify(ArchiveEvent::Added(&individual));
    self.individuals.insert(individual.id(), individual);
    true
  }

  /// Removes the individual with given identity and notifies the listeners.
  pub fn remove(&mut self, id: IndividualId) -> Option<Handle<S>> {
    let removed = self.individuals.shift_remove(&id)?;
    self.notify(ArchiveEvent::Removed(&removed));
    Some(removed)
  }

  /// Registers a listener.
  pub fn add_listener(
    &mut self,
    listener: Box<dyn ArchiveListener<S>>,
  ) -> ListenerId {
    let id = ListenerId(self.next_listener);
    self.next_listener += 1;
    self.listeners.push((id, listener));
    id
  }

  /// Deregisters a listener. Returns `false` if it was not registered.
  pub fn remove_listener(&mut self, id: ListenerId) -> bool {
    let len = self.listeners.len();
    self.listeners.retain(|(l, _)| *l != id);
    self.listeners.len() != len
  }

  fn notify(&mut self, event: ArchiveEvent<'_, S>) {
    for (_, listener) in self.listeners.iter_mut() {
      listener.on_event(match event {
        ArchiveEvent::Added(i) => ArchiveEvent::Added(i),
        ArchiveEvent::Removed(i) => ArchiveEvent::Removed(i),
      });
    }
  }
}

/// Iterator over the members of an [`IndividualSet`].
pub struct Iter<'a, S>(indexmap::map::Values<'a, IndividualId, Handle<S>>);

impl<'a, S> Iterator for Iter<'a, S> {
  type Item = &'a Handle<S>;

  fn next(&mut self) -> Option<Self::Item> {
    self.0.next()
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.0.size_hint()
  }
}

impl<S> ExactSizeIterator for Iter<'_, S> {}

impl<'a, S> IntoIterator for &'a IndividualSet<S> {
  type Item = &'a Handle<S>;
  type IntoIter = Iter<'a, S>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;

  #[test]
  fn test_insert_and_remove() {
    let mut set = IndividualSet::new();
    let a = Individual::new(()).into_handle();
    let b = Individual::new(()).into_handle();
    assert!(set.insert(a.clone()));
    assert!(!set.insert(a.clone()));
    assert!(set.insert(b.clone()));
    assert_eq!(set.len(), 2);
    assert!(set.contains(&a));
    assert_eq!(set.remove(a.id()).map(|i| i.id()), Some(a.id()));
    assert!(set.remove(a.id()).is_none());
    assert!(!set.contains(&a));
    assert_eq!(set.iter().map(|i| i.id()).collect::<Vec<_>>(), [b.id()]);
  }

  #[test]
  fn test_iteration_follows_insertion_order() {
    let mut set = IndividualSet::new();
    let handles: Vec<_> =
      (0..5).map(|i| Individual::new(i).into_handle()).collect();
    for h in handles.iter().rev() {
      set.insert(h.clone());
    }
    set.remove(handles[2].id());
    let order: Vec<_> = set.iter().map(|i| *i.solution()).collect();
    assert_eq!(order, [4, 3, 1, 0]);
  }

  #[test]
  fn test_listeners() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut set = IndividualSet::new();
    let sink = log.clone();
    let id = set.add_listener(Box::new(move |event: ArchiveEvent<'_, u8>| {
      let entry = match event {
        ArchiveEvent::Added(i) => (true, *i.solution()),
        ArchiveEvent::Removed(i) => (false, *i.solution()),
      };
      sink.lock().unwrap().push(entry);
    }));

    let a = Individual::new(1).into_handle();
    set.insert(a.clone());
    set.insert(a.clone());
    set.remove(a.id());
    assert!(set.remove_listener(id));
    assert!(!set.remove_listener(id));
    set.insert(a);

    assert_eq!(*log.lock().unwrap(), [(true, 1), (false, 1)]);
  }
}
