//! Population-scoped registry assigning stable innovation numbers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::gene::InnovationId;

/// Maps ordered `(source, destination)` node pairs to innovation ids.
///
/// The same ordered pair always yields the same id for the lifetime of the
/// registry; a never-seen pair receives the next unused id. One registry is
/// shared by every genome evolved together -- crossover alignment is
/// meaningless otherwise -- so the population owns it and threads it through
/// every structural mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InnovationRegistry {
    next: u32,
    #[serde(with = "pair_entries")]
    history: HashMap<(usize, usize), InnovationId>,
}

impl InnovationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for an ordered pair, assigning the next unused id on
    /// first sight.
    pub fn id_for(&mut self, source: usize, destination: usize) -> InnovationId {
        if let Some(&id) = self.history.get(&(source, destination)) {
            return id;
        }
        let id = InnovationId(self.next);
        self.next += 1;
        self.history.insert((source, destination), id);
        id
    }

    /// Id that would be assigned to the next never-seen pair. Persisted so a
    /// resumed run keeps assigning fresh ids where the old one left off.
    #[must_use]
    pub const fn next_id(&self) -> u32 {
        self.next
    }

    /// Number of distinct edge roles registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Serialize the pair map as a sorted entry list so snapshots stay stable
/// and survive formats whose map keys must be strings.
mod pair_entries {
    use std::collections::HashMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::gene::InnovationId;

    pub fn serialize<S: Serializer>(
        map: &HashMap<(usize, usize), InnovationId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<(usize, usize, InnovationId)> = map
            .iter()
            .map(|(&(source, destination), &id)| (source, destination, id))
            .collect();
        entries.sort_unstable();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<(usize, usize), InnovationId>, D::Error> {
        let entries = Vec::<(usize, usize, InnovationId)>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|(source, destination, id)| ((source, destination), id))
            .collect())
    }
}
