use crate::error::RosterError;
use wheel_shared::protocol::NameSetWire;

/// Set ids the UI can switch between (one per number key)
pub const MIN_SET_ID: u32 = 1;
pub const MAX_SET_ID: u32 = 9;

const SAMPLE_NAMES: [&str; 8] = [
    "Alice Johnson",
    "Bob Smith",
    "Carol Davis",
    "David Wilson",
    "Emma Brown",
    "Frank Miller",
    "Grace Lee",
    "Henry Garcia",
];

/// A numbered group of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSet {
    pub id: u32,
    pub names: Vec<String>,
}

/// Names on the wheel, partitioned into numbered sets.
///
/// The wheel shows every set's names in set order; spins draw only from the
/// selected set. A name appears at most once across all sets, and sets never
/// stay empty.
#[derive(Debug, Clone)]
pub struct Roster {
    sets: Vec<NameSet>,
    selected_set_id: u32,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            sets: Vec::new(),
            selected_set_id: MIN_SET_ID,
        }
    }
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sets(&self) -> &[NameSet] {
        &self.sets
    }

    pub fn selected_set_id(&self) -> u32 {
        self.selected_set_id
    }

    /// Every name on the wheel, in segment order.
    pub fn all_names(&self) -> Vec<String> {
        self.sets.iter().flat_map(|s| s.names.iter().cloned()).collect()
    }

    /// Names the next spin may draw from.
    pub fn eligible(&self) -> Vec<String> {
        self.set(self.selected_set_id)
            .map(|s| s.names.clone())
            .unwrap_or_default()
    }

    pub fn can_spin(&self) -> bool {
        self.set(self.selected_set_id)
            .is_some_and(|s| !s.names.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.iter().any(|s| s.names.iter().any(|n| n == name))
    }

    pub fn select_set(&mut self, id: u32) -> Result<(), RosterError> {
        check_set_id(id)?;
        self.selected_set_id = id;
        Ok(())
    }

    /// Add a name to the selected set. Returns the trimmed name.
    pub fn add_name(&mut self, name: &str) -> Result<String, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if self.contains(name) {
            return Err(RosterError::DuplicateName(name.to_string()));
        }
        self.set_mut_or_insert(self.selected_set_id)
            .names
            .push(name.to_string());
        Ok(name.to_string())
    }

    /// Remove a name from the selected set.
    pub fn remove_name(&mut self, name: &str) -> Result<(), RosterError> {
        let id = self.selected_set_id;
        let set = self
            .sets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| RosterError::UnknownName(name.to_string(), id))?;
        let pos = set
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| RosterError::UnknownName(name.to_string(), id))?;
        set.names.remove(pos);
        self.drop_empty_sets();
        Ok(())
    }

    /// Empty the selected set.
    pub fn clear_set(&mut self) {
        let id = self.selected_set_id;
        self.sets.retain(|s| s.id != id);
    }

    /// Replace the selected set with sample names. Samples already used by
    /// another set are skipped so the wheel stays duplicate-free.
    pub fn load_samples(&mut self) {
        self.clear_set();
        let names: Vec<String> = SAMPLE_NAMES
            .iter()
            .filter(|n| !self.contains(n))
            .map(|n| n.to_string())
            .collect();
        if !names.is_empty() {
            self.set_mut_or_insert(self.selected_set_id).names = names;
        }
    }

    /// Take a spin's winner out of the selected set, so it cannot win again.
    /// Returns false when the winner is not in the selected set (e.g. a
    /// cancelled spin stopped on a name from another set).
    pub fn remove_winner(&mut self, winner: &str) -> bool {
        let id = self.selected_set_id;
        let Some(set) = self.sets.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        let before = set.names.len();
        set.names.retain(|n| n != winner);
        let removed = set.names.len() != before;
        self.drop_empty_sets();
        removed
    }

    pub fn to_wire(&self) -> Vec<NameSetWire> {
        self.sets
            .iter()
            .map(|s| NameSetWire {
                id: s.id,
                names: s.names.clone(),
            })
            .collect()
    }

    fn set(&self, id: u32) -> Option<&NameSet> {
        self.sets.iter().find(|s| s.id == id)
    }

    /// Sets stay ordered by id so the wheel layout is stable.
    fn set_mut_or_insert(&mut self, id: u32) -> &mut NameSet {
        let pos = match self.sets.binary_search_by_key(&id, |s| s.id) {
            Ok(pos) => pos,
            Err(pos) => {
                self.sets.insert(
                    pos,
                    NameSet {
                        id,
                        names: Vec::new(),
                    },
                );
                pos
            }
        };
        &mut self.sets[pos]
    }

    fn drop_empty_sets(&mut self) {
        self.sets.retain(|s| !s.names.is_empty());
    }
}

fn check_set_id(id: u32) -> Result<(), RosterError> {
    if (MIN_SET_ID..=MAX_SET_ID).contains(&id) {
        Ok(())
    } else {
        Err(RosterError::InvalidSetId(id))
    }
}
