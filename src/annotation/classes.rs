//! Class identifiers, the name-to-id table and the overlap priority order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::LogmaskError;

/// Name of the reserved class with id 0.
pub const BACKGROUND: &str = "background";

/// A semantic class identifier, as stored in label masks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub u8);

impl ClassId {
    /// The background / unlabeled class.
    pub const BACKGROUND: ClassId = ClassId(0);

    /// Creates a new ClassId.
    #[inline]
    pub fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the underlying u8 value.
    #[inline]
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Returns the id as an index along the layer axis.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for ClassId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalizes a class title: lower-case, spaces replaced by underscores.
///
/// `"Knot Sound"` becomes `"knot_sound"`.
pub fn normalize_class_name(title: &str) -> String {
    title.trim().to_lowercase().replace(' ', "_")
}

/// Mapping from normalized class name to [`ClassId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassTable {
    by_name: BTreeMap<String, ClassId>,
    /// Indexed by id; `None` for unused ids below the largest one.
    names: Vec<Option<String>>,
}

impl ClassTable {
    /// Builds a table from `(name, id)` pairs.
    ///
    /// Names are normalized. Fails on duplicate ids, duplicate names, or a
    /// class other than `background` claiming id 0.
    pub fn new<I, S>(entries: I) -> Result<Self, LogmaskError>
    where
        I: IntoIterator<Item = (S, u8)>,
        S: AsRef<str>,
    {
        let mut by_name = BTreeMap::new();
        let mut names_by_id: BTreeMap<u8, String> = BTreeMap::new();

        for (name, id) in entries {
            let name = normalize_class_name(name.as_ref());
            if name.is_empty() {
                return Err(LogmaskError::InvalidConfig(format!(
                    "empty class name for id {}",
                    id
                )));
            }
            if id == 0 && name != BACKGROUND {
                return Err(LogmaskError::InvalidConfig(format!(
                    "id 0 is reserved for '{}', not '{}'",
                    BACKGROUND, name
                )));
            }
            if let Some(other) = names_by_id.get(&id) {
                return Err(LogmaskError::InvalidConfig(format!(
                    "classes '{}' and '{}' share id {}",
                    other, name, id
                )));
            }
            if by_name.contains_key(&name) {
                return Err(LogmaskError::InvalidConfig(format!(
                    "class '{}' is defined more than once",
                    name
                )));
            }
            names_by_id.insert(id, name.clone());
            by_name.insert(name, ClassId(id));
        }

        Ok(Self::from_name_map(by_name))
    }

    /// Builds a table from entries already known to be consistent.
    pub(crate) fn from_trusted(entries: &[(&str, u8)]) -> Self {
        let by_name: BTreeMap<String, ClassId> = entries
            .iter()
            .map(|(name, id)| (name.to_string(), ClassId(*id)))
            .collect();
        Self::from_name_map(by_name)
    }

    fn from_name_map(by_name: BTreeMap<String, ClassId>) -> Self {
        let len = by_name.values().map(|id| id.index() + 1).max().unwrap_or(1);
        let mut names = vec![None; len];
        for (name, id) in &by_name {
            names[id.index()] = Some(name.clone());
        }
        Self { by_name, names }
    }

    /// Looks up a class title, normalizing it first.
    pub fn lookup(&self, title: &str) -> Option<ClassId> {
        self.by_name.get(&normalize_class_name(title)).copied()
    }

    /// Returns the name registered for `id`, if any.
    pub fn name_of(&self, id: ClassId) -> Option<&str> {
        self.names.get(id.index())?.as_deref()
    }

    /// Number of layers needed to index every id (max id + 1).
    pub fn layer_count(&self) -> usize {
        self.names.len()
    }

    /// Iterates `(name, id)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ClassId)> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(id, name)| Some((name.as_deref()?, ClassId(id as u8))))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Rank of every class id when several classes claim the same pixel.
///
/// Lower rank wins. Ids that are not in the ranked list share the rank
/// `list.len()`, after every listed class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassPriority {
    ranks: Vec<u32>,
    unlisted: u32,
}

impl ClassPriority {
    /// Builds the priority from a best-first list of class names.
    pub fn from_names<S: AsRef<str>>(
        table: &ClassTable,
        ranked: &[S],
    ) -> Result<Self, LogmaskError> {
        let unlisted = ranked.len() as u32;
        let mut ranks = vec![unlisted; table.layer_count()];
        let mut seen = vec![false; table.layer_count()];

        for (rank, name) in ranked.iter().enumerate() {
            let name = name.as_ref();
            let id = table.lookup(name).ok_or_else(|| {
                LogmaskError::InvalidConfig(format!(
                    "priority entry '{}' is not a known class",
                    name
                ))
            })?;
            if seen[id.index()] {
                return Err(LogmaskError::InvalidConfig(format!(
                    "class '{}' appears more than once in the priority list",
                    name
                )));
            }
            seen[id.index()] = true;
            ranks[id.index()] = rank as u32;
        }

        Ok(Self { ranks, unlisted })
    }

    /// Builds the priority from names already known to be in `table`.
    pub(crate) fn from_trusted(table: &ClassTable, ranked: &[&str]) -> Self {
        let unlisted = ranked.len() as u32;
        let mut ranks = vec![unlisted; table.layer_count()];
        for (rank, name) in ranked.iter().enumerate() {
            if let Some(id) = table.lookup(name) {
                ranks[id.index()] = rank as u32;
            }
        }
        Self { ranks, unlisted }
    }

    /// Returns the rank of `id`. Defined for every id.
    #[inline]
    pub fn rank(&self, id: ClassId) -> u32 {
        self.ranks.get(id.index()).copied().unwrap_or(self.unlisted)
    }

    /// The rank given to classes missing from the ranked list.
    pub fn unlisted_rank(&self) -> u32 {
        self.unlisted
    }

    /// True if `a` beats `b` when both claim a pixel.
    #[inline]
    pub fn outranks(&self, a: ClassId, b: ClassId) -> bool {
        self.rank(a) < self.rank(b)
    }
}
