use facet::Facet;

/// References the analyzer should disregard when computing retention paths.
///
/// The descriptor never interprets these entries; they travel to the analyzer as-is.
#[derive(Facet, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ExcludedRefs {
    exclusions: Vec<Exclusion>,
}

impl ExcludedRefs {
    pub fn new(exclusions: Vec<Exclusion>) -> Self {
        Self { exclusions }
    }

    /// The empty policy: nothing is excluded.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Exclusion> {
        self.exclusions.iter()
    }

    pub fn len(&self) -> usize {
        self.exclusions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exclusions.is_empty()
    }
}

impl FromIterator<Exclusion> for ExcludedRefs {
    fn from_iter<I: IntoIterator<Item = Exclusion>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ExcludedRefs {
    type Item = &'a Exclusion;
    type IntoIter = std::slice::Iter<'a, Exclusion>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Facet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Exclusion {
    pub target: ExclusionTarget,

    /// Why this reference is known to be benign.
    pub reason: String,

    /// Exclude even when no other path to the leaking instance exists.
    pub always_exclude: bool,
}

#[derive(Facet, Debug, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
#[facet(rename_all = "snake_case")]
pub enum ExclusionTarget {
    InstanceField { class_name: String, field_name: String },
    StaticField { class_name: String, field_name: String },
    Thread { thread_name: String },
    Class { class_name: String },
}
