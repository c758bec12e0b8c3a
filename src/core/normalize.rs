use crate::models::SubjectEntry;

pub const MIN_PROFICIENCY: u8 = 1;
pub const MAX_PROFICIENCY: u8 = 5;

/// Proficiency assumed for a declared subject with no usable rating
pub const NEUTRAL_PROFICIENCY: u8 = 3;

/// Normalize a subject name into its comparison key
///
/// Returns `None` for names that are empty after trimming.
#[inline]
pub fn normalize_subject(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Round and clamp a declared proficiency into [1, 5]
#[inline]
pub fn clamp_proficiency(raw: Option<f64>) -> u8 {
    match raw {
        Some(value) if value.is_finite() => {
            value.round().clamp(MIN_PROFICIENCY as f64, MAX_PROFICIENCY as f64) as u8
        }
        _ => NEUTRAL_PROFICIENCY,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSubject {
    pub key: String,
    pub display: String,
    pub proficiency: u8,
}

/// A user's teach or learn list after normalization
///
/// Keeps declaration order. A subject listed twice keeps its first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectSet {
    entries: Vec<NormalizedSubject>,
}

/// Outcome of normalizing one list: the usable set plus the number of entries
/// whose `subject` was missing or not a string
#[derive(Debug, Clone, Default)]
pub struct NormalizedList {
    pub subjects: SubjectSet,
    pub malformed: usize,
}

impl SubjectSet {
    pub fn from_entries(entries: &[SubjectEntry]) -> NormalizedList {
        let mut subjects = SubjectSet::default();
        let mut malformed = 0;

        for entry in entries {
            let Some(raw) = entry.subject.as_deref() else {
                malformed += 1;
                continue;
            };
            // Blank names are ignored, not malformed
            let Some(key) = normalize_subject(raw) else {
                continue;
            };
            if subjects.contains(&key) {
                continue;
            }
            subjects.entries.push(NormalizedSubject {
                key,
                display: raw.trim().to_string(),
                proficiency: clamp_proficiency(entry.proficiency),
            });
        }

        NormalizedList { subjects, malformed }
    }

    pub fn get(&self, key: &str) -> Option<&NormalizedSubject> {
        self.entries.iter().find(|s| s.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedSubject> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any subject in `self` also appears in `other`
    pub fn overlaps(&self, other: &SubjectSet) -> bool {
        self.entries.iter().any(|s| other.contains(&s.key))
    }
}

/// Local, normalized copy of a profile's subject lists
#[derive(Debug, Clone, Default)]
pub struct NormalizedProfile {
    pub teach: SubjectSet,
    pub learn: SubjectSet,
    pub malformed: usize,
}

impl NormalizedProfile {
    pub fn new(teach: &[SubjectEntry], learn: &[SubjectEntry]) -> Self {
        let teach = SubjectSet::from_entries(teach);
        let learn = SubjectSet::from_entries(learn);

        Self {
            teach: teach.subjects,
            learn: learn.subjects,
            malformed: teach.malformed + learn.malformed,
        }
    }
}
