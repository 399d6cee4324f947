use std::collections::BTreeMap;

use crate::metric::Metric;

/// Counter values reported for a single phase or workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub label: String,
    pub metrics: BTreeMap<Metric, i64>,
}

impl Section {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<i64> {
        self.metrics.get(&metric).copied()
    }

    pub fn set(&mut self, metric: Metric, value: i64) {
        self.metrics.insert(metric, value);
    }
}

/// Sections in discovery order, keyed by label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    sections: Vec<Section>,
}

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh, empty section under `label` and returns it.
    ///
    /// A label seen before keeps its original position but loses the
    /// metrics recorded so far.
    pub fn open(&mut self, label: &str) -> &mut Section {
        let index = match self.position(label) {
            Some(index) => {
                self.sections[index].metrics.clear();
                index
            }
            None => {
                self.sections.push(Section::new(label));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    pub fn get(&self, label: &str) -> Option<&Section> {
        self.position(label).map(|index| &self.sections[index])
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut Section> {
        self.position(label).map(move |index| &mut self.sections[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.sections.iter().position(|section| section.label == label)
    }
}

impl<'a> IntoIterator for &'a Sections {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}
