use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyEntry {
    pub item: String,
    pub count: u32,
}

/// Labels with counts, sorted by count descending. Equal counts keep the
/// order in which the labels were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    /// Counts each label and sorts the result.
    /// # Example
    /// ```
    /// use jp_tense_style::FrequencyTable;
    /// let t = FrequencyTable::count(["b", "a", "a", "c", "b", "a"]);
    /// let got: Vec<(&str, u32)> = t.iter().map(|e| (e.item.as_str(), e.count)).collect();
    /// assert_eq!(got, vec![("a", 3), ("b", 2), ("c", 1)]);
    /// ```
    pub fn count<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut entries: Vec<FrequencyEntry> = Vec::new();
        for label in labels {
            let label = label.as_ref();
            match index.get(label) {
                Some(&i) => entries[i].count += 1,
                None => {
                    index.insert(label.to_owned(), entries.len());
                    entries.push(FrequencyEntry {
                        item: label.to_owned(),
                        count: 1,
                    });
                }
            }
        }
        // stable: ties stay in first-seen order
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        FrequencyTable { entries }
    }

    /// Keep only the `n` most frequent entries.
    pub fn top(mut self, n: usize) -> Self {
        self.entries.truncate(n);
        self
    }

    pub fn entries(&self) -> &[FrequencyEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrequencyEntry> {
        self.entries.iter()
    }

    pub fn get(&self, item: &str) -> Option<u32> {
        self.entries.iter().find(|e| e.item == item).map(|e| e.count)
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a FrequencyTable {
    type Item = &'a FrequencyEntry;
    type IntoIter = std::slice::Iter<'a, FrequencyEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
