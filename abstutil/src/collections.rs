use std::collections::{BTreeMap, BTreeSet};

/// Indexes into a cyclic list. Negative indices and ones past the end wrap around.
pub fn wraparound_get<T>(vec: &[T], idx: isize) -> &T {
    let len = vec.len() as isize;
    let idx = idx % len;
    let idx = if idx >= 0 { idx } else { idx + len };
    &vec[idx as usize]
}

pub fn contains_duplicates<T: Ord>(vec: &[T]) -> bool {
    let mut set = BTreeSet::new();
    for item in vec {
        if set.contains(item) {
            return true;
        }
        set.insert(item);
    }
    false
}

/// Counts how many times each key is seen.
#[derive(Clone)]
pub struct Counter<T: Ord + PartialEq + Clone> {
    map: BTreeMap<T, usize>,
    sum: usize,
}

impl<T: Ord + PartialEq + Clone> Default for Counter<T> {
    fn default() -> Counter<T> {
        Counter::new()
    }
}

impl<T: Ord + PartialEq + Clone> Counter<T> {
    pub fn new() -> Counter<T> {
        Counter {
            map: BTreeMap::new(),
            sum: 0,
        }
    }

    pub fn add(&mut self, val: T, amount: usize) -> usize {
        let entry = self.map.entry(val).or_insert(0);
        *entry += amount;
        self.sum += amount;
        *entry
    }

    pub fn inc(&mut self, val: T) -> usize {
        self.add(val, 1)
    }

    /// If the key is missing, returns 0
    pub fn get(&self, val: T) -> usize {
        self.map.get(&val).cloned().unwrap_or(0)
    }

    pub fn sum(&self) -> usize {
        self.sum
    }

    pub fn consume(self) -> BTreeMap<T, usize> {
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraparound() {
        let v = vec![1, 2, 3];
        assert_eq!(*wraparound_get(&v, -1), 3);
        assert_eq!(*wraparound_get(&v, 3), 1);
        assert_eq!(*wraparound_get(&v, 1), 2);
    }

    #[test]
    fn counter() {
        let mut c = Counter::new();
        c.inc("a");
        c.add("b", 3);
        c.inc("a");
        assert_eq!(c.get("a"), 2);
        assert_eq!(c.get("z"), 0);
        assert_eq!(c.sum(), 5);
        assert!(contains_duplicates(&[1, 2, 1]));
        assert!(!contains_duplicates(&[1, 2, 3]));
    }
}
