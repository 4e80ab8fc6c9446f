// src/locations/naming.rs
//! Выбор имён для локаций без повторов, пока список не исчерпан.

use super::LocationKind;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};

const NUMERALS: [&str; 9] = ["II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];

#[derive(Debug, Default)]
pub struct NamePool {
    used: HashSet<String>,
    reuse_counts: HashMap<String, usize>,
    fallback_counts: HashMap<LocationKind, usize>,
}

impl NamePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Случайное неиспользованное имя из списка; если всё занято —
    /// повтор с римским номером («Dry Creek II»), если список пуст —
    /// «Town 3».
    pub fn next_name(&mut self, kind: LocationKind, names: &[String], rng: &mut impl Rng) -> String {
        let fresh: Vec<&String> = names.iter().filter(|n| !self.used.contains(*n)).collect();
        if let Some(name) = fresh.choose(rng) {
            self.used.insert((*name).clone());
            return (*name).clone();
        }

        let Some(base) = names.choose(rng) else {
            let counter = self.fallback_counts.entry(kind).or_insert(0);
            *counter += 1;
            return format!("{} {}", kind.display_name(), counter);
        };

        let count = self.reuse_counts.entry(base.clone()).or_insert(0);
        *count += 1;
        match NUMERALS.get(*count - 1) {
            Some(numeral) => format!("{base} {numeral}"),
            None => format!("{base} {}", *count + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn no_repeats_until_exhausted() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut pool = NamePool::new();
        let list = names(&["A", "B", "C"]);
        let mut drawn: Vec<String> = (0..3)
            .map(|_| pool.next_name(LocationKind::Town, &list, &mut rng))
            .collect();
        drawn.sort();
        assert_eq!(drawn, list);

        let fourth = pool.next_name(LocationKind::Town, &list, &mut rng);
        assert!(fourth.ends_with(" II"), "got {fourth}");
    }

    #[test]
    fn empty_list_falls_back_to_kind() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pool = NamePool::new();
        assert_eq!(pool.next_name(LocationKind::Cave, &[], &mut rng), "Cave 1");
        assert_eq!(pool.next_name(LocationKind::Cave, &[], &mut rng), "Cave 2");
        assert_eq!(pool.next_name(LocationKind::Fort, &[], &mut rng), "Fort 1");
    }
}
