/// Coefficient binomial exact C(n, k).
///
/// Formule multiplicative sur entiers 128 bits : à chaque étape `acc` vaut
/// C(n, i), donc `acc * (n - i)` est divisible par `i + 1` et aucune
/// division n'arrondit. Sature à `u64::MAX` en cas de dépassement.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * (n - i) as u128 / (i + 1) as u128;
        if acc > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    acc as u64
}

/// Rang colexicographique d'un sous-ensemble de positions triées.
/// Bijection des k-sous-ensembles de 0..n vers [0, C(n, k)).
pub fn colex_rank(positions: &[usize]) -> u64 {
    positions
        .iter()
        .enumerate()
        .map(|(i, &p)| binomial(p, i + 1))
        .sum()
}

/// Énumère les k-sous-ensembles de 0..n en ordre lexicographique croissant,
/// sans récursion : un vecteur d'indices avancé en place.
#[derive(Debug, Clone)]
pub struct IndexCombinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
    remaining: u64,
}

impl IndexCombinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
            done: k > n,
            remaining: binomial(n, k),
        }
    }

    /// Avance sans allouer ; la tranche rendue reste valide jusqu'au prochain appel.
    pub fn advance(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
        } else if !self.step() {
            self.done = true;
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        Some(&self.indices)
    }

    fn step(&mut self) -> bool {
        let k = self.indices.len();
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.indices[i] < self.n - k + i {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return true;
            }
        }
        false
    }
}

impl Iterator for IndexCombinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        self.advance().map(|s| s.to_vec())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let r = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (r, Some(r))
    }
}

impl ExactSizeIterator for IndexCombinations {}

/// k-sous-ensembles d'une tranche d'éléments, dans l'ordre des positions.
#[derive(Debug, Clone)]
pub struct Combinations<'a, T> {
    elements: &'a [T],
    inner: IndexCombinations,
}

impl<T: Copy> Iterator for Combinations<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        let elements = self.elements;
        self.inner
            .advance()
            .map(|idx| idx.iter().map(|&i| elements[i]).collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: Copy> ExactSizeIterator for Combinations<'_, T> {}

pub fn k_combinations<T: Copy>(elements: &[T], k: usize) -> Combinations<'_, T> {
    Combinations {
        elements,
        inner: IndexCombinations::new(elements.len(), k),
    }
}

pub fn k_index_combinations(n: usize, k: usize) -> IndexCombinations {
    IndexCombinations::new(n, k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_binomial_known_values() {
        assert_eq!(binomial(5, 3), 10);
        assert_eq!(binomial(10, 3), 120);
        assert_eq!(binomial(20, 10), 184_756);
        assert_eq!(binomial(49, 5), 1_906_884);
        assert_eq!(binomial(49, 6), 13_983_816);
        assert_eq!(binomial(49, 10), 8_217_822_536);
    }

    #[test]
    fn test_binomial_edges() {
        assert_eq!(binomial(4, 5), 0);
        assert_eq!(binomial(0, 0), 1);
        assert_eq!(binomial(7, 0), 1);
        assert_eq!(binomial(7, 7), 1);
        for n in 0..30 {
            for k in 0..=n {
                assert_eq!(binomial(n, k), binomial(n, n - k), "symétrie C({n},{k})");
            }
        }
    }

    #[test]
    fn test_binomial_matches_enumeration() {
        for n in 0..=15usize {
            let elements: Vec<usize> = (0..n).collect();
            for k in 0..=n {
                let count = k_combinations(&elements, k).count() as u64;
                assert_eq!(count, binomial(n, k), "C({n},{k}) diffère de l'énumération");
            }
        }
    }

    #[test]
    fn test_lexicographic_order_without_duplicates() {
        let elements = [3u8, 7, 11, 19, 23, 42];
        let combos: Vec<Vec<u8>> = k_combinations(&elements, 3).collect();
        assert_eq!(combos.len(), 20);
        assert_eq!(combos[0], vec![3, 7, 11]);
        assert_eq!(combos[19], vec![19, 23, 42]);
        for w in combos.windows(2) {
            assert!(w[0] < w[1], "ordre non lexicographique : {:?} >= {:?}", w[0], w[1]);
        }
        let unique: HashSet<_> = combos.iter().collect();
        assert_eq!(unique.len(), combos.len());
    }

    #[test]
    fn test_zero_and_oversized_k() {
        let elements = [1u8, 2, 3];
        let empty: Vec<Vec<u8>> = k_combinations(&elements, 0).collect();
        assert_eq!(empty, vec![Vec::<u8>::new()]);
        assert_eq!(k_combinations(&elements, 4).count(), 0);
    }

    #[test]
    fn test_restartable() {
        let elements = [1u8, 2, 3, 4, 5, 6, 7];
        let iter = k_combinations(&elements, 4);
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(elements, [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_exact_size() {
        let mut iter = k_index_combinations(10, 5);
        assert_eq!(iter.len(), 252);
        iter.next();
        iter.next();
        assert_eq!(iter.len(), 250);
    }

    #[test]
    fn test_colex_rank_is_bijection() {
        let n = 9;
        let k = 4;
        let ranks: HashSet<u64> = k_index_combinations(n, k).map(|p| colex_rank(&p)).collect();
        assert_eq!(ranks.len() as u64, binomial(n, k));
        assert!(ranks.iter().all(|&r| r < binomial(n, k)));
        assert_eq!(colex_rank(&[0, 1, 2, 3]), 0);
    }
}
