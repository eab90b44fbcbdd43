use serde::{Deserialize, Serialize};

use crate::error::{invalid, CoverError, Result};

/// Plus grand numéro de boule (Loto : 1-49).
pub const BALL_MAX: u8 = 49;
/// Plus grand numéro chance (1-10).
pub const CHANCE_MAX: u8 = 10;
/// Nombre de boules d'un tirage.
pub const DRAW_SIZE: usize = 5;
/// Plus grande grille multiple jouable.
pub const MAX_GRID_SIZE: usize = 10;

/// Ensemble de numéros sous forme de masque (bit n = numéro n).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NumberSet(u64);

impl NumberSet {
    pub fn from_numbers(numbers: &[u8]) -> Self {
        Self(numbers.iter().fold(0u64, |acc, &n| acc | (1u64 << n)))
    }

    pub fn contains(&self, n: u8) -> bool {
        n < 64 && self.0 & (1u64 << n) != 0
    }

    pub fn len(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn intersection_count(&self, other: &NumberSet) -> u32 {
        (self.0 & other.0).count_ones()
    }

    pub fn numbers(&self) -> Vec<u8> {
        (0..64u8).filter(|&n| self.contains(n)).collect()
    }
}

fn check_numbers(numbers: &[u8], what: &str) -> Result<()> {
    for &n in numbers {
        if n < 1 || n > BALL_MAX {
            return Err(invalid(format!("{what} : numéro {n} hors limites (1-{BALL_MAX})")));
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                return Err(invalid(format!("{what} : numéro en double {}", numbers[i])));
            }
        }
    }
    Ok(())
}

/// Sélection de numéros, triée par ordre croissant, immuable pendant une analyse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct NumberPool {
    numbers: Vec<u8>,
    mask: NumberSet,
}

impl NumberPool {
    pub fn new(numbers: &[u8]) -> Result<Self> {
        if numbers.is_empty() {
            return Err(invalid("sélection vide"));
        }
        check_numbers(numbers, "Sélection")?;
        let mut sorted = numbers.to_vec();
        sorted.sort_unstable();
        Ok(Self {
            mask: NumberSet::from_numbers(&sorted),
            numbers: sorted,
        })
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }

    pub fn mask(&self) -> NumberSet {
        self.mask
    }

    pub fn position_of(&self, n: u8) -> Option<usize> {
        self.numbers.binary_search(&n).ok()
    }
}

impl TryFrom<Vec<u8>> for NumberPool {
    type Error = CoverError;

    fn try_from(numbers: Vec<u8>) -> Result<Self> {
        NumberPool::new(&numbers)
    }
}

impl From<NumberPool> for Vec<u8> {
    fn from(pool: NumberPool) -> Self {
        pool.numbers
    }
}

/// Garantie visée : au moins `threshold` bons numéros sur un tirage de `draw_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuaranteeTarget {
    pub threshold: usize,
    pub draw_size: usize,
}

impl Default for GuaranteeTarget {
    fn default() -> Self {
        Self {
            threshold: 3,
            draw_size: DRAW_SIZE,
        }
    }
}

impl GuaranteeTarget {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.draw_size != DRAW_SIZE {
            return Err(invalid(format!(
                "taille de tirage {} non supportée (attendu {DRAW_SIZE})",
                self.draw_size
            )));
        }
        if self.threshold == 0 || self.threshold >= self.draw_size {
            return Err(invalid(format!(
                "seuil de garantie {} invalide (attendu 1..{})",
                self.threshold, self.draw_size
            )));
        }
        Ok(())
    }

    /// La sélection doit contenir au moins un tirage complet.
    pub fn check_pool(&self, pool: &NumberPool) -> Result<()> {
        self.validate()?;
        if pool.len() < self.draw_size {
            return Err(invalid(format!(
                "sélection de {} numéros, inférieure à la taille du tirage ({})",
                pool.len(),
                self.draw_size
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for GuaranteeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} sur {}", self.threshold, self.draw_size)
    }
}

/// Une grille jouée : numéros triés et leur masque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Grid {
    numbers: Vec<u8>,
    mask: NumberSet,
}

impl Grid {
    pub fn new(numbers: &[u8]) -> Result<Self> {
        if numbers.len() < DRAW_SIZE || numbers.len() > MAX_GRID_SIZE {
            return Err(invalid(format!(
                "grille de {} numéros (attendu {DRAW_SIZE}-{MAX_GRID_SIZE})",
                numbers.len()
            )));
        }
        check_numbers(numbers, "Grille")?;
        Ok(Self::from_sorted_unchecked(numbers))
    }

    /// Construit une grille à partir de numéros déjà validés.
    pub(crate) fn from_sorted_unchecked(numbers: &[u8]) -> Self {
        let mut sorted = numbers.to_vec();
        sorted.sort_unstable();
        Self {
            mask: NumberSet::from_numbers(&sorted),
            numbers: sorted,
        }
    }

    pub fn size(&self) -> usize {
        self.numbers.len()
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }

    pub fn mask(&self) -> NumberSet {
        self.mask
    }
}

impl TryFrom<Vec<u8>> for Grid {
    type Error = CoverError;

    fn try_from(numbers: Vec<u8>) -> Result<Self> {
        Grid::new(&numbers)
    }
}

impl From<Grid> for Vec<u8> {
    fn from(grid: Grid) -> Self {
        grid.numbers
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self
            .numbers
            .iter()
            .map(|n| format!("{:2}", n))
            .collect::<Vec<_>>()
            .join(" - ");
        write!(f, "{s}")
    }
}

/// Tirage : 5 boules et un numéro chance, ce dernier hors du problème de couverture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub balls: [u8; DRAW_SIZE],
    pub chance: u8,
}

impl Draw {
    pub fn mask(&self) -> NumberSet {
        NumberSet::from_numbers(&self.balls)
    }
}

pub fn validate_draw(balls: &[u8; DRAW_SIZE], chance: u8) -> Result<()> {
    check_numbers(balls, "Tirage")?;
    if chance < 1 || chance > CHANCE_MAX {
        return Err(invalid(format!("numéro chance {chance} hors limites (1-{CHANCE_MAX})")));
    }
    Ok(())
}
