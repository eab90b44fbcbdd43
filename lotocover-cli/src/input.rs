use anyhow::{bail, Context, Result};

use lotocover_core::models::{Grid, NumberPool};

/// "1,2,3" ou "1 2 3".
pub fn parse_numbers(s: &str) -> Result<Vec<u8>> {
    let numbers = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<u8>()
                .with_context(|| format!("Numéro invalide : '{}'", t))
        })
        .collect::<Result<Vec<u8>>>()?;
    if numbers.is_empty() {
        bail!("Aucun numéro dans '{}'", s);
    }
    Ok(numbers)
}

pub fn parse_pool(numbers: &[u8]) -> Result<NumberPool> {
    NumberPool::new(numbers).with_context(|| format!("Sélection invalide : {:?}", numbers))
}

/// Grilles séparées par ';' : "1 2 3 4 5; 6 7 8 9 10".
pub fn parse_grids(s: &str) -> Result<Vec<Grid>> {
    let grids = s
        .split(';')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .enumerate()
        .map(|(i, g)| {
            let numbers = parse_numbers(g)?;
            Grid::new(&numbers).with_context(|| format!("Grille {} invalide : '{}'", i + 1, g))
        })
        .collect::<Result<Vec<Grid>>>()?;
    if grids.is_empty() {
        bail!("Aucune grille fournie");
    }
    Ok(grids)
}
