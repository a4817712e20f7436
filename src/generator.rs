//! Weighted random catch generation.
//!
//! Generation is pure apart from the injected random source and timestamp,
//! which keeps it reproducible under a seeded [`rand::rngs::StdRng`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, Rng};

use crate::models::{Color, Fish, Rarity, Size, Special, Species, SPECIES};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Rarity table is empty")]
    EmptyTable,

    #[error("Rarity {0} has a weight of zero")]
    ZeroWeight(Rarity),

    #[error("Species list is empty")]
    NoSpecies,
}

/// Rarities with their weights, walked in a fixed order.
#[derive(Debug, Clone)]
pub struct RarityTable {
    entries: Vec<(Rarity, u32)>,
    total: u32,
}

impl Default for RarityTable {
    fn default() -> Self {
        Self {
            entries: vec![
                (Rarity::Common, 40),
                (Rarity::Uncommon, 30),
                (Rarity::Rare, 18),
                (Rarity::Epic, 9),
                (Rarity::Legendary, 3),
            ],
            total: 100,
        }
    }
}

impl RarityTable {
    pub fn new(entries: Vec<(Rarity, u32)>) -> Result<Self, Error> {
        if entries.is_empty() {
            return Err(Error::EmptyTable);
        }
        if let Some((rarity, _)) = entries.iter().find(|(_, weight)| *weight == 0) {
            return Err(Error::ZeroWeight(*rarity));
        }

        let total = entries.iter().map(|(_, weight)| weight).sum();
        Ok(Self { entries, total })
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn entries(&self) -> &[(Rarity, u32)] {
        &self.entries
    }

    pub fn chance(&self, rarity: Rarity) -> f64 {
        self.entries
            .iter()
            .filter(|(r, _)| *r == rarity)
            .map(|(_, weight)| *weight as f64 / self.total as f64)
            .sum()
    }

    /// Draws `r` in `[0, total)` and walks the entries subtracting weights
    /// until the remainder drops to zero or below.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Rarity {
        let mut remainder = rng.gen_range(0.0..self.total as f64);

        for (rarity, weight) in &self.entries {
            remainder -= *weight as f64;
            if remainder <= 0.0 {
                return *rarity;
            }
        }

        // only reachable through float rounding on the last entry
        self.entries[0].0
    }
}

/// Species grouped by rarity, computed once from the species list.
#[derive(Debug, Clone)]
pub struct SpeciesPool {
    all: Vec<Species>,
    by_rarity: HashMap<Rarity, Vec<Species>>,
}

impl Default for SpeciesPool {
    fn default() -> Self {
        Self::grouped(SPECIES.to_vec())
    }
}

impl SpeciesPool {
    pub fn new(all: Vec<Species>) -> Result<Self, Error> {
        if all.is_empty() {
            return Err(Error::NoSpecies);
        }

        Ok(Self::grouped(all))
    }

    fn grouped(all: Vec<Species>) -> Self {
        let mut by_rarity: HashMap<Rarity, Vec<Species>> = HashMap::new();
        for species in &all {
            by_rarity.entry(species.rarity).or_default().push(*species);
        }

        Self { all, by_rarity }
    }

    pub fn of(&self, rarity: Rarity) -> &[Species] {
        self.by_rarity
            .get(&rarity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Uniform pick among the species of `rarity`, or among all species when
    /// that rarity has none.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R, rarity: Rarity) -> Species {
        let pool = match self.of(rarity) {
            [] => self.all.as_slice(),
            pool => pool,
        };

        // both slices are non-empty
        *pool.choose(rng).unwrap_or(&self.all[0])
    }
}

#[derive(Debug, Clone, Default)]
pub struct FishGenerator {
    table: RarityTable,
    pool: SpeciesPool,
}

impl FishGenerator {
    pub fn new(table: RarityTable, pool: SpeciesPool) -> Self {
        Self { table, pool }
    }

    pub fn table(&self) -> &RarityTable {
        &self.table
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, caught_at: DateTime<Utc>) -> Fish {
        let rarity = self.table.roll(rng);
        let species = self.pool.choose(rng, rarity);

        let size = *Size::ALL.choose(rng).unwrap_or(&Size::Medium);
        let color = *Color::ALL.choose(rng).unwrap_or(&Color::Mossy);
        let special = roll_special(rng, rarity);
        let weight = roll_weight(rng, size);

        Fish {
            species: species.name.to_string(),
            image: species.image.to_string(),
            fallback: species.fallback.to_string(),
            rarity,
            size,
            color,
            special,
            weight: format!("{weight:.1} lbs"),
            caught_at,
        }
    }
}

pub fn roll_special<R: Rng + ?Sized>(rng: &mut R, rarity: Rarity) -> Special {
    if rng.gen_bool(rarity.special_chance()) {
        *Special::TRAITS.choose(rng).unwrap_or(&Special::Glowing)
    } else {
        Special::None
    }
}

/// `base + uniform(0, base)`, rounded to one decimal.
pub fn roll_weight<R: Rng + ?Sized>(rng: &mut R, size: Size) -> f64 {
    let base = size.base_weight();
    let weight = base + rng.gen::<f64>() * base;
    (weight * 10.0).round() / 10.0
}
