#![forbid(unsafe_code)]

//! Simulates many catches and prints how often each rarity, species and trait shows up.

use std::{collections::BTreeMap, env};

use chrono::Utc;
use eyre::WrapErr;
use primordial_pit::{
    generator::FishGenerator,
    models::{Rarity, Special},
};
use rand::{rngs::StdRng, SeedableRng};

const DEFAULT_TRIALS: u32 = 100_000;

fn main() -> eyre::Result<()> {
    pretty_env_logger::init_timed();

    let trials = match env::args().nth(1) {
        Some(trials) => trials
            .parse::<u32>()
            .wrap_err_with(|| format!("{trials:?} is not a number of trials"))?,
        None => DEFAULT_TRIALS,
    };

    let mut rng = match env::var("SEED").ok() {
        Some(seed) => StdRng::seed_from_u64(seed.parse().wrap_err("SEED is not a number")?),
        None => StdRng::from_entropy(),
    };

    let generator = FishGenerator::default();
    let now = Utc::now();

    let mut rarities: BTreeMap<Rarity, u32> = BTreeMap::new();
    let mut species: BTreeMap<String, u32> = BTreeMap::new();
    let mut specials: BTreeMap<Rarity, u32> = BTreeMap::new();
    let mut points = 0u64;

    for _ in 0..trials {
        let fish = generator.generate(&mut rng, now);
        *rarities.entry(fish.rarity).or_default() += 1;
        *species.entry(fish.species).or_default() += 1;
        if fish.special != Special::None {
            *specials.entry(fish.rarity).or_default() += 1;
        }
        points += fish.rarity.points() as u64;
    }

    println!("Caught {trials} fishes");
    println!("Average score: {:.3}", points as f64 / trials.max(1) as f64);
    println!();
    println!("{:<10} {:>8} {:>8} {:>8}", "rarity", "seen", "target", "special");
    for rarity in Rarity::ALL {
        let seen = rarities.get(&rarity).copied().unwrap_or_default();
        let with_trait = specials.get(&rarity).copied().unwrap_or_default();
        println!(
            "{:<10} {:>7.2}% {:>7.2}% {:>7.2}%",
            rarity.to_string(),
            seen as f64 / trials.max(1) as f64 * 100.0,
            generator.table().chance(rarity) * 100.0,
            with_trait as f64 / seen.max(1) as f64 * 100.0,
        );
    }

    println!();
    for (name, count) in species {
        println!("{name:<22} {count:>8}");
    }

    Ok(())
}
