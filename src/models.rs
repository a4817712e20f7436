use std::fmt::Display;

use chrono::{DateTime, Utc};
use phf::phf_ordered_map;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    /// Chance that a catch of this rarity carries a special trait.
    pub fn special_chance(self) -> f64 {
        match self {
            Rarity::Legendary => 0.8,
            Rarity::Epic => 0.5,
            Rarity::Rare => 0.3,
            Rarity::Common | Rarity::Uncommon => 0.1,
        }
    }

    /// Leaderboard points for a catch of this rarity.
    pub fn points(self) -> u32 {
        match self {
            Rarity::Common => 1,
            Rarity::Uncommon => 2,
            Rarity::Rare => 5,
            Rarity::Epic => 10,
            Rarity::Legendary => 25,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Rarity::Common => "#aaa",
            Rarity::Uncommon => "#2ecc71",
            Rarity::Rare => "#3498db",
            Rarity::Epic => "#9b59b6",
            Rarity::Legendary => "#ffd700",
        }
    }
}

impl Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    Tiny,
    Small,
    Medium,
    Large,
    Massive,
}

impl Size {
    pub const ALL: [Size; 5] = [Size::Tiny, Size::Small, Size::Medium, Size::Large, Size::Massive];

    /// Minimum weight in pounds; a catch weighs up to twice this.
    pub fn base_weight(self) -> f64 {
        match self {
            Size::Tiny => 0.5,
            Size::Small => 2.0,
            Size::Medium => 5.0,
            Size::Large => 15.0,
            Size::Massive => 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Shadowy,
    Bloody,
    Mossy,
    Ashen,
    Golden,
    Cursed,
    Ancient,
}

impl Color {
    pub const ALL: [Color; 7] = [
        Color::Shadowy,
        Color::Bloody,
        Color::Mossy,
        Color::Ashen,
        Color::Golden,
        Color::Cursed,
        Color::Ancient,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Special {
    None,
    Glowing,
    Spectral,
    Corrupted,
    Blessed,
    Enchanted,
}

impl Special {
    /// Every trait a fish can actually carry, without the `None` sentinel.
    pub const TRAITS: [Special; 5] = [
        Special::Glowing,
        Special::Spectral,
        Special::Corrupted,
        Special::Blessed,
        Special::Enchanted,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Species {
    pub name: &'static str,
    pub image: &'static str,
    pub fallback: &'static str,
    pub rarity: Rarity,
}

impl Species {
    pub const fn new(
        name: &'static str,
        image: &'static str,
        fallback: &'static str,
        rarity: Rarity,
    ) -> Self {
        Self {
            name,
            image,
            fallback,
            rarity,
        }
    }
}

pub static SPECIES: [Species; 10] = [
    Species::new("Goblin Guppy", "fish-goblin-guppy.png", "🐟", Rarity::Common),
    Species::new("Orc Bass", "fish-orc-bass.png", "🐠", Rarity::Common),
    Species::new("Skeleton Fish", "fish-skeleton-fish.png", "💀", Rarity::Uncommon),
    Species::new("Cursed Carp", "fish-cursed-carp.png", "👻", Rarity::Uncommon),
    Species::new("Dragon Eel", "fish-dragon-eel.png", "🐉", Rarity::Rare),
    Species::new("Phantom Pike", "fish-phantom-pike.png", "👁️", Rarity::Rare),
    Species::new("Ancient Angler", "fish-ancient-angler.png", "🦑", Rarity::Epic),
    Species::new("Demon Trout", "fish-demon-trout.png", "😈", Rarity::Epic),
    Species::new(
        "Primordial Leviathan",
        "fish-primordial-leviathan.png",
        "🐲",
        Rarity::Legendary,
    ),
    Species::new("Golden Kraken", "fish-golden-kraken.png", "🦈", Rarity::Legendary),
];

/// A single catch. Created once by the generator and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fish {
    pub species: String,
    pub image: String,
    pub fallback: String,
    pub rarity: Rarity,
    pub size: Size,
    pub color: Color,
    pub special: Special,
    pub weight: String,
    #[serde(rename = "timestamp")]
    pub caught_at: DateTime<Utc>,
}

impl Display for Fish {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} {} ({}, {:?}, {})",
            self.color, self.species, self.rarity, self.size, self.weight
        )?;

        if self.special != Special::None {
            write!(f, " [{:?}]", self.special)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fisherman {
    pub id: &'static str,
    pub name: &'static str,
    pub image: &'static str,
}

pub static FISHERMEN: phf::OrderedMap<&'static str, Fisherman> = phf_ordered_map! {
    "wolf" => Fisherman { id: "wolf", name: "Wolf", image: "fisherman1.jpg" },
    "golden-pirate" => Fisherman { id: "golden-pirate", name: "Golden Pirate", image: "fisherman2.jpg" },
    "majestic-beard" => Fisherman { id: "majestic-beard", name: "Majestic Beard", image: "fisherman3.jpg" },
};
