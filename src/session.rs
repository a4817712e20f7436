//! Client-side game flow.
//!
//! A [`Session`] owns everything one player has going on: the wallet, the
//! chosen fisherman, the catch log and the current phase of a cast. Phases
//! advance through timers; each timer carries the generation it was armed in,
//! so a timer that fires after the phase moved on is ignored.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::{
    cooldown::CooldownStatus,
    generator::FishGenerator,
    models::{Fish, Fisherman, FISHERMEN},
    wallet::Wallet,
};

/// Entries shown in the catch log; older catches are kept but not shown.
pub const VISIBLE_CATCHES: usize = 20;
pub const CATCH_CHANCE: f64 = 0.9;
pub const BITE_WINDOW: Duration = Duration::from_secs(3);
const MIN_BITE_WAIT_MS: u64 = 3_000;
const MAX_BITE_WAIT_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("No fisherman called {0}")]
    UnknownFisherman(String),

    #[error("Pick a fisherman first")]
    NoFisherman,

    #[error("You've already cast today! Come back tomorrow.")]
    CooldownActive,

    #[error("Cannot {action} while {phase:?}")]
    WrongPhase { action: &'static str, phase: Phase },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Casting,
    Waiting,
    Bite,
    Reeling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// The fish bites.
    Bite,
    /// The fish gets away because nobody reeled in.
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub kind: TimerKind,
    pub after: Duration,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Caught(Fish),
    Escaped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fired {
    /// The timer was armed for a phase that is already over.
    Stale,
    Bite { escape: Timer },
    Escaped,
}

#[derive(Debug, Clone, Default)]
pub struct CatchLog {
    catches: Vec<Fish>,
}

impl CatchLog {
    pub fn push(&mut self, fish: Fish) {
        self.catches.push(fish);
    }

    pub fn len(&self) -> usize {
        self.catches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catches.is_empty()
    }

    pub fn latest(&self) -> Option<&Fish> {
        self.catches.last()
    }

    /// The most recent catches, newest first.
    pub fn recent(&self) -> impl Iterator<Item = &Fish> {
        self.catches.iter().rev().take(VISIBLE_CATCHES)
    }

    pub fn all(&self) -> &[Fish] {
        &self.catches
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    wallet: Wallet,
    fisherman: Option<Fisherman>,
    catches: CatchLog,
    muted: bool,
    unlimited: bool,
    phase: Phase,
    generation: u64,
}

impl Session {
    pub fn new(wallet: Wallet) -> Self {
        Self {
            wallet,
            fisherman: None,
            catches: CatchLog::default(),
            muted: false,
            unlimited: false,
            phase: Phase::Idle,
            generation: 0,
        }
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn fisherman(&self) -> Option<&Fisherman> {
        self.fisherman.as_ref()
    }

    pub fn catches(&self) -> &CatchLog {
        &self.catches
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_unlimited(&self) -> bool {
        self.unlimited
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn select_fisherman(&mut self, id: &str) -> Result<&Fisherman, Error> {
        let fisherman = FISHERMEN
            .get(id)
            .ok_or_else(|| Error::UnknownFisherman(id.to_string()))?;

        self.fisherman = Some(*fisherman);
        self.phase = Phase::Idle;
        self.generation += 1;

        Ok(fisherman)
    }

    fn require(&self, phase: Phase, action: &'static str) -> Result<(), Error> {
        if self.phase != phase {
            return Err(Error::WrongPhase {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    fn arm(&mut self, kind: TimerKind, after: Duration) -> Timer {
        Timer {
            kind,
            after,
            generation: self.generation,
        }
    }

    /// Starts a cast if the cooldown check allows it.
    pub fn begin_cast(&mut self, status: &CooldownStatus) -> Result<(), Error> {
        self.require(Phase::Idle, "cast")?;
        if self.fisherman.is_none() {
            return Err(Error::NoFisherman);
        }

        self.unlimited = status.unlimited;
        if !status.may_cast() {
            return Err(Error::CooldownActive);
        }

        self.phase = Phase::Casting;
        self.generation += 1;
        Ok(())
    }

    /// The line hit the water; returns the timer for the bite.
    pub fn line_landed<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Timer, Error> {
        self.require(Phase::Casting, "wait for a bite")?;

        self.phase = Phase::Waiting;
        let wait = rng.gen_range(MIN_BITE_WAIT_MS..=MAX_BITE_WAIT_MS);
        Ok(self.arm(TimerKind::Bite, Duration::from_millis(wait)))
    }

    pub fn fire(&mut self, timer: Timer) -> Fired {
        if timer.generation != self.generation {
            return Fired::Stale;
        }

        match (timer.kind, self.phase) {
            (TimerKind::Bite, Phase::Waiting) => {
                self.phase = Phase::Bite;
                Fired::Bite {
                    escape: self.arm(TimerKind::Escape, BITE_WINDOW),
                }
            }
            (TimerKind::Escape, Phase::Bite) => {
                self.phase = Phase::Idle;
                self.generation += 1;
                Fired::Escaped
            }
            _ => Fired::Stale,
        }
    }

    pub fn reel(&mut self) -> Result<(), Error> {
        self.require(Phase::Bite, "reel in")?;

        self.phase = Phase::Reeling;
        self.generation += 1;
        Ok(())
    }

    /// Finishes reeling in: most of the time the fish is caught and logged.
    pub fn land<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        generator: &FishGenerator,
        now: DateTime<Utc>,
    ) -> Result<Outcome, Error> {
        self.require(Phase::Reeling, "land a fish")?;
        self.phase = Phase::Idle;

        if !rng.gen_bool(CATCH_CHANCE) {
            return Ok(Outcome::Escaped);
        }

        let fish = generator.generate(rng, now);
        self.catches.push(fish.clone());
        Ok(Outcome::Caught(fish))
    }

    /// Only unlimited wallets get another cast after the first one.
    pub fn can_cast_again(&self) -> bool {
        self.phase == Phase::Idle && self.unlimited
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn session() -> Session {
        let mut session =
            Session::new(Wallet::parse("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU").unwrap());
        session.select_fisherman("wolf").unwrap();
        session
    }

    fn biting(session: &mut Session, rng: &mut StdRng) -> Timer {
        session.begin_cast(&CooldownStatus::ready()).unwrap();
        let bite = session.line_landed(rng).unwrap();
        match session.fire(bite) {
            Fired::Bite { escape } => escape,
            other => panic!("expected a bite, got {other:?}"),
        }
    }

    #[test]
    fn unknown_fisherman() {
        let mut session = session();
        assert_eq!(
            session.select_fisherman("kraken").unwrap_err(),
            Error::UnknownFisherman("kraken".to_string())
        );
        assert_eq!(session.fisherman().map(|f| f.id), Some("wolf"));
    }

    #[test]
    fn needs_a_fisherman_to_cast() {
        let mut session =
            Session::new(Wallet::parse("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU").unwrap());
        assert_eq!(
            session.begin_cast(&CooldownStatus::ready()),
            Err(Error::NoFisherman)
        );
    }

    #[test]
    fn cooldown_blocks_the_cast() {
        let mut session = session();
        assert_eq!(
            session.begin_cast(&CooldownStatus::cooling_down(Some(60))),
            Err(Error::CooldownActive)
        );
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn full_cast_catches_a_fish() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = session();

        session.begin_cast(&CooldownStatus::ready()).unwrap();
        assert_eq!(session.phase(), Phase::Casting);

        let bite = session.line_landed(&mut rng).unwrap();
        assert_eq!(bite.kind, TimerKind::Bite);
        assert!(bite.after >= Duration::from_secs(3) && bite.after <= Duration::from_secs(10));
        assert_eq!(session.phase(), Phase::Waiting);

        let Fired::Bite { escape } = session.fire(bite) else {
            panic!("expected a bite");
        };
        assert_eq!(escape.after, BITE_WINDOW);

        session.reel().unwrap();
        assert_eq!(session.fire(escape), Fired::Stale);
        assert_eq!(session.phase(), Phase::Reeling);

        let outcome = session
            .land(&mut rng, &FishGenerator::default(), Utc::now())
            .unwrap();
        assert_eq!(session.phase(), Phase::Idle);
        match outcome {
            Outcome::Caught(fish) => assert_eq!(session.catches().latest(), Some(&fish)),
            Outcome::Escaped => assert!(session.catches().is_empty()),
        }
        assert!(!session.can_cast_again());
    }

    #[test]
    fn slow_reel_lets_the_fish_escape() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = session();
        let escape = biting(&mut session, &mut rng);

        assert_eq!(session.fire(escape), Fired::Escaped);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(matches!(
            session.reel(),
            Err(Error::WrongPhase {
                phase: Phase::Idle,
                ..
            })
        ));
    }

    #[test]
    fn timers_from_an_old_cast_are_ignored() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = session();
        session.begin_cast(&CooldownStatus::unlimited()).unwrap();
        let old_bite = session.line_landed(&mut rng).unwrap();

        // switching fisherman resets the cast
        session.select_fisherman("golden-pirate").unwrap();
        assert_eq!(session.fire(old_bite), Fired::Stale);

        session.begin_cast(&CooldownStatus::unlimited()).unwrap();
        session.line_landed(&mut rng).unwrap();
        assert_eq!(session.fire(old_bite), Fired::Stale);
        assert_eq!(session.phase(), Phase::Waiting);
    }

    #[test]
    fn cannot_cast_twice_at_once() {
        let mut session = session();
        session.begin_cast(&CooldownStatus::unlimited()).unwrap();
        assert_eq!(
            session.begin_cast(&CooldownStatus::unlimited()),
            Err(Error::WrongPhase {
                action: "cast",
                phase: Phase::Casting
            })
        );
    }

    #[test]
    fn unlimited_wallets_keep_fishing() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut session = session();
        let generator = FishGenerator::default();

        for _ in 0..40 {
            session.begin_cast(&CooldownStatus::unlimited()).unwrap();
            let bite = session.line_landed(&mut rng).unwrap();
            session.fire(bite);
            session.reel().unwrap();
            session.land(&mut rng, &generator, Utc::now()).unwrap();
            assert!(session.can_cast_again());
        }

        let caught = session.catches().len();
        assert!(caught > 20, "caught only {caught} of 40");
        assert_eq!(session.catches().recent().count(), VISIBLE_CATCHES);
        assert_eq!(session.catches().recent().next(), session.catches().latest());
        assert_eq!(session.catches().all().len(), caught);
        assert_eq!(session.catches().all().last(), session.catches().latest());
    }

    #[test]
    fn mute_toggles() {
        let mut session = session();
        assert!(!session.is_muted());
        assert!(session.toggle_mute());
        assert!(!session.toggle_mute());
    }
}
