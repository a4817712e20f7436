#![forbid(unsafe_code)]

//! Plays the Primordial Pit from a terminal against a running server.
//!
//! Usage: `pit [WALLET] [FISHERMAN]`, the wallet falls back to `PIT_WALLET`.

use std::{env, time::Duration};

use chrono::Utc;
use dotenvy::dotenv;
use eyre::WrapErr;
use log::{debug, warn};
use primordial_pit::{
    client::{PitClient, DEFAULT_SERVER},
    config::env_var,
    cooldown::{CooldownStatus, Mark},
    essence::EssenceRoll,
    generator::FishGenerator,
    models::{Rarity, FISHERMEN},
    session::{self, Fired, Outcome, Session},
    wallet::Wallet,
};
use rand::{rngs::StdRng, SeedableRng};
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    time::sleep,
};

const CAST_TIME: Duration = Duration::from_millis(1200);
const REEL_TIME: Duration = Duration::from_millis(1500);

type Input = Lines<BufReader<Stdin>>;

async fn read_line(input: &mut Input) -> eyre::Result<Option<String>> {
    Ok(input
        .next_line()
        .await
        .wrap_err("Could not read from stdin")?
        .map(|line| line.trim().to_lowercase()))
}

fn print_catches(session: &Session) {
    if session.catches().is_empty() {
        println!("Nothing caught yet.");
        return;
    }

    for fish in session.catches().recent() {
        println!("  {} {fish}", fish.fallback);
    }
    let hidden = session
        .catches()
        .len()
        .saturating_sub(session::VISIBLE_CATCHES);
    if hidden > 0 {
        println!("  ... and {hidden} older catches");
    }
}

fn print_summary(session: &Session) {
    let catches = session.catches().all();
    if catches.is_empty() {
        return;
    }

    let counts: Vec<_> = Rarity::ALL
        .iter()
        .map(|rarity| {
            let count = catches.iter().filter(|fish| fish.rarity == *rarity).count();
            format!("{count} {rarity}")
        })
        .collect();
    let score: u32 = catches.iter().map(|fish| fish.rarity.points()).sum();
    println!("Session total: {} ({score} points)", counts.join(", "));
}

fn print_cooldown(status: &CooldownStatus) {
    match status.reset_in_seconds {
        Some(seconds) => println!(
            "You've already cast today! Come back in {}.",
            humantime::format_duration(Duration::from_secs(seconds))
        ),
        None => println!("You've already cast today! Come back tomorrow."),
    }
}

/// Runs one cast from the line hitting the water to the fish landing or escaping.
async fn play_cast(
    server: &PitClient,
    session: &mut Session,
    generator: &FishGenerator,
    rng: &mut StdRng,
    input: &mut Input,
) -> eyre::Result<()> {
    println!("Casting...");
    sleep(CAST_TIME).await;

    let bite = session.line_landed(rng)?;
    println!("Waiting for a bite...");
    sleep(bite.after).await;

    let Fired::Bite { escape } = session.fire(bite) else {
        return Ok(());
    };
    println!("A fish is biting! Press Enter to reel in!");

    tokio::select! {
        line = read_line(input) => {
            line?;
            session.reel()?;
        }
        _ = sleep(escape.after) => {
            if session.fire(escape) == Fired::Escaped {
                println!("Too slow! The fish got away...");
            }
            return Ok(());
        }
    }

    println!("Reeling in...");
    sleep(REEL_TIME).await;

    match session.land(rng, generator, Utc::now())? {
        Outcome::Caught(fish) => {
            println!("You caught a {} {fish}!", fish.fallback);

            if let Err(err) = server.record_catch(session.wallet(), &fish).await {
                warn!("Could not record catch: {err}");
            }

            match server.roll_essence(session.wallet()).await {
                Ok(EssenceRoll { found: true, remaining }) => println!(
                    "A Primordial Essence glimmers in the net! ({remaining} left this week)"
                ),
                Ok(_) => {}
                Err(err) => warn!("Could not roll for essence: {err}"),
            }
        }
        Outcome::Escaped => println!("The line snapped, the fish escaped..."),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    pretty_env_logger::init_timed();
    dotenv().ok();

    let mut args = env::args().skip(1);
    let wallet = match args.next() {
        Some(wallet) => wallet,
        None => env_var("PIT_WALLET").wrap_err("Pass a wallet or set PIT_WALLET")?,
    };
    let wallet = Wallet::parse(&wallet)?;
    let fisherman = args.next().unwrap_or_else(|| "wolf".to_string());

    let server = PitClient::new(
        &env::var("PIT_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_string()),
    );
    let generator = FishGenerator::default();
    let mut rng = StdRng::from_entropy();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let mut session = Session::new(wallet);
    let fisherman = session.select_fisherman(&fisherman).wrap_err_with(|| {
        format!(
            "Fishermen: {}",
            FISHERMEN.keys().copied().collect::<Vec<_>>().join(", ")
        )
    })?;
    println!("Welcome to the Primordial Pit, {}!", fisherman.name);

    if let Err(err) = server.record_wallet(session.wallet()).await {
        warn!("Could not record wallet: {err}");
    }

    loop {
        println!("[Enter] cast  [log] catches  [mute] sound  [fisher <id>]  [quit]");
        let Some(line) = read_line(&mut input).await? else {
            break;
        };

        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            [] | ["cast"] => {}
            ["log"] => {
                print_catches(&session);
                continue;
            }
            ["mute"] => {
                let muted = session.toggle_mute();
                println!("Sound {}", if muted { "off" } else { "on" });
                continue;
            }
            ["fisher", id] => {
                match session.select_fisherman(id) {
                    Ok(fisherman) => println!("Now fishing as {}", fisherman.name),
                    Err(err) => println!("{err}"),
                }
                continue;
            }
            ["quit"] | ["q"] => break,
            _ => {
                println!("Unknown command");
                continue;
            }
        }

        // checked again before every cast, another terminal may have played
        let status = server.cooldown(session.wallet()).await;
        debug!("Cooldown status {status:?}");
        if !status.may_cast() {
            print_cooldown(&status);
            break;
        }

        match server.mark_played(session.wallet()).await {
            Ok(Mark::Recorded) | Ok(Mark::Unlimited) => {}
            Ok(Mark::AlreadyPlayed { reset_in_seconds }) => {
                print_cooldown(&CooldownStatus::cooling_down(reset_in_seconds));
                break;
            }
            Err(err) => {
                warn!("Could not mark cast: {err}");
                println!("The pit is unreachable right now, try again later.");
                continue;
            }
        }

        match session.begin_cast(&status) {
            Ok(()) => {}
            Err(session::Error::CooldownActive) => {
                print_cooldown(&status);
                break;
            }
            Err(err) => {
                println!("{err}");
                continue;
            }
        }

        play_cast(&server, &mut session, &generator, &mut rng, &mut input).await?;

        if !session.can_cast_again() {
            println!("That was today's cast. Come back tomorrow!");
            break;
        }
    }

    print_catches(&session);
    print_summary(&session);

    Ok(())
}
