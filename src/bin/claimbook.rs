//! Line-oriented REPL entry point for the claimbook trading core.
//!
//! Each input line is `caller command args...`; `caller` identifies the
//! account issuing the command (the chat bot this core descends from reads
//! this from the sender's hostmask). State and claims are saved to disk
//! after every command that returns without error.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::Parser;

use claimbook::{dispatch, Config, State, TradingEngine};

#[derive(Parser)]
#[command(name = "claimbook")]
#[command(about = "Deterministic binary prediction-market order book")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error loading config: {e}");
            process::exit(1);
        }
    };

    let state_path = PathBuf::from(&config.bot.state_path);
    let claims_path = PathBuf::from(&config.bot.claims_path);

    let (users, order_book, positions, trades) = match claimbook::load_state(&state_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error loading state: {e}");
            process::exit(1);
        }
    };
    let claims = match claimbook::load_claims(&claims_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error loading claims: {e}");
            process::exit(1);
        }
    };

    let mut state = State {
        engine: TradingEngine { order_book, positions, trades },
        users,
        claims,
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("> ");
    let _ = stdout.flush();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut tokens = line.split_whitespace();
        let Some(caller) = tokens.next() else {
            print!("> ");
            let _ = stdout.flush();
            continue;
        };
        let Some(cmd) = tokens.next() else {
            print!("> ");
            let _ = stdout.flush();
            continue;
        };
        let args: Vec<String> = tokens.map(str::to_string).collect();
        let today = today_utc();

        match dispatch(&mut state, &config, cmd, &args, &caller.to_string(), today) {
            Ok(message) => {
                println!("{message}");
                if let Err(e) = claimbook::save_state(
                    &state_path,
                    &state.users,
                    &state.engine.order_book,
                    &state.engine.positions,
                    &state.engine.trades,
                ) {
                    eprintln!("error saving state: {e}");
                }
                if let Err(e) = claimbook::save_claims(&claims_path, &state.claims) {
                    eprintln!("error saving claims: {e}");
                }
            }
            Err(e) => println!("error: {e}"),
        }
        print!("> ");
        let _ = stdout.flush();
    }
}

fn today_utc() -> NaiveDate {
    chrono::Local::now().date_naive()
}
