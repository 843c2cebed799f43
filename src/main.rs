//! card-sockets - replays a card script and prints the emitted events
//!
//! Usage: `card-sockets [script.json]`. The script is read from stdin when no
//! path is given. Each event is printed as one JSON line.

use std::io::{self, Read, Write};
use std::path::Path;

use card_sockets::constants::settings::DEFAULT_LOG_FILTER;
use card_sockets::{ReplayScript, Replayer, SocketResult, SocketSettings};
use log::{error, info};

fn main() {
    let settings = SocketSettings::load_or_default(None);
    let filter = match &settings {
        Ok(settings) => settings.log_filter.clone(),
        Err(_) => DEFAULT_LOG_FILTER.to_string(),
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let result = settings.and_then(|settings| {
        SocketSettings::install(settings)?;
        run(std::env::args().nth(1))
    });
    if let Err(err) = result {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(path: Option<String>) -> SocketResult<()> {
    let script = match path {
        Some(path) => {
            info!("Loading script from {}", path);
            ReplayScript::load(Path::new(&path))?
        }
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            ReplayScript::from_json(&text)?
        }
    };

    let events = Replayer::new().run(&script)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for event in &events {
        serde_json::to_writer(&mut out, event)?;
        writeln!(out)?;
    }
    Ok(())
}
