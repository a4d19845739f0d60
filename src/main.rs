//! Realm Chronicle - command-line front end
//!
//! Starts games, advances them headless, or plays them one typed command at a
//! time. Worlds live in a three-slot save file between invocations.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use realm_chronicle::aggregate::output::ChronicleExport;
use realm_chronicle::aggregate::simulation::refresh_menu;
use realm_chronicle::aggregate::systems::generation::{build_initial_state, NewGameParams};
use realm_chronicle::command::resolver::{CommandResolver, HELP};
use realm_chronicle::command::CommandOutcome;
use realm_chronicle::core::config::{set_config, SimConfig};
use realm_chronicle::core::error::{ChronicleError, Result};
use realm_chronicle::core::rng::GameRng;
use realm_chronicle::core::types::{Gender, HouseId};
use realm_chronicle::data::loader::{load_data_dir, RealmData};
use realm_chronicle::persist::SaveFile;
use realm_chronicle::Session;

/// Dynastic chronicle of a medieval realm
#[derive(Parser, Debug)]
#[command(name = "realm-chronicle")]
#[command(about = "Turn-based dynastic simulation with canonical history")]
struct Cli {
    /// Directory holding realm.toml and canon.toml
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Save file with up to three slots
    #[arg(long, default_value = "saves.json")]
    saves: PathBuf,

    /// Optional TOML file overriding simulation constants
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Start a new game in a save slot
    New {
        /// House the player is born into
        #[arg(long)]
        house: String,
        #[arg(long, value_enum, default_value_t = GenderArg::Male)]
        gender: GenderArg,
        /// Seed for world generation; defaults to the start turn's seed
        #[arg(long)]
        seed: Option<u32>,
        #[arg(long, default_value_t = 1)]
        slot: u8,
    },
    /// Advance a saved game headless
    Run {
        turns: u32,
        #[arg(long, default_value_t = 1)]
        slot: u8,
    },
    /// Play a saved game one command at a time
    Play {
        #[arg(long, default_value_t = 1)]
        slot: u8,
    },
    /// List save slots
    Saves,
    /// Print the chronicle of a saved game
    Chronicle {
        #[arg(long, default_value_t = 1)]
        slot: u8,
        /// Most recent entries to print
        #[arg(long, default_value_t = 40)]
        limit: usize,
        /// Print the whole export as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GenderArg {
    Male,
    Female,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("realm_chronicle=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(path) = &cli.config {
        let config = SimConfig::load(path)?;
        set_config(config).map_err(|_| ChronicleError::Config("configuration already set".into()))?;
        tracing::info!(path = %path.display(), "Config loaded");
    }

    match cli.command {
        Action::New { house, gender, seed, slot } => {
            let data = load_data_dir(&cli.data_dir)?;
            new_game(data, &cli.saves, HouseId::new(house), gender.into(), seed, slot)
        }
        Action::Run { turns, slot } => {
            let data = load_data_dir(&cli.data_dir)?;
            run_turns(data, &cli.saves, turns, slot)
        }
        Action::Play { slot } => {
            let data = load_data_dir(&cli.data_dir)?;
            play(data, &cli.saves, slot)
        }
        Action::Saves => {
            for line in SaveFile::load(&cli.saves)?.describe() {
                println!("{}", line);
            }
            Ok(())
        }
        Action::Chronicle { slot, limit, json } => {
            let saves = SaveFile::load(&cli.saves)?;
            let export = ChronicleExport::new(&saves.slot(slot)?.state);
            if json {
                println!("{}", export.to_json());
            } else {
                println!("{}\n", export.summary());
                println!("{}", export.render_entries(limit));
            }
            Ok(())
        }
    }
}

fn new_game(data: RealmData, saves_path: &Path, house: HouseId, gender: Gender, seed: Option<u32>, slot: u8) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => GameRng::new(seed),
        None => GameRng::for_turn(1),
    };
    let params = NewGameParams { house_id: house, gender };
    let mut world = build_initial_state(data.gazetteer, &data.canon, &params, &mut rng)?;
    refresh_menu(&mut world);

    let mut saves = SaveFile::load(saves_path)?;
    saves.store(slot, &world)?;
    saves.write(saves_path)?;

    let export = ChronicleExport::new(&world);
    println!("{}", export.summary());
    for line in world.narration.recent(10) {
        println!("  {}", line.text);
    }
    Ok(())
}

fn open_session(data: RealmData, saves: &SaveFile, slot: u8) -> Result<Session> {
    Session::from_saved(&saves.slot(slot)?.state, data.canon)
}

fn run_turns(data: RealmData, saves_path: &Path, turns: u32, slot: u8) -> Result<()> {
    let mut saves = SaveFile::load(saves_path)?;
    let mut session = open_session(data, &saves, slot)?;

    for _ in 0..turns {
        match session.end_turn() {
            Ok(report) => println!("{}", report.summary()),
            Err(ChronicleError::GameOver(reason)) => {
                println!("The chronicle ends: {}", reason);
                break;
            }
            Err(e) => return Err(e),
        }
    }

    saves.store(slot, session.state())?;
    saves.write(saves_path)?;
    println!("{}", ChronicleExport::new(session.state()).summary());
    Ok(())
}

fn play(data: RealmData, saves_path: &Path, slot: u8) -> Result<()> {
    let mut saves = SaveFile::load(saves_path)?;
    let mut session = open_session(data, &saves, slot)?;
    let mut shown = session.state().narration.pushed();

    println!("{}", ChronicleExport::new(session.state()).summary());
    println!("Type 'help' for commands, 'save' to save, 'quit' to leave.\n");

    let stdin = io::stdin();
    loop {
        print_menu(&session);
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        match input {
            "" => continue,
            "quit" | "q" => break,
            "help" | "h" => {
                println!("{}", HELP);
                continue;
            }
            "save" => {
                saves.store(slot, session.state())?;
                saves.write(saves_path)?;
                println!("Saved to slot {}.", slot);
                continue;
            }
            "chronicle" => {
                println!("{}", ChronicleExport::new(session.state()).render_entries(15));
                continue;
            }
            _ => {}
        }

        let command = match CommandResolver::new(session.state()).resolve(input) {
            Ok(command) => command,
            Err(reason) => {
                println!("{}", reason);
                continue;
            }
        };
        if let CommandOutcome::Rejected { reason } = session.execute(&command) {
            tracing::debug!(%reason, "Rejected");
        }
        shown = print_narration(&session, shown);
    }

    saves.store(slot, session.state())?;
    saves.write(saves_path)?;
    Ok(())
}

/// Prints narration lines added since `shown`
fn print_narration(session: &Session, shown: u64) -> u64 {
    let feed = &session.state().narration;
    for line in feed.since(shown) {
        println!("  {}", line.text);
    }
    feed.pushed()
}

fn print_menu(session: &Session) {
    let world = session.state();
    let options: Vec<String> = world.ui.menu.iter().map(|m| format!("{:?}", m)).collect();
    println!("\n[{}] {}", world.date, options.join(" | "));
}
