/// Load the UFC CSV sources once and answer one query per invocation:
/// fighter table filters, event cards, fight details and the lookups behind them.
use std::error::Error;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod io;
mod preprocess;
mod query;
mod store;

use config::DataPaths;
use preprocess::{cm_to_feet_inches, format_match_time, kg_to_lbs, Division, Fight, Fighter, Outcome, Stance};
use query::{
    events_at_location, filter_event_groups, filter_fighters, fights_for_event, find_fight,
    group_events, search_opponents, sort_by, EventFilter, EventGroup, FighterFilter,
    DEFAULT_OPPONENT_LIMIT,
};
use store::RecordStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "Query the UFC fighters, events and fights dataset", long_about = None)]
struct Cli {
    /// Directory holding the CSV files
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Override the fighter details file
    #[arg(long, global = true)]
    fighters_file: Option<PathBuf>,

    /// Override the event details file
    #[arg(long, global = true)]
    events_file: Option<PathBuf>,

    /// Override the fight details file
    #[arg(long, global = true)]
    fights_file: Option<PathBuf>,

    /// Override the combined bout export
    #[arg(long, global = true)]
    bouts_file: Option<PathBuf>,

    /// Override the location coordinates file
    #[arg(long, global = true)]
    locations_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collection sizes and fighters per division
    Summary,
    /// Filter and sort the fighter table
    Fighters(FighterArgs),
    /// One fighter's profile
    Fighter {
        id: String,
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// List events, grouped from the bout rows
    Events(EventArgs),
    /// One event card and its fights
    Event {
        id: String,
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// One fight's statistics
    Fight {
        id: String,
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Divisions present in the dataset
    Divisions,
    /// Stances present in the dataset
    Stances,
    /// Search opponents to compare a fighter against
    Opponents {
        id: String,
        #[arg(default_value = "")]
        query: String,
        #[arg(long, default_value_t = DEFAULT_OPPONENT_LIMIT)]
        limit: usize,
    },
}

#[derive(Args, Debug)]
struct FighterArgs {
    /// Substring of name or nickname
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    division: Option<Division>,
    #[arg(long)]
    stance: Option<Stance>,
    #[arg(long)]
    min_win_rate: Option<u32>,
    #[arg(long)]
    max_win_rate: Option<u32>,
    #[arg(long)]
    min_age: Option<u32>,
    #[arg(long)]
    max_age: Option<u32>,
    /// Height bounds in cm
    #[arg(long)]
    min_height: Option<f64>,
    #[arg(long)]
    max_height: Option<f64>,
    /// Weight bounds in kg
    #[arg(long)]
    min_weight: Option<f64>,
    #[arg(long)]
    max_weight: Option<f64>,
    /// Column to sort by (name, age, winRate, weight, ...)
    #[arg(long)]
    sort: Option<String>,
    #[arg(long, action = ArgAction::SetTrue)]
    desc: bool,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

impl FighterArgs {
    fn criteria(&self) -> FighterFilter {
        FighterFilter {
            search: self.search.clone(),
            division: self.division,
            stance: self.stance,
            win_rate_min: self.min_win_rate,
            win_rate_max: self.max_win_rate,
            age_min: self.min_age,
            age_max: self.max_age,
            height_min: self.min_height,
            height_max: self.max_height,
            weight_min: self.min_weight,
            weight_max: self.max_weight,
        }
    }
}

#[derive(Args, Debug)]
struct EventArgs {
    /// Substring of location, city, country or date
    #[arg(short, long)]
    search: Option<String>,
    /// Earliest date (YYYY-MM-DD), inclusive
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Latest date (YYYY-MM-DD), inclusive
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Only events at this exact location
    #[arg(long)]
    location: Option<String>,
    /// date or fights
    #[arg(long, default_value = "date")]
    sort: String,
    #[arg(long, action = ArgAction::SetTrue)]
    asc: bool,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

fn data_paths(cli: &Cli) -> DataPaths {
    let mut paths = DataPaths::in_dir(&cli.data_dir);
    if let Some(p) = &cli.fighters_file {
        paths.fighters = p.clone();
    }
    if let Some(p) = &cli.events_file {
        paths.events = p.clone();
    }
    if let Some(p) = &cli.fights_file {
        paths.fights = p.clone();
    }
    if let Some(p) = &cli.bouts_file {
        paths.bouts = p.clone();
    }
    if let Some(p) = &cli.locations_file {
        paths.locations = p.clone();
    }
    paths
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_fighter_table(fighters: &[&Fighter]) {
    println!(
        "{:<12} {:<28} {:<20} {:>9} {:>5} {:>4} {:<18} {:<9} {:>7} {:>8}",
        "ID", "NAME", "NICKNAME", "RECORD", "WIN%", "AGE", "DIVISION", "STANCE", "HEIGHT", "WEIGHT"
    );
    for f in fighters {
        println!(
            "{:<12} {:<28} {:<20} {:>9} {:>5} {:>4} {:<18} {:<9} {:>7} {:>8}",
            f.id,
            f.name,
            f.nickname,
            format!("{}-{}-{}", f.wins, f.losses, f.draws),
            f.win_rate,
            f.age.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
            f.division,
            f.stance,
            cm_to_feet_inches(f.height_cm),
            kg_to_lbs(f.weight_kg),
        );
    }
}

fn print_fighter(f: &Fighter) {
    println!("{} ({})", f.name, f.id);
    if !f.nickname.is_empty() {
        println!("  \"{}\"", f.nickname);
    }
    println!("  Record     {}-{}-{} ({}% wins)", f.wins, f.losses, f.draws, f.win_rate);
    println!("  Division   {}", f.division);
    println!("  Stance     {}", f.stance);
    println!(
        "  Age        {}",
        f.age.map(|a| a.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("  Height     {}", cm_to_feet_inches(f.height_cm));
    println!("  Weight     {}", kg_to_lbs(f.weight_kg));
    println!("  Reach      {:.1} cm", f.reach_cm);
    println!("  SLpM {:>6.2}   Str. Acc {:>5.1}   SApM {:>6.2}   Str. Def {:>5.1}", f.splm, f.str_acc, f.sapm, f.str_def);
    println!("  TD Avg {:>4.2}   TD Acc {:>7.1}   TD Def {:>4.1}   Sub Avg {:>5.2}", f.td_avg, f.td_avg_acc, f.td_def, f.sub_avg);
}

fn print_event_table(groups: &[&EventGroup<'_>]) {
    println!("{:<18} {:<12} {:>6}  {}", "EVENT", "DATE", "FIGHTS", "LOCATION");
    for g in groups {
        println!("{:<18} {:<12} {:>6}  {}", g.event_id, g.date, g.fight_count, g.location);
    }
}

fn winner_label(fight: &Fight) -> &str {
    match fight.outcome() {
        Outcome::Red => fight.red.name.as_str(),
        Outcome::Blue => fight.blue.name.as_str(),
        Outcome::NoWinner => "-",
    }
}

fn print_fight(fight: &Fight) {
    println!("{} vs {} ({})", fight.red.name, fight.blue.name, fight.fight_id);
    println!("  {} | {}", fight.event_name, fight.division);
    println!(
        "  {} | Round {} - {} | Winner: {}",
        fight.method,
        fight.finish_round,
        format_match_time(fight.match_time_sec),
        winner_label(fight)
    );
    let (r, b) = (&fight.red.stats, &fight.blue.stats);
    let rows: [(&str, String, String); 8] = [
        ("Knockdowns", r.kd.to_string(), b.kd.to_string()),
        ("Sig. strikes", format!("{}/{}", r.sig_str_landed, r.sig_str_atmpted), format!("{}/{}", b.sig_str_landed, b.sig_str_atmpted)),
        ("Sig. str. acc", format!("{}%", r.sig_str_acc), format!("{}%", b.sig_str_acc)),
        ("Takedowns", format!("{}/{}", r.td_landed, r.td_atmpted), format!("{}/{}", b.td_landed, b.td_atmpted)),
        ("Sub. attempts", r.sub_att.to_string(), b.sub_att.to_string()),
        ("Control", format_match_time(r.ctrl), format_match_time(b.ctrl)),
        ("Head/Body/Leg", format!("{}/{}/{}", r.head_landed, r.body_landed, r.leg_landed), format!("{}/{}/{}", b.head_landed, b.body_landed, b.leg_landed)),
        ("Total strikes", r.total_str_landed.to_string(), b.total_str_landed.to_string()),
    ];
    println!("  {:<16} {:>12} {:>12}", "", "RED", "BLUE");
    for (label, red, blue) in rows {
        println!("  {:<16} {:>12} {:>12}", label, red, blue);
    }
}

fn run(store: &RecordStore, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Summary => {
            println!("Fighters:      {}", store.fighters().len());
            println!("Events:        {}", group_events(store.events()).len());
            println!("Event rows:    {}", store.events().len());
            println!("Fights:        {}", store.fights().len());
            println!("Bout records:  {}", store.bouts().len());
            println!("Locations:     {}", store.locations().len());
            println!("Ages as of:    {}", store.loaded_on());
            println!("\nFighters by division:");
            for (division, count) in store.division_distribution() {
                println!("  {:<18} {:>6}", division, count);
            }
        }
        Command::Fighters(args) => {
            let mut fighters = filter_fighters(store.fighters(), &args.criteria());
            if let Some(key) = &args.sort {
                sort_by(&mut fighters, key, !args.desc);
            }
            if let Some(limit) = args.limit {
                fighters.truncate(limit);
            }
            if args.json {
                print_json(&fighters)?;
            } else {
                print_fighter_table(&fighters);
                println!("\n{} fighters", fighters.len());
            }
        }
        Command::Fighter { id, json } => {
            let fighter = store
                .fighter_by_id(&id)
                .ok_or_else(|| format!("no fighter with id {id}"))?;
            if json {
                print_json(fighter)?;
            } else {
                print_fighter(fighter);
            }
        }
        Command::Events(args) => {
            let groups = group_events(store.events());
            let criteria = EventFilter { search: args.search.clone(), from: args.from, to: args.to };
            let scope: Vec<EventGroup<'_>> = match &args.location {
                Some(location) => events_at_location(&groups, location).into_iter().cloned().collect(),
                None => groups,
            };
            let mut listed = filter_event_groups(&scope, &criteria);
            sort_by(&mut listed, &args.sort, args.asc);
            if let Some(limit) = args.limit {
                listed.truncate(limit);
            }
            if args.json {
                print_json(&listed)?;
            } else {
                print_event_table(&listed);
                println!("\n{} events", listed.len());
            }
        }
        Command::Event { id, json } => {
            let groups = group_events(store.events());
            let group = groups
                .iter()
                .find(|g| g.event_id == id)
                .ok_or_else(|| format!("no event with id {id}"))?;
            let fights = fights_for_event(store.fights(), &id);
            if json {
                #[derive(Serialize)]
                struct EventDetail<'a> {
                    event: &'a EventGroup<'a>,
                    fights: &'a [&'a Fight],
                }
                print_json(&EventDetail { event: group, fights: &fights })?;
                return Ok(());
            }

            println!("{} ({})", group.event_name, group.event_id);
            println!("  {} | {} | {} fights", group.date, group.location, group.fight_count);
            if let Some(c) = store.coordinates_for(group.location) {
                println!("  at {:.4}, {:.4}", c.lat, c.lng);
            }
            println!();
            if fights.is_empty() {
                for row in &group.fights {
                    println!("  {:<14} winner: {}", row.fight_id, row.winner);
                }
            } else {
                for f in &fights {
                    println!(
                        "  {:<14} {:<24} vs {:<24} {:<22} R{} {:>5}  {}",
                        f.fight_id,
                        f.red.name,
                        f.blue.name,
                        f.method,
                        f.finish_round,
                        format_match_time(f.match_time_sec),
                        winner_label(f)
                    );
                }
            }
        }
        Command::Fight { id, json } => {
            let fight = find_fight(store, &id).ok_or_else(|| format!("no fight with id {id}"))?;
            if json {
                print_json(fight)?;
            } else {
                print_fight(fight);
            }
        }
        Command::Divisions => {
            for division in store.divisions() {
                println!("{}", division);
            }
        }
        Command::Stances => {
            for stance in store.stances() {
                println!("{}", stance);
            }
        }
        Command::Opponents { id, query, limit } => {
            if store.fighter_by_id(&id).is_none() {
                return Err(format!("no fighter with id {id}").into());
            }
            let found = search_opponents(store.fighters(), &query, &id, limit);
            print_fighter_table(&found);
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let paths = data_paths(&cli);
    let store = RecordStore::load_all(&paths).await?;
    run(&store, cli.command)
}

// end tests
