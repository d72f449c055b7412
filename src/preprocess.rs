// Normalization of raw CSV rows into typed records, and the derived fields
// (age, win rate, weight division) computed once at load time.
use crate::io::{RawFighter, RawRow};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const LBS_PER_KG: f64 = 2.20462;
const CM_PER_INCH: f64 = 2.54;

/// Date layouts seen across the source files.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y"];

/// Fighting stance enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Stance { Orthodox, Southpaw, Switch, Unknown }

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Orthodox => "Orthodox",
            Stance::Southpaw => "Southpaw",
            Stance::Switch   => "Switch",
            Stance::Unknown  => "Unknown",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Stance::Unknown)
    }
}

impl FromStr for Stance {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orthodox" => Ok(Stance::Orthodox),
            "southpaw" => Ok(Stance::Southpaw),
            "switch"   => Ok(Stance::Switch),
            "unknown"  => Ok(Stance::Unknown),
            _ => Err(format!("Unknown stance: {}", s)),
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Weight class bucket derived from body weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Division {
    Flyweight,
    Bantamweight,
    Featherweight,
    Lightweight,
    Welterweight,
    Middleweight,
    LightHeavyweight,
    Heavyweight,
    Unknown,
}

/// Inclusive upper bounds in pounds. Anything heavier is heavyweight.
const DIVISION_LIMITS_LBS: [(f64, Division); 7] = [
    (125.0, Division::Flyweight),
    (135.0, Division::Bantamweight),
    (145.0, Division::Featherweight),
    (155.0, Division::Lightweight),
    (170.0, Division::Welterweight),
    (185.0, Division::Middleweight),
    (205.0, Division::LightHeavyweight),
];

impl Division {
    pub fn as_str(&self) -> &'static str {
        match self {
            Division::Flyweight        => "flyweight",
            Division::Bantamweight     => "bantamweight",
            Division::Featherweight    => "featherweight",
            Division::Lightweight      => "lightweight",
            Division::Welterweight     => "welterweight",
            Division::Middleweight     => "middleweight",
            Division::LightHeavyweight => "light_heavyweight",
            Division::Heavyweight      => "heavyweight",
            Division::Unknown          => "unknown",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Division::Unknown)
    }
}

impl FromStr for Division {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "flyweight"         => Ok(Division::Flyweight),
            "bantamweight"      => Ok(Division::Bantamweight),
            "featherweight"     => Ok(Division::Featherweight),
            "lightweight"       => Ok(Division::Lightweight),
            "welterweight"      => Ok(Division::Welterweight),
            "middleweight"      => Ok(Division::Middleweight),
            "light_heavyweight" => Ok(Division::LightHeavyweight),
            "heavyweight"       => Ok(Division::Heavyweight),
            "unknown"           => Ok(Division::Unknown),
            _ => Err(format!("Unknown division: {}", s)),
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Normalized fighter. Derived fields are fixed at load time.
#[derive(Debug, Clone, Serialize)]
pub struct Fighter {
    pub id: String,
    pub name: String,
    pub nickname: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub reach_cm: f64,
    pub stance: Stance,
    pub dob: Option<NaiveDate>,
    pub age: Option<u32>,
    pub win_rate: u32,
    pub division: Division,
    pub splm: f64,
    pub str_acc: f64,
    pub sapm: f64,
    pub str_def: f64,
    pub td_avg: f64,
    pub td_avg_acc: f64,
    pub td_def: f64,
    pub sub_avg: f64,
}

/// Turn one raw fighter row into a `Fighter`, deriving age relative to `today`.
pub fn normalize_fighter(raw: RawFighter, today: NaiveDate) -> Fighter {
    let wins = parse_count(&raw.wins);
    let losses = parse_count(&raw.losses);
    let draws = parse_count(&raw.draws);
    let weight_kg = parse_number(&raw.weight);
    let dob = parse_date(&raw.dob);

    Fighter {
        id: raw.id.trim().to_string(),
        name: raw.name.trim().to_string(),
        nickname: raw.nick_name.trim().to_string(),
        wins,
        losses,
        draws,
        height_cm: parse_number(&raw.height),
        weight_kg,
        reach_cm: parse_number(&raw.reach),
        stance: raw.stance.parse().unwrap_or(Stance::Unknown),
        dob,
        age: dob.and_then(|d| age_on(d, today)),
        win_rate: win_rate(wins, losses, draws),
        division: weight_division(weight_kg),
        splm: parse_number(&raw.splm),
        str_acc: parse_number(&raw.str_acc),
        sapm: parse_number(&raw.sapm),
        str_def: parse_number(&raw.str_def),
        td_avg: parse_number(&raw.td_avg),
        td_avg_acc: parse_number(&raw.td_avg_acc),
        td_def: parse_number(&raw.td_def),
        sub_avg: parse_number(&raw.sub_avg),
    }
}

/// One bout row of `event_details.csv`. Several rows share an `event_id`.
#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub event_id: String,
    pub event_name: String,
    pub date: String,
    pub location: String,
    pub fight_id: String,
    pub winner: String,
    pub winner_id: String,
}

impl EventRow {
    pub fn from_row(row: &RawRow<'_>) -> Self {
        EventRow {
            event_id: row.owned("event_id"),
            event_name: row.owned("event_name"),
            date: row.owned("date"),
            location: row.owned("location"),
            fight_id: row.owned("fight_id"),
            winner: row.owned("winner"),
            winner_id: row.owned("winner_id"),
        }
    }
}

/// Per-corner bout statistics, read from `r_*` / `b_*` columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CornerStats {
    pub kd: u32,
    pub sig_str_landed: u32,
    pub sig_str_atmpted: u32,
    pub sig_str_acc: f64,
    pub total_str_landed: u32,
    pub total_str_atmpted: u32,
    pub td_landed: u32,
    pub td_atmpted: u32,
    pub td_acc: f64,
    pub sub_att: u32,
    /// Control time in seconds.
    pub ctrl: u32,
    pub head_landed: u32,
    pub head_atmpted: u32,
    pub body_landed: u32,
    pub body_atmpted: u32,
    pub leg_landed: u32,
    pub leg_atmpted: u32,
    pub dist_landed: u32,
    pub clinch_landed: u32,
    pub ground_landed: u32,
}

impl CornerStats {
    pub fn from_row(row: &RawRow<'_>, prefix: &str) -> Self {
        let count = |field: &str| row.count(&format!("{prefix}{field}"));
        let number = |field: &str| row.number(&format!("{prefix}{field}"));
        CornerStats {
            kd: count("kd"),
            sig_str_landed: count("sig_str_landed"),
            sig_str_atmpted: count("sig_str_atmpted"),
            sig_str_acc: number("sig_str_acc"),
            total_str_landed: count("total_str_landed"),
            total_str_atmpted: count("total_str_atmpted"),
            td_landed: count("td_landed"),
            td_atmpted: count("td_atmpted"),
            td_acc: number("td_acc"),
            sub_att: count("sub_att"),
            ctrl: count("ctrl"),
            head_landed: count("head_landed"),
            head_atmpted: count("head_atmpted"),
            body_landed: count("body_landed"),
            body_atmpted: count("body_atmpted"),
            leg_landed: count("leg_landed"),
            leg_atmpted: count("leg_atmpted"),
            dist_landed: count("dist_landed"),
            clinch_landed: count("clinch_landed"),
            ground_landed: count("ground_landed"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Corner {
    pub id: String,
    pub name: String,
    pub stats: CornerStats,
}

impl Corner {
    fn from_row(row: &RawRow<'_>, prefix: &str) -> Self {
        Corner {
            id: row.owned(&format!("{prefix}id")),
            name: row.owned(&format!("{prefix}name")),
            stats: CornerStats::from_row(row, prefix),
        }
    }
}

/// Who took the bout, judged by `winner_id` against the corner ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome { Red, Blue, NoWinner }

/// Full statistical record of a single bout.
#[derive(Debug, Clone, Serialize)]
pub struct Fight {
    pub fight_id: String,
    pub event_id: String,
    pub event_name: String,
    pub division: String,
    pub title_fight: bool,
    pub method: String,
    pub finish_round: u32,
    pub match_time_sec: u32,
    pub total_rounds: u32,
    pub referee: String,
    pub red: Corner,
    pub blue: Corner,
    pub winner: String,
    pub winner_id: String,
}

impl Fight {
    pub fn from_row(row: &RawRow<'_>) -> Self {
        Fight {
            fight_id: row.owned("fight_id"),
            event_id: row.owned("event_id"),
            event_name: row.owned("event_name"),
            division: row.owned("division"),
            title_fight: parse_flag(row.text("title_fight")),
            method: row.owned("method"),
            finish_round: row.count("finish_round"),
            match_time_sec: row.count("match_time_sec"),
            total_rounds: row.count("total_rounds"),
            referee: row.owned("referee"),
            red: Corner::from_row(row, "r_"),
            blue: Corner::from_row(row, "b_"),
            winner: row.owned("winner"),
            winner_id: row.owned("winner_id"),
        }
    }

    pub fn outcome(&self) -> Outcome {
        if self.winner_id.is_empty() {
            Outcome::NoWinner
        } else if self.winner_id == self.red.id {
            Outcome::Red
        } else if self.winner_id == self.blue.id {
            Outcome::Blue
        } else {
            Outcome::NoWinner
        }
    }
}

/// Row of the combined export: event columns joined onto a full fight record.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedBout {
    pub date: String,
    pub location: String,
    pub fight: Fight,
}

impl CombinedBout {
    pub fn from_row(row: &RawRow<'_>) -> Self {
        CombinedBout {
            date: row.owned("date"),
            location: row.owned("location"),
            fight: Fight::from_row(row),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Location rows need both coordinates; anything else is unusable for the map.
pub fn location_from_row(row: &RawRow<'_>) -> Option<(String, Coordinates)> {
    let location = row.text("location");
    if location.is_empty() {
        return None;
    }
    let lat = row.text("latitude").parse::<f64>().ok()?;
    let lng = row.text("longitude").parse::<f64>().ok()?;
    Some((location.to_string(), Coordinates { lat, lng }))
}

/// Non-numeric or missing text coerces to 0.
pub fn parse_number(s: &str) -> f64 {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Counts are non-negative integers; fractional input is truncated.
pub fn parse_count(s: &str) -> u32 {
    let v = parse_number(s);
    if v > 0.0 { v as u32 } else { 0 }
}

fn parse_flag(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "y")
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Whole years between `dob` and `today`; `None` for a birth date in the future.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

/// Integer percentage of bouts won; 0 when there are no bouts.
pub fn win_rate(wins: u32, losses: u32, draws: u32) -> u32 {
    let total = wins as u64 + losses as u64 + draws as u64;
    if total == 0 {
        return 0;
    }
    (100.0 * wins as f64 / total as f64).round() as u32
}

pub fn division_for_lbs(lbs: f64) -> Division {
    if lbs <= 0.0 {
        return Division::Unknown;
    }
    DIVISION_LIMITS_LBS
        .iter()
        .find(|(limit, _)| lbs <= *limit)
        .map(|&(_, division)| division)
        .unwrap_or(Division::Heavyweight)
}

pub fn weight_division(weight_kg: f64) -> Division {
    division_for_lbs(weight_kg * LBS_PER_KG)
}

/// `5'11"` style height; `-` when unknown.
pub fn cm_to_feet_inches(cm: f64) -> String {
    if cm <= 0.0 {
        return "-".to_string();
    }
    let total_inches = cm / CM_PER_INCH;
    let mut feet = (total_inches / 12.0).floor() as u32;
    let mut inches = (total_inches % 12.0).round() as u32;
    if inches == 12 {
        feet += 1;
        inches = 0;
    }
    format!("{}'{}\"", feet, inches)
}

pub fn kg_to_lbs(kg: f64) -> String {
    if kg <= 0.0 {
        return "-".to_string();
    }
    format!("{} lbs", (kg * LBS_PER_KG).round() as u32)
}

/// Seconds as `M:SS`.
pub fn format_match_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
