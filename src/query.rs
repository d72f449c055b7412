// Stateless read-only queries over the record store: filtering, sorting,
// grouping of bout rows into events, and the lookups the detail views use.
use std::cmp::Ordering;
use std::collections::HashMap;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::preprocess::{parse_date, Division, EventRow, Fight, Fighter, Stance};
use crate::store::RecordStore;

pub const DEFAULT_OPPONENT_LIMIT: usize = 20;

/// Fighter table criteria. `None` places no constraint; ranges are inclusive.
#[derive(Debug, Clone, Default)]
pub struct FighterFilter {
    pub search: Option<String>,
    pub division: Option<Division>,
    pub stance: Option<Stance>,
    pub win_rate_min: Option<u32>,
    pub win_rate_max: Option<u32>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub height_min: Option<f64>,
    pub height_max: Option<f64>,
    pub weight_min: Option<f64>,
    pub weight_max: Option<f64>,
}

fn in_range<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi)
}

impl FighterFilter {
    pub fn matches(&self, fighter: &Fighter) -> bool {
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            if !fighter.name.to_lowercase().contains(&term)
                && !fighter.nickname.to_lowercase().contains(&term)
            {
                return false;
            }
        }

        if self.division.is_some_and(|d| d != fighter.division) {
            return false;
        }
        if self.stance.is_some_and(|s| s != fighter.stance) {
            return false;
        }
        if !in_range(fighter.win_rate, self.win_rate_min, self.win_rate_max) {
            return false;
        }

        // A fighter without a known age fails any age bound.
        match fighter.age {
            Some(age) if !in_range(age, self.age_min, self.age_max) => return false,
            None if self.age_min.is_some() || self.age_max.is_some() => return false,
            _ => {}
        }

        in_range(fighter.height_cm, self.height_min, self.height_max)
            && in_range(fighter.weight_kg, self.weight_min, self.weight_max)
    }
}

/// Fighters matching every present criterion, in store order.
pub fn filter_fighters<'a>(fighters: &'a [Fighter], criteria: &FighterFilter) -> Vec<&'a Fighter> {
    fighters.iter().filter(|f| criteria.matches(f)).collect()
}

/// Name search for the comparison screen, skipping the fighter being compared.
pub fn search_opponents<'a>(
    fighters: &'a [Fighter],
    query: &str,
    exclude_id: &str,
    limit: usize,
) -> Vec<&'a Fighter> {
    let query = query.to_lowercase();
    fighters
        .iter()
        .filter(|f| f.id != exclude_id && f.name.to_lowercase().contains(&query))
        .take(limit)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    /// Numeric text sorts as a number.
    pub fn from_text(s: &str) -> SortValue {
        match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => SortValue::Number(v),
            _ => SortValue::Text(s.to_string()),
        }
    }
}

/// Field lookup by name for `sort_by`. `None` means the record has no value.
pub trait Sortable {
    fn sort_value(&self, key: &str) -> Option<SortValue>;
}

impl<T: Sortable + ?Sized> Sortable for &T {
    fn sort_value(&self, key: &str) -> Option<SortValue> {
        (**self).sort_value(key)
    }
}

fn compare_values(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
    }
}

/// Stable sort on `key`. Records without a value go last in either direction.
pub fn sort_by<T: Sortable>(items: &mut [T], key: &str, ascending: bool) {
    items.sort_by(|a, b| match (a.sort_value(key), b.sort_value(key)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = compare_values(&x, &y);
            if ascending { ord } else { ord.reverse() }
        }
    });
}

fn date_value(date: Option<NaiveDate>) -> Option<SortValue> {
    date.map(|d| SortValue::Number(d.num_days_from_ce() as f64))
}

impl Sortable for Fighter {
    fn sort_value(&self, key: &str) -> Option<SortValue> {
        let n = |v: f64| Some(SortValue::Number(v));
        match key {
            "id" => Some(SortValue::from_text(&self.id)),
            "name" => Some(SortValue::from_text(&self.name)),
            "nickname" => Some(SortValue::from_text(&self.nickname)),
            "wins" => n(self.wins as f64),
            "losses" => n(self.losses as f64),
            "draws" => n(self.draws as f64),
            "height" | "height_cm" => n(self.height_cm),
            "weight" | "weight_kg" => n(self.weight_kg),
            "reach" | "reach_cm" => n(self.reach_cm),
            "stance" => Some(SortValue::Text(self.stance.as_str().to_string())),
            "division" => Some(SortValue::Text(self.division.as_str().to_string())),
            "dob" => date_value(self.dob),
            "age" => self.age.map(|a| SortValue::Number(a as f64)),
            "winRate" | "win_rate" => n(self.win_rate as f64),
            "splm" => n(self.splm),
            "str_acc" => n(self.str_acc),
            "sapm" => n(self.sapm),
            "str_def" => n(self.str_def),
            "td_avg" => n(self.td_avg),
            "td_avg_acc" => n(self.td_avg_acc),
            "td_def" => n(self.td_def),
            "sub_avg" => n(self.sub_avg),
            _ => None,
        }
    }
}

/// One card: the bout rows sharing an `event_id`.
#[derive(Debug, Clone, Serialize)]
pub struct EventGroup<'a> {
    pub event_id: &'a str,
    pub event_name: &'a str,
    pub date: &'a str,
    pub location: &'a str,
    pub city: &'a str,
    pub region: &'a str,
    pub country: &'a str,
    pub fight_count: usize,
    pub fights: Vec<&'a EventRow>,
}

impl<'a> EventGroup<'a> {
    fn start(row: &'a EventRow) -> Self {
        let (city, region, country) = split_location(&row.location);
        EventGroup {
            event_id: &row.event_id,
            event_name: &row.event_name,
            date: &row.date,
            location: &row.location,
            city,
            region,
            country,
            fight_count: 1,
            fights: vec![row],
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(self.date)
    }
}

impl Sortable for EventGroup<'_> {
    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "date" => date_value(self.parsed_date())
                .or_else(|| (!self.date.is_empty()).then(|| SortValue::Text(self.date.to_string()))),
            "fights" | "fight_count" | "fightCount" => Some(SortValue::Number(self.fight_count as f64)),
            "event_id" => Some(SortValue::from_text(self.event_id)),
            "event_name" => Some(SortValue::Text(self.event_name.to_string())),
            "location" => Some(SortValue::Text(self.location.to_string())),
            "city" => Some(SortValue::Text(self.city.to_string())),
            "country" => Some(SortValue::Text(self.country.to_string())),
            _ => None,
        }
    }
}

/// `"City, Region, Country"` into its parts. Two-part locations read as
/// city and country, so the second part doubles as the country.
pub fn split_location(location: &str) -> (&str, &str, &str) {
    let mut parts = location.split(',').map(str::trim);
    let city = parts.next().unwrap_or("");
    let region = parts.next().unwrap_or("");
    let third = parts.next().unwrap_or("");
    let country = if !third.is_empty() { third } else { region };
    (city, region, country)
}

/// Group bout rows by `event_id`, in order of each id's first appearance.
pub fn group_events(rows: &[EventRow]) -> Vec<EventGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<EventGroup<'_>> = Vec::new();
    for row in rows {
        match index.get(row.event_id.as_str()) {
            Some(&i) => {
                let group = &mut groups[i];
                group.fights.push(row);
                group.fight_count += 1;
            }
            None => {
                index.insert(&row.event_id, groups.len());
                groups.push(EventGroup::start(row));
            }
        }
    }
    groups
}

/// Event list criteria for the map view. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl EventFilter {
    pub fn matches(&self, group: &EventGroup<'_>) -> bool {
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = group.location.to_lowercase().contains(&term)
                || group.city.to_lowercase().contains(&term)
                || group.country.to_lowercase().contains(&term)
                || group.date.contains(&term);
            if !hit {
                return false;
            }
        }

        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        match group.parsed_date() {
            Some(date) => in_range(date, self.from, self.to),
            None => false,
        }
    }
}

pub fn filter_event_groups<'g, 'a>(
    groups: &'g [EventGroup<'a>],
    criteria: &EventFilter,
) -> Vec<&'g EventGroup<'a>> {
    groups.iter().filter(|g| criteria.matches(g)).collect()
}

pub fn events_at_location<'g, 'a>(
    groups: &'g [EventGroup<'a>],
    location: &str,
) -> Vec<&'g EventGroup<'a>> {
    groups.iter().filter(|g| g.location == location).collect()
}

pub fn fights_for_event<'a>(fights: &'a [Fight], event_id: &str) -> Vec<&'a Fight> {
    fights.iter().filter(|f| f.event_id == event_id).collect()
}

/// The combined export has the richer record, so it is searched first.
pub fn find_fight<'a>(store: &'a RecordStore, fight_id: &str) -> Option<&'a Fight> {
    store
        .bouts()
        .iter()
        .map(|b| &b.fight)
        .find(|f| f.fight_id == fight_id)
        .or_else(|| store.fights().iter().find(|f| f.fight_id == fight_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::{weight_division, win_rate};

    fn fighter(id: &str, name: &str, nickname: &str, record: (u32, u32, u32), age: Option<u32>) -> Fighter {
        let (wins, losses, draws) = record;
        Fighter {
            id: id.to_string(),
            name: name.to_string(),
            nickname: nickname.to_string(),
            wins,
            losses,
            draws,
            height_cm: 180.0,
            weight_kg: 77.0,
            reach_cm: 185.0,
            stance: Stance::Orthodox,
            dob: None,
            age,
            win_rate: win_rate(wins, losses, draws),
            division: weight_division(77.0),
            splm: 0.0,
            str_acc: 0.0,
            sapm: 0.0,
            str_def: 0.0,
            td_avg: 0.0,
            td_avg_acc: 0.0,
            td_def: 0.0,
            sub_avg: 0.0,
        }
    }

    fn roster() -> Vec<Fighter> {
        vec![
            fighter("a", "Jon Jones", "Bones", (27, 1, 0), Some(37)),
            fighter("b", "Conor McGregor", "The Notorious", (22, 6, 0), Some(36)),
            fighter("c", "Rose Namajunas", "Thug", (1, 1, 0), None),
            fighter("d", "Jessica Andrade", "Bate Estaca", (7, 3, 0), Some(33)),
            fighter("e", "Marcus Jonesy", "", (7, 5, 2), Some(29)),
        ]
    }

    fn ids(fighters: &[&Fighter]) -> Vec<String> {
        fighters.iter().map(|f| f.id.clone()).collect()
    }

    fn row(event_id: &str, fight_id: &str, date: &str, location: &str) -> EventRow {
        EventRow {
            event_id: event_id.to_string(),
            event_name: format!("Event {event_id}"),
            date: date.to_string(),
            location: location.to_string(),
            fight_id: fight_id.to_string(),
            winner: String::new(),
            winner_id: String::new(),
        }
    }

    #[test]
    fn empty_filter_returns_everything_in_order() {
        let all = roster();
        let out = filter_fighters(&all, &FighterFilter::default());
        assert_eq!(ids(&out), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn search_matches_name_or_nickname_case_insensitively() {
        let all = roster();
        let by_name = filter_fighters(&all, &FighterFilter { search: Some("jones".into()), ..Default::default() });
        assert_eq!(ids(&by_name), vec!["a", "e"]);

        let by_nickname = filter_fighters(&all, &FighterFilter { search: Some("THUG".into()), ..Default::default() });
        assert_eq!(ids(&by_nickname), vec!["c"]);

        let empty = filter_fighters(&all, &FighterFilter { search: Some(String::new()), ..Default::default() });
        assert_eq!(empty.len(), all.len());
    }

    #[test]
    fn win_rate_bounds_are_inclusive() {
        let all = roster();
        // rates: a=96, b=79, c=50, d=70, e=50
        let out = filter_fighters(
            &all,
            &FighterFilter { win_rate_min: Some(50), win_rate_max: Some(70), ..Default::default() },
        );
        assert_eq!(ids(&out), vec!["c", "d", "e"]);
    }

    #[test]
    fn age_bounds_exclude_unknown_ages() {
        let all = roster();
        let out = filter_fighters(&all, &FighterFilter { age_max: Some(36), ..Default::default() });
        assert_eq!(ids(&out), vec!["b", "d", "e"]);
    }

    #[test]
    fn criteria_combine_with_and() {
        let mut all = roster();
        all[3].stance = Stance::Southpaw;
        all[4].weight_kg = 60.0;
        let out = filter_fighters(
            &all,
            &FighterFilter {
                stance: Some(Stance::Orthodox),
                weight_min: Some(70.0),
                weight_max: Some(80.0),
                division: Some(Division::Welterweight),
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), vec!["a", "b", "c"]);
    }

    #[test]
    fn missing_ages_sink_in_both_directions() {
        let all = roster();
        let mut refs: Vec<&Fighter> = all.iter().collect();
        sort_by(&mut refs, "age", true);
        assert_eq!(ids(&refs), vec!["e", "d", "b", "a", "c"]);

        sort_by(&mut refs, "age", false);
        assert_eq!(ids(&refs), vec!["a", "b", "d", "e", "c"]);
    }

    #[test]
    fn sort_is_stable_and_ignores_unknown_keys() {
        let all = roster();
        let mut refs: Vec<&Fighter> = all.iter().collect();
        sort_by(&mut refs, "no_such_field", true);
        assert_eq!(ids(&refs), vec!["a", "b", "c", "d", "e"]);

        // c and e share a 50% win rate and keep their relative order
        sort_by(&mut refs, "winRate", true);
        assert_eq!(ids(&refs), vec!["c", "e", "d", "b", "a"]);
    }

    #[test]
    fn numeric_text_sorts_as_numbers() {
        let all = vec![
            fighter("10", "x", "", (0, 0, 0), None),
            fighter("9", "y", "", (0, 0, 0), None),
            fighter("abc", "z", "", (0, 0, 0), None),
        ];
        let mut refs: Vec<&Fighter> = all.iter().collect();
        sort_by(&mut refs, "id", true);
        assert_eq!(ids(&refs), vec!["9", "10", "abc"]);
    }

    #[test]
    fn grouping_keeps_first_seen_order_and_counts() {
        let rows = vec![
            row("e2", "f1", "2024-03-09", "Las Vegas, Nevada, USA"),
            row("e1", "f2", "2024-02-17", "Anaheim, California, USA"),
            row("e2", "f3", "2024-03-09", "Las Vegas, Nevada, USA"),
            row("e2", "f4", "2024-03-09", "Las Vegas, Nevada, USA"),
        ];
        let groups = group_events(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].event_id, "e2");
        assert_eq!(groups[0].fight_count, 3);
        assert_eq!(groups[0].fights.len(), 3);
        assert_eq!(groups[0].country, "USA");
        assert_eq!(groups[1].event_id, "e1");
        assert_eq!(groups[1].fight_count, 1);
    }

    #[test]
    fn location_parts() {
        assert_eq!(split_location("Las Vegas, Nevada, USA"), ("Las Vegas", "Nevada", "USA"));
        assert_eq!(split_location("London, England"), ("London", "England", "England"));
        assert_eq!(split_location("Abu Dhabi"), ("Abu Dhabi", "", ""));
    }

    #[test]
    fn event_filter_by_search_and_dates() {
        let rows = vec![
            row("e1", "f1", "2023-12-16", "Orlando, Florida, USA"),
            row("e2", "f2", "2024-01-20", "Toronto, Ontario, Canada"),
            row("e3", "f3", "2024-03-09", "Miami, Florida, USA"),
            row("e4", "f4", "", "Nowhere"),
        ];
        let groups = group_events(&rows);

        let florida = filter_event_groups(&groups, &EventFilter { search: Some("florida".into()), ..Default::default() });
        assert_eq!(florida.iter().map(|g| g.event_id).collect::<Vec<_>>(), vec!["e1", "e3"]);

        let in_2024 = filter_event_groups(
            &groups,
            &EventFilter {
                from: NaiveDate::from_ymd_opt(2024, 1, 1),
                to: NaiveDate::from_ymd_opt(2024, 3, 9),
                ..Default::default()
            },
        );
        assert_eq!(in_2024.iter().map(|g| g.event_id).collect::<Vec<_>>(), vec!["e2", "e3"]);

        let at = events_at_location(&groups, "Nowhere");
        assert_eq!(at.len(), 1);
    }

    #[test]
    fn event_groups_sort_by_date_and_fight_count() {
        let rows = vec![
            row("e1", "f1", "2023-12-16", "Orlando, Florida, USA"),
            row("e2", "f2", "2024-01-20", "Toronto, Ontario, Canada"),
            row("e2", "f3", "2024-01-20", "Toronto, Ontario, Canada"),
            row("e3", "f4", "", "Nowhere"),
        ];
        let mut groups = group_events(&rows);
        sort_by(&mut groups, "date", false);
        assert_eq!(groups.iter().map(|g| g.event_id).collect::<Vec<_>>(), vec!["e2", "e1", "e3"]);

        sort_by(&mut groups, "fights", false);
        assert_eq!(groups[0].event_id, "e2");
    }

    #[test]
    fn opponent_search_excludes_current_fighter_and_caps() {
        let all = roster();
        let out = search_opponents(&all, "jon", "a", DEFAULT_OPPONENT_LIMIT);
        assert_eq!(ids(&out), vec!["e"]);
        let capped = search_opponents(&all, "", "a", 2);
        assert_eq!(ids(&capped), vec!["b", "c"]);
    }
}
