// The record store: every collection, loaded once and read-only afterwards.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use crate::config::DataPaths;
use crate::error::Result;
use crate::io;
use crate::preprocess::{CombinedBout, Coordinates, Division, EventRow, Fight, Fighter, Stance};

#[derive(Debug)]
pub struct RecordStore {
    fighters: Vec<Fighter>,
    fighter_index: HashMap<String, usize>,
    events: Vec<EventRow>,
    fights: Vec<Fight>,
    bouts: Vec<CombinedBout>,
    locations: HashMap<String, Coordinates>,
    loaded_on: NaiveDate,
}

impl RecordStore {
    /// Store holding `fighters` only; the other collections start empty.
    /// Ages in `fighters` are expected to be relative to `loaded_on`.
    pub fn new(fighters: Vec<Fighter>, loaded_on: NaiveDate) -> Self {
        let mut fighter_index = HashMap::with_capacity(fighters.len());
        for (i, fighter) in fighters.iter().enumerate() {
            if fighter_index.contains_key(&fighter.id) {
                warn!(id = %fighter.id, "duplicate fighter id; keeping the first occurrence");
                continue;
            }
            fighter_index.insert(fighter.id.clone(), i);
        }

        RecordStore {
            fighters,
            fighter_index,
            events: Vec::new(),
            fights: Vec::new(),
            bouts: Vec::new(),
            locations: HashMap::new(),
            loaded_on,
        }
    }

    pub fn with_events(mut self, events: Vec<EventRow>) -> Self {
        self.events = events;
        self
    }

    pub fn with_fights(mut self, fights: Vec<Fight>) -> Self {
        self.fights = fights;
        self
    }

    pub fn with_bouts(mut self, bouts: Vec<CombinedBout>) -> Self {
        self.bouts = bouts;
        self
    }

    pub fn with_locations(mut self, locations: HashMap<String, Coordinates>) -> Self {
        self.locations = locations;
        self
    }

    /// Load every source with ages computed against today's date.
    pub async fn load_all(paths: &DataPaths) -> Result<Self> {
        Self::load_all_on(paths, Local::now().date_naive()).await
    }

    /// Load every source concurrently. Fighters are required; any other source
    /// that fails is logged and left empty.
    pub async fn load_all_on(paths: &DataPaths, today: NaiveDate) -> Result<Self> {
        let (fighters, events, fights, bouts, locations) = tokio::join!(
            io::load_fighters(&paths.fighters, today),
            or_empty("events", io::load_events(&paths.events)),
            or_empty("fights", io::load_fights(&paths.fights)),
            or_empty("combined bouts", io::load_bouts(&paths.bouts)),
            or_empty("locations", io::load_locations(&paths.locations)),
        );

        let fighters = fighters.map_err(|e| {
            error!(error = %e, "failed to load fighters");
            e
        })?;

        let store = RecordStore::new(fighters, today)
            .with_events(events)
            .with_fights(fights)
            .with_bouts(bouts)
            .with_locations(locations);

        info!(
            fighters = store.fighters.len(),
            event_rows = store.events.len(),
            fights = store.fights.len(),
            bouts = store.bouts.len(),
            locations = store.locations.len(),
            "all data loaded"
        );
        info!(distribution = ?store.division_distribution(), "fighters by division");
        Ok(store)
    }

    pub fn fighters(&self) -> &[Fighter] {
        &self.fighters
    }

    pub fn events(&self) -> &[EventRow] {
        &self.events
    }

    pub fn fights(&self) -> &[Fight] {
        &self.fights
    }

    pub fn bouts(&self) -> &[CombinedBout] {
        &self.bouts
    }

    pub fn locations(&self) -> &HashMap<String, Coordinates> {
        &self.locations
    }

    /// Date the derived ages were computed against.
    pub fn loaded_on(&self) -> NaiveDate {
        self.loaded_on
    }

    pub fn fighter_by_id(&self, id: &str) -> Option<&Fighter> {
        self.fighter_index.get(id).map(|&i| &self.fighters[i])
    }

    /// Distinct divisions present, placeholder excluded, sorted by name.
    pub fn divisions(&self) -> Vec<Division> {
        let set: BTreeSet<Division> = self
            .fighters
            .iter()
            .map(|f| f.division)
            .filter(|d| !d.is_placeholder())
            .collect();
        let mut out: Vec<Division> = set.into_iter().collect();
        out.sort_by_key(|d| d.as_str());
        out
    }

    /// Distinct stances present, placeholder excluded, sorted by name.
    pub fn stances(&self) -> Vec<Stance> {
        let set: BTreeSet<Stance> = self
            .fighters
            .iter()
            .map(|f| f.stance)
            .filter(|s| !s.is_placeholder())
            .collect();
        let mut out: Vec<Stance> = set.into_iter().collect();
        out.sort_by_key(|s| s.as_str());
        out
    }

    pub fn coordinates_for(&self, location: &str) -> Option<Coordinates> {
        self.locations.get(location).copied()
    }

    pub fn division_distribution(&self) -> BTreeMap<Division, usize> {
        let mut counts = BTreeMap::new();
        for fighter in &self.fighters {
            *counts.entry(fighter.division).or_insert(0) += 1;
        }
        counts
    }
}

async fn or_empty<T, F>(source: &str, load: F) -> T
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    match load.await {
        Ok(data) => data,
        Err(e) => {
            warn!(source = %source, error = %e, "optional source unavailable; continuing with an empty collection");
            T::default()
        }
    }
}
