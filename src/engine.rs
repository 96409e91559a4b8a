use std::path::PathBuf;

use anyhow::Result;
use rand_chacha::ChaCha8Rng;

use crate::{rng::RngManager, snapshot::SnapshotWriter, world::World};

pub const DAYS_PER_MONTH: u32 = 30;
pub const MONTHS_PER_YEAR: u32 = 12;

/// Day counter with a 30-day month, 12-month year calendar on top.
///
/// `month_began` is true on the first day of every month, including the
/// very first simulated day, so monthly schedulers fire at startup.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calendar {
    day: u64,
}

impl Calendar {
    pub fn new() -> Self {
        Self { day: 0 }
    }

    pub fn advance(&mut self) {
        self.day += 1;
    }

    /// Days simulated so far; 0 before the first tick.
    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn day_of_month(&self) -> u32 {
        if self.day == 0 {
            return 0;
        }
        ((self.day - 1) % DAYS_PER_MONTH as u64) as u32 + 1
    }

    pub fn month(&self) -> u32 {
        if self.day == 0 {
            return 0;
        }
        (((self.day - 1) / DAYS_PER_MONTH as u64) % MONTHS_PER_YEAR as u64) as u32 + 1
    }

    pub fn year(&self) -> u32 {
        if self.day == 0 {
            return 0;
        }
        ((self.day - 1) / (DAYS_PER_MONTH as u64 * MONTHS_PER_YEAR as u64)) as u32 + 1
    }

    pub fn month_began(&self) -> bool {
        self.day_of_month() == 1
    }
}

pub struct SystemContext<'a> {
    pub day: u64,
    pub day_of_month: u32,
    pub month: u32,
    pub year: u32,
    pub month_began: bool,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &'static str;
    fn run(&mut self, ctx: &SystemContext, world: &mut World, rng: &mut ChaCha8Rng)
        -> Result<()>;
}

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_days: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_days,
            ),
            calendar: Calendar::new(),
            settings: self.settings,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DayReport {
    pub day: u64,
    pub snapshot_path: Option<PathBuf>,
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    calendar: Calendar,
    settings: EngineSettings,
}

impl Engine {
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Advances the world one day: every system in registration order,
    /// price caches, then maybe a snapshot.
    pub fn step(&mut self, world: &mut World) -> Result<DayReport> {
        self.calendar.advance();
        let day = self.calendar.day();
        for system in &mut self.systems {
            let mut stream = self.rng.stream(system.name(), day);
            let ctx = SystemContext {
                day,
                day_of_month: self.calendar.day_of_month(),
                month: self.calendar.month(),
                year: self.calendar.year(),
                month_began: self.calendar.month_began(),
                scenario_name: &self.settings.scenario_name,
            };
            system.run(&ctx, world, &mut stream)?;
        }
        world.refresh_price_caches();
        let snapshot_path =
            self.snapshot_writer
                .maybe_write(world, &self.settings.scenario_name, day)?;
        Ok(DayReport { day, snapshot_path })
    }

    pub fn run(&mut self, world: &mut World, days: u64) -> Result<()> {
        for _ in 0..days {
            self.step(world)?;
        }
        Ok(())
    }

    pub fn run_with_hook<F>(&mut self, world: &mut World, days: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&World, &DayReport),
    {
        for _ in 0..days {
            let report = self.step(world)?;
            hook(world, &report);
        }
        Ok(())
    }
}
