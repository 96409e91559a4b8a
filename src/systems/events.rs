//! Monthly event drafting and daily event lifecycle.

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    events::{ActiveEvent, EventKind, PendingEvent},
    journal::JournalEvent,
    world::{SettlementId, World},
};

pub struct EventSystem;

impl EventSystem {
    pub fn new() -> Self {
        Self
    }

    fn draft(&self, world: &mut World, rng: &mut ChaCha8Rng) {
        let mut ids: Vec<SettlementId> = world.settlements.iter().map(|s| s.id()).collect();
        ids.shuffle(rng);
        for id in ids.into_iter().take(world.economy.events_per_month) {
            let settlement = &world.settlements[id.index()];
            let kind = EventKind::draw_for_role(settlement.is_producer, rng);
            world.scheduled_events.push(PendingEvent {
                settlement: id,
                kind,
                start_day: rng.gen_range(1..29),
                duration: rng.gen_range(5..15),
            });
        }
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EventSystem {
    fn name(&self) -> &'static str {
        "events"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        if ctx.month_began {
            self.draft(world, rng);
            debug!(
                month = ctx.month,
                scheduled = world.scheduled_events.len(),
                "drafted month events"
            );
        }

        // activate events whose start day is today; a settlement already
        // under an event drops the newcomer
        let mut due = Vec::new();
        world.scheduled_events.retain(|pending| {
            if pending.start_day == ctx.day_of_month {
                due.push(pending.clone());
                false
            } else {
                true
            }
        });
        for pending in due {
            let settlement = &mut world.settlements[pending.settlement.index()];
            if settlement.active_event.is_some() {
                continue;
            }
            settlement.active_event = Some(ActiveEvent::new(pending.kind, pending.duration));
            settlement.consumption_multiplier = pending.kind.consumption_multiplier();
            settlement.production_multiplier = pending.kind.production_multiplier();
            world.journal.record(
                ctx.day,
                JournalEvent::EventStarted {
                    settlement: pending.settlement,
                    kind: pending.kind,
                    duration: pending.duration,
                },
            );
        }

        // advance running events, clearing the ones that ran their course
        for index in 0..world.settlements.len() {
            let settlement = &mut world.settlements[index];
            let expired_kind = match &mut settlement.active_event {
                Some(event) => {
                    event.elapsed += 1;
                    if event.expired() {
                        Some(event.kind)
                    } else {
                        None
                    }
                }
                None => None,
            };
            if let Some(kind) = expired_kind {
                settlement.active_event = None;
                settlement.consumption_multiplier = 1.0;
                settlement.production_multiplier = 1.0;
                let id = settlement.id();
                world.journal.record(
                    ctx.day,
                    JournalEvent::EventEnded {
                        settlement: id,
                        kind,
                    },
                );
            }
        }
        Ok(())
    }
}
