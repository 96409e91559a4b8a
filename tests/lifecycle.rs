//! Event and contract lifecycles driven through their systems.

use caravan::{
    contracts::PendingContract,
    engine::{System, SystemContext},
    events::{EventKind, PendingEvent},
    items::{Catalog, ItemId},
    nav::Position,
    rng::RngManager,
    systems::{ContractSystem, EventSystem},
    world::{EconomyParams, MarketLine, SettlementId, SettlementInit, World},
    AgentParams,
};

const WHEAT: ItemId = ItemId(0);

fn ctx(day: u64) -> SystemContext<'static> {
    SystemContext {
        day,
        day_of_month: ((day - 1) % 30) as u32 + 1,
        month: 1,
        year: 1,
        // never a month boundary, so nothing extra is drafted
        month_began: false,
        scenario_name: "test",
    }
}

fn world_with_town() -> (World, SettlementId) {
    let mut world = World::new(
        Catalog::standard(),
        EconomyParams::default(),
        AgentParams::default(),
    );
    let town = world
        .add_settlement(SettlementInit {
            name: "Town".to_string(),
            is_producer: false,
            position: Position::new(0.0, 0.0),
            population: 500,
            min_population: 100,
            max_population: 1000,
            grow_population: false,
            dynamic_storage: false,
        })
        .unwrap();
    world.add_line(town, MarketLine::new(WHEAT, 100, 500, 0));
    (world, town)
}

fn run_events(world: &mut World, day: u64) {
    let mut rng = RngManager::new(1).stream("events", day);
    EventSystem::new().run(&ctx(day), world, &mut rng).unwrap();
}

fn run_contracts(world: &mut World, day: u64) {
    let mut rng = RngManager::new(1).stream("contracts", day);
    ContractSystem::new()
        .run(&ctx(day), world, &mut rng)
        .unwrap();
}

#[test]
fn one_event_per_settlement_and_clean_expiry() {
    let (mut world, town) = world_with_town();
    world.schedule_event(PendingEvent {
        settlement: town,
        kind: EventKind::War,
        start_day: 2,
        duration: 3,
    });
    // a second event lands on the same day and must be dropped
    world.schedule_event(PendingEvent {
        settlement: town,
        kind: EventKind::Festival,
        start_day: 2,
        duration: 10,
    });

    run_events(&mut world, 1);
    assert!(world.settlement(town).active_event().is_none());

    run_events(&mut world, 2);
    let active = world.settlement(town).active_event().unwrap();
    assert_eq!(active.kind, EventKind::War);
    assert!(world.scheduled_events().is_empty());

    // duration 3: started day 2 with elapsed already 1, gone after day 4
    run_events(&mut world, 3);
    assert!(world.settlement(town).active_event().is_some());
    run_events(&mut world, 4);
    assert!(world.settlement(town).active_event().is_none());
}

#[test]
fn late_event_takes_the_slot_after_expiry() {
    let (mut world, town) = world_with_town();
    world.schedule_event(PendingEvent {
        settlement: town,
        kind: EventKind::War,
        start_day: 2,
        duration: 2,
    });
    world.schedule_event(PendingEvent {
        settlement: town,
        kind: EventKind::Festival,
        start_day: 5,
        duration: 4,
    });

    for day in 1..=4 {
        run_events(&mut world, day);
    }
    assert!(world.settlement(town).active_event().is_none());

    run_events(&mut world, 5);
    assert_eq!(
        world.settlement(town).active_event().unwrap().kind,
        EventKind::Festival
    );
}

#[test]
fn contract_is_all_or_nothing() {
    let (mut world, town) = world_with_town();
    world.contracts_mut().schedule(PendingContract {
        settlement: town,
        item: WHEAT,
        amount: 50,
        reward: 700,
        start_day: 1,
        duration: 10,
    });
    run_contracts(&mut world, 1);
    assert_eq!(world.contracts().active_len(), 1);

    // split deliveries of 30 and 20 never complete a 50-unit ask
    assert!(world.contracts_mut().try_complete(town, WHEAT, 30).is_none());
    assert!(world.contracts_mut().try_complete(town, WHEAT, 20).is_none());
    assert_eq!(world.contracts().active_len(), 1);

    // the advertised reward never shrinks to match a small carrier
    assert_eq!(world.contracts().potential_reward(town, WHEAT), Some(700));

    assert_eq!(
        world.contracts_mut().try_complete(town, WHEAT, 50),
        Some(700)
    );
    assert_eq!(world.contracts().active_len(), 0);
}

#[test]
fn contracts_expire_without_paying() {
    let (mut world, town) = world_with_town();
    world.contracts_mut().schedule(PendingContract {
        settlement: town,
        item: WHEAT,
        amount: 40,
        reward: 500,
        start_day: 1,
        duration: 3,
    });

    // activation day already counts: duration 3 survives days 1 and 2
    run_contracts(&mut world, 1);
    run_contracts(&mut world, 2);
    assert_eq!(world.contracts().active_len(), 1);
    run_contracts(&mut world, 3);
    assert_eq!(world.contracts().active_len(), 0);
    assert!(world.contracts().potential_reward(town, WHEAT).is_none());
}

#[test]
fn monthly_draft_fills_the_books() {
    let (mut world, _) = world_with_town();
    let boundary = SystemContext {
        day: 1,
        day_of_month: 1,
        month: 1,
        year: 1,
        month_began: true,
        scenario_name: "test",
    };
    let mut rng = RngManager::new(9).stream("contracts", 1);
    ContractSystem::new()
        .run(&boundary, &mut world, &mut rng)
        .unwrap();
    let total = world.contracts().scheduled_len() + world.contracts().active_len();
    assert!(total > 0);
    assert!(total <= world.economy().contracts_per_month);

    let mut rng = RngManager::new(9).stream("events", 1);
    EventSystem::new()
        .run(&boundary, &mut world, &mut rng)
        .unwrap();
    let pending = world.scheduled_events().len();
    let active = usize::from(world.settlements()[0].active_event().is_some());
    // one settlement in the pool, so at most one draft lands
    assert_eq!(pending + active, 1);
}
