//! Daily market tick behaviour: consumption, production, tax, population.

use caravan::{
    engine::{System, SystemContext},
    events::EventKind,
    items::{Catalog, ItemId},
    rng::RngManager,
    systems::MarketSystem,
    world::{EconomyParams, MarketLine, SettlementId, SettlementInit, World},
    AgentParams,
};
use caravan::nav::Position;

const WHEAT: ItemId = ItemId(0);
const WOOD: ItemId = ItemId(1);

fn ctx(day: u64) -> SystemContext<'static> {
    SystemContext {
        day,
        day_of_month: ((day - 1) % 30) as u32 + 1,
        month: 1,
        year: 1,
        month_began: day == 1,
        scenario_name: "test",
    }
}

fn run_market(world: &mut World, day: u64) {
    let mut rng = RngManager::new(1).stream("market", day);
    MarketSystem::new()
        .run(&ctx(day), world, &mut rng)
        .unwrap();
}

fn empty_world() -> World {
    World::new(
        Catalog::standard(),
        EconomyParams::default(),
        AgentParams::default(),
    )
}

fn settlement(world: &mut World, name: &str, producer: bool, population: i64) -> SettlementId {
    world
        .add_settlement(SettlementInit {
            name: name.to_string(),
            is_producer: producer,
            position: Position::new(0.0, 0.0),
            population,
            min_population: 100,
            max_population: 1000,
            grow_population: false,
            dynamic_storage: false,
        })
        .unwrap()
}

#[test]
fn tax_moves_to_a_sovereign_trading_the_item() {
    let mut world = empty_world();
    let city = settlement(&mut world, "City", false, 500);
    let village = settlement(&mut world, "Village", true, 500);
    world.add_line(city, MarketLine::new(WHEAT, 50, 500, 0));
    world.add_line(village, MarketLine::new(WHEAT, 100, 400, 15));
    world.set_sovereign(village, city).unwrap();

    run_market(&mut world, 1);

    // village: 100 eaten 5, produced 15, taxed ceil(15 * 0.4) = 6
    assert_eq!(world.settlement(village).line(WHEAT).unwrap().stock, 104);
    // city: 50 eaten 5, taxed in 6
    assert_eq!(world.settlement(city).line(WHEAT).unwrap().stock, 51);
}

#[test]
fn tax_is_skipped_when_the_sovereign_lacks_the_line() {
    let mut world = empty_world();
    let city = settlement(&mut world, "City", false, 500);
    let village = settlement(&mut world, "Village", true, 500);
    // sovereign trades wood, not wheat
    world.add_line(city, MarketLine::new(WOOD, 50, 500, 0));
    world.add_line(village, MarketLine::new(WHEAT, 100, 400, 15));
    world.set_sovereign(village, city).unwrap();

    run_market(&mut world, 1);

    // producer keeps the whole day's production
    assert_eq!(world.settlement(village).line(WHEAT).unwrap().stock, 110);
    // city only ate its own wood (base 4 at ratio 1.0)
    assert_eq!(world.settlement(city).line(WOOD).unwrap().stock, 46);
}

#[test]
fn demand_never_rounds_to_zero() {
    let mut world = empty_world();
    let hamlet = settlement(&mut world, "Hamlet", false, 10);
    world.add_line(hamlet, MarketLine::new(WHEAT, 10, 500, 0));

    run_market(&mut world, 1);

    // 5 * (10 / 500) rounds to 0, floored to 1
    let line = world.settlement(hamlet).line(WHEAT).unwrap();
    assert_eq!(line.last_consumption, 1);
    assert_eq!(line.stock, 9);
}

#[test]
fn production_halts_at_the_hard_cap() {
    let mut world = empty_world();
    let village = settlement(&mut world, "Village", true, 500);
    world.add_line(village, MarketLine::new(WHEAT, 2005, 400, 15));

    run_market(&mut world, 1);

    // consumption brings stock to exactly 5x capacity; no production on top
    assert_eq!(world.settlement(village).line(WHEAT).unwrap().stock, 2000);
}

#[test]
fn event_multipliers_scale_the_tick() {
    let mut world = empty_world();
    let village = settlement(&mut world, "Village", true, 500);
    world.add_line(village, MarketLine::new(WHEAT, 100, 400, 15));
    assert!(world.apply_event(village, EventKind::Boom, 5));

    run_market(&mut world, 1);

    // eaten 5, produced 15 * 2.0 = 30, no sovereign so no tax
    assert_eq!(world.settlement(village).line(WHEAT).unwrap().stock, 125);
}

#[test]
fn population_feedback_and_dynamic_storage() {
    let mut world = empty_world();
    let fed = world
        .add_settlement(SettlementInit {
            name: "Fed".to_string(),
            is_producer: false,
            position: Position::new(0.0, 0.0),
            population: 1000,
            min_population: 100,
            max_population: 2000,
            grow_population: true,
            dynamic_storage: true,
        })
        .unwrap();
    let starved = world
        .add_settlement(SettlementInit {
            name: "Starved".to_string(),
            is_producer: false,
            position: Position::new(5.0, 0.0),
            population: 1000,
            min_population: 100,
            max_population: 2000,
            grow_population: true,
            dynamic_storage: false,
        })
        .unwrap();
    world.add_line(fed, MarketLine::new(WHEAT, 400, 500, 0));
    world.add_line(starved, MarketLine::new(WHEAT, 0, 500, 0));

    run_market(&mut world, 1);

    let fed = world.settlement(fed);
    assert_eq!(fed.population(), 1050);
    // 200 + 1050 / 10
    assert_eq!(fed.line(WHEAT).unwrap().max_stock, 305);

    let starved = world.settlement(starved);
    assert_eq!(starved.population(), 950);
    assert_eq!(starved.line(WHEAT).unwrap().max_stock, 500);
}

#[test]
fn untouched_settlements_keep_default_multipliers() {
    let mut world = empty_world();
    let city = settlement(&mut world, "City", false, 500);
    world.add_line(city, MarketLine::new(WHEAT, 300, 500, 0));

    for day in 1..=5 {
        run_market(&mut world, day);
    }

    // 5 per day at ratio 1.0, nothing else moves the line
    assert_eq!(world.settlement(city).line(WHEAT).unwrap().stock, 275);
}
