//! The price curve and bulk valuation.
//!
//! Price is a pure function of a market line's fill ratio. Below capacity
//! scarcity raises the multiplier linearly up to 3x; past capacity abundance
//! discounts it down to 0.4x, bottoming out at twice capacity. Both branches
//! meet at exactly 1.0 when stock equals capacity, so the curve is continuous
//! there. Producers sell at a further 20% discount.

pub const MIN_PRICE: i64 = 1;
pub const MAX_PRICE: i64 = 1000;
pub const SCARCITY_CEILING: f64 = 3.0;
pub const ABUNDANCE_FLOOR: f64 = 0.4;
pub const PRODUCER_DISCOUNT: f64 = 0.8;

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn fill_multiplier(fill: f64) -> f64 {
    if fill < 1.0 {
        lerp(SCARCITY_CEILING, 1.0, fill)
    } else {
        lerp(1.0, ABUNDANCE_FLOOR, (fill - 1.0).min(1.0))
    }
}

/// Spot price for one unit at the given stock level.
///
/// Empty stock is priced as if one unit remained, so the multiplier never
/// exceeds the scarcity ceiling.
pub fn unit_price(stock: i64, max_stock: i64, base_price: i64, is_producer: bool) -> i64 {
    let fill = stock.max(1) as f64 / max_stock as f64;
    let mut price = base_price as f64 * fill_multiplier(fill);
    if is_producer {
        price *= PRODUCER_DISCOUNT;
    }
    (price.round() as i64).clamp(MIN_PRICE, MAX_PRICE)
}

/// Total proceeds from selling `amount` units one at a time.
///
/// Each virtual sale raises the fill ratio before the next unit is priced, so
/// dumping a large load earns progressively less per unit. Real stock is not
/// touched.
pub fn bulk_sell_value(
    stock: i64,
    max_stock: i64,
    base_price: i64,
    is_producer: bool,
    amount: i64,
) -> i64 {
    let mut total = 0;
    let mut virtual_stock = stock;
    for _ in 0..amount.max(0) {
        total += unit_price(virtual_stock, max_stock, base_price, is_producer);
        virtual_stock += 1;
    }
    total
}
