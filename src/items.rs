use serde::{Deserialize, Serialize};

/// Index into the [`Catalog`]. Items are registered once at world setup and
/// never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u16);

impl ItemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    /// Reference price before any supply/demand adjustment. Always positive.
    pub base_price: i64,
    /// Units a settlement at reference population eats per day.
    pub daily_base_consumption: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn get(&self, id: ItemId) -> &Item {
        &self.items[id.index()]
    }

    pub fn by_name(&self, name: &str) -> Option<ItemId> {
        self.items
            .iter()
            .position(|item| item.name == name)
            .map(|index| ItemId(index as u16))
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        (0..self.items.len()).map(|index| ItemId(index as u16))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The twelve-good roster used by the built-in scenarios.
    pub fn standard() -> Self {
        let spec: &[(&str, i64, i64)] = &[
            ("wheat", 10, 5),
            ("wood", 12, 4),
            ("fish", 15, 4),
            ("cotton", 18, 3),
            ("meat", 25, 3),
            ("coal", 30, 2),
            ("leather", 35, 2),
            ("iron", 40, 2),
            ("clothes", 60, 1),
            ("tools", 75, 1),
            ("spices", 90, 1),
            ("jewelry", 120, 1),
        ];
        Self::new(
            spec.iter()
                .map(|&(name, base_price, daily_base_consumption)| Item {
                    name: name.to_string(),
                    base_price,
                    daily_base_consumption,
                })
                .collect(),
        )
    }
}
