//! Who eats which (day, meal type) slot.

use std::collections::{BTreeMap, BTreeSet};

use mealplan_db::models::{DayOfWeek, MealSlot, MealType, Profile};
use uuid::Uuid;

/// Per-slot eaters derived from household profiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    eaters: BTreeMap<MealSlot, Vec<Uuid>>,
}

impl Schedule {
    pub fn from_profiles(profiles: &[Profile]) -> Self {
        let mut eaters: BTreeMap<MealSlot, Vec<Uuid>> = BTreeMap::new();
        for profile in profiles {
            for slot in &profile.slots {
                let people = eaters.entry(*slot).or_default();
                if !people.contains(&profile.id) {
                    people.push(profile.id);
                }
            }
        }
        Self { eaters }
    }

    /// Number of people eating `slot`.
    pub fn eaters(&self, slot: MealSlot) -> usize {
        self.eaters.get(&slot).map_or(0, Vec::len)
    }

    pub fn people_for(&self, slot: MealSlot) -> &[Uuid] {
        self.eaters.get(&slot).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.eaters.is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = MealSlot> + '_ {
        self.eaters.keys().copied()
    }

    /// Meal types that at least one person eats on at least one day.
    pub fn meal_types(&self) -> BTreeSet<MealType> {
        self.eaters.keys().map(|slot| slot.meal_type).collect()
    }

    pub fn has_snacks(&self) -> bool {
        self.eaters.keys().any(|slot| slot.meal_type == MealType::Snack)
    }

    /// Days with at least one scheduled slot of any of `meal_types`. An empty
    /// list matches every meal type.
    pub fn days_serving(&self, meal_types: &[MealType]) -> BTreeSet<DayOfWeek> {
        self.eaters
            .keys()
            .filter(|slot| meal_types.is_empty() || meal_types.contains(&slot.meal_type))
            .map(|slot| slot.day)
            .collect()
    }
}
