use std::collections::HashMap;

use crate::models::{Meal, MealCategory, Nutrition, PlanSlots};

/// Sums nutrition over every meal id in every slot.
///
/// Ids missing from `meals` contribute nothing.
#[must_use]
pub fn recompute_totals(slots: &PlanSlots<i64>, meals: &HashMap<i64, Meal>) -> Nutrition {
    slots
        .iter()
        .filter_map(|(slot, id)| {
            let meal = meals.get(id);
            if meal.is_none() {
                tracing::warn!(meal_id = id, slot = %slot, "plan references unknown meal");
            }
            meal.map(Meal::nutrition)
        })
        .sum()
}

/// Returns false when the meal was already in the slot.
pub fn add_meal(slots: &mut PlanSlots<i64>, slot: MealCategory, meal_id: i64) -> bool {
    let ids = slots.slot_mut(slot);
    if ids.contains(&meal_id) {
        return false;
    }
    ids.push(meal_id);
    true
}

/// Returns false when the meal was not in the slot.
pub fn remove_meal(slots: &mut PlanSlots<i64>, slot: MealCategory, meal_id: i64) -> bool {
    let ids = slots.slot_mut(slot);
    let before = ids.len();
    ids.retain(|id| *id != meal_id);
    ids.len() != before
}

/// Drops a meal from all four slots.
pub fn remove_everywhere(slots: &mut PlanSlots<i64>, meal_id: i64) -> bool {
    let mut removed = false;
    for &slot in MealCategory::ALL {
        removed |= remove_meal(slots, slot, meal_id);
    }
    removed
}

/// Resolves ids to meals, dropping ids that no longer exist.
#[must_use]
pub fn resolve(slots: &PlanSlots<i64>, meals: &HashMap<i64, Meal>) -> PlanSlots<Meal> {
    let mut resolved = PlanSlots::default();
    for (slot, id) in slots.iter() {
        if let Some(meal) = meals.get(id) {
            resolved.slot_mut(slot).push(meal.clone());
        }
    }
    resolved
}
