//! Built-in healthy recipes copied into a user's catalogue the first time
//! their meal list is requested.

use crate::models::{MealCategory, NewMeal};

struct SeedRecipe {
    name: &'static str,
    description: &'static str,
    category: MealCategory,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    ingredients: &'static [&'static str],
    instructions: &'static [&'static str],
    prep_time_min: i64,
    cook_time_min: i64,
    servings: i64,
}

const SEED_RECIPES: &[SeedRecipe] = &[
    SeedRecipe {
        name: "Greek Yogurt Parfait",
        description: "Layered yogurt with berries and granola",
        category: MealCategory::Breakfast,
        calories: 320.0,
        protein: 20.0,
        carbs: 42.0,
        fat: 8.0,
        ingredients: &["Greek yogurt", "Mixed berries", "Granola", "Honey"],
        instructions: &[
            "Spoon half of the yogurt into a glass",
            "Add a layer of berries and granola",
            "Repeat and drizzle with honey",
        ],
        prep_time_min: 5,
        cook_time_min: 0,
        servings: 1,
    },
    SeedRecipe {
        name: "Veggie Omelette",
        description: "Three-egg omelette with spinach and peppers",
        category: MealCategory::Breakfast,
        calories: 290.0,
        protein: 21.0,
        carbs: 6.0,
        fat: 20.0,
        ingredients: &["Eggs", "Spinach", "Bell pepper", "Onion", "Olive oil"],
        instructions: &[
            "Whisk the eggs with a pinch of salt",
            "Saute the vegetables in olive oil",
            "Pour in the eggs and cook until set",
        ],
        prep_time_min: 5,
        cook_time_min: 10,
        servings: 1,
    },
    SeedRecipe {
        name: "Quinoa Buddha Bowl",
        description: "Quinoa with roasted chickpeas and tahini dressing",
        category: MealCategory::Lunch,
        calories: 520.0,
        protein: 19.0,
        carbs: 68.0,
        fat: 19.0,
        ingredients: &["Quinoa", "Chickpeas", "Sweet potato", "Kale", "Tahini", "Lemon"],
        instructions: &[
            "Cook the quinoa",
            "Roast the chickpeas and sweet potato",
            "Assemble over kale and dress with tahini and lemon",
        ],
        prep_time_min: 15,
        cook_time_min: 25,
        servings: 2,
    },
    SeedRecipe {
        name: "Grilled Chicken Salad",
        description: "Lean chicken breast over mixed greens",
        category: MealCategory::Lunch,
        calories: 380.0,
        protein: 38.0,
        carbs: 12.0,
        fat: 18.0,
        ingredients: &["Chicken breast", "Mixed greens", "Cherry tomatoes", "Cucumber", "Olive oil", "Balsamic vinegar"],
        instructions: &[
            "Grill the chicken and slice",
            "Toss the vegetables with oil and vinegar",
            "Top with the chicken",
        ],
        prep_time_min: 10,
        cook_time_min: 15,
        servings: 1,
    },
    SeedRecipe {
        name: "Baked Salmon with Vegetables",
        description: "Salmon fillet with roasted broccoli and carrots",
        category: MealCategory::Dinner,
        calories: 450.0,
        protein: 34.0,
        carbs: 20.0,
        fat: 25.0,
        ingredients: &["Salmon fillet", "Broccoli", "Carrots", "Lemon", "Garlic", "Olive oil"],
        instructions: &[
            "Heat the oven to 200C",
            "Arrange salmon and vegetables on a tray",
            "Season and bake for 18 minutes",
        ],
        prep_time_min: 10,
        cook_time_min: 18,
        servings: 2,
    },
    SeedRecipe {
        name: "Turkey Chili",
        description: "Lean turkey and bean chili",
        category: MealCategory::Dinner,
        calories: 410.0,
        protein: 32.0,
        carbs: 38.0,
        fat: 12.0,
        ingredients: &["Ground turkey", "Kidney beans", "Crushed tomatoes", "Onion", "Chili powder"],
        instructions: &[
            "Brown the turkey with the onion",
            "Add beans, tomatoes and spices",
            "Simmer for 30 minutes",
        ],
        prep_time_min: 10,
        cook_time_min: 35,
        servings: 4,
    },
    SeedRecipe {
        name: "Hummus and Veggie Sticks",
        description: "Carrot and cucumber sticks with hummus",
        category: MealCategory::Snack,
        calories: 180.0,
        protein: 6.0,
        carbs: 20.0,
        fat: 9.0,
        ingredients: &["Hummus", "Carrots", "Cucumber", "Celery"],
        instructions: &["Cut the vegetables into sticks", "Serve with hummus"],
        prep_time_min: 5,
        cook_time_min: 0,
        servings: 1,
    },
    SeedRecipe {
        name: "Apple with Almond Butter",
        description: "Sliced apple with a spoon of almond butter",
        category: MealCategory::Snack,
        calories: 200.0,
        protein: 4.0,
        carbs: 25.0,
        fat: 10.0,
        ingredients: &["Apple", "Almond butter"],
        instructions: &["Slice the apple", "Serve with almond butter"],
        prep_time_min: 3,
        cook_time_min: 0,
        servings: 1,
    },
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[must_use]
pub fn seed_meals() -> Vec<NewMeal> {
    SEED_RECIPES
        .iter()
        .map(|r| NewMeal {
            name: r.name.to_string(),
            description: Some(r.description.to_string()),
            category: r.category,
            calories: r.calories,
            protein: r.protein,
            carbs: r.carbs,
            fat: r.fat,
            ingredients: to_strings(r.ingredients),
            instructions: to_strings(r.instructions),
            prep_time_min: Some(r.prep_time_min),
            cook_time_min: Some(r.cook_time_min),
            servings: Some(r.servings),
            is_healthy: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validate_new_meal;

    #[test]
    fn test_seed_meals_are_valid() {
        let meals = seed_meals();
        assert!(!meals.is_empty());
        for meal in &meals {
            validate_new_meal(meal).unwrap();
        }
    }

    #[test]
    fn test_seed_covers_every_category() {
        let meals = seed_meals();
        for category in MealCategory::ALL {
            assert!(meals.iter().any(|m| m.category == *category));
        }
    }
}
