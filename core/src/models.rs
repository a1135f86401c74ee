use std::fmt;
use std::ops::{Add, AddAssign};

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closed set of lowercase text values stored as TEXT columns and sent as
/// JSON strings. Parsing is case-insensitive.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $what:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self> {
                let lower = s.trim().to_lowercase();
                match lower.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => bail!(
                        "Invalid {} '{s}'. Must be one of: {}",
                        $what,
                        [$($text),+].join(", ")
                    ),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(
    /// Meal slot of a plan day, and the category a meal is filed under.
    MealCategory, "meal type" {
        Breakfast => "breakfast",
        Lunch => "lunch",
        Dinner => "dinner",
        Snack => "snack",
    }
);

text_enum!(
    Gender, "gender" {
        Male => "male",
        Female => "female",
    }
);

text_enum!(
    PaymentMethod, "payment method" {
        CashOnDelivery => "cod",
        Online => "online",
    }
);

text_enum!(
    OrderStatus, "order status" {
        Pending => "pending",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

text_enum!(
    TicketPriority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
);

text_enum!(
    TicketCategory, "ticket category" {
        Technical => "technical",
        Billing => "billing",
        General => "general",
        FeatureRequest => "feature-request",
    }
);

text_enum!(
    TicketStatus, "ticket status" {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
        Closed => "closed",
    }
);

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| anyhow::anyhow!("Invalid date '{s}'. Use YYYY-MM-DD"))
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// --- Users ---

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub full_name: String,
    pub created_at: String,
}

/// A freshly created user together with the only copy of its plaintext token.
#[derive(Debug, Clone, Serialize)]
pub struct NewUserToken {
    pub user: User,
    pub token: String,
}

pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        bail!("Invalid email '{email}'");
    };
    let domain_ok = domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && (2..=6).contains(&tld.len()));
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        bail!("Invalid email '{email}'");
    }
    Ok(email)
}

pub fn validate_full_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Full name must not be empty");
    }
    if name.chars().count() > 50 {
        bail!("Full name can not be more than 50 characters");
    }
    Ok(name.to_string())
}

// --- Nutrition ---

/// Calories and macros, either of one meal or summed over many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Add for Nutrition {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for Nutrition {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

// --- Meals ---

#[derive(Debug, Clone, Serialize)]
pub struct Meal {
    pub id: i64,
    pub uuid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: MealCategory,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_time_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_time_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<i64>,
    pub is_healthy: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Meal {
    #[must_use]
    pub fn nutrition(&self) -> Nutrition {
        Nutrition {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMeal {
    pub name: String,
    pub description: Option<String>,
    pub category: MealCategory,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub prep_time_min: Option<i64>,
    pub cook_time_min: Option<i64>,
    pub servings: Option<i64>,
    #[serde(default)]
    pub is_healthy: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMeal {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<MealCategory>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub prep_time_min: Option<i64>,
    pub cook_time_min: Option<i64>,
    pub servings: Option<i64>,
    pub is_healthy: Option<bool>,
}

impl UpdateMeal {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
            && self.ingredients.is_none()
            && self.instructions.is_none()
            && self.prep_time_min.is_none()
            && self.cook_time_min.is_none()
            && self.servings.is_none()
            && self.is_healthy.is_none()
    }
}

fn validate_meal_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Meal name must not be empty");
    }
    if name.trim().chars().count() > 100 {
        bail!("Meal name can not be more than 100 characters");
    }
    Ok(())
}

fn validate_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        bail!("{field} must be a number");
    }
    if value < 0.0 {
        bail!("{field} cannot be negative");
    }
    Ok(())
}

fn validate_ingredients(ingredients: &[String]) -> Result<()> {
    if ingredients.is_empty() {
        bail!("At least one ingredient is required");
    }
    if ingredients.iter().any(|i| i.trim().is_empty()) {
        bail!("Ingredients must not be blank");
    }
    Ok(())
}

fn validate_times(prep: Option<i64>, cook: Option<i64>, servings: Option<i64>) -> Result<()> {
    if prep.is_some_and(|v| v < 0) {
        bail!("Prep time cannot be negative");
    }
    if cook.is_some_and(|v| v < 0) {
        bail!("Cook time cannot be negative");
    }
    if servings.is_some_and(|v| v < 1) {
        bail!("Servings must be at least 1");
    }
    Ok(())
}

pub fn validate_new_meal(meal: &NewMeal) -> Result<()> {
    validate_meal_name(&meal.name)?;
    validate_amount("Calories", meal.calories)?;
    validate_amount("Protein", meal.protein)?;
    validate_amount("Carbs", meal.carbs)?;
    validate_amount("Fat", meal.fat)?;
    validate_ingredients(&meal.ingredients)?;
    validate_times(meal.prep_time_min, meal.cook_time_min, meal.servings)
}

pub fn validate_update_meal(update: &UpdateMeal) -> Result<()> {
    if update.is_empty() {
        bail!("At least one field must be provided");
    }
    if let Some(ref name) = update.name {
        validate_meal_name(name)?;
    }
    for (field, value) in [
        ("Calories", update.calories),
        ("Protein", update.protein),
        ("Carbs", update.carbs),
        ("Fat", update.fat),
    ] {
        if let Some(v) = value {
            validate_amount(field, v)?;
        }
    }
    if let Some(ref ingredients) = update.ingredients {
        validate_ingredients(ingredients)?;
    }
    validate_times(update.prep_time_min, update.cook_time_min, update.servings)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MealFilter {
    pub category: Option<MealCategory>,
    #[serde(default)]
    pub healthy: bool,
    pub q: Option<String>,
}

// --- Meal plan ---

/// The four slots of a plan day. Every slot is a list, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSlots<T> {
    pub breakfast: Vec<T>,
    pub lunch: Vec<T>,
    pub dinner: Vec<T>,
    pub snack: Vec<T>,
}

impl<T> Default for PlanSlots<T> {
    fn default() -> Self {
        Self {
            breakfast: Vec::new(),
            lunch: Vec::new(),
            dinner: Vec::new(),
            snack: Vec::new(),
        }
    }
}

impl<T> PlanSlots<T> {
    #[must_use]
    pub fn slot(&self, category: MealCategory) -> &[T] {
        match category {
            MealCategory::Breakfast => &self.breakfast,
            MealCategory::Lunch => &self.lunch,
            MealCategory::Dinner => &self.dinner,
            MealCategory::Snack => &self.snack,
        }
    }

    pub fn slot_mut(&mut self, category: MealCategory) -> &mut Vec<T> {
        match category {
            MealCategory::Breakfast => &mut self.breakfast,
            MealCategory::Lunch => &mut self.lunch,
            MealCategory::Dinner => &mut self.dinner,
            MealCategory::Snack => &mut self.snack,
        }
    }

    /// Every entry with its slot, in slot order then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (MealCategory, &T)> {
        MealCategory::ALL
            .iter()
            .flat_map(move |&c| self.slot(c).iter().map(move |item| (c, item)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.breakfast.len() + self.lunch.len() + self.dinner.len() + self.snack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDay {
    pub date: String,
    pub meals: PlanSlots<Meal>,
    pub totals: Nutrition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// One planned meal flattened to its day, as used by calorie aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct MealIntake {
    pub date: String,
    pub meal_id: i64,
    pub slot: MealCategory,
    pub calories: f64,
}

// --- Trackers ---

pub const ML_PER_GLASS: f64 = 250.0;

#[derive(Debug, Clone, Serialize)]
pub struct WaterEntry {
    pub id: i64,
    pub date: String,
    pub amount_ml: Option<f64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseEntry {
    pub id: i64,
    pub date: String,
    pub kind: String,
    pub duration_min: Option<f64>,
    pub calories_burned: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewExerciseEntry {
    pub date: NaiveDate,
    pub kind: String,
    pub duration_min: f64,
    pub calories_burned: Option<f64>,
    pub notes: Option<String>,
}

pub fn validate_exercise(entry: &NewExerciseEntry) -> Result<()> {
    if entry.kind.trim().is_empty() {
        bail!("Exercise type is required");
    }
    if !entry.duration_min.is_finite() || entry.duration_min <= 0.0 {
        bail!("duration_min must be greater than 0");
    }
    if let Some(c) = entry.calories_burned {
        validate_amount("calories_burned", c)?;
    }
    Ok(())
}

pub const MAX_WEIGHT_KG: f64 = 500.0;

#[derive(Debug, Clone, Serialize)]
pub struct WeightEntry {
    pub id: i64,
    pub date: String,
    pub weight_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub fn validate_weight_kg(weight_kg: f64) -> Result<()> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 || weight_kg > MAX_WEIGHT_KG {
        bail!("Weight must be between 0 and {MAX_WEIGHT_KG} kg");
    }
    Ok(())
}

// --- Goals and profile ---

pub const DEFAULT_CALORIE_GOAL: i64 = 2000;
pub const DEFAULT_WATER_GOAL_ML: i64 = 2000;
pub const DEFAULT_EXERCISE_GOAL_MIN: i64 = 150;
pub const MAX_GOAL: i64 = 10_000;

#[derive(Debug, Clone, Serialize)]
pub struct UserGoals {
    pub calorie_goal: i64,
    pub water_goal_ml: i64,
    /// Weekly minutes.
    pub exercise_goal_min: i64,
    pub customized: bool,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGoals {
    pub calorie_goal: Option<i64>,
    pub water_goal_ml: Option<i64>,
    pub exercise_goal_min: Option<i64>,
}

pub fn validate_goals(update: &UpdateGoals) -> Result<()> {
    for (field, value) in [
        ("calorie_goal", update.calorie_goal),
        ("water_goal_ml", update.water_goal_ml),
        ("exercise_goal_min", update.exercise_goal_min),
    ] {
        if value.is_some_and(|v| !(0..=MAX_GOAL).contains(&v)) {
            bail!("Invalid {field}: must be between 0 and {MAX_GOAL}");
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthProfile {
    pub age: Option<i64>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_bmi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_calculated: Option<String>,
}

/// The last BMI calculation with the inputs that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct BmiRecord {
    pub bmi: f64,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
    pub calculated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProteinRecord {
    pub weight_kg: f64,
    pub goal_factor: f64,
    pub protein_g: i64,
    pub calculated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub age: Option<i64>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
}

pub fn validate_profile(update: &UpdateProfile) -> Result<()> {
    if update.age.is_some_and(|a| a <= 0) {
        bail!("age must be greater than 0");
    }
    if let Some(w) = update.weight_kg {
        validate_weight_kg(w)?;
    }
    if update.height_cm.is_some_and(|h| !h.is_finite() || h <= 0.0) {
        bail!("height_cm must be greater than 0");
    }
    Ok(())
}

// --- Shopping list ---

#[derive(Debug, Clone, Serialize)]
pub struct ShoppingItem {
    pub id: i64,
    pub ingredient_name: String,
    pub amount: String,
    pub unit: String,
    pub checked: bool,
    pub recipe_title: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewShoppingItem {
    pub ingredient_name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub recipe_title: String,
}

pub fn validate_shopping_item(item: &NewShoppingItem) -> Result<()> {
    let name = item.ingredient_name.trim();
    if name.is_empty() {
        bail!("Ingredient name is required");
    }
    if name.chars().count() > 200 {
        bail!("Ingredient name can not be more than 200 characters");
    }
    Ok(())
}

// --- Orders ---

pub const PRICE_PER_MEAL: f64 = 10.0;

#[derive(Debug, Clone, Serialize)]
pub struct OrderMeal {
    pub meal_id: i64,
    pub name: String,
    pub category: MealCategory,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: i64,
    pub uuid: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total_calories: f64,
    pub total_price: f64,
    pub meals: Vec<OrderMeal>,
    pub created_at: String,
    pub updated_at: String,
}

// --- Support tickets ---

#[derive(Debug, Clone, Serialize)]
pub struct TicketResponse {
    pub id: i64,
    pub message: String,
    pub is_admin: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupportTicket {
    pub id: i64,
    pub uuid: String,
    pub subject: String,
    pub message: String,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub status: TicketStatus,
    pub user_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    pub responses: Vec<TicketResponse>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewSupportTicket {
    pub subject: String,
    pub message: String,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub user_email: String,
    pub contact_number: Option<String>,
}

pub fn validate_ticket_text(subject: &str, message: &str) -> Result<()> {
    if subject.trim().is_empty() || message.trim().is_empty() {
        bail!("Subject and message are required");
    }
    if subject.chars().count() > 200 {
        bail!("Subject can not be more than 200 characters");
    }
    validate_ticket_message(message)
}

pub fn validate_ticket_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Message is required");
    }
    if message.chars().count() > 2000 {
        bail!("Message can not be more than 2000 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meal() -> NewMeal {
        NewMeal {
            name: "Oatmeal".to_string(),
            description: None,
            category: MealCategory::Breakfast,
            calories: 300.0,
            protein: 10.0,
            carbs: 50.0,
            fat: 6.0,
            ingredients: vec!["oats".to_string(), "milk".to_string()],
            instructions: vec![],
            prep_time_min: Some(5),
            cook_time_min: Some(5),
            servings: Some(1),
            is_healthy: true,
        }
    }

    #[test]
    fn test_meal_category_parse() {
        assert_eq!("lunch".parse::<MealCategory>().unwrap(), MealCategory::Lunch);
        assert_eq!(
            "BREAKFAST".parse::<MealCategory>().unwrap(),
            MealCategory::Breakfast
        );
        assert_eq!(" Snack ".parse::<MealCategory>().unwrap(), MealCategory::Snack);
        assert!("brunch".parse::<MealCategory>().is_err());
        assert!("".parse::<MealCategory>().is_err());
    }

    #[test]
    fn test_invalid_text_enum_lists_choices() {
        let err = "brunch".parse::<MealCategory>().unwrap_err().to_string();
        assert_eq!(
            err,
            "Invalid meal type 'brunch'. Must be one of: breakfast, lunch, dinner, snack"
        );
    }

    #[test]
    fn test_text_enum_serde_uses_text() {
        let json = serde_json::to_string(&TicketCategory::FeatureRequest).unwrap();
        assert_eq!(json, "\"feature-request\"");
        let status: TicketStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, TicketStatus::InProgress);
        assert_eq!(PaymentMethod::CashOnDelivery.to_string(), "cod");
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(" Ana@Example.com ").unwrap(),
            "ana@example.com"
        );
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_full_name() {
        assert_eq!(validate_full_name("  Ana Lima ").unwrap(), "Ana Lima");
        assert!(validate_full_name("   ").is_err());
        assert!(validate_full_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_nutrition_sum() {
        let a = Nutrition {
            calories: 100.0,
            protein: 1.0,
            carbs: 2.0,
            fat: 3.0,
        };
        let total: Nutrition = [a, a, a].into_iter().sum();
        assert!((total.calories - 300.0).abs() < f64::EPSILON);
        assert!((total.fat - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_new_meal_valid() {
        assert!(validate_new_meal(&sample_meal()).is_ok());
    }

    #[test]
    fn test_validate_new_meal_zero_values_allowed() {
        let mut meal = sample_meal();
        meal.calories = 0.0;
        meal.fat = 0.0;
        assert!(validate_new_meal(&meal).is_ok());
    }

    #[test]
    fn test_validate_new_meal_negative_macro() {
        let mut meal = sample_meal();
        meal.protein = -1.0;
        assert!(validate_new_meal(&meal).is_err());
    }

    #[test]
    fn test_validate_new_meal_no_ingredients() {
        let mut meal = sample_meal();
        meal.ingredients.clear();
        assert!(validate_new_meal(&meal).is_err());

        meal.ingredients = vec!["  ".to_string()];
        assert!(validate_new_meal(&meal).is_err());
    }

    #[test]
    fn test_validate_new_meal_name_length() {
        let mut meal = sample_meal();
        meal.name = "a".repeat(101);
        assert!(validate_new_meal(&meal).is_err());
        meal.name = " ".to_string();
        assert!(validate_new_meal(&meal).is_err());
    }

    #[test]
    fn test_validate_new_meal_servings() {
        let mut meal = sample_meal();
        meal.servings = Some(0);
        assert!(validate_new_meal(&meal).is_err());
    }

    #[test]
    fn test_validate_update_meal() {
        assert!(validate_update_meal(&UpdateMeal::default()).is_err());
        let update = UpdateMeal {
            calories: Some(-5.0),
            ..UpdateMeal::default()
        };
        assert!(validate_update_meal(&update).is_err());
        let update = UpdateMeal {
            ingredients: Some(vec![]),
            ..UpdateMeal::default()
        };
        assert!(validate_update_meal(&update).is_err());
        let update = UpdateMeal {
            calories: Some(250.0),
            ..UpdateMeal::default()
        };
        assert!(validate_update_meal(&update).is_ok());
    }

    #[test]
    fn test_plan_slots_iter_order() {
        let mut slots: PlanSlots<i64> = PlanSlots::default();
        slots.slot_mut(MealCategory::Snack).push(4);
        slots.slot_mut(MealCategory::Breakfast).push(1);
        slots.slot_mut(MealCategory::Breakfast).push(2);
        slots.slot_mut(MealCategory::Dinner).push(3);

        let order: Vec<(MealCategory, i64)> = slots.iter().map(|(c, id)| (c, *id)).collect();
        assert_eq!(
            order,
            vec![
                (MealCategory::Breakfast, 1),
                (MealCategory::Breakfast, 2),
                (MealCategory::Dinner, 3),
                (MealCategory::Snack, 4),
            ]
        );
        assert_eq!(slots.len(), 4);
        assert!(!slots.is_empty());
    }

    #[test]
    fn test_plan_slots_serializes_every_slot() {
        let slots: PlanSlots<i64> = PlanSlots::default();
        let value = serde_json::to_value(&slots).unwrap();
        for key in MealCategory::ALL {
            assert_eq!(value[key.as_str()], serde_json::json!([]));
        }
    }

    #[test]
    fn test_validate_exercise() {
        let mut entry = NewExerciseEntry {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            kind: "running".to_string(),
            duration_min: 30.0,
            calories_burned: Some(250.0),
            notes: None,
        };
        assert!(validate_exercise(&entry).is_ok());
        entry.duration_min = 0.0;
        assert!(validate_exercise(&entry).is_err());
        entry.duration_min = 30.0;
        entry.kind = " ".to_string();
        assert!(validate_exercise(&entry).is_err());
    }

    #[test]
    fn test_validate_weight_kg() {
        assert!(validate_weight_kg(70.0).is_ok());
        assert!(validate_weight_kg(500.0).is_ok());
        assert!(validate_weight_kg(0.0).is_err());
        assert!(validate_weight_kg(500.1).is_err());
        assert!(validate_weight_kg(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_goals() {
        let ok = UpdateGoals {
            calorie_goal: Some(1800),
            water_goal_ml: None,
            exercise_goal_min: Some(0),
        };
        assert!(validate_goals(&ok).is_ok());
        let bad = UpdateGoals {
            water_goal_ml: Some(10_001),
            ..UpdateGoals::default()
        };
        assert!(validate_goals(&bad).is_err());
        let negative = UpdateGoals {
            calorie_goal: Some(-1),
            ..UpdateGoals::default()
        };
        assert!(validate_goals(&negative).is_err());
    }

    #[test]
    fn test_validate_profile() {
        let ok = UpdateProfile {
            age: Some(30),
            weight_kg: Some(70.0),
            height_cm: Some(175.0),
            gender: Some(Gender::Female),
        };
        assert!(validate_profile(&ok).is_ok());
        let bad = UpdateProfile {
            height_cm: Some(0.0),
            ..UpdateProfile::default()
        };
        assert!(validate_profile(&bad).is_err());
        let bad_age = UpdateProfile {
            age: Some(0),
            ..UpdateProfile::default()
        };
        assert!(validate_profile(&bad_age).is_err());
    }

    #[test]
    fn test_validate_shopping_item() {
        let mut item = NewShoppingItem {
            ingredient_name: "Eggs".to_string(),
            amount: "12".to_string(),
            unit: String::new(),
            checked: false,
            recipe_title: String::new(),
        };
        assert!(validate_shopping_item(&item).is_ok());
        item.ingredient_name = String::new();
        assert!(validate_shopping_item(&item).is_err());
        item.ingredient_name = "x".repeat(201);
        assert!(validate_shopping_item(&item).is_err());
    }

    #[test]
    fn test_validate_ticket_text() {
        assert!(validate_ticket_text("Login", "Cannot log in").is_ok());
        assert!(validate_ticket_text("", "Cannot log in").is_err());
        assert!(validate_ticket_text("Login", "").is_err());
        assert!(validate_ticket_text(&"s".repeat(201), "m").is_err());
        assert!(validate_ticket_text("s", &"m".repeat(2001)).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        let err = parse_date("2024-13-01").unwrap_err().to_string();
        assert_eq!(err, "Invalid date '2024-13-01'. Use YYYY-MM-DD");
    }
}
