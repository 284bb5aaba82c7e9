//! Response types returned by the SmartMeal service
//!
//! Field names follow the wire format. The weekly plan keeps the day order
//! exactly as the service sent it; nothing here sorts or validates days.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Allowed distance between a day's total and the target for the day to
/// count as balanced. The comparison is strict.
pub const BALANCED_TOLERANCE: f64 = 100.0;

/// Turn a service label such as `grilled_chicken` into display text.
///
/// # Examples
///
/// ```
/// use smartmeal::service::types::display_name;
///
/// assert_eq!(display_name("grilled_chicken"), "grilled chicken");
/// ```
pub fn display_name(label: &str) -> String {
    label.replace('_', " ")
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// One nutrient reading.
///
/// The service sends bare numbers for known foods and text such as `"40g"`
/// or `"Unknown"` otherwise; both are displayed exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NutrientValue {
    /// Numeric value
    Number(f64),
    /// Free-form value
    Text(String),
}

impl fmt::Display for NutrientValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Nutrition estimate for a detected food. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<NutrientValue>,
}

/// Result of classifying one captured frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResult {
    /// Raw label as returned by the classifier
    #[serde(rename = "food_detected")]
    pub detected_label: String,

    /// Nutrition looked up for the label
    #[serde(
        rename = "nutrition_data",
        default,
        deserialize_with = "null_as_default"
    )]
    pub nutrition: Nutrition,
}

impl CaptureResult {
    /// Label with underscores replaced by spaces.
    pub fn display_label(&self) -> String {
        display_name(&self.detected_label)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Weekly plan
// ---------------------------------------------------------------------------

/// A food assigned to a meal slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl FoodItem {
    /// Name with underscores replaced by spaces.
    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }
}

/// Meals for one day of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPlanEntry {
    /// Day name; taken from the plan's key, not from the entry body
    #[serde(default, skip_serializing)]
    pub day: String,
    pub total_calories: f64,
    pub breakfast: FoodItem,
    pub lunch: FoodItem,
    pub dinner: FoodItem,
    #[serde(default, deserialize_with = "null_as_default")]
    pub snacks: Vec<FoodItem>,
}

impl DailyPlanEntry {
    /// Whether the day's total lands within [`BALANCED_TOLERANCE`] of
    /// `target`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use smartmeal::service::types::{DailyPlanEntry, FoodItem};
    /// # let item = FoodItem { name: "x".into(), calories: 0.0, protein: 0.0, carbs: 0.0, fat: None, category: None };
    /// let mut day = DailyPlanEntry {
    ///     day: "Monday".into(),
    ///     total_calories: 2099.0,
    ///     breakfast: item.clone(),
    ///     lunch: item.clone(),
    ///     dinner: item,
    ///     snacks: vec![],
    /// };
    /// assert!(day.is_balanced(2000.0));
    /// day.total_calories = 2101.0;
    /// assert!(!day.is_balanced(2000.0));
    /// ```
    pub fn is_balanced(&self, target: f64) -> bool {
        (self.total_calories - target).abs() < BALANCED_TOLERANCE
    }
}

/// Day-keyed collection of daily entries in service order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyPlan {
    days: Vec<DailyPlanEntry>,
}

impl WeeklyPlan {
    /// Build a plan from entries already in display order.
    pub fn from_entries(days: Vec<DailyPlanEntry>) -> Self {
        Self { days }
    }

    /// Number of days present.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// True when the service returned no days.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Days in the order the service returned them.
    pub fn iter(&self) -> std::slice::Iter<'_, DailyPlanEntry> {
        self.days.iter()
    }

    /// Look up a day by name.
    pub fn get(&self, day: &str) -> Option<&DailyPlanEntry> {
        self.days.iter().find(|entry| entry.day == day)
    }
}

impl<'a> IntoIterator for &'a WeeklyPlan {
    type Item = &'a DailyPlanEntry;
    type IntoIter = std::slice::Iter<'a, DailyPlanEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for WeeklyPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for entry in &self.days {
            map.serialize_entry(&entry.day, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WeeklyPlan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlanVisitor;

        impl<'de> Visitor<'de> for PlanVisitor {
            type Value = WeeklyPlan;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of day names to daily plan entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut days = Vec::with_capacity(access.size_hint().unwrap_or(7));
                while let Some((day, mut entry)) =
                    access.next_entry::<String, DailyPlanEntry>()?
                {
                    if days.iter().any(|e: &DailyPlanEntry| e.day == day) {
                        return Err(de::Error::custom(format!("duplicate day `{}`", day)));
                    }
                    entry.day = day;
                    days.push(entry);
                }
                Ok(WeeklyPlan { days })
            }
        }

        deserializer.deserialize_map(PlanVisitor)
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Reply from the service root endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn food(name: &str, calories: f64) -> serde_json::Value {
        json!({"id": 1, "name": name, "calories": calories, "protein": 10.5, "carbs": 20.0, "fat": 3.0, "category": "lunch"})
    }

    #[test]
    fn test_capture_result_from_wire_numbers() {
        let result: CaptureResult = serde_json::from_value(json!({
            "success": true,
            "food_detected": "grilled_chicken",
            "nutrition_data": {"calories": 300, "protein": 40, "carbs": 2}
        }))
        .unwrap();

        assert_eq!(result.display_label(), "grilled chicken");
        assert_eq!(result.nutrition.calories.unwrap().to_string(), "300");
        assert_eq!(result.nutrition.protein.unwrap().to_string(), "40");
        assert_eq!(result.nutrition.carbs.unwrap().to_string(), "2");
        assert!(result.nutrition.fat.is_none());
    }

    #[test]
    fn test_capture_result_from_wire_text_values() {
        let result: CaptureResult = serde_json::from_value(json!({
            "food_detected": "pizza",
            "nutrition_data": {"calories": "Unknown", "protein": "12.5g", "carbs": "?", "fat": "?"}
        }))
        .unwrap();

        assert_eq!(
            result.nutrition.calories,
            Some(NutrientValue::Text("Unknown".into()))
        );
        assert_eq!(result.nutrition.protein.unwrap().to_string(), "12.5g");
    }

    #[test]
    fn test_capture_result_missing_or_null_nutrition() {
        let missing: CaptureResult =
            serde_json::from_value(json!({"food_detected": "ramen"})).unwrap();
        assert_eq!(missing.nutrition, Nutrition::default());

        let null: CaptureResult =
            serde_json::from_value(json!({"food_detected": "ramen", "nutrition_data": null}))
                .unwrap();
        assert_eq!(null.nutrition, Nutrition::default());
    }

    #[test]
    fn test_nutrient_value_display_fractional() {
        assert_eq!(NutrientValue::Number(12.5).to_string(), "12.5");
    }

    #[test]
    fn test_weekly_plan_preserves_wire_order() {
        let body = r#"{
            "Sunday":  {"breakfast": {"name": "oatmeal", "calories": 300}, "lunch": {"name": "salad", "calories": 400}, "dinner": {"name": "steak", "calories": 900}, "snacks": [], "total_calories": 1600},
            "Monday":  {"breakfast": {"name": "eggs", "calories": 350}, "lunch": {"name": "soup", "calories": 450}, "dinner": {"name": "fish", "calories": 800}, "snacks": [{"name": "apple_pie", "calories": 300}], "total_calories": 1900}
        }"#;
        let plan: WeeklyPlan = serde_json::from_str(body).unwrap();

        let days: Vec<&str> = plan.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(days, vec!["Sunday", "Monday"]);
        assert_eq!(plan.get("Monday").unwrap().snacks[0].display_name(), "apple pie");
        assert_eq!(plan.get("Sunday").unwrap().breakfast.protein, 0.0);
    }

    #[test]
    fn test_weekly_plan_accepts_extra_food_fields() {
        let plan: WeeklyPlan = serde_json::from_value(json!({
            "Friday": {
                "breakfast": food("pancakes", 450.0),
                "lunch": food("burrito", 700.0),
                "dinner": food("sushi", 650.0),
                "snacks": null,
                "total_calories": 1800
            }
        }))
        .unwrap();

        let friday = plan.get("Friday").unwrap();
        assert_eq!(friday.lunch.fat, Some(3.0));
        assert_eq!(friday.lunch.category.as_deref(), Some("lunch"));
        assert!(friday.snacks.is_empty());
    }

    #[test]
    fn test_weekly_plan_rejects_duplicate_days() {
        let body = r#"{
            "Monday": {"breakfast": {"name": "a", "calories": 1}, "lunch": {"name": "b", "calories": 1}, "dinner": {"name": "c", "calories": 1}, "total_calories": 3},
            "Monday": {"breakfast": {"name": "a", "calories": 1}, "lunch": {"name": "b", "calories": 1}, "dinner": {"name": "c", "calories": 1}, "total_calories": 3}
        }"#;
        assert!(serde_json::from_str::<WeeklyPlan>(body).is_err());
    }

    #[test]
    fn test_weekly_plan_serializes_as_map() {
        let plan: WeeklyPlan = serde_json::from_value(json!({
            "Tuesday": {"breakfast": food("toast", 200.0), "lunch": food("wrap", 500.0), "dinner": food("curry", 700.0), "total_calories": 1400}
        }))
        .unwrap();

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["Tuesday"]["total_calories"], 1400.0);
        assert!(value["Tuesday"].get("day").is_none());
    }

    #[test]
    fn test_is_balanced_boundaries() {
        let plan: WeeklyPlan = serde_json::from_value(json!({
            "Monday": {"breakfast": food("a", 1.0), "lunch": food("b", 1.0), "dinner": food("c", 1.0), "total_calories": 1901}
        }))
        .unwrap();
        let mut day = plan.get("Monday").unwrap().clone();

        assert!(day.is_balanced(2000.0));
        day.total_calories = 2000.0;
        assert!(day.is_balanced(2000.0));
        day.total_calories = 2100.0;
        assert!(!day.is_balanced(2000.0));
        day.total_calories = 2101.0;
        assert!(!day.is_balanced(2000.0));
        day.total_calories = 1899.0;
        assert!(!day.is_balanced(2000.0));
    }
}
