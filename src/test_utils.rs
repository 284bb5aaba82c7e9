//! Test fixtures shared by the unit tests

use crate::service::types::{
    CaptureResult, DailyPlanEntry, FoodItem, NutrientValue, Nutrition, WeeklyPlan,
};

/// Smallest screenshot the capture path accepts: three JPEG marker bytes.
pub const JPEG_DATA_URL: &str = "data:image/jpeg;base64,/9j/";

/// Days in service order.
pub const WEEK: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Classification of a grilled chicken plate (300 kcal, 40 protein, 2 carbs).
pub fn grilled_chicken() -> CaptureResult {
    CaptureResult {
        detected_label: "grilled_chicken".to_string(),
        nutrition: Nutrition {
            calories: Some(NutrientValue::Number(300.0)),
            protein: Some(NutrientValue::Number(40.0)),
            carbs: Some(NutrientValue::Number(2.0)),
            fat: None,
        },
    }
}

/// A food item with fixed macros.
pub fn food(name: &str, calories: f64) -> FoodItem {
    FoodItem {
        name: name.to_string(),
        calories,
        protein: 20.0,
        carbs: 30.0,
        fat: None,
        category: None,
    }
}

/// A plan with one day per total, named after the week in order.
pub fn week_plan(totals: &[f64]) -> WeeklyPlan {
    let days = totals
        .iter()
        .zip(WEEK.iter().cycle())
        .map(|(total, day)| DailyPlanEntry {
            day: day.to_string(),
            total_calories: *total,
            breakfast: food("oatmeal", 350.0),
            lunch: food("chicken_salad", 550.0),
            dinner: food("salmon_with_rice", 750.0),
            snacks: vec![food("greek_yogurt", 150.0)],
        })
        .collect();
    WeeklyPlan::from_entries(days)
}
