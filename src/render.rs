//! Terminal rendering for scan results and weekly plans
//!
//! Functions here build strings; printing is left to the caller so the
//! output can be asserted on in tests.

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use prettytable::{format, row, Table};

use crate::service::types::{CaptureResult, DailyPlanEntry, FoodItem, NutrientValue, WeeklyPlan};

/// Placeholder for a nutrient the service did not report.
pub const MISSING_VALUE: &str = "--";

fn nutrient(value: &Option<NutrientValue>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING_VALUE.to_string())
}

/// Text of the scan result card.
pub fn capture_card(result: &CaptureResult) -> String {
    let nutrition = &result.nutrition;
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row!["Cal", "Prot", "Carb"]);
    table.add_row(row![
        nutrient(&nutrition.calories),
        nutrient(&nutrition.protein).blue(),
        nutrient(&nutrition.carbs).green()
    ]);

    format!(
        "{} {}\n{}\n{}",
        "✔".green(),
        result.display_label().bold(),
        "Confidence: High".dimmed(),
        table
    )
}

/// Dimmed line stating when the scanned frame was taken, in local time.
pub fn scanned_at(taken_at: DateTime<Utc>) -> String {
    format!(
        "Scanned at {}",
        taken_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    )
    .dimmed()
    .to_string()
}

fn meal_line(slot: &str, food: &FoodItem) -> String {
    format!(
        "{}: {} ({}cal {}p {}c)",
        slot,
        food.display_name(),
        food.calories,
        food.protein,
        food.carbs
    )
}

/// Badge showing a day's total, green when balanced, yellow otherwise.
pub fn total_badge(entry: &DailyPlanEntry, target: u32) -> String {
    let text = format!("{} kcal", entry.total_calories);
    if entry.is_balanced(f64::from(target)) {
        text.green().to_string()
    } else {
        text.yellow().to_string()
    }
}

/// Body of one day group: meals, then snacks when there are any.
pub fn day_body(entry: &DailyPlanEntry) -> String {
    let mut lines = vec![
        meal_line("Breakfast", &entry.breakfast),
        meal_line("Lunch", &entry.lunch),
        meal_line("Dinner", &entry.dinner),
    ];
    if !entry.snacks.is_empty() {
        lines.push("Snacks & Extras:".to_string());
        lines.extend(
            entry
                .snacks
                .iter()
                .map(|snack| format!("  {} {}cal", snack.display_name(), snack.calories)),
        );
    }
    lines.join("\n")
}

/// Table with one row per day, in the plan's own order.
pub fn plan_table(plan: &WeeklyPlan, target: u32) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row!["Day", "Total", "Meals"]);
    for entry in plan {
        table.add_row(row![
            entry.day.bold(),
            total_badge(entry, target),
            day_body(entry)
        ]);
    }
    table
}

/// Full plan view with its heading.
pub fn plan_view(plan: &WeeklyPlan, target: u32) -> String {
    if plan.is_empty() {
        return format!("{}", "The service returned an empty plan.".yellow());
    }
    format!(
        "Weekly plan for {} kcal/day ({} days)\n{}",
        target,
        plan.len(),
        plan_table(plan, target)
    )
}
