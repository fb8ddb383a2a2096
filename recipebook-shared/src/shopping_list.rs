/// Shopping list aggregation and CSV rendering
///
/// The shopping list is derived from the user's shopping cart: every
/// ingredient amount of every recipe in the cart, summed per
/// `(name, measurement_unit)` pair. Ingredients sharing a name but measured
/// in different units stay separate lines.
///
/// Lines appear in first-seen order, walking the cart in insertion order and
/// each recipe's ingredients in insertion order.

use indexmap::IndexMap;
use sqlx::PgPool;

/// CSV header row
pub const CSV_HEADER: [&str; 2] = ["Ингредиент", "Количество"];

/// Suggested download file name
pub const FILE_NAME: &str = "shopping_cart.csv";

/// Error type for shopping list rendering
#[derive(Debug, thiserror::Error)]
pub enum ShoppingListError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// One ingredient amount contributed by a recipe in the cart
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CartRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// One aggregated line of the shopping list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingLine {
    pub name: String,
    pub measurement_unit: String,
    pub total: u64,
}

impl ShoppingLine {
    /// Display label, `"name (unit)"`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.measurement_unit)
    }
}

/// Loads every ingredient amount of the recipes in a user's cart
pub async fn cart_rows(pool: &PgPool, user_id: i64) -> Result<Vec<CartRow>, sqlx::Error> {
    sqlx::query_as::<_, CartRow>(
        r#"
        SELECT i.name, i.measurement_unit, ia.amount
        FROM shopping_cart sc
        JOIN ingredient_amounts ia ON ia.recipe_id = sc.recipe_id
        JOIN ingredients i ON i.id = ia.ingredient_id
        WHERE sc.user_id = $1
        ORDER BY sc.id, ia.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Sums amounts per `(name, unit)` pair, keeping first-seen order
pub fn aggregate(rows: impl IntoIterator<Item = CartRow>) -> Vec<ShoppingLine> {
    let mut totals: IndexMap<(String, String), u64> = IndexMap::new();

    for row in rows {
        let amount = u64::try_from(row.amount).unwrap_or(0);
        *totals.entry((row.name, row.measurement_unit)).or_insert(0) += amount;
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingLine {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// Renders lines as CSV (header included)
///
/// # Errors
///
/// Returns an error if the CSV writer fails.
pub fn render_csv(lines: &[ShoppingLine]) -> Result<Vec<u8>, ShoppingListError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for line in lines {
        writer.write_record([line.label(), line.total.to_string()])?;
    }

    writer
        .into_inner()
        .map_err(|e| ShoppingListError::Buffer(e.to_string()))
}

/// Builds the CSV shopping list for a user
///
/// # Errors
///
/// Returns an error on database or CSV failure.
pub async fn build_shopping_list(pool: &PgPool, user_id: i64) -> Result<Vec<u8>, ShoppingListError> {
    let rows = cart_rows(pool, user_id).await?;
    let lines = aggregate(rows);

    tracing::debug!(user_id, lines = lines.len(), "Shopping list built");
    render_csv(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartRow {
        CartRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_same_ingredient_summed_across_recipes() {
        let lines = aggregate(vec![row("Salt", "g", 5), row("Salt", "g", 3)]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].label(), "Salt (g)");
        assert_eq!(lines[0].total, 8);
    }

    #[test]
    fn test_different_units_stay_separate() {
        let lines = aggregate(vec![row("Milk", "ml", 200), row("Milk", "cup", 1)]);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label(), "Milk (ml)");
        assert_eq!(lines[1].label(), "Milk (cup)");
    }

    #[test]
    fn test_first_seen_order_kept() {
        let lines = aggregate(vec![
            row("Flour", "g", 100),
            row("Egg", "pcs", 2),
            row("Flour", "g", 50),
        ]);

        let labels: Vec<String> = lines.iter().map(ShoppingLine::label).collect();
        assert_eq!(labels, vec!["Flour (g)", "Egg (pcs)"]);
        assert_eq!(lines[0].total, 150);
    }

    #[test]
    fn test_empty_cart_renders_header_only() {
        let csv = render_csv(&aggregate(Vec::new())).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "Ингредиент,Количество\n");
    }

    #[test]
    fn test_render_csv_rows() {
        let csv = render_csv(&aggregate(vec![row("Salt", "g", 5), row("Salt", "g", 3)])).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "Ингредиент,Количество\nSalt (g),8\n"
        );
    }

    #[test]
    fn test_labels_with_commas_are_quoted() {
        let csv = render_csv(&aggregate(vec![row("Salt, sea", "g", 1)])).unwrap();
        assert!(String::from_utf8(csv).unwrap().contains("\"Salt, sea (g)\",1"));
    }
}
