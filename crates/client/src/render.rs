//! Plain-text views of the dashboard panels and listings.

use crate::model::{
    CategoryStat, CriterionStat, Dashboard, Kpis, Page, Product, ProductScore, Review, TrendPoint,
};

const MAX_RATING: f64 = 5.0;
const BAR_WIDTH: usize = 30;

pub fn fmt_rating(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

/// Horizontal bar scaled against `max`; never longer than `width`.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if !(value.is_finite() && max.is_finite()) || max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max).min(1.0) * width as f64).round() as usize;
    "#".repeat(filled.max(1))
}

fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

fn heading(title: &str) -> Vec<String> {
    vec![title.to_string(), "-".repeat(title.chars().count())]
}

pub fn render_kpis(kpis: &Kpis) -> String {
    let cards = [
        ("Reviews", kpis.total_reviews.to_string()),
        ("Active", kpis.active_reviews.to_string()),
        ("Rejected", kpis.rejected_reviews.to_string()),
        ("Average rating", fmt_rating(kpis.average_rating)),
        ("Products", kpis.total_products.to_string()),
        ("Categories", kpis.total_categories.to_string()),
        ("Criteria", kpis.total_criteria.to_string()),
    ];
    let mut lines = heading("Key figures");
    lines.extend(cards.iter().map(|(label, value)| format!("{:<16}{:>10}", label, value)));
    lines.join("\n")
}

pub fn render_product_scores(title: &str, rows: &[ProductScore]) -> String {
    let mut lines = heading(title);
    if rows.is_empty() {
        lines.push("(no rated reviews)".into());
        return lines.join("\n");
    }
    lines.push(format!(
        "{:>3}  {:<24} {:<12} {:<14} {:>7} {:>7}",
        "#", "Product", "Brand", "Category", "Reviews", "Avg"
    ));
    for (rank, row) in rows.iter().enumerate() {
        lines.push(format!(
            "{:>3}  {:<24} {:<12} {:<14} {:>7} {:>7.2}",
            rank + 1,
            fit(&row.product_name, 24),
            fit(&row.brand, 12),
            fit(&row.category_name, 14),
            row.review_count,
            row.average_rating
        ));
    }
    lines.join("\n")
}

pub fn render_categories(rows: &[CategoryStat]) -> String {
    let mut lines = heading("Categories");
    for row in rows {
        lines.push(format!(
            "{:<18} {:>7} {:>6}  {}",
            fit(&row.category_name, 18),
            row.review_count,
            fmt_rating(row.average_rating),
            bar(row.average_rating.unwrap_or_default(), MAX_RATING, BAR_WIDTH)
        ));
    }
    lines.join("\n")
}

pub fn render_criteria(rows: &[CriterionStat]) -> String {
    let mut lines = heading("Criteria");
    for row in rows {
        lines.push(format!(
            "{:<18} w={:<5} {:>6}  {}",
            fit(&row.criterion_name, 18),
            row.weight,
            fmt_rating(row.average_rating),
            bar(row.average_rating.unwrap_or_default(), MAX_RATING, BAR_WIDTH)
        ));
    }
    lines.join("\n")
}

pub fn render_trend(points: &[TrendPoint]) -> String {
    let mut lines = heading("Monthly trend");
    let peak = points.iter().map(|p| p.review_count).max().unwrap_or(0) as f64;
    for point in points {
        lines.push(format!(
            "{:<8} {:>5} {:>6}  {}",
            point.month,
            point.review_count,
            fmt_rating(point.average_rating),
            bar(point.review_count as f64, peak, BAR_WIDTH)
        ));
    }
    lines.join("\n")
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    [
        render_kpis(&dashboard.kpis),
        render_product_scores("Top products", &dashboard.best),
        render_product_scores("Lowest rated products", &dashboard.worst),
        render_categories(&dashboard.categories),
        render_criteria(&dashboard.criteria),
        render_trend(&dashboard.trend),
    ]
    .join("\n\n")
}

pub fn render_products(products: &[Product]) -> String {
    let mut lines = vec![format!(
        "{:>5}  {:<24} {:<12} {:<14}",
        "ID", "Name", "Brand", "Category"
    )];
    for product in products {
        lines.push(format!(
            "{:>5}  {:<24} {:<12} {:<14}",
            product.id,
            fit(&product.name, 24),
            fit(&product.brand, 12),
            fit(product.category_name.as_deref().unwrap_or("-"), 14)
        ));
    }
    lines.join("\n")
}

pub fn render_reviews(page: &Page<Review>) -> String {
    let mut lines = vec![format!(
        "{:>5}  {:<10} {:<24} {:<9} {:>6}  Ratings",
        "ID", "Date", "Product", "Status", "Score"
    )];
    for review in &page.items {
        let ratings = review
            .ratings
            .iter()
            .map(|r| format!("{}={}", r.criterion_name, r.rating))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "{:>5}  {:<10} {:<24} {:<9} {:>6}  {}",
            review.id,
            review.date_created.format("%Y-%m-%d"),
            fit(&review.product_name, 24),
            review.status,
            fmt_rating(review.integral_rating),
            ratings
        ));
    }
    lines.push(format!(
        "page {} of {} ({} reviews)",
        page.page,
        page.total_pages.max(1),
        page.total
    ));
    lines.join("\n")
}
