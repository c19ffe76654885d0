//! Dashboard report as long-format CSV: one `section,item,metric,value` row per figure.

use std::{fs::File, io, path::Path};

use anyhow::Context;
use serde::Serialize;

use crate::model::Dashboard;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportRow {
    pub section: &'static str,
    pub item: String,
    pub metric: &'static str,
    pub value: String,
}

impl ExportRow {
    fn new(
        section: &'static str,
        item: impl Into<String>,
        metric: &'static str,
        value: impl ToString,
    ) -> Self {
        Self {
            section,
            item: item.into(),
            metric,
            value: value.to_string(),
        }
    }
}

fn rating(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}

pub fn dashboard_rows(dashboard: &Dashboard) -> Vec<ExportRow> {
    let k = &dashboard.kpis;
    let mut rows = vec![
        ExportRow::new("kpi", "all", "total_reviews", k.total_reviews),
        ExportRow::new("kpi", "all", "active_reviews", k.active_reviews),
        ExportRow::new("kpi", "all", "rejected_reviews", k.rejected_reviews),
        ExportRow::new("kpi", "all", "rated_reviews", k.rated_reviews),
        ExportRow::new("kpi", "all", "average_rating", rating(k.average_rating)),
        ExportRow::new("kpi", "all", "total_products", k.total_products),
        ExportRow::new("kpi", "all", "total_categories", k.total_categories),
        ExportRow::new("kpi", "all", "total_criteria", k.total_criteria),
    ];

    let ranked = [
        ("top_products", &dashboard.best),
        ("bottom_products", &dashboard.worst),
    ];
    for (section, scores) in ranked {
        for (rank, s) in scores.iter().enumerate() {
            let name = s.product_name.as_str();
            rows.extend([
                ExportRow::new(section, name, "rank", rank + 1),
                ExportRow::new(section, name, "brand", &s.brand),
                ExportRow::new(section, name, "category", &s.category_name),
                ExportRow::new(section, name, "review_count", s.review_count),
                ExportRow::new(section, name, "average_rating", rating(Some(s.average_rating))),
            ]);
        }
    }

    for c in &dashboard.categories {
        let name = c.category_name.as_str();
        rows.extend([
            ExportRow::new("category", name, "review_count", c.review_count),
            ExportRow::new("category", name, "average_rating", rating(c.average_rating)),
        ]);
    }

    for c in &dashboard.criteria {
        let name = c.criterion_name.as_str();
        rows.extend([
            ExportRow::new("criterion", name, "weight", c.weight),
            ExportRow::new("criterion", name, "rating_count", c.rating_count),
            ExportRow::new("criterion", name, "average_rating", rating(c.average_rating)),
        ]);
    }

    for t in &dashboard.trend {
        rows.extend([
            ExportRow::new("trend", &t.month, "review_count", t.review_count),
            ExportRow::new("trend", &t.month, "average_rating", rating(t.average_rating)),
        ]);
    }
    rows
}

pub fn write_csv<W: io::Write>(writer: W, rows: &[ExportRow]) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}

/// Writes the report to `path` and returns the number of data rows.
pub fn export_dashboard(path: &Path, dashboard: &Dashboard) -> anyhow::Result<usize> {
    let rows = dashboard_rows(dashboard);
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    write_csv(file, &rows).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(rows.len())
}
