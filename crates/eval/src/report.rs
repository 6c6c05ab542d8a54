use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::Path;

use crate::judge::{EntityJudgment, RelationshipJudgment};
use crate::metrics::Metrics;

/// Per-row judgment sheets, one file per category.
pub fn write_entity_judgments(path: &Path, judgments: &[EntityJudgment]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(["entity_type", "name", "verdict"])?;
    for j in judgments {
        writer.write_record([&j.entity_type, &j.name, j.verdict.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_relationship_judgments(path: &Path, judgments: &[RelationshipJudgment]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(["entity_name1", "relationship", "entity_name2", "verdict"])?;
    for j in judgments {
        writer.write_record([
            &j.entity_name1,
            &j.relationship,
            &j.entity_name2,
            j.verdict.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Grouped bar chart of precision/recall/F1 per category.
pub fn plot_metrics(path: &Path, rows: &[(&str, Metrics)]) -> Result<()> {
    let path_str = path.to_string_lossy().to_string();
    let root = BitMapBackend::new(&path_str, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Precision / Recall / F1 by category", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..rows.len() as f64, 0f64..1.0f64)?;

    let names: Vec<&str> = rows.iter().map(|(name, _)| *name).collect();
    chart
        .configure_mesh()
        .y_desc("Score")
        .x_labels(rows.len())
        .x_label_formatter(&|x| {
            names
                .get(*x as usize)
                .map(|s| s.to_string())
                .unwrap_or_default()
        })
        .draw()?;

    for (i, (_, m)) in rows.iter().enumerate() {
        let x = i as f64;
        let bars = [
            (m.precision, BLUE.filled()),
            (m.recall, GREEN.filled()),
            (m.f1, RED.filled()),
        ];
        for (k, (value, style)) in bars.into_iter().enumerate() {
            let left = x + 0.1 + 0.25 * k as f64;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(left, 0.0), (left + 0.2, value)],
                style,
            )))?;
        }
    }

    chart
        .draw_series(std::iter::once(Rectangle::new([(0.0, 0.0), (0.0, 0.0)], BLUE.filled())))?
        .label("precision")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], BLUE.filled()));
    chart
        .draw_series(std::iter::once(Rectangle::new([(0.0, 0.0), (0.0, 0.0)], GREEN.filled())))?
        .label("recall")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], GREEN.filled()));
    chart
        .draw_series(std::iter::once(Rectangle::new([(0.0, 0.0), (0.0, 0.0)], RED.filled())))?
        .label("f1")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], RED.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
