use serde::Serialize;

/// Aggregate judgment counts for one category across all documents.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CategoryCounts {
    pub right: usize,
    pub gold_total: usize,
    pub test_total: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Metrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl CategoryCounts {
    pub fn add(&mut self, right: usize, gold: usize, test: usize) {
        self.right += right;
        self.gold_total += gold;
        self.test_total += test;
    }

    /// Precision = right/test, recall = right/gold, F1 the harmonic mean;
    /// all 0 when the respective denominator is 0.
    pub fn metrics(&self) -> Metrics {
        let precision = if self.test_total > 0 {
            self.right as f64 / self.test_total as f64
        } else {
            0.0
        };
        let recall = if self.gold_total > 0 {
            self.right as f64 / self.gold_total as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Metrics { precision, recall, f1 }
    }
}

pub fn print_metrics_table(rows: &[(&str, Metrics)]) {
    println!("{:<15} {:<18} {:<19} {:<20}", "Metric", "Precision", "Recall", "F-Score");
    println!("{}", "-".repeat(70));
    for (name, m) in rows {
        println!(
            "{:<15} {:<18.3} {:<19.3} {:<20.3}",
            name, m.precision, m.recall, m.f1
        );
    }
}
