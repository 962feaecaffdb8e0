use clap::ValueEnum;
use comfy_table::{Cell, Color, Table};
use nihao_primitives::capability::CapabilityRecord;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Format {
    Json,
    #[default]
    PlainText,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Output {
    format: Format,
}

pub trait Report {
    fn report(&self);
}

impl Output {
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    pub fn write<T: Serialize + Report>(&self, value: &T) {
        match self.format {
            Format::Json => match serde_json::to_string(value) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("Failed to serialize to JSON: {err}"),
            },
            Format::PlainText => value.report(),
        }
    }
}

/// Table of probed relays, one row each, in the given order.
pub fn relay_table(records: &[CapabilityRecord]) -> Table {
    let mut table = Table::new();
    let _ignored = table.set_header(vec![
        Cell::new("Relay").fg(Color::Blue),
        Cell::new("Purpose").fg(Color::Blue),
        Cell::new("Latency").fg(Color::Blue),
        Cell::new("Score").fg(Color::Blue),
        Cell::new("Software").fg(Color::Blue),
        Cell::new("Issues").fg(Color::Blue),
    ]);

    for record in records {
        let latency = if record.reachable {
            format!("{}ms", record.latency_ms)
        } else {
            "-".to_owned()
        };

        let score =
            Cell::new(format!("{:.0}%", record.score * 100.0)).fg(score_color(record.score));

        let _ignored = table.add_row(vec![
            Cell::new(record.address.as_str()),
            Cell::new(record.purpose),
            Cell::new(latency),
            score,
            Cell::new(record.summary().unwrap_or_default()),
            Cell::new(record.issues.join(", ")),
        ]);
    }

    table
}

fn score_color(score: f64) -> Color {
    if score >= 0.7 {
        Color::Green
    } else if score >= 0.5 {
        Color::Yellow
    } else {
        Color::Red
    }
}
