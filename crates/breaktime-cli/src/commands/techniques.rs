use breaktime_core::display::format_secs;
use breaktime_core::timer::CYCLES_PER_LONG_BREAK;
use breaktime_core::{Config, DurationPolicy, SettingsStore, TechniqueKind};
use chrono::Duration;
use serde::Serialize;

#[derive(Serialize)]
struct TechniqueRow {
    name: &'static str,
    display_name: &'static str,
    work_secs: Option<u64>,
    break_secs: Option<u64>,
    long_break_secs: Option<u64>,
}

fn row(kind: TechniqueKind, settings: &dyn SettingsStore) -> TechniqueRow {
    let technique = kind.resolve(settings).ok();
    let durations = technique.as_ref().map(|t| DurationPolicy::durations(t, 1));
    let long_break = technique
        .as_ref()
        .filter(|t| t.counts_cycles())
        .map(|t| whole_secs(DurationPolicy::break_duration(t, CYCLES_PER_LONG_BREAK)));
    TechniqueRow {
        name: kind.as_str(),
        display_name: kind.display_name(),
        work_secs: durations.map(|d| whole_secs(d.work)),
        break_secs: durations.map(|d| whole_secs(d.break_duration)),
        long_break_secs: long_break,
    }
}

fn whole_secs(d: Duration) -> u64 {
    u64::try_from(d.num_seconds()).unwrap_or(0)
}

fn describe(secs: Option<u64>) -> String {
    secs.map(format_secs)
        .unwrap_or_else(|| "not configured".to_string())
}

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let rows: Vec<TechniqueRow> = TechniqueKind::ALL
        .iter()
        .map(|kind| row(*kind, &config))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for r in &rows {
        let mut line = format!(
            "{:<10} {:<12} work {:<8} break {}",
            r.name,
            r.display_name,
            describe(r.work_secs),
            describe(r.break_secs)
        );
        if let Some(long) = r.long_break_secs {
            line.push_str(&format!(
                " (every {CYCLES_PER_LONG_BREAK}th: {})",
                format_secs(long)
            ));
        }
        println!("{}", line.trim_end());
    }
    Ok(())
}
