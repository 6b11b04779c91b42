//! desk-runner: headless runner for the churn desk.
//!
//! Usage:
//!   desk-runner --db churn.db --seed-demo
//!   desk-runner --db churn.db --demo-size 200 --seed 7
//!   desk-runner --db churn.db --export-dir out/
//!   desk-runner --db churn.db --ipc-mode < requests.jsonl

use anyhow::{Context, Result};
use churn_desk_core::{
    config::DeskConfig,
    demo,
    desk::ChurnDesk,
    filter::CancellationFilter,
    insights::format_percent,
    request::DeskResponse,
    store::DeskStore,
};
use chrono::Utc;
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Just enough of a request line to spot `quit` before dispatch.
#[derive(serde::Deserialize)]
struct RequestTag {
    #[serde(rename = "type")]
    kind: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let demo_size = parse_arg(&args, "--demo-size", 0usize);
    let seed_demo = args.iter().any(|a| a == "--seed-demo");
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");
    let export_dir = args
        .windows(2)
        .find(|w| w[0] == "--export-dir")
        .map(|w| w[1].as_str());

    if !ipc_mode {
        println!("Churn desk runner");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = load_config(data_dir)?;
    let store = DeskStore::open(db).with_context(|| format!("opening {db}"))?;
    store.migrate()?;
    let desk = ChurnDesk::new(config, store);

    if seed_demo {
        demo::seed_starter_book(&desk)?;
    }
    if demo_size > 0 {
        demo::generate_synthetic(&desk, seed, demo_size)?;
    }

    if ipc_mode {
        run_ipc_loop(&desk)?;
    } else {
        print_summary(&desk)?;
        if let Some(dir) = export_dir {
            write_exports(&desk, Path::new(dir))?;
        }
    }

    Ok(())
}

/// Configuration from `{data_dir}/desk/desk_config.json`, or the built-in
/// defaults when the file is absent.
fn load_config(data_dir: &str) -> Result<DeskConfig> {
    let path = Path::new(data_dir).join("desk").join("desk_config.json");
    if path.exists() {
        DeskConfig::load(data_dir)
    } else {
        log::warn!("No desk config at {}; using built-in defaults", path.display());
        Ok(DeskConfig::default())
    }
}

fn run_ipc_loop(desk: &ChurnDesk) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        let line = buffer.trim();
        if line.is_empty() {
            continue;
        }
        if is_quit(line) {
            break;
        }

        let response: DeskResponse = desk.respond_to_line(line);
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn is_quit(line: &str) -> bool {
    serde_json::from_str::<RequestTag>(line)
        .map(|tag| tag.kind == "quit")
        .unwrap_or(false)
}

/// Write both CSV exports and the monthly report into `dir`. Empty CSV
/// exports are skipped.
fn write_exports(desk: &ChurnDesk, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let documents = [
        desk.export_cancellations_csv()?,
        desk.export_saved_cases_csv()?,
        Some(desk.monthly_report(Utc::now())?),
    ];

    println!();
    println!("=== EXPORTS ===");
    for doc in documents.into_iter().flatten() {
        let path = dir.join(&doc.filename);
        fs::write(&path, &doc.body).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote {} ({} bytes)", path.display(), doc.body.len());
        println!("  {}", path.display());
    }
    Ok(())
}

fn print_summary(desk: &ChurnDesk) -> Result<()> {
    let overview = desk.overview(&CancellationFilter::default())?;
    let totals = &overview.totals;

    println!("=== CHURN SUMMARY ===");
    println!("  cancellations:  {}", totals.total_cancellations);
    println!("  saved:          {}", totals.total_saved);
    println!("  save rate:      {}", format_percent(totals.save_rate));
    println!("  avg tenure:     {} days", totals.avg_days_on_platform);
    for reason in &totals.top_reasons {
        println!("  top reason:     {} ({})", reason.reason, reason.count);
    }

    println!();
    println!("=== CLOSERS ===");
    for closer in desk.closer_stats()? {
        println!(
            "  {:<16} {} saves / {} cancels ({})",
            closer.name,
            closer.saves,
            closer.losses,
            format_percent(closer.save_rate)
        );
    }

    println!();
    println!("=== INSIGHTS ===");
    for (idx, insight) in overview.insights.iter().enumerate() {
        println!("  {}. {insight}", idx + 1);
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
