use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use timeline_board::{load_board_str, parse_settings_value, BoardMapping};
use timeline_core::{LayoutConfig, LayoutRequest, TimelineLayout};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "timeline-cli",
    about = "Lay out board items on a timeline and print the positions."
)]
struct Args {
    /// Path to the board JSON payload.
    #[arg(short, long)]
    input: PathBuf,

    /// Column id holding each item's date.
    #[arg(long, default_value = "date")]
    date_column: String,

    /// Numeric column id holding stored vertical offsets.
    #[arg(long)]
    offset_column: Option<String>,

    /// Position mode: above, below, alternate or center.
    #[arg(long, default_value = "below")]
    mode: String,

    /// Scale markers: none, days, weeks, months, quarters or years.
    #[arg(long, default_value = "none")]
    scale: String,

    /// Date label placement: top or bottom.
    #[arg(long, default_value = "bottom")]
    label_position: String,

    /// Range start (YYYY-MM-DD or RFC 3339). Defaults to the earliest item.
    #[arg(long)]
    start: Option<String>,

    /// Range end (YYYY-MM-DD or RFC 3339). Defaults to the latest item.
    #[arg(long)]
    end: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "timeline_core=info,timeline_board=info,warn".into()
        }))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Could not read file {:?}", args.input))?;

    let mapping = BoardMapping {
        date_column: args.date_column.clone(),
        offset_column: args.offset_column.clone(),
    };
    let board = load_board_str(&data, &mapping)
        .with_context(|| format!("Could not load board from {:?}", args.input))?;

    let settings = parse_settings_value(&serde_json::json!({
        "positionMode": args.mode,
        "scale": args.scale,
        "dateLabelPosition": args.label_position,
        "startDate": args.start,
        "endDate": args.end,
    }));

    let request = LayoutRequest {
        items: board.items,
        settings,
        custom_y_delta: board.custom_y_delta,
    };
    let layout = TimelineLayout::build(&request, &LayoutConfig::default());

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&layout).context("Could not serialize layout")?;
            println!("{json}");
        }
        OutputFormat::Text => print_layout(board.board_name.as_deref(), &layout),
    }

    Ok(())
}

fn print_layout(board_name: Option<&str>, layout: &TimelineLayout) {
    println!(
        "Board: {}\nRange: {} .. {}\nMode: {:?}\nItems: {}",
        board_name.unwrap_or("--"),
        layout.range.start.format("%Y-%m-%d"),
        layout.range.end.format("%Y-%m-%d"),
        layout.position_mode,
        layout.items.len()
    );

    for item in &layout.items {
        let date = item
            .date
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "--".to_string());
        println!(
            "  {:<12} {:<24} {:<10} x={:>6.2}% y={:>7.1}px{}",
            item.id,
            item.name,
            date,
            item.render_position.x,
            item.render_position.y,
            if item.is_custom_position { " *" } else { "" }
        );
    }

    if !layout.markers.is_empty() {
        let labels: Vec<String> = layout
            .markers
            .iter()
            .map(|marker| format!("{} ({:.1}%)", marker.label, marker.position))
            .collect();
        println!("Markers: {}", labels.join(", "));
    }
}
