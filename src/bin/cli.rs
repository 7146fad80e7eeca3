use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame};
use roadmap_tool::persistence::{
    load_roadmap_from_csv_dir, load_roadmap_from_json, save_roadmap_to_csv_dir,
    save_roadmap_to_json,
};
use roadmap_tool::{Roadmap, Task, WeekStart, Workstream};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn format_cell(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| {
                    col.get(row_idx)
                        .map(|av| format_cell(&av))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, values: &[String]| {
        out.push('|');
        for (i, value) in values.iter().enumerate() {
            out.push(' ');
            out.push_str(value);
            out.push_str(&" ".repeat(widths[i].saturating_sub(value.len())));
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &col_names);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_table(roadmap: &Roadmap) {
    match roadmap.dataframe() {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error building task table: {}", e),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show tasks with their sublanes\n  ws add <name> [order] [color]      Upsert a workstream\n  ws delete <name>                   Delete an unused workstream\n  ws list                            List workstreams in display order\n  add <id> <workstream> <start> <end> <title...>\n                                     Upsert a task (dates YYYY-MM-DD)\n  delete <id>                        Delete a task\n  settings show                      Show chart settings\n  settings title <text...>           Update chart title\n  settings range <start> <end>       Update overall date range\n  settings week <mon|sun>            Update week start day\n  lanes                              Show sublane assignment per workstream\n  timeline                           Show the selected time scale\n  layout                             Compute the full layout and summarize it\n  save json <path>                   Persist roadmap snapshot\n  save csv <dir>                     Write workstreams.csv and tasks.csv\n  load json <path>                   Load roadmap snapshot\n  load csv <dir>                     Load workstreams.csv and tasks.csv\n  quit|exit                          Exit"
    );
}

fn print_settings(roadmap: &Roadmap) {
    let settings = roadmap.settings();
    println!("Chart title        : {}", settings.chart_title);
    println!("Overall start date : {}", settings.overall_start_date);
    println!("Overall end date   : {}", settings.overall_end_date);
    println!("Week start         : {}", settings.week_start_day);
    println!("Include out of range: {}", settings.include_out_of_range);
}

fn print_workstreams(roadmap: &Roadmap) {
    let ordered = roadmap.ordered_workstreams();
    if ordered.is_empty() {
        println!("No workstreams.");
        return;
    }
    for ws in ordered {
        let order = ws.order.map(|o| o.to_string()).unwrap_or_else(|| "-".into());
        let color = ws.color.unwrap_or_else(|| "-".into());
        println!("  {:<24} order={:<4} color={}", ws.name, order, color);
    }
}

fn print_lanes(roadmap: &Roadmap) {
    match roadmap.lanes() {
        Ok(lanes) => {
            for ws in roadmap.ordered_workstreams() {
                let Some(assignment) = lanes.get(&ws.name) else {
                    println!("{}: 0 lanes", ws.name);
                    continue;
                };
                println!("{}: {} lanes", ws.name, assignment.max_lanes());
                for (task_id, lane) in assignment.iter() {
                    println!("  {:<16} lane {}", task_id, lane);
                }
            }
        }
        Err(e) => println!("Stacking error: {}", e),
    }
}

fn print_timeline(roadmap: &Roadmap) {
    match roadmap.timeline() {
        Ok(scale) => {
            println!(
                "Scale {} from {} to {} ({} ticks)",
                scale.granularity,
                scale.start,
                scale.end,
                scale.ticks.len()
            );
            let labels = scale
                .ticks
                .iter()
                .map(|tick| tick.label.as_str())
                .collect::<Vec<_>>()
                .join(" | ");
            println!("Ticks: {}", labels);
            for row in &scale.rows {
                let labels = row
                    .segments
                    .iter()
                    .map(|seg| seg.label.as_str())
                    .collect::<Vec<_>>()
                    .join(" | ");
                println!("{:?}: {}", row.kind, labels);
            }
        }
        Err(e) => println!("Timeline error: {}", e),
    }
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let mut roadmap = Roadmap::new();

    println!("Roadmap Tool (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print_table(&roadmap),
            "ws" => match parts.next() {
                Some("add") => match parts.next() {
                    Some(name) => {
                        let mut ws = Workstream::new(name);
                        if let Some(order_s) = parts.next() {
                            match order_s.parse::<i64>() {
                                Ok(order) => ws.order = Some(order),
                                Err(_) => {
                                    println!("Invalid order");
                                    continue;
                                }
                            }
                        }
                        ws.color = parts.next().map(str::to_string);
                        match roadmap.upsert_workstream(ws) {
                            Ok(_) => println!("Workstream '{}' upserted.", name),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    None => println!("Usage: ws add <name> [order] [color]"),
                },
                Some("delete") => match parts.next() {
                    Some(name) => match roadmap.delete_workstream(name) {
                        Ok(true) => println!("Deleted workstream '{}'.", name),
                        Ok(false) => println!("Workstream '{}' not found.", name),
                        Err(e) => println!("Error deleting workstream: {}", e),
                    },
                    None => println!("Usage: ws delete <name>"),
                },
                Some("list") | None => print_workstreams(&roadmap),
                Some(other) => {
                    println!("Unknown ws command '{}'.", other);
                    println!("Usage: ws add|delete|list ...");
                }
            },
            "add" => {
                let id_s = parts.next();
                let ws_s = parts.next();
                let start_s = parts.next();
                let end_s = parts.next();
                let title = parts.collect::<Vec<_>>().join(" ");
                match (id_s, ws_s, start_s, end_s) {
                    (Some(id), Some(ws), Some(start_s), Some(end_s)) => {
                        let (Some(start), Some(end)) = (parse_date(start_s), parse_date(end_s))
                        else {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        };
                        let title = if title.is_empty() { id.to_string() } else { title };
                        match roadmap.upsert_task(Task::new(id, ws, title, start, end)) {
                            Ok(_) => {
                                println!("Task upserted.");
                                print_table(&roadmap);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: add <id> <workstream> <start> <end> <title...>"),
                }
            }
            "delete" => match parts.next() {
                Some(id) => {
                    if roadmap.delete_task(id) {
                        println!("Deleted task {id}.");
                        print_table(&roadmap);
                    } else {
                        println!("Task {id} not found.");
                    }
                }
                None => println!("Usage: delete <id>"),
            },
            "settings" => match parts.next() {
                Some("show") | None => print_settings(&roadmap),
                Some("title") => {
                    let title = parts.collect::<Vec<_>>().join(" ");
                    match roadmap.set_chart_title(title) {
                        Ok(_) => println!("Chart title updated."),
                        Err(e) => println!("Settings error: {}", e),
                    }
                }
                Some("range") => match (
                    parts.next().and_then(parse_date),
                    parts.next().and_then(parse_date),
                ) {
                    (Some(start), Some(end)) => match roadmap.set_overall_range(start, end) {
                        Ok(_) => println!("Overall range set to {} .. {}.", start, end),
                        Err(e) => println!("Settings error: {}", e),
                    },
                    _ => println!("Usage: settings range <YYYY-MM-DD> <YYYY-MM-DD>"),
                },
                Some("week") => match parts.next().map(str::parse::<WeekStart>) {
                    Some(Ok(week_start)) => match roadmap.set_week_start(week_start) {
                        Ok(_) => println!("Week start set to {}.", week_start),
                        Err(e) => println!("Settings error: {}", e),
                    },
                    Some(Err(e)) => println!("Settings error: {}", e),
                    None => println!("Usage: settings week <mon|sun>"),
                },
                Some(other) => {
                    println!("Unknown settings command '{}'.", other);
                    println!("Usage: settings show|title|range|week ...");
                }
            },
            "lanes" => print_lanes(&roadmap),
            "timeline" => print_timeline(&roadmap),
            "layout" => match roadmap.refresh() {
                Ok(summary) => {
                    println!("Layout ({})", summary.to_cli_summary());
                    if let Ok(layout) = roadmap.layout() {
                        for warning in &layout.warnings {
                            println!("  warning: {}", warning);
                        }
                    }
                }
                Err(e) => println!("Layout error: {}", e),
            },
            "save" => {
                let fmt = parts.next();
                let path = parts.next();
                match (fmt, path) {
                    (Some("json"), Some(path)) => match save_roadmap_to_json(&roadmap, path) {
                        Ok(_) => println!("Roadmap saved to {}.", path),
                        Err(e) => println!("Error saving roadmap: {}", e),
                    },
                    (Some("csv"), Some(path)) => match save_roadmap_to_csv_dir(&roadmap, path) {
                        Ok(_) => println!("Roadmap saved to {}.", path),
                        Err(e) => println!("Error saving roadmap: {}", e),
                    },
                    _ => println!("Usage: save <json|csv> <path>"),
                }
            }
            "load" => {
                let fmt = parts.next();
                let path = parts.next();
                let loaded = match (fmt, path) {
                    (Some("json"), Some(path)) => load_roadmap_from_json(path),
                    (Some("csv"), Some(path)) => {
                        load_roadmap_from_csv_dir(roadmap.settings().clone(), path)
                    }
                    _ => {
                        println!("Usage: load <json|csv> <path>");
                        continue;
                    }
                };
                match loaded {
                    Ok(loaded) => {
                        roadmap = loaded;
                        println!("Roadmap loaded from {}.", path.unwrap_or_default());
                        print_table(&roadmap);
                    }
                    Err(e) => println!("Error loading roadmap: {}", e),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
