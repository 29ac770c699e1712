#![cfg(not(tarpaulin_include))]

use catalog::catalog::{Catalog, search};
use catalog::config::Config;
use catalog::drive::resolve_image_link;
use catalog::google::GoogleSheets;
use catalog::store::{MemorySheets, SheetStore};
use catalog::table::Table;
use std::env;

fn print_table(table: &Table) {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (w, value) in widths.iter_mut().zip(row) {
            *w = (*w).max(value.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    println!("{}", line(&table.columns));
    println!(
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    );
    for row in &table.rows {
        println!("{}", line(row));
    }
}

async fn execute<S: SheetStore>(
    catalog: Catalog<S>,
    command: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        [cmd] if cmd == "tabs" => {
            for tab in catalog.connect().await? {
                println!("{}", tab);
            }
        }
        [cmd, tab] if cmd == "show" => {
            let snapshot = catalog.load(tab).await?;
            for notice in &snapshot.notices {
                eprintln!("{}: {}", notice.level(), notice.message());
            }
            print_table(&snapshot.table);
        }
        [cmd, tab, term] if cmd == "search" => {
            let snapshot = catalog.load(tab).await?;
            let outcome = search(&snapshot, term);
            if let Some(notice) = &outcome.notice {
                eprintln!("{}: {}", notice.level(), notice.message());
            }
            if let Some(results) = &outcome.results {
                print_table(results);
            }
        }
        _ => {
            eprintln!("Commands:");
            eprintln!("  tabs                  List worksheets");
            eprintln!("  show <tab>            Print a worksheet");
            eprintln!("  search <tab> <term>   Filter a worksheet by id or name");
            eprintln!("  resolve <link>        Print the direct-fetch form of an image link");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();

    // Needs no spreadsheet at all.
    if let [cmd, link] = args.as_slice() {
        if cmd == "resolve" {
            println!("{}", resolve_image_link(link));
            return Ok(());
        }
    }

    let config = Config::load(None)?;
    match &config.demo_data {
        Some(seed) => execute(Catalog::new(MemorySheets::from_json_file(seed)?), &args).await,
        None => {
            let store = GoogleSheets::open(&config.sheet_url, config.access_token()?)?;
            execute(Catalog::new(store), &args).await
        }
    }
}
