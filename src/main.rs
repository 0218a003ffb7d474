use anyhow::{bail, Result};
use std::env;
use std::io::{self, BufRead, Write};

use shopbook::{
    Assistant, Catalog, IntentKind, IntentParser, KeywordParser, RecordOutcome, Reply, SqliteStore,
};

fn main() -> Result<()> {
    // init tracing - quiet by default, RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let mut db_path = "shopbook.db".to_string();
    let mut menu_path: Option<String> = None;
    let mut command: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--db" => {
                i += 1;
                match args.get(i) {
                    Some(path) => db_path = path.clone(),
                    None => bail!("--db needs a path"),
                }
            }
            "--menu" => {
                i += 1;
                match args.get(i) {
                    Some(path) => menu_path = Some(path.clone()),
                    None => bail!("--menu needs a CSV path"),
                }
            }
            other if command.is_none() => command = Some(other.to_string()),
            other => bail!("Unexpected argument: {}", other),
        }
        i += 1;
    }

    let catalog = match &menu_path {
        Some(path) => Catalog::from_csv(path)?,
        None => Catalog::default_menu(),
    };

    let store = SqliteStore::open(&db_path)?;
    let mut assistant = Assistant::new(&catalog, store);

    match command.as_deref() {
        Some("summary") => run_one(&catalog, &mut assistant, "summary"),
        Some("menu") => run_one(&catalog, &mut assistant, "menu"),
        Some("debts") => run_one(&catalog, &mut assistant, "list debts"),
        Some("repl") | None => run_repl(&catalog, &mut assistant),
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: shopbook [--db ledger.db] [--menu prices.csv] [summary|menu|debts|repl]");
            std::process::exit(1);
        }
    }
}

/// One-shot mode: run a single message through the pipeline and exit.
fn run_one(
    catalog: &Catalog,
    assistant: &mut Assistant<'_, SqliteStore>,
    text: &str,
) -> Result<()> {
    let guess = KeywordParser::new(catalog).parse(text);
    let reply = assistant.handle(text, guess)?;
    print_reply(&reply);
    Ok(())
}

fn run_repl(catalog: &Catalog, assistant: &mut Assistant<'_, SqliteStore>) -> Result<()> {
    println!("📒 Shopbook - tell me what was sold, settled, or owed.");
    println!("   ('help' for examples, 'quit' to leave)\n");

    let parser = KeywordParser::new(catalog);
    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let guess = parser.parse(line);
        match assistant.handle(line, guess) {
            Ok(reply) => print_reply(&reply),
            Err(e) => eprintln!("⚠ {:#}", e),
        }
    }

    println!("Bye!");
    Ok(())
}

// ============================================================================
// PRESENTATION
// ============================================================================

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Recorded { kind, outcome } => print_record_outcome(*kind, outcome),

        Reply::Settled { customer, outcome } => {
            if outcome.found_any() {
                println!(
                    "✓ Settled {:.2} across {} item(s) for {}",
                    outcome.settled_amount, outcome.settled_count, customer
                );
            } else {
                println!("No pending debt found for {}.", customer);
            }
        }

        Reply::Summary(s) => {
            println!("📊 Summary");
            println!(
                "  Today:    revenue {:.2} | collected {:.2} | new debt {:.2} | settled {:.2} | {} unit(s)",
                s.today_revenue, s.today_collected, s.today_outstanding, s.today_settled, s.today_transactions
            );
            println!(
                "  All-time: revenue {:.2} | collected {:.2} | outstanding {:.2} | settled {:.2} | {} unit(s)",
                s.total_revenue, s.total_collected, s.total_outstanding, s.total_settled, s.transaction_count
            );
        }

        Reply::Debts {
            customer,
            rows,
            total_owed,
        } => {
            if rows.is_empty() {
                match customer {
                    Some(name) => println!("No pending debt for {}.", name),
                    None => println!("No pending debts. 🎉"),
                }
            } else {
                for row in rows {
                    println!(
                        "  {} | {} | {} | owes {:.2}",
                        row.date, row.customer, row.item, row.owed
                    );
                }
                println!("  Total outstanding: {:.2}", total_owed);
            }
        }

        Reply::Menu(items) => {
            println!("📋 Menu");
            for item in items {
                println!(
                    "  {:<14} {:>7.2}  ({})",
                    item.name,
                    item.unit_price,
                    item.category.as_str()
                );
            }
        }

        Reply::Help => {
            println!("Things I understand:");
            println!("  2 lattes for Ahmed, paid 30     - record a sale");
            println!("  mocha for Sara, paid 15         - partial payment becomes a debt");
            println!("  croissant to Omar, paid nothing - full amount owed");
            println!("  settle for Ahmed                - settle all of Ahmed's debts");
            println!("  Ahmed paid back 20              - settle up to 20");
            println!("  summary / menu / list debts / clear all");
        }

        Reply::Cleared => println!("✓ All records cleared."),

        Reply::Unresolved { hint } => println!("🤔 {}", hint),
    }
}

fn print_record_outcome(kind: IntentKind, outcome: &RecordOutcome) {
    match outcome {
        RecordOutcome::Recorded {
            lines,
            total,
            total_owed,
            warnings,
            fully_paid,
        } => {
            for warning in warnings {
                println!("⚠ {}", warning);
            }
            for line in lines {
                println!("  {} x {} @ {:.2}", line.quantity, line.item, line.unit_price);
            }
            if kind == IntentKind::Sale {
                println!("✓ Sale recorded - total {:.2}", total);
            } else if *fully_paid {
                println!("✓ Recorded - total {:.2}, fully paid", total);
            } else {
                println!(
                    "✓ Recorded - total {:.2}, still owed {:.2}",
                    total, total_owed
                );
            }
        }

        RecordOutcome::NothingResolved { warnings } => {
            for warning in warnings {
                println!("⚠ {}", warning);
            }
            println!("Nothing on the menu matched, so nothing was recorded.");
        }

        RecordOutcome::Overpaid { paid, total } => {
            println!(
                "❌ Payment {:.2} is more than the bill {:.2} - nothing was recorded.",
                paid, total
            );
        }
    }
}
