// 🤝 Assistant - One message in, one structured reply out
//
// Ties the pipeline together: resolve the intent (guess + heuristics), then
// route to the recorder, the settlement engine, or the aggregator. The whole
// pipeline runs synchronously per message; replies are structured data and
// the presentation layer turns them into text.

use crate::catalog::{Catalog, CatalogItem};
use crate::intent::{resolve_intent, IntentKind};
use crate::parser::ParsedGuess;
use crate::recorder::{RecordOutcome, Recorder};
use crate::settlement::{SettleOutcome, Settler};
use crate::store::{DebtRow, Ledger, RowStore};
use crate::summary::{summarize, SummarySnapshot};
use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime};
use tracing::info;

// ============================================================================
// REPLY
// ============================================================================

/// Structured result of handling one message. Formatting to human-readable
/// text is the front end's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Recorded {
        kind: IntentKind,
        outcome: RecordOutcome,
    },
    Settled {
        customer: String,
        outcome: SettleOutcome,
    },
    Summary(SummarySnapshot),
    Debts {
        customer: Option<String>,
        rows: Vec<DebtRow>,
        total_owed: f64,
    },
    Menu(Vec<CatalogItem>),
    Help,
    Cleared,
    /// Could not act on the message; `hint` tells the user what would work.
    Unresolved { hint: String },
}

// ============================================================================
// ASSISTANT
// ============================================================================

pub struct Assistant<'a, S: RowStore> {
    catalog: &'a Catalog,
    ledger: Ledger<S>,
}

impl<'a, S: RowStore> Assistant<'a, S> {
    pub fn new(catalog: &'a Catalog, store: S) -> Self {
        Assistant {
            catalog,
            ledger: Ledger::new(store),
        }
    }

    /// Handle one inbound message with wall-clock time.
    pub fn handle(&mut self, text: &str, guess: Option<ParsedGuess>) -> Result<Reply> {
        let now = Local::now();
        self.handle_at(text, guess, now.date_naive(), now.time())
    }

    /// Handle one inbound message at an explicit date/time (tests, replays).
    pub fn handle_at(
        &mut self,
        text: &str,
        guess: Option<ParsedGuess>,
        today: NaiveDate,
        now: NaiveTime,
    ) -> Result<Reply> {
        let intent = resolve_intent(self.catalog, text, guess);
        info!(kind = intent.kind.as_str(), items = intent.line_items.len(), "intent resolved");

        let catalog = self.catalog;
        match intent.kind {
            IntentKind::Sale | IntentKind::Debt => {
                let outcome = Recorder::new(catalog, &mut self.ledger).record(&intent, today, now)?;
                Ok(Reply::Recorded {
                    kind: intent.kind,
                    outcome,
                })
            }

            IntentKind::Settle => match intent.customer {
                Some(customer) => {
                    let outcome =
                        Settler::new(&mut self.ledger).settle(&customer, intent.stated_paid, today)?;
                    Ok(Reply::Settled { customer, outcome })
                }
                None => Ok(Reply::Unresolved {
                    hint: "Tell me whose debt to settle, e.g. 'settle for Ahmed'.".to_string(),
                }),
            },

            IntentKind::Summary => Ok(Reply::Summary(summarize(&mut self.ledger, today)?)),

            IntentKind::ListDebts => {
                let customer = intent.customer;
                let rows: Vec<DebtRow> = self
                    .ledger
                    .debts()?
                    .into_iter()
                    .map(|(_, row)| row)
                    .filter(|row| row.is_pending())
                    .filter(|row| match &customer {
                        Some(name) => row.customer.trim().eq_ignore_ascii_case(name.trim()),
                        None => true,
                    })
                    .collect();
                let total_owed = rows.iter().map(|row| row.owed).sum();
                Ok(Reply::Debts {
                    customer,
                    rows,
                    total_owed,
                })
            }

            IntentKind::ShowMenu => Ok(Reply::Menu(
                self.catalog.items().into_iter().cloned().collect(),
            )),

            IntentKind::Help => Ok(Reply::Help),

            IntentKind::ClearAll => {
                self.ledger.clear_all()?;
                Ok(Reply::Cleared)
            }

            IntentKind::Unknown => Ok(Reply::Unresolved {
                hint: "I couldn't read that. Try something like '2 lattes for Ahmed, paid 30', \
                       'settle for Ahmed', 'summary', or 'menu'."
                    .to_string(),
            }),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{IntentParser, KeywordParser};
    use crate::store::MemoryStore;

    fn at() -> (NaiveDate, NaiveTime) {
        (
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        )
    }

    /// Run one message through the keyword parser and the assistant, the way
    /// the REPL does.
    fn send<'a>(assistant: &mut Assistant<'a, MemoryStore>, catalog: &Catalog, text: &str) -> Reply {
        let (today, now) = at();
        let guess = KeywordParser::new(catalog).parse(text);
        assistant.handle_at(text, guess, today, now).unwrap()
    }

    #[test]
    fn test_full_flow_sale_debt_settle_summary() {
        let catalog = Catalog::default_menu();
        let mut assistant = Assistant::new(&catalog, MemoryStore::new());

        // Plain sale
        let reply = send(&mut assistant, &catalog, "2 lattes, paid 30");
        assert!(matches!(
            reply,
            Reply::Recorded { kind: IntentKind::Sale, .. }
        ));

        // Under-paid message reclassifies to debt
        let reply = send(&mut assistant, &catalog, "mocha for Ahmed, paid 15");
        match reply {
            Reply::Recorded { kind, outcome } => {
                assert_eq!(kind, IntentKind::Debt);
                match outcome {
                    RecordOutcome::Recorded { total_owed, fully_paid, .. } => {
                        assert_eq!(total_owed, 5.0);
                        assert!(!fully_paid);
                    }
                    other => panic!("expected Recorded outcome, got {:?}", other),
                }
            }
            other => panic!("expected Recorded reply, got {:?}", other),
        }

        // Outstanding shows up in the summary
        let reply = send(&mut assistant, &catalog, "summary");
        match reply {
            Reply::Summary(snapshot) => {
                assert_eq!(snapshot.total_revenue, 50.0);
                assert_eq!(snapshot.total_collected, 45.0);
                assert_eq!(snapshot.total_outstanding, 5.0);
                assert_eq!(snapshot.transaction_count, 3);
            }
            other => panic!("expected Summary, got {:?}", other),
        }

        // Settle it (case-insensitive customer)
        let reply = send(&mut assistant, &catalog, "settle for AHMED");
        match reply {
            Reply::Settled { outcome, .. } => {
                assert_eq!(outcome.settled_amount, 5.0);
                assert_eq!(outcome.settled_count, 1);
            }
            other => panic!("expected Settled, got {:?}", other),
        }

        let reply = send(&mut assistant, &catalog, "summary");
        match reply {
            Reply::Summary(snapshot) => {
                assert_eq!(snapshot.total_outstanding, 0.0);
                assert_eq!(snapshot.total_settled, 5.0);
            }
            other => panic!("expected Summary, got {:?}", other),
        }
    }

    #[test]
    fn test_list_debts_filters_by_customer() {
        let catalog = Catalog::default_menu();
        let mut assistant = Assistant::new(&catalog, MemoryStore::new());

        send(&mut assistant, &catalog, "mocha for Ahmed, paid nothing");
        send(&mut assistant, &catalog, "latte for Mona, paid nothing");

        let reply = send(&mut assistant, &catalog, "what does Ahmed owe in debts");
        match reply {
            Reply::Debts { customer, rows, total_owed } => {
                assert_eq!(customer, Some("Ahmed".to_string()));
                assert_eq!(rows.len(), 1);
                assert_eq!(total_owed, 20.0);
            }
            other => panic!("expected Debts, got {:?}", other),
        }

        let reply = send(&mut assistant, &catalog, "list debts");
        match reply {
            Reply::Debts { customer, rows, total_owed } => {
                assert_eq!(customer, None);
                assert_eq!(rows.len(), 2);
                assert_eq!(total_owed, 35.0);
            }
            other => panic!("expected Debts, got {:?}", other),
        }
    }

    #[test]
    fn test_settle_without_customer_asks_for_one() {
        let catalog = Catalog::default_menu();
        let mut assistant = Assistant::new(&catalog, MemoryStore::new());

        let reply = send(&mut assistant, &catalog, "settle");
        assert!(matches!(reply, Reply::Unresolved { .. }));
    }

    #[test]
    fn test_menu_and_clear() {
        let catalog = Catalog::default_menu();
        let mut assistant = Assistant::new(&catalog, MemoryStore::new());

        let reply = send(&mut assistant, &catalog, "show me the menu");
        match reply {
            Reply::Menu(items) => assert_eq!(items.len(), catalog.len()),
            other => panic!("expected Menu, got {:?}", other),
        }

        send(&mut assistant, &catalog, "latte, paid 15");
        let reply = send(&mut assistant, &catalog, "clear all records");
        assert_eq!(reply, Reply::Cleared);

        let reply = send(&mut assistant, &catalog, "summary");
        match reply {
            Reply::Summary(snapshot) => assert_eq!(snapshot.transaction_count, 0),
            other => panic!("expected Summary, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_message_gets_guidance() {
        let catalog = Catalog::default_menu();
        let mut assistant = Assistant::new(&catalog, MemoryStore::new());

        let reply = send(&mut assistant, &catalog, "hello there");
        match reply {
            Reply::Unresolved { hint } => assert!(hint.contains("lattes")),
            other => panic!("expected Unresolved, got {:?}", other),
        }
    }

    #[test]
    fn test_external_guess_bypasses_keyword_parser() {
        let catalog = Catalog::default_menu();
        let mut assistant = Assistant::new(&catalog, MemoryStore::new());
        let (today, now) = at();

        // A guess exactly as the external NL service would post it
        let guess: ParsedGuess = serde_json::from_str(
            r#"{"intent": "sale", "items": [{"name": "Matcha Latte", "qty": 1}], "customer": "Sara", "paid": 25}"#,
        )
        .unwrap();

        let reply = assistant
            .handle_at("sold a matcha latte to Sara, paid 25", Some(guess), today, now)
            .unwrap();
        assert!(matches!(
            reply,
            Reply::Recorded { kind: IntentKind::Sale, .. }
        ));
    }
}
