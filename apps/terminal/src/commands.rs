//! # Console Commands
//!
//! Parses one line of cashier input and runs it against a checkout lane.
//!
//! ## Command Reference
//! ```text
//! start <cashier>          open a transaction
//! add <code> [qty]         add an item (qty defaults to 1)
//! customer <phone>         bind a loyalty customer
//! redeem <y|n>             redeem loyalty points
//! totals                   show running totals
//! complete [--json]        settle and print the receipt
//! cancel                   cancel and roll back
//! restock <code> <qty>     add stock
//! offer <code> <on|off>    toggle the weekly offer
//! stock                    current inventory
//! report                   sales report
//! help                     this list
//! quit                     save and exit
//! ```

use std::fmt::Write as _;

use market_core::{
    CashierId, CheckoutLane, CustomerDirectory, SessionState, SharedStore,
};
use tracing::{debug, info, warn};

use crate::config::TerminalConfig;
use crate::error::{CommandError, CommandResult};

pub const HELP: &str = "\
Commands:
  start <cashier>          open a transaction
  add <code> [qty]         add an item (qty defaults to 1)
  customer <phone>         bind a loyalty customer
  redeem <y|n>             redeem loyalty points
  totals                   show running totals
  complete [--json]        settle and print the receipt
  cancel                   cancel and roll back
  restock <code> <qty>     add stock
  offer <code> <on|off>    toggle the weekly offer
  stock                    current inventory
  report                   sales report
  help                     this list
  quit                     save and exit";

// =============================================================================
// Command
// =============================================================================

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { cashier: String },
    Add { code: String, quantity: i64 },
    Customer { phone: String },
    Redeem { use_points: bool },
    Totals,
    Complete { json: bool },
    Cancel,
    Restock { code: String, quantity: i64 },
    Offer { code: String, on: bool },
    Stock,
    Report,
    Help,
    Quit,
}

impl Command {
    /// Parses a line. Blank lines give `Ok(None)`.
    ///
    /// Only syntax is checked here; codes, phones and quantity ranges are
    /// validated by the settlement engine.
    pub fn parse(line: &str) -> CommandResult<Option<Command>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("start", [cashier]) => Command::Start {
                cashier: cashier.to_string(),
            },
            ("start", _) => return Err(CommandError::usage("start <cashier>")),

            ("add", [code]) => Command::Add {
                code: code.to_string(),
                quantity: 1,
            },
            ("add", [code, qty]) => Command::Add {
                code: code.to_string(),
                quantity: parse_quantity(qty, "add <code> [qty]")?,
            },
            ("add", _) => return Err(CommandError::usage("add <code> [qty]")),

            ("customer", [phone]) => Command::Customer {
                phone: phone.to_string(),
            },
            ("customer", _) => return Err(CommandError::usage("customer <phone>")),

            ("redeem", [answer]) => Command::Redeem {
                use_points: parse_flag(answer, &["y", "yes"], &["n", "no"])
                    .ok_or_else(|| CommandError::usage("redeem <y|n>"))?,
            },
            ("redeem", _) => return Err(CommandError::usage("redeem <y|n>")),

            ("totals", []) => Command::Totals,
            ("complete", []) => Command::Complete { json: false },
            ("complete", ["--json"]) => Command::Complete { json: true },
            ("complete", _) => return Err(CommandError::usage("complete [--json]")),
            ("cancel", []) => Command::Cancel,

            ("restock", [code, qty]) => Command::Restock {
                code: code.to_string(),
                quantity: parse_quantity(qty, "restock <code> <qty>")?,
            },
            ("restock", _) => return Err(CommandError::usage("restock <code> <qty>")),

            ("offer", [code, state]) => Command::Offer {
                code: code.to_string(),
                on: parse_flag(state, &["on"], &["off"])
                    .ok_or_else(|| CommandError::usage("offer <code> <on|off>"))?,
            },
            ("offer", _) => return Err(CommandError::usage("offer <code> <on|off>")),

            ("stock", []) => Command::Stock,
            ("report", []) => Command::Report,
            ("help", _) | ("?", _) => Command::Help,
            ("quit", []) | ("exit", []) => Command::Quit,

            (other, _) => {
                return Err(CommandError::new(
                    crate::error::ErrorCode::InvalidCommand,
                    format!("unknown command '{}', type 'help'", other),
                ))
            }
        };

        Ok(Some(command))
    }
}

fn parse_quantity(raw: &str, usage: &str) -> CommandResult<i64> {
    raw.parse::<i64>().map_err(|_| CommandError::usage(usage))
}

fn parse_flag(raw: &str, yes: &[&str], no: &[&str]) -> Option<bool> {
    let raw = raw.to_ascii_lowercase();
    if yes.contains(&raw.as_str()) {
        Some(true)
    } else if no.contains(&raw.as_str()) {
        Some(false)
    } else {
        None
    }
}

// =============================================================================
// Console
// =============================================================================

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print this text (may be empty).
    Output(String),
    /// Stop reading commands.
    Quit,
}

/// One register's command interpreter.
#[derive(Debug)]
pub struct Console {
    config: TerminalConfig,
    lane: CheckoutLane,
}

impl Console {
    pub fn new(store: SharedStore, config: TerminalConfig) -> Self {
        Console {
            config,
            lane: CheckoutLane::new(store),
        }
    }

    pub fn store(&self) -> &SharedStore {
        self.lane.store()
    }

    pub fn lane(&self) -> &CheckoutLane {
        &self.lane
    }

    /// Parses and runs a line.
    pub fn handle_line(&mut self, line: &str) -> CommandResult<Reply> {
        match Command::parse(line)? {
            Some(command) => self.execute(command),
            None => Ok(Reply::Output(String::new())),
        }
    }

    /// Runs a parsed command.
    pub fn execute(&mut self, command: Command) -> CommandResult<Reply> {
        debug!(?command, "Executing command");

        let output = match command {
            Command::Start { cashier } => {
                let id = self.lane.start_transaction(CashierId::new(cashier.trim()))?;
                format!("Transaction {} started for cashier {}", id, cashier.trim())
            }
            Command::Add { code, quantity } => {
                let line = self.lane.add_item(&code, quantity)?;
                let totals = self.lane.current_totals();
                format!(
                    "Added {} x {} @ {} = {}   (running total {})",
                    line.quantity,
                    line.name,
                    self.config.format_money(line.unit_price),
                    self.config.format_money(line.line_total()),
                    self.config.format_money(totals.final_amount)
                )
            }
            Command::Customer { phone } => {
                let bound = self.lane.set_customer(&phone)?;
                let points = self.store().with_store(|store| {
                    store.customers().lookup(&bound.phone).map(|c| c.points())
                });
                match points {
                    Some(points) => format!(
                        "Customer: {} ({})   points: {}",
                        bound.name, bound.phone, points
                    ),
                    None => format!("Customer: {} ({})", bound.name, bound.phone),
                }
            }
            Command::Redeem { use_points } => {
                let redemption = self.lane.apply_loyalty_redemption(use_points)?;
                if redemption.points_consumed == 0 {
                    "No points redeemed".to_string()
                } else {
                    format!(
                        "Redeemed {} points for {}   (total {})",
                        redemption.points_consumed,
                        self.config.format_money(redemption.discount),
                        self.config.format_money(self.lane.current_totals().final_amount)
                    )
                }
            }
            Command::Totals => self.render_totals(),
            Command::Complete { json } => {
                let receipt = self.lane.complete_transaction()?;
                if json {
                    serde_json::to_string_pretty(&receipt)
                        .map_err(|e| CommandError::internal(e.to_string()))?
                } else {
                    format!("{}\n{}", self.config.store_name, receipt)
                }
            }
            Command::Cancel => {
                self.lane.cancel_transaction()?;
                "Transaction cancelled".to_string()
            }
            Command::Restock { code, quantity } => {
                let total = self
                    .store()
                    .with_store_mut(|store| store.restock(&code, quantity))?;
                format!("{}: {} units in stock", code.trim(), total)
            }
            Command::Offer { code, on } => {
                self.store()
                    .with_store_mut(|store| store.set_weekly_offer(&code, on))?;
                format!(
                    "Weekly offer {} for {}",
                    if on { "on" } else { "off" },
                    code.trim()
                )
            }
            Command::Stock => self.store().with_store(|store| store.inventory_report().to_string()),
            Command::Report => self.store().with_store(|store| store.sales_report().to_string()),
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
        };

        Ok(Reply::Output(output))
    }

    fn render_totals(&self) -> String {
        let session = self.lane.current_session();
        let totals = self.lane.current_totals();
        let money = |m| self.config.format_money(m);

        let mut out = String::new();
        let _ = writeln!(out, "Session: {}", session.state());
        if let Some(customer) = session.customer() {
            let _ = writeln!(out, "Customer: {} ({})", customer.name, customer.phone);
        }
        let _ = writeln!(out, "Items:            {:>10}", totals.item_count);
        let _ = writeln!(out, "Subtotal:         {:>10}", money(totals.subtotal));
        let _ = writeln!(out, "Offer discount:   {:>10}", money(totals.offer_discount));
        let _ = writeln!(out, "Loyalty discount: {:>10}", money(totals.loyalty_discount));
        let _ = write!(out, "Total:            {:>10}", money(totals.final_amount));
        out
    }

    /// Cancels any open transaction so its stock and points go back before
    /// the store is saved.
    pub fn shutdown(mut self) {
        if self.lane.current_session().state() == SessionState::Open {
            match self.lane.cancel_transaction() {
                Ok(()) => info!("Open transaction cancelled on exit"),
                Err(err) => warn!(error = %err, "Failed to cancel open transaction on exit"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use market_core::{Customer, Money, Product, Store};

    fn console() -> Console {
        let mut store = Store::new();
        store
            .add_product(
                Product::new("P001", "Coffee", "Grocery", Money::from_cents(1000), false).unwrap(),
                10,
            )
            .unwrap();
        store
            .add_product(
                Product::new("P002", "Juice", "Beverages", Money::from_cents(1000), true).unwrap(),
                5,
            )
            .unwrap();
        store
            .register_customer(
                Customer::restore("Ana", "Silva", "5551234", "ana@example.com", 250, vec![])
                    .unwrap(),
            )
            .unwrap();
        Console::new(SharedStore::new(store), TerminalConfig::default())
    }

    fn run(console: &mut Console, line: &str) -> String {
        match console.handle_line(line).unwrap() {
            Reply::Output(text) => text,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("add P001").unwrap(),
            Some(Command::Add {
                code: "P001".into(),
                quantity: 1
            })
        );
        assert_eq!(
            Command::parse("  ADD P001 5 ").unwrap(),
            Some(Command::Add {
                code: "P001".into(),
                quantity: 5
            })
        );
        assert_eq!(
            Command::parse("redeem yes").unwrap(),
            Some(Command::Redeem { use_points: true })
        );
        assert_eq!(
            Command::parse("offer P001 off").unwrap(),
            Some(Command::Offer {
                code: "P001".into(),
                on: false
            })
        );
        assert_eq!(
            Command::parse("complete --json").unwrap(),
            Some(Command::Complete { json: true })
        );
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("quit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        for line in ["add", "add P001 five", "redeem maybe", "start", "offer P001", "fly"] {
            let err = Command::parse(line).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidCommand, "line: {}", line);
        }
    }

    #[test]
    fn test_checkout_with_redemption() {
        let mut console = console();
        run(&mut console, "start C1");
        let added = run(&mut console, "add P001 5");
        assert!(added.contains("$50.00"));

        let bound = run(&mut console, "customer 5551234");
        assert!(bound.contains("Ana"));
        assert!(bound.contains("250"));

        let redeemed = run(&mut console, "redeem y");
        assert!(redeemed.contains("200 points"));
        assert!(redeemed.contains("$48.00"));

        let receipt = run(&mut console, "complete");
        assert!(receipt.starts_with("Market POS"));
        assert!(receipt.contains("TOTAL:"));
        assert!(receipt.contains("48.00"));

        let points = console
            .store()
            .with_store(|s| s.customers().lookup("5551234").map(|c| c.points()));
        assert_eq!(points, Some(50 + 48));
    }

    #[test]
    fn test_errors_leave_session_usable() {
        let mut console = console();

        let err = console.handle_line("add P001").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        run(&mut console, "start C1");
        let err = console.handle_line("add P001 11").unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        let err = console.handle_line("add P999").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        let err = console.handle_line("add P001 0").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        run(&mut console, "add P001 10");
        let totals = run(&mut console, "totals");
        assert!(totals.contains("$100.00"));
    }

    #[test]
    fn test_cancel_restores_stock() {
        let mut console = console();
        run(&mut console, "start C1");
        run(&mut console, "add P002 3");
        assert_eq!(console.store().with_store(|s| s.ledger().quantity_of("P002")), 2);

        assert_eq!(run(&mut console, "cancel"), "Transaction cancelled");
        assert_eq!(console.store().with_store(|s| s.ledger().quantity_of("P002")), 5);
        assert_eq!(console.lane().current_session().state(), SessionState::Cancelled);
    }

    #[test]
    fn test_complete_json() {
        let mut console = console();
        run(&mut console, "start C1");
        run(&mut console, "add P002 2");
        let json = run(&mut console, "complete --json");

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["lines"][0]["code"], "P002");
        assert!(value.get("finalTotal").is_some());
    }

    #[test]
    fn test_cashier_busy_across_consoles() {
        let mut first = console();
        let mut second = Console::new(first.store().clone(), TerminalConfig::default());

        run(&mut first, "start C1");
        let err = second.handle_line("start C1").unwrap_err();
        assert_eq!(err.code, ErrorCode::CashierBusy);

        run(&mut first, "cancel");
        run(&mut second, "start C1");
    }

    #[test]
    fn test_manager_commands_and_reports() {
        let mut console = console();
        assert_eq!(run(&mut console, "restock P001 5"), "P001: 15 units in stock");
        assert_eq!(run(&mut console, "offer P001 on"), "Weekly offer on for P001");

        run(&mut console, "start C1");
        run(&mut console, "add P001 1");
        run(&mut console, "complete");

        let stock = run(&mut console, "stock");
        assert!(stock.contains("P001: 14 units"));

        let report = run(&mut console, "report");
        assert!(report.contains("C1: 9.00"));
        assert!(report.contains("Total Transactions: 1"));
    }

    #[test]
    fn test_huge_restock_is_an_error_not_a_crash() {
        let mut console = console();
        let err = console
            .handle_line("restock P001 9223372036854775807")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(console.store().with_store(|s| s.ledger().quantity_of("P001")), 10);
    }

    #[test]
    fn test_shutdown_cancels_open_session() {
        let mut console = console();
        let store = console.store().clone();
        run(&mut console, "start C1");
        run(&mut console, "add P001 4");

        console.shutdown();
        assert_eq!(store.with_store(|s| s.ledger().quantity_of("P001")), 10);
        assert!(!store.with_store(|s| s.is_cashier_busy(&CashierId::new("C1"))));
    }

    #[test]
    fn test_quit() {
        let mut console = console();
        assert_eq!(console.handle_line("quit").unwrap(), Reply::Quit);
    }
}
