//! Input line parsing.
//!
//! ```text
//! name <text>            set the pending product name
//! price <amount>         set the pending price
//! add                    add the pending product
//! add <name...> <amount> add a product directly
//! list | total | status | help | quit
//! ```

use anyhow::{bail, Result};
use qrpay_core::Price;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetName(String),
    SetPrice(Price),
    AddDraft,
    Add { name: String, price: Price },
    List,
    Total,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  name <text>             set the product name
  price <amount>          set the product price (e.g. 10 or 10.50)
  add                     add the product from name/price
  add <name...> <amount>  add a product in one go
  list                    show added products
  total                   show the running total
  status                  show QR and request status
  help                    show this help
  quit                    wait for pending requests and exit";

impl Command {
    /// Parses one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_lowercase().as_str() {
            "name" => Command::SetName(rest.to_string()),
            "price" => Command::SetPrice(Price::parse(rest)?),
            "add" if rest.is_empty() => Command::AddDraft,
            "add" => parse_add(rest)?,
            "list" | "ls" => Command::List,
            "total" => Command::Total,
            "status" | "qr" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("unknown command '{}', type 'help'", other),
        };

        Ok(Some(command))
    }
}

/// `add <name...> <amount>`: the last word is the price, the rest the name.
fn parse_add(rest: &str) -> Result<Command> {
    let (name, amount) = match rest.rsplit_once(char::is_whitespace) {
        Some((name, amount)) => (name.trim(), amount),
        None => ("", rest),
    };

    Ok(Command::Add {
        name: name.to_string(),
        price: Price::parse(amount)?,
    })
}
