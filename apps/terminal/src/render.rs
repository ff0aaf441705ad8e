//! Text rendering for the till screen.

use qrpay_core::{Ledger, Money};
use qrpay_sync::CoordinatorStatus;

pub fn product_list(ledger: &Ledger, symbol: &str) -> String {
    if ledger.is_empty() {
        return "no products yet".to_string();
    }

    let width = ledger
        .products()
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = String::new();
    for (i, product) in ledger.products().iter().enumerate() {
        let name = if product.name.is_empty() { "-" } else { &product.name };
        out.push_str(&format!(
            "{:>3}. {:<width$}  {}\n",
            i + 1,
            name,
            product.price.money().format_with_symbol(symbol),
            width = width
        ));
    }
    out.push_str(&total_line(ledger.total(), symbol));
    out
}

pub fn total_line(total: Money, symbol: &str) -> String {
    format!("Total Amount: {}", total.format_with_symbol(symbol))
}

pub fn status(status: &CoordinatorStatus, symbol: &str) -> String {
    let qr = match (status.displayed_seq, status.displayed_total) {
        (Some(seq), Some(total)) => {
            format!("showing QR for {} (#{})", total.format_with_symbol(symbol), seq)
        }
        _ => "no QR yet".to_string(),
    };

    let mut out = format!(
        "{}\npending: {} QR, {} total updates\nordering: {}",
        qr, status.pending_fetches, status.pending_pushes, status.ordering
    );
    if let Some(err) = &status.last_error {
        out.push_str(&format!("\nlast error: {}", err));
    }
    out
}
