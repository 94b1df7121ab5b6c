//! Report
//!
//! Terminal rendering of processing results.

use std::io;

use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::service::{CodeOutcome, OfferSummary};

/// Errors that can occur when writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Output could not be written.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Write the applied offers as a table followed by the order totals.
///
/// # Errors
///
/// Returns a [`ReportError`] if `out` cannot be written to.
pub fn write_summary(out: &mut impl io::Write, summary: &OfferSummary) -> Result<(), ReportError> {
    writeln!(out, "Order {} ({})", summary.order_id, summary.currency)?;

    if summary.applied.is_empty() {
        writeln!(out, "\nNo offers applied.")?;
    } else {
        let mut builder = Builder::default();

        builder.push_record(["Offer", "Name", "Applies To", "Targets", "Discount"]);

        for applied in &summary.applied {
            builder.push_record([
                applied.offer_id.to_string(),
                applied.name.clone(),
                applied.adjustment_type.to_string(),
                applied.target_item_ids.join("\n"),
                money(applied.discount, &summary.currency),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::last(), Alignment::right());
        table.modify(Rows::first(), Alignment::center());

        writeln!(out, "\n{table}")?;
    }

    let total = summary.subtotal - summary.total_discount;

    writeln!(out)?;
    writeln!(out, " Subtotal: {}", money(summary.subtotal, &summary.currency))?;
    writeln!(out, " Discount: {}", money(summary.total_discount, &summary.currency))?;
    writeln!(out, " Total:    {}", money(total, &summary.currency))?;

    Ok(())
}

/// Write the outcome of entering an offer code.
///
/// # Errors
///
/// Returns a [`ReportError`] if `out` cannot be written to.
pub fn write_code_outcome(
    out: &mut impl io::Write,
    outcome: &CodeOutcome,
) -> Result<(), ReportError> {
    match outcome {
        CodeOutcome::Applied(summary) => write_summary(out, summary),
        CodeOutcome::Rejected { offer_id, reason } => {
            writeln!(out, "Offer {offer_id} was not applied: {reason}")?;

            Ok(())
        }
    }
}

fn money(amount: Decimal, currency: &str) -> String {
    format!("{amount} {currency}")
}
