use log::debug;

use crate::metric::MissRate;
use crate::table::{Cell, Table};

/// Appends (or recomputes) the three miss-rate columns.
///
/// Each rate is `numerator / denominator` for its row. A row whose
/// denominator is zero or absent, or whose numerator is absent, gets a rate
/// of exactly 0.
pub fn add_miss_rates(table: &mut Table) {
    for rate in MissRate::ALL {
        let numerator = table.column_index(rate.numerator().name());
        let denominator = table.column_index(rate.denominator().name());
        let column = table.ensure_column(rate.name());

        for row in 0..table.len() {
            let cells = &table.rows()[row].cells;
            let num = numerator.and_then(|index| cells[index]);
            let den = denominator.and_then(|index| cells[index]);

            if num.is_none() || den.is_none() {
                debug!(
                    "{} for '{}' set to 0: {} or {} not reported",
                    rate,
                    table.rows()[row].label,
                    rate.numerator(),
                    rate.denominator()
                );
            }

            let value = ratio(num, den);
            table.set(row, column, Cell::Float(value));
        }
    }
}

fn ratio(numerator: Option<Cell>, denominator: Option<Cell>) -> f64 {
    match (numerator, denominator) {
        (Some(num), Some(den)) if den.as_f64() != 0.0 => {
            let value = num.as_f64() / den.as_f64();
            if value.is_nan() {
                0.0
            } else {
                value
            }
        }
        _ => 0.0,
    }
}
