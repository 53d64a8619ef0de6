//! Ledger behaviour switches.
//!
//! Two rules of the deposit workflow are unsettled product questions. Both
//! default to the behaviour the scheme has always had; the alternatives can
//! be switched on from `config.toml`.

use serde::Deserialize;

/// When a regular deposit on a monthly plan falls due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyDueRule {
    /// Monthly plans have no schedule gate
    #[default]
    AlwaysDue,
    /// Due once the calendar month differs from the last deposit's
    CalendarMonth,
}

/// Which deposits an administrator may reject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRejectGate {
    /// Only deposits that are neither approved nor paid online.
    /// Suspected to be inverted; kept until product confirms the intent.
    #[default]
    Literal,
    /// Any deposit that is not already rejected
    Corrected,
}

/// Settings read from the `[ledger]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LedgerSettings {
    #[serde(default)]
    pub monthly_due_rule: MonthlyDueRule,
    #[serde(default)]
    pub admin_reject_gate: AdminRejectGate,
}
