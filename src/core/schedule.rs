//! Deposit-due scheduling rules.
//!
//! A regular deposit is due when the customer has not yet made one in the
//! current period of their plan: the calendar day for daily plans, the
//! Sunday-anchored week for weekly plans. Dues-clearance deposits bypass
//! these rules entirely. Calendar dates are taken in UTC.

use crate::{
    config::MonthlyDueRule,
    core::{customer, plan},
    entities::DepositFrequency,
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use serde::Serialize;

/// First day (a Sunday) of the week containing `ts`.
#[must_use]
pub fn week_start(ts: DateTime<Utc>) -> NaiveDate {
    let date = ts.date_naive();
    let offset = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Whether a regular deposit is due at `now`.
///
/// With no previous regular deposit the first one is always due.
#[must_use]
pub fn is_deposit_due(
    frequency: DepositFrequency,
    last_deposit_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    monthly_rule: MonthlyDueRule,
) -> bool {
    let Some(last) = last_deposit_date else {
        return true;
    };

    match frequency {
        DepositFrequency::Daily => last.date_naive() != now.date_naive(),
        DepositFrequency::Weekly => week_start(last) != week_start(now),
        DepositFrequency::Monthly => match monthly_rule {
            MonthlyDueRule::AlwaysDue => true,
            MonthlyDueRule::CalendarMonth => {
                last.year() != now.year() || last.month() != now.month()
            }
        },
    }
}

/// Calendar date on which the next regular deposit falls due.
///
/// Today when a deposit is already due.
#[must_use]
pub fn next_due_date(
    frequency: DepositFrequency,
    last_deposit_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    monthly_rule: MonthlyDueRule,
) -> NaiveDate {
    let today = now.date_naive();
    let Some(last) = last_deposit_date else {
        return today;
    };
    if is_deposit_due(frequency, Some(last), now, monthly_rule) {
        return today;
    }

    let next = match frequency {
        DepositFrequency::Daily => last.date_naive().checked_add_days(Days::new(1)),
        DepositFrequency::Weekly => week_start(last).checked_add_days(Days::new(7)),
        DepositFrequency::Monthly => {
            month_start(last.date_naive()).checked_add_months(Months::new(1))
        }
    };
    next.unwrap_or(today)
}

/// Deposit schedule state of one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositDue {
    pub customer_id: i64,
    pub is_due: bool,
    pub frequency: DepositFrequency,
    /// Amount of the next regular deposit
    pub amount: Decimal,
    pub last_deposit_date: Option<DateTime<Utc>>,
    pub next_due_date: NaiveDate,
}

/// Computes whether the customer owes a regular deposit at `now`.
pub async fn deposit_due_status<C>(
    db: &C,
    customer_id: i64,
    now: DateTime<Utc>,
    monthly_rule: MonthlyDueRule,
) -> Result<DepositDue>
where
    C: ConnectionTrait,
{
    let customer = customer::require_customer(db, customer_id).await?;
    let plan = plan::get_plan_by_id(db, customer.package_id)
        .await?
        .ok_or_else(|| Error::not_found("Plan", customer.package_id))?;

    let frequency = plan.deposit_frequency;
    let last = customer.last_deposit_date;
    Ok(DepositDue {
        customer_id,
        is_due: is_deposit_due(frequency, last, now, monthly_rule),
        frequency,
        amount: plan.deposit_amount,
        last_deposit_date: last,
        next_due_date: next_due_date(frequency, last, now, monthly_rule),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_deposit_is_always_due() {
        for frequency in [
            DepositFrequency::Daily,
            DepositFrequency::Weekly,
            DepositFrequency::Monthly,
        ] {
            assert!(is_deposit_due(
                frequency,
                None,
                at(2026, 10, 18, 9),
                MonthlyDueRule::AlwaysDue
            ));
        }
    }

    #[test]
    fn test_daily_uses_calendar_date() {
        let rule = MonthlyDueRule::AlwaysDue;
        let last = Some(at(2026, 10, 17, 23));
        // Same calendar day
        assert!(!is_deposit_due(DepositFrequency::Daily, last, at(2026, 10, 17, 23), rule));
        // Two hours later but a new day
        assert!(is_deposit_due(DepositFrequency::Daily, last, at(2026, 10, 18, 1), rule));

        let morning = Some(at(2026, 10, 18, 0));
        assert!(!is_deposit_due(DepositFrequency::Daily, morning, at(2026, 10, 18, 22), rule));
    }

    #[test]
    fn test_weekly_is_sunday_anchored() {
        let rule = MonthlyDueRule::AlwaysDue;
        // 2026-10-18 is a Sunday
        assert_eq!(week_start(at(2026, 10, 18, 12)), date(2026, 10, 18));
        assert_eq!(week_start(at(2026, 10, 24, 12)), date(2026, 10, 18));
        assert_eq!(week_start(at(2026, 10, 17, 12)), date(2026, 10, 11));

        let sunday = Some(at(2026, 10, 18, 8));
        assert!(!is_deposit_due(DepositFrequency::Weekly, sunday, at(2026, 10, 24, 20), rule));
        assert!(is_deposit_due(DepositFrequency::Weekly, sunday, at(2026, 10, 25, 0), rule));

        // Saturday to the following day crosses the week boundary
        let saturday = Some(at(2026, 10, 17, 8));
        assert!(is_deposit_due(DepositFrequency::Weekly, saturday, at(2026, 10, 18, 8), rule));
    }

    #[test]
    fn test_monthly_rules() {
        let last = Some(at(2026, 10, 2, 8));
        let now = at(2026, 10, 20, 8);
        assert!(is_deposit_due(
            DepositFrequency::Monthly,
            last,
            now,
            MonthlyDueRule::AlwaysDue
        ));
        assert!(!is_deposit_due(
            DepositFrequency::Monthly,
            last,
            now,
            MonthlyDueRule::CalendarMonth
        ));
        assert!(is_deposit_due(
            DepositFrequency::Monthly,
            last,
            at(2026, 11, 1, 0),
            MonthlyDueRule::CalendarMonth
        ));
    }

    #[test]
    fn test_next_due_date() {
        let rule = MonthlyDueRule::CalendarMonth;
        let now = at(2026, 10, 20, 10);
        assert_eq!(next_due_date(DepositFrequency::Daily, None, now, rule), date(2026, 10, 20));
        assert_eq!(
            next_due_date(DepositFrequency::Daily, Some(at(2026, 10, 20, 6)), now, rule),
            date(2026, 10, 21)
        );
        assert_eq!(
            next_due_date(DepositFrequency::Weekly, Some(at(2026, 10, 19, 6)), now, rule),
            date(2026, 10, 25)
        );
        assert_eq!(
            next_due_date(DepositFrequency::Monthly, Some(at(2026, 10, 1, 6)), now, rule),
            date(2026, 11, 1)
        );
        // Already due
        assert_eq!(
            next_due_date(DepositFrequency::Daily, Some(at(2026, 10, 19, 6)), now, rule),
            date(2026, 10, 20)
        );
    }
}
