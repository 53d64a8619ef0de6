//! Plan catalog - savings plans customers enroll in.
//!
//! Plans never touch a balance. They are looked up by the deposit workflow
//! for the regular deposit amount and frequency, and by customer creation
//! for the maturity date.

use crate::{
    config::PlanConfig,
    entities::{DepositFrequency, Plan, plan},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Input for a new plan.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub name: String,
    pub deposit_frequency: DepositFrequency,
    pub deposit_amount: Decimal,
    pub duration_months: i32,
    pub interest_rate: Decimal,
    pub maturity_amount: Decimal,
}

impl From<&PlanConfig> for NewPlan {
    fn from(cfg: &PlanConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            deposit_frequency: cfg.deposit_frequency,
            deposit_amount: cfg.deposit_amount,
            duration_months: cfg.duration_months,
            interest_rate: cfg.interest_rate,
            maturity_amount: cfg.maturity_amount,
        }
    }
}

impl NewPlan {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Plan name cannot be empty"));
        }
        if self.deposit_amount <= Decimal::ZERO {
            return Err(Error::validation("Deposit amount must be greater than zero"));
        }
        if self.duration_months <= 0 {
            return Err(Error::validation("Duration must be at least one month"));
        }
        if self.interest_rate < Decimal::ZERO {
            return Err(Error::validation("Interest rate cannot be negative"));
        }
        if self.maturity_amount < Decimal::ZERO {
            return Err(Error::validation("Maturity amount cannot be negative"));
        }
        Ok(())
    }
}

/// Creates a new active plan after validating its figures.
pub async fn create_plan(db: &DatabaseConnection, new_plan: NewPlan) -> Result<plan::Model> {
    new_plan.validate()?;

    let now = chrono::Utc::now();
    let plan = plan::ActiveModel {
        name: Set(new_plan.name.trim().to_string()),
        deposit_frequency: Set(new_plan.deposit_frequency),
        deposit_amount: Set(new_plan.deposit_amount),
        duration_months: Set(new_plan.duration_months),
        interest_rate: Set(new_plan.interest_rate),
        maturity_amount: Set(new_plan.maturity_amount),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = plan.insert(db).await?;
    tracing::info!("Created plan '{}' (id {})", result.name, result.id);
    Ok(result)
}

/// Finds a plan by id, active or not.
pub async fn get_plan_by_id<C>(db: &C, plan_id: i64) -> Result<Option<plan::Model>>
where
    C: ConnectionTrait,
{
    Plan::find_by_id(plan_id).one(db).await.map_err(Into::into)
}

/// Lists the plans open for enrollment, ordered by name.
pub async fn list_active_plans(db: &DatabaseConnection) -> Result<Vec<plan::Model>> {
    Plan::find()
        .filter(plan::Column::IsActive.eq(true))
        .order_by_asc(plan::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Closes a plan to new enrollment.
///
/// Customers already on the plan keep using it; plans are never hard-deleted
/// so those references always resolve.
pub async fn deactivate_plan(db: &DatabaseConnection, plan_id: i64) -> Result<plan::Model> {
    let plan = get_plan_by_id(db, plan_id)
        .await?
        .ok_or_else(|| Error::not_found("Plan", plan_id))?;

    let mut active: plan::ActiveModel = plan.into();
    active.is_active = Set(false);
    active.updated_at = Set(chrono::Utc::now());
    Ok(active.update(db).await?)
}

/// Inserts every configured plan whose name is not in the catalog yet.
///
/// Returns the number of plans created.
pub async fn seed_plans(db: &DatabaseConnection, plans: &[PlanConfig]) -> Result<usize> {
    let mut created = 0;
    for cfg in plans {
        let exists = Plan::find()
            .filter(plan::Column::Name.eq(cfg.name.trim()))
            .one(db)
            .await?
            .is_some();
        if exists {
            tracing::debug!("Plan '{}' already exists, skipping", cfg.name);
            continue;
        }
        create_plan(db, NewPlan::from(cfg)).await?;
        created += 1;
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_plan_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut bad = daily_plan_input(dec!(100));
        bad.name = "  ".to_string();
        assert!(matches!(
            create_plan(&db, bad).await.unwrap_err(),
            Error::Validation { .. }
        ));

        let bad = daily_plan_input(Decimal::ZERO);
        assert!(matches!(
            create_plan(&db, bad).await.unwrap_err(),
            Error::Validation { .. }
        ));

        let mut bad = daily_plan_input(dec!(100));
        bad.duration_months = 0;
        assert!(matches!(
            create_plan(&db, bad).await.unwrap_err(),
            Error::Validation { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_deactivate_plan_hides_it() -> Result<()> {
        let db = setup_test_db().await?;
        let plan = create_test_plan(&db, DepositFrequency::Daily, dec!(100)).await?;

        assert_eq!(list_active_plans(&db).await?.len(), 1);
        let deactivated = deactivate_plan(&db, plan.id).await?;
        assert!(!deactivated.is_active);
        assert!(list_active_plans(&db).await?.is_empty());

        // Still resolvable for existing customers
        assert!(get_plan_by_id(&db, plan.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_plans_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let plans = vec![PlanConfig {
            name: "Daily 50".to_string(),
            deposit_frequency: DepositFrequency::Daily,
            deposit_amount: dec!(50),
            duration_months: 12,
            interest_rate: dec!(4),
            maturity_amount: dec!(18500),
        }];

        assert_eq!(seed_plans(&db, &plans).await?, 1);
        assert_eq!(seed_plans(&db, &plans).await?, 0);

        let active = list_active_plans(&db).await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].deposit_amount, dec!(50));
        Ok(())
    }
}
