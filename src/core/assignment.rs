//! Assignment directory - which customers a collector may act on.
//!
//! The relation is stored once, as `customers.collector_id`. Both directions
//! ("customers of collector C" and "collector of customer X") are derived
//! from that column, and [`ensure_assigned`] is the single authorization
//! check every collector-initiated ledger mutation goes through.

use crate::{
    core::{collector, customer as customer_core},
    entities::{Customer, collector as collector_entity, customer},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Ids of the customers assigned to `collector_id`, in ascending order.
pub async fn assigned_customer_ids<C>(db: &C, collector_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    collector::require_collector(db, collector_id).await?;

    Customer::find()
        .select_only()
        .column(customer::Column::Id)
        .filter(customer::Column::CollectorId.eq(collector_id))
        .order_by_asc(customer::Column::Id)
        .into_tuple::<i64>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// The collector a customer is assigned to, if any.
pub async fn collector_for_customer<C>(
    db: &C,
    customer_id: i64,
) -> Result<Option<collector_entity::Model>>
where
    C: ConnectionTrait,
{
    let customer = customer_core::require_customer(db, customer_id).await?;
    match customer.collector_id {
        Some(collector_id) => collector::get_collector_by_id(db, collector_id).await,
        None => Ok(None),
    }
}

pub async fn is_assigned<C>(db: &C, collector_id: i64, customer_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let customer = customer_core::require_customer(db, customer_id).await?;
    Ok(customer.collector_id == Some(collector_id))
}

/// Fails unless `customer_id` is assigned to `collector_id`.
///
/// An unknown collector is a not-found error; a known collector acting on
/// someone else's customer is an authorization error.
pub async fn ensure_assigned<C>(db: &C, collector_id: i64, customer_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    collector::require_collector(db, collector_id).await?;

    if is_assigned(db, collector_id, customer_id).await? {
        Ok(())
    } else {
        tracing::warn!(
            "Collector {} refused: customer {} is not assigned to them",
            collector_id,
            customer_id
        );
        Err(Error::Unauthorized {
            collector_id,
            customer_id,
        })
    }
}

/// Assigns a customer to a collector, moving it away from any previous
/// collector. Re-assigning to the current collector is a no-op.
pub async fn assign_customer(
    db: &DatabaseConnection,
    customer_id: i64,
    collector_id: i64,
) -> Result<customer::Model> {
    let collector = collector::require_collector(db, collector_id).await?;
    if !collector.is_active {
        return Err(Error::validation(format!(
            "Collector {collector_id} is inactive"
        )));
    }

    let customer = customer_core::require_customer(db, customer_id).await?;
    if customer.collector_id == Some(collector_id) {
        return Ok(customer);
    }

    let previous = customer.collector_id;
    let mut active: customer::ActiveModel = customer.into();
    active.collector_id = Set(Some(collector_id));
    let result = active.update(db).await?;

    tracing::info!(
        "Customer {} moved from collector {:?} to {}",
        customer_id,
        previous,
        collector_id
    );
    Ok(result)
}

/// Removes a customer's collector assignment.
pub async fn unassign_customer(
    db: &DatabaseConnection,
    customer_id: i64,
) -> Result<customer::Model> {
    let customer = customer_core::require_customer(db, customer_id).await?;
    if customer.collector_id.is_none() {
        return Ok(customer);
    }

    let mut active: customer::ActiveModel = customer.into();
    active.collector_id = Set(None);
    Ok(active.update(db).await?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{entities::DepositFrequency, test_utils::*};

    #[tokio::test]
    async fn test_assignment_lookups_both_directions() -> Result<()> {
        let db = setup_test_db().await?;
        let plan = create_test_plan(&db, DepositFrequency::Daily, dec!(100)).await?;
        let ravi = create_test_collector(&db, "Ravi").await?;
        let meena = create_test_collector(&db, "Meena").await?;
        let a = create_test_customer(&db, "A", plan.id, Some(ravi.id)).await?;
        let b = create_test_customer(&db, "B", plan.id, Some(meena.id)).await?;

        assert_eq!(assigned_customer_ids(&db, ravi.id).await?, vec![a.id]);
        assert_eq!(assigned_customer_ids(&db, meena.id).await?, vec![b.id]);
        assert_eq!(collector_for_customer(&db, a.id).await?, Some(ravi.clone()));

        assert!(ensure_assigned(&db, ravi.id, a.id).await.is_ok());
        assert!(matches!(
            ensure_assigned(&db, ravi.id, b.id).await.unwrap_err(),
            Error::Unauthorized { .. }
        ));
        assert!(matches!(
            ensure_assigned(&db, 999, a.id).await.unwrap_err(),
            Error::NotFound { entity: "Collector", .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_reassignment_moves_customer() -> Result<()> {
        let db = setup_test_db().await?;
        let plan = create_test_plan(&db, DepositFrequency::Daily, dec!(100)).await?;
        let ravi = create_test_collector(&db, "Ravi").await?;
        let meena = create_test_collector(&db, "Meena").await?;
        let a = create_test_customer(&db, "A", plan.id, Some(ravi.id)).await?;

        assign_customer(&db, a.id, meena.id).await?;
        // Assigning twice must not duplicate anything
        assign_customer(&db, a.id, meena.id).await?;

        assert!(assigned_customer_ids(&db, ravi.id).await?.is_empty());
        assert_eq!(assigned_customer_ids(&db, meena.id).await?, vec![a.id]);
        assert!(!is_assigned(&db, ravi.id, a.id).await?);

        let unassigned = unassign_customer(&db, a.id).await?;
        assert!(unassigned.collector_id.is_none());
        assert!(collector_for_customer(&db, a.id).await?.is_none());
        Ok(())
    }
}
