use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use salescope_core::basket::BasketRule;

use super::{BasketRuleRepository, RepositoryError};
use crate::DbPool;

pub struct SqlBasketRuleRepository {
    pool: DbPool,
}

impl SqlBasketRuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BasketRuleRepository for SqlBasketRuleRepository {
    async fn replace_all(
        &self,
        rules: &[BasketRule],
        written_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM basket_rule").execute(&mut *tx).await?;

        let written_at = written_at.to_rfc3339();
        for rule in rules {
            sqlx::query(
                r#"
                INSERT INTO basket_rule (
                    id, antecedent_item, consequent_item, support_pct,
                    confidence_pct, lift, pair_count, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(format!("rule-{}", Uuid::new_v4()))
            .bind(&rule.antecedent)
            .bind(&rule.consequent)
            .bind(rule.support_pct)
            .bind(rule.confidence_pct)
            .bind(rule.lift)
            .bind(rule.pair_count)
            .bind(&written_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(rules.len() as u64)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM basket_rule")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
