use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::{
        ports::record_store::{RefundRepoTrait, UserRecordRepoTrait},
        use_cases::admin::AdminUseCases,
    },
    domain::entities::user_record::{SubscriptionStatus, UserRecord},
};

/// Plan filter value meaning "no filter".
pub const ALL_PLANS: &str = "all";

const MONTHS_PER_YEAR: i64 = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Email,
    Subscription,
    #[default]
    Date,
    Amount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionListQuery {
    /// A plan id, or `all`.
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub order: SortOrder,
}

impl SubscriptionListQuery {
    fn plan_filter(&self) -> Option<&str> {
        self.plan
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && *p != ALL_PLANS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionRow {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub subscription: String,
    pub status: SubscriptionStatus,
    pub date_ms: Option<i64>,
    pub amount_cents: i64,
    pub auto_renew: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingAnalytics {
    pub total_paying_users: i64,
    pub total_mrr_cents: i64,
    pub total_refunds_cents: i64,
    /// MRR × 12. A projection, not contracted annual revenue.
    pub expected_arr_cents: i64,
    pub rows: Vec<SubscriptionRow>,
}

pub struct AnalyticsUseCases {
    admins: Arc<AdminUseCases>,
    users: Arc<dyn UserRecordRepoTrait>,
    refunds: Arc<dyn RefundRepoTrait>,
    monthly_prices: HashMap<String, i64>,
}

impl AnalyticsUseCases {
    pub fn new(
        admins: Arc<AdminUseCases>,
        users: Arc<dyn UserRecordRepoTrait>,
        refunds: Arc<dyn RefundRepoTrait>,
        monthly_prices: HashMap<String, i64>,
    ) -> Self {
        Self {
            admins,
            users,
            refunds,
            monthly_prices,
        }
    }

    /// Revenue summary over all paying users, plus the filtered and sorted
    /// display rows. Any admin may read it.
    #[instrument(skip(self))]
    pub async fn get_analytics(
        &self,
        requester: &str,
        query: &SubscriptionListQuery,
    ) -> AppResult<BillingAnalytics> {
        self.admins.require_admin(requester).await?;

        let paying = self.users.list_non_free().await?;
        let refunds = self.refunds.list_refunds().await?;

        let total_mrr_cents: i64 = paying
            .iter()
            .filter(|u| u.subscription_status.is_revenue_generating())
            .map(|u| self.monthly_price(&u.subscription_plan_id))
            .sum();
        let total_refunds_cents: i64 = refunds.iter().map(|r| r.amount_cents).sum();

        let mut rows: Vec<SubscriptionRow> = paying
            .iter()
            .filter(|u| match query.plan_filter() {
                Some(plan) => u.subscription_plan_id == plan,
                None => true,
            })
            .map(|u| self.to_row(u))
            .collect();
        sort_rows(&mut rows, query.sort, query.order);

        Ok(BillingAnalytics {
            total_paying_users: paying.len() as i64,
            total_mrr_cents,
            total_refunds_cents,
            expected_arr_cents: total_mrr_cents * MONTHS_PER_YEAR,
            rows,
        })
    }

    fn monthly_price(&self, plan_id: &str) -> i64 {
        self.monthly_prices.get(plan_id).copied().unwrap_or(0)
    }

    fn to_row(&self, user: &UserRecord) -> SubscriptionRow {
        SubscriptionRow {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            subscription: user.subscription_plan_id.clone(),
            status: user.subscription_status,
            date_ms: user.effective_period_end_ms(),
            amount_cents: self.monthly_price(&user.subscription_plan_id),
            auto_renew: user.auto_renew,
        }
    }
}

/// Stable sort; ties keep the store's listing order in both directions.
fn sort_rows(rows: &mut [SubscriptionRow], field: SortField, order: SortOrder) {
    rows.sort_by(|a, b| {
        let ordering = compare_rows(a, b, field);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn compare_rows(a: &SubscriptionRow, b: &SubscriptionRow, field: SortField) -> Ordering {
    match field {
        SortField::Name => {
            let a_name = a.name.as_deref().map(str::to_lowercase);
            let b_name = b.name.as_deref().map(str::to_lowercase);
            a_name.cmp(&b_name)
        }
        SortField::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
        SortField::Subscription => a.subscription.cmp(&b.subscription),
        SortField::Date => a.date_ms.cmp(&b.date_ms),
        SortField::Amount => a.amount_cents.cmp(&b.amount_cents),
    }
}
