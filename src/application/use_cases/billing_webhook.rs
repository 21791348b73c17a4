//! Dispatch of verified billing events to the reconciliation steps.
//!
//! Each event is handled in isolation. Plan and period are resolved before any
//! link or write, so an unresolvable event leaves the record store untouched.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        helpers::{billing_period::normalize_period, plan_resolver::PlanResolver},
        ports::{
            payment_processor::PaymentProcessorPort,
            record_store::{BillingEventLogEntry, BillingEventLogTrait, LinkOutcome},
        },
        use_cases::{
            subscription_writer::{SubscriptionStateWriter, SubscriptionWrite},
            user_linker::UserLinker,
        },
    },
    domain::entities::{
        billing_event::{
            BillingEvent, BillingEventKind, CheckoutSessionView, InvoiceView, SubscriptionView,
        },
        user_record::{SubscriptionStatus, SubscriptionUpdate, UserRecord},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A subscription tuple was written.
    Applied {
        user_id: Uuid,
        status: SubscriptionStatus,
    },
    /// Checkout completion, only the customer link was touched.
    Linked,
    /// Recognized no-op or unhandled event type.
    Ignored,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Applied { .. } => "applied",
            DispatchOutcome::Linked => "linked",
            DispatchOutcome::Ignored => "ignored",
        }
    }
}

pub struct BillingWebhookUseCases {
    plan_resolver: PlanResolver,
    processor: Arc<dyn PaymentProcessorPort>,
    linker: Arc<UserLinker>,
    writer: Arc<SubscriptionStateWriter>,
    event_log: Arc<dyn BillingEventLogTrait>,
}

impl BillingWebhookUseCases {
    pub fn new(
        plan_resolver: PlanResolver,
        processor: Arc<dyn PaymentProcessorPort>,
        linker: Arc<UserLinker>,
        writer: Arc<SubscriptionStateWriter>,
        event_log: Arc<dyn BillingEventLogTrait>,
    ) -> Self {
        Self {
            plan_resolver,
            processor,
            linker,
            writer,
            event_log,
        }
    }

    #[instrument(
        skip(self, event),
        fields(event_id = %event.id, event_type = %event.event_type, event_created = ?event.created)
    )]
    pub async fn dispatch(&self, event: &BillingEvent) -> AppResult<DispatchOutcome> {
        match event.kind() {
            BillingEventKind::CheckoutCompleted => self.handle_checkout_completed(event).await,
            BillingEventKind::SubscriptionCreated => {
                self.handle_subscription_change(event, false).await
            }
            BillingEventKind::SubscriptionUpdated => {
                self.handle_subscription_change(event, true).await
            }
            BillingEventKind::SubscriptionDeleted => self.handle_subscription_deleted(event).await,
            BillingEventKind::InvoicePaymentSucceeded => {
                self.handle_invoice(event, SubscriptionStatus::Active).await
            }
            BillingEventKind::InvoicePaymentFailed => {
                self.handle_invoice(event, SubscriptionStatus::PastDue).await
            }
            BillingEventKind::Other(_) => {
                debug!("Unhandled billing event type, acknowledging");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    async fn handle_checkout_completed(&self, event: &BillingEvent) -> AppResult<DispatchOutcome> {
        let session = CheckoutSessionView::new(event.object());

        let (Some(customer_id), Some(external_identity_id)) =
            (session.customer_id(), session.external_identity_id())
        else {
            info!("Checkout session without customer or identity, nothing to link");
            return Ok(DispatchOutcome::Ignored);
        };

        match self
            .linker
            .ensure_link(customer_id, Some(external_identity_id))
            .await?
        {
            // Surface so the processor redelivers once the user record exists
            LinkOutcome::UserMissing => Err(AppError::UserNotFound),
            _ => Ok(DispatchOutcome::Linked),
        }
    }

    /// `customer.subscription.created` and `customer.subscription.updated`.
    async fn handle_subscription_change(
        &self,
        event: &BillingEvent,
        honor_cancel_at_period_end: bool,
    ) -> AppResult<DispatchOutcome> {
        let subscription = SubscriptionView::new(event.object());

        let status = if honor_cancel_at_period_end && subscription.cancel_at_period_end() {
            SubscriptionStatus::Canceled
        } else {
            SubscriptionStatus::from_processor(subscription.status())
        };

        self.reconcile_subscription(event, subscription, status)
            .await
    }

    async fn handle_subscription_deleted(
        &self,
        event: &BillingEvent,
    ) -> AppResult<DispatchOutcome> {
        let subscription = SubscriptionView::new(event.object());
        let customer_id = require_customer_id(&subscription)?;

        let record = self
            .writer
            .write(&SubscriptionWrite {
                billing_customer_id: customer_id.to_string(),
                external_identity_id: subscription.external_identity_id().map(str::to_string),
                update: SubscriptionUpdate::downgrade(),
            })
            .await?;

        Ok(self.applied(event, &record).await)
    }

    /// Invoice events carry too little subscription detail, so the live
    /// subscription is re-fetched. A successful payment always means active.
    async fn handle_invoice(
        &self,
        event: &BillingEvent,
        status: SubscriptionStatus,
    ) -> AppResult<DispatchOutcome> {
        let invoice = InvoiceView::new(event.object());

        let Some(subscription_id) = invoice.subscription_id() else {
            debug!(invoice_id = ?invoice.id(), "Invoice not tied to a subscription, ignoring");
            return Ok(DispatchOutcome::Ignored);
        };

        let live = self.processor.fetch_subscription(subscription_id).await?;
        self.reconcile_subscription(event, SubscriptionView::new(&live), status)
            .await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Resolve plan and period, link, then write. Nothing is linked or written
    /// when either resolution fails.
    async fn reconcile_subscription(
        &self,
        event: &BillingEvent,
        subscription: SubscriptionView<'_>,
        status: SubscriptionStatus,
    ) -> AppResult<DispatchOutcome> {
        let customer_id = require_customer_id(&subscription)?;
        let subscription_id = subscription.id();

        let plan_id = self
            .plan_resolver
            .resolve(
                &subscription.price_candidates(),
                subscription.metadata_plan_id(),
            )
            .ok_or_else(|| {
                AppError::UnresolvedPlan(format!(
                    "subscription {} has no mapped price ({:?}) and no plan metadata",
                    subscription_id.unwrap_or("<unknown>"),
                    subscription.price_candidates()
                ))
            })?;

        let period = normalize_period(subscription.raw()).ok_or_else(|| {
            AppError::UnresolvedPeriod(format!(
                "subscription {} has no current period end",
                subscription_id.unwrap_or("<unknown>")
            ))
        })?;

        let external_identity_id = subscription.external_identity_id();
        self.linker
            .ensure_link(customer_id, external_identity_id)
            .await?;

        let record = self
            .writer
            .write(&SubscriptionWrite {
                billing_customer_id: customer_id.to_string(),
                external_identity_id: external_identity_id.map(str::to_string),
                update: SubscriptionUpdate {
                    subscription_plan_id: plan_id,
                    billing_subscription_id: subscription_id.map(str::to_string),
                    subscription_status: status,
                    current_period_end_ms: period.current_period_end_ms,
                    auto_renew: period.auto_renew,
                },
            })
            .await?;

        Ok(self.applied(event, &record).await)
    }

    /// Record the write in the audit log. Failures here never fail the event.
    async fn applied(&self, event: &BillingEvent, record: &UserRecord) -> DispatchOutcome {
        let entry = BillingEventLogEntry {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            user_id: record.id,
            new_status: record.subscription_status,
        };
        let now_ms = chrono::Utc::now().timestamp_millis();
        if let Err(e) = self.event_log.append(entry, now_ms).await {
            warn!(error = %e, "Failed to log billing event (non-critical)");
        }

        info!(
            user_id = %record.id,
            plan_id = %record.subscription_plan_id,
            status = %record.subscription_status,
            "Subscription state reconciled"
        );

        DispatchOutcome::Applied {
            user_id: record.id,
            status: record.subscription_status,
        }
    }
}

fn require_customer_id<'a>(subscription: &SubscriptionView<'a>) -> AppResult<&'a str> {
    subscription.customer_id().ok_or_else(|| {
        AppError::InvalidInput(format!(
            "subscription {} has no customer id",
            subscription.id().unwrap_or("<unknown>")
        ))
    })
}
