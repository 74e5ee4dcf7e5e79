//! Transaction orchestrator for the checkout pipeline.

use catalog::CatalogOracle;
use chrono::Utc;
use common::OrderId;
use domain::{
    BillingDetails, CourseId, LineItem, Money, Order, PaymentAttempt, PaymentDetails,
    PaymentMethod, PaymentStatus, RefundDetails,
};
use ledger::{LedgerError, OrderLedger};

use crate::cart::CartStore;
use crate::entitlements::{EntitlementStore, GrantOutcome};
use crate::error::CheckoutError;
use crate::gateway::{ChargeRequest, PaymentGateway, PaymentResult, RefundRequest, RefundResult};
use crate::identity::Identity;
use crate::notifier::EmailNotifier;

/// Where order creation resolves its line items from.
///
/// `Cart` is the canonical mode; `Explicit` exists for test and backfill
/// callers that supply their own snapshot.
#[derive(Debug, Clone, Default)]
pub enum LineItemSource {
    /// Resolve from the caller's server-side cart.
    #[default]
    Cart,

    /// Use the supplied course list; falls back to the cart if empty.
    Explicit(Vec<CourseId>),
}

/// Input to `create_order`.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    /// Line item resolution mode.
    pub source: LineItemSource,

    /// Payment method selected at checkout.
    pub payment_method: PaymentMethod,

    /// Billing metadata to record on the order.
    pub billing: BillingDetails,
}

impl CreateOrderRequest {
    /// Creates a request resolving line items from the server-side cart.
    pub fn from_cart(payment_method: PaymentMethod, billing: BillingDetails) -> Self {
        Self {
            source: LineItemSource::Cart,
            payment_method,
            billing,
        }
    }

    /// Creates a request with an explicit course list (test/backfill).
    pub fn explicit(
        courses: Vec<CourseId>,
        payment_method: PaymentMethod,
        billing: BillingDetails,
    ) -> Self {
        Self {
            source: LineItemSource::Explicit(courses),
            payment_method,
            billing,
        }
    }
}

/// Coordinates cart, catalog, ledger, gateway and entitlements to
/// implement order creation, payment processing and refunds.
///
/// The ledger is the single source of truth: every state transition goes
/// through its revision-checked update, and the gateway call is the only
/// suspension point, made with no lock held.
pub struct Orchestrator<L, C, G, N>
where
    L: OrderLedger,
    C: CatalogOracle,
    G: PaymentGateway,
    N: EmailNotifier,
{
    ledger: L,
    catalog: C,
    cart: CartStore<C>,
    entitlements: EntitlementStore,
    gateway: G,
    notifier: N,
}

impl<L, C, G, N> Orchestrator<L, C, G, N>
where
    L: OrderLedger,
    C: CatalogOracle + Clone,
    G: PaymentGateway,
    N: EmailNotifier,
{
    /// Creates a new orchestrator, wiring a fresh cart store and
    /// entitlement store against the given catalog.
    pub fn new(ledger: L, catalog: C, gateway: G, notifier: N) -> Self {
        let entitlements = EntitlementStore::new();
        let cart = CartStore::new(catalog.clone(), entitlements.clone());
        Self {
            ledger,
            catalog,
            cart,
            entitlements,
            gateway,
            notifier,
        }
    }

    /// Returns the cart store this orchestrator checks out from.
    pub fn cart(&self) -> &CartStore<C> {
        &self.cart
    }

    /// Returns the entitlement store this orchestrator grants into.
    pub fn entitlements(&self) -> &EntitlementStore {
        &self.entitlements
    }

    /// Creates a pending order from snapshotted catalog prices.
    ///
    /// Never invokes the payment gateway; payment is a separate step so
    /// billing collection and payment retries stay independent. The
    /// ledger insert and the cart clear form one atomic unit: if the
    /// clear fails the just-inserted order is removed and the error
    /// propagates.
    #[tracing::instrument(skip(self, request), fields(user_id = %identity.user_id))]
    pub async fn create_order(
        &self,
        identity: &Identity,
        request: CreateOrderRequest,
    ) -> Result<Order, CheckoutError> {
        let course_ids: Vec<CourseId> = match &request.source {
            // The cart path enforces uniqueness on add; the explicit
            // list is caller-supplied and deduped here, keeping first
            // occurrence order.
            LineItemSource::Explicit(courses) if !courses.is_empty() => {
                let mut unique: Vec<CourseId> = Vec::with_capacity(courses.len());
                for course_id in courses {
                    if !unique.contains(course_id) {
                        unique.push(course_id.clone());
                    }
                }
                unique
            }
            _ => self
                .cart
                .snapshot(&identity.user_id)
                .await
                .into_iter()
                .map(|entry| entry.course_id)
                .collect(),
        };

        if course_ids.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Snapshot prices. Any unknown or unpublished course aborts the
        // whole operation; partial orders are never created.
        let mut line_items = Vec::with_capacity(course_ids.len());
        for course_id in &course_ids {
            let quote = self
                .catalog
                .quote(course_id)
                .await
                .map_err(CheckoutError::Catalog)?;
            match quote {
                Some(quote) if quote.published => {
                    line_items.push(LineItem::new(course_id.clone(), quote.price));
                }
                _ => return Err(CheckoutError::InvalidCourse(course_id.clone())),
            }
        }

        let order = Order::new(
            OrderId::new(),
            identity.user_id,
            line_items,
            request.payment_method,
            request.billing,
        )?;
        let order = self.ledger.insert(order).await?;

        // Clear only the snapshotted entries: an add that raced in after
        // the snapshot survives. If the clear fails, roll the insert back.
        if let Err(e) = self
            .cart
            .take_entries(&identity.user_id, &course_ids)
            .await
        {
            self.ledger.remove(order.id).await?;
            return Err(e.into());
        }

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total_amount, "order created");
        Ok(order)
    }

    /// Runs a payment attempt for an order.
    ///
    /// Claims the order through the ledger's revision check, invokes the
    /// gateway with no lock held, then records the outcome. A decline is
    /// a normal result (`payment_status = failed`, retryable), never an
    /// error. The outcome is always written to the ledger before it is
    /// returned, so state and return value cannot diverge.
    #[tracing::instrument(skip(self, details), fields(user_id = %identity.user_id, order_id = %order_id))]
    pub async fn process_payment(
        &self,
        identity: &Identity,
        order_id: OrderId,
        method: PaymentMethod,
        details: PaymentDetails,
    ) -> Result<(Order, PaymentResult), CheckoutError> {
        let order = self.load_order(order_id).await?;
        if order.user_id != identity.user_id {
            return Err(CheckoutError::NotOrderOwner(order_id));
        }

        if order.payment_status.is_settled() {
            return Err(CheckoutError::AlreadySettled(order_id));
        }
        if order.payment_status == PaymentStatus::Processing {
            return Err(CheckoutError::PaymentInFlight(order_id));
        }
        if !self.gateway.supports(method) {
            return Err(CheckoutError::MethodNotSupported(method));
        }

        // Claim the order. A concurrent double submission loses this
        // revision-checked update and is reported below.
        let read_revision = order.revision;
        let mut claimed = order;
        claimed.claim_payment()?;
        let mut order = match self.ledger.update(claimed, read_revision).await {
            Ok(order) => order,
            Err(LedgerError::RevisionConflict { .. }) => {
                let fresh = self.load_order(order_id).await?;
                return Err(if fresh.payment_status.is_settled() {
                    CheckoutError::AlreadySettled(order_id)
                } else {
                    CheckoutError::PaymentInFlight(order_id)
                });
            }
            Err(e) => return Err(e.into()),
        };

        // The only suspension point: the gateway call runs with no lock
        // held. A caller timing out here must not infer an outcome; the
        // order stays `processing` until the result is recorded.
        let gateway_start = std::time::Instant::now();
        let result = self
            .gateway
            .charge(ChargeRequest {
                order_id,
                amount: order.total_amount,
                method,
                details,
            })
            .await;
        metrics::histogram!("payment_gateway_duration_seconds")
            .record(gateway_start.elapsed().as_secs_f64());

        match &result {
            PaymentResult::Approved {
                payment_id,
                transaction_id,
            } => {
                let revision = order.revision;
                order.settle(PaymentAttempt::approved(
                    payment_id.clone(),
                    transaction_id.clone(),
                    method,
                ))?;
                let order = self.ledger.update(order, revision).await?;

                // Each grant is independently idempotent; a partial grant
                // from an earlier interrupted attempt cannot double-grant.
                for item in &order.line_items {
                    let outcome = self
                        .entitlements
                        .grant(&order.user_id, item.course_id.clone())
                        .await;
                    if outcome == GrantOutcome::AlreadyOwned {
                        tracing::debug!(course_id = %item.course_id, "entitlement already present");
                    }
                }

                metrics::counter!("payments_processed_total", "outcome" => "approved")
                    .increment(1);
                tracing::info!(order_id = %order.id, %payment_id, "payment settled");

                if let Err(e) = self.notifier.order_confirmed(&order).await {
                    tracing::warn!(order_id = %order.id, error = %e, "order confirmation failed");
                }

                Ok((order, result))
            }
            PaymentResult::Declined { reason } => {
                // Record the decline before returning. If recording it
                // fails, THAT error propagates.
                let revision = order.revision;
                order.decline(PaymentAttempt::declined(method, reason.clone()))?;
                let order = self.ledger.update(order, revision).await?;

                metrics::counter!("payments_processed_total", "outcome" => "declined")
                    .increment(1);
                tracing::info!(order_id = %order.id, %reason, "payment declined");

                Ok((order, result))
            }
        }
    }

    /// Refunds a settled order at the ledger level.
    ///
    /// Entitlements are not revoked. A declined refund leaves the order
    /// unchanged and is returned explicitly; it is never retried
    /// automatically.
    #[tracing::instrument(skip(self, reason), fields(user_id = %identity.user_id, order_id = %order_id))]
    pub async fn refund(
        &self,
        identity: &Identity,
        order_id: OrderId,
        amount: Option<Money>,
        reason: Option<String>,
    ) -> Result<(Order, RefundResult), CheckoutError> {
        let mut order = self.load_order(order_id).await?;
        if order.user_id != identity.user_id && !identity.is_admin() {
            return Err(CheckoutError::NotOrderOwner(order_id));
        }

        if !order.payment_status.can_refund() {
            return Err(CheckoutError::RefundNotAllowed {
                order_id,
                status: order.payment_status,
            });
        }

        let amount = amount.unwrap_or(order.total_amount);
        if !amount.is_positive() || amount > order.total_amount {
            return Err(CheckoutError::InvalidRefundAmount {
                requested: amount,
                total: order.total_amount,
            });
        }

        let payment_id = order
            .payment_details
            .as_ref()
            .and_then(|attempt| attempt.payment_id.clone())
            .ok_or(CheckoutError::MissingPaymentRecord(order_id))?;

        let gateway_start = std::time::Instant::now();
        let result = self.gateway.refund(RefundRequest { payment_id, amount }).await;
        metrics::histogram!("payment_gateway_duration_seconds")
            .record(gateway_start.elapsed().as_secs_f64());

        match &result {
            RefundResult::Approved { refund_id } => {
                let revision = order.revision;
                order.apply_refund(RefundDetails {
                    refund_id: refund_id.clone(),
                    amount,
                    reason,
                    refunded_at: Utc::now(),
                })?;
                let order = self.ledger.update(order, revision).await?;

                metrics::counter!("refunds_processed_total", "outcome" => "approved").increment(1);
                tracing::info!(order_id = %order.id, %refund_id, %amount, "refund settled");
                Ok((order, result))
            }
            RefundResult::Declined { reason } => {
                metrics::counter!("refunds_processed_total", "outcome" => "declined").increment(1);
                tracing::warn!(order_id = %order.id, %reason, "refund declined");
                Ok((order, result))
            }
        }
    }

    /// Retrieves an order, owner-or-admin checked.
    pub async fn get_order(
        &self,
        identity: &Identity,
        order_id: OrderId,
    ) -> Result<Order, CheckoutError> {
        let order = self.load_order(order_id).await?;
        if order.user_id != identity.user_id && !identity.is_admin() {
            return Err(CheckoutError::NotOrderOwner(order_id));
        }
        Ok(order)
    }

    /// Retrieves the caller's orders, oldest first.
    pub async fn orders_for_user(&self, identity: &Identity) -> Result<Vec<Order>, CheckoutError> {
        Ok(self.ledger.list_for_user(identity.user_id).await?)
    }

    async fn load_order(&self, order_id: OrderId) -> Result<Order, CheckoutError> {
        self.ledger
            .get(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))
    }
}
