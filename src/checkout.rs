use goose::goose::GooseResponse;
use goose::metrics::GooseRequestMetric;
use goose::prelude::*;
use log::{debug, warn};
use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::behaviors::{identity, post_named};
use crate::error::CheckoutError;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateCart,
    CreateOrder,
    ProcessPayment,
}

impl Step {
    /// Request name reported to the engine.
    pub fn name(&self) -> &'static str {
        match self {
            Step::CreateCart => "Create Cart (Order Service)",
            Step::CreateOrder => "Create Order",
            Step::ProcessPayment => "Process Payment",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Step::CreateCart => "create cart",
            Step::CreateOrder => "create order",
            Step::ProcessPayment => "process payment",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Step::CreateCart => Service::Order.api("carts"),
            Step::CreateOrder => Service::Order.api("orders"),
            Step::ProcessPayment => Service::Payment.api("payments"),
        }
    }
}

pub fn is_accepted(status: u16) -> bool {
    matches!(status, 200 | 201)
}

fn accept(step: Step, status: u16) -> Result<(), CheckoutError> {
    if is_accepted(status) {
        Ok(())
    } else {
        Err(CheckoutError::Status { step, status })
    }
}

fn created_id(step: Step, key: &str, status: u16, body: &str) -> Result<EntityId, CheckoutError> {
    accept(step, status)?;
    match extract_id(body, key) {
        Ok(Extraction::Found(id)) => Ok(id),
        Ok(Extraction::Missing) => Err(CheckoutError::Body {
            step,
            reason: format!("no {} in response", key),
        }),
        Err(err) => Err(CheckoutError::Body {
            step,
            reason: err.to_string(),
        }),
    }
}

/// State of one checkout attempt. Each identifier is filled from the
/// response of the step before it; the whole value is dropped on abort.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub user_id: u32,
    pub order_fee: f64,
    pub cart_id: Option<EntityId>,
    pub order_id: Option<EntityId>,
    pub paid: bool,
}

impl CheckoutSession {
    pub fn new(user_id: u32, order_fee: f64) -> Self {
        Self {
            user_id,
            order_fee,
            cart_id: None,
            order_id: None,
            paid: false,
        }
    }

    pub fn start(user_id: u32) -> Self {
        let fee = order_fee(&mut rand::thread_rng());
        Self::new(user_id, fee)
    }

    pub fn cart_payload(&self) -> CartPayload {
        CartPayload {
            user_id: self.user_id,
            is_active: true,
        }
    }

    pub fn record_cart(&mut self, status: u16, body: &str) -> Result<(), CheckoutError> {
        self.cart_id = Some(created_id(Step::CreateCart, "cartId", status, body)?);
        Ok(())
    }

    pub fn order_payload(&self) -> Result<OrderPayload, CheckoutError> {
        let cart_id = self
            .cart_id
            .clone()
            .ok_or(CheckoutError::MissingPrecondition {
                step: Step::CreateOrder,
                missing: "cart id",
            })?;

        Ok(OrderPayload {
            order_desc: format!("Order from user {}", self.user_id),
            order_fee: self.order_fee,
            cart: CartRef { cart_id },
        })
    }

    pub fn record_order(&mut self, status: u16, body: &str) -> Result<(), CheckoutError> {
        self.order_id = Some(created_id(Step::CreateOrder, "orderId", status, body)?);
        Ok(())
    }

    pub fn payment_payload(&self) -> Result<PaymentPayload, CheckoutError> {
        let order_id = self
            .order_id
            .clone()
            .ok_or(CheckoutError::MissingPrecondition {
                step: Step::ProcessPayment,
                missing: "order id",
            })?;

        Ok(PaymentPayload {
            is_payed: false,
            order: OrderRef { order_id },
        })
    }

    pub fn record_payment(&mut self, status: u16) -> Result<(), CheckoutError> {
        accept(Step::ProcessPayment, status)?;
        self.paid = true;
        Ok(())
    }
}

struct StepReply {
    request: GooseRequestMetric,
    status: u16,
    headers: Option<HeaderMap>,
    body: String,
}

async fn send_step<T: Serialize>(
    user: &mut GooseUser,
    step: Step,
    payload: &T,
) -> Result<StepReply, Box<TransactionError>> {
    let GooseResponse { request, response, .. } =
        post_named(user, &step.path(), step.name(), payload).await?;

    let status = request.status_code;
    let (headers, body) = match response {
        Ok(response) => {
            let headers = response.headers().clone();
            // An unreadable body is treated like an empty one and fails parsing.
            (Some(headers), response.text().await.unwrap_or_default())
        }
        Err(err) => {
            debug!("{} transport error: {}", step.name(), err);
            (None, String::new())
        }
    };

    Ok(StepReply {
        request,
        status,
        headers,
        body,
    })
}

fn settle(
    user: &GooseUser,
    reply: &mut StepReply,
    outcome: Result<(), CheckoutError>,
) -> TransactionResult {
    match outcome {
        Ok(()) => user.set_success(&mut reply.request),
        Err(error) => {
            warn!("checkout abandoned at {}: {}", error.step().name(), error);
            user.set_failure(
                &error.to_string(),
                &mut reply.request,
                reply.headers.as_ref(),
                Some(reply.body.as_str()),
            )
        }
    }
}

/// Missing identifiers only follow a step that already reported its failure.
fn abandon(error: CheckoutError) -> TransactionResult {
    debug_assert!(!error.is_reportable());
    warn!("checkout abandoned: {}", error);
    Ok(())
}

/// Cart, order, payment. Stops at the first step that fails.
pub async fn complete_checkout(user: &mut GooseUser) -> TransactionResult {
    let mut session = CheckoutSession::start(identity(user));
    debug!(
        "checkout for user {} with fee {:.2}",
        session.user_id, session.order_fee
    );

    let payload = session.cart_payload();
    let mut reply = send_step(user, Step::CreateCart, &payload).await?;
    let outcome = session.record_cart(reply.status, &reply.body);
    settle(user, &mut reply, outcome)?;

    let payload = match session.order_payload() {
        Ok(payload) => payload,
        Err(error) => return abandon(error),
    };
    let mut reply = send_step(user, Step::CreateOrder, &payload).await?;
    let outcome = session.record_order(reply.status, &reply.body);
    settle(user, &mut reply, outcome)?;

    let payload = match session.payment_payload() {
        Ok(payload) => payload,
        Err(error) => return abandon(error),
    };
    let mut reply = send_step(user, Step::ProcessPayment, &payload).await?;
    let outcome = session.record_payment(reply.status);
    settle(user, &mut reply, outcome)
}
