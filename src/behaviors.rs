use goose::goose::GooseResponse;
use goose::prelude::*;
use log::{debug, warn};
use serde::Serialize;
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::types::*;

pub const USER_ID_RANGE: RangeInclusive<u32> = 1..=100;
pub const PRODUCT_ID_RANGE: RangeInclusive<u32> = 1..=100;
pub const CATEGORY_ID_RANGE: RangeInclusive<u32> = 1..=20;
pub const ORDER_ID_RANGE: RangeInclusive<u32> = 1..=100;
pub const PAYMENT_ID_RANGE: RangeInclusive<u32> = 1..=100;
pub const SHIPPING_KEY_RANGE: RangeInclusive<u32> = 1..=50;

/// Fixed pause inside the intensive browsing chain.
pub const INTENSIVE_PAUSE: Duration = Duration::from_millis(500);

/// Per-user identity, assigned once when the goose user starts.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: u32,
}

pub async fn assign_identity(user: &mut GooseUser) -> TransactionResult {
    let user_id = random_id(USER_ID_RANGE);
    user.set_session_data(Identity { user_id });
    debug!("goose user {} plays shop user {}", user.weighted_users_index, user_id);
    Ok(())
}

/// Identity of this goose user, assigning one if the on-start transaction has not run.
pub fn identity(user: &mut GooseUser) -> u32 {
    if let Some(identity) = user.get_session_data::<Identity>() {
        return identity.user_id;
    }
    let user_id = random_id(USER_ID_RANGE);
    user.set_session_data(Identity { user_id });
    user_id
}

/// POST a JSON payload under a stable request name.
pub async fn post_named<T: Serialize + ?Sized>(
    user: &mut GooseUser,
    path: &str,
    name: &str,
    payload: &T,
) -> Result<GooseResponse, Box<TransactionError>> {
    let request_builder = user
        .get_request_builder(&GooseMethod::Post, path)?
        .json(payload);
    let goose_request = GooseRequest::builder()
        .method(GooseMethod::Post)
        .path(path)
        .name(name)
        .set_request_builder(request_builder)
        .build();

    user.request(goose_request).await
}

pub async fn browse_products_catalog(user: &mut GooseUser) -> TransactionResult {
    let products = Service::Product.api("products");
    let _goose = user.get_named(&products, "Get All Products").await?;

    let product_id = random_id(PRODUCT_ID_RANGE);
    let _goose = user
        .get_named(&format!("{}/{}", products, product_id), "Get Product Details")
        .await?;

    Ok(())
}

pub async fn browse_categories(user: &mut GooseUser) -> TransactionResult {
    let categories = Service::Product.api("categories");
    let _goose = user.get_named(&categories, "Get All Categories").await?;

    let category_id = random_id(CATEGORY_ID_RANGE);
    let _goose = user
        .get_named(&format!("{}/{}", categories, category_id), "Get Category Details")
        .await?;

    Ok(())
}

pub async fn browse_users(user: &mut GooseUser) -> TransactionResult {
    let users = Service::User.api("users");
    let _goose = user.get_named(&users, "Get All Users").await?;

    let user_id = random_id(USER_ID_RANGE);
    let _goose = user
        .get_named(&format!("{}/{}", users, user_id), "Get User Details")
        .await?;

    Ok(())
}

pub async fn browse_orders(user: &mut GooseUser) -> TransactionResult {
    let orders = Service::Order.api("orders");
    let _goose = user.get_named(&orders, "Get All Orders").await?;
    let _goose = user
        .get_named(&Service::Order.api("carts"), "Get All Carts")
        .await?;

    let order_id = random_id(ORDER_ID_RANGE);
    let _goose = user
        .get_named(&format!("{}/{}", orders, order_id), "Get Order Details")
        .await?;

    Ok(())
}

pub async fn browse_payments(user: &mut GooseUser) -> TransactionResult {
    let payments = Service::Payment.api("payments");
    let _goose = user.get_named(&payments, "Get All Payments").await?;

    let payment_id = random_id(PAYMENT_ID_RANGE);
    let _goose = user
        .get_named(&format!("{}/{}", payments, payment_id), "Get Payment Details")
        .await?;

    Ok(())
}

pub async fn manage_favourites(user: &mut GooseUser) -> TransactionResult {
    let favourites = Service::Favourite.api("favourites");
    let _goose = user.get_named(&favourites, "Get All Favourites").await?;

    let payload = FavouritePayload {
        user_id: identity(user),
        product_id: random_id(PRODUCT_ID_RANGE),
        like_date: like_date_now(),
    };
    let _goose = post_named(user, &favourites, "Add to Favourites", &payload).await?;

    Ok(())
}

pub async fn browse_shipping(user: &mut GooseUser) -> TransactionResult {
    let shippings = Service::Shipping.api("shippings");
    let _goose = user.get_named(&shippings, "Get All Order Items").await?;

    let order_id = random_id(SHIPPING_KEY_RANGE);
    let product_id = random_id(SHIPPING_KEY_RANGE);
    let _goose = user
        .get_named(
            &format!("{}/{}/{}", shippings, order_id, product_id),
            "Get Order Item Details",
        )
        .await?;

    Ok(())
}

/// Only a missing health endpoint sends the user to the service's base path.
pub fn needs_fallback(status: u16) -> bool {
    status == 404
}

pub async fn health_checks(user: &mut GooseUser) -> TransactionResult {
    let service = Service::random();

    let mut goose = user
        .get_named(&service.health_path(), &format!("Health Check - {}", service))
        .await?;

    // Goose already counts the 404 as a failed request.
    if needs_fallback(goose.request.status_code) {
        warn!("health endpoint not available on {}, checking its api instead", service);
        let _goose = user
            .get_named(&service.base_api_path(), &format!("Service Check - {}", service))
            .await?;
    } else {
        user.set_success(&mut goose.request)?;
    }

    Ok(())
}

pub async fn intensive_browsing(user: &mut GooseUser) -> TransactionResult {
    browse_products_catalog(user).await?;
    tokio::time::sleep(INTENSIVE_PAUSE).await;
    browse_categories(user).await?;
    browse_orders(user).await
}
