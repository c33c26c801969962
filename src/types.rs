use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::RangeInclusive;

pub const DEFAULT_GATEWAY: &str = "http://localhost:8080";

/// Backend services reachable through the gateway, addressed by path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Product,
    User,
    Order,
    Payment,
    Favourite,
    Shipping,
}

impl Service {
    pub const ALL: [Service; 6] = [
        Service::Product,
        Service::User,
        Service::Order,
        Service::Payment,
        Service::Favourite,
        Service::Shipping,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            Service::Product => "product-service",
            Service::User => "user-service",
            Service::Order => "order-service",
            Service::Payment => "payment-service",
            Service::Favourite => "favourite-service",
            Service::Shipping => "shipping-service",
        }
    }

    pub fn api(&self, resource: &str) -> String {
        format!("/{}/api/{}", self.prefix(), resource)
    }

    pub fn health_path(&self) -> String {
        format!("/{}/actuator/health", self.prefix())
    }

    pub fn base_api_path(&self) -> String {
        format!("/{}/api", self.prefix())
    }

    pub fn random() -> Service {
        Service::ALL[rand::thread_rng().gen_range(0..Service::ALL.len())]
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Gateway base URL, either given explicitly or taken from the environment.
#[derive(Debug, Clone)]
pub struct Gateway {
    pub base_url: String,
}

impl Gateway {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("GATEWAY_URL").unwrap_or_else(|_| DEFAULT_GATEWAY.to_string()),
        }
    }

    pub fn with_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Identifier as returned by a creation endpoint. Forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    /// Returns `None` for the values a service uses to say "no id": null, 0, "".
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().filter(|n| *n != 0).map(EntityId::Number),
            Value::String(s) if !s.is_empty() => Some(EntityId::Text(s.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(EntityId),
    Missing,
}

/// Pulls `key` out of a creation response. A non-empty `collection` array wins,
/// otherwise the body is read as a flat object.
pub fn extract_id(body: &str, key: &str) -> Result<Extraction, serde_json::Error> {
    let value: Value = serde_json::from_str(body)?;
    let Some(object) = value.as_object() else {
        return Ok(Extraction::Missing);
    };

    let source = match object
        .get("collection")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
    {
        Some(first) => first.get(key),
        None => object.get(key),
    };

    Ok(source
        .and_then(EntityId::from_value)
        .map_or(Extraction::Missing, Extraction::Found))
}

#[derive(Debug, Serialize)]
pub struct CartPayload {
    #[serde(rename = "userId")]
    pub user_id: u32,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct CartRef {
    #[serde(rename = "cartId")]
    pub cart_id: EntityId,
}

#[derive(Debug, Serialize)]
pub struct OrderPayload {
    #[serde(rename = "orderDesc")]
    pub order_desc: String,
    #[serde(rename = "orderFee")]
    pub order_fee: f64,
    #[serde(rename = "cartDto")]
    pub cart: CartRef,
}

#[derive(Debug, Serialize)]
pub struct OrderRef {
    #[serde(rename = "orderId")]
    pub order_id: EntityId,
}

#[derive(Debug, Serialize)]
pub struct PaymentPayload {
    #[serde(rename = "isPayed")]
    pub is_payed: bool,
    #[serde(rename = "orderDto")]
    pub order: OrderRef,
}

#[derive(Debug, Serialize)]
pub struct FavouritePayload {
    #[serde(rename = "userId")]
    pub user_id: u32,
    #[serde(rename = "productId")]
    pub product_id: u32,
    #[serde(rename = "likeDate")]
    pub like_date: String,
}

/// Date pattern the favourite service parses: `dd-MM-yyyy__HH:mm:ss:SSSSSS`.
pub const LIKE_DATE_FORMAT: &str = "%d-%m-%Y__%H:%M:%S:%6f";

pub fn like_date_now() -> String {
    chrono::Local::now().format(LIKE_DATE_FORMAT).to_string()
}

pub const ORDER_FEE_RANGE: RangeInclusive<f64> = 50.0..=1000.0;

pub fn order_fee<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let fee = rng.gen_range(ORDER_FEE_RANGE);
    (fee * 100.0).round() / 100.0
}

/// Draws a random id without keeping the thread-local RNG alive across awaits.
pub fn random_id(range: RangeInclusive<u32>) -> u32 {
    rand::thread_rng().gen_range(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn flat_and_wrapped_bodies_yield_same_id() {
        let flat = extract_id(r#"{"cartId": 42}"#, "cartId").unwrap();
        let wrapped = extract_id(r#"{"collection": [{"cartId": 42}]}"#, "cartId").unwrap();

        assert_eq!(flat, Extraction::Found(EntityId::Number(42)));
        assert_eq!(flat, wrapped);
    }

    #[test]
    fn wrapped_collection_uses_first_element() {
        let body = r#"{"collection": [{"orderId": 7}, {"orderId": 8}]}"#;
        assert_eq!(
            extract_id(body, "orderId").unwrap(),
            Extraction::Found(EntityId::Number(7))
        );
    }

    #[test]
    fn empty_collection_falls_back_to_flat_lookup() {
        let body = r#"{"collection": [], "orderId": 9}"#;
        assert_eq!(
            extract_id(body, "orderId").unwrap(),
            Extraction::Found(EntityId::Number(9))
        );
    }

    #[test]
    fn absent_or_empty_ids_are_missing() {
        assert_eq!(extract_id(r#"{"other": 1}"#, "cartId").unwrap(), Extraction::Missing);
        assert_eq!(extract_id(r#"{"cartId": null}"#, "cartId").unwrap(), Extraction::Missing);
        assert_eq!(extract_id(r#"{"cartId": 0}"#, "cartId").unwrap(), Extraction::Missing);
        assert_eq!(extract_id(r#"{"cartId": ""}"#, "cartId").unwrap(), Extraction::Missing);
        assert_eq!(extract_id("[1, 2]", "cartId").unwrap(), Extraction::Missing);
    }

    #[test]
    fn string_ids_are_kept_verbatim() {
        assert_eq!(
            extract_id(r#"{"cartId": "c-1"}"#, "cartId").unwrap(),
            Extraction::Found(EntityId::Text("c-1".to_string()))
        );
    }

    #[test]
    fn unparseable_body_is_an_error() {
        assert!(extract_id("<html>oops</html>", "cartId").is_err());
        assert!(extract_id("", "cartId").is_err());
    }

    #[test]
    fn order_fee_stays_in_range_with_two_decimals() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let fee = order_fee(&mut rng);
            assert!(ORDER_FEE_RANGE.contains(&fee), "fee {} out of range", fee);
            let cents = fee * 100.0;
            assert!((cents - cents.round()).abs() < 1e-6, "fee {} has more than 2 decimals", fee);
        }
    }

    #[test]
    fn payloads_use_service_field_names() {
        let order = OrderPayload {
            order_desc: "Order from user 3".to_string(),
            order_fee: 120.5,
            cart: CartRef {
                cart_id: EntityId::Number(42),
            },
        };
        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            json!({"orderDesc": "Order from user 3", "orderFee": 120.5, "cartDto": {"cartId": 42}})
        );

        let payment = PaymentPayload {
            is_payed: false,
            order: OrderRef {
                order_id: EntityId::Text("o-7".to_string()),
            },
        };
        assert_eq!(
            serde_json::to_value(&payment).unwrap(),
            json!({"isPayed": false, "orderDto": {"orderId": "o-7"}})
        );
    }

    #[test]
    fn service_paths() {
        assert_eq!(Service::Shipping.api("shippings"), "/shipping-service/api/shippings");
        assert_eq!(Service::User.health_path(), "/user-service/actuator/health");
        assert_eq!(Service::Favourite.base_api_path(), "/favourite-service/api");
    }

    #[test]
    fn like_date_matches_favourite_pattern() {
        let date = like_date_now();
        let parsed = chrono::NaiveDateTime::parse_from_str(&date, LIKE_DATE_FORMAT);
        assert!(parsed.is_ok(), "{} does not parse", date);
        assert_eq!(date.len(), "18-10-2026__13:45:07:123456".len());
    }

    #[test]
    fn gateway_url_drops_trailing_slash() {
        assert_eq!(Gateway::with_url("http://gw:8080/").base_url, "http://gw:8080");
    }
}
