use std::{fmt::Display, str::FromStr};

use buddycart_common::Rupee;
use chrono::{DateTime, Duration, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_objects::catalog::Cart;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct StatusParseError(pub(crate) String);

//--------------------------------------       QueueId        --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueId(pub String);

impl FromStr for QueueId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for QueueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for QueueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl QueueId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    ClubbedOrderId    --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubbedOrderId(pub String);

impl FromStr for ClubbedOrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for ClubbedOrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for ClubbedOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ClubbedOrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       Location       --------------------------------------------------------
/// A latitude/longitude fix, as sent to `POST /club/check-readiness` and embedded in the join request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && self.lat.abs() <= 90.0 && self.lng.abs() <= 180.0
    }
}

//--------------------------------------      QueueStatus     --------------------------------------------------------
/// The state of a buddy queue entry.
///
/// The backend is inconsistent about the casing of these values on the wire (`"matched"` in the plain status
/// response, `"WAITING"` and `"TIMED_OUT"` elsewhere), so parsing is case-insensitive, mirroring the server's own
/// enum handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QueueStatus {
    Waiting,
    Matched,
    TimedOut,
    Expired,
}

impl QueueStatus {
    /// A terminal entry will never transition again; the only live state is `Waiting`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QueueStatus::Waiting)
    }
}

impl Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueStatus::Waiting => write!(f, "WAITING"),
            QueueStatus::Matched => write!(f, "MATCHED"),
            QueueStatus::TimedOut => write!(f, "TIMED_OUT"),
            QueueStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl FromStr for QueueStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "WAITING" => Ok(Self::Waiting),
            "MATCHED" => Ok(Self::Matched),
            "TIMED_OUT" => Ok(Self::TimedOut),
            "EXPIRED" => Ok(Self::Expired),
            s => Err(StatusParseError(format!("Invalid queue status: {s}"))),
        }
    }
}

impl TryFrom<String> for QueueStatus {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QueueStatus> for String {
    fn from(value: QueueStatus) -> Self {
        value.to_string()
    }
}

//--------------------------------------   QueueJoinRequest   --------------------------------------------------------
/// The payload for `POST /club/join-queue`. Cart totals are computed client-side from the last cart snapshot; the
/// weight goes over the wire in kilograms.
#[derive(Debug, Clone, Serialize)]
pub struct QueueJoinRequest {
    pub cart_id: String,
    pub value_total: Rupee,
    pub weight_total: f64,
    pub lat: f64,
    pub lng: f64,
    pub timeout_minutes: i64,
}

impl QueueJoinRequest {
    pub fn from_cart(cart: &Cart, location: Location, timeout: Duration) -> Self {
        Self {
            cart_id: cart.id.clone(),
            value_total: cart.total(),
            weight_total: cart.weight().to_kilograms(),
            lat: location.lat,
            lng: location.lng,
            timeout_minutes: timeout.num_minutes(),
        }
    }
}

//--------------------------------------      QueueJoined     --------------------------------------------------------
/// The response to a successful join. Some backend builds label the id field `buddyQueueId` instead of `id`;
/// both spellings are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJoined {
    #[serde(alias = "buddyQueueId")]
    pub id: QueueId,
    pub user_id: String,
    pub status: QueueStatus,
    pub created_at: DateTime<Utc>,
    pub timeout_minutes: i64,
}

//--------------------------------------   QueueStatusReport  --------------------------------------------------------
/// The response to `GET /club/status/{queue_id}`. Which optional fields are present depends on the entry's state:
/// a matched entry carries the clubbed order id and the discount, a waiting one carries its creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatusReport {
    pub status: QueueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_users: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clubbed_order_id: Option<ClubbedOrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_given: Option<Rupee>,
}

//--------------------------------------     ClubReadiness    --------------------------------------------------------
/// The response to `POST /club/check-readiness`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubReadiness {
    pub can_club: bool,
    pub estimated_wait_time: i64,
    pub potential_discount: Rupee,
    pub nearby_users_count: u32,
}

//--------------------------------------      OrderStatus     --------------------------------------------------------
/// The lifecycle state of a clubbed order. Parsed case-insensitively, like [`QueueStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrderStatus {
    Created,
    PaymentPending,
    PaymentConfirmed,
    Preparing,
    Dispatched,
    Delivered,
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Created => write!(f, "CREATED"),
            OrderStatus::PaymentPending => write!(f, "PAYMENT_PENDING"),
            OrderStatus::PaymentConfirmed => write!(f, "PAYMENT_CONFIRMED"),
            OrderStatus::Preparing => write!(f, "PREPARING"),
            OrderStatus::Dispatched => write!(f, "DISPATCHED"),
            OrderStatus::Delivered => write!(f, "DELIVERED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATED" => Ok(Self::Created),
            "PAYMENT_PENDING" => Ok(Self::PaymentPending),
            "PAYMENT_CONFIRMED" => Ok(Self::PaymentConfirmed),
            "PREPARING" => Ok(Self::Preparing),
            "DISPATCHED" => Ok(Self::Dispatched),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(StatusParseError(format!("Invalid order status: {s}"))),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        value.to_string()
    }
}

//-------------------------------------- ClubbedParticipant   --------------------------------------------------------
/// One participant in a clubbed order, anonymized by the server. `user_id` is a display label like `"User 1"`,
/// never a real account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubbedParticipant {
    pub user_id: String,
    pub cart_total: Rupee,
    pub item_count: u32,
    pub is_current_user: bool,
}

//--------------------------------------      ClubbedLine     --------------------------------------------------------
/// One of the current user's item lines in a clubbed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubbedLine {
    pub product_name: String,
    pub quantity: u32,
    pub price: Rupee,
    pub added_by_user: String,
}

//--------------------------------------      ClubbedCart     --------------------------------------------------------
/// The merged, privacy-redacted view of a clubbed order from `GET /clubbed-cart/{id}`.
///
/// Other participants appear only as anonymized totals; `items` must contain the current user's lines and nothing
/// else. Combined totals come from the server and are never recomputed locally, since the inputs are hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubbedCart {
    pub clubbed_order_id: ClubbedOrderId,
    pub status: OrderStatus,
    pub total_amount: Rupee,
    pub users: Vec<ClubbedParticipant>,
    pub items: Vec<ClubbedLine>,
    pub other_users_total: Rupee,
}

impl ClubbedCart {
    pub fn current_user(&self) -> Option<&ClubbedParticipant> {
        self.users.iter().find(|u| u.is_current_user)
    }

    pub fn buddy_count(&self) -> u32 {
        self.users.len() as u32
    }

    /// Drops any item line that does not belong to the current user. The server is supposed to do this already;
    /// if a foreign line ever leaks through, it is discarded here and logged rather than displayed.
    pub fn without_foreign_lines(mut self) -> Self {
        let Some(label) = self.current_user().map(|u| u.user_id.clone()) else {
            return self;
        };
        let before = self.items.len();
        self.items.retain(|item| item.added_by_user == label);
        let dropped = before - self.items.len();
        if dropped > 0 {
            warn!("Dropped {dropped} item line(s) in clubbed order {} that belong to other users", self.clubbed_order_id);
        }
        self
    }
}
