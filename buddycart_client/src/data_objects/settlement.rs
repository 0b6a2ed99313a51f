use std::{fmt::Display, str::FromStr};

use buddycart_common::Rupee;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::data_objects::club::{ClubbedOrderId, StatusParseError};

//--------------------------------------      UserOrderId     --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOrderId(pub String);

impl FromStr for UserOrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for UserOrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for UserOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UserOrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     PaymentMethod    --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentMethod {
    Online,
    Cod,
    Wallet,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Online => write!(f, "ONLINE"),
            PaymentMethod::Cod => write!(f, "COD"),
            PaymentMethod::Wallet => write!(f, "WALLET"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ONLINE" => Ok(Self::Online),
            "COD" => Ok(Self::Cod),
            "WALLET" => Ok(Self::Wallet),
            s => Err(StatusParseError(format!("Invalid payment method: {s}"))),
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaymentMethod> for String {
    fn from(value: PaymentMethod) -> Self {
        value.to_string()
    }
}

//--------------------------------------     PaymentStatus    --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Failed,
    Cancelled,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Confirmed => write!(f, "CONFIRMED"),
            PaymentStatus::Failed => write!(f, "FAILED"),
            PaymentStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(StatusParseError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        value.to_string()
    }
}

//--------------------------------------  CancellationReason  --------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CancellationReason {
    PaymentFailed,
    #[default]
    UserWithdrew,
    Timeout,
    SystemError,
}

impl Display for CancellationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancellationReason::PaymentFailed => write!(f, "PAYMENT_FAILED"),
            CancellationReason::UserWithdrew => write!(f, "USER_WITHDREW"),
            CancellationReason::Timeout => write!(f, "TIMEOUT"),
            CancellationReason::SystemError => write!(f, "SYSTEM_ERROR"),
        }
    }
}

impl FromStr for CancellationReason {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PAYMENT_FAILED" => Ok(Self::PaymentFailed),
            "USER_WITHDREW" => Ok(Self::UserWithdrew),
            "TIMEOUT" => Ok(Self::Timeout),
            "SYSTEM_ERROR" => Ok(Self::SystemError),
            s => Err(StatusParseError(format!("Invalid cancellation reason: {s}"))),
        }
    }
}

impl TryFrom<String> for CancellationReason {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CancellationReason> for String {
    fn from(value: CancellationReason) -> Self {
        value.to_string()
    }
}

//--------------------------------------       UserOrder      --------------------------------------------------------
/// One user's slice of a clubbed order, created when the split-payment phase starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOrder {
    pub id: UserOrderId,
    pub clubbed_order_id: ClubbedOrderId,
    pub user_id: String,
    pub individual_total: Rupee,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub commitment_deadline: DateTime<Utc>,
    pub is_committed: bool,
    pub delivery_address: String,
    pub delivery_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------  UserOrdersCreated   --------------------------------------------------------
/// The acknowledgement from `POST /split-payment/create-user-orders/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOrdersCreated {
    pub success: bool,
    pub clubbed_order_id: ClubbedOrderId,
    pub user_orders_created: u32,
    pub commitment_deadline: DateTime<Utc>,
    pub message: String,
}

impl UserOrdersCreated {
    /// Builds the equivalent acknowledgement for orders that already exist, from a commitment report.
    pub fn from_existing(report: &CommitmentReport) -> Self {
        let count = (report.committed_users.len() + report.pending_users.len()) as u32;
        Self {
            success: true,
            clubbed_order_id: report.clubbed_order_id.clone(),
            user_orders_created: count,
            commitment_deadline: report.commitment_deadline,
            message: "User orders already exist".to_string(),
        }
    }
}

//--------------------------------------  PaymentCommitment   --------------------------------------------------------
/// The payload for `POST /split-payment/commit`: the user locks in their payment method and delivery details.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentCommitment {
    pub user_order_id: UserOrderId,
    pub payment_method: PaymentMethod,
    pub delivery_address: String,
    pub delivery_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

//--------------------------------------       CommitAck      --------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAck {
    pub success: bool,
    pub message: String,
    pub all_users_committed: bool,
    pub next_step: String,
}

//-------------------------------------- PaymentConfirmation  --------------------------------------------------------
/// The payload for `POST /split-payment/confirm`. The external transaction id and gateway are only meaningful for
/// online payments.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub user_order_id: UserOrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_gateway: Option<String>,
}

//--------------------------------------      ConfirmAck      --------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmAck {
    pub success: bool,
    pub message: String,
    pub all_payments_confirmed: bool,
    pub next_step: String,
}

//-------------------------------------- CancellationRequest  --------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct CancellationRequest {
    pub user_order_id: UserOrderId,
    pub cancellation_reason: CancellationReason,
}

//--------------------------------------  CancellationNotice  --------------------------------------------------------
/// The outcome of `POST /split-payment/cancel`. The fee and compensation are the server's decision and are
/// surfaced to the caller verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationNotice {
    pub id: String,
    pub user_order_id: UserOrderId,
    pub clubbed_order_id: ClubbedOrderId,
    pub cancelled_by_user_id: String,
    pub cancellation_reason: CancellationReason,
    pub cancellation_fee: Rupee,
    pub compensation_amount: Rupee,
    pub cancelled_at: DateTime<Utc>,
}

//-------------------------------------- SettlementSummary    --------------------------------------------------------
/// The current user's split of a clubbed order, from `GET /split-payment/summary/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub clubbed_order_id: ClubbedOrderId,
    pub total_order_value: Rupee,
    pub your_portion: Rupee,
    pub other_users_portion: Rupee,
    pub delivery_fee: Rupee,
    pub discount_applied: Rupee,
    pub final_amount_to_pay: Rupee,
    pub payment_deadline: DateTime<Utc>,
    pub all_users_committed: bool,
    pub confirmed_payments: u32,
    pub pending_payments: u32,
}

impl SettlementSummary {
    /// Time left until the payment deadline, clamped to zero. Enforcement is the server's; this is display-only.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.payment_deadline - now).max(Duration::zero())
    }
}

//--------------------------------------  CommitmentReport    --------------------------------------------------------
/// Who has committed so far, from `GET /split-payment/status/{id}`. `order_confirmed` flips true once every payment
/// is confirmed, which ends the settlement phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitmentReport {
    pub clubbed_order_id: ClubbedOrderId,
    pub commitment_deadline: DateTime<Utc>,
    pub committed_users: Vec<String>,
    pub pending_users: Vec<String>,
    pub all_committed: bool,
    pub order_confirmed: bool,
}

impl CommitmentReport {
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.commitment_deadline - now).max(Duration::zero())
    }
}
