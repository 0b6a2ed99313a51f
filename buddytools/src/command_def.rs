use buddycart_client::data_objects::{CancellationReason, PaymentMethod};
use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Create a new account and sign straight in. The password is prompted for.
    Register(RegisterParams),
    /// Sign in. The password is prompted for.
    Login {
        #[arg(short, long)]
        email: String,
    },
    /// Sign out and wipe the local state file, including any queue or club markers.
    Logout,
    /// Show the signed-in profile.
    Whoami,
}

#[derive(Debug, Args)]
pub struct RegisterParams {
    /// Your display name
    #[arg(short, long)]
    pub name: String,
    #[arg(short, long)]
    pub email: String,
    /// Phone number for delivery updates
    #[arg(short, long)]
    pub phone: Option<String>,
    /// Default delivery address
    #[arg(short, long)]
    pub address: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Show the active cart
    Show,
    /// Add a product to the cart
    Add {
        #[arg(required = true, index = 1)]
        product_id: String,
        #[arg(index = 2, default_value = "1")]
        quantity: u32,
    },
    /// Change the quantity of a cart line
    Update {
        #[arg(required = true, index = 1)]
        line_id: String,
        #[arg(required = true, index = 2)]
        quantity: u32,
    },
    /// Remove a cart line
    Remove {
        #[arg(required = true, index = 1)]
        line_id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ClubCommand {
    /// Ask whether clubbing is worth offering at a location right now
    Check(LocationParams),
    /// Join the buddy queue and (unless told otherwise) watch for the outcome
    Join(JoinParams),
    /// Watch the recorded queue entry with a live countdown. Picks up where a previous watch left off.
    Watch,
    /// One-shot status of the recorded queue entry
    Status,
    /// Give up on matching and continue alone
    Leave,
}

#[derive(Debug, Args)]
pub struct LocationParams {
    /// Latitude of the delivery location
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,
    /// Longitude of the delivery location
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,
}

#[derive(Debug, Args)]
pub struct JoinParams {
    #[command(flatten)]
    pub location: LocationParams,
    /// How many minutes to wait for buddies. Values outside 2..=10 are clamped.
    #[arg(short, long, default_value = "5")]
    pub timeout: i64,
    /// Join the queue but do not watch for the outcome
    #[arg(long)]
    pub no_watch: bool,
}

#[derive(Debug, Subcommand)]
pub enum ClubbedCommand {
    /// Show the shared cart: your lines in full, your buddies as totals only
    Show,
    /// Add a product to your share of the clubbed order
    Add {
        #[arg(required = true, index = 1)]
        product_id: String,
        #[arg(index = 2, default_value = "1")]
        quantity: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum PayCommand {
    /// Create the per-user settlement records. Safe to run more than once.
    Setup,
    /// Show your split: portion, shared delivery fee, discount, amount to pay
    Summary,
    /// Show who has committed and who is still pending
    Status,
    /// List your user orders across all clubbed orders
    MyOrders,
    /// Lock in your payment method and delivery details
    Commit(CommitParams),
    /// Report your payment as completed
    Confirm(ConfirmParams),
    /// Cancel your share of the clubbed order. The server decides the fee.
    Cancel {
        /// Why you are cancelling: payment_failed, user_withdrew, timeout or system_error
        #[arg(short, long, default_value = "user_withdrew")]
        reason: CancellationReason,
    },
    /// Watch the commitment round until the order confirms
    Watch,
}

#[derive(Debug, Args)]
pub struct CommitParams {
    /// Payment method: online, cod or wallet
    #[arg(short, long, default_value = "online")]
    pub method: PaymentMethod,
    /// Delivery address
    #[arg(short, long)]
    pub address: String,
    /// Delivery phone number
    #[arg(short, long)]
    pub phone: String,
    /// Special delivery instructions
    #[arg(short, long)]
    pub instructions: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfirmParams {
    /// The gateway's transaction id, for online payments
    #[arg(short, long)]
    pub txid: Option<String>,
    /// The payment gateway used, for online payments
    #[arg(short, long)]
    pub gateway: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CheckoutCommand {
    /// Place a solo order from the active cart (flat delivery fee)
    Solo(DeliveryParams),
    /// Place your share of the matched clubbed order (amounts from the settlement summary)
    Clubbed(DeliveryParams),
}

#[derive(Debug, Args)]
pub struct DeliveryParams {
    /// Delivery address
    #[arg(short, long)]
    pub address: String,
    /// Delivery phone number
    #[arg(short, long)]
    pub phone: String,
    /// Special delivery instructions
    #[arg(short, long)]
    pub instructions: Option<String>,
}
