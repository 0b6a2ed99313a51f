use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use anyhow::Result;
use buddycart_client::{
    checkout::{tracking_timeline, DeliveryDetails, OrderConfirmation},
    data_objects::{CancellationReason, ClubbedOrderId, Credentials, Location, NewUser, PaymentCommitment, PaymentConfirmation},
    events::{Handler, MatchEvent, SettlementEvent},
    BuddyCartClient,
};
use buddycart_common::Secret;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use log::*;
use tokio::sync::Mutex;

use crate::{
    command_def::{
        AuthCommand,
        CartCommand,
        CheckoutCommand,
        ClubCommand,
        ClubbedCommand,
        CommitParams,
        ConfirmParams,
        DeliveryParams,
        JoinParams,
        LocationParams,
        PayCommand,
        RegisterParams,
    },
    formatting::{
        format_cart,
        format_clubbed_cart,
        format_commitments,
        format_confirmation,
        format_countdown,
        format_products,
        format_readiness,
        format_summary,
        format_timeline,
        format_user_orders,
    },
};

fn new_client() -> BuddyCartClient {
    match BuddyCartClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error creating the BuddyCart client: {e}");
            std::process::exit(1);
        },
    }
}

/// A client with a live, revalidated session. Exits with guidance when nobody is signed in.
async fn signed_in_client() -> BuddyCartClient {
    let client = new_client();
    match client.session().restore().await {
        Ok(Some(user)) => {
            debug!("Session restored for {}", user.email);
            client
        },
        Ok(None) => {
            eprintln!("You are not signed in. Run `buddytools auth login --email <email>` first.");
            std::process::exit(1);
        },
        Err(e) => {
            eprintln!("Error restoring your session: {e}");
            std::process::exit(1);
        },
    }
}

/// The clubbed order recorded at match time. Exits with guidance when there is none.
fn current_club(client: &BuddyCartClient) -> ClubbedOrderId {
    match client.clubbed().current_club() {
        Ok(Some(marker)) => marker.clubbed_order_id,
        Ok(None) => {
            eprintln!("No clubbed order on record. Join a queue with `buddytools club join` and get matched first.");
            std::process::exit(1);
        },
        Err(e) => {
            eprintln!("Error reading the state file: {e}");
            std::process::exit(1);
        },
    }
}

fn new_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:5} {msg} [{elapsed}]")
            .unwrap()
            .tick_strings(&["🕛 ", "🕐 ", "🕑 ", "🕒 ", "🕓 ", "🕔 ", "🕕 ", "🕖 ", "🕗 ", "🕘 ", "🕙 ", "🕚 "]),
    );
    pb.set_message(msg.to_string());
    pb
}

fn render(result: Result<String>) -> String {
    result.unwrap_or_else(|e| format!("Could not render this view. {e}"))
}

//--------------------------------------         Auth         --------------------------------------------------------

pub async fn handle_auth_command(command: AuthCommand) {
    match command {
        AuthCommand::Register(params) => register(params).await,
        AuthCommand::Login { email } => login(email).await,
        AuthCommand::Logout => logout().await,
        AuthCommand::Whoami => whoami().await,
    }
}

async fn register(params: RegisterParams) {
    let password = match dialoguer::Password::new()
        .with_prompt("Choose a password")
        .with_confirmation("Confirm the password", "The passwords do not match")
        .interact()
    {
        Ok(password) => password,
        Err(e) => {
            eprintln!("Could not read the password: {e}");
            return;
        },
    };
    let client = new_client();
    let new_user = NewUser {
        name: params.name,
        email: params.email,
        password: Secret::new(password),
        phone: params.phone,
        address: params.address,
    };
    match client.session().register(new_user).await {
        Ok(user) => println!("🔑 Welcome to BuddyCart, {}. You are signed in as {}.", user.name, user.email),
        Err(e) => eprintln!("Error creating the account: {e}"),
    }
}

async fn login(email: String) {
    let password = match dialoguer::Password::new().with_prompt("Password").interact() {
        Ok(password) => password,
        Err(e) => {
            eprintln!("Could not read the password: {e}");
            return;
        },
    };
    let client = new_client();
    match client.session().login(Credentials::new(email, password)).await {
        Ok(user) => println!("🔑 Signed in as {} ({})", user.name, user.email),
        Err(e) => eprintln!("Error signing in: {e}"),
    }
}

async fn logout() {
    let client = new_client();
    match client.session().logout().await {
        Ok(()) => println!("🔒 Signed out. Local state cleared."),
        Err(e) => eprintln!("Error signing out: {e}"),
    }
}

async fn whoami() {
    let client = signed_in_client().await;
    match client.session().current_user() {
        Ok(Some(user)) => {
            let json = serde_json::to_string_pretty(&user)
                .unwrap_or_else(|e| format!("Could not represent the profile as JSON. {e}"));
            println!("{json}");
        },
        Ok(None) => println!("You are not signed in"),
        Err(e) => eprintln!("Error reading the state file: {e}"),
    }
}

//--------------------------------------       Catalog        --------------------------------------------------------

pub async fn list_products() {
    let client = new_client();
    // Browsing works without an account; attach the session when one is on file.
    if let Err(e) = client.session().restore().await {
        warn!("Could not restore the session, browsing anonymously. {e}");
    }
    match client.cart().products().await {
        Ok(products) => println!("{}", format_products(&products)),
        Err(e) => eprintln!("Error fetching the catalog: {e}"),
    }
}

//--------------------------------------         Cart         --------------------------------------------------------

pub async fn handle_cart_command(command: CartCommand) {
    match command {
        CartCommand::Show => show_cart().await,
        CartCommand::Add { product_id, quantity } => add_to_cart(product_id, quantity).await,
        CartCommand::Update { line_id, quantity } => update_cart_line(line_id, quantity).await,
        CartCommand::Remove { line_id } => remove_cart_line(line_id).await,
        CartCommand::Clear => clear_cart().await,
    }
}

async fn show_cart() {
    let client = signed_in_client().await;
    match client.cart().load().await {
        Ok(cart) => println!("{}", render(format_cart(&cart))),
        Err(e) => eprintln!("Error fetching the cart: {e}"),
    }
}

async fn add_to_cart(product_id: String, quantity: u32) {
    let client = signed_in_client().await;
    match client.cart().add_item(&product_id, quantity).await {
        Ok(cart) => {
            println!("Added {quantity} × {product_id}");
            println!("{}", render(format_cart(&cart)));
        },
        Err(e) => eprintln!("Error adding {product_id} to the cart: {e}"),
    }
}

async fn update_cart_line(line_id: String, quantity: u32) {
    let client = signed_in_client().await;
    match client.cart().update_quantity(&line_id, quantity).await {
        Ok(cart) => println!("{}", render(format_cart(&cart))),
        Err(e) => eprintln!("Error updating cart line {line_id}: {e}"),
    }
}

async fn remove_cart_line(line_id: String) {
    let client = signed_in_client().await;
    match client.cart().remove_item(&line_id).await {
        Ok(cart) => println!("{}", render(format_cart(&cart))),
        Err(e) => eprintln!("Error removing cart line {line_id}: {e}"),
    }
}

async fn clear_cart() {
    let client = signed_in_client().await;
    match client.cart().clear().await {
        Ok(_) => println!("Cart cleared"),
        Err(e) => eprintln!("Error clearing the cart: {e}"),
    }
}

//--------------------------------------         Club         --------------------------------------------------------

pub async fn handle_club_command(command: ClubCommand) {
    match command {
        ClubCommand::Check(params) => check_readiness(params).await,
        ClubCommand::Join(params) => join_queue(params).await,
        ClubCommand::Watch => watch_queue().await,
        ClubCommand::Status => queue_status().await,
        ClubCommand::Leave => leave_queue().await,
    }
}

async fn check_readiness(params: LocationParams) {
    let client = signed_in_client().await;
    match client.matching().check_readiness(Location::new(params.lat, params.lng)).await {
        Ok(readiness) => println!("{}", render(format_readiness(&readiness))),
        Err(e) => eprintln!("Error checking club readiness: {e}"),
    }
}

async fn join_queue(params: JoinParams) {
    let client = signed_in_client().await;
    let timeout = params.timeout.clamp(2, 10);
    if timeout != params.timeout {
        println!("Timeout adjusted to {timeout} minutes");
    }
    let cart = match client.cart().load().await {
        Ok(cart) => cart,
        Err(e) => {
            eprintln!("Error fetching the cart: {e}");
            return;
        },
    };
    let location = Location::new(params.location.lat, params.location.lng);
    match client.matching().join(&cart, location, chrono::Duration::minutes(timeout)).await {
        Ok(marker) => {
            println!("🚶 In the queue as {} with {} on the line", marker.queue_id, cart.total());
            if params.no_watch {
                println!("Watch for the outcome any time with `buddytools club watch`");
            } else {
                watch_recorded_queue(&client).await;
            }
        },
        Err(e) => eprintln!("Error joining the buddy queue: {e}"),
    }
}

async fn watch_queue() {
    let client = signed_in_client().await;
    watch_recorded_queue(&client).await;
}

/// Follows the recorded queue entry with a live countdown until it resolves one way or the other.
async fn watch_recorded_queue(client: &BuddyCartClient) {
    let pb = new_spinner("Waiting for buddies...");
    let outcome = Arc::new(Mutex::new(None::<MatchEvent>));
    let nearby = Arc::new(Mutex::new(None::<u32>));
    let handler: Handler<MatchEvent> = {
        let pb = pb.clone();
        let outcome = Arc::clone(&outcome);
        let nearby = Arc::clone(&nearby);
        Arc::new(move |event| {
            let pb = pb.clone();
            let outcome = Arc::clone(&outcome);
            let nearby = Arc::clone(&nearby);
            Box::pin(async move {
                match event {
                    MatchEvent::Tick { remaining_secs } => {
                        let left = format_countdown(remaining_secs);
                        let msg = match *nearby.lock().await {
                            Some(count) => format!("Waiting for buddies... {left} left, ~{count} nearby"),
                            None => format!("Waiting for buddies... {left} left"),
                        };
                        pb.set_message(msg);
                    },
                    MatchEvent::Waiting { nearby_users } => *nearby.lock().await = nearby_users,
                    event => *outcome.lock().await = Some(event),
                }
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        })
    };
    let mut sub = match client.matching().subscribe(handler) {
        Ok(sub) => sub,
        Err(e) => {
            pb.finish_and_clear();
            eprintln!("Error watching the queue: {e}");
            return;
        },
    };
    sub.wait().await;
    pb.finish_and_clear();
    let outcome = outcome.lock().await.take();
    match outcome {
        Some(MatchEvent::Matched { clubbed_order_id, discount_given }) => {
            println!("🎉 Matched! Clubbed order {clubbed_order_id} with a {discount_given} discount.");
            println!("See the shared cart with `buddytools clubbed show`, then split the bill with `buddytools pay setup`.");
        },
        Some(MatchEvent::TimedOut) => {
            println!("⏰ No buddies this time. Check out alone with `buddytools checkout solo`.");
        },
        Some(MatchEvent::Failed { reason }) => eprintln!("The watch gave up: {reason}"),
        _ => println!("Watch cancelled"),
    }
}

async fn queue_status() {
    let client = signed_in_client().await;
    match client.matching().status().await {
        Ok((marker, report)) => {
            println!("Queue entry {}: {}", marker.queue_id, report.status);
            if let Some(count) = report.nearby_users {
                println!("~{count} shopper(s) nearby");
            }
            if report.status.is_terminal() {
                match report.clubbed_order_id {
                    Some(id) => println!("Matched into clubbed order {id}. See it with `buddytools clubbed show`."),
                    None => println!("This entry is finished. Join again with `buddytools club join`."),
                }
            } else {
                let left = format_countdown(marker.remaining_secs(Utc::now()));
                println!("{left} left in the window. Follow along with `buddytools club watch`.");
            }
        },
        Err(e) => eprintln!("Error fetching the queue status: {e}"),
    }
}

async fn leave_queue() {
    let client = signed_in_client().await;
    match client.matching().continue_alone().await {
        Ok(()) => {
            // The server-side withdrawal runs on a background task; give it a moment before the process exits.
            tokio::time::sleep(Duration::from_millis(250)).await;
            println!("🚶 Left the queue. Check out any time with `buddytools checkout solo`.");
        },
        Err(e) => eprintln!("Error leaving the queue: {e}"),
    }
}

//--------------------------------------    Clubbed order     --------------------------------------------------------

pub async fn handle_clubbed_command(command: ClubbedCommand) {
    match command {
        ClubbedCommand::Show => show_clubbed_cart().await,
        ClubbedCommand::Add { product_id, quantity } => add_to_clubbed_cart(product_id, quantity).await,
    }
}

async fn show_clubbed_cart() {
    let client = signed_in_client().await;
    let club_id = current_club(&client);
    match client.clubbed().fetch(&club_id).await {
        Ok(cart) => println!("{}", render(format_clubbed_cart(&cart))),
        Err(e) => eprintln!("Error fetching clubbed order {club_id}: {e}"),
    }
}

async fn add_to_clubbed_cart(product_id: String, quantity: u32) {
    let client = signed_in_client().await;
    let club_id = current_club(&client);
    match client.clubbed().add_item(&club_id, &product_id, quantity).await {
        Ok(cart) => {
            println!("Added {quantity} × {product_id} to the clubbed order");
            println!("{}", render(format_clubbed_cart(&cart)));
        },
        Err(e) => eprintln!("Error adding {product_id} to clubbed order {club_id}: {e}"),
    }
}

//--------------------------------------     Split payment    --------------------------------------------------------

pub async fn handle_pay_command(command: PayCommand) {
    match command {
        PayCommand::Setup => setup_settlement().await,
        PayCommand::Summary => settlement_summary().await,
        PayCommand::Status => commitment_status().await,
        PayCommand::MyOrders => my_user_orders().await,
        PayCommand::Commit(params) => commit_payment(params).await,
        PayCommand::Confirm(params) => confirm_payment(params).await,
        PayCommand::Cancel { reason } => cancel_user_order(reason).await,
        PayCommand::Watch => watch_settlement().await,
    }
}

async fn setup_settlement() {
    let client = signed_in_client().await;
    let club_id = current_club(&client);
    match client.settlement().ensure_user_orders(&club_id).await {
        Ok(created) => {
            let json = serde_json::to_string_pretty(&created)
                .unwrap_or_else(|e| format!("Could not represent the acknowledgement as JSON. {e}"));
            println!("💳 {}\n{json}", created.message);
            println!("See your split with `buddytools pay summary`, then lock it in with `buddytools pay commit`.");
        },
        Err(e) => eprintln!("Error creating the user orders for {club_id}: {e}"),
    }
}

async fn settlement_summary() {
    let client = signed_in_client().await;
    let club_id = current_club(&client);
    match client.settlement().overview(&club_id).await {
        Ok(overview) => println!("{}", render(format_summary(&overview.summary))),
        Err(e) => eprintln!("Error fetching the settlement summary for {club_id}: {e}"),
    }
}

async fn commitment_status() {
    let client = signed_in_client().await;
    let club_id = current_club(&client);
    match client.settlement().overview(&club_id).await {
        Ok(overview) => println!("{}", render(format_commitments(&overview.commitments))),
        Err(e) => eprintln!("Error fetching the commitment status for {club_id}: {e}"),
    }
}

async fn my_user_orders() {
    let client = signed_in_client().await;
    match client.settlement().my_user_orders().await {
        Ok(orders) => println!("{}", format_user_orders(&orders)),
        Err(e) => eprintln!("Error fetching your user orders: {e}"),
    }
}

async fn commit_payment(params: CommitParams) {
    let client = signed_in_client().await;
    let club_id = current_club(&client);
    let settlement = client.settlement();
    let order = match settlement.my_user_order(&club_id).await {
        Ok(order) => order,
        Err(e) => {
            eprintln!("Error finding your user order for {club_id}: {e}");
            return;
        },
    };
    let commitment = PaymentCommitment {
        user_order_id: order.id,
        payment_method: params.method,
        delivery_address: params.address,
        delivery_phone: params.phone,
        special_instructions: params.instructions,
    };
    match settlement.commit(commitment).await {
        Ok(ack) => {
            println!("💳 {}", ack.message);
            if ack.all_users_committed {
                println!("✅ Everyone has committed.");
            }
            println!("Next: {}", ack.next_step);
        },
        Err(e) => eprintln!("Error committing your payment: {e}"),
    }
}

async fn confirm_payment(params: ConfirmParams) {
    let client = signed_in_client().await;
    let club_id = current_club(&client);
    let settlement = client.settlement();
    let order = match settlement.my_user_order(&club_id).await {
        Ok(order) => order,
        Err(e) => {
            eprintln!("Error finding your user order for {club_id}: {e}");
            return;
        },
    };
    let confirmation = PaymentConfirmation {
        user_order_id: order.id,
        external_transaction_id: params.txid,
        payment_gateway: params.gateway,
    };
    match settlement.confirm(confirmation).await {
        Ok(ack) => {
            println!("💰 {}", ack.message);
            if ack.all_payments_confirmed {
                println!("🎉 All payments are in.");
            }
            println!("Next: {}", ack.next_step);
        },
        Err(e) => eprintln!("Error confirming your payment: {e}"),
    }
}

async fn cancel_user_order(reason: CancellationReason) {
    let client = signed_in_client().await;
    let club_id = current_club(&client);
    let settlement = client.settlement();
    let order = match settlement.my_user_order(&club_id).await {
        Ok(order) => order,
        Err(e) => {
            eprintln!("Error finding your user order for {club_id}: {e}");
            return;
        },
    };
    match settlement.cancel(order.id, reason).await {
        Ok(notice) => {
            println!("🚫 Cancelled your share of clubbed order {}", notice.clubbed_order_id);
            if !notice.cancellation_fee.is_zero() {
                println!("Cancellation fee: {}", notice.cancellation_fee);
            }
            if !notice.compensation_amount.is_zero() {
                println!("Compensation to your buddies: {}", notice.compensation_amount);
            }
        },
        Err(e) => eprintln!("Error cancelling your share: {e}"),
    }
}

/// Prints each fresh commitment report until the order confirms. The only terminal event is the confirmation,
/// so a Ctrl-C is the way out of a round that has stalled.
async fn watch_settlement() {
    let client = signed_in_client().await;
    let club_id = current_club(&client);
    let last = Arc::new(Mutex::new(None));
    let handler: Handler<SettlementEvent> = {
        let last = Arc::clone(&last);
        Arc::new(move |event| {
            let last = Arc::clone(&last);
            Box::pin(async move {
                match event {
                    SettlementEvent::StatusUpdate(report) => {
                        let mut last = last.lock().await;
                        if last.as_ref() != Some(&report) {
                            println!("{}", render(format_commitments(&report)));
                            *last = Some(report);
                        }
                    },
                    SettlementEvent::AllCommitted => println!("✅ Everyone has committed."),
                    SettlementEvent::OrderConfirmed(report) => {
                        println!("{}", render(format_commitments(&report)));
                        println!("🎉 All payments are in. The clubbed order is confirmed!");
                    },
                }
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        })
    };
    println!("Watching the commitment round for {club_id}. Ctrl-C to stop.");
    let mut sub = client.settlement().subscribe(club_id, handler);
    sub.wait().await;
    println!("Place your share with `buddytools checkout clubbed`");
}

//--------------------------------------       Checkout       --------------------------------------------------------

pub async fn handle_checkout_command(command: CheckoutCommand) {
    match command {
        CheckoutCommand::Solo(params) => checkout_solo(params).await,
        CheckoutCommand::Clubbed(params) => checkout_clubbed(params).await,
    }
}

async fn checkout_solo(params: DeliveryParams) {
    async fn run(client: &BuddyCartClient, delivery: DeliveryDetails) -> Result<OrderConfirmation> {
        let cart = client.cart().load().await?;
        let confirmation = client.checkout().place_solo_order(&cart, &delivery).await?;
        Ok(confirmation)
    }
    let client = signed_in_client().await;
    match run(&client, delivery_details(params)).await {
        Ok(confirmation) => print_receipt(&confirmation),
        Err(e) => eprintln!("Error placing the order: {e}"),
    }
}

async fn checkout_clubbed(params: DeliveryParams) {
    async fn run(client: &BuddyCartClient, club_id: &ClubbedOrderId, delivery: DeliveryDetails) -> Result<OrderConfirmation> {
        let overview = client.settlement().overview(club_id).await?;
        let buddies = client.clubbed().fetch(club_id).await?.buddy_count();
        let confirmation = client.checkout().place_clubbed_order(&overview.summary, &delivery, buddies).await?;
        Ok(confirmation)
    }
    let client = signed_in_client().await;
    let club_id = current_club(&client);
    match run(&client, &club_id, delivery_details(params)).await {
        Ok(confirmation) => print_receipt(&confirmation),
        Err(e) => eprintln!("Error placing your share of clubbed order {club_id}: {e}"),
    }
}

fn delivery_details(params: DeliveryParams) -> DeliveryDetails {
    DeliveryDetails { address: params.address, phone: params.phone, special_instructions: params.instructions }
}

fn print_receipt(confirmation: &OrderConfirmation) {
    println!("{}", render(format_confirmation(confirmation)));
    println!("Tracking:");
    println!("{}", render(format_timeline(&tracking_timeline(confirmation))));
}
