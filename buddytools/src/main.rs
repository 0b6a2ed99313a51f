use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod command_def;
mod command_handler;
mod formatting;

use command_def::{AuthCommand, CartCommand, CheckoutCommand, ClubCommand, ClubbedCommand, PayCommand};
use command_handler::{
    handle_auth_command,
    handle_cart_command,
    handle_checkout_command,
    handle_club_command,
    handle_clubbed_command,
    handle_pay_command,
    list_products,
};

#[derive(Parser, Debug)]
#[command(version, about = "BuddyCart from the command line. The server is taken from BCART_SERVER (or a .env file).")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(subcommand)]
    /// Create an account, sign in, sign out
    Auth(AuthCommand),
    /// List the product catalog
    Products,
    #[command(subcommand)]
    /// Show and edit your cart
    Cart(CartCommand),
    #[command(subcommand)]
    /// Club your order with nearby shoppers to split the delivery fee
    Club(ClubCommand),
    #[command(subcommand)]
    /// The shared cart of a matched clubbed order
    Clubbed(ClubbedCommand),
    #[command(subcommand)]
    /// Split payment: commit, confirm or cancel your share
    Pay(PayCommand),
    #[command(subcommand)]
    /// Place the final order, solo or clubbed
    Checkout(CheckoutCommand),
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    match cli.command {
        Command::Auth(command) => handle_auth_command(command).await,
        Command::Products => list_products().await,
        Command::Cart(command) => handle_cart_command(command).await,
        Command::Club(command) => handle_club_command(command).await,
        Command::Clubbed(command) => handle_clubbed_command(command).await,
        Command::Pay(command) => handle_pay_command(command).await,
        Command::Checkout(command) => handle_checkout_command(command).await,
    }
}
