mod helpers;
mod mocks;

mod cart_flows;
mod checkout_flows;
mod matching_flows;
mod session_flows;
