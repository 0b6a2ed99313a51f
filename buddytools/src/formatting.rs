use std::fmt::Write;

use anyhow::Result;
use buddycart_client::{
    checkout::{OrderConfirmation, TrackingStage},
    data_objects::{Cart, ClubReadiness, ClubbedCart, CommitmentReport, Product, SettlementSummary, UserOrder},
};
use chrono::Utc;
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

/// Seconds as `m:ss`, for countdown displays.
pub fn format_countdown(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn format_products(products: &[Product]) -> String {
    if products.is_empty() {
        return "The catalog is empty".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Product", "Price", "Weight", "Stock"]);
    products.iter().for_each(|product| {
        table.add_row(row![
            product.id,
            product.name,
            format!("{:>10}", product.price.to_string()),
            product.weight_grams,
            product.stock
        ]);
    });
    markdown_style(&mut table);
    table.to_string()
}

pub fn format_cart(cart: &Cart) -> Result<String> {
    let mut f = String::new();
    if cart.is_empty() {
        writeln!(f, "Your cart is empty")?;
        return Ok(f);
    }
    let mut table = Table::new();
    table.set_titles(row!["Line id", "Product", "Qty", "Unit price", "Line total"]);
    cart.cart_items.iter().for_each(|line| {
        table.add_row(row![
            line.id,
            line.product.name,
            line.quantity,
            format!("{:>10}", line.product.price.to_string()),
            format!("{:>10}", line.total_price.to_string())
        ]);
    });
    markdown_style(&mut table);
    writeln!(f, "{table}")?;
    writeln!(f, "{count} item(s), {weight}. Total {total}", count = cart.item_count(), weight = cart.weight(), total = cart.total())?;
    Ok(f)
}

pub fn format_readiness(readiness: &ClubReadiness) -> Result<String> {
    let mut f = String::new();
    if readiness.can_club {
        writeln!(f, "🤝 Clubbing looks good here")?;
    } else {
        writeln!(f, "Clubbing is quiet here right now")?;
    }
    writeln!(f, "Shoppers nearby:    {}", readiness.nearby_users_count)?;
    writeln!(f, "Potential discount: {}", readiness.potential_discount)?;
    writeln!(f, "Estimated wait:     {}", format_countdown(readiness.estimated_wait_time))?;
    Ok(f)
}

pub fn format_clubbed_cart(cart: &ClubbedCart) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "Clubbed order {id}  [{status}]", id = cart.clubbed_order_id, status = cart.status)?;
    let mut buddies = Table::new();
    buddies.set_titles(row!["Participant", "Items", "Cart total", ""]);
    cart.users.iter().for_each(|user| {
        let marker = if user.is_current_user { "← you" } else { "" };
        buddies.add_row(row![user.user_id, user.item_count, format!("{:>10}", user.cart_total.to_string()), marker]);
    });
    markdown_style(&mut buddies);
    writeln!(f, "{buddies}")?;
    if cart.items.is_empty() {
        writeln!(f, "You have no items in this order yet")?;
    } else {
        let mut items = Table::new();
        items.set_titles(row!["Your items", "Qty", "Price"]);
        cart.items.iter().for_each(|item| {
            items.add_row(row![item.product_name, item.quantity, format!("{:>10}", item.price.to_string())]);
        });
        markdown_style(&mut items);
        writeln!(f, "{items}")?;
    }
    writeln!(f, "Buddies' share (totals only): {}", cart.other_users_total)?;
    writeln!(f, "Combined order value:         {}", cart.total_amount)?;
    Ok(f)
}

pub fn format_user_orders(orders: &[UserOrder]) -> String {
    if orders.is_empty() {
        return "You have no user orders".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Clubbed order", "Your portion", "Method", "Status", "Committed", "Deadline"]);
    orders.iter().for_each(|order| {
        table.add_row(row![
            order.id,
            order.clubbed_order_id,
            format!("{:>10}", order.individual_total.to_string()),
            order.payment_method,
            order.payment_status,
            if order.is_committed { "yes" } else { "no" },
            order.commitment_deadline.format("%Y-%m-%d %H:%M UTC")
        ]);
    });
    markdown_style(&mut table);
    table.to_string()
}

pub fn format_summary(summary: &SettlementSummary) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "Split for clubbed order {}", summary.clubbed_order_id)?;
    writeln!(f, "-----------------------------------------------")?;
    writeln!(f, "Combined order value:  {:>10}", summary.total_order_value.to_string())?;
    writeln!(f, "Your portion:          {:>10}", summary.your_portion.to_string())?;
    writeln!(f, "Buddies' portion:      {:>10}", summary.other_users_portion.to_string())?;
    writeln!(f, "Delivery fee (shared): {:>10}", summary.delivery_fee.to_string())?;
    writeln!(f, "Clubbing discount:     {:>10}", summary.discount_applied.to_string())?;
    writeln!(f, "-----------------------------------------------")?;
    writeln!(f, "You pay:               {:>10}", summary.final_amount_to_pay.to_string())?;
    let remaining = summary.time_remaining(Utc::now());
    writeln!(
        f,
        "Payments: {confirmed} confirmed, {pending} pending. {left} until the deadline",
        confirmed = summary.confirmed_payments,
        pending = summary.pending_payments,
        left = format_countdown(remaining.num_seconds())
    )?;
    Ok(f)
}

pub fn format_commitments(report: &CommitmentReport) -> Result<String> {
    let mut f = String::new();
    let total = report.committed_users.len() + report.pending_users.len();
    writeln!(f, "Commitments for clubbed order {}: {}/{total}", report.clubbed_order_id, report.committed_users.len())?;
    for user in &report.committed_users {
        writeln!(f, "  ✅ {user}")?;
    }
    for user in &report.pending_users {
        writeln!(f, "  ⏳ {user}")?;
    }
    if report.order_confirmed {
        writeln!(f, "The order is confirmed and on its way to the store")?;
    } else if report.all_committed {
        writeln!(f, "Everyone has committed. Waiting for payment confirmations")?;
    } else {
        let remaining = report.time_remaining(Utc::now());
        writeln!(f, "{} left to commit", format_countdown(remaining.num_seconds()))?;
    }
    Ok(f)
}

pub fn format_confirmation(confirmation: &OrderConfirmation) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "===============================================")?;
    writeln!(f, "🧾 {}", confirmation.order_ref)?;
    writeln!(f, "===============================================")?;
    writeln!(f, "Subtotal:     {:>10}", confirmation.subtotal.to_string())?;
    writeln!(f, "Delivery fee: {:>10}", confirmation.delivery_fee.to_string())?;
    if !confirmation.savings.is_zero() {
        writeln!(f, "You saved:    {:>10}", confirmation.savings.to_string())?;
    }
    writeln!(f, "Total:        {:>10}", confirmation.total.to_string())?;
    if confirmation.clubbed {
        writeln!(f, "Clubbed with {} shopper(s)", confirmation.buddy_count.saturating_sub(1))?;
    }
    writeln!(f, "Estimated delivery in {}", confirmation.estimated_delivery)?;
    Ok(f)
}

pub fn format_timeline(stages: &[TrackingStage]) -> Result<String> {
    let mut f = String::new();
    for stage in stages {
        let check = if stage.completed { "✔" } else { " " };
        writeln!(f, " [{check}] {:<18} {}", stage.label, stage.at.format("%H:%M UTC"))?;
    }
    Ok(f)
}
