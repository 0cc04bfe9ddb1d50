//! Plain-text rendering for the terminal.

use chrono::{DateTime, Utc};
use donor_core::{BloodDonationRequest, BloodTransfusionCenter, Pledge, Subscription, Urgency, User};

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn format_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn urgency_label(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Critical => "CRITICAL",
        Urgency::High => "high",
        Urgency::Normal => "normal",
        Urgency::Closed => "closed",
    }
}

pub fn user(user: &User) {
    let profile = &user.profile;
    println!("{} <{}>", user.name, user.email);
    println!("  id:          {}", user.id);
    println!(
        "  blood type:  {}",
        profile.blood_type.map(|b| b.label()).unwrap_or("-")
    );
    println!("  wilaya:      {}", or_dash(profile.wilaya.as_deref()));
    println!(
        "  commune:     {}",
        or_dash(profile.commune.as_ref().and_then(|c| c.name.as_deref()))
    );
    println!("  phone:       {}", or_dash(profile.donor_tel.as_deref()));
    if let Some(date) = profile.donor_last_donation_date {
        println!("  last donated {}", date);
    }
}

pub fn request(request: &BloodDonationRequest, now: DateTime<Utc>) {
    println!(
        "[{}] {:<8} {:<3} {}",
        request.id,
        urgency_label(request.urgency(now)),
        request.blood_type.map(|b| b.label()).unwrap_or("?"),
        or_dash(request.hospital_name.as_deref()),
    );
    if let Some(location) = request.location_label() {
        println!("    {}", location);
    }
    if let Some(due) = request.due_date {
        println!("    due {}", due.format("%Y-%m-%d %H:%M"));
    }
    if let Some(quantity) = request.quantity {
        println!("    {} unit(s) needed", quantity);
    }
}

pub fn pledge(pledge: &Pledge) {
    println!(
        "[{}] {:<9} request {} {}",
        pledge.id,
        pledge.status(),
        pledge.request_id,
        or_dash(pledge.hospital_name.as_deref()),
    );
    println!(
        "    pledged {}  appointment {}",
        format_time(pledge.pledge_date),
        format_time(pledge.appointment_date)
    );
    if let Some(reason) = &pledge.cancellation_reason {
        println!("    cancelled: {}", reason);
    }
}

pub fn center(center: &BloodTransfusionCenter) {
    println!("[{}] {}", center.id, center.name);
    if let Some(address) = &center.address {
        println!("    {}", address);
    }
    if let Some(phone) = &center.phone {
        println!("    {}", phone);
    }
}

pub fn subscription(subscription: &Subscription) {
    println!(
        "[{}] {} since {}",
        subscription.btc_id,
        or_dash(subscription.center_name.as_deref()),
        format_time(subscription.subscribed_at)
    );
}
