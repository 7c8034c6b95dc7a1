use chrono::{NaiveDate, NaiveTime, Timelike};

/// Badge class for an appointment or slot status string.
pub fn status_class(status: &str) -> &'static str {
    match status {
        "booked" => "status-booked",
        "completed" => "status-completed",
        "cancelled" => "status-cancelled",
        "available" => "status-available",
        _ => "status-pending",
    }
}

pub fn capitalize_status(status: &str) -> String {
    let mut chars = status.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One-hour display window starting at `time`, e.g. `9:00 AM - 10:00 AM`.
pub fn format_time_slot(time: NaiveTime) -> String {
    let start = time.hour();
    let end = start + 1;
    let minutes = time.minute();

    let start_ampm = if start >= 12 { "PM" } else { "AM" };
    let end_ampm = if (12..24).contains(&end) { "PM" } else { "AM" };

    format!(
        "{}:{:02} {} - {}:{:02} {}",
        to_12h(start),
        minutes,
        start_ampm,
        to_12h(end),
        minutes,
        end_ampm
    )
}

fn to_12h(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

/// Label shown next to an availability row, e.g. `Monday, Jun 10`.
pub fn day_label(date: NaiveDate) -> String {
    date.format("%A, %b %-d").to_string()
}

pub fn display_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn truncate_text(text: Option<&str>, length: usize) -> String {
    match text {
        None | Some("") => "N/A".to_string(),
        Some(t) if t.chars().count() > length => {
            let cut: String = t.chars().take(length).collect();
            format!("{}...", cut)
        }
        Some(t) => t.to_string(),
    }
}
