use teloxide::utils::html::escape;

use crate::{
  entity::{event, profile},
  prelude::*,
};

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}

fn profile_body(profile: &profile::Model) -> String {
  format!(
    "Name: {}\n\
    Age: {}\n\
    Height: {:.2}\n\
    Weight: {:.2}\n\
    Inventory: {}\n\
    Rank: {}\n\
    Team: {}\n\
    Race: {}\n\
    Piastres: {}\n\
    Oblomki: {}\n\
    Events attended: {}",
    escape(&profile.name),
    profile.age,
    profile.height,
    profile.weight,
    escape(&profile.inventory),
    escape(&profile.rank),
    escape(&profile.team),
    escape(&profile.race),
    profile.piastres,
    profile.oblomki,
    profile.attendance,
  )
}

/// Profile as its owner sees it: no record id, no username.
pub fn profile_card(profile: &profile::Model) -> String {
  format!("📜 <b>Character Profile</b>\n{}", profile_body(profile))
}

pub fn owner(profile: &profile::Model) -> String {
  if profile.username.is_empty() {
    format!("<code>{}</code>", profile.chat_id)
  } else {
    format!("@{}", escape(&profile.username))
  }
}

/// Full disclosure for administrators.
pub fn admin_card(profile: &profile::Model) -> String {
  format!(
    "📜 <b>Character Profile</b> (ID: <code>{}</code>, TG: {})\n{}",
    profile.id,
    owner(profile),
    profile_body(profile)
  )
}

pub fn event_line(event: &event::Model) -> String {
  let status = if event.active { "🟢" } else { "⛔" };
  format!(
    "{status} <b>#{}</b> {} | {} {} | {}",
    event.id,
    escape(&event.name),
    event.amount,
    event.currency,
    format_date(event.created_at)
  )
}

pub fn event_announcement(event: &event::Model) -> String {
  format!(
    "📣 <b>New event:</b> \"{}\" (ID: <code>{}</code>)\n\
    Reward: {} {}\n\n\
    To take part: /attend {}\n\
    To withdraw: /unattend {}",
    escape(&event.name),
    event.id,
    event.amount,
    event.currency,
    event.id,
    event.id
  )
}

/// Maximum message length for Telegram Bot API (4096 characters).
/// We use a slightly smaller limit to account for potential HTML entity expansion.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4000;

/// Splits a long message into chunks that fit within Telegram's message limit.
/// Lines are kept whole unless a single line exceeds the limit.
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
  let max_len =
    if max_len == 0 { TELEGRAM_MAX_MESSAGE_LENGTH } else { max_len };

  if text.len() <= max_len {
    return vec![text.to_string()];
  }

  let mut chunks = Vec::new();
  let mut current = String::new();

  for line in text.lines() {
    if !current.is_empty() && current.len() + line.len() + 1 > max_len {
      chunks.push(std::mem::take(&mut current));
    }

    if line.len() > max_len {
      if !current.is_empty() {
        chunks.push(std::mem::take(&mut current));
      }
      let mut remaining = line;
      while remaining.len() > max_len {
        let mut cut = max_len;
        while !remaining.is_char_boundary(cut) {
          cut -= 1;
        }
        chunks.push(remaining[..cut].to_string());
        remaining = &remaining[cut..];
      }
      current = remaining.to_string();
    } else {
      if !current.is_empty() {
        current.push('\n');
      }
      current.push_str(line);
    }
  }

  if !current.is_empty() {
    chunks.push(current);
  }

  chunks
}
