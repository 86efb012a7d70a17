use std::sync::Arc;

use teloxide::{
  prelude::*,
  utils::{command::BotCommands, html::escape},
};

use super::ReplyBot;
use crate::{
  entity::{Currency, profile},
  prelude::*,
  state::{AppState, Services},
  sv::profile::Edit,
};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  Auth(String),
  Help,
  AllProfiles,
  ViewProfile(String),
  EditProfile(String),
  DeleteProfileById(String),
  AddCurrency(String),
  /// `<name>|<currency>|<amount>`
  CreateEvent(String),
  Events,
  CloseEvent(String),
  OpenEvent(String),
  /// Leaderboard, piastres unless a currency is given
  Ranking(String),
  Participants(String),
}

const ADMIN_HELP: &str = "\
<b>📋 Admin Commands</b>

/auth &lt;password&gt; - Unlock admin commands

<b>Profiles:</b>
/allprofiles - List all profiles
/viewprofile &lt;id&gt; - Show a profile
/editprofile &lt;id&gt; &lt;field&gt; &lt;value&gt; - Rewrite one field
/deleteprofilebyid &lt;id&gt; - Delete a profile
/addcurrency &lt;id&gt; &lt;piastres|oblomki&gt; &lt;amount&gt; - Adjust a balance

<b>Events:</b>
/createevent &lt;name&gt;|&lt;currency&gt;|&lt;amount&gt; - Create and announce
/events - List events
/closeevent &lt;id&gt; - Stop accepting participants
/openevent &lt;id&gt; - Reopen a closed event
/participants &lt;id&gt; - Who took part
/ranking [currency] - Leaderboard

/help - Show this message";

fn parse_id(input: &str, usage: &str) -> Result<i32> {
  input.trim().parse().map_err(|_| Error::InvalidArgs(usage.into()))
}

fn profile_line(i: usize, profile: &profile::Model) -> String {
  format!(
    "<b>{}.</b> #{} {} ({})",
    i + 1,
    profile.id,
    escape(&profile.name),
    utils::owner(profile)
  )
}

async fn edit_profile(sv: &Services<'_>, args: &str) -> Result<String> {
  const USAGE: &str = "Usage: /editprofile <id> <field> <value>";

  let mut parts = args.trim().splitn(3, char::is_whitespace);
  let (Some(id), Some(field), Some(value)) =
    (parts.next(), parts.next(), parts.next())
  else {
    return Err(Error::InvalidArgs(USAGE.into()));
  };

  let id = parse_id(id, USAGE)?;
  let edit = Edit::parse(field, value.trim())?;
  let field = edit.field().name();
  let profile = sv.profile.edit(id, edit).await?;

  info!("Profile #{id}: `{field}` edited");
  Ok(format!(
    "✅ Field <b>{field}</b> updated.\n\n{}",
    utils::admin_card(&profile)
  ))
}

async fn add_currency(sv: &Services<'_>, args: &str) -> Result<String> {
  const USAGE: &str = "Usage: /addcurrency <id> <piastres|oblomki> <amount>";

  let [id, currency, amount] = args.split_whitespace().collect::<Vec<_>>()[..]
  else {
    return Err(Error::InvalidArgs(USAGE.into()));
  };

  let id = parse_id(id, USAGE)?;
  let currency: Currency = currency.parse()?;
  let amount: i64 =
    amount.parse().map_err(|_| Error::InvalidArgs(USAGE.into()))?;

  let profile = sv.profile.adjust(id, currency, amount).await?;
  info!("Profile #{id}: {currency} shifted by {amount}");

  Ok(format!(
    "✅ {} balance of #{}: <b>{}</b>",
    currency,
    profile.id,
    profile.balance(currency)
  ))
}

async fn create_event(app: &AppState, args: &str) -> Result<String> {
  const USAGE: &str = "Usage: /createevent <name>|<currency>|<amount>";

  let [name, currency, amount] = args.split('|').collect::<Vec<_>>()[..] else {
    return Err(Error::InvalidArgs(USAGE.into()));
  };
  let amount: i64 =
    amount.trim().parse().map_err(|_| Error::InvalidArgs(USAGE.into()))?;

  let (event, delivery) = app.create_event(name, currency, amount).await?;
  Ok(format!(
    "✅ Event created.\n\n{}\n\nAnnounced to {} players ({} failed).",
    utils::event_line(&event),
    delivery.sent,
    delivery.failed
  ))
}

async fn ranking(sv: &Services<'_>, args: &str) -> Result<String> {
  let currency = match args.trim() {
    "" => Currency::Piastres,
    raw => raw.parse()?,
  };

  let profiles = sv.profile.ranking(currency).await?;
  if profiles.is_empty() {
    return Ok("📭 No profiles yet.".into());
  }

  let mut text = format!("🏆 <b>Ranking by {currency}</b>\n\n");
  for (i, profile) in profiles.iter().enumerate() {
    text.push_str(&format!(
      "{}: <b>{}</b>\n",
      profile_line(i, profile),
      profile.balance(currency)
    ));
  }
  Ok(text)
}

async fn participants(sv: &Services<'_>, args: &str) -> Result<String> {
  let id = parse_id(args, "Usage: /participants <event_id>")?;
  let event = sv.event.by_id(id).await?.ok_or(Error::EventNotFound)?;
  let profiles = sv.event.participants(id).await?;

  let mut text = format!(
    "{}\n\n👥 <b>Participants ({})</b>\n",
    utils::event_line(&event),
    profiles.len()
  );
  for (i, profile) in profiles.iter().enumerate() {
    text.push_str(&profile_line(i, profile));
    text.push('\n');
  }
  Ok(text)
}

/// What the bot sends back for one admin command.
pub enum Reply {
  Text(String),
  Card { photo: String, caption: String },
}

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  cmd: Command,
) -> ResponseResult<()> {
  match dispatch(&app, bot.chat_id.0, cmd).await {
    Ok(Reply::Text(text)) => bot.reply_html_chunked(text).await,
    Ok(Reply::Card { photo, caption }) => {
      bot.reply_card(&photo, &caption).await;
      Ok(())
    }
    Err(err) => bot.reply_error(&err).await,
  }
}

/// Runs a command for `chat_id`. Everything but `/auth` and `/help` is
/// refused until the chat passes the gate.
pub async fn dispatch(
  app: &AppState,
  chat_id: i64,
  cmd: Command,
) -> Result<Reply> {
  match &cmd {
    Command::Auth(secret) => {
      let text = if app.gate.authenticate(chat_id, secret) {
        "✅ Authenticated. Send /help for the command list."
      } else {
        "❌ Wrong password."
      };
      return Ok(Reply::Text(text.into()));
    }
    Command::Help => return Ok(Reply::Text(ADMIN_HELP.into())),
    _ => {}
  }

  app.gate.require(chat_id)?;
  let sv = app.sv();

  let text = match cmd {
    Command::Auth(_) | Command::Help => ADMIN_HELP.into(),

    Command::AllProfiles => {
      let profiles = sv.profile.all().await?;
      if profiles.is_empty() {
        return Ok(Reply::Text("📭 No profiles yet.".into()));
      }

      let mut text =
        format!("👥 <b>Profiles (Total: {})</b>\n\n", profiles.len());
      for (i, profile) in profiles.iter().enumerate() {
        text.push_str(&profile_line(i, profile));
        text.push('\n');
      }
      text
    }

    Command::ViewProfile(args) => {
      let id = parse_id(&args, "Usage: /viewprofile <id>")?;
      let profile = sv.profile.by_id(id).await?.ok_or(Error::ProfileNotFound)?;
      return Ok(Reply::Card {
        caption: utils::admin_card(&profile),
        photo: profile.photo,
      });
    }

    Command::EditProfile(args) => edit_profile(&sv, &args).await?,

    Command::DeleteProfileById(args) => {
      let id = parse_id(&args, "Usage: /deleteprofilebyid <id>")?;
      sv.profile.delete_by_id(id).await?;
      info!("Profile #{id} deleted by admin {chat_id}");
      format!("🗑 Profile #{id} deleted.")
    }

    Command::AddCurrency(args) => add_currency(&sv, &args).await?,
    Command::CreateEvent(args) => create_event(app, &args).await?,

    Command::Events => {
      let events = sv.event.all().await?;
      if events.is_empty() {
        return Ok(Reply::Text("📭 No events yet.".into()));
      }
      let lines: Vec<_> = events.iter().map(utils::event_line).collect();
      format!("<b>Events:</b>\n\n{}", lines.join("\n"))
    }

    Command::CloseEvent(args) => {
      let id = parse_id(&args, "Usage: /closeevent <id>")?;
      let event = sv.event.set_active(id, false).await?;
      format!("⛔ Event closed.\n\n{}", utils::event_line(&event))
    }

    Command::OpenEvent(args) => {
      let id = parse_id(&args, "Usage: /openevent <id>")?;
      let event = sv.event.set_active(id, true).await?;
      format!("🟢 Event reopened.\n\n{}", utils::event_line(&event))
    }

    Command::Ranking(args) => ranking(&sv, &args).await?,
    Command::Participants(args) => participants(&sv, &args).await?,
  };

  Ok(Reply::Text(text))
}
