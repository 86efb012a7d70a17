use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

use super::ReplyBot;
use crate::{
  prelude::*,
  registration::Step,
  state::{AppState, Progress},
  sv::ledger::Receipt,
};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  Start,
  CreateProfile,
  Profile,
  DeleteProfile,
  /// Abandon an unfinished registration
  Cancel,
  Help,
  Attend(String),
  Unattend(String),
}

const USER_HELP: &str = "\
<b>📋 Commands</b>

/createprofile - Create your character
/profile - Show your character
/deleteprofile - Delete your character
/cancel - Stop an unfinished registration
/attend &lt;event_id&gt; - Take part in an event
/unattend &lt;event_id&gt; - Withdraw from an event
/help - Show this message";

fn parse_event_id(input: &str, usage: &str) -> Result<i32> {
  input.trim().parse().map_err(|_| Error::InvalidArgs(usage.into()))
}

fn receipt_text(verb: &str, receipt: &Receipt) -> String {
  let Receipt { event, profile } = receipt;
  format!(
    "{verb} \"{}\"\n{} balance: <b>{}</b>",
    teloxide::utils::html::escape(&event.name),
    event.currency,
    profile.balance(event.currency)
  )
}

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  username: String,
  cmd: Command,
) -> ResponseResult<()> {
  let chat_id = bot.chat_id.0;
  let sv = app.sv();

  let result: Result<String> = match cmd {
    Command::Start => Ok(format!(
      "<b>⚔️ Welcome to the character registry!</b>\n\n{USER_HELP}"
    )),
    Command::Help => Ok(USER_HELP.into()),

    Command::CreateProfile => app
      .begin_registration(chat_id, &username)
      .await
      .map(|step| format!("📝 Registration started.\n\n{}", step.prompt())),

    Command::Profile => match sv.profile.by_chat(chat_id).await {
      Ok(Some(profile)) if profile.is_registered() => {
        bot.reply_card(&profile.photo, &utils::profile_card(&profile)).await;
        return Ok(());
      }
      Ok(_) => Err(Error::ProfileNotFound),
      Err(err) => Err(err),
    },

    Command::DeleteProfile => {
      app.registrations.abandon(chat_id);
      sv.profile
        .delete_by_chat(chat_id)
        .await
        .map(|_| "🗑 Your profile has been deleted.".into())
    }

    Command::Cancel => Ok(if app.registrations.abandon(chat_id) {
      "Registration cancelled.".into()
    } else {
      "Nothing to cancel.".into()
    }),

    Command::Attend(input) => {
      async {
        let id = parse_event_id(&input, "Usage: /attend <event_id>")?;
        let receipt = sv.ledger.claim(id, chat_id).await?;
        Ok(receipt_text("✅ You joined", &receipt))
      }
      .await
    }

    Command::Unattend(input) => {
      async {
        let id = parse_event_id(&input, "Usage: /unattend <event_id>")?;
        let receipt = sv.ledger.unclaim(id, chat_id).await?;
        Ok(receipt_text("↩️ You withdrew from", &receipt))
      }
      .await
    }
  };

  match result {
    Ok(text) => bot.reply_html(text).await,
    Err(err) => bot.reply_error(&err).await,
  }
}

/// Plain messages: consumed only while the chat is registering. At the photo
/// step an attached photo is taken by its file id.
pub async fn converse(
  app: Arc<AppState>,
  bot: ReplyBot,
  msg: Message,
) -> ResponseResult<()> {
  let chat_id = bot.chat_id.0;
  let Some(step) = app.registrations.step_of(chat_id) else {
    return Ok(());
  };

  let input = match (step, msg.photo(), msg.text()) {
    (Step::Photo, Some(sizes), _) => {
      sizes.last().map(|size| size.file.id.0.clone())
    }
    (_, _, Some(text)) => Some(text.to_string()),
    _ => None,
  };

  let Some(input) = input else {
    return bot.reply_html(step.prompt()).await;
  };

  match app.advance_registration(chat_id, &input).await {
    Ok(Some(Progress::Next(step))) => bot.reply_html(step.prompt()).await,
    Ok(Some(Progress::Retry(step))) => bot.reply_html(step.retry()).await,
    // the user was already sent the card
    Ok(Some(Progress::Completed(_)) | None) => Ok(()),
    Err(err) => bot.reply_error(&err).await,
  }
}
