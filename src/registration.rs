//! Guided profile registration.
//!
//! Every chat in the middle of registration owns one [`Conversation`] that
//! walks a fixed sequence of steps, one plain-text message per step. Nothing
//! is persisted until the last step is accepted; the finished [`Draft`] is
//! handed back to the caller and the conversation is dropped.

use crate::{entity::profile, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  Name,
  Age,
  Height,
  Weight,
  Inventory,
  Photo,
  Rank,
  Team,
  Race,
  Completed,
}

impl Step {
  pub const FIRST: Step = Step::Name;

  pub fn next(self) -> Step {
    match self {
      Step::Name => Step::Age,
      Step::Age => Step::Height,
      Step::Height => Step::Weight,
      Step::Weight => Step::Inventory,
      Step::Inventory => Step::Photo,
      Step::Photo => Step::Rank,
      Step::Rank => Step::Team,
      Step::Team => Step::Race,
      Step::Race | Step::Completed => Step::Completed,
    }
  }

  pub fn prompt(self) -> &'static str {
    match self {
      Step::Name => "Enter your character's name:",
      Step::Age => "Enter your age (whole number):",
      Step::Height => "Enter your height (e.g. 175.5):",
      Step::Weight => "Enter your weight (e.g. 70.2):",
      Step::Inventory => "Describe your inventory:",
      Step::Photo => "Send a photo or enter a file_id:",
      Step::Rank => "Enter your rank:",
      Step::Team => "Enter your team:",
      Step::Race => "Enter your race:",
      Step::Completed => "Registration complete.",
    }
  }

  /// Re-prompt after input the step could not parse.
  pub fn retry(self) -> &'static str {
    match self {
      Step::Age => "Age must be a whole number. Try again:",
      Step::Height => "Height must be a number. Try again:",
      Step::Weight => "Weight must be a number. Try again:",
      other => other.prompt(),
    }
  }
}

/// Profile fields collected so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
  pub chat_id: i64,
  pub username: String,
  pub name: Option<String>,
  pub age: Option<i32>,
  pub height: Option<f64>,
  pub weight: Option<f64>,
  pub inventory: Option<String>,
  pub photo: Option<String>,
  pub rank: Option<String>,
  pub team: Option<String>,
  pub race: Option<String>,
}

impl Draft {
  /// Writes the registration fields onto a profile row. Balances are left
  /// to the caller.
  pub fn fill(&self, model: &mut profile::ActiveModel) {
    model.username = Set(self.username.clone());
    model.name = Set(self.name.clone().unwrap_or_default());
    model.age = Set(self.age.unwrap_or_default());
    model.height = Set(self.height.unwrap_or_default());
    model.weight = Set(self.weight.unwrap_or_default());
    model.inventory = Set(self.inventory.clone().unwrap_or_default());
    model.photo = Set(self.photo.clone().unwrap_or_default());
    model.rank = Set(self.rank.clone().unwrap_or_default());
    model.team = Set(self.team.clone().unwrap_or_default());
    model.race = Set(self.race.clone().unwrap_or_default());
  }
}

#[derive(Debug, Clone)]
pub struct Conversation {
  pub step: Step,
  pub draft: Draft,
  pub touched: DateTime,
}

impl Conversation {
  pub fn new(chat_id: i64, username: String) -> Self {
    Self {
      step: Step::FIRST,
      draft: Draft { chat_id, username, ..Default::default() },
      touched: Utc::now().naive_utc(),
    }
  }

  /// Consumes one message. Returns the new step, or the unchanged step when
  /// numeric input does not parse.
  pub fn accept(&mut self, input: &str) -> std::result::Result<Step, Step> {
    let draft = &mut self.draft;
    let text = || Some(input.to_string());

    match self.step {
      Step::Name => draft.name = text(),
      Step::Age => {
        draft.age = Some(profile::parse_age(input).ok_or(self.step)?)
      }
      Step::Height => {
        draft.height = Some(profile::parse_measure(input).ok_or(self.step)?)
      }
      Step::Weight => {
        draft.weight = Some(profile::parse_measure(input).ok_or(self.step)?)
      }
      Step::Inventory => draft.inventory = text(),
      Step::Photo => draft.photo = text(),
      Step::Rank => draft.rank = text(),
      Step::Team => draft.team = text(),
      Step::Race => draft.race = text(),
      Step::Completed => return Ok(Step::Completed),
    }

    self.step = self.step.next();
    Ok(self.step)
  }
}

#[derive(Debug)]
pub enum Advance {
  Next(Step),
  Retry(Step),
  Completed(Draft),
}

/// In-memory registrations keyed by chat.
#[derive(Default)]
pub struct Registrations {
  inner: DashMap<i64, Conversation>,
}

impl Registrations {
  pub fn new() -> Self {
    Self::default()
  }

  /// Starts (or restarts) registration and returns the first step.
  pub fn begin(&self, chat_id: i64, username: impl Into<String>) -> Step {
    self.inner.insert(chat_id, Conversation::new(chat_id, username.into()));
    Step::FIRST
  }

  /// `None` when the chat is not registering; such messages are dropped.
  pub fn advance(&self, chat_id: i64, input: &str) -> Option<Advance> {
    let mut conversation = self.inner.get_mut(&chat_id)?;
    conversation.touched = Utc::now().naive_utc();

    match conversation.accept(input) {
      Ok(Step::Completed) => {
        drop(conversation);
        let (_, done) = self
          .inner
          .remove_if(&chat_id, |_, c| c.step == Step::Completed)?;
        Some(Advance::Completed(done.draft))
      }
      Ok(step) => Some(Advance::Next(step)),
      Err(step) => Some(Advance::Retry(step)),
    }
  }

  pub fn step_of(&self, chat_id: i64) -> Option<Step> {
    self.inner.get(&chat_id).map(|c| c.step)
  }

  #[cfg(test)]
  pub fn draft_of(&self, chat_id: i64) -> Option<Draft> {
    self.inner.get(&chat_id).map(|c| c.draft.clone())
  }

  pub fn abandon(&self, chat_id: i64) -> bool {
    self.inner.remove(&chat_id).is_some()
  }

  pub fn gc(&self, ttl: TimeDelta) -> usize {
    self.gc_at(Utc::now().naive_utc(), ttl)
  }

  /// Drops conversations idle for `ttl` or longer, returns how many.
  pub fn gc_at(&self, now: DateTime, ttl: TimeDelta) -> usize {
    let before = self.inner.len();
    self.inner.retain(|_, c| now - c.touched < ttl);
    before - self.inner.len()
  }

  pub fn len(&self) -> usize {
    self.inner.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const INPUTS: [&str; 9] = [
    "Jack Sparrow",
    "35",
    "175.5",
    "70.2",
    "compass, rum",
    "AgACAgIAAxkBAAIB",
    "captain",
    "Black Pearl",
    "human",
  ];

  #[test]
  fn steps_are_ordered() {
    let mut step = Step::FIRST;
    let mut seen = vec![step];
    while step != Step::Completed {
      step = step.next();
      seen.push(step);
    }

    assert_eq!(seen, [
      Step::Name,
      Step::Age,
      Step::Height,
      Step::Weight,
      Step::Inventory,
      Step::Photo,
      Step::Rank,
      Step::Team,
      Step::Race,
      Step::Completed,
    ]);
  }

  #[test]
  fn nine_messages_complete_a_draft() {
    let registrations = Registrations::new();
    registrations.begin(7, "jack");

    for input in &INPUTS[..8] {
      assert!(matches!(
        registrations.advance(7, input),
        Some(Advance::Next(_))
      ));
    }

    let Some(Advance::Completed(draft)) = registrations.advance(7, INPUTS[8])
    else {
      panic!("registration did not complete");
    };

    assert_eq!(draft.chat_id, 7);
    assert_eq!(draft.username, "jack");
    assert_eq!(draft.name.as_deref(), Some("Jack Sparrow"));
    assert_eq!(draft.age, Some(35));
    assert_eq!(draft.height, Some(175.5));
    assert_eq!(draft.weight, Some(70.2));
    assert_eq!(draft.inventory.as_deref(), Some("compass, rum"));
    assert_eq!(draft.photo.as_deref(), Some("AgACAgIAAxkBAAIB"));
    assert_eq!(draft.rank.as_deref(), Some("captain"));
    assert_eq!(draft.team.as_deref(), Some("Black Pearl"));
    assert_eq!(draft.race.as_deref(), Some("human"));

    assert_eq!(registrations.step_of(7), None);
    assert_eq!(registrations.len(), 0);
  }

  #[test]
  fn invalid_numbers_keep_the_step() {
    let registrations = Registrations::new();
    registrations.begin(7, "jack");
    registrations.advance(7, "Jack");

    for bad in ["thirty", "", "-1", "3.5"] {
      assert!(matches!(
        registrations.advance(7, bad),
        Some(Advance::Retry(Step::Age))
      ));
      assert_eq!(registrations.step_of(7), Some(Step::Age));
      assert_eq!(registrations.draft_of(7).unwrap().age, None);
    }

    registrations.advance(7, "30");
    assert!(matches!(
      registrations.advance(7, "very tall"),
      Some(Advance::Retry(Step::Height))
    ));
    assert_eq!(registrations.draft_of(7).unwrap().height, None);
    assert_eq!(registrations.draft_of(7).unwrap().age, Some(30));
  }

  #[test]
  fn free_text_accepts_empty_input() {
    let registrations = Registrations::new();
    registrations.begin(7, "");

    assert!(matches!(
      registrations.advance(7, ""),
      Some(Advance::Next(Step::Age))
    ));
    assert_eq!(registrations.draft_of(7).unwrap().name.as_deref(), Some(""));
  }

  #[test]
  fn messages_without_conversation_are_dropped() {
    let registrations = Registrations::new();
    assert!(registrations.advance(7, "hello").is_none());
    assert_eq!(registrations.len(), 0);
  }

  #[test]
  fn begin_restarts_from_the_first_step() {
    let registrations = Registrations::new();
    registrations.begin(7, "jack");
    registrations.advance(7, "Jack");
    registrations.advance(7, "30");

    assert_eq!(registrations.begin(7, "jack"), Step::Name);
    assert_eq!(registrations.draft_of(7).unwrap().name, None);
  }

  #[test]
  fn idle_conversations_expire() {
    let registrations = Registrations::new();
    registrations.begin(1, "a");
    registrations.begin(2, "b");
    assert!(registrations.abandon(2));
    assert!(!registrations.abandon(2));

    let ttl = TimeDelta::minutes(30);
    let now = Utc::now().naive_utc();

    assert_eq!(registrations.gc_at(now, ttl), 0);
    assert_eq!(registrations.step_of(1), Some(Step::Name));

    assert_eq!(registrations.gc_at(now + TimeDelta::minutes(31), ttl), 1);
    assert_eq!(registrations.step_of(1), None);
  }
}
