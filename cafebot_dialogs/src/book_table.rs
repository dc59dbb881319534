//! Table reservations.
//!
//! Collects a location, date, time and party size over as many turns as it
//! takes. Values recognized up front (or carried in a card payload) are
//! taken as given; the rest are asked for one at a time.

use async_trait::async_trait;
use cafebot_core::store::{self, StateKey};
use cafebot_core::{CardInput, Dialog, DialogContext, NONE_INTENT, OnTurnInput, TurnResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{BOOK_TABLE, option_str};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    Location,
    Date,
    Time,
    PartySize,
}

impl Slot {
    const ALL: [Self; 4] = [Self::Location, Self::Date, Self::Time, Self::PartySize];

    /// Entity and option name carrying this slot.
    #[must_use]
    pub const fn entity_name(self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Date => "date",
            Self::Time => "time",
            Self::PartySize => "partySize",
        }
    }

    const fn prompt(self) -> &'static str {
        match self {
            Self::Location => "Which of our locations would you like to book at?",
            Self::Date => "What day would you like to come in?",
            Self::Time => "What time should I book the table for?",
            Self::PartySize => "How many guests will there be?",
        }
    }
}

/// Reservation being collected, stored as the dialog's frame state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_size: Option<u32>,
    /// Slot the last prompt asked for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asking: Option<Slot>,
}

impl ReservationState {
    /// Decode the dialog's frame state; a fresh frame holds `null`.
    pub fn from_frame(state: &Value) -> Result<Self, serde_json::Error> {
        if state.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(state)
    }

    #[must_use]
    pub const fn is_filled(&self, slot: Slot) -> bool {
        match slot {
            Slot::Location => self.location.is_some(),
            Slot::Date => self.date.is_some(),
            Slot::Time => self.time.is_some(),
            Slot::PartySize => self.party_size.is_some(),
        }
    }

    #[must_use]
    pub fn next_missing(&self) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| !self.is_filled(*slot))
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "a table for {} at our {} cafe {} at {}",
            self.party_size.unwrap_or_default(),
            self.location.as_deref().unwrap_or_default(),
            self.date.as_deref().unwrap_or_default(),
            self.time.as_deref().unwrap_or_default(),
        )
    }
}

pub struct BookTable {
    locations: Vec<String>,
    max_party_size: u32,
}

impl BookTable {
    #[must_use]
    pub const fn new(locations: Vec<String>, max_party_size: u32) -> Self {
        Self {
            locations,
            max_party_size,
        }
    }

    /// Validate and store one slot value. The error is the message to show.
    pub fn set_slot(
        &self,
        reservation: &mut ReservationState,
        slot: Slot,
        raw: &str,
    ) -> Result<(), String> {
        let raw = raw.trim();
        match slot {
            Slot::Location => {
                let location = self
                    .locations
                    .iter()
                    .find(|l| l.eq_ignore_ascii_case(raw))
                    .ok_or_else(|| {
                        format!(
                            "Sorry, we don't have a cafe in {raw}. We're in {}.",
                            self.locations.join(", ")
                        )
                    })?;
                reservation.location = Some(location.clone());
            }
            Slot::PartySize => {
                let size: u32 = raw
                    .split_whitespace()
                    .find_map(|w| w.parse().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| "Please tell me the number of guests.".to_string())?;
                if size > self.max_party_size {
                    return Err(format!(
                        "Sorry, we can only seat up to {} guests at one table.",
                        self.max_party_size
                    ));
                }
                reservation.party_size = Some(size);
            }
            Slot::Date if !raw.is_empty() => reservation.date = Some(raw.to_string()),
            Slot::Time if !raw.is_empty() => reservation.time = Some(raw.to_string()),
            Slot::Date | Slot::Time => return Err("Sorry, I didn't catch that.".to_string()),
        }
        Ok(())
    }

    /// Fill slots from named values; returns the first validation message.
    fn fill<'a>(
        &self,
        reservation: &mut ReservationState,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> (bool, Option<String>) {
        let mut filled = false;
        let mut problem = None;
        for slot in Slot::ALL {
            let Some(raw) = lookup(slot.entity_name()) else {
                continue;
            };
            match self.set_slot(reservation, slot, raw) {
                Ok(()) => filled = true,
                Err(message) => {
                    problem.get_or_insert(message);
                }
            }
        }
        (filled, problem)
    }

    fn fill_from_entities(
        &self,
        reservation: &mut ReservationState,
        input: &OnTurnInput,
    ) -> (bool, Option<String>) {
        self.fill(reservation, |name| {
            input.entity(name).map(|e| e.value.as_str())
        })
    }

    /// Prompt for the next missing slot, or confirm once all are filled.
    async fn advance(
        &self,
        ctx: &mut DialogContext<'_>,
        reservation: &mut ReservationState,
        problem: Option<String>,
    ) -> anyhow::Result<TurnResult> {
        if let Some(message) = &problem {
            ctx.send(message).await?;
        }

        reservation.asking = reservation.next_missing();
        if let Some(slot) = reservation.asking {
            debug!("Reservation needs {}", slot.entity_name());
            if slot == Slot::Location {
                ctx.send_with_suggestions(slot.prompt(), &self.locations)
                    .await?;
            } else {
                ctx.send(slot.prompt()).await?;
            }
            return Ok(TurnResult::waiting());
        }

        let user_id = ctx.conversation().user_id.clone();
        let key = StateKey::Reservation(&user_id).to_string();
        store::save(ctx.store(), &key, &*reservation).await?;
        info!("Booked {} for user {user_id}", reservation.summary());

        ctx.send(&format!("Great, I've booked {}.", reservation.summary()))
            .await?;
        Ok(TurnResult::complete().with_value(serde_json::to_value(&*reservation)?))
    }
}

#[async_trait]
impl Dialog for BookTable {
    fn id(&self) -> &str {
        BOOK_TABLE
    }

    async fn begin(
        &self,
        ctx: &mut DialogContext<'_>,
        state: &mut Value,
        options: &Value,
    ) -> anyhow::Result<TurnResult> {
        let mut reservation = ReservationState::default();
        let (_, problem) = self.fill(&mut reservation, |name| option_str(options, name));

        let result = self.advance(ctx, &mut reservation, problem).await?;
        *state = serde_json::to_value(&reservation)?;
        Ok(result)
    }

    async fn resume(
        &self,
        ctx: &mut DialogContext<'_>,
        state: &mut Value,
    ) -> anyhow::Result<TurnResult> {
        let mut reservation = ReservationState::from_frame(state)?;

        // A tapped suggestion answers with its text.
        let answer = match CardInput::inspect(ctx.input()) {
            CardInput::Decoded(payload) => payload
                .text()
                .unwrap_or(ctx.input().raw_text.as_str())
                .to_string(),
            CardInput::Absent | CardInput::Malformed(_) => ctx.input().raw_text.clone(),
        };

        let (filled, mut problem) = self.fill_from_entities(&mut reservation, ctx.input());

        if !filled && problem.is_none() {
            let intent = ctx.input().intent.as_str();
            if intent != NONE_INTENT && intent != BOOK_TABLE {
                debug!("Leaving '{intent}' to the dispatcher");
                return Ok(TurnResult::empty());
            }
            // Asking for a table again just repeats the open question.
            if intent == NONE_INTENT {
                if let Some(slot) = reservation.asking {
                    if let Err(message) = self.set_slot(&mut reservation, slot, &answer) {
                        problem = Some(message);
                    }
                }
            }
        }

        let result = self.advance(ctx, &mut reservation, problem).await?;
        *state = serde_json::to_value(&reservation)?;
        Ok(result)
    }

    async fn on_cancel(&self, ctx: &mut DialogContext<'_>, state: &Value) -> anyhow::Result<()> {
        match ReservationState::from_frame(state) {
            Ok(reservation) => info!(
                "Dropped unfinished reservation for user {}: {:?}",
                ctx.conversation().user_id,
                reservation.next_missing()
            ),
            Err(e) => warn!(
                "Dropped unreadable reservation for user {}: {e}",
                ctx.conversation().user_id
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_table() -> BookTable {
        BookTable::new(vec!["Seattle".to_string(), "Renton".to_string()], 8)
    }

    #[test]
    fn slots_fill_in_order() {
        let mut reservation = ReservationState::default();
        assert_eq!(reservation.next_missing(), Some(Slot::Location));

        reservation.location = Some("Seattle".to_string());
        reservation.date = Some("today".to_string());
        assert_eq!(reservation.next_missing(), Some(Slot::Time));
    }

    #[test]
    fn location_is_canonicalized() {
        let mut reservation = ReservationState::default();
        assert!(
            book_table()
                .set_slot(&mut reservation, Slot::Location, " seattle ")
                .is_ok()
        );
        assert_eq!(reservation.location.as_deref(), Some("Seattle"));
    }

    #[test]
    fn unknown_location_lists_the_real_ones() {
        let mut reservation = ReservationState::default();
        let err = book_table().set_slot(&mut reservation, Slot::Location, "Paris");
        assert_eq!(
            err,
            Err("Sorry, we don't have a cafe in Paris. We're in Seattle, Renton.".to_string())
        );
        assert!(reservation.location.is_none());
    }

    #[test]
    fn party_size_is_bounded() {
        let table = book_table();
        let mut reservation = ReservationState::default();

        assert!(table.set_slot(&mut reservation, Slot::PartySize, "9").is_err());
        assert!(table.set_slot(&mut reservation, Slot::PartySize, "none").is_err());
        assert!(table.set_slot(&mut reservation, Slot::PartySize, "we are 4").is_ok());
        assert_eq!(reservation.party_size, Some(4));
    }

    #[test]
    fn frame_state_is_decoded_strictly() {
        assert_eq!(
            ReservationState::from_frame(&Value::Null).ok(),
            Some(ReservationState::default())
        );
        assert_eq!(
            ReservationState::from_frame(&serde_json::json!({ "partySize": 3 }))
                .ok()
                .and_then(|r| r.party_size),
            Some(3)
        );
        assert!(ReservationState::from_frame(&serde_json::json!({ "partySize": "lots" })).is_err());
        assert!(ReservationState::from_frame(&serde_json::json!(["Seattle"])).is_err());
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn state_uses_camel_case_keys() {
        let reservation = ReservationState {
            party_size: Some(2),
            asking: Some(Slot::PartySize),
            ..ReservationState::default()
        };
        let value = serde_json::to_value(&reservation).expect("state should serialize");
        assert_eq!(
            value,
            serde_json::json!({ "partySize": 2, "asking": "partySize" })
        );
    }
}
