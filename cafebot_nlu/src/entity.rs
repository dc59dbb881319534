//! Booking entity extraction.

use cafebot_core::Entity;
use regex::Regex;

use crate::error::NluError;

pub const PARTY_SIZE: &str = "partySize";
pub const TIME: &str = "time";
pub const DATE: &str = "date";
pub const LOCATION: &str = "location";

const PARTY_SIZE_PATTERN: &str =
    r"(?i)\b(?:for|party of|table for)\s+(\d{1,2})\b|\b(\d{1,2})\s+(?:people|persons|guests|of us)\b";
const TIME_PATTERN: &str = r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b|\b(noon|midnight)\b";
const DATE_PATTERN: &str =
    r"(?i)\b(today|tonight|tomorrow|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b";

/// Pulls party size, time, date and location out of free text.
pub struct EntityExtractor {
    party_size: Regex,
    time: Regex,
    date: Regex,
    location: Option<(Regex, Vec<String>)>,
}

impl EntityExtractor {
    /// `locations` are matched case-insensitively and reported in their
    /// configured spelling.
    pub fn new(locations: &[String]) -> Result<Self, NluError> {
        let location = if locations.is_empty() {
            None
        } else {
            let alternatives = locations
                .iter()
                .map(|l| regex::escape(l))
                .collect::<Vec<_>>()
                .join("|");
            Some((
                Regex::new(&format!(r"(?i)\b({alternatives})\b"))?,
                locations.to_vec(),
            ))
        };

        Ok(Self {
            party_size: Regex::new(PARTY_SIZE_PATTERN)?,
            time: Regex::new(TIME_PATTERN)?,
            date: Regex::new(DATE_PATTERN)?,
            location,
        })
    }

    /// Entities found in `text`, at most one of each kind.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();

        if let Some(location) = self.location(text) {
            entities.push(Entity::new(LOCATION, location));
        }
        if let Some(date) = self.date(text) {
            entities.push(Entity::new(DATE, date));
        }
        if let Some(time) = self.time(text) {
            entities.push(Entity::new(TIME, time));
        }
        if let Some(size) = self.party_size(text) {
            entities.push(Entity::new(PARTY_SIZE, size));
        }

        entities
    }

    fn location(&self, text: &str) -> Option<String> {
        let (re, names) = self.location.as_ref()?;
        let found = re.captures(text)?.get(1)?.as_str().to_lowercase();
        names.iter().find(|n| n.to_lowercase() == found).cloned()
    }

    fn date(&self, text: &str) -> Option<String> {
        let found = self.date.captures(text)?.get(1)?.as_str().to_lowercase();
        // Tonight is a date and a hint at the time; keep only the date.
        Some(if found == "tonight" {
            "today".to_string()
        } else {
            found
        })
    }

    /// Normalized to 24-hour `HH:MM`.
    fn time(&self, text: &str) -> Option<String> {
        let caps = self.time.captures(text)?;

        if let Some(word) = caps.get(4) {
            return Some(match word.as_str().to_lowercase().as_str() {
                "noon" => "12:00".to_string(),
                _ => "00:00".to_string(),
            });
        }

        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return None;
        }

        let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("pm");
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        Some(format!("{hour:02}:{minute:02}"))
    }

    fn party_size(&self, text: &str) -> Option<String> {
        let caps = self.party_size.captures(text)?;
        let size = caps.get(1).or_else(|| caps.get(2))?.as_str();
        let size: u32 = size.parse().ok()?;
        (size > 0).then(|| size.to_string())
    }
}
