// src/models/designer.rs

use crate::ids::{DesignerId, SlotId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wall-clock time of day with minute precision, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
  minutes: u16,
}

impl TimeOfDay {
  pub fn new(hour: u8, minute: u8) -> Option<Self> {
    if hour < 24 && minute < 60 {
      Some(Self {
        minutes: u16::from(hour) * 60 + u16::from(minute),
      })
    } else {
      None
    }
  }

  pub fn hour(&self) -> u8 {
    (self.minutes / 60) as u8
  }

  pub fn minute(&self) -> u8 {
    (self.minutes % 60) as u8
  }
}

impl fmt::Display for TimeOfDay {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}", self.hour(), self.minute())
  }
}

impl FromStr for TimeOfDay {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || format!("Invalid time '{}', expected HH:MM", s);
    let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
    if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
      return Err(invalid());
    }
    let hour: u8 = hour.parse().map_err(|_| invalid())?;
    let minute: u8 = minute.parse().map_err(|_| invalid())?;
    TimeOfDay::new(hour, minute).ok_or_else(invalid)
  }
}

impl TryFrom<String> for TimeOfDay {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<TimeOfDay> for String {
  fn from(value: TimeOfDay) -> Self {
    value.to_string()
  }
}

/// The (date, from, to) tuple a booking request uses to address a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotTime {
  pub date: NaiveDate,
  pub from: TimeOfDay,
  pub to: TimeOfDay,
}

impl SlotTime {
  pub fn new(date: NaiveDate, from: TimeOfDay, to: TimeOfDay) -> Self {
    Self { date, from, to }
  }

  pub fn validate(&self) -> Result<(), String> {
    if self.from >= self.to {
      return Err(format!("Slot start {} must be before its end {}", self.from, self.to));
    }
    Ok(())
  }
}

impl fmt::Display for SlotTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}-{}", self.date, self.from, self.to)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
  Available,
  Booked,
}

impl SlotStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      SlotStatus::Available => "available",
      SlotStatus::Booked => "booked",
    }
  }
}

impl FromStr for SlotStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "available" => Ok(SlotStatus::Available),
      "booked" => Ok(SlotStatus::Booked),
      other => Err(format!("Unknown slot status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
  pub id: SlotId,
  #[serde(flatten)]
  pub time: SlotTime,
  pub status: SlotStatus,
}

impl AvailabilitySlot {
  pub fn available(time: SlotTime) -> Self {
    Self {
      id: SlotId::new(),
      time,
      status: SlotStatus::Available,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Designer {
  pub id: DesignerId,
  /// Account that owns this profile; consultation notifications go here.
  pub user_id: UserId,
  pub name: String,
  pub slots: Vec<AvailabilitySlot>,
  pub created_at: DateTime<Utc>,
}

impl Designer {
  pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
    Self {
      id: DesignerId::new(),
      user_id,
      name: name.into(),
      slots: Vec::new(),
      created_at: Utc::now(),
    }
  }

  /// Slot tuples are unique per designer, so at most one slot matches.
  pub fn slot_at(&self, time: &SlotTime) -> Option<&AvailabilitySlot> {
    self.slots.iter().find(|slot| slot.time == *time)
  }

  pub fn slot(&self, id: SlotId) -> Option<&AvailabilitySlot> {
    self.slots.iter().find(|slot| slot.id == id)
  }
}
