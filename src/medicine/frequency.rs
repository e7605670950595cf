//! Frequency to clock-time expansion for medicine authoring.

use chrono::NaiveTime;

use super::MedicineError;
use crate::models::enums::Frequency;

/// Default slot times, indexed by slot.
pub fn default_times(frequency: Frequency) -> &'static [&'static str] {
    match frequency {
        Frequency::Once => &["09:00"],
        Frequency::Twice => &["09:00", "21:00"],
        Frequency::Thrice => &["09:00", "14:00", "21:00"],
    }
}

/// Resize `current` to the slot count of `frequency`.
///
/// Slots that still exist keep their value unless it is blank; blank or
/// missing slots take the default for that index; surplus slots are dropped.
pub fn expand_times(frequency: Frequency, current: &[String]) -> Vec<String> {
    default_times(frequency)
        .iter()
        .enumerate()
        .map(|(slot, default)| match current.get(slot) {
            Some(existing) if !existing.trim().is_empty() => existing.trim().to_string(),
            _ => (*default).to_string(),
        })
        .collect()
}

/// Normalise `HH:MM` or `HH:MM:SS` to zero-padded `HH:MM:SS`.
pub fn normalize_time(raw: &str) -> Result<String, MedicineError> {
    let raw = raw.trim();
    let parsed = NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| MedicineError::InvalidTime(raw.to_string()))?;
    Ok(parsed.format("%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn defaults_per_frequency() {
        assert_eq!(expand_times(Frequency::Once, &[]), strings(&["09:00"]));
        assert_eq!(expand_times(Frequency::Twice, &[]), strings(&["09:00", "21:00"]));
        assert_eq!(
            expand_times(Frequency::Thrice, &[]),
            strings(&["09:00", "14:00", "21:00"])
        );
    }

    #[test]
    fn existing_slots_are_kept() {
        let current = strings(&["08:00"]);
        assert_eq!(
            expand_times(Frequency::Thrice, &current),
            strings(&["08:00", "14:00", "21:00"])
        );
    }

    #[test]
    fn twice_to_thrice_keeps_both_custom_slots() {
        let current = strings(&["07:15", "19:45"]);
        assert_eq!(
            expand_times(Frequency::Thrice, &current),
            strings(&["07:15", "19:45", "21:00"])
        );
    }

    #[test]
    fn surplus_slots_are_dropped() {
        let current = strings(&["07:30", "13:00", "20:00"]);
        assert_eq!(expand_times(Frequency::Once, &current), strings(&["07:30"]));
    }

    #[test]
    fn blank_slot_takes_default() {
        let current = strings(&["08:00", ""]);
        assert_eq!(
            expand_times(Frequency::Twice, &current),
            strings(&["08:00", "21:00"])
        );
    }

    #[test]
    fn normalize_pads_and_adds_seconds() {
        assert_eq!(normalize_time("09:00").unwrap(), "09:00:00");
        assert_eq!(normalize_time("21:30:15").unwrap(), "21:30:15");
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert!(matches!(
            normalize_time("25:00"),
            Err(MedicineError::InvalidTime(_))
        ));
        assert!(normalize_time("noon").is_err());
    }
}
