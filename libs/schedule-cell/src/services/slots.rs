// libs/schedule-cell/src/services/slots.rs
use chrono::{Duration, NaiveTime};

use crate::models::{ScheduleError, Slot};

/// Slot step the doctor app used when none is configured.
pub const DEFAULT_SLOT_MINUTES: i32 = 40;

/// Display label for a slot start time, e.g. "9:00 AM" or "1:40 PM".
/// This string is the slot's identity within a (doctor, date) pair.
pub fn slot_label(time: NaiveTime) -> String {
    time.format("%l:%M %p").to_string().trim_start().to_string()
}

/// Recover the time of day from a slot label. Returns None for labels that
/// were not produced by `slot_label`.
pub fn parse_slot_label(label: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(label.trim(), "%I:%M %p").ok()
}

/// Generate the ordered slot sequence for an availability window.
///
/// Slots are emitted at `step_minutes` intervals while the slot *start*
/// stays strictly before `end_time`; the final slot's implied end may cross
/// the window boundary. All slots start unbooked.
pub fn generate_slots(
    start_time: NaiveTime,
    end_time: NaiveTime,
    step_minutes: i32,
) -> Result<Vec<Slot>, ScheduleError> {
    if step_minutes <= 0 {
        return Err(ScheduleError::Validation(
            "Slot step must be greater than zero minutes".to_string(),
        ));
    }

    if start_time >= end_time {
        return Err(ScheduleError::Validation(
            "Start time must be before end time".to_string(),
        ));
    }

    let mut slots = Vec::new();
    let mut cursor = start_time;
    let mut position = 0;

    while cursor < end_time {
        slots.push(Slot {
            time: slot_label(cursor),
            position,
            is_booked: false,
        });
        position += 1;

        // NaiveTime arithmetic wraps at midnight; a wrapped cursor means the
        // window is exhausted.
        let (next, wrapped_days) =
            cursor.overflowing_add_signed(Duration::minutes(step_minutes as i64));
        if wrapped_days > 0 {
            break;
        }
        cursor = next;
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn labels_use_twelve_hour_display_format() {
        assert_eq!(slot_label(t(9, 0)), "9:00 AM");
        assert_eq!(slot_label(t(13, 40)), "1:40 PM");
        assert_eq!(slot_label(t(0, 15)), "12:15 AM");
        assert_eq!(slot_label(t(12, 0)), "12:00 PM");
    }

    #[test]
    fn labels_round_trip_through_parse() {
        for time in [t(9, 0), t(13, 40), t(0, 15), t(23, 20)] {
            assert_eq!(parse_slot_label(&slot_label(time)), Some(time));
        }
        assert_eq!(parse_slot_label("not a time"), None);
    }

    #[test]
    fn forty_minute_step_emits_slot_starting_before_window_end() {
        // 09:00-10:00 at 40 min: the 09:40 slot starts inside the window
        // even though its implied end crosses 10:00.
        let slots = generate_slots(t(9, 0), t(10, 0), 40).unwrap();
        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["9:00 AM", "9:40 AM"]);
    }

    #[test]
    fn thirty_minute_step_fills_two_hour_window() {
        let slots = generate_slots(t(9, 0), t(11, 0), 30).unwrap();
        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["9:00 AM", "9:30 AM", "10:00 AM", "10:30 AM"]);
        assert!(slots.iter().all(|s| !s.is_booked));
        assert_eq!(
            slots.iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_slots(t(10, 0), t(16, 0), DEFAULT_SLOT_MINUTES).unwrap();
        let b = generate_slots(t(10, 0), t(16, 0), DEFAULT_SLOT_MINUTES).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn slot_times_are_strictly_increasing() {
        let slots = generate_slots(t(8, 0), t(20, 0), 40).unwrap();
        let parsed: Vec<NaiveTime> = slots
            .iter()
            .map(|s| parse_slot_label(&s.time).unwrap())
            .collect();
        assert!(parsed.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn rejects_non_positive_step() {
        assert_matches!(
            generate_slots(t(9, 0), t(10, 0), 0),
            Err(ScheduleError::Validation(_))
        );
        assert_matches!(
            generate_slots(t(9, 0), t(10, 0), -15),
            Err(ScheduleError::Validation(_))
        );
    }

    #[test]
    fn rejects_inverted_or_empty_window() {
        assert_matches!(
            generate_slots(t(10, 0), t(9, 0), 30),
            Err(ScheduleError::Validation(_))
        );
        assert_matches!(
            generate_slots(t(9, 0), t(9, 0), 30),
            Err(ScheduleError::Validation(_))
        );
    }

    #[test]
    fn window_ending_at_midnight_terminates() {
        let slots = generate_slots(t(23, 0), t(23, 59), 40).unwrap();
        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["11:00 PM", "11:40 PM"]);
    }
}
