use chrono::NaiveDateTime;

use crate::services::availability::StaffDay;

/// Chooses who takes an "any staff" booking: the first candidate, in the
/// order given, who is working and unbooked for the whole interval.
///
/// Callers pass candidates in staff creation order so the choice is
/// reproducible.
pub fn pick_free_staff(
    candidates: &[StaffDay],
    starts_at: NaiveDateTime,
    ends_at: NaiveDateTime,
) -> Option<&StaffDay> {
    candidates.iter().find(|day| day.is_free(starts_at, ends_at))
}
