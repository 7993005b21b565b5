//! Display order for image lists.
//!
//! Every listing in the site goes through [`sort_for_display`], so the
//! category views, the carousels and the admin panel agree on one order:
//!
//! 1. records with a `sort_order` come first, ascending;
//! 2. records without one follow, newest `uploaded_at` first;
//! 3. a missing timestamp counts as the Unix epoch.
//!
//! Remaining ties break on `uploaded_at` descending and then `id`, which makes
//! the order total.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, Rng};
use uuid::Uuid;

use crate::entities::image::{ImageQuery, ImageRecord, MoveDirection};

fn uploaded_or_epoch(record: &ImageRecord) -> DateTime<Utc> {
    record.uploaded_at.unwrap_or(DateTime::UNIX_EPOCH)
}

pub fn display_order(a: &ImageRecord, b: &ImageRecord) -> Ordering {
    let ranked = match (a.sort_order, b.sort_order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    ranked
        .then_with(|| uploaded_or_epoch(b).cmp(&uploaded_or_epoch(a)))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_for_display(records: &mut [ImageRecord]) {
    records.sort_by(display_order);
}

pub fn matches_query(record: &ImageRecord, query: &ImageQuery) -> bool {
    record.category == query.category
        && query
            .subcategory
            .as_deref()
            .is_none_or(|wanted| record.subcategory.as_deref() == Some(wanted))
}

/// The two `sort_order` writes that move one record past its neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPlan {
    pub target: Uuid,
    pub target_order: i64,
    pub neighbour: Uuid,
    pub neighbour_order: i64,
}

/// Plans a one-step move inside an already sorted list.
///
/// When neither record has a `sort_order`, both use their display index.
/// Returns `None` when the id is absent or the record already sits at that
/// edge.
pub fn plan_swap(sorted: &[ImageRecord], id: Uuid, direction: MoveDirection) -> Option<SwapPlan> {
    let index = sorted.iter().position(|record| record.id == id)?;
    let neighbour_index = match direction {
        MoveDirection::Up => index.checked_sub(1)?,
        MoveDirection::Down => index + 1,
    };
    let neighbour = sorted.get(neighbour_index)?;
    let target = &sorted[index];

    let (target_order, neighbour_order) = match (target.sort_order, neighbour.sort_order) {
        // Equal ranks would swap to the same values; push the neighbour one
        // step the other way so the pair ends up distinct.
        (Some(current), Some(other)) if current == other => match direction {
            MoveDirection::Up => (other, other.saturating_add(1)),
            MoveDirection::Down => (other, other.saturating_sub(1)),
        },
        (Some(current), Some(other)) => (other, current),
        // Ranked records sort first, so a mixed pair straddles that boundary:
        // the unranked one takes the rank and the ranked one steps past it.
        (Some(rank), None) | (None, Some(rank)) => match direction {
            MoveDirection::Up => (rank, rank.saturating_add(1)),
            MoveDirection::Down => (rank.saturating_add(1), rank),
        },
        (None, None) => (neighbour_index as i64, index as i64),
    };

    Some(SwapPlan {
        target: target.id,
        target_order,
        neighbour: neighbour.id,
        neighbour_order,
    })
}

/// Random subset without repetition, in random order.
pub fn sample<R: Rng + ?Sized>(records: &[ImageRecord], count: usize, rng: &mut R) -> Vec<ImageRecord> {
    records.choose_multiple(rng, count).cloned().collect()
}
