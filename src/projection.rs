/// Day timeline projection.
///
/// Maps the flat block list onto the 24 hour rows of a single day. Only the
/// hour of each `HH:mm` string counts, so a block from 09:30 to 10:15 covers
/// hour 9 alone. Blocks are assumed not to overlap; when they do, the first
/// block in list order wins. The selected calendar date plays no part.
use crate::types::TimeBlock;

pub const HOURS_PER_DAY: u32 = 24;

/// One hour row of the rendered day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HourSlot<'a> {
    pub hour: u32,
    pub block: Option<&'a TimeBlock>,
    pub is_block_start: bool,
}

/// First block whose parsed start hour <= `hour` < parsed end hour.
pub fn block_covering(blocks: &[TimeBlock], hour: u32) -> Option<&TimeBlock> {
    blocks.iter().find(|block| match (block.start_hour(), block.end_hour()) {
        (Some(start), Some(end)) => start <= hour && hour < end,
        _ => false,
    })
}

/// Whether any block's parsed start hour equals `hour`.
pub fn is_block_start(blocks: &[TimeBlock], hour: u32) -> bool {
    blocks.iter().any(|block| block.start_hour() == Some(hour))
}

/// Row-count multiplier for rendering; negative for end-before-start input.
pub fn span_height(block: &TimeBlock) -> Option<i64> {
    let start = block.start_hour()?;
    let end = block.end_hour()?;
    Some(i64::from(end) - i64::from(start))
}

pub fn day_slots(blocks: &[TimeBlock]) -> Vec<HourSlot<'_>> {
    (0..HOURS_PER_DAY)
        .map(|hour| HourSlot {
            hour,
            block: block_covering(blocks, hour),
            is_block_start: is_block_start(blocks, hour),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::db;
    use crate::store::Store;
    use crate::types::{BlockCategory, BlockStatus, NewTimeBlock};

    fn block(start: &str, end: &str) -> TimeBlock {
        TimeBlock {
            id: Uuid::new_v4(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            title: "Block".to_string(),
            category: BlockCategory::Focus,
            status: BlockStatus::Planned,
        }
    }

    #[test]
    fn covering_uses_half_open_hour_range() {
        let blocks = vec![block("09:00", "11:00")];
        assert_eq!(block_covering(&blocks, 9), Some(&blocks[0]));
        assert_eq!(block_covering(&blocks, 10), Some(&blocks[0]));
        assert_eq!(block_covering(&blocks, 11), None);
        assert_eq!(block_covering(&blocks, 8), None);
    }

    #[test]
    fn minutes_are_ignored() {
        let blocks = vec![block("09:30", "10:15")];
        assert!(block_covering(&blocks, 9).is_some());
        assert!(block_covering(&blocks, 10).is_none());
        assert_eq!(span_height(&blocks[0]), Some(1));
    }

    #[test]
    fn first_block_wins_on_overlap() {
        let blocks = vec![block("08:00", "12:00"), block("10:00", "11:00")];
        assert_eq!(block_covering(&blocks, 10), Some(&blocks[0]));
        assert!(is_block_start(&blocks, 10));
    }

    #[test]
    fn unparseable_times_never_cover() {
        let blocks = vec![block("soon", "11:00")];
        assert!(day_slots(&blocks).iter().all(|slot| slot.block.is_none()));
        assert!(!is_block_start(&blocks, 0));
        assert_eq!(span_height(&blocks[0]), None);
    }

    #[test]
    fn end_before_start_has_negative_span() {
        assert_eq!(span_height(&block("15:00", "13:00")), Some(-2));
    }

    #[test]
    fn day_slots_cover_every_hour() {
        let blocks = vec![block("22:00", "23:00")];
        let slots = day_slots(&blocks);
        assert_eq!(slots.len(), 24);
        assert_eq!(slots[22].block, Some(&blocks[0]));
        assert!(slots[22].is_block_start);
        assert!(slots[23].block.is_none());
    }

    #[test]
    fn deep_work_scenario() {
        let mut store = Store::load(db::init_in_memory().expect("db"));
        store.add_time_block(NewTimeBlock::planned(
            "Deep Work",
            BlockCategory::Focus,
            "07:00",
            "09:00",
        ));

        assert_eq!(store.blocks().len(), 1);
        assert!(is_block_start(store.blocks(), 7));
        assert_eq!(span_height(&store.blocks()[0]), Some(2));
    }
}
