//! # Timestamp Scenarios
//!
//! Block timestamps under a manual clock: monotonic stepping, explicit
//! timestamps, one-shot overrides and time travel.

#[cfg(test)]
mod tests {
    use node_runtime::NodeError;
    use sim_01_time_control::TimeError;
    use sim_02_hardfork::Hardfork;

    use crate::integration::fixtures::*;

    async fn stamp(node: &node_runtime::Node, explicit: Option<u64>) -> u64 {
        node.mine_block(explicit).await.unwrap().block.header.timestamp
    }

    // =============================================================================
    // SCENARIOS: AUTOMATIC TIMESTAMPS
    // =============================================================================

    #[tokio::test]
    async fn test_frozen_clock_steps_one_second() {
        let (node, _clock) = node_with_clock(config(Hardfork::London, 30_000_000)).await;
        assert_eq!(stamp(&node, None).await, START + 1);
        assert_eq!(stamp(&node, None).await, START + 2);
        assert_eq!(stamp(&node, None).await, START + 3);
    }

    #[tokio::test]
    async fn test_follows_clock() {
        let (node, clock) = node_with_clock(config(Hardfork::London, 30_000_000)).await;
        clock.advance(100);
        assert_eq!(stamp(&node, None).await, START + 100);
        clock.advance(12);
        assert_eq!(stamp(&node, None).await, START + 112);
    }

    #[tokio::test]
    async fn test_increase_time_shifts_automatic_timestamps() {
        let (node, clock) = node_with_clock(config(Hardfork::London, 30_000_000)).await;
        assert_eq!(node.increase_time(3_600).await.unwrap(), 3_600);
        assert_eq!(stamp(&node, None).await, START + 3_600);
        clock.advance(5);
        assert_eq!(stamp(&node, None).await, START + 3_605);
    }

    // =============================================================================
    // SCENARIOS: EXPLICIT TIMESTAMPS
    // =============================================================================

    /// An explicit timestamp is used as-is and does not move the offset.
    #[tokio::test]
    async fn test_explicit_timestamp_leaves_offset() {
        let (node, _clock) = node_with_clock(config(Hardfork::London, 30_000_000)).await;
        assert_eq!(stamp(&node, Some(START + 1_000)).await, START + 1_000);
        assert_eq!(node.snapshot().await.unwrap().time.offset_seconds, 0);
        assert_eq!(stamp(&node, None).await, START + 1_001);
    }

    #[tokio::test]
    async fn test_explicit_timestamp_must_increase() {
        let (node, _clock) = node_with_clock(config(Hardfork::London, 30_000_000)).await;
        let err = node.mine_block(Some(START)).await.unwrap_err();
        assert!(matches!(
            err,
            NodeError::Time(TimeError::InvalidTimestamp {
                proposed: START,
                previous: START
            })
        ));
        assert_eq!(node.latest_block_number().await.unwrap(), 0);
    }

    // =============================================================================
    // SCENARIOS: ONE-SHOT OVERRIDE
    // =============================================================================

    /// A preset timestamp is used once and rebases the offset so time keeps
    /// ticking from it.
    #[tokio::test]
    async fn test_preset_then_ticking() {
        let (node, clock) = node_with_clock(config(Hardfork::London, 30_000_000)).await;
        node.set_next_block_timestamp(START + 500).await.unwrap();
        assert_eq!(stamp(&node, None).await, START + 500);

        let time = node.snapshot().await.unwrap().time;
        assert_eq!(time.next_block_timestamp, None);
        assert_eq!(time.offset_seconds, 500);

        clock.advance(10);
        assert_eq!(stamp(&node, None).await, START + 510);
    }

    #[tokio::test]
    async fn test_preset_must_exceed_latest() {
        let (node, _clock) = node_with_clock(config(Hardfork::London, 30_000_000)).await;
        stamp(&node, Some(START + 50)).await;
        let err = node.set_next_block_timestamp(START + 50).await.unwrap_err();
        assert!(matches!(err, NodeError::Time(TimeError::InvalidTimestamp { .. })));
    }

    #[tokio::test]
    async fn test_explicit_timestamp_does_not_consume_preset() {
        let (node, _clock) = node_with_clock(config(Hardfork::London, 30_000_000)).await;
        node.set_next_block_timestamp(START + 500).await.unwrap();

        assert_eq!(stamp(&node, Some(START + 200)).await, START + 200);
        assert_eq!(
            node.snapshot().await.unwrap().time.next_block_timestamp,
            Some(START + 500)
        );
        assert_eq!(stamp(&node, None).await, START + 500);
    }

    #[tokio::test]
    async fn test_overtaken_preset_still_increases() {
        let (node, _clock) = node_with_clock(config(Hardfork::London, 30_000_000)).await;
        node.set_next_block_timestamp(START + 50).await.unwrap();
        stamp(&node, Some(START + 100)).await;
        assert_eq!(stamp(&node, None).await, START + 101);
    }

    #[tokio::test]
    async fn test_timestamps_strictly_increase() {
        let (node, clock) = node_with_clock(config(Hardfork::London, 30_000_000)).await;
        let mut previous = START;
        for step in 0..12u64 {
            match step % 4 {
                0 => clock.advance(3),
                1 => node.set_next_block_timestamp(previous + 7).await.unwrap(),
                2 => {
                    node.increase_time(2).await.unwrap();
                }
                _ => {}
            }
            let timestamp = stamp(&node, None).await;
            assert!(timestamp > previous);
            previous = timestamp;
        }
    }
}
