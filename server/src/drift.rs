//! Drift controller: keeps a client's reported `net_tick` inside the
//! server's acceptance window without the two clocks ever exchanging
//! wall-clock time.
//!
//! The server compares where a client's ticks land relative to its own
//! window and, if they drift too far in either direction, stamps a signed
//! correction onto the next batch. The client absorbs a negative adjustment
//! by sleeping one extra frame, and a positive one by skipping that many
//! frames of sleep, then bumps its acknowledged iteration so the server
//! knows the correction landed.

use shared::VALID_TICK_WINDOW;

/// Computes the adjustment (if any) the server should stamp for a peer this
/// tick.
///
/// `diff` is how far the client's last-seen tick sits from the near edge of
/// the server's window: zero when the client is exactly at the window's
/// leading edge, negative when the client is running ahead, positive when
/// it is falling behind. A correction is only emitted when `diff` escapes
/// `[-(W-1), 0]`, and only when the peer has acknowledged the last one sent
/// — otherwise the same correction would be restamped every tick before the
/// client has had a chance to apply it.
pub fn compute_adjustment(
    server_sim_tick: u64,
    client_sim_tick: u64,
    last_sent_iteration: u8,
    last_acked_iteration: u8,
) -> Option<i8> {
    if last_sent_iteration != last_acked_iteration {
        return None;
    }

    let window = VALID_TICK_WINDOW as i64;
    let diff = server_sim_tick as i64 + window - 1 - client_sim_tick as i64;

    if (-(window - 1)..=0).contains(&diff) {
        return None;
    }

    Some(diff.clamp(i8::MIN as i64, i8::MAX as i64) as i8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_window_needs_no_adjustment() {
        // client sitting exactly at the window's leading edge: diff == 0.
        assert_eq!(compute_adjustment(104, 100, 0, 0), None);
    }

    #[test]
    fn far_behind_client_gets_a_positive_adjustment() {
        // client 10 ticks behind the server with W = 5: scenario 6.
        let adjustment = compute_adjustment(110, 100, 0, 0);
        assert_eq!(adjustment, Some(10));
    }

    #[test]
    fn unacknowledged_correction_is_not_restamped() {
        // server already sent iteration 1 but the client hasn't acked it yet.
        assert_eq!(compute_adjustment(110, 100, 1, 0), None);
    }

    #[test]
    fn acknowledged_correction_may_be_restamped_if_still_off() {
        assert_eq!(compute_adjustment(110, 100, 1, 1), Some(10));
    }

    #[test]
    fn extreme_drift_saturates_to_i8_bounds() {
        let adjustment = compute_adjustment(10_000, 0, 0, 0).unwrap();
        assert_eq!(adjustment, i8::MAX);
    }

    #[test]
    fn client_running_ahead_gets_a_negative_adjustment() {
        // client's tick is already past the server's window leading edge.
        let adjustment = compute_adjustment(100, 110, 0, 0);
        assert!(adjustment.unwrap() < 0);
    }
}
