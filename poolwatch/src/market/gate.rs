//! Re-entrancy guard and cooldown for pool refreshes.
//!
//! At most one refresh runs at a time, and a new one may only start once
//! `cooldown` has elapsed since the previous start. Denied triggers are
//! dropped, not queued.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Default minimum spacing between two refresh starts.
pub const DEFAULT_FETCH_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDenied {
    /// Another refresh holds the gate.
    InFlight,
    /// The previous refresh started less than `cooldown` ago.
    Cooldown { remaining: Duration },
}

#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    last_start: Option<Instant>,
}

#[derive(Debug)]
pub struct FetchGate {
    cooldown: Duration,
    state: Mutex<GateState>,
}

impl FetchGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: Mutex::new(GateState::default()),
        }
    }

    /// Claims the gate, recording the start time.
    ///
    /// The returned permit releases the in-flight flag when dropped; the
    /// cooldown keeps running from the recorded start.
    pub fn try_acquire(&self) -> Result<FetchPermit<'_>, GateDenied> {
        let mut state = self.state.lock();

        if state.in_flight {
            return Err(GateDenied::InFlight);
        }

        let now = Instant::now();
        if let Some(last) = state.last_start {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                return Err(GateDenied::Cooldown {
                    remaining: self.cooldown - elapsed,
                });
            }
        }

        state.in_flight = true;
        state.last_start = Some(now);

        Ok(FetchPermit { gate: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }
}

impl Default for FetchGate {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_COOLDOWN)
    }
}

/// Proof of holding the gate.
#[derive(Debug)]
pub struct FetchPermit<'a> {
    gate: &'a FetchGate,
}

impl Drop for FetchPermit<'_> {
    fn drop(&mut self) {
        self.gate.state.lock().in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn second_trigger_inside_cooldown_is_denied() {
        let gate = FetchGate::new(Duration::from_secs(5));

        drop(gate.try_acquire().expect("first acquire"));

        advance(Duration::from_secs(2)).await;
        assert_eq!(
            gate.try_acquire().unwrap_err(),
            GateDenied::Cooldown {
                remaining: Duration::from_secs(3)
            }
        );

        advance(Duration::from_secs(3)).await;
        assert!(gate.try_acquire().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn held_permit_blocks_even_after_cooldown() {
        let gate = FetchGate::new(Duration::from_secs(5));
        let permit = gate.try_acquire().expect("first acquire");

        advance(Duration::from_secs(60)).await;
        assert_eq!(gate.try_acquire().unwrap_err(), GateDenied::InFlight);
        assert!(gate.is_in_flight());

        drop(permit);
        assert!(!gate.is_in_flight());
        assert!(gate.try_acquire().is_ok());
    }

    #[test]
    fn zero_cooldown_only_guards_reentrancy() {
        let gate = FetchGate::new(Duration::ZERO);
        drop(gate.try_acquire().unwrap());
        assert!(gate.try_acquire().is_ok());
    }
}
