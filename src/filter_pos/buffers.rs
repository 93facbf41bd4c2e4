// SPDX-License-Identifier: GPL-3.0-only

//! Source field plus a ring of destination slots

use super::field::{FilterPosField, check_dimensions};
use crate::backends::LuminanceBackend;
use crate::constants::NUM_FILTER_POS_SLOTS;
use crate::errors::ExposureResult;
use tracing::debug;

/// Animated filter positions
///
/// New destinations are queued into the slot after the active one and only
/// become active on the next [`update`](Self::update).
#[derive(Debug, Clone)]
pub struct FilterPosBuffers {
    srce: FilterPosField,
    slots: [FilterPosField; NUM_FILTER_POS_SLOTS],
    active: usize,
    pending: Option<usize>,
}

impl FilterPosBuffers {
    pub fn new(width: u32, height: u32) -> Self {
        let identity = FilterPosField::identity(width, height);
        Self {
            slots: std::array::from_fn(|_| identity.clone()),
            srce: identity,
            active: 0,
            pending: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.srce.width
    }

    pub fn height(&self) -> u32 {
        self.srce.height
    }

    /// Current interpolated positions
    pub fn srce(&self) -> &FilterPosField {
        &self.srce
    }

    pub fn active_dest(&self) -> &FilterPosField {
        &self.slots[self.active]
    }

    pub fn active_slot(&self) -> usize {
        self.active
    }

    pub fn has_pending_dest(&self) -> bool {
        self.pending.is_some()
    }

    /// Store `dest` in the next slot; it becomes active on the next update
    ///
    /// Queuing again before an update replaces the pending field.
    pub fn queue_dest(&mut self, dest: FilterPosField) -> ExposureResult<()> {
        check_dimensions(&self.srce, &dest)?;
        let slot = (self.active + 1) % NUM_FILTER_POS_SLOTS;
        self.slots[slot] = dest;
        self.pending = Some(slot);
        debug!(slot, "Queued filter destination");
        Ok(())
    }

    /// Activate any pending destination, then step the source toward it
    pub fn update<B>(&mut self, lerp_factor: f32, backend: &mut B) -> ExposureResult<()>
    where
        B: LuminanceBackend + ?Sized,
    {
        if let Some(slot) = self.pending.take() {
            debug!(from = self.active, to = slot, "Switching filter destination");
            self.active = slot;
        }
        backend.lerp_positions(&mut self.srce, &self.slots[self.active], lerp_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::CpuBackend;

    #[test]
    fn test_new_is_identity_everywhere() {
        let buffers = FilterPosBuffers::new(6, 4);
        let identity = FilterPosField::identity(6, 4);
        assert_eq!(buffers.srce(), &identity);
        assert_eq!(buffers.active_dest(), &identity);
        assert_eq!(buffers.active_slot(), 0);
        assert!(!buffers.has_pending_dest());
    }

    #[test]
    fn test_update_without_dest_keeps_identity() {
        let mut backend = CpuBackend::new();
        let mut buffers = FilterPosBuffers::new(5, 5);
        buffers.update(0.5, &mut backend).unwrap();
        assert_eq!(buffers.srce(), &FilterPosField::identity(5, 5));
    }

    #[test]
    fn test_queued_dest_activates_on_update() {
        let mut backend = CpuBackend::new();
        let mut buffers = FilterPosBuffers::new(4, 4);
        let zoomed = FilterPosField::identity(4, 4).scaled(0.5);

        buffers.queue_dest(zoomed.clone()).unwrap();
        assert_eq!(buffers.active_slot(), 0);
        assert!(buffers.has_pending_dest());

        buffers.update(1.0, &mut backend).unwrap();
        assert_eq!(buffers.active_slot(), 1);
        assert!(!buffers.has_pending_dest());
        assert_eq!(buffers.active_dest(), &zoomed);
        for (s, d) in buffers.srce().positions.iter().zip(&zoomed.positions) {
            assert!((s[0] - d[0]).abs() < 1e-6 && (s[1] - d[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_slots_rotate_round_robin() {
        let mut backend = CpuBackend::new();
        let mut buffers = FilterPosBuffers::new(2, 2);
        let mut seen = Vec::new();
        for i in 0..4 {
            buffers
                .queue_dest(FilterPosField::identity(2, 2).scaled(1.0 + i as f32))
                .unwrap();
            buffers.update(0.1, &mut backend).unwrap();
            seen.push(buffers.active_slot());
        }
        assert_eq!(seen, vec![1, 2, 0, 1]);
    }

    #[test]
    fn test_switch_continues_from_current_positions() {
        let mut backend = CpuBackend::new();
        let mut buffers = FilterPosBuffers::new(3, 3);
        buffers
            .queue_dest(FilterPosField::identity(3, 3).scaled(2.0))
            .unwrap();
        buffers.update(0.5, &mut backend).unwrap();
        let before = buffers.srce().clone();

        let next = FilterPosField::identity(3, 3).scaled(0.25);
        buffers.queue_dest(next.clone()).unwrap();
        buffers.update(0.5, &mut backend).unwrap();

        for ((s, b), d) in buffers
            .srce()
            .positions
            .iter()
            .zip(&before.positions)
            .zip(&next.positions)
        {
            assert_eq!(s[0], b[0] + 0.5 * (d[0] - b[0]));
            assert_eq!(s[1], b[1] + 0.5 * (d[1] - b[1]));
        }
    }

    #[test]
    fn test_queue_rejects_mismatched_dest() {
        let mut buffers = FilterPosBuffers::new(4, 4);
        assert!(buffers.queue_dest(FilterPosField::identity(4, 3)).is_err());
        assert!(!buffers.has_pending_dest());
    }
}
