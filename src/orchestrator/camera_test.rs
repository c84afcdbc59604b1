#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::cluster::{LatLng, LatLngBounds};
    use crate::orchestrator::CameraChangeGuard;

    #[test]
    fn test_dirty_until() {
        let mut guard = CameraChangeGuard::default();
        let t0 = Instant::now();
        assert!(!guard.is_dirty(t0));

        guard.set_dirty_until(t0 + Duration::from_millis(500));
        assert!(guard.is_dirty(t0));
        assert!(guard.is_dirty(t0 + Duration::from_millis(499)));
        assert!(!guard.is_dirty(t0 + Duration::from_millis(500)));

        guard.clear_dirty();
        assert!(!guard.is_dirty(t0));
    }

    #[test]
    fn test_has_moved() {
        let mut guard = CameraChangeGuard::default();
        let region = LatLngBounds {
            southwest: LatLng::new(0.0, 0.0),
            northeast: LatLng::new(1.0, 1.0),
        };
        assert!(guard.has_moved(&region));
        guard.remember(region);
        assert!(!guard.has_moved(&region));
        assert!(guard.has_moved(&region.expanded(0.1)));
        guard.forget();
        assert!(guard.has_moved(&region));
    }
}
