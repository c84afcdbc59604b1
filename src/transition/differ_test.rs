#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use quickcheck::quickcheck;

    use crate::cluster::{
        ClusterConfig, ClusterPoint, ClusterSet, ClusteringEngine, InputPoint, LatLng, PixelPoint,
        Projection,
    };
    use crate::task::CancelToken;
    use crate::testing::{PlanarProjection, point};
    use crate::transition::{TransitionKind, TransitionPlan, diff};

    fn planar() -> Arc<dyn Projection> {
        Arc::new(PlanarProjection::new(1.0))
    }

    /// Cluster set from groups of `(id, lng)` on the x axis
    fn set(groups: &[&[(u64, f64)]]) -> Arc<ClusterSet> {
        let clusters = groups
            .iter()
            .map(|group| {
                let points: Vec<InputPoint> =
                    group.iter().map(|&(id, lng)| point(id, 0.0, lng)).collect();
                let x = points.iter().map(|p| p.position.lng).sum::<f64>() / points.len() as f64;
                ClusterPoint::new(points, PixelPoint([x, 0.0]), LatLng::new(0.0, x))
            })
            .collect();
        Arc::new(ClusterSet::new(clusters))
    }

    fn run(previous: Option<Arc<ClusterSet>>, current: Arc<ClusterSet>) -> TransitionPlan {
        diff(previous, current, planar(), &CancelToken::new()).unwrap()
    }

    fn kinds(plan: &TransitionPlan) -> Vec<TransitionKind> {
        plan.transitions().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_first_render_creates_everything() {
        let plan = run(None, set(&[&[(1, 0.0)], &[(2, 50.0), (3, 52.0)]]));
        assert_eq!(kinds(&plan), vec![TransitionKind::Created, TransitionKind::Created]);
        assert!(plan.destroyed().is_empty());
        assert!(plan.transitions().iter().all(|t| t.sources.is_empty()));
        assert_eq!(plan.count(TransitionKind::Created), 2);
    }

    #[test]
    fn test_same_set_persists_in_place() {
        let clusters = set(&[&[(1, 0.0), (2, 2.0)], &[(3, 100.0)]]);
        let plan = run(Some(Arc::clone(&clusters)), Arc::clone(&clusters));
        assert_eq!(kinds(&plan), vec![TransitionKind::Persisted, TransitionKind::Persisted]);
        assert_eq!(plan.transitions()[0].sources, vec![0]);
        assert_eq!(plan.transitions()[1].sources, vec![1]);
        assert!(plan.destroyed().is_empty());
        let projection = planar();
        assert!(plan.transitions().iter().all(|t| t.is_stationary(projection.as_ref())));
    }

    #[test]
    fn test_merge() {
        let previous = set(&[&[(1, 0.0)], &[(2, 10.0)]]);
        let plan = run(Some(previous), set(&[&[(1, 0.0), (2, 10.0)]]));
        let t = &plan.transitions()[0];
        assert_eq!(t.kind, TransitionKind::Merged);
        assert_eq!(t.sources, vec![0, 1]);
        assert_eq!(t.source_positions, vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 10.0)]);
        assert_eq!(t.destination_position, LatLng::new(0.0, 5.0));
        assert!(!t.is_stationary(planar().as_ref()));
    }

    #[test]
    fn test_split() {
        let previous = set(&[&[(1, 0.0), (2, 10.0)]]);
        let plan = run(Some(previous), set(&[&[(1, 0.0)], &[(2, 10.0)]]));
        assert_eq!(kinds(&plan), vec![TransitionKind::Split, TransitionKind::Split]);
        for t in plan.transitions() {
            assert_eq!(t.sources, vec![0]);
            assert_eq!(t.source_positions, vec![LatLng::new(0.0, 5.0)]);
        }
        assert!(plan.destroyed().is_empty());
    }

    #[test]
    fn test_split_and_merge_together() {
        // {1,2} {3} -> {1} {2,3}
        let previous = set(&[&[(1, 0.0), (2, 10.0)], &[(3, 20.0)]]);
        let plan = run(Some(previous), set(&[&[(1, 0.0)], &[(2, 10.0), (3, 20.0)]]));
        assert_eq!(kinds(&plan), vec![TransitionKind::Split, TransitionKind::Merged]);
        assert_eq!(plan.transitions()[1].sources, vec![0, 1]);
    }

    #[test]
    fn test_removed_members_do_not_split() {
        let previous = set(&[&[(1, 0.0), (2, 2.0), (3, 4.0)]]);
        let plan = run(Some(previous), set(&[&[(1, 0.0), (2, 2.0)]]));
        assert_eq!(kinds(&plan), vec![TransitionKind::Persisted]);
        assert!(plan.destroyed().is_empty());
    }

    #[test]
    fn test_added_point_joins_persisted_cluster() {
        let previous = set(&[&[(1, 0.0), (2, 2.0)]]);
        let plan = run(Some(previous), set(&[&[(1, 0.0), (2, 2.0), (9, 4.0)]]));
        assert_eq!(kinds(&plan), vec![TransitionKind::Persisted]);
    }

    #[test]
    fn test_destroyed() {
        let previous = set(&[&[(1, 0.0)], &[(2, 50.0)], &[(3, 100.0)]]);
        let plan = run(Some(previous), set(&[&[(2, 50.0)], &[(4, 200.0)]]));
        assert_eq!(kinds(&plan), vec![TransitionKind::Persisted, TransitionKind::Created]);
        assert_eq!(plan.destroyed(), &[0, 2]);
        assert_eq!(plan.transitions()[0].sources, vec![1]);
    }

    #[test]
    fn test_empty_current_destroys_all() {
        let previous = set(&[&[(1, 0.0)], &[(2, 50.0)]]);
        let plan = run(Some(previous), Arc::new(ClusterSet::default()));
        assert!(plan.transitions().is_empty());
        assert_eq!(plan.destroyed(), &[0, 1]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "appears twice")]
    fn test_duplicate_point_ids_are_rejected() {
        let twice = set(&[&[(1, 0.0)], &[(1, 500.0)]]);
        run(Some(Arc::clone(&twice)), twice);
    }

    #[test]
    fn test_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(diff(None, set(&[&[(1, 0.0)]]), planar(), &cancel).is_none());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(TransitionKind::Merged.to_string(), "merged");
        assert_eq!(TransitionKind::Created.as_str(), "created");
    }

    /// Clusters the kept coordinates, ids are positions in `coords`
    fn cluster_points(
        coords: &[(i8, bool, bool)],
        keep: fn(&(i8, bool, bool)) -> bool,
        scale: f64,
    ) -> Arc<ClusterSet> {
        let points: Vec<InputPoint> = coords
            .iter()
            .enumerate()
            .filter(|(_, c)| keep(c))
            .map(|(i, &(x, _, _))| point(i as u64, 0.0, x as f64))
            .collect();
        let engine = ClusteringEngine::new(ClusterConfig::new(10.0, None).unwrap());
        Arc::new(
            engine
                .cluster(&points, &PlanarProjection::new(scale), &CancelToken::new())
                .unwrap(),
        )
    }

    quickcheck! {
        fn prop_plan_is_complete(coords: Vec<(i8, bool, bool)>) -> bool {
            let previous = cluster_points(&coords, |c| c.1, 0.5);
            let current = cluster_points(&coords, |c| c.2, 2.0);
            let plan = run(Some(Arc::clone(&previous)), Arc::clone(&current));

            let in_order = plan
                .transitions()
                .iter()
                .enumerate()
                .all(|(i, t)| t.destination == i);

            let current_ids: HashSet<_> = current
                .clusters()
                .iter()
                .flat_map(|c| c.points().iter().map(|p| p.id))
                .collect();
            let expected_destroyed: Vec<usize> = (0..previous.len())
                .filter(|&i| previous.clusters()[i].points().iter().all(|p| !current_ids.contains(&p.id)))
                .collect();

            let kinds_consistent = plan.transitions().iter().all(|t| match t.kind {
                TransitionKind::Created => t.sources.is_empty(),
                TransitionKind::Persisted | TransitionKind::Split => t.sources.len() == 1,
                TransitionKind::Merged => t.sources.len() > 1,
            });

            plan.transitions().len() == current.len()
                && in_order
                && plan.destroyed() == expected_destroyed.as_slice()
                && kinds_consistent
        }

        fn prop_self_diff_persists(coords: Vec<(i8, bool, bool)>) -> bool {
            let clusters = cluster_points(&coords, |_| true, 1.0);
            let plan = run(Some(Arc::clone(&clusters)), clusters);
            plan.destroyed().is_empty()
                && plan
                    .transitions()
                    .iter()
                    .all(|t| t.kind == TransitionKind::Persisted && t.sources == vec![t.destination])
        }
    }
}
